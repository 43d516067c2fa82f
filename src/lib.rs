//! pgbind - a named-parameter PostgreSQL access layer
//!
//! SQL templates use `:name` placeholders, rewritten to driver-native `$n`
//! binding at execution time. The client owns exactly one logical
//! connection; when a statement fails, the connection is closed, reopened
//! from the stored parameters, and the statement retried once before the
//! error surfaces.
//!
//! # Example
//! ```ignore
//! use pgbind::{ConnectionOptions, ConnectionParams, ParamBag, PgBindClient};
//!
//! // Connect to database
//! let params = ConnectionParams::new("localhost", "mydb", "app", "secret");
//! let client = PgBindClient::connect(params, ConnectionOptions::default()).await?;
//! let querier = client.querier();
//!
//! // Single-value query with a named parameter
//! let name: String = querier
//!     .field_or_fail(
//!         "load user name",
//!         "SELECT name FROM users WHERE id = :id",
//!         &ParamBag::new().bind("id", 7i64),
//!     )
//!     .await?;
//!
//! // A unit of work, committed or rolled back as one
//! client
//!     .transaction(|querier| async move {
//!         querier
//!             .execute(
//!                 "retire user",
//!                 "UPDATE users SET active = :active WHERE id = :id",
//!                 &ParamBag::new().bind("active", false).bind("id", 7i64),
//!             )
//!             .await?;
//!         Ok(())
//!     })
//!     .await?;
//! ```

pub mod codes;
pub mod config;
pub mod drivers;
pub mod error;
pub mod params;
pub mod querier;
pub mod schema;
pub mod traits;
pub mod types;

mod client;

// Re-export main types for convenient access
pub use client::PgBindClient;
pub use codes::CodeGenerator;
pub use config::{ConnectionOptions, ConnectionParams};
pub use error::{PgBindError, Result};
pub use params::{rewrite, to_positional, ParamBag};
pub use querier::Querier;
pub use schema::{Record, TableSchema};
pub use traits::{Connection, Connector, DatabaseDriver};
pub use types::{FromRow, FromSqlValue, RawQueryResult, Row, SqlValue};
