mod reconnecting;
mod tokio_postgres;

pub use self::in_memory_test::{InMemoryTestDriver, InMemoryTestResponseBuilder, RecordedStatement};
pub use self::reconnecting::ReconnectingDriver;
pub use self::tokio_postgres::{PgConnection, PgConnector};
