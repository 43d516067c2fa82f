use std::sync::Arc;

use pretty_assertions::assert_eq;

use pgbind::codes::{has_digit_spacing, CodeGenerator};
use pgbind::drivers::{InMemoryTestDriver, InMemoryTestResponseBuilder};
use pgbind::error::PgBindError;
use pgbind::traits::DatabaseDriver;
use pgbind::types::{FromRow, Row, SqlValue};
use pgbind::{ParamBag, PgBindClient, Record, TableSchema};

// Test table and record
#[derive(Debug, PartialEq)]
struct User {
    id: i64,
    name: String,
    active: bool,
}

impl FromRow for User {
    fn from_row(row: &Row) -> pgbind::Result<Self> {
        Ok(User {
            id: row.get_as("id")?,
            name: row.get_as("name")?,
            active: row.get_as("active")?,
        })
    }
}

impl Record for User {
    fn schema() -> TableSchema {
        TableSchema::new("users", "id")
    }

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("name", self.name.as_str().into()),
            ("active", self.active.into()),
        ]
    }

    fn set_generated_id(&mut self, id: i64) {
        self.id = id;
    }
}

fn client_over(driver: &Arc<InMemoryTestDriver>) -> PgBindClient {
    PgBindClient::with_driver(Arc::clone(driver) as Arc<dyn DatabaseDriver>)
}

fn user_row(id: i64, name: &str, active: bool) -> Vec<SqlValue> {
    vec![
        SqlValue::Int64(id),
        SqlValue::Text(name.to_string()),
        SqlValue::Bool(active),
    ]
}

fn count_response(count: i64) -> pgbind::RawQueryResult {
    InMemoryTestResponseBuilder::new()
        .columns(&["count"])
        .row(vec![SqlValue::Int64(count)])
        .build()
}

#[tokio::test]
async fn test_named_parameters_rewrite_end_to_end() {
    let driver = Arc::new(
        InMemoryTestDriver::new().with_response(
            InMemoryTestResponseBuilder::new()
                .columns(&["id", "name", "active"])
                .row(user_row(7, "Ada", true))
                .build(),
        ),
    );
    let client = client_over(&driver);
    let querier = client.querier();

    let user: User = querier
        .row_or_fail(
            "load user",
            "SELECT id, name, active FROM users WHERE name = :name AND active = :active",
            &ParamBag::new().bind("name", "Ada").bind("active", true),
        )
        .await
        .unwrap();

    assert_eq!(
        user,
        User {
            id: 7,
            name: "Ada".to_string(),
            active: true,
        }
    );
    driver.assert_last_statement(
        "SELECT id, name, active FROM users WHERE name = $1 AND active = $2",
        &[SqlValue::Text("Ada".to_string()), SqlValue::Bool(true)],
    );
    driver.assert_statement_count(1);
}

#[tokio::test]
async fn test_rows_maps_every_row() {
    let driver = Arc::new(
        InMemoryTestDriver::new().with_response(
            InMemoryTestResponseBuilder::new()
                .columns(&["id", "name", "active"])
                .row(user_row(1, "Ada", true))
                .row(user_row(2, "Grace", false))
                .build(),
        ),
    );
    let client = client_over(&driver);

    let users: Vec<User> = client
        .querier()
        .rows("list users", "SELECT id, name, active FROM users", &ParamBag::new())
        .await
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[1].name, "Grace");
}

#[tokio::test]
async fn test_row_is_none_on_empty_result() {
    let driver = Arc::new(InMemoryTestDriver::new());
    let client = client_over(&driver);

    let user: Option<User> = client
        .querier()
        .row(
            "load user",
            "SELECT id, name, active FROM users WHERE id = :id",
            &ParamBag::new().bind("id", 99i64),
        )
        .await
        .unwrap();

    assert_eq!(user, None);
}

#[tokio::test]
async fn test_row_with_conversion_hook() {
    let driver = Arc::new(
        InMemoryTestDriver::new().with_response(
            InMemoryTestResponseBuilder::new()
                .columns(&["name"])
                .row(vec![SqlValue::Text("ada".to_string())])
                .build(),
        ),
    );
    let client = client_over(&driver);

    let upper = client
        .querier()
        .row_with(
            "load name",
            "SELECT name FROM users WHERE id = :id",
            &ParamBag::new().bind("id", 1i64),
            |row| Ok(row.get_as::<String>("name")?.to_uppercase()),
        )
        .await
        .unwrap();

    assert_eq!(upper, Some("ADA".to_string()));
}

#[tokio::test]
async fn test_insert_then_update_round_trip() {
    let driver = Arc::new(
        InMemoryTestDriver::new()
            .with_response(
                InMemoryTestResponseBuilder::new()
                    .columns(&["id"])
                    .row(vec![SqlValue::Int64(42)])
                    .build(),
            )
            .with_response(InMemoryTestResponseBuilder::new().rows_affected(1).build()),
    );
    let client = client_over(&driver);
    let querier = client.querier();

    let mut user = User {
        id: 0,
        name: "Ada".to_string(),
        active: true,
    };
    querier.insert_object(&mut user).await.unwrap();
    assert_eq!(user.id, 42);

    user.active = false;
    let affected = querier.update_object(user.id, &user).await.unwrap();
    assert_eq!(affected, 1);

    let statements = driver.recorded_statements();
    assert_eq!(
        statements[0].sql,
        "INSERT INTO users (name, active) VALUES ($1, $2) RETURNING id"
    );
    assert_eq!(
        statements[1].sql,
        "UPDATE users SET name = $1, active = $2 WHERE id = $3"
    );
    assert_eq!(
        statements[1].params,
        vec![
            SqlValue::Text("Ada".to_string()),
            SqlValue::Bool(false),
            SqlValue::Int64(42),
        ]
    );
}

#[tokio::test]
async fn test_transaction_wraps_crud_calls() {
    let driver = Arc::new(
        InMemoryTestDriver::new()
            .with_response(InMemoryTestResponseBuilder::new().build()) // BEGIN
            .with_response(
                InMemoryTestResponseBuilder::new()
                    .columns(&["id"])
                    .row(vec![SqlValue::Int64(9)])
                    .build(),
            ),
    );
    let client = client_over(&driver);

    let id = client
        .transaction(|querier| async move {
            let mut user = User {
                id: 0,
                name: "Lin".to_string(),
                active: true,
            };
            querier.insert_object(&mut user).await?;
            Ok(user.id)
        })
        .await
        .unwrap();

    assert_eq!(id, 9);
    let sql: Vec<String> = driver
        .recorded_statements()
        .into_iter()
        .map(|s| s.sql)
        .collect();
    assert_eq!(
        sql,
        vec![
            "BEGIN".to_string(),
            "INSERT INTO users (name, active) VALUES ($1, $2) RETURNING id".to_string(),
            "COMMIT".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_unique_code_skips_taken_candidates() {
    let driver = Arc::new(InMemoryTestDriver::new().with_responses(vec![
        count_response(1),
        count_response(1),
        count_response(0),
    ]));
    let client = client_over(&driver);

    let code = CodeGenerator::new(client.querier())
        .unique_code("vouchers", "code", 6)
        .await
        .unwrap();

    assert_eq!(code.len(), 6);
    assert!(has_digit_spacing(&code));
    driver.assert_statement_count(3);

    // Every candidate went through the same template, bound to $1.
    for statement in driver.recorded_statements() {
        assert_eq!(
            statement.sql,
            "SELECT COUNT(*) FROM vouchers WHERE code = $1"
        );
        match &statement.params[..] {
            [SqlValue::Text(candidate)] => {
                assert_eq!(candidate.len(), 6);
                assert!(has_digit_spacing(candidate));
                assert!(candidate.chars().all(|c| c.is_ascii_alphanumeric()));
                assert!(!candidate.chars().any(|c| "0O1l".contains(c)));
            }
            other => panic!("expected one text param, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_unique_code_exhaustion() {
    let driver = Arc::new(InMemoryTestDriver::new().with_default_response(count_response(1)));
    let client = client_over(&driver);

    let err = CodeGenerator::new(client.querier())
        .with_max_attempts(5)
        .unique_code("vouchers", "code", 1)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PgBindError::CodeSpaceExhausted { attempts: 5 }
    ));
    driver.assert_statement_count(5);
}
