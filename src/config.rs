use std::time::Duration;

/// Connection parameters, retained by the driver so a dropped connection can
/// be re-established without caller involvement.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl ConnectionParams {
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
            user: user.into(),
            password: password.into(),
        }
    }
}

/// Driver tuning knobs.
///
/// No statement timeout is applied unless one is configured here.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptions {
    /// Upper bound on a single network attempt. An elapsed timeout counts as
    /// an execution failure and feeds the normal reconnect-and-retry path.
    pub statement_timeout: Option<Duration>,
}

impl ConnectionOptions {
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }
}
