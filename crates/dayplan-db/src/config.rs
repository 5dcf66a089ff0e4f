/// Database configuration.
///
/// The URL is resolved by the caller (CLI flag, `DATABASE_URL`, config file,
/// then [`DbConfig::DEFAULT_URL`]).
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
}

impl DbConfig {
    /// The connection URL used when no other source provides one.
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/dayplan";

    /// Name of the environment variable holding the connection URL.
    pub const ENV_VAR: &str = "DATABASE_URL";

    /// Build a config from an explicit URL (useful for tests and CLI flags).
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Extract the database name from the URL, ignoring any query string.
    ///
    /// Returns `None` if the URL has no path component.
    pub fn database_name(&self) -> Option<&str> {
        let without_query = self
            .database_url
            .split_once('?')
            .map_or(self.database_url.as_str(), |(head, _)| head);
        without_query.rsplit('/').next().filter(|s| !s.is_empty() && !s.contains(':'))
    }
}
