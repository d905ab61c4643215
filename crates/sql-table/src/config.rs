use std::ffi::OsString;
use std::fmt;

use clap::Parser;

use crate::error::TableResult;

/// Connection settings, read from the environment and overridable per field.
#[derive(Parser, Clone, PartialEq, Eq)]
#[command(name = "sql-table")]
pub struct DbConfig {
    /// Database host.
    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub host: String,

    #[arg(long, env = "DB_PORT", default_value_t = 3306)]
    pub port: u16,

    /// Database name; a file path (or `:memory:`) for SQLite.
    #[arg(long, env = "DB_NAME", default_value = ":memory:")]
    pub database: String,

    #[arg(long, env = "DB_USER", default_value = "root")]
    pub username: String,

    #[arg(long, env = "DB_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,
}

impl DbConfig {
    /// Environment variables and defaults only.
    pub fn from_env() -> TableResult<Self> {
        Self::from_args(std::iter::empty::<OsString>())
    }

    /// Flags such as `--database app.db` take precedence over the environment.
    pub fn from_args<I, T>(args: I) -> TableResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv = std::iter::once(OsString::from("sql-table")).chain(args.into_iter().map(Into::into));
        Ok(Self::try_parse_from(argv)?)
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Connection URL for logs; never includes the password.
    pub fn redacted_url(&self) -> String {
        format!(
            "mysql://{}@{}:{}/{}",
            self.username, self.host, self.port, self.database
        )
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_flags_override() {
        let cfg = DbConfig::from_args([
            "--host", "db.internal", "--port", "3307", "--database", "shop", "--username", "app",
            "--password", "s3cret",
        ])
        .unwrap();
        assert_eq!(cfg.host, "db.internal");
        assert_eq!(cfg.port, 3307);
        assert_eq!(cfg.database, "shop");
        assert_eq!(cfg.redacted_url(), "mysql://app@db.internal:3307/shop");
    }

    #[rstest]
    fn test_password_hidden_from_debug() {
        let cfg = DbConfig::from_args(["--password", "s3cret"]).unwrap();
        let shown = format!("{cfg:?} {}", cfg.redacted_url());
        assert!(!shown.contains("s3cret"));
    }

    #[rstest]
    fn test_bad_port_is_config_error() {
        let err = DbConfig::from_args(["--port", "not-a-port"]).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[rstest]
    fn test_builder_overrides() {
        let cfg = DbConfig::from_args(["--database", "a.db"])
            .unwrap()
            .with_database("b.db")
            .with_credentials("u", "p");
        assert_eq!((cfg.database.as_str(), cfg.username.as_str(), cfg.password.as_str()), ("b.db", "u", "p"));
    }
}
