use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DATABASE_PATH: &str = "folio.db";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 5;

/// Runtime settings sourced from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_path: String,
    pub port: u16,
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            port: DEFAULT_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: Duration::from_secs(DEFAULT_BUSY_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    /// Reads `DATABASE_PATH`, `PORT`, `DATABASE_MAX_CONNECTIONS` and
    /// `DATABASE_BUSY_TIMEOUT_SECS`, falling back to defaults for anything
    /// unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string()),
            port: get_env_var_or("PORT", DEFAULT_PORT),
            max_connections: get_env_var_or("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            busy_timeout: Duration::from_secs(get_env_var_or(
                "DATABASE_BUSY_TIMEOUT_SECS",
                DEFAULT_BUSY_TIMEOUT_SECS,
            )),
        }
    }

    pub fn with_database_path(mut self, path: impl Into<String>) -> Self {
        self.database_path = path.into();
        self
    }
}

/// Retrieves an environment variable and parses it, returning `default` when
/// the variable is missing or does not parse.
pub fn get_env_var_or<T: FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}
