use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub rust_log: String,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path = env::var("LEAGUE_DB_PATH")
            .map_err(|_| ConfigError::MissingVariable("LEAGUE_DB_PATH".to_string()))?;

        if db_path.is_empty() {
            return Err(ConfigError::InvalidValue(
                "LEAGUE_DB_PATH cannot be empty".to_string(),
            ));
        }

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self { db_path, rust_log })
    }
}
