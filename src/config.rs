// Application configuration loaded once at startup
// Missing TOKEN_SECRET is a fatal configuration error, not a per-request one

use std::env;

/// Errors raised while building the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("TOKEN_SECRET must not be empty")]
    EmptySecret,
}

/// Immutable application configuration
///
/// Built exactly once in `main` and injected into the components that need
/// it. The token secret lives here so that token issuance and verification
/// can never observe an unconfigured secret at request time.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub token_secret: String,
    pub host: String,
    pub port: String,
}

impl Config {
    /// Load configuration from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?;

        let token_secret =
            env::var("TOKEN_SECRET").map_err(|_| ConfigError::MissingVar("TOKEN_SECRET"))?;
        if token_secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());

        Ok(Self {
            database_url,
            token_secret,
            host,
            port,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test: the environment is process-global and parallel tests
    // mutating TOKEN_SECRET would race each other
    #[test]
    fn test_token_secret_is_required_and_non_empty() {
        std::env::set_var("DATABASE_URL", "postgresql://localhost/accounts");

        std::env::remove_var("TOKEN_SECRET");
        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::MissingVar("TOKEN_SECRET"))));

        std::env::set_var("TOKEN_SECRET", "");
        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::EmptySecret)));

        std::env::set_var("TOKEN_SECRET", "sufficiently-long-signing-secret");
        let config = Config::from_env().unwrap();
        assert_eq!(config.token_secret, "sufficiently-long-signing-secret");
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }
}
