use std::{env, fmt::Display, str::FromStr};

use dotenv::dotenv;
use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Settings handed to the auth service at construction.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub min_password_length: usize,
    pub token_length: usize,
    /// bcrypt work factor for stored passwords.
    pub password_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_password_length: 6,
            token_length: 40,
            password_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/** Everything the server needs to start, read once in `main` */
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub pool_size: u32,
    pub auth: AuthConfig,
    pub pagination: PaginationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "blogfeed.db".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            pool_size: 8,
            auth: AuthConfig::default(),
            pagination: PaginationConfig::default(),
        }
    }
}

impl Config {
    /// Loads `.env` (if present) and then reads the process environment.
    /// Missing keys fall back to [Config::default], malformed ones are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        let defaults = Config::default();

        let config = Config {
            database_url: load("DATABASE_URL", defaults.database_url)?,
            host: load("HOST", defaults.host)?,
            port: load("PORT", defaults.port)?,
            pool_size: load("DATABASE_POOL_SIZE", defaults.pool_size)?,
            auth: AuthConfig {
                min_password_length: load(
                    "MIN_PASSWORD_LENGTH",
                    defaults.auth.min_password_length,
                )?,
                token_length: load("TOKEN_LENGTH", defaults.auth.token_length)?,
                password_cost: load("PASSWORD_HASH_COST", defaults.auth.password_cost)?,
            },
            pagination: PaginationConfig {
                default_page_size: load("PAGE_SIZE", defaults.pagination.default_page_size)?,
                max_page_size: load("MAX_PAGE_SIZE", defaults.pagination.max_page_size)?,
            },
        };
        config.validate()?;

        Ok(config)
    }

    /// Single-connection in-memory database with the cheapest password hashing,
    /// used by the test suites.
    pub fn in_memory() -> Self {
        Self {
            database_url: ":memory:".to_string(),
            pool_size: 1,
            auth: AuthConfig {
                password_cost: crate::auth::password::MIN_COST,
                ..AuthConfig::default()
            },
            ..Config::default()
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(invalid("DATABASE_POOL_SIZE", "must be at least 1"));
        }
        if self.pagination.default_page_size == 0 {
            return Err(invalid("PAGE_SIZE", "must be at least 1"));
        }
        if self.pagination.max_page_size < self.pagination.default_page_size {
            return Err(invalid("MAX_PAGE_SIZE", "must not be below PAGE_SIZE"));
        }
        // tokens are stored in a VARCHAR(64) column
        if !(20..=64).contains(&self.auth.token_length) {
            return Err(invalid("TOKEN_LENGTH", "must be between 20 and 64"));
        }
        if !(crate::auth::password::MIN_COST..=crate::auth::password::MAX_COST).contains(&self.auth.password_cost) {
            return Err(invalid("PASSWORD_HASH_COST", "must be between 4 and 31"));
        }

        Ok(())
    }
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.to_string(),
    }
}

fn load<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
