//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;

/// How concurrent mutations of one wallet are kept apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyMode {
    /// In-process mutex per (user, currency)
    #[default]
    Lock,
    /// Version check at write time with bounded retry
    Optimistic,
}

impl FromStr for ConcurrencyMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lock" => Ok(ConcurrencyMode::Lock),
            "optimistic" => Ok(ConcurrencyMode::Optimistic),
            _ => Err(ConfigError::InvalidValue("CONCURRENCY_MODE")),
        }
    }
}

/// Settings the ledger handlers need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    pub allowed_currencies: Vec<String>,
    /// Currency used when a request names none
    pub reporting_currency: String,
    pub default_withdraw_address: String,
    pub concurrency: ConcurrencyMode,
    /// Attempts per mutation in optimistic mode
    pub max_attempts: u32,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            allowed_currencies: vec!["BTC".to_string(), "ETH".to_string(), "USDT".to_string()],
            reporting_currency: "BTC".to_string(),
            default_withdraw_address: "default-withdraw-address".to_string(),
            concurrency: ConcurrencyMode::Lock,
            max_attempts: 3,
        }
    }
}

impl LedgerSettings {
    pub fn with_concurrency(mut self, concurrency: ConcurrencyMode) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL; the in-memory store is used when absent
    pub database_url: Option<String>,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    pub allowed_currencies: Vec<String>,
    pub reporting_currency: String,
    pub default_withdraw_address: String,
    pub concurrency_mode: ConcurrencyMode,
    pub optimistic_max_attempts: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let database_max_connections = var("DATABASE_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = var("HOST", "127.0.0.1");

        let port = var("PORT", "3000")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = var("ENVIRONMENT", "development");

        let allowed_currencies = parse_currencies(&var("ALLOWED_CURRENCIES", "BTC,ETH,USDT"))?;

        let reporting_currency = var("REPORTING_CURRENCY", "BTC").trim().to_string();
        if !allowed_currencies.contains(&reporting_currency) {
            return Err(ConfigError::InvalidValue("REPORTING_CURRENCY"));
        }

        let default_withdraw_address = var("DEFAULT_WITHDRAW_ADDRESS", "default-withdraw-address");

        let concurrency_mode = var("CONCURRENCY_MODE", "lock").parse()?;

        let optimistic_max_attempts = var("OPTIMISTIC_MAX_ATTEMPTS", "3")
            .parse::<u32>()
            .ok()
            .filter(|attempts| *attempts >= 1)
            .ok_or(ConfigError::InvalidValue("OPTIMISTIC_MAX_ATTEMPTS"))?;

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            allowed_currencies,
            reporting_currency,
            default_withdraw_address,
            concurrency_mode,
            optimistic_max_attempts,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// The part of the configuration the ledger handlers use
    pub fn ledger_settings(&self) -> LedgerSettings {
        LedgerSettings {
            allowed_currencies: self.allowed_currencies.clone(),
            reporting_currency: self.reporting_currency.clone(),
            default_withdraw_address: self.default_withdraw_address.clone(),
            concurrency: self.concurrency_mode,
            max_attempts: self.optimistic_max_attempts,
        }
    }
}

fn parse_currencies(raw: &str) -> Result<Vec<String>, ConfigError> {
    let currencies: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    if currencies.is_empty() {
        return Err(ConfigError::InvalidValue("ALLOWED_CURRENCIES"));
    }
    Ok(currencies)
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
