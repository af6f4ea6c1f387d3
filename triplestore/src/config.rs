//! Engine configuration module.
//!
//! This module provides configuration loading for the triplestore engine from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `TRIPLESTORE_CURSOR_POOL_CAPACITY`: Idle scan buffers kept for reuse (default: `64`)
//! - `TRIPLESTORE_SCAN_BATCH_SIZE`: Index entries fetched per scan batch (default: `256`)
//! - `TRIPLESTORE_CONNECTION_CACHE_CAPACITY`: Cached connections per factory (default: `16`)
//! - `TRIPLESTORE_LOG_FILTER`: Default tracing filter when `RUST_LOG` is unset
//!   (default: `triplestore=info`)
//!
//! # Invariants
//!
//! - Every numeric setting is strictly positive
//! - `log_filter` is never empty

/// Engine configuration.
///
/// # Pre-conditions
///
/// When constructed via `from_env()`:
/// - Numeric variables, when set, must parse as positive integers
///
/// # Post-conditions
///
/// - `cursor_pool_capacity`, `scan_batch_size` and `connection_cache_capacity`
///   are all greater than zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of idle scan buffers the cursor pool keeps.
    /// Buffers returned beyond this are discarded.
    pub cursor_pool_capacity: usize,
    /// Number of index entries a leaf scan fetches per batch.
    pub scan_batch_size: usize,
    /// Capacity of the connection factory's LRU cache.
    pub connection_cache_capacity: usize,
    /// Tracing filter directive used when `RUST_LOG` is not set.
    pub log_filter: String,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cursor_pool_capacity: Self::DEFAULT_CURSOR_POOL_CAPACITY,
            scan_batch_size: Self::DEFAULT_SCAN_BATCH_SIZE,
            connection_cache_capacity: Self::DEFAULT_CONNECTION_CACHE_CAPACITY,
            log_filter: Self::DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl EngineConfig {
    /// Default number of idle scan buffers.
    pub const DEFAULT_CURSOR_POOL_CAPACITY: usize = 64;
    /// Default scan batch size.
    pub const DEFAULT_SCAN_BATCH_SIZE: usize = 256;
    /// Default connection cache capacity.
    pub const DEFAULT_CONNECTION_CACHE_CAPACITY: usize = 16;
    /// Default tracing filter.
    pub const DEFAULT_LOG_FILTER: &'static str = "triplestore=info";

    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A numeric variable is set but is not a positive integer
    /// - `TRIPLESTORE_LOG_FILTER` is set but empty
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// `from_env` passes the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cursor_pool_capacity = load_positive(
            &lookup,
            "TRIPLESTORE_CURSOR_POOL_CAPACITY",
            Self::DEFAULT_CURSOR_POOL_CAPACITY,
        )?;
        let scan_batch_size = load_positive(
            &lookup,
            "TRIPLESTORE_SCAN_BATCH_SIZE",
            Self::DEFAULT_SCAN_BATCH_SIZE,
        )?;
        let connection_cache_capacity = load_positive(
            &lookup,
            "TRIPLESTORE_CONNECTION_CACHE_CAPACITY",
            Self::DEFAULT_CONNECTION_CACHE_CAPACITY,
        )?;
        let log_filter = match lookup("TRIPLESTORE_LOG_FILTER") {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::InvalidValue {
                    name: "TRIPLESTORE_LOG_FILTER".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            Some(value) => value,
            None => Self::DEFAULT_LOG_FILTER.to_string(),
        };

        Ok(Self {
            cursor_pool_capacity,
            scan_batch_size,
            connection_cache_capacity,
            log_filter,
        })
    }
}

/// Load a strictly positive integer, returning `default` if unset.
fn load_positive<F>(lookup: &F, name: &str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(name) else {
        return Ok(default);
    };
    match value.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: "must be greater than zero".to_string(),
        }),
        Ok(parsed) => Ok(parsed),
        Err(_) => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a positive integer"),
        }),
    }
}
