//! Registry of open in-process databases, keyed by name.
//!
//! Every `local:<name>` connection with the same name shares one
//! [`Database`], so statements written through one connection are visible
//! to queries on another.
//!
//! # Invariants
//!
//! - Each name maps to exactly one `Database` instance
//! - Databases are never removed once created (for the lifetime of the
//!   registry)
//! - Every name is validated before use

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::config::EngineConfig;
use crate::connection::SessionError;
use crate::store::{Database, StoreError};

/// Maximum length of a database name.
const MAX_NAME_LENGTH: usize = 128;

/// Shared databases by name.
#[derive(Debug)]
pub struct DatabaseRegistry {
    databases: RwLock<HashMap<String, Arc<Database>>>,
    config: EngineConfig,
}

impl DatabaseRegistry {
    /// Create an empty registry. New databases use `config`.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            databases: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get or create the database called `name`.
    ///
    /// # Pre-conditions
    ///
    /// - `name` passes [`validate_database_name`]; checked here too
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is invalid
    /// - The registry lock is poisoned
    /// - The database cannot be created
    #[allow(clippy::disallowed_methods)] // Arc::clone is safe and expected
    #[allow(clippy::significant_drop_tightening)] // The write lock must be held across insert
    pub fn get_or_create(&self, name: &str) -> Result<Arc<Database>, SessionError> {
        validate_database_name(name)
            .map_err(|e| SessionError::InvalidUri(format!("{name}: {e}")))?;

        // Fast path: read lock only
        {
            let databases = self
                .databases
                .read()
                .map_err(|_| StoreError::LockPoisoned)?;
            if let Some(db) = databases.get(name) {
                return Ok(Arc::clone(db));
            }
        }

        let mut databases = self
            .databases
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;

        // Another thread may have created it while we waited for the write lock
        if let Some(db) = databases.get(name) {
            return Ok(Arc::clone(db));
        }

        let db = Arc::new(Database::new(&self.config)?);
        databases.insert(name.to_string(), Arc::clone(&db));
        tracing::info!("Created database '{name}'");
        Ok(db)
    }

    /// Number of databases created so far.
    pub fn len(&self) -> Result<usize, SessionError> {
        Ok(self
            .databases
            .read()
            .map_err(|_| StoreError::LockPoisoned)?
            .len())
    }

    pub fn is_empty(&self) -> Result<bool, SessionError> {
        Ok(self.len()? == 0)
    }
}

/// Error returned when validating a database name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    /// The name is empty.
    Empty,
    /// The name exceeds the maximum length.
    TooLong,
    /// The name contains invalid characters.
    InvalidCharacters,
}

impl std::fmt::Display for NameValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "database name must not be empty"),
            Self::TooLong => write!(
                f,
                "database name exceeds maximum length of {MAX_NAME_LENGTH} characters"
            ),
            Self::InvalidCharacters => write!(
                f,
                "database name contains invalid characters; only alphanumeric, hyphens, and underscores are allowed"
            ),
        }
    }
}

/// Validate that a database name is well-formed.
///
/// ```
/// use triplestore::connection::validate_database_name;
///
/// assert!(validate_database_name("people-2024").is_ok());
/// assert!(validate_database_name("").is_err());
/// assert!(validate_database_name("../evil").is_err());
/// ```
pub fn validate_database_name(name: &str) -> Result<(), NameValidationError> {
    if name.is_empty() {
        return Err(NameValidationError::Empty);
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(NameValidationError::TooLong);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(NameValidationError::InvalidCharacters);
    }
    Ok(())
}
