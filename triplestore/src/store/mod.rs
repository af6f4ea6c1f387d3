//! In-memory quad store.
//!
//! The store is the collaborator the resolver reads from: a versioned set
//! of `(subject, predicate, object, graph)` quads over localized node ids.
//!
//! # Usage
//!
//! ```
//! use triplestore::store::{Database, DEFAULT_GRAPH};
//! use triplestore::{EngineConfig, Term, Triple};
//!
//! let db = Database::new(&EngineConfig::default()).unwrap();
//! let mut txn = db.begin().unwrap();
//! txn.insert(
//!     &Term::uri(DEFAULT_GRAPH),
//!     &Triple::new(Term::uri("http://a"), Term::uri("http://p"), Term::uri("http://b")),
//! )
//! .unwrap();
//! txn.commit().unwrap();
//!
//! assert_eq!(db.snapshot().unwrap().statement_count(), 1);
//! ```

mod cursor_pool;
mod database;
pub mod index;

pub use cursor_pool::{CursorPool, ScanBuffer};
pub use database::{Database, Snapshot, WriteTransaction};

use crate::string_pool::{GlobalizeError, LocalizeError};

/// URI of the graph every database starts with.
pub const DEFAULT_GRAPH: &str = "urn:triplestore:graph:default";

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database lock poisoned")]
    LockPoisoned,
    #[error("graph {0} does not exist")]
    UnknownGraph(String),
    #[error("{0} cannot be used as a graph here")]
    InvalidGraph(String),
    #[error("invalid statement: {0}")]
    InvalidStatement(String),
    #[error(transparent)]
    Localize(#[from] LocalizeError),
    #[error(transparent)]
    Globalize(#[from] GlobalizeError),
}
