//! Sessions, commands and connections.
//!
//! A [`Session`] is the store-facing surface a client talks to. A
//! [`Connection`] wraps a session and executes [`Command`]s (queries and
//! loads) against it. Connections are obtained from a
//! [`ConnectionFactory`], which resolves URIs such as `local:people`
//! through a static table of schemes and caches the result.

mod command;
mod factory;
mod local;
mod registry;

use std::fmt;

pub use command::{Command, Load};
pub use factory::{Connection, ConnectionFactory};
pub use local::LocalSession;
pub use registry::{DatabaseRegistry, NameValidationError, validate_database_name};

use crate::content::{Content, ContentError};
use crate::query::{Answer, AskQuery, BooleanAnswer, ConstructQuery, GraphAnswer, Query, QueryError};
use crate::store::StoreError;
use crate::types::{Term, Triple};

/// Errors returned by sessions and connections.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session is closed")]
    Closed,
    #[error("no session factory for scheme {0:?}")]
    UnknownScheme(String),
    #[error("invalid connection URI {0:?}")]
    InvalidUri(String),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Operations a client can perform against one store.
///
/// Graphs are named by URI. `None` in a statement pattern is a wildcard.
/// Every call on a closed session fails with [`SessionError::Closed`].
pub trait Session: Send + Sync + fmt::Debug {
    /// Run a select query.
    fn query(&self, query: &Query) -> Result<Answer, SessionError>;

    fn ask(&self, query: &AskQuery) -> Result<BooleanAnswer, SessionError>;

    fn construct(&self, query: &ConstructQuery) -> Result<GraphAnswer, SessionError>;

    /// Insert statements into `graph`. Returns how many were new.
    fn insert(&self, graph: &str, triples: &[Triple]) -> Result<usize, SessionError>;

    /// Delete statements from `graph`. Returns how many were present.
    fn delete(&self, graph: &str, triples: &[Triple]) -> Result<usize, SessionError>;

    /// Whether `graph` holds a statement matching the pattern.
    fn contains(
        &self,
        graph: &str,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Result<bool, SessionError>;

    /// Statements of `graph` matching the pattern, one column per
    /// wildcard (`subject`, `predicate`, `object`).
    fn find(
        &self,
        graph: &str,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Result<Answer, SessionError>;

    /// Returns `false` if the graph already existed.
    fn create_graph(&self, graph: &str) -> Result<bool, SessionError>;

    /// Drop a graph and its statements. Returns `false` if it did not
    /// exist.
    fn remove_graph(&self, graph: &str) -> Result<bool, SessionError>;

    fn graph_exists(&self, graph: &str) -> Result<bool, SessionError>;

    /// Parse `content` and insert its statements into `graph`, in one
    /// transaction. Returns how many were new.
    fn load(&self, graph: &str, content: &Content) -> Result<usize, SessionError>;

    /// Mark the session closed. Idempotent.
    fn close(&self);

    fn is_closed(&self) -> bool;
}
