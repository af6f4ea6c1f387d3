//! Query resolution.
//!
//! A query arrives as an already-built constraint tree. Resolution is a
//! pipeline:
//!
//! 1. [`transform::flatten`] removes redundant filter and optional-join
//!    wrappers.
//! 2. [`ConstraintResolver`] walks the tree and composes [`Tuples`] from
//!    index scans: conjunctions become joins, disjunctions appends, filters
//!    row filters, optional constraints left joins, transitive constraints
//!    materialized closures.
//! 3. [`executor`] applies ordering, projection, `DISTINCT` and
//!    limit/offset, and wraps the result in an [`Answer`].
//!
//! # Example
//!
//! ```
//! use triplestore::query::{ConstraintElement, ConstraintExpression, Query, SimpleConstraint};
//! use triplestore::store::{Database, DEFAULT_GRAPH};
//! use triplestore::{EngineConfig, Term, Triple, Variable};
//!
//! let db = Database::new(&EngineConfig::default()).unwrap();
//! let mut txn = db.begin().unwrap();
//! let knows = Term::uri("http://example.org/knows");
//! txn.insert(
//!     &Term::uri(DEFAULT_GRAPH),
//!     &Triple::new(
//!         Term::uri("http://example.org/a"),
//!         knows.clone(),
//!         Term::uri("http://example.org/b"),
//!     ),
//! )
//! .unwrap();
//! txn.commit().unwrap();
//!
//! let pattern = SimpleConstraint::new(
//!     ConstraintElement::var("x"),
//!     ConstraintElement::Term(knows),
//!     ConstraintElement::var("y"),
//! );
//! let query = Query::new(
//!     vec![Variable::new("x"), Variable::new("y")],
//!     ConstraintExpression::Simple(pattern),
//! );
//! let mut answer = triplestore::query::executor::execute(db.snapshot().unwrap(), &query).unwrap();
//! assert!(answer.next().unwrap());
//! assert_eq!(answer.get_by_name("y").unwrap(), Some(Term::uri("http://example.org/b")));
//! answer.close().unwrap();
//! ```
//!
//! [`Tuples`]: crate::tuples::Tuples

mod answer;
mod constraint;
pub mod context;
pub mod executor;
pub mod filter;
mod resolver;
pub mod transform;
mod transitive;
mod types;

pub use answer::{Answer, BooleanAnswer, GraphAnswer};
pub use constraint::{
    ClosureConstraint, ConstraintElement, ConstraintExpression, SimpleConstraint,
    TransitiveConstraint,
};
pub use context::{BindingContext, Context, RowContext};
pub use filter::{Filter, RegexFilter, ValueExpr};
pub use resolver::ConstraintResolver;
pub use types::{AskQuery, ConstructQuery, Order, Query};

use crate::store::StoreError;
use crate::string_pool::GlobalizeError;
use crate::tuples::TuplesError;
use crate::types::Variable;

/// Errors raised while building or resolving a query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("type error: {0}")]
    Type(String),
    #[error("invalid regular expression {pattern:?}: {message}")]
    InvalidRegex { pattern: String, message: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("construct template has {0} elements, which is not a multiple of three")]
    ConstructArity(usize),
    #[error("variable {0} is not bound by the query")]
    UnknownVariable(Variable),
    #[error("{0} has been closed")]
    Closed(&'static str),
    #[error(transparent)]
    Tuples(#[from] TuplesError),
    #[error(transparent)]
    Globalize(#[from] GlobalizeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
