//! Core data-model types shared across the engine.
//!
//! - [`NodeId`]: the dense identifier a term is localized to
//! - [`Term`] / [`Literal`]: RDF terms in their global (display) form
//! - [`Triple`]: a subject-predicate-object statement
//! - [`Variable`]: a named placeholder in a query pattern

mod ids;
mod term;
mod triple;
mod variable;

pub use ids::NodeId;
pub use term::{Literal, Numeric, Term, xsd};
pub use triple::Triple;
pub use variable::Variable;
