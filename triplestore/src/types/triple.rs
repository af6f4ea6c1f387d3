//! RDF statements.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Term;

/// A subject-predicate-object statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    /// The resource the statement is about.
    pub subject: Term,
    /// The relation.
    pub predicate: Term,
    /// The value.
    pub object: Term,
}

impl Triple {
    /// Create a new triple.
    #[must_use]
    pub const fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Whether the triple is a legal RDF statement: the subject is not a
    /// literal and the predicate is a URI.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !self.subject.is_literal() && self.predicate.is_uri()
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}
