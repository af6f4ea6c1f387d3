//! Variable bindings seen by filters.
//!
//! A filter never looks at tuples directly; it asks a [`Context`] for the
//! term bound to a variable. During resolution the context is the current
//! row of the tuples being filtered ([`RowContext`]); elsewhere (tests,
//! evaluating a filter against hand-made bindings) it is a
//! [`BindingContext`].

use std::collections::HashMap;

use crate::query::QueryError;
use crate::store::Snapshot;
use crate::tuples::Tuples;
use crate::types::{Term, Variable};

/// Source of variable bindings for filter evaluation.
pub trait Context {
    /// The term bound to `variable`, `None` if it is unbound or not a
    /// column of the current row.
    fn lookup(&self, variable: &Variable) -> Result<Option<Term>, QueryError>;
}

/// The current row of a tuples, globalized through a snapshot.
pub struct RowContext<'a> {
    tuples: &'a dyn Tuples,
    snapshot: &'a Snapshot,
}

impl<'a> RowContext<'a> {
    #[must_use]
    pub const fn new(tuples: &'a dyn Tuples, snapshot: &'a Snapshot) -> Self {
        Self { tuples, snapshot }
    }
}

impl Context for RowContext<'_> {
    fn lookup(&self, variable: &Variable) -> Result<Option<Term>, QueryError> {
        let Some(column) = self.tuples.column_index(variable) else {
            return Ok(None);
        };
        match self.tuples.column_value(column)? {
            Some(id) => Ok(Some(self.snapshot.globalize(id)?)),
            None => Ok(None),
        }
    }
}

/// A context that holds variable bindings directly.
#[derive(Debug, Default, Clone)]
pub struct BindingContext {
    bindings: HashMap<Variable, Term>,
}

impl BindingContext {
    /// Create a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable to a term, replacing any previous binding.
    pub fn set(&mut self, variable: Variable, term: Term) {
        self.bindings.insert(variable, term);
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, variable: &str, term: Term) -> Self {
        self.set(Variable::new(variable), term);
        self
    }

    #[must_use]
    pub fn get(&self, variable: &Variable) -> Option<&Term> {
        self.bindings.get(variable)
    }

    pub fn remove(&mut self, variable: &Variable) -> Option<Term> {
        self.bindings.remove(variable)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Whether every variable bound in both contexts is bound to the same
    /// term.
    #[must_use]
    pub fn is_consistent_with(&self, other: &Self) -> bool {
        self.bindings.iter().all(|(variable, term)| {
            other.bindings.get(variable).is_none_or(|theirs| theirs == term)
        })
    }
}

impl Context for BindingContext {
    fn lookup(&self, variable: &Variable) -> Result<Option<Term>, QueryError> {
        Ok(self.bindings.get(variable).cloned())
    }
}
