//! Row filter over another tuples.
//!
//! Before each test the filter is handed a [`RowContext`] over the inner
//! tuples' current row. An evaluation error aborts iteration with
//! [`TuplesError::Filter`]; it is never treated as "row rejected".

use crate::query::filter::{Filter, RowContext};
use crate::store::Snapshot;
use crate::tuples::{Tuples, TuplesError};
use crate::types::{NodeId, Variable};

#[derive(Debug)]
pub struct FilteredTuples {
    inner: Box<dyn Tuples>,
    filter: Filter,
    snapshot: Snapshot,
    closed: bool,
}

impl FilteredTuples {
    #[must_use]
    pub const fn new(inner: Box<dyn Tuples>, filter: Filter, snapshot: Snapshot) -> Self {
        Self {
            inner,
            filter,
            snapshot,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), TuplesError> {
        if self.closed {
            return Err(TuplesError::Closed);
        }
        Ok(())
    }
}

impl Tuples for FilteredTuples {
    fn variables(&self) -> &[Variable] {
        self.inner.variables()
    }

    fn before_first(&mut self, prefix: &[NodeId]) -> Result<(), TuplesError> {
        self.ensure_open()?;
        self.inner.before_first(prefix)
    }

    fn next(&mut self) -> Result<bool, TuplesError> {
        self.ensure_open()?;
        while self.inner.next()? {
            let context = RowContext::new(self.inner.as_ref(), &self.snapshot);
            let accepted = self
                .filter
                .test(&context)
                .map_err(|e| TuplesError::Filter(Box::new(e)))?;
            if accepted {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn column_value(&self, column: usize) -> Result<Option<NodeId>, TuplesError> {
        self.ensure_open()?;
        self.inner.column_value(column)
    }

    fn row_upper_bound(&self) -> u64 {
        self.inner.row_upper_bound()
    }

    fn is_column_ever_unbound(&self, column: usize) -> bool {
        self.inner.is_column_ever_unbound(column)
    }

    fn define_prefix(&mut self, bound: &std::collections::HashSet<Variable>) {
        self.inner.define_prefix(bound);
    }

    fn close(&mut self) -> Result<(), TuplesError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.close()
    }
}
