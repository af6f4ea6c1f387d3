//! Column projection.

use crate::tuples::{Tuples, TuplesError, check_prefix, row_matches_prefix};
use crate::types::{NodeId, Variable};

/// Tuples restricted (and reordered) to a list of variables.
///
/// A requested variable the inner tuples do not bind is a column that is
/// unbound in every row. Duplicate rows are kept.
#[derive(Debug)]
pub struct ProjectTuples {
    inner: Box<dyn Tuples>,
    variables: Vec<Variable>,
    mapping: Vec<Option<usize>>,
    prefix: Vec<NodeId>,
    closed: bool,
}

impl ProjectTuples {
    #[must_use]
    pub fn new(inner: Box<dyn Tuples>, variables: Vec<Variable>) -> Self {
        let mapping = variables.iter().map(|v| inner.column_index(v)).collect();
        Self {
            inner,
            variables,
            mapping,
            prefix: Vec::new(),
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

impl Tuples for ProjectTuples {
    fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn before_first(&mut self, prefix: &[NodeId]) -> Result<(), TuplesError> {
        self.ensure_open()?;
        check_prefix(prefix, self.variables.len())?;
        self.prefix = prefix.to_vec();
        let pushed: Vec<NodeId> = self
            .mapping
            .iter()
            .zip(prefix)
            .enumerate()
            .take_while(|(output, (mapped, _))| **mapped == Some(*output))
            .map(|(_, (_, value))| *value)
            .collect();
        self.inner.before_first(&pushed)
    }

    fn next(&mut self) -> Result<bool, TuplesError> {
        self.ensure_open()?;
        while self.inner.next()? {
            if row_matches_prefix(&self.prefix, |column| self.column_value(column))? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn column_value(&self, column: usize) -> Result<Option<NodeId>, TuplesError> {
        self.ensure_open()?;
        match self.mapping.get(column) {
            Some(Some(inner_column)) => self.inner.column_value(*inner_column),
            Some(None) => Ok(None),
            None => Err(TuplesError::ColumnOutOfRange {
                column,
                columns: self.variables.len(),
            }),
        }
    }

    fn row_upper_bound(&self) -> u64 {
        self.inner.row_upper_bound()
    }

    fn is_column_ever_unbound(&self, column: usize) -> bool {
        match self.mapping.get(column) {
            Some(Some(inner_column)) => self.inner.is_column_ever_unbound(*inner_column),
            _ => true,
        }
    }

    fn close(&mut self) -> Result<(), TuplesError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.close()
    }
}
