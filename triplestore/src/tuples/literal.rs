//! Materialized tuples.
//!
//! Used for results computed eagerly (transitive closures, sorted and
//! distinct results, assignments) and for the constant tuples: no rows
//! (`empty`) and one row with no columns (`unconstrained`).

use std::collections::HashSet;

use crate::tuples::{Row, Tuples, TuplesError, check_prefix, row_matches_prefix};
use crate::types::{NodeId, Variable};

/// Tuples backed by an in-memory row list.
///
/// # Invariants
/// - Every row has exactly `variables.len()` values
#[derive(Debug)]
pub struct LiteralTuples {
    variables: Vec<Variable>,
    rows: Vec<Row>,
    ever_unbound: Vec<bool>,
    prefix: Vec<NodeId>,
    current: Option<usize>,
    next_row: usize,
    closed: bool,
}

impl LiteralTuples {
    /// Create tuples over `rows`. Rows are padded or truncated to the
    /// column count.
    #[must_use]
    pub fn new(variables: Vec<Variable>, mut rows: Vec<Row>) -> Self {
        let width = variables.len();
        for row in &mut rows {
            row.resize(width, None);
        }
        let ever_unbound = (0..width)
            .map(|column| rows.iter().any(|row| row[column].is_none()))
            .collect();
        Self {
            variables,
            rows,
            ever_unbound,
            prefix: Vec::new(),
            current: None,
            next_row: 0,
            closed: false,
        }
    }

    /// No rows over the given columns.
    #[must_use]
    pub fn empty(variables: Vec<Variable>) -> Self {
        Self::new(variables, Vec::new())
    }

    /// One row with no columns: the identity of join.
    #[must_use]
    pub fn unconstrained() -> Self {
        Self::new(Vec::new(), vec![Vec::new()])
    }

    /// One column holding each of `values` in order.
    #[must_use]
    pub fn single_column(variable: Variable, values: &[NodeId]) -> Self {
        let rows = values.iter().map(|id| vec![Some(*id)]).collect();
        Self::new(vec![variable], rows)
    }

    fn ensure_open(&self) -> Result<(), TuplesError> {
        if self.closed {
            return Err(TuplesError::Closed);
        }
        Ok(())
    }
}

impl Tuples for LiteralTuples {
    fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn before_first(&mut self, prefix: &[NodeId]) -> Result<(), TuplesError> {
        self.ensure_open()?;
        check_prefix(prefix, self.variables.len())?;
        self.prefix = prefix.to_vec();
        self.current = None;
        self.next_row = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<bool, TuplesError> {
        self.ensure_open()?;
        while self.next_row < self.rows.len() {
            let candidate = self.next_row;
            self.next_row += 1;
            let row = &self.rows[candidate];
            if row_matches_prefix(&self.prefix, |column| Ok(row[column]))? {
                self.current = Some(candidate);
                return Ok(true);
            }
        }
        self.current = None;
        Ok(false)
    }

    fn column_value(&self, column: usize) -> Result<Option<NodeId>, TuplesError> {
        self.ensure_open()?;
        if column >= self.variables.len() {
            return Err(TuplesError::ColumnOutOfRange {
                column,
                columns: self.variables.len(),
            });
        }
        let row = self.current.ok_or(TuplesError::NoCurrentRow)?;
        Ok(self.rows[row][column])
    }

    fn row_upper_bound(&self) -> u64 {
        self.rows.len() as u64
    }

    fn row_count(&mut self) -> Result<u64, TuplesError> {
        self.ensure_open()?;
        if self.prefix.is_empty() {
            return Ok(self.rows.len() as u64);
        }
        let prefix = &self.prefix;
        let mut count = 0;
        for row in &self.rows {
            if row_matches_prefix(prefix, |column| Ok(row[column]))? {
                count += 1;
            }
        }
        Ok(count)
    }

    fn is_column_ever_unbound(&self, column: usize) -> bool {
        self.ever_unbound.get(column).copied().unwrap_or(true)
    }

    fn define_prefix(&mut self, bound: &HashSet<Variable>) {
        let mut order: Vec<usize> = (0..self.variables.len())
            .filter(|column| bound.contains(&self.variables[*column]))
            .collect();
        order.extend(
            (0..self.variables.len()).filter(|column| !bound.contains(&self.variables[*column])),
        );
        if order.iter().enumerate().all(|(position, column)| position == *column) {
            return;
        }
        self.variables = order.iter().map(|column| self.variables[*column].clone()).collect();
        self.ever_unbound = order.iter().map(|column| self.ever_unbound[*column]).collect();
        for row in &mut self.rows {
            *row = order.iter().map(|column| row[*column]).collect();
        }
    }

    fn close(&mut self) -> Result<(), TuplesError> {
        self.closed = true;
        self.rows = Vec::new();
        self.current = None;
        Ok(())
    }
}
