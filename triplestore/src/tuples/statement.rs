//! Leaf tuples: a scan of the quad index for one statement pattern.
//!
//! Rows are fetched from the best permutation in batches of
//! `scan_batch_size` into a buffer leased from the cursor pool, resuming
//! after the last key of the previous batch. Nothing beyond one batch is
//! ever materialized.
//!
//! # Invariants
//!
//! - Columns are the distinct variables of the pattern; a variable that
//!   occurs in several positions only matches quads where those positions
//!   hold the same node.
//! - The leased buffer is returned exactly once: on `close`, or on drop
//!   if the tuples were never closed.

use std::collections::HashSet;

use crate::store::index::{Permutation, Quad};
use crate::store::{ScanBuffer, Snapshot};
use crate::tuples::{Tuples, TuplesError, check_prefix};
use crate::types::{NodeId, Variable};

/// One position of a statement pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Bound(NodeId),
    Variable(Variable),
}

/// Tuples over the quads matching a pattern.
#[derive(Debug)]
pub struct StatementTuples {
    snapshot: Snapshot,
    constants: [Option<NodeId>; 4],
    variables: Vec<Variable>,
    /// Canonical quad positions of each column.
    positions: Vec<Vec<usize>>,
    upper_bound: u64,
    buffer: Option<ScanBuffer>,
    // Per-pass scan state, reset by `before_first`.
    bound: [Option<NodeId>; 4],
    permutation: Permutation,
    key_prefix: Vec<NodeId>,
    last_key: Option<Quad>,
    cursor: usize,
    exhausted: bool,
    current: Option<Quad>,
    closed: bool,
}

impl StatementTuples {
    /// Open a scan over `pattern` (subject, predicate, object, graph).
    #[must_use]
    pub fn new(snapshot: Snapshot, pattern: [Slot; 4]) -> Self {
        let mut constants = [None; 4];
        let mut variables: Vec<Variable> = Vec::new();
        let mut positions: Vec<Vec<usize>> = Vec::new();
        for (position, slot) in pattern.into_iter().enumerate() {
            match slot {
                Slot::Bound(id) => constants[position] = Some(id),
                Slot::Variable(variable) => {
                    if let Some(column) = variables.iter().position(|v| *v == variable) {
                        positions[column].push(position);
                    } else {
                        variables.push(variable);
                        positions.push(vec![position]);
                    }
                }
            }
        }

        let bound_mask = constants.map(|c| c.is_some());
        let permutation = Permutation::select(&bound_mask);
        let key_prefix = key_prefix(permutation, &constants);
        let upper_bound = snapshot.index().range_len(permutation, &key_prefix) as u64;
        let buffer = Some(snapshot.cursor_pool().lease());

        Self {
            snapshot,
            constants,
            variables,
            positions,
            upper_bound,
            buffer,
            bound: constants,
            permutation,
            key_prefix,
            last_key: None,
            cursor: 0,
            exhausted: false,
            current: None,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), TuplesError> {
        if self.closed {
            return Err(TuplesError::Closed);
        }
        Ok(())
    }

    /// Whether a quad satisfies every bound position and repeated variable.
    fn accepts(&self, quad: &Quad) -> bool {
        let bound_ok = self
            .bound
            .iter()
            .zip(quad)
            .all(|(expected, actual)| expected.is_none_or(|id| id == *actual));
        bound_ok
            && self.positions.iter().all(|positions| {
                positions
                    .windows(2)
                    .all(|pair| quad[pair[0]] == quad[pair[1]])
            })
    }

    /// Fetch the next batch. Returns `false` if nothing more was found.
    fn refill(&mut self) -> Result<bool, TuplesError> {
        let Some(buffer) = self.buffer.as_mut() else {
            return Err(TuplesError::Closed);
        };
        buffer.clear();
        let batch_size = self.snapshot.cursor_pool().batch_size();
        self.snapshot.index().scan_batch(
            self.permutation,
            &self.key_prefix,
            self.last_key.as_ref(),
            batch_size,
            buffer,
        );
        self.cursor = 0;
        if buffer.len() < batch_size {
            self.exhausted = true;
        }
        self.last_key = buffer.last().copied();
        Ok(!buffer.is_empty())
    }
}

fn key_prefix(permutation: Permutation, bound: &[Option<NodeId>; 4]) -> Vec<NodeId> {
    permutation
        .order()
        .iter()
        .map_while(|position| bound[*position])
        .collect()
}

impl Tuples for StatementTuples {
    fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn before_first(&mut self, prefix: &[NodeId]) -> Result<(), TuplesError> {
        self.ensure_open()?;
        check_prefix(prefix, self.variables.len())?;

        let mut bound = self.constants;
        for (column, id) in prefix.iter().enumerate() {
            for position in &self.positions[column] {
                bound[*position] = Some(*id);
            }
        }
        self.bound = bound;
        self.permutation = Permutation::select(&bound.map(|b| b.is_some()));
        self.key_prefix = key_prefix(self.permutation, &bound);
        self.last_key = None;
        self.cursor = 0;
        self.exhausted = false;
        self.current = None;
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.clear();
        }
        Ok(())
    }

    fn next(&mut self) -> Result<bool, TuplesError> {
        self.ensure_open()?;
        loop {
            let candidate = self
                .buffer
                .as_ref()
                .and_then(|buffer| buffer.get(self.cursor).copied());
            if let Some(key) = candidate {
                self.cursor += 1;
                let quad = self.permutation.unpermute(&key);
                if self.accepts(&quad) {
                    self.current = Some(quad);
                    return Ok(true);
                }
                continue;
            }
            if self.exhausted || !self.refill()? {
                self.exhausted = true;
                self.current = None;
                return Ok(false);
            }
        }
    }

    fn column_value(&self, column: usize) -> Result<Option<NodeId>, TuplesError> {
        self.ensure_open()?;
        let positions = self
            .positions
            .get(column)
            .ok_or(TuplesError::ColumnOutOfRange {
                column,
                columns: self.variables.len(),
            })?;
        let quad = self.current.ok_or(TuplesError::NoCurrentRow)?;
        Ok(positions.first().map(|position| quad[*position]))
    }

    fn row_upper_bound(&self) -> u64 {
        self.upper_bound
    }

    fn is_column_ever_unbound(&self, _column: usize) -> bool {
        false
    }

    fn define_prefix(&mut self, bound: &HashSet<Variable>) {
        let mut order: Vec<usize> = (0..self.variables.len())
            .filter(|column| bound.contains(&self.variables[*column]))
            .collect();
        order.extend(
            (0..self.variables.len()).filter(|column| !bound.contains(&self.variables[*column])),
        );
        self.variables = order.iter().map(|column| self.variables[*column].clone()).collect();
        self.positions = order.iter().map(|column| self.positions[*column].clone()).collect();
    }

    fn close(&mut self) -> Result<(), TuplesError> {
        if !self.closed {
            self.closed = true;
            self.current = None;
            self.buffer = None;
        }
        Ok(())
    }
}

impl Drop for StatementTuples {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                "Statement tuples over {:?} dropped without close",
                self.variables
            );
        }
    }
}
