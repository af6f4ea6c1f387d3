//! Bag union of tuples with possibly different columns.
//!
//! Rows of each operand are emitted in operand order; a column that an
//! operand does not bind is unbound in that operand's rows. Duplicates are
//! kept. The distinct variant lives in [`operations::distinct_append`]
//! (it has to see every row first).
//!
//! [`operations::distinct_append`]: crate::tuples::operations::distinct_append

use crate::tuples::{Tuples, TuplesError, check_prefix, row_matches_prefix};
use crate::types::{NodeId, Variable};

#[derive(Debug)]
pub struct AppendTuples {
    operands: Vec<Box<dyn Tuples>>,
    variables: Vec<Variable>,
    /// Per operand, per output column: the operand's column if it has one.
    mappings: Vec<Vec<Option<usize>>>,
    prefix: Vec<NodeId>,
    current: usize,
    started: bool,
    closed: bool,
}

impl AppendTuples {
    #[must_use]
    pub fn new(operands: Vec<Box<dyn Tuples>>) -> Self {
        let mut variables: Vec<Variable> = Vec::new();
        for operand in &operands {
            for variable in operand.variables() {
                if !variables.contains(variable) {
                    variables.push(variable.clone());
                }
            }
        }
        let mappings = operands
            .iter()
            .map(|operand| variables.iter().map(|v| operand.column_index(v)).collect())
            .collect();
        Self {
            operands,
            variables,
            mappings,
            prefix: Vec::new(),
            current: 0,
            started: false,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), TuplesError> {
        if self.closed {
            return Err(TuplesError::Closed);
        }
        Ok(())
    }

    /// Reset operand `index`, pushing down the part of the outer prefix it
    /// can serve as leading columns.
    fn reset_operand(&mut self, index: usize) -> Result<(), TuplesError> {
        let pushed = self.mappings[index]
            .iter()
            .zip(&self.prefix)
            .enumerate()
            .take_while(|(output, (mapped, _))| **mapped == Some(*output))
            .map(|(_, (_, value))| *value)
            .collect::<Vec<_>>();
        self.operands[index].before_first(&pushed)
    }
}

impl Tuples for AppendTuples {
    fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn before_first(&mut self, prefix: &[NodeId]) -> Result<(), TuplesError> {
        self.ensure_open()?;
        check_prefix(prefix, self.variables.len())?;
        self.prefix = prefix.to_vec();
        self.current = 0;
        self.started = false;
        Ok(())
    }

    fn next(&mut self) -> Result<bool, TuplesError> {
        self.ensure_open()?;
        if !self.started {
            self.started = true;
            if self.operands.is_empty() {
                return Ok(false);
            }
            self.reset_operand(0)?;
        }
        while self.current < self.operands.len() {
            if self.operands[self.current].next()? {
                if row_matches_prefix(&self.prefix, |column| self.column_value(column))? {
                    return Ok(true);
                }
                continue;
            }
            self.current += 1;
            if self.current < self.operands.len() {
                self.reset_operand(self.current)?;
            }
        }
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
        if !self.started || self.current >= self.operands.len() {
            return Err(TuplesError::NoCurrentRow);
        }
        match self.mappings[self.current][column] {
            Some(operand_column) => self.operands[self.current].column_value(operand_column),
            None => Ok(None),
        }
    }

    fn row_upper_bound(&self) -> u64 {
        self.operands
            .iter()
            .fold(0u64, |bound, operand| bound.saturating_add(operand.row_upper_bound()))
    }

    fn is_column_ever_unbound(&self, column: usize) -> bool {
        self.operands
            .iter()
            .zip(&self.mappings)
            .any(|(operand, mapping)| match mapping.get(column).copied().flatten() {
                Some(operand_column) => operand.is_column_ever_unbound(operand_column),
                None => true,
            })
    }

    fn close(&mut self) -> Result<(), TuplesError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let mut first_error = None;
        for operand in &mut self.operands {
            if let Err(e) = operand.close() {
                tracing::warn!("Failed to close append operand: {e}");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
