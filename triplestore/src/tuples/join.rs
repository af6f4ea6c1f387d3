//! Nested-loop join of any number of operands.
//!
//! Operands are visited in order; each inner operand is reset with a
//! prefix built from the values that outer operands bound for its leading
//! columns, so an operand whose leading columns were arranged by
//! `define_prefix` becomes an index lookup rather than a full scan.
//! Shared columns that are not part of that prefix are checked row by row.
//!
//! # Invariants
//!
//! - Output columns are the operands' variables in first-appearance order.
//! - Two values for the same variable are compatible when equal or when
//!   either is unbound; the output takes the first bound one.

use crate::tuples::{Tuples, TuplesError, check_prefix, row_matches_prefix};
use crate::types::{NodeId, Variable};

/// Join of operands that may leave shared columns unbound.
#[derive(Debug)]
pub struct UnboundJoin {
    operands: Vec<Box<dyn Tuples>>,
    variables: Vec<Variable>,
    /// Per output column: every (operand, column) binding it, in operand order.
    binders: Vec<Vec<(usize, usize)>>,
    /// Per operand: (own column, earlier operand, earlier column) to check.
    shared: Vec<Vec<(usize, usize, usize)>>,
    /// Per operand: the source of each leading column supplied as prefix.
    prefix_sources: Vec<Vec<(usize, usize)>>,
    ever_unbound: Vec<bool>,
    prefix: Vec<NodeId>,
    started: bool,
    exhausted: bool,
    closed: bool,
}

impl UnboundJoin {
    /// Join `operands` in the given order.
    #[must_use]
    pub fn new(operands: Vec<Box<dyn Tuples>>) -> Self {
        let mut variables: Vec<Variable> = Vec::new();
        let mut binders: Vec<Vec<(usize, usize)>> = Vec::new();
        let mut shared = Vec::with_capacity(operands.len());
        let mut prefix_sources = Vec::with_capacity(operands.len());

        for (index, operand) in operands.iter().enumerate() {
            let mut checks = Vec::new();
            for (column, variable) in operand.variables().iter().enumerate() {
                match variables.iter().position(|v| v == variable) {
                    Some(output) => {
                        for (earlier, earlier_column) in &binders[output] {
                            checks.push((column, *earlier, *earlier_column));
                        }
                        binders[output].push((index, column));
                    }
                    None => {
                        variables.push(variable.clone());
                        binders.push(vec![(index, column)]);
                    }
                }
            }
            shared.push(checks);

            let mut sources = Vec::new();
            for variable in operand.variables() {
                let source = variables
                    .iter()
                    .position(|v| v == variable)
                    .and_then(|output| {
                        binders[output].iter().copied().find(|(earlier, earlier_column)| {
                            *earlier < index
                                && !operands[*earlier].is_column_ever_unbound(*earlier_column)
                        })
                    });
                match source {
                    Some(source) => sources.push(source),
                    None => break,
                }
            }
            prefix_sources.push(sources);
        }

        let ever_unbound = binders
            .iter()
            .map(|sources| {
                sources
                    .iter()
                    .all(|(operand, column)| operands[*operand].is_column_ever_unbound(*column))
            })
            .collect();

        Self {
            operands,
            variables,
            binders,
            shared,
            prefix_sources,
            ever_unbound,
            prefix: Vec::new(),
            started: false,
            exhausted: false,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), TuplesError> {
        if self.closed {
            return Err(TuplesError::Closed);
        }
        Ok(())
    }

    fn reset_level(&mut self, level: usize) -> Result<(), TuplesError> {
        let mut values = Vec::with_capacity(self.prefix_sources[level].len());
        if level == 0 {
            let width = self.operands[0].column_count().min(self.prefix.len());
            values.extend_from_slice(&self.prefix[..width]);
        } else {
            for (operand, column) in &self.prefix_sources[level] {
                match self.operands[*operand].column_value(*column)? {
                    Some(value) => values.push(value),
                    None => break,
                }
            }
        }
        self.operands[level].before_first(&values)
    }

    fn compatible(&self, level: usize) -> Result<bool, TuplesError> {
        for (column, earlier, earlier_column) in &self.shared[level] {
            let mine = self.operands[level].column_value(*column)?;
            let theirs = self.operands[*earlier].column_value(*earlier_column)?;
            if let (Some(a), Some(b)) = (mine, theirs) {
                if a != b {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

impl Tuples for UnboundJoin {
    fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn before_first(&mut self, prefix: &[NodeId]) -> Result<(), TuplesError> {
        self.ensure_open()?;
        check_prefix(prefix, self.variables.len())?;
        self.prefix = prefix.to_vec();
        self.started = false;
        self.exhausted = false;
        Ok(())
    }

    fn next(&mut self) -> Result<bool, TuplesError> {
        self.ensure_open()?;
        if self.exhausted {
            return Ok(false);
        }
        let depth = self.operands.len();
        if depth == 0 {
            let first = !self.started;
            self.started = true;
            self.exhausted = !first;
            return Ok(first);
        }

        let mut level = if self.started {
            depth - 1
        } else {
            self.started = true;
            self.reset_level(0)?;
            0
        };

        loop {
            if self.operands[level].next()? {
                if !self.compatible(level)? {
                    continue;
                }
                if level + 1 == depth {
                    if row_matches_prefix(&self.prefix, |column| self.column_value(column))? {
                        return Ok(true);
                    }
                    continue;
                }
                level += 1;
                self.reset_level(level)?;
            } else if level == 0 {
                self.exhausted = true;
                return Ok(false);
            } else {
                level -= 1;
            }
        }
    }

    fn column_value(&self, column: usize) -> Result<Option<NodeId>, TuplesError> {
        self.ensure_open()?;
        let sources = self.binders.get(column).ok_or(TuplesError::ColumnOutOfRange {
            column,
            columns: self.variables.len(),
        })?;
        if !self.started || self.exhausted {
            return Err(TuplesError::NoCurrentRow);
        }
        for (operand, operand_column) in sources {
            if let Some(value) = self.operands[*operand].column_value(*operand_column)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn row_upper_bound(&self) -> u64 {
        self.operands
            .iter()
            .fold(1u64, |bound, operand| bound.saturating_mul(operand.row_upper_bound()))
    }

    fn is_column_ever_unbound(&self, column: usize) -> bool {
        self.ever_unbound.get(column).copied().unwrap_or(true)
    }

    fn close(&mut self) -> Result<(), TuplesError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let mut first_error = None;
        for operand in &mut self.operands {
            if let Err(e) = operand.close() {
                tracing::warn!("Failed to close join operand: {e}");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
