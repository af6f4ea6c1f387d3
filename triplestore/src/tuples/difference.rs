//! Difference (MINUS): rows of the minuend with no compatible subtrahend row.
//!
//! A subtrahend row removes a minuend row when every shared variable bound
//! in both agrees and at least one shared variable is bound in both.

use crate::tuples::{
    Tuples, TuplesError, check_prefix, describe_variables, row_matches_prefix,
};
use crate::types::{NodeId, Variable};

#[derive(Debug)]
pub struct DifferenceTuples {
    minuend: Box<dyn Tuples>,
    subtrahend: Box<dyn Tuples>,
    /// (minuend column, subtrahend column) for each shared variable.
    shared: Vec<(usize, usize)>,
    prefix: Vec<NodeId>,
    closed: bool,
}

impl DifferenceTuples {
    /// Subtract `subtrahend` from `minuend`.
    ///
    /// # Errors
    /// Fails with [`TuplesError::NoCommonVariables`] when both sides have
    /// columns but share none. Both operands are closed on failure.
    pub fn new(
        mut minuend: Box<dyn Tuples>,
        mut subtrahend: Box<dyn Tuples>,
    ) -> Result<Self, TuplesError> {
        let shared: Vec<(usize, usize)> = minuend
            .variables()
            .iter()
            .enumerate()
            .filter_map(|(m, variable)| subtrahend.column_index(variable).map(|s| (m, s)))
            .collect();
        if shared.is_empty() && minuend.column_count() > 0 && subtrahend.column_count() > 0 {
            let error = TuplesError::NoCommonVariables {
                minuend: describe_variables(minuend.variables()),
                subtrahend: describe_variables(subtrahend.variables()),
            };
            crate::tuples::close_quietly(minuend.as_mut());
            crate::tuples::close_quietly(subtrahend.as_mut());
            return Err(error);
        }
        Ok(Self {
            minuend,
            subtrahend,
            shared,
            prefix: Vec::new(),
            closed: false,
        })
    }

    fn ensure_open(&self) -> Result<(), TuplesError> {
        if self.closed {
            return Err(TuplesError::Closed);
        }
        Ok(())
    }

    /// Whether some subtrahend row excludes the current minuend row.
    fn excluded(&mut self) -> Result<bool, TuplesError> {
        self.subtrahend.before_first(&[])?;
        while self.subtrahend.next()? {
            let mut overlap = false;
            let mut compatible = true;
            for (m, s) in &self.shared {
                if let (Some(a), Some(b)) = (
                    self.minuend.column_value(*m)?,
                    self.subtrahend.column_value(*s)?,
                ) {
                    overlap = true;
                    if a != b {
                        compatible = false;
                        break;
                    }
                }
            }
            if overlap && compatible {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Tuples for DifferenceTuples {
    fn variables(&self) -> &[Variable] {
        self.minuend.variables()
    }

    fn before_first(&mut self, prefix: &[NodeId]) -> Result<(), TuplesError> {
        self.ensure_open()?;
        check_prefix(prefix, self.minuend.column_count())?;
        self.prefix = prefix.to_vec();
        self.minuend.before_first(prefix)
    }

    fn next(&mut self) -> Result<bool, TuplesError> {
        self.ensure_open()?;
        while self.minuend.next()? {
            if !row_matches_prefix(&self.prefix, |column| self.minuend.column_value(column))? {
                continue;
            }
            if self.shared.is_empty() || !self.excluded()? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn column_value(&self, column: usize) -> Result<Option<NodeId>, TuplesError> {
        self.ensure_open()?;
        self.minuend.column_value(column)
    }

    fn row_upper_bound(&self) -> u64 {
        self.minuend.row_upper_bound()
    }

    fn is_column_ever_unbound(&self, column: usize) -> bool {
        self.minuend.is_column_ever_unbound(column)
    }

    fn close(&mut self) -> Result<(), TuplesError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let minuend = self.minuend.close();
        let subtrahend = self.subtrahend.close();
        minuend.and(subtrahend)
    }
}
