//! Offset / limit window over another tuples.

use crate::tuples::{Tuples, TuplesError, check_prefix, row_matches_prefix};
use crate::types::{NodeId, Variable};

/// Skips `offset` rows, then yields at most `limit` rows.
///
/// The window is taken over the unrestricted row sequence; a prefix given
/// to `before_first` filters within the window.
#[derive(Debug)]
pub struct SliceTuples {
    inner: Box<dyn Tuples>,
    offset: u64,
    limit: Option<u64>,
    prefix: Vec<NodeId>,
    position: u64,
    closed: bool,
}

impl SliceTuples {
    #[must_use]
    pub const fn new(inner: Box<dyn Tuples>, offset: u64, limit: Option<u64>) -> Self {
        Self {
            inner,
            offset,
            limit,
            prefix: Vec::new(),
            position: 0,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), TuplesError> {
        if self.closed {
            return Err(TuplesError::Closed);
        }
        Ok(())
    }

    fn window_end(&self) -> u64 {
        self.limit
            .map_or(u64::MAX, |limit| self.offset.saturating_add(limit))
    }
}

impl Tuples for SliceTuples {
    fn variables(&self) -> &[Variable] {
        self.inner.variables()
    }

    fn before_first(&mut self, prefix: &[NodeId]) -> Result<(), TuplesError> {
        self.ensure_open()?;
        check_prefix(prefix, self.inner.column_count())?;
        self.prefix = prefix.to_vec();
        self.position = 0;
        self.inner.before_first(&[])
    }

    fn next(&mut self) -> Result<bool, TuplesError> {
        self.ensure_open()?;
        let end = self.window_end();
        while self.position < end {
            if !self.inner.next()? {
                self.position = end;
                return Ok(false);
            }
            self.position += 1;
            if self.position <= self.offset {
                continue;
            }
            if row_matches_prefix(&self.prefix, |column| self.inner.column_value(column))? {
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
        let available = self.inner.row_upper_bound().saturating_sub(self.offset);
        self.limit.map_or(available, |limit| available.min(limit))
    }

    fn is_column_ever_unbound(&self, column: usize) -> bool {
        self.inner.is_column_ever_unbound(column)
    }

    fn close(&mut self) -> Result<(), TuplesError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.close()
    }
}
