//! Tuples: ordered, closable streams of variable-binding rows.
//!
//! Every intermediate and final result of query resolution is a
//! [`Tuples`]. Each implementation is a separate struct composed from its
//! children (leaf scan, join, left join, append, difference, filter, ...),
//! and owns those children: closing a composite closes everything beneath
//! it.
//!
//! # Invariants
//!
//! - The column set never changes after construction.
//! - `before_first` parks the cursor before row 0; `next` returns `false`
//!   and stays parked at the end once exhausted.
//! - `row_upper_bound() >= row_count()`.
//! - `close` is idempotent: the first call releases resources, later calls
//!   do nothing. Any other call after `close` fails with
//!   [`TuplesError::Closed`].
//! - A value of `None` means the column is unbound in the current row.
//!   Unbound values are compatible with every value when rows are joined.

mod append;
mod difference;
mod filtered;
mod join;
mod left_join;
mod literal;
pub mod operations;
mod project;
mod slice;
mod statement;

use std::collections::HashSet;
use std::fmt;

pub use append::AppendTuples;
pub use difference::DifferenceTuples;
pub use filtered::FilteredTuples;
pub use join::UnboundJoin;
pub use left_join::LeftJoinTuples;
pub use literal::LiteralTuples;
pub use project::ProjectTuples;
pub use slice::SliceTuples;
pub use statement::{Slot, StatementTuples};

use crate::query::QueryError;
use crate::store::StoreError;
use crate::string_pool::GlobalizeError;
use crate::types::{NodeId, Variable};

/// Errors raised while iterating tuples.
#[derive(Debug, thiserror::Error)]
pub enum TuplesError {
    #[error("prefix of length {prefix} exceeds column count {columns}")]
    PrefixTooLong { prefix: usize, columns: usize },
    #[error("tuples have been closed")]
    Closed,
    #[error("column {column} out of range (tuples have {columns} columns)")]
    ColumnOutOfRange { column: usize, columns: usize },
    #[error("no current row")]
    NoCurrentRow,
    #[error("cannot subtract tuples with no common variables ({minuend} - {subtrahend})")]
    NoCommonVariables { minuend: String, subtrahend: String },
    #[error("filter failed: {0}")]
    Filter(Box<QueryError>),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Globalize(#[from] GlobalizeError),
}

/// Coarse row count class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Zero,
    One,
    Many,
}

/// An ordered, closable stream of rows over a fixed set of variables.
pub trait Tuples: Send + fmt::Debug {
    /// The variables, in column order.
    fn variables(&self) -> &[Variable];

    fn column_count(&self) -> usize {
        self.variables().len()
    }

    /// Column of `variable`, if these tuples bind it.
    fn column_index(&self, variable: &Variable) -> Option<usize> {
        self.variables().iter().position(|v| v == variable)
    }

    /// Reset the cursor to before the first row.
    ///
    /// A non-empty `prefix` restricts iteration to rows whose leading
    /// columns equal it. Unbound leading values match any prefix value.
    fn before_first(&mut self, prefix: &[NodeId]) -> Result<(), TuplesError>;

    /// Advance one row. Returns `false` at the end.
    fn next(&mut self) -> Result<bool, TuplesError>;

    /// Value of `column` in the current row, `None` if unbound.
    fn column_value(&self, column: usize) -> Result<Option<NodeId>, TuplesError>;

    /// A cheap bound that is never below the real row count.
    fn row_upper_bound(&self) -> u64;

    /// Whether `column` may be unbound in some row.
    fn is_column_ever_unbound(&self, column: usize) -> bool;

    /// Exact row count. Iterates, and leaves the cursor before the first row.
    fn row_count(&mut self) -> Result<u64, TuplesError> {
        self.before_first(&[])?;
        let mut count = 0;
        while self.next()? {
            count += 1;
        }
        self.before_first(&[])?;
        Ok(count)
    }

    /// Zero, one or many rows. Leaves the cursor before the first row.
    fn cardinality(&mut self) -> Result<Cardinality, TuplesError> {
        if self.row_upper_bound() == 0 {
            return Ok(Cardinality::Zero);
        }
        self.before_first(&[])?;
        let cardinality = if !self.next()? {
            Cardinality::Zero
        } else if self.next()? {
            Cardinality::Many
        } else {
            Cardinality::One
        };
        self.before_first(&[])?;
        Ok(cardinality)
    }

    /// Hint that `bound` will be supplied as a prefix by an enclosing join.
    ///
    /// Implementations that can serve those variables as leading columns
    /// reorder their columns accordingly; the default does nothing.
    fn define_prefix(&mut self, _bound: &HashSet<Variable>) {}

    /// Release resources. Idempotent.
    fn close(&mut self) -> Result<(), TuplesError>;
}

/// A materialized row.
pub type Row = Vec<Option<NodeId>>;

/// Close every tuples in `tuples`, logging (not returning) failures.
pub fn close_all(tuples: &mut [Box<dyn Tuples>]) {
    for t in tuples {
        if let Err(e) = t.close() {
            tracing::warn!("Failed to close tuples during cleanup: {e}");
        }
    }
}

/// Close `tuples`, logging a failure instead of returning it.
pub fn close_quietly(tuples: &mut dyn Tuples) {
    if let Err(e) = tuples.close() {
        tracing::warn!("Failed to close tuples during cleanup: {e}");
    }
}

/// Read every remaining row from the start, then close.
///
/// The tuples are closed even when reading fails.
pub fn materialize(tuples: &mut dyn Tuples) -> Result<Vec<Row>, TuplesError> {
    let rows = read_rows(tuples);
    let closed = tuples.close();
    let rows = rows?;
    closed?;
    Ok(rows)
}

fn read_rows(tuples: &mut dyn Tuples) -> Result<Vec<Row>, TuplesError> {
    let columns = tuples.column_count();
    let mut rows = Vec::new();
    tuples.before_first(&[])?;
    while tuples.next()? {
        let row = (0..columns)
            .map(|column| tuples.column_value(column))
            .collect::<Result<Row, _>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Check a prefix length against the column count.
pub(crate) fn check_prefix(prefix: &[NodeId], columns: usize) -> Result<(), TuplesError> {
    if prefix.len() > columns {
        return Err(TuplesError::PrefixTooLong {
            prefix: prefix.len(),
            columns,
        });
    }
    Ok(())
}

/// Whether the leading values of a row match `prefix`.
pub(crate) fn row_matches_prefix<F>(prefix: &[NodeId], value: F) -> Result<bool, TuplesError>
where
    F: Fn(usize) -> Result<Option<NodeId>, TuplesError>,
{
    for (column, expected) in prefix.iter().enumerate() {
        if let Some(actual) = value(column)? {
            if actual != *expected {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Variables of `left` followed by the variables of `right` not in `left`.
pub(crate) fn union_variables(left: &[Variable], right: &[Variable]) -> Vec<Variable> {
    let mut variables = left.to_vec();
    for variable in right {
        if !variables.contains(variable) {
            variables.push(variable.clone());
        }
    }
    variables
}

pub(crate) fn describe_variables(variables: &[Variable]) -> String {
    let names: Vec<String> = variables.iter().map(ToString::to_string).collect();
    format!("[{}]", names.join(", "))
}
