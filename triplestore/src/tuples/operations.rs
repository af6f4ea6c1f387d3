//! Composition helpers over [`Tuples`].
//!
//! These are the entry points the resolver uses; they pick the concrete
//! tuples type and take care of the degenerate cases (no operands, an
//! operand with no rows, a single operand).
//!
//! # Join ordering
//!
//! Single-row operands go first: they bind their variables for free. The
//! remaining operands are chosen greedily, cheapest first, where the cost of
//! an operand is its row upper bound discounted by how many of its
//! variables are already bound by the operands chosen before it. Each
//! chosen operand is told (through `define_prefix`) which of its variables
//! will arrive bound, so it can answer those as an index prefix.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::store::Snapshot;
use crate::tuples::{
    AppendTuples, LiteralTuples, ProjectTuples, Row, SliceTuples, Tuples, TuplesError, UnboundJoin,
    close_all, materialize,
};
use crate::types::Variable;

/// Join `operands`, choosing the evaluation order.
///
/// An empty operand list is the unconstrained (one empty row) tuples.
///
/// # Errors
/// Fails if an operand cannot be inspected; every operand is closed on
/// failure.
pub fn join(mut operands: Vec<Box<dyn Tuples>>) -> Result<Box<dyn Tuples>, TuplesError> {
    if operands.is_empty() {
        return Ok(Box::new(LiteralTuples::unconstrained()));
    }
    if operands.iter().any(|operand| operand.row_upper_bound() == 0) {
        let variables = all_variables(&operands);
        close_all(&mut operands);
        return Ok(Box::new(LiteralTuples::empty(variables)));
    }
    if operands.len() == 1 {
        if let Some(only) = operands.pop() {
            return Ok(only);
        }
    }

    let ordered = order_for_join(operands);
    Ok(Box::new(UnboundJoin::new(ordered)))
}

fn order_for_join(operands: Vec<Box<dyn Tuples>>) -> Vec<Box<dyn Tuples>> {
    let (mut ordered, mut remaining): (Vec<_>, Vec<_>) = operands
        .into_iter()
        .partition(|operand| operand.row_upper_bound() == 1);

    let mut bound: HashSet<Variable> = HashSet::new();
    for operand in &mut ordered {
        operand.define_prefix(&bound);
        bound.extend(always_bound(operand.as_ref()));
    }

    while !remaining.is_empty() {
        let mut best = 0;
        let mut best_cost = f64::INFINITY;
        for (index, operand) in remaining.iter().enumerate() {
            let cost = join_cost(operand.as_ref(), &bound);
            if cost < best_cost {
                best = index;
                best_cost = cost;
            }
        }
        let mut chosen = remaining.remove(best);
        chosen.define_prefix(&bound);
        tracing::debug!(
            "Join operand {} chosen with estimated cost {best_cost:.1} ({} bound)",
            ordered.len(),
            bound.len()
        );
        bound.extend(always_bound(chosen.as_ref()));
        ordered.push(chosen);
    }
    ordered
}

/// Estimated rows produced per outer row.
///
/// With `n` columns of which `b` arrive bound, the upper bound `u` is
/// discounted to `u^((n-b)/n)`, plus a rapidly vanishing share of the less
/// bound estimates so operands with equal discounted bounds still prefer
/// the smaller table.
#[allow(clippy::cast_precision_loss)]
fn join_cost(operand: &dyn Tuples, bound: &HashSet<Variable>) -> f64 {
    let upper_bound = operand.row_upper_bound() as f64;
    let columns = operand.column_count();
    if columns == 0 {
        return upper_bound;
    }
    let bound_columns = operand
        .variables()
        .iter()
        .filter(|variable| bound.contains(*variable))
        .count();
    let columns_f = columns as f64;
    (0..=bound_columns)
        .map(|weight| {
            let free = (columns - (bound_columns - weight)) as f64;
            let exponent = i32::try_from(weight).unwrap_or(i32::MAX);
            upper_bound.powf(free / columns_f) / 10f64.powi(exponent)
        })
        .sum()
}

fn always_bound(operand: &dyn Tuples) -> Vec<Variable> {
    operand
        .variables()
        .iter()
        .enumerate()
        .filter(|(column, _)| !operand.is_column_ever_unbound(*column))
        .map(|(_, variable)| variable.clone())
        .collect()
}

fn all_variables(operands: &[Box<dyn Tuples>]) -> Vec<Variable> {
    let mut variables: Vec<Variable> = Vec::new();
    for operand in operands {
        for variable in operand.variables() {
            if !variables.contains(variable) {
                variables.push(variable.clone());
            }
        }
    }
    variables
}

/// Bag union: every row of every operand, duplicates kept.
#[must_use]
pub fn append(mut operands: Vec<Box<dyn Tuples>>) -> Box<dyn Tuples> {
    if operands.len() == 1 {
        if let Some(only) = operands.pop() {
            return only;
        }
    }
    Box::new(AppendTuples::new(operands))
}

/// Set union: the rows of every operand with exact duplicates removed.
///
/// # Errors
/// Fails if an operand fails while being read.
pub fn distinct_append(operands: Vec<Box<dyn Tuples>>) -> Result<Box<dyn Tuples>, TuplesError> {
    distinct(append(operands))
}

/// Keep the first occurrence of each distinct row.
///
/// # Errors
/// Fails if `tuples` fails while being read; it is closed either way.
pub fn distinct(mut tuples: Box<dyn Tuples>) -> Result<Box<dyn Tuples>, TuplesError> {
    let variables = tuples.variables().to_vec();
    let rows = materialize(tuples.as_mut())?;
    let mut seen: HashSet<Row> = HashSet::with_capacity(rows.len());
    let unique: Vec<Row> = rows
        .into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect();
    Ok(Box::new(LiteralTuples::new(variables, unique)))
}

/// Sort key: a column and its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: usize,
    pub ascending: bool,
}

/// Sort rows by `keys` using node order. Unbound values sort first.
///
/// # Errors
/// Fails if `tuples` fails while being read, or if a value cannot be
/// resolved in `snapshot` for comparison.
pub fn sort(
    mut tuples: Box<dyn Tuples>,
    keys: &[SortKey],
    snapshot: &Snapshot,
) -> Result<Box<dyn Tuples>, TuplesError> {
    let variables = tuples.variables().to_vec();
    let mut rows = materialize(tuples.as_mut())?;
    let mut failure = None;
    rows.sort_by(|left, right| {
        for key in keys {
            let ordering = match (left[key.column], right[key.column]) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => match snapshot.compare(a, b) {
                    Ok(ordering) => ordering,
                    Err(e) => {
                        failure.get_or_insert(e);
                        Ordering::Equal
                    }
                },
            };
            let ordering = if key.ascending { ordering } else { ordering.reverse() };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
    if let Some(e) = failure {
        return Err(e.into());
    }
    Ok(Box::new(LiteralTuples::new(variables, rows)))
}

/// Restrict `tuples` to `variables`, in that order.
#[must_use]
pub fn project(tuples: Box<dyn Tuples>, variables: Vec<Variable>) -> Box<dyn Tuples> {
    if tuples.variables() == variables.as_slice() {
        return tuples;
    }
    Box::new(ProjectTuples::new(tuples, variables))
}

/// Skip `offset` rows and keep at most `limit`.
#[must_use]
pub fn slice(tuples: Box<dyn Tuples>, offset: u64, limit: Option<u64>) -> Box<dyn Tuples> {
    if offset == 0 && limit.is_none() {
        return tuples;
    }
    Box::new(SliceTuples::new(tuples, offset, limit))
}
