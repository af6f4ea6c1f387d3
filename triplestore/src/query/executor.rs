//! Query execution: resolution followed by result shaping.
//!
//! `execute` runs the whole pipeline against one snapshot:
//! flatten, resolve, sort, project, distinct, slice. The answer comes back
//! positioned before its first row.

use crate::query::answer::{Answer, BooleanAnswer, GraphAnswer};
use crate::query::resolver::ConstraintResolver;
use crate::query::transform::flatten;
use crate::query::types::{AskQuery, ConstructQuery, Query};
use crate::query::QueryError;
use crate::store::Snapshot;
use crate::tuples::operations::{self, SortKey};
use crate::tuples::{Tuples, close_quietly};

/// Resolve `query` against `snapshot`.
pub fn execute(snapshot: Snapshot, query: &Query) -> Result<Answer, QueryError> {
    let constraint = flatten(query.constraint.clone());
    let resolver = ConstraintResolver::new(&snapshot, &query.default_graph, query.distinct);
    let tuples = resolver.resolve(&constraint)?;
    tracing::debug!(
        "Resolved query over {:?} (upper bound {} rows)",
        tuples.variables(),
        tuples.row_upper_bound()
    );

    let mut tuples = shape(tuples, query, &snapshot)?;
    if let Err(e) = tuples.before_first(&[]) {
        close_quietly(tuples.as_mut());
        return Err(e.into());
    }
    Ok(Answer::new(tuples, snapshot))
}

fn shape(
    mut tuples: Box<dyn Tuples>,
    query: &Query,
    snapshot: &Snapshot,
) -> Result<Box<dyn Tuples>, QueryError> {
    if !query.order_by.is_empty() {
        let mut keys = Vec::with_capacity(query.order_by.len());
        for order in &query.order_by {
            let Some(column) = tuples.column_index(&order.variable) else {
                close_quietly(tuples.as_mut());
                return Err(QueryError::UnknownVariable(order.variable.clone()));
            };
            keys.push(SortKey {
                column,
                ascending: order.ascending,
            });
        }
        tuples = operations::sort(tuples, &keys, snapshot)?;
    }
    tuples = operations::project(tuples, query.variables.clone());
    if query.distinct {
        tuples = operations::distinct(tuples)?;
    }
    Ok(operations::slice(tuples, query.offset, query.limit))
}

/// Whether `ask` has at least one solution.
pub fn ask(snapshot: Snapshot, ask: &AskQuery) -> Result<BooleanAnswer, QueryError> {
    let mut answer = execute(snapshot, &ask.query)?;
    let found = answer.next();
    answer.close()?;
    Ok(BooleanAnswer(found?))
}

/// The triples `construct` builds from its solutions.
pub fn construct(
    snapshot: Snapshot,
    construct: &ConstructQuery,
) -> Result<GraphAnswer, QueryError> {
    let answer = execute(snapshot, &construct.query)?;
    Ok(GraphAnswer::new(answer, construct.template().to_vec()))
}
