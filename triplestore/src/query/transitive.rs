//! Transitive closure over one predicate.
//!
//! Both forms walk the graph breadth-first with a single leaf scan of the
//! step pattern, reset with the frontier node as prefix for every
//! expansion. A node is added to the result (and to the next frontier)
//! the first time it is reached and never again, which is also what makes
//! the walk terminate on cyclic data.

use std::collections::HashSet;

use crate::query::QueryError;
use crate::query::constraint::{ClosureConstraint, SimpleConstraint, TransitiveConstraint};
use crate::store::Snapshot;
use crate::tuples::{LiteralTuples, Row, Slot, StatementTuples, Tuples, close_quietly};
use crate::types::{NodeId, Term, Variable};

/// Column names of the internal step scan.
const FROM: &str = "transitive:from";
const TO: &str = "transitive:to";

/// Ids of the step's predicate and graph, or `None` if either was never
/// stored (nothing can be reached).
fn step_ids(
    snapshot: &Snapshot,
    step: &SimpleConstraint,
    default_graph: &Term,
) -> Option<(NodeId, NodeId)> {
    let predicate = snapshot.lookup_id(step.predicate.as_term()?)?;
    let graph = match step.graph.as_ref().and_then(|g| g.as_term()) {
        Some(graph) => snapshot.lookup_id(graph)?,
        None => snapshot.lookup_id(default_graph)?,
    };
    Some((predicate, graph))
}

/// One `from -> to` edge scan, laid out so `from` is the leading column.
struct StepScan {
    tuples: StatementTuples,
    to_column: usize,
}

impl StepScan {
    fn open(snapshot: &Snapshot, predicate: NodeId, graph: NodeId, forward: bool) -> Self {
        let (subject, object) = if forward { (FROM, TO) } else { (TO, FROM) };
        let mut tuples = StatementTuples::new(
            snapshot.clone(),
            [
                Slot::Variable(Variable::new(subject)),
                Slot::Bound(predicate),
                Slot::Variable(Variable::new(object)),
                Slot::Bound(graph),
            ],
        );
        tuples.define_prefix(&[Variable::new(FROM)].into_iter().collect());
        let to_column = tuples.column_index(&Variable::new(TO)).unwrap_or(1);
        Self { tuples, to_column }
    }

    /// Every node reachable from `start` in one or more steps, in
    /// breadth-first order. Returns the number of expansion rounds too.
    fn reachable(&mut self, start: NodeId) -> Result<(Vec<NodeId>, usize), QueryError> {
        let mut seen = HashSet::new();
        let mut reached = Vec::new();
        let mut frontier = vec![start];
        let mut rounds = 0;
        while !frontier.is_empty() {
            rounds += 1;
            let mut next = Vec::new();
            for node in frontier {
                self.tuples.before_first(&[node])?;
                while self.tuples.next()? {
                    if let Some(to) = self.tuples.column_value(self.to_column)? {
                        if seen.insert(to) {
                            reached.push(to);
                            next.push(to);
                        }
                    }
                }
            }
            frontier = next;
        }
        Ok((reached, rounds))
    }

    /// Distinct `from` nodes with at least one outgoing step.
    fn sources(&mut self) -> Result<Vec<NodeId>, QueryError> {
        let mut seen = HashSet::new();
        let mut sources = Vec::new();
        self.tuples.before_first(&[])?;
        while self.tuples.next()? {
            if let Some(from) = self.tuples.column_value(0)? {
                if seen.insert(from) {
                    sources.push(from);
                }
            }
        }
        Ok(sources)
    }

    fn close(mut self) {
        close_quietly(&mut self.tuples);
    }
}

/// Nodes reachable from the anchor of `constraint`, as a single column
/// named by its target variable.
pub(crate) fn resolve_anchored(
    snapshot: &Snapshot,
    default_graph: &Term,
    constraint: &TransitiveConstraint,
) -> Result<Box<dyn Tuples>, QueryError> {
    let target = constraint.target().clone();
    let ids = step_ids(snapshot, constraint.step(), default_graph)
        .zip(snapshot.lookup_id(constraint.anchor()));
    let Some(((predicate, graph), anchor)) = ids else {
        return Ok(Box::new(LiteralTuples::empty(vec![target])));
    };

    let mut scan = StepScan::open(snapshot, predicate, graph, constraint.is_forward());
    let result = scan.reachable(anchor);
    scan.close();
    let (reached, rounds) = result?;
    tracing::debug!(
        "Transitive closure from {} reached {} nodes in {rounds} rounds",
        constraint.anchor(),
        reached.len()
    );
    Ok(Box::new(LiteralTuples::single_column(target, &reached)))
}

/// Every `(from, to)` pair connected by one or more steps.
pub(crate) fn resolve_closure(
    snapshot: &Snapshot,
    default_graph: &Term,
    constraint: &ClosureConstraint,
) -> Result<Box<dyn Tuples>, QueryError> {
    let variables = constraint.step().variables();
    let Some((predicate, graph)) = step_ids(snapshot, constraint.step(), default_graph) else {
        return Ok(Box::new(LiteralTuples::empty(variables)));
    };

    let mut scan = StepScan::open(snapshot, predicate, graph, true);
    let result = closure_rows(&mut scan);
    scan.close();
    let rows = result?;
    tracing::debug!("Exhaustive transitive closure produced {} pairs", rows.len());
    Ok(Box::new(LiteralTuples::new(variables, rows)))
}

fn closure_rows(scan: &mut StepScan) -> Result<Vec<Row>, QueryError> {
    let mut rows = Vec::new();
    for source in scan.sources()? {
        let (reached, _) = scan.reachable(source)?;
        rows.extend(reached.into_iter().map(|to| vec![Some(source), Some(to)]));
    }
    Ok(rows)
}
