//! Constraint tree to tuples.
//!
//! # Pre-conditions
//!
//! - The tree has been through [`flatten`](crate::query::transform::flatten)
//!   (not required for correctness, only for fewer wrapper tuples).
//!
//! # Post-conditions
//!
//! - On success the caller owns the returned tuples and must close it.
//! - On failure every tuples opened while resolving has been closed.

use crate::query::QueryError;
use crate::query::constraint::{ConstraintElement, ConstraintExpression, SimpleConstraint};
use crate::query::filter::Filter;
use crate::query::transitive;
use crate::store::Snapshot;
use crate::tuples::{
    DifferenceTuples, FilteredTuples, LeftJoinTuples, LiteralTuples, Slot, StatementTuples, Tuples,
    close_all, close_quietly, operations,
};
use crate::types::Term;

/// Resolves constraint trees against one snapshot.
#[derive(Debug)]
pub struct ConstraintResolver<'a> {
    snapshot: &'a Snapshot,
    default_graph: &'a Term,
    distinct: bool,
}

impl<'a> ConstraintResolver<'a> {
    /// `default_graph` is used for patterns without a graph. With
    /// `distinct`, disjunctions remove duplicate rows.
    #[must_use]
    pub const fn new(snapshot: &'a Snapshot, default_graph: &'a Term, distinct: bool) -> Self {
        Self {
            snapshot,
            default_graph,
            distinct,
        }
    }

    /// Resolve `expression` to tuples over its variables.
    pub fn resolve(
        &self,
        expression: &ConstraintExpression,
    ) -> Result<Box<dyn Tuples>, QueryError> {
        match expression {
            ConstraintExpression::Simple(simple) => Ok(self.resolve_simple(simple)),
            ConstraintExpression::Conjunction(children) => {
                let mut leaves = Vec::with_capacity(children.len());
                collect_conjuncts(children, &mut leaves);
                let operands = self.resolve_all(&leaves)?;
                tracing::debug!("Joining {} conjuncts", operands.len());
                Ok(operations::join(operands)?)
            }
            ConstraintExpression::Disjunction(children) => {
                let children: Vec<&ConstraintExpression> = children.iter().collect();
                let operands = self.resolve_all(&children)?;
                tracing::debug!(
                    "Appending {} disjuncts (distinct: {})",
                    operands.len(),
                    self.distinct
                );
                if self.distinct {
                    Ok(operations::distinct_append(operands)?)
                } else {
                    Ok(operations::append(operands))
                }
            }
            ConstraintExpression::Filter { inner, filter } => {
                let mut inner = self.resolve(inner)?;
                match filter {
                    Filter::True => Ok(inner),
                    Filter::False => {
                        let variables = inner.variables().to_vec();
                        close_quietly(inner.as_mut());
                        Ok(Box::new(LiteralTuples::empty(variables)))
                    }
                    _ => Ok(Box::new(FilteredTuples::new(
                        inner,
                        filter.clone(),
                        self.snapshot.clone(),
                    ))),
                }
            }
            ConstraintExpression::OptionalJoin {
                main,
                optional,
                filter,
            } => {
                let mut main = self.resolve(main)?;
                let optional = match self.resolve(optional) {
                    Ok(optional) => optional,
                    Err(e) => {
                        close_quietly(main.as_mut());
                        return Err(e);
                    }
                };
                Ok(Box::new(LeftJoinTuples::new(
                    main,
                    optional,
                    filter.clone(),
                    self.snapshot.clone(),
                )))
            }
            ConstraintExpression::Difference {
                minuend,
                subtrahend,
            } => {
                let mut minuend = self.resolve(minuend)?;
                let subtrahend = match self.resolve(subtrahend) {
                    Ok(subtrahend) => subtrahend,
                    Err(e) => {
                        close_quietly(minuend.as_mut());
                        return Err(e);
                    }
                };
                Ok(Box::new(DifferenceTuples::new(minuend, subtrahend)?))
            }
            ConstraintExpression::Transitive(transitive) => {
                transitive::resolve_anchored(self.snapshot, self.default_graph, transitive)
            }
            ConstraintExpression::Closure(closure) => {
                transitive::resolve_closure(self.snapshot, self.default_graph, closure)
            }
            ConstraintExpression::Is { variable, term } => {
                let tuples = match self.snapshot.lookup_id(term) {
                    Some(id) => LiteralTuples::single_column(variable.clone(), &[id]),
                    None => {
                        tracing::debug!("Assigned term {term} is not stored; no rows");
                        LiteralTuples::empty(vec![variable.clone()])
                    }
                };
                Ok(Box::new(tuples))
            }
            ConstraintExpression::True => Ok(Box::new(LiteralTuples::unconstrained())),
            ConstraintExpression::False => Ok(Box::new(LiteralTuples::empty(Vec::new()))),
        }
    }

    /// Resolve every child, closing the ones already opened if one fails.
    fn resolve_all(
        &self,
        children: &[&ConstraintExpression],
    ) -> Result<Vec<Box<dyn Tuples>>, QueryError> {
        let mut opened = Vec::with_capacity(children.len());
        for child in children {
            match self.resolve(child) {
                Ok(tuples) => opened.push(tuples),
                Err(e) => {
                    close_all(&mut opened);
                    return Err(e);
                }
            }
        }
        Ok(opened)
    }

    /// A leaf scan. A constant that was never stored cannot match, so the
    /// result is empty (with the pattern's columns).
    fn resolve_simple(&self, simple: &SimpleConstraint) -> Box<dyn Tuples> {
        let default_graph = ConstraintElement::Term(self.default_graph.clone());
        let graph = simple.graph.as_ref().unwrap_or(&default_graph);
        let (Some(subject), Some(predicate), Some(object), Some(graph)) = (
            self.slot(&simple.subject),
            self.slot(&simple.predicate),
            self.slot(&simple.object),
            self.slot(graph),
        ) else {
            return Box::new(LiteralTuples::empty(simple.variables()));
        };
        Box::new(StatementTuples::new(
            self.snapshot.clone(),
            [subject, predicate, object, graph],
        ))
    }

    fn slot(&self, element: &ConstraintElement) -> Option<Slot> {
        match element {
            ConstraintElement::Variable(variable) => Some(Slot::Variable(variable.clone())),
            ConstraintElement::Term(term) => {
                let id = self.snapshot.lookup_id(term);
                if id.is_none() {
                    tracing::debug!("Pattern constant {term} is not stored; no rows");
                }
                id.map(Slot::Bound)
            }
        }
    }
}

/// Children of nested conjunctions, flattened into one operand list.
fn collect_conjuncts<'e>(
    children: &'e [ConstraintExpression],
    into: &mut Vec<&'e ConstraintExpression>,
) {
    for child in children {
        match child {
            ConstraintExpression::Conjunction(nested) => collect_conjuncts(nested, into),
            other => into.push(other),
        }
    }
}
