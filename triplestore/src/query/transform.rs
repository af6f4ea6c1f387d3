//! Syntactic flattening of constraint trees.
//!
//! Applied bottom-up before resolution:
//!
//! - `Filter(Filter(A, X2), X1)` becomes `Filter(A, X2 && X1)`.
//! - `OptionalJoin(A, Filter(B, X1), X2)` becomes
//!   `OptionalJoin(A, B, X1 && X2)`, but only when `X1` mentions no
//!   variable outside `B`. Inside the optional operand such a variable is
//!   unbound; on the combined row it would see `A`'s value, so the
//!   unguarded form of this rewrite can accept rows the written tree
//!   rejects. Otherwise the filter stays on `B`.
//!
//! A nested optional join, `OptionalJoin(A, OptionalJoin(B, C, X1), X2)`,
//! is left as written. Moving `X1` onto the outer join is not row
//! preserving: when `X1` rejects every `C` row for some `B` row, the inner
//! join keeps that `B` row with `C` unbound, while the outer filter would
//! drop the whole `B` extension.
//!
//! Filters are assumed to have no side effects, so evaluating one on a
//! different (but row-equivalent) intermediate result is unobservable.

use crate::query::constraint::ConstraintExpression;

/// Flatten nested filter and optional-join wrappers.
#[must_use]
pub fn flatten(expression: ConstraintExpression) -> ConstraintExpression {
    match expression {
        ConstraintExpression::Filter { inner, filter } => match flatten(*inner) {
            ConstraintExpression::Filter {
                inner: nested,
                filter: nested_filter,
            } => {
                tracing::trace!("Merging nested filters");
                ConstraintExpression::Filter {
                    inner: nested,
                    filter: nested_filter.and(filter),
                }
            }
            inner => ConstraintExpression::filter(inner, filter),
        },
        ConstraintExpression::OptionalJoin {
            main,
            optional,
            filter,
        } => {
            let main = flatten(*main);
            match flatten(*optional) {
                ConstraintExpression::Filter {
                    inner,
                    filter: inner_filter,
                } if inner_filter.variables().is_subset(&inner.variables()) => {
                    tracing::trace!("Lifting optional operand filter into the join");
                    ConstraintExpression::optional(main, *inner, inner_filter.and(filter))
                }
                optional => ConstraintExpression::optional(main, optional, filter),
            }
        }
        ConstraintExpression::Conjunction(children) => {
            ConstraintExpression::Conjunction(children.into_iter().map(flatten).collect())
        }
        ConstraintExpression::Disjunction(children) => {
            ConstraintExpression::Disjunction(children.into_iter().map(flatten).collect())
        }
        ConstraintExpression::Difference {
            minuend,
            subtrahend,
        } => ConstraintExpression::difference(flatten(*minuend), flatten(*subtrahend)),
        leaf => leaf,
    }
}
