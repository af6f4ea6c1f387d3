//! Filter expressions.
//!
//! A [`Filter`] is a boolean test over the variable bindings of one row,
//! evaluated through a [`Context`].
//!
//! # Semantics
//!
//! - A comparison with an operand that depends on an unbound variable is
//!   `false`.
//! - Type errors (ordering a URI, a regex over a blank node, equality
//!   between literals of unrelated unknown datatypes) are returned as
//!   [`QueryError::Type`], except in `NotEquals`, where values that cannot
//!   be compared count as different.
//! - `And` and `Or` stop at the first operand that decides the result.
//!   An error from an operand that was evaluated is returned.

mod regex_match;
mod value;

use std::collections::BTreeSet;

pub use regex_match::RegexFilter;
pub use value::ValueExpr;

use crate::query::QueryError;
use crate::query::context::Context;
use crate::types::{Term, Variable};

pub use crate::query::context::RowContext;

/// A boolean test over variable bindings.
#[derive(Debug, Clone)]
pub enum Filter {
    True,
    False,
    Equals(ValueExpr, ValueExpr),
    NotEquals(ValueExpr, ValueExpr),
    LessThan(ValueExpr, ValueExpr),
    LessThanOrEqual(ValueExpr, ValueExpr),
    GreaterThan(ValueExpr, ValueExpr),
    GreaterThanOrEqual(ValueExpr, ValueExpr),
    /// Term identity, without value semantics.
    SameTerm(ValueExpr, ValueExpr),
    Regex(RegexFilter),
    Bound(Variable),
    IsIri(ValueExpr),
    IsBlank(ValueExpr),
    IsLiteral(ValueExpr),
    Not(Box<Filter>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    #[must_use]
    pub fn not(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    #[must_use]
    pub fn regex(text: ValueExpr, pattern: ValueExpr, flags: Option<ValueExpr>) -> Self {
        Self::Regex(RegexFilter::new(text, pattern, flags))
    }

    /// Conjunction of two filters. `True` operands are dropped and nested
    /// conjunctions are merged.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::True, filter) | (filter, Self::True) => filter,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), right) => {
                left.push(right);
                Self::And(left)
            }
            (left, Self::And(mut right)) => {
                right.insert(0, left);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }

    /// Evaluate against one set of bindings.
    pub fn test(&self, context: &dyn Context) -> Result<bool, QueryError> {
        match self {
            Self::True => Ok(true),
            Self::False => Ok(false),
            Self::Equals(left, right) => match operands(left, right, context)? {
                Some((a, b)) => value::terms_equal(&a, &b),
                None => Ok(false),
            },
            Self::NotEquals(left, right) => match operands(left, right, context)? {
                Some((a, b)) => match value::terms_equal(&a, &b) {
                    Ok(equal) => Ok(!equal),
                    Err(QueryError::Type(_)) => Ok(true),
                    Err(e) => Err(e),
                },
                None => Ok(false),
            },
            Self::LessThan(left, right) => compare(left, right, context, |o| o.is_lt()),
            Self::LessThanOrEqual(left, right) => compare(left, right, context, |o| o.is_le()),
            Self::GreaterThan(left, right) => compare(left, right, context, |o| o.is_gt()),
            Self::GreaterThanOrEqual(left, right) => compare(left, right, context, |o| o.is_ge()),
            Self::SameTerm(left, right) => {
                Ok(operands(left, right, context)?.is_some_and(|(a, b)| a == b))
            }
            Self::Regex(regex) => regex.test(context),
            Self::Bound(variable) => Ok(context.lookup(variable)?.is_some()),
            Self::IsIri(value) => Ok(value.evaluate(context)?.as_ref().is_some_and(Term::is_uri)),
            Self::IsBlank(value) => {
                Ok(value.evaluate(context)?.as_ref().is_some_and(Term::is_blank))
            }
            Self::IsLiteral(value) => {
                Ok(value.evaluate(context)?.as_ref().is_some_and(Term::is_literal))
            }
            Self::Not(inner) => Ok(!inner.test(context)?),
            Self::And(filters) => {
                for filter in filters {
                    if !filter.test(context)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Or(filters) => {
                for filter in filters {
                    if filter.test(context)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Every variable the filter mentions.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut variables = BTreeSet::new();
        self.collect_variables(&mut variables);
        variables
    }

    fn collect_variables(&self, into: &mut BTreeSet<Variable>) {
        match self {
            Self::True | Self::False => {}
            Self::Equals(a, b)
            | Self::NotEquals(a, b)
            | Self::LessThan(a, b)
            | Self::LessThanOrEqual(a, b)
            | Self::GreaterThan(a, b)
            | Self::GreaterThanOrEqual(a, b)
            | Self::SameTerm(a, b) => {
                a.collect_variables(into);
                b.collect_variables(into);
            }
            Self::Regex(regex) => regex.collect_variables(into),
            Self::Bound(variable) => {
                into.insert(variable.clone());
            }
            Self::IsIri(value) | Self::IsBlank(value) | Self::IsLiteral(value) => {
                value.collect_variables(into);
            }
            Self::Not(inner) => inner.collect_variables(into),
            Self::And(filters) | Self::Or(filters) => {
                for filter in filters {
                    filter.collect_variables(into);
                }
            }
        }
    }
}

fn operands(
    left: &ValueExpr,
    right: &ValueExpr,
    context: &dyn Context,
) -> Result<Option<(Term, Term)>, QueryError> {
    let Some(a) = left.evaluate(context)? else {
        return Ok(None);
    };
    let Some(b) = right.evaluate(context)? else {
        return Ok(None);
    };
    Ok(Some((a, b)))
}

fn compare<F>(
    left: &ValueExpr,
    right: &ValueExpr,
    context: &dyn Context,
    accept: F,
) -> Result<bool, QueryError>
where
    F: Fn(std::cmp::Ordering) -> bool,
{
    match operands(left, right, context)? {
        Some((a, b)) => Ok(accept(value::compare_values(&a, &b)?)),
        None => Ok(false),
    }
}
