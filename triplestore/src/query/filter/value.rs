//! Filter operands and the comparisons between them.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::query::QueryError;
use crate::query::context::Context;
use crate::types::{Literal, Term, Variable, xsd};

/// An operand of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueExpr {
    Variable(Variable),
    Term(Term),
    /// The lexical form of a literal or the text of a URI, as a plain
    /// literal.
    Str(Box<ValueExpr>),
}

impl ValueExpr {
    #[must_use]
    pub fn var(name: &str) -> Self {
        Self::Variable(Variable::new(name))
    }

    #[must_use]
    pub fn str(inner: Self) -> Self {
        Self::Str(Box::new(inner))
    }

    /// Resolve the operand. `None` means it depends on an unbound variable.
    pub fn evaluate(&self, context: &dyn Context) -> Result<Option<Term>, QueryError> {
        match self {
            Self::Variable(variable) => context.lookup(variable),
            Self::Term(term) => Ok(Some(term.clone())),
            Self::Str(inner) => match inner.evaluate(context)? {
                Some(Term::Uri(uri)) => Ok(Some(Term::plain(uri))),
                Some(Term::Literal(literal)) => Ok(Some(Term::plain(literal.lexical()))),
                Some(blank @ Term::Blank(_)) => Err(QueryError::Type(format!(
                    "str() is not defined for blank node {blank}"
                ))),
                None => Ok(None),
            },
        }
    }

    pub(crate) fn collect_variables(&self, into: &mut BTreeSet<Variable>) {
        match self {
            Self::Variable(variable) => {
                into.insert(variable.clone());
            }
            Self::Term(_) => {}
            Self::Str(inner) => inner.collect_variables(into),
        }
    }
}

impl From<Term> for ValueExpr {
    fn from(term: Term) -> Self {
        Self::Term(term)
    }
}

impl From<Variable> for ValueExpr {
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

/// Datatypes whose value space the engine knows, so that two different
/// terms of them are known to be different values.
fn is_known_datatype(literal: &Literal) -> bool {
    let datatype = literal.effective_datatype();
    literal.is_numeric()
        || datatype == xsd::STRING
        || datatype == xsd::LANG_STRING
        || datatype == xsd::BOOLEAN
}

/// Value equality between two terms.
///
/// Identical terms are equal. Numeric literals compare by value and
/// booleans by truth value. Two literals of datatypes whose values cannot
/// be compared (an unknown datatype on either side) are a type error.
pub(crate) fn terms_equal(left: &Term, right: &Term) -> Result<bool, QueryError> {
    if left == right {
        return Ok(true);
    }
    let (Term::Literal(a), Term::Literal(b)) = (left, right) else {
        return Ok(false);
    };
    if let (Some(x), Some(y)) = (a.numeric(), b.numeric()) {
        return Ok(x.value_eq(y));
    }
    if let (Some(x), Some(y)) = (a.boolean_value(), b.boolean_value()) {
        return Ok(x == y);
    }
    if a.effective_datatype() == b.effective_datatype()
        || (is_known_datatype(a) && is_known_datatype(b))
    {
        return Ok(false);
    }
    Err(QueryError::Type(format!(
        "cannot compare {left} with {right} for equality"
    )))
}

/// Order between two literals for the relational operators.
///
/// Numerics compare by value, booleans false before true, and literals of
/// one datatype (and language) by lexical form. Anything else is a type
/// error naming the offending operands.
pub(crate) fn compare_values(left: &Term, right: &Term) -> Result<Ordering, QueryError> {
    let (Term::Literal(a), Term::Literal(b)) = (left, right) else {
        let offender = if left.is_literal() { right } else { left };
        return Err(QueryError::Type(format!(
            "cannot order {}, only literals are ordered",
            describe(offender)
        )));
    };
    if let (Some(x), Some(y)) = (a.numeric(), b.numeric()) {
        return Ok(x.total_cmp(y));
    }
    if let (Some(x), Some(y)) = (a.boolean_value(), b.boolean_value()) {
        return Ok(x.cmp(&y));
    }
    if a.effective_datatype() == b.effective_datatype() && a.language() == b.language() {
        return Ok(a.lexical().cmp(b.lexical()));
    }
    Err(QueryError::Type(format!(
        "cannot order {left} against {right}"
    )))
}

fn describe(term: &Term) -> String {
    format!("{} {term}", term.kind())
}
