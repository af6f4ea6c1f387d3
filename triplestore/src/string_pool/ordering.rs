//! Total order over terms.
//!
//! Blank nodes sort before URIs, URIs before literals. Within literals,
//! numeric values compare by value across the numeric datatypes, and sort
//! before every non-numeric literal; other literals compare by datatype,
//! then lexical form, then language tag. Ties between numerically equal
//! literals (`1` and `1.0`, or `"1"^^xsd:int` and `"1"^^xsd:integer`) are
//! broken by datatype and lexical form, so the order is total and
//! consistent with term equality.

use std::cmp::Ordering;

use crate::types::{Literal, Term};

/// Compare two terms.
#[must_use]
pub fn compare_terms(left: &Term, right: &Term) -> Ordering {
    match (left, right) {
        (Term::Blank(a), Term::Blank(b)) | (Term::Uri(a), Term::Uri(b)) => a.cmp(b),
        (Term::Literal(a), Term::Literal(b)) => compare_literals(a, b),
        _ => left.category_rank().cmp(&right.category_rank()),
    }
}

fn compare_literals(left: &Literal, right: &Literal) -> Ordering {
    match (left.numeric(), right.numeric()) {
        (Some(a), Some(b)) => a
            .total_cmp(b)
            .then_with(|| left.datatype().cmp(&right.datatype()))
            .then_with(|| left.lexical().cmp(right.lexical())),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => left
            .effective_datatype()
            .cmp(right.effective_datatype())
            .then_with(|| left.lexical().cmp(right.lexical()))
            .then_with(|| left.language().cmp(&right.language())),
    }
}
