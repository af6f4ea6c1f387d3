//! The string pool: bidirectional mapping between terms and node ids.
//!
//! Every term stored in the quad index is first localized here. Readers
//! only ever see an immutable pool (through a snapshot); a write
//! transaction works on its own copy and publishes it on commit.
//!
//! # Invariants
//!
//! - `terms[i]` is the term for `NodeId::from_index(i)`.
//! - `ids[terms[i]] == NodeId::from_index(i)` for every `i`.
//! - Every interned literal is in canonical form: numeric and boolean XSD
//!   literals are rewritten to one lexical form per value and datatype, so
//!   `"01"^^xsd:integer` and `"+1"^^xsd:integer` share the id of `"1"`.
//! - Two terms have equal ids iff their canonical forms are equal.
//! - Ids are dense; a rolled-back transaction's ids may be handed out
//!   again by a later one.

mod ordering;

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::types::{Literal, NodeId, Numeric, Term, xsd};

pub use ordering::compare_terms;

/// Failure to turn a term into a node id.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LocalizeError {
    #[error("literal \"{lexical}\" is not a valid <{datatype}>")]
    InvalidLiteral { lexical: String, datatype: String },
    #[error("malformed language tag \"{0}\"")]
    InvalidLanguageTag(String),
    #[error("literal cannot carry both a datatype and a language tag")]
    DatatypeAndLanguage,
    #[error("URI must not be empty")]
    EmptyUri,
}

/// Failure to turn a node id back into a term.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GlobalizeError {
    #[error("node {0} is not known to this transaction")]
    UnknownNode(NodeId),
}

/// The term table for one version of the store.
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    terms: Vec<Term>,
    ids: HashMap<Term, NodeId>,
    next_blank: u64,
}

impl StringPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of interned terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Intern a term, allocating a new id if it has not been seen.
    ///
    /// # Post-conditions
    /// - `globalize(result)` is the canonical form of `term`
    /// - Interning the same term, or any term with the same canonical
    ///   form, again returns the same id
    pub fn localize(&mut self, term: &Term) -> Result<NodeId, LocalizeError> {
        let term = canonicalize(term)?;
        if let Some(id) = self.ids.get(term.as_ref()) {
            return Ok(*id);
        }
        let term = term.into_owned();
        let id = NodeId::from_index(self.terms.len());
        self.terms.push(term.clone());
        self.ids.insert(term, id);
        Ok(id)
    }

    /// Look up the id of a term without allocating.
    ///
    /// A term that cannot be localized has no id.
    #[must_use]
    pub fn lookup_id(&self, term: &Term) -> Option<NodeId> {
        let term = canonicalize(term).ok()?;
        self.ids.get(term.as_ref()).copied()
    }

    /// Resolve an id back to its term.
    pub fn globalize(&self, id: NodeId) -> Result<&Term, GlobalizeError> {
        id.to_index()
            .and_then(|index| self.terms.get(index))
            .ok_or(GlobalizeError::UnknownNode(id))
    }

    /// Allocate a fresh blank node that no existing term uses.
    pub fn new_blank_node(&mut self) -> NodeId {
        loop {
            self.next_blank += 1;
            let term = Term::blank(format!("node{}", self.next_blank));
            if self.ids.contains_key(&term) {
                continue;
            }
            let id = NodeId::from_index(self.terms.len());
            self.terms.push(term.clone());
            self.ids.insert(term, id);
            return id;
        }
    }

    /// Compare two ids by the terms they stand for.
    ///
    /// See [`compare_terms`] for the order.
    pub fn compare(&self, left: NodeId, right: NodeId) -> Result<Ordering, GlobalizeError> {
        if left == right {
            return Ok(Ordering::Equal);
        }
        Ok(compare_terms(self.globalize(left)?, self.globalize(right)?))
    }
}

/// Check that a term is well-formed and rewrite it to canonical form.
fn canonicalize(term: &Term) -> Result<Cow<'_, Term>, LocalizeError> {
    match term {
        Term::Uri(uri) if uri.is_empty() => Err(LocalizeError::EmptyUri),
        Term::Uri(_) | Term::Blank(_) => Ok(Cow::Borrowed(term)),
        Term::Literal(literal) => Ok(canonical_literal(literal)?
            .map_or(Cow::Borrowed(term), |canonical| Cow::Owned(Term::Literal(canonical)))),
    }
}

/// The canonical rewrite of `literal`, or `None` when it already is
/// canonical.
fn canonical_literal(literal: &Literal) -> Result<Option<Literal>, LocalizeError> {
    if let Some(language) = literal.language() {
        if literal.datatype().is_some() {
            return Err(LocalizeError::DatatypeAndLanguage);
        }
        if !is_valid_language_tag(language) {
            return Err(LocalizeError::InvalidLanguageTag(language.to_string()));
        }
        return Ok(None);
    }

    let Some(datatype) = literal.datatype() else {
        return Ok(None);
    };
    let canonical = if datatype == xsd::BOOLEAN {
        literal.boolean_value().map(|value| value.to_string())
    } else if literal.is_numeric() {
        literal.numeric().map(|value| match value {
            Numeric::Integer(value) => value.to_string(),
            Numeric::Float(value) => canonical_float(value),
        })
    } else {
        return Ok(None);
    };
    let Some(canonical) = canonical else {
        return Err(LocalizeError::InvalidLiteral {
            lexical: literal.lexical().to_string(),
            datatype: datatype.to_string(),
        });
    };
    Ok((canonical != literal.lexical()).then(|| Literal::typed(canonical, datatype)))
}

/// Shortest round-tripping decimal form, always with a fraction digit.
fn canonical_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        let text = if value > 0.0 { "INF" } else { "-INF" };
        return text.to_string();
    }
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

/// BCP 47 shape check: alphanumeric subtags of 1-8 characters separated by
/// hyphens, the first one alphabetic.
fn is_valid_language_tag(tag: &str) -> bool {
    let mut subtags = tag.split('-');
    let Some(primary) = subtags.next() else {
        return false;
    };
    let primary_ok =
        (1..=8).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
    primary_ok
        && subtags.all(|subtag| {
            (1..=8).contains(&subtag.len()) && subtag.chars().all(|c| c.is_ascii_alphanumeric())
        })
}
