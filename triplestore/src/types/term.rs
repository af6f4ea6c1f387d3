//! RDF terms in their global form.
//!
//! A [`Term`] is what users write and read back; inside the engine terms
//! are replaced by [`NodeId`](super::NodeId)s through the string pool.
//!
//! # Invariants
//!
//! - A literal has at most one of datatype and language tag.
//! - Language tags are stored lower-cased.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// XML Schema datatype URIs the engine understands.
pub mod xsd {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
    pub const INT: &str = "http://www.w3.org/2001/XMLSchema#int";
    pub const SHORT: &str = "http://www.w3.org/2001/XMLSchema#short";
    pub const BYTE: &str = "http://www.w3.org/2001/XMLSchema#byte";
    pub const NON_NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#nonNegativeInteger";
    pub const POSITIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#positiveInteger";
    pub const NON_POSITIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#nonPositiveInteger";
    pub const NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#negativeInteger";
    /// Datatype of language-tagged strings.
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

    /// Datatypes whose values are parsed as `i64`.
    pub const INTEGER_TYPES: &[&str] = &[
        INTEGER,
        LONG,
        INT,
        SHORT,
        BYTE,
        NON_NEGATIVE_INTEGER,
        POSITIVE_INTEGER,
        NON_POSITIVE_INTEGER,
        NEGATIVE_INTEGER,
    ];

    /// Datatypes whose values are parsed as `f64`.
    pub const FLOAT_TYPES: &[&str] = &[DECIMAL, DOUBLE, FLOAT];

    #[must_use]
    pub fn is_integer_type(datatype: &str) -> bool {
        INTEGER_TYPES.contains(&datatype)
    }

    #[must_use]
    pub fn is_float_type(datatype: &str) -> bool {
        FLOAT_TYPES.contains(&datatype)
    }
}

/// An RDF term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// A URI reference.
    Uri(String),
    /// A blank node, identified by its label.
    Blank(String),
    /// A literal value.
    Literal(Literal),
}

impl Term {
    /// Create a URI term.
    #[must_use]
    pub fn uri(uri: impl Into<String>) -> Self {
        Self::Uri(uri.into())
    }

    /// Create a blank node term.
    #[must_use]
    pub fn blank(label: impl Into<String>) -> Self {
        Self::Blank(label.into())
    }

    /// Create a plain literal term.
    #[must_use]
    pub fn plain(lexical: impl Into<String>) -> Self {
        Self::Literal(Literal::plain(lexical))
    }

    #[must_use]
    pub const fn is_uri(&self) -> bool {
        matches!(self, Self::Uri(_))
    }

    #[must_use]
    pub const fn is_blank(&self) -> bool {
        matches!(self, Self::Blank(_))
    }

    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Get the literal if this term is one.
    #[must_use]
    pub const fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /// Rank of the term's category in the pool ordering: blank < URI < literal.
    #[must_use]
    pub const fn category_rank(&self) -> u8 {
        match self {
            Self::Blank(_) => 0,
            Self::Uri(_) => 1,
            Self::Literal(_) => 2,
        }
    }

    /// Short human-readable name of the term's kind, used in error messages.
    #[must_use]
    pub fn kind(&self) -> String {
        match self {
            Self::Uri(_) => "URI".to_string(),
            Self::Blank(_) => "blank node".to_string(),
            Self::Literal(literal) => format!("literal of type <{}>", literal.effective_datatype()),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uri(uri) => write!(f, "<{uri}>"),
            Self::Blank(label) => write!(f, "_:{label}"),
            Self::Literal(literal) => write!(f, "{literal}"),
        }
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

/// A literal: lexical form plus optional datatype or language tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    lexical: String,
    datatype: Option<String>,
    language: Option<String>,
}

impl Literal {
    /// A plain literal with neither datatype nor language.
    #[must_use]
    pub fn plain(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        }
    }

    /// A typed literal. The lexical form is checked against the datatype
    /// when the literal is localized, not here.
    #[must_use]
    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    /// A language-tagged literal. The tag is lower-cased.
    #[must_use]
    pub fn lang_tagged(lexical: impl Into<String>, language: &str) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: Some(language.to_ascii_lowercase()),
        }
    }

    /// An `xsd:integer` literal.
    #[must_use]
    pub fn integer(value: i64) -> Self {
        Self::typed(value.to_string(), xsd::INTEGER)
    }

    /// An `xsd:double` literal.
    #[must_use]
    pub fn double(value: f64) -> Self {
        Self::typed(value.to_string(), xsd::DOUBLE)
    }

    /// An `xsd:boolean` literal.
    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self::typed(value.to_string(), xsd::BOOLEAN)
    }

    #[must_use]
    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    #[must_use]
    pub fn datatype(&self) -> Option<&str> {
        self.datatype.as_deref()
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// The datatype used for comparisons: plain literals are `xsd:string`,
    /// language-tagged ones `rdf:langString`.
    #[must_use]
    pub fn effective_datatype(&self) -> &str {
        match (&self.datatype, &self.language) {
            (Some(datatype), _) => datatype,
            (None, Some(_)) => xsd::LANG_STRING,
            (None, None) => xsd::STRING,
        }
    }

    /// Whether the datatype is one of the numeric XSD types.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.datatype
            .as_deref()
            .is_some_and(|dt| xsd::is_integer_type(dt) || xsd::is_float_type(dt))
    }

    /// Parse the numeric value, if the literal is numeric and well-formed.
    #[must_use]
    pub fn numeric(&self) -> Option<Numeric> {
        let datatype = self.datatype.as_deref()?;
        let lexical = self.lexical.trim();
        if xsd::is_integer_type(datatype) {
            let value = lexical.strip_prefix('+').unwrap_or(lexical).parse::<i64>().ok()?;
            return integer_in_range(datatype, value).then_some(Numeric::Integer(value));
        }
        if xsd::is_float_type(datatype) {
            return match lexical {
                "INF" | "+INF" => Some(Numeric::Float(f64::INFINITY)),
                "-INF" => Some(Numeric::Float(f64::NEG_INFINITY)),
                "NaN" => Some(Numeric::Float(f64::NAN)),
                _ => lexical.parse::<f64>().ok().map(Numeric::Float),
            };
        }
        None
    }

    /// Parse the boolean value, if this is a well-formed `xsd:boolean`.
    #[must_use]
    pub fn boolean_value(&self) -> Option<bool> {
        if self.datatype.as_deref() != Some(xsd::BOOLEAN) {
            return None;
        }
        match self.lexical.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}

/// Range restrictions of the bounded integer types.
fn integer_in_range(datatype: &str, value: i64) -> bool {
    match datatype {
        xsd::INT => i32::try_from(value).is_ok(),
        xsd::SHORT => i16::try_from(value).is_ok(),
        xsd::BYTE => i8::try_from(value).is_ok(),
        xsd::NON_NEGATIVE_INTEGER => value >= 0,
        xsd::POSITIVE_INTEGER => value > 0,
        xsd::NON_POSITIVE_INTEGER => value <= 0,
        xsd::NEGATIVE_INTEGER => value < 0,
        _ => true,
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        for c in self.lexical.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                other => write!(f, "{other}")?,
            }
        }
        f.write_str("\"")?;
        if let Some(language) = &self.language {
            write!(f, "@{language}")?;
        } else if let Some(datatype) = &self.datatype {
            write!(f, "^^<{datatype}>")?;
        }
        Ok(())
    }
}

/// A parsed numeric literal value.
#[derive(Debug, Clone, Copy)]
pub enum Numeric {
    Integer(i64),
    Float(f64),
}

impl Numeric {
    /// Widen to `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Mixed comparisons follow float promotion
    pub const fn as_f64(self) -> f64 {
        match self {
            Self::Integer(value) => value as f64,
            Self::Float(value) => value,
        }
    }

    /// Total order over numeric values. Integers compare exactly; anything
    /// involving a float compares as `f64` with `total_cmp`.
    #[must_use]
    pub fn total_cmp(self, other: Self) -> Ordering {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.cmp(&b),
            (a, b) => a.as_f64().total_cmp(&b.as_f64()),
        }
    }

    /// Value equality. `NaN` is never equal to anything.
    #[must_use]
    #[allow(clippy::float_cmp)] // Value equality is exact by definition
    pub fn value_eq(self, other: Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}
