//! Regular expression filter.
//!
//! The pattern and flags are operands like any other, so they may be bound
//! per row. The last compiled expression is cached together with the
//! pattern and flags it was compiled from, and is only rebuilt when either
//! changes.

use std::collections::BTreeSet;
use std::sync::Mutex;

use regex::{Regex, RegexBuilder};

use crate::query::QueryError;
use crate::query::context::Context;
use crate::query::filter::ValueExpr;
use crate::types::{Term, Variable};

#[derive(Debug)]
struct Compiled {
    pattern: String,
    flags: String,
    regex: Regex,
}

/// `regex(text, pattern, flags)`: whether the whole lexical form of `text`
/// matches `pattern`.
///
/// Supported flags: `i` (case-insensitive), `m` (multi-line), `s` (dot
/// matches newline), `x` (ignore whitespace).
#[derive(Debug)]
pub struct RegexFilter {
    text: ValueExpr,
    pattern: ValueExpr,
    flags: Option<ValueExpr>,
    compiled: Mutex<Option<Compiled>>,
}

impl Clone for RegexFilter {
    fn clone(&self) -> Self {
        Self {
            text: self.text.clone(),
            pattern: self.pattern.clone(),
            flags: self.flags.clone(),
            compiled: Mutex::new(None),
        }
    }
}

impl RegexFilter {
    #[must_use]
    pub const fn new(text: ValueExpr, pattern: ValueExpr, flags: Option<ValueExpr>) -> Self {
        Self {
            text,
            pattern,
            flags,
            compiled: Mutex::new(None),
        }
    }

    pub(crate) fn test(&self, context: &dyn Context) -> Result<bool, QueryError> {
        let Some(text) = self.text.evaluate(context)? else {
            return Ok(false);
        };
        let Some(pattern) = self.pattern.evaluate(context)? else {
            return Ok(false);
        };
        let flags = match &self.flags {
            Some(flags) => match flags.evaluate(context)? {
                Some(term) => lexical_of(&term, "regex flags")?.to_owned(),
                None => return Ok(false),
            },
            None => String::new(),
        };
        let text = lexical_of(&text, "regex text")?;
        let pattern = lexical_of(&pattern, "regex pattern")?;

        #[allow(clippy::expect_used)] // Mutex poisoning indicates unrecoverable state
        let mut compiled = self.compiled.lock().expect("regex cache lock poisoned");
        let stale = compiled
            .as_ref()
            .is_none_or(|c| c.pattern != pattern || c.flags != flags);
        if stale {
            let regex = compile(pattern, &flags)?;
            tracing::trace!("Compiled regex {pattern:?} with flags {flags:?}");
            *compiled = Some(Compiled {
                pattern: pattern.to_owned(),
                flags,
                regex,
            });
        }
        Ok(compiled.as_ref().is_some_and(|c| c.regex.is_match(text)))
    }

    pub(crate) fn collect_variables(&self, into: &mut BTreeSet<Variable>) {
        self.text.collect_variables(into);
        self.pattern.collect_variables(into);
        if let Some(flags) = &self.flags {
            flags.collect_variables(into);
        }
    }
}

fn lexical_of<'a>(term: &'a Term, role: &str) -> Result<&'a str, QueryError> {
    term.as_literal().map(|literal| literal.lexical()).ok_or_else(|| {
        QueryError::Type(format!("{role} must be a literal, found {} {term}", term.kind()))
    })
}

fn compile(pattern: &str, flags: &str) -> Result<Regex, QueryError> {
    let mut builder = RegexBuilder::new(&format!(r"\A(?:{pattern})\z"));
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => {
                return Err(QueryError::InvalidRegex {
                    pattern: pattern.to_owned(),
                    message: format!("unknown flag '{other}'"),
                });
            }
        };
    }
    builder.build().map_err(|e| QueryError::InvalidRegex {
        pattern: pattern.to_owned(),
        message: e.to_string(),
    })
}
