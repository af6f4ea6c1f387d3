//! N-Triples reader.
//!
//! One statement per line: `subject predicate object .`, with `#`
//! comments and blank lines ignored. Blank node labels are scoped to one
//! document and mapped to fresh store blank nodes.

use std::collections::HashMap;

use crate::content::{Content, ContentError, ContentHandler, ResolverSession};
use crate::types::{Literal, Term, Triple};

const MEDIA_TYPES: &[&str] = &["application/n-triples", "text/plain"];

#[derive(Debug, Clone, Copy, Default)]
pub struct NTriplesHandler;

impl ContentHandler for NTriplesHandler {
    fn can_parse(&self, content: &Content) -> bool {
        match content.media_type.as_deref() {
            Some(media_type) => MEDIA_TYPES.contains(&media_type),
            None => content.extension().is_none_or(|ext| ext.eq_ignore_ascii_case("nt")),
        }
    }

    fn parse(
        &self,
        content: &Content,
        session: &mut dyn ResolverSession,
    ) -> Result<Vec<Triple>, ContentError> {
        let text = content.read_to_string()?;
        let mut blank_nodes: HashMap<String, Term> = HashMap::new();
        let mut triples = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;
            let syntax = |message: String| ContentError::Syntax {
                line: line_number,
                message,
            };
            let mut parser = LineParser::new(line);
            parser.skip_whitespace();
            if parser.at_end_of_statement() {
                continue;
            }
            let subject = parser.term().map_err(syntax)?;
            let predicate = parser.term().map_err(syntax)?;
            let object = parser.term().map_err(syntax)?;
            parser.finish().map_err(syntax)?;

            let subject = resolve_blank(subject, &mut blank_nodes, session)?;
            let object = resolve_blank(object, &mut blank_nodes, session)?;
            let triple = Triple::new(subject, predicate, object);
            if !triple.is_valid() {
                return Err(syntax(format!("{triple} is not a valid statement")));
            }
            triples.push(triple);
        }
        tracing::debug!("Parsed {} N-Triples statements", triples.len());
        Ok(triples)
    }
}

fn resolve_blank(
    term: Term,
    blank_nodes: &mut HashMap<String, Term>,
    session: &mut dyn ResolverSession,
) -> Result<Term, ContentError> {
    let Term::Blank(label) = term else {
        return Ok(term);
    };
    if let Some(existing) = blank_nodes.get(&label) {
        return Ok(existing.clone());
    }
    let fresh = session.new_blank_node()?;
    blank_nodes.insert(label, fresh.clone());
    Ok(fresh)
}

/// Cursor over one line.
struct LineParser<'a> {
    rest: &'a str,
}

impl<'a> LineParser<'a> {
    const fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn at_end_of_statement(&self) -> bool {
        self.rest.is_empty() || self.rest.starts_with('#')
    }

    fn expect_char(&mut self, expected: char) -> Result<(), String> {
        match self.rest.strip_prefix(expected) {
            Some(rest) => {
                self.rest = rest;
                Ok(())
            }
            None => Err(format!("expected '{expected}' at {:?}", preview(self.rest))),
        }
    }

    fn term(&mut self) -> Result<Term, String> {
        self.skip_whitespace();
        let term = match self.rest.chars().next() {
            Some('<') => Term::uri(self.iri()?),
            Some('_') => Term::blank(self.blank_label()?),
            Some('"') => Term::from(self.literal()?),
            Some(_) => return Err(format!("unexpected {:?}", preview(self.rest))),
            None => return Err("unexpected end of line".to_string()),
        };
        Ok(term)
    }

    fn iri(&mut self) -> Result<String, String> {
        self.expect_char('<')?;
        let end = self
            .rest
            .find('>')
            .ok_or_else(|| "unterminated IRI".to_string())?;
        let raw = &self.rest[..end];
        self.rest = &self.rest[end + 1..];
        if raw.is_empty() {
            return Err("empty IRI".to_string());
        }
        unescape(raw)
    }

    fn blank_label(&mut self) -> Result<String, String> {
        self.expect_char('_')?;
        self.expect_char(':')?;
        let end = self.rest.find(char::is_whitespace).unwrap_or(self.rest.len());
        let mut label = &self.rest[..end];
        // A label may not end with '.', which belongs to the statement.
        while let Some(stripped) = label.strip_suffix('.') {
            label = stripped;
        }
        if label.is_empty() {
            return Err("empty blank node label".to_string());
        }
        self.rest = &self.rest[label.len()..];
        Ok(label.to_string())
    }

    fn literal(&mut self) -> Result<Literal, String> {
        self.expect_char('"')?;
        let mut end = None;
        let mut escaped = false;
        for (index, c) in self.rest.char_indices() {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => {
                    end = Some(index);
                    break;
                }
                _ => {}
            }
        }
        let end = end.ok_or_else(|| "unterminated literal".to_string())?;
        let lexical = unescape(&self.rest[..end])?;
        self.rest = &self.rest[end + 1..];

        if let Some(rest) = self.rest.strip_prefix('@') {
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
                .unwrap_or(rest.len());
            if end == 0 {
                return Err("empty language tag".to_string());
            }
            self.rest = &rest[end..];
            return Ok(Literal::lang_tagged(lexical, &rest[..end]));
        }
        if let Some(rest) = self.rest.strip_prefix("^^") {
            self.rest = rest;
            let datatype = self.iri()?;
            return Ok(Literal::typed(lexical, datatype));
        }
        Ok(Literal::plain(lexical))
    }

    fn finish(&mut self) -> Result<(), String> {
        self.skip_whitespace();
        self.expect_char('.')?;
        self.skip_whitespace();
        if self.at_end_of_statement() {
            Ok(())
        } else {
            Err(format!("trailing content {:?}", preview(self.rest)))
        }
    }
}

/// Decode `\t \b \n \r \f \" \' \\ \uXXXX \UXXXXXXXX`.
fn unescape(raw: &str) -> Result<String, String> {
    if !raw.contains('\\') {
        return Ok(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let decoded = match chars.next() {
            Some('t') => '\t',
            Some('b') => '\u{8}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('f') => '\u{c}',
            Some('"') => '"',
            Some('\'') => '\'',
            Some('\\') => '\\',
            Some('u') => hex_char(&mut chars, 4)?,
            Some('U') => hex_char(&mut chars, 8)?,
            Some(other) => return Err(format!("unknown escape '\\{other}'")),
            None => return Err("dangling '\\'".to_string()),
        };
        out.push(decoded);
    }
    Ok(out)
}

fn hex_char(chars: &mut std::str::Chars<'_>, digits: usize) -> Result<char, String> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits {
        return Err(format!("truncated unicode escape '{hex}'"));
    }
    let code =
        u32::from_str_radix(&hex, 16).map_err(|_| format!("invalid unicode escape '{hex}'"))?;
    char::from_u32(code).ok_or_else(|| format!("invalid code point U+{code:X}"))
}

fn preview(text: &str) -> String {
    text.chars().take(20).collect()
}
