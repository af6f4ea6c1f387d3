//! Content handlers: turning external documents into statements.
//!
//! A [`ContentHandler`] parses one format. The [`ContentHandlerManager`]
//! picks the first registered handler that accepts a given [`Content`].
//! Handlers allocate blank nodes through a [`ResolverSession`], so blank
//! node labels in a document never collide with nodes already stored.

mod ntriples;

use std::fmt;
use std::path::{Path, PathBuf};

pub use ntriples::NTriplesHandler;

use crate::store::{StoreError, WriteTransaction};
use crate::types::{Term, Triple};

/// Errors raised while reading or parsing content.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("no content handler can parse {0}")]
    NoHandler(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    Path(PathBuf),
    Inline(String),
}

/// A document to load, with an optional media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub source: ContentSource,
    pub media_type: Option<String>,
}

impl Content {
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: ContentSource::Path(path.into()),
            media_type: None,
        }
    }

    #[must_use]
    pub fn inline(text: impl Into<String>, media_type: Option<&str>) -> Self {
        Self {
            source: ContentSource::Inline(text.into()),
            media_type: media_type.map(str::to_owned),
        }
    }

    /// The file extension, for path content.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        match &self.source {
            ContentSource::Path(path) => path.extension().and_then(|e| e.to_str()),
            ContentSource::Inline(_) => None,
        }
    }

    /// The whole document as text.
    pub fn read_to_string(&self) -> Result<String, ContentError> {
        match &self.source {
            ContentSource::Path(path) => read_file(path),
            ContentSource::Inline(text) => Ok(text.clone()),
        }
    }
}

fn read_file(path: &Path) -> Result<String, ContentError> {
    std::fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            ContentSource::Path(path) => write!(f, "{}", path.display())?,
            ContentSource::Inline(text) => write!(f, "inline content ({} bytes)", text.len())?,
        }
        if let Some(media_type) = &self.media_type {
            write!(f, " [{media_type}]")?;
        }
        Ok(())
    }
}

/// What a handler may ask of the store while parsing.
pub trait ResolverSession {
    /// A blank node that is not yet used anywhere in the store.
    fn new_blank_node(&mut self) -> Result<Term, ContentError>;
}

impl ResolverSession for WriteTransaction<'_> {
    fn new_blank_node(&mut self) -> Result<Term, ContentError> {
        Ok(WriteTransaction::new_blank_node(self)?)
    }
}

/// A parser for one content format.
pub trait ContentHandler: Send + Sync + fmt::Debug {
    /// Whether this handler understands `content`.
    fn can_parse(&self, content: &Content) -> bool;

    /// Parse every statement of `content`.
    fn parse(
        &self,
        content: &Content,
        session: &mut dyn ResolverSession,
    ) -> Result<Vec<Triple>, ContentError>;
}

/// Registered handlers, tried in registration order.
#[derive(Debug)]
pub struct ContentHandlerManager {
    handlers: Vec<Box<dyn ContentHandler>>,
}

impl Default for ContentHandlerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHandlerManager {
    /// A manager with the built-in handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: vec![Box::new(NTriplesHandler)],
        }
    }

    pub fn register(&mut self, handler: Box<dyn ContentHandler>) {
        self.handlers.push(handler);
    }

    /// The first handler that accepts `content`.
    pub fn handler_for(&self, content: &Content) -> Result<&dyn ContentHandler, ContentError> {
        self.handlers
            .iter()
            .find(|handler| handler.can_parse(content))
            .map(AsRef::as_ref)
            .ok_or_else(|| ContentError::NoHandler(content.to_string()))
    }

    /// Parse `content` with the first handler that accepts it.
    pub fn parse(
        &self,
        content: &Content,
        session: &mut dyn ResolverSession,
    ) -> Result<Vec<Triple>, ContentError> {
        let handler = self.handler_for(content)?;
        tracing::debug!("Parsing {content} with {handler:?}");
        handler.parse(content, session)
    }
}
