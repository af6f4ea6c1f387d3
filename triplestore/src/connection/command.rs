//! Commands executed through a connection.

use crate::connection::{Session, SessionError};
use crate::content::Content;
use crate::query::{Answer, AskQuery, BooleanAnswer, ConstructQuery, GraphAnswer, Query};

/// Something a connection can execute, with its result type.
pub trait Command {
    type Output;

    fn execute(&self, session: &dyn Session) -> Result<Self::Output, SessionError>;
}

impl Command for Query {
    type Output = Answer;

    fn execute(&self, session: &dyn Session) -> Result<Answer, SessionError> {
        let mut answer = session.query(self)?;
        if let Err(e) = answer.before_first() {
            if let Err(close_error) = answer.close() {
                tracing::warn!("Failed to close answer after reset failure: {close_error}");
            }
            return Err(e.into());
        }
        Ok(answer)
    }
}

impl Command for AskQuery {
    type Output = BooleanAnswer;

    fn execute(&self, session: &dyn Session) -> Result<BooleanAnswer, SessionError> {
        session.ask(self)
    }
}

impl Command for ConstructQuery {
    type Output = GraphAnswer;

    fn execute(&self, session: &dyn Session) -> Result<GraphAnswer, SessionError> {
        session.construct(self)
    }
}

/// Load a document into a graph.
#[derive(Debug, Clone)]
pub struct Load {
    pub graph: String,
    pub content: Content,
}

impl Load {
    #[must_use]
    pub fn new(graph: impl Into<String>, content: Content) -> Self {
        Self {
            graph: graph.into(),
            content,
        }
    }
}

impl Command for Load {
    /// Number of statements inserted.
    type Output = usize;

    fn execute(&self, session: &dyn Session) -> Result<usize, SessionError> {
        session.load(&self.graph, &self.content)
    }
}
