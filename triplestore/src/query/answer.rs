//! Query results handed to callers.
//!
//! An [`Answer`] owns the resolved tuples and the snapshot they were
//! resolved against, so its values stay resolvable for as long as it is
//! open, whatever writers do meanwhile.

use std::collections::VecDeque;

use crate::query::QueryError;
use crate::query::constraint::ConstraintElement;
use crate::store::Snapshot;
use crate::tuples::Tuples;
use crate::types::{Term, Triple, Variable};

/// The rows of a select query.
///
/// Closing is idempotent. Every other call after [`close`](Self::close)
/// fails with [`QueryError::Closed`]. An answer dropped while open is
/// closed (with a warning).
#[derive(Debug)]
pub struct Answer {
    tuples: Box<dyn Tuples>,
    snapshot: Snapshot,
    closed: bool,
}

impl Answer {
    #[must_use]
    pub fn new(tuples: Box<dyn Tuples>, snapshot: Snapshot) -> Self {
        Self {
            tuples,
            snapshot,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), QueryError> {
        if self.closed {
            return Err(QueryError::Closed("answer"));
        }
        Ok(())
    }

    /// Column variables, in projection order.
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        self.tuples.variables()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.tuples.column_count()
    }

    /// Reset to before the first row.
    pub fn before_first(&mut self) -> Result<(), QueryError> {
        self.ensure_open()?;
        Ok(self.tuples.before_first(&[])?)
    }

    /// Advance one row. Returns `false` at the end.
    pub fn next(&mut self) -> Result<bool, QueryError> {
        self.ensure_open()?;
        Ok(self.tuples.next()?)
    }

    /// Term in `column` of the current row, `None` if unbound.
    pub fn get(&self, column: usize) -> Result<Option<Term>, QueryError> {
        self.ensure_open()?;
        match self.tuples.column_value(column)? {
            Some(id) => Ok(Some(self.snapshot.globalize(id)?)),
            None => Ok(None),
        }
    }

    /// Term bound to the variable called `name` in the current row.
    pub fn get_by_name(&self, name: &str) -> Result<Option<Term>, QueryError> {
        let variable = Variable::new(name);
        let column = self
            .tuples
            .column_index(&variable)
            .ok_or(QueryError::UnknownVariable(variable))?;
        self.get(column)
    }

    /// Exact number of rows. Leaves the cursor before the first row.
    pub fn row_count(&mut self) -> Result<u64, QueryError> {
        self.ensure_open()?;
        Ok(self.tuples.row_count()?)
    }

    /// A cheap bound that is never below [`row_count`](Self::row_count).
    #[must_use]
    pub fn row_upper_bound(&self) -> u64 {
        self.tuples.row_upper_bound()
    }

    /// Release the underlying tuples. Idempotent.
    pub fn close(&mut self) -> Result<(), QueryError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        Ok(self.tuples.close()?)
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Answer {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                "Answer over {:?} dropped without close",
                self.tuples.variables()
            );
            if let Err(e) = self.close() {
                tracing::warn!("Failed to close dropped answer: {e}");
            }
        }
    }
}

/// The result of an ask query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BooleanAnswer(pub bool);

impl BooleanAnswer {
    #[must_use]
    pub const fn value(self) -> bool {
        self.0
    }
}

/// Triples produced by a construct query.
///
/// Each solution instantiates every template triple. A triple with an
/// unbound template variable, or one that is not a legal statement (a
/// literal subject, a non-URI predicate), is skipped.
#[derive(Debug)]
pub struct GraphAnswer {
    answer: Answer,
    template: Vec<ConstraintElement>,
    pending: VecDeque<Triple>,
}

impl GraphAnswer {
    #[must_use]
    pub fn new(answer: Answer, template: Vec<ConstraintElement>) -> Self {
        Self {
            answer,
            template,
            pending: VecDeque::new(),
        }
    }

    /// The next constructed triple, or `None` when every solution has been
    /// used.
    pub fn next_triple(&mut self) -> Result<Option<Triple>, QueryError> {
        loop {
            if let Some(triple) = self.pending.pop_front() {
                return Ok(Some(triple));
            }
            if !self.answer.next()? {
                return Ok(None);
            }
            for chunk in self.template.chunks(3) {
                if let Some(triple) = self.instantiate(chunk)? {
                    self.pending.push_back(triple);
                }
            }
        }
    }

    /// Drain every remaining triple.
    pub fn collect_triples(&mut self) -> Result<Vec<Triple>, QueryError> {
        let mut triples = Vec::new();
        while let Some(triple) = self.next_triple()? {
            triples.push(triple);
        }
        Ok(triples)
    }

    fn instantiate(&self, chunk: &[ConstraintElement]) -> Result<Option<Triple>, QueryError> {
        let mut terms = Vec::with_capacity(3);
        for element in chunk {
            let term = match element {
                ConstraintElement::Term(term) => Some(term.clone()),
                ConstraintElement::Variable(variable) => {
                    self.answer.get_by_name(variable.name())?
                }
            };
            match term {
                Some(term) => terms.push(term),
                None => return Ok(None),
            }
        }
        let mut terms = terms.into_iter();
        let (Some(subject), Some(predicate), Some(object)) =
            (terms.next(), terms.next(), terms.next())
        else {
            return Ok(None);
        };
        let triple = Triple::new(subject, predicate, object);
        if !triple.is_valid() {
            tracing::debug!("Skipping invalid constructed triple {triple}");
            return Ok(None);
        }
        Ok(Some(triple))
    }

    pub fn close(&mut self) -> Result<(), QueryError> {
        self.pending.clear();
        self.answer.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::database_with;
    use crate::tuples::LiteralTuples;

    #[test]
    fn test_answer_globalizes_and_closes_once() {
        let db = database_with(&[("http://a", "http://p", "http://b")]);
        let snapshot = db.snapshot().expect("snapshot");
        let id = snapshot.lookup_id(&Term::uri("http://a")).expect("stored");
        let tuples = LiteralTuples::single_column(Variable::new("x"), &[id]);
        let mut answer = Answer::new(Box::new(tuples), snapshot);

        assert!(answer.next().expect("next"));
        assert_eq!(answer.get(0).expect("get"), Some(Term::uri("http://a")));
        assert!(matches!(
            answer.get_by_name("nope"),
            Err(QueryError::UnknownVariable(_))
        ));
        assert_eq!(answer.row_count().expect("count"), 1);

        answer.close().expect("close");
        answer.close().expect("second close is a no-op");
        assert!(matches!(answer.next(), Err(QueryError::Closed(_))));
    }

    #[test]
    fn test_graph_answer_skips_invalid_triples() {
        let db = database_with(&[("http://a", "http://p", "http://b")]);
        let snapshot = db.snapshot().expect("snapshot");
        let a = snapshot.lookup_id(&Term::uri("http://a")).expect("stored");
        let tuples = LiteralTuples::new(
            vec![Variable::new("s"), Variable::new("o")],
            vec![vec![Some(a), None]],
        );
        let template = vec![
            ConstraintElement::var("s"),
            ConstraintElement::uri("http://q"),
            ConstraintElement::Term(Term::plain("v")),
            ConstraintElement::var("s"),
            ConstraintElement::uri("http://q"),
            ConstraintElement::var("o"),
            ConstraintElement::Term(Term::plain("literal subject")),
            ConstraintElement::uri("http://q"),
            ConstraintElement::var("s"),
        ];
        let mut graph = GraphAnswer::new(Answer::new(Box::new(tuples), snapshot), template);
        let triples = graph.collect_triples().expect("triples");
        assert_eq!(
            triples,
            vec![Triple::new(Term::uri("http://a"), Term::uri("http://q"), Term::plain("v"))]
        );
        graph.close().expect("close");
    }
}
