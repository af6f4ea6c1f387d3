//! In-process session over a shared [`Database`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::connection::{Session, SessionError};
use crate::content::{Content, ContentHandlerManager};
use crate::query::executor;
use crate::query::{
    Answer, AskQuery, BooleanAnswer, ConstraintElement, ConstraintExpression, ConstructQuery,
    GraphAnswer, Query, SimpleConstraint,
};
use crate::store::{Database, StoreError, WriteTransaction};
use crate::types::{Term, Triple, Variable};

/// A session that resolves queries directly against a database in this
/// process. Each query runs on its own snapshot; each write call is one
/// transaction.
#[derive(Debug)]
pub struct LocalSession {
    database: Arc<Database>,
    content: Arc<ContentHandlerManager>,
    closed: AtomicBool,
}

impl LocalSession {
    #[must_use]
    pub const fn new(
        database: Arc<Database>,
        content: Arc<ContentHandlerManager>,
    ) -> Self {
        Self {
            database,
            content,
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub const fn database(&self) -> &Arc<Database> {
        &self.database
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    /// A pattern query over `graph`: one variable per wildcard.
    fn pattern_query(
        graph: &str,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Query {
        let element = |term: Option<&Term>, name: &str| {
            term.map_or_else(
                || ConstraintElement::var(name),
                |t| ConstraintElement::Term(t.clone()),
            )
        };
        let pattern = SimpleConstraint::new(
            element(subject, "subject"),
            element(predicate, "predicate"),
            element(object, "object"),
        );
        let variables: Vec<Variable> = pattern.variables();
        Query::new(variables, ConstraintExpression::Simple(pattern)).in_graph(Term::uri(graph))
    }

    /// Apply `write` to each triple in one transaction; count the `true`s.
    fn write_each<F>(
        &self,
        graph: &str,
        triples: &[Triple],
        mut write: F,
    ) -> Result<usize, SessionError>
    where
        F: FnMut(&mut WriteTransaction<'_>, &Term, &Triple) -> Result<bool, StoreError>,
    {
        self.ensure_open()?;
        let graph = Term::uri(graph);
        let mut txn = self.database.begin()?;
        let mut changed = 0;
        for triple in triples {
            if write(&mut txn, &graph, triple)? {
                changed += 1;
            }
        }
        txn.commit()?;
        Ok(changed)
    }
}

impl Session for LocalSession {
    fn query(&self, query: &Query) -> Result<Answer, SessionError> {
        self.ensure_open()?;
        Ok(executor::execute(self.database.snapshot()?, query)?)
    }

    fn ask(&self, query: &AskQuery) -> Result<BooleanAnswer, SessionError> {
        self.ensure_open()?;
        Ok(executor::ask(self.database.snapshot()?, query)?)
    }

    fn construct(&self, query: &ConstructQuery) -> Result<GraphAnswer, SessionError> {
        self.ensure_open()?;
        Ok(executor::construct(self.database.snapshot()?, query)?)
    }

    fn insert(&self, graph: &str, triples: &[Triple]) -> Result<usize, SessionError> {
        self.write_each(graph, triples, |txn, graph, triple| txn.insert(graph, triple))
    }

    fn delete(&self, graph: &str, triples: &[Triple]) -> Result<usize, SessionError> {
        self.write_each(graph, triples, |txn, graph, triple| txn.delete(graph, triple))
    }

    fn contains(
        &self,
        graph: &str,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Result<bool, SessionError> {
        let query = Self::pattern_query(graph, subject, predicate, object);
        let ask = AskQuery::new(query.constraint).in_graph(query.default_graph);
        Ok(self.ask(&ask)?.value())
    }

    fn find(
        &self,
        graph: &str,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> Result<Answer, SessionError> {
        self.query(&Self::pattern_query(graph, subject, predicate, object))
    }

    fn create_graph(&self, graph: &str) -> Result<bool, SessionError> {
        self.ensure_open()?;
        let mut txn = self.database.begin()?;
        let created = txn.create_graph(&Term::uri(graph))?;
        txn.commit()?;
        Ok(created)
    }

    fn remove_graph(&self, graph: &str) -> Result<bool, SessionError> {
        self.ensure_open()?;
        let mut txn = self.database.begin()?;
        let removed = txn.remove_graph(&Term::uri(graph))?;
        txn.commit()?;
        if let Some(statements) = removed {
            tracing::info!("Removed graph {graph} ({statements} statements)");
        }
        Ok(removed.is_some())
    }

    fn graph_exists(&self, graph: &str) -> Result<bool, SessionError> {
        self.ensure_open()?;
        Ok(self.database.snapshot()?.graph_exists(&Term::uri(graph)))
    }

    fn load(&self, graph: &str, content: &Content) -> Result<usize, SessionError> {
        self.ensure_open()?;
        let graph_term = Term::uri(graph);
        let mut txn = self.database.begin()?;
        let triples = self.content.parse(content, &mut txn)?;
        let mut inserted = 0;
        for triple in &triples {
            if txn.insert(&graph_term, triple)? {
                inserted += 1;
            }
        }
        txn.commit()?;
        tracing::info!(
            "Loaded {inserted} of {} statements from {content} into {graph}",
            triples.len()
        );
        Ok(inserted)
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!("Closed local session");
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::store::DEFAULT_GRAPH;

    fn session() -> LocalSession {
        let database = Arc::new(Database::new(&EngineConfig::default()).expect("database"));
        LocalSession::new(database, Arc::new(ContentHandlerManager::new()))
    }

    fn triple(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(Term::uri(s), Term::uri(p), Term::uri(o))
    }

    #[test]
    fn test_insert_contains_delete() {
        let session = session();
        let t = triple("http://a", "http://p", "http://b");
        assert_eq!(session.insert(DEFAULT_GRAPH, &[t.clone(), t.clone()]).expect("insert"), 1);
        assert!(session
            .contains(DEFAULT_GRAPH, Some(&t.subject), None, None)
            .expect("contains"));
        assert!(!session
            .contains(DEFAULT_GRAPH, None, None, Some(&Term::uri("http://zzz")))
            .expect("contains"));
        assert_eq!(session.delete(DEFAULT_GRAPH, &[t.clone()]).expect("delete"), 1);
        assert!(!session.contains(DEFAULT_GRAPH, None, None, None).expect("contains"));
    }

    #[test]
    fn test_find_binds_wildcards() {
        let session = session();
        session
            .insert(DEFAULT_GRAPH, &[triple("http://a", "http://p", "http://b")])
            .expect("insert");
        let mut answer = session
            .find(DEFAULT_GRAPH, Some(&Term::uri("http://a")), None, None)
            .expect("find");
        assert_eq!(
            answer.variables(),
            &[Variable::new("predicate"), Variable::new("object")]
        );
        assert!(answer.next().expect("next"));
        assert_eq!(answer.get(1).expect("get"), Some(Term::uri("http://b")));
        answer.close().expect("close");
    }

    #[test]
    fn test_graph_lifecycle() {
        let session = session();
        let graph = "http://example.org/graph";
        assert!(!session.graph_exists(graph).expect("exists"));
        assert!(session.create_graph(graph).expect("create"));
        assert!(!session.create_graph(graph).expect("create again"));
        session
            .insert(graph, &[triple("http://a", "http://p", "http://b")])
            .expect("insert");
        assert!(!session.contains(DEFAULT_GRAPH, None, None, None).expect("contains"));
        assert!(session.remove_graph(graph).expect("remove"));
        assert!(!session.remove_graph(graph).expect("remove again"));
    }

    #[test]
    fn test_insert_into_missing_graph_fails() {
        let session = session();
        let err = session
            .insert("http://nowhere", &[triple("http://a", "http://p", "http://b")])
            .expect_err("unknown graph");
        assert!(matches!(err, SessionError::Store(StoreError::UnknownGraph(_))));
    }

    #[test]
    fn test_closed_session_rejects_calls() {
        let session = session();
        session.close();
        session.close();
        assert!(session.is_closed());
        assert!(matches!(session.graph_exists(DEFAULT_GRAPH), Err(SessionError::Closed)));
        assert!(matches!(
            session.insert(DEFAULT_GRAPH, &[]),
            Err(SessionError::Closed)
        ));
    }

    #[test]
    fn test_load_inline_content() {
        let session = session();
        let content = Content::inline(
            "<http://a> <http://p> _:x .\n_:x <http://p> \"v\" .\n",
            Some("application/n-triples"),
        );
        assert_eq!(session.load(DEFAULT_GRAPH, &content).expect("load"), 2);
        let mut answer = session.find(DEFAULT_GRAPH, None, None, None).expect("find");
        assert_eq!(answer.row_count().expect("count"), 2);
        answer.close().expect("close");
    }
}
