//! Versioned in-memory quad store.
//!
//! The committed state is an immutable [`Version`] behind an `Arc`.
//! Readers take a [`Snapshot`] (a clone of that `Arc`) and are never
//! blocked by writers. At most one [`WriteTransaction`] exists at a time;
//! it works on a copy-on-write clone of the committed version and swaps it
//! in on commit.
//!
//! # Invariants
//!
//! - `txn_id` grows by one per commit.
//! - A snapshot never observes a partially applied transaction.
//! - Rolled-back node ids are unknown to every later snapshot until a
//!   later transaction reallocates them.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock};

use crate::config::EngineConfig;
use crate::store::cursor_pool::CursorPool;
use crate::store::index::{Quad, QuadIndex};
use crate::store::{DEFAULT_GRAPH, StoreError};
use crate::string_pool::{GlobalizeError, StringPool};
use crate::types::{NodeId, Term, Triple};

/// One committed (or pending) state of the store.
#[derive(Debug, Clone, Default)]
struct Version {
    pool: Arc<StringPool>,
    index: Arc<QuadIndex>,
    graphs: Arc<BTreeSet<NodeId>>,
    txn_id: u64,
}

/// A database instance.
///
/// This is the main entry point for the store. It owns the committed
/// version and hands out snapshots and write transactions.
#[derive(Debug)]
pub struct Database {
    current: RwLock<Arc<Version>>,
    writer_active: Mutex<bool>,
    writer_released: Condvar,
    cursor_pool: Arc<CursorPool>,
}

impl Database {
    /// Create an empty database containing only the default graph.
    pub fn new(config: &EngineConfig) -> Result<Self, StoreError> {
        let database = Self {
            current: RwLock::new(Arc::new(Version::default())),
            writer_active: Mutex::new(false),
            writer_released: Condvar::new(),
            cursor_pool: CursorPool::new(config.cursor_pool_capacity, config.scan_batch_size),
        };
        let mut txn = database.begin()?;
        txn.create_graph(&Term::uri(DEFAULT_GRAPH))?;
        txn.commit()?;
        Ok(database)
    }

    /// Take a read-consistent view of the last committed version.
    #[allow(clippy::disallowed_methods)] // Arc::clone is required for shared ownership
    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let current = self.current.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(Snapshot {
            version: Arc::clone(&current),
            cursor_pool: Arc::clone(&self.cursor_pool),
        })
    }

    /// Begin a write transaction, waiting for any active writer to finish.
    pub fn begin(&self) -> Result<WriteTransaction<'_>, StoreError> {
        {
            let mut active = self
                .writer_active
                .lock()
                .map_err(|_| StoreError::LockPoisoned)?;
            while *active {
                active = self
                    .writer_released
                    .wait(active)
                    .map_err(|_| StoreError::LockPoisoned)?;
            }
            *active = true;
        }

        let pending = match self.current.read() {
            Ok(current) => Version::clone(&current),
            Err(_) => {
                self.release_writer();
                return Err(StoreError::LockPoisoned);
            }
        };
        tracing::debug!("Began write transaction on top of txn {}", pending.txn_id);

        Ok(WriteTransaction {
            database: self,
            pending,
            written: 0,
            finished: false,
        })
    }

    /// The pool lending scan buffers to leaf tuples.
    #[must_use]
    pub const fn cursor_pool(&self) -> &Arc<CursorPool> {
        &self.cursor_pool
    }

    fn release_writer(&self) {
        let mut active = self
            .writer_active
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *active = false;
        drop(active);
        self.writer_released.notify_one();
    }
}

/// A read-consistent view of one version of the store.
///
/// Cheap to clone; holding a snapshot keeps its version alive.
#[derive(Debug)]
pub struct Snapshot {
    version: Arc<Version>,
    cursor_pool: Arc<CursorPool>,
}

impl Clone for Snapshot {
    #[allow(clippy::disallowed_methods)] // Arc::clone is required for shared ownership
    fn clone(&self) -> Self {
        Self {
            version: Arc::clone(&self.version),
            cursor_pool: Arc::clone(&self.cursor_pool),
        }
    }
}

impl Snapshot {
    /// The transaction id this snapshot was taken at.
    #[must_use]
    pub fn txn_id(&self) -> u64 {
        self.version.txn_id
    }

    #[must_use]
    pub fn pool(&self) -> &StringPool {
        &self.version.pool
    }

    #[must_use]
    pub fn index(&self) -> &QuadIndex {
        &self.version.index
    }

    #[must_use]
    pub const fn cursor_pool(&self) -> &Arc<CursorPool> {
        &self.cursor_pool
    }

    /// Look up a term's id without allocating one.
    #[must_use]
    pub fn lookup_id(&self, term: &Term) -> Option<NodeId> {
        self.version.pool.lookup_id(term)
    }

    /// Resolve an id to an owned term.
    pub fn globalize(&self, id: NodeId) -> Result<Term, GlobalizeError> {
        self.version.pool.globalize(id).cloned()
    }

    /// Compare two ids by term order.
    pub fn compare(&self, left: NodeId, right: NodeId) -> Result<Ordering, GlobalizeError> {
        self.version.pool.compare(left, right)
    }

    /// Whether `graph` has been created and not removed.
    #[must_use]
    pub fn graph_exists(&self, graph: &Term) -> bool {
        self.lookup_id(graph)
            .is_some_and(|id| self.version.graphs.contains(&id))
    }

    /// Total number of stored statements across all graphs.
    #[must_use]
    pub fn statement_count(&self) -> usize {
        self.version.index.len()
    }
}

/// A pending write. Dropping it without `commit` rolls it back.
///
/// # Invariants
/// - While this exists no other write transaction on the same database does
#[derive(Debug)]
pub struct WriteTransaction<'a> {
    database: &'a Database,
    pending: Version,
    written: usize,
    finished: bool,
}

impl WriteTransaction<'_> {
    /// Intern a term, allocating an id if needed.
    pub fn intern(&mut self, term: &Term) -> Result<NodeId, StoreError> {
        Ok(Arc::make_mut(&mut self.pending.pool).localize(term)?)
    }

    /// Allocate a fresh blank node and return its term.
    pub fn new_blank_node(&mut self) -> Result<Term, StoreError> {
        let pool = Arc::make_mut(&mut self.pending.pool);
        let id = pool.new_blank_node();
        Ok(pool.globalize(id)?.clone())
    }

    /// Register a graph. Returns `false` if it already existed.
    pub fn create_graph(&mut self, graph: &Term) -> Result<bool, StoreError> {
        if !graph.is_uri() {
            return Err(StoreError::InvalidGraph(graph.to_string()));
        }
        let id = self.intern(graph)?;
        let created = Arc::make_mut(&mut self.pending.graphs).insert(id);
        if created {
            tracing::debug!("Created graph {graph}");
        }
        Ok(created)
    }

    /// Drop a graph and every statement in it.
    ///
    /// Returns the number of statements removed, or `None` if the graph did
    /// not exist.
    pub fn remove_graph(&mut self, graph: &Term) -> Result<Option<usize>, StoreError> {
        if graph == &Term::uri(DEFAULT_GRAPH) {
            return Err(StoreError::InvalidGraph(graph.to_string()));
        }
        let Some(id) = self.graph_id(graph) else {
            return Ok(None);
        };
        let quads = self.pending.index.quads_in_graph(id);
        let index = Arc::make_mut(&mut self.pending.index);
        for quad in &quads {
            index.remove(quad);
        }
        Arc::make_mut(&mut self.pending.graphs).remove(&id);
        self.written += quads.len();
        tracing::debug!("Removed graph {graph} with {} statements", quads.len());
        Ok(Some(quads.len()))
    }

    #[must_use]
    pub fn graph_exists(&self, graph: &Term) -> bool {
        self.graph_id(graph).is_some()
    }

    /// Insert a statement into `graph`. Returns `false` if already present.
    pub fn insert(&mut self, graph: &Term, triple: &Triple) -> Result<bool, StoreError> {
        if !triple.is_valid() {
            return Err(StoreError::InvalidStatement(triple.to_string()));
        }
        let graph_id = self
            .graph_id(graph)
            .ok_or_else(|| StoreError::UnknownGraph(graph.to_string()))?;
        let quad: Quad = [
            self.intern(&triple.subject)?,
            self.intern(&triple.predicate)?,
            self.intern(&triple.object)?,
            graph_id,
        ];
        let inserted = Arc::make_mut(&mut self.pending.index).insert(&quad);
        if inserted {
            self.written += 1;
        }
        Ok(inserted)
    }

    /// Delete a statement from `graph`. Returns `false` if it was absent.
    pub fn delete(&mut self, graph: &Term, triple: &Triple) -> Result<bool, StoreError> {
        let graph_id = self
            .graph_id(graph)
            .ok_or_else(|| StoreError::UnknownGraph(graph.to_string()))?;
        let pool = &self.pending.pool;
        let (Some(subject), Some(predicate), Some(object)) = (
            pool.lookup_id(&triple.subject),
            pool.lookup_id(&triple.predicate),
            pool.lookup_id(&triple.object),
        ) else {
            return Ok(false);
        };
        let quad = [subject, predicate, object, graph_id];
        if !self.pending.index.contains(&quad) {
            return Ok(false);
        }
        Arc::make_mut(&mut self.pending.index).remove(&quad);
        self.written += 1;
        Ok(true)
    }

    /// A snapshot of the pending state, including uncommitted writes.
    #[must_use]
    #[allow(clippy::disallowed_methods)] // Arc::clone is required for shared ownership
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: Arc::new(self.pending.clone()),
            cursor_pool: Arc::clone(&self.database.cursor_pool),
        }
    }

    /// Number of statements inserted or deleted so far.
    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }

    /// Publish the pending version. Returns the new transaction id.
    pub fn commit(mut self) -> Result<u64, StoreError> {
        let mut pending = std::mem::take(&mut self.pending);
        let txn_id = {
            let mut current = self
                .database
                .current
                .write()
                .map_err(|_| StoreError::LockPoisoned)?;
            pending.txn_id = current.txn_id + 1;
            let txn_id = pending.txn_id;
            *current = Arc::new(pending);
            txn_id
        };
        tracing::info!(
            "Committed txn {txn_id} ({} statements written)",
            self.written
        );
        self.finish();
        Ok(txn_id)
    }

    /// Discard the pending version.
    pub fn rollback(mut self) {
        tracing::debug!("Rolled back transaction ({} statements discarded)", self.written);
        self.finish();
    }

    fn graph_id(&self, graph: &Term) -> Option<NodeId> {
        self.pending
            .pool
            .lookup_id(graph)
            .filter(|id| self.pending.graphs.contains(id))
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            self.database.release_writer();
        }
    }
}

impl Drop for WriteTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!("Write transaction dropped without commit; rolling back");
            self.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;
    use crate::store::index::Permutation;

    fn database() -> Database {
        Database::new(&EngineConfig::default()).expect("create database")
    }

    fn triple(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(Term::uri(s), Term::uri(p), Term::uri(o))
    }

    fn default_graph() -> Term {
        Term::uri(DEFAULT_GRAPH)
    }

    #[test]
    fn test_new_database_has_default_graph() {
        let db = database();
        let snapshot = db.snapshot().expect("snapshot");
        assert!(snapshot.graph_exists(&default_graph()));
        assert_eq!(snapshot.statement_count(), 0);
        assert_eq!(snapshot.txn_id(), 1);
    }

    #[test]
    fn test_commit_publishes_and_old_snapshot_is_stable() {
        let db = database();
        let before = db.snapshot().expect("snapshot");

        let mut txn = db.begin().expect("begin");
        let statement = triple("http://a", "http://p", "http://b");
        assert!(txn.insert(&default_graph(), &statement).expect("insert"));
        assert!(!txn.insert(&default_graph(), &statement).expect("insert"));
        assert_eq!(txn.written(), 1);
        let txn_id = txn.commit().expect("commit");

        let after = db.snapshot().expect("snapshot");
        assert_eq!(after.txn_id(), txn_id);
        assert_eq!(after.statement_count(), 1);
        assert_eq!(before.statement_count(), 0);
        assert_eq!(before.lookup_id(&Term::uri("http://a")), None);
    }

    #[test]
    fn test_rolled_back_ids_fail_to_globalize() {
        let db = database();
        let mut txn = db.begin().expect("begin");
        let id = txn.intern(&Term::uri("http://transient")).expect("intern");
        assert_eq!(
            txn.snapshot().globalize(id).expect("visible inside txn"),
            Term::uri("http://transient")
        );
        txn.rollback();

        let snapshot = db.snapshot().expect("snapshot");
        assert_eq!(snapshot.globalize(id), Err(GlobalizeError::UnknownNode(id)));
    }

    #[test]
    fn test_drop_releases_writer() {
        let db = database();
        {
            let _txn = db.begin().expect("begin");
        }
        let txn = db.begin().expect("second begin must not block");
        txn.rollback();
    }

    #[test]
    fn test_writers_are_serialized() {
        let db = database();
        let (sender, receiver) = mpsc::channel();
        std::thread::scope(|scope| {
            let first = db.begin().expect("begin");
            scope.spawn(|| {
                let second = db.begin().expect("second begin");
                sender.send(()).expect("send");
                second.rollback();
            });
            assert!(receiver.recv_timeout(Duration::from_millis(50)).is_err());
            first.rollback();
            receiver
                .recv_timeout(Duration::from_secs(5))
                .expect("second writer proceeds after first finishes");
        });
    }

    #[test]
    fn test_insert_requires_existing_graph_and_valid_statement() {
        let db = database();
        let mut txn = db.begin().expect("begin");
        let err = txn
            .insert(&Term::uri("http://nowhere"), &triple("http://a", "http://p", "http://b"))
            .expect_err("unknown graph");
        assert!(matches!(err, StoreError::UnknownGraph(_)));

        let bad = Triple::new(Term::plain("lit"), Term::uri("http://p"), Term::uri("http://b"));
        let err = txn.insert(&default_graph(), &bad).expect_err("invalid statement");
        assert!(matches!(err, StoreError::InvalidStatement(_)));
    }

    #[test]
    fn test_graph_lifecycle() {
        let db = database();
        let graph = Term::uri("http://example.org/g");
        let mut txn = db.begin().expect("begin");
        assert!(txn.create_graph(&graph).expect("create"));
        assert!(!txn.create_graph(&graph).expect("create again"));
        txn.insert(&graph, &triple("http://a", "http://p", "http://b")).expect("insert");
        txn.insert(&graph, &triple("http://a", "http://p", "http://c")).expect("insert");
        txn.insert(&default_graph(), &triple("http://a", "http://p", "http://b")).expect("insert");
        assert_eq!(txn.remove_graph(&graph).expect("remove"), Some(2));
        assert_eq!(txn.remove_graph(&graph).expect("remove again"), None);
        assert!(!txn.graph_exists(&graph));
        assert!(txn.remove_graph(&default_graph()).is_err());
        txn.commit().expect("commit");

        let snapshot = db.snapshot().expect("snapshot");
        assert_eq!(snapshot.statement_count(), 1);
        assert!(!snapshot.graph_exists(&graph));
    }

    #[test]
    fn test_delete() {
        let db = database();
        let mut txn = db.begin().expect("begin");
        let statement = triple("http://a", "http://p", "http://b");
        txn.insert(&default_graph(), &statement).expect("insert");
        assert!(txn.delete(&default_graph(), &statement).expect("delete"));
        assert!(!txn.delete(&default_graph(), &statement).expect("delete"));
        let absent = triple("http://x", "http://y", "http://z");
        assert!(!txn.delete(&default_graph(), &absent).expect("delete"));
        txn.commit().expect("commit");
        let snapshot = db.snapshot().expect("snapshot");
        assert_eq!(snapshot.index().range_len(Permutation::Spog, &[]), 0);
    }

    #[test]
    fn test_equal_numeric_values_are_one_statement() {
        use crate::types::{Literal, xsd};

        let db = database();
        let age = |lexical: &str| {
            Triple::new(
                Term::uri("http://a"),
                Term::uri("http://age"),
                Term::from(Literal::typed(lexical, xsd::INTEGER)),
            )
        };
        let mut txn = db.begin().expect("begin");
        assert!(txn.insert(&default_graph(), &age("+7")).expect("insert"));
        assert!(!txn.insert(&default_graph(), &age("007")).expect("insert"));
        txn.commit().expect("commit");

        let snapshot = db.snapshot().expect("snapshot");
        assert_eq!(snapshot.statement_count(), 1);
        let seven = snapshot
            .lookup_id(&Term::from(Literal::integer(7)))
            .expect("canonical value is interned");
        assert_eq!(
            snapshot.globalize(seven).expect("globalize"),
            Term::from(Literal::integer(7))
        );

        let mut txn = db.begin().expect("begin");
        assert!(txn.delete(&default_graph(), &age("7")).expect("delete"));
        txn.commit().expect("commit");
        assert_eq!(db.snapshot().expect("snapshot").statement_count(), 0);
    }
}
