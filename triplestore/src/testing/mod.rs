//! Fixtures shared by unit and end-to-end tests.

use crate::config::EngineConfig;
use crate::store::{DEFAULT_GRAPH, Database, Snapshot};
use crate::tuples::{Tuples, materialize};
use crate::types::{Term, Triple};

/// A fresh database with the default configuration.
pub fn new_test_database() -> Database {
    Database::new(&EngineConfig::default()).expect("create test database")
}

/// A database whose default graph holds `triples`.
pub fn database_with_triples(triples: &[Triple]) -> Database {
    let db = new_test_database();
    let mut txn = db.begin().expect("begin");
    let graph = Term::uri(DEFAULT_GRAPH);
    for triple in triples {
        txn.insert(&graph, triple).expect("insert");
    }
    txn.commit().expect("commit");
    db
}

/// A database whose default graph holds URI-only statements.
pub fn database_with(statements: &[(&str, &str, &str)]) -> Database {
    let triples: Vec<Triple> = statements
        .iter()
        .map(|(s, p, o)| Triple::new(Term::uri(*s), Term::uri(*p), Term::uri(*o)))
        .collect();
    database_with_triples(&triples)
}

/// Drain and close `tuples`, globalizing every value.
pub fn globalized_rows(mut tuples: Box<dyn Tuples>, snapshot: &Snapshot) -> Vec<Vec<Option<Term>>> {
    materialize(tuples.as_mut())
        .expect("materialize")
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|value| value.map(|id| snapshot.globalize(id).expect("globalize")))
                .collect()
        })
        .collect()
}

/// One column of [`globalized_rows`], skipping unbound values.
pub fn globalized_column(tuples: Box<dyn Tuples>, snapshot: &Snapshot, column: usize) -> Vec<Term> {
    globalized_rows(tuples, snapshot)
        .into_iter()
        .filter_map(|mut row| row.swap_remove(column))
        .collect()
}
