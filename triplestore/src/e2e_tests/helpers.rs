//! Common helpers for end-to-end tests.

use crate::query::executor;
use crate::query::{Answer, ConstraintElement, ConstraintExpression, Query, SimpleConstraint};
use crate::store::{DEFAULT_GRAPH, Database};
use crate::testing::database_with_triples;
use crate::types::{Term, Triple};

/// Namespace for the URIs used by the scenarios.
pub const NS: &str = "http://example.org/";

/// A URI in the test namespace.
pub fn uri(local: &str) -> Term {
    Term::uri(format!("{NS}{local}"))
}

pub fn statement(subject: &str, predicate: &str, object: &str) -> Triple {
    Triple::new(uri(subject), uri(predicate), uri(object))
}

/// A pattern element: `?name` is a variable, anything else a URI in the
/// test namespace.
pub fn element(text: &str) -> ConstraintElement {
    text.strip_prefix('?').map_or_else(
        || ConstraintElement::Term(uri(text)),
        ConstraintElement::var,
    )
}

/// A simple constraint over the default graph, written as `"?x", "knows", "?y"`.
pub fn pattern(subject: &str, predicate: &str, object: &str) -> ConstraintExpression {
    ConstraintExpression::Simple(SimpleConstraint::new(
        element(subject),
        element(predicate),
        element(object),
    ))
}

/// A database with a populated default graph.
pub struct TestStore {
    pub database: Database,
}

impl TestStore {
    #[must_use]
    pub fn with(statements: &[(&str, &str, &str)]) -> Self {
        let triples: Vec<Triple> = statements
            .iter()
            .map(|(s, p, o)| statement(s, p, o))
            .collect();
        Self::with_triples(&triples)
    }

    #[must_use]
    pub fn with_triples(triples: &[Triple]) -> Self {
        Self {
            database: database_with_triples(triples),
        }
    }

    pub fn insert(&self, triples: &[Triple]) {
        let mut txn = self.database.begin().expect("begin");
        let graph = Term::uri(DEFAULT_GRAPH);
        for triple in triples {
            txn.insert(&graph, triple).expect("insert");
        }
        txn.commit().expect("commit");
    }

    pub fn answer(&self, query: &Query) -> Answer {
        let snapshot = self.database.snapshot().expect("snapshot");
        executor::execute(snapshot, query).expect("execute")
    }

    /// Every row of the answer, in answer order.
    pub fn rows(&self, query: &Query) -> Vec<Vec<Option<Term>>> {
        let mut answer = self.answer(query);
        let mut rows = Vec::new();
        while answer.next().expect("next") {
            let row = (0..answer.column_count())
                .map(|column| answer.get(column).expect("get"))
                .collect();
            rows.push(row);
        }
        answer.close().expect("close");
        rows
    }

    /// The answer as an unordered bag: one rendered binding set per row,
    /// sorted so that two bags compare equal regardless of row or column
    /// order.
    pub fn bag(&self, query: &Query) -> Vec<String> {
        let mut answer = self.answer(query);
        let mut bag = Vec::new();
        while answer.next().expect("next") {
            let mut bindings: Vec<String> = answer
                .variables()
                .iter()
                .enumerate()
                .map(|(column, variable)| match answer.get(column).expect("get") {
                    Some(term) => format!("{variable}={term}"),
                    None => format!("{variable}=_"),
                })
                .collect();
            bindings.sort();
            bag.push(bindings.join(" "));
        }
        answer.close().expect("close");
        bag.sort();
        bag
    }

    /// The bound values of one column.
    pub fn column(&self, query: &Query, column: usize) -> Vec<Term> {
        self.rows(query)
            .into_iter()
            .filter_map(|mut row| row.swap_remove(column))
            .collect()
    }
}
