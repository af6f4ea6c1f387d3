//! Transitive resolution over cyclic and acyclic predicate graphs.

use crate::e2e_tests::helpers::{TestStore, element, uri};
use crate::query::{
    ClosureConstraint, ConstraintExpression, Query, QueryError, SimpleConstraint,
    TransitiveConstraint,
};
use crate::types::{Term, Variable};

fn anchored(subject: &str, object: &str) -> Query {
    let transitive = TransitiveConstraint::new(SimpleConstraint::new(
        element(subject),
        element("parent"),
        element(object),
    ))
    .expect("transitive");
    Query::select_all(ConstraintExpression::Transitive(transitive))
}

fn sorted(terms: Vec<Term>) -> Vec<String> {
    let mut names: Vec<String> = terms.iter().map(ToString::to_string).collect();
    names.sort();
    names
}

#[test]
fn test_cycle_terminates() {
    let store = TestStore::with(&[
        ("a", "parent", "b"),
        ("b", "parent", "c"),
        ("c", "parent", "d"),
        ("d", "parent", "a"),
    ]);
    let reached = store.column(&anchored("b", "?z"), 0);
    assert_eq!(
        sorted(reached),
        sorted(vec![uri("a"), uri("b"), uri("c"), uri("d")])
    );
}

#[test]
fn test_backward_walk() {
    let store = TestStore::with(&[
        ("a", "parent", "b"),
        ("b", "parent", "c"),
        ("x", "parent", "c"),
    ]);
    let reached = store.column(&anchored("?z", "c"), 0);
    assert_eq!(sorted(reached), sorted(vec![uri("a"), uri("b"), uri("x")]));
}

#[test]
fn test_chain_without_cycle_excludes_anchor() {
    let store = TestStore::with(&[("a", "parent", "b"), ("b", "parent", "c")]);
    let reached = store.column(&anchored("a", "?z"), 0);
    assert_eq!(sorted(reached), sorted(vec![uri("b"), uri("c")]));
}

#[test]
fn test_full_closure_of_cycle() {
    let store =
        TestStore::with(&[("a", "parent", "b"), ("b", "parent", "c"), ("c", "parent", "a")]);
    let closure = ClosureConstraint::new(SimpleConstraint::new(
        element("?x"),
        element("parent"),
        element("?y"),
    ))
    .expect("closure");
    let query = Query::new(
        vec![Variable::new("x"), Variable::new("y")],
        ConstraintExpression::Closure(closure),
    );
    // Every node reaches every node, itself included.
    assert_eq!(store.rows(&query).len(), 9);
    assert_eq!(store.database.cursor_pool().busy(), 0);
}

#[test]
fn test_variable_predicate_is_rejected() {
    let err = TransitiveConstraint::new(SimpleConstraint::new(
        element("a"),
        element("?p"),
        element("?z"),
    ))
    .expect_err("variable predicate");
    assert!(matches!(err, QueryError::InvalidArgument(_)));
}
