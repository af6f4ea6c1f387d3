//! Ask and construct queries over a small family graph.

use crate::e2e_tests::helpers::{TestStore, element, pattern, statement};
use crate::query::{AskQuery, ConstraintExpression, ConstructQuery, QueryError, executor};
use crate::types::Triple;

fn family() -> TestStore {
    TestStore::with(&[
        ("ann", "parent", "ben"),
        ("ben", "parent", "cat"),
        ("ben", "name", "ben-name"),
    ])
}

fn ask(store: &TestStore, constraint: ConstraintExpression) -> bool {
    let snapshot = store.database.snapshot().expect("snapshot");
    executor::ask(snapshot, &AskQuery::new(constraint))
        .expect("ask")
        .value()
}

#[test]
fn test_ask() {
    let store = family();
    assert!(ask(&store, pattern("ann", "parent", "?child")));
    assert!(!ask(&store, pattern("cat", "parent", "?child")));
    assert!(ask(
        &store,
        ConstraintExpression::Conjunction(vec![
            pattern("?x", "parent", "?y"),
            pattern("?y", "parent", "?z"),
        ])
    ));
    assert!(ask(&store, ConstraintExpression::True));
    assert!(!ask(&store, ConstraintExpression::False));
    assert_eq!(store.database.cursor_pool().busy(), 0);
}

#[test]
fn test_construct_grandparents() {
    let store = family();
    let query = ConstructQuery::new(
        vec![element("?x"), element("grandparent"), element("?z")],
        ConstraintExpression::Conjunction(vec![
            pattern("?x", "parent", "?y"),
            pattern("?y", "parent", "?z"),
        ]),
    )
    .expect("construct");
    let snapshot = store.database.snapshot().expect("snapshot");
    let mut graph = executor::construct(snapshot, &query).expect("construct");
    let triples: Vec<Triple> = graph.collect_triples().expect("collect");
    graph.close().expect("close");
    assert_eq!(triples, vec![statement("ann", "grandparent", "cat")]);
}

#[test]
fn test_construct_skips_unbound_template_rows() {
    let store = family();
    let query = ConstructQuery::new(
        vec![
            element("?who"),
            element("child"),
            element("?child"),
            element("?who"),
            element("label"),
            element("?name"),
        ],
        ConstraintExpression::optional(
            pattern("?who", "parent", "?child"),
            pattern("?who", "name", "?name"),
            crate::query::Filter::True,
        ),
    )
    .expect("construct");
    let snapshot = store.database.snapshot().expect("snapshot");
    let mut graph = executor::construct(snapshot, &query).expect("construct");
    let mut triples: Vec<String> = graph
        .collect_triples()
        .expect("collect")
        .iter()
        .map(ToString::to_string)
        .collect();
    graph.close().expect("close");
    triples.sort();

    let mut expected: Vec<String> = [
        statement("ann", "child", "ben"),
        statement("ben", "child", "cat"),
        statement("ben", "label", "ben-name"),
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    expected.sort();
    assert_eq!(triples, expected);
}

#[test]
fn test_construct_template_arity() {
    let err = ConstructQuery::new(vec![element("?x"), element("p")], ConstraintExpression::True)
        .expect_err("two elements");
    assert!(matches!(err, QueryError::ConstructArity(2)));
}
