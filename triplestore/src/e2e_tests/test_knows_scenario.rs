//! Three people who know each other in a ring.

use crate::e2e_tests::helpers::{TestStore, element, pattern, uri};
use crate::query::{ConstraintExpression, Query, SimpleConstraint, TransitiveConstraint};
use crate::types::Variable;

fn ring() -> TestStore {
    TestStore::with(&[("a", "knows", "b"), ("b", "knows", "c"), ("c", "knows", "a")])
}

#[test]
fn test_simple_pattern_returns_every_pair() {
    let store = ring();
    let query = Query::new(
        vec![Variable::new("x"), Variable::new("y")],
        pattern("?x", "knows", "?y"),
    );
    let mut rows = store.rows(&query);
    rows.sort_by_key(|row| format!("{row:?}"));
    assert_eq!(
        rows,
        vec![
            vec![Some(uri("a")), Some(uri("b"))],
            vec![Some(uri("b")), Some(uri("c"))],
            vec![Some(uri("c")), Some(uri("a"))],
        ]
    );
}

#[test]
fn test_closure_from_anchor_has_no_duplicates() {
    let store = ring();
    let transitive = TransitiveConstraint::new(SimpleConstraint::new(
        element("a"),
        element("knows"),
        element("?z"),
    ))
    .expect("transitive");
    let query = Query::new(vec![Variable::new("z")], ConstraintExpression::Transitive(transitive));

    let mut reached = store.column(&query, 0);
    assert_eq!(reached.len(), 3);
    reached.sort_by_key(ToString::to_string);
    assert_eq!(reached, vec![uri("a"), uri("b"), uri("c")]);
}

#[test]
fn test_join_follows_two_hops() {
    let store = ring();
    let query = Query::new(
        vec![Variable::new("x"), Variable::new("z")],
        ConstraintExpression::Conjunction(vec![
            pattern("?x", "knows", "?y"),
            pattern("?y", "knows", "?z"),
        ]),
    )
    .order_by(Variable::new("x"), true);
    let rows = store.rows(&query);
    assert_eq!(
        rows,
        vec![
            vec![Some(uri("a")), Some(uri("c"))],
            vec![Some(uri("b")), Some(uri("a"))],
            vec![Some(uri("c")), Some(uri("b"))],
        ]
    );
}
