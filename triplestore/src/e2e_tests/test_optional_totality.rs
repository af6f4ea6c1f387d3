//! Every main row survives an optional join.

use crate::e2e_tests::helpers::{TestStore, pattern, uri};
use crate::query::{ConstraintExpression, Filter, Query, ValueExpr};
use crate::types::{Literal, Term, Triple, Variable};

fn people() -> TestStore {
    TestStore::with(&[
        ("alice", "type", "Person"),
        ("bob", "type", "Person"),
        ("carol", "type", "Person"),
        ("alice", "mbox", "alice-mail"),
        ("bob", "mbox", "bob-work"),
        ("bob", "mbox", "bob-home"),
    ])
}

fn mailboxes(filter: Filter) -> Query {
    Query::new(
        vec![Variable::new("who"), Variable::new("mbox")],
        ConstraintExpression::optional(
            pattern("?who", "type", "Person"),
            pattern("?who", "mbox", "?mbox"),
            filter,
        ),
    )
}

fn count_for(rows: &[Vec<Option<Term>>], who: &str) -> usize {
    rows.iter().filter(|row| row[0] == Some(uri(who))).count()
}

#[test]
fn test_unmatched_main_row_appears_once_unbound() {
    let rows = people().rows(&mailboxes(Filter::True));
    assert_eq!(rows.len(), 4);
    assert_eq!(count_for(&rows, "alice"), 1);
    assert_eq!(count_for(&rows, "bob"), 2);
    let carol: Vec<&Vec<Option<Term>>> =
        rows.iter().filter(|row| row[0] == Some(uri("carol"))).collect();
    assert_eq!(carol, vec![&vec![Some(uri("carol")), None]]);
}

#[test]
fn test_filter_rejecting_every_optional_row_keeps_main_row() {
    let filter = Filter::Equals(ValueExpr::var("mbox"), ValueExpr::Term(uri("bob-home")));
    let rows = people().rows(&mailboxes(filter));
    assert_eq!(rows.len(), 3);
    let alice: Vec<&Vec<Option<Term>>> =
        rows.iter().filter(|row| row[0] == Some(uri("alice"))).collect();
    assert_eq!(alice, vec![&vec![Some(uri("alice")), None]]);
    assert!(rows.contains(&vec![Some(uri("bob")), Some(uri("bob-home"))]));
}

#[test]
fn test_optional_literal_values() {
    let store = people();
    store.insert(&[Triple::new(
        uri("carol"),
        uri("age"),
        Term::Literal(Literal::integer(41)),
    )]);
    let query = Query::new(
        vec![Variable::new("who"), Variable::new("age")],
        ConstraintExpression::optional(
            pattern("?who", "type", "Person"),
            pattern("?who", "age", "?age"),
            Filter::True,
        ),
    )
    .order_by(Variable::new("who"), true);
    let rows = store.rows(&query);
    assert_eq!(
        rows,
        vec![
            vec![Some(uri("alice")), None],
            vec![Some(uri("bob")), None],
            vec![Some(uri("carol")), Some(Term::Literal(Literal::integer(41)))],
        ]
    );
}
