//! Flattening nested wrappers does not change what a constraint resolves to.

use crate::e2e_tests::helpers::{TestStore, pattern, uri};
use crate::query::transform::flatten;
use crate::query::{ConstraintExpression, ConstraintResolver, Filter, ValueExpr};
use crate::store::DEFAULT_GRAPH;
use crate::testing::globalized_rows;
use crate::types::{Literal, Term, Triple, Variable};

fn int(value: i64) -> ValueExpr {
    ValueExpr::Term(Term::Literal(Literal::integer(value)))
}

fn store() -> TestStore {
    let store = TestStore::with(&[
        ("ann", "type", "Person"),
        ("ben", "type", "Person"),
        ("cat", "type", "Person"),
        ("dan", "type", "Person"),
        ("ann", "pet", "rex"),
        ("ben", "pet", "tom"),
        ("rex", "species", "dog"),
        ("tom", "species", "cat"),
    ]);
    let ages = [("ann", 17), ("ben", 34), ("cat", 58), ("dan", 71)];
    let triples: Vec<Triple> = ages
        .iter()
        .map(|(who, age)| {
            Triple::new(
                uri(who),
                uri("age"),
                Term::Literal(Literal::integer(*age)),
            )
        })
        .collect();
    store.insert(&triples);
    store
}

/// Resolve `expression` as written, without flattening, as a sorted bag.
fn resolve_as_written(store: &TestStore, expression: &ConstraintExpression) -> Vec<String> {
    let snapshot = store.database.snapshot().expect("snapshot");
    let graph = Term::uri(DEFAULT_GRAPH);
    let tuples = ConstraintResolver::new(&snapshot, &graph, false)
        .resolve(expression)
        .expect("resolve");
    let variables: Vec<Variable> = tuples.variables().to_vec();
    let mut bag: Vec<String> = globalized_rows(tuples, &snapshot)
        .into_iter()
        .map(|row| {
            let mut bindings: Vec<String> = variables
                .iter()
                .zip(row)
                .map(|(variable, value)| match value {
                    Some(term) => format!("{variable}={term}"),
                    None => format!("{variable}=_"),
                })
                .collect();
            bindings.sort();
            bindings.join(" ")
        })
        .collect();
    bag.sort();
    bag
}

fn assert_transparent(store: &TestStore, expression: &ConstraintExpression) -> Vec<String> {
    let written = resolve_as_written(store, expression);
    let flattened = resolve_as_written(store, &flatten(expression.clone()));
    assert_eq!(written, flattened);
    written
}

#[test]
fn test_nested_filters_merge() {
    let store = store();
    let nested = ConstraintExpression::filter(
        ConstraintExpression::filter(
            pattern("?who", "age", "?age"),
            Filter::LessThan(ValueExpr::var("age"), int(60)),
        ),
        Filter::GreaterThan(ValueExpr::var("age"), int(20)),
    );
    let ConstraintExpression::Filter { inner, .. } = flatten(nested.clone()) else {
        panic!("flattened form is a filter");
    };
    assert!(matches!(*inner, ConstraintExpression::Simple(_)));

    let rows = assert_transparent(&store, &nested);
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_filter_inside_optional_moves_to_join() {
    let store = store();
    let expression = ConstraintExpression::optional(
        pattern("?who", "type", "Person"),
        ConstraintExpression::filter(
            pattern("?who", "age", "?age"),
            Filter::GreaterThan(ValueExpr::var("age"), int(40)),
        ),
        Filter::True,
    );
    let ConstraintExpression::OptionalJoin { optional, filter, .. } = flatten(expression.clone())
    else {
        panic!("flattened form is an optional join");
    };
    assert!(matches!(*optional, ConstraintExpression::Simple(_)));
    assert!(!matches!(filter, Filter::True));

    let rows = assert_transparent(&store, &expression);
    assert_eq!(rows.len(), 4);
}

#[test]
fn test_nested_optional_with_non_rejecting_filter() {
    let store = store();
    let expression = ConstraintExpression::optional(
        pattern("?who", "type", "Person"),
        ConstraintExpression::optional(
            pattern("?who", "pet", "?pet"),
            pattern("?pet", "species", "?species"),
            Filter::Bound(Variable::new("pet")),
        ),
        Filter::True,
    );
    let rows = assert_transparent(&store, &expression);
    assert_eq!(rows.len(), 4);
}

#[test]
fn test_nested_optional_with_rejecting_filter_keeps_inner_rows() {
    let store = store();
    let expression = ConstraintExpression::optional(
        pattern("?who", "type", "Person"),
        ConstraintExpression::optional(
            pattern("?who", "pet", "?pet"),
            pattern("?pet", "species", "?species"),
            Filter::NotEquals(ValueExpr::var("species"), ValueExpr::Term(uri("dog"))),
        ),
        Filter::True,
    );
    let rows = assert_transparent(&store, &expression);

    let row = |who: &str, pet: Option<&str>, species: Option<&str>| {
        let value =
            |local: Option<&str>| local.map_or_else(|| "_".to_string(), |l| uri(l).to_string());
        format!("$pet={} $species={} $who={}", value(pet), value(species), uri(who))
    };
    let mut expected = vec![
        row("ann", Some("rex"), None),
        row("ben", Some("tom"), Some("cat")),
        row("cat", None, None),
        row("dan", None, None),
    ];
    expected.sort();
    assert_eq!(rows, expected);
}

#[test]
fn test_filter_over_join_is_unchanged() {
    let store = store();
    let expression = ConstraintExpression::filter(
        ConstraintExpression::Conjunction(vec![
            pattern("?who", "type", "Person"),
            pattern("?who", "age", "?age"),
        ]),
        Filter::Not(Box::new(Filter::LessThan(ValueExpr::var("age"), int(50)))),
    );
    let rows = assert_transparent(&store, &expression);
    assert_eq!(rows.len(), 2);
}
