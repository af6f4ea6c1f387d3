//! Conjunction order does not change the bag of solutions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::e2e_tests::helpers::{TestStore, pattern, statement};
use crate::query::{ConstraintExpression, Query};
use crate::types::Triple;

const NODES: [&str; 6] = ["n0", "n1", "n2", "n3", "n4", "n5"];
const PREDICATES: [&str; 3] = ["p", "q", "r"];

/// A random graph; the seed keeps it the same on every run.
fn random_store(seed: u64, statements: usize) -> TestStore {
    let mut rng = StdRng::seed_from_u64(seed);
    let triples: Vec<Triple> = (0..statements)
        .map(|_| {
            statement(
                NODES[rng.random_range(0..NODES.len())],
                PREDICATES[rng.random_range(0..PREDICATES.len())],
                NODES[rng.random_range(0..NODES.len())],
            )
        })
        .collect();
    TestStore::with_triples(&triples)
}

fn both_orders(store: &TestStore, left: &ConstraintExpression, right: &ConstraintExpression) {
    let forward =
        Query::select_all(ConstraintExpression::Conjunction(vec![left.clone(), right.clone()]));
    let backward =
        Query::select_all(ConstraintExpression::Conjunction(vec![right.clone(), left.clone()]));
    assert_eq!(store.bag(&forward), store.bag(&backward));
}

#[test]
fn test_shared_variable_join_commutes() {
    for seed in 0..5 {
        let store = random_store(seed, 40);
        both_orders(&store, &pattern("?x", "p", "?y"), &pattern("?y", "q", "?z"));
        both_orders(&store, &pattern("?x", "p", "?y"), &pattern("?x", "r", "?y"));
    }
}

#[test]
fn test_cross_product_commutes() {
    let store = random_store(42, 20);
    both_orders(&store, &pattern("?a", "p", "n1"), &pattern("n2", "q", "?b"));
}

#[test]
fn test_join_with_constants_commutes() {
    let store = random_store(7, 60);
    both_orders(&store, &pattern("n0", "?p", "?y"), &pattern("?y", "?p", "?z"));
}

#[test]
fn test_three_way_join_is_order_independent() {
    let store = random_store(99, 50);
    let a = pattern("?x", "p", "?y");
    let b = pattern("?y", "q", "?z");
    let c = pattern("?z", "r", "?x");
    let expected = store.bag(&Query::select_all(ConstraintExpression::Conjunction(vec![
        a.clone(),
        b.clone(),
        c.clone(),
    ])));
    for order in [
        vec![c.clone(), b.clone(), a.clone()],
        vec![b.clone(), a.clone(), c.clone()],
        vec![a, ConstraintExpression::Conjunction(vec![c, b])],
    ] {
        let bag = store.bag(&Query::select_all(ConstraintExpression::Conjunction(order)));
        assert_eq!(bag, expected);
    }
}
