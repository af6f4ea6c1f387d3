//! Closing twice is harmless for every shape of resolved tuples, and
//! closing releases every leased scan buffer.

use crate::e2e_tests::helpers::{TestStore, element, pattern, uri};
use crate::query::{
    ClosureConstraint, ConstraintExpression, ConstraintResolver, Filter, Query, QueryError,
    SimpleConstraint, TransitiveConstraint, ValueExpr,
};
use crate::store::DEFAULT_GRAPH;
use crate::types::{Term, Variable};

fn store() -> TestStore {
    TestStore::with(&[
        ("a", "p", "b"),
        ("b", "p", "c"),
        ("a", "q", "x"),
        ("c", "q", "y"),
    ])
}

fn shapes() -> Vec<ConstraintExpression> {
    let step = |s: &str, o: &str| SimpleConstraint::new(element(s), element("p"), element(o));
    vec![
        pattern("?s", "p", "?o"),
        pattern("nothing", "p", "?o"),
        ConstraintExpression::Conjunction(vec![pattern("?s", "p", "?o"), pattern("?o", "p", "?z")]),
        ConstraintExpression::Disjunction(vec![pattern("?s", "p", "?o"), pattern("?s", "q", "?o")]),
        ConstraintExpression::filter(
            pattern("?s", "p", "?o"),
            Filter::Equals(ValueExpr::var("s"), ValueExpr::Term(uri("a"))),
        ),
        ConstraintExpression::optional(
            pattern("?s", "p", "?o"),
            pattern("?o", "q", "?v"),
            Filter::True,
        ),
        ConstraintExpression::difference(pattern("?s", "p", "?o"), pattern("?s", "q", "?v")),
        ConstraintExpression::Transitive(
            TransitiveConstraint::new(step("a", "?z")).expect("transitive"),
        ),
        ConstraintExpression::Closure(ClosureConstraint::new(step("?x", "?y")).expect("closure")),
        ConstraintExpression::Is {
            variable: Variable::new("s"),
            term: uri("a"),
        },
        ConstraintExpression::True,
        ConstraintExpression::False,
    ]
}

#[test]
fn test_double_close_on_every_shape() {
    let store = store();
    let snapshot = store.database.snapshot().expect("snapshot");
    let graph = Term::uri(DEFAULT_GRAPH);
    for distinct in [false, true] {
        let resolver = ConstraintResolver::new(&snapshot, &graph, distinct);
        for shape in shapes() {
            let mut tuples = resolver.resolve(&shape).expect("resolve");
            tuples.before_first(&[]).expect("before_first");
            let _ = tuples.next().expect("next");
            tuples.close().expect("close");
            tuples.close().expect("close again");
            assert_eq!(snapshot.cursor_pool().busy(), 0, "{shape:?}");
        }
    }
}

#[test]
fn test_answer_rejects_use_after_close() {
    let store = store();
    let mut answer = store.answer(&Query::select_all(pattern("?s", "p", "?o")));
    assert!(answer.next().expect("next"));
    answer.close().expect("close");
    answer.close().expect("close again");
    assert!(answer.is_closed());
    assert!(matches!(answer.next(), Err(QueryError::Closed(_))));
    assert_eq!(store.database.cursor_pool().busy(), 0);
}

#[test]
fn test_dropped_answer_releases_buffers() {
    let store = store();
    {
        let mut answer = store.answer(&Query::select_all(pattern("?s", "?p", "?o")));
        assert!(answer.next().expect("next"));
    }
    assert_eq!(store.database.cursor_pool().busy(), 0);
}
