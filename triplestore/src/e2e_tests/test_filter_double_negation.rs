//! `Not(Not(F))` agrees with `F` on every context, errors included.

use crate::e2e_tests::helpers::uri;
use crate::query::{BindingContext, Filter, ValueExpr};
use crate::types::{Literal, Term, Variable};

fn int(value: i64) -> ValueExpr {
    ValueExpr::Term(Term::Literal(Literal::integer(value)))
}

fn filters() -> Vec<Filter> {
    vec![
        Filter::True,
        Filter::False,
        Filter::Equals(ValueExpr::var("x"), ValueExpr::Term(uri("a"))),
        Filter::NotEquals(ValueExpr::var("x"), ValueExpr::Term(uri("a"))),
        Filter::LessThan(ValueExpr::var("n"), int(10)),
        Filter::GreaterThanOrEqual(ValueExpr::var("x"), int(0)),
        Filter::Bound(Variable::new("n")),
        Filter::IsIri(ValueExpr::var("x")),
        Filter::IsLiteral(ValueExpr::var("name")),
        Filter::regex(
            ValueExpr::var("name"),
            ValueExpr::Term(Term::plain("^al")),
            Some(ValueExpr::Term(Term::plain("i"))),
        ),
        Filter::regex(ValueExpr::var("x"), ValueExpr::Term(Term::plain("a")), None),
        Filter::Or(vec![
            Filter::Bound(Variable::new("missing")),
            Filter::Equals(ValueExpr::var("n"), int(3)),
        ]),
        Filter::And(vec![
            Filter::Bound(Variable::new("n")),
            Filter::LessThan(ValueExpr::var("n"), int(5)),
        ]),
    ]
}

fn contexts() -> Vec<BindingContext> {
    vec![
        BindingContext::new(),
        BindingContext::new()
            .with("x", uri("a"))
            .with("n", Term::Literal(Literal::integer(3)))
            .with("name", Term::plain("Alice")),
        BindingContext::new()
            .with("x", uri("b"))
            .with("n", Term::Literal(Literal::integer(12)))
            .with("name", Term::plain("bob")),
        BindingContext::new().with("x", Term::plain("a literal")),
    ]
}

#[test]
fn test_double_negation_is_identity() {
    for filter in filters() {
        let doubled = Filter::not(Filter::not(filter.clone()));
        for context in contexts() {
            let direct = filter.test(&context);
            let negated = doubled.test(&context);
            assert_eq!(
                direct.as_ref().ok(),
                negated.as_ref().ok(),
                "{filter:?} on {context:?}"
            );
            assert_eq!(direct.is_err(), negated.is_err(), "{filter:?} on {context:?}");
        }
    }
}
