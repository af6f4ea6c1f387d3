//! The constraint tree a query is resolved from.
//!
//! Trees are built by a parser (not part of this crate) or by hand. Nodes
//! that take arguments with shape requirements (transitive constraints)
//! validate them in their constructors.

use std::collections::BTreeSet;

use crate::query::QueryError;
use crate::query::filter::Filter;
use crate::types::{Term, Variable};

/// One position of a statement pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintElement {
    Variable(Variable),
    Term(Term),
}

impl ConstraintElement {
    #[must_use]
    pub fn var(name: &str) -> Self {
        Self::Variable(Variable::new(name))
    }

    #[must_use]
    pub fn uri(uri: &str) -> Self {
        Self::Term(Term::uri(uri))
    }

    #[must_use]
    pub const fn as_variable(&self) -> Option<&Variable> {
        match self {
            Self::Variable(variable) => Some(variable),
            Self::Term(_) => None,
        }
    }

    #[must_use]
    pub const fn as_term(&self) -> Option<&Term> {
        match self {
            Self::Term(term) => Some(term),
            Self::Variable(_) => None,
        }
    }
}

/// A single statement pattern, optionally restricted to a graph.
///
/// Without a graph the pattern is matched against the query's default
/// graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleConstraint {
    pub subject: ConstraintElement,
    pub predicate: ConstraintElement,
    pub object: ConstraintElement,
    pub graph: Option<ConstraintElement>,
}

impl SimpleConstraint {
    #[must_use]
    pub const fn new(
        subject: ConstraintElement,
        predicate: ConstraintElement,
        object: ConstraintElement,
    ) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph: None,
        }
    }

    #[must_use]
    pub fn in_graph(mut self, graph: ConstraintElement) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Distinct variables in subject, predicate, object, graph order.
    #[must_use]
    pub fn variables(&self) -> Vec<Variable> {
        let mut variables: Vec<Variable> = Vec::new();
        let elements = [&self.subject, &self.predicate, &self.object];
        for element in elements.into_iter().chain(self.graph.as_ref()) {
            if let ConstraintElement::Variable(variable) = element {
                if !variables.contains(variable) {
                    variables.push(variable.clone());
                }
            }
        }
        variables
    }
}

/// Checks shared by both transitive forms.
fn validate_step(step: &SimpleConstraint) -> Result<(), QueryError> {
    if step.predicate.as_term().is_none() {
        return Err(QueryError::InvalidArgument(format!(
            "transitive predicate must be fixed, found variable {}",
            step.predicate.as_variable().map(ToString::to_string).unwrap_or_default()
        )));
    }
    if step.graph.as_ref().is_some_and(|g| g.as_variable().is_some()) {
        return Err(QueryError::InvalidArgument(
            "transitive constraints cannot range over a graph variable".to_string(),
        ));
    }
    Ok(())
}

/// The closure of a predicate from a fixed node: `(a p $z)*` reaches every
/// `$z` connected to `a` by a chain of one or more `p` statements, and
/// `($z p a)*` follows the chain backwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitiveConstraint {
    step: SimpleConstraint,
    anchor: Term,
    target: Variable,
    forward: bool,
}

impl TransitiveConstraint {
    /// Build from a step pattern with a fixed predicate and exactly one of
    /// subject and object fixed.
    pub fn new(step: SimpleConstraint) -> Result<Self, QueryError> {
        validate_step(&step)?;
        let (anchor, target, forward) = match (&step.subject, &step.object) {
            (ConstraintElement::Term(anchor), ConstraintElement::Variable(target)) => {
                (anchor.clone(), target.clone(), true)
            }
            (ConstraintElement::Variable(target), ConstraintElement::Term(anchor)) => {
                (anchor.clone(), target.clone(), false)
            }
            (ConstraintElement::Term(_), ConstraintElement::Term(_)) => {
                return Err(QueryError::InvalidArgument(
                    "transitive constraint has both ends fixed".to_string(),
                ));
            }
            (ConstraintElement::Variable(_), ConstraintElement::Variable(_)) => {
                return Err(QueryError::InvalidArgument(
                    "transitive constraint needs a fixed end; use a closure constraint instead"
                        .to_string(),
                ));
            }
        };
        Ok(Self {
            step,
            anchor,
            target,
            forward,
        })
    }

    #[must_use]
    pub const fn step(&self) -> &SimpleConstraint {
        &self.step
    }

    /// The fixed end.
    #[must_use]
    pub const fn anchor(&self) -> &Term {
        &self.anchor
    }

    /// The variable receiving reached nodes.
    #[must_use]
    pub const fn target(&self) -> &Variable {
        &self.target
    }

    /// Whether the anchor is the subject, so chains are followed from
    /// subject to object.
    #[must_use]
    pub const fn is_forward(&self) -> bool {
        self.forward
    }
}

/// The full transitive closure of a predicate: `($x p $y)*` binds every
/// pair connected by a chain of one or more `p` statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureConstraint {
    step: SimpleConstraint,
}

impl ClosureConstraint {
    /// Build from a step pattern with a fixed predicate and two different
    /// variables at subject and object.
    pub fn new(step: SimpleConstraint) -> Result<Self, QueryError> {
        validate_step(&step)?;
        match (&step.subject, &step.object) {
            (ConstraintElement::Variable(from), ConstraintElement::Variable(to)) if from != to => {
                Ok(Self { step })
            }
            _ => Err(QueryError::InvalidArgument(
                "closure constraint needs two different variables at subject and object"
                    .to_string(),
            )),
        }
    }

    #[must_use]
    pub const fn step(&self) -> &SimpleConstraint {
        &self.step
    }
}

/// A node of the constraint tree.
#[derive(Debug, Clone)]
pub enum ConstraintExpression {
    Simple(SimpleConstraint),
    Conjunction(Vec<ConstraintExpression>),
    Disjunction(Vec<ConstraintExpression>),
    Filter {
        inner: Box<ConstraintExpression>,
        filter: Filter,
    },
    OptionalJoin {
        main: Box<ConstraintExpression>,
        optional: Box<ConstraintExpression>,
        filter: Filter,
    },
    Difference {
        minuend: Box<ConstraintExpression>,
        subtrahend: Box<ConstraintExpression>,
    },
    Transitive(TransitiveConstraint),
    Closure(ClosureConstraint),
    /// Binds `variable` to `term` in a single row.
    Is { variable: Variable, term: Term },
    /// One row, no columns.
    True,
    /// No rows.
    False,
}

impl ConstraintExpression {
    #[must_use]
    pub fn filter(inner: Self, filter: Filter) -> Self {
        Self::Filter {
            inner: Box::new(inner),
            filter,
        }
    }

    #[must_use]
    pub fn optional(main: Self, optional: Self, filter: Filter) -> Self {
        Self::OptionalJoin {
            main: Box::new(main),
            optional: Box::new(optional),
            filter,
        }
    }

    #[must_use]
    pub fn difference(minuend: Self, subtrahend: Self) -> Self {
        Self::Difference {
            minuend: Box::new(minuend),
            subtrahend: Box::new(subtrahend),
        }
    }

    /// Every variable the resolved tuples can bind.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<Variable> {
        match self {
            Self::Simple(simple) => simple.variables().into_iter().collect(),
            Self::Conjunction(children) | Self::Disjunction(children) => {
                children.iter().flat_map(Self::variables).collect()
            }
            Self::Filter { inner, .. } => inner.variables(),
            Self::OptionalJoin { main, optional, .. } => {
                let mut variables = main.variables();
                variables.extend(optional.variables());
                variables
            }
            Self::Difference { minuend, .. } => minuend.variables(),
            Self::Transitive(transitive) => [transitive.target().clone()].into_iter().collect(),
            Self::Closure(closure) => closure.step().variables().into_iter().collect(),
            Self::Is { variable, .. } => [variable.clone()].into_iter().collect(),
            Self::True | Self::False => BTreeSet::new(),
        }
    }
}
