//! Query objects: what to resolve and how to shape the answer.

use crate::query::QueryError;
use crate::query::constraint::{ConstraintElement, ConstraintExpression};
use crate::store::DEFAULT_GRAPH;
use crate::types::{Term, Variable};

/// One `ORDER BY` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub variable: Variable,
    pub ascending: bool,
}

/// A select query.
///
/// Built with a projection and a constraint tree, then refined with the
/// builder methods:
///
/// ```
/// use triplestore::query::{ConstraintExpression, Query};
/// use triplestore::Variable;
///
/// let query = Query::new(vec![Variable::new("x")], ConstraintExpression::True)
///     .order_by(Variable::new("x"), true)
///     .limit(10)
///     .offset(5)
///     .distinct();
/// assert_eq!(query.limit, Some(10));
/// ```
#[derive(Debug, Clone)]
pub struct Query {
    /// Projection, in answer column order.
    pub variables: Vec<Variable>,
    pub constraint: ConstraintExpression,
    /// Graph used by patterns that do not name one.
    pub default_graph: Term,
    pub order_by: Vec<Order>,
    pub limit: Option<u64>,
    pub offset: u64,
    pub distinct: bool,
}

impl Query {
    #[must_use]
    pub fn new(variables: Vec<Variable>, constraint: ConstraintExpression) -> Self {
        Self {
            variables,
            constraint,
            default_graph: Term::uri(DEFAULT_GRAPH),
            order_by: Vec::new(),
            limit: None,
            offset: 0,
            distinct: false,
        }
    }

    /// Project every variable the constraint binds, in name order.
    #[must_use]
    pub fn select_all(constraint: ConstraintExpression) -> Self {
        let variables = constraint.variables().into_iter().collect();
        Self::new(variables, constraint)
    }

    #[must_use]
    pub fn in_graph(mut self, graph: Term) -> Self {
        self.default_graph = graph;
        self
    }

    #[must_use]
    pub fn order_by(mut self, variable: Variable, ascending: bool) -> Self {
        self.order_by.push(Order {
            variable,
            ascending,
        });
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

/// A yes/no query: true iff the constraint has at least one solution.
#[derive(Debug, Clone)]
pub struct AskQuery {
    pub query: Query,
}

impl AskQuery {
    #[must_use]
    pub fn new(constraint: ConstraintExpression) -> Self {
        Self {
            query: Query::new(Vec::new(), constraint).limit(1),
        }
    }

    #[must_use]
    pub fn in_graph(mut self, graph: Term) -> Self {
        self.query.default_graph = graph;
        self
    }
}

/// A query producing triples from a template instantiated per solution.
#[derive(Debug, Clone)]
pub struct ConstructQuery {
    template: Vec<ConstraintElement>,
    pub query: Query,
}

impl ConstructQuery {
    /// `template` is a flat list of subject, predicate, object elements.
    ///
    /// # Errors
    /// [`QueryError::ConstructArity`] if its length is not a multiple of
    /// three.
    pub fn new(
        template: Vec<ConstraintElement>,
        constraint: ConstraintExpression,
    ) -> Result<Self, QueryError> {
        if template.len() % 3 != 0 {
            return Err(QueryError::ConstructArity(template.len()));
        }
        let mut variables: Vec<Variable> = Vec::new();
        for element in &template {
            if let ConstraintElement::Variable(variable) = element {
                if !variables.contains(variable) {
                    variables.push(variable.clone());
                }
            }
        }
        Ok(Self {
            template,
            query: Query::new(variables, constraint),
        })
    }

    #[must_use]
    pub fn template(&self) -> &[ConstraintElement] {
        &self.template
    }
}
