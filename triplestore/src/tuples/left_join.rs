//! Left (optional) join.
//!
//! Every row of the main operand appears in the output: once per
//! compatible optional row that also passes the filter, or exactly once
//! with the optional-only columns unbound when there is no such row.
//!
//! The filter sees the combined row; it is not evaluated for the
//! unbound-extension row.

use std::collections::HashSet;

use crate::query::filter::{Filter, RowContext};
use crate::store::Snapshot;
use crate::tuples::{Tuples, TuplesError, check_prefix, row_matches_prefix, union_variables};
use crate::types::{NodeId, Variable};

/// Where an output column takes its value from.
#[derive(Debug, Clone, Copy)]
enum Source {
    Main(usize),
    Optional(usize),
    Both(usize, usize),
}

#[derive(Debug)]
pub struct LeftJoinTuples {
    main: Box<dyn Tuples>,
    optional: Box<dyn Tuples>,
    filter: Filter,
    snapshot: Snapshot,
    variables: Vec<Variable>,
    sources: Vec<Source>,
    /// (optional column, main column) pairs for shared variables.
    shared: Vec<(usize, usize)>,
    /// Main columns feeding the optional operand's leading columns.
    prefix_sources: Vec<usize>,
    prefix: Vec<NodeId>,
    in_main_row: bool,
    matched: bool,
    optional_bound: bool,
    started: bool,
    closed: bool,
}

impl LeftJoinTuples {
    /// Left-join `optional` onto `main` under `filter`.
    #[must_use]
    pub fn new(
        main: Box<dyn Tuples>,
        mut optional: Box<dyn Tuples>,
        filter: Filter,
        snapshot: Snapshot,
    ) -> Self {
        let always_bound: HashSet<Variable> = main
            .variables()
            .iter()
            .enumerate()
            .filter(|(column, _)| !main.is_column_ever_unbound(*column))
            .map(|(_, variable)| variable.clone())
            .collect();
        optional.define_prefix(&always_bound);

        let variables = union_variables(main.variables(), optional.variables());
        let sources = variables
            .iter()
            .map(|variable| {
                let optional_column = optional.column_index(variable);
                match (main.column_index(variable), optional_column) {
                    (Some(m), Some(o)) => Source::Both(m, o),
                    (Some(m), None) => Source::Main(m),
                    (None, o) => Source::Optional(o.unwrap_or_default()),
                }
            })
            .collect();
        let shared = optional
            .variables()
            .iter()
            .enumerate()
            .filter_map(|(o, variable)| main.column_index(variable).map(|m| (o, m)))
            .collect();
        let prefix_sources = optional
            .variables()
            .iter()
            .map_while(|variable| {
                always_bound
                    .contains(variable)
                    .then(|| main.column_index(variable))
                    .flatten()
            })
            .collect();

        Self {
            main,
            optional,
            filter,
            snapshot,
            variables,
            sources,
            shared,
            prefix_sources,
            prefix: Vec::new(),
            in_main_row: false,
            matched: false,
            optional_bound: false,
            started: false,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), TuplesError> {
        if self.closed {
            return Err(TuplesError::Closed);
        }
        Ok(())
    }

    fn compatible(&self) -> Result<bool, TuplesError> {
        for (optional_column, main_column) in &self.shared {
            let optional_value = self.optional.column_value(*optional_column)?;
            let main_value = self.main.column_value(*main_column)?;
            if let (Some(a), Some(b)) = (optional_value, main_value) {
                if a != b {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn reset_optional(&mut self) -> Result<(), TuplesError> {
        let mut values = Vec::with_capacity(self.prefix_sources.len());
        for column in &self.prefix_sources {
            match self.main.column_value(*column)? {
                Some(value) => values.push(value),
                None => break,
            }
        }
        self.optional.before_first(&values)
    }

    fn passes_filter(&self) -> Result<bool, TuplesError> {
        if matches!(self.filter, Filter::True) {
            return Ok(true);
        }
        let context = RowContext::new(self, &self.snapshot);
        self.filter
            .test(&context)
            .map_err(|e| TuplesError::Filter(Box::new(e)))
    }

    /// Advance to the next combined or null-extended row, ignoring the
    /// outer prefix.
    fn advance(&mut self) -> Result<bool, TuplesError> {
        loop {
            if !self.in_main_row {
                if !self.main.next()? {
                    return Ok(false);
                }
                self.in_main_row = true;
                self.matched = false;
                self.reset_optional()?;
            }

            self.optional_bound = true;
            while self.optional.next()? {
                if self.compatible()? && self.passes_filter()? {
                    self.matched = true;
                    return Ok(true);
                }
            }

            self.in_main_row = false;
            if !self.matched {
                self.optional_bound = false;
                return Ok(true);
            }
        }
    }
}

impl Tuples for LeftJoinTuples {
    fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn before_first(&mut self, prefix: &[NodeId]) -> Result<(), TuplesError> {
        self.ensure_open()?;
        check_prefix(prefix, self.variables.len())?;
        let main_width = self.main.column_count().min(prefix.len());
        self.main.before_first(&prefix[..main_width])?;
        self.prefix = prefix.to_vec();
        self.in_main_row = false;
        self.matched = false;
        self.optional_bound = false;
        self.started = true;
        Ok(())
    }

    fn next(&mut self) -> Result<bool, TuplesError> {
        self.ensure_open()?;
        if !self.started {
            self.before_first(&[])?;
        }
        while self.advance()? {
            if row_matches_prefix(&self.prefix, |column| self.column_value(column))? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn column_value(&self, column: usize) -> Result<Option<NodeId>, TuplesError> {
        self.ensure_open()?;
        let source = self.sources.get(column).ok_or(TuplesError::ColumnOutOfRange {
            column,
            columns: self.variables.len(),
        })?;
        match *source {
            Source::Main(m) => self.main.column_value(m),
            Source::Optional(o) => {
                if self.optional_bound {
                    self.optional.column_value(o)
                } else {
                    Ok(None)
                }
            }
            Source::Both(m, o) => match self.main.column_value(m)? {
                Some(value) => Ok(Some(value)),
                None if self.optional_bound => self.optional.column_value(o),
                None => Ok(None),
            },
        }
    }

    fn row_upper_bound(&self) -> u64 {
        let optional = self.optional.row_upper_bound().max(1);
        self.main.row_upper_bound().saturating_mul(optional)
    }

    fn is_column_ever_unbound(&self, column: usize) -> bool {
        match self.sources.get(column) {
            Some(Source::Main(m)) => self.main.is_column_ever_unbound(*m),
            Some(Source::Both(m, _)) => self.main.is_column_ever_unbound(*m),
            Some(Source::Optional(_)) | None => true,
        }
    }

    fn close(&mut self) -> Result<(), TuplesError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let main = self.main.close();
        let optional = self.optional.close();
        main.and(optional)
    }
}
