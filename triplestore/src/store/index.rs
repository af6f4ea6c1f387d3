//! Quad index: six sorted permutations of (subject, predicate, object, graph).
//!
//! Every quad is stored once per permutation so that any combination of
//! bound positions is a contiguous key range in at least one of them.
//!
//! # Invariants
//!
//! - All six trees hold exactly the same set of quads (in permuted form).
//! - Keys never contain `NodeId::MIN` or `NodeId::MAX`.

use std::collections::BTreeSet;
use std::ops::Bound;

use crate::types::NodeId;

/// A quad in canonical (subject, predicate, object, graph) order.
pub type Quad = [NodeId; 4];

/// Positions within a canonical quad.
pub const SUBJECT: usize = 0;
pub const PREDICATE: usize = 1;
pub const OBJECT: usize = 2;
pub const GRAPH: usize = 3;

/// One ordering of the four quad positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permutation {
    Spog,
    Posg,
    Ospg,
    Gspo,
    Gpos,
    Gosp,
}

impl Permutation {
    pub const ALL: [Self; 6] = [
        Self::Spog,
        Self::Posg,
        Self::Ospg,
        Self::Gspo,
        Self::Gpos,
        Self::Gosp,
    ];

    /// The canonical positions in key order.
    #[must_use]
    pub const fn order(self) -> [usize; 4] {
        match self {
            Self::Spog => [SUBJECT, PREDICATE, OBJECT, GRAPH],
            Self::Posg => [PREDICATE, OBJECT, SUBJECT, GRAPH],
            Self::Ospg => [OBJECT, SUBJECT, PREDICATE, GRAPH],
            Self::Gspo => [GRAPH, SUBJECT, PREDICATE, OBJECT],
            Self::Gpos => [GRAPH, PREDICATE, OBJECT, SUBJECT],
            Self::Gosp => [GRAPH, OBJECT, SUBJECT, PREDICATE],
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Spog => 0,
            Self::Posg => 1,
            Self::Ospg => 2,
            Self::Gspo => 3,
            Self::Gpos => 4,
            Self::Gosp => 5,
        }
    }

    /// Rearrange a canonical quad into this permutation's key order.
    #[must_use]
    pub fn permute(self, quad: &Quad) -> Quad {
        self.order().map(|position| quad[position])
    }

    /// Turn a key of this permutation back into a canonical quad.
    #[must_use]
    pub fn unpermute(self, key: &Quad) -> Quad {
        let mut quad = [NodeId::MIN; 4];
        for (key_position, canonical) in self.order().into_iter().enumerate() {
            quad[canonical] = key[key_position];
        }
        quad
    }

    /// How many leading key positions are covered by `bound`.
    #[must_use]
    pub fn prefix_len(self, bound: &[bool; 4]) -> usize {
        self.order()
            .iter()
            .take_while(|position| bound[**position])
            .count()
    }

    /// Pick the permutation whose key prefix covers the most bound positions.
    #[must_use]
    pub fn select(bound: &[bool; 4]) -> Self {
        let mut best = Self::Spog;
        let mut best_len = best.prefix_len(bound);
        for candidate in Self::ALL {
            let len = candidate.prefix_len(bound);
            if len > best_len {
                best = candidate;
                best_len = len;
            }
        }
        best
    }
}

/// The six permuted trees.
#[derive(Debug, Clone, Default)]
pub struct QuadIndex {
    trees: [BTreeSet<Quad>; 6],
}

impl QuadIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored quads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trees[0].len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees[0].is_empty()
    }

    /// Insert a quad. Returns `false` if it was already present.
    pub fn insert(&mut self, quad: &Quad) -> bool {
        if self.contains(quad) {
            return false;
        }
        for permutation in Permutation::ALL {
            self.trees[permutation.slot()].insert(permutation.permute(quad));
        }
        true
    }

    /// Remove a quad. Returns `false` if it was not present.
    pub fn remove(&mut self, quad: &Quad) -> bool {
        if !self.contains(quad) {
            return false;
        }
        for permutation in Permutation::ALL {
            self.trees[permutation.slot()].remove(&permutation.permute(quad));
        }
        true
    }

    #[must_use]
    pub fn contains(&self, quad: &Quad) -> bool {
        self.trees[Permutation::Spog.slot()].contains(quad)
    }

    /// Count the keys of `permutation` starting with `prefix`.
    #[must_use]
    pub fn range_len(&self, permutation: Permutation, prefix: &[NodeId]) -> usize {
        let (lower, upper) = range_bounds(prefix);
        self.trees[permutation.slot()]
            .range((Bound::Included(lower), Bound::Included(upper)))
            .count()
    }

    /// Append up to `limit` keys of `permutation` starting with `prefix` to
    /// `out`, resuming strictly after `after` when given.
    ///
    /// Keys are appended in permuted form; use [`Permutation::unpermute`].
    pub fn scan_batch(
        &self,
        permutation: Permutation,
        prefix: &[NodeId],
        after: Option<&Quad>,
        limit: usize,
        out: &mut Vec<Quad>,
    ) {
        let (lower, upper) = range_bounds(prefix);
        let start = match after {
            Some(last) if *last >= upper => return,
            Some(last) if *last >= lower => Bound::Excluded(*last),
            _ => Bound::Included(lower),
        };
        out.extend(
            self.trees[permutation.slot()]
                .range((start, Bound::Included(upper)))
                .take(limit)
                .copied(),
        );
    }

    /// All quads in canonical order whose graph is `graph`.
    #[must_use]
    pub fn quads_in_graph(&self, graph: NodeId) -> Vec<Quad> {
        let (lower, upper) = range_bounds(&[graph]);
        self.trees[Permutation::Gspo.slot()]
            .range((Bound::Included(lower), Bound::Included(upper)))
            .map(|key| Permutation::Gspo.unpermute(key))
            .collect()
    }
}

/// Inclusive key bounds for every key starting with `prefix`.
fn range_bounds(prefix: &[NodeId]) -> (Quad, Quad) {
    let mut lower = [NodeId::MIN; 4];
    let mut upper = [NodeId::MAX; 4];
    for (position, id) in prefix.iter().take(4).enumerate() {
        lower[position] = *id;
        upper[position] = *id;
    }
    (lower, upper)
}
