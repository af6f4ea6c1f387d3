//! Node identifiers.
//!
//! A `NodeId` is the localized form of a term: a dense 64-bit integer
//! handed out by the string pool.
//!
//! # Invariants
//!
//! - Allocated ids start at 1 and grow by one per new term.
//! - `NodeId::MIN` (0) and `NodeId::MAX` are never allocated; the index
//!   uses them as range sentinels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The localized identifier of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Lower range sentinel. Never allocated.
    pub const MIN: Self = Self(0);
    /// Upper range sentinel. Never allocated.
    pub const MAX: Self = Self(u64::MAX);

    /// The id for the term stored at `index` in the pool's term table.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u64 + 1)
    }

    /// The position of this id in the pool's term table.
    ///
    /// Returns `None` for the sentinels and for ids too large for this
    /// platform's address space.
    #[must_use]
    pub fn to_index(self) -> Option<usize> {
        if self == Self::MIN {
            return None;
        }
        usize::try_from(self.0 - 1).ok()
    }

    /// Get the raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
