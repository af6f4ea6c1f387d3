//! Pool of scan buffers for leaf tuples.
//!
//! Each open leaf scan holds one buffer (busy). Closing or dropping the
//! scan returns the buffer (free) or discards it when the pool already
//! keeps `capacity` idle buffers.
//!
//! # Design
//!
//! - Buffers are allocated lazily on first lease
//! - Uses a free list (Vec) for O(1) lease/return
//! - Returns buffers automatically via RAII (Drop on `ScanBuffer`)
//! - Thread-safe: uses Mutex for the free list and an atomic busy counter
//!
//! # Invariants
//!
//! - `free_list.len() <= capacity`
//! - `busy()` equals the number of live `ScanBuffer`s leased from this pool

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::store::index::Quad;

/// A pool of reusable scan buffers.
///
/// # Pre-conditions
/// - `capacity` and `batch_size` must be > 0
///
/// # Invariants
/// - Every idle buffer is empty and has room for `batch_size` keys
#[derive(Debug)]
pub struct CursorPool {
    free_list: Mutex<Vec<Vec<Quad>>>,
    busy: AtomicUsize,
    capacity: usize,
    batch_size: usize,
}

impl CursorPool {
    /// Create a new pool.
    ///
    /// # Panics
    /// Panics if `capacity` or `batch_size` is 0.
    #[must_use]
    pub fn new(capacity: usize, batch_size: usize) -> Arc<Self> {
        assert!(capacity > 0, "Cursor pool capacity must be positive");
        assert!(batch_size > 0, "Scan batch size must be positive");
        Arc::new(Self {
            free_list: Mutex::new(Vec::with_capacity(capacity)),
            busy: AtomicUsize::new(0),
            capacity,
            batch_size,
        })
    }

    /// Lease a buffer, reusing an idle one if available.
    ///
    /// # Post-conditions
    /// - `busy()` increased by 1
    /// - The buffer is empty
    #[allow(clippy::expect_used)] // Mutex poisoning indicates unrecoverable state
    #[allow(clippy::disallowed_methods)] // Arc::clone is required for shared ownership
    pub fn lease(self: &Arc<Self>) -> ScanBuffer {
        let reused = self.free_list.lock().expect("lock poisoned").pop();
        let rows = reused.unwrap_or_else(|| Vec::with_capacity(self.batch_size));
        self.busy.fetch_add(1, Ordering::AcqRel);
        ScanBuffer {
            rows: Some(rows),
            pool: Arc::clone(self),
        }
    }

    /// Take a buffer back.
    ///
    /// # Post-conditions
    /// - `busy()` decreased by 1
    /// - The buffer is kept if there is room, otherwise dropped
    #[allow(clippy::expect_used)] // Mutex poisoning indicates unrecoverable state
    fn return_buffer(&self, mut rows: Vec<Quad>) {
        self.busy.fetch_sub(1, Ordering::AcqRel);
        rows.clear();
        let mut free_list = self.free_list.lock().expect("lock poisoned");
        if free_list.len() < self.capacity {
            free_list.push(rows);
        }
    }

    /// Number of buffers currently leased out.
    #[must_use]
    pub fn busy(&self) -> usize {
        self.busy.load(Ordering::Acquire)
    }

    /// Number of idle buffers ready for reuse.
    #[must_use]
    #[allow(clippy::expect_used)] // Mutex poisoning indicates unrecoverable state
    pub fn available(&self) -> usize {
        self.free_list.lock().expect("lock poisoned").len()
    }

    /// Keys fetched per scan batch.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Maximum number of idle buffers kept.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

/// A leased scan buffer. Returned to its pool on drop.
#[derive(Debug)]
pub struct ScanBuffer {
    rows: Option<Vec<Quad>>,
    pool: Arc<CursorPool>,
}

impl Deref for ScanBuffer {
    type Target = Vec<Quad>;

    fn deref(&self) -> &Self::Target {
        self.rows.as_ref().unwrap_or(&EMPTY)
    }
}

impl DerefMut for ScanBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.rows.get_or_insert_with(Vec::new)
    }
}

static EMPTY: Vec<Quad> = Vec::new();

impl Drop for ScanBuffer {
    fn drop(&mut self) {
        if let Some(rows) = self.rows.take() {
            self.pool.return_buffer(rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;

    #[test]
    fn test_lease_and_return() {
        let pool = CursorPool::new(2, 4);
        assert_eq!(pool.busy(), 0);
        assert_eq!(pool.available(), 0);

        let first = pool.lease();
        let second = pool.lease();
        assert_eq!(pool.busy(), 2);

        drop(first);
        assert_eq!(pool.busy(), 1);
        assert_eq!(pool.available(), 1);

        drop(second);
        assert_eq!(pool.busy(), 0);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_excess_buffers_are_discarded() {
        let pool = CursorPool::new(1, 4);
        let a = pool.lease();
        let b = pool.lease();
        let c = pool.lease();
        drop(a);
        drop(b);
        drop(c);
        assert_eq!(pool.busy(), 0);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_returned_buffer_is_cleared() {
        let pool = CursorPool::new(1, 4);
        let mut buffer = pool.lease();
        buffer.push([NodeId(1); 4]);
        drop(buffer);

        let reused = pool.lease();
        assert!(reused.is_empty());
        assert!(reused.capacity() >= 4);
    }
}
