//! Shared bookkeeping embedded (by composition, not inheritance) into
//! every concrete RDD variant.

use crate::iter_seq::IteratorSeq;
use crate::partition::RddId;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// Process-wide monotonic RDD id counter.
static NEXT_RDD_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_rdd_id() -> RddId {
    NEXT_RDD_ID.fetch_add(1, Ordering::SeqCst)
}

/// Bookkeeping common to every RDD: its id, the sticky flag, and the list
/// of `IteratorSeq`s it has materialized (owned and released with it unless
/// sticky).
///
/// "Released with it" falls naturally out of Rust's ownership model: a
/// non-sticky RDD is dropped (and its `RddCore` with it) when the last
/// `Arc` to it goes out of scope at the end of the action that created it.
/// A sticky RDD is additionally held by the driver context's sticky
/// registry, so it outlives any single action, without needing reference
/// cycles back to that registry.
pub struct RddCore<T> {
    pub id: RddId,
    sticky: AtomicBool,
    materialized: Mutex<Vec<IteratorSeq<T>>>,
}

impl<T> RddCore<T> {
    pub fn new() -> Self {
        Self {
            id: next_rdd_id(),
            sticky: AtomicBool::new(false),
            materialized: Mutex::new(Vec::new()),
        }
    }

    pub fn is_sticky(&self) -> bool {
        self.sticky.load(Ordering::SeqCst)
    }

    pub fn set_sticky(&self, sticky: bool) {
        self.sticky.store(sticky, Ordering::SeqCst);
    }

    pub fn record_materialized(&self, seq: IteratorSeq<T>) {
        self.materialized
            .lock()
            .expect("materialized-sequence lock poisoned")
            .push(seq);
    }

    #[cfg(test)]
    pub fn materialized_count(&self) -> usize {
        self.materialized
            .lock()
            .expect("materialized-sequence lock poisoned")
            .len()
    }
}

impl<T> Default for RddCore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_unique() {
        let a: RddCore<i64> = RddCore::new();
        let b: RddCore<i64> = RddCore::new();
        assert!(b.id > a.id);
    }

    #[test]
    fn sticky_defaults_false() {
        let core: RddCore<i64> = RddCore::new();
        assert!(!core.is_sticky());
        core.set_sticky(true);
        assert!(core.is_sticky());
    }
}
