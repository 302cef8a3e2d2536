//! `Partition`: a polymorphic handle identifying one slice of an RDD,
//! modeled as a sum type over the handful of shapes a partition can take.
//!
//! `Mapped`/`FlatMapped`/`Pair` collapse into a single `Derived` variant
//! here: all three reference exactly one upstream partition at the same
//! index and differ only in which transform function the *owning RDD*
//! applies, not in anything the partition itself carries.

use crate::iter_seq::IteratorSeq;
use std::sync::{Arc, OnceLock};

pub type RddId = u64;
pub type PartitionIndex = usize;

/// A destination slot written exactly once during a shuffle.
pub type ShuffleCell<T> = Arc<OnceLock<Vec<T>>>;

#[derive(Debug)]
pub enum Partition<T> {
    /// A contiguous slice of a `ParallelArray`'s source sequence.
    ParallelArraySlice {
        rdd_id: RddId,
        index: PartitionIndex,
        seq: IteratorSeq<T>,
    },
    /// One-to-one transform over a single upstream partition at the same index
    /// (covers `MappedRDD`, `FlatMappedRDD`, and `PairRDD`).
    Derived {
        rdd_id: RddId,
        index: PartitionIndex,
        parent_index: PartitionIndex,
    },
    /// A partition of a `UnionRDD`: one parent RDD's partition, relocated to
    /// a new index in the union's own partition space.
    Union {
        rdd_id: RddId,
        index: PartitionIndex,
        parent_ordinal: usize,
        parent_index: PartitionIndex,
    },
    /// A post-shuffle partition of a `ShuffledRDD`. Written exactly once by
    /// the shuffle step, then read by every consumer.
    Shuffled {
        rdd_id: RddId,
        index: PartitionIndex,
        cell: ShuffleCell<T>,
    },
}

impl<T> Partition<T> {
    pub fn rdd_id(&self) -> RddId {
        match self {
            Partition::ParallelArraySlice { rdd_id, .. }
            | Partition::Derived { rdd_id, .. }
            | Partition::Union { rdd_id, .. }
            | Partition::Shuffled { rdd_id, .. } => *rdd_id,
        }
    }

    pub fn index(&self) -> PartitionIndex {
        match self {
            Partition::ParallelArraySlice { index, .. }
            | Partition::Derived { index, .. }
            | Partition::Union { index, .. }
            | Partition::Shuffled { index, .. } => *index,
        }
    }
}
