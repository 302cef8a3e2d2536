//! The RDD graph: typed, lazy, partition-parallel collections connected by
//! a transformation DAG.
//!
//! RDD variants are a tagged family over a small capability set
//! (`id`, `partitions`, `preferred_locations`, `compute`), implemented as a
//! trait rather than deep inheritance. Each concrete variant lives in its
//! own module, composing a shared `RddCore` rather than inheriting from a
//! base class.

pub mod core;
pub mod flat_mapped;
pub mod mapped;
pub mod pair;
pub mod parallel_array;
pub mod shuffle;
pub mod union;

use crate::partition::{Partition, PartitionIndex, RddId};
use std::sync::Arc;

/// Object-safe capability set implemented by every concrete RDD variant.
pub trait RddOps<T>: Send + Sync {
    fn id(&self) -> RddId;
    fn partitions(&self) -> &[Partition<T>];
    /// Hint hosts likely to hold this partition's input data locally.
    fn preferred_locations(&self, partition_index: PartitionIndex) -> Vec<String>;
    /// Materialize a partition's full element sequence.
    fn compute(&self, partition_index: PartitionIndex) -> Vec<T>;
    fn is_sticky(&self) -> bool;
    fn set_sticky(&self, sticky: bool);
}

/// The user-facing RDD handle. Cloning is shallow (an `Arc` bump): clones
/// are non-owning references to the same underlying graph node, matching
/// the invariant that an RDD exclusively owns its partitions while
/// dependents hold only non-owning references.
pub struct Rdd<T>(pub Arc<dyn RddOps<T>>);

impl<T> Clone for Rdd<T> {
    fn clone(&self) -> Self {
        Rdd(Arc::clone(&self.0))
    }
}

impl<T: Clone + Send + Sync + 'static> Rdd<T> {
    pub fn id(&self) -> RddId {
        self.0.id()
    }

    pub fn num_partitions(&self) -> usize {
        self.0.partitions().len()
    }

    pub fn partitions(&self) -> &[Partition<T>] {
        self.0.partitions()
    }

    pub fn preferred_locations(&self, partition_index: PartitionIndex) -> Vec<String> {
        self.0.preferred_locations(partition_index)
    }

    pub fn compute(&self, partition_index: PartitionIndex) -> Vec<T> {
        self.0.compute(partition_index)
    }

    /// A sticky RDD is retained beyond its enclosing action; see
    /// `rdd::core::RddCore` for how this is realized without reference
    /// cycles.
    pub fn set_sticky(&self, sticky: bool) {
        self.0.set_sticky(sticky);
    }

    pub fn is_sticky(&self) -> bool {
        self.0.is_sticky()
    }

    /// Elementwise transform `T -> U`.
    pub fn map<U, F>(&self, f: F) -> Rdd<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        mapped::MappedRdd::new(self.clone(), f)
    }

    /// Transform `T -> sequence-of-U`, flattened.
    pub fn flat_map<U, F, I>(&self, f: F) -> Rdd<U>
    where
        U: Clone + Send + Sync + 'static,
        I: IntoIterator<Item = U>,
        F: Fn(&T) -> I + Send + Sync + 'static,
    {
        flat_mapped::FlatMappedRdd::new(self.clone(), f)
    }

    /// Transform `T -> (K, V)`, yielding a `PairRdd` with shuffle-backed
    /// `reduce_by_key`/`group_by_key`/`join` operations.
    pub fn map_to_pair<K, V, F>(&self, f: F) -> pair::PairRdd<K, V>
    where
        K: Clone + std::hash::Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
        F: Fn(&T) -> (K, V) + Send + Sync + 'static,
    {
        pair::PairRdd::from_map(self.clone(), f)
    }

    /// Concatenate the partitions of this RDD with `other`'s.
    pub fn union(&self, other: &Rdd<T>) -> Rdd<T> {
        union::UnionRdd::new(vec![self.clone(), other.clone()])
    }

    /// Remove duplicate elements, re-partitioned into `new_num_slices`.
    ///
    /// Implemented as `map_to_pair(t -> (t, ())) -> reduce_by_key((a,b) -> a)
    /// -> map(|p| p.0)`: the shuffle collapses every duplicate of a key down
    /// to one pair, and the trailing map drops the placeholder value.
    pub fn distinct_with_slices(&self, new_num_slices: usize) -> Rdd<T>
    where
        T: std::hash::Hash + Eq,
    {
        self.map_to_pair(|t: &T| (t.clone(), ()))
            .reduce_by_key(|a, _b| a, new_num_slices)
            .map(|pair: &(T, ())| pair.0.clone())
    }

    /// `distinct` keeping this RDD's own partition count.
    pub fn distinct(&self) -> Rdd<T>
    where
        T: std::hash::Hash + Eq,
    {
        self.distinct_with_slices(self.num_partitions())
    }
}
