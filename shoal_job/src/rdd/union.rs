//! `UnionRDD<T>`: concatenation of several parent RDDs' partitions,
//! unchanged and in parent order, with no re-partitioning or dedup.

use super::core::RddCore;
use super::{Rdd, RddOps};
use crate::partition::{Partition, PartitionIndex, RddId};
use std::sync::Arc;

pub struct UnionRdd<T> {
    core: RddCore<T>,
    parents: Vec<Rdd<T>>,
    partitions: Vec<Partition<T>>,
}

impl<T: Clone + Send + Sync + 'static> UnionRdd<T> {
    pub fn new(parents: Vec<Rdd<T>>) -> Rdd<T> {
        let core = RddCore::new();
        let rdd_id = core.id;
        let mut partitions = Vec::new();
        let mut index = 0;
        for (parent_ordinal, parent) in parents.iter().enumerate() {
            for parent_index in 0..parent.num_partitions() {
                partitions.push(Partition::Union {
                    rdd_id,
                    index,
                    parent_ordinal,
                    parent_index,
                });
                index += 1;
            }
        }
        Rdd(Arc::new(Self {
            core,
            parents,
            partitions,
        }))
    }
}

impl<T: Clone + Send + Sync + 'static> RddOps<T> for UnionRdd<T> {
    fn id(&self) -> RddId {
        self.core.id
    }

    fn partitions(&self) -> &[Partition<T>] {
        &self.partitions
    }

    fn preferred_locations(&self, partition_index: PartitionIndex) -> Vec<String> {
        match &self.partitions[partition_index] {
            Partition::Union {
                parent_ordinal,
                parent_index,
                ..
            } => self.parents[*parent_ordinal].preferred_locations(*parent_index),
            other => unreachable!("UnionRdd partition must be Union, got {other:?}"),
        }
    }

    fn compute(&self, partition_index: PartitionIndex) -> Vec<T> {
        match &self.partitions[partition_index] {
            Partition::Union {
                parent_ordinal,
                parent_index,
                ..
            } => self.parents[*parent_ordinal].compute(*parent_index),
            other => unreachable!("UnionRdd partition must be Union, got {other:?}"),
        }
    }

    fn is_sticky(&self) -> bool {
        self.core.is_sticky()
    }

    fn set_sticky(&self, sticky: bool) {
        self.core.set_sticky(sticky)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter_seq::IteratorSeq;
    use crate::rdd::parallel_array::ParallelArray;

    #[test]
    fn union_concatenates_partitions_and_elements() {
        let left = ParallelArray::new(IteratorSeq::range(1i64, 3, 1), 2);
        let right = ParallelArray::new(IteratorSeq::range(4i64, 6, 1), 2);
        let unioned = left.union(&right);
        assert_eq!(unioned.num_partitions(), 4);
        let all: Vec<i64> = (0..unioned.num_partitions())
            .flat_map(|i| unioned.compute(i))
            .collect();
        assert_eq!(all, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn union_preserves_parent_order_for_three_parents() {
        let a = ParallelArray::new(IteratorSeq::vector(vec![1i64]), 1);
        let b = ParallelArray::new(IteratorSeq::vector(vec![2i64]), 1);
        let c = ParallelArray::new(IteratorSeq::vector(vec![3i64]), 1);
        let unioned = UnionRdd::new(vec![a, b, c]);
        let all: Vec<i64> = (0..unioned.num_partitions())
            .flat_map(|i| unioned.compute(i))
            .collect();
        assert_eq!(all, vec![1, 2, 3]);
    }
}
