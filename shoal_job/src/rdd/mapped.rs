//! `MappedRDD<U, T>`: elementwise transform `T -> U`.

use super::core::RddCore;
use super::{Rdd, RddOps};
use crate::partition::{Partition, PartitionIndex, RddId};
use std::sync::Arc;

pub struct MappedRdd<U, T> {
    core: RddCore<U>,
    upstream: Rdd<T>,
    f: Arc<dyn Fn(&T) -> U + Send + Sync>,
    partitions: Vec<Partition<U>>,
}

impl<U, T> MappedRdd<U, T>
where
    U: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F>(upstream: Rdd<T>, f: F) -> Rdd<U>
    where
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let core = RddCore::new();
        let rdd_id = core.id;
        let partitions = (0..upstream.num_partitions())
            .map(|index| Partition::Derived {
                rdd_id,
                index,
                parent_index: index,
            })
            .collect();
        Rdd(Arc::new(Self {
            core,
            upstream,
            f: Arc::new(f),
            partitions,
        }))
    }
}

impl<U, T> RddOps<U> for MappedRdd<U, T>
where
    U: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn id(&self) -> RddId {
        self.core.id
    }

    fn partitions(&self) -> &[Partition<U>] {
        &self.partitions
    }

    fn preferred_locations(&self, partition_index: PartitionIndex) -> Vec<String> {
        self.upstream.preferred_locations(partition_index)
    }

    fn compute(&self, partition_index: PartitionIndex) -> Vec<U> {
        self.upstream
            .compute(partition_index)
            .iter()
            .map(|t| (self.f)(t))
            .collect()
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
    use super::super::parallel_array::ParallelArray;
    use crate::iter_seq::IteratorSeq;

    #[test]
    fn map_preserves_partition_count_and_transforms_elementwise() {
        let src = ParallelArray::new(IteratorSeq::range(1i64, 10, 1), 2);
        let mapped = src.map(|x: &i64| x * 2);
        assert_eq!(mapped.num_partitions(), src.num_partitions());
        let all: Vec<i64> = (0..mapped.num_partitions())
            .flat_map(|i| mapped.compute(i))
            .collect();
        assert_eq!(all, (1..=10).map(|x| x * 2).collect::<Vec<_>>());
    }
}
