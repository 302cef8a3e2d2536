//! `FlatMappedRDD<U, T>`: transform `T -> sequence-of-U`, flattened.

use super::core::RddCore;
use super::{Rdd, RddOps};
use crate::partition::{Partition, PartitionIndex, RddId};
use std::sync::Arc;

pub struct FlatMappedRdd<U, T> {
    core: RddCore<U>,
    upstream: Rdd<T>,
    f: Arc<dyn Fn(&T) -> Vec<U> + Send + Sync>,
    partitions: Vec<Partition<U>>,
}

impl<U, T> FlatMappedRdd<U, T>
where
    U: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, I>(upstream: Rdd<T>, f: F) -> Rdd<U>
    where
        I: IntoIterator<Item = U>,
        F: Fn(&T) -> I + Send + Sync + 'static,
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
        let f = Arc::new(move |t: &T| f(t).into_iter().collect::<Vec<U>>());
        Rdd(Arc::new(Self {
            core,
            upstream,
            f,
            partitions,
        }))
    }
}

impl<U, T> RddOps<U> for FlatMappedRdd<U, T>
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
            .flat_map(|t| (self.f)(t))
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
    fn flat_map_flattens_per_element_sequences() {
        let src = ParallelArray::new(IteratorSeq::range(1i64, 3, 1), 1);
        let flattened = src.flat_map(|x: &i64| vec![*x, *x]);
        let all: Vec<i64> = (0..flattened.num_partitions())
            .flat_map(|i| flattened.compute(i))
            .collect();
        assert_eq!(all, vec![1, 1, 2, 2, 3, 3]);
    }
}
