//! `ParallelArray<T>`: the source RDD built directly from an `IteratorSeq`.

use super::core::RddCore;
use super::{Rdd, RddOps};
use crate::iter_seq::{IteratorSeq, Numeric};
use crate::partition::{Partition, PartitionIndex, RddId};
use std::sync::Arc;

pub struct ParallelArray<T> {
    core: RddCore<T>,
    partitions: Vec<Partition<T>>,
}

impl<T: Numeric + Send + Sync + 'static> ParallelArray<T> {
    pub fn new(seq: IteratorSeq<T>, num_slices: usize) -> Rdd<T> {
        let core = RddCore::new();
        let rdd_id = core.id;
        let slices = slice(&seq, num_slices);
        let partitions = slices
            .into_iter()
            .enumerate()
            .map(|(index, seq)| {
                core.record_materialized(seq.clone());
                Partition::ParallelArraySlice {
                    rdd_id,
                    index,
                    seq,
                }
            })
            .collect();
        Rdd(Arc::new(Self { core, partitions }))
    }
}

/// Slice an `IteratorSeq` of size `N` into `num_slices` balanced, contiguous
/// groups: `g = floor(N / num_slices)`, the first `num_slices - 1` groups
/// each of size `g`, the last absorbing the remainder `N - (num_slices-1)*g`.
///
/// `num_slices < 1` is a reported-warning condition, not an error: it
/// yields zero partitions.
fn slice<T: Numeric>(seq: &IteratorSeq<T>, num_slices: usize) -> Vec<IteratorSeq<T>> {
    if num_slices < 1 {
        tracing::warn!(
            num_slices,
            "parallelize: slice count must be >= 1; producing an RDD with zero partitions"
        );
        return vec![];
    }

    let n = seq.size();
    let g = n / num_slices;

    match seq {
        IteratorSeq::Vector(values) => {
            let mut result = Vec::with_capacity(num_slices);
            for i in 0..num_slices - 1 {
                result.push(IteratorSeq::vector(values[i * g..(i + 1) * g].to_vec()));
            }
            result.push(IteratorSeq::vector(values[(num_slices - 1) * g..].to_vec()));
            result
        }
        IteratorSeq::Range { start, end, step, .. } => {
            let mut result = Vec::with_capacity(num_slices);
            for i in 0..num_slices - 1 {
                let slice_start = *start + T::from_i64(step.to_i64() * (i * g) as i64);
                let slice_end = slice_start + T::from_i64(step.to_i64() * (g as i64 - 1));
                result.push(IteratorSeq::range(slice_start, slice_end, *step));
            }
            let last_start = *start + T::from_i64(step.to_i64() * ((num_slices - 1) * g) as i64);
            result.push(IteratorSeq::range(last_start, *end, *step));
            result
        }
    }
}

impl<T: Numeric + Send + Sync + 'static> RddOps<T> for ParallelArray<T> {
    fn id(&self) -> RddId {
        self.core.id
    }

    fn partitions(&self) -> &[Partition<T>] {
        &self.partitions
    }

    fn preferred_locations(&self, _partition_index: PartitionIndex) -> Vec<String> {
        // Source data lives wherever the driver constructed it; no location hint.
        vec![]
    }

    fn compute(&self, partition_index: PartitionIndex) -> Vec<T> {
        match &self.partitions[partition_index] {
            Partition::ParallelArraySlice { seq, .. } => seq.to_vec(),
            other => unreachable!("ParallelArray partition must be ParallelArraySlice, got {other:?}"),
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

    #[test]
    fn slice_counts_balance() {
        let seq = IteratorSeq::vector((1..=11i64).collect());
        let slices = slice(&seq, 3);
        let sizes: Vec<usize> = slices.iter().map(|s| s.size()).collect();
        assert_eq!(sizes.iter().sum::<usize>(), 11);
        assert_eq!(sizes[0], 11 / 3);
        assert_eq!(sizes[1], 11 / 3);
    }

    #[test]
    fn range_slices_are_contiguous_ranges() {
        let seq = IteratorSeq::range(1i64, 100, 1);
        let slices = slice(&seq, 4);
        assert_eq!(slices.len(), 4);
        let total: usize = slices.iter().map(|s| s.size()).sum();
        assert_eq!(total, 100);
        let mut all: Vec<i64> = vec![];
        for s in &slices {
            all.extend(s.to_vec());
        }
        assert_eq!(all, (1..=100).collect::<Vec<_>>());
    }

    #[test]
    fn zero_slices_yields_no_partitions() {
        let rdd = ParallelArray::new(IteratorSeq::range(1i64, 10, 1), 0);
        assert_eq!(rdd.num_partitions(), 0);
    }

    #[test]
    fn parallel_array_partition_count_matches_request() {
        let rdd = ParallelArray::new(IteratorSeq::range(1i64, 100, 1), 4);
        assert_eq!(rdd.num_partitions(), 4);
        let collected: i64 = (0..rdd.num_partitions())
            .flat_map(|i| rdd.compute(i))
            .sum();
        assert_eq!(collected, 5050);
    }
}
