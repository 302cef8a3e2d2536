//! The shuffle engine: hash-partitioned redistribution underlying
//! `reduce_by_key`, `group_by_key`, and `join`.
//!
//! Because every node in the cluster runs the identical program over
//! identical source data, a shuffle is recomputed locally by whichever
//! node needs a given output partition rather than shipped over the wire;
//! there is no persistent or cross-job shuffle-block store.

use super::core::RddCore;
use super::{Rdd, RddOps};
use crate::partition::{Partition, PartitionIndex, RddId, ShuffleCell};
use shoal_common::hash_divider::HashDivider;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Once, OnceLock};

/// Post-shuffle view of a `PairRDD` with a chosen partition count. Its
/// partitions are written exactly once, the first time any of them is
/// computed, by `populate`, the only place a `shoal_job` RDD mutates state
/// after construction.
pub struct ShuffledRdd<T> {
    core: RddCore<T>,
    cells: Vec<ShuffleCell<T>>,
    partitions: Vec<Partition<T>>,
    once: Once,
    populate: Box<dyn Fn() -> Vec<Vec<T>> + Send + Sync>,
}

impl<T: Clone + Send + Sync + 'static> ShuffledRdd<T> {
    fn new(num_partitions: usize, populate: Box<dyn Fn() -> Vec<Vec<T>> + Send + Sync>) -> Rdd<T> {
        let core = RddCore::new();
        let rdd_id = core.id;
        let cells: Vec<ShuffleCell<T>> = (0..num_partitions).map(|_| Arc::new(OnceLock::new())).collect();
        let partitions = cells
            .iter()
            .enumerate()
            .map(|(index, cell)| Partition::Shuffled {
                rdd_id,
                index,
                cell: cell.clone(),
            })
            .collect();
        Rdd(Arc::new(Self {
            core,
            cells,
            partitions,
            once: Once::new(),
            populate,
        }))
    }

    fn ensure_populated(&self) {
        self.once.call_once(|| {
            let buckets = (self.populate)();
            for (cell, bucket) in self.cells.iter().zip(buckets) {
                let _ = cell.set(bucket);
            }
        });
    }
}

impl<T: Clone + Send + Sync + 'static> RddOps<T> for ShuffledRdd<T> {
    fn id(&self) -> RddId {
        self.core.id
    }

    fn partitions(&self) -> &[Partition<T>] {
        &self.partitions
    }

    fn preferred_locations(&self, _partition_index: PartitionIndex) -> Vec<String> {
        vec![]
    }

    fn compute(&self, partition_index: PartitionIndex) -> Vec<T> {
        self.ensure_populated();
        self.cells[partition_index].get().cloned().unwrap_or_default()
    }

    fn is_sticky(&self) -> bool {
        self.core.is_sticky()
    }

    fn set_sticky(&self, sticky: bool) {
        self.core.set_sticky(sticky)
    }
}

fn hash_of<K: Hash>(key: &K) -> i64 {
    use std::hash::Hasher;
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish() as i64
}

/// Route every `(k, v)` pair of `upstream` to destination partition
/// `divider.get_partition(hash(k))`, scanning upstream partitions in order.
fn shuffle_pairs<K, V>(upstream: &Rdd<(K, V)>, divider: &HashDivider) -> Vec<Vec<(K, V)>>
where
    K: Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let mut buckets: Vec<Vec<(K, V)>> = (0..divider.num_partitions()).map(|_| Vec::new()).collect();
    for source_partition in 0..upstream.num_partitions() {
        for (k, v) in upstream.compute(source_partition) {
            let dest = divider.get_partition(hash_of(&k));
            buckets[dest].push((k, v));
        }
    }
    buckets
}

/// Collapse all values for equal keys within a destination partition by
/// successive application of `r` in arrival order.
pub fn reduce_by_key<K, V, F>(upstream: Rdd<(K, V)>, r: F, num_partitions: usize) -> Rdd<(K, V)>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    F: Fn(V, V) -> V + Send + Sync + 'static,
{
    let divider = HashDivider::new(num_partitions);
    let populate = Box::new(move || {
        shuffle_pairs(&upstream, &divider)
            .into_iter()
            .map(|bucket| {
                let mut acc: HashMap<K, V> = HashMap::new();
                for (k, v) in bucket {
                    match acc.remove(&k) {
                        Some(existing) => {
                            acc.insert(k, r(existing, v));
                        }
                        None => {
                            acc.insert(k, v);
                        }
                    }
                }
                acc.into_iter().collect::<Vec<(K, V)>>()
            })
            .collect()
    });
    ShuffledRdd::new(num_partitions, populate)
}

/// `reduce_by_key` whose combiner appends to a per-key value vector.
pub fn group_by_key<K, V>(upstream: Rdd<(K, V)>, num_partitions: usize) -> Rdd<(K, Vec<V>)>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let divider = HashDivider::new(num_partitions);
    let populate = Box::new(move || {
        shuffle_pairs(&upstream, &divider)
            .into_iter()
            .map(|bucket| {
                let mut groups: HashMap<K, Vec<V>> = HashMap::new();
                for (k, v) in bucket {
                    groups.entry(k).or_default().push(v);
                }
                groups.into_iter().collect::<Vec<(K, Vec<V>)>>()
            })
            .collect()
    });
    ShuffledRdd::new(num_partitions, populate)
}

/// Join two `PairRDD`s on `K`: both sides are shuffled into the same `P`
/// with the same hash and divider, yielding ordered cross-products
/// `(v_left, v_right)` in each destination for each common key.
pub fn join<K, V1, V2>(left: Rdd<(K, V1)>, right: Rdd<(K, V2)>, num_partitions: usize) -> Rdd<(K, (V1, V2))>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V1: Clone + Send + Sync + 'static,
    V2: Clone + Send + Sync + 'static,
{
    let divider = HashDivider::new(num_partitions);
    let populate = Box::new(move || {
        let left_buckets = shuffle_pairs(&left, &divider);
        let right_buckets = shuffle_pairs(&right, &divider);
        left_buckets
            .into_iter()
            .zip(right_buckets)
            .map(|(lb, rb)| {
                let mut left_groups: HashMap<K, Vec<V1>> = HashMap::new();
                for (k, v) in lb {
                    left_groups.entry(k).or_default().push(v);
                }
                let mut right_groups: HashMap<K, Vec<V2>> = HashMap::new();
                for (k, v) in rb {
                    right_groups.entry(k).or_default().push(v);
                }
                let mut out = Vec::new();
                for (k, lvs) in &left_groups {
                    if let Some(rvs) = right_groups.get(k) {
                        for lv in lvs {
                            for rv in rvs {
                                out.push((k.clone(), (lv.clone(), rv.clone())));
                            }
                        }
                    }
                }
                out
            })
            .collect()
    });
    ShuffledRdd::new(num_partitions, populate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter_seq::IteratorSeq;
    use crate::rdd::parallel_array::ParallelArray;

    #[test]
    fn reduce_by_key_counts_even_and_odd() {
        let src = ParallelArray::new(IteratorSeq::range(1i64, 1000, 1), 10);
        let pairs = src.map(|x: &i64| (x % 2, 1i64));
        let reduced = reduce_by_key(pairs, |a, b| a + b, 2);
        let mut all: Vec<(i64, i64)> = (0..reduced.num_partitions())
            .flat_map(|i| reduced.compute(i))
            .collect();
        all.sort();
        assert_eq!(all, vec![(0, 500), (1, 500)]);
    }

    #[test]
    fn join_produces_ordered_cross_products_per_key() {
        let left_src = ParallelArray::new(IteratorSeq::vector(vec![0i64, 1, 2]), 2);
        let left = left_src.map(|i: &i64| match i {
            0 => ("a", 1i64),
            1 => ("b", 2),
            _ => ("a", 3),
        });
        let right_src = ParallelArray::new(IteratorSeq::vector(vec![0i64, 1]), 2);
        let right = right_src.map(|i: &i64| if *i == 0 { ("a", 10i64) } else { ("c", 20) });
        let joined = join(left, right, 2);
        let mut all: Vec<(&str, (i64, i64))> = (0..joined.num_partitions())
            .flat_map(|i| joined.compute(i))
            .collect();
        all.sort();
        assert_eq!(all, vec![("a", (1, 10)), ("a", (3, 10))]);
    }

    #[test]
    fn group_by_key_collects_all_values() {
        let seed = ParallelArray::new(IteratorSeq::vector(vec![0i64, 1, 2]), 2);
        let src = seed.map(|i: &i64| match i {
            0 => (1i64, 'a'),
            1 => (1, 'b'),
            _ => (2, 'c'),
        });
        let grouped = group_by_key(src, 2);
        let mut all: Vec<(i64, Vec<char>)> = (0..grouped.num_partitions())
            .flat_map(|i| grouped.compute(i))
            .collect();
        for (_, vs) in all.iter_mut() {
            vs.sort();
        }
        all.sort();
        assert_eq!(all, vec![(1, vec!['a', 'b']), (2, vec!['c'])]);
    }
}
