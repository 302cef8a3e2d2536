//! `PairRDD<K, V>`: an RDD of key-value pairs with shuffle-backed
//! operations. Represented as a thin wrapper around `Rdd<(K, V)>` rather
//! than a parallel type hierarchy, since every non-shuffle capability it
//! needs (`compute`, `partitions`, `map`, ...) is already present on
//! `Rdd<(K, V)>`.

use super::{shuffle, Rdd};
use std::hash::Hash;

pub struct PairRdd<K, V>(pub Rdd<(K, V)>);

impl<K, V> Clone for PairRdd<K, V> {
    fn clone(&self) -> Self {
        PairRdd(self.0.clone())
    }
}

impl<K, V> PairRdd<K, V>
where
    K: Clone + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn from_map<T, F>(upstream: Rdd<T>, f: F) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&T) -> (K, V) + Send + Sync + 'static,
    {
        PairRdd(upstream.map(f))
    }

    pub fn into_rdd(self) -> Rdd<(K, V)> {
        self.0
    }

    pub fn as_rdd(&self) -> &Rdd<(K, V)> {
        &self.0
    }

    pub fn num_partitions(&self) -> usize {
        self.0.num_partitions()
    }

    pub fn compute(&self, partition_index: usize) -> Vec<(K, V)> {
        self.0.compute(partition_index)
    }

    /// Shuffle into `num_partitions` buckets and collapse equal keys by
    /// successive application of `r` in arrival order.
    pub fn reduce_by_key<F>(&self, r: F, num_partitions: usize) -> Rdd<(K, V)>
    where
        F: Fn(V, V) -> V + Send + Sync + 'static,
    {
        shuffle::reduce_by_key(self.0.clone(), r, num_partitions)
    }

    /// Shuffle into `num_partitions` buckets, collecting every value sharing
    /// a key into one `Vec`.
    pub fn group_by_key(&self, num_partitions: usize) -> Rdd<(K, Vec<V>)> {
        shuffle::group_by_key(self.0.clone(), num_partitions)
    }

    /// Shuffle this and `other` into the same `num_partitions` buckets and
    /// emit `(v_left, v_right)` for every pair sharing a key.
    pub fn join<V2>(&self, other: &PairRdd<K, V2>, num_partitions: usize) -> Rdd<(K, (V, V2))>
    where
        V2: Clone + Send + Sync + 'static,
    {
        shuffle::join(self.0.clone(), other.0.clone(), num_partitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter_seq::IteratorSeq;
    use crate::rdd::parallel_array::ParallelArray;

    #[test]
    fn map_to_pair_then_reduce_by_key_collapses_keys() {
        let words = ["a", "bb", "ccc", "dd"];
        let seed = ParallelArray::new(IteratorSeq::vector(vec![0i64, 1, 2, 3]), 2);
        let src = seed.map(move |i: &i64| words[*i as usize]);
        let pairs = src.map_to_pair(|s: &&str| (s.len(), 1i64));
        let reduced = pairs.reduce_by_key(|a, b| a + b, 2);
        let mut all: Vec<(usize, i64)> = (0..reduced.num_partitions())
            .flat_map(|i| reduced.compute(i))
            .collect();
        all.sort();
        assert_eq!(all, vec![(1, 1), (2, 2), (3, 1)]);
    }

    #[test]
    fn group_by_key_via_pair_rdd() {
        let seed = ParallelArray::new(IteratorSeq::vector(vec![0i64, 1, 2]), 1);
        let src = seed.map(|i: &i64| match i {
            0 => (1i64, 'x'),
            1 => (2, 'y'),
            _ => (1, 'z'),
        });
        let pairs = src.map_to_pair(|p: &(i64, char)| *p);
        let grouped = pairs.group_by_key(1);
        let mut all: Vec<(i64, Vec<char>)> = (0..grouped.num_partitions())
            .flat_map(|i| grouped.compute(i))
            .collect();
        for (_, vs) in all.iter_mut() {
            vs.sort();
        }
        all.sort();
        assert_eq!(all, vec![(1, vec!['x', 'z']), (2, vec!['y'])]);
    }
}
