//! RDD-graph-level scenarios a driver's `collect`/`reduce` would ultimately
//! run as tasks. Exercised here directly against `Rdd::compute` across every
//! partition, without a scheduler in the loop, since that concern belongs to
//! `shoal_cluster`'s own tests.

use shoal_job::iter_seq::IteratorSeq;
use shoal_job::rdd::parallel_array::ParallelArray;
use shoal_job::rdd::Rdd;

fn collect_all<T: Clone + Send + Sync + 'static>(rdd: &Rdd<T>) -> Vec<T> {
    (0..rdd.num_partitions()).flat_map(|index| rdd.compute(index)).collect()
}

#[test]
fn range_reduce_over_four_slices_sums_to_5050() {
    let rdd = ParallelArray::new(IteratorSeq::range(1i64, 100, 1), 4);
    let values = collect_all(&rdd);
    let sum: i64 = values.into_iter().sum();
    assert_eq!(sum, 5050);
}

#[test]
fn even_odd_pair_reduce_by_key_counts_500_each() {
    let rdd = ParallelArray::new(IteratorSeq::range(1i64, 1000, 1), 10);
    let pairs = rdd.map_to_pair(|x: &i64| (x % 2, 1i64));
    let reduced = pairs.reduce_by_key(|a, b| a + b, 2);
    let mut counts = collect_all(&reduced);
    counts.sort();
    assert_eq!(counts, vec![(0, 500), (1, 500)]);
}

#[test]
fn distinct_collapses_duplicates_and_sorts_to_one_through_five() {
    let rdd = ParallelArray::new(IteratorSeq::vector(vec![1i64, 1, 2, 2, 3, 3, 4, 4, 5, 5, 5]), 3);
    let distinct = rdd.distinct();
    let mut values = collect_all(&distinct);
    values.sort();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
}

#[test]
fn union_concatenates_two_sources_into_four_partitions() {
    let a = ParallelArray::new(IteratorSeq::vector(vec![1i64, 2, 3]), 2);
    let b = ParallelArray::new(IteratorSeq::vector(vec![4i64, 5, 6]), 2);
    let unioned = a.union(&b);
    assert_eq!(unioned.num_partitions(), 4);
    let mut values = collect_all(&unioned);
    values.sort();
    assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn join_pairs_matching_keys_and_sorts_by_key() {
    let left_src = ParallelArray::new(IteratorSeq::vector(vec![0i64, 1, 2]), 1);
    let left = left_src.map_to_pair(|x: &i64| match x {
        0 => ("a".to_string(), 1i64),
        1 => ("b".to_string(), 2i64),
        _ => ("a".to_string(), 3i64),
    });

    let right_src = ParallelArray::new(IteratorSeq::vector(vec![0i64, 1]), 1);
    let right = right_src.map_to_pair(|x: &i64| match x {
        0 => ("a".to_string(), 10i64),
        _ => ("c".to_string(), 20i64),
    });

    let joined = left.join(&right, 2);
    let mut values = collect_all(&joined);
    values.sort();
    assert_eq!(
        values,
        vec![("a".to_string(), (1, 10)), ("a".to_string(), (3, 10))]
    );
}
