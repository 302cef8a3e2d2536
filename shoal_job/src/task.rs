//! `Task<T>` and `TaskResult<T>`: the unit of scheduled work and its
//! answer.
//!
//! Since every node runs the identical program against identically
//! constructed RDD graphs, a `Task` never needs to cross the wire. Only its
//! `TaskResult` does, which is why `TaskResult` alone derives `Serialize`/
//! `Deserialize` via `shoal_common::codec`.

use crate::partition::PartitionIndex;
use crate::rdd::Rdd;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type JobId = u64;
pub type TaskId = u64;

/// What a task does with its partition's materialized elements once
/// `Rdd::compute` has produced them.
pub enum Operation<T> {
    /// Return the partition's full element sequence unchanged.
    Collect,
    /// Left-fold the partition's elements through `r`; an empty partition
    /// contributes no value.
    Reduce(Arc<dyn Fn(T, T) -> T + Send + Sync>),
}

impl<T> Clone for Operation<T> {
    fn clone(&self) -> Self {
        match self {
            Operation::Collect => Operation::Collect,
            Operation::Reduce(r) => Operation::Reduce(Arc::clone(r)),
        }
    }
}

/// A single unit of scheduled work: evaluate `operation` over one partition
/// of `rdd`. Constructed locally by whichever node is about to execute it;
/// never transmitted.
pub struct Task<T> {
    pub job_id: JobId,
    pub task_id: TaskId,
    pub rdd: Rdd<T>,
    pub partition_index: PartitionIndex,
    pub operation: Operation<T>,
    /// Hosts likely to hold this partition's input data locally, in
    /// preference order; consulted by the scheduler's placement algorithm
    /// before it falls back to left-biased fill.
    pub preferred_locations: Vec<String>,
}

impl<T: Clone + Send + Sync + 'static> Task<T> {
    pub fn new(job_id: JobId, task_id: TaskId, rdd: Rdd<T>, partition_index: PartitionIndex, operation: Operation<T>) -> Self {
        let preferred_locations = rdd.preferred_locations(partition_index);
        Self {
            job_id,
            task_id,
            rdd,
            partition_index,
            operation,
            preferred_locations,
        }
    }

    /// Compute this task's partition and apply its operation, producing the
    /// value(s) that will actually travel over the wire.
    pub fn run(&self) -> TaskResult<T> {
        let values = self.rdd.compute(self.partition_index);
        let payload = match &self.operation {
            Operation::Collect => values,
            Operation::Reduce(r) => {
                let mut iter = values.into_iter();
                match iter.next() {
                    None => vec![],
                    Some(first) => vec![iter.fold(first, |acc, v| r(acc, v))],
                }
            }
        };
        TaskResult {
            job_id: self.job_id,
            task_id: self.task_id,
            partition_index: self.partition_index,
            values: payload,
        }
    }
}

/// The value-only answer to a `Task`, sent back to the requesting node as a
/// `A_TASK_RESULT` message payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult<T> {
    pub job_id: JobId,
    pub task_id: TaskId,
    pub partition_index: PartitionIndex,
    pub values: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter_seq::IteratorSeq;
    use crate::rdd::parallel_array::ParallelArray;

    #[test]
    fn collect_task_returns_partition_elements() {
        let rdd = ParallelArray::new(IteratorSeq::range(1i64, 10, 1), 2);
        let task = Task::new(1, 1, rdd, 0, Operation::Collect);
        let result = task.run();
        assert_eq!(result.job_id, 1);
        assert_eq!(result.task_id, 1);
        assert!(!result.values.is_empty());
    }

    #[test]
    fn reduce_task_folds_partition_to_one_value() {
        let rdd = ParallelArray::new(IteratorSeq::range(1i64, 100, 1), 1);
        let task = Task::new(2, 7, rdd, 0, Operation::Reduce(Arc::new(|a, b| a + b)));
        let result = task.run();
        assert_eq!(result.values, vec![5050]);
    }

    #[test]
    fn reduce_task_on_empty_partition_yields_no_values() {
        let rdd = ParallelArray::new(IteratorSeq::range(1i64, 10, 1), 0);
        assert_eq!(rdd.num_partitions(), 0);
        let rdd_single = ParallelArray::new(IteratorSeq::vector(Vec::<i64>::new()), 1);
        let task = Task::new(3, 1, rdd_single, 0, Operation::Reduce(Arc::new(|a, b| a + b)));
        let result = task.run();
        assert!(result.values.is_empty());
    }

    #[test]
    fn task_result_round_trips_through_codec() {
        let result = TaskResult {
            job_id: 4,
            task_id: 2,
            partition_index: 0,
            values: vec![1i64, 2, 3],
        };
        let encoded = shoal_common::codec::encode(&result).unwrap();
        let decoded: TaskResult<i64> = shoal_common::codec::decode(&encoded).unwrap();
        assert_eq!(decoded.values, vec![1, 2, 3]);
    }
}
