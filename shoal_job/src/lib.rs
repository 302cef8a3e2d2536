//! The job graph: lazy sequences, partitions, the RDD transformation DAG,
//! and the tasks that evaluate it one partition at a time.

pub mod iter_seq;
pub mod partition;
pub mod rdd;
pub mod task;

pub use iter_seq::IteratorSeq;
pub use partition::Partition;
pub use rdd::Rdd;
