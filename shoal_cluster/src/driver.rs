//! The driver context: the user-facing façade owning the cluster
//! configuration and the per-job scheduler lifecycle.

use serde::de::DeserializeOwned;
use serde::Serialize;
use shoal_common::error::{Result, ShoalError};
use shoal_common::hostfile::HostInfo;
use shoal_job::iter_seq::{IteratorSeq, Numeric};
use shoal_job::rdd::parallel_array::ParallelArray;
use shoal_job::rdd::Rdd;
use shoal_job::task::{JobId, Task, TaskId, TaskResult};
use shoal_job::task::Operation;
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::messaging::{ListenStatus, Listener, Message, OnMessage};
use crate::scheduler::{self, HostIndex, Scheduler};

type PendingMessage = (u16, String, Message);

/// Routes inbound scheduler traffic to the scheduler registered for its
/// job id, buffering messages that arrive before that job's scheduler has
/// registered so they can be replayed once it does.
struct JobDispatch {
    table: Mutex<HashMap<JobId, Arc<dyn OnMessage>>>,
    pending: Mutex<Vec<(JobId, PendingMessage)>>,
}

impl JobDispatch {
    fn new() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
            pending: Mutex::new(Vec::new()),
        }
    }

    fn register(&self, job_id: JobId, handler: Arc<dyn OnMessage>) {
        let replayed: Vec<PendingMessage> = {
            let mut pending = self.pending.lock().expect("dispatch pending lock poisoned");
            let (matching, rest): (Vec<_>, Vec<_>) = pending.drain(..).partition(|(id, _)| *id == job_id);
            *pending = rest;
            matching.into_iter().map(|(_, msg)| msg).collect()
        };
        let handler = {
            let mut table = self.table.lock().expect("dispatch table lock poisoned");
            table.insert(job_id, handler);
            table.get(&job_id).cloned().expect("handler was just inserted")
        };
        for (local_port, from_host, message) in replayed {
            handler.on_message(local_port, &from_host, &message);
        }
    }

    fn deregister(&self, job_id: JobId) {
        self.table.lock().expect("dispatch table lock poisoned").remove(&job_id);
    }
}

impl OnMessage for JobDispatch {
    fn on_message(&self, local_port: u16, from_host: &str, message: &Message) -> Option<String> {
        let Some(job_id) = scheduler::extract_job_id(&message.payload) else {
            tracing::warn!(?message.message_type, "scheduler message missing job id prefix; dropping");
            return None;
        };
        let handler = self.table.lock().expect("dispatch table lock poisoned").get(&job_id).cloned();
        match handler {
            Some(handler) => handler.on_message(local_port, from_host, message),
            None => {
                tracing::debug!(job_id, "no scheduler registered for job yet; buffering for later delivery");
                self.pending
                    .lock()
                    .expect("dispatch pending lock poisoned")
                    .push((job_id, (local_port, from_host.to_string(), message.clone())));
                None
            }
        }
    }
}

/// Owns the host list, this node's and the master's position in it, the
/// monotonic job-id allocator, and the set of RDDs the user has pinned
/// beyond their enclosing action's scope (the "sticky registry"). Holding
/// these from the outside, rather than giving each RDD a back-reference to
/// its driver context, avoids a circular dependency between the job graph
/// and the cluster crate.
pub struct DriverContext {
    hosts: Vec<HostInfo>,
    self_index: HostIndex,
    master_index: HostIndex,
    next_job_id: AtomicU64,
    dispatch: Arc<JobDispatch>,
    sticky: Mutex<Vec<Box<dyn Any + Send + Sync>>>,
}

impl DriverContext {
    /// Bind `listen_port`, identify this node as whichever host entry
    /// listens on that port, resolve `master_address` against `hosts`, and
    /// return the ready driver context. `master_address == "local"` runs
    /// single-node, always master.
    pub fn new(hosts: Vec<HostInfo>, master_address: &str, listen_port: u16) -> Result<Self> {
        let self_index = hosts
            .iter()
            .position(|host| host.listen_port == listen_port)
            .ok_or_else(|| ShoalError::IllegalArgument(format!("no host entry listens on port {listen_port}")))?;
        let master_index = if master_address == "local" {
            self_index
        } else {
            hosts
                .iter()
                .position(|host| host.address == master_address)
                .ok_or_else(|| ShoalError::IllegalArgument(format!("master address {master_address:?} not present in host list")))?
        };

        let dispatch = Arc::new(JobDispatch::new());
        match Listener::start(listen_port, dispatch.clone()) {
            ListenStatus::Success => {}
            ListenStatus::Failure => return Err(ShoalError::PortInUse(listen_port)),
            ListenStatus::NotAttempted => unreachable!("Listener::start always attempts the bind"),
        }

        Ok(Self {
            hosts,
            self_index,
            master_index,
            next_job_id: AtomicU64::new(1),
            dispatch,
            sticky: Mutex::new(Vec::new()),
        })
    }

    pub fn is_master(&self) -> bool {
        self.self_index == self.master_index
    }

    pub fn hosts(&self) -> &[HostInfo] {
        &self.hosts
    }

    fn next_job_id(&self) -> JobId {
        self.next_job_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Build a source RDD by slicing `seq` into `num_slices` balanced
    /// partitions.
    pub fn parallelize<T: Numeric + Send + Sync + 'static>(&self, seq: IteratorSeq<T>, num_slices: usize) -> Rdd<T> {
        ParallelArray::new(seq, num_slices)
    }

    /// Pin `rdd` so it outlives the action that created it; released only
    /// when this driver context is dropped.
    pub fn keep<T: Clone + Send + Sync + 'static>(&self, rdd: &Rdd<T>) {
        rdd.set_sticky(true);
        self.sticky.lock().expect("sticky registry lock poisoned").push(Box::new(rdd.clone()));
    }

    /// Allocate a fresh job id, attach a scheduler to the dispatch table for
    /// its duration, run it, and detach. The only entry point through which
    /// tasks reach the scheduler.
    pub fn run_tasks<T>(&self, tasks: Vec<Task<T>>) -> Vec<TaskResult<T>>
    where
        T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let job_id = self.next_job_id();
        let tasks: Vec<Task<T>> = tasks
            .into_iter()
            .map(|task| Task {
                job_id,
                ..task
            })
            .collect();
        let scheduler = Arc::new(Scheduler::new(job_id, self.hosts.clone(), self.self_index, self.master_index, tasks));
        self.dispatch.register(job_id, scheduler.clone());
        let results = scheduler.run_tasks();
        self.dispatch.deregister(job_id);
        results
    }

    /// Action: materialize every partition and return their concatenation.
    pub fn collect<T>(&self, rdd: &Rdd<T>) -> Vec<T>
    where
        T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let tasks = (0..rdd.num_partitions())
            .map(|index| Task::new(0, index as TaskId, rdd.clone(), index, Operation::Collect))
            .collect();
        self.run_tasks(tasks).into_iter().flat_map(|result| result.values).collect()
    }

    /// Action: reduce every partition locally with `r`, then fold the
    /// per-partition results together at the driver. An empty RDD produces
    /// `None` with a warning rather than a default value.
    pub fn reduce<T, F>(&self, rdd: &Rdd<T>, r: F) -> Option<T>
    where
        T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        let combiner: Arc<dyn Fn(T, T) -> T + Send + Sync> = Arc::new(r);
        let tasks: Vec<Task<T>> = (0..rdd.num_partitions())
            .map(|index| Task::new(0, index as TaskId, rdd.clone(), index, Operation::Reduce(Arc::clone(&combiner))))
            .collect();
        let partials: Vec<T> = self.run_tasks(tasks).into_iter().flat_map(|result| result.values).collect();
        let mut iter = partials.into_iter();
        match iter.next() {
            None => {
                tracing::warn!("reduce over an empty RDD; no value to return");
                None
            }
            Some(first) => Some(iter.fold(first, |acc, value| combiner(acc, value))),
        }
    }

    /// Release every sticky RDD this context is holding. The listener
    /// thread is daemon-style and exits with the process.
    pub fn shutdown(self) {
        self.sticky.lock().expect("sticky registry lock poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_job::iter_seq::IteratorSeq;

    fn host(address: &str, port: u16) -> HostInfo {
        HostInfo {
            address: address.to_string(),
            threads: 2,
            memory: 1024,
            listen_port: port,
        }
    }

    #[test]
    fn single_node_context_is_its_own_master() {
        let hosts = vec![host("only", 17000)];
        let ctx = DriverContext::new(hosts, "local", 17000).expect("listener bind should succeed");
        assert!(ctx.is_master());
    }

    #[test]
    fn unmatched_listen_port_is_an_illegal_argument() {
        let hosts = vec![host("h1", 17001)];
        let err = DriverContext::new(hosts, "local", 19999).unwrap_err();
        assert!(matches!(err, ShoalError::IllegalArgument(_)));
    }

    #[test]
    fn collect_and_reduce_round_trip_through_a_single_node_job() {
        let hosts = vec![host("only", 17003)];
        let ctx = DriverContext::new(hosts, "local", 17003).expect("listener bind should succeed");
        let rdd = ctx.parallelize(IteratorSeq::range(1i64, 100, 1), 4);
        let sum = ctx.reduce(&rdd, |a, b| a + b);
        assert_eq!(sum, Some(5050));

        let mut collected = ctx.collect(&rdd);
        collected.sort();
        assert_eq!(collected, (1..=100).collect::<Vec<_>>());
    }

    #[test]
    fn sticky_rdd_survives_keep() {
        let hosts = vec![host("only", 17004)];
        let ctx = DriverContext::new(hosts, "local", 17004).expect("listener bind should succeed");
        let rdd = ctx.parallelize(IteratorSeq::range(1i64, 10, 1), 1);
        assert!(!rdd.is_sticky());
        ctx.keep(&rdd);
        assert!(rdd.is_sticky());
    }
}
