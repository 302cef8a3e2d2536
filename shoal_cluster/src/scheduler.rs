//! The task scheduler: per-job placement, bounded local execution, and
//! result aggregation.
//!
//! Since every node runs the identical program against the identical RDD
//! graph and the identical host list, placement never needs to be
//! transmitted: every node computes the same assignment vector locally and
//! independently, and the master's broadcast is implicit.

use serde::de::DeserializeOwned;
use serde::Serialize;
use shoal_common::hostfile::HostInfo;
use shoal_job::task::{JobId, Task, TaskId, TaskResult};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::thread;
use std::time::Duration;

use crate::messaging::{self, Message, MessageType, OnMessage};

pub type HostIndex = usize;

pub(crate) const TASK_RESULT_DELIM: char = '\u{1E}';
const TASK_RESULT_LIST_DELIM: char = '\u{1D}';

/// Read the job id prefix off an `A_TASK_RESULT`/`TASK_RESULT_LIST` payload
/// without decoding the rest, so the driver's dispatch table can route a
/// message to the right job's scheduler before that scheduler ever sees it.
pub(crate) fn extract_job_id(payload: &str) -> Option<JobId> {
    payload.split(TASK_RESULT_DELIM).next()?.parse().ok()
}

/// Lifecycle of one scheduler instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Unarmed,
    Armed,
    Placed,
    Collecting,
    Complete,
    Detached,
}

/// Round-based placement: preferred locations first, then a left-biased
/// fill pass. `threads[i]` is host `i`'s capacity; `preferred_locations[i]`
/// is task `i`'s preferred hosts in order.
///
/// Rounds are sized to `min(remaining, sum(threads))`, so every task
/// admitted into a round is guaranteed a home by the round's end; the
/// fill pass never runs out of capacity mid-round. The fill pass scans for
/// the first host with remaining capacity from index 0 on every
/// assignment, so it is deliberately left-biased rather than round-robin.
pub fn place_tasks(num_tasks: usize, threads: &[usize], preferred_locations: &[Vec<HostIndex>]) -> Vec<HostIndex> {
    if num_tasks == 0 {
        return vec![];
    }
    let total_capacity: usize = threads.iter().sum();
    assert!(total_capacity > 0, "host list must provide at least one thread of capacity");

    let mut assignment: Vec<Option<HostIndex>> = vec![None; num_tasks];
    let mut cursor = 0;
    while cursor < num_tasks {
        let round_len = (num_tasks - cursor).min(total_capacity);
        let mut remain = threads.to_vec();

        for i in cursor..cursor + round_len {
            for &host in &preferred_locations[i] {
                if host < remain.len() && remain[host] > 0 {
                    assignment[i] = Some(host);
                    remain[host] -= 1;
                    break;
                }
            }
        }

        for i in cursor..cursor + round_len {
            if assignment[i].is_some() {
                continue;
            }
            let host = remain
                .iter()
                .position(|&capacity| capacity > 0)
                .expect("a round's fill pass never outruns its own round capacity");
            assignment[i] = Some(host);
            remain[host] -= 1;
        }

        cursor += round_len;
    }

    assignment
        .into_iter()
        .map(|a| a.expect("every task admitted into a round must be placed by its end"))
        .collect()
}

struct Shared<T> {
    state: SchedulerState,
    results: Vec<Option<TaskResult<T>>>,
    received: usize,
}

/// Local execution mode for this node's assigned share of a task batch:
/// a bounded thread pool, or a fork-style mode where each task runs on its
/// own unbounded worker.
///
/// A real `fork(2)` duplicates the calling process's address space,
/// closures included, into a child that runs one task and exits without
/// the parent waiting on it. Rust has no safe, portable equivalent that
/// duplicates an already-running multi-threaded process's memory, so
/// `Fork` is modeled with the closest idiomatic substitute: a detached OS
/// thread per task, unbounded by the pool's thread capacity and not
/// joined by the caller, which reproduces the same "launch and move on,
/// don't wait on this one task" behavior via `std::thread::spawn` instead
/// of `fork`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    ThreadPool,
    Fork,
}

/// Owns one job's task batch, placement, and result aggregation. Registered
/// with the driver's listener dispatch table for the job's duration (see
/// `driver::DriverContext::run_tasks`) so inbound `A_TASK_RESULT` /
/// `TASK_RESULT_LIST` messages reach `handle_message`.
pub struct Scheduler<T> {
    job_id: JobId,
    hosts: Vec<HostInfo>,
    self_index: HostIndex,
    master_index: HostIndex,
    tasks: Vec<Task<T>>,
    execution_mode: ExecutionMode,
    shared: Mutex<Shared<T>>,
    condvar: Condvar,
}

impl<T> Scheduler<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(job_id: JobId, hosts: Vec<HostInfo>, self_index: HostIndex, master_index: HostIndex, tasks: Vec<Task<T>>) -> Self {
        Self::with_execution_mode(job_id, hosts, self_index, master_index, tasks, ExecutionMode::ThreadPool)
    }

    pub fn with_execution_mode(
        job_id: JobId,
        hosts: Vec<HostInfo>,
        self_index: HostIndex,
        master_index: HostIndex,
        tasks: Vec<Task<T>>,
        execution_mode: ExecutionMode,
    ) -> Self {
        let n = tasks.len();
        Self {
            job_id,
            hosts,
            self_index,
            master_index,
            tasks,
            execution_mode,
            shared: Mutex::new(Shared {
                state: SchedulerState::Unarmed,
                results: vec![None; n],
                received: 0,
            }),
            condvar: Condvar::new(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.shared.lock().expect("scheduler lock poisoned").state
    }

    fn is_master(&self) -> bool {
        self.self_index == self.master_index
    }

    fn preferred_host_indices(&self, task: &Task<T>) -> Vec<HostIndex> {
        task.preferred_locations
            .iter()
            .filter_map(|address| self.hosts.iter().position(|host| &host.address == address))
            .collect()
    }

    fn compute_placement(&self) -> Vec<HostIndex> {
        let threads: Vec<usize> = self.hosts.iter().map(|host| host.threads).collect();
        let preferred: Vec<Vec<HostIndex>> = self.tasks.iter().map(|task| self.preferred_host_indices(task)).collect();
        place_tasks(self.tasks.len(), &threads, &preferred)
    }

    /// Place tasks, run this node's share locally in a bounded pool sized to
    /// its own thread capacity, and block until every task's result has been
    /// collected (locally produced, received by message, or delivered in a
    /// `TASK_RESULT_LIST` broadcast).
    pub fn run_tasks(&self) -> Vec<TaskResult<T>> {
        {
            let mut guard = self.shared.lock().expect("scheduler lock poisoned");
            guard.state = SchedulerState::Armed;
        }

        let assignment = self.compute_placement();
        {
            let mut guard = self.shared.lock().expect("scheduler lock poisoned");
            guard.state = SchedulerState::Placed;
        }

        self.execute_local(&assignment);
        self.wait_for_completion();

        let mut guard = self.shared.lock().expect("scheduler lock poisoned");
        guard.state = SchedulerState::Detached;
        guard
            .results
            .iter()
            .cloned()
            .map(|result| result.expect("all results must be present once Complete"))
            .collect()
    }

    fn execute_local(&self, assignment: &[HostIndex]) {
        let my_tasks: Vec<&Task<T>> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(index, _)| assignment[*index] == self.self_index)
            .map(|(_, task)| task)
            .collect();

        match self.execution_mode {
            ExecutionMode::ThreadPool => self.execute_local_thread_pool(my_tasks),
            ExecutionMode::Fork => self.execute_local_fork(my_tasks),
        }
    }

    /// A bounded pool sized to this host's thread capacity; a task waits in
    /// the queue until a worker is free.
    fn execute_local_thread_pool(&self, my_tasks: Vec<&Task<T>>) {
        let capacity = self.hosts[self.self_index].threads.max(1);
        let queue = Mutex::new(VecDeque::from(my_tasks));

        thread::scope(|scope| {
            for _ in 0..capacity {
                scope.spawn(|| loop {
                    let task = queue.lock().expect("local task queue lock poisoned").pop_front();
                    match task {
                        None => break,
                        Some(task) => {
                            let result = task.run();
                            self.finish_task(result);
                        }
                    }
                });
            }
        });
    }

    /// One worker per task, unbounded by host capacity: each task runs in
    /// its own freshly spawned worker (see `ExecutionMode::Fork`'s doc
    /// comment for why a thread stands in for a real forked process here).
    fn execute_local_fork(&self, my_tasks: Vec<&Task<T>>) {
        thread::scope(|scope| {
            for task in my_tasks {
                scope.spawn(|| {
                    let result = task.run();
                    self.finish_task(result);
                });
            }
        });
    }

    /// Serializes the result and either records it directly (master) or
    /// sends a single `A_TASK_RESULT` to the master after a small
    /// randomized delay, to damp synchronized flooding when many workers
    /// finish at once.
    fn finish_task(&self, result: TaskResult<T>) {
        if self.is_master() {
            self.record_result(result);
        } else {
            use rand::Rng;
            let delay_ms = rand::thread_rng().gen_range(0..=500u64);
            thread::sleep(Duration::from_millis(delay_ms));
            let payload = self.encode_entry(&result);
            let master = &self.hosts[self.master_index];
            messaging::send_message(&master.address, master.listen_port, Message::new(MessageType::ATaskResult, payload));
        }
    }

    fn record_result(&self, result: TaskResult<T>) {
        let mut guard = self.shared.lock().expect("scheduler lock poisoned");
        let index = result.task_id as usize;
        if index >= guard.results.len() || guard.results[index].is_some() {
            return;
        }
        guard.results[index] = Some(result);
        guard.received += 1;
        guard.state = SchedulerState::Collecting;
        if guard.received == guard.results.len() {
            guard.state = SchedulerState::Complete;
            self.broadcast_result_list(&guard.results);
            self.condvar.notify_all();
        }
    }

    fn broadcast_result_list(&self, results: &[Option<TaskResult<T>>]) {
        let entries: Vec<String> = results.iter().filter_map(|result| result.as_ref()).map(|result| self.encode_entry(result)).collect();
        let payload = entries.join(&TASK_RESULT_LIST_DELIM.to_string());
        for (index, host) in self.hosts.iter().enumerate() {
            if index == self.self_index {
                continue;
            }
            messaging::send_message(&host.address, host.listen_port, Message::new(MessageType::TaskResultList, payload.clone()));
        }
    }

    fn encode_entry(&self, result: &TaskResult<T>) -> String {
        let serialized = shoal_common::codec::encode(result).expect("TaskResult must serialize");
        format!("{}{TASK_RESULT_DELIM}{}{TASK_RESULT_DELIM}{serialized}", self.job_id, result.task_id)
    }

    fn handle_task_result(&self, payload: &str) {
        let mut parts = payload.splitn(3, TASK_RESULT_DELIM);
        let (Some(job_id_str), Some(_task_id_str), Some(value_str)) = (parts.next(), parts.next(), parts.next()) else {
            tracing::warn!(payload, "malformed A_TASK_RESULT payload; dropping");
            return;
        };
        let Ok(job_id) = job_id_str.parse::<JobId>() else {
            tracing::warn!(payload, "malformed job id in A_TASK_RESULT; dropping");
            return;
        };
        if job_id != self.job_id {
            tracing::debug!(job_id, current = self.job_id, "task result for a different job; requeue expected at the dispatch table");
            return;
        }
        match shoal_common::codec::decode::<TaskResult<T>>(value_str) {
            Ok(result) => self.record_result(result),
            Err(error) => tracing::warn!(%error, "failed to decode task result; dropping"),
        }
    }

    fn handle_task_result_list(&self, payload: &str) {
        let mut guard = self.shared.lock().expect("scheduler lock poisoned");
        for entry in payload.split(TASK_RESULT_LIST_DELIM) {
            if entry.is_empty() {
                continue;
            }
            let mut parts = entry.splitn(3, TASK_RESULT_DELIM);
            let (Some(job_id_str), Some(_task_id_str), Some(value_str)) = (parts.next(), parts.next(), parts.next()) else {
                continue;
            };
            let Ok(job_id) = job_id_str.parse::<JobId>() else { continue };
            if job_id != self.job_id {
                continue;
            }
            if let Ok(result) = shoal_common::codec::decode::<TaskResult<T>>(value_str) {
                let index = result.task_id as usize;
                if index < guard.results.len() {
                    guard.results[index] = Some(result);
                }
            }
        }
        guard.received = guard.results.iter().filter(|result| result.is_some()).count();
        if guard.received == guard.results.len() {
            guard.state = SchedulerState::Complete;
            self.condvar.notify_all();
        }
    }

    fn wait_for_completion(&self) {
        let guard = self.shared.lock().expect("scheduler lock poisoned");
        let _guard = self
            .condvar
            .wait_while(guard, |shared| shared.state != SchedulerState::Complete)
            .expect("scheduler lock poisoned");
    }
}

impl<T> OnMessage for Scheduler<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn on_message(&self, _local_port: u16, _from_host: &str, message: &Message) -> Option<String> {
        match message.message_type {
            MessageType::ATaskResult => self.handle_task_result(&message.payload),
            MessageType::TaskResultList => self.handle_task_result_list(&message.payload),
            // Reserved for a future retransmission protocol; no-ops today.
            MessageType::ResultReneed => tracing::debug!(job_id = self.job_id, "RESULT_RENEED received; retransmission not implemented"),
            MessageType::ResultReneedTotal => {
                tracing::debug!(job_id = self.job_id, "RESULT_RENEED_TOTAL received; retransmission not implemented")
            }
            MessageType::HostResourceInfo | MessageType::FileInfo | MessageType::ShellCommand => {}
        }
        None
    }
}
