use crate::types::{AgentTask, TaskStatus};
use std::cmp::Reverse;
use std::collections::HashMap;
use uuid::Uuid;

/// One agent's task store: the pending queue plus every terminal task ever
/// routed to the agent, retained for status lookups.
///
/// Selection is by priority, FIFO within a tier: each added task gets a
/// monotonic sequence number, and `next_pending` picks the lowest sequence
/// among the highest-priority pending tasks. That makes dequeue order stable
/// and fully deterministic.
pub struct TaskQueue {
    tasks: HashMap<Uuid, AgentTask>,
    seq: HashMap<Uuid, u64>,
    next_seq: u64,
}

impl TaskQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            seq: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Adds a task, assigning its FIFO sequence number.
    pub fn add(&mut self, task: AgentTask) -> Uuid {
        let id = task.id;
        self.seq.insert(id, self.next_seq);
        self.next_seq += 1;
        self.tasks.insert(id, task);
        id
    }

    /// Id of the next task to claim: highest priority first, then earliest
    /// enqueued.
    pub fn next_pending(&self) -> Option<Uuid> {
        self.tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .min_by_key(|t| (Reverse(t.priority), self.seq.get(&t.id).copied().unwrap_or(u64::MAX)))
            .map(|t| t.id)
    }

    /// Removes and returns the next pending task, leaving ownership with the
    /// caller (the agent's current-task slot).
    pub fn claim_next(&mut self) -> Option<AgentTask> {
        let id = self.next_pending()?;
        self.tasks.remove(&id)
    }

    /// Re-inserts a task (typically terminal) so status lookups keep working.
    pub fn store(&mut self, task: AgentTask) {
        self.tasks.insert(task.id, task);
    }

    /// Cancels a task if and only if it is still pending. Terminal and
    /// claimed tasks are untouched.
    pub fn cancel(&mut self, id: Uuid) -> bool {
        match self.tasks.get_mut(&id) {
            Some(task) if task.status == TaskStatus::Pending => {
                task.set_status(TaskStatus::Cancelled);
                true
            }
            _ => false,
        }
    }

    /// Looks a task up by id.
    pub fn get(&self, id: Uuid) -> Option<&AgentTask> {
        self.tasks.get(&id)
    }

    /// Number of pending tasks.
    pub fn pending_count(&self) -> usize {
        self.tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .count()
    }

    /// Total retained tasks, pending or terminal.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the queue retains no tasks at all.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
