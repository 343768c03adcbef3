//! Worker bookkeeping for the distributor.

use super::{AgentCategory, ParseWorkerStatusError, Task, TaskId};
use crate::agent_registry::domain::AgentId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Availability of a worker for new assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    /// Running and accepting work.
    Active,
    /// Running with nothing queued.
    Idle,
    /// Holding an assignment.
    Busy,
    /// Not accepting work.
    Offline,
}

impl WorkerStatus {
    /// Returns the canonical tag for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Idle => "idle",
            Self::Busy => "busy",
            Self::Offline => "offline",
        }
    }

    /// Returns `true` when a worker in this status can take a new task.
    #[must_use]
    pub const fn accepts_work(self) -> bool {
        matches!(self, Self::Active | Self::Idle)
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WorkerStatus {
    type Error = ParseWorkerStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "idle" => Ok(Self::Idle),
            "busy" => Ok(Self::Busy),
            "offline" => Ok(Self::Offline),
            _ => Err(ParseWorkerStatusError(value.to_owned())),
        }
    }
}

/// A worker agent and its local task queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worker {
    agent_id: AgentId,
    category: AgentCategory,
    status: WorkerStatus,
    queue: VecDeque<Task>,
}

impl Worker {
    /// Creates an idle worker with an empty queue.
    #[must_use]
    pub const fn new(agent_id: AgentId, category: AgentCategory) -> Self {
        Self {
            agent_id,
            category,
            status: WorkerStatus::Idle,
            queue: VecDeque::new(),
        }
    }

    /// Returns the worker's agent id.
    #[must_use]
    pub const fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Returns the worker's category.
    #[must_use]
    pub const fn category(&self) -> AgentCategory {
        self.category
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> WorkerStatus {
        self.status
    }

    /// Returns the number of queued tasks.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Returns the queued tasks, oldest first.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.queue.iter()
    }

    /// Returns `true` when the worker belongs to `category` and accepts
    /// work.
    #[must_use]
    pub fn is_eligible_for(&self, category: AgentCategory) -> bool {
        self.category == category && self.status.accepts_work()
    }

    /// Overrides the status.
    pub const fn set_status(&mut self, status: WorkerStatus) {
        self.status = status;
    }

    /// Queues a task and marks the worker busy.
    pub fn assign(&mut self, task: Task) {
        self.queue.push_back(task);
        self.status = WorkerStatus::Busy;
    }

    /// Removes a queued task, returning the worker to idle when its queue
    /// empties while busy.
    pub fn complete(&mut self, task_id: TaskId) -> Option<Task> {
        let position = self.queue.iter().position(|task| task.id() == task_id)?;
        let task = self.queue.remove(position)?;
        if self.queue.is_empty() && self.status == WorkerStatus::Busy {
            self.status = WorkerStatus::Idle;
        }
        Some(task)
    }
}
