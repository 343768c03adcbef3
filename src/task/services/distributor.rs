//! Greedy least-loaded task assignment.
//!
//! The distributor owns its worker table and overflow list outright and is
//! mutated through `&mut self`; callers that need sharing wrap it in their
//! own lock.

use crate::agent_registry::domain::AgentId;
use crate::task::domain::{AgentCategory, RoutingTable, Task, TaskId, Worker, WorkerStatus};
use thiserror::Error;

/// Errors returned by [`TaskDistributor`] bookkeeping calls.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDistributionError {
    /// No worker is registered under the agent id.
    #[error("unknown worker: {0}")]
    UnknownWorker(AgentId),

    /// A worker is already registered under the agent id.
    #[error("worker already registered: {0}")]
    DuplicateWorker(AgentId),

    /// The task is not in the worker's queue.
    #[error("task {task_id} is not queued on worker {agent_id}")]
    TaskNotQueued {
        /// Worker that was asked to complete the task.
        agent_id: AgentId,
        /// Task that was not found.
        task_id: TaskId,
    },
}

/// Outcome of distributing one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentResult {
    /// The task was queued on a worker.
    Assigned {
        /// Task that was assigned.
        task_id: TaskId,
        /// Worker that received it.
        agent_id: AgentId,
    },
    /// No eligible worker existed; the task went to the overflow list.
    Queued {
        /// Task that was parked.
        task_id: TaskId,
        /// Category that had no eligible worker.
        category: AgentCategory,
    },
}

impl AssignmentResult {
    /// Returns the task this result is about.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        match self {
            Self::Assigned { task_id, .. } | Self::Queued { task_id, .. } => *task_id,
        }
    }

    /// Returns the chosen worker when the task was assigned.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<&AgentId> {
        match self {
            Self::Assigned { agent_id, .. } => Some(agent_id),
            Self::Queued { .. } => None,
        }
    }
}

/// Point-in-time view of one worker's load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadEntry {
    /// Worker agent id.
    pub agent_id: AgentId,
    /// Worker category.
    pub category: AgentCategory,
    /// Worker status.
    pub status: WorkerStatus,
    /// Tasks currently queued on the worker.
    pub queued: usize,
}

/// In-memory greedy load balancer.
#[derive(Debug, Clone, Default)]
pub struct TaskDistributor {
    routing: RoutingTable,
    workers: Vec<Worker>,
    overflow: Vec<Task>,
}

impl TaskDistributor {
    /// Creates a distributor with the given routing table and no workers.
    #[must_use]
    pub const fn new(routing: RoutingTable) -> Self {
        Self {
            routing,
            workers: Vec::new(),
            overflow: Vec::new(),
        }
    }

    /// Returns the routing table.
    #[must_use]
    pub const fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    /// Adds an idle worker.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDistributionError::DuplicateWorker`] when the agent is
    /// already registered.
    pub fn register_worker(
        &mut self,
        agent_id: AgentId,
        category: AgentCategory,
    ) -> Result<(), TaskDistributionError> {
        if self.worker(&agent_id).is_some() {
            return Err(TaskDistributionError::DuplicateWorker(agent_id));
        }
        tracing::debug!(agent_id = %agent_id, category = %category, "worker registered");
        self.workers.push(Worker::new(agent_id, category));
        Ok(())
    }

    /// Overrides a worker's status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDistributionError::UnknownWorker`] when the agent is not
    /// registered.
    pub fn set_worker_status(
        &mut self,
        agent_id: &AgentId,
        status: WorkerStatus,
    ) -> Result<(), TaskDistributionError> {
        self.worker_mut(agent_id)?.set_status(status);
        Ok(())
    }

    /// Assigns `task` to the least-loaded eligible worker of its category,
    /// or parks it on the overflow list.
    ///
    /// Eligible workers are those in the task's category whose status is
    /// active or idle. Ties go to the earliest registered worker; callers
    /// must not rely on that. An overflowed task is never retried
    /// automatically; see [`Self::redistribute_overflow`].
    pub fn distribute(&mut self, task: Task) -> AssignmentResult {
        let category = self.routing.category_for(task.task_type());
        let task_id = task.id();

        let chosen = self
            .workers
            .iter_mut()
            .filter(|worker| worker.is_eligible_for(category))
            .min_by_key(|worker| worker.queued());

        if let Some(worker) = chosen {
            let agent_id = worker.agent_id().clone();
            tracing::debug!(
                task_id = %task_id,
                task_type = %task.task_type(),
                agent_id = %agent_id,
                "task assigned"
            );
            worker.assign(task);
            return AssignmentResult::Assigned { task_id, agent_id };
        }

        tracing::info!(
            task_id = %task_id,
            task_type = %task.task_type(),
            category = %category,
            "no eligible worker; task moved to overflow"
        );
        self.overflow.push(task);
        AssignmentResult::Queued { task_id, category }
    }

    /// Removes a finished task from a worker's queue.
    ///
    /// A busy worker whose queue empties becomes idle again.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDistributionError::UnknownWorker`] or
    /// [`TaskDistributionError::TaskNotQueued`].
    pub fn complete_task(
        &mut self,
        agent_id: &AgentId,
        task_id: TaskId,
    ) -> Result<Task, TaskDistributionError> {
        self.worker_mut(agent_id)?
            .complete(task_id)
            .ok_or_else(|| TaskDistributionError::TaskNotQueued {
                agent_id: agent_id.clone(),
                task_id,
            })
    }

    /// Re-runs distribution over every overflowed task, in arrival order.
    ///
    /// Tasks that still find no worker return to the overflow list.
    pub fn redistribute_overflow(&mut self) -> Vec<AssignmentResult> {
        let pending = std::mem::take(&mut self.overflow);
        pending
            .into_iter()
            .map(|task| self.distribute(task))
            .collect()
    }

    /// Returns the tasks waiting for a worker, oldest first.
    #[must_use]
    pub fn overflow(&self) -> &[Task] {
        &self.overflow
    }

    /// Returns a registered worker.
    #[must_use]
    pub fn worker(&self, agent_id: &AgentId) -> Option<&Worker> {
        self.workers
            .iter()
            .find(|worker| worker.agent_id() == agent_id)
    }

    /// Returns the load of every worker in registration order.
    #[must_use]
    pub fn workload(&self) -> Vec<WorkloadEntry> {
        self.workers
            .iter()
            .map(|worker| WorkloadEntry {
                agent_id: worker.agent_id().clone(),
                category: worker.category(),
                status: worker.status(),
                queued: worker.queued(),
            })
            .collect()
    }

    fn worker_mut(&mut self, agent_id: &AgentId) -> Result<&mut Worker, TaskDistributionError> {
        self.workers
            .iter_mut()
            .find(|worker| worker.agent_id() == agent_id)
            .ok_or_else(|| TaskDistributionError::UnknownWorker(agent_id.clone()))
    }
}
