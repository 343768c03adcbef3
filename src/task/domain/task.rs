//! Task values handed to the distributor.

use super::{TaskDomainError, TaskId};
use crate::message::domain::MessagePriority;
use serde::{Deserialize, Serialize};

/// A unit of work awaiting assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    #[serde(rename = "type")]
    task_type: String,
    name: String,
    priority: MessagePriority,
}

impl Task {
    /// Creates a task with a fresh id.
    ///
    /// The task type is trimmed and lowercased.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskType`] or
    /// [`TaskDomainError::EmptyTaskName`] for blank values.
    pub fn new(
        task_type: impl AsRef<str>,
        name: impl AsRef<str>,
        priority: MessagePriority,
    ) -> Result<Self, TaskDomainError> {
        let normalized_type = task_type.as_ref().trim().to_ascii_lowercase();
        if normalized_type.is_empty() {
            return Err(TaskDomainError::EmptyTaskType);
        }
        let trimmed_name = name.as_ref().trim();
        if trimmed_name.is_empty() {
            return Err(TaskDomainError::EmptyTaskName);
        }
        Ok(Self {
            id: TaskId::new(),
            task_type: normalized_type,
            name: trimmed_name.to_owned(),
            priority,
        })
    }

    /// Returns the task id.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the declared task type.
    #[must_use]
    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    /// Returns the task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> MessagePriority {
        self.priority
    }
}
