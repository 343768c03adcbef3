//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task name is empty after trimming.
    #[error("task name must not be empty")]
    EmptyTaskName,

    /// The task type is empty after trimming.
    #[error("task type must not be empty")]
    EmptyTaskType,
}

/// Error returned while parsing an agent category.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown agent category: {0}")]
pub struct ParseAgentCategoryError(pub String);

/// Error returned while parsing a worker status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown worker status: {0}")]
pub struct ParseWorkerStatusError(pub String);
