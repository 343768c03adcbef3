//! Domain model for task distribution.

mod category;
mod error;
mod ids;
mod task;
mod worker;

pub use category::{AgentCategory, RoutingTable};
pub use error::{ParseAgentCategoryError, ParseWorkerStatusError, TaskDomainError};
pub use ids::TaskId;
pub use task::Task;
pub use worker::{Worker, WorkerStatus};
