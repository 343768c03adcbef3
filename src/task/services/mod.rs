//! Task distribution service.

mod distributor;

pub use distributor::{AssignmentResult, TaskDistributionError, TaskDistributor, WorkloadEntry};
