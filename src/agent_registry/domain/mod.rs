//! Domain model for agent registration and liveness.
//!
//! All infrastructure concerns are kept outside the domain boundary; the
//! record type only knows how to map itself to and from hash fields.

mod error;
mod ids;
mod record;
mod status;

pub use error::{AgentDomainError, ParseAgentStatusError};
pub use ids::{AgentId, AgentType};
pub use record::AgentRecord;
pub use status::AgentStatus;
