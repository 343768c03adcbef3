//! Agent categories and the task-type routing table.

use super::ParseAgentCategoryError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Class of worker agent a task is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentCategory {
    /// Manages agent personas.
    PersonaManager,
    /// Executes general tasks.
    TaskExecutor,
    /// Renders templates.
    TemplateProcessor,
    /// Reviews and validates output.
    QualityAssurance,
    /// Coordinates multi-step workflows.
    WorkflowCoordinator,
}

impl AgentCategory {
    /// Every category, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::PersonaManager,
        Self::TaskExecutor,
        Self::TemplateProcessor,
        Self::QualityAssurance,
        Self::WorkflowCoordinator,
    ];

    /// Returns the canonical tag for this category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PersonaManager => "persona_manager",
            Self::TaskExecutor => "task_executor",
            Self::TemplateProcessor => "template_processor",
            Self::QualityAssurance => "quality_assurance",
            Self::WorkflowCoordinator => "workflow_coordinator",
        }
    }
}

impl fmt::Display for AgentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AgentCategory {
    type Error = ParseAgentCategoryError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| ParseAgentCategoryError(value.to_owned()))
    }
}

const DEFAULT_ROUTES: [(&str, AgentCategory); 5] = [
    ("persona_management", AgentCategory::PersonaManager),
    ("task_execution", AgentCategory::TaskExecutor),
    ("template_processing", AgentCategory::TemplateProcessor),
    ("quality_assurance", AgentCategory::QualityAssurance),
    ("workflow_coordination", AgentCategory::WorkflowCoordinator),
];

/// Maps task types to agent categories.
///
/// Unknown task types resolve to the fallback category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    routes: HashMap<String, AgentCategory>,
    fallback: AgentCategory,
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self {
            routes: DEFAULT_ROUTES
                .into_iter()
                .map(|(task_type, category)| (task_type.to_owned(), category))
                .collect(),
            fallback: AgentCategory::TaskExecutor,
        }
    }
}

impl RoutingTable {
    /// Adds or replaces the route for `task_type`.
    #[must_use]
    pub fn with_route(mut self, task_type: &str, category: AgentCategory) -> Self {
        self.routes
            .insert(task_type.trim().to_ascii_lowercase(), category);
        self
    }

    /// Sets the category used for unrouted task types.
    #[must_use]
    pub const fn with_fallback(mut self, fallback: AgentCategory) -> Self {
        self.fallback = fallback;
        self
    }

    /// Returns the fallback category.
    #[must_use]
    pub const fn fallback(&self) -> AgentCategory {
        self.fallback
    }

    /// Resolves the category for a task type.
    #[must_use]
    pub fn category_for(&self, task_type: &str) -> AgentCategory {
        self.routes
            .get(task_type.trim().to_ascii_lowercase().as_str())
            .copied()
            .unwrap_or(self.fallback)
    }
}
