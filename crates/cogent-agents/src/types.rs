use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Priority of a task within one agent's queue.
///
/// Variant order matters: derived `Ord` ranks `Low < Medium < High <
/// Critical`, which the queue relies on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Background work.
    Low,
    /// Default priority.
    Medium,
    /// Ahead of routine work.
    High,
    /// Jumps every other tier.
    Critical,
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Queued, not yet claimed by its agent.
    Pending,
    /// Claimed; the agent is executing its steps.
    InProgress,
    /// All steps completed.
    Completed,
    /// A step failed or planning failed.
    Failed,
    /// Cancelled while still pending.
    Cancelled,
}

impl TaskStatus {
    /// Whether the task can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// Lifecycle state of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not yet attempted.
    Pending,
    /// Currently executing.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

/// What a caller submits to [`crate::AgentManager::assign_task`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Free-form task type, matched against agent capabilities.
    pub task_type: String,
    /// What the task should accomplish.
    pub description: String,
    /// Queue priority.
    #[serde(default = "default_priority")]
    pub priority: TaskPriority,
    /// Opaque input payload handed to the steps.
    #[serde(default)]
    pub input: serde_json::Value,
}

fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

impl TaskSpec {
    /// Creates a medium-priority spec with a null input.
    pub fn new(task_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            description: description.into(),
            priority: TaskPriority::Medium,
            input: serde_json::Value::Null,
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the input payload.
    pub fn with_input(mut self, input: serde_json::Value) -> Self {
        self.input = input;
        self
    }
}

/// One unit of work within a task: a tool invocation or an AI-reasoning call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStep {
    /// Unique step id.
    pub id: Uuid,
    /// What this step does.
    pub description: String,
    /// Lifecycle state. Mutated only by the step executor.
    pub status: StepStatus,
    /// Tool name, or `"reasoning"` for an AI call.
    pub tool: String,
    /// Input payload for the tool.
    pub input: Option<serde_json::Value>,
    /// Output payload after execution.
    pub output: Option<serde_json::Value>,
    /// Reasoning text for AI steps.
    pub reasoning: Option<String>,
    /// Confidence of an AI step's answer.
    pub confidence: Option<f32>,
    /// Wall-clock execution time.
    pub duration_ms: Option<u64>,
    /// Step ids that must be `Completed` before this step may start.
    pub dependencies: Vec<Uuid>,
}

impl AgentStep {
    /// Creates a pending step bound to `tool`.
    pub fn new(description: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            status: StepStatus::Pending,
            tool: tool.into(),
            input: None,
            output: None,
            reasoning: None,
            confidence: None,
            duration_ms: None,
            dependencies: Vec::new(),
        }
    }

    /// Sets the input payload.
    pub fn with_input(mut self, input: serde_json::Value) -> Self {
        self.input = Some(input);
        self
    }

    /// Sets the dependency list.
    pub fn with_dependencies(mut self, dependencies: Vec<Uuid>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

/// A task owned by exactly one agent once dequeued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTask {
    /// Unique task id.
    pub id: Uuid,
    /// Free-form type, used in assignment scoring and learning keys.
    pub task_type: String,
    /// What the task should accomplish.
    pub description: String,
    /// Queue priority.
    pub priority: TaskPriority,
    /// Lifecycle state.
    pub status: TaskStatus,
    /// Opaque input payload.
    pub input: serde_json::Value,
    /// Aggregate output on success, error capture on failure.
    pub output: Option<serde_json::Value>,
    /// Steps materialized from the plan at task start.
    pub steps: Vec<AgentStep>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last state change.
    pub updated_at: DateTime<Utc>,
}

impl AgentTask {
    /// Creates a pending task from a submitted spec.
    pub fn from_spec(spec: TaskSpec) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            task_type: spec.task_type,
            description: spec.description,
            priority: spec.priority,
            status: TaskStatus::Pending,
            input: spec.input,
            output: None,
            steps: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets status and bumps `updated_at`.
    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// One planned step before materialization into an [`AgentStep`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedStep {
    /// What the step does.
    pub action: String,
    /// Tool name, or `"reasoning"`.
    pub tool: String,
    /// What the planner expects the step to produce.
    #[serde(default, alias = "expectedOutcome")]
    pub expected_outcome: Option<String>,
    /// Indices of earlier plan steps this step depends on.
    #[serde(default, alias = "dependencies")]
    pub depends_on: Vec<usize>,
}

/// A plan produced once per task; never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentPlan {
    /// The goal the plan serves.
    pub goal: String,
    /// Ordered steps.
    pub steps: Vec<PlannedStep>,
    /// Planner's duration estimate in seconds.
    #[serde(default, alias = "estimatedDuration")]
    pub estimated_duration_secs: u64,
    /// Planner's confidence in the plan.
    #[serde(default = "default_plan_confidence")]
    pub confidence: f32,
    /// Alternative approaches the planner considered.
    #[serde(default)]
    pub alternatives: Option<Vec<String>>,
}

fn default_plan_confidence() -> f32 {
    0.5
}

impl AgentPlan {
    /// The single-step fallback used when planning is disabled: execute the
    /// goal directly as one reasoning call.
    pub fn direct(goal: impl Into<String>) -> Self {
        let goal = goal.into();
        Self {
            steps: vec![PlannedStep {
                action: goal.clone(),
                tool: crate::executor::REASONING_TOOL.to_string(),
                expected_outcome: None,
                depends_on: Vec::new(),
            }],
            goal,
            estimated_duration_secs: 60,
            confidence: default_plan_confidence(),
            alternatives: None,
        }
    }
}

/// A named capability an agent advertises for assignment scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    /// Capability name, substring-matched against task types.
    pub name: String,
    /// Disabled capabilities never score.
    pub enabled: bool,
}

impl Capability {
    /// Creates an enabled capability.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
        }
    }
}

/// Static configuration for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Display name.
    pub name: String,
    /// Advertised capabilities.
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    /// When false, every task runs as a single direct reasoning step.
    #[serde(default = "default_true")]
    pub planning_enabled: bool,
    /// When false, the agent earns no experience bonus in assignment
    /// scoring. Outcomes are still recorded.
    #[serde(default = "default_true")]
    pub learning_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl AgentConfig {
    /// Creates a config with planning and learning enabled and no
    /// capabilities.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: Vec::new(),
            planning_enabled: true,
            learning_enabled: true,
        }
    }

    /// Adds an enabled capability.
    pub fn with_capability(mut self, name: impl Into<String>) -> Self {
        self.capabilities.push(Capability::new(name));
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn priority_order_ranks_critical_highest() {
        assert!(TaskPriority::Critical > TaskPriority::High);
        assert!(TaskPriority::High > TaskPriority::Medium);
        assert!(TaskPriority::Medium > TaskPriority::Low);
    }

    #[test]
    fn task_from_spec_starts_pending() {
        let task = AgentTask::from_spec(TaskSpec::new("content_generation", "write a post"));
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.steps.is_empty());
        assert!(!task.status.is_terminal());
    }

    #[test]
    fn terminal_statuses() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
    }

    #[test]
    fn direct_plan_is_one_reasoning_step() {
        let plan = AgentPlan::direct("summarize the report");
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].tool, "reasoning");
        assert!(plan.steps[0].depends_on.is_empty());
    }

    #[test]
    fn planned_step_accepts_camel_case_aliases() {
        let step: PlannedStep = serde_json::from_str(
            r#"{ "action": "draft", "tool": "reasoning", "expectedOutcome": "a draft", "dependencies": [0] }"#,
        )
        .unwrap();
        assert_eq!(step.expected_outcome.as_deref(), Some("a draft"));
        assert_eq!(step.depends_on, [0]);
    }

    #[test]
    fn task_status_serialization_is_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
