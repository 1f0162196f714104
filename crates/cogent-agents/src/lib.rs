//! Autonomous agents: planning, dependency-aware step execution, per-agent
//! memory, and scored multi-agent task assignment.
//!
//! Callers submit work through [`AgentManager::assign_task`]. The manager
//! scores its pool, routes the task to one [`Agent`]'s priority queue, and
//! the agent's worker loop plans the task, executes the plan's steps in
//! order, and records every outcome into its [`AgentMemory`].
//!
//! # Main types
//!
//! - [`AgentManager`] — The pool: assignment scoring, status lookups,
//!   cancellation routing, worker lifecycle.
//! - [`Agent`] — One worker: priority queue, plan-and-execute loop, memory.
//! - [`Planner`] — Task description → validated step plan via a reasoning
//!   call.
//! - [`StepExecutor`] — Runs one step: a registered tool or the
//!   `"reasoning"` pseudo-tool.
//! - [`AgentMemory`] — Short-term scratch, long-term pattern statistics,
//!   bounded episodic log.

/// The per-agent worker.
pub mod agent;
/// Single-step execution.
pub mod executor;
/// Per-agent memory and learning statistics.
pub mod memory;
/// Pool ownership, scoring, and assignment.
pub mod manager;
/// Plan generation and validation.
pub mod planner;
/// The per-agent priority task queue.
pub mod queue;
/// Task, step, plan, and configuration types.
pub mod types;

pub use agent::Agent;
pub use executor::{StepExecutor, REASONING_TOOL};
pub use manager::{AgentManager, MAX_QUEUE_DEPTH};
pub use memory::{AgentMemory, EpisodicRecord, ToolPattern, EPISODIC_CAPACITY};
pub use planner::Planner;
pub use queue::TaskQueue;
pub use types::{
    AgentConfig, AgentPlan, AgentStep, AgentTask, Capability, PlannedStep, StepStatus,
    TaskPriority, TaskSpec, TaskStatus,
};
