use crate::executor::StepExecutor;
use crate::memory::AgentMemory;
use crate::planner::Planner;
use crate::queue::TaskQueue;
use crate::types::{
    AgentConfig, AgentPlan, AgentStep, AgentTask, StepStatus, TaskStatus,
};
use cogent_core::{CogentError, CogentResult, Event, EventBus};
use cogent_llm::GenerationOrchestrator;
use cogent_tools::ToolRegistry;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tracing::{error, info, warn};
use uuid::Uuid;

/// An autonomous worker: owns a priority queue of tasks and a private
/// memory, and processes tasks one at a time by planning them and executing
/// the resulting steps in order.
///
/// Agents are driven by [`Agent::run`], a wake-on-enqueue loop spawned by
/// the manager. A task error never terminates the loop; the failure is
/// recorded on the task itself and the loop waits for the next one.
pub struct Agent {
    id: Uuid,
    config: AgentConfig,
    queue: Mutex<TaskQueue>,
    /// Snapshot of the task currently being executed, kept current at step
    /// boundaries so [`Agent::task_snapshot`] can report progress.
    current: parking_lot::Mutex<Option<AgentTask>>,
    memory: Mutex<AgentMemory>,
    notify: Notify,
    planner: Planner,
    executor: StepExecutor,
    events: EventBus,
}

impl Agent {
    /// Creates an idle agent over the shared orchestrator and tool registry.
    pub fn new(
        config: AgentConfig,
        orchestrator: Arc<GenerationOrchestrator>,
        tools: Arc<ToolRegistry>,
        events: EventBus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            queue: Mutex::new(TaskQueue::new()),
            current: parking_lot::Mutex::new(None),
            memory: Mutex::new(AgentMemory::new()),
            notify: Notify::new(),
            planner: Planner::new(orchestrator.clone()),
            executor: StepExecutor::new(orchestrator, tools, events.clone()),
            events,
        }
    }

    /// Unique agent id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The agent's static configuration.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Adds a task to this agent's queue and wakes the run loop.
    pub async fn enqueue(&self, task: AgentTask) -> Uuid {
        let task_id = task.id;
        self.queue.lock().await.add(task);
        self.events.publish(Event::TaskQueued {
            task_id,
            agent_id: self.id,
        });
        self.notify.notify_one();
        task_id
    }

    /// Number of tasks waiting in the queue, used for assignment scoring.
    pub async fn pending_count(&self) -> usize {
        self.queue.lock().await.pending_count()
    }

    /// Retained episodic record count, used for the experience bonus.
    pub async fn episodic_len(&self) -> usize {
        self.memory.lock().await.episodic_len()
    }

    /// Current state of a task this agent owns, if known.
    ///
    /// The in-flight task is served from the progress snapshot; everything
    /// else from the queue's map of pending and finished tasks.
    pub async fn task_snapshot(&self, task_id: Uuid) -> Option<AgentTask> {
        if let Some(task) = self.current.lock().as_ref() {
            if task.id == task_id {
                return Some(task.clone());
            }
        }
        self.queue.lock().await.get(task_id).cloned()
    }

    /// Cancels a pending task. Returns false when the task is unknown or
    /// already claimed; execution is never interrupted.
    pub async fn cancel(&self, task_id: Uuid) -> bool {
        if let Some(task) = self.current.lock().as_ref() {
            if task.id == task_id {
                return false;
            }
        }
        self.queue.lock().await.cancel(task_id)
    }

    /// Runs forever, processing queued tasks as they arrive. Sleeps on the
    /// notify handle when the queue is empty; [`Agent::enqueue`] wakes it.
    pub async fn run(self: Arc<Self>) {
        info!(agent_id = %self.id, name = %self.config.name, "Agent started");
        loop {
            let claimed = self.claim_next().await;
            match claimed {
                Some(task) => {
                    let task_id = task.id;
                    self.process(task).await;
                    info!(agent_id = %self.id, %task_id, "Task finished");
                }
                None => self.notify.notified().await,
            }
        }
    }

    /// Claims the highest-priority pending task, marking it in progress and
    /// publishing the start event. Public so tests can drive the lifecycle
    /// without spawning the run loop.
    pub async fn claim_next(&self) -> Option<AgentTask> {
        let mut task = self.queue.lock().await.claim_next()?;
        task.set_status(TaskStatus::InProgress);
        *self.current.lock() = Some(task.clone());
        self.events.publish(Event::TaskStarted {
            task_id: task.id,
            agent_id: self.id,
        });
        Some(task)
    }

    /// Processes one claimed task end to end: plan, execute, store.
    pub async fn process(&self, mut task: AgentTask) {
        self.memory.lock().await.clear_short_term();

        let result = self.run_task(&mut task).await;
        match result {
            Ok(output) => {
                task.output = Some(output);
                task.set_status(TaskStatus::Completed);
                self.events.publish(Event::TaskCompleted {
                    task_id: task.id,
                    agent_id: self.id,
                });
            }
            Err(err) => {
                error!(agent_id = %self.id, task_id = %task.id, error = %err, "Task failed");
                task.output = Some(json!({ "error": err.to_string() }));
                task.set_status(TaskStatus::Failed);
                self.events.publish(Event::TaskFailed {
                    task_id: task.id,
                    agent_id: self.id,
                    reason: err.to_string(),
                });
            }
        }

        *self.current.lock() = None;
        self.queue.lock().await.store(task);
    }

    async fn run_task(&self, task: &mut AgentTask) -> CogentResult<serde_json::Value> {
        let plan = if self.config.planning_enabled {
            let registry = self.executor.tools();
            self.planner.plan(task, &registry.descriptors()).await?
        } else {
            AgentPlan::direct(&task.description)
        };

        task.steps = materialize_steps(&plan, &task.input);
        *self.current.lock() = Some(task.clone());

        self.execute_steps(task).await?;

        let total_duration_ms: u64 = task
            .steps
            .iter()
            .filter_map(|s| s.duration_ms)
            .sum();
        Ok(json!({
            "steps": task.steps,
            "total_duration_ms": total_duration_ms,
            "plan_confidence": plan.confidence,
        }))
    }

    /// Executes the materialized steps in order, gating each on its
    /// dependencies. A step whose dependency did not complete is never
    /// started; the task fails with the unmet dependency named.
    async fn execute_steps(&self, task: &mut AgentTask) -> CogentResult<()> {
        for index in 0..task.steps.len() {
            let unmet = task.steps[index].dependencies.iter().copied().find(|dep| {
                !task
                    .steps
                    .iter()
                    .any(|s| s.id == *dep && s.status == StepStatus::Completed)
            });
            if let Some(dep) = unmet {
                warn!(
                    agent_id = %self.id,
                    task_id = %task.id,
                    step = index,
                    dependency = %dep,
                    "Dependency unmet, skipping step"
                );
                return Err(CogentError::DependencyUnmet(format!(
                    "step {index} requires step {dep}, which did not complete"
                )));
            }

            // Steps borrow mutably one at a time; the dependency check above
            // only reads.
            let (task_id, task_type) = (task.id, task.task_type.clone());
            self.executor
                .execute(&mut task.steps[index], task_id, &task_type, &self.memory)
                .await?;

            *self.current.lock() = Some(task.clone());
        }
        Ok(())
    }
}

/// Turns planner output into executable steps, resolving index-based
/// dependencies into step ids.
fn materialize_steps(plan: &AgentPlan, input: &serde_json::Value) -> Vec<AgentStep> {
    let mut steps: Vec<AgentStep> = Vec::with_capacity(plan.steps.len());
    for planned in &plan.steps {
        let dependencies = planned
            .depends_on
            .iter()
            .filter_map(|&i| steps.get(i).map(|s: &AgentStep| s.id))
            .collect();
        let mut step = AgentStep::new(&planned.action, &planned.tool)
            .with_input(input.clone())
            .with_dependencies(dependencies);
        if let Some(expected) = &planned.expected_outcome {
            step.description = format!("{} (expected: {expected})", planned.action);
        }
        steps.push(step);
    }
    steps
}
