use crate::memory::AgentMemory;
use crate::types::{AgentStep, StepStatus};
use cogent_core::{CogentError, CogentResult, Event, EventBus};
use cogent_llm::GenerationOrchestrator;
use cogent_tools::ToolRegistry;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Pseudo-tool name routing a step to the orchestrator instead of the
/// registry.
pub const REASONING_TOOL: &str = "reasoning";

/// Executes single steps: resolves the tool (or the reasoning pseudo-tool),
/// runs it, and records timing, status, and memory updates.
///
/// Every execution is recorded into the agent's memory, success or failure,
/// so the long-term pattern statistics see the full picture.
pub struct StepExecutor {
    orchestrator: Arc<GenerationOrchestrator>,
    tools: Arc<ToolRegistry>,
    events: EventBus,
}

impl StepExecutor {
    /// Creates an executor over the shared orchestrator and tool registry.
    pub fn new(
        orchestrator: Arc<GenerationOrchestrator>,
        tools: Arc<ToolRegistry>,
        events: EventBus,
    ) -> Self {
        Self {
            orchestrator,
            tools,
            events,
        }
    }

    /// The registry this executor resolves tools against.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Runs one step in place, mutating its status, output, and timing
    /// fields. Returns the step's error, if any, after recording it.
    ///
    /// The memory lock is taken only for the outcome recording, never across
    /// the tool or provider call, so concurrent readers (assignment scoring)
    /// are not held up by a slow step.
    pub async fn execute(
        &self,
        step: &mut AgentStep,
        task_id: Uuid,
        task_type: &str,
        memory: &Mutex<AgentMemory>,
    ) -> CogentResult<()> {
        step.status = StepStatus::InProgress;
        self.events.publish(Event::StepStarted {
            task_id,
            step_id: step.id,
        });
        debug!(%task_id, step_id = %step.id, tool = %step.tool, "Executing step");

        let started = Instant::now();
        let result = self.run_step(step).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        step.duration_ms = Some(duration_ms);

        let context = json!({
            "tool": step.tool,
            "description": step.description,
            "duration_ms": duration_ms,
        });

        match result {
            Ok(output) => {
                step.status = StepStatus::Completed;
                step.output = Some(output);
                memory
                    .lock()
                    .await
                    .record_step_outcome(&step.tool, task_type, true, duration_ms, context);
                self.events.publish(Event::StepCompleted {
                    task_id,
                    step_id: step.id,
                });
                Ok(())
            }
            Err(err) => {
                step.status = StepStatus::Failed;
                step.output = Some(json!({ "error": err.to_string() }));
                memory
                    .lock()
                    .await
                    .record_step_outcome(&step.tool, task_type, false, duration_ms, context);
                warn!(%task_id, step_id = %step.id, error = %err, "Step failed");
                self.events.publish(Event::StepFailed {
                    task_id,
                    step_id: step.id,
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn run_step(&self, step: &mut AgentStep) -> CogentResult<serde_json::Value> {
        if step.tool == REASONING_TOOL {
            let prompt = match &step.input {
                Some(input) if !input.is_null() => {
                    format!("{}\n\nInput:\n{}", step.description, input)
                }
                _ => step.description.clone(),
            };
            let reply = self.orchestrator.complex_reasoning(&prompt, None).await?;
            step.reasoning = Some(reply.content.clone());
            step.confidence = Some(reply.confidence);
            return Ok(json!({
                "text": reply.content,
                "provider": reply.provider,
            }));
        }

        let tool = self
            .tools
            .get(&step.tool)
            .ok_or_else(|| CogentError::ToolNotFound(step.tool.clone()))?;
        let params = step.input.clone().unwrap_or(serde_json::Value::Null);
        tool.execute(params).await
    }
}
