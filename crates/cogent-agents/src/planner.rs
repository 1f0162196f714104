use crate::types::{AgentPlan, AgentTask};
use cogent_core::{CogentError, CogentResult};
use cogent_llm::GenerationOrchestrator;
use cogent_tools::ToolDescriptor;
use std::sync::Arc;
use tracing::debug;

/// Turns a task description into an ordered, dependency-aware plan by asking
/// the generation orchestrator to reason about it.
///
/// The model's reply must be a JSON plan. Parsing goes through a typed serde
/// structure, which doubles as schema validation; a malformed reply fails
/// fast with [`CogentError::Planning`] — there is no reformat retry.
pub struct Planner {
    orchestrator: Arc<GenerationOrchestrator>,
}

impl Planner {
    /// Creates a planner over the shared orchestrator.
    pub fn new(orchestrator: Arc<GenerationOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Produces a plan for `task` given the tools available to the agent.
    pub async fn plan(
        &self,
        task: &AgentTask,
        tools: &[&ToolDescriptor],
    ) -> CogentResult<AgentPlan> {
        let prompt = build_planning_prompt(task, tools);
        let reply = self.orchestrator.complex_reasoning(&prompt, None).await?;

        let plan = parse_plan(&reply.content, &task.description)?;
        validate_plan(&plan, tools)?;

        debug!(
            task_id = %task.id,
            steps = plan.steps.len(),
            confidence = plan.confidence,
            "Plan accepted"
        );
        Ok(plan)
    }
}

fn build_planning_prompt(task: &AgentTask, tools: &[&ToolDescriptor]) -> String {
    let mut tool_lines = String::new();
    for descriptor in tools {
        tool_lines.push_str(&format!("- {}: {}\n", descriptor.name, descriptor.description));
    }

    format!(
        "Decompose the following task into an ordered plan of steps.\n\
         Task type: {}\n\
         Task: {}\n\
         Input: {}\n\n\
         Available tools (use the tool name exactly; use \"reasoning\" for \
         analysis steps with no side effects):\n{}\n\
         Reply with only a JSON object of the form:\n\
         {{\"steps\": [{{\"action\": \"...\", \"tool\": \"...\", \
         \"expectedOutcome\": \"...\", \"dependencies\": [0]}}], \
         \"estimatedDuration\": 120, \"confidence\": 0.8, \
         \"alternatives\": []}}\n\
         \"dependencies\" lists indices of earlier steps that must finish first.",
        task.task_type, task.description, task.input, tool_lines
    )
}

/// Parses the model reply into a plan, tolerating a fenced code block around
/// the JSON.
fn parse_plan(reply: &str, goal: &str) -> CogentResult<AgentPlan> {
    let json = strip_code_fences(reply);

    #[derive(serde::Deserialize)]
    struct RawPlan {
        steps: Vec<crate::types::PlannedStep>,
        #[serde(default, alias = "estimatedDuration")]
        estimated_duration_secs: u64,
        #[serde(default)]
        confidence: Option<f32>,
        #[serde(default)]
        alternatives: Option<Vec<String>>,
    }

    let raw: RawPlan = serde_json::from_str(json)
        .map_err(|e| CogentError::Planning(format!("unparseable plan JSON: {e}")))?;

    Ok(AgentPlan {
        goal: goal.to_string(),
        steps: raw.steps,
        estimated_duration_secs: raw.estimated_duration_secs,
        confidence: raw.confidence.unwrap_or(0.5),
        alternatives: raw.alternatives,
    })
}

fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag ("json") after the opening fence.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_end_matches('`').trim()
}

/// Structural validation beyond what serde enforces.
fn validate_plan(plan: &AgentPlan, tools: &[&ToolDescriptor]) -> CogentResult<()> {
    if plan.steps.is_empty() {
        return Err(CogentError::Planning("plan contained no steps".into()));
    }

    for (index, step) in plan.steps.iter().enumerate() {
        for &dep in &step.depends_on {
            if dep >= index {
                return Err(CogentError::Planning(format!(
                    "step {index} depends on step {dep}, which does not precede it"
                )));
            }
        }
        if step.tool != crate::executor::REASONING_TOOL
            && !tools.iter().any(|d| d.name == step.tool)
        {
            return Err(CogentError::Planning(format!(
                "plan references unknown tool '{}'",
                step.tool
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::PlannedStep;

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, "test tool")
    }

    #[test]
    fn parses_a_plain_json_plan() {
        let reply = r#"{
            "steps": [
                { "action": "research", "tool": "reasoning", "dependencies": [] },
                { "action": "publish", "tool": "publish_post", "dependencies": [0] }
            ],
            "estimatedDuration": 300,
            "confidence": 0.85
        }"#;

        let plan = parse_plan(reply, "write a post").unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.confidence, 0.85);
        assert_eq!(plan.steps[1].depends_on, [0]);
    }

    #[test]
    fn parses_a_fenced_plan() {
        let reply = "```json\n{ \"steps\": [ { \"action\": \"a\", \"tool\": \"reasoning\" } ] }\n```";
        let plan = parse_plan(reply, "goal").unwrap();
        assert_eq!(plan.steps.len(), 1);
    }

    #[test]
    fn prose_reply_is_a_planning_failure() {
        let err = parse_plan("Sure! Here's what I'd do first...", "goal").unwrap_err();
        assert!(matches!(err, CogentError::Planning(_)));
    }

    #[test]
    fn empty_steps_fail_validation() {
        let plan = AgentPlan {
            goal: "g".into(),
            steps: vec![],
            estimated_duration_secs: 0,
            confidence: 0.5,
            alternatives: None,
        };
        assert!(validate_plan(&plan, &[]).is_err());
    }

    #[test]
    fn forward_dependency_fails_validation() {
        let plan = AgentPlan {
            goal: "g".into(),
            steps: vec![
                PlannedStep {
                    action: "first".into(),
                    tool: "reasoning".into(),
                    expected_outcome: None,
                    depends_on: vec![1],
                },
                PlannedStep {
                    action: "second".into(),
                    tool: "reasoning".into(),
                    expected_outcome: None,
                    depends_on: vec![],
                },
            ],
            estimated_duration_secs: 0,
            confidence: 0.5,
            alternatives: None,
        };
        let err = validate_plan(&plan, &[]).unwrap_err();
        assert!(err.to_string().contains("does not precede"));
    }

    #[test]
    fn unknown_tool_fails_validation() {
        let plan = AgentPlan {
            goal: "g".into(),
            steps: vec![PlannedStep {
                action: "send".into(),
                tool: "carrier_pigeon".into(),
                expected_outcome: None,
                depends_on: vec![],
            }],
            estimated_duration_secs: 0,
            confidence: 0.5,
            alternatives: None,
        };
        let known = descriptor("send_email");
        let err = validate_plan(&plan, &[&known]).unwrap_err();
        assert!(err.to_string().contains("carrier_pigeon"));
    }
}
