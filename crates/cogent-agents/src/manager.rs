use crate::agent::Agent;
use crate::types::{AgentTask, TaskSpec};
use cogent_core::{CogentError, CogentResult, EventBus};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

/// An agent stops being eligible for new work once this many tasks wait in
/// its queue.
pub const MAX_QUEUE_DEPTH: usize = 5;

/// Capability-match bonus in assignment scoring.
const CAPABILITY_BONUS: i64 = 10;
/// Penalty per queued task.
const QUEUE_PENALTY: i64 = 2;
/// Experience bonus for learning agents with enough episodic history.
const EXPERIENCE_BONUS: i64 = 5;
/// Episodic records required before the experience bonus applies.
const EXPERIENCE_THRESHOLD: usize = 10;

/// Owns the agent pool: scores and assigns incoming tasks, tracks which
/// agent owns which task, and drives the worker loops.
///
/// Construct it explicitly and hand it the shared event bus; there is no
/// global instance. Call [`AgentManager::start`] to spawn the worker loops
/// and [`AgentManager::shutdown`] to abort them.
pub struct AgentManager {
    agents: Vec<Arc<Agent>>,
    assignments: RwLock<HashMap<Uuid, Uuid>>,
    handles: parking_lot::Mutex<Vec<JoinHandle<()>>>,
    events: EventBus,
}

impl AgentManager {
    /// Creates an empty manager publishing on `events`.
    pub fn new(events: EventBus) -> Self {
        Self {
            agents: Vec::new(),
            assignments: RwLock::new(HashMap::new()),
            handles: parking_lot::Mutex::new(Vec::new()),
            events,
        }
    }

    /// Adds an agent to the pool. Registration order is the tiebreak order
    /// for assignment scoring, so register the preferred default agents
    /// first.
    pub fn register(&mut self, agent: Agent) -> Uuid {
        let agent = Arc::new(agent);
        let id = agent.id();
        info!(agent_id = %id, name = %agent.config().name, "Agent registered");
        self.agents.push(agent);
        id
    }

    /// The shared event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Registered agents in registration order.
    pub fn agents(&self) -> &[Arc<Agent>] {
        &self.agents
    }

    /// Routes a task to an agent and returns the new task's id.
    ///
    /// A known `preferred` agent receives the task unconditionally,
    /// bypassing scoring. Otherwise every agent with queue depth below
    /// [`MAX_QUEUE_DEPTH`] is scored and the strict maximum wins; on a tie
    /// the first-registered agent keeps it. With no eligible agent the
    /// task is rejected with [`CogentError::NoSuitableAgent`].
    pub async fn assign_task(
        &self,
        spec: TaskSpec,
        preferred: Option<Uuid>,
    ) -> CogentResult<Uuid> {
        let agent = match preferred.and_then(|id| self.agents.iter().find(|a| a.id() == id)) {
            Some(agent) => agent,
            None => self.select_agent(&spec.task_type).await?,
        };

        let task = AgentTask::from_spec(spec);
        let task_id = task.id;
        self.assignments.write().insert(task_id, agent.id());
        agent.enqueue(task).await;
        debug!(%task_id, agent_id = %agent.id(), "Task assigned");
        Ok(task_id)
    }

    async fn select_agent(&self, task_type: &str) -> CogentResult<&Arc<Agent>> {
        let mut best: Option<(&Arc<Agent>, i64)> = None;
        for agent in &self.agents {
            let pending = agent.pending_count().await;
            if pending >= MAX_QUEUE_DEPTH {
                continue;
            }
            let score = score_agent(agent, task_type, pending, agent.episodic_len().await);
            // Strict comparison keeps the first-registered agent on ties.
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((agent, score));
            }
        }
        best.map(|(agent, _)| agent).ok_or_else(|| {
            CogentError::NoSuitableAgent(format!(
                "no agent with queue depth below {MAX_QUEUE_DEPTH} for task type '{task_type}'"
            ))
        })
    }

    /// Current state of a task and the agent that owns it.
    pub async fn task_status(&self, task_id: Uuid) -> Option<(AgentTask, Uuid)> {
        let agent_id = *self.assignments.read().get(&task_id)?;
        let agent = self.agents.iter().find(|a| a.id() == agent_id)?;
        let task = agent.task_snapshot(task_id).await?;
        Some((task, agent_id))
    }

    /// Cancels a pending task. Returns false when the task is unknown,
    /// already claimed, or terminal.
    pub async fn cancel_task(&self, task_id: Uuid) -> bool {
        let Some(agent_id) = self.assignments.read().get(&task_id).copied() else {
            return false;
        };
        match self.agents.iter().find(|a| a.id() == agent_id) {
            Some(agent) => agent.cancel(task_id).await,
            None => false,
        }
    }

    /// Spawns one worker loop per registered agent.
    pub fn start(&self) {
        let mut handles = self.handles.lock();
        for agent in &self.agents {
            let agent = agent.clone();
            handles.push(tokio::spawn(agent.run()));
        }
        info!(agents = self.agents.len(), "Agent manager started");
    }

    /// Aborts every worker loop. In-flight provider calls are dropped at
    /// the next await point.
    pub fn shutdown(&self) {
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
        info!("Agent manager stopped");
    }
}

fn score_agent(agent: &Agent, task_type: &str, pending: usize, episodic: usize) -> i64 {
    let task_type = task_type.to_lowercase();
    let capability_match = agent
        .config()
        .capabilities
        .iter()
        .any(|c| c.enabled && task_type.contains(&c.name.to_lowercase()));

    let mut score = 0;
    if capability_match {
        score += CAPABILITY_BONUS;
    }
    score -= QUEUE_PENALTY * pending as i64;
    if agent.config().learning_enabled && episodic > EXPERIENCE_THRESHOLD {
        score += EXPERIENCE_BONUS;
    }
    score
}
