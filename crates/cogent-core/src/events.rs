use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// A lifecycle event published by the orchestration layer.
///
/// Consumers subscribe through [`EventBus::subscribe`]; publishing never
/// blocks and events are dropped when no subscriber keeps up, so events must
/// never carry state the system depends on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A tool was registered into a registry.
    ToolRegistered {
        /// Tool name.
        name: String,
    },
    /// A task was accepted and routed to an agent's queue.
    TaskQueued {
        /// Task id.
        task_id: Uuid,
        /// Owning agent id.
        agent_id: Uuid,
    },
    /// An agent claimed a task and began executing it.
    TaskStarted {
        /// Task id.
        task_id: Uuid,
        /// Owning agent id.
        agent_id: Uuid,
    },
    /// A task reached the completed state.
    TaskCompleted {
        /// Task id.
        task_id: Uuid,
        /// Owning agent id.
        agent_id: Uuid,
    },
    /// A task reached the failed state.
    TaskFailed {
        /// Task id.
        task_id: Uuid,
        /// Owning agent id.
        agent_id: Uuid,
        /// Human-readable failure reason.
        reason: String,
    },
    /// A step began executing.
    StepStarted {
        /// Owning task id.
        task_id: Uuid,
        /// Step id.
        step_id: Uuid,
    },
    /// A step completed successfully.
    StepCompleted {
        /// Owning task id.
        task_id: Uuid,
        /// Step id.
        step_id: Uuid,
    },
    /// A step failed.
    StepFailed {
        /// Owning task id.
        task_id: Uuid,
        /// Step id.
        step_id: Uuid,
        /// Human-readable failure reason.
        reason: String,
    },
}

/// Broadcast bus for [`Event`]s.
///
/// Explicitly constructed and handed to the components that publish on it —
/// there is no global emitter. Cloning shares the underlying channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a bus retaining up to `capacity` undelivered events per
    /// subscriber before the oldest are dropped.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes an event to all current subscribers. A bus with no
    /// subscribers silently drops the event.
    pub fn publish(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Registers a new subscriber receiving events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(Event::ToolRegistered {
            name: "send_email".into(),
        });

        match rx.recv().await.unwrap() {
            Event::ToolRegistered { name } => assert_eq!(name, "send_email"),
            other => panic!("Expected ToolRegistered, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::new(8);
        // Must not panic or block.
        bus.publish(Event::ToolRegistered { name: "noop".into() });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn clones_share_the_channel() {
        let bus = EventBus::new(8);
        let clone = bus.clone();
        let mut rx = bus.subscribe();

        let task_id = Uuid::new_v4();
        let agent_id = Uuid::new_v4();
        clone.publish(Event::TaskQueued { task_id, agent_id });

        match rx.recv().await.unwrap() {
            Event::TaskQueued { task_id: t, .. } => assert_eq!(t, task_id),
            other => panic!("Expected TaskQueued, got {other:?}"),
        }
    }
}
