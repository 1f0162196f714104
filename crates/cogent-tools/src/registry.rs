use crate::tool::{Tool, ToolDescriptor};
use cogent_core::{Event, EventBus};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Central registry for all available tools.
///
/// Registration order is preserved so descriptor listings (and the planning
/// prompts built from them) are deterministic.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
    events: Option<EventBus>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
            events: None,
        }
    }

    /// Attaches an event bus; subsequent registrations publish
    /// [`Event::ToolRegistered`].
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Registers a tool under its descriptor name. Re-registering a name
    /// replaces the previous tool.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.descriptor().name.clone();
        info!(tool = %name, "Registered tool");
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name.clone());
        }
        if let Some(events) = &self.events {
            events.publish(Event::ToolRegistered { name });
        }
    }

    /// Looks a tool up by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.descriptor())
            .collect()
    }

    /// Registered tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry holds no tools.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cogent_core::CogentResult;
    use async_trait::async_trait;

    struct EchoTool {
        descriptor: ToolDescriptor,
    }

    impl EchoTool {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                descriptor: ToolDescriptor::new(name, "Echoes its input"),
            })
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn descriptor(&self) -> &ToolDescriptor {
            &self.descriptor
        }

        async fn execute(&self, params: serde_json::Value) -> CogentResult<serde_json::Value> {
            Ok(params)
        }
    }

    #[tokio::test]
    async fn register_and_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("echo"));

        let tool = registry.get("echo").unwrap();
        let output = tool
            .execute(serde_json::json!({ "x": 1 }))
            .await
            .unwrap();
        assert_eq!(output["x"], 1);
    }

    #[test]
    fn unknown_name_is_none() {
        let registry = ToolRegistry::new();
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn descriptors_keep_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("beta"));
        registry.register(EchoTool::new("alpha"));
        registry.register(EchoTool::new("gamma"));

        let names: Vec<_> = registry.descriptors().iter().map(|d| d.name.clone()).collect();
        assert_eq!(names, ["beta", "alpha", "gamma"]);
    }

    #[tokio::test]
    async fn registration_publishes_an_event() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let mut registry = ToolRegistry::new().with_events(bus);

        registry.register(EchoTool::new("echo"));

        match rx.recv().await.unwrap() {
            Event::ToolRegistered { name } => assert_eq!(name, "echo"),
            other => panic!("Expected ToolRegistered, got {other:?}"),
        }
    }

    #[test]
    fn reregistering_replaces_without_duplicating_order() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("echo"));
        registry.register(EchoTool::new("echo"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names(), ["echo"]);
    }
}
