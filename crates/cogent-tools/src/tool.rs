use cogent_core::CogentResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Metadata describing a tool's interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name; the discovery key.
    pub name: String,
    /// Human/model-readable description of what the tool does.
    pub description: String,
    /// JSON schema of the parameters `execute` accepts.
    pub parameters_schema: serde_json::Value,
}

impl ToolDescriptor {
    /// Creates a descriptor with an unconstrained parameter schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema: serde_json::json!({ "type": "object" }),
        }
    }

    /// Sets the parameter schema.
    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.parameters_schema = schema;
        self
    }
}

/// Trait all tools implement.
///
/// `execute` receives the step's input as arbitrary JSON and returns
/// arbitrary JSON; validation beyond the schema is the tool's business.
/// Failures surface as errors, which fail the calling step.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's interface metadata.
    fn descriptor(&self) -> &ToolDescriptor;

    /// Runs the tool.
    async fn execute(&self, params: serde_json::Value) -> CogentResult<serde_json::Value>;
}
