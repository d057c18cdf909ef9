//! The `Tool` trait and the result envelope returned by every invocation.

use serde::Serialize;

/// Structured outcome of one tool invocation.
///
/// Exactly one of `output` / `error` is populated, matching `success`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolFailure>,
}

/// Failure half of the envelope: human message plus a stable error-kind tag
/// the host can branch on.
#[derive(Debug, Clone, Serialize)]
pub struct ToolFailure {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ToolResult {
    pub fn ok(output: serde_json::Value) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
        }
    }

    pub fn fail(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(ToolFailure {
                message: message.into(),
                kind: kind.into(),
            }),
        }
    }
}

/// Trait implemented by all invocable tools.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name for routing and discovery.
    fn name(&self) -> &str;

    /// Human-readable description shown to the host's planner.
    fn description(&self) -> &str;

    /// Executes the tool with the given input mapping.
    ///
    /// Implementations map every internal failure into the envelope; this
    /// signature is deliberately infallible.
    async fn execute(&self, input: serde_json::Value) -> ToolResult;
}
