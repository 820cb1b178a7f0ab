//! Tool capabilities exposed to the model, and the registry that routes
//! named calls to them.
//!
//! Tools never raise: a capability that cannot fulfill a request returns an
//! explanatory string that becomes part of the model's next input. Each
//! execution returns its citations alongside the result text; the registry
//! aggregates them rather than reaching into tool-internal state.

mod outline;
mod search;

pub use outline::OutlineTool;
pub use search::SearchTool;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// A citation pointing at the material a result came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Display label, e.g. "Course Title - Lesson 3".
    pub text: String,
    /// Link to the lesson or course, when known.
    pub url: Option<String>,
}

/// JSON-schema style description of a tool, passed verbatim to the model.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema object describing the input properties.
    pub input_schema: Value,
}

/// Result of one tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Text handed back to the model.
    pub text: String,
    /// Citations produced while answering, drained by the registry.
    pub sources: Vec<Source>,
}

impl ToolOutput {
    /// A result with text and no citations.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }
}

/// An executable capability with a self-describing schema.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Schema given to the model.
    fn definition(&self) -> ToolDefinition;

    /// Execute with keyword arguments parsed from the model's tool call.
    async fn execute(&self, args: &Value) -> ToolOutput;
}

/// Registry mapping tool names to capabilities, in registration order.
///
/// Accumulates the citations produced by executions since the last reset;
/// the orchestrator reads them exactly once per query, then resets.
pub struct ToolRegistry {
    tools: Vec<(String, Arc<dyn Tool>)>,
    pending_sources: Mutex<Vec<Source>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            pending_sources: Mutex::new(Vec::new()),
        }
    }

    /// Register a capability. Re-registering a name overwrites the existing
    /// entry in place, keeping its position.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        if let Some(slot) = self.tools.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = tool;
        } else {
            self.tools.push((name, tool));
        }
    }

    /// Tool schemas in registration order, used verbatim as the model's
    /// tool-list payload.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|(_, t)| t.definition()).collect()
    }

    /// Execute a named tool. An unregistered name yields a descriptive
    /// string rather than an error, preserving conversational recovery.
    pub async fn execute(&self, name: &str, args: &Value) -> String {
        let Some((_, tool)) = self.tools.iter().find(|(n, _)| n == name) else {
            warn!("Model requested unknown tool '{}'", name);
            return format!("Tool '{}' not found", name);
        };

        debug!("Executing tool '{}' with args {}", name, args);
        let output = tool.execute(args).await;

        if !output.sources.is_empty() {
            let mut pending = self.pending_sources.lock().unwrap();
            pending.extend(output.sources);
        }

        output.text
    }

    /// Citations accumulated since the last reset, in execution order.
    pub fn last_sources(&self) -> Vec<Source> {
        self.pending_sources.lock().unwrap().clone()
    }

    /// Clear accumulated citations. Called once per query, after reading,
    /// so nothing leaks into the next query.
    pub fn reset_sources(&self) {
        self.pending_sources.lock().unwrap().clear();
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
