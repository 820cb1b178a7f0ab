//! Chat model abstraction.
//!
//! The generator speaks to the model provider through [`ChatModel`], a thin
//! seam carrying system prompt, message list and optional tool schemas one
//! way, and stop reason plus ordered content blocks the other. The OpenAI
//! adapter lives in [`openai`]; tests script the trait directly.

mod openai;

pub use openai::OpenAiChat;

use crate::error::Result;
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde_json::Value;

/// Why the model stopped producing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Ordinary completion.
    EndTurn,
    /// The model requested one or more tool executions.
    ToolUse,
}

/// Message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One ordered content block within a message or response.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text {
        text: String,
    },
    /// A tool invocation requested by the model.
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    /// The result of a tool invocation, keyed by its call id.
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

/// A message in the conversation sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// A user message carrying plain text.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// A user message carrying arbitrary blocks (e.g. tool results).
    pub fn user_blocks(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }

    /// An assistant message echoing the model's own content.
    pub fn assistant_blocks(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }
}

/// A single model invocation.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// System prompt (conversation history is embedded here, not in the
    /// message list).
    pub system: String,
    /// Ordered conversation messages.
    pub messages: Vec<Message>,
    /// Tool schemas offered to the model with tool choice "auto";
    /// None disables tool calling for this invocation.
    pub tools: Option<Vec<ToolDefinition>>,
}

/// The model's reply.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub stop_reason: StopReason,
    pub content: Vec<ContentBlock>,
}

impl ModelResponse {
    /// The first text block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// All tool-use blocks, in order.
    pub fn tool_uses(&self) -> impl Iterator<Item = (&str, &str, &Value)> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, input } => {
                Some((id.as_str(), name.as_str(), input))
            }
            _ => None,
        })
    }
}

/// Trait for chat model providers.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one model invocation. Transport failures propagate as errors;
    /// there is no retry at this layer.
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse>;
}
