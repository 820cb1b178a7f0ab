//! Answer generation with tool calling.
//!
//! Runs the model protocol for one user query: a first call offering the
//! tool schemas, at most one tool-execution round, then a follow-up call
//! without tools whose first text block is the final answer.

use crate::error::{PensumError, Result};
use crate::llm::{ChatModel, ContentBlock, Message, ModelRequest, ModelResponse, StopReason};
use crate::tools::ToolRegistry;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Static system prompt for the course-materials assistant.
const SYSTEM_PROMPT: &str = "\
You are an AI assistant specialized in course materials and educational content, \
with tools for searching detailed course content and retrieving course outlines.

Tool Usage:
- Use search_course_content for questions about specific course content or detailed educational materials
- Use get_course_outline for questions about a course's structure: its title, link, and complete lesson list
- One tool call per query maximum
- Synthesize tool results into accurate, fact-based responses
- If a tool yields no results, state this clearly without offering alternatives

Response Protocol:
- General knowledge questions: answer using existing knowledge without tools
- Course-specific questions: use the appropriate tool first, then answer
- No meta-commentary: provide direct answers only, without reasoning process or question-type analysis

All responses must be:
1. Brief, Concise and focused - get to the point quickly
2. Educational - maintain instructional value
3. Clear - use accessible language
4. Example-supported - include relevant examples when they help
Provide only the direct answer to what was asked.";

/// Generates answers to user queries, executing tool calls when the model
/// requests them.
pub struct AnswerGenerator {
    model: Arc<dyn ChatModel>,
}

impl AnswerGenerator {
    /// Create a generator over the given chat model.
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Generate an answer for a query, with optional rendered conversation
    /// history and the registry whose tools the model may call.
    #[instrument(skip_all)]
    pub async fn generate(
        &self,
        query: &str,
        conversation_history: Option<&str>,
        registry: &ToolRegistry,
    ) -> Result<String> {
        let system = match conversation_history {
            Some(history) => format!("{}\n\nPrevious conversation:\n{}", SYSTEM_PROMPT, history),
            None => SYSTEM_PROMPT.to_string(),
        };

        let user_message = Message::user_text(query);
        let response = self
            .model
            .complete(ModelRequest {
                system: system.clone(),
                messages: vec![user_message.clone()],
                tools: Some(registry.definitions()),
            })
            .await?;

        let final_response = match response.stop_reason {
            StopReason::EndTurn => response,
            StopReason::ToolUse => {
                self.run_tool_round(system, user_message, response, registry)
                    .await?
            }
        };

        final_response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| PensumError::Generator("Empty response from model".to_string()))
    }

    /// Execute every tool call in the response and re-invoke the model with
    /// the results. Only one round is allowed: the follow-up call carries no
    /// tool schemas, so a second tool request cannot be executed and its
    /// text content, if any, becomes the final answer.
    async fn run_tool_round(
        &self,
        system: String,
        user_message: Message,
        response: ModelResponse,
        registry: &ToolRegistry,
    ) -> Result<ModelResponse> {
        let calls: Vec<(String, String, serde_json::Value)> = response
            .tool_uses()
            .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
            .collect();

        info!("Model requested {} tool call(s)", calls.len());

        // The calls are read-only queries against the same immutable index,
        // so they run concurrently; join_all keeps result order.
        let executions = calls
            .iter()
            .map(|(_, name, input)| registry.execute(name, input));
        let results = join_all(executions).await;

        let tool_results: Vec<ContentBlock> = calls
            .iter()
            .zip(results)
            .map(|((id, name, _), content)| {
                debug!("Tool '{}' returned {} bytes", name, content.len());
                ContentBlock::ToolResult {
                    tool_use_id: id.clone(),
                    content,
                }
            })
            .collect();

        let messages = vec![
            user_message,
            Message::assistant_blocks(response.content),
            Message::user_blocks(tool_results),
        ];

        self.model
            .complete(ModelRequest {
                system,
                messages,
                tools: None,
            })
            .await
    }
}
