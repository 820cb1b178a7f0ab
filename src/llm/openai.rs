//! OpenAI-backed chat model.
//!
//! Translates the internal message model onto chat completions: tool-result
//! blocks become tool-role messages, tool-use blocks become assistant tool
//! calls, and a `ToolCalls` finish reason maps to [`StopReason::ToolUse`].

use super::{ChatModel, ContentBlock, Message, ModelRequest, ModelResponse, Role, StopReason};
use crate::config::GenerationSettings;
use crate::error::{PensumError, Result};
use crate::openai::create_client;
use crate::tools::ToolDefinition;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolChoiceOption, ChatCompletionToolType,
    CreateChatCompletionRequestArgs, FinishReason, FunctionCall, FunctionObject,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Chat model implementation over the OpenAI API.
pub struct OpenAiChat {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiChat {
    /// Create a chat model from generation settings.
    pub fn new(settings: &GenerationSettings) -> Self {
        Self {
            client: create_client(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }

    fn build_messages(request: &ModelRequest) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.clone())
                .build()
                .map_err(|e| PensumError::Generator(e.to_string()))?
                .into(),
        ];

        for message in &request.messages {
            match message.role {
                Role::User => Self::push_user_message(&mut messages, message)?,
                Role::Assistant => Self::push_assistant_message(&mut messages, message)?,
            }
        }

        Ok(messages)
    }

    fn push_user_message(
        messages: &mut Vec<ChatCompletionRequestMessage>,
        message: &Message,
    ) -> Result<()> {
        for block in &message.content {
            match block {
                ContentBlock::Text { text } => {
                    messages.push(
                        ChatCompletionRequestUserMessageArgs::default()
                            .content(text.clone())
                            .build()
                            .map_err(|e| PensumError::Generator(e.to_string()))?
                            .into(),
                    );
                }
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                } => {
                    messages.push(
                        ChatCompletionRequestToolMessageArgs::default()
                            .tool_call_id(tool_use_id.clone())
                            .content(content.clone())
                            .build()
                            .map_err(|e| PensumError::Generator(e.to_string()))?
                            .into(),
                    );
                }
                ContentBlock::ToolUse { .. } => {
                    return Err(PensumError::Generator(
                        "Tool use block in user message".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn push_assistant_message(
        messages: &mut Vec<ChatCompletionRequestMessage>,
        message: &Message,
    ) -> Result<()> {
        let mut text: Option<String> = None;
        let mut tool_calls = Vec::new();

        for block in &message.content {
            match block {
                ContentBlock::Text { text: t } => text = Some(t.clone()),
                ContentBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ChatCompletionMessageToolCall {
                        id: id.clone(),
                        r#type: ChatCompletionToolType::Function,
                        function: FunctionCall {
                            name: name.clone(),
                            arguments: input.to_string(),
                        },
                    });
                }
                ContentBlock::ToolResult { .. } => {
                    return Err(PensumError::Generator(
                        "Tool result block in assistant message".to_string(),
                    ));
                }
            }
        }

        let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
        if let Some(t) = text {
            builder.content(t);
        }
        if !tool_calls.is_empty() {
            builder.tool_calls(tool_calls);
        }
        messages.push(
            builder
                .build()
                .map_err(|e| PensumError::Generator(e.to_string()))?
                .into(),
        );
        Ok(())
    }

    fn to_openai_tool(definition: &ToolDefinition) -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: definition.name.clone(),
                description: Some(definition.description.clone()),
                parameters: Some(definition.input_schema.clone()),
                strict: None,
            },
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    #[instrument(skip(self, request), fields(messages = request.messages.len()))]
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse> {
        let messages = Self::build_messages(&request)?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens);

        if let Some(tools) = &request.tools {
            builder
                .tools(tools.iter().map(Self::to_openai_tool).collect::<Vec<_>>())
                .tool_choice(ChatCompletionToolChoiceOption::Auto);
        }

        let api_request = builder
            .build()
            .map_err(|e| PensumError::Generator(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(api_request)
            .await
            .map_err(|e| PensumError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| PensumError::Generator("No response from model".to_string()))?;

        let mut content = Vec::new();
        if let Some(text) = choice.message.content {
            if !text.is_empty() {
                content.push(ContentBlock::Text { text });
            }
        }

        let mut requested_tools = false;
        if let Some(tool_calls) = choice.message.tool_calls {
            for call in tool_calls {
                requested_tools = true;
                let input = serde_json::from_str(&call.function.arguments)
                    .unwrap_or(serde_json::Value::Null);
                content.push(ContentBlock::ToolUse {
                    id: call.id,
                    name: call.function.name,
                    input,
                });
            }
        }

        let stop_reason =
            if requested_tools || choice.finish_reason == Some(FinishReason::ToolCalls) {
                StopReason::ToolUse
            } else {
                StopReason::EndTurn
            };

        debug!("Model stopped with {:?}", stop_reason);
        Ok(ModelResponse {
            stop_reason,
            content,
        })
    }
}
