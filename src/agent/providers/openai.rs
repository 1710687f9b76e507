//! `OpenAI` provider implementation using the `async-openai` crate.
//!
//! Works against any `OpenAI`-compatible endpoint through the base URL
//! override in [`RagConfig`].

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
    ChatCompletionToolArgs, ChatCompletionToolType, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, CreateChatCompletionResponse, FunctionCall,
    FunctionObjectArgs, ResponseFormat,
};
use async_trait::async_trait;
use tracing::debug;

use crate::agent::message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
use crate::agent::provider::LlmProvider;
use crate::agent::tool::{ToolCall, ToolDefinition};
use crate::config::RagConfig;
use crate::error::AgentError;

/// `OpenAI`-compatible LLM provider.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider").finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    /// Creates a new provider from configuration.
    #[must_use]
    pub fn new(config: &RagConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);
        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }
        Self {
            client: Client::with_config(openai_config),
        }
    }
}

/// Maps an SDK error, keeping the HTTP status when the transport saw one.
fn api_error(err: OpenAIError) -> AgentError {
    let status = match &err {
        OpenAIError::Reqwest(inner) => inner.status().map(|s| s.as_u16()),
        _ => None,
    };
    AgentError::ApiRequest {
        message: err.to_string(),
        status,
    }
}

fn sdk_message(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let message: ChatCompletionRequestMessage = match msg.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(msg.content.as_str())
            .build()?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(msg.content.as_str())
            .build()?
            .into(),
        Role::Assistant => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            // Tool-call turns carry no text
            if !msg.content.is_empty() {
                args.content(msg.content.as_str());
            }
            if !msg.tool_calls.is_empty() {
                args.tool_calls(msg.tool_calls.iter().map(sdk_tool_call).collect::<Vec<_>>());
            }
            args.build()?.into()
        }
        Role::Tool => ChatCompletionRequestToolMessageArgs::default()
            .content(msg.content.as_str())
            .tool_call_id(msg.tool_call_id.clone().unwrap_or_default())
            .build()?
            .into(),
    };
    Ok(message)
}

fn sdk_tool_call(call: &ToolCall) -> ChatCompletionMessageToolCall {
    ChatCompletionMessageToolCall {
        id: call.id.clone(),
        r#type: ChatCompletionToolType::Function,
        function: FunctionCall {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        },
    }
}

fn sdk_tool(definition: &ToolDefinition) -> Result<ChatCompletionTool, OpenAIError> {
    ChatCompletionToolArgs::default()
        .r#type(ChatCompletionToolType::Function)
        .function(
            FunctionObjectArgs::default()
                .name(definition.name.as_str())
                .description(definition.description.as_str())
                .parameters(definition.parameters.clone())
                .build()?,
        )
        .build()
}

/// Translates a provider-agnostic request into the SDK request.
fn build_request(request: &ChatRequest) -> Result<CreateChatCompletionRequest, OpenAIError> {
    let messages = request
        .messages
        .iter()
        .map(sdk_message)
        .collect::<Result<Vec<_>, _>>()?;

    let mut args = CreateChatCompletionRequestArgs::default();
    args.model(request.model.as_str()).messages(messages);
    if let Some(temperature) = request.temperature {
        args.temperature(temperature);
    }
    if let Some(max_tokens) = request.max_tokens {
        args.max_completion_tokens(max_tokens);
    }
    if request.json_mode {
        args.response_format(ResponseFormat::JsonObject);
    }
    if !request.tools.is_empty() {
        args.tools(
            request
                .tools
                .iter()
                .map(sdk_tool)
                .collect::<Result<Vec<_>, _>>()?,
        );
    }
    args.build()
}

/// Reads the first choice of an SDK response.
fn parse_response(response: CreateChatCompletionResponse) -> ChatResponse {
    let usage = response
        .usage
        .map_or_else(TokenUsage::default, |u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

    let Some(choice) = response.choices.into_iter().next() else {
        return ChatResponse {
            content: String::new(),
            usage,
            tool_calls: Vec::new(),
            finish_reason: None,
        };
    };

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| ToolCall {
            id: tc.id,
            name: tc.function.name,
            arguments: tc.function.arguments,
        })
        .collect();

    ChatResponse {
        content: choice.message.content.unwrap_or_default(),
        usage,
        tool_calls,
        finish_reason: choice
            .finish_reason
            .and_then(|reason| serde_json::to_value(reason).ok())
            .and_then(|value| value.as_str().map(str::to_string)),
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        let sdk_request = build_request(request).map_err(api_error)?;
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            json = request.json_mode,
            "sending chat completion"
        );

        let response = self
            .client
            .chat()
            .create(sdk_request)
            .await
            .map_err(api_error)?;
        let response = parse_response(response);
        debug!(
            tool_calls = response.tool_calls.len(),
            total_tokens = response.usage.total_tokens,
            finish_reason = ?response.finish_reason,
            "chat completion received"
        );
        Ok(response)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn request(tools: Vec<ToolDefinition>) -> ChatRequest {
        let mut request = ChatRequest::new(
            "gpt-4o-mini-2024-07-18",
            vec![ChatMessage::user("What is MetaGPT?")],
        );
        request.tools = tools;
        request
    }

    fn convert(msg: &ChatMessage) -> ChatCompletionRequestMessage {
        sdk_message(msg).unwrap_or_else(|e| panic!("conversion failed: {e}"))
    }

    fn build(request: &ChatRequest) -> CreateChatCompletionRequest {
        build_request(request).unwrap_or_else(|e| panic!("build failed: {e}"))
    }

    #[test]
    fn test_convert_each_role() {
        assert!(matches!(
            convert(&ChatMessage::system("sys")),
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(
            convert(&ChatMessage::user("hi")),
            ChatCompletionRequestMessage::User(_)
        ));
        assert!(matches!(
            convert(&ChatMessage::assistant("answer")),
            ChatCompletionRequestMessage::Assistant(_)
        ));
        assert!(matches!(
            convert(&ChatMessage::tool_result("call_123", "MetaGPT uses SOPs")),
            ChatCompletionRequestMessage::Tool(_)
        ));
    }

    #[test]
    fn test_convert_assistant_tool_calls_without_content() {
        let msg = ChatMessage::tool_calls(vec![ToolCall {
            id: "call_1".to_string(),
            name: "vector_tool_metagpt".to_string(),
            arguments: r#"{"query":"datasets","page_numbers":["2"]}"#.to_string(),
        }]);
        let ChatCompletionRequestMessage::Assistant(assistant) = convert(&msg) else {
            panic!("Expected Assistant message");
        };
        assert!(assistant.content.is_none());
        let calls = assistant.tool_calls.unwrap_or_default();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "vector_tool_metagpt");
    }

    #[test]
    fn test_build_request_keeps_zero_temperature() {
        let mut req = request(Vec::new());
        req.temperature = Some(0.0);
        req.max_tokens = Some(256);
        let built = build(&req);
        assert_eq!(built.temperature, Some(0.0));
        assert_eq!(built.max_completion_tokens, Some(256));
        assert!(built.tools.is_none());
        assert!(built.response_format.is_none());
    }

    #[test]
    fn test_build_request_json_mode() {
        let mut req = request(Vec::new());
        req.json_mode = true;
        assert!(matches!(
            build(&req).response_format,
            Some(ResponseFormat::JsonObject)
        ));
    }

    #[test]
    fn test_parse_tool_call_response() {
        let raw = serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "summary_tool_metagpt",
                            "arguments": "{\"input\":\"summary\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls",
                "logprobs": null
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 18, "total_tokens": 138}
        });
        let response: CreateChatCompletionResponse =
            serde_json::from_value(raw).unwrap_or_else(|e| panic!("bad fixture: {e}"));
        let parsed = parse_response(response);
        assert!(parsed.content.is_empty());
        assert_eq!(parsed.tool_calls.len(), 1);
        assert_eq!(parsed.tool_calls[0].name, "summary_tool_metagpt");
        assert_eq!(parsed.finish_reason.as_deref(), Some("tool_calls"));
        assert_eq!(parsed.usage.total_tokens, 138);
    }

    #[test]
    fn test_build_request_with_tools() {
        let built = build(&request(vec![ToolDefinition {
            name: "summary_tool_metagpt".to_string(),
            description: "Useful for summarization questions related to metagpt".to_string(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        }]));
        let tools = built.tools.unwrap_or_default();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].function.name, "summary_tool_metagpt");
        assert!(built.temperature.is_none());
    }
}
