//! Tool-augmented chat orchestration
//!
//! The [`ChatOrchestrator`] drives one chat invocation through a small state
//! machine:
//!
//! 1. `AwaitingModel`: send the conversation and tool definitions to the model
//! 2. `ExecutingTools`: run each requested tool in order, append the results
//!    and go back to 1
//! 3. `Done` when the model answers without tool calls, `Failed` when a
//!    completion call errors
//!
//! Tool rounds are capped by [`ChatConfig::max_tool_rounds`]; when the model
//! keeps asking for tools past the cap the reply is marked `truncated`.

use crate::config::ChatConfig;
use crate::error::{ChatError, Result};
use crate::prompts::{SYSTEM_PROMPT, scoped_message};
use analyst_llm::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, ToolCall, ToolChoice,
};
use analyst_tools::ToolRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Reply used when the round cap hits before the model wrote any text
pub const TRUNCATED_FALLBACK: &str = "I gathered market data but could not finish the analysis \
within the allowed number of tool calls. Please narrow the question and try again.";

/// Outcome of one chat invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Narrative answer, or an apology when the model could not be reached
    pub response: String,
    /// Symbol the chat was scoped to
    pub symbol: Option<String>,
    /// Last result of every tool that ran, keyed by tool name
    pub data: Option<Map<String, Value>>,
    /// Whether the tool loop was cut short
    #[serde(default)]
    pub truncated: bool,
}

/// States of a chat invocation
#[derive(Debug)]
enum ChatState {
    AwaitingModel,
    ExecutingTools {
        text: Option<String>,
        calls: Vec<ToolCall>,
    },
    Done {
        response: String,
        truncated: bool,
    },
    Failed(ChatError),
}

/// Runs the model / tool loop for chat requests
pub struct ChatOrchestrator {
    provider: Arc<dyn LLMProvider>,
    tools: Arc<ToolRegistry>,
    config: ChatConfig,
}

impl ChatOrchestrator {
    pub fn new(provider: Arc<dyn LLMProvider>, tools: Arc<ToolRegistry>, config: ChatConfig) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Answer `message`, optionally scoped to `symbol`, after `history`
    ///
    /// Never fails: a completion fault becomes an apology in
    /// [`ChatReply::response`].
    pub async fn chat(&self, message: &str, symbol: Option<&str>, history: Vec<Message>) -> ChatReply {
        let symbol = symbol.map(str::to_string);

        match self.run(message, symbol.as_deref(), history).await {
            Ok((response, data, truncated)) => ChatReply {
                response,
                symbol,
                data: if data.is_empty() { None } else { Some(data) },
                truncated,
            },
            Err(e) => {
                warn!(error = %e, "Chat failed");
                ChatReply {
                    response: apology(&e),
                    symbol,
                    data: None,
                    truncated: false,
                }
            }
        }
    }

    async fn run(
        &self,
        message: &str,
        symbol: Option<&str>,
        history: Vec<Message>,
    ) -> Result<(String, Map<String, Value>, bool)> {
        let mut conversation = history;
        conversation.push(Message::user(scoped_message(message, symbol)));

        let mut data = Map::new();
        let mut rounds = 0;
        let mut state = ChatState::AwaitingModel;

        loop {
            state = match state {
                ChatState::AwaitingModel => match self.complete(&conversation, rounds).await {
                    Ok(response) => self.next_state(response, rounds),
                    Err(e) => ChatState::Failed(e),
                },
                ChatState::ExecutingTools { text, calls } => {
                    rounds += 1;
                    info!(round = rounds, tool_count = calls.len(), "Executing tool calls");

                    conversation.push(Message::assistant_with_tool_calls(text, calls.clone()));
                    for call in calls {
                        let (result, failed) = match self.dispatch(&call).await {
                            Ok(value) => (value, false),
                            Err(payload) => (payload, true),
                        };
                        let content =
                            serde_json::to_string(&result).unwrap_or_else(|_| result.to_string());
                        conversation.push(if failed {
                            Message::tool_error(call.id, content)
                        } else {
                            Message::tool_result(call.id, content)
                        });
                        data.insert(call.name, result);
                    }
                    ChatState::AwaitingModel
                }
                ChatState::Done {
                    response,
                    truncated,
                } => {
                    info!(rounds, truncated, response_length = response.len(), "Chat completed");
                    return Ok((response, data, truncated));
                }
                ChatState::Failed(e) => return Err(e),
            };
        }
    }

    fn next_state(&self, response: CompletionResponse, rounds: usize) -> ChatState {
        let text = response
            .message
            .text()
            .map(str::to_string)
            .filter(|t| !t.trim().is_empty());
        let calls = response.message.tool_calls();

        if calls.is_empty() {
            return ChatState::Done {
                response: text.unwrap_or_default(),
                truncated: false,
            };
        }

        if rounds >= self.config.max_tool_rounds {
            warn!(
                max_tool_rounds = self.config.max_tool_rounds,
                pending_calls = calls.len(),
                "Tool round limit reached, stopping"
            );
            return ChatState::Done {
                response: text.unwrap_or_else(|| TRUNCATED_FALLBACK.to_string()),
                truncated: true,
            };
        }

        ChatState::ExecutingTools { text, calls }
    }

    async fn complete(&self, conversation: &[Message], rounds: usize) -> Result<CompletionResponse> {
        let mut builder = CompletionRequest::builder(&self.config.model)
            .messages(conversation.to_vec())
            .system(SYSTEM_PROMPT)
            .max_tokens(self.config.max_tokens)
            .tools(self.tools.definitions())
            .tool_choice(ToolChoice::Auto);
        if let Some(t) = self.config.temperature {
            builder = builder.temperature(t);
        }

        debug!(
            iteration = rounds + 1,
            model = %self.config.model,
            message_count = conversation.len(),
            "Sending request to LLM"
        );
        let start = Instant::now();
        let response = self.provider.complete(builder.build()).await?;

        info!(
            iteration = rounds + 1,
            stop_reason = ?response.stop_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            duration_ms = start.elapsed().as_millis() as u64,
            "LLM response received"
        );
        Ok(response)
    }

    /// Run one tool call; failures come back as `Err` with an error payload
    async fn dispatch(&self, call: &ToolCall) -> std::result::Result<Value, Value> {
        let Some(tool) = self.tools.get(&call.name) else {
            warn!(tool_name = %call.name, "Model requested an unknown tool");
            return Err(json!({ "error": format!("Unknown tool: {}", call.name) }));
        };

        let start = Instant::now();
        let result = tool.execute(call.arguments.clone()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(value) => {
                info!(tool_name = %call.name, tool_id = %call.id, duration_ms, "Tool execution succeeded");
                Ok(value)
            }
            Err(e) => {
                warn!(tool_name = %call.name, duration_ms, error = %e, "Tool execution failed");
                Err(json!({ "error": e.to_string() }))
            }
        }
    }
}

/// Caller-facing reply for a failed chat
pub fn apology(error: &ChatError) -> String {
    format!(
        "I apologize, but I encountered an error: {error}. Please check if the language model API key is configured correctly."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedProvider, text_response, tool_response};
    use crate::tools::market_tools;
    use analyst_llm::{ContentBlock, LLMError, MessageContent, Role};
    use analyst_market::{InMemorySource, MarketGateway};

    fn orchestrator(provider: Arc<ScriptedProvider>, config: ChatConfig) -> ChatOrchestrator {
        let source = InMemorySource::new().with_closes("AAPL", &[190.0, 191.5, 193.25]);
        let gateway = MarketGateway::with_default_universe(Arc::new(source));
        let tools = market_tools(&gateway).unwrap();
        ChatOrchestrator::new(provider, Arc::new(tools), config)
    }

    fn call(id: &str, name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }
    }

    #[tokio::test]
    async fn test_plain_answer_makes_one_call() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(text_response("Markets look calm."))]));
        let chat = orchestrator(provider.clone(), ChatConfig::default());

        let reply = chat.chat("How are markets?", None, vec![]).await;

        assert_eq!(reply.response, "Markets look calm.");
        assert!(reply.data.is_none());
        assert!(!reply.truncated);
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_tool_call_then_answer() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_response(vec![call("call_1", "get_stock_info", json!({"symbol": "AAPL"}))])),
            Ok(text_response("AAPL trades at 193.25.")),
        ]));
        let chat = orchestrator(provider.clone(), ChatConfig::default());

        let reply = chat.chat("Price?", Some("AAPL"), vec![]).await;

        assert_eq!(provider.request_count(), 2);
        assert_eq!(reply.response, "AAPL trades at 193.25.");
        assert_eq!(reply.symbol.as_deref(), Some("AAPL"));
        let data = reply.data.unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data["get_stock_info"]["current_price"], 193.25);

        // Second request carries: user, assistant tool call, tool result.
        let second = provider.request(1);
        assert_eq!(second.messages.len(), 3);
        assert_eq!(second.messages[0].text(), Some("[Regarding AAPL] Price?"));
        assert!(second.messages[1].has_tool_calls());
        assert_eq!(second.messages[2].role, Role::Tool);
        assert_eq!(second.system.as_deref(), Some(SYSTEM_PROMPT));
        assert_eq!(second.tool_choice, Some(ToolChoice::Auto));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_recorded_and_loop_completes() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_response(vec![call("c1", "doesnotexist", json!({}))])),
            Ok(text_response("Done anyway.")),
        ]));
        let chat = orchestrator(provider.clone(), ChatConfig::default());

        let reply = chat.chat("hi", None, vec![]).await;

        assert_eq!(reply.response, "Done anyway.");
        let data = reply.data.unwrap();
        assert!(data["doesnotexist"]["error"]
            .as_str()
            .unwrap()
            .contains("Unknown tool"));

        let followup = provider.request(1);
        let Some(MessageContent::Blocks(blocks)) = &followup.messages[2].content else {
            panic!("tool turn should carry result blocks");
        };
        assert!(matches!(
            blocks[0],
            ContentBlock::ToolResult { is_error: Some(true), .. }
        ));
    }

    #[tokio::test]
    async fn test_last_write_wins_for_repeated_tool() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_response(vec![
                call("c1", "get_stock_info", json!({"symbol": "AAPL"})),
                call("c2", "get_stock_info", json!({"symbol": "NOPE"})),
            ])),
            Ok(text_response("ok")),
        ]));
        let chat = orchestrator(provider, ChatConfig::default());

        let reply = chat.chat("compare", None, vec![]).await;
        let data = reply.data.unwrap();
        assert_eq!(data["get_stock_info"]["symbol"], "NOPE");
        assert!(data["get_stock_info"]["error"].is_string());
    }

    #[tokio::test]
    async fn test_invalid_arguments_fed_back_inline() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_response(vec![call("c1", "get_stock_news", json!({"ticker": "AAPL"}))])),
            Ok(text_response("Need a symbol.")),
        ]));
        let chat = orchestrator(provider.clone(), ChatConfig::default());

        let reply = chat.chat("news", None, vec![]).await;
        assert_eq!(reply.response, "Need a symbol.");
        let error = reply.data.unwrap()["get_stock_news"]["error"].clone();
        assert!(error.as_str().unwrap().contains("Invalid parameters"));
    }

    #[tokio::test]
    async fn test_round_cap_truncates() {
        let looping = || {
            Ok(tool_response(vec![call("c", "get_market_indices", json!({}))]))
        };
        let provider = Arc::new(ScriptedProvider::new(vec![looping(), looping(), looping()]));
        let chat = orchestrator(provider.clone(), ChatConfig::default().with_max_tool_rounds(2));

        let reply = chat.chat("loop", None, vec![]).await;

        assert!(reply.truncated);
        assert_eq!(reply.response, TRUNCATED_FALLBACK);
        assert_eq!(provider.request_count(), 3);
        assert!(reply.data.unwrap().contains_key("get_market_indices"));
    }

    #[tokio::test]
    async fn test_completion_failure_becomes_apology() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(LLMError::AuthenticationFailed)]));
        let chat = orchestrator(provider, ChatConfig::default());

        let reply = chat.chat("hi", Some("MSFT"), vec![]).await;

        assert!(reply.response.starts_with("I apologize, but I encountered an error: "));
        assert!(reply.response.contains("Invalid API key"));
        assert_eq!(reply.symbol.as_deref(), Some("MSFT"));
        assert!(reply.data.is_none());
    }

    #[tokio::test]
    async fn test_history_is_sent_before_new_message() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(text_response("Sure."))]));
        let chat = orchestrator(provider.clone(), ChatConfig::default());
        let history = vec![Message::user("Hi"), Message::assistant("Hello!")];

        chat.chat("And now?", None, history).await;

        let request = provider.request(0);
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[1].text(), Some("Hello!"));
        assert_eq!(request.messages[2].text(), Some("And now?"));
    }
}
