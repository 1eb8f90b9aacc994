use super::function_tools::{ToolCalls, ToolCallsFuncSpec};
use super::{InferenceParam, LLMBase, Message, role_to_str, str_to_role};
use crate::config::ModelConfig;
use crate::error::Result;
use log::{debug, error};
use reqwest::blocking::Client;
use serde_json::{Value, json};
use std::time::Duration;

pub const DEFAULT_API_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct LLMAPI {
    model_name: String,
    api_endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl LLMAPI {
    /// Create a new LLMAPI instance
    pub fn new(
        model_name: String,
        api_endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            model_name,
            api_endpoint,
            api_key,
            timeout,
        }
    }

    /// Build from a model config-list entry. Endpoint falls back to the
    /// OpenAI chat-completions URL when the entry has no base_url.
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(
            config.model.clone(),
            config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
            config.api_key.clone(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Set custom timeout for requests
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parse tool calls from JSON array
    fn parse_tool_calls(tool_calls_value: &Value) -> Vec<ToolCalls> {
        tool_calls_value
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|tc| {
                        let id = tc.get("id")?.as_str()?.to_string();
                        let type_name = tc.get("type")?.as_str()?.to_string();
                        let func = tc.get("function")?;
                        let name = func.get("name")?.as_str()?.to_string();

                        // Arguments usually arrive as a JSON-encoded string
                        let arguments = func
                            .get("arguments")
                            .and_then(|args| {
                                if args.is_string() {
                                    args.as_str()
                                        .and_then(|s| serde_json::from_str::<Value>(s).ok())
                                } else {
                                    Some(args.clone())
                                }
                            })
                            .unwrap_or(Value::Null);

                        Some(ToolCalls {
                            id,
                            type_name,
                            function: ToolCallsFuncSpec { name, arguments },
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parse API response and extract message
    fn parse_api_message(api_resp: &Value) -> Option<Message> {
        let choices = api_resp.get("choices")?.as_array()?;
        let choice = choices.first()?;
        let msg = choice.get("message")?;

        let role_str = msg.get("role")?.as_str().unwrap_or("assistant");
        let role = str_to_role(role_str);

        let content = msg
            .get("content")
            .and_then(|c| c.as_str())
            .map(|s| s.to_string());
        let tool_calls = msg
            .get("tool_calls")
            .map(Self::parse_tool_calls)
            .unwrap_or_default();

        Some(Message {
            role,
            content,
            tool_calls,
            tool_call_id: None,
        })
    }

    fn build_request_body(&self, param: &InferenceParam) -> Value {
        // Convert internal MessageRole enum to string
        let messages: Vec<Value> = param
            .messages
            .iter()
            .map(|msg| {
                let role_str = role_to_str(&msg.role);

                let mut msg_obj = json!({
                    "role": role_str,
                    "content": msg.content,
                });

                if let Some(ref tool_call_id) = msg.tool_call_id {
                    msg_obj["tool_call_id"] = json!(tool_call_id);
                }

                // Add tool_calls if present
                if !msg.tool_calls.is_empty() {
                    let tool_calls: Vec<_> = msg
                        .tool_calls
                        .iter()
                        .map(|tc| {
                            json!({
                                "id": tc.id,
                                "type": tc.type_name,
                                "function": {
                                    "name": tc.function.name,
                                    "arguments": tc.function.arguments.to_string(),
                                }
                            })
                        })
                        .collect();
                    msg_obj["tool_calls"] = json!(tool_calls);
                }

                msg_obj
            })
            .collect();

        let mut request_body = json!({
            "model": self.model_name,
            "messages": messages,
        });

        // Advertise registered tool schemas if provided
        if let Some(tools) = param.tools {
            if !tools.is_empty() {
                let tool_list: Vec<Value> = tools.iter().map(|tool| tool.get_json()).collect();
                request_body["tools"] = json!(tool_list);
                request_body["tool_choice"] = json!("auto");
            }
        }

        request_body
    }
}

impl LLMBase for LLMAPI {
    fn get_model_name(&self) -> &str {
        &self.model_name
    }

    fn inference(&self, param: &InferenceParam) -> Result<Message> {
        let client = Client::builder().timeout(self.timeout).build()?;

        let request_body = self.build_request_body(param);

        let mut request = client.post(&self.api_endpoint).json(&request_body);

        // Add authorization header if API key is provided
        if let Some(ref api_key) = self.api_key {
            // Check if api_key already contains "Bearer " prefix
            let auth_header = if api_key.starts_with("Bearer ") {
                api_key.to_string()
            } else {
                format!("Bearer {}", api_key)
            };
            request = request.header("Authorization", auth_header);
        }

        let response = request.send()?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().unwrap_or_else(|_| "Unknown error".to_string());
            error!("API request failed with status {}: {}", status, error_text);
            crate::bail!("API request failed with status {}", status);
        }

        let api_resp = response.json::<Value>()?;
        match Self::parse_api_message(&api_resp) {
            Some(msg) => {
                debug!("Successfully parsed API response");
                Ok(msg)
            }
            None => {
                error!("Invalid API response structure: missing required fields");
                Err(crate::string_error!(
                    "invalid API response structure from {}",
                    self.api_endpoint
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigList;
    use crate::llm::MessageRole;
    use crate::llm::function_tools::{CalculatorTool, FunctionTool};
    use std::sync::Arc;

    #[test]
    fn test_llmapi_creation() {
        let api = LLMAPI::new(
            "gpt-4".to_string(),
            DEFAULT_API_ENDPOINT.to_string(),
            Some("sk-test-key".to_string()),
            Duration::from_secs(60),
        );

        assert_eq!(api.get_model_name(), "gpt-4");
    }

    #[test]
    fn test_llmapi_with_timeout() {
        let api = LLMAPI::new(
            "gpt-4".to_string(),
            DEFAULT_API_ENDPOINT.to_string(),
            None,
            Duration::from_secs(60),
        )
        .with_timeout(Duration::from_secs(30));

        assert_eq!(api.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_config_defaults_endpoint() {
        let config = ModelConfig {
            model: "gpt-4".to_string(),
            api_key: Some("sk-test-key".to_string()),
            base_url: None,
        };
        let api = LLMAPI::from_config(&config);
        assert_eq!(api.api_endpoint, DEFAULT_API_ENDPOINT);
        assert_eq!(api.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_request_body_includes_tools() {
        let api = LLMAPI::new(
            "gpt-4".to_string(),
            DEFAULT_API_ENDPOINT.to_string(),
            None,
            Duration::from_secs(60),
        );
        let messages = vec![Message::user("What is 3 + 4?")];
        let tools: Vec<Arc<dyn FunctionTool>> = vec![Arc::new(CalculatorTool::new())];
        let param = InferenceParam {
            messages: &messages,
            tools: Some(tools.as_slice()),
        };

        let body = api.build_request_body(&param);
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["function"]["name"], "calculator");
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_request_body_serializes_tool_result_messages() {
        let api = LLMAPI::new(
            "gpt-4".to_string(),
            DEFAULT_API_ENDPOINT.to_string(),
            None,
            Duration::from_secs(60),
        );
        let messages = vec![Message::tool("call_1", "7")];
        let param = InferenceParam {
            messages: &messages,
            tools: None,
        };

        let body = api.build_request_body(&param);
        assert_eq!(body["messages"][0]["role"], "tool");
        assert_eq!(body["messages"][0]["tool_call_id"], "call_1");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_parse_api_message_with_tool_calls() {
        // Arguments arrive as a JSON-encoded string in the wire format
        let api_resp = serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "calculator",
                            "arguments": "{\"a\":3,\"b\":4,\"operator\":\"+\"}"
                        }
                    }]
                }
            }]
        });

        let msg = LLMAPI::parse_api_message(&api_resp).unwrap();
        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(msg.content, None);
        assert_eq!(msg.tool_calls.len(), 1);
        assert_eq!(msg.tool_calls[0].id, "call_1");
        assert_eq!(msg.tool_calls[0].function.name, "calculator");
        assert_eq!(msg.tool_calls[0].function.arguments["a"], 3);
    }

    #[test]
    fn test_parse_api_message_rejects_malformed_response() {
        assert!(LLMAPI::parse_api_message(&serde_json::json!({})).is_none());
        assert!(LLMAPI::parse_api_message(&serde_json::json!({"choices": []})).is_none());
    }

    #[test]
    #[ignore] // Integration test: requires OAI_CONFIG_LIST, a valid API key and network access
    fn test_chat_completion_inference() {
        let Ok(config_list) = ConfigList::from_env("OAI_CONFIG_LIST") else {
            return;
        };

        let api = LLMAPI::from_config(config_list.first());
        let messages = vec![
            Message::system("You are a helpful assistant."),
            Message::user("Reply with the single word: pong"),
        ];
        let param = InferenceParam {
            messages: &messages,
            tools: None,
        };

        let response = api.inference(&param).expect("inference should succeed");
        let text = response.content.unwrap_or_default();
        assert!(!text.is_empty(), "LLM response should not be empty");
    }
}
