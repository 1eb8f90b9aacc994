//! Deterministic scripted LLM for driving the chat loop in tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;

use super::function_tools::{ToolCalls, ToolCallsFuncSpec};
use super::{InferenceParam, LLMBase, Message, MessageRole};
use crate::error::Result;

pub struct MockLLM {
    model_name: String,
    script: Mutex<VecDeque<Message>>,
}

impl MockLLM {
    pub fn new(script: Vec<Message>) -> Self {
        Self {
            model_name: "mock".to_string(),
            script: Mutex::new(script.into()),
        }
    }

    /// Assistant reply carrying a single tool-call request.
    pub fn tool_call_reply(id: &str, name: &str, arguments: Value) -> Message {
        Message {
            role: MessageRole::Assistant,
            content: None,
            tool_calls: vec![ToolCalls {
                id: id.to_string(),
                type_name: "function".to_string(),
                function: ToolCallsFuncSpec {
                    name: name.to_string(),
                    arguments,
                },
            }],
            tool_call_id: None,
        }
    }
}

impl LLMBase for MockLLM {
    fn get_model_name(&self) -> &str {
        &self.model_name
    }

    fn inference(&self, _param: &InferenceParam) -> Result<Message> {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        script
            .pop_front()
            .ok_or_else(|| crate::string_error!("mock script exhausted"))
    }
}
