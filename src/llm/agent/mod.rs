pub mod chat;

pub use chat::{ChatResult, TerminationReason};

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};

use crate::error::Result;
use crate::llm::function_tools::{FunctionTool, ToolCalls};
use crate::llm::{InferenceParam, LLMBase, Message, MessageRole};
use crate::telemetry::{EventKind, TelemetrySession};

pub const DEFAULT_MAX_CONSECUTIVE_AUTO_REPLY: usize = 10;

pub type TerminationPredicate = Box<dyn Fn(&Message) -> bool + Send + Sync>;

/// One participant in a two-agent exchange.
///
/// A model-backed agent proposes replies and tool calls via [`generate_reply`];
/// an executor agent (no model) runs the tools registered with it and relays
/// results. The same type plays both roles, mirroring how the pair is wired:
/// tool schemas registered on the caller side, executables on the executor
/// side.
///
/// [`generate_reply`]: ConversableAgent::generate_reply
pub struct ConversableAgent {
    name: String,
    system_message: Option<String>,
    llm: Option<Arc<dyn LLMBase>>,
    tool_schemas: Vec<Arc<dyn FunctionTool>>,
    executable_tools: HashMap<String, Arc<dyn FunctionTool>>,
    is_termination_msg: Option<TerminationPredicate>,
    max_consecutive_auto_reply: usize,
    telemetry: Option<Arc<TelemetrySession>>,
}

impl ConversableAgent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            system_message: None,
            llm: None,
            tool_schemas: Vec::new(),
            executable_tools: HashMap::new(),
            is_termination_msg: None,
            max_consecutive_auto_reply: DEFAULT_MAX_CONSECUTIVE_AUTO_REPLY,
            telemetry: None,
        }
    }

    pub fn with_system_message(mut self, system_message: &str) -> Self {
        self.system_message = Some(system_message.to_string());
        self
    }

    /// Attach a model backend. Agents without one never call a model.
    pub fn with_llm(mut self, llm: Arc<dyn LLMBase>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Predicate deciding whether an incoming message ends the exchange.
    pub fn with_termination_msg(
        mut self,
        predicate: impl Fn(&Message) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.is_termination_msg = Some(Box::new(predicate));
        self
    }

    pub fn with_max_consecutive_auto_reply(mut self, max: usize) -> Self {
        self.max_consecutive_auto_reply = max;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<TelemetrySession>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_consecutive_auto_reply(&self) -> usize {
        self.max_consecutive_auto_reply
    }

    /// Register a tool schema so this agent can propose calls to it.
    /// Re-registering a name replaces the previous schema.
    pub fn register_for_llm(&mut self, tool: Arc<dyn FunctionTool>) {
        let name = tool.name().to_string();
        if let Some(existing) = self
            .tool_schemas
            .iter_mut()
            .find(|t| t.name() == name)
        {
            debug!("Agent '{}': replacing tool schema '{}'", self.name, name);
            *existing = tool;
        } else {
            debug!("Agent '{}': registering tool schema '{}'", self.name, name);
            self.tool_schemas.push(tool);
        }
    }

    /// Permit this agent to execute the tool. Re-registering a name replaces
    /// the previous executable.
    pub fn register_for_execution(&mut self, tool: Arc<dyn FunctionTool>) {
        let name = tool.name().to_string();
        debug!("Agent '{}': registering executable tool '{}'", self.name, name);
        self.executable_tools.insert(name, tool);
    }

    pub fn tool_schemas(&self) -> &[Arc<dyn FunctionTool>] {
        &self.tool_schemas
    }

    /// Produce the next reply from the model backend, advertising every
    /// registered tool schema. The agent's system message is prepended to
    /// the transcript.
    pub fn generate_reply(&self, transcript: &[Message]) -> Result<Message> {
        let Some(ref llm) = self.llm else {
            crate::bail!("agent '{}' has no model backend", self.name);
        };

        let mut messages = Vec::with_capacity(transcript.len() + 1);
        if let Some(ref system_message) = self.system_message {
            messages.push(Message::system(system_message));
        }
        messages.extend_from_slice(transcript);

        let tools = if self.tool_schemas.is_empty() {
            None
        } else {
            Some(self.tool_schemas.as_slice())
        };

        let param = InferenceParam {
            messages: &messages,
            tools,
        };
        let reply = llm.inference(&param)?;

        if let Some(ref telemetry) = self.telemetry {
            telemetry.record(EventKind::LlmCall {
                model: llm.get_model_name().to_string(),
            });
        }

        Ok(reply)
    }

    pub fn is_termination(&self, message: &Message) -> bool {
        self.is_termination_msg
            .as_ref()
            .is_some_and(|predicate| predicate(message))
    }

    /// Execute one proposed tool call and package the outcome as a tool-role
    /// message answering it. Unknown tools and failed calls become error text
    /// relayed back to the model rather than aborting the exchange.
    pub fn execute_tool_call(&self, tool_call: &ToolCalls) -> Message {
        let tool_name = &tool_call.function.name;

        let (content, ok) = match self.executable_tools.get(tool_name) {
            Some(tool) => match tool.call(tool_call.function.arguments.clone()) {
                Ok(value) => (value.to_string(), true),
                Err(e) => {
                    warn!("Tool '{}' failed: {}", tool_name, e);
                    (format!("Error: {}", e), false)
                }
            },
            None => {
                warn!(
                    "Agent '{}' received a call for unregistered tool '{}'",
                    self.name, tool_name
                );
                (
                    format!("Error: tool '{}' is not registered for execution", tool_name),
                    false,
                )
            }
        };

        if let Some(ref telemetry) = self.telemetry {
            telemetry.record(EventKind::ToolExecution {
                tool: tool_name.clone(),
                ok,
            });
        }

        debug!(
            "Agent '{}' executed tool '{}' for call {}: {}",
            self.name, tool_name, tool_call.id, content
        );

        Message {
            role: MessageRole::Tool,
            content: Some(content),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call.id.clone()),
        }
    }
}

/// Register a tool with the agent pair in one call: the schema with the
/// caller that proposes calls, the executable with the executor that runs
/// them.
pub fn register_function(
    tool: Arc<dyn FunctionTool>,
    caller: &mut ConversableAgent,
    executor: &mut ConversableAgent,
) {
    caller.register_for_llm(tool.clone());
    executor.register_for_execution(tool);
}
