use log::{debug, info};

use super::ConversableAgent;
use crate::error::Result;
use crate::llm::Message;

/// Why the exchange stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The sender's termination predicate matched the incoming message.
    MarkerFound,
    /// The reply carried no tool calls and the sender has nothing to say.
    NoReply,
    /// The consecutive auto-reply bound was reached.
    TurnLimit,
}

/// Transcript and outcome of one [`initiate_chat`] exchange.
///
/// [`initiate_chat`]: ConversableAgent::initiate_chat
#[derive(Debug)]
pub struct ChatResult {
    pub messages: Vec<Message>,
    pub turns: usize,
    pub reason: TerminationReason,
}

impl ChatResult {
    /// Content of the last message carrying any, usually the model's
    /// closing reply.
    pub fn summary(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find_map(|m| m.content.as_deref())
    }
}

impl ConversableAgent {
    /// Open an exchange with a model-backed recipient and drive it until a
    /// termination condition is met.
    ///
    /// Each round the recipient replies; the sender checks its termination
    /// predicate first (a terminal reply wins even when it carries tool
    /// calls), then executes any proposed tool calls in request order and
    /// relays one tool-role result message per call. A reply with neither
    /// marker nor tool calls ends the exchange: the sender has no model and
    /// never prompts a human, so it has nothing to send back.
    pub fn initiate_chat(
        &self,
        recipient: &ConversableAgent,
        message: &str,
    ) -> Result<ChatResult> {
        info!("{} (to {}): {}", self.name(), recipient.name(), message);

        let mut messages = vec![Message::user(message)];
        let mut turns = 0;
        let mut auto_replies = 0;

        let reason = loop {
            let reply = recipient.generate_reply(&messages)?;
            turns += 1;

            if let Some(ref content) = reply.content {
                info!("{} (to {}): {}", recipient.name(), self.name(), content);
            }
            for tool_call in &reply.tool_calls {
                info!(
                    "{} proposes tool call {}: {}({})",
                    recipient.name(),
                    tool_call.id,
                    tool_call.function.name,
                    tool_call.function.arguments
                );
            }

            let terminal = self.is_termination(&reply);
            let tool_calls = reply.tool_calls.clone();
            messages.push(reply);

            if terminal {
                debug!("{} saw the termination marker", self.name());
                break TerminationReason::MarkerFound;
            }
            if tool_calls.is_empty() {
                break TerminationReason::NoReply;
            }
            if auto_replies >= self.max_consecutive_auto_reply() {
                break TerminationReason::TurnLimit;
            }
            auto_replies += 1;

            for tool_call in &tool_calls {
                let result = self.execute_tool_call(tool_call);
                if let Some(ref content) = result.content {
                    info!("{} (to {}): {}", self.name(), recipient.name(), content);
                }
                messages.push(result);
            }
        };

        info!(
            "Chat between {} and {} finished after {} turn(s): {:?}",
            self.name(),
            recipient.name(),
            turns,
            reason
        );

        Ok(ChatResult {
            messages,
            turns,
            reason,
        })
    }
}
