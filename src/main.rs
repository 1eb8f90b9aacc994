use std::sync::Arc;

use log::{error, info};

use tool_chat::config::{CONFIG_LIST_ENV, ConfigList};
use tool_chat::error::Result;
use tool_chat::llm::LLMAPI;
use tool_chat::llm::agent::{ConversableAgent, register_function};
use tool_chat::llm::function_tools::{CalculatorTool, NestedCalculatorTool};
use tool_chat::telemetry::TelemetrySession;

const ASSISTANT_SYSTEM_MESSAGE: &str = "You are a helpful AI assistant. \
    You can help with simple calculations. \
    Return 'TERMINATE' when the task is done.";

const TERMINATION_MARKER: &str = "TERMINATE";

fn main() {
    // Load process environment from a local .env file, then init logging
    dotenvy::dotenv().ok();
    env_logger::init();

    info!("tool_chat demo starting...");

    if let Err(e) = run() {
        error!("tool_chat demo failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config_list = ConfigList::from_env(CONFIG_LIST_ENV)?;
    let telemetry = Arc::new(TelemetrySession::init(["rust-tool-use"]));

    let llm = Arc::new(LLMAPI::from_config(config_list.first()));

    // The assistant suggests tool calls; it never executes them itself.
    let mut assistant = ConversableAgent::new("Assistant")
        .with_system_message(ASSISTANT_SYSTEM_MESSAGE)
        .with_llm(llm)
        .with_telemetry(telemetry.clone());

    // The user proxy has no model. It executes proposed tool calls, relays
    // results, and stops the exchange on the termination marker.
    let mut user_proxy = ConversableAgent::new("User")
        .with_termination_msg(|msg| {
            msg.content
                .as_deref()
                .is_some_and(|c| c.contains(TERMINATION_MARKER))
        })
        .with_telemetry(telemetry.clone());

    // Register the calculator with both sides of the pair.
    register_function(
        Arc::new(CalculatorTool::new()),
        &mut assistant,
        &mut user_proxy,
    );

    let chat_result =
        user_proxy.initiate_chat(&assistant, "What is (44232 + 13312 / (232 - 32)) * 5?")?;
    info!(
        "First chat finished after {} turn(s): {:?}",
        chat_result.turns, chat_result.reason
    );

    // Swap in the nested-input calculator variant and run a second exchange.
    register_function(
        Arc::new(NestedCalculatorTool::new()),
        &mut assistant,
        &mut user_proxy,
    );

    let chat_result =
        user_proxy.initiate_chat(&assistant, "What is (1423 - 123) / 3 + (32 + 23) * 5?")?;
    info!(
        "Second chat finished after {} turn(s): {:?}",
        chat_result.turns, chat_result.reason
    );
    if let Some(summary) = chat_result.summary() {
        info!("Summary: {}", summary);
    }

    telemetry.end();
    Ok(())
}
