//! ConversationLoop - drives one prompt to a final answer
//!
//! Each round sends the whole conversation to the model. Function calls in
//! the response are executed in order and their results appended as a single
//! tool turn; a plain text response ends the run. The round cap is checked
//! before every query, so the model is asked at most `max_rounds` times.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ExecutionLimits;
use crate::llm::{
    CompletionRequest, CompletionResponse, Conversation, FunctionCall, FunctionResult, LlmError, Message, ModelClient,
    TokenUsage, ToolDefinition,
};
use crate::tools::ToolRegistry;

/// Default response token budget when none is configured
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingModel,
    ExecutingTools,
    Done,
    Aborted,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The model answered with text and no function calls
    Done { text: String, rounds: u32 },
    /// The round cap was hit before a final answer
    Aborted { round: u32, max_rounds: u32 },
}

/// Progress notifications for callers that want to show what is happening
#[derive(Debug, Clone)]
pub enum LoopEvent {
    ModelResponded { round: u32, usage: TokenUsage },
    FunctionCalled { call: FunctionCall },
    FunctionReturned { result: FunctionResult },
}

type EventHandler = Box<dyn FnMut(&LoopEvent) + Send>;

/// Conversation loop engine
pub struct ConversationLoop {
    /// Model client
    client: Arc<dyn ModelClient>,

    /// Function dispatch
    registry: ToolRegistry,

    /// Declarations sent with every request
    tools: Vec<ToolDefinition>,

    /// System instruction sent with every request
    system_prompt: String,

    max_rounds: u32,
    max_tokens: u32,

    /// History of the current run
    conversation: Conversation,

    round: u32,
    state: LoopState,
    on_event: Option<EventHandler>,
}

impl ConversationLoop {
    /// Create a new loop
    pub fn new(
        client: Arc<dyn ModelClient>,
        registry: ToolRegistry,
        system_prompt: impl Into<String>,
        limits: &ExecutionLimits,
    ) -> Self {
        debug!(max_rounds = limits.max_conversation_rounds, "ConversationLoop::new: called");
        let tools = registry.definitions();
        Self {
            client,
            registry,
            tools,
            system_prompt: system_prompt.into(),
            max_rounds: limits.max_conversation_rounds,
            max_tokens: DEFAULT_MAX_TOKENS,
            conversation: Conversation::default(),
            round: 0,
            state: LoopState::AwaitingModel,
            on_event: None,
        }
    }

    /// Set the response token budget
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Register a handler for progress events
    pub fn on_event(mut self, handler: impl FnMut(&LoopEvent) + Send + 'static) -> Self {
        self.on_event = Some(Box::new(handler));
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Rounds started so far, including one that hit the cap
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Run the loop for one prompt
    ///
    /// Tool failures are reported to the model and never end the run. Only a
    /// model transport failure is returned as an error.
    pub async fn run(&mut self, prompt: &str) -> Result<LoopOutcome, LlmError> {
        info!(max_rounds = self.max_rounds, "Starting conversation");
        self.conversation = Conversation::seeded(prompt);
        self.round = 0;
        self.state = LoopState::AwaitingModel;

        loop {
            self.round += 1;

            if self.round > self.max_rounds {
                warn!("Max rounds ({}) reached without a final answer", self.max_rounds);
                self.state = LoopState::Aborted;
                return Ok(LoopOutcome::Aborted {
                    round: self.round,
                    max_rounds: self.max_rounds,
                });
            }

            debug!(round = self.round, "ConversationLoop::run: querying model");
            let response = self.client.complete(self.build_request()).await?;
            self.emit(LoopEvent::ModelResponded {
                round: self.round,
                usage: response.usage,
            });

            if response.has_function_calls() {
                self.handle_function_calls(&response).await;
                continue;
            }

            match response.content.filter(|t| !t.trim().is_empty()) {
                Some(text) => {
                    info!(rounds = self.round, "Conversation finished");
                    self.conversation.push(Message::from_response(&CompletionResponse::text(text.clone())));
                    self.state = LoopState::Done;
                    return Ok(LoopOutcome::Done {
                        text,
                        rounds: self.round,
                    });
                }
                None => {
                    // Empty turns are rejected by the provider, so they are not recorded
                    debug!(round = self.round, "ConversationLoop::run: empty response, asking again");
                }
            }
        }
    }

    fn build_request(&self) -> CompletionRequest {
        CompletionRequest {
            system_prompt: self.system_prompt.clone(),
            messages: self.conversation.messages().to_vec(),
            tools: self.tools.clone(),
            max_tokens: self.max_tokens,
        }
    }

    /// Execute the calls in request order and append model and tool turns
    async fn handle_function_calls(&mut self, response: &CompletionResponse) {
        debug!(count = response.function_calls.len(), "ConversationLoop::handle_function_calls: called");
        self.state = LoopState::ExecutingTools;
        self.conversation.push(Message::from_response(response));

        let mut results = Vec::with_capacity(response.function_calls.len());
        for call in &response.function_calls {
            self.emit(LoopEvent::FunctionCalled { call: call.clone() });
            let result = self.registry.execute(call).await;
            self.emit(LoopEvent::FunctionReturned { result: result.clone() });
            results.push(result);
        }

        self.conversation.push(Message::tool_results(results));
        self.state = LoopState::AwaitingModel;
    }

    fn emit(&mut self, event: LoopEvent) {
        if let Some(handler) = self.on_event.as_mut() {
            handler(&event);
        }
    }
}
