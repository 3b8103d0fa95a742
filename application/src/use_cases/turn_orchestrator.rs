//! Turn orchestrator
//!
//! Drives the conversation: takes operator input, alternates between the
//! reasoning engine and the tool session until the engine gives a final
//! answer, and keeps the conversation and turn phase consistent.
//!
//! ```text
//! input ──▶ append user ──▶ reason ──▶ FinalResponse ──▶ append assistant
//!                             ▲   │
//!                             │   ▼ ToolCalls
//!                             └── invoke each, append tool results
//! ```
//!
//! Failures are contained to the turn that produced them. A tool failure is
//! a result the engine gets to see; an engine failure, an exhausted round
//! budget or a malformed output ends the turn with one failure marker in the
//! conversation, and the next prompt works normally. Only exit, end of
//! input, cancellation and a lost session close the orchestrator.

use crate::config::ChatParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::operator::OperatorChannel;
use crate::ports::progress::{NoProgress, TurnProgressNotifier};
use crate::ports::reasoning_engine::{ReasoningEngine, ReasoningError};
use crate::ports::tool_session::ToolSession;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use toolbridge_domain::{ConversationState, ReasoningOutput, ToolCallRequest, TurnPhase};
use tracing::{debug, info, warn};

/// Why a turn did not produce an answer
#[derive(Error, Debug)]
pub enum TurnError {
    #[error("{0}")]
    Reasoning(#[from] ReasoningError),

    #[error("No final answer after {rounds} tool-call rounds")]
    Exhausted { rounds: usize },

    #[error("Turn cancelled")]
    Cancelled,

    #[error("Session is closed")]
    Closed,
}

/// What the operator sees after submitting one line
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Responded { text: String },
    Failed { reason: String },
    Exhausted { rounds: usize },
    /// Blank input; nothing was appended.
    Skipped,
    Cancelled,
    Exit,
    /// The tool server went away; the session is closed.
    SessionLost,
}

/// Why the orchestrator moved to `Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    OperatorExit,
    EndOfInput,
    Cancelled,
    SessionLost,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::OperatorExit => "operator_exit",
            CloseReason::EndOfInput => "end_of_input",
            CloseReason::Cancelled => "cancelled",
            CloseReason::SessionLost => "session_lost",
        }
    }
}

pub struct TurnOrchestrator {
    session: Arc<dyn ToolSession>,
    engine: Arc<dyn ReasoningEngine>,
    conversation: ConversationState,
    phase: TurnPhase,
    params: ChatParams,
    close_reason: Option<CloseReason>,
    progress: Arc<dyn TurnProgressNotifier>,
    logger: Arc<dyn ConversationLogger>,
    cancellation: CancellationToken,
}

impl TurnOrchestrator {
    pub fn new(
        session: Arc<dyn ToolSession>,
        engine: Arc<dyn ReasoningEngine>,
        params: ChatParams,
    ) -> Self {
        let conversation = ConversationState::new(params.max_input_chars);
        Self {
            session,
            engine,
            conversation,
            phase: TurnPhase::AwaitingInput,
            params,
            close_reason: None,
            progress: Arc::new(NoProgress),
            logger: Arc::new(NoConversationLogger),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn TurnProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    /// Seed the conversation with the configured initial message, if any.
    pub fn seed(&mut self) {
        let initial = self.params.initial_message.clone();
        if let Some(message) = self.conversation.seed(initial.as_deref()) {
            debug!("Seeded conversation with message #{}", message.ordinal());
            self.logger.log(ConversationEvent::user_message(message));
        }
    }

    /// Read input from `operator` until exit, end of input, cancellation or
    /// a lost session.
    pub async fn run(&mut self, operator: &mut dyn OperatorChannel) -> CloseReason {
        loop {
            if let Some(reason) = self.close_reason {
                return reason;
            }
            if self.cancellation.is_cancelled() {
                self.close(CloseReason::Cancelled);
                continue;
            }

            let Some(line) = operator.next_input().await else {
                self.close(CloseReason::EndOfInput);
                continue;
            };

            let outcome = self.handle_input(&line).await;
            operator.present(&outcome);

            if self.close_reason == Some(CloseReason::SessionLost) {
                operator.present(&TurnOutcome::SessionLost);
            }
        }
    }

    /// Handle one line of operator input.
    pub async fn handle_input(&mut self, raw: &str) -> TurnOutcome {
        if self.phase.is_closed() {
            return TurnOutcome::Failed {
                reason: TurnError::Closed.to_string(),
            };
        }
        if self.params.is_exit_command(raw) {
            self.close(CloseReason::OperatorExit);
            return TurnOutcome::Exit;
        }
        if raw.trim().is_empty() {
            return TurnOutcome::Skipped;
        }

        self.enter(TurnPhase::Reasoning);
        let message = self.conversation.append_user(raw);
        self.logger.log(ConversationEvent::user_message(message));

        let result = self.run_turn().await;
        self.progress.on_turn_end();

        let outcome = match result {
            Ok(text) => {
                self.enter(TurnPhase::Responding);
                let message = self.conversation.append_assistant(text.clone());
                self.logger
                    .log(ConversationEvent::assistant_response(message));
                self.enter(TurnPhase::AwaitingInput);
                TurnOutcome::Responded { text }
            }
            Err(TurnError::Cancelled) => {
                info!("Turn cancelled");
                self.record_failure(&TurnError::Cancelled);
                self.close(CloseReason::Cancelled);
                return TurnOutcome::Cancelled;
            }
            Err(e) => {
                warn!("Turn failed: {}", e);
                self.record_failure(&e);
                self.enter(TurnPhase::AwaitingInput);
                match e {
                    TurnError::Exhausted { rounds } => TurnOutcome::Exhausted { rounds },
                    other => TurnOutcome::Failed {
                        reason: other.to_string(),
                    },
                }
            }
        };

        if self.session.is_degraded() {
            warn!("Tool session lost its connection; closing");
            self.close(CloseReason::SessionLost);
        }

        outcome
    }

    async fn run_turn(&mut self) -> Result<String, TurnError> {
        let mut rounds = 0usize;

        loop {
            if self.cancellation.is_cancelled() {
                return Err(TurnError::Cancelled);
            }

            self.progress.on_reasoning_start(rounds + 1);
            let output = tokio::select! {
                result = self.engine.reason(
                    self.conversation.snapshot(),
                    self.session.registry().all(),
                ) => result,
                _ = self.cancellation.cancelled() => {
                    self.progress.on_reasoning_end();
                    return Err(TurnError::Cancelled);
                }
            };
            self.progress.on_reasoning_end();

            let requests = match output? {
                ReasoningOutput::FinalResponse { text } => return Ok(text),
                ReasoningOutput::ToolCalls { requests } => requests,
            };

            if requests.is_empty() {
                return Err(ReasoningError::MalformedOutput(
                    "tool-call output without any calls".to_string(),
                )
                .into());
            }
            if rounds >= self.params.max_tool_rounds {
                return Err(TurnError::Exhausted { rounds });
            }
            rounds += 1;

            debug!(
                "Round {}: {} tool call(s) requested by {}",
                rounds,
                requests.len(),
                self.engine.name()
            );
            self.enter(TurnPhase::ExecutingTools);
            for request in requests {
                if self.cancellation.is_cancelled() {
                    return Err(TurnError::Cancelled);
                }
                self.execute_tool(request).await;
            }
            self.enter(TurnPhase::Reasoning);
        }
    }

    async fn execute_tool(&mut self, request: ToolCallRequest) {
        self.progress.on_tool_call_start(&request);
        self.logger.log(ConversationEvent::tool_call(&request));

        let started = Instant::now();
        let result = self.session.invoke(&request).await;
        let elapsed = started.elapsed();

        match result.failure_detail() {
            Some(failure) => warn!("Tool '{}' failed: {}", request.tool_name, failure),
            None => debug!(
                "Tool '{}' succeeded in {:.2}s",
                request.tool_name,
                elapsed.as_secs_f64()
            ),
        }
        self.progress.on_tool_call_end(&result, elapsed);
        self.logger
            .log(ConversationEvent::tool_result(&result, elapsed));
        self.conversation.append_tool_result(request, result);
    }

    fn record_failure(&mut self, error: &TurnError) {
        let reason = error.to_string();
        self.conversation.append_turn_failure(reason.clone());
        self.logger.log(ConversationEvent::turn_failed(&reason));
    }

    fn close(&mut self, reason: CloseReason) {
        if self.close_reason.is_some() {
            return;
        }
        self.enter(TurnPhase::Closed);
        self.close_reason = Some(reason);
        self.logger.log(ConversationEvent::session_closed(
            reason.as_str(),
            self.conversation.len(),
        ));
    }

    fn enter(&mut self, next: TurnPhase) {
        match self.phase.transition(next) {
            Ok(phase) => self.phase = phase,
            Err(e) => warn!("{}", e),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use toolbridge_domain::{Message, ToolCallResult, ToolDescriptor, ToolFailure, ToolRegistry};

    /// Engine that replays a fixed script and records the history length it saw.
    pub struct ScriptedEngine {
        script: Mutex<VecDeque<Result<ReasoningOutput, ReasoningError>>>,
        pub seen_history_lengths: Mutex<Vec<usize>>,
    }

    impl ScriptedEngine {
        pub fn new(script: Vec<Result<ReasoningOutput, ReasoningError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                seen_history_lengths: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.seen_history_lengths.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ReasoningEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn reason(
            &self,
            history: &[Message],
            _tools: &[ToolDescriptor],
        ) -> Result<ReasoningOutput, ReasoningError> {
            self.seen_history_lengths
                .lock()
                .unwrap()
                .push(history.len());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ReasoningOutput::final_response("(script exhausted)")))
        }
    }

    /// Session with canned results per tool name.
    pub struct FakeSession {
        registry: ToolRegistry,
        results: Mutex<HashMap<String, VecDeque<ToolCallResult>>>,
        pub invoked: Mutex<Vec<ToolCallRequest>>,
        pub degrade_after_call: AtomicBool,
        degraded: AtomicBool,
        pub close_count: AtomicUsize,
    }

    impl FakeSession {
        pub fn new(tools: &[&str]) -> Self {
            let registry = ToolRegistry::from_descriptors(
                tools
                    .iter()
                    .map(|name| ToolDescriptor::new(*name, format!("{} tool", name))),
            )
            .unwrap();
            Self {
                registry,
                results: Mutex::new(HashMap::new()),
                invoked: Mutex::new(Vec::new()),
                degrade_after_call: AtomicBool::new(false),
                degraded: AtomicBool::new(false),
                close_count: AtomicUsize::new(0),
            }
        }

        pub fn with_result(self, result: ToolCallResult) -> Self {
            self.results
                .lock()
                .unwrap()
                .entry(result.tool_name.clone())
                .or_default()
                .push_back(result);
            self
        }

        pub fn invoked_names(&self) -> Vec<String> {
            self.invoked
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.tool_name.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ToolSession for FakeSession {
        fn registry(&self) -> &ToolRegistry {
            &self.registry
        }

        async fn invoke(&self, request: &ToolCallRequest) -> ToolCallResult {
            self.invoked.lock().unwrap().push(request.clone());
            if self.degraded.load(Ordering::SeqCst) {
                return ToolCallResult::failure(
                    &request.tool_name,
                    ToolFailure::transport_closed(),
                );
            }
            if !self.registry.contains(&request.tool_name) {
                return ToolCallResult::failure(
                    &request.tool_name,
                    ToolFailure::unknown_tool(&request.tool_name),
                );
            }
            if self.degrade_after_call.load(Ordering::SeqCst) {
                self.degraded.store(true, Ordering::SeqCst);
                return ToolCallResult::failure(
                    &request.tool_name,
                    ToolFailure::transport_closed(),
                );
            }
            self.results
                .lock()
                .unwrap()
                .get_mut(&request.tool_name)
                .and_then(|queue| queue.pop_front())
                .unwrap_or_else(|| ToolCallResult::success(&request.tool_name, "ok"))
        }

        fn is_degraded(&self) -> bool {
            self.degraded.load(Ordering::SeqCst)
        }

        async fn close(&self) {
            self.close_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Operator that types a fixed list of lines and records what it was shown.
    pub struct ScriptedOperator {
        inputs: VecDeque<String>,
        pub presented: Vec<TurnOutcome>,
        pub announced_tools: Vec<String>,
    }

    impl ScriptedOperator {
        pub fn new(inputs: &[&str]) -> Self {
            Self {
                inputs: inputs.iter().map(|s| s.to_string()).collect(),
                presented: Vec::new(),
                announced_tools: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl OperatorChannel for ScriptedOperator {
        async fn next_input(&mut self) -> Option<String> {
            self.inputs.pop_front()
        }

        fn on_session_ready(&mut self, registry: &ToolRegistry) {
            self.announced_tools = registry.names().map(String::from).collect();
        }

        fn present(&mut self, outcome: &TurnOutcome) {
            self.presented.push(outcome.clone());
        }
    }
}
