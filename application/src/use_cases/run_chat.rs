//! RunChat use case
//!
//! Owns the whole lifecycle of a chat session: connect to the tool server,
//! announce the tools, seed the conversation, run turns until the
//! orchestrator closes, then release the session. The session is closed on
//! every path that acquired one.

use crate::config::{ChatParams, LaunchSpec};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::operator::OperatorChannel;
use crate::ports::progress::{NoProgress, TurnProgressNotifier};
use crate::ports::reasoning_engine::ReasoningEngine;
use crate::ports::tool_session::{SessionError, ToolServerConnector};
use crate::use_cases::turn_orchestrator::{CloseReason, TurnOrchestrator};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use toolbridge_domain::ToolRegistry;
use tracing::info;

/// Errors that can occur during RunChat execution
#[derive(Error, Debug)]
pub enum RunChatError {
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Input for the RunChat use case
#[derive(Debug, Clone)]
pub struct RunChatInput {
    pub launch: LaunchSpec,
    pub params: ChatParams,
}

impl RunChatInput {
    pub fn new(launch: LaunchSpec, params: ChatParams) -> Self {
        Self { launch, params }
    }
}

/// Output from the RunChat use case
#[derive(Debug, Clone)]
pub struct RunChatOutput {
    pub close_reason: CloseReason,
    /// Messages in the conversation when it closed
    pub message_count: usize,
}

pub struct RunChatUseCase {
    connector: Arc<dyn ToolServerConnector>,
    engine: Arc<dyn ReasoningEngine>,
    progress: Arc<dyn TurnProgressNotifier>,
    logger: Arc<dyn ConversationLogger>,
    cancellation: CancellationToken,
}

impl RunChatUseCase {
    pub fn new(connector: Arc<dyn ToolServerConnector>, engine: Arc<dyn ReasoningEngine>) -> Self {
        Self {
            connector,
            engine,
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

    pub async fn execute(
        &self,
        input: RunChatInput,
        operator: &mut dyn OperatorChannel,
    ) -> Result<RunChatOutput, RunChatError> {
        info!("Starting tool server: {}", input.launch.display_command());
        let session = self.connector.connect(&input.launch).await?;
        info!("Tool server ready with {} tool(s)", session.registry().len());

        self.logger.log(ConversationEvent::session_started(
            self.engine.name(),
            session.registry().all(),
        ));
        operator.on_session_ready(session.registry());

        let mut orchestrator =
            TurnOrchestrator::new(session.clone(), self.engine.clone(), input.params)
                .with_progress(self.progress.clone())
                .with_conversation_logger(self.logger.clone())
                .with_cancellation(self.cancellation.clone());
        orchestrator.seed();

        let close_reason = orchestrator.run(operator).await;
        session.close().await;
        info!("Chat session closed ({})", close_reason.as_str());

        Ok(RunChatOutput {
            close_reason,
            message_count: orchestrator.conversation().len(),
        })
    }
}

/// Connect, read the registry and disconnect.
///
/// Needs no reasoning engine, so it works without API credentials.
pub async fn list_tools(
    connector: &dyn ToolServerConnector,
    launch: &LaunchSpec,
) -> Result<ToolRegistry, RunChatError> {
    let session = connector.connect(launch).await?;
    let registry = session.registry().clone();
    session.close().await;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::reasoning_engine::ReasoningError;
    use crate::ports::tool_session::ToolSession;
    use crate::use_cases::turn_orchestrator::TurnOutcome;
    use crate::use_cases::turn_orchestrator::test_support::{
        FakeSession, ScriptedEngine, ScriptedOperator,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::Ordering;
    use toolbridge_domain::{ReasoningOutput, ToolCallRequest};

    struct FakeConnector {
        session: Option<Arc<FakeSession>>,
        attempts: Mutex<usize>,
    }

    impl FakeConnector {
        fn ok(session: Arc<FakeSession>) -> Self {
            Self {
                session: Some(session),
                attempts: Mutex::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                session: None,
                attempts: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl ToolServerConnector for FakeConnector {
        async fn connect(&self, _spec: &LaunchSpec) -> Result<Arc<dyn ToolSession>, SessionError> {
            *self.attempts.lock().unwrap() += 1;
            match &self.session {
                Some(session) => Ok(session.clone() as Arc<dyn ToolSession>),
                None => Err(SessionError::LaunchFailure(
                    "No such file or directory".to_string(),
                )),
            }
        }
    }

    #[tokio::test]
    async fn test_full_session_lifecycle() {
        let session = Arc::new(FakeSession::new(&["search", "fetch"]));
        let engine = Arc::new(ScriptedEngine::new(vec![
            Ok(ReasoningOutput::tool_calls(vec![
                ToolCallRequest::new("search").with_arg("q", "x"),
            ])),
            Ok(ReasoningOutput::final_response("found it")),
        ]));
        let use_case = RunChatUseCase::new(Arc::new(FakeConnector::ok(session.clone())), engine);
        let mut operator = ScriptedOperator::new(&["look up x", "quit"]);

        let output = use_case
            .execute(
                RunChatInput::new(LaunchSpec::new("fake"), ChatParams::default()),
                &mut operator,
            )
            .await
            .unwrap();

        assert_eq!(output.close_reason, CloseReason::OperatorExit);
        assert_eq!(output.message_count, 3);
        assert_eq!(operator.announced_tools, vec!["search", "fetch"]);
        assert_eq!(
            operator.presented,
            vec![
                TurnOutcome::Responded {
                    text: "found it".to_string()
                },
                TurnOutcome::Exit,
            ]
        );
        assert_eq!(session.close_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_launch_failure_runs_no_turns() {
        let engine = Arc::new(ScriptedEngine::new(vec![]));
        let connector = Arc::new(FakeConnector::failing());
        let use_case = RunChatUseCase::new(connector.clone(), engine.clone());
        let mut operator = ScriptedOperator::new(&["hello"]);

        let result = use_case
            .execute(
                RunChatInput::new(LaunchSpec::new("missing"), ChatParams::default()),
                &mut operator,
            )
            .await;

        assert!(matches!(
            result,
            Err(RunChatError::Session(SessionError::LaunchFailure(_)))
        ));
        assert_eq!(engine.calls(), 0);
        assert!(operator.presented.is_empty());
        assert_eq!(*connector.attempts.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_session_closed_after_engine_failures() {
        let session = Arc::new(FakeSession::new(&["search"]));
        let engine = Arc::new(ScriptedEngine::new(vec![Err(ReasoningError::Auth(
            "invalid key".to_string(),
        ))]));
        let use_case = RunChatUseCase::new(Arc::new(FakeConnector::ok(session.clone())), engine);
        let mut operator = ScriptedOperator::new(&["hello"]);

        let output = use_case
            .execute(
                RunChatInput::new(LaunchSpec::new("fake"), ChatParams::default()),
                &mut operator,
            )
            .await
            .unwrap();

        assert_eq!(output.close_reason, CloseReason::EndOfInput);
        assert!(matches!(operator.presented[0], TurnOutcome::Failed { .. }));
        assert_eq!(session.close_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_list_tools_closes_session() {
        let session = Arc::new(FakeSession::new(&["search", "fetch"]));
        let connector = FakeConnector::ok(session.clone());

        let registry = list_tools(&connector, &LaunchSpec::new("fake")).await.unwrap();

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["search", "fetch"]);
        assert_eq!(session.close_count.load(Ordering::SeqCst), 1);
    }
}
