//! Assistant message dispatch.
//!
//! Each message runs `Idle -> AwaitingResponse -> {Delivered, Failed}`. The
//! remote path is taken only when the config is usable; otherwise the local
//! simulator answers. Failures end up in the chat as assistant turns.

use std::sync::Arc;

use margin_core::chat::ChatRole;
use margin_core::clock::Clock;
use margin_core::render::RenderSink;
use margin_interaction::prompt::question_with_context;
use margin_interaction::{AgentRequest, RemoteAgent, RemoteCallError, SimulatedAgent};

use crate::state::SessionState;

/// Reply when a message arrives while the assistant is disabled.
pub const ENABLE_FIRST_NOTICE: &str = "请先在配置中启用AI助手功能。";

/// Turn appended when the assistant gets enabled from the config form.
pub const ASSISTANT_ENABLED_GREETING: &str =
    "AI助手已启用！现在您可以开始与我对话了。您可以询问关于您的笔记的问题，或者让我帮您总结笔记内容。";

const APOLOGY: &str = "抱歉，我现在无法回答您的问题。";

const NETWORK_CHECKLIST: &str = "\n这可能是由于网络连接问题导致的。请检查：\n\
1. 您的网络连接是否正常\n\
2. API地址是否正确\n\
3. 如果智能体服务运行在本地，请确认本地服务器已经启动\n\
4. 确保您已在智能体平台正确配置了应用";

/// Lifecycle state of one outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    AwaitingResponse,
    Delivered,
    Failed,
}

/// Which responder produced the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyPath {
    /// Assistant disabled; the fixed notice was returned.
    Disabled,
    Remote,
    Simulated,
}

/// Terminal result of [`AiDispatcher::handle_user_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub state: DispatchState,
    pub path: Option<ReplyPath>,
    /// The assistant turn appended for this message, if any.
    pub reply: Option<String>,
}

impl DispatchOutcome {
    fn ignored() -> Self {
        Self {
            state: DispatchState::Idle,
            path: None,
            reply: None,
        }
    }
}

/// Translates a failed remote call into the text shown to the user.
pub fn failure_message(err: &RemoteCallError) -> String {
    if err.is_network() {
        format!("{APOLOGY}{NETWORK_CHECKLIST}")
    } else {
        format!("{APOLOGY}\n错误信息：{err}")
    }
}

/// Routes chat messages to the remote agent or the simulator.
#[derive(Clone)]
pub struct AiDispatcher {
    state: SessionState,
    remote: Arc<dyn RemoteAgent>,
    simulated: SimulatedAgent,
    clock: Arc<dyn Clock>,
    renderer: Arc<dyn RenderSink>,
}

impl AiDispatcher {
    pub fn new(
        state: SessionState,
        remote: Arc<dyn RemoteAgent>,
        simulated: SimulatedAgent,
        clock: Arc<dyn Clock>,
        renderer: Arc<dyn RenderSink>,
    ) -> Self {
        Self {
            state,
            remote,
            simulated,
            clock,
            renderer,
        }
    }

    /// Handles one message from the chat input.
    ///
    /// Never fails: every outcome is either a no-op or an assistant turn.
    pub async fn handle_user_message(&self, text: &str) -> DispatchOutcome {
        let message = text.trim();
        if message.is_empty() {
            return DispatchOutcome::ignored();
        }

        let config = self.state.config.lock().await.config().clone();
        if !config.enabled {
            self.append(ChatRole::Assistant, ENABLE_FIRST_NOTICE).await;
            return DispatchOutcome {
                state: DispatchState::Delivered,
                path: Some(ReplyPath::Disabled),
                reply: Some(ENABLE_FIRST_NOTICE.to_string()),
            };
        }

        self.append(ChatRole::User, message).await;

        // AwaitingResponse
        self.renderer.show_typing_indicator();

        let (path, result) = if config.is_usable() {
            let notes = self.state.notes.lock().await.list();
            let content = question_with_context(&self.state.user, &notes, message);
            let request = AgentRequest::new(
                &config,
                &self.state.user,
                self.clock.epoch_millis(),
                content,
            );
            (ReplyPath::Remote, self.remote.send(&config, &request).await)
        } else {
            // Notes are read after the delay so edits made while waiting are seen.
            self.simulated.wait().await;
            let notes = self.state.notes.lock().await.list();
            (
                ReplyPath::Simulated,
                Ok(self.simulated.compose_reply(message, &notes)),
            )
        };

        self.renderer.hide_typing_indicator();

        let (state, reply) = match result {
            Ok(reply) => (DispatchState::Delivered, reply),
            Err(err) => {
                tracing::error!(error = %err, "Remote agent call failed");
                (DispatchState::Failed, failure_message(&err))
            }
        };

        self.append(ChatRole::Assistant, reply.clone()).await;
        tracing::debug!(?state, ?path, "Chat message dispatched");

        DispatchOutcome {
            state,
            path: Some(path),
            reply: Some(reply),
        }
    }

    /// Appends a turn, then renders the whole history.
    ///
    /// Rendering happens under the ledger lock, so every render shows exactly
    /// one more append than the previous one.
    pub(crate) async fn append(&self, role: ChatRole, content: impl Into<String>) {
        let mut ledger = self.state.ledger.lock().await;
        // Chat history write failures are logged by the ledger and otherwise ignored.
        let _ = ledger.append(role, content).flush;
        self.renderer.render_chat_history(ledger.all());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use margin_core::agent::AgentConfig;
    use margin_core::chat::ChatTurn;
    use margin_core::clock::SystemClock;
    use margin_core::note::Note;
    use margin_core::render::NoopRenderSink;
    use margin_core::session::UserId;
    use margin_core::storage::MemoryKeyValueStore;
    use margin_interaction::FixedPicker;
    use margin_interaction::simulated_agent::{GREETING_REPLY, NO_NOTES_REPLY};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        events: StdMutex<Vec<String>>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl RenderSink for RecordingSink {
        fn render_notes(&self, notes: &[Note]) {
            self.events.lock().unwrap().push(format!("notes:{}", notes.len()));
        }

        fn render_chat_history(&self, turns: &[ChatTurn]) {
            self.events.lock().unwrap().push(format!("chat:{}", turns.len()));
        }

        fn show_typing_indicator(&self) {
            self.events.lock().unwrap().push("typing:on".into());
        }

        fn hide_typing_indicator(&self) {
            self.events.lock().unwrap().push("typing:off".into());
        }

        fn alert(&self, message: &str) {
            self.events.lock().unwrap().push(format!("alert:{message}"));
        }
    }

    /// Remote agent returning a scripted result and recording the request.
    struct ScriptedAgent {
        result: Result<String, RemoteCallError>,
        seen: StdMutex<Vec<AgentRequest>>,
    }

    impl ScriptedAgent {
        fn new(result: Result<String, RemoteCallError>) -> Self {
            Self {
                result,
                seen: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RemoteAgent for ScriptedAgent {
        async fn send(
            &self,
            _config: &AgentConfig,
            request: &AgentRequest,
        ) -> Result<String, RemoteCallError> {
            self.seen.lock().unwrap().push(request.clone());
            self.result.clone()
        }
    }

    struct Fixture {
        state: SessionState,
        sink: Arc<RecordingSink>,
        remote: Arc<ScriptedAgent>,
        dispatcher: AiDispatcher,
    }

    async fn fixture(config: AgentConfig, remote: Result<String, RemoteCallError>) -> Fixture {
        let state = SessionState::load(
            Arc::new(MemoryKeyValueStore::new()),
            UserId::new("alice"),
            Arc::new(SystemClock),
        );
        state.config.lock().await.save(config).unwrap();

        let sink = Arc::new(RecordingSink::default());
        let remote = Arc::new(ScriptedAgent::new(remote));
        let simulated =
            SimulatedAgent::new(Arc::new(FixedPicker(0))).with_delay(Duration::from_millis(0));
        let dispatcher = AiDispatcher::new(
            state.clone(),
            remote.clone(),
            simulated,
            Arc::new(SystemClock),
            sink.clone(),
        );
        Fixture {
            state,
            sink,
            remote,
            dispatcher,
        }
    }

    fn enabled_local() -> AgentConfig {
        AgentConfig {
            enabled: true,
            ..AgentConfig::default()
        }
    }

    fn enabled_remote() -> AgentConfig {
        AgentConfig {
            endpoint_url: "http://agent.local/api".into(),
            api_key: "sk".into(),
            agent_id: String::new(),
            enabled: true,
        }
    }

    async fn turns(state: &SessionState) -> Vec<ChatTurn> {
        state.ledger.lock().await.all().to_vec()
    }

    #[tokio::test]
    async fn test_blank_message_is_ignored() {
        let f = fixture(enabled_local(), Ok(String::new())).await;

        let outcome = f.dispatcher.handle_user_message("   \n\t").await;
        assert_eq!(outcome.state, DispatchState::Idle);
        assert!(turns(&f.state).await.is_empty());
        assert!(f.sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_appends_single_notice() {
        let f = fixture(AgentConfig::default(), Ok(String::new())).await;

        let outcome = f.dispatcher.handle_user_message("你好").await;
        assert_eq!(outcome.path, Some(ReplyPath::Disabled));

        let turns = turns(&f.state).await;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, ChatRole::Assistant);
        assert_eq!(turns[0].content, ENABLE_FIRST_NOTICE);
        assert!(!f.sink.events().contains(&"typing:on".to_string()));
    }

    #[tokio::test]
    async fn test_simulated_greeting() {
        let f = fixture(enabled_local(), Ok(String::new())).await;

        let outcome = f.dispatcher.handle_user_message("你好").await;
        assert_eq!(outcome.path, Some(ReplyPath::Simulated));
        assert_eq!(outcome.state, DispatchState::Delivered);

        let turns = turns(&f.state).await;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, ChatRole::User);
        assert_eq!(turns[1].content, GREETING_REPLY);
        assert!(f.remote.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_simulated_summary_without_notes() {
        let f = fixture(enabled_local(), Ok(String::new())).await;
        let outcome = f.dispatcher.handle_user_message("总结").await;
        assert_eq!(outcome.reply.as_deref(), Some(NO_NOTES_REPLY));
    }

    #[tokio::test]
    async fn test_remote_reply_and_request_content() {
        let f = fixture(enabled_remote(), Ok("hi".to_string())).await;
        f.state
            .notes
            .lock()
            .await
            .create("Dune", "Spice")
            .unwrap()
            .flush
            .unwrap();

        let outcome = f.dispatcher.handle_user_message("  what is dune?  ").await;
        assert_eq!(outcome.path, Some(ReplyPath::Remote));
        assert_eq!(turns(&f.state).await[1].content, "hi");

        let seen = f.remote.seen.lock().unwrap();
        let content = &seen[0].messages[0].content;
        assert!(content.contains("- 标题: Dune\n  内容: Spice"));
        assert!(content.ends_with("\n\n用户的问题：what is dune?"));
        assert!(seen[0].session_id.starts_with("session_alice_"));
    }

    #[tokio::test]
    async fn test_http_failure_becomes_apology_with_body() {
        let f = fixture(
            enabled_remote(),
            Err(RemoteCallError::Http {
                status: 500,
                status_text: "Internal Server Error".into(),
                body: "boom".into(),
            }),
        )
        .await;

        let outcome = f.dispatcher.handle_user_message("hello?").await;
        assert_eq!(outcome.state, DispatchState::Failed);

        let reply = &turns(&f.state).await[1].content;
        assert!(reply.starts_with(APOLOGY));
        assert!(reply.contains("boom"));
    }

    #[tokio::test]
    async fn test_network_failure_gets_checklist() {
        let f = fixture(
            enabled_remote(),
            Err(RemoteCallError::Network("connection refused".into())),
        )
        .await;

        f.dispatcher.handle_user_message("hello?").await;
        let reply = &turns(&f.state).await[1].content;
        assert!(reply.contains("1. 您的网络连接是否正常"));
        assert!(reply.contains("4. "));
        assert!(!reply.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_typing_indicator_brackets_the_wait() {
        let f = fixture(enabled_local(), Ok(String::new())).await;
        f.dispatcher.handle_user_message("anything").await;

        assert_eq!(
            f.sink.events(),
            vec!["chat:1", "typing:on", "typing:off", "chat:2"]
        );
    }

    #[tokio::test]
    async fn test_typing_indicator_brackets_failed_remote_call() {
        let f = fixture(
            enabled_remote(),
            Err(RemoteCallError::Network("connection refused".into())),
        )
        .await;

        let outcome = f.dispatcher.handle_user_message("anything").await;
        assert_eq!(outcome.state, DispatchState::Failed);
        assert_eq!(
            f.sink.events(),
            vec!["chat:1", "typing:on", "typing:off", "chat:2"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_digest_sees_note_created_while_waiting() {
        let f = fixture(enabled_local(), Ok(String::new())).await;
        let dispatcher = AiDispatcher::new(
            f.state.clone(),
            f.remote.clone(),
            SimulatedAgent::new(Arc::new(FixedPicker(0))).with_delay(Duration::from_millis(300)),
            Arc::new(SystemClock),
            Arc::new(NoopRenderSink),
        );

        let pending = tokio::spawn(async move { dispatcher.handle_user_message("总结").await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        f.state
            .notes
            .lock()
            .await
            .create("Dune", "Spice")
            .unwrap()
            .flush
            .unwrap();

        let reply = pending.await.unwrap().reply.unwrap();
        assert!(reply.starts_with("我已经分析了您的1条笔记。"));
        assert!(reply.contains("\"Dune\""));
    }
}
