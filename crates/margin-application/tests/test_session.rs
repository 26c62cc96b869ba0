use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Local, TimeZone};
use margin_application::{DispatchState, NoteSession, ReplyPath, SessionFlow, SessionOptions};
use margin_core::MarginError;
use margin_core::agent::AgentConfig;
use margin_core::chat::{ChatRole, ChatTurn, MAX_CHAT_TURNS};
use margin_core::clock::FixedClock;
use margin_core::intent::UiIntent;
use margin_core::note::Note;
use margin_core::render::RenderSink;
use margin_core::session::{SessionGate, StoredSessionGate, UserId};
use margin_core::storage::{KeyValueStore, MemoryKeyValueStore};
use margin_interaction::simulated_agent::{GREETING_REPLY, NO_NOTES_REPLY};
use margin_interaction::{FixedPicker, HttpRemoteAgent, SimulatedAgent};
use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingSink {
    notes: Mutex<Vec<Vec<Note>>>,
    chats: Mutex<Vec<Vec<ChatTurn>>>,
    alerts: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn last_notes(&self) -> Vec<Note> {
        self.notes.lock().unwrap().last().cloned().unwrap_or_default()
    }

    fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

impl RenderSink for RecordingSink {
    fn render_notes(&self, notes: &[Note]) {
        self.notes.lock().unwrap().push(notes.to_vec());
    }

    fn render_chat_history(&self, turns: &[ChatTurn]) {
        self.chats.lock().unwrap().push(turns.to_vec());
    }

    fn show_typing_indicator(&self) {}

    fn hide_typing_indicator(&self) {}

    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

struct Harness {
    store: Arc<MemoryKeyValueStore>,
    gate: Arc<StoredSessionGate>,
    sink: Arc<RecordingSink>,
}

impl Harness {
    fn new(store: MemoryKeyValueStore, user: &str) -> Self {
        let store = Arc::new(store);
        let gate = Arc::new(StoredSessionGate::new(store.clone()));
        gate.sign_in(&UserId::new(user)).unwrap();
        Self {
            store,
            gate,
            sink: Arc::new(RecordingSink::default()),
        }
    }

    fn options() -> SessionOptions {
        SessionOptions {
            remote: Arc::new(HttpRemoteAgent::new()),
            simulated: SimulatedAgent::new(Arc::new(FixedPicker(0)))
                .with_delay(Duration::from_millis(0)),
            clock: Arc::new(FixedClock(
                Local.with_ymd_and_hms(2024, 5, 4, 8, 15, 0).unwrap(),
            )),
        }
    }

    fn start(&self) -> NoteSession {
        NoteSession::start(
            self.gate.clone(),
            self.store.clone(),
            self.sink.clone(),
            Self::options(),
        )
        .unwrap()
    }
}

fn create(title: &str, content: &str) -> UiIntent {
    UiIntent::CreateNote {
        title: title.to_string(),
        content: content.to_string(),
    }
}

#[tokio::test]
async fn test_start_requires_signed_in_user() {
    let store = Arc::new(MemoryKeyValueStore::new());
    let gate = Arc::new(StoredSessionGate::new(store.clone()));

    let result = NoteSession::start(
        gate,
        store.clone(),
        Arc::new(RecordingSink::default()),
        Harness::options(),
    );
    assert!(matches!(result, Err(MarginError::Unauthenticated)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_note_lifecycle_through_intents() {
    let harness = Harness::new(MemoryKeyValueStore::new(), "alice");
    let session = harness.start();

    session.handle(create("Dune", "Spice must flow")).await;
    session.handle(create("Emma", "Matchmaking")).await;

    let notes = harness.sink.last_notes();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].title, "Emma");
    assert_eq!(notes[0].id, 2);
    assert_eq!(notes[1].created_at, "2024-05-04 08:15:00");

    session
        .handle(UiIntent::UpdateNote {
            id: 1,
            title: "Dune".into(),
            content: "Arrakis".into(),
        })
        .await;
    assert_eq!(session.note(1).await.unwrap().content, "Arrakis");

    session.handle(UiIntent::DeleteNote { id: 2 }).await;
    assert_eq!(harness.sink.last_notes().len(), 1);

    // Unknown ids are a silent no-op.
    session
        .handle(UiIntent::UpdateNote {
            id: 99,
            title: "x".into(),
            content: "y".into(),
        })
        .await;
    session.handle(UiIntent::DeleteNote { id: 99 }).await;
    assert_eq!(session.notes().await.len(), 1);
    assert!(harness.sink.alerts().is_empty());

    assert_eq!(harness.store.get("nextId_alice").unwrap().as_deref(), Some("3"));
}

#[tokio::test]
async fn test_search_renders_filtered_list_only() {
    let harness = Harness::new(MemoryKeyValueStore::new(), "alice");
    let session = harness.start();
    session.handle(create("Dune", "Spice")).await;
    session.handle(create("Emma", "Matchmaking")).await;

    session
        .handle(UiIntent::SearchNotes {
            title: "DUNE".into(),
            content: String::new(),
        })
        .await;
    let shown = harness.sink.last_notes();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].title, "Dune");
    assert_eq!(session.notes().await.len(), 2);

    session.handle(UiIntent::ClearSearch).await;
    assert_eq!(harness.sink.last_notes().len(), 2);
}

#[tokio::test]
async fn test_failed_note_write_alerts_and_keeps_memory() {
    let harness = Harness::new(MemoryKeyValueStore::with_quota(200), "alice");
    let session = harness.start();

    session.handle(create("Big", &"x".repeat(500))).await;

    let alerts = harness.sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].starts_with("保存笔记失败："));
    assert!(alerts[0].contains("quota exceeded"));
    assert_eq!(session.notes().await.len(), 1);
    assert!(harness.store.get("notes_alice").unwrap().is_none());
}

#[tokio::test]
async fn test_state_survives_restart_and_is_per_user() {
    let harness = Harness::new(MemoryKeyValueStore::new(), "alice");
    {
        let session = harness.start();
        session.handle(create("Dune", "Spice")).await;
        session
            .handle(UiIntent::SaveAgentConfig {
                config: AgentConfig {
                    enabled: true,
                    ..AgentConfig::default()
                },
            })
            .await;
    }

    let reopened = harness.start();
    assert_eq!(reopened.notes().await.len(), 1);
    assert!(reopened.agent_config().await.enabled);
    assert_eq!(reopened.chat_history().await.len(), 1);

    harness.gate.sign_in(&UserId::new("bob")).unwrap();
    let bob = harness.start();
    assert_eq!(bob.user().as_str(), "bob");
    assert!(bob.notes().await.is_empty());
    assert!(bob.chat_history().await.is_empty());
    assert!(!bob.agent_config().await.enabled);
}

#[tokio::test]
async fn test_enabling_assistant_greets_once_per_save() {
    let harness = Harness::new(MemoryKeyValueStore::new(), "alice");
    let session = harness.start();

    let config = AgentConfig {
        endpoint_url: "  http://agent.local  ".into(),
        api_key: " sk ".into(),
        agent_id: String::new(),
        enabled: true,
    };
    session
        .handle(UiIntent::SaveAgentConfig { config })
        .await;

    let saved = session.agent_config().await;
    assert_eq!(saved.endpoint_url, "http://agent.local");
    assert_eq!(saved.api_key, "sk");

    let history = session.chat_history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, ChatRole::Assistant);
    assert!(history[0].content.starts_with("AI助手已启用！"));

    session
        .handle(UiIntent::SaveAgentConfig {
            config: AgentConfig::default(),
        })
        .await;
    assert_eq!(session.chat_history().await.len(), 1);
}

#[tokio::test]
async fn test_disabled_assistant_replies_with_notice_only() {
    let harness = Harness::new(MemoryKeyValueStore::new(), "alice");
    let session = harness.start();

    let outcome = session.send_chat_message("你好").await;
    assert_eq!(outcome.path, Some(ReplyPath::Disabled));

    let history = session.chat_history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, ChatRole::Assistant);
    assert_eq!(history[0].content, "请先在配置中启用AI助手功能。");
}

#[tokio::test]
async fn test_simulated_replies_without_endpoint() {
    let harness = Harness::new(MemoryKeyValueStore::new(), "alice");
    let session = harness.start();
    session
        .handle(UiIntent::SaveAgentConfig {
            config: AgentConfig {
                enabled: true,
                ..AgentConfig::default()
            },
        })
        .await;
    session.handle(UiIntent::ClearChatHistory).await;
    assert!(session.chat_history().await.is_empty());

    let greeting = session.send_chat_message("你好").await;
    assert_eq!(greeting.path, Some(ReplyPath::Simulated));
    assert_eq!(greeting.reply.as_deref(), Some(GREETING_REPLY));

    let digest = session.send_chat_message("总结").await;
    assert_eq!(digest.reply.as_deref(), Some(NO_NOTES_REPLY));

    let blank = session.send_chat_message("   ").await;
    assert_eq!(blank.state, DispatchState::Idle);
    assert_eq!(session.chat_history().await.len(), 4);
}

#[tokio::test]
async fn test_remote_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output": {"text": "hi"}})))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(MemoryKeyValueStore::new(), "alice");
    let session = harness.start();
    session
        .handle(UiIntent::SaveAgentConfig {
            config: AgentConfig {
                endpoint_url: server.uri(),
                api_key: "sk".into(),
                agent_id: String::new(),
                enabled: true,
            },
        })
        .await;

    let outcome = session.send_chat_message("What did I read?").await;
    assert_eq!(outcome.path, Some(ReplyPath::Remote));
    assert_eq!(outcome.state, DispatchState::Delivered);

    let history = session.chat_history().await;
    let last = history.last().unwrap();
    assert_eq!(last.role, ChatRole::Assistant);
    assert_eq!(last.content, "hi");
}

#[tokio::test]
async fn test_remote_error_becomes_apology() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let harness = Harness::new(MemoryKeyValueStore::new(), "alice");
    let session = harness.start();
    session
        .handle(UiIntent::SaveAgentConfig {
            config: AgentConfig {
                endpoint_url: server.uri(),
                api_key: "sk".into(),
                agent_id: String::new(),
                enabled: true,
            },
        })
        .await;

    let outcome = session.send_chat_message("hello?").await;
    assert_eq!(outcome.state, DispatchState::Failed);

    let reply = session.chat_history().await.last().unwrap().content.clone();
    assert!(reply.starts_with("抱歉，我现在无法回答您的问题。"));
    assert!(reply.contains("500"));
    assert!(reply.contains("boom"));
}

#[tokio::test]
async fn test_chat_history_is_capped() {
    let harness = Harness::new(MemoryKeyValueStore::new(), "alice");
    let session = harness.start();

    // Disabled: each message adds exactly one notice turn.
    for _ in 0..MAX_CHAT_TURNS + 5 {
        session.send_chat_message("ping").await;
    }
    assert_eq!(session.chat_history().await.len(), MAX_CHAT_TURNS);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let harness = Harness::new(MemoryKeyValueStore::new(), "alice");
    let session = harness.start();
    session.handle(create("Dune", "Spice")).await;

    assert_eq!(session.handle(UiIntent::Logout).await, SessionFlow::Ended);
    assert!(!harness.gate.is_authenticated());
    // Notes stay behind for the next sign-in.
    assert!(harness.store.get("notes_alice").unwrap().is_some());
}

#[tokio::test]
async fn test_corrupt_payloads_reported_as_load_issues() {
    let harness = Harness::new(MemoryKeyValueStore::new(), "alice");
    harness.store.set("notes_alice", "not json").unwrap();

    let session = harness.start();
    assert!(session.notes().await.is_empty());

    let issues = session.load_issues().await;
    assert_eq!(issues.len(), 1);
    assert!(issues[0].is_corrupt_data());
}

#[tokio::test]
async fn test_exhausted_note_counter_alerts_instead_of_panicking() {
    let harness = Harness::new(MemoryKeyValueStore::new(), "alice");
    harness
        .store
        .set("nextId_alice", &u64::MAX.to_string())
        .unwrap();
    let session = harness.start();

    session.handle(create("Dune", "Spice")).await;

    let alerts = harness.sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].starts_with("保存笔记失败："));
    assert!(session.notes().await.is_empty());
}
