mod commands;
mod helper;
mod logging;
mod renderer;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use tokio::task::JoinSet;
use tokio::time::timeout;

use margin_application::{NoteSession, SessionFlow, SessionOptions};
use margin_core::MarginError;
use margin_core::intent::UiIntent;
use margin_core::session::{StoredSessionGate, UserId};
use margin_core::storage::KeyValueStore;
use margin_infrastructure::{FileKeyValueStore, SettingsService};
use margin_interaction::SimulatedAgent;

use crate::commands::{Command, HELP_TEXT, confirmation_prompt, parse_command};
use crate::helper::CliHelper;
use crate::renderer::TerminalRenderer;

/// How long to wait for in-flight assistant replies on exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Reading notes with an AI assistant, in the terminal.
#[derive(Debug, Parser)]
#[command(name = "margin", version, about)]
struct Args {
    /// Sign in as this user before starting.
    #[arg(long)]
    user: Option<String>,

    /// Directory of the note store (overrides settings).
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Log filter, e.g. "debug" (overrides settings; RUST_LOG wins).
    #[arg(long)]
    log_level: Option<String>,

    /// Settings file to use instead of ~/.config/margin/config.toml.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ===== Settings & Logging =====
    let settings_service = match &args.config {
        Some(path) => SettingsService::new(path.clone()),
        None => SettingsService::at_default_location()?,
    };
    let mut settings = settings_service
        .load_effective()
        .context("Failed to load settings")?;
    if let Some(dir) = args.storage_dir {
        settings.storage_dir = Some(dir);
    }
    if let Some(level) = args.log_level {
        settings.log_level = level;
    }
    let _log_guard = logging::init(&settings.log_level)?;

    // ===== Backend Initialization =====
    let storage_dir = settings.resolved_storage_dir()?;
    let store: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::open(&storage_dir)?);
    let gate = Arc::new(StoredSessionGate::new(store.clone()));
    if let Some(user) = args.user {
        gate.sign_in(&UserId::new(user))?;
    }

    let renderer = Arc::new(TerminalRenderer::new());
    let options = SessionOptions {
        simulated: SimulatedAgent::default().with_delay(settings.simulated_reply_delay()),
        ..SessionOptions::default()
    };

    let session = match NoteSession::start(gate, store, renderer.clone(), options) {
        Ok(session) => Arc::new(session),
        Err(MarginError::Unauthenticated) => {
            println!("{}", "Not signed in. Start with `margin --user <name>`.".yellow());
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    for issue in session.load_issues().await {
        println!("{}", format!("Ignored unreadable data: {}", issue).yellow());
    }

    // ===== REPL Setup =====
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Margin ===".bright_magenta().bold());
    println!(
        "{}",
        format!(
            "Signed in as {}. Type /help for commands; anything else goes to the assistant.",
            session.user()
        )
        .bright_black()
    );
    println!();
    session.render_initial().await;

    let mut pending_replies = JoinSet::new();

    // ===== Main REPL Loop =====
    loop {
        let line = match rl.readline(">> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(trimmed);

        let command = match parse_command(trimmed) {
            Ok(command) => command,
            Err(err) => {
                println!("{}", err.to_string().yellow());
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => println!("{}", HELP_TEXT.bright_black()),
            Command::ShowNote(id) => match session.note(id).await {
                Some(note) => renderer.show_note(&note),
                None => println!("{}", format!("No note #{}", id).yellow()),
            },
            Command::ShowConfig => renderer.show_config(&session.agent_config().await),
            Command::ConfigureAgent(patch) => {
                let config = patch.apply(session.agent_config().await);
                session.handle(UiIntent::SaveAgentConfig { config }).await;
                renderer.show_config(&session.agent_config().await);
            }
            Command::Intent(intent @ UiIntent::SendChatMessage { .. }) => {
                // Replies may take a while; keep the prompt responsive.
                let session = Arc::clone(&session);
                pending_replies.spawn(async move {
                    session.handle(intent).await;
                });
            }
            Command::Intent(intent) => {
                if let Some(question) = confirmation_prompt(&intent) {
                    if !confirm(&mut rl, question) {
                        continue;
                    }
                }
                if session.handle(intent).await == SessionFlow::Ended {
                    println!("{}", "Signed out.".bright_green());
                    break;
                }
            }
        }

        // Reap finished replies.
        while pending_replies.try_join_next().is_some() {}
    }

    if !pending_replies.is_empty() {
        println!("{}", "Waiting for pending replies...".bright_black());
        let drained = timeout(SHUTDOWN_GRACE, async {
            while pending_replies.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!("Abandoned pending assistant replies on exit");
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

fn confirm(rl: &mut Editor<CliHelper, DefaultHistory>, question: &str) -> bool {
    match rl.readline(&format!("{} (y/N) ", question)) {
        Ok(answer) => matches!(answer.trim(), "y" | "Y" | "yes"),
        Err(_) => false,
    }
}
