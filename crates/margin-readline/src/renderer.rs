//! Terminal rendering of notes, chat turns and notices.

use std::sync::Mutex;

use colored::Colorize;
use margin_core::agent::AgentConfig;
use margin_core::chat::{ChatRole, ChatTurn, MAX_CHAT_TURNS};
use margin_core::note::Note;
use margin_core::render::RenderSink;
use margin_interaction::prompt::excerpt;

const LIST_EXCERPT_CHARS: usize = 60;

/// Prints to stdout with colors.
///
/// The chat history always arrives whole, once per append; only turns not
/// yet printed are written, so the scrollback reads like a conversation.
#[derive(Default)]
pub struct TerminalRenderer {
    printed: Mutex<usize>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_note(&self, note: &Note) {
        println!("{}", format!("#{} {}", note.id, note.title).bright_yellow().bold());
        println!(
            "{}",
            format!("created {} · updated {}", note.created_at, note.updated_at).bright_black()
        );
        for line in note.content.lines() {
            println!("  {}", line);
        }
    }

    pub fn show_config(&self, config: &AgentConfig) {
        let or_unset = |value: &str| {
            if value.is_empty() {
                "(unset)".bright_black().to_string()
            } else {
                value.to_string()
            }
        };
        println!("{}", "Assistant configuration".bright_magenta());
        println!("  enabled:  {}", config.enabled);
        println!("  endpoint: {}", or_unset(&config.endpoint_url));
        println!("  key:      {}", or_unset(&mask(&config.api_key)));
        println!("  agent:    {}", or_unset(&config.agent_id));
        if config.enabled && !config.is_usable() {
            println!("{}", "  (no endpoint/key: replies are simulated)".bright_black());
        }
    }

    /// Turns in `turns` that have not been printed yet.
    ///
    /// Tracked by count, since identical turns are common. A full history of
    /// unchanged length means the oldest turn was evicted for a new one; a
    /// shorter one means the history was replaced and is printed again.
    fn unseen<'a>(&self, turns: &'a [ChatTurn]) -> &'a [ChatTurn] {
        let Ok(mut printed) = self.printed.lock() else {
            return turns;
        };
        let start = if turns.len() > *printed {
            *printed
        } else if turns.len() == *printed && *printed == MAX_CHAT_TURNS {
            turns.len() - 1
        } else if turns.len() == *printed {
            turns.len()
        } else {
            0
        };
        *printed = turns.len();
        &turns[start..]
    }
}

fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}

impl RenderSink for TerminalRenderer {
    fn render_notes(&self, notes: &[Note]) {
        println!("{}", format!("── Notes ({}) ──", notes.len()).bright_magenta());
        if notes.is_empty() {
            println!("{}", "  (none)".bright_black());
        }
        for note in notes {
            let (head, cut) = excerpt(&note.content, LIST_EXCERPT_CHARS);
            let head = head.replace('\n', " ");
            println!(
                "  {} {}  {}",
                format!("#{}", note.id).bright_yellow(),
                note.title.bold(),
                note.updated_at.bright_black()
            );
            println!("     {}{}", head, if cut { "…" } else { "" });
        }
    }

    fn render_chat_history(&self, turns: &[ChatTurn]) {
        if turns.is_empty() {
            if let Ok(mut printed) = self.printed.lock() {
                *printed = 0;
            }
            println!("{}", "(chat history is empty)".bright_black());
            return;
        }

        for turn in self.unseen(turns) {
            let stamp = format!("[{}]", turn.timestamp).bright_black();
            match turn.role {
                ChatRole::User => println!("{} {}", stamp, format!("> {}", turn.content).green()),
                ChatRole::Assistant => {
                    println!("{} {}", stamp, "AI".bright_magenta());
                    for line in turn.content.lines() {
                        println!("  {}", line.bright_blue());
                    }
                }
            }
        }
    }

    fn show_typing_indicator(&self) {
        println!("{}", "AI is typing...".bright_black().italic());
    }

    fn hide_typing_indicator(&self) {}

    fn alert(&self, message: &str) {
        eprintln!("{}", format!("! {}", message).red().bold());
    }
}
