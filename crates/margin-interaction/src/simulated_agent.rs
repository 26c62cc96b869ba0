//! SimulatedAgent - canned replies used when no remote endpoint is configured.
//!
//! Keyword rules are checked in order (summarize, greeting, help) and the
//! first match wins. Anything else gets one of four generic acknowledgements.

use std::sync::Arc;
use std::time::Duration;

use margin_core::note::Note;
use rand::Rng;

use crate::prompt::excerpt;

/// Artificial "thinking" delay before a simulated reply.
pub const SIMULATED_REPLY_DELAY: Duration = Duration::from_secs(1);

/// Notes listed individually in a simulated digest.
pub const DIGEST_NOTE_LIMIT: usize = 3;

/// Characters of content shown per note in a simulated digest.
pub const DIGEST_EXCERPT_CHARS: usize = 50;

const SUMMARIZE_KEYWORDS: &[&str] = &["总结"];
const GREETING_KEYWORDS: &[&str] = &["你好", "Hello"];
const HELP_KEYWORDS: &[&str] = &["帮助", "help"];

pub const NO_NOTES_REPLY: &str = "您还没有创建任何笔记，请先添加一些笔记内容。";

pub const GREETING_REPLY: &str =
    "您好！我是您的AI助手，我可以帮您总结笔记、回答问题等。请问有什么可以帮助您的吗？";

pub const HELP_REPLY: &str = "我可以帮您做以下事情：\n1. 总结您的读书笔记\n2. 回答关于笔记内容的问题\n3. 提供学习建议\n请告诉我您需要什么帮助？";

pub const GENERIC_REPLIES: [&str; 4] = [
    "这是一个很好的问题！让我来帮您分析一下。",
    "感谢您的提问，我会尽力为您提供帮助。",
    "基于您的笔记内容，我可以为您提供更深入的见解。",
    "这个问题涉及到了重要的知识点，让我详细为您解答。",
];

/// Source of the index used to choose a generic reply.
pub trait ReplyPicker: Send + Sync {
    /// Returns an index in `0..choices`. `choices` is never zero.
    fn pick(&self, choices: usize) -> usize;
}

/// Uniformly random choice from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPicker;

impl ReplyPicker for RandomPicker {
    fn pick(&self, choices: usize) -> usize {
        rand::thread_rng().gen_range(0..choices)
    }
}

/// Always picks the same index (wrapped into range).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPicker(pub usize);

impl ReplyPicker for FixedPicker {
    fn pick(&self, choices: usize) -> usize {
        self.0 % choices
    }
}

/// Local stand-in for the remote agent.
#[derive(Clone)]
pub struct SimulatedAgent {
    delay: Duration,
    picker: Arc<dyn ReplyPicker>,
}

impl Default for SimulatedAgent {
    fn default() -> Self {
        Self::new(Arc::new(RandomPicker))
    }
}

impl SimulatedAgent {
    pub fn new(picker: Arc<dyn ReplyPicker>) -> Self {
        Self {
            delay: SIMULATED_REPLY_DELAY,
            picker,
        }
    }

    /// Overrides the artificial delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The artificial "thinking" pause that precedes every reply.
    pub async fn wait(&self) {
        tokio::time::sleep(self.delay).await;
    }

    /// The reply for `message` given the user's current notes.
    pub fn compose_reply(&self, message: &str, notes: &[Note]) -> String {
        let mentions = |keywords: &[&str]| keywords.iter().any(|k| message.contains(k));

        if mentions(SUMMARIZE_KEYWORDS) {
            digest(notes)
        } else if mentions(GREETING_KEYWORDS) {
            GREETING_REPLY.to_string()
        } else if mentions(HELP_KEYWORDS) {
            HELP_REPLY.to_string()
        } else {
            let index = self.picker.pick(GENERIC_REPLIES.len());
            GENERIC_REPLIES[index % GENERIC_REPLIES.len()].to_string()
        }
    }
}

fn digest(notes: &[Note]) -> String {
    if notes.is_empty() {
        return NO_NOTES_REPLY.to_string();
    }

    let mut reply = format!("我已经分析了您的{}条笔记。主要内容包括：", notes.len());
    for (index, note) in notes.iter().take(DIGEST_NOTE_LIMIT).enumerate() {
        let (head, _) = excerpt(&note.content, DIGEST_EXCERPT_CHARS);
        reply.push_str(&format!("\n{}. \"{}\" - {}...", index + 1, note.title, head));
    }
    if notes.len() > DIGEST_NOTE_LIMIT {
        reply.push_str(&format!(
            "\n...还有{}条笔记。",
            notes.len() - DIGEST_NOTE_LIMIT
        ));
    }
    reply
}
