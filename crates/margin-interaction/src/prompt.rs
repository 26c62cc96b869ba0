//! Text built from the user's notes for the assistant.

use margin_core::note::Note;
use margin_core::session::UserId;

/// Characters of note content included per note in the remote context.
pub const CONTEXT_EXCERPT_CHARS: usize = 100;

const NO_NOTES_CONTEXT: &str = "用户还没有创建任何笔记。";

/// Returns at most `max_chars` characters of `text`, and whether it was cut.
///
/// Counts Unicode scalar values, so CJK text is never split mid-character.
pub fn excerpt(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => (&text[..byte_index], true),
        None => (text, false),
    }
}

/// Summary of every note: count, then title and a short excerpt per note.
pub fn notes_summary(notes: &[Note]) -> String {
    if notes.is_empty() {
        return NO_NOTES_CONTEXT.to_string();
    }

    let mut summary = format!("用户共有{}条笔记：\n", notes.len());
    for note in notes {
        let (head, truncated) = excerpt(&note.content, CONTEXT_EXCERPT_CHARS);
        let ellipsis = if truncated { "..." } else { "" };
        summary.push_str(&format!(
            "- 标题: {}\n  内容: {}{}\n",
            note.title, head, ellipsis
        ));
    }
    summary
}

/// The single user message sent to the remote agent: notes context, blank line, question.
pub fn question_with_context(user: &UserId, notes: &[Note], question: &str) -> String {
    format!(
        "用户{}的笔记内容如下：\n{}\n\n用户的问题：{}",
        user,
        notes_summary(notes),
        question
    )
}
