//! Message context builder for the agent loop.
//!
//! Wraps the user's question with retrieved passages and selects how much of
//! the stored history is sent to the model.

use crate::agent::injection_defense::sanitize_passage;
use crate::types::Message;
use tracing::debug;

/// Build the contextualized question sent as the newest human message.
pub fn contextualize(passages: &[String], query: &str) -> String {
    let context = passages
        .iter()
        .map(|p| sanitize_passage(p))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Document context:\n{}\n\nUser question: {}", context, query)
}

/// Working copy of `history` for one query.
///
/// Keeps the system message plus at most `window` of the most recent
/// messages (`0` keeps all), trimmed so the first kept message is a human
/// turn.
pub fn build_messages(history: &[Message], window: usize) -> Vec<Message> {
    let (system, rest) = match history.split_first() {
        Some((first, rest)) if first.is_system() => (Some(first), rest),
        _ => (None, history),
    };

    let mut start = if window == 0 {
        0
    } else {
        rest.len().saturating_sub(window)
    };
    while start < rest.len() && !rest[start].is_human() {
        start += 1;
    }

    if start > 0 {
        debug!("Sending {} of {} prior messages", rest.len() - start, rest.len());
    }

    system
        .into_iter()
        .chain(&rest[start..])
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(exchanges: usize) -> Vec<Message> {
        let mut messages = vec![Message::system("sys")];
        for i in 0..exchanges {
            messages.push(Message::human(format!("q{}", i)));
            messages.push(Message::ai(format!("a{}", i), Vec::new()));
        }
        messages
    }

    #[test]
    fn context_wraps_passages_and_question() {
        let text = contextualize(&["Orders ship weekly.".into()], "When do orders ship?");
        assert!(text.starts_with("Document context:\n<!--"));
        assert!(text.contains("Orders ship weekly."));
        assert!(text.ends_with("\n\nUser question: When do orders ship?"));
    }

    #[test]
    fn empty_context_still_has_both_sections() {
        assert_eq!(
            contextualize(&[], "hi"),
            "Document context:\n\n\nUser question: hi"
        );
    }

    #[test]
    fn zero_window_keeps_everything() {
        let h = history(3);
        assert_eq!(build_messages(&h, 0), h);
    }

    #[test]
    fn window_keeps_system_and_starts_on_a_human_turn() {
        let h = history(3);
        // last three are a1, q2, a2; the orphaned answer is dropped
        let out = build_messages(&h, 3);
        assert_eq!(out.len(), 3);
        assert!(out[0].is_system());
        assert_eq!(out[1].content(), "q2");
        assert_eq!(out[2].content(), "a2");
    }
}
