use std::fmt::Write;

use crate::model::{Citation, Message, Role};

/// Terminal rendering of a single message, sources included.
pub fn render_message(msg: &Message) -> String {
    let mut out = String::new();
    if msg.is_error {
        let _ = write!(out, "error: {}", msg.text.trim());
        return out;
    }

    out.push_str(msg.text.trim());
    let sources = render_sources(&msg.grounding_chunks);
    if !sources.is_empty() {
        out.push_str("\n\n");
        out.push_str(&sources);
    }
    out
}

/// Numbered list of web sources; citations without a web entry are skipped.
pub fn render_sources(citations: &[Citation]) -> String {
    let mut out = String::new();
    let webs = citations.iter().filter_map(|citation| citation.web.as_ref());
    for (idx, web) in webs.enumerate() {
        if idx == 0 {
            out.push_str("Sources:");
        }
        let title = if web.title.trim().is_empty() {
            web.uri.as_str()
        } else {
            web.title.trim()
        };
        let _ = write!(out, "\n  [{}] {} - {}", idx + 1, title, web.uri);
    }
    out
}

pub fn render_history_line(idx: usize, msg: &Message) -> String {
    let label = match (msg.role, msg.is_error) {
        (_, true) => "error",
        (Role::User, false) => Role::User.as_str(),
        (Role::Model, false) => Role::Model.as_str(),
    };
    let mut line = format!(
        "[{}] {} {}: {}",
        idx,
        msg.created_at.format("%H:%M:%S"),
        label,
        msg.text.trim()
    );
    if !msg.grounding_chunks.is_empty() {
        let _ = write!(line, " ({} sources)", msg.grounding_chunks.len());
    }
    line
}

#[cfg(test)]
mod tests {
    use super::{render_history_line, render_message, render_sources};
    use crate::model::{Citation, Message};

    #[test]
    fn model_message_lists_numbered_sources() {
        let msg = Message::model(
            "The answer.\n",
            vec![
                Citation::web("https://a.example/x", "A news"),
                Citation::default(),
                Citation::web("https://b.example", " "),
            ],
        );
        assert_eq!(
            render_message(&msg),
            "The answer.\n\nSources:\n  [1] A news - https://a.example/x\n  [2] https://b.example - https://b.example"
        );
    }

    #[test]
    fn message_without_sources_is_plain_text() {
        assert_eq!(render_message(&Message::model(" hi ", Vec::new())), "hi");
        assert_eq!(render_sources(&[Citation::default()]), "");
    }

    #[test]
    fn error_message_is_labelled() {
        assert_eq!(render_message(&Message::error("offline")), "error: offline");
    }

    #[test]
    fn history_line_shows_role_and_source_count() {
        let msg = Message::model("hi", vec![Citation::web("https://a.example", "A")]);
        let line = render_history_line(1, &msg);
        assert!(line.starts_with("[1] "), "{line}");
        assert!(line.ends_with(" model: hi (1 sources)"), "{line}");

        let line = render_history_line(2, &Message::error("boom"));
        assert!(line.ends_with(" error: boom"), "{line}");
    }
}
