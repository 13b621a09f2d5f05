//! Inline selector line for in-screen choices (history range, door window).

use ratatui::style::Modifier;
use ratatui::text::{Line, Span};

use crate::theme;

/// A single line of labels with the active one bracketed and highlighted.
pub fn render_sub_tabs<'a>(labels: &[&'a str], active_index: usize) -> Line<'a> {
    let mut spans = Vec::with_capacity(labels.len() * 2);

    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", theme::key_hint()));
        }

        if i == active_index {
            spans.push(Span::styled(
                format!("[{label}]"),
                theme::tab_active().add_modifier(Modifier::UNDERLINED),
            ));
        } else {
            spans.push(Span::styled(*label, theme::tab_inactive()));
        }
    }

    Line::from(spans)
}

/// Key-hint line from `(key, description)` pairs.
pub fn render_hints<'a>(hints: &[(&'a str, &'a str)]) -> Line<'a> {
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (key, text) in hints {
        spans.push(Span::styled(format!("  {key} "), theme::key_hint_key()));
        spans.push(Span::styled(*text, theme::key_hint()));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn active_label_is_bracketed() {
        let line = render_sub_tabs(&["1h", "6h", "24h"], 1);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "1h  [6h]  24h");
    }
}
