//! Plain-text rendering for terminal output.

use super::fence::{SectionKind, split_sections};

/// Render a model message for a terminal.
///
/// Prose is printed as-is. Code blocks are framed and labelled so they stand
/// apart from the surrounding explanation.
pub fn render_terminal(content: &str) -> String {
    let mut out = String::new();
    for section in split_sections(content) {
        match section.kind {
            SectionKind::Text => out.push_str(&section.content),
            SectionKind::Code => {
                let label = section.language.as_deref().unwrap_or("code");
                out.push_str(&format!("┌─ {label}\n"));
                for line in section.content.lines() {
                    out.push_str("│ ");
                    out.push_str(line);
                    out.push('\n');
                }
                out.push_str("└─\n");
            }
        }
    }
    out
}
