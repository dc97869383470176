//! Two-state scanner that splits a message into prose and fenced code.

use serde::Serialize;

const FENCE: &str = "```";

/// Kind of a message section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// Markdown prose.
    Text,
    /// Literal contents of a fenced code block.
    Code,
}

/// A contiguous run of prose or code within a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub content: String,
    /// Info string of the opening fence (`rust` in ```` ```rust ````).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Section {
    fn text(content: String) -> Self {
        Self {
            kind: SectionKind::Text,
            content,
            language: None,
        }
    }

    fn code(content: String, language: Option<String>) -> Self {
        Self {
            kind: SectionKind::Code,
            content,
            language,
        }
    }

    #[must_use]
    pub fn is_code(&self) -> bool {
        self.kind == SectionKind::Code
    }
}

/// Info string of an opening fence line, or `None` if the line is not one.
///
/// Backticks are not allowed in the info string, so delimiter lines such as
/// ```` ```Context``` ```` stay prose.
fn opening_fence(line: &str) -> Option<Option<String>> {
    let rest = line.trim().strip_prefix(FENCE)?;
    let info = rest.trim();
    if info.contains('`') {
        return None;
    }
    Some((!info.is_empty()).then(|| info.to_string()))
}

fn is_closing_fence(line: &str) -> bool {
    line.trim() == FENCE
}

/// Split `content` into text and code sections.
///
/// Fence lines are dropped; every other line keeps a trailing newline. An
/// unterminated block at the end of input becomes a code section, so partial
/// streamed output renders without waiting for the closing fence.
pub fn split_sections(content: &str) -> Vec<Section> {
    let mut lines: Vec<&str> = content.split('\n').collect();
    if content.ends_with('\n') {
        lines.pop();
    }

    let mut sections = Vec::new();
    let mut current = String::new();
    let mut in_code: Option<Option<String>> = None;
    let mut saw_fence = false;

    for line in lines {
        match &in_code {
            None => {
                if let Some(language) = opening_fence(line) {
                    saw_fence = true;
                    if !current.is_empty() {
                        sections.push(Section::text(std::mem::take(&mut current)));
                    }
                    in_code = Some(language);
                    continue;
                }
            }
            Some(_) => {
                if is_closing_fence(line) {
                    let language = in_code.take().flatten();
                    sections.push(Section::code(std::mem::take(&mut current), language));
                    continue;
                }
            }
        }

        current.push_str(line);
        current.push('\n');
    }

    if !saw_fence {
        return if content.is_empty() {
            Vec::new()
        } else {
            vec![Section::text(content.to_string())]
        };
    }

    if !current.is_empty() {
        sections.push(match in_code {
            Some(language) => Section::code(current, language),
            None => Section::text(current),
        });
    }

    sections
}

/// Only the code sections of `content`, in order.
pub fn code_blocks(content: &str) -> Vec<Section> {
    split_sections(content)
        .into_iter()
        .filter(Section::is_code)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_untouched() {
        let sections = split_sections("Hello **world**\nsecond line");
        assert_eq!(sections, vec![Section::text("Hello **world**\nsecond line".to_string())]);
        assert!(split_sections("").is_empty());
    }

    #[test]
    fn test_text_code_text() {
        let content = "Intro\n```\nlet x = 1;\n```\nOutro";
        let sections = split_sections(content);
        assert_eq!(
            sections,
            vec![
                Section::text("Intro\n".to_string()),
                Section::code("let x = 1;\n".to_string(), None),
                Section::text("Outro\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_language_tag_is_captured() {
        let sections = split_sections("```rust\nfn main() {}\n```\n");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].language.as_deref(), Some("rust"));
        assert_eq!(sections[0].content, "fn main() {}\n");
    }

    #[test]
    fn test_indented_fences() {
        let sections = split_sections("  ```python\n  print(1)\n  ```");
        assert_eq!(sections.len(), 1);
        assert!(sections[0].is_code());
        assert_eq!(sections[0].content, "  print(1)\n");
    }

    #[test]
    fn test_unterminated_block_becomes_code() {
        let sections = split_sections("Here:\n```\npartial output");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1], Section::code("partial output\n".to_string(), None));
    }

    #[test]
    fn test_empty_block_is_kept() {
        let sections = split_sections("```\n```");
        assert_eq!(sections, vec![Section::code(String::new(), None)]);
    }

    #[test]
    fn test_tagged_line_inside_block_is_content() {
        let content = "```\n```Context```\nbody\n```python\n```";
        let sections = split_sections(content);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content, "```Context```\nbody\n```python\n");
    }

    #[test]
    fn test_delimiter_line_outside_block_is_text() {
        let sections = split_sections("```Styling```\nplain");
        assert_eq!(sections, vec![Section::text("```Styling```\nplain".to_string())]);
    }

    #[test]
    fn test_delimiter_line_does_not_open_block() {
        // Only the bare fence on the last line opens a block, and it is empty.
        let sections = split_sections("```Context```\nbody\n```");
        assert_eq!(sections, vec![Section::text("```Context```\nbody\n".to_string())]);
    }

    #[test]
    fn test_code_blocks_filters_prose() {
        let content = "a\n```\none\n```\nb\n```\ntwo\n```";
        let blocks = code_blocks(content);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].content, "two\n");
    }
}
