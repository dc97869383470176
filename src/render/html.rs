//! HTML rendering of chat messages.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

use super::fence::{Section, SectionKind, split_sections};

/// Render a model message as HTML.
///
/// Prose goes through the markdown renderer; code sections are emitted as
/// escaped `<pre><code>` blocks with a copy button.
pub fn render_html(content: &str) -> String {
    let mut out = String::with_capacity(content.len() * 2);
    for section in split_sections(content) {
        match section.kind {
            SectionKind::Text => push_markdown(&mut out, &section.content),
            SectionKind::Code => push_code_block(&mut out, &section),
        }
    }
    out
}

fn push_markdown(out: &mut String, text: &str) {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;

    // Model output is untrusted: raw HTML is shown as text and link targets
    // are limited to safe schemes.
    let parser = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    html::push_html(out, parser);
}

const SAFE_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Keep `url` if it is relative or uses an allowed scheme, else drop it.
fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    // Browsers ignore whitespace and control characters inside a scheme.
    let compact: String = url.chars().filter(|c| !c.is_whitespace() && !c.is_control()).collect();
    // A scheme ends at the first ':' appearing before any '/', '?' or '#'.
    let scheme = compact
        .find([':', '/', '?', '#'])
        .filter(|&i| compact[i..].starts_with(':'))
        .map(|i| &compact[..i]);

    let allowed = scheme.is_none_or(|s| SAFE_SCHEMES.iter().any(|safe| s.eq_ignore_ascii_case(safe)));
    if allowed { url } else { CowStr::Borrowed("#") }
}

fn push_code_block(out: &mut String, section: &Section) {
    out.push_str("<div class=\"code-block\">");
    out.push_str("<button type=\"button\" class=\"copy-button\" aria-label=\"Copy code\">📋</button>");
    match &section.language {
        Some(lang) => {
            out.push_str("<pre><code class=\"language-");
            out.push_str(&escape_html(lang));
            out.push_str("\">");
        }
        None => out.push_str("<pre><code>"),
    }
    out.push_str(&escape_html(&section.content));
    out.push_str("</code></pre></div>\n");
}

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
