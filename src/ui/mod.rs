//! Server-rendered pages.
//!
//! Pages are plain HTML strings with the stylesheet inlined, so the binary
//! serves them without a static asset directory.
//!
//! # Structure
//!
//! - [`landing`]: product landing page at `/`
//! - [`chat`]: streaming chat view at `/chat`
//! - [`theme`]: palette and stylesheet

pub mod chat;
pub mod landing;
pub mod theme;

use chrono::{Datelike, Utc};

/// Wrap page content in the shared document shell.
pub fn html_shell(title: &str, content: &str) -> String {
    let stylesheet = theme::stylesheet();
    let year = Utc::now().year();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Prompt Engineering Optimizer">
    <title>{title} - PEO.AI</title>
    <style>{stylesheet}</style>
</head>
<body>
    <header class="app-bar">
        <a href="/" class="brand">PEO.AI</a>
        <nav>
            <span class="subtitle">Prompt Engineering Optimizer</span>
            <a href="/chat" class="button ghost">Go to Chat</a>
        </nav>
    </header>
    <main>
        {content}
    </main>
    <footer>
        PEO.AI - Prompt Engineering Optimizer &copy; {year}
        <small>Optimize your prompts for better AI interactions</small>
    </footer>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_wraps_content() {
        let page = html_shell("Home", "<p id=\"marker\"></p>");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Home - PEO.AI</title>"));
        assert!(page.contains("<p id=\"marker\"></p>"));
        assert!(page.contains(theme::PRIMARY));
    }

    #[test]
    fn test_pages_link_to_chat() {
        assert!(landing::page().contains("href=\"/chat\""));
        assert!(chat::page().contains("EventSource"));
    }
}
