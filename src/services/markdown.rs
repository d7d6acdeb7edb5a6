//! Markdown rendering
//!
//! ```
//! use venture_site::services::markdown::MarkdownRenderer;
//!
//! let html = MarkdownRenderer::new().render("# Hello\n\nThis is **bold** text.");
//! assert!(html.contains("<h1>"));
//! assert!(html.contains("<strong>"));
//! ```

use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

/// Markdown to HTML with tables, strikethrough, task lists and smart
/// punctuation. Fenced code blocks get a `language-*` class for client-side
/// highlighting.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);

        let parser = Parser::new_ext(markdown, options);
        let events = self.process_events(parser);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Collapse code block contents into a single escaped HTML event
    fn process_events<'a>(&self, parser: Parser<'a>) -> Vec<Event<'a>> {
        let mut events = Vec::new();
        let mut code: Option<(Option<String>, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(lang) if !lang.is_empty() => {
                            // Info strings may carry attributes after the language
                            lang.split_whitespace().next().map(str::to_string)
                        }
                        _ => None,
                    };
                    code = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, content)) = code.take() {
                        events.push(Event::Html(code_block(&content, lang.as_deref()).into()));
                    }
                }
                Event::Text(text) if code.is_some() => {
                    if let Some((_, content)) = code.as_mut() {
                        content.push_str(&text);
                    }
                }
                _ => events.push(event),
            }
        }

        events
    }
}

fn code_block(code: &str, lang: Option<&str>) -> String {
    match lang {
        Some(lang) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>",
            html_escape(lang),
            html_escape(code)
        ),
        None => format!("<pre><code>{}</code></pre>", html_escape(code)),
    }
}

/// Escapes HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_blocks() {
        let html = MarkdownRenderer::new().render(
            "# Title\n\n## Sub\n\n- one\n- two\n\n> quoted\n\n[link](https://zeengocorp.com)",
        );
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<h2>Sub</h2>"));
        assert!(html.contains("<li>one</li>"));
        assert!(html.contains("<blockquote>"));
        assert!(html.contains("<a href=\"https://zeengocorp.com\">link</a>"));
    }

    #[test]
    fn test_render_extensions() {
        let renderer = MarkdownRenderer::new();
        assert!(renderer.render("~~gone~~").contains("<del>gone</del>"));
        assert!(renderer
            .render("| a | b |\n|---|---|\n| 1 | 2 |")
            .contains("<table>"));
        assert!(renderer.render("- [x] done").contains("checkbox"));
        assert!(renderer.render("\"quoted\"").contains('\u{201c}'));
    }

    #[test]
    fn test_code_block_with_language() {
        let html = MarkdownRenderer::new().render("```rust\nfn main() {}\n```");
        assert!(html.contains("<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"));
    }

    #[test]
    fn test_code_block_is_escaped() {
        let html = MarkdownRenderer::new().render("```\n<script>alert(1)</script>\n```");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }
}
