//! Event passes applied between parsing and HTML output.
//!
//! Each pass takes the full event list and returns a rewritten one. The
//! pipeline assigns heading anchors, renders fenced code the way the document
//! template expects, and optionally hardens soft breaks.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};

use crate::slug::SlugRegistry;

/// Run all passes in order.
pub(crate) fn run_pipeline<'a>(events: Vec<Event<'a>>, breaks: bool) -> Vec<Event<'a>> {
    let mut events = assign_heading_ids(events);
    events = render_code_blocks(events);
    if breaks {
        events = harden_soft_breaks(events);
    }
    events
}

// ---------------------------------------------------------------------------
// Pass 1: Heading anchors
// ---------------------------------------------------------------------------

/// Give every heading an `id` derived from its text.
fn assign_heading_ids(mut events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut registry = SlugRegistry::default();
    let mut i = 0;

    while i < events.len() {
        if matches!(&events[i], Event::Start(Tag::Heading { id: None, .. })) {
            let mut text = String::new();
            let mut j = i + 1;
            while j < events.len() {
                match &events[j] {
                    Event::End(TagEnd::Heading(_)) => break,
                    Event::Text(t) | Event::Code(t) => text.push_str(t),
                    _ => {}
                }
                j += 1;
            }

            let slug = registry.unique(&text);
            if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
                *id = Some(CowStr::from(slug));
            }
            i = j;
        }
        i += 1;
    }

    events
}

// ---------------------------------------------------------------------------
// Pass 2: Fenced code
// ---------------------------------------------------------------------------

/// Replace code blocks with pre-rendered HTML.
///
/// `mermaid` fences become a `div.mermaid`; everything else becomes
/// `pre.hljs > code > div` with escaped content.
fn render_code_blocks(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut block: Option<(String, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().unwrap_or("").to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                block = Some((lang, String::new()));
            }
            Event::Text(text) if block.is_some() => {
                if let Some((_, body)) = block.as_mut() {
                    body.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, body)) = block.take() {
                    out.push(Event::Html(CowStr::from(code_block_html(&lang, &body))));
                }
            }
            other => out.push(other),
        }
    }

    out
}

fn code_block_html(lang: &str, body: &str) -> String {
    if lang.eq_ignore_ascii_case("mermaid") {
        format!("<div class=\"mermaid\">{}</div>\n", escape_html(body))
    } else {
        format!(
            "<pre class=\"hljs\"><code><div>{}</div></code></pre>\n",
            escape_html(body)
        )
    }
}

// ---------------------------------------------------------------------------
// Pass 3: Line breaks
// ---------------------------------------------------------------------------

fn harden_soft_breaks(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    events
        .into_iter()
        .map(|event| match event {
            Event::SoftBreak => Event::HardBreak,
            other => other,
        })
        .collect()
}

/// Escape text for HTML element content and attribute values.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::{Parser, html};

    fn render(md: &str, breaks: bool) -> String {
        let events: Vec<Event<'_>> = Parser::new(md).collect();
        let mut out = String::new();
        html::push_html(&mut out, run_pipeline(events, breaks).into_iter());
        out
    }

    #[test]
    fn headings_get_ids() {
        let html = render("# Intro\n\n## Sub `code`\n\n## Intro", false);
        assert!(html.contains(r#"<h1 id="intro">Intro</h1>"#));
        assert!(html.contains(r#"<h2 id="sub-code">"#));
        assert!(html.contains(r#"<h2 id="intro-1">Intro</h2>"#));
    }

    #[test]
    fn fenced_code_is_wrapped_and_escaped() {
        let html = render("```rust\nlet a = 1 < 2;\n```", false);
        assert!(html.contains(r#"<pre class="hljs"><code><div>let a = 1 &lt; 2;"#));
    }

    #[test]
    fn mermaid_fence_becomes_div() {
        let html = render("```mermaid\ngraph TD; A-->B\n```", false);
        assert!(html.contains(r#"<div class="mermaid">graph TD; A--&gt;B"#));
        assert!(!html.contains("<pre"));
    }

    #[test]
    fn soft_breaks_hardened_when_enabled() {
        assert!(render("one\ntwo", true).contains("<br />"));
        assert!(!render("one\ntwo", false).contains("<br />"));
    }

    #[test]
    fn escape_html_covers_specials() {
        assert_eq!(escape_html(r#"<a href="x">&</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
