//! Markdown-to-HTML rendering for the consolidation pipeline.
//!
//! The consolidator treats rendering as an external collaborator behind the
//! [`Renderer`] trait: given a Markdown path, produce the intermediate HTML
//! file next to it and resolve once that file is fully written.
//! [`MarkdownRenderer`] is the built-in implementation on top of `pulldown-cmark`.

mod passes;
mod slug;
mod template;

use std::future::Future;
use std::path::{Path, PathBuf};

use pulldown_cmark::{Event, Options, Parser, html};
use tracing::{debug, instrument};

use singlehtml_shared::{RenderConfig, Result, SingleHtmlError};

// ---------------------------------------------------------------------------
// Renderer contract
// ---------------------------------------------------------------------------

/// Produces the intermediate HTML document for a Markdown source.
pub trait Renderer {
    /// Render `source` to [`intermediate_path`]`(source)`.
    ///
    /// The returned future completes only after the file is written, and
    /// yields its path.
    fn render(&self, source: &Path) -> impl Future<Output = Result<PathBuf>>;
}

/// Where the renderer writes its output: the source path with an `.html` extension.
pub fn intermediate_path(source: &Path) -> PathBuf {
    source.with_extension("html")
}

// ---------------------------------------------------------------------------
// Built-in renderer
// ---------------------------------------------------------------------------

/// `pulldown-cmark` renderer producing a standalone HTML document.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    config: RenderConfig,
}

impl MarkdownRenderer {
    /// Create a renderer with the given `[render]` settings.
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render Markdown text into a complete HTML document.
    ///
    /// `source` names the document (`<title>`) and anchors relative stylesheet paths.
    pub fn render_document(&self, source: &Path, markdown: &str) -> String {
        let body = render_body(markdown, self.config.breaks);
        let styles = template::make_styles(
            source,
            self.config.include_default_styles,
            &self.config.styles,
        );
        let title = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        template::make_html(&title, &styles, &body)
    }
}

impl Renderer for MarkdownRenderer {
    #[instrument(skip(self), fields(source = %source.display()))]
    async fn render(&self, source: &Path) -> Result<PathBuf> {
        let markdown = tokio::fs::read_to_string(source)
            .await
            .map_err(|e| SingleHtmlError::io(source, e))?;

        let html = self.render_document(source, &markdown);
        let out = intermediate_path(source);

        tokio::fs::write(&out, html.as_bytes())
            .await
            .map_err(|e| SingleHtmlError::Render(format!("{}: {e}", out.display())))?;

        debug!(out = %out.display(), bytes = html.len(), "intermediate HTML written");
        Ok(out)
    }
}

/// Render Markdown body content (no template).
pub fn render_body(markdown: &str, breaks: bool) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES;

    let content = strip_front_matter(markdown);
    let events: Vec<Event<'_>> = Parser::new_ext(content, options).collect();
    let events = passes::run_pipeline(events, breaks);

    let mut out = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Drop a leading `---` fenced YAML front matter block.
fn strip_front_matter(markdown: &str) -> &str {
    let Some(rest) = markdown
        .strip_prefix("---\n")
        .or_else(|| markdown.strip_prefix("---\r\n"))
    else {
        return markdown;
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        if line.trim_end() == "---" {
            return &rest[offset..];
        }
    }

    markdown
}
