//! The consolidation pass: rendered HTML in, single self-contained HTML out.
//!
//! Transforms run in a fixed order, one after another:
//! stylesheets, images, scripts, menu, extra stylesheet, attribution.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use scraper::Selector;
use tracing::{debug, info, instrument};

use singlehtml_resources::RemoteFetcher;
use singlehtml_shared::{ATTRIBUTION, ConsolidateReport, Result, SingleHtmlError};

use crate::document::Document;
use crate::{inline, menu};

static HEAD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("head").expect("valid selector"));

/// Per-document inputs to [`consolidate`].
#[derive(Debug, Clone)]
pub struct ConsolidateOptions {
    /// Directory relative image paths resolve against (the source's directory).
    pub base_dir: PathBuf,
    /// Inject the navigation menu.
    pub generate_toc: bool,
    /// Extra stylesheet, already resolved against the source's directory.
    pub extra_stylesheet: Option<PathBuf>,
}

/// Run every transform over `html` and serialize the result.
#[instrument(skip_all, fields(base_dir = %options.base_dir.display(), toc = options.generate_toc))]
pub async fn consolidate(
    html: &str,
    options: &ConsolidateOptions,
    fetcher: &RemoteFetcher,
) -> Result<(String, ConsolidateReport)> {
    let mut doc = Document::parse(html);
    let mut report = ConsolidateReport::default();

    report.stylesheets_inlined = inline::inline_stylesheets(&mut doc).await?;

    let images = inline::inline_images(&mut doc, &options.base_dir, fetcher).await?;
    report.images_inlined = images.inlined;
    report.images_removed = images.removed;

    report.scripts_removed = inline::strip_scripts(&mut doc);

    if options.generate_toc {
        report.menu_entries = menu::inject_menu(&mut doc);
    }

    if let Some(path) = &options.extra_stylesheet {
        report.extra_stylesheet = append_extra_stylesheet(&mut doc, path).await?;
    }

    add_attribution(&mut doc);

    info!(
        stylesheets = report.stylesheets_inlined,
        images = report.images_inlined,
        removed = report.images_removed,
        scripts = report.scripts_removed,
        menu = report.menu_entries,
        "document consolidated"
    );

    Ok((doc.serialize(), report))
}

/// Append the file at `path` as a `<style>` in the head. Missing file: no-op.
async fn append_extra_stylesheet(doc: &mut Document, path: &Path) -> Result<bool> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "extra stylesheet not found, skipping");
        return Ok(false);
    }

    let css = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SingleHtmlError::io(path, e))?;

    let head = doc
        .first(&HEAD)
        .ok_or_else(|| SingleHtmlError::Unexpected("document has no <head>".into()))?;
    if let Some(style) = doc.append_element(head, "style", &[]) {
        doc.append_text(style, &css);
    }
    doc.append_text(head, "\n");

    Ok(true)
}

fn add_attribution(doc: &mut Document) {
    if doc.leading_comments().iter().any(|c| c == ATTRIBUTION) {
        return;
    }
    let html = doc.root_element();
    doc.insert_comment_before(html, ATTRIBUTION);
}
