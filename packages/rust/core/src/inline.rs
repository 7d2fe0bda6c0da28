//! Resource inlining: `file:` stylesheets, images, and script removal.

use std::path::Path;
use std::sync::LazyLock;

use scraper::Selector;
use tracing::{debug, instrument, warn};

use singlehtml_resources::{
    ImageSource, RemoteFetcher, is_file_href, load_local_image, read_stylesheet,
};
use singlehtml_shared::Result;

use crate::document::Document;

static STYLESHEET_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("link[rel=stylesheet]").expect("valid selector"));
static IMAGES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("valid selector"));
static SCRIPTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid selector"));

/// Replace every `file:` stylesheet link with an inline `<style>` block.
///
/// The style block is appended as the last child of the link's parent, then
/// the link is removed. Other links (remote CDNs) are left in place. A
/// `file:` stylesheet that cannot be read fails the whole conversion.
#[instrument(skip_all)]
pub async fn inline_stylesheets(doc: &mut Document) -> Result<usize> {
    let mut inlined = 0;

    for link in doc.select_ids(&STYLESHEET_LINKS) {
        let Some(href) = doc.attr(link, "href").map(str::to_string) else {
            continue;
        };
        if !is_file_href(&href) {
            debug!(%href, "leaving non-file stylesheet link");
            continue;
        }

        let css = read_stylesheet(&href).await?;
        let Some(parent) = doc.parent(link) else {
            continue;
        };
        if let Some(style) = doc.append_element(parent, "style", &[]) {
            doc.append_text(style, &css);
        }
        doc.remove(link);

        debug!(%href, bytes = css.len(), "inlined stylesheet");
        inlined += 1;
    }

    Ok(inlined)
}

/// Counts from one image pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImageCounts {
    pub inlined: usize,
    pub removed: usize,
}

/// Replace every image `src` with a `data:` URI, one image at a time in
/// document order.
///
/// Remote sources go through `fetcher`; local paths resolve against
/// `base_dir`. An image whose bytes cannot be obtained is removed from the
/// document. Images that are already embedded, or that have no `src`, are
/// left alone. Any other failure aborts the pass.
#[instrument(skip_all, fields(base_dir = %base_dir.display()))]
pub async fn inline_images(
    doc: &mut Document,
    base_dir: &Path,
    fetcher: &RemoteFetcher,
) -> Result<ImageCounts> {
    let mut counts = ImageCounts::default();

    for img in doc.select_ids(&IMAGES) {
        let Some(src) = doc.attr(img, "src").map(str::to_string) else {
            continue;
        };

        let resolved = match ImageSource::classify(&src, base_dir) {
            ImageSource::Embedded => continue,
            ImageSource::Remote(url) => fetcher.fetch_data_uri(&url).await,
            ImageSource::Local(path) => load_local_image(&path).await,
        };

        match settle(&src, resolved)? {
            Some(data_uri) => {
                doc.set_attr(img, "src", &data_uri);
                counts.inlined += 1;
            }
            None => {
                doc.remove(img);
                counts.removed += 1;
            }
        }
    }

    Ok(counts)
}

/// `Ok(None)` means the image should be dropped.
fn settle(src: &str, resolved: Result<String>) -> Result<Option<String>> {
    match resolved {
        Ok(data_uri) => Ok(Some(data_uri)),
        Err(e) if e.is_recoverable() => {
            warn!(%src, error = %e, "removing unresolvable image");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Remove every `<script>` element.
pub fn strip_scripts(doc: &mut Document) -> usize {
    let scripts = doc.select_ids(&SCRIPTS);
    for &script in &scripts {
        doc.remove(script);
    }
    scripts.len()
}
