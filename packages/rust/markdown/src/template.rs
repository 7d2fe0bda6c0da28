//! Document template and stylesheet references for rendered Markdown.

use std::path::{Path, PathBuf};

use tracing::warn;
use url::Url;

use crate::passes::escape_html;

/// Built-in document stylesheet, embedded when default styles are enabled.
pub(crate) const DEFAULT_CSS: &str = r#"
body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", "Helvetica Neue", Helvetica, "Ubuntu", "Droid Sans", sans-serif;
    font-size: 14px;
    padding: 0 26px;
    line-height: 1.6;
    word-wrap: break-word;
}

h1, h2 {
    padding-bottom: 0.3em;
    border-bottom: 1px solid #eaecef;
}

code {
    font-family: Menlo, Monaco, Consolas, "Droid Sans Mono", "Courier New", monospace;
    font-size: 1em;
}

pre.hljs {
    padding: 16px;
    overflow: auto;
    border-radius: 3px;
    background-color: #1e1e1e;
    color: #dcdcdc;
}

pre.hljs code > div {
    white-space: pre;
}

table {
    border-collapse: collapse;
}

table > thead > tr > th, table > tbody > tr > td {
    padding: 5px 10px;
    border: 1px solid #ddd;
}

blockquote {
    margin: 0 7px 0 5px;
    padding: 0 16px 0 10px;
    border-left: 5px solid rgba(0, 122, 204, 0.5);
}

img {
    max-width: 100%;
}

@media print {
    pre.hljs {
        white-space: pre-wrap;
    }
}
"#;

/// Assemble the full HTML document around rendered body content.
pub(crate) fn make_html(title: &str, styles: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>{title}</title>\n\
         <meta http-equiv=\"Content-type\" content=\"text/html;charset=UTF-8\">\n\
         {styles}\n</head>\n<body>\n{content}\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

/// Build the `<style>`/`<link>` block for the document head.
pub(crate) fn make_styles(source: &Path, include_default: bool, user_styles: &[String]) -> String {
    let mut out = String::new();

    if include_default {
        out.push_str("\n<style>\n");
        out.push_str(DEFAULT_CSS);
        out.push_str("\n</style>\n");
    }

    for href in user_styles {
        match fix_href(source, href) {
            Some(href) => out.push_str(&format!(
                "<link rel=\"stylesheet\" href=\"{}\" type=\"text/css\">",
                escape_html(&href)
            )),
            None => warn!(href, "skipping unresolvable stylesheet"),
        }
    }

    out
}

/// Resolve a configured stylesheet reference to a link `href`.
///
/// `http(s)` URLs pass through; `~` expands to the home directory; absolute
/// paths and paths relative to the Markdown file become `file:` URIs.
pub(crate) fn fix_href(source: &Path, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(href) {
        if matches!(url.scheme(), "http" | "https") {
            return Some(url.to_string());
        }
    }

    let path = if let Some(rest) = href.strip_prefix('~') {
        let home = dirs::home_dir()?;
        home.join(rest.trim_start_matches(['/', '\\']))
    } else if Path::new(href).is_absolute() {
        PathBuf::from(href)
    } else {
        source.parent().unwrap_or(Path::new("")).join(href)
    };

    let path = std::path::absolute(&path).ok()?;
    Url::from_file_path(path).ok().map(|url| url.to_string())
}
