//! Heading anchor generation.

use std::collections::HashMap;
use std::sync::LazyLock;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::Regex;

/// Characters `encodeURI`-style encoding escapes in addition to non-ASCII.
const ANCHOR_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Turn heading text into an anchor id.
///
/// Lowercases, collapses whitespace runs to `-`, drops ASCII and CJK
/// punctuation, trims leading/trailing dashes, then percent-encodes.
pub(crate) fn slugify(text: &str) -> String {
    static WHITESPACE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
    static PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r#"[\]\[!'#$%&()*+,./:;<=>?@\\^_{|}~`。，、；：？！…—·ˉ¨‘’“”々～‖∶＂＇｀｜〃〔〕〈〉《》「」『』．〖〗【】（）［］｛｝]"#,
        )
        .expect("valid regex")
    });

    let lowered = text.trim().to_lowercase();
    let dashed = WHITESPACE_RE.replace_all(&lowered, "-");
    let stripped = PUNCT_RE.replace_all(&dashed, "");
    let trimmed = stripped.trim_matches('-');

    utf8_percent_encode(trimmed, ANCHOR_ENCODE).to_string()
}

/// Hands out unique anchors, suffixing repeats with `-1`, `-2`, ...
#[derive(Debug, Default)]
pub(crate) struct SlugRegistry {
    seen: HashMap<String, usize>,
}

impl SlugRegistry {
    pub(crate) fn unique(&mut self, text: &str) -> String {
        let base = slugify(text);
        let count = self.seen.entry(base.clone()).or_insert(0);
        let slug = if *count == 0 {
            base
        } else {
            format!("{base}-{count}")
        };
        *count += 1;
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Getting Started"), "getting-started");
        assert_eq!(slugify("  What's new?  "), "whats-new");
        assert_eq!(slugify("API (v2): Overview"), "api-v2-overview");
    }

    #[test]
    fn slugify_trims_dashes() {
        assert_eq!(slugify("- Intro -"), "intro");
    }

    #[test]
    fn slugify_removes_cjk_punctuation_and_encodes() {
        assert_eq!(slugify("概要（説明）"), "%E6%A6%82%E8%A6%81%E8%AA%AC%E6%98%8E");
    }

    #[test]
    fn registry_suffixes_duplicates() {
        let mut registry = SlugRegistry::default();
        assert_eq!(registry.unique("Usage"), "usage");
        assert_eq!(registry.unique("Usage"), "usage-1");
        assert_eq!(registry.unique("Usage"), "usage-2");
        assert_eq!(registry.unique("Other"), "other");
    }
}
