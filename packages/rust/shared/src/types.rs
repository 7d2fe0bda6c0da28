//! Core domain types shared across singlehtml crates.

use std::fmt;

/// Attribution comment body placed before the `<html>` element of every artifact.
pub const ATTRIBUTION: &str = concat!(" Generated by singlehtml ", env!("CARGO_PKG_VERSION"), " ");

// ---------------------------------------------------------------------------
// MenuEntry
// ---------------------------------------------------------------------------

/// Heading level classification used to style menu links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuLevel {
    /// An `h1` heading.
    H1,
    /// An `h2` heading.
    H2,
}

impl MenuLevel {
    /// Classify a heading tag name. Only `h1` and `h2` produce entries.
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.eq_ignore_ascii_case("h1") {
            Some(Self::H1)
        } else if tag.eq_ignore_ascii_case("h2") {
            Some(Self::H2)
        } else {
            None
        }
    }

    /// CSS class applied to the menu link.
    pub fn class_name(self) -> &'static str {
        match self {
            Self::H1 => "menu-h1",
            Self::H2 => "menu-h2",
        }
    }
}

impl fmt::Display for MenuLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// One table-of-contents entry derived from an `h1`/`h2` heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    /// Heading level classification.
    pub level: MenuLevel,
    /// The heading's `id` attribute, empty when it has none.
    pub anchor: String,
    /// Display text (the heading's text content).
    pub text: String,
}

impl MenuEntry {
    /// Link target for this entry (`#anchor`, or `#` when the heading has no id).
    pub fn href(&self) -> String {
        format!("#{}", self.anchor)
    }
}

// ---------------------------------------------------------------------------
// ConsolidateReport
// ---------------------------------------------------------------------------

/// Counts of what a consolidation pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidateReport {
    /// `file:` stylesheet links replaced by inline styles.
    pub stylesheets_inlined: usize,
    /// Images rewritten to `data:` URIs.
    pub images_inlined: usize,
    /// Images removed because their source could not be resolved.
    pub images_removed: usize,
    /// `script` elements removed.
    pub scripts_removed: usize,
    /// Menu entries generated (zero when the menu is disabled).
    pub menu_entries: usize,
    /// Whether an extra stylesheet was appended.
    pub extra_stylesheet: bool,
}
