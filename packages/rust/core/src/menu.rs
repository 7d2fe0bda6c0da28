//! Navigation menu synthesized from `h1`/`h2` headings.
//!
//! The body's existing content moves into `div#area__content`; a fixed
//! sidebar `div#area__menu` listing one link per heading is appended after
//! it, and the sidebar stylesheet goes into the head.

use std::sync::LazyLock;

use scraper::Selector;
use tracing::{debug, instrument};

use singlehtml_shared::{MenuEntry, MenuLevel};

use crate::document::Document;

static HEADINGS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2").expect("valid selector"));
static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid selector"));
static HEAD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("head").expect("valid selector"));
static EXISTING_MENU: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#area__menu").expect("valid selector"));

/// Sidebar layout: fixed 210px menu on the left, hidden when printing.
pub const MENU_CSS: &str = r#"
body {
    margin-bottom: 6em;
}
#area__menu {
    float: left;
    position: fixed;
    top: 0;
    left: 0;
    overflow: auto;
    height: 100%;
    display: block;
    width: 210px;
    border-right: 1px solid #aaa;
}
#area__menu div {
    overflow: hidden;
    padding-left: 10px;
    margin-bottom: 20px;
}
#area__menu p {
    font-size: 16px;
    font-weight: bold;
    color: #000;
    margin: 0;
}
#area__menu div ul {
    margin-bottom: 20px;
    margin: 0;
    padding: 0;
    list-style-type: none;
}
#area__menu div ul li {
    margin: 0;
    padding: 0;
    position: static;
    font-size: 9pt;
    line-height: 2.2em;
    cursor: pointer;
}
#area__menu a {
    display: block;
    color: #005282;
    text-decoration: none;
}
#area__menu a:hover {
    text-decoration: underline;
}
#area__menu a.menu-h1 {
    margin-left: 0;
}
#area__menu a.menu-h2 {
    margin-left: 20px;
}
#area__content {
    padding-left: 10px;
    margin-left: 210px;
}
@media print {
    #area__menu {
        display: none;
    }
    #area__content {
        padding-left: 0;
        margin-left: 0;
    }
}
"#;

/// One entry per `h1`/`h2`, in document order.
pub fn collect_entries(doc: &Document) -> Vec<MenuEntry> {
    doc.select_ids(&HEADINGS)
        .into_iter()
        .filter_map(|id| {
            let level = MenuLevel::from_tag(doc.tag_name(id)?)?;
            Some(MenuEntry {
                level,
                anchor: doc.attr(id, "id").unwrap_or_default().to_string(),
                text: doc.text(id).trim().to_string(),
            })
        })
        .collect()
}

/// Wrap the body and append the navigation sidebar. Returns the entry count.
///
/// A document that already carries a `div#area__menu` is left unchanged.
#[instrument(skip_all)]
pub fn inject_menu(doc: &mut Document) -> usize {
    if doc.first(&EXISTING_MENU).is_some() {
        debug!("menu already present");
        return 0;
    }
    let Some(body) = doc.first(&BODY) else {
        return 0;
    };

    let existing = doc.children(body);
    doc.append_text(body, "\n");
    let Some(content) = doc.append_element(body, "div", &[("id", "area__content")]) else {
        return 0;
    };
    doc.move_children(&existing, content);
    doc.append_text(body, "\n");

    let entries = collect_entries(doc);
    build_sidebar(doc, body, &entries);

    if let Some(head) = doc.first(&HEAD) {
        if let Some(style) = doc.append_element(head, "style", &[]) {
            doc.append_text(style, MENU_CSS);
        }
        doc.append_text(head, "\n");
    }

    debug!(entries = entries.len(), "menu injected");
    entries.len()
}

fn build_sidebar(doc: &mut Document, body: ego_tree::NodeId, entries: &[MenuEntry]) {
    let Some(menu) = doc.append_element(body, "div", &[("id", "area__menu")]) else {
        return;
    };
    doc.append_text(body, "\n");

    let Some(inner) = doc.append_element(menu, "div", &[]) else {
        return;
    };
    if let Some(title) = doc.append_element(inner, "p", &[]) {
        doc.append_text(title, "Index");
    }
    let Some(list) = doc.append_element(inner, "ul", &[]) else {
        return;
    };

    for entry in entries {
        let href = entry.href();
        let Some(item) = doc.append_element(list, "li", &[]) else {
            continue;
        };
        if let Some(link) = doc.append_element(
            item,
            "a",
            &[("href", href.as_str()), ("class", entry.level.class_name())],
        ) {
            doc.append_text(link, &entry.text);
        }
        doc.append_text(list, "\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    const PAGE: &str = "<!DOCTYPE html><html><head><title>t</title></head><body>\
        <h1 id=\"a\">A</h1><p>x</p><h2 id=\"b\">B</h2><h3 id=\"c\">C</h3></body></html>";

    #[test]
    fn entries_follow_document_order() {
        let doc = Document::parse(PAGE);
        let entries = collect_entries(&doc);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, MenuLevel::H1);
        assert_eq!(entries[0].href(), "#a");
        assert_eq!(entries[1].level, MenuLevel::H2);
        assert_eq!(entries[1].text, "B");
    }

    #[test]
    fn entry_labels_drop_surrounding_whitespace() {
        let doc = Document::parse(
            "<html><body><h1 id=\"a\">\n  Spaced <em>out</em>  \n</h1></body></html>",
        );
        let entries = collect_entries(&doc);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "Spaced out");
    }

    #[test]
    fn inject_menu_wraps_body_and_links_headings() {
        let mut doc = Document::parse(PAGE);
        assert_eq!(inject_menu(&mut doc), 2);

        let content = doc.first(&sel("body > div#area__content")).unwrap();
        assert_eq!(doc.select_ids(&sel("#area__content > h1")).len(), 1);
        assert_eq!(doc.select_ids(&sel("#area__content > p")).len(), 1);
        assert!(doc.text(content).contains('C'));

        let links = doc.select_ids(&sel("#area__menu ul li a"));
        assert_eq!(links.len(), 2);
        assert_eq!(doc.attr(links[0], "href"), Some("#a"));
        assert_eq!(doc.attr(links[0], "class"), Some("menu-h1"));
        assert_eq!(doc.attr(links[1], "href"), Some("#b"));
        assert_eq!(doc.attr(links[1], "class"), Some("menu-h2"));
        assert_eq!(doc.text(links[1]), "B");

        let menu_title = doc.first(&sel("#area__menu p")).unwrap();
        assert_eq!(doc.text(menu_title), "Index");

        let style = doc.first(&sel("head > style")).unwrap();
        assert!(doc.text(style).contains("#area__content"));
    }

    #[test]
    fn heading_without_id_links_to_fragment_root() {
        let mut doc = Document::parse("<html><body><h2>Loose</h2></body></html>");
        inject_menu(&mut doc);

        let link = doc.first(&sel("#area__menu a")).unwrap();
        assert_eq!(doc.attr(link, "href"), Some("#"));
    }

    #[test]
    fn document_without_headings_gets_empty_menu() {
        let mut doc = Document::parse("<html><body><p>plain</p></body></html>");
        assert_eq!(inject_menu(&mut doc), 0);
        assert!(doc.first(&sel("#area__menu ul")).is_some());
        assert!(doc.select_ids(&sel("#area__menu li")).is_empty());
    }

    #[test]
    fn second_injection_is_a_no_op() {
        let mut doc = Document::parse(PAGE);
        inject_menu(&mut doc);
        let once = doc.serialize();

        assert_eq!(inject_menu(&mut doc), 0);
        assert_eq!(doc.serialize(), once);
    }
}
