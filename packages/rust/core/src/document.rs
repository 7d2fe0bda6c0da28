//! Mutable HTML document backed by scraper's `ego_tree` arena.
//!
//! Every node is addressed by a [`NodeId`] handle that stays valid while the
//! tree is edited. Transforms collect ids with [`Document::select_ids`] first,
//! then mutate, so no borrow of the tree is held across an edit.

use ego_tree::NodeId;
use scraper::node::{Comment, Text};
use scraper::{ElementRef, Html, Node, Selector};

/// A parsed HTML document that supports in-place edits.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a complete HTML document.
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Ids of all attached elements matching `selector`, in document order.
    pub fn select_ids(&self, selector: &Selector) -> Vec<NodeId> {
        self.html
            .root_element()
            .select(selector)
            .map(|el| el.id())
            .collect()
    }

    /// First attached element matching `selector`.
    pub fn first(&self, selector: &Selector) -> Option<NodeId> {
        self.html
            .root_element()
            .select(selector)
            .next()
            .map(|el| el.id())
    }

    /// The `<html>` element.
    pub fn root_element(&self) -> NodeId {
        self.html.root_element().id()
    }

    /// Lowercase tag name of an element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.value().name())
    }

    /// Value of attribute `name` on an element.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.html.tree.get(id)?.value().as_element()?.attr(name)
    }

    /// Concatenated text content of an element's subtree.
    pub fn text(&self, id: NodeId) -> String {
        self.element(id)
            .map(|el| el.text().collect())
            .unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.html.tree.get(id)?.parent().map(|p| p.id())
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.html
            .tree
            .get(id)
            .map(|node| node.children().map(|c| c.id()).collect())
            .unwrap_or_default()
    }

    /// Comment texts that precede the `<html>` element.
    pub fn leading_comments(&self) -> Vec<String> {
        let Some(html) = self.html.tree.get(self.root_element()) else {
            return Vec::new();
        };
        html.prev_siblings()
            .filter_map(|n| n.value().as_comment().map(|c| c.comment.to_string()))
            .collect()
    }

    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Set (or add) an attribute on an element, keeping its position and children.
    ///
    /// The element value is rebuilt from its attributes, so namespaced
    /// attribute prefixes are not preserved. Returns `false` when `id` is not
    /// an element.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };

        let tag = el.value().name().to_string();
        let mut attrs: Vec<(String, String)> = el
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        match attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }

        let pairs: Vec<(&str, &str)> = attrs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let Some(rebuilt) = build_element(&tag, &pairs) else {
            return false;
        };

        match self.html.tree.get_mut(id) {
            Some(mut node) => {
                *node.value() = rebuilt;
                true
            }
            None => false,
        }
    }

    /// Detach a node (and its subtree) from the document.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Append a new, empty element as the last child of `parent`.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: &[(&str, &str)],
    ) -> Option<NodeId> {
        let element = build_element(tag, attrs)?;
        let mut parent = self.html.tree.get_mut(parent)?;
        Some(parent.append(element).id())
    }

    /// Append a text node as the last child of `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(mut parent) = self.html.tree.get_mut(parent) {
            parent.append(Node::Text(Text { text: text.into() }));
        }
    }

    /// Insert a comment node immediately before `sibling`.
    pub fn insert_comment_before(&mut self, sibling: NodeId, comment: &str) {
        if let Some(mut node) = self.html.tree.get_mut(sibling) {
            node.insert_before(Node::Comment(Comment {
                comment: comment.into(),
            }));
        }
    }

    /// Re-parent `nodes` under `new_parent`, appended in the given order.
    pub fn move_children(&mut self, nodes: &[NodeId], new_parent: NodeId) {
        for &child in nodes {
            if child == new_parent {
                continue;
            }
            if let Some(mut parent) = self.html.tree.get_mut(new_parent) {
                parent.append_id(child);
            }
        }
    }

    /// Serialize the document, normalizing `\r\n` to `\n`.
    pub fn serialize(&self) -> String {
        self.html.html().replace("\r\n", "\n")
    }
}

/// Build a detached element value by parsing its start tag as a fragment.
fn build_element(tag: &str, attrs: &[(&str, &str)]) -> Option<Node> {
    let mut markup = format!("<{tag}");
    for (name, value) in attrs {
        markup.push_str(&format!(" {name}=\"{}\"", escape_attr(value)));
    }
    markup.push('>');

    let fragment = Html::parse_fragment(&markup);
    fragment
        .root_element()
        .children()
        .map(|child| child.value())
        .find(|node| node.is_element())
        .cloned()
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
