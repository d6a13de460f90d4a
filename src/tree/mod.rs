//! Document tree and filter primitives
//!
//! A rendered page is a tree of [`PageNode`]s backed by an `ego_tree` arena.
//! The primitives here know nothing about wikitext or cleanup policy; they
//! are the generic find/remove/unwrap/replace operations the extraction
//! rules are built from.

use ego_tree::{NodeId, Tree};

/// Class marking the content container beneath the title heading.
pub const CONTENT_CLASS: &str = "article";
/// Class marking a renderer-produced paragraph.
pub const PARAGRAPH_CLASS: &str = "paragraph";
/// Class marking a thumbnail container.
pub const THUMB_CLASS: &str = "thumb";
/// Class marking an inline reference.
pub const REFERENCE_CLASS: &str = "reference";

/// One node of a rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageNode {
    /// An element with a tag name and class list.
    Element(Element),
    /// A run of text.
    Text(String),
    /// A markup comment.
    Comment(String),
    /// Truncation boundary: everything after the first cut in document
    /// order is discarded when the cleaned text is assembled.
    SectionCut,
}

/// Tag name and classes of an element node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub classes: Vec<String>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: Vec::new(),
        }
    }

    pub fn with_class(tag: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: vec![class.into()],
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

impl PageNode {
    pub fn element(tag: impl Into<String>) -> Self {
        Self::Element(Element::new(tag))
    }

    pub fn classed(tag: impl Into<String>, class: impl Into<String>) -> Self {
        Self::Element(Element::with_class(tag, class))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// The element data, if this is an element node.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.as_element().is_some_and(|el| el.tag == tag)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.as_element().is_some_and(|el| el.has_class(class))
    }
}

/// A rendered page owned exclusively by one extraction invocation.
#[derive(Debug)]
pub struct RenderedDocument {
    tree: Tree<PageNode>,
}

impl RenderedDocument {
    pub fn new(tree: Tree<PageNode>) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &Tree<PageNode> {
        &self.tree
    }

    /// The top-level title heading, if present.
    pub fn heading(&self) -> Option<NodeId> {
        self.tree
            .root()
            .descendants()
            .find(|n| n.value().is_tag("h1"))
            .map(|n| n.id())
    }

    /// The content container beneath the heading.
    pub fn content(&self) -> Option<NodeId> {
        self.tree
            .root()
            .descendants()
            .find(|n| n.value().has_class(CONTENT_CLASS))
            .map(|n| n.id())
    }

    /// Collect the ids of all nodes below `scope` matching `pred`, in
    /// document order. Ids are collected before any mutation so rules can
    /// detach or rewrite nodes while walking the result.
    pub fn find_in<F>(&self, scope: NodeId, pred: F) -> Vec<NodeId>
    where
        F: Fn(&PageNode) -> bool,
    {
        let Some(scope) = self.tree.get(scope) else {
            return Vec::new();
        };
        scope
            .descendants()
            .skip(1)
            .filter(|n| pred(n.value()))
            .map(|n| n.id())
            .collect()
    }

    /// Concatenated text of a subtree, in document order.
    pub fn subtree_text(&self, id: NodeId) -> String {
        let Some(node) = self.tree.get(id) else {
            return String::new();
        };
        let mut out = String::new();
        for n in node.descendants() {
            if let PageNode::Text(t) = n.value() {
                out.push_str(t);
            }
        }
        out
    }

    /// Detach a node and its whole subtree.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(mut node) = self.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Remove a node but keep its children in place.
    pub fn unwrap(&mut self, id: NodeId) {
        let child_ids: Vec<NodeId> = match self.tree.get(id) {
            Some(node) => node.children().map(|c| c.id()).collect(),
            None => return,
        };
        for child in child_ids {
            if let Some(mut node) = self.tree.get_mut(id) {
                node.insert_id_before(child);
            }
        }
        self.remove(id);
    }

    /// Replace a node (and its subtree) with a single replacement node.
    pub fn replace_with(&mut self, id: NodeId, replacement: PageNode) {
        if let Some(mut node) = self.tree.get_mut(id) {
            node.insert_before(replacement);
            node.detach();
        }
    }

    /// Replace a node with bare text.
    pub fn replace_with_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.replace_with(id, PageNode::Text(text.into()));
    }

    /// Estimate of the serialized markup length of the document. Used as a
    /// stub heuristic before any cleanup runs; tags, class attributes, and
    /// text all contribute, so markup-heavy pages score high even when the
    /// prose is thin.
    pub fn rendered_len(&self) -> usize {
        let mut len = 0;
        for node in self.tree.root().descendants() {
            len += match node.value() {
                PageNode::Element(el) => {
                    let class_len = if el.classes.is_empty() {
                        0
                    } else {
                        9 + el.classes.iter().map(|c| c.len() + 1).sum::<usize>()
                    };
                    el.tag.len() * 2 + 5 + class_len
                }
                PageNode::Text(t) => t.len(),
                PageNode::Comment(t) => t.len() + 7,
                PageNode::SectionCut => 0,
            };
        }
        len
    }
}
