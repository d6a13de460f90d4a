//! Ordered cleanup rules
//!
//! Each rule is one structural transformation over the content subtree.
//! The pipeline applies them in a fixed order; reordering changes output.

use crate::tree::{PageNode, RenderedDocument, PARAGRAPH_CLASS, REFERENCE_CLASS, THUMB_CLASS};
use ego_tree::NodeId;
use regex_lite::Regex;

/// Classes marking publish-date annotations.
const PUBLISH_CLASSES: &[&str] = &["publish", "published"];
/// Classes marking content hidden from rendered output.
const HIDDEN_CLASSES: &[&str] = &["noprint", "noscript", REFERENCE_CLASS];
/// Tags that contribute no prose; they flatten to a line break.
const STRUCTURAL_TAGS: &[&str] = &[
    "img", "table", "br", "noscript", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "gallery",
];
/// Purely presentational inline tags.
const STYLE_TAGS: &[&str] = &["i", "b", "span", "small", "center"];

/// Rule 1: bad links (categories, thumbnail markers) are removed outright;
/// everything else is unwrapped so the visible text stays in place.
pub(crate) fn filter_links(doc: &mut RenderedDocument, content: NodeId, bad_link: &Regex) {
    for id in doc.find_in(content, |n| n.is_tag("a")) {
        let text = doc.subtree_text(id);
        if bad_link.is_match(&text) {
            doc.remove(id);
        } else {
            doc.unwrap(id);
        }
    }
}

/// Rule 2: thumbnail containers and their captions are dropped.
pub(crate) fn remove_thumbnails(doc: &mut RenderedDocument, content: NodeId) {
    for id in doc.find_in(content, |n| n.has_class(THUMB_CLASS)) {
        doc.remove(id);
    }
}

/// Rule 3: publish-date annotations are dropped.
pub(crate) fn remove_publish_dates(doc: &mut RenderedDocument, content: NodeId) {
    for id in doc.find_in(content, |n| {
        PUBLISH_CLASSES.iter().any(|c| n.has_class(c))
    }) {
        doc.remove(id);
    }
}

/// Rule 4: comments are dropped.
pub(crate) fn remove_comments(doc: &mut RenderedDocument, content: NodeId) {
    for id in doc.find_in(content, |n| matches!(n, PageNode::Comment(_))) {
        doc.remove(id);
    }
}

/// Rule 5: non-printable blocks and inline reference markers are dropped.
pub(crate) fn remove_hidden(doc: &mut RenderedDocument, content: NodeId) {
    for id in doc.find_in(content, |n| {
        HIDDEN_CLASSES.iter().any(|c| n.has_class(c))
    }) {
        doc.remove(id);
    }
}

/// Rule 6: second-level headings naming a boilerplate section become cut
/// markers. Content after them is not touched here; the line fold halts at
/// the first marker it meets, so earlier same-level content is unaffected.
pub(crate) fn mark_trailing_sections(
    doc: &mut RenderedDocument,
    content: NodeId,
    titles: &[&str],
) {
    for id in doc.find_in(content, |n| n.is_tag("h2")) {
        let text = doc.subtree_text(id);
        if titles.iter().any(|t| *t == text.trim()) {
            doc.replace_with(id, PageNode::SectionCut);
        }
    }
}

/// Rule 7: structural nodes (images, tables, headings, lists, breaks)
/// flatten to a bare line break.
pub(crate) fn flatten_structure(doc: &mut RenderedDocument, content: NodeId) {
    for id in doc.find_in(content, |n| {
        STRUCTURAL_TAGS.iter().any(|t| n.is_tag(t))
    }) {
        doc.replace_with_text(id, "\n");
    }
}

/// Rule 8: stylistic tags are unwrapped, keeping their text.
pub(crate) fn unwrap_styling(doc: &mut RenderedDocument, content: NodeId) {
    for id in doc.find_in(content, |n| STYLE_TAGS.iter().any(|t| n.is_tag(t))) {
        doc.unwrap(id);
    }
}

/// Rule 9: paragraphs collapse to a single line of text plus one line
/// break; empty paragraphs vanish.
pub(crate) fn collapse_paragraphs(doc: &mut RenderedDocument, content: NodeId) {
    for id in doc.find_in(content, |n| n.has_class(PARAGRAPH_CLASS)) {
        let text = doc.subtree_text(id).trim().replace('\n', " ");
        if text.is_empty() {
            doc.remove(id);
        } else {
            doc.replace_with_text(id, text + "\n");
        }
    }
}
