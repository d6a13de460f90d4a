//! Extraction pipeline
//!
//! Applies the ordered cleanup rules to one rendered page and produces
//! either the cleaned plain text or a reject with its reason. The pipeline
//! owns the tree exclusively for the duration of one record, so rules may
//! mutate it freely.

mod rules;

use crate::tree::{PageNode, RenderedDocument};
use ego_tree::NodeId;
use regex_lite::Regex;
use std::fmt;
use std::sync::OnceLock;

static AR_BAD_LINK: OnceLock<Regex> = OnceLock::new();
static DEFAULT_BAD_LINK: OnceLock<Regex> = OnceLock::new();

/// Arabic section titles meaning references / see-also.
const AR_SECTION_TITLES: &[&str] = &[
    "مصادر",
    "مصدر",
    "المصادر",
    "المصدر",
    "المرجع",
    "مرجع",
    "المراجع",
    "مراجع",
    "انظر أيضاً",
    "طالع أيضا",
];

/// English section titles meaning references / see-also.
const DEFAULT_SECTION_TITLES: &[&str] = &[
    "References",
    "Sources",
    "See also",
    "External links",
    "Further reading",
    "Bibliography",
];

/// Result of extracting one rendered page.
#[derive(Debug)]
pub enum ExtractionOutcome {
    /// Cleaned plain text, ready to write.
    Accepted(String),
    /// The page carries no usable prose.
    Rejected(RejectReason),
}

/// Why a page was rejected. Rejects are expected outcomes, counted rather
/// than logged as failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The renderer produced no output for the raw markup.
    Unrendered,
    /// Rendered markup below the minimum size (stub heuristic).
    RenderedTooSmall,
    /// Title contains a namespace separator; meta page, not an article.
    MetaPage,
    /// Nothing left after cleanup.
    Empty,
    /// Cleaned text below the minimum size.
    CleanedTooSmall,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unrendered => "renderer produced no output",
            Self::RenderedTooSmall => "rendered markup below minimum size",
            Self::MetaPage => "meta page title",
            Self::Empty => "empty after cleanup",
            Self::CleanedTooSmall => "cleaned text below minimum size",
        };
        f.write_str(s)
    }
}

/// One pipeline per run: the language's bad-link pattern and boilerplate
/// section titles are resolved once at construction.
pub struct ExtractionPipeline {
    min_size: usize,
    bad_link: &'static Regex,
    section_titles: &'static [&'static str],
}

impl ExtractionPipeline {
    pub fn new(min_size: usize, language: &str) -> Self {
        let (bad_link, section_titles) = match language {
            "ar" => (
                AR_BAD_LINK.get_or_init(|| {
                    Regex::new("^(تصنيف:)|(تصغير)|((left\\||right\\|)?thumb\\|(left\\||right\\|)?)")
                        .unwrap()
                }),
                AR_SECTION_TITLES,
            ),
            _ => (
                DEFAULT_BAD_LINK.get_or_init(|| {
                    Regex::new("^(Category:)|((left\\||right\\|)?thumb\\|(left\\||right\\|)?)")
                        .unwrap()
                }),
                DEFAULT_SECTION_TITLES,
            ),
        };
        Self {
            min_size,
            bad_link,
            section_titles,
        }
    }

    /// Run the full pipeline over one rendered page.
    pub fn extract(&self, mut doc: RenderedDocument) -> ExtractionOutcome {
        // Cheap stub filter before any tree work.
        if doc.rendered_len() < self.min_size {
            return ExtractionOutcome::Rejected(RejectReason::RenderedTooSmall);
        }

        let Some(heading) = doc.heading() else {
            return ExtractionOutcome::Rejected(RejectReason::Empty);
        };
        if doc.subtree_text(heading).contains(':') {
            return ExtractionOutcome::Rejected(RejectReason::MetaPage);
        }

        let Some(content) = doc.content() else {
            return ExtractionOutcome::Rejected(RejectReason::Empty);
        };

        rules::filter_links(&mut doc, content, self.bad_link);
        rules::remove_thumbnails(&mut doc, content);
        rules::remove_publish_dates(&mut doc, content);
        rules::remove_comments(&mut doc, content);
        rules::remove_hidden(&mut doc, content);
        rules::mark_trailing_sections(&mut doc, content, self.section_titles);
        rules::flatten_structure(&mut doc, content);
        rules::unwrap_styling(&mut doc, content);
        rules::collapse_paragraphs(&mut doc, content);

        let lines = lines_until_cut(&doc, content);
        if lines.is_empty() {
            return ExtractionOutcome::Rejected(RejectReason::Empty);
        }

        let text = lines.join("\n");
        if text.len() < self.min_size {
            return ExtractionOutcome::Rejected(RejectReason::CleanedTooSmall);
        }

        ExtractionOutcome::Accepted(text)
    }
}

/// Fold the content subtree's text into trimmed, non-empty lines, halting
/// at the first cut marker in document order.
fn lines_until_cut(doc: &RenderedDocument, content: NodeId) -> Vec<String> {
    let mut buffer = String::new();
    if let Some(node) = doc.tree().get(content) {
        for n in node.descendants().skip(1) {
            match n.value() {
                PageNode::Text(t) => buffer.push_str(t),
                PageNode::SectionCut => break,
                _ => {}
            }
        }
    }
    buffer
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{MarkupRenderer, WikiRenderer};
    use crate::tree::{Element, CONTENT_CLASS, PARAGRAPH_CLASS, THUMB_CLASS};
    use ego_tree::Tree;

    /// Build a document with the given paragraph texts under the content
    /// container.
    fn doc_with_paragraphs(title: &str, paragraphs: &[&str]) -> RenderedDocument {
        let mut tree = Tree::new(PageNode::element("div"));
        let mut root = tree.root_mut();
        let mut h1 = root.append(PageNode::element("h1"));
        h1.append(PageNode::text(title));
        let mut content =
            root.append(PageNode::Element(Element::with_class("div", CONTENT_CLASS)));
        for p in paragraphs {
            let mut par = content.append(PageNode::Element(Element::with_class(
                "div",
                PARAGRAPH_CLASS,
            )));
            par.append(PageNode::text(*p));
        }
        RenderedDocument::new(tree)
    }

    fn accepted(outcome: ExtractionOutcome) -> String {
        match outcome {
            ExtractionOutcome::Accepted(text) => text,
            ExtractionOutcome::Rejected(reason) => panic!("rejected: {reason}"),
        }
    }

    #[test]
    fn small_rendered_documents_are_rejected() {
        let pipeline = ExtractionPipeline::new(10_000, "en");
        let doc = doc_with_paragraphs("Small", &["Tiny."]);
        let outcome = pipeline.extract(doc);
        assert!(matches!(
            outcome,
            ExtractionOutcome::Rejected(RejectReason::RenderedTooSmall)
        ));
    }

    #[test]
    fn meta_page_titles_are_rejected() {
        let pipeline = ExtractionPipeline::new(1, "en");
        let doc = doc_with_paragraphs("Category:Science", &["Plenty of body text here."]);
        let outcome = pipeline.extract(doc);
        assert!(matches!(
            outcome,
            ExtractionOutcome::Rejected(RejectReason::MetaPage)
        ));
    }

    #[test]
    fn accepts_and_joins_paragraphs() {
        let pipeline = ExtractionPipeline::new(1, "en");
        let doc = doc_with_paragraphs("Fine", &["First paragraph.", "Second paragraph."]);
        let text = accepted(pipeline.extract(doc));
        assert_eq!(text, "First paragraph.\nSecond paragraph.");
    }

    #[test]
    fn paragraph_internal_newlines_collapse_to_spaces() {
        let pipeline = ExtractionPipeline::new(1, "en");
        let doc = doc_with_paragraphs("Fine", &["Line one\nline two"]);
        let text = accepted(pipeline.extract(doc));
        assert_eq!(text, "Line one line two");
    }

    #[test]
    fn bad_links_are_removed_and_good_links_unwrapped() {
        let pipeline = ExtractionPipeline::new(1, "en");

        let mut tree = Tree::new(PageNode::element("div"));
        let mut root = tree.root_mut();
        let mut h1 = root.append(PageNode::element("h1"));
        h1.append(PageNode::text("Links"));
        let mut content =
            root.append(PageNode::Element(Element::with_class("div", CONTENT_CLASS)));
        let mut par = content.append(PageNode::Element(Element::with_class(
            "div",
            PARAGRAPH_CLASS,
        )));
        par.append(PageNode::text("Keep "));
        let mut good = par.append(PageNode::element("a"));
        good.append(PageNode::text("this link"));
        par.append(PageNode::text(" but not "));
        let mut bad = par.append(PageNode::element("a"));
        bad.append(PageNode::text("Category:Noise"));

        let text = accepted(pipeline.extract(RenderedDocument::new(tree)));
        assert_eq!(text, "Keep this link but not");
    }

    #[test]
    fn thumbnail_markers_count_as_bad_links() {
        let pipeline = ExtractionPipeline::new(1, "en");
        let mut tree = Tree::new(PageNode::element("div"));
        let mut root = tree.root_mut();
        let mut h1 = root.append(PageNode::element("h1"));
        h1.append(PageNode::text("Links"));
        let mut content =
            root.append(PageNode::Element(Element::with_class("div", CONTENT_CLASS)));
        let mut par = content.append(PageNode::Element(Element::with_class(
            "div",
            PARAGRAPH_CLASS,
        )));
        let mut marker = par.append(PageNode::element("a"));
        marker.append(PageNode::text("left|thumb|caption text"));
        par.append(PageNode::text("Prose survives."));

        let text = accepted(pipeline.extract(RenderedDocument::new(tree)));
        assert_eq!(text, "Prose survives.");
    }

    #[test]
    fn arabic_category_links_are_removed() {
        let pipeline = ExtractionPipeline::new(1, "ar");
        let mut tree = Tree::new(PageNode::element("div"));
        let mut root = tree.root_mut();
        let mut h1 = root.append(PageNode::element("h1"));
        h1.append(PageNode::text("مقالة"));
        let mut content =
            root.append(PageNode::Element(Element::with_class("div", CONTENT_CLASS)));
        let mut par = content.append(PageNode::Element(Element::with_class(
            "div",
            PARAGRAPH_CLASS,
        )));
        par.append(PageNode::text("نص المقالة "));
        let mut cat = par.append(PageNode::element("a"));
        cat.append(PageNode::text("تصنيف:علوم"));

        let text = accepted(pipeline.extract(RenderedDocument::new(tree)));
        assert_eq!(text, "نص المقالة");
    }

    #[test]
    fn boilerplate_section_truncates_everything_after_it() {
        let pipeline = ExtractionPipeline::new(1, "en");
        let mut tree = Tree::new(PageNode::element("div"));
        let mut root = tree.root_mut();
        let mut h1 = root.append(PageNode::element("h1"));
        h1.append(PageNode::text("Article"));
        let mut content =
            root.append(PageNode::Element(Element::with_class("div", CONTENT_CLASS)));
        let mut par = content.append(PageNode::Element(Element::with_class(
            "div",
            PARAGRAPH_CLASS,
        )));
        par.append(PageNode::text("Hello world."));
        let mut h2 = content.append(PageNode::element("h2"));
        h2.append(PageNode::text("See also"));
        let mut trailing = content.append(PageNode::Element(Element::with_class(
            "div",
            PARAGRAPH_CLASS,
        )));
        trailing.append(PageNode::text("Trailing boilerplate."));

        let text = accepted(pipeline.extract(RenderedDocument::new(tree)));
        assert_eq!(text, "Hello world.");
    }

    #[test]
    fn non_boilerplate_headings_just_flatten() {
        let pipeline = ExtractionPipeline::new(1, "en");
        let mut tree = Tree::new(PageNode::element("div"));
        let mut root = tree.root_mut();
        let mut h1 = root.append(PageNode::element("h1"));
        h1.append(PageNode::text("Article"));
        let mut content =
            root.append(PageNode::Element(Element::with_class("div", CONTENT_CLASS)));
        let mut h2 = content.append(PageNode::element("h2"));
        h2.append(PageNode::text("History"));
        let mut par = content.append(PageNode::Element(Element::with_class(
            "div",
            PARAGRAPH_CLASS,
        )));
        par.append(PageNode::text("Body under the heading."));

        let text = accepted(pipeline.extract(RenderedDocument::new(tree)));
        assert_eq!(text, "Body under the heading.");
    }

    #[test]
    fn hidden_and_comment_nodes_are_dropped() {
        let pipeline = ExtractionPipeline::new(1, "en");
        let mut tree = Tree::new(PageNode::element("div"));
        let mut root = tree.root_mut();
        let mut h1 = root.append(PageNode::element("h1"));
        h1.append(PageNode::text("Article"));
        let mut content =
            root.append(PageNode::Element(Element::with_class("div", CONTENT_CLASS)));
        let mut par = content.append(PageNode::Element(Element::with_class(
            "div",
            PARAGRAPH_CLASS,
        )));
        par.append(PageNode::text("Visible."));
        let mut hidden = par.append(PageNode::Element(Element::with_class("span", "noprint")));
        hidden.append(PageNode::text("invisible"));
        par.append(PageNode::Comment("a comment".to_string()));
        let mut thumb = content.append(PageNode::Element(Element::with_class("div", THUMB_CLASS)));
        thumb.append(PageNode::text("caption"));

        let text = accepted(pipeline.extract(RenderedDocument::new(tree)));
        assert_eq!(text, "Visible.");
    }

    #[test]
    fn extraction_is_idempotent_across_fresh_trees() {
        let renderer = WikiRenderer::new();
        let raw = "Intro paragraph with '''bold''' text.\n\n== See also ==\n* [[Other page]]";
        let pipeline = ExtractionPipeline::new(1, "en");

        let first = accepted(pipeline.extract(renderer.render(raw, "Page", "en").unwrap()));
        let second = accepted(pipeline.extract(renderer.render(raw, "Page", "en").unwrap()));
        assert_eq!(first, second);
        assert_eq!(first, "Intro paragraph with bold text.");
    }

    #[test]
    fn cleaned_text_below_minimum_is_rejected() {
        let pipeline = ExtractionPipeline::new(500, "en");
        // Markup-heavy but prose-thin: lots of elements, little text.
        let mut tree = Tree::new(PageNode::element("div"));
        let mut root = tree.root_mut();
        let mut h1 = root.append(PageNode::element("h1"));
        h1.append(PageNode::text("Article"));
        let mut content =
            root.append(PageNode::Element(Element::with_class("div", CONTENT_CLASS)));
        for _ in 0..40 {
            let mut thumb =
                content.append(PageNode::Element(Element::with_class("div", THUMB_CLASS)));
            thumb.append(PageNode::text("caption caption caption"));
        }
        let mut par = content.append(PageNode::Element(Element::with_class(
            "div",
            PARAGRAPH_CLASS,
        )));
        par.append(PageNode::text("Short."));

        let outcome = pipeline.extract(RenderedDocument::new(tree));
        assert!(matches!(
            outcome,
            ExtractionOutcome::Rejected(RejectReason::CleanedTooSmall)
        ));
    }
}
