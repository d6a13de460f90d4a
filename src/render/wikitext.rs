//! Wikitext renderer
//!
//! Parses MediaWiki markup into a document tree: an `h1` title heading
//! followed by a content container holding paragraphs, headings, links,
//! lists, thumbnails, and reference spans. Comments, templates, and magic
//! words never reach the tree.

use super::MarkupRenderer;
use crate::tree::{
    Element, PageNode, RenderedDocument, CONTENT_CLASS, PARAGRAPH_CLASS, REFERENCE_CLASS,
    THUMB_CLASS,
};
use ego_tree::{NodeMut, Tree};
use regex_lite::Regex;
use std::sync::OnceLock;

static RE_NOWIKI: OnceLock<Regex> = OnceLock::new();
static RE_MAGIC_WORDS: OnceLock<Regex> = OnceLock::new();

/// File-namespace prefixes (canonical plus Arabic), lowercase.
const FILE_PREFIXES: &[&str] = &["file:", "image:", "ملف:", "صورة:"];
/// Category-namespace prefixes (canonical plus Arabic), lowercase.
const CATEGORY_PREFIXES: &[&str] = &["category:", "تصنيف:"];
/// Image parameters that mark a thumbnail.
const THUMB_MARKERS: &[&str] = &["thumb", "thumbnail", "تصغير"];

/// Built-in wikitext to document-tree renderer.
#[derive(Debug, Default)]
pub struct WikiRenderer;

impl WikiRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl MarkupRenderer for WikiRenderer {
    fn render(&self, raw: &str, title: &str, _language: &str) -> Option<RenderedDocument> {
        if raw.trim().is_empty() {
            return None;
        }

        let text = handle_nowiki(raw);
        let text = strip_comments(&text);
        let text = strip_templates(&text);
        let text = strip_magic_words(&text);

        let mut tree = Tree::new(PageNode::element("div"));
        let mut root = tree.root_mut();
        let mut heading = root.append(PageNode::element("h1"));
        heading.append(PageNode::text(title));
        let mut content = root.append(PageNode::Element(Element::with_class("div", CONTENT_CLASS)));
        build_blocks(&mut content, &text);

        Some(RenderedDocument::new(tree))
    }
}

/// Drop `<nowiki>` tags but keep their content.
fn handle_nowiki(text: &str) -> String {
    let re = RE_NOWIKI.get_or_init(|| Regex::new(r"<nowiki>(.*?)</nowiki>").unwrap());
    re.replace_all(text, "$1").to_string()
}

/// Remove `<!-- ... -->` comments, including multi-line ones.
fn strip_comments(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        match rest.find("<!--") {
            Some(start) => {
                result.push_str(&rest[..start]);
                match rest[start..].find("-->") {
                    Some(end) => rest = &rest[start + end + 3..],
                    None => break,
                }
            }
            None => {
                result.push_str(rest);
                break;
            }
        }
    }
    result
}

/// Remove `{{ ... }}` templates, tracking nesting depth.
fn strip_templates(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'{') {
            depth += 1;
            chars.next();
        } else if c == '}' && chars.peek() == Some(&'}') {
            depth = depth.saturating_sub(1);
            chars.next();
        } else if depth == 0 {
            result.push(c);
        }
    }

    result
}

/// Remove magic words like `__NOTOC__`.
fn strip_magic_words(text: &str) -> String {
    let re = RE_MAGIC_WORDS.get_or_init(|| Regex::new(r"__[A-Z]+__").unwrap());
    re.replace_all(text, "").to_string()
}

/// Line-oriented block parser: headings, lists, tables, paragraphs.
fn build_blocks(content: &mut NodeMut<PageNode>, text: &str) {
    let mut paragraph = String::new();
    let mut table_depth = 0usize;
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        let trimmed = line.trim();

        // Table bodies contribute no prose; the table node itself is
        // flattened away during extraction.
        if table_depth > 0 {
            if trimmed.starts_with("{|") {
                table_depth += 1;
            } else if trimmed.starts_with("|}") {
                table_depth -= 1;
            }
            continue;
        }
        if trimmed.starts_with("{|") {
            flush_paragraph(content, &mut paragraph);
            table_depth = 1;
            content.append(PageNode::element("table"));
            continue;
        }

        if trimmed.is_empty() || trimmed == "----" {
            flush_paragraph(content, &mut paragraph);
            continue;
        }

        if let Some((level, inner)) = parse_heading(trimmed) {
            flush_paragraph(content, &mut paragraph);
            let tag = match level {
                2 => "h2",
                3 => "h3",
                4 => "h4",
                5 => "h5",
                _ => "h6",
            };
            let mut heading = content.append(PageNode::element(tag));
            append_inline(&mut heading, inner);
            continue;
        }

        if trimmed.starts_with(['*', '#']) {
            flush_paragraph(content, &mut paragraph);
            let tag = if trimmed.starts_with('#') { "ol" } else { "ul" };
            let mut list = content.append(PageNode::element(tag));
            let mut item = trimmed;
            loop {
                let body = item.trim_start_matches(['*', '#']).trim();
                if !body.is_empty() {
                    let mut li = list.append(PageNode::element("li"));
                    append_inline(&mut li, body);
                }
                let continues = lines
                    .peek()
                    .is_some_and(|next| next.trim().starts_with(['*', '#']));
                if !continues {
                    break;
                }
                item = lines.next().map(str::trim).unwrap_or_default();
            }
            continue;
        }

        // Definition-list markers carry no structure worth keeping.
        let stripped = trimmed.trim_start_matches([';', ':']).trim_start();
        if !paragraph.is_empty() {
            paragraph.push('\n');
        }
        paragraph.push_str(stripped);
    }

    flush_paragraph(content, &mut paragraph);
}

fn flush_paragraph(content: &mut NodeMut<PageNode>, buf: &mut String) {
    let text = buf.trim();
    if !text.is_empty() {
        let mut par = content.append(PageNode::Element(Element::with_class(
            "div",
            PARAGRAPH_CLASS,
        )));
        append_inline(&mut par, text);
    }
    buf.clear();
}

/// `== Heading ==` lines. Levels clamp to h2..h6; the lone h1 is the page
/// title heading.
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    if !line.starts_with('=') || !line.ends_with('=') || line.len() < 3 {
        return None;
    }
    let lead = line.bytes().take_while(|&b| b == b'=').count();
    let trail = line.bytes().rev().take_while(|&b| b == b'=').count();
    if lead + trail >= line.len() {
        return None;
    }
    let inner = line[lead..line.len() - trail].trim();
    if inner.is_empty() {
        return None;
    }
    Some((lead.min(trail).clamp(2, 6), inner))
}

/// Inline parser: links, file inclusions, bold/italic, refs, line breaks.
fn append_inline(parent: &mut NodeMut<PageNode>, s: &str) {
    let mut text_run = String::new();
    let mut i = 0;

    while i < s.len() {
        let rest = &s[i..];

        if rest.starts_with("[[") {
            if let Some(end) = find_link_end(rest) {
                flush_text(parent, &mut text_run);
                append_link(parent, &rest[2..end]);
                i += end + 2;
            } else {
                text_run.push_str("[[");
                i += 2;
            }
        } else if rest.starts_with("[http://") || rest.starts_with("[https://") {
            if let Some(close) = rest.find(']') {
                flush_text(parent, &mut text_run);
                let inner = &rest[1..close];
                let display = inner
                    .split_once(' ')
                    .map(|(_, label)| label.trim())
                    .filter(|label| !label.is_empty())
                    .unwrap_or(inner);
                let mut link = parent.append(PageNode::element("a"));
                link.append(PageNode::text(display));
                i += close + 1;
            } else {
                text_run.push('[');
                i += 1;
            }
        } else if rest.starts_with("'''''") {
            flush_text(parent, &mut text_run);
            if let Some(close) = rest[5..].find("'''''") {
                let mut bold = parent.append(PageNode::element("b"));
                let mut italic = bold.append(PageNode::element("i"));
                append_inline(&mut italic, &rest[5..5 + close]);
                i += close + 10;
            } else {
                i += 5;
            }
        } else if rest.starts_with("'''") {
            flush_text(parent, &mut text_run);
            if let Some(close) = rest[3..].find("'''") {
                let mut bold = parent.append(PageNode::element("b"));
                append_inline(&mut bold, &rest[3..3 + close]);
                i += close + 6;
            } else {
                i += 3;
            }
        } else if rest.starts_with("''") {
            flush_text(parent, &mut text_run);
            if let Some(close) = rest[2..].find("''") {
                let mut italic = parent.append(PageNode::element("i"));
                append_inline(&mut italic, &rest[2..2 + close]);
                i += close + 4;
            } else {
                i += 2;
            }
        } else if starts_with_ci(rest, "<ref") {
            flush_text(parent, &mut text_run);
            i += consume_ref(parent, rest);
        } else if starts_with_ci(rest, "<br") {
            flush_text(parent, &mut text_run);
            parent.append(PageNode::element("br"));
            i += rest.find('>').map(|p| p + 1).unwrap_or(rest.len());
        } else if let Some(c) = rest.chars().next() {
            text_run.push(c);
            i += c.len_utf8();
        } else {
            break;
        }
    }

    flush_text(parent, &mut text_run);
}

fn flush_text(parent: &mut NodeMut<PageNode>, run: &mut String) {
    if !run.is_empty() {
        parent.append(PageNode::Text(std::mem::take(run)));
    }
}

/// Byte offset of the `]]` closing a leading `[[`, honoring nesting.
fn find_link_end(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'[' && bytes[i + 1] == b'[' {
            depth += 1;
            i += 2;
        } else if bytes[i] == b']' && bytes[i + 1] == b']' {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    None
}

/// One `[[...]]` link body: file inclusion, category link, interlanguage
/// link, or ordinary article link.
fn append_link(parent: &mut NodeMut<PageNode>, inner: &str) {
    let (target, display) = match inner.split_once('|') {
        Some((target, display)) => (target.trim(), Some(display)),
        None => (inner.trim(), None),
    };
    let lower = target.to_lowercase();

    if FILE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        append_file(parent, inner);
    } else if CATEGORY_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        // Category links keep the namespace prefix as their visible text;
        // the extraction pipeline's link filter keys off it.
        let mut link = parent.append(PageNode::element("a"));
        link.append(PageNode::text(target));
    } else if is_interwiki(&lower) {
        // Interlanguage link; contributes nothing.
    } else {
        let display = display
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(target);
        let mut link = parent.append(PageNode::element("a"));
        append_inline(&mut link, display);
    }
}

/// `[[File:...]]` inclusions: thumbnails become classed containers carrying
/// their caption, plain inclusions become bare `img` nodes.
fn append_file(parent: &mut NodeMut<PageNode>, inner: &str) {
    let params: Vec<&str> = inner.split('|').map(str::trim).collect();
    let is_thumb = params
        .iter()
        .skip(1)
        .any(|p| THUMB_MARKERS.contains(&p.to_lowercase().as_str()));

    if !is_thumb {
        parent.append(PageNode::element("img"));
        return;
    }

    let mut thumb = parent.append(PageNode::Element(Element::with_class("div", THUMB_CLASS)));
    if params.len() > 1 {
        if let Some(caption) = params.last() {
            if !is_image_option(caption) {
                append_inline(&mut thumb, caption);
            }
        }
    }
}

fn is_image_option(param: &str) -> bool {
    let lower = param.to_lowercase();
    THUMB_MARKERS.contains(&lower.as_str())
        || matches!(
            lower.as_str(),
            "left" | "right" | "center" | "none" | "frameless" | "border" | "upright"
        )
        || lower.ends_with("px")
}

/// A 2-3 letter language code before a colon marks an interlanguage link.
fn is_interwiki(lower_target: &str) -> bool {
    match lower_target.split_once(':') {
        Some((prefix, _)) => {
            (2..=3).contains(&prefix.len()) && prefix.bytes().all(|b| b.is_ascii_lowercase())
        }
        None => false,
    }
}

/// Consume a `<ref>` tag at the start of `rest`, appending a reference
/// span. Returns the number of bytes consumed.
fn consume_ref(parent: &mut NodeMut<PageNode>, rest: &str) -> usize {
    let Some(gt) = rest.find('>') else {
        // Unterminated opening tag; swallow the rest of the run.
        return rest.len();
    };

    if rest[..gt].ends_with('/') {
        parent.append(PageNode::Element(Element::with_class(
            "span",
            REFERENCE_CLASS,
        )));
        return gt + 1;
    }

    let body = &rest[gt + 1..];
    match find_ci(body, "</ref") {
        Some(close) => {
            let mut reference = parent.append(PageNode::Element(Element::with_class(
                "span",
                REFERENCE_CLASS,
            )));
            reference.append(PageNode::text(&body[..close]));
            let tail = &body[close..];
            let skip = tail.find('>').map(|p| p + 1).unwrap_or(tail.len());
            gt + 1 + close + skip
        }
        // No closing tag; drop the opener and keep scanning.
        None => gt + 1,
    }
}

fn starts_with_ci(haystack: &str, needle: &str) -> bool {
    haystack.len() >= needle.len()
        && haystack.as_bytes()[..needle.len()].eq_ignore_ascii_case(needle.as_bytes())
}

fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}
