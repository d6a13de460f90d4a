//! Markup rendering seam
//!
//! The extraction pipeline is agnostic to how raw markup becomes a document
//! tree; it only consumes this contract. A wikitext renderer is built in,
//! but anything producing a [`RenderedDocument`] can stand in for it.

mod wikitext;

pub use wikitext::WikiRenderer;

use crate::tree::RenderedDocument;

/// Turns one record's raw markup into a document tree.
pub trait MarkupRenderer: Send + Sync {
    /// Render raw markup. `None` means rendering could not produce output
    /// (empty or unprocessable markup); the record is rejected downstream.
    fn render(&self, raw: &str, title: &str, language: &str) -> Option<RenderedDocument>;
}
