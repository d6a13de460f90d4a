//! Record and error types for dump ingestion

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One article's identifying and raw-content fields, assembled from the
/// dump stream. Immutable once constructed; consumed exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// Page id from the dump (never a revision id).
    pub id: String,
    /// Page title.
    pub title: String,
    /// Raw wikitext body of the latest revision.
    pub text: String,
    /// Language code of the dump this record came from.
    pub language: String,
}

impl PageRecord {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            text: text.into(),
            language: language.into(),
        }
    }
}

/// Errors raised while scanning the dump stream. All of these are fatal to
/// the run; per-record problems are handled downstream as outcomes, not
/// errors.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("malformed dump: {0}")]
    Malformed(String),
}

impl From<quick_xml::Error> for DumpError {
    fn from(e: quick_xml::Error) -> Self {
        DumpError::Xml(e.to_string())
    }
}
