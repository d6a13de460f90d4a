//! Streaming dump ingestion
//!
//! Reads MediaWiki XML dumps (plain or bzip2-compressed) and yields one
//! [`PageRecord`] per `<page>` element without buffering more than one
//! page at a time.

mod reader;
mod record;

pub use reader::DumpReader;
pub use record::{DumpError, PageRecord};
