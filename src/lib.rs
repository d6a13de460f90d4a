//! dumptext: plain-text corpus extraction from MediaWiki XML dumps
//!
//! A single streaming pass over a multi-gigabyte dump, featuring:
//! - Incremental dump reading (plain or bzip2) with bounded memory
//! - Wikitext rendering into a document tree behind a renderer seam
//! - An ordered tree-cleanup pipeline that keeps only running prose
//! - Deterministic, hash-bucketed output layout for reproducible corpora
//! - A bounded reader-to-worker queue with a fixed worker pool

pub mod config;
pub mod corpus;
pub mod dump;
pub mod extract;
pub mod output;
pub mod render;
pub mod tree;

pub use config::Config;
