//! Corpus run orchestration
//!
//! Wires the dump reader, renderer, extraction pipeline, and output writer
//! together: a single reader feeding a bounded queue drained by a fixed
//! pool of workers.

mod coordinator;
mod progress;

pub use coordinator::{CorpusCoordinator, CorpusError};
pub use progress::{RunProgress, RunStats};
