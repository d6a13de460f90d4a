//! Run coordinator
//!
//! One blocking reader task discovers records in document order and feeds a
//! bounded queue; a fixed pool of workers performs render, extract, and
//! write for one record at a time. The queue bound is the backpressure that
//! keeps the reader from outrunning the workers.

use super::progress::{RunProgress, RunStats};
use crate::config::Config;
use crate::dump::{DumpError, DumpReader, PageRecord};
use crate::extract::{ExtractionOutcome, ExtractionPipeline, RejectReason};
use crate::output::{OutputWriter, WriteError};
use crate::render::MarkupRenderer;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Errors that abort a whole corpus run.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error(transparent)]
    Dump(#[from] DumpError),

    #[error("task failed: {0}")]
    Join(String),
}

/// What happened to one record. Every per-record fault is converted into
/// one of these; nothing from one record's processing can affect another.
enum RecordOutcome {
    Written { bytes: u64 },
    Rejected(RejectReason),
    Failed(WriteError),
}

/// Orchestrates one full pass over a dump.
pub struct CorpusCoordinator {
    renderer: Arc<dyn MarkupRenderer>,
    pipeline: Arc<ExtractionPipeline>,
    language: String,
    workers: usize,
    queue_depth: usize,
    quiet: bool,
}

impl CorpusCoordinator {
    pub fn new(config: &Config, renderer: Arc<dyn MarkupRenderer>) -> Self {
        let workers = if config.runtime.workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            config.runtime.workers
        };

        Self {
            renderer,
            pipeline: Arc::new(ExtractionPipeline::new(
                config.extraction.min_size,
                &config.extraction.language,
            )),
            language: config.extraction.language.clone(),
            workers,
            queue_depth: config.runtime.queue_depth,
            quiet: false,
        }
    }

    /// Set quiet mode (no progress output).
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Run one pass over the dump, writing accepted pages under `out_root`.
    pub async fn run(&self, dump_path: &Path, out_root: &Path) -> Result<RunStats, CorpusError> {
        info!(
            "Extracting from {} with {} workers",
            dump_path.display(),
            self.workers
        );

        let progress = Arc::new(RunProgress::new(self.quiet));
        let writer = Arc::new(OutputWriter::new(out_root));

        let (tx, rx) = mpsc::channel::<PageRecord>(self.queue_depth);
        let rx = Arc::new(Mutex::new(rx));

        // Single sequential producer: record boundaries can only be found
        // in document order. A fatal stream error drops the sender, so the
        // workers drain what is queued and stop.
        let reader_path = dump_path.to_path_buf();
        let language = self.language.clone();
        let reader_handle = tokio::task::spawn_blocking(move || -> Result<(), DumpError> {
            let reader = DumpReader::open(&reader_path, language)?;
            for record in reader {
                let record = record?;
                if tx.blocking_send(record).is_err() {
                    break;
                }
            }
            Ok(())
        });

        let mut worker_handles = Vec::with_capacity(self.workers);
        for _ in 0..self.workers {
            let rx = Arc::clone(&rx);
            let renderer = Arc::clone(&self.renderer);
            let pipeline = Arc::clone(&self.pipeline);
            let writer = Arc::clone(&writer);
            let progress = Arc::clone(&progress);

            worker_handles.push(tokio::spawn(async move {
                loop {
                    let record = { rx.lock().await.recv().await };
                    let Some(record) = record else { break };

                    let title = record.title.clone();
                    let renderer = Arc::clone(&renderer);
                    let pipeline = Arc::clone(&pipeline);
                    let writer = Arc::clone(&writer);

                    let outcome = tokio::task::spawn_blocking(move || {
                        process_record(renderer.as_ref(), &pipeline, &writer, &record)
                    })
                    .await;

                    match outcome {
                        Ok(RecordOutcome::Written { bytes }) => {
                            progress.page_written(&title, bytes);
                        }
                        Ok(RecordOutcome::Rejected(reason)) => {
                            debug!("rejected '{}': {}", title, reason);
                            progress.page_rejected(&title);
                        }
                        Ok(RecordOutcome::Failed(_)) => {
                            progress.page_failed(&title);
                        }
                        Err(e) => {
                            warn!("worker task for '{}' failed: {}", title, e);
                            progress.page_failed(&title);
                        }
                    }
                }
            }));
        }

        for handle in worker_handles {
            handle
                .await
                .map_err(|e| CorpusError::Join(e.to_string()))?;
        }

        reader_handle
            .await
            .map_err(|e| CorpusError::Join(e.to_string()))??;

        progress.finish();
        if !self.quiet {
            progress.print_summary();
        }

        Ok(progress.get_stats())
    }
}

/// Render, extract, and write one record. Write failures are logged with
/// the record's id and title, then reported as a per-record failure.
fn process_record(
    renderer: &dyn MarkupRenderer,
    pipeline: &ExtractionPipeline,
    writer: &OutputWriter,
    record: &PageRecord,
) -> RecordOutcome {
    let Some(doc) = renderer.render(&record.text, &record.title, &record.language) else {
        return RecordOutcome::Rejected(RejectReason::Unrendered);
    };

    match pipeline.extract(doc) {
        ExtractionOutcome::Accepted(text) => {
            match writer.write(&record.id, &record.title, &text) {
                Ok(bytes) => RecordOutcome::Written { bytes },
                Err(e) => {
                    warn!(
                        "failed to write page '{}' (id {}): {}",
                        record.title, record.id, e
                    );
                    RecordOutcome::Failed(e)
                }
            }
        }
        ExtractionOutcome::Rejected(reason) => RecordOutcome::Rejected(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ExtractionConfig, RuntimeConfig};
    use crate::render::WikiRenderer;
    use std::io::Write;
    use tempfile::TempDir;

    fn test_config() -> Config {
        Config {
            extraction: ExtractionConfig {
                min_size: 10,
                language: "en".to_string(),
            },
            runtime: RuntimeConfig {
                workers: 2,
                queue_depth: 8,
            },
            ..Default::default()
        }
    }

    fn write_dump(xml: &str) -> std::path::PathBuf {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(xml.as_bytes()).unwrap();
        let (_, path) = file.keep().unwrap();
        path
    }

    #[tokio::test]
    async fn run_writes_accepted_pages_and_counts_rejects() {
        let xml = r#"<mediawiki>
  <page>
    <title>Long Article</title>
    <id>1</id>
    <revision>
      <id>11</id>
      <text>A reasonably long paragraph of article prose that easily clears the minimum size threshold for this test run.</text>
    </revision>
  </page>
  <page>
    <title>Category:Meta</title>
    <id>2</id>
    <revision>
      <id>12</id>
      <text>Meta pages are rejected regardless of how much body content they carry, because of the namespace separator.</text>
    </revision>
  </page>
</mediawiki>"#;
        let dump = write_dump(xml);
        let out = TempDir::new().unwrap();

        let coordinator =
            CorpusCoordinator::new(&test_config(), Arc::new(WikiRenderer::new())).with_quiet(true);
        let stats = coordinator.run(&dump, out.path()).await.unwrap();

        assert_eq!(stats.pages_processed, 2);
        assert_eq!(stats.pages_written, 1);
        assert_eq!(stats.pages_rejected, 1);
        assert_eq!(stats.pages_failed, 0);

        let path = OutputWriter::new(out.path()).target_path("1", "Long Article");
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("A reasonably long paragraph"));
    }

    #[tokio::test]
    async fn malformed_dump_aborts_the_run() {
        let dump = write_dump("<mediawiki><page><title>Broken</title><id>1</id>");
        let out = TempDir::new().unwrap();

        let coordinator =
            CorpusCoordinator::new(&test_config(), Arc::new(WikiRenderer::new())).with_quiet(true);
        let result = coordinator.run(&dump, out.path()).await;
        assert!(matches!(result, Err(CorpusError::Dump(_))));
    }
}
