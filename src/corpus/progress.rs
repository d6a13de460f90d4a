//! Progress tracking for corpus runs

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

/// Counters for one corpus run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Total pages handed to workers.
    pub pages_processed: usize,
    /// Pages written to the corpus.
    pub pages_written: usize,
    /// Pages rejected (stubs, meta pages, empty after cleanup).
    pub pages_rejected: usize,
    /// Pages that hit an unexpected failure (write I/O, worker panic).
    pub pages_failed: usize,
    /// Plain-text bytes written.
    pub bytes_written: u64,
    /// Wall-clock time in seconds.
    pub elapsed_seconds: f64,
    /// Current pages per second rate.
    pub pages_per_second: f64,
}

impl RunStats {
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.pages_per_second = self.pages_processed as f64 / self.elapsed_seconds;
        }
    }
}

/// Shared progress sink for the worker pool.
pub struct RunProgress {
    /// Progress bar (None in quiet mode).
    progress_bar: Option<ProgressBar>,
    start_time: Instant,
    processed: AtomicUsize,
    written: AtomicUsize,
    rejected: AtomicUsize,
    failed: AtomicUsize,
    bytes_written: AtomicU64,
}

impl RunProgress {
    pub fn new(quiet: bool) -> Self {
        let progress_bar = if !quiet {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {pos} pages {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            Some(pb)
        } else {
            None
        };

        Self {
            progress_bar,
            start_time: Instant::now(),
            processed: AtomicUsize::new(0),
            written: AtomicUsize::new(0),
            rejected: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            bytes_written: AtomicU64::new(0),
        }
    }

    pub fn page_written(&self, title: &str, bytes: u64) {
        self.written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
        self.tick(title);
    }

    pub fn page_rejected(&self, title: &str) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        self.tick(title);
    }

    pub fn page_failed(&self, title: &str) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.tick(title);
    }

    fn tick(&self, title: &str) {
        let processed = self.processed.fetch_add(1, Ordering::Relaxed) + 1;

        if let Some(ref pb) = self.progress_bar {
            pb.set_position(processed as u64);

            let elapsed = self.start_time.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 {
                processed as f64 / elapsed
            } else {
                0.0
            };

            // Truncate safely for UTF-8 titles.
            let display_title = if title.chars().count() > 30 {
                let truncated: String = title.chars().take(27).collect();
                format!("{}...", truncated)
            } else {
                title.to_string()
            };

            pb.set_message(format!("{:.1} pages/s | {}", rate, display_title));
        }
    }

    pub fn get_stats(&self) -> RunStats {
        let mut stats = RunStats {
            pages_processed: self.processed.load(Ordering::Relaxed),
            pages_written: self.written.load(Ordering::Relaxed),
            pages_rejected: self.rejected.load(Ordering::Relaxed),
            pages_failed: self.failed.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            elapsed_seconds: self.start_time.elapsed().as_secs_f64(),
            pages_per_second: 0.0,
        };
        stats.update_rate();
        stats
    }

    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            let stats = self.get_stats();
            pb.finish_with_message(format!(
                "Done! {} written, {} rejected, {} failed, {:.1} pages/s",
                stats.pages_written,
                stats.pages_rejected,
                stats.pages_failed,
                stats.pages_per_second
            ));
        }
    }

    /// Print summary to console.
    pub fn print_summary(&self) {
        let stats = self.get_stats();

        println!("\nExtraction Summary");
        println!("==================");
        println!("Pages processed: {}", stats.pages_processed);
        println!("Pages written:   {}", stats.pages_written);
        println!("Pages rejected:  {}", stats.pages_rejected);
        println!("Pages failed:    {}", stats.pages_failed);
        println!("Text written:    {} MB", stats.bytes_written / 1_000_000);
        println!("Elapsed time:    {:.1}s", stats.elapsed_seconds);
        println!("Processing rate: {:.1} pages/s", stats.pages_per_second);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let progress = RunProgress::new(true);

        progress.page_written("Article 1", 1200);
        progress.page_written("Article 2", 800);
        progress.page_rejected("Stub");
        progress.page_failed("Broken");

        let stats = progress.get_stats();
        assert_eq!(stats.pages_processed, 4);
        assert_eq!(stats.pages_written, 2);
        assert_eq!(stats.pages_rejected, 1);
        assert_eq!(stats.pages_failed, 1);
        assert_eq!(stats.bytes_written, 2000);
    }

    #[test]
    fn rate_updates_from_elapsed_time() {
        let mut stats = RunStats {
            pages_processed: 100,
            elapsed_seconds: 10.0,
            ..Default::default()
        };
        stats.update_rate();
        assert!((stats.pages_per_second - 10.0).abs() < f64::EPSILON);
    }
}
