use std::path::PathBuf;
use tracing::{debug, info};

use super::expression::Expression;
use super::locator::locate;
use super::matcher::LineMatcher;
use super::processor::FileProcessor;
use crate::cancel::CancellationToken;
use crate::config::{EncodingMode, SearchConfig};
use crate::errors::{SearchError, SearchResult};
use crate::progress::{ProgressEvent, ProgressTracker};
use crate::results::{FileScan, MatchRecord, ScanOutcome, ScanSummary};

/// Receives what a scan produces, as it produces it.
///
/// Records are handed over by value and never looked at again by the engine.
pub trait ScanSink {
    fn on_match(&mut self, record: MatchRecord);

    /// Called after every file, whether it was read fully or failed
    fn on_progress(&mut self, _event: ProgressEvent) {}

    /// Called when a single file can't be read; the scan carries on
    fn on_file_error(&mut self, _error: &SearchError) {}
}

/// Sink that keeps everything, for callers that render after the scan
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub matches: Vec<MatchRecord>,
    pub progress: Vec<ProgressEvent>,
    pub errors: Vec<String>,
}

impl ScanSink for CollectingSink {
    fn on_match(&mut self, record: MatchRecord) {
        self.matches.push(record);
    }

    fn on_progress(&mut self, event: ProgressEvent) {
        self.progress.push(event);
    }

    fn on_file_error(&mut self, error: &SearchError) {
        self.errors.push(error.to_string());
    }
}

/// Publishes progress to a [`ProgressTracker`] before forwarding everything
/// to the wrapped sink, so another thread can poll the fraction.
pub struct TrackedSink<'a, S: ScanSink> {
    inner: &'a mut S,
    tracker: ProgressTracker,
}

impl<'a, S: ScanSink> TrackedSink<'a, S> {
    pub fn new(inner: &'a mut S, tracker: ProgressTracker) -> Self {
        Self { inner, tracker }
    }
}

impl<S: ScanSink> ScanSink for TrackedSink<'_, S> {
    fn on_match(&mut self, record: MatchRecord) {
        self.inner.on_match(record);
    }

    fn on_progress(&mut self, event: ProgressEvent) {
        self.tracker.record(event);
        self.inner.on_progress(event);
    }

    fn on_file_error(&mut self, error: &SearchError) {
        self.inner.on_file_error(error);
    }
}

/// Sequential scan of a file list against one compiled expression
#[derive(Debug)]
pub struct ScanEngine {
    processor: FileProcessor,
}

impl ScanEngine {
    pub fn new(expression: &Expression, encoding_mode: EncodingMode) -> SearchResult<Self> {
        let matcher = LineMatcher::new(expression)?;
        Ok(Self {
            processor: FileProcessor::new(matcher, encoding_mode),
        })
    }

    /// Scans `files` in order.
    ///
    /// The token is checked before each file is opened. Per-file errors go to
    /// the sink and the summary; they never end the scan early.
    pub fn scan<S: ScanSink>(
        &self,
        files: &[PathBuf],
        token: &CancellationToken,
        sink: &mut S,
    ) -> ScanSummary {
        let total = files.len();
        let mut summary = ScanSummary::new(total);

        for (index, path) in files.iter().enumerate() {
            if token.is_cancelled() {
                info!("Search cancelled after {} of {} files", index, total);
                summary.outcome = ScanOutcome::Cancelled;
                return summary;
            }

            let mut scan = FileScan::default();
            let result = self
                .processor
                .process_file(path, &mut scan, |record| sink.on_match(record));
            match &result {
                Ok(()) => debug!(
                    "Scanned {}: {} lines, {} matches",
                    path.display(),
                    scan.lines,
                    scan.matches
                ),
                Err(e) => {
                    debug!("Continuing after file error: {}", e);
                    sink.on_file_error(e);
                }
            }
            summary.add_file_result(scan, result);

            sink.on_progress(ProgressEvent {
                files_done: index + 1,
                files_total: total,
            });
        }

        summary.outcome = if total == 0 {
            ScanOutcome::NoFiles
        } else if summary.matched() {
            ScanOutcome::Completed
        } else {
            ScanOutcome::NoMatches
        };
        summary
    }
}

/// Scans `files` for `expression` with default decoding
pub fn scan<S: ScanSink>(
    files: &[PathBuf],
    expression: &Expression,
    token: &CancellationToken,
    sink: &mut S,
) -> SearchResult<ScanSummary> {
    let engine = ScanEngine::new(expression, EncodingMode::default())?;
    Ok(engine.scan(files, token, sink))
}

/// Runs a whole search: resolve the category, check the root, list the
/// files, then scan them.
///
/// Every fatal error (unknown category, missing root, uncompilable term) is
/// returned before a log file is opened. An empty query can't get here: it
/// is rejected when the [`Expression`] is parsed.
pub fn search<S: ScanSink>(
    config: &SearchConfig,
    category: &str,
    expression: &Expression,
    token: &CancellationToken,
    sink: &mut S,
) -> SearchResult<ScanSummary> {
    info!("Searching '{}' logs for: {}", category, expression);

    let prefixes = config.category_set()?.resolve(category)?;
    let filter = config.file_filter(prefixes)?;
    let engine = ScanEngine::new(expression, config.encoding_mode)?;

    let files: Vec<PathBuf> =
        locate(&config.root_path, &filter, config.traversal, config.max_depth)?.collect();
    debug!("Found {} files to process", files.len());

    let summary = engine.scan(&files, token, sink);
    info!(
        "Search finished ({:?}). Found {} matches in {} of {} files",
        summary.outcome, summary.matches, summary.files_scanned, summary.files_total
    );
    Ok(summary)
}
