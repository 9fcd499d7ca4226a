use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::errors::SearchError;

/// One matched line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// The file the line came from
    pub path: PathBuf,
    /// 1-based, restarting at every file
    pub line_number: usize,
    /// The line without its line terminator or surrounding whitespace
    pub line_text: String,
}

impl fmt::Display for MatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} - Line {}] {}",
            self.path.display(),
            self.line_number,
            self.line_text
        )
    }
}

/// Counts for one file. A file that fails part way keeps the counts of the
/// lines read before the failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileScan {
    pub lines: usize,
    pub matches: usize,
}

/// How a scan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    /// The category selected no files under the root
    NoFiles,
    /// Every file was scanned and no line matched
    NoMatches,
    /// The caller cancelled before all files were scanned
    Cancelled,
    /// Every file was scanned and at least one line matched
    Completed,
}

/// Totals for a whole scan, plus the per-file errors that did not stop it
#[derive(Debug)]
pub struct ScanSummary {
    pub outcome: ScanOutcome,
    pub files_total: usize,
    /// Files opened, including those that failed part way
    pub files_scanned: usize,
    pub lines_scanned: usize,
    pub matches: usize,
    pub file_errors: Vec<SearchError>,
}

impl ScanSummary {
    pub(crate) fn new(files_total: usize) -> Self {
        Self {
            outcome: ScanOutcome::NoFiles,
            files_total,
            files_scanned: 0,
            lines_scanned: 0,
            matches: 0,
            file_errors: Vec::new(),
        }
    }

    /// Folds one file's counts and result into the totals
    pub(crate) fn add_file_result(&mut self, scan: FileScan, result: Result<(), SearchError>) {
        self.files_scanned += 1;
        self.lines_scanned += scan.lines;
        self.matches += scan.matches;
        if let Err(e) = result {
            self.file_errors.push(e);
        }
    }

    pub fn matched(&self) -> bool {
        self.matches > 0
    }

    pub fn was_cancelled(&self) -> bool {
        self.outcome == ScanOutcome::Cancelled
    }
}
