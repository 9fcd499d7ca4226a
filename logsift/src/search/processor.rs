use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{trace, warn};

use super::matcher::LineMatcher;
use crate::config::EncodingMode;
use crate::errors::{SearchError, SearchResult};
use crate::results::{FileScan, MatchRecord};

const BUFFER_CAPACITY: usize = 64 * 1024;

/// Decodes one raw line (terminator already removed)
fn decode_line<'a>(
    bytes: &'a [u8],
    path: &Path,
    line_number: usize,
    encoding_mode: EncodingMode,
) -> SearchResult<Cow<'a, str>> {
    match encoding_mode {
        EncodingMode::FailFast => std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|_| SearchError::encoding(path, line_number)),
        EncodingMode::Lossy => Ok(String::from_utf8_lossy(bytes)),
    }
}

fn strip_terminator(mut bytes: &[u8]) -> &[u8] {
    if let [rest @ .., b'\n'] = bytes {
        bytes = rest;
    }
    if let [rest @ .., b'\r'] = bytes {
        bytes = rest;
    }
    bytes
}

/// Reads one file line by line and reports the lines the matcher accepts
#[derive(Debug)]
pub struct FileProcessor {
    matcher: LineMatcher,
    encoding_mode: EncodingMode,
}

impl FileProcessor {
    pub fn new(matcher: LineMatcher, encoding_mode: EncodingMode) -> Self {
        Self {
            matcher,
            encoding_mode,
        }
    }

    /// Scans `path`, calling `on_match` for every matching line in order.
    ///
    /// `scan` is updated as lines are read, so on error it still holds the
    /// counts up to the failing line. The file handle is dropped on every
    /// return path.
    pub fn process_file<F>(
        &self,
        path: &Path,
        scan: &mut FileScan,
        mut on_match: F,
    ) -> SearchResult<()>
    where
        F: FnMut(MatchRecord),
    {
        trace!("Processing file: {}", path.display());

        let file = File::open(path).map_err(|e| SearchError::file_read(path, e))?;
        let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        let mut buffer = Vec::with_capacity(256);
        let mut warned_lossy = false;

        loop {
            buffer.clear();
            let read = reader
                .read_until(b'\n', &mut buffer)
                .map_err(|e| SearchError::file_read(path, e))?;
            if read == 0 {
                return Ok(());
            }

            let line_number = scan.lines + 1;
            let raw = strip_terminator(&buffer);
            let line = decode_line(raw, path, line_number, self.encoding_mode)?;
            if !warned_lossy && matches!(line, Cow::Owned(_)) {
                warn!("Invalid UTF-8 replaced in file: {}", path.display());
                warned_lossy = true;
            }
            scan.lines = line_number;

            if self.matcher.matches(&line) {
                scan.matches += 1;
                on_match(MatchRecord {
                    path: path.to_path_buf(),
                    line_number,
                    line_text: line.trim().to_string(),
                });
            }
        }
    }
}
