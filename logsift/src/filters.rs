//! File name filtering for the locator.
//!
//! A file qualifies when its name starts with one of the resolved category
//! prefixes, does not carry the compressed suffix, and matches none of the
//! configured exclusion globs. Prefix matching is case-sensitive on the raw
//! file name.

use glob::Pattern;
use std::path::Path;

use crate::errors::{SearchError, SearchResult};

/// Suffix of rotated, compressed log files that are never scanned
pub const DEFAULT_COMPRESSED_SUFFIX: &str = ".gz";

/// Checks if a raw file name starts with any of the prefixes
pub fn has_prefix(file_name: impl AsRef<[u8]>, prefixes: &[String]) -> bool {
    let file_name = file_name.as_ref();
    prefixes.iter().any(|p| file_name.starts_with(p.as_bytes()))
}

/// Checks if a raw file name carries the compressed suffix
pub fn is_compressed(file_name: impl AsRef<[u8]>, suffix: &str) -> bool {
    !suffix.is_empty() && file_name.as_ref().ends_with(suffix.as_bytes())
}

/// Checks if a file name matches any exclusion glob
pub fn should_ignore(file_name: &str, exclude_patterns: &[Pattern]) -> bool {
    exclude_patterns.iter().any(|p| p.matches(file_name))
}

/// Compiles exclusion globs, rejecting malformed ones
pub fn compile_patterns(patterns: &[String]) -> SearchResult<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| {
                SearchError::config_error(format!("invalid exclude pattern '{}': {}", p, e))
            })
        })
        .collect()
}

/// The complete file selection rule for one search
#[derive(Debug, Clone)]
pub struct FileFilter {
    prefixes: Vec<String>,
    compressed_suffix: String,
    exclude_patterns: Vec<Pattern>,
}

impl FileFilter {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self {
            prefixes,
            compressed_suffix: DEFAULT_COMPRESSED_SUFFIX.to_string(),
            exclude_patterns: Vec::new(),
        }
    }

    pub fn with_compressed_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.compressed_suffix = suffix.into();
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<Pattern>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Determines if a file should be included in the search.
    ///
    /// Prefix and suffix are compared on the raw bytes of the name, so names
    /// that are not valid UTF-8 still qualify. Exclusion globs see a lossy
    /// rendering of the name.
    pub fn should_include_file(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name() else {
            return false;
        };
        let raw = file_name.as_encoded_bytes();

        has_prefix(raw, &self.prefixes)
            && !is_compressed(raw, &self.compressed_suffix)
            && !should_ignore(&file_name.to_string_lossy(), &self.exclude_patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_has_prefix_is_case_sensitive() {
        let p = prefixes(&["Bruteforce", "audit.log"]);
        assert!(has_prefix("Bruteforce_2024.txt", &p));
        assert!(has_prefix("audit.log.1", &p));
        assert!(!has_prefix("bruteforce_2024.txt", &p));
        assert!(!has_prefix("old-audit.log", &p));
    }

    #[test]
    fn test_is_compressed() {
        assert!(is_compressed("audit.log.2.gz", ".gz"));
        assert!(!is_compressed("audit.log.2", ".gz"));
        assert!(!is_compressed("audit.log.gzip", ".gz"));
        assert!(!is_compressed("audit.log.2.gz", ""));
    }

    #[test]
    fn test_should_ignore() {
        let patterns =
            compile_patterns(&["*.bak".to_string(), "zimbra.log.[0-4]".to_string()]).unwrap();
        assert!(should_ignore("mailbox.log.bak", &patterns));
        assert!(should_ignore("zimbra.log.3", &patterns));
        assert!(!should_ignore("zimbra.log.7", &patterns));
        assert!(!should_ignore("mailbox.log", &patterns));
    }

    #[test]
    fn test_compile_patterns_rejects_malformed_glob() {
        assert!(compile_patterns(&["[".to_string()]).is_err());
    }

    #[test]
    fn test_should_include_file() {
        let filter = FileFilter::new(prefixes(&["audit.log"]))
            .with_exclude_patterns(compile_patterns(&["*.old".to_string()]).unwrap());

        assert!(filter.should_include_file(Path::new("/var/log/audit.log")));
        assert!(filter.should_include_file(Path::new("/var/log/sub/audit.log.1")));

        // Compressed files never qualify, whatever the prefix
        assert!(!filter.should_include_file(Path::new("/var/log/audit.log.2.gz")));
        // Prefix applies to the file name, not the directory
        assert!(!filter.should_include_file(Path::new("/var/log/audit.log.d/zimbra.log")));
        assert!(!filter.should_include_file(Path::new("/var/log/audit.log.old")));
        assert!(!filter.should_include_file(Path::new("/")));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_file_names_use_raw_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let filter = FileFilter::new(prefixes(&["audit.log"]))
            .with_exclude_patterns(compile_patterns(&["*.old".to_string()]).unwrap());
        let dir = Path::new("/var/log");

        assert!(filter.should_include_file(&dir.join(OsStr::from_bytes(b"audit.log.\xff"))));
        assert!(!filter.should_include_file(&dir.join(OsStr::from_bytes(b"\xffaudit.log"))));
        assert!(!filter.should_include_file(&dir.join(OsStr::from_bytes(b"audit.log.\xff.gz"))));
        assert!(!filter.should_include_file(&dir.join(OsStr::from_bytes(b"audit.log.\xff.old"))));
    }

    #[test]
    fn test_custom_compressed_suffix() {
        let filter = FileFilter::new(prefixes(&["zimbra.log"])).with_compressed_suffix(".bz2");
        assert!(filter.should_include_file(Path::new("zimbra.log.1.gz")));
        assert!(!filter.should_include_file(Path::new("zimbra.log.1.bz2")));
    }
}
