use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::categories::CategorySet;
use crate::errors::{SearchError, SearchResult};
use crate::filters::{compile_patterns, FileFilter, DEFAULT_COMPRESSED_SUFFIX};

/// Configuration for a logsift deployment.
///
/// # Configuration Locations
///
/// Values are merged from, lowest precedence first:
/// 1. Global `$CONFIG_DIR/logsift/config.yaml`
/// 2. Local `.logsift.yaml` in the current directory
/// 3. A file passed explicitly (`--config`), which must exist
///
/// Command-line flags are applied last through [`SearchConfig::merge_with_cli`].
///
/// # Configuration Format
///
/// ```yaml
/// # Directory holding the log files
/// root_path: "/opt/zimbra/log"
///
/// # recursive | flat
/// traversal: recursive
///
/// # Deepest directory level visited in recursive mode
/// max_depth: 32
///
/// # failfast | lossy
/// encoding_mode: failfast
///
/// # Rotated archives with this suffix are skipped
/// compressed_suffix: ".gz"
///
/// # File name globs to skip
/// exclude_patterns:
///   - "*.bak"
///
/// # Replace the built-in categories
/// categories:
///   mailbox: ["mailbox.log"]
///   nginx: ["access.log", "error.log"]
///
/// log_level: "warn"
/// ```
///
/// Nothing is ever written back; a configuration lives for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Root directory holding the log files
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Whether to descend into subdirectories
    #[serde(default)]
    pub traversal: TraversalMode,

    /// Recursion bound for recursive traversal
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// How to handle invalid UTF-8 in log lines
    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Files whose name ends with this suffix are never scanned
    #[serde(default = "default_compressed_suffix")]
    pub compressed_suffix: String,

    /// File name globs to skip
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Deployment-specific categories replacing the built-in set
    #[serde(default)]
    pub categories: Option<BTreeMap<String, Vec<String>>>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Directory traversal shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalMode {
    /// Walk the whole tree below the root
    #[default]
    Recursive,
    /// Only look at files directly inside the root
    Flat,
}

/// How invalid UTF-8 in a log file is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Report the file as unreadable at the first invalid line
    #[default]
    FailFast,
    /// Replace invalid sequences with U+FFFD and keep going
    Lossy,
}

impl FromStr for TraversalMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recursive" => Ok(Self::Recursive),
            "flat" => Ok(Self::Flat),
            other => Err(SearchError::config_error(format!(
                "unknown traversal mode '{}' (expected recursive|flat)",
                other
            ))),
        }
    }
}

impl FromStr for EncodingMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "failfast" => Ok(Self::FailFast),
            "lossy" => Ok(Self::Lossy),
            other => Err(SearchError::config_error(format!(
                "unknown encoding mode '{}' (expected failfast|lossy)",
                other
            ))),
        }
    }
}

impl fmt::Display for EncodingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailFast => write!(f, "failfast"),
            Self::Lossy => write!(f, "lossy"),
        }
    }
}

fn default_root_path() -> PathBuf {
    PathBuf::from("/var/log")
}

fn default_max_depth() -> usize {
    32
}

fn default_compressed_suffix() -> String {
    DEFAULT_COMPRESSED_SUFFIX.to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            traversal: TraversalMode::default(),
            max_depth: default_max_depth(),
            encoding_mode: EncodingMode::default(),
            compressed_suffix: default_compressed_suffix(),
            exclude_patterns: Vec::new(),
            categories: None,
            log_level: default_log_level(),
        }
    }
}

/// Values supplied on the command line; `None` keeps the file value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_path: Option<PathBuf>,
    pub traversal: Option<TraversalMode>,
    pub max_depth: Option<usize>,
    pub encoding_mode: Option<EncodingMode>,
    pub exclude_patterns: Vec<String>,
    pub log_level: Option<String>,
}

impl SearchConfig {
    /// Loads configuration from the default locations
    pub fn load() -> SearchResult<Self> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus an explicit file
    pub fn load_from(config_path: Option<&Path>) -> SearchResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let defaults = [
            dirs::config_dir().map(|p| p.join("logsift/config.yaml")),
            Some(PathBuf::from(".logsift.yaml")),
        ];
        for path in defaults.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: ConfigOverrides) -> Self {
        if let Some(root_path) = cli.root_path {
            self.root_path = root_path;
        }
        if let Some(traversal) = cli.traversal {
            self.traversal = traversal;
        }
        if let Some(max_depth) = cli.max_depth {
            self.max_depth = max_depth;
        }
        if let Some(encoding_mode) = cli.encoding_mode {
            self.encoding_mode = encoding_mode;
        }
        // Exclusions accumulate rather than replace
        self.exclude_patterns.extend(cli.exclude_patterns);
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }

    /// Rejects values that would make every search fail later on
    pub fn validate(&self) -> SearchResult<()> {
        if self.max_depth == 0 {
            return Err(SearchError::config_error("max_depth must be at least 1"));
        }
        compile_patterns(&self.exclude_patterns)?;
        self.category_set()?;
        Ok(())
    }

    /// The category set in effect: the configured one, or the built-ins
    pub fn category_set(&self) -> SearchResult<CategorySet> {
        match &self.categories {
            Some(map) => CategorySet::from_map(map),
            None => Ok(CategorySet::builtin()),
        }
    }

    /// Builds the file selection rule for a resolved prefix list
    pub fn file_filter(&self, prefixes: Vec<String>) -> SearchResult<FileFilter> {
        Ok(FileFilter::new(prefixes)
            .with_compressed_suffix(self.compressed_suffix.clone())
            .with_exclude_patterns(compile_patterns(&self.exclude_patterns)?))
    }
}
