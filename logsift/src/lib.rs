pub mod cancel;
pub mod categories;
pub mod config;
pub mod errors;
pub mod filters;
pub mod highlight;
pub mod progress;
pub mod results;
pub mod search;

pub use cancel::CancellationToken;
pub use categories::{Category, CategorySet};
pub use config::{ConfigOverrides, EncodingMode, SearchConfig, TraversalMode};
pub use errors::{SearchError, SearchResult};
pub use highlight::{highlight, merge_spans};
pub use progress::{ProgressEvent, ProgressTracker};
pub use results::{MatchRecord, ScanOutcome, ScanSummary};
pub use search::{search, CollectingSink, Expression, ScanEngine, ScanSink};
