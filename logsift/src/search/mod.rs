//! The search pipeline.
//!
//! A query is parsed once into an [`Expression`] (an OR of AND-groups of
//! literal terms), compiled into a [`LineMatcher`], and run over the files the
//! [`locate`] walk selects. The [`ScanEngine`] reads one file at a time, line
//! by line, hands matches and progress to a [`ScanSink`] as they happen, and
//! checks the [`CancellationToken`](crate::CancellationToken) between files.
pub mod engine;
pub mod expression;
pub mod locator;
pub mod matcher;
pub mod processor;

pub use engine::{scan, search, CollectingSink, ScanEngine, ScanSink, TrackedSink};
pub use expression::{tokenize, Conjunction, Expression, Term};
pub use locator::locate;
pub use matcher::LineMatcher;
pub use processor::FileProcessor;
