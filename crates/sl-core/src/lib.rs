//! Core domain logic for sleep inference.
//!
//! This crate contains the fundamental types and logic for:
//! - Ingestion: reading activity timestamps from Takeout exports
//! - Merging: combining per-source activity into one timeline
//! - Inference: turning inactivity gaps into sleep periods
//! - Statistics: summarizing the inferred periods

pub mod event;
pub mod inference;
pub mod ingest;
pub mod period;
pub mod stats;
pub mod timeline;
pub mod types;

pub use event::ActivityEvent;
pub use inference::{
    DEFAULT_MAX_GAP_HOURS, DEFAULT_MIN_GAP_HOURS, GapPolicy, InferenceConfig, PolicyError,
    infer_sleep_periods,
};
pub use ingest::{ActivityProvider, IngestError, LoadOptions, SourceLoad, provider_for};
pub use period::SleepPeriod;
pub use stats::{SleepStatistics, SleepSummary, summarize};
pub use timeline::Timeline;
pub use types::{ActivitySource, ValidationError};
