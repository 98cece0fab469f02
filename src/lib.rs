// Library interface for roundwatch
// This allows integration tests to access internal modules

pub mod config;
pub mod errors;
pub mod metrics;
pub mod notes;
pub mod round;
pub mod timeline;
pub mod writer;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::RoundwatchError;
pub use metrics::{
    DerivationOptions, MapNode, MetricsCache, NodeKind, NodeStatus, RoundMetrics,
    derive_round_metrics, derive_round_metrics_now,
};
pub use round::{EventKind, Round, RoundDetail, RoundQuery, RoundStatus, TimelineEvent};
pub use timeline::{TimelineEntry, summarize_timeline};
