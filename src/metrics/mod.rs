// Round timeline metrics: duration, scan coverage, segment timing and the
// ordered map nodes shown on the round detail view

pub mod cache;
pub mod format;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::round::{Round, RoundDetail};

pub use cache::MetricsCache;
pub use format::{elapsed_ms_between, format_elapsed_ms};

pub const DEFAULT_MISSING_LOCATION_LABEL: &str = "Unknown location";

#[derive(Clone, Debug, PartialEq)]
pub struct DerivationOptions {
    /// Label used for scans that arrived without a location reference
    pub missing_location_label: String,
}

impl Default for DerivationOptions {
    fn default() -> Self {
        Self {
            missing_location_label: DEFAULT_MISSING_LOCATION_LABEL.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Start,
    Point,
    End,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    Start,
    End,
    /// First visit to a location, backed by evidence
    Success,
    /// Any visit after the first to the same location
    Duplicate,
    /// First visit to a location without evidence
    Incomplete,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MapNode {
    pub kind: NodeKind,
    pub label: String,
    pub status: NodeStatus,
    pub location_id: Option<u64>,
    /// Time since the previous node, absent on the first node and on scans
    /// without a usable timestamp
    pub elapsed_ms: Option<i64>,
    pub elapsed_label: Option<String>,
}

impl MapNode {
    fn start() -> Self {
        Self {
            kind: NodeKind::Start,
            label: "Start".to_string(),
            status: NodeStatus::Start,
            location_id: None,
            elapsed_ms: None,
            elapsed_label: None,
        }
    }

    fn end(elapsed_ms: i64) -> Self {
        Self {
            kind: NodeKind::End,
            label: "End".to_string(),
            status: NodeStatus::End,
            location_id: None,
            elapsed_ms: Some(elapsed_ms),
            elapsed_label: Some(format_elapsed_ms(elapsed_ms)),
        }
    }

    fn point(
        label: String,
        status: NodeStatus,
        location_id: Option<u64>,
        elapsed_ms: Option<i64>,
    ) -> Self {
        Self {
            kind: NodeKind::Point,
            label,
            status,
            location_id,
            elapsed_ms,
            elapsed_label: elapsed_ms.map(format_elapsed_ms),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoundMetrics {
    pub round_id: u64,
    pub duration_ms: i64,
    pub duration_label: String,
    pub valid_scan_count: usize,
    pub raw_scan_count: usize,
    pub average_segment_ms: i64,
    pub average_segment_label: String,
    pub map_nodes: Vec<MapNode>,
}

impl RoundMetrics {
    /// Valid over raw scans, e.g. `3/5`
    pub fn coverage_label(&self) -> String {
        format!("{}/{}", self.valid_scan_count, self.raw_scan_count)
    }

    pub fn count_status(&self, status: NodeStatus) -> usize {
        self.map_nodes.iter().filter(|n| n.status == status).count()
    }
}

/// The part of the derivation that depends only on the timeline and the
/// round's end time, not on the wall clock
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ScanWalk {
    pub(crate) map_nodes: Vec<MapNode>,
    pub(crate) valid_scan_count: usize,
    pub(crate) raw_scan_count: usize,
}

pub(crate) fn walk_scans(detail: &RoundDetail, options: &DerivationOptions) -> ScanWalk {
    let round = &detail.round;

    // stable: tied timestamps keep input order, untimed scans go last in input order
    let scans = detail
        .scans()
        .sorted_by_key(|(event, _)| (event.timestamp.is_none(), event.timestamp))
        .collect_vec();

    let mut map_nodes = Vec::with_capacity(scans.len() + 2);
    map_nodes.push(MapNode::start());

    let mut previous_time = round.start_time;
    let mut visited_location_ids = HashSet::new();
    let mut valid_scan_count = 0;

    for (event, scan) in &scans {
        let elapsed_ms = event
            .timestamp
            .map(|timestamp| elapsed_ms_between(previous_time, timestamp));

        let location_id = scan.location_id();
        let first_visit = location_id.is_none_or(|id| visited_location_ids.insert(id));
        let status = if !first_visit {
            NodeStatus::Duplicate
        } else if !scan.has_evidence() {
            NodeStatus::Incomplete
        } else {
            valid_scan_count += 1;
            NodeStatus::Success
        };

        let label = scan
            .location
            .as_ref()
            .and_then(|l| l.name.clone())
            .unwrap_or_else(|| options.missing_location_label.clone());
        map_nodes.push(MapNode::point(label, status, location_id, elapsed_ms));

        if let Some(timestamp) = event.timestamp {
            previous_time = timestamp;
        }
    }

    if let Some(end_time) = round.end_time {
        map_nodes.push(MapNode::end(elapsed_ms_between(previous_time, end_time)));
    }

    ScanWalk {
        map_nodes,
        valid_scan_count,
        raw_scan_count: scans.len(),
    }
}

/// Adds the wall-clock dependent figures to a scan walk
pub(crate) fn summarize(round: &Round, walk: ScanWalk, now: DateTime<Utc>) -> RoundMetrics {
    let duration_ms = elapsed_ms_between(round.start_time, round.end_time.unwrap_or(now));
    let segments = walk.raw_scan_count + usize::from(round.end_time.is_some());
    let average_segment_ms = if segments == 0 {
        0
    } else {
        duration_ms / segments as i64
    };

    debug!(
        "Round {}: {} of {} scans valid over {} segments, duration {}ms",
        round.id, walk.valid_scan_count, walk.raw_scan_count, segments, duration_ms
    );

    RoundMetrics {
        round_id: round.id,
        duration_ms,
        duration_label: format_elapsed_ms(duration_ms),
        valid_scan_count: walk.valid_scan_count,
        raw_scan_count: walk.raw_scan_count,
        average_segment_ms,
        average_segment_label: format_elapsed_ms(average_segment_ms),
        map_nodes: walk.map_nodes,
    }
}

/// Derives the metrics for one round. In-progress rounds measure their
/// duration up to `now`, so the result is only current at that instant.
pub fn derive_round_metrics(
    detail: &RoundDetail,
    now: DateTime<Utc>,
    options: &DerivationOptions,
) -> RoundMetrics {
    summarize(&detail.round, walk_scans(detail, options), now)
}

pub fn derive_round_metrics_now(detail: &RoundDetail, options: &DerivationOptions) -> RoundMetrics {
    derive_round_metrics(detail, Utc::now(), options)
}
