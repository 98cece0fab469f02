use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::debug;

use super::{DerivationOptions, RoundMetrics, ScanWalk, summarize, walk_scans};
use crate::round::RoundDetail;

/// Identifies a version of a round's timeline. A new scan, a late event, a
/// corrected start time or the round being closed change the key. Edits to
/// the payload of an existing event (media uploaded later, a renamed
/// location) do not; call [`MetricsCache::invalidate`] for those.
#[derive(Clone, Debug, PartialEq, Eq)]
struct TimelineKey {
    start_time: DateTime<Utc>,
    timeline_len: usize,
    latest_event_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

impl TimelineKey {
    fn of(detail: &RoundDetail) -> Self {
        Self {
            start_time: detail.round.start_time,
            timeline_len: detail.timeline.len(),
            latest_event_time: detail.timeline.iter().filter_map(|e| e.timestamp).max(),
            end_time: detail.round.end_time,
        }
    }
}

/// Memoizes the timeline walk per round. Duration and average segment time
/// are still computed on every call so live rounds keep counting.
#[derive(Debug, Default)]
pub struct MetricsCache {
    options: DerivationOptions,
    entries: HashMap<u64, (TimelineKey, ScanWalk)>,
    hits: u64,
    misses: u64,
}

impl MetricsCache {
    pub fn new(options: DerivationOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn metrics(&mut self, detail: &RoundDetail, now: DateTime<Utc>) -> RoundMetrics {
        let round_id = detail.round.id;
        let key = TimelineKey::of(detail);

        let walk = match self.entries.get(&round_id) {
            Some((cached_key, walk)) if *cached_key == key => {
                self.hits += 1;
                walk.clone()
            }
            _ => {
                self.misses += 1;
                debug!("Recomputing timeline for round {}", round_id);
                let walk = walk_scans(detail, &self.options);
                self.entries.insert(round_id, (key, walk.clone()));
                walk
            }
        };

        summarize(&detail.round, walk, now)
    }

    pub fn invalidate(&mut self, round_id: u64) -> bool {
        self.entries.remove(&round_id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
