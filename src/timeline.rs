use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notes::{NoteLine, parse_notes};
use crate::round::{Coordinates, EventKind, RoundDetail, TimelineEvent};

pub const MISSING_INCIDENT_DETAIL: &str = "No detail";

/// Display summary of one timeline event
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub kind: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub description: String,
    pub location: Option<String>,
    pub map_url: Option<String>,
    pub notes: Vec<NoteLine>,
    pub tasks_completed: usize,
    pub tasks_total: usize,
    pub incident_category: Option<String>,
    pub incident_detail: Option<String>,
    pub evidence_count: usize,
}

pub fn map_url(coordinates: &Coordinates) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={},{}",
        coordinates.latitude, coordinates.longitude
    )
}

pub fn summarize_event(event: &TimelineEvent) -> TimelineEntry {
    let mut entry = TimelineEntry {
        kind: event.kind.name().to_string(),
        timestamp: event.timestamp,
        description: event.description.clone(),
        location: None,
        map_url: None,
        notes: Vec::new(),
        tasks_completed: 0,
        tasks_total: 0,
        incident_category: None,
        incident_detail: None,
        evidence_count: 0,
    };

    match &event.kind {
        EventKind::Scan(scan) => {
            entry.location = scan.location.as_ref().and_then(|l| l.name.clone());
            entry.map_url = scan.coordinates.as_ref().map(map_url);
            entry.notes = scan.notes.as_deref().map(parse_notes).unwrap_or_default();
            entry.tasks_completed = scan.tasks.iter().filter(|t| t.completed).count();
            entry.tasks_total = scan.tasks.len();
            entry.evidence_count = scan.media.len();
        }
        EventKind::Incident(incident) => {
            entry.incident_category = incident.category.clone();
            entry.incident_detail = Some(
                incident
                    .description
                    .clone()
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| MISSING_INCIDENT_DETAIL.to_string()),
            );
            entry.evidence_count = incident.media.len();
        }
        EventKind::Start | EventKind::End => {}
    }

    entry
}

/// Summaries in the order the backend sent the events
pub fn summarize_timeline(detail: &RoundDetail) -> Vec<TimelineEntry> {
    detail.timeline.iter().map(summarize_event).collect()
}
