pub mod loader;
pub mod query;
pub mod wire;

use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::errors::RoundwatchError;

pub use loader::{load_round_detail, load_round_details_jsonl};
pub use query::RoundQuery;
pub use wire::{WireRound, WireRoundDetail, WireTimelineEvent};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoundStatus {
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "COMPLETED")]
    Completed,
}

impl RoundStatus {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Badge text shown next to a round
    pub fn label(&self) -> &'static str {
        match self {
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Guard {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Guard {
    pub fn full_name(&self) -> String {
        match self.last_name.as_deref().map(str::trim) {
            Some(last_name) if !last_name.is_empty() => format!("{} {}", self.name, last_name),
            _ => self.name.clone(),
        }
    }
}

/// A guard patrol round as recorded by the backend
#[derive(Clone, Debug, PartialEq)]
pub struct Round {
    pub id: u64,
    pub guard_id: u64,
    pub start_time: DateTime<Utc>,
    /// Absent while the round is still in progress
    pub end_time: Option<DateTime<Utc>>,
    pub status: RoundStatus,
    /// Recurring route this round was started from, if any
    pub recurring_configuration_id: Option<u64>,
    pub guard: Option<Guard>,
}

impl Round {
    pub fn new(id: u64, guard_id: u64, start_time: DateTime<Utc>) -> Self {
        Self {
            id,
            guard_id,
            start_time,
            end_time: None,
            status: RoundStatus::InProgress,
            recurring_configuration_id: None,
            guard: None,
        }
    }

    /// Marks the round as completed at `end_time`
    pub fn completed_at(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self.status = RoundStatus::Completed;
        self
    }

    pub fn guard_name(&self) -> String {
        self.guard
            .as_ref()
            .map(Guard::full_name)
            .unwrap_or_else(|| format!("Guard #{}", self.guard_id))
    }
}

/// A checkpoint reference. The backend may send either half on its own; the
/// id is the dedup key and the name is only a label.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Location {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Location {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id: Some(id),
            name: Some(name.to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Task {
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaKind {
    Image,
    Video,
    /// Media types this crate does not know about still count as evidence
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Media {
    #[serde(rename = "type", default)]
    pub kind: MediaKind,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub key: Option<String>,
}

impl Media {
    pub fn image(url: &str) -> Self {
        Self {
            kind: MediaKind::Image,
            url: url.to_string(),
            key: None,
        }
    }
}

/// Payload of a location checkpoint scan
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanEvent {
    pub location: Option<Location>,
    pub coordinates: Option<Coordinates>,
    pub notes: Option<String>,
    pub tasks: Vec<Task>,
    pub media: Vec<Media>,
}

impl ScanEvent {
    pub fn at(location: Location) -> Self {
        Self {
            location: Some(location),
            ..Default::default()
        }
    }

    pub fn with_media(mut self, media: Media) -> Self {
        self.media.push(media);
        self
    }

    pub fn location_id(&self) -> Option<u64> {
        self.location.as_ref().and_then(|l| l.id)
    }

    /// A scan is backed by evidence when at least one photo or video was attached
    pub fn has_evidence(&self) -> bool {
        !self.media.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IncidentEvent {
    pub category: Option<String>,
    pub description: Option<String>,
    pub media: Vec<Media>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    Start,
    Scan(ScanEvent),
    Incident(IncidentEvent),
    End,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Scan(_) => "SCAN",
            Self::Incident(_) => "INCIDENT",
            Self::End => "END",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimelineEvent {
    /// `None` when the backend sent a missing or unparseable timestamp
    pub timestamp: Option<DateTime<Utc>>,
    pub description: String,
    pub kind: EventKind,
}

impl TimelineEvent {
    pub fn scan(timestamp: DateTime<Utc>, scan: ScanEvent) -> Self {
        Self {
            timestamp: Some(timestamp),
            description: String::new(),
            kind: EventKind::Scan(scan),
        }
    }

    pub fn as_scan(&self) -> Option<&ScanEvent> {
        match &self.kind {
            EventKind::Scan(scan) => Some(scan),
            _ => None,
        }
    }

    /// Converts a wire event into its typed form. Returns `None` for event
    /// types this crate does not know; malformed payload fields are dropped.
    pub fn from_wire(wire: WireTimelineEvent) -> Option<Self> {
        let timestamp = event_timestamp(&wire.timestamp, &wire.event_type);
        let description = match wire.description {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        };

        let data = &wire.data;
        let kind = match wire.event_type.as_str() {
            "START" => EventKind::Start,
            "END" => EventKind::End,
            "SCAN" => EventKind::Scan(ScanEvent {
                location: location(data),
                coordinates: coordinates(data),
                notes: payload_field(data, "notes", "SCAN"),
                tasks: payload_field::<wire::WireAssignment>(data, "assignment", "SCAN")
                    .map(|assignment| assignment.tasks)
                    .unwrap_or_default(),
                media: media_list(data, "SCAN"),
            }),
            "INCIDENT" => EventKind::Incident(IncidentEvent {
                category: payload_field(data, "category", "INCIDENT"),
                description: payload_field(data, "description", "INCIDENT"),
                media: media_list(data, "INCIDENT"),
            }),
            other => {
                warn!("Skipping timeline event with unknown type {:?}", other);
                return None;
            }
        };

        Some(Self {
            timestamp,
            description,
            kind,
        })
    }
}

/// A round together with its timeline, in the order the backend sent it
#[derive(Clone, Debug, PartialEq)]
pub struct RoundDetail {
    pub round: Round,
    pub timeline: Vec<TimelineEvent>,
}

impl RoundDetail {
    pub fn new(round: Round, timeline: Vec<TimelineEvent>) -> Self {
        Self { round, timeline }
    }

    pub fn scans(&self) -> impl Iterator<Item = (&TimelineEvent, &ScanEvent)> {
        self.timeline
            .iter()
            .filter_map(|event| event.as_scan().map(|scan| (event, scan)))
    }
}

impl TryFrom<WireRound> for Round {
    type Error = RoundwatchError;

    fn try_from(wire: WireRound) -> Result<Self, Self::Error> {
        let start_time =
            parse_timestamp(&wire.start_time).ok_or_else(|| RoundwatchError::InvalidRound {
                reason: format!(
                    "round {} has an invalid start time {:?}",
                    wire.id, wire.start_time
                ),
            })?;
        let status =
            RoundStatus::from_wire(&wire.status).ok_or_else(|| RoundwatchError::InvalidRound {
                reason: format!("round {} has an unknown status {:?}", wire.id, wire.status),
            })?;
        let end_time = match wire.end_time.as_deref() {
            Some(raw) => Some(parse_timestamp(raw).ok_or_else(|| {
                RoundwatchError::InvalidRound {
                    reason: format!("round {} has an invalid end time {:?}", wire.id, raw),
                }
            })?),
            None => None,
        };

        Ok(Self {
            id: wire.id,
            guard_id: wire.guard_id,
            start_time,
            end_time,
            status,
            recurring_configuration_id: wire.recurring_configuration_id,
            guard: wire.guard,
        })
    }
}

impl TryFrom<WireRoundDetail> for RoundDetail {
    type Error = RoundwatchError;

    fn try_from(wire: WireRoundDetail) -> Result<Self, Self::Error> {
        let round = Round::try_from(wire.round)?;
        let timeline = wire
            .timeline
            .unwrap_or_default()
            .into_iter()
            .filter_map(
                |raw| match serde_json::from_value::<WireTimelineEvent>(raw) {
                    Ok(event) => TimelineEvent::from_wire(event),
                    Err(e) => {
                        warn!("Skipping malformed timeline event in round {}: {}", round.id, e);
                        None
                    }
                },
            )
            .collect();
        Ok(Self { round, timeline })
    }
}

/// Parses an ISO 8601 instant. Offsets are honoured; timestamps without an
/// offset are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn event_timestamp(raw: &Value, event_type: &str) -> Option<DateTime<Utc>> {
    let parsed = match raw {
        Value::Null => {
            warn!("Missing timestamp on {} event", event_type);
            return None;
        }
        Value::String(text) => parse_timestamp(text),
        Value::Number(millis) => millis.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };
    if parsed.is_none() {
        warn!("Unparseable timestamp {} on {} event", raw, event_type);
    }
    parsed
}

fn payload_field<T: DeserializeOwned>(data: &Value, key: &str, event_type: &str) -> Option<T> {
    let value = data.get(key)?;
    if value.is_null() {
        return None;
    }
    serde_json::from_value(value.clone())
        .map_err(|e| warn!("Ignoring malformed {} on {} event: {}", key, event_type, e))
        .ok()
}

/// Reads `id` and `name` separately so a location missing its name keeps its
/// dedup key. Numeric string ids are accepted.
fn location(data: &Value) -> Option<Location> {
    let raw = data.get("location")?;
    let Value::Object(fields) = raw else {
        if !raw.is_null() {
            warn!("Ignoring malformed location {} on SCAN event", raw);
        }
        return None;
    };
    let id = match fields.get("id") {
        Some(Value::Number(number)) => number.as_u64(),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    };
    let name = match fields.get("name") {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
        _ => None,
    };
    if id.is_none() && name.is_none() {
        warn!("Ignoring location without id or name on SCAN event");
        return None;
    }
    Some(Location { id, name })
}

fn coordinate(data: &Value, key: &str) -> Option<f64> {
    match data.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

fn coordinates(data: &Value) -> Option<Coordinates> {
    Some(Coordinates {
        latitude: coordinate(data, "latitude")?,
        longitude: coordinate(data, "longitude")?,
    })
}

fn media_list(data: &Value, event_type: &str) -> Vec<Media> {
    let Some(Value::Array(items)) = data.get("media") else {
        return Vec::new();
    };
    // every entry counts as evidence, so malformed ones are kept as unknown media
    items
        .iter()
        .map(|item| {
            serde_json::from_value::<Media>(item.clone()).unwrap_or_else(|e| {
                warn!("Keeping malformed media on {} event as unknown: {}", event_type, e);
                Media {
                    kind: MediaKind::Other,
                    url: String::new(),
                    key: None,
                }
            })
        })
        .collect()
}
