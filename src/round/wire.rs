// JSON shapes produced by the patrol backend for round details

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Guard;

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WireRound {
    pub id: u64,
    pub guard_id: u64,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    pub status: String,
    #[serde(default)]
    pub recurring_configuration_id: Option<u64>,
    #[serde(default)]
    pub guard: Option<Guard>,
}

/// A timeline event as sent over the wire. Everything but the type is left
/// untyped here and converted field by field so one bad field does not drop
/// the event.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WireTimelineEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    /// ISO 8601 string or epoch milliseconds
    #[serde(default)]
    pub timestamp: Value,
    #[serde(default)]
    pub description: Value,
    #[serde(default)]
    pub data: Value,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WireRoundDetail {
    pub round: WireRound,
    /// Raw events, each converted on its own so a malformed one is skipped
    /// without failing the round
    #[serde(default)]
    pub timeline: Option<Vec<Value>>,
}

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct WireAssignment {
    #[serde(default)]
    pub(crate) tasks: Vec<super::Task>,
}
