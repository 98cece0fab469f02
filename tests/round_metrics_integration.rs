// Integration tests for round metrics with backend-shaped exports
//
// This test suite validates the complete workflow:
// 1. Write a round export the way the backend returns it
// 2. Load it through the round loader
// 3. Derive metrics and the event timeline
// 4. Export metrics for a batch of rounds

use std::io::Write;

use chrono::{TimeZone, Utc};
use roundwatch::round::{load_round_detail, load_round_details_jsonl};
use roundwatch::writer::write_metrics;
use roundwatch::{
    DerivationOptions, MetricsCache, NodeKind, NodeStatus, RoundMetrics, RoundQuery,
    RoundStatus, derive_round_metrics, summarize_timeline,
};
use tempfile::{NamedTempFile, TempDir};

/// A completed round in display order: END and INCIDENT events interleaved with
/// scans that are not chronological
const COMPLETED_ROUND: &str = r#"{
  "round": {
    "id": 41, "guardId": 7, "startTime": "2024-03-01T10:00:00.000Z",
    "endTime": "2024-03-01T10:12:00.000Z", "status": "COMPLETED",
    "recurringConfigurationId": 3,
    "guard": { "id": 7, "name": "Marta", "lastName": "Lopez" }
  },
  "timeline": [
    { "type": "START", "timestamp": "2024-03-01T10:00:00.000Z", "description": "Ronda iniciada", "data": {} },
    { "type": "END", "timestamp": "2024-03-01T10:12:00.000Z", "description": "Ronda finalizada", "data": {} },
    { "type": "SCAN", "timestamp": "2024-03-01T10:10:00.000Z", "description": "Punto escaneado",
      "data": { "location": { "id": 1, "name": "Gate A" }, "media": [] } },
    { "type": "INCIDENT", "timestamp": "2024-03-01T10:07:00.000Z", "description": "Incidencia",
      "data": { "category": "Lighting", "media": [{ "type": "VIDEO", "url": "https://cdn/v.mp4" }] } },
    { "type": "SCAN", "timestamp": "2024-03-01T10:05:00.000Z", "description": "Punto escaneado",
      "data": { "location": { "id": 1, "name": "Gate A" }, "latitude": 19.4, "longitude": -99.1,
                "notes": "--- Gate ---\n[x] Locked\n[ ] Chain",
                "assignment": { "tasks": [{ "description": "Check lock", "completed": true }] },
                "media": [{ "type": "IMAGE", "url": "https://cdn/a.jpg", "key": "a.jpg" }] } }
  ]
}"#;

const IN_PROGRESS_ROUND: &str = r#"{"round":{"id":42,"guardId":8,"startTime":"2024-03-01T09:00:00Z","status":"IN_PROGRESS","guard":{"id":8,"name":"Raul","lastName":null}},"timeline":[{"type":"SCAN","timestamp":"2024-03-01T09:03:30Z","description":"Punto escaneado","data":{"location":{"id":2,"name":"Lobby"},"media":[{"type":"IMAGE","url":"https://cdn/b.jpg"}]}}]}"#;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

#[test]
fn test_completed_round_metrics_from_file() {
    let file = write_temp(COMPLETED_ROUND);
    let detail = load_round_detail(file.path()).unwrap();
    assert_eq!(detail.round.status, RoundStatus::Completed);
    assert_eq!(detail.round.recurring_configuration_id, Some(3));
    assert_eq!(detail.round.guard_name(), "Marta Lopez");

    let now = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
    let metrics = derive_round_metrics(&detail, now, &DerivationOptions::default());

    let nodes: Vec<(NodeKind, NodeStatus, Option<&str>)> = metrics
        .map_nodes
        .iter()
        .map(|n| (n.kind, n.status, n.elapsed_label.as_deref()))
        .collect();
    assert_eq!(
        nodes,
        vec![
            (NodeKind::Start, NodeStatus::Start, None),
            (NodeKind::Point, NodeStatus::Success, Some("5m 0s")),
            (NodeKind::Point, NodeStatus::Duplicate, Some("5m 0s")),
            (NodeKind::End, NodeStatus::End, Some("2m 0s")),
        ]
    );
    assert_eq!(metrics.valid_scan_count, 1);
    assert_eq!(metrics.raw_scan_count, 2);
    assert_eq!(metrics.duration_label, "12m 0s");
    assert_eq!(metrics.average_segment_label, "4m 0s");
}

#[test]
fn test_in_progress_round_metrics_from_file() {
    let file = write_temp(IN_PROGRESS_ROUND);
    let detail = load_round_detail(file.path()).unwrap();

    let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 10, 0).unwrap();
    let metrics = derive_round_metrics(&detail, now, &DerivationOptions::default());

    assert_eq!(metrics.duration_label, "10m 0s");
    assert_eq!(metrics.map_nodes.len(), 2);
    assert_eq!(metrics.map_nodes[1].label, "Lobby");
    assert_eq!(metrics.map_nodes[1].status, NodeStatus::Success);
    assert_eq!(metrics.map_nodes[1].elapsed_label.as_deref(), Some("3m 30s"));
    assert!(metrics.map_nodes.iter().all(|n| n.kind != NodeKind::End));
}

#[test]
fn test_timeline_summary_from_file() {
    let file = write_temp(COMPLETED_ROUND);
    let detail = load_round_detail(file.path()).unwrap();
    let entries = summarize_timeline(&detail);

    let kinds: Vec<&str> = entries.iter().map(|e| e.kind.as_str()).collect();
    assert_eq!(kinds, vec!["START", "END", "SCAN", "INCIDENT", "SCAN"]);

    let incident = &entries[3];
    assert_eq!(incident.incident_category.as_deref(), Some("Lighting"));
    assert_eq!(incident.incident_detail.as_deref(), Some("No detail"));
    assert_eq!(incident.evidence_count, 1);

    let first_visit = &entries[4];
    assert_eq!(
        first_visit.map_url.as_deref(),
        Some("https://www.google.com/maps/search/?api=1&query=19.4,-99.1")
    );
    assert_eq!(first_visit.notes.len(), 3);
    assert_eq!((first_visit.tasks_completed, first_visit.tasks_total), (1, 1));
    assert!(entries[2].map_url.is_none());
}

#[test]
fn test_batch_export_and_query() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", COMPLETED_ROUND.replace('\n', "")).unwrap();
    writeln!(file, "{}", IN_PROGRESS_ROUND).unwrap();

    let details = load_round_details_jsonl(file.path()).unwrap();
    assert_eq!(details.len(), 2);

    let query = RoundQuery::default().for_guard(8);
    let ids: Vec<u64> = query
        .apply(details.iter().map(|d| &d.round))
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![42]);

    let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 10, 0).unwrap();
    let mut cache = MetricsCache::default();
    let metrics: Vec<RoundMetrics> = details.iter().map(|d| cache.metrics(d, now)).collect();

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("metrics.jsonl");
    write_metrics(&output, &metrics).unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written.lines().count(), 2);
    assert!(written.contains("\"averageSegmentLabel\":\"4m 0s\""));
    assert!(written.contains("\"status\":\"DUPLICATE\""));
}

#[test]
fn test_invalid_round_is_rejected() {
    let file = write_temp(&IN_PROGRESS_ROUND.replace("IN_PROGRESS", "PAUSED"));
    assert!(load_round_detail(file.path()).is_err());
}
