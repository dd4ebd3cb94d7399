//! Wire format for workspace listings.
//!
//! Matches the JSON emitted by `gt polecat list --json`: an array of
//! session rows with RFC 3339 timestamps (or `null` when the town has no
//! sessions). Resource counters (`cpu_time_ms`, `mem_bytes`) are emitted
//! together by `gt`; rows missing either are listed with metrics unknown.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::SourceError;
use crate::model::{RawCounters, ReportedState, Sample, WorkspaceId};

/// One row of the `gt polecat list --json` output.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListingRow {
    pub name: String,
    #[serde(default)]
    pub rig: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub assigned_bead: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default, rename = "session_running")]
    pub running: bool,
    #[serde(default)]
    pub attached: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cpu_time_ms: Option<u64>,
    #[serde(default)]
    pub mem_bytes: Option<u64>,
}

impl ListingRow {
    fn into_sample(self) -> Sample {
        let counters = match (self.cpu_time_ms, self.mem_bytes) {
            (Some(cpu_time_ms), Some(mem_bytes)) => Some(RawCounters {
                cpu_time_ms,
                mem_bytes,
            }),
            _ => None,
        };

        Sample {
            id: WorkspaceId::from_parts(&self.rig, &self.name),
            name: self.name,
            rig: self.rig,
            state: ReportedState::parse(&self.state),
            bead: self.assigned_bead.filter(|b| !b.is_empty()),
            session_id: self.session_id.filter(|s| !s.is_empty()),
            running: self.running,
            attached: self.attached,
            started_at_ms: self.created_at.and_then(epoch_ms),
            last_activity_ms: self.last_activity.and_then(epoch_ms),
            counters,
        }
    }
}

/// Go's zero time serializes as year 1; anything pre-epoch means unset.
fn epoch_ms(t: DateTime<Utc>) -> Option<u64> {
    let ms = t.timestamp_millis();
    if ms > 0 {
        Some(ms as u64)
    } else {
        None
    }
}

/// Parse a `gt polecat list --json` document into samples.
pub fn parse_listing(bytes: &[u8]) -> Result<Vec<Sample>, SourceError> {
    let rows: Option<Vec<ListingRow>> = serde_json::from_slice(bytes)
        .map_err(|e| SourceError::Unavailable(format!("bad workspace listing: {}", e)))?;
    Ok(rows
        .unwrap_or_default()
        .into_iter()
        .map(ListingRow::into_sample)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_row() {
        let doc = br#"[{
            "name": "slit",
            "rig": "nux",
            "state": "working",
            "assigned_bead": "gt-204",
            "session_id": "gt-nux-slit",
            "session_running": true,
            "attached": false,
            "created_at": "2026-08-21T10:00:00Z",
            "last_activity": "2026-08-21T11:30:00Z",
            "cpu_time_ms": 48211,
            "mem_bytes": 104857600
        }]"#;

        let samples = parse_listing(doc).unwrap();
        assert_eq!(samples.len(), 1);

        let s = &samples[0];
        assert_eq!(s.id.as_str(), "nux/slit");
        assert_eq!(s.state, ReportedState::Working);
        assert_eq!(s.bead.as_deref(), Some("gt-204"));
        assert!(s.running);

        let counters = s.counters.unwrap();
        assert_eq!(counters.cpu_time_ms, 48211);
        assert_eq!(counters.mem_bytes, 104857600);
        assert!(s.started_at_ms.unwrap() < s.last_activity_ms.unwrap());
    }

    #[test]
    fn test_parse_minimal_row() {
        let doc = br#"[{"name": "organic", "rig": "citadel", "state": "idle"}]"#;

        let samples = parse_listing(doc).unwrap();
        let s = &samples[0];
        assert_eq!(s.id.as_str(), "citadel/organic");
        assert_eq!(s.state, ReportedState::Idle);
        assert!(s.bead.is_none());
        assert!(s.counters.is_none());
        assert!(s.started_at_ms.is_none());
    }

    #[test]
    fn test_parse_null_listing() {
        // gt prints "null" for an empty town
        let samples = parse_listing(b"null").unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn test_partial_counters_mean_unknown_metrics() {
        let doc = br#"[{"name": "a", "rig": "r", "state": "working", "cpu_time_ms": 100}]"#;
        let samples = parse_listing(doc).unwrap();
        assert!(samples[0].counters.is_none());
    }

    #[test]
    fn test_zero_time_is_unset() {
        let doc = br#"[{"name": "a", "rig": "r", "state": "idle",
            "created_at": "0001-01-01T00:00:00Z"}]"#;
        let samples = parse_listing(doc).unwrap();
        assert!(samples[0].started_at_ms.is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_listing(b"polecat list: command not found").unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
        assert!(err.to_string().contains("bad workspace listing"));
    }
}
