//! Call-scoped state snapshot.
//!
//! `CallState` is the full serializable picture of one call; every field
//! carries a serde default so a corrupted or schema-evolved persisted record
//! restores with safe defaults instead of failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extract::{CapturedInfo, TriState};
use crate::journey::{Destination, Segment};

/// A phase of the call flow, progressed strictly in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Station {
    #[default]
    Listen,
    Segment,
    Qualify,
    Destination,
}

impl Station {
    /// Position in the fixed flow order.
    pub fn order(self) -> u8 {
        match self {
            Station::Listen => 0,
            Station::Segment => 1,
            Station::Qualify => 2,
            Station::Destination => 3,
        }
    }

    /// The next station in sequence; `None` at the terminal station.
    pub fn next(self) -> Option<Station> {
        match self {
            Station::Listen => Some(Station::Segment),
            Station::Segment => Some(Station::Qualify),
            Station::Qualify => Some(Station::Destination),
            Station::Destination => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Station::Listen => "LISTEN",
            Station::Segment => "SEGMENT",
            Station::Qualify => "QUALIFY",
            Station::Destination => "DESTINATION",
        }
    }
}

impl std::fmt::Display for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_now() -> DateTime<Utc> {
    Utc::now()
}

/// Everything known about one call, owned exclusively by its state machine
/// and mirrored into durable storage by the session manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallState {
    pub call_id: String,
    pub current_station: Station,
    /// Stations already exited; append-only.
    pub completed_stations: Vec<Station>,
    pub detected_segment: Option<Segment>,
    pub segment_confidence: u8,
    /// Matched phrases explaining the segment; never holds duplicates.
    pub segment_signals: Vec<String>,
    pub captured_info: CapturedInfo,
    pub is_qualified: TriState,
    /// Ordered, deduplicated notes from qualification.
    pub qualification_notes: Vec<String>,
    pub recommended_destination: Option<Destination>,
    pub selected_destination: Option<Destination>,
    #[serde(default = "default_now")]
    pub station_entered_at: DateTime<Utc>,
    #[serde(default = "default_now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_now")]
    pub updated_at: DateTime<Utc>,
}

impl Default for CallState {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl CallState {
    /// Fresh state for a newly created call.
    pub fn new(call_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            call_id: call_id.into(),
            current_station: Station::Listen,
            completed_stations: Vec::new(),
            detected_segment: None,
            segment_confidence: 0,
            segment_signals: Vec::new(),
            captured_info: CapturedInfo::default(),
            is_qualified: TriState::Unknown,
            qualification_notes: Vec::new(),
            recommended_destination: None,
            selected_destination: None,
            station_entered_at: now,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_order_is_strictly_increasing() {
        assert!(Station::Listen.order() < Station::Segment.order());
        assert!(Station::Segment.order() < Station::Qualify.order());
        assert!(Station::Qualify.order() < Station::Destination.order());
    }

    #[test]
    fn test_station_next_chain_ends_at_destination() {
        assert_eq!(Station::Listen.next(), Some(Station::Segment));
        assert_eq!(Station::Segment.next(), Some(Station::Qualify));
        assert_eq!(Station::Qualify.next(), Some(Station::Destination));
        assert_eq!(Station::Destination.next(), None);
    }

    #[test]
    fn test_station_serializes_screaming_snake_case() {
        assert_eq!(serde_json::to_string(&Station::Listen).unwrap(), "\"LISTEN\"");
        assert_eq!(
            serde_json::to_string(&Station::Destination).unwrap(),
            "\"DESTINATION\""
        );
    }

    #[test]
    fn test_new_state_starts_at_listen() {
        let state = CallState::new("call-1");
        assert_eq!(state.call_id, "call-1");
        assert_eq!(state.current_station, Station::Listen);
        assert!(state.completed_stations.is_empty());
        assert_eq!(state.segment_confidence, 0);
        assert_eq!(state.is_qualified, TriState::Unknown);
        assert_eq!(state.recommended_destination, None);
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut state = CallState::new("call-2");
        state.detected_segment = Some(Segment::Landlord);
        state.segment_confidence = 80;
        state.captured_info.job = Some("leaking tap".to_string());

        let json = serde_json::to_value(&state).unwrap();
        let restored: CallState = serde_json::from_value(json).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_json_uses_wire_field_names() {
        let state = CallState::new("call-3");
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("callId").is_some());
        assert!(json.get("currentStation").is_some());
        assert!(json.get("completedStations").is_some());
        assert!(json.get("capturedInfo").is_some());
        assert!(json.get("stationEnteredAt").is_some());
    }

    #[test]
    fn test_restore_tolerates_missing_fields() {
        let sparse = serde_json::json!({
            "callId": "call-4",
            "currentStation": "QUALIFY"
        });
        let restored: CallState = serde_json::from_value(sparse).unwrap();
        assert_eq!(restored.call_id, "call-4");
        assert_eq!(restored.current_station, Station::Qualify);
        assert_eq!(restored.is_qualified, TriState::Unknown);
        assert!(restored.segment_signals.is_empty());
    }

    #[test]
    fn test_restore_tolerates_empty_object() {
        let restored: CallState = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(restored.call_id, "");
        assert_eq!(restored.current_station, Station::Listen);
    }
}
