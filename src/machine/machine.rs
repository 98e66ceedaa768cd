//! The per-call state machine.
//!
//! A call moves forward through the four stations in order; the machine
//! refuses to skip stations or move backwards, and each forward step has a
//! precondition on what must already be captured. Denied transitions are
//! ordinary values, not errors to bubble up: the caller (an agent UI or the
//! simulator) shows the reason and carries on.

use chrono::Utc;

use crate::defaults::CONFIRMED_CONFIDENCE;
use crate::extract::{CapturedInfo, CapturedInfoUpdate, TriState};
use crate::journey::registry::{default_destination, get_journey_destinations, get_segment_journey};
use crate::journey::types::{condition_met, Destination, DestinationContext, Segment};
use crate::machine::events::{CallEvent, EventHandlers, EventKind, HandlerId};
use crate::machine::state::{CallState, Station};

/// Why a station transition was refused. The state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionDenied {
    #[error("Job description not captured")]
    JobMissing,
    #[error("Segment not confirmed")]
    SegmentMissing,
    #[error("Qualification not recorded")]
    QualificationMissing,
    #[error("Must complete stations in order")]
    OutOfOrder,
    #[error("Cannot go backwards in the flow")]
    Backwards,
    #[error("Already at the final station")]
    AtFinalStation,
    #[error("Job description required for fast-track")]
    FastTrackJobMissing,
}

/// State machine for a single call.
pub struct CallStateMachine {
    state: CallState,
    handlers: EventHandlers,
}

impl CallStateMachine {
    pub fn new(call_id: impl Into<String>) -> Self {
        Self {
            state: CallState::new(call_id),
            handlers: EventHandlers::new(),
        }
    }

    /// Rebuild a machine around previously persisted state.
    pub fn from_state(state: CallState) -> Self {
        Self {
            state,
            handlers: EventHandlers::new(),
        }
    }

    pub fn state(&self) -> &CallState {
        &self.state
    }

    pub fn call_id(&self) -> &str {
        &self.state.call_id
    }

    pub fn current_station(&self) -> Station {
        self.state.current_station
    }

    fn touch(&mut self) {
        self.state.updated_at = Utc::now();
    }

    /// Apply an explicit agent correction. Set fields overwrite whatever was
    /// captured before; unset fields are left alone.
    pub fn update_captured_info(&mut self, update: &CapturedInfoUpdate) {
        self.state.captured_info.apply_update(update);
        self.touch();
    }

    /// Fold in extractor output. Streaming extraction is keep-first: nothing
    /// already captured is overwritten.
    pub fn merge_extracted_info(&mut self, extracted: &CapturedInfo) {
        self.state.captured_info.merge_keep_first(extracted);
        self.touch();
    }

    /// Record a classifier result. A lower-confidence result never displaces
    /// a higher one, but its signals are still merged in.
    pub fn update_segment(&mut self, segment: Segment, confidence: u8, signals: &[String]) {
        if confidence < self.state.segment_confidence {
            for signal in signals {
                self.add_segment_signal(signal);
            }
            return;
        }
        self.state.detected_segment = Some(segment);
        self.state.segment_confidence = confidence;
        for signal in signals {
            if !self.state.segment_signals.contains(signal) {
                self.state.segment_signals.push(signal.clone());
            }
        }
        self.touch();
        self.handlers.emit(&CallEvent::SegmentDetected {
            segment,
            confidence,
        });
    }

    pub fn add_segment_signal(&mut self, signal: &str) {
        if !self.state.segment_signals.iter().any(|s| s == signal) {
            self.state.segment_signals.push(signal.to_string());
            self.touch();
        }
    }

    /// Agent confirmation pins the segment at full confidence, above anything
    /// the pattern matcher can produce.
    pub fn confirm_segment(&mut self, segment: Segment) {
        self.state.detected_segment = Some(segment);
        self.state.segment_confidence = CONFIRMED_CONFIDENCE;
        self.touch();
        self.handlers.emit(&CallEvent::SegmentConfirmed { segment });
    }

    pub fn add_qualification_note(&mut self, note: &str) {
        if !self.state.qualification_notes.iter().any(|n| n == note) {
            self.state.qualification_notes.push(note.to_string());
            self.touch();
        }
    }

    pub fn set_qualified(&mut self, qualified: bool, notes: &[String]) {
        self.state.is_qualified = TriState::from_bool(qualified);
        for note in notes {
            self.add_qualification_note(note);
        }
        self.touch();
        self.handlers.emit(&CallEvent::QualifiedSet { qualified });
    }

    /// Check whether the call may move to `target` right now.
    pub fn can_advance_to(&self, target: Station) -> Result<(), TransitionDenied> {
        if target.order() <= self.state.current_station.order() {
            return Err(TransitionDenied::Backwards);
        }
        if Some(target) != self.state.current_station.next() {
            return Err(TransitionDenied::OutOfOrder);
        }
        match target {
            Station::Listen => Err(TransitionDenied::Backwards),
            Station::Segment => {
                if self.state.captured_info.job.is_none() {
                    return Err(TransitionDenied::JobMissing);
                }
                Ok(())
            }
            Station::Qualify => {
                if self.state.detected_segment.is_none() {
                    return Err(TransitionDenied::SegmentMissing);
                }
                Ok(())
            }
            Station::Destination => {
                if !self.state.is_qualified.is_known() {
                    return Err(TransitionDenied::QualificationMissing);
                }
                Ok(())
            }
        }
    }

    /// Complete the current station and move to the next one.
    pub fn confirm_station(&mut self) -> Result<Station, TransitionDenied> {
        let next = self
            .state
            .current_station
            .next()
            .ok_or(TransitionDenied::AtFinalStation)?;
        self.can_advance_to(next)?;
        self.advance(next);
        Ok(next)
    }

    fn advance(&mut self, next: Station) {
        let from = self.state.current_station;
        self.state.completed_stations.push(from);
        self.state.current_station = next;
        self.state.station_entered_at = Utc::now();
        if next == Station::Destination {
            if let Some(segment) = self.state.detected_segment {
                self.state.recommended_destination = Some(default_destination(segment));
            }
        }
        self.touch();
        self.handlers
            .emit(&CallEvent::StationChanged { from, to: next });
    }

    /// Jump straight to the final station, skipping qualification. Only the
    /// job description is required; skipped stations are recorded as
    /// completed. Calling this at the final station is a no-op.
    pub fn fast_track_to_destination(&mut self) -> Result<Station, TransitionDenied> {
        if self.state.current_station == Station::Destination {
            return Ok(Station::Destination);
        }
        if self.state.captured_info.job.is_none() {
            return Err(TransitionDenied::FastTrackJobMissing);
        }
        let from = self.state.current_station;
        let mut station = from;
        while let Some(next) = station.next() {
            self.state.completed_stations.push(station);
            station = next;
        }
        self.state.current_station = Station::Destination;
        self.state.station_entered_at = Utc::now();
        let segment = self.state.detected_segment.unwrap_or(Segment::Homeowner);
        self.state.recommended_destination = Some(default_destination(segment));
        self.touch();
        self.handlers.emit(&CallEvent::StationChanged {
            from,
            to: Station::Destination,
        });
        Ok(Station::Destination)
    }

    /// Record the destination the agent actually chose, which may differ
    /// from the recommendation.
    pub fn select_destination(&mut self, destination: Destination) {
        self.state.selected_destination = Some(destination);
        self.touch();
        self.handlers
            .emit(&CallEvent::DestinationSelected { destination });
    }

    pub fn has_segment(&self) -> bool {
        self.state.detected_segment.is_some()
    }

    pub fn qualified(&self) -> TriState {
        self.state.is_qualified
    }

    pub fn is_at_final_station(&self) -> bool {
        self.state.current_station == Station::Destination
    }

    /// How long the call has been at the current station.
    pub fn time_in_current_station(&self) -> chrono::Duration {
        Utc::now() - self.state.station_entered_at
    }

    /// Destinations whose conditions hold under `context`, in the journey's
    /// preference order for the detected segment.
    pub fn available_destinations(&self, context: &DestinationContext) -> Vec<Destination> {
        let segment = self.state.detected_segment.unwrap_or(Segment::Homeowner);
        get_journey_destinations(segment)
            .iter()
            .filter(|d| condition_met(d.condition, context))
            .map(|d| d.id)
            .collect()
    }

    /// The guidance prompt for the current station, taken from the detected
    /// segment's journey. Journeys shorter than the full station chain clamp
    /// to their final station's prompt.
    pub fn current_prompt(&self) -> &'static str {
        let segment = self.state.detected_segment.unwrap_or(Segment::Homeowner);
        let journey = get_segment_journey(segment);
        let mut chain = Vec::with_capacity(journey.stations.len());
        let mut station_id = Some(journey.entry_station);
        while let Some(id) = station_id {
            match journey.stations.iter().find(|s| s.id == id) {
                Some(def) => {
                    chain.push(def);
                    station_id = def.next_station;
                }
                None => break,
            }
        }
        let index = (self.state.current_station.order() as usize).min(chain.len().saturating_sub(1));
        chain.get(index).map(|def| def.prompt).unwrap_or("")
    }

    /// Wipe the call back to a fresh LISTEN state, keeping its identity.
    pub fn reset(&mut self) {
        let call_id = std::mem::take(&mut self.state.call_id);
        let created_at = self.state.created_at;
        self.state = CallState::new(call_id);
        self.state.created_at = created_at;
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(&self.state)?)
    }

    /// Rebuild a machine from persisted JSON. Missing fields fall back to
    /// their defaults so older snapshots still restore.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let state: CallState = serde_json::from_str(json)?;
        Ok(Self::from_state(state))
    }

    pub fn on(&mut self, kind: EventKind, handler: Box<dyn Fn(&CallEvent) + Send>) -> HandlerId {
        self.handlers.on(kind, handler)
    }

    pub fn off(&mut self, id: HandlerId) -> bool {
        self.handlers.off(id)
    }
}

impl std::fmt::Debug for CallStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallStateMachine")
            .field("state", &self.state)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
