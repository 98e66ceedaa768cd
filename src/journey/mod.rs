//! Static per-segment journey graphs.
//!
//! Pure data plus read-only traversal: one journey per customer segment,
//! each an entry station, a set of station definitions, and an ordered list
//! of terminal destinations with eligibility conditions. Safe to share
//! across all concurrent calls.

pub mod registry;
pub mod types;

pub use registry::{
    get_journey_destinations, get_journey_entry_station, get_journey_station, get_next_station,
    get_segment_journey, JourneyDefinition, JOURNEYS,
};
pub use types::{
    is_option_available, Destination, DestinationCondition, DestinationContext, FinalDestination,
    Segment, StationDef, StationKind, StationOption,
};
