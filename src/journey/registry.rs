//! Catalog of per-segment journeys.
//!
//! Station graphs and destination orderings are content data: the state
//! machine traverses them but never branches on their wording.

use crate::journey::types::{
    condition_met, Destination, DestinationCondition, DestinationContext, FinalDestination,
    Segment, StationDef, StationKind, StationOption,
};

/// A complete journey for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JourneyDefinition {
    pub segment: Segment,
    pub entry_station: &'static str,
    pub stations: &'static [StationDef],
    pub destinations: &'static [FinalDestination],
}

const QUOTE_FIRST_DESTINATIONS: &[FinalDestination] = &[
    FinalDestination {
        id: Destination::InstantQuote,
        condition: DestinationCondition::Always,
    },
    FinalDestination {
        id: Destination::VideoRequest,
        condition: DestinationCondition::HasVideo,
    },
    FinalDestination {
        id: Destination::SiteVisit,
        condition: DestinationCondition::Always,
    },
];

const EMERGENCY_DESTINATIONS: &[FinalDestination] = &[
    FinalDestination {
        id: Destination::EmergencyDispatch,
        condition: DestinationCondition::EmergencyType,
    },
    FinalDestination {
        id: Destination::SiteVisit,
        condition: DestinationCondition::Always,
    },
];

const VISIT_FIRST_DESTINATIONS: &[FinalDestination] = &[
    FinalDestination {
        id: Destination::SiteVisit,
        condition: DestinationCondition::Always,
    },
    FinalDestination {
        id: Destination::VideoRequest,
        condition: DestinationCondition::HasVideo,
    },
];

const EXIT_FIRST_DESTINATIONS: &[FinalDestination] = &[
    FinalDestination {
        id: Destination::Exit,
        condition: DestinationCondition::Always,
    },
    FinalDestination {
        id: Destination::InstantQuote,
        condition: DestinationCondition::SkuMatch,
    },
];

const STANDARD_STATIONS: &[StationDef] = &[
    StationDef {
        id: "open_listen",
        kind: StationKind::Prompt,
        prompt: "Let the caller describe the problem in their own words.",
        capture_fields: &[],
        options: &[],
        next_station: Some("capture_details"),
    },
    StationDef {
        id: "capture_details",
        kind: StationKind::InfoCapture,
        prompt: "Confirm the job and where the property is.",
        capture_fields: &["job", "postcode"],
        options: &[],
        next_station: Some("qualify_authority"),
    },
    StationDef {
        id: "qualify_authority",
        kind: StationKind::Choice,
        prompt: "Check they can sign off the work.",
        capture_fields: &[],
        options: &[
            StationOption {
                id: "can_authorize",
                label: "Caller can authorize",
                next_station: Some("route_outcome"),
                condition: None,
            },
            StationOption {
                id: "needs_owner",
                label: "Needs the owner's sign-off",
                next_station: Some("route_outcome"),
                condition: None,
            },
        ],
        next_station: Some("route_outcome"),
    },
    StationDef {
        id: "route_outcome",
        kind: StationKind::Destination,
        prompt: "Offer the recommended next step.",
        capture_fields: &[],
        options: &[
            StationOption {
                id: "quote_now",
                label: "Send an instant quote",
                next_station: None,
                condition: Some(DestinationCondition::SkuMatch),
            },
            StationOption {
                id: "ask_video",
                label: "Ask for a video of the job",
                next_station: None,
                condition: Some(DestinationCondition::HasVideo),
            },
            StationOption {
                id: "book_visit",
                label: "Book a site visit",
                next_station: None,
                condition: None,
            },
        ],
        next_station: None,
    },
];

const EMERGENCY_STATIONS: &[StationDef] = &[
    StationDef {
        id: "open_listen",
        kind: StationKind::Prompt,
        prompt: "Find out what is happening right now and whether anyone is at risk.",
        capture_fields: &[],
        options: &[],
        next_station: Some("capture_details"),
    },
    StationDef {
        id: "capture_details",
        kind: StationKind::InfoCapture,
        prompt: "Get the address first, details second.",
        capture_fields: &["postcode", "job"],
        options: &[],
        next_station: Some("route_outcome"),
    },
    StationDef {
        id: "route_outcome",
        kind: StationKind::Destination,
        prompt: "Dispatch and stay on the line.",
        capture_fields: &[],
        options: &[StationOption {
            id: "dispatch",
            label: "Dispatch an engineer now",
            next_station: None,
            condition: Some(DestinationCondition::EmergencyType),
        }],
        next_station: None,
    },
];

const GENTLE_STATIONS: &[StationDef] = &[
    StationDef {
        id: "open_listen",
        kind: StationKind::Prompt,
        prompt: "Take it slowly; let the caller explain at their own pace.",
        capture_fields: &[],
        options: &[],
        next_station: Some("capture_details"),
    },
    StationDef {
        id: "capture_details",
        kind: StationKind::InfoCapture,
        prompt: "Write down the job and the address, repeating back to confirm.",
        capture_fields: &["job", "postcode", "name"],
        options: &[],
        next_station: Some("route_outcome"),
    },
    StationDef {
        id: "route_outcome",
        kind: StationKind::Destination,
        prompt: "Offer a visit; avoid asking for photos or videos.",
        capture_fields: &[],
        options: &[StationOption {
            id: "book_visit",
            label: "Book a site visit",
            next_station: None,
            condition: None,
        }],
        next_station: None,
    },
];

const BUDGET_STATIONS: &[StationDef] = &[
    StationDef {
        id: "open_listen",
        kind: StationKind::Prompt,
        prompt: "Hear them out and gauge whether price is the only concern.",
        capture_fields: &[],
        options: &[],
        next_station: Some("route_outcome"),
    },
    StationDef {
        id: "route_outcome",
        kind: StationKind::Destination,
        prompt: "Close politely; quote only on an exact catalog match.",
        capture_fields: &[],
        options: &[
            StationOption {
                id: "quote_now",
                label: "Send an instant quote",
                next_station: None,
                condition: Some(DestinationCondition::SkuMatch),
            },
            StationOption {
                id: "polite_exit",
                label: "Wish them well",
                next_station: None,
                condition: None,
            },
        ],
        next_station: None,
    },
];

/// Every journey, one per segment.
pub const JOURNEYS: &[JourneyDefinition] = &[
    JourneyDefinition {
        segment: Segment::Landlord,
        entry_station: "open_listen",
        stations: STANDARD_STATIONS,
        destinations: QUOTE_FIRST_DESTINATIONS,
    },
    JourneyDefinition {
        segment: Segment::Emergency,
        entry_station: "open_listen",
        stations: EMERGENCY_STATIONS,
        destinations: EMERGENCY_DESTINATIONS,
    },
    JourneyDefinition {
        segment: Segment::Budget,
        entry_station: "open_listen",
        stations: BUDGET_STATIONS,
        destinations: EXIT_FIRST_DESTINATIONS,
    },
    JourneyDefinition {
        segment: Segment::Oap,
        entry_station: "open_listen",
        stations: GENTLE_STATIONS,
        destinations: VISIT_FIRST_DESTINATIONS,
    },
    JourneyDefinition {
        segment: Segment::BusyPro,
        entry_station: "open_listen",
        stations: STANDARD_STATIONS,
        destinations: QUOTE_FIRST_DESTINATIONS,
    },
    JourneyDefinition {
        segment: Segment::PropMgr,
        entry_station: "open_listen",
        stations: STANDARD_STATIONS,
        destinations: QUOTE_FIRST_DESTINATIONS,
    },
    JourneyDefinition {
        segment: Segment::SmallBiz,
        entry_station: "open_listen",
        stations: STANDARD_STATIONS,
        destinations: QUOTE_FIRST_DESTINATIONS,
    },
    JourneyDefinition {
        segment: Segment::Homeowner,
        entry_station: "open_listen",
        stations: STANDARD_STATIONS,
        destinations: QUOTE_FIRST_DESTINATIONS,
    },
];

/// Look up the journey for a segment.
pub fn get_segment_journey(segment: Segment) -> &'static JourneyDefinition {
    // JOURNEYS covers every Segment variant; the fallback is unreachable but
    // keeps this total without panicking.
    JOURNEYS
        .iter()
        .find(|j| j.segment == segment)
        .unwrap_or(&JOURNEYS[0])
}

/// Entry station id for a segment's journey.
pub fn get_journey_entry_station(segment: Segment) -> &'static str {
    get_segment_journey(segment).entry_station
}

/// Look up a station definition within a segment's journey.
pub fn get_journey_station(segment: Segment, station_id: &str) -> Option<&'static StationDef> {
    get_segment_journey(segment)
        .stations
        .iter()
        .find(|s| s.id == station_id)
}

/// Resolve the next station from `current_station_id`, following the chosen
/// option's edge when one is given, else the station's default edge.
pub fn get_next_station(
    segment: Segment,
    current_station_id: &str,
    option_id: Option<&str>,
) -> Option<&'static str> {
    let station = get_journey_station(segment, current_station_id)?;
    if let Some(option_id) = option_id {
        if let Some(option) = station.options.iter().find(|o| o.id == option_id) {
            return option.next_station;
        }
    }
    station.next_station
}

/// Ordered terminal destinations for a segment's journey.
pub fn get_journey_destinations(segment: Segment) -> &'static [FinalDestination] {
    get_segment_journey(segment).destinations
}

/// The default recommended destination for a segment: the first entry in
/// its journey's destination list whose condition holds under the segment's
/// baseline context (only emergencies assert `is_emergency`).
pub fn default_destination(segment: Segment) -> Destination {
    let context = DestinationContext {
        is_emergency: segment == Segment::Emergency,
        ..Default::default()
    };
    get_journey_destinations(segment)
        .iter()
        .find(|d| condition_met(d.condition, &context))
        .map(|d| d.id)
        // Every journey carries at least one Always entry
        .unwrap_or(Destination::SiteVisit)
}
