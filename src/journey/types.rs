//! Descriptor types for journey graphs.

use serde::{Deserialize, Serialize};

/// Customer archetype inferred from transcript content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Segment {
    Landlord,
    Emergency,
    Budget,
    Oap,
    BusyPro,
    PropMgr,
    SmallBiz,
    Homeowner,
}

impl Segment {
    /// All segments, in classifier scan order.
    pub const ALL: &'static [Segment] = &[
        Segment::Emergency,
        Segment::Landlord,
        Segment::PropMgr,
        Segment::SmallBiz,
        Segment::BusyPro,
        Segment::Oap,
        Segment::Budget,
        Segment::Homeowner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Landlord => "LANDLORD",
            Segment::Emergency => "EMERGENCY",
            Segment::Budget => "BUDGET",
            Segment::Oap => "OAP",
            Segment::BusyPro => "BUSY_PRO",
            Segment::PropMgr => "PROP_MGR",
            Segment::SmallBiz => "SMALL_BIZ",
            Segment::Homeowner => "HOMEOWNER",
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Destination {
    InstantQuote,
    VideoRequest,
    SiteVisit,
    EmergencyDispatch,
    Exit,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::InstantQuote => "INSTANT_QUOTE",
            Destination::VideoRequest => "VIDEO_REQUEST",
            Destination::SiteVisit => "SITE_VISIT",
            Destination::EmergencyDispatch => "EMERGENCY_DISPATCH",
            Destination::Exit => "EXIT",
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of interaction a station represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationKind {
    Prompt,
    Choice,
    InfoCapture,
    Destination,
}

/// Eligibility condition on an option or terminal destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationCondition {
    Always,
    SkuMatch,
    HasVideo,
    EmergencyType,
}

/// Call-scoped facts an eligibility condition may consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DestinationContext {
    pub has_sku_match: bool,
    pub has_video: bool,
    pub is_emergency: bool,
}

/// A selectable option within a choice station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationOption {
    pub id: &'static str,
    pub label: &'static str,
    pub next_station: Option<&'static str>,
    pub condition: Option<DestinationCondition>,
}

/// One station in a journey graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationDef {
    pub id: &'static str,
    pub kind: StationKind,
    pub prompt: &'static str,
    pub capture_fields: &'static [&'static str],
    pub options: &'static [StationOption],
    pub next_station: Option<&'static str>,
}

/// Terminal destination descriptor with its eligibility condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalDestination {
    pub id: Destination,
    pub condition: DestinationCondition,
}

/// Whether a condition holds in the given context.
pub fn condition_met(condition: DestinationCondition, context: &DestinationContext) -> bool {
    match condition {
        DestinationCondition::Always => true,
        DestinationCondition::SkuMatch => context.has_sku_match,
        DestinationCondition::HasVideo => context.has_video,
        DestinationCondition::EmergencyType => context.is_emergency,
    }
}

/// Whether a choice option is available in the given context.
///
/// Options without a condition are always available.
pub fn is_option_available(option: &StationOption, context: &DestinationContext) -> bool {
    match option.condition {
        None => true,
        Some(condition) => condition_met(condition, context),
    }
}
