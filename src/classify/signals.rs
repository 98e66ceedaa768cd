//! Catalog of per-segment signal phrases and disqualifiers.
//!
//! Weights are tuning data: a strong identifying phrase carries 30–40, a
//! suggestive one 15–25. Distinct matches accumulate additively and are
//! capped by `defaults::CONFIDENCE_CAP`, so no single weak signal can claim
//! a call on its own.

use crate::journey::Segment;

/// One weighted phrase pattern for a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalPattern {
    /// Lowercase phrase matched by substring search.
    pub phrase: &'static str,
    /// Additive confidence contribution (0–100 scale).
    pub weight: u8,
}

struct SegmentSignals {
    segment: Segment,
    signals: &'static [SignalPattern],
    disqualifiers: &'static [&'static str],
}

const CATALOG: &[SegmentSignals] = &[
    SegmentSignals {
        segment: Segment::Emergency,
        signals: &[
            SignalPattern { phrase: "flooding", weight: 40 },
            SignalPattern { phrase: "burst pipe", weight: 40 },
            SignalPattern { phrase: "gas leak", weight: 40 },
            SignalPattern { phrase: "emergency", weight: 40 },
            SignalPattern { phrase: "water everywhere", weight: 35 },
            SignalPattern { phrase: "water coming through", weight: 35 },
            SignalPattern { phrase: "no heating", weight: 30 },
            SignalPattern { phrase: "no hot water", weight: 30 },
            SignalPattern { phrase: "urgent", weight: 25 },
            SignalPattern { phrase: "right now", weight: 20 },
        ],
        disqualifiers: &["no rush", "not urgent", "whenever suits", "sometime next"],
    },
    SegmentSignals {
        segment: Segment::Landlord,
        signals: &[
            SignalPattern { phrase: "my tenant", weight: 40 },
            SignalPattern { phrase: "rental property", weight: 35 },
            SignalPattern { phrase: "i rent it out", weight: 35 },
            SignalPattern { phrase: "buy to let", weight: 35 },
            SignalPattern { phrase: "my rental", weight: 30 },
            SignalPattern { phrase: "tenant", weight: 25 },
            SignalPattern { phrase: "my properties", weight: 25 },
            SignalPattern { phrase: "letting agent", weight: 20 },
        ],
        disqualifiers: &[
            "i live there myself",
            "my own home",
            "no tenants",
            "we manage",
        ],
    },
    SegmentSignals {
        segment: Segment::PropMgr,
        signals: &[
            SignalPattern { phrase: "property management", weight: 40 },
            SignalPattern { phrase: "managing agent", weight: 40 },
            SignalPattern { phrase: "we manage", weight: 35 },
            SignalPattern { phrase: "our landlords", weight: 30 },
            SignalPattern { phrase: "portfolio", weight: 30 },
            SignalPattern { phrase: "block of flats", weight: 25 },
            SignalPattern { phrase: "work order", weight: 20 },
        ],
        disqualifiers: &["my own flat", "my own house", "i live there"],
    },
    SegmentSignals {
        segment: Segment::SmallBiz,
        signals: &[
            SignalPattern { phrase: "our premises", weight: 35 },
            SignalPattern { phrase: "our shop", weight: 35 },
            SignalPattern { phrase: "our office", weight: 35 },
            SignalPattern { phrase: "our cafe", weight: 30 },
            SignalPattern { phrase: "our restaurant", weight: 30 },
            SignalPattern { phrase: "the business", weight: 25 },
            SignalPattern { phrase: "before we open", weight: 25 },
            SignalPattern { phrase: "our staff", weight: 15 },
        ],
        disqualifiers: &["my house", "my home", "my flat"],
    },
    SegmentSignals {
        segment: Segment::BusyPro,
        signals: &[
            SignalPattern { phrase: "between meetings", weight: 35 },
            SignalPattern { phrase: "i'm at work", weight: 30 },
            SignalPattern { phrase: "im at work", weight: 30 },
            SignalPattern { phrase: "can you text me", weight: 25 },
            SignalPattern { phrase: "very busy", weight: 25 },
            SignalPattern { phrase: "no time", weight: 25 },
            SignalPattern { phrase: "keep it quick", weight: 20 },
            SignalPattern { phrase: "quick quote", weight: 20 },
        ],
        disqualifiers: &["i'm retired", "im retired", "all the time in the world"],
    },
    SegmentSignals {
        segment: Segment::Oap,
        signals: &[
            SignalPattern { phrase: "pensioner", weight: 40 },
            SignalPattern { phrase: "my pension", weight: 35 },
            SignalPattern { phrase: "my carer", weight: 35 },
            SignalPattern { phrase: "hard of hearing", weight: 30 },
            SignalPattern { phrase: "my daughter helps", weight: 25 },
            SignalPattern { phrase: "my son helps", weight: 25 },
            SignalPattern { phrase: "bit slower", weight: 20 },
        ],
        disqualifiers: &["i'm at work", "im at work", "the business"],
    },
    SegmentSignals {
        segment: Segment::Budget,
        signals: &[
            SignalPattern { phrase: "cheapest", weight: 40 },
            SignalPattern { phrase: "shopping around", weight: 35 },
            SignalPattern { phrase: "best price", weight: 30 },
            SignalPattern { phrase: "too expensive", weight: 30 },
            SignalPattern { phrase: "just getting quotes", weight: 30 },
            SignalPattern { phrase: "price match", weight: 25 },
            SignalPattern { phrase: "how much", weight: 15 },
        ],
        disqualifiers: &["money is no object", "whatever it costs", "don't care about cost"],
    },
    SegmentSignals {
        segment: Segment::Homeowner,
        signals: &[
            SignalPattern { phrase: "we just moved", weight: 30 },
            SignalPattern { phrase: "just bought", weight: 30 },
            SignalPattern { phrase: "my house", weight: 25 },
            SignalPattern { phrase: "my home", weight: 25 },
            SignalPattern { phrase: "our kitchen", weight: 20 },
            SignalPattern { phrase: "our bathroom", weight: 20 },
            SignalPattern { phrase: "my garden", weight: 20 },
        ],
        disqualifiers: &["my tenant", "rental property", "we manage"],
    },
];

/// Weighted signal phrases for a segment.
pub fn get_signals(segment: Segment) -> &'static [SignalPattern] {
    CATALOG
        .iter()
        .find(|entry| entry.segment == segment)
        .map(|entry| entry.signals)
        .unwrap_or(&[])
}

/// Phrases that contradict membership in a segment.
pub fn get_disqualifiers(segment: Segment) -> &'static [&'static str] {
    CATALOG
        .iter()
        .find(|entry| entry.segment == segment)
        .map(|entry| entry.disqualifiers)
        .unwrap_or(&[])
}
