//! Tier-1 pattern classification.
//!
//! Scores transcript text against the per-segment signal catalog. Distinct
//! matched phrases accumulate additively, capped at
//! `defaults::CONFIDENCE_CAP`; results come back ranked best-first.

use serde::{Deserialize, Serialize};

use crate::classify::signals::{get_disqualifiers, get_signals};
use crate::defaults;
use crate::extract::{Speaker, TranscriptEntry};
use crate::journey::{registry, Destination, Segment};

/// One candidate segment with its confidence and explaining signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMatch {
    pub segment: Segment,
    /// 0–100; tier 1 alone never exceeds `defaults::CONFIDENCE_CAP`.
    pub confidence: u8,
    /// The distinct phrases that matched, in catalog order.
    pub signals: Vec<String>,
}

/// Ranked classification result: the best candidate plus the rest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Classification {
    pub primary: Option<SegmentMatch>,
    pub alternates: Vec<SegmentMatch>,
}

impl Classification {
    /// Build from a ranked candidate list.
    pub fn from_ranked(mut ranked: Vec<SegmentMatch>) -> Self {
        if ranked.is_empty() {
            Self::default()
        } else {
            let primary = ranked.remove(0);
            Self {
                primary: Some(primary),
                alternates: ranked,
            }
        }
    }
}

/// Score `text` against every segment's signal table.
///
/// Segments with no matches are omitted; the rest are sorted by descending
/// confidence (catalog scan order breaks ties).
pub fn tier1_pattern_match(text: &str) -> Vec<SegmentMatch> {
    let lower = text.to_lowercase();
    let mut matches: Vec<SegmentMatch> = Vec::new();

    for segment in Segment::ALL {
        let mut confidence: u16 = 0;
        let mut signals: Vec<String> = Vec::new();
        for pattern in get_signals(*segment) {
            if lower.contains(pattern.phrase) && !signals.iter().any(|s| s == pattern.phrase) {
                confidence += u16::from(pattern.weight);
                signals.push(pattern.phrase.to_string());
            }
        }
        if signals.is_empty() {
            continue;
        }
        matches.push(SegmentMatch {
            segment: *segment,
            confidence: confidence.min(u16::from(defaults::CONFIDENCE_CAP)) as u8,
            signals,
        });
    }

    matches.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    matches
}

/// Phrases in `text` that contradict membership in `segment`.
///
/// Advisory only: a disqualifier does not remove the segment from
/// `tier1_pattern_match` results, it is for callers to weigh.
pub fn check_disqualifying_signals(text: &str, segment: Segment) -> Vec<String> {
    let lower = text.to_lowercase();
    get_disqualifiers(segment)
        .iter()
        .filter(|phrase| lower.contains(*phrase))
        .map(|phrase| phrase.to_string())
        .collect()
}

/// Synchronous tier-1-only classification.
pub fn classify_segment_sync(text: &str) -> Classification {
    Classification::from_ranked(tier1_pattern_match(text))
}

/// The default recommended destination for a segment.
pub fn get_destination_for_segment(segment: Segment) -> Destination {
    registry::default_destination(segment)
}

/// Concatenate only the caller's turns, so classification is not polluted
/// by script language spoken by the agent.
pub fn extract_caller_speech(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .filter(|e| e.speaker == Speaker::Caller)
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
