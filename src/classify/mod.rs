//! Segment classification from transcript text.
//!
//! Tier 1 is weighted phrase matching against a static signal catalog;
//! tier 2 is an optional, pluggable semantic classifier behind the same
//! output contract. The streaming wrapper debounces re-classification of
//! the accumulated transcript as chunks arrive.

pub mod signals;
pub mod streaming;
pub mod tier1;
pub mod tier2;

pub use signals::{get_disqualifiers, get_signals, SignalPattern};
pub use streaming::{ClassificationUpdateFn, StreamingClassifier, StreamingClassifierOptions};
pub use tier1::{
    check_disqualifying_signals, classify_segment_sync, extract_caller_speech,
    get_destination_for_segment, tier1_pattern_match, Classification, SegmentMatch,
};
pub use tier2::{classify_segment, needs_tier2, MockSemanticClassifier, SemanticClassifier};
