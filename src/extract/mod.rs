//! Structured fact extraction from transcript text.
//!
//! Pure, never-failing extractors that pull a job description, a UK
//! postcode, and tri-state qualification flags out of raw caller speech,
//! plus a streaming accumulator that merges facts chunk by chunk.

pub mod info;
pub mod streaming;

pub use info::{
    detect_decision_maker, detect_remote, detect_tenant, extract_info, extract_info_from_entries,
    extract_job, extract_postcode, is_valid_uk_postcode, normalize_postcode, CapturedInfo,
    CapturedInfoUpdate, Speaker, TranscriptEntry, TriState,
};
pub use streaming::StreamingInfoExtractor;
