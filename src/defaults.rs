//! Default configuration constants for callguide.
//!
//! This module provides shared constants used across different configuration
//! types to ensure consistency and eliminate duplication.

/// Maximum confidence tier-1 pattern matching may assign (0–100 scale).
///
/// Pattern matching alone never reaches full confidence; the headroom above
/// 95 is reserved for an explicit agent confirmation, which writes 100.
pub const CONFIDENCE_CAP: u8 = 95;

/// Confidence written when an agent confirms a segment manually.
pub const CONFIRMED_CONFIDENCE: u8 = 100;

/// Tier-1 confidence below which the semantic (tier-2) classifier is
/// consulted, when one is configured.
pub const TIER2_TRIGGER_CONFIDENCE: u8 = 40;

/// If the top two tier-1 candidates are within this margin, the result is
/// considered ambiguous and tier 2 is consulted.
pub const TIER2_AMBIGUITY_MARGIN: u8 = 10;

/// Default debounce window for the streaming classifier in milliseconds.
///
/// Transcript chunks arrive in rapid bursts during speech. Re-classifying on
/// every chunk would be wasteful and would flicker the displayed segment, so
/// a burst collapses into one re-evaluation after this quiet period.
pub const CLASSIFY_DEBOUNCE_MS: u64 = 300;

/// Default age after which an idle in-memory session is evicted, in seconds.
///
/// 30 minutes comfortably exceeds any realistic call plus reconnect window.
pub const STALE_SESSION_SECS: u64 = 30 * 60;

/// Default interval between background stale-session sweeps, in seconds.
pub const CLEANUP_INTERVAL_SECS: u64 = 5 * 60;

/// Default age after which a durable call record is deleted, in seconds.
///
/// Retention for storage only — eviction of live sessions is governed by
/// `STALE_SESSION_SECS` independently.
pub const DB_RETENTION_SECS: u64 = 24 * 60 * 60;
