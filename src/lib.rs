//! callguide - Call segmentation and routing guidance
//!
//! Classifies inbound trade-service calls into customer segments, extracts
//! job details from live transcripts, and walks each call through a staged
//! routing flow to a recommended destination.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod action;
pub mod classify;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod extract;
pub mod journey;
#[cfg(feature = "cli")]
pub mod logging;
pub mod machine;
pub mod session;
pub mod simulate;

// Core surface (transcript → classification → routed call)
pub use classify::{
    classify_segment, Classification, SegmentMatch, SemanticClassifier, StreamingClassifier,
    StreamingClassifierOptions,
};
pub use extract::{CapturedInfo, CapturedInfoUpdate, StreamingInfoExtractor, TriState};
pub use journey::{Destination, Segment};
pub use machine::{CallState, CallStateMachine, Station, TransitionDenied};

// Sessions
pub use session::{FileSessionStore, MemorySessionStore, SessionManager, SessionStore};

// Agent command surface
pub use action::{apply_action, ActionResponse, AgentAction};

// Error handling
pub use error::{CallguideError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.2.0+abc1234"` when git hash is available, `"0.2.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
