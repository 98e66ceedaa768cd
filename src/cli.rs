//! Command-line interface for callguide
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Call segmentation and routing guidance
#[derive(Parser, Debug)]
#[command(
    name = "callguide",
    version = crate::version_string(),
    about = "Call segmentation and routing guidance"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for stored session snapshots (default: from config)
    #[arg(long, global = true, value_name = "DIR")]
    pub storage: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a transcript file through the full call flow
    Simulate {
        /// Transcript file: one turn per line, "caller:" or "agent:" prefixed
        #[arg(value_name = "FILE")]
        transcript: PathBuf,

        /// Caller phone number to attach to the session
        #[arg(long, value_name = "PHONE")]
        phone: Option<String>,

        /// Classification debounce. Examples: 300ms, 1s
        #[arg(long, value_name = "DURATION", value_parser = parse_duration_ms)]
        debounce: Option<u64>,

        /// Print the final state as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Print a stored session snapshot
    Show {
        /// Call id of the stored session
        #[arg(value_name = "CALL_ID")]
        call_id: String,
    },

    /// List the journey for a segment
    Journey {
        /// Segment name, e.g. LANDLORD, EMERGENCY
        #[arg(value_name = "SEGMENT")]
        segment: String,
    },

    /// Remove stored snapshots older than the retention window
    Cleanup {
        /// Retention window (default: session.db_retention_secs from the
        /// config). Examples: 24h, 7d, 90m
        #[arg(long, value_name = "DURATION", value_parser = parse_duration_ms)]
        retention: Option<u64>,
    },
}

/// Parse a duration string into milliseconds.
///
/// Supports any format accepted by `humantime`: bare numbers (milliseconds),
/// single-unit (`300ms`, `2s`, `24h`), and compound (`1h30m`).
fn parse_duration_ms(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → milliseconds
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(ms);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_millis() as u64)
        .map_err(|e| e.to_string())
}
