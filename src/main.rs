use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use callguide::classify::StreamingClassifierOptions;
use callguide::cli::{Cli, Commands};
use callguide::config::Config;
use callguide::extract::{Speaker, TranscriptEntry};
use callguide::journey::registry::get_segment_journey;
use callguide::journey::Segment;
use callguide::session::{FileSessionStore, MemorySessionStore, SessionManager, SessionStore};
use callguide::simulate::CallSimulator;

#[tokio::main]
async fn main() -> Result<()> {
    callguide::logging::init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let storage_dir = cli.storage.clone().or(config.storage.dir.clone());

    match cli.command {
        Commands::Simulate {
            transcript,
            phone,
            debounce,
            json,
        } => {
            let entries = read_transcript(&transcript)?;
            let debounce_ms = debounce.unwrap_or(config.classifier.debounce_ms);
            let options = StreamingClassifierOptions {
                debounce: std::time::Duration::from_millis(debounce_ms),
                use_tier2: config.classifier.use_tier2,
                ..Default::default()
            };
            let manager = Arc::new(SessionManager::new(make_store(storage_dir)));
            manager.start_cleanup_interval(
                std::time::Duration::from_secs(config.session.cleanup_interval_secs),
                chrono::Duration::seconds(config.session.stale_after_secs as i64),
                chrono::Duration::seconds(config.session.db_retention_secs as i64),
            );
            let simulator = CallSimulator::new(manager, options);

            // Narrate classification progress while the transcript plays.
            let mut events = simulator.subscribe();
            let narrator = tokio::spawn(async move {
                use callguide::simulate::CallNotification;
                while let Ok(event) = events.recv().await {
                    match event {
                        CallNotification::SegmentDetected { classification, .. } => {
                            if let Some(primary) = classification.primary {
                                log::info!(
                                    "detected {} at {}%",
                                    primary.segment,
                                    primary.confidence
                                );
                            }
                        }
                        CallNotification::InfoCaptured { info, .. } => {
                            if let Some(job) = info.job {
                                log::info!("captured job: {job}");
                            }
                        }
                        CallNotification::Ended { .. } => break,
                        CallNotification::Started { .. } => {}
                    }
                }
            });

            let report = simulator
                .run_transcript(&entries, phone.as_deref())
                .await?;
            let _ = narrator.await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report.state)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Show { call_id } => {
            let store = make_store(storage_dir);
            match store.load(&call_id).await? {
                Some(session) => {
                    println!("{}", serde_json::to_string_pretty(&session)?);
                }
                None => {
                    eprintln!("No stored session for call {call_id}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Journey { segment } => {
            let Some(segment) = parse_segment(&segment) else {
                eprintln!("Unknown segment: {segment}");
                std::process::exit(1);
            };
            print_journey(segment);
        }
        Commands::Cleanup { retention } => {
            let store = make_store(storage_dir);
            let retention_ms =
                retention.unwrap_or_else(|| config.session.db_retention_secs.saturating_mul(1000));
            let cutoff = chrono::Utc::now() - chrono::Duration::milliseconds(retention_ms as i64);
            let removed = store.delete_older_than(cutoff).await?;
            println!("Removed {removed} stored sessions");
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => match Config::default_path() {
            Some(path) => Config::load_or_default(&path)?,
            None => Config::default(),
        },
    };
    Ok(config.with_env_overrides())
}

fn make_store(dir: Option<PathBuf>) -> Arc<dyn SessionStore> {
    match dir {
        Some(dir) => Arc::new(FileSessionStore::new(dir)),
        None => Arc::new(MemorySessionStore::new()),
    }
}

/// Read a transcript file: one turn per line, prefixed "caller:" or
/// "agent:". Unprefixed lines are treated as caller speech; blank lines and
/// `#` comments are skipped.
fn read_transcript(path: &std::path::Path) -> Result<Vec<TranscriptEntry>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read transcript {}", path.display()))?;
    let mut entries = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (speaker, text) = if let Some(rest) = strip_prefix_ci(line, "agent:") {
            (Speaker::Agent, rest)
        } else if let Some(rest) = strip_prefix_ci(line, "caller:") {
            (Speaker::Caller, rest)
        } else {
            (Speaker::Caller, line)
        };
        entries.push(TranscriptEntry {
            speaker,
            text: text.trim().to_string(),
        });
    }
    Ok(entries)
}

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    if line.len() >= prefix.len() && line[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

fn parse_segment(name: &str) -> Option<Segment> {
    Segment::ALL
        .iter()
        .copied()
        .find(|s| s.as_str().eq_ignore_ascii_case(name))
}

fn print_report(report: &callguide::simulate::SimulationReport) {
    println!("Call {}", report.call_id);
    match report.state.detected_segment {
        Some(segment) => println!(
            "  Segment:     {} ({}% confident)",
            segment, report.state.segment_confidence
        ),
        None => println!("  Segment:     not detected"),
    }
    println!(
        "  Job:         {}",
        report.state.captured_info.job.as_deref().unwrap_or("-")
    );
    println!(
        "  Postcode:    {}",
        report.state.captured_info.postcode.as_deref().unwrap_or("-")
    );
    println!("  Station:     {}", report.state.current_station);
    match report.state.selected_destination {
        Some(destination) => println!("  Destination: {destination}"),
        None => println!("  Destination: not reached"),
    }
    if !report.state.segment_signals.is_empty() {
        println!("  Signals:     {}", report.state.segment_signals.join(", "));
    }
}

fn print_journey(segment: Segment) {
    let journey = get_segment_journey(segment);
    println!("Journey for {segment}:");
    for station in journey.stations {
        println!("  [{}] {}", station.id, station.prompt);
        for option in station.options {
            println!("    - {} ({})", option.label, option.id);
        }
    }
    println!("Destinations, in preference order:");
    for destination in journey.destinations {
        println!("  {} ({:?})", destination.id, destination.condition);
    }
}
