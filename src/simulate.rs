//! Scripted call simulation.
//!
//! Runs a transcript through the same streaming extractor and debounced
//! classifier a live call uses, drives the session's state machine forward
//! as far as the captured facts allow, and broadcasts lifecycle
//! notifications along the way. The CLI's `simulate` subcommand is the main
//! consumer; integration tests use it to exercise the whole stack.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::classify::{Classification, ClassificationUpdateFn, StreamingClassifier, StreamingClassifierOptions};
use crate::error::Result;
use crate::extract::{CapturedInfo, Speaker, StreamingInfoExtractor, TranscriptEntry};
use crate::journey::Destination;
use crate::machine::CallState;
use crate::session::SessionManager;

/// Events broadcast while a simulated call runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallNotification {
    Started {
        call_id: String,
    },
    InfoCaptured {
        call_id: String,
        info: CapturedInfo,
    },
    SegmentDetected {
        call_id: String,
        classification: Classification,
    },
    Ended {
        call_id: String,
        destination: Option<Destination>,
    },
}

/// What a finished simulation produced.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub call_id: String,
    pub state: CallState,
    pub classification: Classification,
    pub transcript: String,
}

pub struct CallSimulator {
    manager: Arc<SessionManager>,
    options: StreamingClassifierOptions,
    notify: broadcast::Sender<CallNotification>,
}

impl CallSimulator {
    pub fn new(manager: Arc<SessionManager>, options: StreamingClassifierOptions) -> Self {
        let (notify, _) = broadcast::channel(64);
        Self {
            manager,
            options,
            notify,
        }
    }

    /// Subscribe to lifecycle notifications. Receivers that lag simply miss
    /// events; the simulation never blocks on them.
    pub fn subscribe(&self) -> broadcast::Receiver<CallNotification> {
        self.notify.subscribe()
    }

    /// Run a whole transcript as one call and tear the session down at the
    /// end. Only caller turns are fed to the extractor and classifier.
    pub async fn run_transcript(
        &self,
        entries: &[TranscriptEntry],
        phone: Option<&str>,
    ) -> Result<SimulationReport> {
        let call_id = Uuid::new_v4().to_string();
        let machine = self.manager.create_session(&call_id, phone).await;
        let _ = self.notify.send(CallNotification::Started {
            call_id: call_id.clone(),
        });

        let mut extractor = {
            let notify = self.notify.clone();
            let call_id = call_id.clone();
            StreamingInfoExtractor::with_callback(Box::new(move |info| {
                let _ = notify.send(CallNotification::InfoCaptured {
                    call_id: call_id.clone(),
                    info: info.clone(),
                });
            }))
        };
        let mut classifier = {
            let notify = self.notify.clone();
            let call_id = call_id.clone();
            let on_update: ClassificationUpdateFn = Arc::new(move |classification| {
                let _ = notify.send(CallNotification::SegmentDetected {
                    call_id: call_id.clone(),
                    classification: classification.clone(),
                });
            });
            StreamingClassifier::with_callback(self.options.clone(), on_update)
        };

        for entry in entries {
            if entry.speaker != Speaker::Caller {
                continue;
            }
            extractor.add_chunk(&entry.text);
            classifier.add_chunk(&entry.text);
        }

        // Let the trailing debounce window elapse so the final (possibly
        // tier-2) classification lands before we read it.
        tokio::time::sleep(self.options.debounce + std::time::Duration::from_millis(50)).await;
        let classification = classifier
            .current_classification()
            .unwrap_or_else(|| classifier.classify_now());
        let transcript = classifier.transcript();

        {
            let mut machine = machine.lock().await;
            machine.merge_extracted_info(extractor.current_info());
            if let Some(primary) = &classification.primary {
                machine.update_segment(primary.segment, primary.confidence, &primary.signals);
            }

            // Walk forward as far as the facts allow; a denied step just
            // means the agent has more to gather.
            while !machine.is_at_final_station() {
                if machine.current_station() == crate::machine::Station::Qualify
                    && !machine.qualified().is_known()
                    && machine.state().captured_info.is_decision_maker.is_known()
                {
                    let decision =
                        machine.state().captured_info.is_decision_maker == crate::extract::TriState::Yes;
                    machine.set_qualified(decision, &["taken from transcript".into()]);
                }
                if machine.confirm_station().is_err() {
                    break;
                }
            }
            if machine.is_at_final_station() {
                if let Some(recommended) = machine.state().recommended_destination {
                    machine.select_destination(recommended);
                }
            }
        }

        self.manager.end_session(&call_id).await?;
        let state = machine.lock().await.state().clone();
        let _ = self.notify.send(CallNotification::Ended {
            call_id: call_id.clone(),
            destination: state.selected_destination,
        });

        Ok(SimulationReport {
            call_id,
            state,
            classification,
            transcript,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::TriState;
    use crate::journey::Segment;
    use crate::machine::Station;
    use crate::session::{MemorySessionStore, SessionStore};

    fn caller(text: &str) -> TranscriptEntry {
        TranscriptEntry {
            speaker: Speaker::Caller,
            text: text.to_string(),
        }
    }

    fn agent(text: &str) -> TranscriptEntry {
        TranscriptEntry {
            speaker: Speaker::Agent,
            text: text.to_string(),
        }
    }

    fn simulator() -> CallSimulator {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let manager = Arc::new(SessionManager::new(store));
        let options = StreamingClassifierOptions {
            debounce: std::time::Duration::from_millis(1),
            ..Default::default()
        };
        CallSimulator::new(manager, options)
    }

    #[tokio::test]
    async fn test_landlord_transcript_routes_to_instant_quote() {
        let simulator = simulator();
        let report = simulator
            .run_transcript(
                &[
                    caller("Hi, my tenant says the boiler is leaking"),
                    agent("Sorry to hear that, where is the property?"),
                    caller("It's a rental property at SW112AB, I'm the landlord and it's up to me"),
                ],
                Some("+447700900001"),
            )
            .await
            .unwrap();

        assert_eq!(report.state.detected_segment, Some(Segment::Landlord));
        assert_eq!(report.state.captured_info.job.as_deref(), Some("boiler is leaking"));
        assert_eq!(report.state.captured_info.postcode.as_deref(), Some("SW11 2AB"));
        assert_eq!(report.state.captured_info.is_decision_maker, TriState::Yes);
        assert_eq!(report.state.current_station, Station::Destination);
        assert_eq!(
            report.state.selected_destination,
            Some(Destination::InstantQuote)
        );
    }

    #[tokio::test]
    async fn test_simulation_ends_the_session() {
        let simulator = simulator();
        let report = simulator
            .run_transcript(&[caller("my tap is dripping")], None)
            .await
            .unwrap();
        assert!(!simulator.manager.has_session(&report.call_id));
    }

    #[tokio::test]
    async fn test_incomplete_transcript_stalls_before_the_end() {
        let simulator = simulator();
        // No job captured, so the call cannot leave the opening station.
        let report = simulator
            .run_transcript(&[caller("hello, are you open today")], None)
            .await
            .unwrap();
        assert_eq!(report.state.current_station, Station::Listen);
        assert_eq!(report.state.selected_destination, None);
    }

    #[tokio::test]
    async fn test_notifications_are_broadcast() {
        let simulator = simulator();
        let mut rx = simulator.subscribe();
        let report = simulator
            .run_transcript(&[caller("my tenant has a leaking tap at SW11 2AB and it's up to me")], None)
            .await
            .unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(match event {
                CallNotification::Started { call_id } => {
                    assert_eq!(call_id, report.call_id);
                    "started"
                }
                CallNotification::InfoCaptured { .. } => "info",
                CallNotification::SegmentDetected { .. } => "segment",
                CallNotification::Ended { destination, .. } => {
                    assert_eq!(destination, report.state.selected_destination);
                    "ended"
                }
            });
        }
        assert_eq!(kinds.first(), Some(&"started"));
        assert_eq!(kinds.last(), Some(&"ended"));
        assert!(kinds.contains(&"info"));
        assert!(kinds.contains(&"segment"));
    }

    #[tokio::test]
    async fn test_agent_speech_is_ignored() {
        let simulator = simulator();
        let report = simulator
            .run_transcript(
                &[agent("Is this about a burst pipe flooding your kitchen?"), caller("no, just a quote for a new socket")],
                None,
            )
            .await
            .unwrap();
        assert_ne!(report.state.detected_segment, Some(Segment::Emergency));
        assert!(!report.transcript.contains("burst pipe"));
    }
}
