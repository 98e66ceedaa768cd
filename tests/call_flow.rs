//! End-to-end flow: transcript text in, routed call out.

use callguide::classify::{classify_segment_sync, needs_tier2};
use callguide::extract::{extract_info, CapturedInfoUpdate, TriState};
use callguide::journey::{Destination, Segment};
use callguide::machine::{CallStateMachine, Station, TransitionDenied};

#[test]
fn landlord_call_reaches_instant_quote() {
    let transcript =
        "Hi, my tenant says the boiler is leaking at the rental property, it's SW11 2AB";

    let info = extract_info(transcript);
    assert_eq!(info.job.as_deref(), Some("boiler is leaking"));
    assert_eq!(info.postcode.as_deref(), Some("SW11 2AB"));
    assert_eq!(info.has_tenant, TriState::Yes);

    let classification = classify_segment_sync(transcript);
    let primary = classification.primary.as_ref().unwrap();
    assert_eq!(primary.segment, Segment::Landlord);
    assert!(primary.confidence >= 60);

    let mut machine = CallStateMachine::new("call-1");
    machine.merge_extracted_info(&info);
    machine.update_segment(primary.segment, primary.confidence, &primary.signals);

    assert_eq!(machine.confirm_station(), Ok(Station::Segment));
    assert_eq!(machine.confirm_station(), Ok(Station::Qualify));
    machine.set_qualified(true, &["landlord can authorize".into()]);
    assert_eq!(machine.confirm_station(), Ok(Station::Destination));

    assert_eq!(
        machine.state().recommended_destination,
        Some(Destination::InstantQuote)
    );
}

#[test]
fn emergency_call_routes_to_dispatch() {
    let transcript = "There's water flooding the kitchen, a burst pipe I think, please hurry";

    let classification = classify_segment_sync(transcript);
    let primary = classification.primary.as_ref().unwrap();
    assert_eq!(primary.segment, Segment::Emergency);

    let mut machine = CallStateMachine::new("call-2");
    machine.update_captured_info(&CapturedInfoUpdate {
        job: Some("burst pipe".to_string()),
        ..Default::default()
    });
    machine.update_segment(primary.segment, primary.confidence, &primary.signals);
    machine.fast_track_to_destination().unwrap();

    assert_eq!(
        machine.state().recommended_destination,
        Some(Destination::EmergencyDispatch)
    );
}

#[test]
fn vague_call_stays_put_and_flags_tier2() {
    let transcript = "Hello, I was wondering if you could help with something";

    let classification = classify_segment_sync(transcript);
    assert!(classification.primary.is_none());
    assert!(needs_tier2(&classification));

    let mut machine = CallStateMachine::new("call-3");
    assert_eq!(
        machine.confirm_station(),
        Err(TransitionDenied::JobMissing)
    );
    assert_eq!(machine.current_station(), Station::Listen);
}

#[test]
fn fast_track_skips_qualification() {
    let mut machine = CallStateMachine::new("call-4");
    machine.update_captured_info(&CapturedInfoUpdate {
        job: Some("boiler service".to_string()),
        postcode: Some("SW11 2AB".to_string()),
        ..Default::default()
    });

    assert_eq!(
        machine.fast_track_to_destination(),
        Ok(Station::Destination)
    );
    assert_eq!(machine.qualified(), TriState::Unknown);
    assert_eq!(
        machine.state().completed_stations,
        vec![Station::Listen, Station::Segment, Station::Qualify]
    );
}

#[test]
fn state_survives_a_json_round_trip() {
    let mut machine = CallStateMachine::new("call-5");
    machine.update_captured_info(&CapturedInfoUpdate {
        job: Some("leaking tap".to_string()),
        ..Default::default()
    });
    machine.confirm_station().unwrap();
    machine.confirm_segment(Segment::Oap);

    let json = machine.to_json().unwrap();
    assert!(json.contains("\"callId\":\"call-5\""));
    assert!(json.contains("\"currentStation\":\"SEGMENT\""));
    assert!(json.contains("\"detectedSegment\":\"OAP\""));

    let restored = CallStateMachine::from_json(&json).unwrap();
    assert_eq!(restored.state(), machine.state());
}

#[test]
fn agent_confirmation_outranks_the_classifier() {
    let mut machine = CallStateMachine::new("call-6");
    machine.update_segment(Segment::Budget, 95, &["cheapest".to_string()]);
    machine.confirm_segment(Segment::Landlord);

    // A later high-confidence pattern match cannot displace a confirmation.
    machine.update_segment(Segment::Budget, 95, &[]);
    assert_eq!(machine.state().detected_segment, Some(Segment::Landlord));
    assert_eq!(machine.state().segment_confidence, 100);
}
