//! Typed lifecycle events for the call state machine.
//!
//! The event set is a closed enum rather than string names, so every kind
//! is enumerable at compile time. A handler that panics is caught and
//! logged; it never prevents sibling handlers from running or the state
//! mutation from completing.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::journey::{Destination, Segment};
use crate::machine::state::Station;

/// A lifecycle event fired by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    StationChanged { from: Station, to: Station },
    SegmentDetected { segment: Segment, confidence: u8 },
    SegmentConfirmed { segment: Segment },
    QualifiedSet { qualified: bool },
    DestinationSelected { destination: Destination },
}

/// The kind of a `CallEvent`, used for subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    StationChanged,
    SegmentDetected,
    SegmentConfirmed,
    QualifiedSet,
    DestinationSelected,
}

impl CallEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            CallEvent::StationChanged { .. } => EventKind::StationChanged,
            CallEvent::SegmentDetected { .. } => EventKind::SegmentDetected,
            CallEvent::SegmentConfirmed { .. } => EventKind::SegmentConfirmed,
            CallEvent::QualifiedSet { .. } => EventKind::QualifiedSet,
            CallEvent::DestinationSelected { .. } => EventKind::DestinationSelected,
        }
    }
}

/// Opaque handle returned by `on`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

type Handler = Box<dyn Fn(&CallEvent) + Send>;

/// Registry of event subscribers. Multiple handlers per kind are supported.
#[derive(Default)]
pub struct EventHandlers {
    next_id: u64,
    slots: Vec<(EventKind, HandlerId, Handler)>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler to one event kind.
    pub fn on(&mut self, kind: EventKind, handler: Handler) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.slots.push((kind, id, handler));
        id
    }

    /// Unsubscribe a previously registered handler.
    ///
    /// Returns false when the id was not registered.
    pub fn off(&mut self, id: HandlerId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|(_, handler_id, _)| *handler_id != id);
        self.slots.len() != before
    }

    /// Deliver an event to every handler subscribed to its kind.
    ///
    /// Each handler runs inside its own catch so one panicking subscriber
    /// cannot starve the rest.
    pub fn emit(&self, event: &CallEvent) {
        let kind = event.kind();
        for (slot_kind, id, handler) in &self.slots {
            if *slot_kind != kind {
                continue;
            }
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                log::error!("event handler {:?} panicked on {:?}", id, kind);
            }
        }
    }

    /// Number of registered handlers, across all kinds.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn station_event() -> CallEvent {
        CallEvent::StationChanged {
            from: Station::Listen,
            to: Station::Segment,
        }
    }

    #[test]
    fn test_handler_receives_matching_event() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);

        let mut handlers = EventHandlers::new();
        handlers.on(
            EventKind::StationChanged,
            Box::new(move |_| {
                hits_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        handlers.emit(&station_event());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_ignores_other_kinds() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);

        let mut handlers = EventHandlers::new();
        handlers.on(
            EventKind::QualifiedSet,
            Box::new(move |_| {
                hits_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        handlers.emit(&station_event());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_multiple_handlers_per_kind() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut handlers = EventHandlers::new();
        for _ in 0..3 {
            let hits_clone = Arc::clone(&hits);
            handlers.on(
                EventKind::StationChanged,
                Box::new(move |_| {
                    hits_clone.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }

        handlers.emit(&station_event());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_off_unsubscribes_only_that_handler() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut handlers = EventHandlers::new();

        let hits_a = Arc::clone(&hits);
        let id_a = handlers.on(
            EventKind::StationChanged,
            Box::new(move |_| {
                hits_a.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let hits_b = Arc::clone(&hits);
        handlers.on(
            EventKind::StationChanged,
            Box::new(move |_| {
                hits_b.fetch_add(10, Ordering::SeqCst);
            }),
        );

        assert!(handlers.off(id_a));
        handlers.emit(&station_event());
        assert_eq!(hits.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_off_unknown_id_returns_false() {
        let mut handlers = EventHandlers::new();
        let id = handlers.on(EventKind::StationChanged, Box::new(|_| {}));
        assert!(handlers.off(id));
        assert!(!handlers.off(id));
    }

    #[test]
    fn test_panicking_handler_does_not_stop_siblings() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut handlers = EventHandlers::new();

        handlers.on(
            EventKind::StationChanged,
            Box::new(|_| panic!("subscriber bug")),
        );
        let hits_clone = Arc::clone(&hits);
        handlers.on(
            EventKind::StationChanged,
            Box::new(move |_| {
                hits_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        handlers.emit(&station_event());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_kind_mapping() {
        assert_eq!(station_event().kind(), EventKind::StationChanged);
        assert_eq!(
            CallEvent::QualifiedSet { qualified: true }.kind(),
            EventKind::QualifiedSet
        );
        assert_eq!(
            CallEvent::DestinationSelected {
                destination: Destination::Exit
            }
            .kind(),
            EventKind::DestinationSelected
        );
    }
}
