//! The call state machine.
//!
//! Enforces the LISTEN → SEGMENT → QUALIFY → DESTINATION station order,
//! holds all call-scoped facts, and fires typed lifecycle events. Illegal
//! transitions come back as structured denials, never panics.

pub mod events;
pub mod machine;
pub mod state;

pub use events::{CallEvent, EventHandlers, EventKind, HandlerId};
pub use machine::{CallStateMachine, TransitionDenied};
pub use state::{CallState, Station};
