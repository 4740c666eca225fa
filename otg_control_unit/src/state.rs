//! Session lifecycle state machine.

pub mod machine;

pub use machine::{SessionEvent, SessionStateMachine, TransitionResult};
