//! Controller session lifecycle.
//!
//! `Unconfigured → Configured → Running → (Error | Stopped)`.
//!
//! Reconfiguration is only accepted while quiescent (`Unconfigured` or
//! `Stopped`). `Error` is terminal until the session is stopped.

use otg_common::state::ControllerState;

/// Result of a transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded: new state.
    Ok(ControllerState),
    /// Transition rejected: reason.
    Rejected(&'static str),
}

/// Session-level event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Constraint set accepted and buffers allocated.
    Configure,
    /// First cycle is executing.
    FirstCycle,
    /// A cycle failed fatally.
    Fault,
    /// Session torn down.
    Stop,
}

/// Session state holder.
#[derive(Debug, Clone, Default)]
pub struct SessionStateMachine {
    state: ControllerState,
}

impl SessionStateMachine {
    /// New machine in `Unconfigured`.
    pub const fn new() -> Self {
        Self {
            state: ControllerState::Unconfigured,
        }
    }

    #[inline]
    pub const fn state(&self) -> ControllerState {
        self.state
    }

    /// Attempt a transition.
    pub fn handle_event(&mut self, event: SessionEvent) -> TransitionResult {
        use ControllerState::*;
        use SessionEvent::*;

        let next = match (self.state, event) {
            (Unconfigured | Stopped, Configure) => Configured,
            (Configured, FirstCycle) => Running,
            (Configured | Running, Fault) => Error,
            (Configured | Running | Error, Stop) => Stopped,
            _ => return TransitionResult::Rejected(invalid_transition_reason(self.state, event)),
        };

        self.state = next;
        TransitionResult::Ok(next)
    }

    /// Cycles may run.
    #[inline]
    pub const fn allows_cycle(&self) -> bool {
        matches!(
            self.state,
            ControllerState::Configured | ControllerState::Running
        )
    }

    /// A new configuration may be applied.
    #[inline]
    pub const fn is_quiescent(&self) -> bool {
        matches!(
            self.state,
            ControllerState::Unconfigured | ControllerState::Stopped
        )
    }
}

fn invalid_transition_reason(state: ControllerState, event: SessionEvent) -> &'static str {
    use ControllerState::*;
    use SessionEvent::*;
    match (state, event) {
        (_, Configure) => "Configure: only allowed from Unconfigured or Stopped",
        (Unconfigured, _) => "Unconfigured: only Configure allowed",
        (Stopped, _) => "Stopped: only Configure allowed",
        (Error, _) => "Error: only Stop allowed",
        (Running, FirstCycle) => "Running: session already started",
        (Configured | Running, _) => "invalid event for current state",
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
