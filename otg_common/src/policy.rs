//! Per-session generation policies.
//!
//! Selected once when a session is configured and immutable while it runs.

use serde::{Deserialize, Serialize};

/// Which quantity the engine drives toward the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Target position (and optional target velocity).
    #[default]
    Position,
    /// Target velocity only.
    Velocity,
}

/// Behavior at the configured position limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionLimitsPolicy {
    /// Position limits are not checked.
    #[default]
    Ignore,
    /// Out-of-bounds targets are reported, not clamped.
    ErrorMsgOnly,
    /// Targets are clamped into the limits before the engine call.
    ActivelyPrevent,
}

impl PositionLimitsPolicy {
    /// Whether the session needs position bounds on every joint.
    #[inline]
    pub const fn requires_limits(self) -> bool {
        !matches!(self, Self::Ignore)
    }
}

/// Multi-DOF synchronization requested from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncBehavior {
    #[default]
    PhaseSynchronizationIfPossible,
    OnlyTimeSynchronization,
    OnlyPhaseSynchronization,
    NoSynchronization,
}

/// Flags passed to every engine call of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OtgFlags {
    #[serde(default)]
    pub position_limits: PositionLimitsPolicy,
    #[serde(default)]
    pub synchronization: SyncBehavior,
}
