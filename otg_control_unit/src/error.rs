//! Controller error types.
//!
//! Two families: [`ConfigurationError`] is raised while a session is set up
//! (no cycle ever runs), [`CycleError`] is raised by a single cycle. A cycle
//! error moves the session to `Error`, except for the precondition checks
//! (`NotRunning`, `InvalidCycleTime`) that reject the call without touching
//! the session.

use otg_common::config::ConfigError;
use otg_common::constraint::{ConstraintSetError, InvalidConstraint, NameNotFound};
use otg_common::samples::CommandError;
use otg_common::state::ControllerState;
use thiserror::Error;

use crate::classify::FatalKind;
use crate::constraints::ApplyError;

/// Session configuration failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// The constraint set is empty, too large or holds an invalid constraint.
    #[error("invalid constraint set: {0}")]
    ConstraintSet(#[from] ConstraintSetError),

    /// A constraint could not be resolved against the configured joints.
    #[error(transparent)]
    NameNotFound(#[from] NameNotFound),

    /// The limit policy needs position bounds the joint does not have.
    #[error("joint '{joint}': position limits required by the limit policy")]
    MissingPositionLimits { joint: String },

    /// Reconfiguration is only allowed from `Unconfigured` or `Stopped`.
    #[error("cannot configure while {state:?}")]
    NotQuiescent { state: ControllerState },

    /// Task file could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Why a target command was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TargetFault {
    #[error("position mode requires a target position")]
    MissingPosition,

    #[error("velocity mode requires a target speed")]
    MissingSpeed,

    #[error("target value {0} is not finite")]
    NonFinite(f64),

    #[error("motion constraint override: {0}")]
    Constraint(#[from] InvalidConstraint),
}

/// A single cycle failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CycleError {
    /// `tick` called outside `Configured`/`Running`.
    #[error("cycle rejected: controller is {state:?}")]
    NotRunning { state: ControllerState },

    /// Cycle time must be finite and > 0.
    #[error("invalid cycle time {0}")]
    InvalidCycleTime(f64),

    /// Sensor sample or target command is not a valid joint record.
    #[error(transparent)]
    Malformed(#[from] CommandError),

    /// A configured joint is missing from the sensor sample, or a target
    /// addresses an unconfigured joint.
    #[error(transparent)]
    NameNotFound(#[from] NameNotFound),

    /// The seeding sample has no usable position for a joint.
    #[error("joint '{joint}': sensor sample has no valid position")]
    InvalidState { joint: String },

    /// The target command cannot be applied.
    #[error("joint '{joint}': invalid target: {reason}")]
    InvalidTarget {
        joint: String,
        #[source]
        reason: TargetFault,
    },

    /// The engine reported a fatal result.
    #[error("engine failure {code}: {fault}")]
    Engine { fault: FatalKind, code: i32 },
}

impl From<ApplyError> for ConfigurationError {
    fn from(e: ApplyError) -> Self {
        match e {
            ApplyError::NameNotFound(e) => Self::NameNotFound(e),
            ApplyError::Invalid { joint, source } => {
                Self::ConstraintSet(ConstraintSetError::InvalidConstraint { joint, source })
            }
        }
    }
}

impl From<ApplyError> for CycleError {
    fn from(e: ApplyError) -> Self {
        match e {
            ApplyError::NameNotFound(e) => Self::NameNotFound(e),
            ApplyError::Invalid { joint, source } => Self::InvalidTarget {
                joint,
                reason: TargetFault::Constraint(source),
            },
        }
    }
}

impl CycleError {
    /// Precondition failures leave the session untouched.
    #[inline]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::NotRunning { .. } | Self::InvalidCycleTime(_))
    }
}
