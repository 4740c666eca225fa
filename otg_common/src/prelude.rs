//! Prelude module for common re-exports.
//!
//! ```rust
//! use otg_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel};
pub use crate::task_config::{SimulationConfig, TaskConfig};

// ─── Constraints ────────────────────────────────────────────────────
pub use crate::constraint::{
    ConstraintField, ConstraintSetError, InvalidConstraint, MotionConstraint,
    MotionConstraintSet, NameNotFound, NamedConstraint,
};

// ─── Joint Records ──────────────────────────────────────────────────
pub use crate::cartesian::CartesianState;
pub use crate::samples::{
    CommandError, ConstrainedJointsCommand, JointState, JointsCommand, JointsSample,
};

// ─── Engine Contract ────────────────────────────────────────────────
pub use crate::policy::{GenerationMode, OtgFlags, PositionLimitsPolicy, SyncBehavior};
pub use crate::result::ResultCode;

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{CARTESIAN_DOF_NAMES, DEFAULT_CYCLE_TIME, MAX_DOF};

// ─── Lifecycle ──────────────────────────────────────────────────────
pub use crate::state::ControllerState;
