//! TOML task configuration.
//!
//! ```toml
//! mode = "position"
//! cycle_time = 0.01
//! position_limits = "actively_prevent"
//!
//! [default_constraint]
//! max_jerk = 5.0
//!
//! [[joints]]
//! name = "shoulder"
//! min_position = -1.5
//! max_position = 1.5
//! max_velocity = 1.0
//! max_acceleration = 2.0
//!
//! [simulation]
//! initial_position = [0.0]
//! target_position = [1.0]
//! ```
//!
//! Optional fields use `#[serde(default)]`; unknown fields are rejected.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, LogLevel};
use crate::constraint::{ConstraintSetError, MotionConstraint, MotionConstraintSet, NamedConstraint};
use crate::consts::{CYCLE_TIME_MAX, CYCLE_TIME_MIN, DEFAULT_CYCLE_TIME};
use crate::policy::{GenerationMode, OtgFlags, PositionLimitsPolicy, SyncBehavior};

/// Complete task configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Position- or velocity-based generation.
    #[serde(default)]
    pub mode: GenerationMode,

    /// Control cycle time [s] (default: 0.01).
    #[serde(default = "default_cycle_time")]
    pub cycle_time: f64,

    #[serde(default)]
    pub position_limits: PositionLimitsPolicy,

    #[serde(default)]
    pub synchronization: SyncBehavior,

    /// Velocity-mode synchronization correction (default: on).
    #[serde(default = "default_true")]
    pub velocity_sync_correction: bool,

    /// Merged into every joint constraint for unset fields.
    #[serde(default)]
    pub default_constraint: MotionConstraint,

    pub joints: Vec<NamedConstraint>,

    /// Only read by the simulation runner.
    #[serde(default)]
    pub simulation: Option<SimulationConfig>,
}

fn default_cycle_time() -> f64 {
    DEFAULT_CYCLE_TIME
}
fn default_true() -> bool {
    true
}

/// Closed-loop simulation scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Per-joint start position.
    pub initial_position: Vec<f64>,

    /// Per-joint target position (position mode).
    #[serde(default)]
    pub target_position: Vec<f64>,

    /// Per-joint target velocity (velocity mode, optional in position mode).
    #[serde(default)]
    pub target_velocity: Vec<f64>,

    /// Abort after this many cycles (default: 10000).
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u64,

    /// Debug snapshot every N cycles, 0 = never (default: 100).
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u64,
}

fn default_max_cycles() -> u64 {
    10_000
}
fn default_snapshot_interval() -> u64 {
    100
}

impl TaskConfig {
    /// Build the validated constraint set (defaults merged, names unique,
    /// position bounds required when the limit policy needs them).
    pub fn constraint_set(&self) -> Result<MotionConstraintSet, ConstraintSetError> {
        let set = MotionConstraintSet::from_named(&self.joints, &self.default_constraint)?;
        if self.position_limits.requires_limits() {
            set.validate_with_position_limits()?;
        }
        Ok(set)
    }

    /// Engine flags for this task.
    pub fn flags(&self) -> OtgFlags {
        OtgFlags {
            position_limits: self.position_limits,
            synchronization: self.synchronization,
        }
    }

    /// Validate parameter bounds, the constraint set and the simulation
    /// section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(CYCLE_TIME_MIN..=CYCLE_TIME_MAX).contains(&self.cycle_time) {
            return Err(ConfigError::ValidationError(format!(
                "cycle_time {} out of range [{}, {}]",
                self.cycle_time, CYCLE_TIME_MIN, CYCLE_TIME_MAX
            )));
        }

        self.constraint_set()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if let Some(sim) = &self.simulation {
            let dof = self.joints.len();
            let check = |field: &str, len: usize, required: bool| {
                if (required || len > 0) && len != dof {
                    Err(ConfigError::ValidationError(format!(
                        "simulation.{field} has {len} entries, expected {dof}"
                    )))
                } else {
                    Ok(())
                }
            };
            check("initial_position", sim.initial_position.len(), true)?;
            check(
                "target_position",
                sim.target_position.len(),
                self.mode == GenerationMode::Position,
            )?;
            check(
                "target_velocity",
                sim.target_velocity.len(),
                self.mode == GenerationMode::Velocity,
            )?;
        }
        Ok(())
    }
}
