//! Target injector: target command → input buffer.
//!
//! Resolves each addressed joint through the configured constraint set and
//! writes its target position and/or velocity. A command may carry per-joint
//! constraint overrides; they are completed from the configured constraint
//! and stay in effect until the next command. Joints the command does not
//! address keep their previous target.
//!
//! Position limits are enforced here according to the session policy:
//! `ActivelyPrevent` clamps the target into the bounds, `ErrorMsgOnly`
//! reports the first violating joint without clamping.

use otg_common::constraint::MotionConstraintSet;
use otg_common::policy::{OtgFlags, PositionLimitsPolicy};
use otg_common::samples::ConstrainedJointsCommand;
use tracing::warn;

use crate::buffer::{InputParameters, ModeInput};
use crate::constraints::{apply_override, restore_configured};
use crate::error::{CycleError, TargetFault};

/// Result of one injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InjectReport {
    /// First joint whose target lies outside the position limits
    /// (report-only policy).
    pub limit_violation: Option<usize>,
}

/// Write `command` into `input`.
pub fn inject_target(
    joints: &MotionConstraintSet,
    command: &ConstrainedJointsCommand,
    flags: &OtgFlags,
    input: &mut InputParameters,
) -> Result<InjectReport, CycleError> {
    command.validate()?;
    let position_limits = flags.position_limits.requires_limits();
    let mut report = InjectReport::default();

    for (k, (name, element)) in command.names.iter().zip(&command.elements).enumerate() {
        let idx = match command.motion_constraints.get(k) {
            Some(overrides) => apply_override(joints, name, overrides, input, position_limits)?,
            None => {
                let idx = joints.name_to_index(name)?;
                restore_configured(joints, idx, input, position_limits);
                idx
            }
        };

        let (min, max) = (input.min_position[idx], input.max_position[idx]);
        match &mut input.mode {
            ModeInput::Position {
                target_position, ..
            } => {
                let position = finite(name, element.position())?.ok_or_else(|| {
                    CycleError::InvalidTarget {
                        joint: name.clone(),
                        reason: TargetFault::MissingPosition,
                    }
                })?;
                target_position[idx] = match flags.position_limits {
                    PositionLimitsPolicy::ActivelyPrevent => position.max(min).min(max),
                    PositionLimitsPolicy::ErrorMsgOnly => {
                        if (position < min || position > max) && report.limit_violation.is_none() {
                            warn!(joint = %name, position, min, max, "target outside position limits");
                            report.limit_violation = Some(idx);
                        }
                        position
                    }
                    PositionLimitsPolicy::Ignore => position,
                };
                input.target_velocity[idx] = finite(name, element.speed())?.unwrap_or(0.0);
            }
            ModeInput::Velocity => {
                let speed = finite(name, element.speed())?.ok_or_else(|| CycleError::InvalidTarget {
                    joint: name.clone(),
                    reason: TargetFault::MissingSpeed,
                })?;
                input.target_velocity[idx] = speed;
            }
        }
    }
    Ok(report)
}

/// Reject an infinite target value; NaN stays "field absent".
fn finite(joint: &str, value: Option<f64>) -> Result<Option<f64>, CycleError> {
    match value {
        Some(v) if v.is_infinite() => Err(CycleError::InvalidTarget {
            joint: joint.to_owned(),
            reason: TargetFault::NonFinite(v),
        }),
        other => Ok(other),
    }
}

/// Hold the current state: position mode targets the current position at
/// rest, velocity mode targets zero velocity.
pub fn hold_current(input: &mut InputParameters) {
    let InputParameters {
        current_position,
        target_velocity,
        mode,
        ..
    } = input;
    if let ModeInput::Position {
        target_position, ..
    } = mode
    {
        target_position.clone_from(current_position);
    }
    target_velocity.iter_mut().for_each(|v| *v = 0.0);
}

/// Velocity-mode synchronization correction, applied to this cycle's target
/// velocity input only. The current state is never touched.
///
/// A velocity gap below what one cycle of full jerk can close
/// (`max_jerk · dt² / 2`) is not chased: while the acceleration is within one
/// cycle of jerk, the target velocity input is compensated onto the current
/// velocity, so the engine settles the acceleration instead of planning a
/// sub-cycle profile. If any remaining gap is below one cycle of full
/// acceleration (`max_acceleration · dt`), the minimum synchronization time is
/// raised to one cycle. Returns whether it was raised.
pub fn correct_velocity_synchronization(input: &mut InputParameters, cycle_time: f64) -> bool {
    if !matches!(input.mode, ModeInput::Velocity) {
        return false;
    }
    let mut raise = false;
    for i in (0..input.dof()).filter(|i| input.selection[*i]) {
        let current = input.current_velocity[i];
        let gap = (input.target_velocity[i] - current).abs();
        if gap == 0.0 {
            continue;
        }
        let jerk_step = input.max_jerk[i] * cycle_time;
        if gap < jerk_step * cycle_time / 2.0 && input.current_acceleration[i].abs() <= jerk_step {
            input.target_velocity[i] = current;
        } else if gap < input.max_acceleration[i] * cycle_time {
            raise = true;
        }
    }
    if raise {
        input.min_synchronization_time = input.min_synchronization_time.max(cycle_time);
    }
    raise
}

// ─── Tests ──────────────────────────────────────────────────────────
