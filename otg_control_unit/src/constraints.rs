//! Constraint applicator: motion constraints → input buffer limits.
//!
//! Writes velocity, acceleration and jerk limits (and position bounds when
//! the limit policy needs them) at the index each joint name resolves to in
//! the buffer's joint layout. Current and target state fields are never
//! touched.

use otg_common::constraint::{InvalidConstraint, MotionConstraint, MotionConstraintSet, NameNotFound};
use thiserror::Error;

use crate::buffer::InputParameters;

/// Failure while applying constraints.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplyError {
    #[error(transparent)]
    NameNotFound(#[from] NameNotFound),

    #[error("joint '{joint}': {source}")]
    Invalid {
        joint: String,
        #[source]
        source: InvalidConstraint,
    },
}

/// Write one validated constraint at `idx`.
#[inline]
pub fn write_constraint(
    input: &mut InputParameters,
    idx: usize,
    constraint: &MotionConstraint,
    position_limits: bool,
) {
    if let Some(max_velocity) = input.max_velocity_mut() {
        max_velocity[idx] = constraint.max_velocity().unwrap_or(f64::NAN);
    }
    input.max_acceleration[idx] = constraint.max_acceleration().unwrap_or(f64::NAN);
    input.max_jerk[idx] = constraint.max_jerk().unwrap_or(f64::NAN);
    if position_limits {
        input.min_position[idx] = constraint.min_position().unwrap_or(f64::NAN);
        input.max_position[idx] = constraint.max_position().unwrap_or(f64::NAN);
    }
}

fn checked(
    name: &str,
    constraint: MotionConstraint,
    position_limits: bool,
) -> Result<MotionConstraint, ApplyError> {
    let result = if position_limits {
        constraint.validate_with_position_limits()
    } else {
        constraint.validate()
    };
    result.map_err(|source| ApplyError::Invalid {
        joint: name.to_string(),
        source,
    })?;
    Ok(constraint)
}

/// Apply every constraint of the configured set to a buffer whose DOFs are
/// laid out as `layout`. A constraint name missing from the layout fails
/// before anything is written for it.
pub fn apply_constraint_set(
    joints: &MotionConstraintSet,
    layout: &[String],
    input: &mut InputParameters,
    position_limits: bool,
) -> Result<(), ApplyError> {
    for (name, constraint) in joints.iter() {
        let idx = layout
            .iter()
            .position(|n| n == name)
            .filter(|idx| *idx < input.dof())
            .ok_or_else(|| NameNotFound(name.to_string()))?;
        let constraint = checked(name, *constraint, position_limits)?;
        write_constraint(input, idx, &constraint, position_limits);
    }
    Ok(())
}

/// Apply one constraint addressed by name. Unset fields fall back to the
/// joint's configured constraint.
pub fn apply_override(
    joints: &MotionConstraintSet,
    name: &str,
    constraint: &MotionConstraint,
    input: &mut InputParameters,
    position_limits: bool,
) -> Result<usize, ApplyError> {
    let idx = joints.name_to_index(name)?;
    let mut merged = *constraint;
    if let Some(configured) = joints.get(idx) {
        merged.apply_defaults(configured);
    }
    let merged = checked(name, merged, position_limits)?;
    write_constraint(input, idx, &merged, position_limits);
    Ok(idx)
}

/// Restore the configured limits of one joint.
pub fn restore_configured(
    joints: &MotionConstraintSet,
    idx: usize,
    input: &mut InputParameters,
    position_limits: bool,
) {
    if let Some(configured) = joints.get(idx) {
        write_constraint(input, idx, configured, position_limits);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
