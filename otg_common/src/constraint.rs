//! Per-joint kinematic limits and the named set they are configured in.
//!
//! A [`MotionConstraint`] holds optional bounds for one axis. Unset fields
//! (`None` or NaN) can be completed from a default constraint with
//! [`MotionConstraint::apply_defaults`] before [`MotionConstraint::validate`]
//! is run.
//!
//! A [`MotionConstraintSet`] is the ordered `(name, constraint)` list a
//! session is configured with. Indices follow insertion order and the
//! name→index map is built as names are pushed, so lookups are O(1).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::MAX_DOF;

// ─── Fields & Errors ────────────────────────────────────────────────

/// Individual field of a [`MotionConstraint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintField {
    MinPosition,
    MaxPosition,
    MaxVelocity,
    MaxAcceleration,
    MaxJerk,
}

impl fmt::Display for ConstraintField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MinPosition => "min. position",
            Self::MaxPosition => "max. position",
            Self::MaxVelocity => "max. velocity",
            Self::MaxAcceleration => "max. acceleration",
            Self::MaxJerk => "max. jerk",
        };
        f.write_str(name)
    }
}

/// First invariant violated by a [`MotionConstraint`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidConstraint {
    /// A required field is unset.
    #[error("motion constraint: {0} is not set")]
    MissingField(ConstraintField),

    /// Position bounds are present but not ordered.
    #[error("motion constraint: max. position ({max}) has to be > min. position ({min})")]
    PositionOrder { min: f64, max: f64 },

    /// A rate limit is zero or negative.
    #[error("motion constraint: {field} has to be > 0, got {value}")]
    NonPositive { field: ConstraintField, value: f64 },
}

/// A joint name was looked up but is not part of the set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("joint '{0}' is not configured")]
pub struct NameNotFound(pub String);

/// Errors while building a [`MotionConstraintSet`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstraintSetError {
    #[error("motion constraint set is empty")]
    Empty,

    #[error("{dof} joints exceed the supported maximum of {max}")]
    TooManyDof { dof: usize, max: usize },

    #[error("duplicate joint name '{0}'")]
    DuplicateName(String),

    #[error("joint '{joint}': {source}")]
    InvalidConstraint {
        joint: String,
        #[source]
        source: InvalidConstraint,
    },
}

// ─── MotionConstraint ───────────────────────────────────────────────

/// Kinematic limits of a single joint.
///
/// All fields are optional. Velocity, acceleration and jerk limits are
/// required for a constraint to validate; position bounds are only required
/// when a session enforces position limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_velocity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_acceleration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_jerk: Option<f64>,
}

/// `Some` only for a value that is present and not NaN.
#[inline]
fn set_value(v: Option<f64>) -> Option<f64> {
    v.filter(|x| !x.is_nan())
}

impl MotionConstraint {
    /// Constraint with rate limits only (no position bounds).
    pub const fn new(max_velocity: f64, max_acceleration: f64, max_jerk: f64) -> Self {
        Self {
            min_position: None,
            max_position: None,
            max_velocity: Some(max_velocity),
            max_acceleration: Some(max_acceleration),
            max_jerk: Some(max_jerk),
        }
    }

    /// Builder-style position bounds.
    pub const fn with_position_limits(mut self, min: f64, max: f64) -> Self {
        self.min_position = Some(min);
        self.max_position = Some(max);
        self
    }

    #[inline]
    pub fn min_position(&self) -> Option<f64> {
        set_value(self.min_position)
    }

    #[inline]
    pub fn max_position(&self) -> Option<f64> {
        set_value(self.max_position)
    }

    #[inline]
    pub fn max_velocity(&self) -> Option<f64> {
        set_value(self.max_velocity)
    }

    #[inline]
    pub fn max_acceleration(&self) -> Option<f64> {
        set_value(self.max_acceleration)
    }

    #[inline]
    pub fn max_jerk(&self) -> Option<f64> {
        set_value(self.max_jerk)
    }

    /// Both position bounds are set.
    #[inline]
    pub fn has_position_limits(&self) -> bool {
        self.min_position().is_some() && self.max_position().is_some()
    }

    /// Check all invariants and report the first violation.
    ///
    /// Order: missing velocity/acceleration/jerk, position ordering (only if
    /// both bounds are set), then non-positive rate limits.
    pub fn validate(&self) -> Result<(), InvalidConstraint> {
        let velocity = self
            .max_velocity()
            .ok_or(InvalidConstraint::MissingField(ConstraintField::MaxVelocity))?;
        let acceleration = self
            .max_acceleration()
            .ok_or(InvalidConstraint::MissingField(ConstraintField::MaxAcceleration))?;
        let jerk = self
            .max_jerk()
            .ok_or(InvalidConstraint::MissingField(ConstraintField::MaxJerk))?;

        if let (Some(min), Some(max)) = (self.min_position(), self.max_position()) {
            if max <= min {
                return Err(InvalidConstraint::PositionOrder { min, max });
            }
        }

        for (field, value) in [
            (ConstraintField::MaxVelocity, velocity),
            (ConstraintField::MaxAcceleration, acceleration),
            (ConstraintField::MaxJerk, jerk),
        ] {
            if value <= 0.0 {
                return Err(InvalidConstraint::NonPositive { field, value });
            }
        }
        Ok(())
    }

    /// Like [`validate`](Self::validate), additionally requiring both
    /// position bounds.
    pub fn validate_with_position_limits(&self) -> Result<(), InvalidConstraint> {
        if self.min_position().is_none() {
            return Err(InvalidConstraint::MissingField(ConstraintField::MinPosition));
        }
        if self.max_position().is_none() {
            return Err(InvalidConstraint::MissingField(ConstraintField::MaxPosition));
        }
        self.validate()
    }

    /// Fill every unset field from `default`. Set fields are never touched.
    pub fn apply_defaults(&mut self, default: &MotionConstraint) {
        fn fill(field: &mut Option<f64>, default: Option<f64>) {
            if set_value(*field).is_none() {
                *field = set_value(default);
            }
        }
        fill(&mut self.min_position, default.min_position);
        fill(&mut self.max_position, default.max_position);
        fill(&mut self.max_velocity, default.max_velocity);
        fill(&mut self.max_acceleration, default.max_acceleration);
        fill(&mut self.max_jerk, default.max_jerk);
    }

    /// By-value variant of [`apply_defaults`](Self::apply_defaults).
    pub fn with_defaults(mut self, default: &MotionConstraint) -> Self {
        self.apply_defaults(default);
        self
    }
}

/// A constraint together with the joint it belongs to (TOML `[[joints]]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedConstraint {
    pub name: String,
    #[serde(flatten)]
    pub constraint: MotionConstraint,
}

// ─── MotionConstraintSet ────────────────────────────────────────────

/// Ordered, uniquely named collection of motion constraints.
#[derive(Debug, Clone, Default)]
pub struct MotionConstraintSet {
    names: Vec<String>,
    constraints: Vec<MotionConstraint>,
    index: HashMap<String, usize>,
}

impl MotionConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from named constraints, completing each one from
    /// `default` and validating it.
    pub fn from_named(
        joints: &[NamedConstraint],
        default: &MotionConstraint,
    ) -> Result<Self, ConstraintSetError> {
        if joints.is_empty() {
            return Err(ConstraintSetError::Empty);
        }
        if joints.len() > MAX_DOF {
            return Err(ConstraintSetError::TooManyDof {
                dof: joints.len(),
                max: MAX_DOF,
            });
        }
        let mut set = Self::new();
        for joint in joints {
            set.push(joint.name.clone(), joint.constraint.with_defaults(default))?;
        }
        set.validate()?;
        Ok(set)
    }

    /// Append a constraint. Returns its index.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        constraint: MotionConstraint,
    ) -> Result<usize, ConstraintSetError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(ConstraintSetError::DuplicateName(name));
        }
        if self.names.len() >= MAX_DOF {
            return Err(ConstraintSetError::TooManyDof {
                dof: self.names.len() + 1,
                max: MAX_DOF,
            });
        }
        let idx = self.names.len();
        self.index.insert(name.clone(), idx);
        self.names.push(name);
        self.constraints.push(constraint);
        Ok(idx)
    }

    /// Number of joints (DOF count).
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[inline]
    pub fn constraints(&self) -> &[MotionConstraint] {
        &self.constraints
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&MotionConstraint> {
        self.constraints.get(idx)
    }

    /// Resolve a joint name to its index.
    #[inline]
    pub fn name_to_index(&self, name: &str) -> Result<usize, NameNotFound> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| NameNotFound(name.to_string()))
    }

    /// Constraint configured for `name`.
    pub fn constraint(&self, name: &str) -> Result<&MotionConstraint, NameNotFound> {
        self.name_to_index(name).map(|idx| &self.constraints[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MotionConstraint)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.constraints.iter())
    }

    /// Complete every constraint from `default`.
    pub fn apply_defaults(&mut self, default: &MotionConstraint) {
        for c in &mut self.constraints {
            c.apply_defaults(default);
        }
    }

    /// Validate every constraint, reporting the first offending joint.
    pub fn validate(&self) -> Result<(), ConstraintSetError> {
        self.validate_each(MotionConstraint::validate)
    }

    /// Validate every constraint including position bounds.
    pub fn validate_with_position_limits(&self) -> Result<(), ConstraintSetError> {
        self.validate_each(MotionConstraint::validate_with_position_limits)
    }

    fn validate_each(
        &self,
        check: fn(&MotionConstraint) -> Result<(), InvalidConstraint>,
    ) -> Result<(), ConstraintSetError> {
        for (name, constraint) in self.iter() {
            check(constraint).map_err(|source| ConstraintSetError::InvalidConstraint {
                joint: name.to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
