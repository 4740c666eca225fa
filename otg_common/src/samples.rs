//! Name-addressed joint records exchanged with the surrounding framework.
//!
//! - [`JointsSample`]: sensor feedback, one [`JointState`] per named joint.
//! - [`ConstrainedJointsCommand`]: target command, optionally carrying
//!   per-joint motion constraint overrides.
//! - [`JointsCommand`]: the outgoing command produced each cycle.
//!
//! Unset values are `None` (a NaN value counts as unset).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constraint::MotionConstraint;

/// Shape errors of a joint record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("joint record: {names} names but {elements} elements")]
    SizeMismatch { names: usize, elements: usize },

    #[error(
        "joint command: {constraints} motion constraints for {elements} elements (must be empty or equal)"
    )]
    ConstraintCountMismatch { constraints: usize, elements: usize },
}

/// Kinematic state of one joint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JointState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceleration: Option<f64>,
}

impl JointState {
    pub const fn new(position: f64, speed: f64, acceleration: f64) -> Self {
        Self {
            position: Some(position),
            speed: Some(speed),
            acceleration: Some(acceleration),
        }
    }

    pub const fn from_position(position: f64) -> Self {
        Self {
            position: Some(position),
            speed: None,
            acceleration: None,
        }
    }

    pub const fn from_speed(speed: f64) -> Self {
        Self {
            position: None,
            speed: Some(speed),
            acceleration: None,
        }
    }

    /// Position if set and not NaN.
    #[inline]
    pub fn position(&self) -> Option<f64> {
        self.position.filter(|p| !p.is_nan())
    }

    /// Speed if set and not NaN.
    #[inline]
    pub fn speed(&self) -> Option<f64> {
        self.speed.filter(|s| !s.is_nan())
    }

    #[inline]
    pub fn acceleration(&self) -> Option<f64> {
        self.acceleration.filter(|a| !a.is_nan())
    }

    #[inline]
    pub fn has_position(&self) -> bool {
        self.position().is_some()
    }

    #[inline]
    pub fn has_speed(&self) -> bool {
        self.speed().is_some()
    }
}

/// Linear name lookup shared by all joint records.
#[inline]
fn find(names: &[String], name: &str) -> Option<usize> {
    names.iter().position(|n| n == name)
}

fn check_shape(names: usize, elements: usize) -> Result<(), CommandError> {
    if names != elements {
        return Err(CommandError::SizeMismatch { names, elements });
    }
    Ok(())
}

// ─── JointsSample ───────────────────────────────────────────────────

/// Sensor feedback for a set of named joints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointsSample {
    pub names: Vec<String>,
    pub elements: Vec<JointState>,
}

impl JointsSample {
    /// Sample with the given names and unset states.
    pub fn with_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let elements = vec![JointState::default(); names.len()];
        Self { names, elements }
    }

    /// Sample with positions only.
    pub fn from_positions<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
        positions: &[f64],
    ) -> Self {
        let mut sample = Self::with_names(names);
        for (element, p) in sample.elements.iter_mut().zip(positions) {
            element.position = Some(*p);
        }
        sample
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        find(&self.names, name)
    }

    pub fn get(&self, name: &str) -> Option<&JointState> {
        self.index_of(name).and_then(|i| self.elements.get(i))
    }

    pub fn validate(&self) -> Result<(), CommandError> {
        check_shape(self.names.len(), self.elements.len())
    }
}

// ─── JointsCommand ──────────────────────────────────────────────────

/// Outgoing per-cycle command, addressed by the configured joint names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointsCommand {
    pub names: Vec<String>,
    pub elements: Vec<JointState>,
}

impl JointsCommand {
    pub fn with_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let elements = vec![JointState::default(); names.len()];
        Self { names, elements }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        find(&self.names, name)
    }

    pub fn get(&self, name: &str) -> Option<&JointState> {
        self.index_of(name).and_then(|i| self.elements.get(i))
    }

    /// View the command as a sensor sample (ideal plant feedback).
    pub fn to_sample(&self) -> JointsSample {
        JointsSample {
            names: self.names.clone(),
            elements: self.elements.clone(),
        }
    }
}

// ─── ConstrainedJointsCommand ───────────────────────────────────────

/// Target command with optional per-joint motion constraint overrides.
///
/// `motion_constraints` is either empty or has one entry per element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstrainedJointsCommand {
    pub names: Vec<String>,
    pub elements: Vec<JointState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub motion_constraints: Vec<MotionConstraint>,
}

impl ConstrainedJointsCommand {
    /// Position targets (target speed left unset).
    pub fn from_positions<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
        positions: &[f64],
    ) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let elements = positions.iter().map(|p| JointState::from_position(*p)).collect();
        Self {
            names,
            elements,
            motion_constraints: Vec::new(),
        }
    }

    /// Velocity targets (position left unset).
    pub fn from_speeds<S: Into<String>>(names: impl IntoIterator<Item = S>, speeds: &[f64]) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let elements = speeds.iter().map(|s| JointState::from_speed(*s)).collect();
        Self {
            names,
            elements,
            motion_constraints: Vec::new(),
        }
    }

    /// Builder-style constraint overrides.
    pub fn with_constraints(mut self, constraints: Vec<MotionConstraint>) -> Self {
        self.motion_constraints = constraints;
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        find(&self.names, name)
    }

    pub fn validate(&self) -> Result<(), CommandError> {
        check_shape(self.names.len(), self.elements.len())?;
        if !self.motion_constraints.is_empty() && self.motion_constraints.len() != self.len() {
            return Err(CommandError::ConstraintCountMismatch {
                constraints: self.motion_constraints.len(),
                elements: self.len(),
            });
        }
        Ok(())
    }
}
