//! State bridge: sensor sample → current state.
//!
//! Only the first cycle of a session reads the sensor: position is seeded
//! from the sample, velocity and acceleration start at zero. Every later
//! cycle keeps the previous engine output as current state (closed-loop
//! interpolation), so sensor values are ignored. Name resolution runs every
//! cycle regardless, so a sample that stops carrying a configured joint
//! still fails.
//!
//! The joint → sample index map is cached and only rebuilt when the sample's
//! joint names no longer line up with it.

use otg_common::constraint::NameNotFound;
use otg_common::consts::MAX_DOF;
use otg_common::samples::{JointState, JointsSample};
use tracing::debug;

use crate::buffer::InputParameters;
use crate::error::CycleError;

/// Whether the current state is still taken from the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedbackPhase {
    /// Next cycle seeds the current state from the sensor sample.
    #[default]
    Seeding,
    /// Current state is the previous engine output.
    Closed,
}

/// Cached name resolution between configured joints and sensor samples.
#[derive(Debug, Clone, Default)]
pub struct StateBridge {
    sample_index: heapless::Vec<usize, MAX_DOF>,
}

impl StateBridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn cache_valid(&self, joints: &[String], sample: &JointsSample) -> bool {
        self.sample_index.len() == joints.len()
            && joints
                .iter()
                .zip(self.sample_index.iter())
                .all(|(joint, &idx)| sample.names.get(idx) == Some(joint))
    }

    /// Resolve every configured joint in `sample`, reusing the cache when
    /// the sample layout is unchanged.
    pub fn resolve(&mut self, joints: &[String], sample: &JointsSample) -> Result<(), NameNotFound> {
        if self.cache_valid(joints, sample) {
            return Ok(());
        }
        self.sample_index.clear();
        for joint in joints {
            let idx = sample
                .index_of(joint)
                .ok_or_else(|| NameNotFound(joint.clone()))?;
            // Capacity: joints.len() <= MAX_DOF is enforced by the constraint set.
            let _ = self.sample_index.push(idx);
        }
        debug!(joints = joints.len(), "sensor index map rebuilt");
        Ok(())
    }

    /// Sample index resolved for configured joint `i`.
    #[inline]
    pub fn sample_index(&self, i: usize) -> Option<usize> {
        self.sample_index.get(i).copied()
    }

    /// Run the bridge for one cycle.
    ///
    /// In [`FeedbackPhase::Seeding`] the current position of every joint is
    /// written from the sample (velocity and acceleration zeroed) and mirrored
    /// into `current_sample`. In [`FeedbackPhase::Closed`] nothing is written.
    pub fn update(
        &mut self,
        phase: FeedbackPhase,
        joints: &[String],
        sample: &JointsSample,
        input: &mut InputParameters,
        current_sample: &mut JointsSample,
    ) -> Result<(), CycleError> {
        sample.validate()?;
        self.resolve(joints, sample)?;

        if phase == FeedbackPhase::Closed {
            return Ok(());
        }

        for (i, joint) in joints.iter().enumerate() {
            let position = self
                .sample_index(i)
                .and_then(|idx| sample.elements.get(idx))
                .and_then(JointState::position)
                .ok_or_else(|| CycleError::InvalidState {
                    joint: joint.clone(),
                })?;
            input.current_position[i] = position;
            input.current_velocity[i] = 0.0;
            input.current_acceleration[i] = 0.0;
            if let Some(element) = current_sample.elements.get_mut(i) {
                *element = JointState::new(position, 0.0, 0.0);
            }
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
