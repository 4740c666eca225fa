//! Engine parameter buffers.
//!
//! [`InputParameters`] and [`OutputParameters`] are the per-session buffers
//! exchanged with the engine each cycle. Both are sized once for the session's
//! DOF count and never resized afterwards; every per-DOF vector is a
//! `heapless::Vec` so a cycle never touches the heap.
//!
//! Mode-specific fields live in [`ModeInput`] / [`ModeOutput`], so a
//! position-mode field simply does not exist on a velocity-mode buffer.

use bitflags::bitflags;
use otg_common::consts::MAX_DOF;
use otg_common::policy::GenerationMode;
use static_assertions::const_assert;
use thiserror::Error;

/// Fixed-capacity per-DOF vector.
pub type DofVec<T = f64> = heapless::Vec<T, MAX_DOF>;

const_assert!(MAX_DOF > 0);

/// Requested DOF count exceeds [`MAX_DOF`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{dof} DOFs exceed buffer capacity {MAX_DOF}")]
pub struct CapacityExceeded {
    pub dof: usize,
}

fn filled<T: Clone>(dof: usize, value: T) -> Result<DofVec<T>, CapacityExceeded> {
    let mut v = DofVec::new();
    v.resize(dof, value).map_err(|_| CapacityExceeded { dof })?;
    Ok(v)
}

// ─── Input ──────────────────────────────────────────────────────────

/// Mode-specific input fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ModeInput {
    Position {
        max_velocity: DofVec,
        target_position: DofVec,
    },
    Velocity,
}

/// Engine input buffer.
///
/// Unconfigured entries hold NaN until the constraint applicator or the
/// state bridge writes them.
#[derive(Debug, Clone, PartialEq)]
pub struct InputParameters {
    /// DOFs with `false` are passed through unchanged by the engine.
    pub selection: DofVec<bool>,
    pub current_position: DofVec,
    pub current_velocity: DofVec,
    pub current_acceleration: DofVec,
    pub min_position: DofVec,
    pub max_position: DofVec,
    pub max_acceleration: DofVec,
    pub max_jerk: DofVec,
    pub target_velocity: DofVec,
    /// Lower bound for the synchronization time [s].
    pub min_synchronization_time: f64,
    /// Speed override in `[0, 1]`.
    pub override_value: f64,
    pub mode: ModeInput,
}

impl InputParameters {
    /// Buffer for `dof` DOFs, all selected, all values NaN.
    pub fn new(mode: GenerationMode, dof: usize) -> Result<Self, CapacityExceeded> {
        let nan = || filled(dof, f64::NAN);
        let mode = match mode {
            GenerationMode::Position => ModeInput::Position {
                max_velocity: nan()?,
                target_position: nan()?,
            },
            GenerationMode::Velocity => ModeInput::Velocity,
        };
        Ok(Self {
            selection: filled(dof, true)?,
            current_position: nan()?,
            current_velocity: nan()?,
            current_acceleration: nan()?,
            min_position: nan()?,
            max_position: nan()?,
            max_acceleration: nan()?,
            max_jerk: nan()?,
            target_velocity: nan()?,
            min_synchronization_time: 0.0,
            override_value: 1.0,
            mode,
        })
    }

    /// Number of DOFs.
    #[inline]
    pub fn dof(&self) -> usize {
        self.selection.len()
    }

    #[inline]
    pub fn generation_mode(&self) -> GenerationMode {
        match self.mode {
            ModeInput::Position { .. } => GenerationMode::Position,
            ModeInput::Velocity => GenerationMode::Velocity,
        }
    }

    /// Velocity limits (position mode only).
    pub fn max_velocity(&self) -> Option<&[f64]> {
        match &self.mode {
            ModeInput::Position { max_velocity, .. } => Some(max_velocity),
            ModeInput::Velocity => None,
        }
    }

    pub fn max_velocity_mut(&mut self) -> Option<&mut DofVec> {
        match &mut self.mode {
            ModeInput::Position { max_velocity, .. } => Some(max_velocity),
            ModeInput::Velocity => None,
        }
    }

    /// Target positions (position mode only).
    pub fn target_position(&self) -> Option<&[f64]> {
        match &self.mode {
            ModeInput::Position {
                target_position, ..
            } => Some(target_position),
            ModeInput::Velocity => None,
        }
    }

    pub fn target_position_mut(&mut self) -> Option<&mut DofVec> {
        match &mut self.mode {
            ModeInput::Position {
                target_position, ..
            } => Some(target_position),
            ModeInput::Velocity => None,
        }
    }

    /// Every per-DOF vector has `dof()` entries.
    pub fn is_consistent(&self) -> bool {
        let n = self.dof();
        let common = [
            &self.current_position,
            &self.current_velocity,
            &self.current_acceleration,
            &self.min_position,
            &self.max_position,
            &self.max_acceleration,
            &self.max_jerk,
            &self.target_velocity,
        ]
        .iter()
        .all(|v| v.len() == n);
        let mode = match &self.mode {
            ModeInput::Position {
                max_velocity,
                target_position,
            } => max_velocity.len() == n && target_position.len() == n,
            ModeInput::Velocity => true,
        };
        common && mode
    }
}

// ─── Output ─────────────────────────────────────────────────────────

bitflags! {
    /// Boolean results of one engine call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OutputFlags: u8 {
        /// A new trajectory was calculated this cycle.
        const RECALCULATED       = 0x01;
        /// All DOFs move on a common phase-synchronized path.
        const PHASE_SYNCHRONIZED = 0x02;
        /// The override filter is ramping.
        const OVERRIDE_ACTIVE    = 0x04;
    }
}

impl Default for OutputFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Mode-specific output fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ModeOutput {
    Position {
        /// The trajectory passes beyond the target position before settling.
        exceeds_target_position: bool,
    },
    Velocity {
        /// Position at which each DOF reaches its target velocity.
        position_at_target_velocity: DofVec,
    },
}

/// Engine output buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputParameters {
    pub new_position: DofVec,
    pub new_velocity: DofVec,
    pub new_acceleration: DofVec,
    /// Per-DOF time to reach the target [s].
    pub execution_times: DofVec,
    pub synchronization_time: f64,
    pub flags: OutputFlags,
    pub dof_with_greatest_execution_time: Option<usize>,
    pub current_override_value: f64,
    pub mode: ModeOutput,
}

impl OutputParameters {
    /// Buffer for `dof` DOFs, all values NaN.
    pub fn new(mode: GenerationMode, dof: usize) -> Result<Self, CapacityExceeded> {
        let nan = || filled(dof, f64::NAN);
        let mode = match mode {
            GenerationMode::Position => ModeOutput::Position {
                exceeds_target_position: false,
            },
            GenerationMode::Velocity => ModeOutput::Velocity {
                position_at_target_velocity: nan()?,
            },
        };
        Ok(Self {
            new_position: nan()?,
            new_velocity: nan()?,
            new_acceleration: nan()?,
            execution_times: nan()?,
            synchronization_time: 0.0,
            flags: OutputFlags::default(),
            dof_with_greatest_execution_time: None,
            current_override_value: 1.0,
            mode,
        })
    }

    #[inline]
    pub fn dof(&self) -> usize {
        self.new_position.len()
    }

    #[inline]
    pub fn generation_mode(&self) -> GenerationMode {
        match self.mode {
            ModeOutput::Position { .. } => GenerationMode::Position,
            ModeOutput::Velocity { .. } => GenerationMode::Velocity,
        }
    }

    pub fn is_consistent(&self) -> bool {
        let n = self.dof();
        let common = self.new_velocity.len() == n
            && self.new_acceleration.len() == n
            && self.execution_times.len() == n;
        match &self.mode {
            ModeOutput::Position { .. } => common,
            ModeOutput::Velocity {
                position_at_target_velocity,
            } => common && position_at_target_velocity.len() == n,
        }
    }
}

// ─── Feedback ───────────────────────────────────────────────────────

/// Copy the new kinematic state of `output` into the current state of
/// `input` (closed-loop interpolation).
pub fn feed_back(output: &OutputParameters, input: &mut InputParameters) {
    input.current_position.clone_from(&output.new_position);
    input.current_velocity.clone_from(&output.new_velocity);
    input.current_acceleration.clone_from(&output.new_acceleration);
}

// ─── Tests ──────────────────────────────────────────────────────────
