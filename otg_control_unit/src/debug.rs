//! Debug converter: parameter buffers → serializable records.
//!
//! Records carry every field of the buffers, with fields that do not exist
//! in the session's mode filled with NaN (serialized as `null` in JSON), so
//! a snapshot always has the same shape.

use otg_common::policy::GenerationMode;
use otg_common::result::ResultCode;
use otg_common::state::ControllerState;
use serde::{Deserialize, Serialize};

use crate::buffer::{InputParameters, ModeOutput, OutputFlags, OutputParameters};
use crate::cycle::Telemetry;

fn nan_vec(len: usize) -> Vec<f64> {
    vec![f64::NAN; len]
}

/// Serializable copy of [`InputParameters`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputParametersRecord {
    pub selection_vector: Vec<bool>,
    pub current_position_vector: Vec<f64>,
    pub current_velocity_vector: Vec<f64>,
    pub current_acceleration_vector: Vec<f64>,
    pub min_position_vector: Vec<f64>,
    pub max_position_vector: Vec<f64>,
    pub max_velocity_vector: Vec<f64>,
    pub max_acceleration_vector: Vec<f64>,
    pub max_jerk_vector: Vec<f64>,
    pub target_position_vector: Vec<f64>,
    pub target_velocity_vector: Vec<f64>,
    pub minimum_synchronization_time: f64,
    pub override_value: f64,
}

impl From<&InputParameters> for InputParametersRecord {
    fn from(input: &InputParameters) -> Self {
        let n = input.dof();
        Self {
            selection_vector: input.selection.to_vec(),
            current_position_vector: input.current_position.to_vec(),
            current_velocity_vector: input.current_velocity.to_vec(),
            current_acceleration_vector: input.current_acceleration.to_vec(),
            min_position_vector: input.min_position.to_vec(),
            max_position_vector: input.max_position.to_vec(),
            max_velocity_vector: input.max_velocity().map_or_else(|| nan_vec(n), <[f64]>::to_vec),
            max_acceleration_vector: input.max_acceleration.to_vec(),
            max_jerk_vector: input.max_jerk.to_vec(),
            target_position_vector: input
                .target_position()
                .map_or_else(|| nan_vec(n), <[f64]>::to_vec),
            target_velocity_vector: input.target_velocity.to_vec(),
            minimum_synchronization_time: input.min_synchronization_time,
            override_value: input.override_value,
        }
    }
}

/// Serializable copy of [`OutputParameters`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputParametersRecord {
    pub new_position_vector: Vec<f64>,
    pub new_velocity_vector: Vec<f64>,
    pub new_acceleration_vector: Vec<f64>,
    pub execution_times: Vec<f64>,
    pub position_values_at_target_velocity: Vec<f64>,
    pub a_new_calculation_was_performed: bool,
    pub trajectory_is_phase_synchronized: bool,
    pub override_filter_is_active: bool,
    pub trajectory_exceeds_target_position: bool,
    pub dof_with_the_greatest_execution_time: Option<usize>,
    pub synchronization_time: f64,
    pub current_override_value: f64,
}

impl From<&OutputParameters> for OutputParametersRecord {
    fn from(output: &OutputParameters) -> Self {
        let (exceeds, at_target_velocity) = match &output.mode {
            ModeOutput::Position {
                exceeds_target_position,
            } => (*exceeds_target_position, nan_vec(output.dof())),
            ModeOutput::Velocity {
                position_at_target_velocity,
            } => (false, position_at_target_velocity.to_vec()),
        };
        Self {
            new_position_vector: output.new_position.to_vec(),
            new_velocity_vector: output.new_velocity.to_vec(),
            new_acceleration_vector: output.new_acceleration.to_vec(),
            execution_times: output.execution_times.to_vec(),
            position_values_at_target_velocity: at_target_velocity,
            a_new_calculation_was_performed: output.flags.contains(OutputFlags::RECALCULATED),
            trajectory_is_phase_synchronized: output
                .flags
                .contains(OutputFlags::PHASE_SYNCHRONIZED),
            override_filter_is_active: output.flags.contains(OutputFlags::OVERRIDE_ACTIVE),
            trajectory_exceeds_target_position: exceeds,
            dof_with_the_greatest_execution_time: output.dof_with_greatest_execution_time,
            synchronization_time: output.synchronization_time,
            current_override_value: output.current_override_value,
        }
    }
}

/// One complete diagnostic snapshot of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugSnapshot {
    pub state: ControllerState,
    pub mode: GenerationMode,
    pub names: Vec<String>,
    pub input: InputParametersRecord,
    pub output: OutputParametersRecord,
    /// Raw engine result of the last cycle.
    pub result_value: Option<i32>,
    /// `result_value` as a documented code, if it is one.
    pub result: Option<ResultCode>,
    pub cycle_count: u64,
}

impl DebugSnapshot {
    pub fn from_telemetry(t: &Telemetry<'_>) -> Self {
        Self {
            state: t.state,
            mode: t.mode,
            names: t.names.to_vec(),
            input: t.input.into(),
            output: t.output.into(),
            result_value: t.last_result,
            result: t.last_result.and_then(ResultCode::from_code),
            cycle_count: t.stats.cycle_count,
        }
    }

    /// JSON value of the snapshot.
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
