//! Feedback discipline: the sensor seeds the first cycle only.

use std::cell::RefCell;

use otg_common::constraint::NameNotFound;
use otg_common::policy::{GenerationMode, OtgFlags, PositionLimitsPolicy};
use otg_common::samples::{ConstrainedJointsCommand, JointsSample};
use otg_common::state::ControllerState;
use otg_control_unit::buffer::{InputParameters, OutputParameters};
use otg_control_unit::bridge::FeedbackPhase;
use otg_control_unit::cycle::CycleController;
use otg_control_unit::engine::{JerkLimitedEngine, OtgEngine};
use otg_control_unit::error::CycleError;

use super::{DT, constraint_set, position, reference_constraint, settings};

/// Reference engine that records the current state it was called with.
#[derive(Default)]
struct RecordingEngine {
    inner: JerkLimitedEngine,
    seen: RefCell<Vec<(f64, f64, f64)>>,
}

impl OtgEngine for RecordingEngine {
    fn compute(
        &self,
        input: &InputParameters,
        flags: &OtgFlags,
        cycle_time: f64,
        output: &mut OutputParameters,
    ) -> i32 {
        self.seen.borrow_mut().push((
            input.current_position[0],
            input.current_velocity[0],
            input.current_acceleration[0],
        ));
        self.inner.compute(input, flags, cycle_time, output)
    }
}

fn recording_controller() -> CycleController<RecordingEngine> {
    let mut ctl = CycleController::new(RecordingEngine::default());
    ctl.configure(
        constraint_set(&["j1"], reference_constraint()),
        settings(GenerationMode::Position, PositionLimitsPolicy::Ignore),
    )
    .unwrap();
    ctl
}

#[test]
fn first_cycle_forces_rest() {
    let mut ctl = recording_controller();
    let mut sensor = JointsSample::from_positions(["j1"], &[0.3]);
    sensor.elements[0].speed = Some(7.0);
    sensor.elements[0].acceleration = Some(-4.0);
    let target = ConstrainedJointsCommand::from_positions(["j1"], &[2.0]);

    ctl.tick(&sensor, Some(&target), DT).unwrap();
    assert_eq!(ctl.engine().seen.borrow()[0], (0.3, 0.0, 0.0));
}

#[test]
fn later_cycles_ignore_a_diverging_sensor() {
    let mut ctl = recording_controller();
    let sensor = JointsSample::from_positions(["j1"], &[0.0]);
    let target = ConstrainedJointsCommand::from_positions(["j1"], &[2.0]);

    let first = ctl.tick(&sensor, Some(&target), DT).unwrap().command.clone();
    let first_position = position(&first, "j1");
    let first_velocity = first.get("j1").and_then(|s| s.speed()).unwrap();

    // The plant reports something far from the commanded trajectory.
    let diverging = JointsSample::from_positions(["j1"], &[100.0]);
    ctl.tick(&diverging, None, DT).unwrap();

    let seen = ctl.engine().seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].0, first_position);
    assert_eq!(seen[1].1, first_velocity);
    assert_ne!(seen[1].0, 100.0);
}

#[test]
fn current_sample_tracks_the_command() {
    let mut ctl = recording_controller();
    let sensor = JointsSample::from_positions(["j1"], &[0.0]);
    let target = ConstrainedJointsCommand::from_positions(["j1"], &[2.0]);
    for cycle in 0..5 {
        let command = ctl
            .tick(&sensor, (cycle == 0).then_some(&target), DT)
            .unwrap()
            .command
            .clone();
        assert_eq!(ctl.current_sample().unwrap().elements, command.elements);
    }
    assert_eq!(ctl.cycle_state().unwrap().phase, FeedbackPhase::Closed);
}

#[test]
fn sensor_must_still_carry_every_joint() {
    let mut ctl = recording_controller();
    let target = ConstrainedJointsCommand::from_positions(["j1"], &[2.0]);
    ctl.tick(&JointsSample::from_positions(["j1"], &[0.0]), Some(&target), DT)
        .unwrap();

    let renamed = JointsSample::from_positions(["other"], &[0.0]);
    assert_eq!(
        ctl.tick(&renamed, None, DT).unwrap_err(),
        CycleError::NameNotFound(NameNotFound("j1".into()))
    );
    assert_eq!(ctl.state(), ControllerState::Error);
    // The engine was not called for the failed cycle.
    assert_eq!(ctl.engine().seen.borrow().len(), 1);
}

#[test]
fn reordered_sensor_is_resolved_by_name() {
    let mut joints = constraint_set(&["a"], reference_constraint());
    joints.push("b", reference_constraint()).unwrap();
    let mut ctl = CycleController::new(JerkLimitedEngine::new());
    ctl.configure(
        joints,
        settings(GenerationMode::Position, PositionLimitsPolicy::Ignore),
    )
    .unwrap();

    let sensor = JointsSample::from_positions(["extra", "b", "a"], &[9.0, 2.0, 1.0]);
    let report = ctl.tick(&sensor, None, DT).unwrap();
    assert_eq!(report.command.names, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(position(report.command, "a"), 1.0);
    assert_eq!(position(report.command, "b"), 2.0);
}
