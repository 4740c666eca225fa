//! Velocity-mode generation with and without the synchronization correction.

use otg_common::policy::{GenerationMode, PositionLimitsPolicy};
use otg_common::samples::{ConstrainedJointsCommand, JointsSample};
use otg_common::state::ControllerState;
use otg_control_unit::classify::Outcome;
use otg_control_unit::config::SessionSettings;
use otg_control_unit::error::{CycleError, TargetFault};

use super::{
    DT, constraint_set, controller, position, reference_constraint, run_closed_loop, settings,
    speed,
};

fn velocity_settings(correction: bool) -> SessionSettings {
    SessionSettings {
        velocity_sync_correction: correction,
        ..settings(GenerationMode::Velocity, PositionLimitsPolicy::Ignore)
    }
}

#[test]
fn reaches_target_velocity_then_cruises() {
    let mut ctl = controller(
        constraint_set(&["j1"], reference_constraint()),
        velocity_settings(true),
    );
    let target = ConstrainedJointsCommand::from_speeds(["j1"], &[0.5]);
    let steps = run_closed_loop(
        &mut ctl,
        JointsSample::from_positions(["j1"], &[0.0]),
        &target,
        1000,
    );
    let last = steps.last().unwrap();
    assert_eq!(last.outcome, Outcome::FinalStateReached);
    // Settles within one cycle of jerk (max_jerk * dt^2 / 2) of the target.
    let cruise = speed(&last.command, "j1");
    assert!((cruise - 0.5).abs() < 2.5e-4, "{cruise}");
    assert_eq!(ctl.telemetry().unwrap().requested_velocity[0], 0.5);

    // Speeds only ever rise toward the target.
    let mut previous = 0.0;
    for step in &steps {
        let v = speed(&step.command, "j1");
        assert!(v >= previous - 1e-12);
        assert!(v <= 0.5 + 1e-9);
        previous = v;
    }

    // Once there, the joint keeps moving at the target velocity.
    let mut sensor = last.command.to_sample();
    let mut p = position(&last.command, "j1");
    for _ in 0..10 {
        let report = ctl.tick(&sensor, None, DT).unwrap();
        assert_eq!(report.outcome, Outcome::FinalStateReached);
        let next = position(report.command, "j1");
        assert!((next - p - cruise * DT).abs() < 1e-9);
        assert_eq!(speed(report.command, "j1"), cruise);
        p = next;
        sensor.elements.clone_from(&report.command.elements);
    }
}

#[test]
fn velocity_input_has_no_position_fields() {
    let mut ctl = controller(
        constraint_set(&["j1"], reference_constraint()),
        velocity_settings(true),
    );
    let sensor = JointsSample::from_positions(["j1"], &[0.0]);
    let target = ConstrainedJointsCommand::from_speeds(["j1"], &[-0.8]);
    ctl.tick(&sensor, Some(&target), DT).unwrap();

    let telemetry = ctl.telemetry().unwrap();
    assert!(telemetry.input.target_position().is_none());
    assert!(telemetry.input.max_velocity().is_none());
    assert_eq!(telemetry.input.target_velocity[0], -0.8);
}

#[test]
fn tiny_velocity_gap_is_compensated_on_the_target_side() {
    let mut ctl = controller(
        constraint_set(&["j1"], reference_constraint()),
        velocity_settings(true),
    );
    let mut sensor = JointsSample::from_positions(["j1"], &[0.0]);
    // Below max_jerk * dt^2 / 2 = 2.5e-4: not chased.
    let target = ConstrainedJointsCommand::from_speeds(["j1"], &[1e-4]);
    for cycle in 0..5 {
        let report = ctl
            .tick(&sensor, (cycle == 0).then_some(&target), DT)
            .unwrap();
        assert_eq!(report.outcome, Outcome::FinalStateReached);
        assert_eq!(speed(report.command, "j1"), 0.0);
        sensor.elements.clone_from(&report.command.elements);

        let telemetry = ctl.telemetry().unwrap();
        assert_eq!(telemetry.input.target_velocity[0], 0.0);
        assert_eq!(telemetry.requested_velocity[0], 1e-4);
        assert_eq!(telemetry.input.min_synchronization_time, 0.0);
        // The fed-back state is exactly the engine's last output.
        assert_eq!(telemetry.input.current_velocity[0], telemetry.output.new_velocity[0]);
        assert_eq!(telemetry.input.current_position[0], telemetry.output.new_position[0]);
    }

    // A larger request later on is followed in full.
    let faster = ConstrainedJointsCommand::from_speeds(["j1"], &[0.2]);
    let report = ctl.tick(&sensor, Some(&faster), DT).unwrap();
    assert_eq!(report.outcome, Outcome::Working);
    assert_eq!(ctl.telemetry().unwrap().input.target_velocity[0], 0.2);
}

#[test]
fn small_velocity_gap_raises_min_synchronization_time() {
    let mut ctl = controller(
        constraint_set(&["j1"], reference_constraint()),
        velocity_settings(true),
    );
    let sensor = JointsSample::from_positions(["j1"], &[0.0]);
    // Between the jerk and acceleration resolutions of one cycle.
    let target = ConstrainedJointsCommand::from_speeds(["j1"], &[0.01]);
    ctl.tick(&sensor, Some(&target), DT).unwrap();
    assert_eq!(ctl.telemetry().unwrap().input.min_synchronization_time, DT);
}

#[test]
fn correction_can_be_disabled() {
    let mut ctl = controller(
        constraint_set(&["j1"], reference_constraint()),
        velocity_settings(false),
    );
    let sensor = JointsSample::from_positions(["j1"], &[0.0]);
    let target = ConstrainedJointsCommand::from_speeds(["j1"], &[1e-4]);
    ctl.tick(&sensor, Some(&target), DT).unwrap();
    let input = ctl.telemetry().unwrap().input;
    assert_eq!(input.target_velocity[0], 1e-4);
    assert_eq!(input.min_synchronization_time, 0.0);
    assert!(ctl.telemetry().unwrap().output.new_velocity[0] > 0.0);
}

#[test]
fn hold_on_start_commands_zero_velocity() {
    let mut ctl = controller(
        constraint_set(&["j1"], reference_constraint()),
        velocity_settings(true),
    );
    let sensor = JointsSample::from_positions(["j1"], &[0.7]);
    let steps = run_closed_loop(
        &mut ctl,
        sensor.clone(),
        &ConstrainedJointsCommand::from_speeds(["j1"], &[0.0]),
        1,
    );
    assert_eq!(steps[0].outcome, Outcome::FinalStateReached);
    assert_eq!(position(&steps[0].command, "j1"), 0.7);

    let mut idle = controller(
        constraint_set(&["j1"], reference_constraint()),
        velocity_settings(true),
    );
    let report = idle.tick(&sensor, None, DT).unwrap();
    assert_eq!(report.outcome, Outcome::FinalStateReached);
    assert_eq!(speed(report.command, "j1"), 0.0);
}

#[test]
fn target_without_speed_is_invalid() {
    let mut ctl = controller(
        constraint_set(&["j1"], reference_constraint()),
        velocity_settings(true),
    );
    let sensor = JointsSample::from_positions(["j1"], &[0.0]);
    let target = ConstrainedJointsCommand::from_positions(["j1"], &[1.0]);
    assert_eq!(
        ctl.tick(&sensor, Some(&target), DT).unwrap_err(),
        CycleError::InvalidTarget {
            joint: "j1".into(),
            reason: TargetFault::MissingSpeed,
        }
    );
    assert_eq!(ctl.state(), ControllerState::Error);
}
