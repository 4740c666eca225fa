//! Position-limit policies across a full session.

use otg_common::constraint::MotionConstraint;
use otg_common::policy::{GenerationMode, PositionLimitsPolicy};
use otg_common::samples::{ConstrainedJointsCommand, JointsSample};
use otg_common::state::ControllerState;
use otg_control_unit::classify::{Outcome, RecoverableKind};

use super::{DT, constraint_set, controller, position, run_closed_loop, settings};

fn bounded() -> MotionConstraint {
    MotionConstraint::new(1.0, 2.0, 5.0).with_position_limits(-1.0, 1.0)
}

#[test]
fn actively_prevent_clamps_to_the_bound() {
    let mut ctl = controller(
        constraint_set(&["j1"], bounded()),
        settings(GenerationMode::Position, PositionLimitsPolicy::ActivelyPrevent),
    );
    let target = ConstrainedJointsCommand::from_positions(["j1"], &[5.0]);
    let steps = run_closed_loop(
        &mut ctl,
        JointsSample::from_positions(["j1"], &[0.0]),
        &target,
        2000,
    );

    assert_eq!(ctl.telemetry().unwrap().input.target_position().unwrap()[0], 1.0);
    let last = steps.last().unwrap();
    assert_eq!(last.outcome, Outcome::FinalStateReached);
    assert_eq!(position(&last.command, "j1"), 1.0);
    for step in &steps {
        assert!(!matches!(step.outcome, Outcome::Recoverable(_)));
        assert!(position(&step.command, "j1") <= 1.0);
    }
}

#[test]
fn error_policy_reports_and_holds_inside_the_bounds() {
    let mut ctl = controller(
        constraint_set(&["j1"], bounded()),
        settings(GenerationMode::Position, PositionLimitsPolicy::ErrorMsgOnly),
    );
    let mut sensor = JointsSample::from_positions(["j1"], &[0.0]);
    let target = ConstrainedJointsCommand::from_positions(["j1"], &[5.0]);

    // The violation persists while the target stays out of bounds, and the
    // command never follows it.
    for cycle in 0..3000 {
        let report = ctl
            .tick(&sensor, (cycle == 0).then_some(&target), DT)
            .unwrap();
        assert_eq!(
            report.outcome,
            Outcome::Recoverable(RecoverableKind::PositionLimitViolation)
        );
        let p = position(report.command, "j1");
        assert!((-1.0..=1.0).contains(&p), "cycle {cycle}: {p}");
        sensor.elements.clone_from(&report.command.elements);
    }

    assert_eq!(ctl.state(), ControllerState::Running);
    assert_eq!(ctl.telemetry().unwrap().input.target_position().unwrap()[0], 5.0);
    assert_eq!(sensor.get("j1").and_then(|s| s.position()), Some(0.0));
}

#[test]
fn error_policy_brakes_when_the_target_leaves_the_bounds_mid_motion() {
    let mut ctl = controller(
        constraint_set(&["j1"], bounded()),
        settings(GenerationMode::Position, PositionLimitsPolicy::ErrorMsgOnly),
    );
    let mut sensor = JointsSample::from_positions(["j1"], &[0.0]);
    let inside = ConstrainedJointsCommand::from_positions(["j1"], &[0.9]);
    let outside = ConstrainedJointsCommand::from_positions(["j1"], &[5.0]);

    for cycle in 0..2000 {
        let target = match cycle {
            0 => Some(&inside),
            60 => Some(&outside),
            _ => None,
        };
        let report = ctl.tick(&sensor, target, DT).unwrap();
        if cycle >= 60 {
            assert_eq!(
                report.outcome,
                Outcome::Recoverable(RecoverableKind::PositionLimitViolation)
            );
        }
        assert!(position(report.command, "j1") <= 1.0);
        sensor.elements.clone_from(&report.command.elements);
    }
    assert_eq!(ctl.state(), ControllerState::Running);
}

#[test]
fn error_policy_velocity_mode_stays_inside_the_bounds() {
    let mut ctl = controller(
        constraint_set(&["j1"], bounded()),
        settings(GenerationMode::Velocity, PositionLimitsPolicy::ErrorMsgOnly),
    );
    let mut sensor = JointsSample::from_positions(["j1"], &[0.0]);
    let target = ConstrainedJointsCommand::from_speeds(["j1"], &[1.0]);
    let mut reported = false;
    for cycle in 0..1000 {
        let report = ctl
            .tick(&sensor, (cycle == 0).then_some(&target), DT)
            .unwrap();
        reported |= report.outcome
            == Outcome::Recoverable(RecoverableKind::PositionLimitViolation);
        assert!(position(report.command, "j1") <= 1.0);
        sensor.elements.clone_from(&report.command.elements);
    }
    assert!(reported);
}

#[test]
fn error_policy_accepts_targets_inside_the_bounds() {
    let mut ctl = controller(
        constraint_set(&["j1"], bounded()),
        settings(GenerationMode::Position, PositionLimitsPolicy::ErrorMsgOnly),
    );
    let target = ConstrainedJointsCommand::from_positions(["j1"], &[0.5]);
    let steps = run_closed_loop(
        &mut ctl,
        JointsSample::from_positions(["j1"], &[0.0]),
        &target,
        2000,
    );
    assert_eq!(steps[0].outcome, Outcome::Working);
    assert_eq!(steps.last().unwrap().outcome, Outcome::FinalStateReached);
}

#[test]
fn ignore_policy_does_not_check() {
    let mut ctl = controller(
        constraint_set(&["j1"], bounded()),
        settings(GenerationMode::Position, PositionLimitsPolicy::Ignore),
    );
    let sensor = JointsSample::from_positions(["j1"], &[0.0]);
    let target = ConstrainedJointsCommand::from_positions(["j1"], &[5.0]);

    let report = ctl.tick(&sensor, Some(&target), DT).unwrap();
    assert_eq!(report.outcome, Outcome::Working);
    assert_eq!(ctl.telemetry().unwrap().input.target_position().unwrap()[0], 5.0);
}

#[test]
fn velocity_mode_stays_inside_the_bounds() {
    let mut ctl = controller(
        constraint_set(&["j1"], bounded()),
        settings(GenerationMode::Velocity, PositionLimitsPolicy::ActivelyPrevent),
    );
    let mut sensor = JointsSample::from_positions(["j1"], &[0.0]);
    let target = ConstrainedJointsCommand::from_speeds(["j1"], &[1.0]);
    for cycle in 0..1000 {
        let report = ctl
            .tick(&sensor, (cycle == 0).then_some(&target), DT)
            .unwrap();
        assert!(position(report.command, "j1") <= 1.0);
        sensor.elements.clone_from(&report.command.elements);
    }
    assert!(sensor.get("j1").and_then(|s| s.position()).unwrap() > 0.5);
}
