//! Point-to-point convergence under velocity, acceleration and jerk limits.

use otg_common::constraint::MotionConstraint;
use otg_common::policy::{GenerationMode, PositionLimitsPolicy};
use otg_common::samples::{ConstrainedJointsCommand, JointsSample};
use otg_control_unit::classify::Outcome;

use super::{
    DT, acceleration, constraint_set, controller, position, reference_constraint, run_closed_loop,
    settings, speed,
};

const LIMIT_SLACK: f64 = 1e-6;

#[test]
fn single_joint_reaches_target_monotonically() {
    let mut ctl = controller(
        constraint_set(&["j1"], MotionConstraint::new(1.0, 2.0, 5.0)),
        settings(GenerationMode::Position, PositionLimitsPolicy::Ignore),
    );
    let target = ConstrainedJointsCommand::from_positions(["j1"], &[5.0]);
    let steps = run_closed_loop(
        &mut ctl,
        JointsSample::from_positions(["j1"], &[0.0]),
        &target,
        2000,
    );

    let (last, moving) = steps.split_last().unwrap();
    assert_eq!(last.outcome, Outcome::FinalStateReached);
    assert!((position(&last.command, "j1") - 5.0).abs() < 1e-6);
    assert!(speed(&last.command, "j1").abs() < 1e-6);

    // 5 units at 1 unit/s cannot take less than five seconds.
    assert!(steps.len() as f64 * DT > 5.0);

    let mut previous = 0.0;
    for step in moving {
        assert_eq!(step.outcome, Outcome::Working);
        let p = position(&step.command, "j1");
        assert!(p >= previous - 1e-12, "position went backwards: {p} < {previous}");
        assert!(p <= 5.0 + 1e-6);
        previous = p;
    }
}

#[test]
fn limits_hold_along_the_whole_trajectory() {
    let elbow = MotionConstraint::new(0.5, 1.0, 3.0).with_position_limits(-10.0, 10.0);
    let mut joints = constraint_set(&["shoulder"], reference_constraint());
    joints.push("elbow", elbow).unwrap();
    let mut ctl = controller(
        joints,
        settings(GenerationMode::Position, PositionLimitsPolicy::ActivelyPrevent),
    );
    let target = ConstrainedJointsCommand::from_positions(["shoulder", "elbow"], &[2.0, -1.5]);
    let steps = run_closed_loop(
        &mut ctl,
        JointsSample::from_positions(["shoulder", "elbow"], &[0.0, 0.5]),
        &target,
        3000,
    );

    let last = steps.last().unwrap();
    assert_eq!(last.outcome, Outcome::FinalStateReached);
    assert!((position(&last.command, "shoulder") - 2.0).abs() < 1e-6);
    assert!((position(&last.command, "elbow") + 1.5).abs() < 1e-6);

    for step in &steps {
        assert!(speed(&step.command, "shoulder").abs() <= 1.0 + LIMIT_SLACK);
        assert!(acceleration(&step.command, "shoulder").abs() <= 2.0 + LIMIT_SLACK);
        assert!(speed(&step.command, "elbow").abs() <= 0.5 + LIMIT_SLACK);
        assert!(acceleration(&step.command, "elbow").abs() <= 1.0 + LIMIT_SLACK);
    }
}

#[test]
fn new_target_mid_motion_is_followed() {
    let mut ctl = controller(
        constraint_set(&["j1"], reference_constraint()),
        settings(GenerationMode::Position, PositionLimitsPolicy::Ignore),
    );
    let mut sensor = JointsSample::from_positions(["j1"], &[0.0]);
    let forward = ConstrainedJointsCommand::from_positions(["j1"], &[3.0]);
    for cycle in 0..100 {
        let report = ctl
            .tick(&sensor, (cycle == 0).then_some(&forward), DT)
            .unwrap();
        sensor.elements.clone_from(&report.command.elements);
    }
    assert!(sensor.get("j1").and_then(|s| s.speed()).unwrap() > 0.0);

    let back = ConstrainedJointsCommand::from_positions(["j1"], &[-1.0]);
    let steps = run_closed_loop(&mut ctl, sensor, &back, 3000);
    let last = steps.last().unwrap();
    assert_eq!(last.outcome, Outcome::FinalStateReached);
    assert!((position(&last.command, "j1") + 1.0).abs() < 1e-6);
}

#[test]
fn constraint_override_slows_the_joint() {
    let mut ctl = controller(
        constraint_set(&["j1"], reference_constraint()),
        settings(GenerationMode::Position, PositionLimitsPolicy::Ignore),
    );
    let slow = MotionConstraint {
        max_velocity: Some(0.2),
        ..Default::default()
    };
    let target =
        ConstrainedJointsCommand::from_positions(["j1"], &[1.0]).with_constraints(vec![slow]);
    let steps = run_closed_loop(
        &mut ctl,
        JointsSample::from_positions(["j1"], &[0.0]),
        &target,
        3000,
    );
    assert!(steps.last().unwrap().outcome.is_final());
    let peak = steps
        .iter()
        .map(|s| speed(&s.command, "j1").abs())
        .fold(0.0, f64::max);
    assert!(peak <= 0.2 + LIMIT_SLACK);
    assert!(peak > 0.19);

    // A later command without overrides restores the configured limits.
    let sensor = steps.last().unwrap().command.to_sample();
    let back = ConstrainedJointsCommand::from_positions(["j1"], &[0.0]);
    run_closed_loop(&mut ctl, sensor, &back, 1);
    assert_eq!(ctl.telemetry().unwrap().input.max_velocity().unwrap()[0], 1.0);
}
