//! Cartesian targets driven through the joint controller as six DOFs.

use nalgebra::{UnitQuaternion, Vector3};
use otg_common::cartesian::CartesianState;
use otg_common::consts::CARTESIAN_DOF_NAMES;
use otg_common::constraint::MotionConstraint;
use otg_common::policy::{GenerationMode, PositionLimitsPolicy};
use otg_control_unit::classify::Outcome;

use super::{constraint_set, controller, run_closed_loop, settings};

#[test]
fn pose_target_is_reached() {
    let mut ctl = controller(
        constraint_set(&CARTESIAN_DOF_NAMES, MotionConstraint::new(0.5, 1.0, 4.0)),
        settings(GenerationMode::Position, PositionLimitsPolicy::Ignore),
    );

    let start = CartesianState::from_pose(Vector3::new(0.1, 0.0, 0.3), UnitQuaternion::identity());
    let goal = CartesianState::from_pose(
        Vector3::new(0.4, -0.2, 0.25),
        UnitQuaternion::from_euler_angles(0.0, 0.1, 0.5),
    );

    let steps = run_closed_loop(
        &mut ctl,
        start.to_joints_sample(),
        &goal.to_target_command(),
        3000,
    );
    let last = steps.last().unwrap();
    assert_eq!(last.outcome, Outcome::FinalStateReached);

    let reached = CartesianState::from_command(&last.command).unwrap();
    assert!((reached.position - goal.position).norm() < 1e-5);
    assert!(reached.orientation.angle_to(&goal.orientation) < 1e-5);
    assert!(reached.velocity.norm() < 1e-6);
    assert!(reached.angular_velocity.norm() < 1e-6);
}
