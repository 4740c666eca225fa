//! Shared plant and session helpers.

mod cartesian;
mod convergence;
mod feedback;
mod limits;
mod velocity;

use otg_common::constraint::{MotionConstraint, MotionConstraintSet};
use otg_common::policy::{GenerationMode, OtgFlags, PositionLimitsPolicy};
use otg_common::samples::{ConstrainedJointsCommand, JointsCommand, JointsSample};
use otg_control_unit::classify::Outcome;
use otg_control_unit::config::SessionSettings;
use otg_control_unit::cycle::CycleController;
use otg_control_unit::engine::{JerkLimitedEngine, OtgEngine};

pub const DT: f64 = 0.01;

/// `{maxVelocity=1.0, maxAcceleration=2.0, maxJerk=5.0}` with ±10 bounds.
pub fn reference_constraint() -> MotionConstraint {
    MotionConstraint::new(1.0, 2.0, 5.0).with_position_limits(-10.0, 10.0)
}

pub fn constraint_set(names: &[&str], constraint: MotionConstraint) -> MotionConstraintSet {
    let mut set = MotionConstraintSet::new();
    for name in names {
        set.push(*name, constraint).unwrap();
    }
    set
}

pub fn settings(mode: GenerationMode, position_limits: PositionLimitsPolicy) -> SessionSettings {
    SessionSettings {
        mode,
        flags: OtgFlags {
            position_limits,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn controller(
    joints: MotionConstraintSet,
    settings: SessionSettings,
) -> CycleController<JerkLimitedEngine> {
    let mut ctl = CycleController::new(JerkLimitedEngine::new());
    ctl.configure(joints, settings).unwrap();
    ctl
}

/// One cycle's result as owned values.
#[derive(Debug, Clone)]
pub struct Step {
    pub outcome: Outcome,
    pub command: JointsCommand,
}

/// Ideal plant loop: the target is sent on the first cycle only and every
/// command is fed back as the next sensor sample. Stops at the final state
/// or after `max_cycles`.
pub fn run_closed_loop<E: OtgEngine>(
    ctl: &mut CycleController<E>,
    initial: JointsSample,
    target: &ConstrainedJointsCommand,
    max_cycles: usize,
) -> Vec<Step> {
    let mut sensor = initial;
    let mut steps = Vec::new();
    for cycle in 0..max_cycles {
        let report = ctl
            .tick(&sensor, (cycle == 0).then_some(target), DT)
            .unwrap();
        let step = Step {
            outcome: report.outcome,
            command: report.command.clone(),
        };
        sensor.elements.clone_from(&step.command.elements);
        let done = step.outcome.is_final();
        steps.push(step);
        if done {
            break;
        }
    }
    steps
}

pub fn position(command: &JointsCommand, joint: &str) -> f64 {
    command.get(joint).and_then(|s| s.position()).unwrap()
}

pub fn speed(command: &JointsCommand, joint: &str) -> f64 {
    command.get(joint).and_then(|s| s.speed()).unwrap()
}

pub fn acceleration(command: &JointsCommand, joint: &str) -> f64 {
    command.get(joint).and_then(|s| s.acceleration()).unwrap()
}
