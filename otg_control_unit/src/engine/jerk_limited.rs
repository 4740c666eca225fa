//! Reference jerk-limited engine.
//!
//! Each selected DOF follows its own time-optimal profile under velocity,
//! acceleration and jerk limits. A step picks the largest next acceleration
//! reachable with bounded jerk from which the DOF can still come to rest at
//! the target (position mode) or settle on the target velocity (velocity
//! mode) without violating a limit. The candidate is found by bisection over
//! the reachable acceleration interval.
//!
//! With position limits in force the new position never leaves the bounds.
//! Under the report-only policy a DOF whose target lies outside them brakes
//! to a hold inside instead of following the target.
//!
//! Limitations:
//! - DOFs are not time-synchronized; `synchronization_time` is the largest
//!   per-DOF execution time estimate.
//! - Position mode always settles at rest; a non-zero target velocity is
//!   validated but not tracked.
//! - The override value is reported, not applied.

use otg_common::policy::{GenerationMode, OtgFlags, PositionLimitsPolicy, SyncBehavior};
use otg_common::result::ResultCode;

use crate::buffer::{InputParameters, ModeInput, ModeOutput, OutputFlags, OutputParameters};
use crate::engine::OtgEngine;

/// A DOF within this distance of its target counts as arrived [unit].
pub const POSITION_TOLERANCE: f64 = 1e-6;
/// A DOF within this speed of its target velocity counts as arrived [unit/s].
pub const VELOCITY_TOLERANCE: f64 = 1e-6;
const ACCELERATION_TOLERANCE: f64 = 1e-4;
const FEASIBILITY_SLACK: f64 = 1e-9;
const BISECTION_STEPS: usize = 40;

/// Per-DOF reference engine. Stateless; every call replans from the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct JerkLimitedEngine;

impl JerkLimitedEngine {
    pub const fn new() -> Self {
        Self
    }
}

// ─── Kinematics ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
struct Kinematics {
    p: f64,
    v: f64,
    a: f64,
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    velocity: f64,
    acceleration: f64,
    jerk: f64,
}

/// Constant-jerk motion over `t`.
#[inline]
fn advance(k: Kinematics, jerk: f64, t: f64) -> Kinematics {
    Kinematics {
        p: k.p + k.v * t + k.a * t * t / 2.0 + jerk * t * t * t / 6.0,
        v: k.v + k.a * t + jerk * t * t / 2.0,
        a: k.a + jerk * t,
    }
}

#[inline]
fn direction(x: f64) -> f64 {
    if x >= 0.0 { 1.0 } else { -1.0 }
}

/// Position where a DOF comes to rest when braking from `current` right away.
fn stopping_point(current: Kinematics, lim: &Limits) -> f64 {
    if current.v.abs() <= VELOCITY_TOLERANCE {
        return current.p;
    }
    let dir = direction(current.v);
    current.p + dir * stopping_distance(dir * current.v, dir * current.a, lim)
}

/// Distance covered while braking from `(v, a)` to rest, `v >= 0` along the
/// direction of travel.
fn stopping_distance(v: f64, a: f64, lim: &Limits) -> f64 {
    let j = lim.jerk;
    let start = Kinematics { p: 0.0, v, a };

    // Releasing the current deceleration alone already stops the motion.
    if a < 0.0 && v <= a * a / (2.0 * j) {
        return advance(start, j, -a / j).p;
    }

    // Velocity after ramping the acceleration to zero.
    let w = v + a * a / (2.0 * j);
    let peak = (w * j).sqrt();
    let (peak, hold) = if peak <= lim.acceleration {
        (peak, 0.0)
    } else {
        let amax = lim.acceleration;
        (amax, ((w - amax * amax / j) / amax).max(0.0))
    };

    let k = advance(start, -j, ((a + peak) / j).max(0.0));
    let k = advance(k, 0.0, hold);
    advance(k, j, peak / j).p
}

/// Accelerations reachable within one cycle: `[lo, hi]`.
fn reachable(a: f64, lim: &Limits, dt: f64) -> (f64, f64) {
    let lo = (a - lim.jerk * dt).max(-lim.acceleration);
    let hi = (a + lim.jerk * dt).min(lim.acceleration);
    if lo > hi {
        // Current acceleration lies outside the limit: move back toward it.
        let forced = if a > 0.0 { lo } else { hi };
        (forced, forced)
    } else {
        (lo, hi)
    }
}

/// Largest `a` in `[lo, hi]` satisfying the monotone predicate, or `lo` if
/// none does.
fn largest_feasible(lo: f64, hi: f64, feasible: impl Fn(f64) -> bool) -> f64 {
    if feasible(hi) {
        return hi;
    }
    if !feasible(lo) {
        return lo;
    }
    let (mut ok, mut bad) = (lo, hi);
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (ok + bad);
        if feasible(mid) {
            ok = mid;
        } else {
            bad = mid;
        }
    }
    ok
}

/// Time of a rest-to-rest profile over `distance` (estimate below the
/// cruise distance).
fn rest_to_rest_time(distance: f64, lim: &Limits) -> f64 {
    if distance <= POSITION_TOLERANCE {
        return 0.0;
    }
    let acc = lim.acceleration.min((lim.velocity * lim.jerk).sqrt());
    let ramp = lim.velocity / acc + acc / lim.jerk;
    let cruise_distance = lim.velocity * ramp;
    if distance >= cruise_distance {
        distance / lim.velocity + ramp
    } else {
        2.0 * ramp * (distance / cruise_distance).sqrt()
    }
}

/// Time to change velocity by `gap` from zero acceleration.
fn velocity_change_time(gap: f64, lim: &Limits) -> f64 {
    if gap <= VELOCITY_TOLERANCE {
        return 0.0;
    }
    let amax = lim.acceleration;
    if gap >= amax * amax / lim.jerk {
        gap / amax + amax / lim.jerk
    } else {
        2.0 * (gap / lim.jerk).sqrt()
    }
}

// ─── Per-DOF steps ──────────────────────────────────────────────────

/// One position-mode step in travel coordinates (`p = 0`, target at
/// `distance >= 0`). Returns the next state and whether the target is reached.
fn position_step(k: Kinematics, distance: f64, lim: &Limits, dt: f64) -> (Kinematics, bool) {
    let (lo, hi) = reachable(k.a, lim, dt);
    let feasible = |a_next: f64| {
        let s = advance(k, (a_next - k.a) / dt, dt);
        if s.v < 0.0 {
            // Moving away from the target: any push back is admissible.
            return true;
        }
        let peak_v = if a_next > 0.0 {
            s.v + a_next * a_next / (2.0 * lim.jerk)
        } else {
            s.v
        };
        peak_v <= lim.velocity + FEASIBILITY_SLACK
            && s.p + stopping_distance(s.v, s.a, lim) <= distance + FEASIBILITY_SLACK
    };
    let a_next = largest_feasible(lo, hi, feasible);
    let mut next = advance(k, (a_next - k.a) / dt, dt);

    // Braking never reverses the direction of travel.
    if k.v >= 0.0 && next.v < 0.0 {
        next.v = 0.0;
        next.a = 0.0;
        next.p = next.p.max(k.p);
    }

    (next, next.p >= distance - POSITION_TOLERANCE)
}

/// Advance one DOF toward `target` in world coordinates.
fn step_toward_position(
    current: Kinematics,
    target: f64,
    lim: &Limits,
    dt: f64,
) -> (Kinematics, bool) {
    let delta = target - current.p;
    let at_rest = current.v.abs() <= VELOCITY_TOLERANCE && current.a.abs() <= ACCELERATION_TOLERANCE;
    if delta.abs() <= POSITION_TOLERANCE && at_rest {
        return (
            Kinematics {
                p: target,
                v: 0.0,
                a: 0.0,
            },
            true,
        );
    }

    let dir = direction(delta);
    let travel = Kinematics {
        p: 0.0,
        v: dir * current.v,
        a: dir * current.a,
    };
    let (next, reached) = position_step(travel, delta.abs(), lim, dt);
    if reached {
        (
            Kinematics {
                p: target,
                v: 0.0,
                a: 0.0,
            },
            true,
        )
    } else {
        (
            Kinematics {
                p: current.p + dir * next.p,
                v: dir * next.v,
                a: dir * next.a,
            },
            false,
        )
    }
}

/// Advance one DOF toward `target_velocity`.
fn step_toward_velocity(
    current: Kinematics,
    target_velocity: f64,
    lim: &Limits,
    dt: f64,
) -> (Kinematics, bool) {
    let gap = target_velocity - current.v;
    if gap.abs() <= VELOCITY_TOLERANCE && current.a.abs() <= ACCELERATION_TOLERANCE {
        let cruise = Kinematics {
            v: target_velocity,
            a: 0.0,
            ..current
        };
        return (advance(cruise, 0.0, dt), true);
    }

    let dir = direction(gap);
    let remaining = gap.abs();
    let alpha = dir * current.a;
    let (lo, hi) = reachable(alpha, lim, dt);
    let feasible = |alpha_next: f64| {
        let left = remaining - 0.5 * (alpha + alpha_next) * dt;
        let release = if alpha_next > 0.0 {
            alpha_next * alpha_next / (2.0 * lim.jerk)
        } else {
            0.0
        };
        release <= left + FEASIBILITY_SLACK
    };
    let alpha_next = largest_feasible(lo, hi, feasible);
    let mut next = advance(current, dir * (alpha_next - alpha) / dt, dt);

    let reached = dir * (target_velocity - next.v) <= VELOCITY_TOLERANCE;
    if reached {
        next.v = target_velocity;
        next.a = 0.0;
    }
    (next, reached)
}

// ─── Validation ─────────────────────────────────────────────────────

#[inline]
fn positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

fn check_shapes(input: &InputParameters, output: &OutputParameters) -> Result<(), ResultCode> {
    if input.dof() != output.dof() || !input.is_consistent() || !output.is_consistent() {
        return Err(ResultCode::NumberOfDofs);
    }
    if input.generation_mode() != output.generation_mode() {
        return Err(ResultCode::NullPointer);
    }
    Ok(())
}

fn check_values(input: &InputParameters, flags: &OtgFlags, dt: f64) -> Result<(), ResultCode> {
    if !positive(dt) {
        return Err(ResultCode::InvalidInputValues);
    }
    for i in (0..input.dof()).filter(|i| input.selection[*i]) {
        let valid = input.current_position[i].is_finite()
            && input.current_velocity[i].is_finite()
            && input.current_acceleration[i].is_finite()
            && positive(input.max_acceleration[i])
            && positive(input.max_jerk[i])
            && input.target_velocity[i].is_finite();
        let mode_valid = match &input.mode {
            ModeInput::Position {
                max_velocity,
                target_position,
            } => positive(max_velocity[i]) && target_position[i].is_finite(),
            ModeInput::Velocity => true,
        };
        let bounds_valid = !flags.position_limits.requires_limits()
            || (input.min_position[i].is_finite()
                && input.max_position[i].is_finite()
                && input.min_position[i] < input.max_position[i]);
        if !(valid && mode_valid && bounds_valid) {
            return Err(ResultCode::InvalidInputValues);
        }
    }
    Ok(())
}

// ─── Engine ─────────────────────────────────────────────────────────

/// Per-call summary shared by both modes.
#[derive(Default)]
struct StepSummary {
    all_reached: bool,
    moving: usize,
    limit_violation: bool,
}

impl JerkLimitedEngine {
    fn compute_position(
        input: &InputParameters,
        flags: &OtgFlags,
        dt: f64,
        output: &mut OutputParameters,
    ) -> StepSummary {
        let mut summary = StepSummary {
            all_reached: true,
            ..Default::default()
        };
        let mut exceeds = false;
        let (Some(max_velocity), Some(target_position)) =
            (input.max_velocity(), input.target_position())
        else {
            return summary;
        };

        for i in 0..input.dof() {
            let current = Kinematics {
                p: input.current_position[i],
                v: input.current_velocity[i],
                a: input.current_acceleration[i],
            };
            if !input.selection[i] {
                write_state(output, i, current);
                output.execution_times[i] = 0.0;
                continue;
            }
            let lim = Limits {
                velocity: max_velocity[i],
                acceleration: input.max_acceleration[i],
                jerk: input.max_jerk[i],
            };

            let mut target = target_position[i];
            let bounds = flags
                .position_limits
                .requires_limits()
                .then(|| (input.min_position[i], input.max_position[i]));
            if let Some((min, max)) = bounds {
                let outside = target < min || target > max;
                match flags.position_limits {
                    PositionLimitsPolicy::ActivelyPrevent => target = target.clamp(min, max),
                    // Reported, never followed: brake to a hold inside the bounds.
                    PositionLimitsPolicy::ErrorMsgOnly if outside => {
                        summary.limit_violation = true;
                        target = stopping_point(current, &lim).clamp(min, max);
                    }
                    _ => {}
                }
            }

            let (mut next, reached) = step_toward_position(current, target, &lim, dt);
            if let Some((min, max)) = bounds {
                if next.p < min || next.p > max {
                    next = Kinematics {
                        p: next.p.clamp(min, max),
                        v: 0.0,
                        a: 0.0,
                    };
                }
            }
            write_state(output, i, next);
            summary.all_reached &= reached;

            if reached {
                output.execution_times[i] = 0.0;
            } else {
                summary.moving += 1;
                let remaining = target - next.p;
                let dir = direction(remaining);
                let v = dir * next.v;
                if v > 0.0 {
                    exceeds |= stopping_distance(v, dir * next.a, &lim)
                        > remaining.abs() + POSITION_TOLERANCE;
                }
                output.execution_times[i] = rest_to_rest_time(remaining.abs(), &lim);
            }
        }

        output.mode = ModeOutput::Position {
            exceeds_target_position: exceeds,
        };
        summary
    }

    fn compute_velocity(
        input: &InputParameters,
        flags: &OtgFlags,
        dt: f64,
        output: &mut OutputParameters,
    ) -> StepSummary {
        let mut summary = StepSummary {
            all_reached: true,
            ..Default::default()
        };

        for i in 0..input.dof() {
            let current = Kinematics {
                p: input.current_position[i],
                v: input.current_velocity[i],
                a: input.current_acceleration[i],
            };
            let mut settle_at = current.p;
            if !input.selection[i] {
                write_state(output, i, current);
                output.execution_times[i] = 0.0;
                set_position_at_target_velocity(output, i, settle_at);
                continue;
            }
            let lim = Limits {
                velocity: f64::INFINITY,
                acceleration: input.max_acceleration[i],
                jerk: input.max_jerk[i],
            };
            let bounds = flags
                .position_limits
                .requires_limits()
                .then(|| (input.min_position[i], input.max_position[i]));

            let mut target_velocity = input.target_velocity[i];
            let mut guarded = false;
            if let Some((min, max)) = bounds {
                let requested = target_velocity;
                target_velocity = guard_bound(current, requested, min, max, &lim, dt);
                guarded = target_velocity != requested;
            }

            let (mut next, reached) = step_toward_velocity(current, target_velocity, &lim, dt);
            if let Some((min, max)) = bounds {
                let outside = next.p < min || next.p > max;
                if outside {
                    next = Kinematics {
                        p: next.p.clamp(min, max),
                        v: 0.0,
                        a: 0.0,
                    };
                }
                if flags.position_limits == PositionLimitsPolicy::ErrorMsgOnly {
                    summary.limit_violation |= outside || guarded;
                }
            }
            write_state(output, i, next);
            summary.all_reached &= reached;

            let gap = (target_velocity - next.v).abs();
            output.execution_times[i] = velocity_change_time(gap, &lim);
            if !reached {
                summary.moving += 1;
                let release = next.a.abs() / lim.jerk;
                settle_at = advance(next, -direction(next.a) * lim.jerk, release).p;
            } else {
                settle_at = next.p;
            }
            set_position_at_target_velocity(output, i, settle_at);
        }
        summary
    }
}

/// Zero the target velocity of a DOF that cannot otherwise stop before the
/// bound it is heading for.
fn guard_bound(
    current: Kinematics,
    target_velocity: f64,
    min: f64,
    max: f64,
    lim: &Limits,
    dt: f64,
) -> f64 {
    let heading = if current.v.abs() > VELOCITY_TOLERANCE {
        direction(current.v)
    } else {
        direction(target_velocity)
    };
    if heading * target_velocity <= 0.0 {
        return target_velocity;
    }
    let room = if heading > 0.0 {
        max - current.p
    } else {
        current.p - min
    };
    // Worst case: one more cycle of full jerk toward the bound, then brake.
    let travel = Kinematics {
        p: 0.0,
        v: (heading * current.v).max(0.0),
        a: heading * current.a,
    };
    let probe = advance(travel, lim.jerk, dt);
    let brake = probe.p + stopping_distance(probe.v.max(0.0), probe.a, lim);
    if room <= brake + POSITION_TOLERANCE {
        0.0
    } else {
        target_velocity
    }
}

#[inline]
fn write_state(output: &mut OutputParameters, i: usize, k: Kinematics) {
    output.new_position[i] = k.p;
    output.new_velocity[i] = k.v;
    output.new_acceleration[i] = k.a;
}

#[inline]
fn set_position_at_target_velocity(output: &mut OutputParameters, i: usize, p: f64) {
    if let ModeOutput::Velocity {
        position_at_target_velocity,
    } = &mut output.mode
    {
        position_at_target_velocity[i] = p;
    }
}

impl OtgEngine for JerkLimitedEngine {
    fn compute(
        &self,
        input: &InputParameters,
        flags: &OtgFlags,
        cycle_time: f64,
        output: &mut OutputParameters,
    ) -> i32 {
        if let Err(code) = check_shapes(input, output).and_then(|_| check_values(input, flags, cycle_time)) {
            return code.code();
        }

        let summary = match input.generation_mode() {
            GenerationMode::Position => Self::compute_position(input, flags, cycle_time, output),
            GenerationMode::Velocity => Self::compute_velocity(input, flags, cycle_time, output),
        };

        let greatest = (0..input.dof())
            .filter(|i| input.selection[*i])
            .max_by(|a, b| output.execution_times[*a].total_cmp(&output.execution_times[*b]));
        let longest = greatest.map_or(0.0, |i| output.execution_times[i]);
        output.dof_with_greatest_execution_time = greatest;
        output.synchronization_time = longest.max(input.min_synchronization_time);
        output.current_override_value = input.override_value;

        let mut out_flags = OutputFlags::RECALCULATED;
        if summary.moving <= 1 {
            out_flags |= OutputFlags::PHASE_SYNCHRONIZED;
        }
        output.flags = out_flags;

        let code = if summary.limit_violation {
            ResultCode::PositionalLimits
        } else if !(0.0..=1.0).contains(&input.override_value) {
            ResultCode::OverrideOutOfRange
        } else if flags.synchronization == SyncBehavior::OnlyPhaseSynchronization
            && summary.moving > 1
        {
            ResultCode::NoPhaseSynchronization
        } else if summary.all_reached {
            ResultCode::FinalStateReached
        } else {
            ResultCode::Working
        };
        code.code()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
