//! Cycle controller: one engine step per call.
//!
//! ## Cycle Body
//! 1. State bridge (seed on the first cycle, name resolution always).
//! 2. Hold-current on the seeding cycle of a session without a target yet,
//!    then target injection.
//! 3. Velocity synchronization correction (velocity mode, if enabled).
//! 4. Engine `compute`.
//! 5. Classification. Fatal → `Error`, no feedback, no command.
//! 6. Feedback of the new state into the next input.
//! 7. Projection of the new state into the outgoing command.
//!
//! ## Session State
//! Buffers, the outgoing command and the interpolator's current sample are
//! allocated once in [`CycleController::configure`] and released by
//! [`CycleController::stop`]. A cycle reuses them.

use std::time::Instant;

use otg_common::constraint::{
    ConstraintField, ConstraintSetError, InvalidConstraint, MotionConstraintSet,
};
use otg_common::policy::GenerationMode;
use otg_common::samples::{ConstrainedJointsCommand, JointState, JointsCommand, JointsSample};
use otg_common::state::ControllerState;
use tracing::{debug, error, info, warn};

use crate::bridge::{FeedbackPhase, StateBridge};
use crate::buffer::{DofVec, InputParameters, OutputParameters, feed_back};
use crate::classify::{Outcome, RecoverableKind, classify};
use crate::config::{LoadedConfig, SessionSettings};
use crate::constraints::apply_constraint_set;
use crate::engine::OtgEngine;
use crate::error::{ConfigurationError, CycleError};
use crate::state::{SessionEvent, SessionStateMachine, TransitionResult};
use crate::target::{correct_velocity_synchronization, hold_current, inject_target};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics of the cycle body.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: u64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: u64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: u64,
    /// Running sum for average computation.
    pub sum_cycle_ns: u64,
    /// Running sum of squares for stddev computation.
    pub sum_sq_cycle_ns: u128,
    /// Cycles whose body took longer than the cycle time.
    pub overruns: u64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: u64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            sum_sq_cycle_ns: 0,
            overruns: 0,
        }
    }

    /// Record a cycle duration against its budget. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: u64, budget_ns: u64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
        self.sum_sq_cycle_ns = self
            .sum_sq_cycle_ns
            .saturating_add(u128::from(duration_ns) * u128::from(duration_ns));
        if duration_ns > budget_ns {
            self.overruns += 1;
        }
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> u64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count
        }
    }

    /// Standard deviation of the cycle time [ns].
    pub fn stddev_cycle_ns(&self) -> f64 {
        if self.cycle_count < 2 {
            return 0.0;
        }
        let n = self.cycle_count as f64;
        let mean = self.sum_cycle_ns as f64 / n;
        let variance = self.sum_sq_cycle_ns as f64 / n - mean * mean;
        variance.max(0.0).sqrt()
    }
}

// ─── Session ────────────────────────────────────────────────────────

/// Per-session cycle bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleState {
    /// Raw result of the last engine call (`None` before the first cycle).
    pub last_result: Option<i32>,
    pub phase: FeedbackPhase,
    /// A target command has been received this session.
    pub target_set: bool,
}

/// Result of a successful (non-fatal) cycle.
#[derive(Debug)]
pub struct CycleReport<'a> {
    pub outcome: Outcome,
    /// Raw engine result code.
    pub code: i32,
    /// Next commanded state, addressed by the configured joint names.
    pub command: &'a JointsCommand,
}

/// Read-only view of a session for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct Telemetry<'a> {
    pub state: ControllerState,
    pub mode: GenerationMode,
    pub names: &'a [String],
    pub input: &'a InputParameters,
    pub output: &'a OutputParameters,
    pub last_result: Option<i32>,
    pub current_sample: &'a JointsSample,
    /// Velocity-mode targets before the synchronization correction.
    pub requested_velocity: &'a [f64],
    pub stats: &'a CycleStats,
}

#[derive(Debug)]
struct Session {
    joints: MotionConstraintSet,
    settings: SessionSettings,
    input: InputParameters,
    output: OutputParameters,
    bridge: StateBridge,
    cycle: CycleState,
    last_outcome: Option<Outcome>,
    /// Pre-allocated outgoing command.
    command: JointsCommand,
    /// Interpolator's current kinematic state per joint.
    current_sample: JointsSample,
    /// Target velocities as commanded, before the synchronization correction.
    requested_velocity: DofVec,
    stats: CycleStats,
}

fn validate_constraints(
    joints: &MotionConstraintSet,
    settings: &SessionSettings,
) -> Result<(), ConfigurationError> {
    if joints.is_empty() {
        return Err(ConstraintSetError::Empty.into());
    }
    if !settings.flags.position_limits.requires_limits() {
        return Ok(joints.validate()?);
    }
    match joints.validate_with_position_limits() {
        Err(ConstraintSetError::InvalidConstraint {
            joint,
            source:
                InvalidConstraint::MissingField(ConstraintField::MinPosition | ConstraintField::MaxPosition),
        }) => Err(ConfigurationError::MissingPositionLimits { joint }),
        other => Ok(other?),
    }
}

impl Session {
    fn new(joints: MotionConstraintSet, settings: SessionSettings) -> Result<Self, ConfigurationError> {
        validate_constraints(&joints, &settings)?;

        let dof = joints.len();
        let too_many = |_| ConstraintSetError::TooManyDof {
            dof,
            max: otg_common::consts::MAX_DOF,
        };
        let mut input = InputParameters::new(settings.mode, dof).map_err(too_many)?;
        let output = OutputParameters::new(settings.mode, dof).map_err(too_many)?;
        // The outgoing command fixes the buffer's joint layout.
        let command = JointsCommand::with_names(joints.names().iter().cloned());
        apply_constraint_set(
            &joints,
            &command.names,
            &mut input,
            settings.flags.position_limits.requires_limits(),
        )?;

        Ok(Self {
            current_sample: JointsSample::with_names(command.names.iter().cloned()),
            requested_velocity: input.target_velocity.clone(),
            command,
            joints,
            settings,
            input,
            output,
            bridge: StateBridge::new(),
            cycle: CycleState::default(),
            last_outcome: None,
            stats: CycleStats::new(),
        })
    }

    fn run_cycle<E: OtgEngine + ?Sized>(
        &mut self,
        engine: &E,
        sensor: &JointsSample,
        target: Option<&ConstrainedJointsCommand>,
        cycle_time: f64,
    ) -> Result<(Outcome, i32), CycleError> {
        self.bridge.update(
            self.cycle.phase,
            self.joints.names(),
            sensor,
            &mut self.input,
            &mut self.current_sample,
        )?;

        // A synchronization correction holds for its own cycle only.
        self.input.target_velocity.clone_from(&self.requested_velocity);

        // Joints a partial first command leaves out hold their seeded state.
        if !self.cycle.target_set && self.cycle.phase == FeedbackPhase::Seeding {
            hold_current(&mut self.input);
        }
        let mut violation = None;
        if let Some(command) = target {
            let report = inject_target(&self.joints, command, &self.settings.flags, &mut self.input)?;
            violation = report.limit_violation;
            self.cycle.target_set = true;
        }

        self.requested_velocity.clone_from(&self.input.target_velocity);
        if self.settings.mode == GenerationMode::Velocity && self.settings.velocity_sync_correction {
            self.input.min_synchronization_time = 0.0;
            correct_velocity_synchronization(&mut self.input, cycle_time);
        }

        let code = engine.compute(&self.input, &self.settings.flags, cycle_time, &mut self.output);
        self.cycle.last_result = Some(code);

        let mut outcome = classify(self.settings.mode, code);
        if let Outcome::Fatal(fault) = outcome {
            return Err(CycleError::Engine { fault, code });
        }
        if violation.is_some() && matches!(outcome, Outcome::Working | Outcome::FinalStateReached) {
            outcome = Outcome::Recoverable(RecoverableKind::PositionLimitViolation);
        }

        feed_back(&self.output, &mut self.input);
        self.cycle.phase = FeedbackPhase::Closed;
        self.project();

        if self.last_outcome != Some(outcome) {
            match outcome {
                Outcome::Recoverable(kind) => warn!(?kind, code, "recoverable engine condition"),
                Outcome::FinalStateReached => info!("final state reached"),
                _ => debug!(?outcome, code, "cycle outcome changed"),
            }
            self.last_outcome = Some(outcome);
        }
        Ok((outcome, code))
    }

    /// Copy the new kinematic state into the outgoing command and the
    /// current sample.
    fn project(&mut self) {
        for (i, element) in self.command.elements.iter_mut().enumerate() {
            *element = JointState::new(
                self.output.new_position[i],
                self.output.new_velocity[i],
                self.output.new_acceleration[i],
            );
        }
        self.current_sample.elements.clone_from(&self.command.elements);
    }

    fn telemetry(&self, state: ControllerState) -> Telemetry<'_> {
        Telemetry {
            state,
            mode: self.settings.mode,
            names: self.joints.names(),
            input: &self.input,
            output: &self.output,
            last_result: self.cycle.last_result,
            current_sample: &self.current_sample,
            requested_velocity: &self.requested_velocity,
            stats: &self.stats,
        }
    }
}

// ─── Controller ─────────────────────────────────────────────────────

/// Session-owning cycle controller around an engine.
#[derive(Debug)]
pub struct CycleController<E> {
    engine: E,
    machine: SessionStateMachine,
    session: Option<Session>,
}

impl<E: OtgEngine> CycleController<E> {
    /// New controller in `Unconfigured`.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            machine: SessionStateMachine::new(),
            session: None,
        }
    }

    #[inline]
    pub fn state(&self) -> ControllerState {
        self.machine.state()
    }

    #[inline]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Configure a new session: validate the constraint set, allocate the
    /// buffers and apply the constraints. Only valid while quiescent.
    pub fn configure(
        &mut self,
        joints: MotionConstraintSet,
        settings: SessionSettings,
    ) -> Result<(), ConfigurationError> {
        if !self.machine.is_quiescent() {
            return Err(ConfigurationError::NotQuiescent {
                state: self.machine.state(),
            });
        }
        let session = Session::new(joints, settings).inspect_err(|e| {
            error!(error = %e, "session configuration rejected");
        })?;
        info!(
            dof = session.joints.len(),
            mode = ?settings.mode,
            limits = ?settings.flags.position_limits,
            "session configured"
        );
        self.session = Some(session);
        self.machine.handle_event(SessionEvent::Configure);
        Ok(())
    }

    /// Configure from a loaded task file.
    pub fn configure_from(&mut self, loaded: &LoadedConfig) -> Result<(), ConfigurationError> {
        self.configure(loaded.constraints.clone(), loaded.settings)
    }

    /// Run one cycle.
    ///
    /// `target` replaces the current target when present; `None` keeps the
    /// previous one (or holds the current state if none was ever given).
    pub fn tick(
        &mut self,
        sensor: &JointsSample,
        target: Option<&ConstrainedJointsCommand>,
        cycle_time: f64,
    ) -> Result<CycleReport<'_>, CycleError> {
        let state = self.machine.state();
        if !self.machine.allows_cycle() {
            return Err(CycleError::NotRunning { state });
        }
        if !(cycle_time.is_finite() && cycle_time > 0.0) {
            return Err(CycleError::InvalidCycleTime(cycle_time));
        }
        let Some(session) = self.session.as_mut() else {
            return Err(CycleError::NotRunning { state });
        };
        if state == ControllerState::Configured {
            self.machine.handle_event(SessionEvent::FirstCycle);
        }

        let started = Instant::now();
        let result = session.run_cycle(&self.engine, sensor, target, cycle_time);
        let elapsed = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
        session.stats.record(elapsed, (cycle_time * 1e9) as u64);

        match result {
            Ok((outcome, code)) => Ok(CycleReport {
                outcome,
                code,
                command: &session.command,
            }),
            Err(err) => {
                error!(error = %err, cycle = session.stats.cycle_count, "cycle failed, session halted");
                self.machine.handle_event(SessionEvent::Fault);
                Err(err)
            }
        }
    }

    /// Tear the session down and release its buffers.
    pub fn stop(&mut self) -> TransitionResult {
        let result = self.machine.handle_event(SessionEvent::Stop);
        if let TransitionResult::Ok(_) = result {
            if let Some(session) = self.session.take() {
                info!(
                    cycles = session.stats.cycle_count,
                    avg_ns = session.stats.avg_cycle_ns(),
                    overruns = session.stats.overruns,
                    "session stopped"
                );
            }
        }
        result
    }

    /// Diagnostics view of the session (also available in `Error`).
    pub fn telemetry(&self) -> Option<Telemetry<'_>> {
        let state = self.machine.state();
        self.session.as_ref().map(|s| s.telemetry(state))
    }

    pub fn cycle_state(&self) -> Option<&CycleState> {
        self.session.as_ref().map(|s| &s.cycle)
    }

    /// Interpolator's current state per configured joint.
    pub fn current_sample(&self) -> Option<&JointsSample> {
        self.session.as_ref().map(|s| &s.current_sample)
    }

    pub fn stats(&self) -> Option<&CycleStats> {
        self.session.as_ref().map(|s| &s.stats)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
