//! # OTG Control Unit Library
//!
//! Per-cycle controller around an online trajectory generation engine.
//! Every call to [`CycleController::tick`](cycle::CycleController::tick)
//! takes a sensor sample and an optional target, advances the engine by one
//! fixed cycle and emits the next commanded kinematic state.
//!
//! ## Cycle Order
//!
//! 1. **State Bridge**: seed the current state from the sensor (first cycle
//!    only, afterwards the previous output is fed back).
//! 2. **Target Injector**: map the target command into the input buffer,
//!    applying per-command constraint overrides and the limit policy.
//! 3. **Engine**: one `compute` step ([`engine::OtgEngine`]).
//! 4. **Classifier**: map the engine result code to an [`Outcome`](classify::Outcome).
//! 5. **Feedback / Projection**: copy the new state into the next input and
//!    into the outgoing joint command.
//!
//! ## Zero-Allocation Cycle
//!
//! Parameter buffers are `heapless` vectors sized once per session and the
//! outgoing command is pre-allocated at configuration. A cycle only allocates
//! on its error path.

pub mod bridge;
pub mod buffer;
pub mod classify;
pub mod config;
pub mod constraints;
pub mod cycle;
pub mod debug;
pub mod engine;
pub mod error;
pub mod state;
pub mod target;

pub use cycle::{CycleController, CycleReport};
pub use engine::{JerkLimitedEngine, OtgEngine};
pub use error::{ConfigurationError, CycleError};
