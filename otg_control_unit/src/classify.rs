//! Engine result classification.
//!
//! Maps the raw integer returned by [`OtgEngine::compute`](crate::engine::OtgEngine::compute)
//! to an [`Outcome`]. The mapping is a static table per generation mode; the
//! two tables only differ for `Synchronization` (-102), which velocity-based
//! generation tolerates.

use otg_common::policy::GenerationMode;
use otg_common::result::ResultCode;
use thiserror::Error;

/// Recoverable conditions: the cycle still produced a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoverableKind {
    /// Target outside the position limits under the report-only policy.
    PositionLimitViolation,
    NoPhaseSynchronization,
    Synchronization,
    OverrideOutOfRange,
}

/// Fatal conditions: the session moves to `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum FatalKind {
    #[error("engine not initialized")]
    Uninitialized,
    #[error("invalid input values")]
    InvalidInputValues,
    #[error("execution time calculation failed")]
    ExecutionTimeCalculation,
    #[error("synchronization failed")]
    Synchronization,
    #[error("DOF count mismatch")]
    NumberOfDofs,
    #[error("missing input or output parameters")]
    NullPointer,
    #[error("execution time too big")]
    ExecutionTimeTooBig,
    #[error("user time out of range")]
    UserTimeOutOfRange,
    #[error("unknown result code {0}")]
    Unknown(i32),
}

/// Classified result of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Working,
    FinalStateReached,
    Recoverable(RecoverableKind),
    Fatal(FatalKind),
}

impl Outcome {
    #[inline]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    #[inline]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::FinalStateReached)
    }
}

use Outcome::{Fatal, FinalStateReached, Recoverable, Working};

/// Position-based generation.
const POSITION_TABLE: [(ResultCode, Outcome); 14] = [
    (ResultCode::Working, Working),
    (ResultCode::FinalStateReached, FinalStateReached),
    (ResultCode::NoError, Working),
    (ResultCode::Error, Fatal(FatalKind::Uninitialized)),
    (ResultCode::InvalidInputValues, Fatal(FatalKind::InvalidInputValues)),
    (ResultCode::ExecutionTimeCalculation, Fatal(FatalKind::ExecutionTimeCalculation)),
    (ResultCode::Synchronization, Fatal(FatalKind::Synchronization)),
    (ResultCode::NumberOfDofs, Fatal(FatalKind::NumberOfDofs)),
    (ResultCode::NoPhaseSynchronization, Recoverable(RecoverableKind::NoPhaseSynchronization)),
    (ResultCode::NullPointer, Fatal(FatalKind::NullPointer)),
    (ResultCode::ExecutionTimeTooBig, Fatal(FatalKind::ExecutionTimeTooBig)),
    (ResultCode::UserTimeOutOfRange, Fatal(FatalKind::UserTimeOutOfRange)),
    (ResultCode::PositionalLimits, Recoverable(RecoverableKind::PositionLimitViolation)),
    (ResultCode::OverrideOutOfRange, Recoverable(RecoverableKind::OverrideOutOfRange)),
];

/// Velocity-based generation.
const VELOCITY_TABLE: [(ResultCode, Outcome); 14] = [
    (ResultCode::Working, Working),
    (ResultCode::FinalStateReached, FinalStateReached),
    (ResultCode::NoError, Working),
    (ResultCode::Error, Fatal(FatalKind::Uninitialized)),
    (ResultCode::InvalidInputValues, Fatal(FatalKind::InvalidInputValues)),
    (ResultCode::ExecutionTimeCalculation, Fatal(FatalKind::ExecutionTimeCalculation)),
    (ResultCode::Synchronization, Recoverable(RecoverableKind::Synchronization)),
    (ResultCode::NumberOfDofs, Fatal(FatalKind::NumberOfDofs)),
    (ResultCode::NoPhaseSynchronization, Recoverable(RecoverableKind::NoPhaseSynchronization)),
    (ResultCode::NullPointer, Fatal(FatalKind::NullPointer)),
    (ResultCode::ExecutionTimeTooBig, Fatal(FatalKind::ExecutionTimeTooBig)),
    (ResultCode::UserTimeOutOfRange, Fatal(FatalKind::UserTimeOutOfRange)),
    (ResultCode::PositionalLimits, Recoverable(RecoverableKind::PositionLimitViolation)),
    (ResultCode::OverrideOutOfRange, Recoverable(RecoverableKind::OverrideOutOfRange)),
];

const fn table(mode: GenerationMode) -> &'static [(ResultCode, Outcome); 14] {
    match mode {
        GenerationMode::Position => &POSITION_TABLE,
        GenerationMode::Velocity => &VELOCITY_TABLE,
    }
}

/// Classify a raw engine result. Codes outside the documented set are fatal.
pub fn classify(mode: GenerationMode, code: i32) -> Outcome {
    let Some(known) = ResultCode::from_code(code) else {
        return Fatal(FatalKind::Unknown(code));
    };
    table(mode)
        .iter()
        .find(|(c, _)| *c == known)
        .map(|(_, outcome)| *outcome)
        .unwrap_or(Fatal(FatalKind::Unknown(code)))
}

// ─── Tests ──────────────────────────────────────────────────────────
