//! Engine result codes.
//!
//! Integer values follow the established online trajectory generation
//! library convention: non-negative values are successes, `-1` is the
//! uninitialized sentinel, `-100..=-109` are error conditions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Documented return value of one engine `compute` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ResultCode {
    /// Trajectory computed; final state not reached yet.
    Working = 0,
    /// Final state of motion reached.
    FinalStateReached = 1,
    /// Success code of auxiliary setup calls.
    NoError = 2,
    /// Initialization value; never returned by a completed call.
    Error = -1,
    /// Input values are invalid (NaN, non-positive limits, ...).
    InvalidInputValues = -100,
    /// Synchronization time could not be calculated.
    ExecutionTimeCalculation = -101,
    /// Trajectory could not be synchronized.
    Synchronization = -102,
    /// DOF count of input/output and engine do not match.
    NumberOfDofs = -103,
    /// Phase synchronization requested but impossible.
    NoPhaseSynchronization = -104,
    /// Missing input/output parameters.
    NullPointer = -105,
    /// Execution time exceeds the engine maximum.
    ExecutionTimeTooBig = -106,
    /// User-selected execution time bound exceeded.
    UserTimeOutOfRange = -107,
    /// Target lies outside the position limits.
    PositionalLimits = -108,
    /// Override value or filter time out of range.
    OverrideOutOfRange = -109,
}

impl ResultCode {
    /// Every documented code.
    pub const ALL: [ResultCode; 14] = [
        Self::Working,
        Self::FinalStateReached,
        Self::NoError,
        Self::Error,
        Self::InvalidInputValues,
        Self::ExecutionTimeCalculation,
        Self::Synchronization,
        Self::NumberOfDofs,
        Self::NoPhaseSynchronization,
        Self::NullPointer,
        Self::ExecutionTimeTooBig,
        Self::UserTimeOutOfRange,
        Self::PositionalLimits,
        Self::OverrideOutOfRange,
    ];

    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Map a raw engine value to a documented code.
    pub const fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Working,
            1 => Self::FinalStateReached,
            2 => Self::NoError,
            -1 => Self::Error,
            -100 => Self::InvalidInputValues,
            -101 => Self::ExecutionTimeCalculation,
            -102 => Self::Synchronization,
            -103 => Self::NumberOfDofs,
            -104 => Self::NoPhaseSynchronization,
            -105 => Self::NullPointer,
            -106 => Self::ExecutionTimeTooBig,
            -107 => Self::UserTimeOutOfRange,
            -108 => Self::PositionalLimits,
            -109 => Self::OverrideOutOfRange,
            _ => return None,
        })
    }

    /// Non-negative codes are successes.
    #[inline]
    pub const fn is_success(self) -> bool {
        self.code() >= 0
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}
