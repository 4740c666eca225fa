//! Trajectory engine seam.
//!
//! The controller drives any [`OtgEngine`]; [`JerkLimitedEngine`] is the
//! reference implementation shipped with the crate.

pub mod jerk_limited;

pub use jerk_limited::JerkLimitedEngine;

use otg_common::policy::OtgFlags;

use crate::buffer::{InputParameters, OutputParameters};

/// One-step online trajectory generator.
///
/// `compute` reads the current state, limits and target from `input`,
/// advances the trajectory by `cycle_time` seconds and writes the next state
/// into `output`. The return value is a
/// [`ResultCode`](otg_common::result::ResultCode) integer; any other value is
/// treated as an unknown fatal code by the controller.
pub trait OtgEngine {
    fn compute(
        &self,
        input: &InputParameters,
        flags: &OtgFlags,
        cycle_time: f64,
        output: &mut OutputParameters,
    ) -> i32;
}

impl<E: OtgEngine + ?Sized> OtgEngine for &E {
    #[inline]
    fn compute(
        &self,
        input: &InputParameters,
        flags: &OtgFlags,
        cycle_time: f64,
        output: &mut OutputParameters,
    ) -> i32 {
        (**self).compute(input, flags, cycle_time, output)
    }
}

impl<E: OtgEngine + ?Sized> OtgEngine for Box<E> {
    #[inline]
    fn compute(
        &self,
        input: &InputParameters,
        flags: &OtgFlags,
        cycle_time: f64,
        output: &mut OutputParameters,
    ) -> i32 {
        (**self).compute(input, flags, cycle_time, output)
    }
}
