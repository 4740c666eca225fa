//! System-wide constants for the OTG workspace.
//!
//! Single source of truth for capacity limits and timing bounds.

use static_assertions::const_assert;

/// Maximum number of degrees of freedom handled by one session.
pub const MAX_DOF: usize = 64;

/// Default control cycle time [s] (100 Hz).
pub const DEFAULT_CYCLE_TIME: f64 = 0.01;

/// Smallest accepted cycle time [s].
pub const CYCLE_TIME_MIN: f64 = 1.0e-5;

/// Largest accepted cycle time [s].
pub const CYCLE_TIME_MAX: f64 = 1.0;

/// Joint names used when a Cartesian state is expressed as a 6-DOF sample.
pub const CARTESIAN_DOF_NAMES: [&str; 6] = ["x", "y", "z", "rot_x", "rot_y", "rot_z"];

const_assert!(MAX_DOF > 0 && MAX_DOF <= 256);
const_assert!(CARTESIAN_DOF_NAMES.len() <= MAX_DOF);
