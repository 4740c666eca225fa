//! OTG Common Library
//!
//! Shared value types for the online trajectory generation workspace:
//! per-joint motion constraints, name-addressed joint samples and commands,
//! Cartesian state conversions, engine result codes, session policies and
//! the TOML task configuration.
//!
//! # Module Structure
//!
//! - [`constraint`] - `MotionConstraint` and the named `MotionConstraintSet`
//! - [`samples`] - joint states, sensor samples and joint commands
//! - [`cartesian`] - Cartesian state ↔ 6-DOF joint sample conversions
//! - [`result`] - engine result code table
//! - [`policy`] - generation mode, position-limit and synchronization policies
//! - [`state`] - controller lifecycle state
//! - [`config`] - configuration loading trait and errors
//! - [`task_config`] - TOML task configuration
//! - [`prelude`] - common re-exports
//!
//! # Usage
//!
//! ```rust
//! use otg_common::prelude::*;
//!
//! let mut set = MotionConstraintSet::new();
//! set.push("j1", MotionConstraint::new(1.0, 2.0, 5.0)).unwrap();
//! assert_eq!(set.name_to_index("j1").unwrap(), 0);
//! ```

pub mod cartesian;
pub mod config;
pub mod constraint;
pub mod consts;
pub mod policy;
pub mod prelude;
pub mod result;
pub mod samples;
pub mod state;
pub mod task_config;
