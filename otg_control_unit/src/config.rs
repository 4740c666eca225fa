//! Session configuration: task file → constraint set + session settings.
//!
//! Loading follows two steps: parse the TOML task file, then validate it and
//! build the constraint set. Any failure surfaces as a
//! [`ConfigurationError`], before a single cycle has run.

use std::path::Path;

use otg_common::config::ConfigLoader;
use otg_common::constraint::MotionConstraintSet;
use otg_common::policy::{GenerationMode, OtgFlags};
use otg_common::task_config::TaskConfig;

use crate::error::ConfigurationError;

/// Per-session settings, fixed at configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub mode: GenerationMode,
    pub flags: OtgFlags,
    /// Apply the velocity-mode synchronization correction every cycle.
    pub velocity_sync_correction: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            mode: GenerationMode::Position,
            flags: OtgFlags::default(),
            velocity_sync_correction: true,
        }
    }
}

impl SessionSettings {
    pub fn from_task(task: &TaskConfig) -> Self {
        Self {
            mode: task.mode,
            flags: task.flags(),
            velocity_sync_correction: task.velocity_sync_correction,
        }
    }
}

/// Fully validated configuration ready for
/// [`CycleController::configure`](crate::cycle::CycleController::configure).
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub task: TaskConfig,
    pub constraints: MotionConstraintSet,
    pub settings: SessionSettings,
}

impl LoadedConfig {
    fn from_task(task: TaskConfig) -> Result<Self, ConfigurationError> {
        task.validate()?;
        let constraints = task.constraint_set()?;
        let settings = SessionSettings::from_task(&task);
        Ok(Self {
            task,
            constraints,
            settings,
        })
    }

    /// Cycle time configured for the task [s].
    #[inline]
    pub fn cycle_time(&self) -> f64 {
        self.task.cycle_time
    }
}

/// Load and validate a task file.
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigurationError> {
    LoadedConfig::from_task(TaskConfig::load(path)?)
}

/// Load and validate a task from TOML text.
pub fn load_config_from_str(content: &str) -> Result<LoadedConfig, ConfigurationError> {
    LoadedConfig::from_task(TaskConfig::from_toml(content)?)
}
