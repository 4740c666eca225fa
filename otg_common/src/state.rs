//! Session lifecycle state of the cycle controller.

use serde::{Deserialize, Serialize};

/// Lifecycle: `Unconfigured → Configured → Running → (Error | Stopped)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControllerState {
    /// No session; buffers not allocated.
    #[default]
    Unconfigured = 0,
    /// Buffers allocated and constraints applied; no cycle has run.
    Configured = 1,
    /// At least one cycle has run.
    Running = 2,
    /// A fatal cycle error halted the session; state kept for diagnostics.
    Error = 3,
    /// Session torn down; buffers released.
    Stopped = 4,
}
