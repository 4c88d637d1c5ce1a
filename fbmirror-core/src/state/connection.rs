//! Device connection lifecycle.

use serde::{Deserialize, Serialize};

// ── DeviceConnectionState ────────────────────────────────────────

/// Whether a device is attached and mirrored.
///
/// ```text
///            deviceFound
///  Waiting ─────────────► Connected ──┐ screen On/Off/Unknown
///    ▲  │                     │       ◄┘ (orthogonal axis)
///    │  └─ waitTimeout ─┐     │ deviceLost
///    └──────────────────┴─────┘
/// ```
///
/// `Disconnected` is only entered on shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeviceConnectionState {
    /// Shut down; no discovery in progress.
    Disconnected,
    /// Looking for a device. Initial state.
    #[default]
    Waiting,
    /// A device answered discovery.
    Connected,
}

impl std::fmt::Display for DeviceConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Waiting => write!(f, "Waiting"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

impl DeviceConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}
