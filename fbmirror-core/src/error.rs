//! Error types for the mirroring engine.
//!
//! Every fallible operation returns `Result<T, MirrorError>`. None of the
//! variants is fatal to the engine: the workers turn device errors into
//! disconnect events, failed commands are logged and dropped.

use thiserror::Error;

/// The canonical error type for the mirroring engine.
#[derive(Debug, Error)]
pub enum MirrorError {
    // ── Device Errors ────────────────────────────────────────────
    /// No device is attached to the bridge.
    #[error("no device found")]
    DeviceNotFound,

    /// The bridge ran a command that exited unsuccessfully.
    #[error("bridge command `{command}` failed ({status}): {stderr}")]
    Bridge {
        command: String,
        status: String,
        stderr: String,
    },

    /// The bridge process could not be spawned or its pipes failed.
    #[error("bridge I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Data Errors ──────────────────────────────────────────────
    /// The device reported a geometry that cannot be used.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The device reported a pixel format code we do not know.
    #[error("unsupported pixel format: {0}")]
    UnsupportedPixelFormat(u32),

    /// A frame payload could not be decompressed or was too short.
    #[error("frame decode error: {0}")]
    Decode(String),

    /// Bridge output was not valid UTF-8.
    #[error("invalid utf-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    // ── Runtime Errors ───────────────────────────────────────────
    /// An mpsc channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,

    /// A worker task panicked or was aborted.
    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

// ── Convenient From implementations ──────────────────────────────

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for MirrorError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        MirrorError::ChannelClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = MirrorError::Bridge {
            command: "shell input tap 1 2".into(),
            status: "exit status: 1".into(),
            stderr: "error: device offline".into(),
        };
        let text = e.to_string();
        assert!(text.contains("input tap"));
        assert!(text.contains("device offline"));

        let e = MirrorError::UnsupportedPixelFormat(9);
        assert!(e.to_string().contains('9'));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "adb not found");
        let e: MirrorError = io_err.into();
        assert!(matches!(e, MirrorError::Io(_)));
    }

    #[test]
    fn closed_channel_maps_to_channel_closed() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<u8>();
        drop(rx);
        let e: MirrorError = tx.send(1).unwrap_err().into();
        assert!(matches!(e, MirrorError::ChannelClosed));
    }
}
