//! Device bridge seams.
//!
//! The frame reader and the command executor each reach the device
//! through their own trait, so the two workers never share a connection
//! object:
//!
//! | Trait           | Used by            | Operations                                   |
//! |-----------------|--------------------|----------------------------------------------|
//! | [`FrameSource`] | `capture::reader`  | discovery, geometry probe, frame capture     |
//! | [`DeviceShell`] | `exec`             | shell commands, power key probe, power state |
//!
//! [`adb::AdbBridge`] implements both over the `adb` command-line tool;
//! [`mock::MockBridge`] is a scripted in-memory implementation for tests.

pub mod adb;
pub mod mock;
pub mod types;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::MirrorError;
use crate::input::command::DeviceCommand;

pub use types::{FramebufferDescriptor, OsFamily, PixelFormat, ScreenPowerState};

/// Producer side of the bridge: device discovery and framebuffer capture.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Resolve once a device is attached.
    ///
    /// May wait indefinitely; the reader bounds the call with its own
    /// timeout.
    async fn wait_for_device(&self) -> Result<(), MirrorError>;

    /// Query width, height, pixel format and OS family in one round trip.
    async fn probe_geometry(&self) -> Result<FramebufferDescriptor, MirrorError>;

    /// Capture one frame.
    ///
    /// `Ok(None)` means the device answered without a usable frame. An
    /// `Err` means the transport failed and the connection is gone.
    async fn read_frame(&self) -> Result<Option<Bytes>, MirrorError>;
}

/// Command side of the bridge.
#[async_trait]
pub trait DeviceShell: Send + Sync {
    /// Run one command and return its standard output.
    async fn execute(&self, command: &DeviceCommand) -> Result<String, MirrorError>;

    /// Keycode that toggles screen power on this device model.
    async fn probe_power_key(&self) -> Result<u32, MirrorError>;

    /// Current screen power state.
    async fn screen_power(&self) -> Result<ScreenPowerState, MirrorError>;
}
