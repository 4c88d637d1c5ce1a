//! # fbmirror-core
//!
//! Engine for mirroring an Android device screen over `adb` and relaying
//! touch and key input back to it.
//!
//! This crate contains:
//! - **Device**: `FrameSource` / `DeviceShell` bridge traits, the `adb`
//!   bridge and a scripted mock
//! - **Capture**: `FrameReader` worker with adaptive `DelayState` pacing,
//!   `FrameDecoder` size check and zstd support
//! - **Exec**: `CommandExecutor` worker, strictly ordered commands and
//!   screen power polling
//! - **Input**: `InputTranslator` (tap vs swipe, raw `sendevent`),
//!   `KeyMap`, `DeviceCommand`
//! - **Scene**: `SceneLayout` for scene → device mapping and soft keys
//! - **State**: `MirrorState` connection/power machine
//! - **Coordinator**: spawns the workers and pumps messages
//! - **Error**: `MirrorError`, a typed, `thiserror`-based error hierarchy

pub mod capture;
pub mod coordinator;
pub mod device;
pub mod error;
pub mod exec;
pub mod input;
pub mod scene;
pub mod state;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use capture::{
    DecodedFrame, DelayConfig, DelayState, DisconnectReason, FrameDecoder, FrameReader,
    ReaderConfig, ReaderEvent, ReaderRequest,
};
pub use coordinator::{Coordinator, FrameSink, MirrorConfig, MirrorHandle};
pub use device::adb::{AdbBridge, AdbConfig, KEYCODE_POWER};
pub use device::{
    DeviceShell, FrameSource, FramebufferDescriptor, OsFamily, PixelFormat, ScreenPowerState,
};
pub use error::MirrorError;
pub use exec::{CommandExecutor, ExecutorConfig, ExecutorEvent, ExecutorRequest};
pub use input::{
    DeviceCommand, InputEvent, InputTranslator, KeyMap, PointerGesture, RawEvent,
    TranslatorConfig,
};
pub use scene::{DevicePoint, KEY_BAR_HEIGHT, SceneLayout, ScenePoint, VirtualKey};
pub use state::{DeviceConnectionState, Effect, MirrorEvent, MirrorState, StateConfig, StatusEvent};
