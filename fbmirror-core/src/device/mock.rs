//! Scripted in-memory bridge for tests.
//!
//! Each bridge call pops the next scripted result; when a script runs dry
//! the call falls back to a benign default (device present, default
//! geometry, no frame available). Every executed command is recorded in
//! order so tests can assert exactly what reached the "device".

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use crate::device::{DeviceShell, FrameSource, FramebufferDescriptor, ScreenPowerState};
use crate::error::MirrorError;
use crate::input::command::DeviceCommand;

/// A bridge that records calls instead of talking to a device.
#[derive(Debug)]
pub struct MockBridge {
    /// Results for `wait_for_device`; empty means "device present".
    pub waits: Mutex<VecDeque<Result<(), MirrorError>>>,
    /// When set, `wait_for_device` never resolves.
    pub wait_hangs: AtomicBool,
    /// Results for `probe_geometry`; empty means the default descriptor.
    pub geometries: Mutex<VecDeque<Result<FramebufferDescriptor, MirrorError>>>,
    /// Results for `read_frame`; empty means "no frame available".
    pub frames: Mutex<VecDeque<Result<Option<Bytes>, MirrorError>>>,
    /// Every command passed to `execute`, in order.
    pub executed: Mutex<Vec<DeviceCommand>>,
    /// When set, `execute` fails after recording the command.
    pub fail_commands: AtomicBool,
    /// Returned by `probe_power_key`.
    pub power_key: AtomicU32,
    /// Returned by `screen_power`.
    pub screen: Mutex<ScreenPowerState>,
    /// Number of `read_frame` calls served.
    pub frame_reads: AtomicU32,
}

impl MockBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_wait(&self, result: Result<(), MirrorError>) {
        lock(&self.waits).push_back(result);
    }

    pub fn push_geometry(&self, result: Result<FramebufferDescriptor, MirrorError>) {
        lock(&self.geometries).push_back(result);
    }

    pub fn push_frame(&self, result: Result<Option<Bytes>, MirrorError>) {
        lock(&self.frames).push_back(result);
    }

    pub fn set_screen(&self, state: ScreenPowerState) {
        *lock(&self.screen) = state;
    }

    /// Snapshot of the executed commands.
    pub fn executed(&self) -> Vec<DeviceCommand> {
        lock(&self.executed).clone()
    }

    pub fn frame_reads(&self) -> u32 {
        self.frame_reads.load(Ordering::SeqCst)
    }
}

impl Default for MockBridge {
    fn default() -> Self {
        Self {
            waits: Mutex::default(),
            wait_hangs: AtomicBool::new(false),
            geometries: Mutex::default(),
            frames: Mutex::default(),
            executed: Mutex::default(),
            fail_commands: AtomicBool::new(false),
            power_key: AtomicU32::new(26),
            screen: Mutex::new(ScreenPowerState::On),
            frame_reads: AtomicU32::new(0),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl FrameSource for MockBridge {
    async fn wait_for_device(&self) -> Result<(), MirrorError> {
        if self.wait_hangs.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let next = lock(&self.waits).pop_front();
        next.unwrap_or(Ok(()))
    }

    async fn probe_geometry(&self) -> Result<FramebufferDescriptor, MirrorError> {
        let next = lock(&self.geometries).pop_front();
        next.unwrap_or_else(|| Ok(FramebufferDescriptor::default()))
    }

    async fn read_frame(&self) -> Result<Option<Bytes>, MirrorError> {
        self.frame_reads.fetch_add(1, Ordering::SeqCst);
        let next = lock(&self.frames).pop_front();
        next.unwrap_or(Ok(None))
    }
}

#[async_trait]
impl DeviceShell for MockBridge {
    async fn execute(&self, command: &DeviceCommand) -> Result<String, MirrorError> {
        lock(&self.executed).push(command.clone());
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(MirrorError::Bridge {
                command: command.to_string(),
                status: "exit status: 1".into(),
                stderr: "mock failure".into(),
            });
        }
        Ok(String::new())
    }

    async fn probe_power_key(&self) -> Result<u32, MirrorError> {
        Ok(self.power_key.load(Ordering::SeqCst))
    }

    async fn screen_power(&self) -> Result<ScreenPowerState, MirrorError> {
        Ok(*lock(&self.screen))
    }
}
