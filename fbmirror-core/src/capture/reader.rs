//! Adaptive frame reader.
//!
//! Runs on its own Tokio task and owns the capture cadence:
//!
//! 1. The coordinator sends one [`ReaderRequest`] at a time.
//! 2. The reader performs the matching [`FrameSource`] call.
//! 3. The outcome goes back as a [`ReaderEvent`].
//!
//! Requests are handled strictly in order, so a feedback request sent
//! before `ReadFrame` always shapes the delay of that read. The reader
//! stops once the request channel is closed and drained.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capture::delay::{DelayConfig, DelayState};
use crate::device::{FrameSource, FramebufferDescriptor};
use crate::error::MirrorError;

// ── ReaderConfig ─────────────────────────────────────────────────

/// Configuration for [`FrameReader`].
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Upper bound on one device discovery attempt.
    pub wait_timeout: Duration,
    /// Pacing tiers.
    pub delay: DelayConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(3),
            delay: DelayConfig::default(),
        }
    }
}

// ── Messages ─────────────────────────────────────────────────────

/// Work for the reader, sent by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderRequest {
    /// Look for a device, bounded by `wait_timeout`.
    WaitForDevice,
    /// Query the remote framebuffer geometry.
    ProbeGeometry,
    /// Sleep the current delay, then capture one frame.
    ReadFrame,
    /// The last frame decoded cleanly.
    FrameAccepted,
    /// The last frame could not be used.
    FrameRejected,
    /// User input happened; poll fast again.
    ResetDelay,
}

/// Why the device is considered gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisconnectReason {
    /// Discovery did not find a device in time.
    WaitTimeout,
    /// The bridge failed while talking to a device.
    DeviceLost,
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitTimeout => write!(f, "wait timeout"),
            Self::DeviceLost => write!(f, "device lost"),
        }
    }
}

/// Outcomes reported back to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    DeviceFound,
    Disconnected(DisconnectReason),
    GeometryFound(FramebufferDescriptor),
    Frame(Bytes),
    /// The capture step produced nothing; the delay has been raised.
    FrameFailed,
    /// The delay just entered its normal (slowest) tier.
    DelayNormal,
}

// ── FrameReader ──────────────────────────────────────────────────

/// Producer side of the mirror.
pub struct FrameReader {
    source: Arc<dyn FrameSource>,
    config: ReaderConfig,
    delay: DelayState,
    events: UnboundedSender<ReaderEvent>,
}

impl FrameReader {
    pub fn new(
        source: Arc<dyn FrameSource>,
        config: ReaderConfig,
        events: UnboundedSender<ReaderEvent>,
    ) -> Self {
        let delay = DelayState::new(config.delay);
        Self {
            source,
            config,
            delay,
            events,
        }
    }

    /// Spawn the request loop on the Tokio runtime.
    pub fn spawn(self, requests: UnboundedReceiver<ReaderRequest>) -> JoinHandle<()> {
        tokio::spawn(self.run(requests))
    }

    /// Serve requests until the channel closes or nobody listens anymore.
    pub async fn run(mut self, mut requests: UnboundedReceiver<ReaderRequest>) {
        while let Some(request) = requests.recv().await {
            if let Err(e) = self.handle(request).await {
                debug!("frame reader stopping: {e}");
                break;
            }
        }
        debug!("frame reader stopped");
    }

    /// Current pacing state.
    pub fn delay(&self) -> &DelayState {
        &self.delay
    }

    /// Handle one request. Only a closed event channel is an error.
    pub async fn handle(&mut self, request: ReaderRequest) -> Result<(), MirrorError> {
        match request {
            ReaderRequest::WaitForDevice => self.wait_for_device().await,
            ReaderRequest::ProbeGeometry => self.probe_geometry().await,
            ReaderRequest::ReadFrame => self.read_frame().await,
            ReaderRequest::FrameAccepted | ReaderRequest::ResetDelay => {
                self.delay.reset();
                Ok(())
            }
            ReaderRequest::FrameRejected => self.slow_down(),
        }
    }

    async fn wait_for_device(&mut self) -> Result<(), MirrorError> {
        let timeout = self.config.wait_timeout;
        match tokio::time::timeout(timeout, self.source.wait_for_device()).await {
            Ok(Ok(())) => {
                info!("device found");
                self.delay.reset();
                self.emit(ReaderEvent::DeviceFound)
            }
            Err(_) => {
                debug!("no device within {timeout:?}");
                self.emit(ReaderEvent::Disconnected(DisconnectReason::WaitTimeout))
            }
            Ok(Err(e)) => {
                // Fails fast (e.g. adb missing); pace like a timeout.
                warn!("device discovery failed: {e}");
                tokio::time::sleep(timeout).await;
                self.emit(ReaderEvent::Disconnected(DisconnectReason::DeviceLost))
            }
        }
    }

    async fn probe_geometry(&mut self) -> Result<(), MirrorError> {
        match self.source.probe_geometry().await {
            Ok(descriptor) => {
                info!(
                    width = descriptor.width,
                    height = descriptor.height,
                    format = ?descriptor.pixel_format,
                    os = ?descriptor.os_family,
                    "framebuffer geometry"
                );
                self.emit(ReaderEvent::GeometryFound(descriptor))
            }
            Err(e) => {
                warn!("geometry probe failed: {e}");
                self.emit(ReaderEvent::Disconnected(DisconnectReason::DeviceLost))
            }
        }
    }

    async fn read_frame(&mut self) -> Result<(), MirrorError> {
        let delay = self.delay.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match self.source.read_frame().await {
            Ok(Some(frame)) => self.emit(ReaderEvent::Frame(frame)),
            Ok(None) => {
                self.slow_down()?;
                self.emit(ReaderEvent::FrameFailed)
            }
            Err(e) => {
                warn!("frame capture failed: {e}");
                self.emit(ReaderEvent::Disconnected(DisconnectReason::DeviceLost))
            }
        }
    }

    fn slow_down(&mut self) -> Result<(), MirrorError> {
        if self.delay.increase() {
            debug!(delay = ?self.delay.delay(), "frame delay reached normal tier");
            self.emit(ReaderEvent::DelayNormal)?;
        }
        Ok(())
    }

    fn emit(&self, event: ReaderEvent) -> Result<(), MirrorError> {
        self.events.send(event)?;
        Ok(())
    }
}
