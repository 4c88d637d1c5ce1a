//! Command executor.
//!
//! A single Tokio task that owns the [`DeviceShell`]. Commands run one
//! at a time in submission order, so two commands are never interleaved
//! on the device. While a device is connected the executor also polls
//! screen power and is the only source of screen on/off events.
//!
//! ```text
//!  coordinator ──ExecutorRequest──▶ ┌──────────────────┐ ──execute──▶ device
//!                                   │ CommandExecutor  │
//!  coordinator ◀─ExecutorEvent───── └──────────────────┘ ◀─dumpsys──  device
//!                                        ▲ poll tick
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::device::adb::KEYCODE_POWER;
use crate::device::{DeviceShell, ScreenPowerState};
use crate::error::MirrorError;
use crate::input::command::DeviceCommand;

// ── ExecutorConfig ───────────────────────────────────────────────

/// Configuration for [`CommandExecutor`].
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Period of the screen power poll.
    pub power_poll_interval: Duration,
    /// Manual brightness (0..=255) applied when capture slows to normal.
    pub brightness_level: u8,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            power_poll_interval: Duration::from_secs(1),
            brightness_level: 200,
        }
    }
}

// ── Messages ─────────────────────────────────────────────────────

/// Work for the executor, sent by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorRequest {
    /// Run one device command.
    Execute(DeviceCommand),
    /// New connection: learn the power key and start power polling.
    ProbePowerKey,
    /// Press the power key unless the screen is known to be on.
    WakeDevice,
    /// Switch to manual brightness at the configured level.
    AdjustBrightness,
    /// The connection is gone; stop polling.
    DeviceLost,
}

/// Screen power transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorEvent {
    ScreenTurnedOn,
    ScreenTurnedOff,
}

// ── CommandExecutor ──────────────────────────────────────────────

/// Serializes device commands and watches screen power.
pub struct CommandExecutor {
    shell: Arc<dyn DeviceShell>,
    config: ExecutorConfig,
    events: UnboundedSender<ExecutorEvent>,
    power_key: u32,
    screen: ScreenPowerState,
    polling: bool,
}

impl CommandExecutor {
    pub fn new(
        shell: Arc<dyn DeviceShell>,
        config: ExecutorConfig,
        events: UnboundedSender<ExecutorEvent>,
    ) -> Self {
        Self {
            shell,
            config,
            events,
            power_key: KEYCODE_POWER,
            screen: ScreenPowerState::Unknown,
            polling: false,
        }
    }

    /// Spawn the request loop on the Tokio runtime.
    pub fn spawn(self, requests: UnboundedReceiver<ExecutorRequest>) -> JoinHandle<()> {
        tokio::spawn(self.run(requests))
    }

    /// Serve requests and poll ticks until the request channel closes.
    ///
    /// Requests win over a due poll tick.
    pub async fn run(mut self, mut requests: UnboundedReceiver<ExecutorRequest>) {
        let mut ticker = tokio::time::interval(self.config.power_poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let step = tokio::select! {
                biased;
                request = requests.recv() => match request {
                    Some(request) => self.handle(request).await,
                    None => break,
                },
                _ = ticker.tick(), if self.polling => self.poll_power().await,
            };
            if let Err(e) = step {
                debug!("command executor stopping: {e}");
                break;
            }
        }
        debug!("command executor stopped");
    }

    /// Keycode used for [`ExecutorRequest::WakeDevice`].
    pub fn power_key(&self) -> u32 {
        self.power_key
    }

    /// Last known screen power state.
    pub fn screen(&self) -> ScreenPowerState {
        self.screen
    }

    /// Whether power polling is active.
    pub fn is_polling(&self) -> bool {
        self.polling
    }

    /// Handle one request. Only a closed event channel is an error.
    pub async fn handle(&mut self, request: ExecutorRequest) -> Result<(), MirrorError> {
        match request {
            ExecutorRequest::Execute(command) => {
                self.execute(&command).await;
                Ok(())
            }
            ExecutorRequest::ProbePowerKey => {
                self.power_key = match self.shell.probe_power_key().await {
                    Ok(key) => key,
                    Err(e) => {
                        warn!("power key probe failed, using {KEYCODE_POWER}: {e}");
                        KEYCODE_POWER
                    }
                };
                self.screen = ScreenPowerState::Unknown;
                self.polling = true;
                self.poll_power().await
            }
            ExecutorRequest::WakeDevice => {
                if self.screen == ScreenPowerState::On {
                    debug!("wake ignored, screen already on");
                    return Ok(());
                }
                info!(key = self.power_key, "waking device");
                self.execute(&DeviceCommand::key_event(self.power_key)).await;
                if self.polling {
                    self.poll_power().await?;
                }
                Ok(())
            }
            ExecutorRequest::AdjustBrightness => {
                let level = self.config.brightness_level.to_string();
                debug!(%level, "adjusting brightness");
                self.execute(&DeviceCommand::shell([
                    "settings",
                    "put",
                    "system",
                    "screen_brightness_mode",
                    "0",
                ]))
                .await;
                self.execute(&DeviceCommand::shell([
                    "settings",
                    "put",
                    "system",
                    "screen_brightness",
                    level.as_str(),
                ]))
                .await;
                Ok(())
            }
            ExecutorRequest::DeviceLost => {
                self.polling = false;
                self.screen = ScreenPowerState::Unknown;
                Ok(())
            }
        }
    }

    /// Query screen power once and report a change.
    ///
    /// An `Unknown` answer or a failed query keeps the previous state.
    pub async fn poll_power(&mut self) -> Result<(), MirrorError> {
        let state = match self.shell.screen_power().await {
            Ok(state) => state,
            Err(e) => {
                debug!("screen power query failed: {e}");
                return Ok(());
            }
        };
        if state == ScreenPowerState::Unknown || state == self.screen {
            return Ok(());
        }

        info!(from = %self.screen, to = %state, "screen power changed");
        self.screen = state;
        let event = match state {
            ScreenPowerState::On => ExecutorEvent::ScreenTurnedOn,
            _ => ExecutorEvent::ScreenTurnedOff,
        };
        self.events.send(event)?;
        Ok(())
    }

    async fn execute(&self, command: &DeviceCommand) {
        if command.is_empty() {
            return;
        }
        debug!(%command, "executing");
        if let Err(e) = self.shell.execute(command).await {
            warn!(%command, "command dropped: {e}");
        }
    }
}
