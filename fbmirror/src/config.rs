//! Mirror configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use fbmirror_core::input::command::DEFAULT_EVENT_NODE;
use fbmirror_core::{
    AdbConfig, DelayConfig, ExecutorConfig, KEY_BAR_HEIGHT, MirrorConfig, MirrorError,
    ReaderConfig, StateConfig, TranslatorConfig,
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Device bridge settings.
    pub device: DeviceConfig,
    /// Frame pacing.
    pub capture: CaptureConfig,
    /// Screen power handling.
    pub power: PowerConfig,
    /// Input forwarding.
    pub input: InputConfig,
    /// Initial view.
    pub display: DisplayConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Device bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Path to the `adb` executable.
    pub adb_path: String,
    /// Device serial; empty targets the only attached device.
    pub serial: String,
    /// Upper bound on one discovery attempt, in milliseconds.
    pub wait_timeout_ms: u64,
    /// Touch device node for raw event injection.
    pub event_node: String,
}

/// Frame pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Delay before a frame request at the fastest tier.
    pub min_delay_ms: u64,
    /// Delay added per tier.
    pub step_ms: u64,
    /// Consecutive failures that reach the normal (slowest) tier.
    pub tiers_to_normal: u32,
}

/// Screen power handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Screen power poll period in milliseconds.
    pub poll_interval_ms: u64,
    /// Manual brightness applied when capture slows down (0..=255).
    pub brightness_level: u8,
    /// Power keycode per `ro.product.model`.
    pub power_keys: BTreeMap<String, u32>,
}

/// Input forwarding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Forward pointer motion on devices that take raw events.
    pub forward_motion: bool,
    /// Motion within `[-t, t)` device pixels of the last sent position is
    /// not forwarded.
    pub motion_threshold: i32,
}

/// Initial view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// View width.
    pub width: u32,
    /// View height, soft-key bar included.
    pub height: u32,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adb_path: "adb".into(),
            serial: String::new(),
            wait_timeout_ms: 3000,
            event_node: DEFAULT_EVENT_NODE.into(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 0,
            step_ms: 40,
            tiers_to_normal: 5,
        }
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            brightness_level: 200,
            power_keys: BTreeMap::new(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            forward_motion: false,
            motion_threshold: 5,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 480,
            height: 800 + KEY_BAR_HEIGHT,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl AppConfig {
    /// Load from a TOML file. A missing file yields the defaults; a file
    /// that does not parse is an error.
    pub fn load(path: &Path) -> Result<Self, MirrorError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).map_err(|e| {
                MirrorError::Config(format!("invalid config {}: {e}", path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write default config to a file.
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), MirrorError> {
        if self.device.adb_path.trim().is_empty() {
            return Err(MirrorError::Config("device.adb_path is empty".into()));
        }
        if self.device.wait_timeout_ms == 0 {
            return Err(MirrorError::Config("device.wait_timeout_ms must be > 0".into()));
        }
        if self.capture.tiers_to_normal == 0 {
            return Err(MirrorError::Config(
                "capture.tiers_to_normal must be > 0".into(),
            ));
        }
        if self.power.poll_interval_ms == 0 {
            return Err(MirrorError::Config("power.poll_interval_ms must be > 0".into()));
        }
        if self.display.width == 0 || self.display.height <= KEY_BAR_HEIGHT {
            return Err(MirrorError::Config(format!(
                "display {}x{} leaves no room for the image",
                self.display.width, self.display.height
            )));
        }
        Ok(())
    }

    /// Engine configuration.
    pub fn to_mirror_config(&self) -> MirrorConfig {
        MirrorConfig {
            reader: ReaderConfig {
                wait_timeout: Duration::from_millis(self.device.wait_timeout_ms),
                delay: DelayConfig {
                    min_delay: Duration::from_millis(self.capture.min_delay_ms),
                    step: Duration::from_millis(self.capture.step_ms),
                    max_tier: self.capture.tiers_to_normal,
                },
            },
            executor: ExecutorConfig {
                power_poll_interval: Duration::from_millis(self.power.poll_interval_ms),
                brightness_level: self.power.brightness_level,
            },
            state: StateConfig {
                view_width: self.display.width,
                view_height: self.display.height,
                translator: TranslatorConfig {
                    event_node: self.device.event_node.clone(),
                    forward_motion: self.input.forward_motion,
                    motion_threshold: self.input.motion_threshold,
                },
            },
        }
    }

    /// Bridge configuration.
    pub fn to_adb_config(&self) -> AdbConfig {
        let serial = self.device.serial.trim();
        AdbConfig {
            adb_path: PathBuf::from(&self.device.adb_path),
            serial: (!serial.is_empty()).then(|| serial.to_string()),
            power_key_overrides: self
                .power
                .power_keys
                .iter()
                .map(|(model, key)| (model.clone(), *key))
                .collect(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
