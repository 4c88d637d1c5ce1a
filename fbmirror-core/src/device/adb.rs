//! `adb` command-line bridge.
//!
//! Every call spawns one `adb` process. Frames come from
//! `adb exec-out screencap`, whose output is a little-endian header
//! (`width`, `height`, `format`, and on newer releases a colour-space
//! word) followed by the raw pixels.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::device::{
    DeviceShell, FrameSource, FramebufferDescriptor, OsFamily, PixelFormat, ScreenPowerState,
};
use crate::error::MirrorError;
use crate::input::command::DeviceCommand;

/// `KEYCODE_POWER`, correct for nearly every device model.
pub const KEYCODE_POWER: u32 = 26;

const HEADER_LEN: usize = 12;
const HEADER_LEN_WITH_COLORSPACE: usize = 16;

// ── AdbConfig ────────────────────────────────────────────────────

/// Configuration for [`AdbBridge`].
#[derive(Debug, Clone)]
pub struct AdbConfig {
    /// Path to the `adb` executable.
    pub adb_path: PathBuf,
    /// Device serial (`adb -s`); `None` targets the only attached device.
    pub serial: Option<String>,
    /// Power keycode per `ro.product.model`, for models that do not use
    /// [`KEYCODE_POWER`].
    pub power_key_overrides: HashMap<String, u32>,
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self {
            adb_path: PathBuf::from("adb"),
            serial: None,
            power_key_overrides: HashMap::new(),
        }
    }
}

// ── ScreencapHeader ──────────────────────────────────────────────

/// Parsed `screencap` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreencapHeader {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Offset of the first pixel byte.
    pub offset: usize,
    /// Length of the pixel data.
    pub len: usize,
}

/// Parse the header of a raw `screencap` dump and locate the pixels.
pub fn parse_screencap(raw: &[u8]) -> Result<ScreencapHeader, MirrorError> {
    if raw.len() < HEADER_LEN {
        return Err(MirrorError::Decode(format!(
            "screencap output too short: {} bytes",
            raw.len()
        )));
    }
    let word = |i: usize| u32::from_le_bytes([raw[i], raw[i + 1], raw[i + 2], raw[i + 3]]);
    let width = word(0);
    let height = word(4);
    let format = PixelFormat::from_raw(word(8))?;
    if width == 0 || height == 0 {
        return Err(MirrorError::InvalidGeometry(format!("{width}x{height}")));
    }

    let len = width as usize * height as usize * format.bytes_per_pixel();
    let offset = if raw.len() >= HEADER_LEN_WITH_COLORSPACE + len {
        HEADER_LEN_WITH_COLORSPACE
    } else {
        HEADER_LEN
    };
    if raw.len() < offset + len {
        return Err(MirrorError::Decode(format!(
            "truncated frame: {} < {}",
            raw.len() - offset,
            len
        )));
    }

    Ok(ScreencapHeader {
        width,
        height,
        format,
        offset,
        len,
    })
}

/// Read the screen power state out of `dumpsys power`.
///
/// Older releases print `mScreenOn=`, newer ones `Display Power: state=`
/// and `mWakefulness=`.
pub fn parse_screen_power(dumpsys: &str) -> ScreenPowerState {
    dumpsys
        .lines()
        .map(str::trim)
        .find_map(power_line)
        .unwrap_or(ScreenPowerState::Unknown)
}

fn power_line(line: &str) -> Option<ScreenPowerState> {
    if let Some(value) = line.strip_prefix("Display Power: state=") {
        return match value {
            "ON" => Some(ScreenPowerState::On),
            "OFF" | "DOZE" => Some(ScreenPowerState::Off),
            _ => None,
        };
    }
    if let Some(value) = line.strip_prefix("mScreenOn=") {
        return match value {
            "true" => Some(ScreenPowerState::On),
            "false" => Some(ScreenPowerState::Off),
            _ => None,
        };
    }
    match line.strip_prefix("mWakefulness=")? {
        "Awake" => Some(ScreenPowerState::On),
        "Asleep" | "Dozing" => Some(ScreenPowerState::Off),
        _ => None,
    }
}

// ── AdbBridge ────────────────────────────────────────────────────

/// Device bridge backed by the `adb` executable.
#[derive(Debug, Clone)]
pub struct AdbBridge {
    config: Arc<AdbConfig>,
}

impl AdbBridge {
    pub fn new(config: AdbConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// A fresh `adb` invocation targeting the configured device.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.adb_path);
        if let Some(serial) = &self.config.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    async fn run<I, S>(&self, args: I) -> Result<Vec<u8>, MirrorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = self.command();
        cmd.args(args);
        let output = cmd.output().await?;
        if !output.status.success() {
            let command = cmd
                .as_std()
                .get_args()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ");
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.contains("no devices") || stderr.contains("not found") {
                return Err(MirrorError::DeviceNotFound);
            }
            return Err(MirrorError::Bridge {
                command,
                status: output.status.to_string(),
                stderr,
            });
        }
        Ok(output.stdout)
    }

    async fn shell_text(&self, args: &[&str]) -> Result<String, MirrorError> {
        let out = self.run(std::iter::once("shell").chain(args.iter().copied())).await?;
        Ok(String::from_utf8(out)?.replace('\r', "").trim().to_string())
    }

    async fn screencap(&self) -> Result<Vec<u8>, MirrorError> {
        self.run(["exec-out", "screencap"]).await
    }

    async fn sdk_level(&self) -> Option<u32> {
        match self.shell_text(&["getprop", "ro.build.version.sdk"]).await {
            Ok(text) => text.parse().ok(),
            Err(e) => {
                debug!("sdk level probe failed: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl FrameSource for AdbBridge {
    async fn wait_for_device(&self) -> Result<(), MirrorError> {
        self.run(["wait-for-device"]).await.map(|_| ())
    }

    async fn probe_geometry(&self) -> Result<FramebufferDescriptor, MirrorError> {
        let raw = self.screencap().await?;
        let header = parse_screencap(&raw)?;
        let os_family = self.sdk_level().await.map(OsFamily::from_sdk);
        FramebufferDescriptor::new(header.width, header.height, header.format, os_family)
    }

    async fn read_frame(&self) -> Result<Option<Bytes>, MirrorError> {
        let raw = self.screencap().await?;
        match parse_screencap(&raw) {
            Ok(header) => {
                trace!(bytes = header.len, "frame captured");
                Ok(Some(
                    Bytes::from(raw).slice(header.offset..header.offset + header.len),
                ))
            }
            Err(e) => {
                debug!("unusable screencap: {e}");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl DeviceShell for AdbBridge {
    async fn execute(&self, command: &DeviceCommand) -> Result<String, MirrorError> {
        let out = self.run(command.tokens()).await?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    async fn probe_power_key(&self) -> Result<u32, MirrorError> {
        let model = self.shell_text(&["getprop", "ro.product.model"]).await?;
        let key = self
            .config
            .power_key_overrides
            .get(&model)
            .copied()
            .unwrap_or(KEYCODE_POWER);
        debug!(%model, key, "power key probed");
        Ok(key)
    }

    async fn screen_power(&self) -> Result<ScreenPowerState, MirrorError> {
        let text = self.shell_text(&["dumpsys", "power"]).await?;
        Ok(parse_screen_power(&text))
    }
}
