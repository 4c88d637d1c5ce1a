//! Shared device types: framebuffer geometry, pixel layout, OS family and
//! screen power.

use serde::{Deserialize, Serialize};

use crate::error::MirrorError;

/// Geometry assumed before the first probe succeeds.
pub const DEFAULT_FB_WIDTH: u32 = 480;
pub const DEFAULT_FB_HEIGHT: u32 = 800;

/// First SDK level (Jelly Bean) whose `input` tool understands `tap` and
/// `swipe`.
pub const MODERN_SDK_LEVEL: u32 = 16;

// ── PixelFormat ──────────────────────────────────────────────────

/// Pixel layout reported by the device framebuffer.
///
/// Discriminants follow the codes `screencap` writes into its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 4 bytes per pixel: Red, Green, Blue, Alpha.
    Rgba8888,
    /// 4 bytes per pixel, alpha byte ignored.
    Rgbx8888,
    /// 3 bytes per pixel: Red, Green, Blue.
    Rgb888,
    /// 2 bytes per pixel, 5-6-5 packed.
    Rgb565,
    /// 4 bytes per pixel: Blue, Green, Red, Alpha.
    Bgra8888,
}

impl PixelFormat {
    /// Bytes consumed by a single pixel in this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8888 | PixelFormat::Rgbx8888 | PixelFormat::Bgra8888 => 4,
            PixelFormat::Rgb888 => 3,
            PixelFormat::Rgb565 => 2,
        }
    }

    /// Map a raw format code to a [`PixelFormat`].
    pub fn from_raw(raw: u32) -> Result<Self, MirrorError> {
        match raw {
            1 => Ok(PixelFormat::Rgba8888),
            2 => Ok(PixelFormat::Rgbx8888),
            3 => Ok(PixelFormat::Rgb888),
            4 => Ok(PixelFormat::Rgb565),
            5 => Ok(PixelFormat::Bgra8888),
            other => Err(MirrorError::UnsupportedPixelFormat(other)),
        }
    }

    /// The raw format code.
    pub const fn raw(self) -> u32 {
        match self {
            PixelFormat::Rgba8888 => 1,
            PixelFormat::Rgbx8888 => 2,
            PixelFormat::Rgb888 => 3,
            PixelFormat::Rgb565 => 4,
            PixelFormat::Bgra8888 => 5,
        }
    }
}

// ── OsFamily ─────────────────────────────────────────────────────

/// Input-injection dialect spoken by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsFamily {
    /// Raw `sendevent` injection only.
    Legacy,
    /// `input tap`, `input swipe` and `input keyevent`.
    Modern,
}

impl OsFamily {
    /// Classify a device by its SDK level.
    pub fn from_sdk(level: u32) -> Self {
        if level >= MODERN_SDK_LEVEL {
            OsFamily::Modern
        } else {
            OsFamily::Legacy
        }
    }
}

// ── FramebufferDescriptor ────────────────────────────────────────

/// Remote display geometry, discovered once per connection.
///
/// Never mutated in place: a geometry change replaces the whole value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramebufferDescriptor {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel layout of frame payloads.
    pub pixel_format: PixelFormat,
    /// Input dialect, `None` when the probe could not determine it.
    pub os_family: Option<OsFamily>,
}

impl FramebufferDescriptor {
    pub fn new(
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
        os_family: Option<OsFamily>,
    ) -> Result<Self, MirrorError> {
        if width == 0 || height == 0 {
            return Err(MirrorError::InvalidGeometry(format!("{width}x{height}")));
        }
        Ok(Self {
            width,
            height,
            pixel_format,
            os_family,
        })
    }

    /// Size in bytes of one uncompressed frame.
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * self.pixel_format.bytes_per_pixel()
    }

    /// Whether `other` has the same width and height.
    pub fn same_size(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }
}

impl Default for FramebufferDescriptor {
    fn default() -> Self {
        Self {
            width: DEFAULT_FB_WIDTH,
            height: DEFAULT_FB_HEIGHT,
            pixel_format: PixelFormat::Rgba8888,
            os_family: Some(OsFamily::Modern),
        }
    }
}

// ── ScreenPowerState ─────────────────────────────────────────────

/// Whether the remote display is lit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScreenPowerState {
    On,
    Off,
    #[default]
    Unknown,
}

impl std::fmt::Display for ScreenPowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => write!(f, "on"),
            Self::Off => write!(f, "off"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
