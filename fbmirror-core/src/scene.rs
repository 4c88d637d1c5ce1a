//! Scene geometry: where the mirrored image and the soft-key bar sit in
//! the presentation layer's coordinate space, and how scene points map to
//! device pixels.
//!
//! ```text
//!  (0,0)
//!   ┌───────────────────────┐
//!   │                       │
//!   │    mirrored image     │  image_height
//!   │                       │
//!   ├───────────────────────┤
//!   │ [Menu]  [Home] [Back] │  KEY_BAR_HEIGHT
//!   └───────────────────────┘
//!          image_width
//! ```

use serde::{Deserialize, Serialize};

use crate::device::FramebufferDescriptor;

/// Edge length of a soft-key button, which is also the bar height.
pub const KEY_BAR_HEIGHT: u32 = 32;

const KEY_MARGIN: f64 = 8.0;

// ── Points ───────────────────────────────────────────────────────

/// A position in scene space (presentation-layer units).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenePoint {
    pub x: f64,
    pub y: f64,
}

impl ScenePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A position in device framebuffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DevicePoint {
    pub x: i32,
    pub y: i32,
}

impl DevicePoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Sub for DevicePoint {
    type Output = (i32, i32);

    fn sub(self, rhs: Self) -> Self::Output {
        (self.x - rhs.x, self.y - rhs.y)
    }
}

// ── VirtualKey ───────────────────────────────────────────────────

/// Soft keys drawn under the mirrored image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VirtualKey {
    Menu,
    Home,
    Back,
}

impl VirtualKey {
    /// Left-to-right order in the key bar.
    pub const ALL: [VirtualKey; 3] = [VirtualKey::Menu, VirtualKey::Home, VirtualKey::Back];

    /// Android keycode sent when the key is clicked.
    pub const fn keycode(self) -> u32 {
        match self {
            VirtualKey::Menu => 82,
            VirtualKey::Home => 3,
            VirtualKey::Back => 4,
        }
    }
}

/// Axis-aligned rectangle in scene space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SceneRect {
    /// Half-open containment test.
    pub fn contains(&self, p: ScenePoint) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }
}

// ── SceneLayout ──────────────────────────────────────────────────

/// Derived layout for one framebuffer geometry and one view size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneLayout {
    fb_width: u32,
    fb_height: u32,
    image_width: u32,
    image_height: u32,
    keys: [(VirtualKey, SceneRect); 3],
}

impl SceneLayout {
    /// Scale `descriptor` to `image_width`, keeping its aspect ratio.
    pub fn new(descriptor: &FramebufferDescriptor, image_width: u32) -> Self {
        let fb_width = descriptor.width.max(1);
        let fb_height = descriptor.height.max(1);
        let image_width = image_width.max(1);
        let image_height =
            ((fb_height as u64 * image_width as u64) / fb_width as u64).max(1) as u32;
        Self::build(fb_width, fb_height, image_width, image_height)
    }

    /// Fit `descriptor` into a view of `view_width` x `view_height`.
    ///
    /// The height is the constraint: the image takes whatever is left
    /// above the key bar and its width follows the aspect ratio.
    pub fn fit_view(
        descriptor: &FramebufferDescriptor,
        _view_width: u32,
        view_height: u32,
    ) -> Self {
        let fb_width = descriptor.width.max(1);
        let fb_height = descriptor.height.max(1);
        let image_height = view_height.saturating_sub(KEY_BAR_HEIGHT).max(1);
        let image_width =
            ((fb_width as u64 * image_height as u64) / fb_height as u64).max(1) as u32;
        Self::build(fb_width, fb_height, image_width, image_height)
    }

    /// Re-derive for a new geometry, keeping the current image width.
    pub fn with_descriptor(&self, descriptor: &FramebufferDescriptor) -> Self {
        Self::new(descriptor, self.image_width)
    }

    fn build(fb_width: u32, fb_height: u32, image_width: u32, image_height: u32) -> Self {
        let size = KEY_BAR_HEIGHT as f64;
        let count = VirtualKey::ALL.len() as f64;
        let padding = (image_width as f64 - size * count - KEY_MARGIN * 2.0) / (count - 1.0);
        let keys = std::array::from_fn(|i| {
            let key = VirtualKey::ALL[i];
            let rect = SceneRect {
                x: KEY_MARGIN + i as f64 * (size + padding),
                y: image_height as f64,
                width: size,
                height: size,
            };
            (key, rect)
        });
        Self {
            fb_width,
            fb_height,
            image_width,
            image_height,
            keys,
        }
    }

    /// Size of the mirrored image in scene units.
    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    /// Size of the whole scene, key bar included.
    pub fn scene_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height + KEY_BAR_HEIGHT)
    }

    /// Whether `p` falls on the mirrored image.
    pub fn in_image(&self, p: ScenePoint) -> bool {
        SceneRect {
            x: 0.0,
            y: 0.0,
            width: self.image_width as f64,
            height: self.image_height as f64,
        }
        .contains(p)
    }

    /// Map a scene point on the image to framebuffer pixels.
    pub fn to_device(&self, p: ScenePoint) -> DevicePoint {
        let sx = self.fb_width as f64 / self.image_width as f64;
        let sy = self.fb_height as f64 / self.image_height as f64;
        let x = (p.x * sx).round().clamp(0.0, (self.fb_width - 1) as f64);
        let y = (p.y * sy).round().clamp(0.0, (self.fb_height - 1) as f64);
        DevicePoint::new(x as i32, y as i32)
    }

    /// The soft key under `p`, if any.
    pub fn virtual_key_at(&self, p: ScenePoint) -> Option<VirtualKey> {
        self.keys
            .iter()
            .find(|(_, rect)| rect.contains(p))
            .map(|(key, _)| *key)
    }

    /// Scene rectangle of a soft key.
    pub fn key_rect(&self, key: VirtualKey) -> SceneRect {
        self.keys
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, rect)| *rect)
            .unwrap_or(SceneRect {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
            })
    }
}
