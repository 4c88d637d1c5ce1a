//! Input side: events coming from the presentation layer and their
//! translation into device commands.
//!
//! | Module      | Purpose                                              |
//! |-------------|------------------------------------------------------|
//! | `command`   | `DeviceCommand` token sequences, raw event codes     |
//! | `keymap`    | Static host → device keycode table                   |
//! | `translate` | Press/move/release and key handling per OS family    |

pub mod command;
pub mod keymap;
pub mod translate;

use serde::{Deserialize, Serialize};

use crate::scene::ScenePoint;

pub use command::{DeviceCommand, RawEvent};
pub use keymap::KeyMap;
pub use translate::{InputTranslator, PointerGesture, TranslatorConfig};

/// Activity reported by the presentation layer, in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerPress(ScenePoint),
    PointerMove(ScenePoint),
    PointerRelease(ScenePoint),
    /// A host key was released (USB HID usage ID).
    KeyRelease(u32),
    /// The view was resized.
    Resize { width: u32, height: u32 },
}
