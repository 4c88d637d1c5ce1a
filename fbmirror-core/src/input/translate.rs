//! Pointer and key activity → device commands.
//!
//! The translator only remembers the latched press position (and, for raw
//! injection, the last position it sent). Gating on connection and screen
//! state is the caller's job; see [`crate::state::MirrorState`].

use tracing::debug;

use crate::device::OsFamily;
use crate::input::command::{DEFAULT_EVENT_NODE, DeviceCommand, touch_events};
use crate::input::keymap::KeyMap;
use crate::scene::{DevicePoint, VirtualKey};

/// A release within this many pixels of the press, on both axes, is a tap.
pub const TAP_TOLERANCE: i32 = 1;

// ── PointerGesture ───────────────────────────────────────────────

/// A press that has not been released yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerGesture {
    pub press: DevicePoint,
    pub current: DevicePoint,
}

impl PointerGesture {
    pub fn new(press: DevicePoint) -> Self {
        Self {
            press,
            current: press,
        }
    }

    /// Displacement from the press to the current position.
    pub fn displacement(&self) -> (i32, i32) {
        self.current - self.press
    }

    /// Whether the gesture stayed within [`TAP_TOLERANCE`].
    pub fn is_tap(&self) -> bool {
        let (dx, dy) = self.displacement();
        dx.abs() <= TAP_TOLERANCE && dy.abs() <= TAP_TOLERANCE
    }
}

// ── TranslatorConfig ─────────────────────────────────────────────

/// Configuration for [`InputTranslator`].
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// Touch device node for raw `sendevent` injection.
    pub event_node: String,
    /// Forward pointer motion as raw events (Legacy family only).
    pub forward_motion: bool,
    /// Motion staying within `[-t, t)` on both axes is not forwarded.
    pub motion_threshold: i32,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            event_node: DEFAULT_EVENT_NODE.into(),
            forward_motion: false,
            motion_threshold: 5,
        }
    }
}

// ── InputTranslator ──────────────────────────────────────────────

/// Converts device-space pointer and key activity into command sequences.
pub struct InputTranslator {
    config: TranslatorConfig,
    keymap: &'static KeyMap,
    gesture: Option<PointerGesture>,
    last_sent: Option<DevicePoint>,
}

impl InputTranslator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self::with_keymap(config, KeyMap::global())
    }

    pub fn with_keymap(config: TranslatorConfig, keymap: &'static KeyMap) -> Self {
        Self {
            config,
            keymap,
            gesture: None,
            last_sent: None,
        }
    }

    /// The unreleased press, if any.
    pub fn gesture(&self) -> Option<&PointerGesture> {
        self.gesture.as_ref()
    }

    /// Forget any latched press.
    pub fn cancel(&mut self) {
        self.gesture = None;
        self.last_sent = None;
    }

    /// Pointer went down at `pos`.
    pub fn press(&mut self, os: OsFamily, pos: DevicePoint) -> Vec<DeviceCommand> {
        self.gesture = Some(PointerGesture::new(pos));
        if os == OsFamily::Legacy {
            self.last_sent = Some(pos);
        }
        // Everything is sent at release.
        Vec::new()
    }

    /// Pointer moved to `pos`.
    ///
    /// Motion is forwarded only once it leaves the half-open box
    /// `[-t, t)` around the last sent position on either axis, where `t` is
    /// the motion threshold.
    pub fn motion(&mut self, os: OsFamily, pos: DevicePoint) -> Vec<DeviceCommand> {
        if let Some(gesture) = self.gesture.as_mut() {
            gesture.current = pos;
        }
        if !self.config.forward_motion || os != OsFamily::Legacy {
            return Vec::new();
        }
        if let Some(prev) = self.last_sent {
            let (dx, dy) = pos - prev;
            let t = self.config.motion_threshold;
            if (-t..t).contains(&dx) && (-t..t).contains(&dy) {
                return Vec::new();
            }
        }
        self.last_sent = Some(pos);
        vec![self.raw(pos, false, false)]
    }

    /// Pointer went up at `pos`. Ignored without a matching press.
    pub fn release(&mut self, os: OsFamily, pos: DevicePoint) -> Vec<DeviceCommand> {
        let Some(mut gesture) = self.gesture.take() else {
            debug!(x = pos.x, y = pos.y, "release without press ignored");
            return Vec::new();
        };
        gesture.current = pos;
        self.last_sent = None;

        match os {
            OsFamily::Modern => {
                if gesture.is_tap() {
                    vec![DeviceCommand::tap(pos)]
                } else {
                    vec![DeviceCommand::swipe(gesture.press, pos)]
                }
            }
            OsFamily::Legacy => vec![self.raw(pos, true, true)],
        }
    }

    /// A host key was released.
    pub fn key_release(&self, host_key: u32) -> Option<DeviceCommand> {
        match self.keymap.lookup(host_key) {
            Some(code) => Some(DeviceCommand::key_event(code)),
            None => {
                debug!(host_key, "unmapped key dropped");
                None
            }
        }
    }

    /// A soft key was clicked.
    pub fn virtual_key(&self, key: VirtualKey) -> DeviceCommand {
        DeviceCommand::key_event(key.keycode())
    }

    fn raw(&self, pos: DevicePoint, press: bool, release: bool) -> DeviceCommand {
        DeviceCommand::raw_events(&self.config.event_node, &touch_events(pos, press, release))
    }
}

impl Default for InputTranslator {
    fn default() -> Self {
        Self::new(TranslatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::command::{ABS_MT_POSITION_X, ABS_X, BTN_TOUCH, EV_ABS, EV_KEY};
    use crate::input::keymap::hid;

    fn p(x: i32, y: i32) -> DevicePoint {
        DevicePoint::new(x, y)
    }

    fn click(t: &mut InputTranslator, from: DevicePoint, to: DevicePoint) -> Vec<DeviceCommand> {
        assert!(t.press(OsFamily::Modern, from).is_empty());
        t.release(OsFamily::Modern, to)
    }

    #[test]
    fn modern_release_in_place_is_tap() {
        let mut t = InputTranslator::default();
        let cmds = click(&mut t, p(100, 200), p(100, 200));
        assert_eq!(cmds, vec![DeviceCommand::tap(p(100, 200))]);
    }

    #[test]
    fn modern_tap_tolerance_is_inclusive() {
        let mut t = InputTranslator::default();
        let cmds = click(&mut t, p(100, 200), p(101, 201));
        assert_eq!(cmds, vec![DeviceCommand::tap(p(101, 201))]);

        let cmds = click(&mut t, p(100, 200), p(99, 199));
        assert_eq!(cmds, vec![DeviceCommand::tap(p(99, 199))]);
    }

    #[test]
    fn modern_two_pixels_is_swipe() {
        let mut t = InputTranslator::default();
        let cmds = click(&mut t, p(100, 200), p(102, 200));
        assert_eq!(cmds, vec![DeviceCommand::swipe(p(100, 200), p(102, 200))]);
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut t = InputTranslator::default();
        assert!(t.release(OsFamily::Modern, p(1, 1)).is_empty());
        assert!(t.release(OsFamily::Legacy, p(1, 1)).is_empty());
    }

    #[test]
    fn gesture_lives_between_press_and_release() {
        let mut t = InputTranslator::default();
        assert!(t.gesture().is_none());
        t.press(OsFamily::Modern, p(5, 5));
        t.motion(OsFamily::Modern, p(50, 5));
        assert_eq!(t.gesture().unwrap().displacement(), (45, 0));
        t.release(OsFamily::Modern, p(50, 5));
        assert!(t.gesture().is_none());
    }

    fn tokens(cmd: &DeviceCommand) -> Vec<&str> {
        cmd.tokens().iter().map(String::as_str).collect()
    }

    #[test]
    fn legacy_press_only_latches() {
        let mut t = InputTranslator::default();
        assert!(t.press(OsFamily::Legacy, p(7, 9)).is_empty());
        assert_eq!(t.gesture(), Some(&PointerGesture::new(p(7, 9))));
    }

    #[test]
    fn legacy_click_is_one_ordered_batch() {
        let mut t = InputTranslator::default();
        assert!(t.press(OsFamily::Legacy, p(7, 9)).is_empty());
        let cmds = t.release(OsFamily::Legacy, p(7, 9));
        assert_eq!(cmds.len(), 1);

        let node = DEFAULT_EVENT_NODE;
        let mut expected = vec!["shell"];
        for event in [
            ["3", "53", "7"],
            ["3", "54", "9"],
            ["1", "330", "1"],
            ["3", "0", "7"],
            ["3", "1", "9"],
            ["0", "0", "0"],
            ["1", "330", "0"],
            ["0", "0", "0"],
        ] {
            expected.extend(["sendevent", node]);
            expected.extend(event);
            expected.push(";");
        }
        assert_eq!(tokens(&cmds[0]), expected);
    }

    #[test]
    fn legacy_cancel_sends_nothing() {
        let mut t = InputTranslator::default();
        assert!(t.press(OsFamily::Legacy, p(7, 9)).is_empty());
        t.cancel();
        assert!(t.release(OsFamily::Legacy, p(7, 9)).is_empty());
    }

    #[test]
    fn legacy_motion_is_filtered() {
        let mut t = InputTranslator::new(TranslatorConfig {
            forward_motion: true,
            ..Default::default()
        });
        t.press(OsFamily::Legacy, p(100, 100));
        assert!(t.motion(OsFamily::Legacy, p(103, 104)).is_empty());

        assert!(t.motion(OsFamily::Legacy, p(95, 104)).is_empty());
        assert_eq!(t.motion(OsFamily::Legacy, p(105, 100)).len(), 1);

        let cmds = t.motion(OsFamily::Legacy, p(110, 100));
        assert_eq!(cmds.len(), 1);
        let tokens = cmds[0].tokens();
        assert_eq!(tokens[3], EV_ABS.to_string());
        assert_eq!(tokens[4], ABS_MT_POSITION_X.to_string());
        assert_eq!(tokens[5], "110");
        assert!(!cmds[0].to_string().contains(&format!(" {EV_KEY} {BTN_TOUCH} ")));
        assert!(cmds[0].to_string().contains(&format!(" {EV_ABS} {ABS_X} 110 ")));
    }

    #[test]
    fn motion_not_forwarded_by_default() {
        let mut t = InputTranslator::default();
        assert!(t.motion(OsFamily::Legacy, p(300, 300)).is_empty());
    }

    #[test]
    fn key_release_mapping() {
        let t = InputTranslator::default();
        assert_eq!(
            t.key_release(hid::ENTER),
            Some(DeviceCommand::key_event(66))
        );
        assert_eq!(t.key_release(hid::CAPS_LOCK), None);
        assert_eq!(t.key_release(0xDEAD), None);
    }

    #[test]
    fn virtual_key_command() {
        let t = InputTranslator::default();
        assert_eq!(
            t.virtual_key(VirtualKey::Back),
            DeviceCommand::key_event(4)
        );
    }
}
