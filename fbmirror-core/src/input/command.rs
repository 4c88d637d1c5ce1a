//! Device command token sequences.
//!
//! A [`DeviceCommand`] is one bridge invocation, kept as an ordered list of
//! string tokens. `adb shell` joins its arguments with spaces on the device
//! side, so a batch of `sendevent` calls is separated by `;` tokens.

use crate::scene::DevicePoint;

// ── Linux input event codes ──────────────────────────────────────

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_ABS: u16 = 0x03;

pub const SYN_REPORT: u16 = 0x00;
pub const ABS_X: u16 = 0x00;
pub const ABS_Y: u16 = 0x01;
pub const ABS_MT_POSITION_X: u16 = 0x35;
pub const ABS_MT_POSITION_Y: u16 = 0x36;
pub const BTN_TOUCH: u16 = 0x14a;

/// Touch device node used for raw injection when none is configured.
pub const DEFAULT_EVENT_NODE: &str = "/dev/input/event0";

// ── RawEvent ─────────────────────────────────────────────────────

/// One `struct input_event` worth of `sendevent` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawEvent {
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    pub const SYNC: RawEvent = RawEvent::new(EV_SYN, SYN_REPORT, 0);

    pub const fn new(kind: u16, code: u16, value: i32) -> Self {
        Self { kind, code, value }
    }

    pub fn is_sync(&self) -> bool {
        *self == Self::SYNC
    }
}

/// The fixed event sequence for one touch interaction at `pos`.
///
/// Multi-touch position, optional touch-down, single-touch position and a
/// sync report; a release appends touch-up and a second sync.
pub fn touch_events(pos: DevicePoint, press: bool, release: bool) -> Vec<RawEvent> {
    let mut events = Vec::with_capacity(8);
    events.push(RawEvent::new(EV_ABS, ABS_MT_POSITION_X, pos.x));
    events.push(RawEvent::new(EV_ABS, ABS_MT_POSITION_Y, pos.y));
    if press {
        events.push(RawEvent::new(EV_KEY, BTN_TOUCH, 1));
    }
    events.push(RawEvent::new(EV_ABS, ABS_X, pos.x));
    events.push(RawEvent::new(EV_ABS, ABS_Y, pos.y));
    events.push(RawEvent::SYNC);
    if release {
        events.push(RawEvent::new(EV_KEY, BTN_TOUCH, 0));
        events.push(RawEvent::SYNC);
    }
    events
}

// ── DeviceCommand ────────────────────────────────────────────────

/// One ordered token sequence handed to the device bridge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceCommand {
    tokens: Vec<String>,
}

impl DeviceCommand {
    /// Build a command from raw tokens.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// `shell <args...>`
    pub fn shell<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens = vec!["shell".to_string()];
        tokens.extend(args.into_iter().map(Into::into));
        Self { tokens }
    }

    /// `shell input tap <x> <y>`
    pub fn tap(pos: DevicePoint) -> Self {
        Self::shell([
            "input".to_string(),
            "tap".to_string(),
            pos.x.to_string(),
            pos.y.to_string(),
        ])
    }

    /// `shell input swipe <x1> <y1> <x2> <y2>`
    pub fn swipe(from: DevicePoint, to: DevicePoint) -> Self {
        Self::shell([
            "input".to_string(),
            "swipe".to_string(),
            from.x.to_string(),
            from.y.to_string(),
            to.x.to_string(),
            to.y.to_string(),
        ])
    }

    /// `shell input keyevent <code>`
    pub fn key_event(code: u32) -> Self {
        Self::shell(["input".to_string(), "keyevent".to_string(), code.to_string()])
    }

    /// `shell sendevent <node> <type> <code> <value> ; ...`
    pub fn raw_events(node: &str, events: &[RawEvent]) -> Self {
        let mut tokens = Vec::with_capacity(1 + events.len() * 6);
        tokens.push("shell".to_string());
        for ev in events {
            tokens.push("sendevent".to_string());
            tokens.push(node.to_string());
            tokens.push(ev.kind.to_string());
            tokens.push(ev.code.to_string());
            tokens.push(ev.value.to_string());
            tokens.push(";".to_string());
        }
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl std::fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}
