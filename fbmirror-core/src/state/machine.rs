//! Connection and power state machine.
//!
//! [`MirrorState`] is a synchronous Mealy machine. Every event from the
//! frame reader, the command executor or the presentation layer goes
//! through [`MirrorState::handle`], which updates the state and returns
//! the [`Effect`]s the coordinator must carry out, in order. Nothing in
//! here performs I/O or waits.
//!
//! | Axis       | Values                         | Source of truth          |
//! |------------|--------------------------------|--------------------------|
//! | connection | Waiting, Connected, Disconnected | reader events          |
//! | screen     | On, Off, Unknown               | executor power polling   |
//! | frame      | credit free / in flight        | `ReadFrame` bookkeeping  |
//!
//! At most one `ReadFrame` is outstanding at any time; the credit is
//! returned by the next `Frame`, `FrameFailed` or `Disconnected` event.

use tracing::{debug, info, warn};

use crate::capture::{DecodedFrame, DisconnectReason, FrameDecoder, ReaderEvent, ReaderRequest};
use crate::device::types::{DEFAULT_FB_HEIGHT, DEFAULT_FB_WIDTH};
use crate::device::{FramebufferDescriptor, OsFamily, ScreenPowerState};
use crate::exec::{ExecutorEvent, ExecutorRequest};
use crate::input::{DeviceCommand, InputEvent, InputTranslator, TranslatorConfig};
use crate::scene::{KEY_BAR_HEIGHT, SceneLayout, ScenePoint};
use crate::state::connection::DeviceConnectionState;

/// The "Waiting" prompt grows one dot per reconnect, modulo this.
const WAIT_DOTS_PERIOD: u32 = 5;

pub const PROMPT_WAITING: &str = "Waiting...";
pub const PROMPT_CONNECTED: &str = "Connected...";
pub const PROMPT_WAKEUP: &str = "Click to wakeup...";

// ── Messages ─────────────────────────────────────────────────────

/// Anything the state machine reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorEvent {
    Reader(ReaderEvent),
    Executor(ExecutorEvent),
    Input(InputEvent),
}

impl From<ReaderEvent> for MirrorEvent {
    fn from(event: ReaderEvent) -> Self {
        Self::Reader(event)
    }
}

impl From<ExecutorEvent> for MirrorEvent {
    fn from(event: ExecutorEvent) -> Self {
        Self::Executor(event)
    }
}

impl From<InputEvent> for MirrorEvent {
    fn from(event: InputEvent) -> Self {
        Self::Input(event)
    }
}

/// Status reported to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    Connected,
    Disconnected(DisconnectReason),
    ScreenOn,
    ScreenOff,
    /// The framebuffer size changed; the scene must be rebuilt.
    GeometryChanged {
        descriptor: FramebufferDescriptor,
        layout: SceneLayout,
    },
    /// The view was resized.
    LayoutChanged(SceneLayout),
    /// Overlay text; `None` hides the overlay.
    Prompt(Option<String>),
}

/// Work the coordinator performs on behalf of the state machine.
#[derive(Debug, Clone)]
pub enum Effect {
    Reader(ReaderRequest),
    Executor(ExecutorRequest),
    Status(StatusEvent),
    /// Hand a decoded frame to the frame sink.
    Present(DecodedFrame),
}

// ── StateConfig ──────────────────────────────────────────────────

/// Configuration for [`MirrorState`].
#[derive(Debug, Clone)]
pub struct StateConfig {
    /// Initial view width in scene units.
    pub view_width: u32,
    /// Initial view height in scene units, key bar included.
    pub view_height: u32,
    pub translator: TranslatorConfig,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            view_width: DEFAULT_FB_WIDTH,
            view_height: DEFAULT_FB_HEIGHT + KEY_BAR_HEIGHT,
            translator: TranslatorConfig::default(),
        }
    }
}

// ── MirrorState ──────────────────────────────────────────────────

/// Single authority over device status, frame credit and input gating.
pub struct MirrorState {
    connection: DeviceConnectionState,
    screen: ScreenPowerState,
    descriptor: FramebufferDescriptor,
    layout: SceneLayout,
    reconnects: u32,
    frame_in_flight: bool,
    geometry_ready: bool,
    prompt: Option<String>,
    mask_visible: bool,
    translator: InputTranslator,
    decoder: FrameDecoder,
}

impl MirrorState {
    /// Build the machine in `Waiting`; the returned effects start discovery.
    pub fn new(config: StateConfig) -> (Self, Vec<Effect>) {
        let descriptor = FramebufferDescriptor::default();
        let layout = SceneLayout::fit_view(&descriptor, config.view_width, config.view_height);
        let mut state = Self {
            connection: DeviceConnectionState::Waiting,
            screen: ScreenPowerState::Unknown,
            descriptor,
            layout,
            reconnects: 0,
            frame_in_flight: false,
            geometry_ready: false,
            prompt: None,
            mask_visible: true,
            translator: InputTranslator::new(config.translator),
            decoder: FrameDecoder::new(),
        };

        let mut out = Vec::new();
        state.set_prompt(Some(PROMPT_WAITING.to_string()), &mut out);
        out.push(Effect::Reader(ReaderRequest::WaitForDevice));
        (state, out)
    }

    pub fn connection(&self) -> DeviceConnectionState {
        self.connection
    }

    pub fn screen(&self) -> ScreenPowerState {
        self.screen
    }

    pub fn descriptor(&self) -> &FramebufferDescriptor {
        &self.descriptor
    }

    pub fn layout(&self) -> &SceneLayout {
        &self.layout
    }

    /// Disconnects seen so far. Only drives the prompt animation.
    pub fn reconnects(&self) -> u32 {
        self.reconnects
    }

    pub fn frame_in_flight(&self) -> bool {
        self.frame_in_flight
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    /// Whether the grey mask should cover the image.
    pub fn mask_visible(&self) -> bool {
        self.mask_visible
    }

    /// Feed one event; returns the effects to perform, in order.
    pub fn handle(&mut self, event: MirrorEvent) -> Vec<Effect> {
        let mut out = Vec::new();
        if self.connection == DeviceConnectionState::Disconnected {
            debug!(?event, "event after shutdown ignored");
            return out;
        }
        match event {
            MirrorEvent::Reader(ev) => self.on_reader(ev, &mut out),
            MirrorEvent::Executor(ev) => self.on_executor(ev, &mut out),
            MirrorEvent::Input(ev) => self.on_input(ev, &mut out),
        }
        out
    }

    /// Enter the terminal state; later events are ignored.
    pub fn shut_down(&mut self) {
        info!("mirror shutting down");
        self.connection = DeviceConnectionState::Disconnected;
        self.screen = ScreenPowerState::Unknown;
        self.frame_in_flight = false;
        self.translator.cancel();
    }

    // ── Reader events ────────────────────────────────────────────

    fn on_reader(&mut self, event: ReaderEvent, out: &mut Vec<Effect>) {
        match event {
            ReaderEvent::DeviceFound => self.device_found(out),
            ReaderEvent::Disconnected(reason) => self.disconnected(reason, out),
            ReaderEvent::GeometryFound(descriptor) => self.geometry_found(descriptor, out),
            ReaderEvent::Frame(payload) => {
                self.frame_in_flight = false;
                if !self.connection.is_connected() {
                    debug!("stale frame dropped");
                    return;
                }
                if self.screen != ScreenPowerState::On {
                    // Screen-on resumes the request cycle.
                    debug!("frame dropped, screen is {}", self.screen);
                    return;
                }
                self.mask_visible = false;
                match self.decoder.decode(&self.descriptor, payload) {
                    Ok(frame) => {
                        out.push(Effect::Reader(ReaderRequest::FrameAccepted));
                        self.set_prompt(None, out);
                        out.push(Effect::Present(frame));
                    }
                    Err(e) => {
                        debug!("frame rejected: {e}");
                        out.push(Effect::Reader(ReaderRequest::FrameRejected));
                    }
                }
                self.request_frame(out);
            }
            ReaderEvent::FrameFailed => {
                self.frame_in_flight = false;
                self.request_frame(out);
            }
            ReaderEvent::DelayNormal => {
                if self.connection.is_connected() {
                    out.push(Effect::Executor(ExecutorRequest::AdjustBrightness));
                }
            }
        }
    }

    fn device_found(&mut self, out: &mut Vec<Effect>) {
        if self.connection.is_connected() {
            debug!("device found while connected, ignored");
            return;
        }
        info!("device connected");
        self.connection = DeviceConnectionState::Connected;
        // Assumed until the executor's first power poll says otherwise.
        self.screen = ScreenPowerState::On;
        self.geometry_ready = false;
        self.frame_in_flight = false;

        out.push(Effect::Reader(ReaderRequest::ProbeGeometry));
        out.push(Effect::Executor(ExecutorRequest::ProbePowerKey));
        out.push(Effect::Status(StatusEvent::Connected));
        self.set_prompt(Some(PROMPT_CONNECTED.to_string()), out);
    }

    fn disconnected(&mut self, reason: DisconnectReason, out: &mut Vec<Effect>) {
        let was_connected = self.connection.is_connected();
        if was_connected {
            info!(%reason, "device disconnected");
        } else {
            debug!(%reason, "still waiting for device");
        }

        self.connection = DeviceConnectionState::Waiting;
        self.screen = ScreenPowerState::Unknown;
        self.geometry_ready = false;
        self.frame_in_flight = false;
        self.translator.cancel();
        self.mask_visible = true;

        let dots = (self.reconnects % WAIT_DOTS_PERIOD) as usize;
        self.reconnects = self.reconnects.wrapping_add(1);

        if was_connected {
            out.push(Effect::Executor(ExecutorRequest::DeviceLost));
        }
        out.push(Effect::Status(StatusEvent::Disconnected(reason)));
        self.set_prompt(Some(format!("Waiting{}", ".".repeat(dots))), out);
        out.push(Effect::Reader(ReaderRequest::WaitForDevice));
    }

    fn geometry_found(&mut self, descriptor: FramebufferDescriptor, out: &mut Vec<Effect>) {
        if !self.connection.is_connected() {
            debug!("stale geometry ignored");
            return;
        }
        let resized = !self.descriptor.same_size(&descriptor);
        self.descriptor = descriptor;
        self.geometry_ready = true;

        if resized {
            self.layout = self.layout.with_descriptor(&descriptor);
            info!(
                width = descriptor.width,
                height = descriptor.height,
                "framebuffer geometry changed"
            );
            out.push(Effect::Status(StatusEvent::GeometryChanged {
                descriptor,
                layout: self.layout.clone(),
            }));
        }
        self.request_frame(out);
    }

    /// Spend the frame credit if reading makes sense right now.
    fn request_frame(&mut self, out: &mut Vec<Effect>) {
        if self.connection.is_connected()
            && self.screen == ScreenPowerState::On
            && self.geometry_ready
            && !self.frame_in_flight
        {
            self.frame_in_flight = true;
            out.push(Effect::Reader(ReaderRequest::ReadFrame));
        }
    }

    // ── Executor events ──────────────────────────────────────────

    fn on_executor(&mut self, event: ExecutorEvent, out: &mut Vec<Effect>) {
        if !self.connection.is_connected() {
            debug!(?event, "screen event while not connected ignored");
            return;
        }
        match event {
            ExecutorEvent::ScreenTurnedOff => {
                let was_off = self.screen == ScreenPowerState::Off;
                self.screen = ScreenPowerState::Off;
                self.translator.cancel();
                self.mask_visible = true;
                if !was_off {
                    out.push(Effect::Status(StatusEvent::ScreenOff));
                }
                self.set_prompt(Some(PROMPT_WAKEUP.to_string()), out);
            }
            ExecutorEvent::ScreenTurnedOn => {
                let was_on = self.screen == ScreenPowerState::On;
                self.screen = ScreenPowerState::On;
                self.mask_visible = false;
                if !was_on {
                    out.push(Effect::Status(StatusEvent::ScreenOn));
                }
                self.set_prompt(None, out);
                self.request_frame(out);
            }
        }
    }

    // ── Input events ─────────────────────────────────────────────

    fn on_input(&mut self, event: InputEvent, out: &mut Vec<Effect>) {
        match event {
            InputEvent::PointerPress(p) => self.pointer_press(p, out),
            InputEvent::PointerMove(p) => self.pointer_move(p, out),
            InputEvent::PointerRelease(p) => self.pointer_release(p, out),
            InputEvent::KeyRelease(host_key) => {
                if !self.input_enabled() {
                    return;
                }
                if let Some(command) = self.translator.key_release(host_key) {
                    out.push(Effect::Reader(ReaderRequest::ResetDelay));
                    execute_all(vec![command], out);
                }
            }
            InputEvent::Resize { width, height } => {
                self.layout = SceneLayout::fit_view(&self.descriptor, width, height);
                debug!(width, height, image = ?self.layout.image_size(), "view resized");
                out.push(Effect::Status(StatusEvent::LayoutChanged(self.layout.clone())));
            }
        }
    }

    fn pointer_press(&mut self, p: ScenePoint, out: &mut Vec<Effect>) {
        if !self.connection.is_connected() {
            return;
        }
        if self.screen != ScreenPowerState::On {
            info!("screen is {}, waking device", self.screen);
            out.push(Effect::Executor(ExecutorRequest::WakeDevice));
            return;
        }
        if !self.layout.in_image(p) {
            return;
        }
        let Some(os) = self.click_os() else {
            return;
        };
        out.push(Effect::Reader(ReaderRequest::ResetDelay));
        let pos = self.layout.to_device(p);
        execute_all(self.translator.press(os, pos), out);
    }

    fn pointer_move(&mut self, p: ScenePoint, out: &mut Vec<Effect>) {
        if !self.input_enabled() || !self.layout.in_image(p) {
            return;
        }
        let Some(os) = self.descriptor.os_family else {
            return;
        };
        let pos = self.layout.to_device(p);
        execute_all(self.translator.motion(os, pos), out);
    }

    fn pointer_release(&mut self, p: ScenePoint, out: &mut Vec<Effect>) {
        if !self.input_enabled() {
            self.translator.cancel();
            return;
        }

        if self.layout.in_image(p) {
            let Some(os) = self.click_os() else {
                self.translator.cancel();
                return;
            };
            out.push(Effect::Reader(ReaderRequest::ResetDelay));
            let pos = self.layout.to_device(p);
            execute_all(self.translator.release(os, pos), out);
            return;
        }

        // Dragged off the image.
        self.translator.cancel();
        if let Some(key) = self.layout.virtual_key_at(p) {
            debug!(?key, "soft key clicked");
            out.push(Effect::Reader(ReaderRequest::ResetDelay));
            execute_all(vec![self.translator.virtual_key(key)], out);
        }
    }

    fn input_enabled(&self) -> bool {
        self.connection.is_connected() && self.screen == ScreenPowerState::On
    }

    fn click_os(&self) -> Option<OsFamily> {
        if self.descriptor.os_family.is_none() {
            warn!("unknown OS family, click dropped");
        }
        self.descriptor.os_family
    }

    fn set_prompt(&mut self, prompt: Option<String>, out: &mut Vec<Effect>) {
        if self.prompt != prompt {
            self.prompt.clone_from(&prompt);
            out.push(Effect::Status(StatusEvent::Prompt(prompt)));
        }
    }
}

fn execute_all(commands: Vec<DeviceCommand>, out: &mut Vec<Effect>) {
    out.extend(
        commands
            .into_iter()
            .map(|c| Effect::Executor(ExecutorRequest::Execute(c))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::PixelFormat;
    use crate::input::keymap::hid;
    use crate::scene::VirtualKey;
    use bytes::Bytes;

    fn waiting() -> MirrorState {
        MirrorState::new(StateConfig::default()).0
    }

    fn connected_with(descriptor: FramebufferDescriptor) -> MirrorState {
        let mut s = waiting();
        s.handle(ReaderEvent::DeviceFound.into());
        s.handle(ReaderEvent::GeometryFound(descriptor).into());
        s
    }

    fn connected() -> MirrorState {
        connected_with(FramebufferDescriptor::default())
    }

    fn reader(effects: &[Effect]) -> Vec<ReaderRequest> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Reader(r) => Some(*r),
                _ => None,
            })
            .collect()
    }

    fn executor(effects: &[Effect]) -> Vec<ExecutorRequest> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Executor(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    fn commands(effects: &[Effect]) -> Vec<String> {
        executor(effects)
            .into_iter()
            .filter_map(|r| match r {
                ExecutorRequest::Execute(c) => Some(c.to_string()),
                _ => None,
            })
            .collect()
    }

    fn status(effects: &[Effect]) -> Vec<StatusEvent> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Status(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    fn full_frame() -> Bytes {
        Bytes::from(vec![0u8; FramebufferDescriptor::default().frame_len()])
    }

    fn click(s: &mut MirrorState, from: (f64, f64), to: (f64, f64)) -> Vec<Effect> {
        let mut out = s.handle(InputEvent::PointerPress(ScenePoint::new(from.0, from.1)).into());
        out.extend(s.handle(InputEvent::PointerRelease(ScenePoint::new(to.0, to.1)).into()));
        out
    }

    // ── Connection ───────────────────────────────────────────────

    #[test]
    fn starts_waiting_and_discovers() {
        let (s, out) = MirrorState::new(StateConfig::default());
        assert_eq!(s.connection(), DeviceConnectionState::Waiting);
        assert_eq!(reader(&out), [ReaderRequest::WaitForDevice]);
        assert_eq!(s.prompt(), Some(PROMPT_WAITING));
        assert!(s.mask_visible());
    }

    #[test]
    fn device_found_probes_both_workers() {
        let mut s = waiting();
        let out = s.handle(ReaderEvent::DeviceFound.into());
        assert_eq!(s.connection(), DeviceConnectionState::Connected);
        assert_eq!(s.screen(), ScreenPowerState::On);
        assert_eq!(reader(&out), [ReaderRequest::ProbeGeometry]);
        assert_eq!(executor(&out), [ExecutorRequest::ProbePowerKey]);
        assert_eq!(
            status(&out),
            [
                StatusEvent::Connected,
                StatusEvent::Prompt(Some(PROMPT_CONNECTED.into()))
            ]
        );
        // No frame before the geometry is known.
        assert!(!s.frame_in_flight());
    }

    #[test]
    fn disconnect_while_on_rediscovers_once() {
        let mut s = connected();
        let out = s.handle(ReaderEvent::Disconnected(DisconnectReason::DeviceLost).into());
        assert_eq!(s.connection(), DeviceConnectionState::Waiting);
        assert_eq!(s.reconnects(), 1);
        assert_eq!(reader(&out), [ReaderRequest::WaitForDevice]);
        assert_eq!(executor(&out), [ExecutorRequest::DeviceLost]);
        assert!(status(&out).contains(&StatusEvent::Disconnected(DisconnectReason::DeviceLost)));
        assert!(s.mask_visible());
        assert!(!s.frame_in_flight());
        assert_eq!(s.prompt(), Some("Waiting"));
    }

    #[test]
    fn waiting_prompt_cycles() {
        let mut s = waiting();
        let mut prompts = Vec::new();
        for _ in 0..6 {
            let out = s.handle(ReaderEvent::Disconnected(DisconnectReason::WaitTimeout).into());
            assert_eq!(reader(&out), [ReaderRequest::WaitForDevice]);
            assert!(executor(&out).is_empty());
            prompts.push(s.prompt().unwrap_or_default().to_string());
        }
        assert_eq!(
            prompts,
            [
                "Waiting",
                "Waiting.",
                "Waiting..",
                "Waiting...",
                "Waiting....",
                "Waiting"
            ]
        );
        assert_eq!(s.reconnects(), 6);
    }

    #[test]
    fn stale_geometry_ignored() {
        let mut s = waiting();
        let desc = FramebufferDescriptor::new(720, 1280, PixelFormat::Rgba8888, None).unwrap();
        let out = s.handle(ReaderEvent::GeometryFound(desc).into());
        assert!(out.is_empty());
        assert_eq!(*s.descriptor(), FramebufferDescriptor::default());
    }

    #[test]
    fn same_size_geometry_adopted_silently() {
        let legacy = FramebufferDescriptor {
            pixel_format: PixelFormat::Rgb565,
            os_family: Some(OsFamily::Legacy),
            ..Default::default()
        };
        let mut s = waiting();
        s.handle(ReaderEvent::DeviceFound.into());
        let out = s.handle(ReaderEvent::GeometryFound(legacy).into());
        assert!(
            !status(&out)
                .iter()
                .any(|e| matches!(e, StatusEvent::GeometryChanged { .. }))
        );
        assert_eq!(reader(&out), [ReaderRequest::ReadFrame]);
        assert_eq!(s.descriptor().os_family, Some(OsFamily::Legacy));
    }

    #[test]
    fn resized_geometry_changes_layout_once() {
        let mut s = waiting();
        s.handle(ReaderEvent::DeviceFound.into());
        let desc = FramebufferDescriptor::new(240, 800, PixelFormat::Rgba8888, None).unwrap();
        let out = s.handle(ReaderEvent::GeometryFound(desc).into());
        let changes: Vec<_> = status(&out)
            .into_iter()
            .filter(|e| matches!(e, StatusEvent::GeometryChanged { .. }))
            .collect();
        assert_eq!(changes.len(), 1);
        // Image width is kept, height follows the new aspect ratio.
        assert_eq!(s.layout().image_size(), (480, 1600));
        assert_eq!(reader(&out), [ReaderRequest::ReadFrame]);
    }

    // ── Frames ───────────────────────────────────────────────────

    #[test]
    fn accepted_frame_is_presented_then_next_requested() {
        let mut s = connected();
        assert!(s.frame_in_flight());
        let out = s.handle(ReaderEvent::Frame(full_frame()).into());
        assert_eq!(
            reader(&out),
            [ReaderRequest::FrameAccepted, ReaderRequest::ReadFrame]
        );
        assert!(out.iter().any(|e| matches!(e, Effect::Present(_))));
        assert!(!s.mask_visible());
        assert_eq!(s.prompt(), None);
    }

    #[test]
    fn short_frame_is_rejected() {
        let mut s = connected();
        let out = s.handle(ReaderEvent::Frame(Bytes::from_static(&[0; 8])).into());
        assert_eq!(
            reader(&out),
            [ReaderRequest::FrameRejected, ReaderRequest::ReadFrame]
        );
        assert!(!out.iter().any(|e| matches!(e, Effect::Present(_))));
    }

    #[test]
    fn never_more_than_one_read_outstanding() {
        let mut s = connected();
        let mut outstanding = 1;
        let events: Vec<MirrorEvent> = vec![
            ExecutorEvent::ScreenTurnedOn.into(),
            ReaderEvent::FrameFailed.into(),
            ExecutorEvent::ScreenTurnedOn.into(),
            ReaderEvent::Frame(full_frame()).into(),
            ReaderEvent::GeometryFound(FramebufferDescriptor::default()).into(),
            ReaderEvent::FrameFailed.into(),
        ];
        for event in events {
            let returns = matches!(
                event,
                MirrorEvent::Reader(ReaderEvent::Frame(_) | ReaderEvent::FrameFailed)
            );
            if returns {
                outstanding -= 1;
            }
            let out = s.handle(event);
            outstanding += reader(&out)
                .iter()
                .filter(|r| **r == ReaderRequest::ReadFrame)
                .count();
            assert!(outstanding <= 1);
        }
        assert_eq!(outstanding, 1);
    }

    #[test]
    fn screen_off_pauses_and_screen_on_resumes() {
        let mut s = connected();
        let out = s.handle(ExecutorEvent::ScreenTurnedOff.into());
        assert_eq!(
            status(&out),
            [
                StatusEvent::ScreenOff,
                StatusEvent::Prompt(Some(PROMPT_WAKEUP.into()))
            ]
        );
        assert!(s.mask_visible());

        // The in-flight frame lands while off: dropped, nothing re-requested.
        let out = s.handle(ReaderEvent::Frame(full_frame()).into());
        assert!(out.is_empty());

        let out = s.handle(ExecutorEvent::ScreenTurnedOn.into());
        assert_eq!(status(&out), [StatusEvent::ScreenOn, StatusEvent::Prompt(None)]);
        assert_eq!(reader(&out), [ReaderRequest::ReadFrame]);
    }

    #[test]
    fn delay_normal_adjusts_brightness() {
        let mut s = connected();
        let out = s.handle(ReaderEvent::DelayNormal.into());
        assert_eq!(executor(&out), [ExecutorRequest::AdjustBrightness]);
    }

    // ── Input ────────────────────────────────────────────────────

    #[test]
    fn modern_click_is_tap_or_swipe() {
        let mut s = connected();
        let out = click(&mut s, (100.0, 200.0), (101.0, 201.0));
        assert_eq!(commands(&out), ["shell input tap 101 201"]);
        assert_eq!(
            reader(&out),
            [ReaderRequest::ResetDelay, ReaderRequest::ResetDelay]
        );

        let out = click(&mut s, (100.0, 200.0), (102.0, 200.0));
        assert_eq!(commands(&out), ["shell input swipe 100 200 102 200"]);
    }

    fn legacy() -> MirrorState {
        connected_with(FramebufferDescriptor {
            os_family: Some(OsFamily::Legacy),
            ..Default::default()
        })
    }

    #[test]
    fn legacy_click_sends_one_raw_batch() {
        let mut s = legacy();
        let out = s.handle(InputEvent::PointerPress(ScenePoint::new(10.0, 20.0)).into());
        assert!(commands(&out).is_empty());

        let out = s.handle(InputEvent::PointerRelease(ScenePoint::new(10.0, 20.0)).into());
        let node = "sendevent /dev/input/event0";
        assert_eq!(
            commands(&out),
            [format!(
                "shell {node} 3 53 10 ; {node} 3 54 20 ; {node} 1 330 1 ; \
                 {node} 3 0 10 ; {node} 3 1 20 ; {node} 0 0 0 ; \
                 {node} 1 330 0 ; {node} 0 0 0 ;"
            )]
        );
    }

    #[test]
    fn legacy_press_dragged_to_soft_key_never_touches_down() {
        let mut s = legacy();
        let key = s.layout().key_rect(VirtualKey::Home);
        let on_key = ScenePoint::new(key.x + key.width / 2.0, key.y + key.height / 2.0);

        let mut out = s.handle(InputEvent::PointerPress(ScenePoint::new(10.0, 20.0)).into());
        out.extend(s.handle(InputEvent::PointerRelease(on_key).into()));
        assert_eq!(commands(&out), ["shell input keyevent 3"]);
    }

    #[test]
    fn unknown_os_drops_clicks() {
        let mut s = connected_with(FramebufferDescriptor {
            os_family: None,
            ..Default::default()
        });
        let out = click(&mut s, (10.0, 20.0), (10.0, 20.0));
        assert!(executor(&out).is_empty());
        assert!(s.translator.gesture().is_none());
    }

    #[test]
    fn press_while_screen_off_wakes_only() {
        let mut s = connected();
        s.handle(ExecutorEvent::ScreenTurnedOff.into());
        let out = click(&mut s, (10.0, 20.0), (10.0, 20.0));
        assert_eq!(executor(&out), [ExecutorRequest::WakeDevice]);
    }

    #[test]
    fn input_ignored_until_connected() {
        let mut s = waiting();
        let mut out = click(&mut s, (10.0, 20.0), (10.0, 20.0));
        out.extend(s.handle(InputEvent::KeyRelease(hid::ENTER).into()));
        assert!(out.is_empty());
    }

    #[test]
    fn soft_key_release_sends_keyevent() {
        let mut s = connected();
        let rect = s.layout().key_rect(VirtualKey::Home);
        let center = (rect.x + rect.width / 2.0, rect.y + rect.height / 2.0);
        let out = click(&mut s, center, center);
        assert_eq!(commands(&out), ["shell input keyevent 3"]);
    }

    #[test]
    fn host_keys_are_mapped() {
        let mut s = connected();
        let out = s.handle(InputEvent::KeyRelease(hid::ENTER).into());
        assert_eq!(commands(&out), ["shell input keyevent 66"]);
        assert_eq!(reader(&out), [ReaderRequest::ResetDelay]);

        let out = s.handle(InputEvent::KeyRelease(hid::CAPS_LOCK).into());
        assert!(out.is_empty());
    }

    #[test]
    fn resize_refits_layout() {
        let mut s = connected();
        let out = s.handle(InputEvent::Resize { width: 300, height: 432 }.into());
        assert_eq!(s.layout().image_size(), (240, 400));
        assert!(matches!(
            status(&out).as_slice(),
            [StatusEvent::LayoutChanged(_)]
        ));
    }

    #[test]
    fn shut_down_is_terminal() {
        let mut s = connected();
        s.shut_down();
        assert_eq!(s.connection(), DeviceConnectionState::Disconnected);
        assert!(s.handle(ReaderEvent::DeviceFound.into()).is_empty());
        assert!(
            s.handle(ReaderEvent::Disconnected(DisconnectReason::DeviceLost).into())
                .is_empty()
        );
    }
}
