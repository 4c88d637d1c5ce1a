//! Frame statistics sink.
//!
//! The mirror has no renderer of its own; this sink measures what would
//! be drawn and publishes the numbers over a `watch` channel.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use fbmirror_core::DecodedFrame;

const FPS_WINDOW: usize = 60;

// ── FrameStats ───────────────────────────────────────────────────

/// Running statistics over presented frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    /// Smoothed frames per second.
    pub fps: f64,
    /// Frames presented since start.
    pub total_frames: u64,
    /// Pixel bytes presented since start.
    pub total_bytes: u64,
    /// Last frame width.
    pub width: u32,
    /// Last frame height.
    pub height: u32,
}

// ── StatsSink ────────────────────────────────────────────────────

pub struct StatsSink {
    intervals: VecDeque<Duration>,
    last_frame: Option<Instant>,
    stats: FrameStats,
    tx: watch::Sender<FrameStats>,
}

impl StatsSink {
    pub fn new() -> (Self, watch::Receiver<FrameStats>) {
        let (tx, rx) = watch::channel(FrameStats::default());
        let sink = Self {
            intervals: VecDeque::with_capacity(FPS_WINDOW + 1),
            last_frame: None,
            stats: FrameStats::default(),
            tx,
        };
        (sink, rx)
    }

    pub fn record(&mut self, frame: &DecodedFrame) {
        self.record_at(frame, Instant::now());
    }

    fn record_at(&mut self, frame: &DecodedFrame, now: Instant) {
        if let Some(last) = self.last_frame.replace(now) {
            self.intervals.push_back(now.duration_since(last));
            if self.intervals.len() > FPS_WINDOW {
                self.intervals.pop_front();
            }
        }
        let avg_secs = if self.intervals.is_empty() {
            0.0
        } else {
            self.intervals.iter().map(Duration::as_secs_f64).sum::<f64>()
                / self.intervals.len() as f64
        };

        self.stats.fps = if avg_secs > 0.0 { 1.0 / avg_secs } else { 0.0 };
        self.stats.total_frames += 1;
        self.stats.total_bytes += frame.data.len() as u64;
        self.stats.width = frame.descriptor.width;
        self.stats.height = frame.descriptor.height;
        let _ = self.tx.send(self.stats.clone());
    }
}
