//! Coordinator runtime.
//!
//! Spawns the frame reader and the command executor, then runs the
//! [`MirrorState`] machine on a third task:
//!
//! ```text
//!                 ReaderRequest                     ExecutorRequest
//!  FrameReader ◀──────────────── Coordinator ─────────────────▶ CommandExecutor
//!       │         ReaderEvent       ▲   │   ExecutorEvent              │
//!       └───────────────────────────┘   │  ◀──────────────────────────┘
//!                      InputEvent ──────┤
//!                                       ├──▶ StatusEvent (upward)
//!                                       └──▶ FrameSink::present
//! ```
//!
//! The coordinator only moves messages and never awaits device I/O.
//! Shutdown closes both request channels and joins both workers; work
//! already queued is allowed to finish.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capture::{DecodedFrame, FrameReader, ReaderConfig, ReaderEvent, ReaderRequest};
use crate::device::{DeviceShell, FrameSource};
use crate::error::MirrorError;
use crate::exec::{CommandExecutor, ExecutorConfig, ExecutorEvent, ExecutorRequest};
use crate::input::InputEvent;
use crate::state::{Effect, MirrorEvent, MirrorState, StateConfig, StatusEvent};

// ── FrameSink ────────────────────────────────────────────────────

/// Receives every accepted frame. Called on the coordinator task, so an
/// implementation must return quickly.
pub trait FrameSink: Send + 'static {
    fn present(&mut self, frame: DecodedFrame);
}

impl<F> FrameSink for F
where
    F: FnMut(DecodedFrame) + Send + 'static,
{
    fn present(&mut self, frame: DecodedFrame) {
        self(frame)
    }
}

// ── MirrorConfig ─────────────────────────────────────────────────

/// Configuration for the whole engine.
#[derive(Debug, Clone, Default)]
pub struct MirrorConfig {
    pub reader: ReaderConfig,
    pub executor: ExecutorConfig,
    pub state: StateConfig,
}

// ── MirrorHandle ─────────────────────────────────────────────────

/// Owner side of a running mirror.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) also
/// stops the mirror, but nothing waits for it.
pub struct MirrorHandle {
    input: UnboundedSender<InputEvent>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), MirrorError>>,
}

impl MirrorHandle {
    /// Queue one input event.
    pub fn send_input(&self, event: InputEvent) -> Result<(), MirrorError> {
        self.input.send(event)?;
        Ok(())
    }

    /// A cloneable sender for input producers on other tasks.
    pub fn input_sender(&self) -> UnboundedSender<InputEvent> {
        self.input.clone()
    }

    /// Whether the coordinator task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the mirror and wait for all three tasks to finish.
    pub async fn shutdown(mut self) -> Result<(), MirrorError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task.await?
    }
}

// ── Coordinator ──────────────────────────────────────────────────

struct Inbox {
    reader: UnboundedReceiver<ReaderEvent>,
    executor: UnboundedReceiver<ExecutorEvent>,
    input: UnboundedReceiver<InputEvent>,
    shutdown: oneshot::Receiver<()>,
}

/// Message pump between the state machine and its workers.
pub struct Coordinator<S> {
    state: MirrorState,
    sink: S,
    reader_tx: UnboundedSender<ReaderRequest>,
    executor_tx: UnboundedSender<ExecutorRequest>,
    status_tx: UnboundedSender<StatusEvent>,
    reader_task: JoinHandle<()>,
    executor_task: JoinHandle<()>,
}

impl<S: FrameSink> Coordinator<S> {
    /// Start the engine. Returns the control handle and the status stream.
    pub fn spawn(
        source: Arc<dyn FrameSource>,
        shell: Arc<dyn DeviceShell>,
        sink: S,
        config: MirrorConfig,
    ) -> (MirrorHandle, UnboundedReceiver<StatusEvent>) {
        let (reader_tx, reader_requests) = mpsc::unbounded_channel();
        let (reader_events_tx, reader_events) = mpsc::unbounded_channel();
        let (executor_tx, executor_requests) = mpsc::unbounded_channel();
        let (executor_events_tx, executor_events) = mpsc::unbounded_channel();
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let reader_task =
            FrameReader::new(source, config.reader, reader_events_tx).spawn(reader_requests);
        let executor_task = CommandExecutor::new(shell, config.executor, executor_events_tx)
            .spawn(executor_requests);

        let (state, initial) = MirrorState::new(config.state);
        let coordinator = Self {
            state,
            sink,
            reader_tx,
            executor_tx,
            status_tx,
            reader_task,
            executor_task,
        };
        let inbox = Inbox {
            reader: reader_events,
            executor: executor_events,
            input: input_rx,
            shutdown: shutdown_rx,
        };
        let task = tokio::spawn(coordinator.run(initial, inbox));

        let handle = MirrorHandle {
            input: input_tx,
            shutdown: Some(shutdown_tx),
            task,
        };
        (handle, status_rx)
    }

    async fn run(mut self, initial: Vec<Effect>, mut inbox: Inbox) -> Result<(), MirrorError> {
        info!("mirror started");
        self.apply(initial);

        loop {
            // Queued events are handled before a pending shutdown.
            let event: MirrorEvent = tokio::select! {
                biased;
                Some(ev) = inbox.reader.recv() => ev.into(),
                Some(ev) = inbox.executor.recv() => ev.into(),
                Some(ev) = inbox.input.recv() => ev.into(),
                _ = &mut inbox.shutdown => break,
                else => break,
            };
            let effects = self.state.handle(event);
            self.apply(effects);
        }

        self.state.shut_down();
        drop(self.reader_tx);
        drop(self.executor_tx);
        drop(inbox);

        let (reader, executor) = tokio::join!(self.reader_task, self.executor_task);
        reader?;
        executor?;
        info!("mirror stopped");
        Ok(())
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Reader(request) => {
                    if self.reader_tx.send(request).is_err() {
                        warn!(?request, "frame reader is gone");
                    }
                }
                Effect::Executor(request) => {
                    debug!(?request, "to executor");
                    if self.executor_tx.send(request).is_err() {
                        warn!("command executor is gone");
                    }
                }
                Effect::Status(status) => {
                    // Nobody listening is fine.
                    let _ = self.status_tx.send(status);
                }
                Effect::Present(frame) => self.sink.present(frame),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::FramebufferDescriptor;
    use crate::device::mock::MockBridge;
    use crate::scene::ScenePoint;
    use bytes::Bytes;
    use std::time::Duration;

    async fn wait_for(rx: &mut UnboundedReceiver<StatusEvent>, wanted: &StatusEvent) {
        let found = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(status) = rx.recv().await {
                if &status == wanted {
                    return true;
                }
            }
            false
        })
        .await;
        assert_eq!(found.ok(), Some(true), "never saw {wanted:?}");
    }

    #[tokio::test]
    async fn connects_presents_and_shuts_down() {
        let mock = Arc::new(MockBridge::new());
        let len = FramebufferDescriptor::default().frame_len();
        mock.push_frame(Ok(Some(Bytes::from(vec![9u8; len]))));

        let (frames_tx, mut frames) = mpsc::unbounded_channel();
        let sink = move |frame: DecodedFrame| {
            let _ = frames_tx.send(frame);
        };

        let (handle, mut status) =
            Coordinator::spawn(mock.clone(), mock.clone(), sink, MirrorConfig::default());
        wait_for(&mut status, &StatusEvent::Connected).await;

        let frame = tokio::time::timeout(Duration::from_secs(5), frames.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(frame.data.len(), len);

        handle
            .send_input(InputEvent::PointerPress(ScenePoint::new(5.0, 6.0)))
            .unwrap();
        handle
            .send_input(InputEvent::PointerRelease(ScenePoint::new(5.0, 6.0)))
            .unwrap();
        handle.shutdown().await.unwrap();

        let sent: Vec<String> = mock.executed().iter().map(ToString::to_string).collect();
        assert!(sent.contains(&"shell input tap 5 6".to_string()), "{sent:?}");
    }

    #[tokio::test]
    async fn dropping_the_handle_stops_the_mirror() {
        let mock = Arc::new(MockBridge::new());
        let (handle, mut status) = Coordinator::spawn(
            mock.clone(),
            mock.clone(),
            |_frame: DecodedFrame| {},
            MirrorConfig::default(),
        );
        wait_for(&mut status, &StatusEvent::Connected).await;
        drop(handle);

        let closed = tokio::time::timeout(Duration::from_secs(5), async {
            while status.recv().await.is_some() {}
        })
        .await;
        assert!(closed.is_ok());
    }
}
