use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    thread::JoinHandle,
};

use crate::{
    assets::decode::encode_png,
    capture::device::{CameraSession, CaptureDevice, CaptureRequest, StreamInterrupt},
    composite::{
        compositor::{CompositeStyle, PreparedOverlay, draw_overlay, prepare_overlay},
        layout::PlacementParams,
    },
    foundation::{
        core::{Canvas, FrameRGBA},
        error::{TryOnError, TryOnResult},
    },
    live::{cancel::CancelToken, clock::FrameClock},
    overlay::selection::{OverlaySlot, SelectedOverlay},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiveState {
    Idle,
    /// Device open requested, no frame loop yet.
    Starting,
    Streaming,
}

#[derive(Debug, Default)]
struct Counters {
    frames_rendered: AtomicU64,
    steps_skipped: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LiveStats {
    pub frames_rendered: u64,
    pub steps_skipped: u64,
}

struct RenderTask {
    cancel: CancelToken,
    /// Unblocks a worker stuck inside a device read.
    interrupt: Option<Arc<dyn StreamInterrupt>>,
    session_id: u64,
    handle: JoinHandle<CameraSession>,
}

/// Composites a live capture stream with the selected overlay until stopped.
///
/// `start` opens the device and moves the session into a dedicated render thread; `stop`
/// cancels that thread, takes the session back and releases it. At most one session exists
/// per renderer. Dropping the renderer stops it.
pub struct LiveRenderer {
    device: Arc<dyn CaptureDevice>,
    request: CaptureRequest,
    params: PlacementParams,
    style: CompositeStyle,
    slot: OverlaySlot,
    state: LiveState,
    task: Option<RenderTask>,
    latest: Arc<Mutex<Option<FrameRGBA>>>,
    counters: Arc<Counters>,
}

impl std::fmt::Debug for LiveRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveRenderer")
            .field("state", &self.state)
            .field("session_id", &self.session_id())
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl LiveRenderer {
    pub fn new(device: Arc<dyn CaptureDevice>, slot: OverlaySlot) -> Self {
        Self {
            device,
            request: CaptureRequest::default(),
            params: PlacementParams::default(),
            style: CompositeStyle::default(),
            slot,
            state: LiveState::Idle,
            task: None,
            latest: Arc::new(Mutex::new(None)),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn with_request(mut self, request: CaptureRequest) -> Self {
        self.request = request;
        self
    }

    pub fn with_placement(mut self, params: PlacementParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_style(mut self, style: CompositeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn state(&self) -> LiveState {
        self.state
    }

    pub fn is_streaming(&self) -> bool {
        self.state == LiveState::Streaming
    }

    pub fn session_id(&self) -> Option<u64> {
        self.task.as_ref().map(|t| t.session_id)
    }

    pub fn slot(&self) -> &OverlaySlot {
        &self.slot
    }

    pub fn stats(&self) -> LiveStats {
        LiveStats {
            frames_rendered: self.counters.frames_rendered.load(Ordering::Relaxed),
            steps_skipped: self.counters.steps_skipped.load(Ordering::Relaxed),
        }
    }

    /// Last published surface.
    pub fn latest_frame(&self) -> Option<FrameRGBA> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Open the camera and start the frame loop. A no-op while already streaming.
    #[tracing::instrument(skip(self))]
    pub fn start(&mut self) -> TryOnResult<()> {
        if self.state == LiveState::Streaming {
            tracing::debug!("already streaming");
            return Ok(());
        }
        self.params.validate()?;
        self.style.validate()?;

        self.state = LiveState::Starting;
        let session = match CameraSession::open(self.device.as_ref(), &self.request) {
            Ok(s) => s,
            Err(e) => {
                self.state = LiveState::Idle;
                tracing::warn!("camera start failed: {e}");
                return Err(e);
            }
        };
        let session_id = session.id();
        let interrupt = session.interrupt_handle();

        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = None;
        let cancel = CancelToken::new();
        let worker = RenderWorker {
            session,
            slot: self.slot.clone(),
            params: self.params,
            style: self.style.clone(),
            latest: Arc::clone(&self.latest),
            counters: Arc::clone(&self.counters),
            cache: None,
        };
        let clock = FrameClock::new(self.request.frame_interval());
        let worker_cancel = cancel.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("aura-live-{session_id}"))
            .spawn(move || worker.run(clock, &worker_cancel));

        match spawned {
            Ok(handle) => {
                self.task = Some(RenderTask {
                    cancel,
                    interrupt,
                    session_id,
                    handle,
                });
                self.state = LiveState::Streaming;
                tracing::info!(session = session_id, "live overlay streaming");
                Ok(())
            }
            Err(e) => {
                self.state = LiveState::Idle;
                Err(TryOnError::camera_access(format!(
                    "failed to spawn render thread: {e}"
                )))
            }
        }
    }

    /// Cancel the frame loop, wait for the in-flight step and release the camera.
    ///
    /// A step blocked on the device is interrupted first, so this returns even when the
    /// camera has stopped delivering frames.
    #[tracing::instrument(skip(self))]
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel.cancel();
            if let Some(interrupt) = &task.interrupt {
                interrupt.interrupt();
            }
            task.handle.thread().unpark();
            match task.handle.join() {
                Ok(mut session) => session.release(),
                Err(_) => tracing::error!(session = task.session_id, "render thread panicked"),
            }
            tracing::info!(session = task.session_id, "live overlay stopped");
        }
        self.state = LiveState::Idle;
    }

    /// Encode the latest published surface as PNG.
    pub fn snapshot(&self) -> TryOnResult<Vec<u8>> {
        let frame = self
            .latest_frame()
            .ok_or_else(|| TryOnError::missing_input("no live frame has been rendered yet"))?;
        encode_png(&frame)
    }
}

impl Drop for LiveRenderer {
    fn drop(&mut self) {
        self.stop();
    }
}

struct RenderWorker {
    session: CameraSession,
    slot: OverlaySlot,
    params: PlacementParams,
    style: CompositeStyle,
    latest: Arc<Mutex<Option<FrameRGBA>>>,
    counters: Arc<Counters>,
    cache: Option<CachedOverlay>,
}

struct CachedOverlay {
    generation: u64,
    canvas: Canvas,
    prepared: PreparedOverlay,
}

impl RenderWorker {
    fn run(mut self, mut clock: FrameClock, cancel: &CancelToken) -> CameraSession {
        while clock.wait(cancel) {
            if let Err(e) = self.step() {
                self.counters.steps_skipped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(session = self.session.id(), "frame skipped: {e}");
            }
        }
        self.session
    }

    fn step(&mut self) -> TryOnResult<()> {
        let Some(mut surface) = self.session.read_frame()? else {
            return Err(TryOnError::missing_input("camera has no frame yet"));
        };

        if let Some(selected) = self.slot.current() {
            let prepared = self.prepared_for(&selected, surface.canvas())?;
            draw_overlay(&mut surface, &prepared, &self.style)?;
        }

        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(surface);
        self.counters.frames_rendered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Scaled overlay for this selection and frame size; a different size is a fresh layout.
    fn prepared_for(
        &mut self,
        selected: &SelectedOverlay,
        canvas: Canvas,
    ) -> TryOnResult<PreparedOverlay> {
        let hit = self
            .cache
            .as_ref()
            .is_some_and(|c| c.generation == selected.generation && c.canvas == canvas);
        if !hit {
            let prepared = prepare_overlay(canvas, &selected.image, &self.params, &self.style)?;
            tracing::debug!(
                generation = selected.generation,
                width = canvas.width,
                height = canvas.height,
                "overlay rescaled"
            );
            self.cache = Some(CachedOverlay {
                generation: selected.generation,
                canvas,
                prepared,
            });
        }
        match &self.cache {
            Some(c) => Ok(c.prepared.clone()),
            None => Err(TryOnError::validation("overlay cache is empty")),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/live/renderer.rs"]
mod tests;
