use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use crate::foundation::{
    core::FrameRGBA,
    error::{TryOnError, TryOnResult},
};

/// Which camera to ask for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    /// Front camera, facing the person trying clothes on.
    #[default]
    User,
    Environment,
}

/// Constraints passed to [`CaptureDevice::open`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptureRequest {
    pub width: u32,
    pub height: u32,
    pub facing: Facing,
    pub audio: bool,
    pub fps: u32,
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            facing: Facing::User,
            audio: false,
            fps: 30,
        }
    }
}

impl CaptureRequest {
    pub fn validate(&self) -> TryOnResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TryOnError::validation(
                "capture width/height must be non-zero",
            ));
        }
        if self.fps == 0 || self.fps > 240 {
            return Err(TryOnError::validation(format!(
                "capture fps must be in 1..=240, got {}",
                self.fps
            )));
        }
        Ok(())
    }

    /// Time between two frame-clock ticks.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.fps.max(1)))
    }
}

/// Wakes a thread blocked in [`CaptureStream::read_frame`] from another thread.
///
/// After `interrupt` the pending read returns (usually with an error) and later reads may
/// fail; the owner is expected to stop the stream next.
pub trait StreamInterrupt: Send + Sync {
    fn interrupt(&self);
}

/// A running capture stream. Owned by exactly one [`CameraSession`].
pub trait CaptureStream: Send {
    /// Latest frame, or `None` when the device has nothing new yet.
    fn read_frame(&mut self) -> TryOnResult<Option<FrameRGBA>>;

    /// Handle that can unblock a pending read. Streams whose reads never block have none.
    fn interrupt_handle(&self) -> Option<Arc<dyn StreamInterrupt>> {
        None
    }

    /// Number of tracks (video, audio) still live on this stream.
    fn active_tracks(&self) -> usize;

    /// Stop every track. Must be idempotent.
    fn stop(&mut self);
}

/// Something that can grant access to a camera.
pub trait CaptureDevice: Send + Sync {
    fn open(&self, request: &CaptureRequest) -> TryOnResult<Box<dyn CaptureStream>>;
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// An acquired capture stream.
///
/// Releasing stops all tracks; it happens on [`CameraSession::release`] or on drop, whichever
/// comes first.
pub struct CameraSession {
    id: u64,
    stream: Box<dyn CaptureStream>,
    released: bool,
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("id", &self.id)
            .field("released", &self.released)
            .finish()
    }
}

impl CameraSession {
    /// Ask `device` for a stream. Any refusal is reported as [`TryOnError::CameraAccess`].
    #[tracing::instrument(skip(device))]
    pub fn open(device: &dyn CaptureDevice, request: &CaptureRequest) -> TryOnResult<Self> {
        request.validate()?;
        let stream = device.open(request).map_err(|e| match e {
            TryOnError::CameraAccess(_) => e,
            other => TryOnError::camera_access(other.to_string()),
        })?;
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(session = id, "camera session opened");
        Ok(Self {
            id,
            stream,
            released: false,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn read_frame(&mut self) -> TryOnResult<Option<FrameRGBA>> {
        if self.released {
            return Err(TryOnError::camera_access(format!(
                "camera session {} was released",
                self.id
            )));
        }
        self.stream.read_frame()
    }

    pub fn active_tracks(&self) -> usize {
        self.stream.active_tracks()
    }

    pub fn interrupt_handle(&self) -> Option<Arc<dyn StreamInterrupt>> {
        self.stream.interrupt_handle()
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.stream.stop();
        self.released = true;
        tracing::debug!(session = self.id, "camera session released");
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/device.rs"]
mod tests;
