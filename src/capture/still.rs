use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crate::{
    assets::decode::{PreparedImage, decode_image},
    capture::device::{CaptureDevice, CaptureRequest, CaptureStream},
    foundation::{core::FrameRGBA, error::TryOnResult},
};

/// A capture device that replays one still image as every frame.
///
/// Used for headless runs and demos. Tracks are counted across every stream it opened, so
/// callers can check that a session really let go of the camera.
#[derive(Clone, Debug)]
pub struct StillCaptureDevice {
    frame: Arc<FrameRGBA>,
    live_tracks: Arc<AtomicUsize>,
    opened: Arc<AtomicUsize>,
}

impl StillCaptureDevice {
    pub fn new(frame: FrameRGBA) -> Self {
        Self {
            frame: Arc::new(frame),
            live_tracks: Arc::new(AtomicUsize::new(0)),
            opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn from_image(image: &PreparedImage) -> Self {
        Self::new(image.to_frame())
    }

    pub fn from_encoded(bytes: &[u8]) -> TryOnResult<Self> {
        Ok(Self::from_image(&decode_image(bytes)?))
    }

    /// Tracks currently live across all streams from this device.
    pub fn live_tracks(&self) -> usize {
        self.live_tracks.load(Ordering::SeqCst)
    }

    /// How many times a stream has been opened.
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl CaptureDevice for StillCaptureDevice {
    fn open(&self, request: &CaptureRequest) -> TryOnResult<Box<dyn CaptureStream>> {
        let tracks = if request.audio { 2 } else { 1 };
        self.live_tracks.fetch_add(tracks, Ordering::SeqCst);
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StillStream {
            frame: Arc::clone(&self.frame),
            tracks,
            live_tracks: Arc::clone(&self.live_tracks),
        }))
    }
}

struct StillStream {
    frame: Arc<FrameRGBA>,
    tracks: usize,
    live_tracks: Arc<AtomicUsize>,
}

impl CaptureStream for StillStream {
    fn read_frame(&mut self) -> TryOnResult<Option<FrameRGBA>> {
        if self.tracks == 0 {
            return Ok(None);
        }
        Ok(Some(self.frame.as_ref().clone()))
    }

    fn active_tracks(&self) -> usize {
        self.tracks
    }

    fn stop(&mut self) {
        let n = std::mem::take(&mut self.tracks);
        self.live_tracks.fetch_sub(n, Ordering::SeqCst);
    }
}

impl Drop for StillStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/still.rs"]
mod tests;
