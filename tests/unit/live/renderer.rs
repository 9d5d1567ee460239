use std::{
    sync::Condvar,
    time::{Duration, Instant},
};

use super::*;
use crate::{
    assets::decode::decode_image,
    capture::{device::CaptureStream, still::StillCaptureDevice},
    overlay::selection::OverlayOrigin,
};

struct DeniedDevice;

impl CaptureDevice for DeniedDevice {
    fn open(&self, _request: &CaptureRequest) -> TryOnResult<Box<dyn CaptureStream>> {
        Err(TryOnError::camera_access("permission denied"))
    }
}

/// Camera that never delivers a frame: every read blocks until interrupted.
#[derive(Clone, Default)]
struct StalledDevice {
    gate: Arc<(Mutex<bool>, Condvar)>,
    stopped: Arc<Mutex<bool>>,
}

struct StalledStream(StalledDevice);

struct OpenGate(Arc<(Mutex<bool>, Condvar)>);

impl StreamInterrupt for OpenGate {
    fn interrupt(&self) {
        let (lock, cvar) = &*self.0;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }
}

impl CaptureDevice for StalledDevice {
    fn open(&self, _request: &CaptureRequest) -> TryOnResult<Box<dyn CaptureStream>> {
        Ok(Box::new(StalledStream(self.clone())))
    }
}

impl CaptureStream for StalledStream {
    fn read_frame(&mut self) -> TryOnResult<Option<FrameRGBA>> {
        let (lock, cvar) = &*self.0.gate;
        let mut open = lock.lock().unwrap();
        while !*open {
            open = cvar.wait(open).unwrap();
        }
        Err(TryOnError::camera_access("read interrupted"))
    }

    fn interrupt_handle(&self) -> Option<Arc<dyn StreamInterrupt>> {
        Some(Arc::new(OpenGate(Arc::clone(&self.0.gate))))
    }

    fn active_tracks(&self) -> usize {
        usize::from(!*self.0.stopped.lock().unwrap())
    }

    fn stop(&mut self) {
        *self.0.stopped.lock().unwrap() = true;
    }
}

fn gray(width: u32, height: u32) -> FrameRGBA {
    FrameRGBA::from_premul(width, height, [90, 90, 90, 255].repeat((width * height) as usize))
        .unwrap()
}

fn fast() -> CaptureRequest {
    CaptureRequest {
        fps: 200,
        ..CaptureRequest::default()
    }
}

fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn denied_start_returns_to_idle_without_a_loop() {
    let mut r = LiveRenderer::new(Arc::new(DeniedDevice), OverlaySlot::new());
    let err = r.start().unwrap_err();
    assert!(matches!(err, TryOnError::CameraAccess(_)));
    assert_eq!(r.state(), LiveState::Idle);
    assert!(r.session_id().is_none());
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(r.stats(), LiveStats::default());
    assert!(matches!(r.snapshot(), Err(TryOnError::MissingInput(_))));
}

#[test]
fn streams_frames_at_source_resolution() {
    let device = StillCaptureDevice::new(gray(32, 24));
    let mut r = LiveRenderer::new(Arc::new(device), OverlaySlot::new()).with_request(fast());
    r.start().unwrap();
    assert!(r.is_streaming());
    assert!(wait_until(|| r.stats().frames_rendered >= 2));

    let frame = r.latest_frame().unwrap();
    assert_eq!((frame.width, frame.height), (32, 24));
    assert_eq!(frame.pixel(16, 12), Some([90, 90, 90, 255]));

    let png = r.snapshot().unwrap();
    assert_eq!(decode_image(&png).unwrap().canvas(), frame.canvas());
    r.stop();
}

#[test]
fn second_start_is_a_no_op() {
    let device = StillCaptureDevice::new(gray(8, 8));
    let mut r = LiveRenderer::new(Arc::new(device.clone()), OverlaySlot::new()).with_request(fast());
    r.start().unwrap();
    let id = r.session_id();
    r.start().unwrap();
    assert_eq!(r.session_id(), id);
    assert_eq!(device.open_count(), 1);
    assert_eq!(device.live_tracks(), 1);
}

#[test]
fn stop_releases_tracks_and_restart_opens_a_fresh_session() {
    let device = StillCaptureDevice::new(gray(8, 8));
    let mut r = LiveRenderer::new(Arc::new(device.clone()), OverlaySlot::new()).with_request(fast());
    r.start().unwrap();
    let first = r.session_id().unwrap();

    r.stop();
    assert_eq!(r.state(), LiveState::Idle);
    assert_eq!(device.live_tracks(), 0);
    let rendered = r.stats().frames_rendered;
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(r.stats().frames_rendered, rendered);

    r.start().unwrap();
    assert_ne!(r.session_id().unwrap(), first);
    assert_eq!(device.open_count(), 2);
    assert_eq!(device.live_tracks(), 1);
}

#[test]
fn drop_releases_the_camera() {
    let device = StillCaptureDevice::new(gray(8, 8));
    {
        let mut r =
            LiveRenderer::new(Arc::new(device.clone()), OverlaySlot::new()).with_request(fast());
        r.start().unwrap();
        assert_eq!(device.live_tracks(), 1);
    }
    assert_eq!(device.live_tracks(), 0);
}

#[test]
fn overlay_switch_applies_to_later_frames_without_reopening() {
    let device = StillCaptureDevice::new(gray(40, 40));
    let slot = OverlaySlot::new();
    let mut r = LiveRenderer::new(Arc::new(device.clone()), slot.clone())
        .with_request(fast())
        .with_style(CompositeStyle::flat(1.0));
    r.start().unwrap();

    let red = crate::assets::decode::PreparedImage {
        width: 1,
        height: 1,
        rgba8_premul: Arc::new(vec![255, 0, 0, 255]),
    };
    let blue = crate::assets::decode::PreparedImage {
        width: 1,
        height: 1,
        rgba8_premul: Arc::new(vec![0, 0, 255, 255]),
    };

    // Placement on 40x40: 22x22 at (9, 9) with the default ratios.
    let center = |r: &LiveRenderer| r.latest_frame().and_then(|f| f.pixel(20, 20));

    slot.set(OverlayOrigin::Upload("red".into()), red);
    assert!(wait_until(|| center(&r) == Some([255, 0, 0, 255])));

    slot.set(OverlayOrigin::Upload("blue".into()), blue);
    assert!(wait_until(|| center(&r) == Some([0, 0, 255, 255])));

    slot.clear();
    assert!(wait_until(|| center(&r) == Some([90, 90, 90, 255])));
    assert_eq!(device.open_count(), 1);
}

#[test]
fn invalid_style_is_rejected_before_opening_the_device() {
    let device = StillCaptureDevice::new(gray(8, 8));
    let mut r = LiveRenderer::new(Arc::new(device.clone()), OverlaySlot::new())
        .with_style(CompositeStyle::flat(2.0));
    assert!(matches!(r.start(), Err(TryOnError::Validation(_))));
    assert_eq!(r.state(), LiveState::Idle);
    assert_eq!(device.open_count(), 0);
}

#[test]
fn stop_returns_while_the_camera_read_is_blocked() {
    let device = StalledDevice::default();
    let mut r = LiveRenderer::new(Arc::new(device.clone()), OverlaySlot::new()).with_request(fast());
    r.start().unwrap();
    // Let the worker reach the blocking read.
    std::thread::sleep(Duration::from_millis(30));

    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        r.stop();
        tx.send(r.state()).unwrap();
    });
    let state = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("stop hung on a blocked read");
    assert_eq!(state, LiveState::Idle);
    assert!(*device.stopped.lock().unwrap());
    assert!(*device.gate.0.lock().unwrap(), "pending read was interrupted");
}
