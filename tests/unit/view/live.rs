use std::{
    io::Cursor,
    time::{Duration, Instant},
};

use super::*;
use crate::{
    assets::source::{ImageLoader, ImageSource},
    capture::{device::CaptureRequest, still::StillCaptureDevice},
    foundation::core::FrameRGBA,
    store::{
        catalog::Catalog,
        notify::{NotificationLevel, RecordingNotifier},
        persist::MemoryStore,
    },
};

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([250, 0, 0, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Every catalog image resolves to the same small PNG.
struct SamePng(Vec<u8>);

impl ImageLoader for SamePng {
    fn load<'a>(&self, _source: &'a ImageSource) -> TryOnResult<std::borrow::Cow<'a, [u8]>> {
        Ok(std::borrow::Cow::Owned(self.0.clone()))
    }
}

struct DeniedCamera;

impl CaptureDevice for DeniedCamera {
    fn open(
        &self,
        _request: &CaptureRequest,
    ) -> TryOnResult<Box<dyn crate::capture::device::CaptureStream>> {
        Err(TryOnError::camera_access("NotAllowedError: permission denied"))
    }
}

fn view() -> (LiveTryOnView, StillCaptureDevice, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let store = Arc::new(MemoryStore::new());
    let device = StillCaptureDevice::new(
        FrameRGBA::from_premul(16, 16, [40, 40, 40, 255].repeat(256)).unwrap(),
    );
    let selector = OverlaySelector::new(Arc::new(Catalog::builtin()))
        .with_loader(Arc::new(SamePng(png(4, 4))));
    let config = TryOnConfig {
        capture: CaptureRequest {
            fps: 200,
            ..CaptureRequest::default()
        },
        ..TryOnConfig::default()
    };
    let v = LiveTryOnView::new(
        Arc::new(device.clone()),
        selector,
        CartManager::load(store.clone(), notifier.clone()),
        WishlistManager::load(store, notifier.clone()),
        notifier.clone(),
        &config,
    );
    (v, device, notifier)
}

#[test]
fn camera_lifecycle_is_reported() {
    let (mut v, device, notifier) = view();
    v.start_camera().unwrap();
    v.start_camera().unwrap();
    assert_eq!(device.open_count(), 1);
    v.stop_camera();
    assert_eq!(device.live_tracks(), 0);

    let messages: Vec<String> = notifier.take().into_iter().map(|n| n.message).collect();
    assert_eq!(messages, vec!["Camera started", "Camera stopped"]);
}

#[test]
fn cart_and_wishlist_need_a_catalog_selection() {
    let (mut v, _, notifier) = view();
    assert!(matches!(
        v.add_selected_to_cart(),
        Err(TryOnError::MissingInput(_))
    ));
    assert_eq!(notifier.last().unwrap().level, NotificationLevel::Error);

    v.upload_overlay("mine.png", &png(3, 3)).unwrap();
    assert!(v.add_selected_to_wishlist().is_err());

    v.select_product("4").unwrap();
    assert_eq!(notifier.last().unwrap().message, "Selected: Cashmere Sweater");
    v.add_selected_to_cart().unwrap();
    v.add_selected_to_cart().unwrap();
    assert_eq!(v.cart().item_count(), 2);

    assert!(!v.is_selected_in_wishlist());
    assert!(v.add_selected_to_wishlist().unwrap());
    assert!(!v.add_selected_to_wishlist().unwrap());
    assert!(v.is_selected_in_wishlist());
}

#[test]
fn unknown_product_keeps_current_overlay() {
    let (mut v, _, notifier) = view();
    let first = v.select_product("1").unwrap();
    assert!(v.select_product("nope").is_err());
    assert_eq!(notifier.last().unwrap().level, NotificationLevel::Error);
    assert_eq!(
        v.selector().current().unwrap().generation,
        first.generation
    );
}

#[test]
fn snapshot_is_written_after_frames_render() {
    let (mut v, _, _) = view();
    let dir = std::env::temp_dir().join(format!("aura-tryon-live-view-{}", std::process::id()));
    assert!(v.snapshot_to(&dir, Utc::now()).is_err());

    v.select_product("2").unwrap();
    v.start_camera().unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while v.renderer().stats().frames_rendered == 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(2));
    }
    let path = v.snapshot_to(&dir, Utc::now()).unwrap();
    assert!(path.exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn denied_camera_notifies_and_stays_idle() {
    let notifier = Arc::new(RecordingNotifier::new());
    let store = Arc::new(MemoryStore::new());
    let mut v = LiveTryOnView::new(
        Arc::new(DeniedCamera),
        OverlaySelector::new(Arc::new(Catalog::builtin())),
        CartManager::load(store.clone(), notifier.clone()),
        WishlistManager::load(store, notifier.clone()),
        notifier.clone(),
        &TryOnConfig::default(),
    );

    assert!(matches!(v.start_camera(), Err(TryOnError::CameraAccess(_))));
    assert_eq!(v.renderer().state(), crate::live::renderer::LiveState::Idle);
    assert!(v.renderer().session_id().is_none());

    let sent = notifier.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].level, NotificationLevel::Error);
    assert!(sent[0].message.contains("permission denied"));

    // Still usable afterwards: a stop is a quiet no-op.
    v.stop_camera();
    assert!(notifier.take().is_empty());
}
