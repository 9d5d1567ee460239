use std::io::Cursor;

use chrono::TimeZone as _;

use super::*;
use crate::{
    composite::{compositor::CompositeStyle, layout::PlacementParams},
    store::notify::{NotificationLevel, RecordingNotifier},
};

fn png(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn view() -> (TryOnView, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let compositor =
        StaticCompositor::new(PlacementParams::default(), CompositeStyle::default()).unwrap();
    (TryOnView::new(compositor, notifier.clone()), notifier)
}

#[test]
fn preview_requires_both_uploads() {
    let (mut v, notifier) = view();
    v.upload_person(png(20, 30, [200, 180, 160, 255]));
    assert!(matches!(
        v.generate_preview(),
        Err(TryOnError::MissingInput(_))
    ));
    let n = notifier.last().unwrap();
    assert_eq!(n.level, NotificationLevel::Error);
    assert_eq!(n.message, "Please upload both person and clothing images");
    assert!(v.preview().is_none());
}

#[test]
fn preview_then_download() {
    let (mut v, notifier) = view();
    v.upload_person(png(20, 30, [200, 180, 160, 255]));
    v.upload_clothing(png(5, 5, [20, 20, 120, 255]));
    let out = v.generate_preview().unwrap();
    assert_eq!((out.frame.width, out.frame.height), (20, 30));
    assert_eq!(notifier.last().unwrap().message, "Try-on preview generated!");

    let dir = std::env::temp_dir().join(format!("aura-tryon-view-{}", std::process::id()));
    let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    let path = v.download(&dir, at).unwrap();
    assert!(path.ends_with("aura-tryon-20250102-030405-000.png"));
    assert_eq!(
        std::fs::read(&path).unwrap(),
        v.preview().unwrap().png
    );
    assert_eq!(notifier.last().unwrap().message, "Preview downloaded!");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn download_without_preview_is_reported() {
    let (v, notifier) = view();
    let err = v.download(&std::env::temp_dir(), Utc::now()).unwrap_err();
    assert!(matches!(err, TryOnError::MissingInput(_)));
    assert_eq!(notifier.last().unwrap().level, NotificationLevel::Error);
}

#[test]
fn bad_upload_is_reported_and_view_stays_usable() {
    let (mut v, notifier) = view();
    v.upload_person(png(10, 10, [1, 2, 3, 255]));
    v.upload_clothing(b"definitely not an image".to_vec());
    assert!(matches!(
        v.generate_preview(),
        Err(TryOnError::OverlayLoad(_))
    ));
    assert_eq!(notifier.last().unwrap().level, NotificationLevel::Error);

    v.upload_clothing(png(2, 2, [9, 9, 9, 255]));
    assert!(v.generate_preview().is_ok());
}
