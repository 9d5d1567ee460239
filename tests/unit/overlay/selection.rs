use std::{borrow::Cow, io::Cursor};

use super::*;
use crate::store::catalog::Money;

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 30, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn product(id: &str, image: &str) -> Product {
    Product {
        id: id.to_string(),
        title: format!("Item {id}"),
        price: Money::from_cents(1000),
        description: String::new(),
        category: "Tops".to_string(),
        image: image.to_string(),
        sizes: vec![],
    }
}

/// Serves a fixed PNG for `good.png` and garbage for everything else.
struct FixtureLoader {
    good: Vec<u8>,
}

impl ImageLoader for FixtureLoader {
    fn load<'a>(&self, source: &'a ImageSource) -> TryOnResult<Cow<'a, [u8]>> {
        match source {
            ImageSource::Path(p) if p.ends_with("good.png") => Ok(Cow::Owned(self.good.clone())),
            ImageSource::Path(_) => Ok(Cow::Borrowed(b"garbage")),
            other => Err(TryOnError::validation(format!(
                "unreachable: {}",
                other.describe()
            ))),
        }
    }
}

fn selector() -> OverlaySelector {
    let catalog = Catalog::new(vec![
        product("ok", "good.png"),
        product("broken", "bad.png"),
        product("remote", "https://example.invalid/x.png"),
    ])
    .unwrap();
    OverlaySelector::new(Arc::new(catalog)).with_loader(Arc::new(FixtureLoader { good: png(4, 6) }))
}

#[test]
fn selecting_a_product_decodes_before_it_becomes_current() {
    let s = selector();
    assert!(s.current().is_none());

    let sel = s.select_product("ok").unwrap();
    assert_eq!(sel.origin, OverlayOrigin::Product("ok".to_string()));
    assert_eq!((sel.image.width, sel.image.height), (4, 6));
    assert_eq!(s.current().unwrap().generation, sel.generation);
    assert_eq!(s.current_product().unwrap().id, "ok");
}

#[test]
fn failures_keep_the_previous_selection() {
    let s = selector();
    let first = s.select_product("ok").unwrap();

    for id in ["missing", "broken", "remote"] {
        let err = s.select_product(id).unwrap_err();
        assert!(matches!(err, TryOnError::OverlayLoad(_)), "{id}: {err}");
        assert_eq!(s.current().unwrap().generation, first.generation);
    }

    let err = s.select_upload("notes.txt", b"hello").unwrap_err();
    assert!(matches!(err, TryOnError::OverlayLoad(_)));
    assert_eq!(s.current().unwrap().generation, first.generation);
}

#[test]
fn uploads_replace_and_bump_generation() {
    let s = selector();
    let a = s.select_product("ok").unwrap();
    let b = s.select_upload("shirt.png", &png(3, 3)).unwrap();
    assert!(b.generation > a.generation);
    assert_eq!(b.origin, OverlayOrigin::Upload("shirt.png".to_string()));
    assert!(s.current_product().is_none());

    s.clear();
    assert!(s.current().is_none());
}

#[test]
fn jpeg_uploads_are_accepted() {
    let img = image::RgbImage::from_pixel(5, 5, image::Rgb([10, 200, 10]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .unwrap();
    let sel = selector().select_upload("photo.jpg", &buf).unwrap();
    assert_eq!((sel.image.width, sel.image.height), (5, 5));
}

#[test]
fn slot_clones_share_state() {
    let slot = OverlaySlot::new();
    let s = selector().with_slot(slot.clone());
    s.select_product("ok").unwrap();
    assert!(slot.current().is_some());
    slot.clear();
    assert!(s.current().is_none());
}
