//! Aura try-on is the image-overlay engine behind the storefront's "virtual try-on".
//!
//! It lays a clothing image over a person, either once on a still photo or continuously on a
//! live camera feed, using plain 2D CPU compositing:
//!
//! - [`StaticCompositor`] composites one base photo with one overlay into a PNG
//! - [`LiveRenderer`] runs a cancellable render thread over a [`CaptureDevice`] stream
//! - [`OverlaySelector`] resolves the overlay from a catalog [`Product`] or an upload
//! - [`CartManager`] and [`WishlistManager`] persist through an injected [`KeyValueStore`]
//! - [`TryOnView`] and [`LiveTryOnView`] wire it together and report through a [`Notifier`]
#![forbid(unsafe_code)]

mod assets;
mod foundation;

/// Camera capture devices and sessions.
pub mod capture;
/// Placement, blending and the static compositor.
pub mod composite;
/// Serde-loaded engine configuration.
pub mod config;
/// Live overlay rendering.
pub mod live;
/// Overlay source selection.
pub mod overlay;
/// Catalog, cart, wishlist, persistence and notifications.
pub mod store;
/// Headless page logic.
pub mod view;

pub use crate::assets::decode::{PreparedImage, decode_image, encode_png, sniff_format};
pub use crate::assets::source::{DefaultImageLoader, ImageLoader, ImageSource, decode_data_uri};
pub use crate::foundation::core::{Canvas, FrameRGBA, Point, Rect, Size};
pub use crate::foundation::error::{TryOnError, TryOnResult};

#[cfg(feature = "media-ffmpeg")]
pub use crate::capture::ffmpeg::FfmpegCaptureDevice;
pub use crate::capture::device::{
    CameraSession, CaptureDevice, CaptureRequest, CaptureStream, Facing, StreamInterrupt,
};
pub use crate::capture::still::StillCaptureDevice;
pub use crate::composite::blend::BlendMode;
pub use crate::composite::compositor::{
    BlendPass, CompositeResult, CompositeStyle, StaticCompositor, composite_frame,
};
pub use crate::composite::layout::{PixelRect, Placement, PlacementParams, compute_placement};
pub use crate::composite::shadow::DropShadow;
pub use crate::config::TryOnConfig;
pub use crate::live::cancel::CancelToken;
pub use crate::live::renderer::{LiveRenderer, LiveState, LiveStats};
pub use crate::overlay::selection::{OverlayOrigin, OverlaySelector, OverlaySlot, SelectedOverlay};
pub use crate::store::cart::{CartItem, CartManager};
pub use crate::store::catalog::{Catalog, Money, Product};
pub use crate::store::notify::{
    Notification, NotificationLevel, Notifier, RecordingNotifier, TracingNotifier,
};
pub use crate::store::persist::{CART_KEY, JsonFileStore, KeyValueStore, MemoryStore, WISHLIST_KEY};
pub use crate::store::wishlist::{WishlistItem, WishlistManager};
pub use crate::view::download::snapshot_file_name;
pub use crate::view::live::LiveTryOnView;
pub use crate::view::tryon::TryOnView;
