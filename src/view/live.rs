use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};

use crate::{
    capture::device::CaptureDevice,
    config::TryOnConfig,
    foundation::error::{TryOnError, TryOnResult},
    live::renderer::LiveRenderer,
    overlay::selection::{OverlaySelector, SelectedOverlay},
    store::{
        cart::CartManager,
        catalog::Product,
        notify::{Notification, Notifier},
        wishlist::WishlistManager,
    },
    view::{
        download::{snapshot_file_name, write_png},
        report,
    },
};

/// Live camera try-on page.
///
/// The renderer and the selector share one overlay slot, so a new selection shows up on the
/// next rendered frame. Dropping the view releases the camera.
pub struct LiveTryOnView {
    renderer: LiveRenderer,
    selector: OverlaySelector,
    cart: CartManager,
    wishlist: WishlistManager,
    notifier: Arc<dyn Notifier>,
    download_prefix: String,
}

impl std::fmt::Debug for LiveTryOnView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveTryOnView")
            .field("renderer", &self.renderer)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

impl LiveTryOnView {
    pub fn new(
        device: Arc<dyn CaptureDevice>,
        selector: OverlaySelector,
        cart: CartManager,
        wishlist: WishlistManager,
        notifier: Arc<dyn Notifier>,
        config: &TryOnConfig,
    ) -> Self {
        let renderer = LiveRenderer::new(device, selector.slot().clone())
            .with_request(config.capture)
            .with_placement(config.placement)
            .with_style(config.style.clone());
        Self {
            renderer,
            selector,
            cart,
            wishlist,
            notifier,
            download_prefix: config.download_prefix.clone(),
        }
    }

    pub fn renderer(&self) -> &LiveRenderer {
        &self.renderer
    }

    pub fn selector(&self) -> &OverlaySelector {
        &self.selector
    }

    pub fn cart(&self) -> &CartManager {
        &self.cart
    }

    pub fn wishlist(&self) -> &WishlistManager {
        &self.wishlist
    }

    pub fn start_camera(&mut self) -> TryOnResult<()> {
        let already = self.renderer.is_streaming();
        report(self.notifier.as_ref(), self.renderer.start())?;
        if !already {
            self.notifier.notify(Notification::success("Camera started"));
        }
        Ok(())
    }

    pub fn stop_camera(&mut self) {
        if self.renderer.is_streaming() {
            self.renderer.stop();
            self.notifier.notify(Notification::info("Camera stopped"));
        }
    }

    pub fn select_product(&mut self, product_id: &str) -> TryOnResult<Arc<SelectedOverlay>> {
        let selected = report(
            self.notifier.as_ref(),
            self.selector.select_product(product_id),
        )?;
        let title = self
            .selector
            .catalog()
            .get(product_id)
            .map_or(product_id, |p| p.title.as_str());
        self.notifier
            .notify(Notification::success(format!("Selected: {title}")));
        Ok(selected)
    }

    pub fn upload_overlay(&mut self, name: &str, bytes: &[u8]) -> TryOnResult<Arc<SelectedOverlay>> {
        let selected = report(self.notifier.as_ref(), self.selector.select_upload(name, bytes))?;
        self.notifier
            .notify(Notification::success(format!("Selected: {name}")));
        Ok(selected)
    }

    pub fn clear_overlay(&mut self) {
        self.selector.clear();
    }

    /// Save the latest live frame into `dir`.
    pub fn snapshot_to(&self, dir: &Path, at: DateTime<Utc>) -> TryOnResult<PathBuf> {
        let result = self.renderer.snapshot().and_then(|png| {
            write_png(dir, &snapshot_file_name(&self.download_prefix, at), &png)
        });
        let path = report(self.notifier.as_ref(), result)?;
        self.notifier.notify(Notification::success("Snapshot saved!"));
        Ok(path)
    }

    fn selected_product(&self) -> TryOnResult<Product> {
        self.selector
            .current_product()
            .cloned()
            .ok_or_else(|| TryOnError::missing_input("select a catalog product first"))
    }

    pub fn add_selected_to_cart(&mut self) -> TryOnResult<()> {
        let result = self
            .selected_product()
            .and_then(|p| self.cart.add_to_cart(&p));
        report(self.notifier.as_ref(), result)
    }

    /// Returns `false` when the product was already in the wishlist.
    pub fn add_selected_to_wishlist(&mut self) -> TryOnResult<bool> {
        let result = self
            .selected_product()
            .and_then(|p| self.wishlist.add_to_wishlist(&p));
        report(self.notifier.as_ref(), result)
    }

    pub fn is_selected_in_wishlist(&self) -> bool {
        self.selector
            .current_product()
            .is_some_and(|p| self.wishlist.is_in_wishlist(&p.id))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/view/live.rs"]
mod tests;
