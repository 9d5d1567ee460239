use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    assets::{
        decode::{PreparedImage, decode_image},
        source::{DefaultImageLoader, ImageLoader, ImageSource},
    },
    foundation::error::{TryOnError, TryOnResult},
    store::catalog::{Catalog, Product},
};

/// Where the current overlay came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverlayOrigin {
    /// Catalog product id.
    Product(String),
    /// Uploaded file name.
    Upload(String),
}

#[derive(Debug)]
pub struct SelectedOverlay {
    pub origin: OverlayOrigin,
    pub image: PreparedImage,
    /// Increases with every successful selection.
    pub generation: u64,
}

/// Shared handle to the decoded overlay in use.
///
/// Cloning gives another handle to the same slot; readers see a new selection on their next
/// [`OverlaySlot::current`] call.
#[derive(Clone, Debug, Default)]
pub struct OverlaySlot {
    current: Arc<RwLock<Option<Arc<SelectedOverlay>>>>,
    next_generation: Arc<AtomicU64>,
}

impl OverlaySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<SelectedOverlay>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, origin: OverlayOrigin, image: PreparedImage) -> Arc<SelectedOverlay> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let selected = Arc::new(SelectedOverlay {
            origin,
            image,
            generation,
        });
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&selected));
        selected
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Resolves the overlay from a catalog product or an uploaded file.
///
/// A failed selection never touches the slot.
pub struct OverlaySelector {
    catalog: Arc<Catalog>,
    loader: Arc<dyn ImageLoader>,
    slot: OverlaySlot,
}

impl std::fmt::Debug for OverlaySelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlaySelector")
            .field("products", &self.catalog.len())
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl OverlaySelector {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            loader: Arc::new(DefaultImageLoader::new()),
            slot: OverlaySlot::new(),
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_slot(mut self, slot: OverlaySlot) -> Self {
        self.slot = slot;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn slot(&self) -> &OverlaySlot {
        &self.slot
    }

    pub fn current(&self) -> Option<Arc<SelectedOverlay>> {
        self.slot.current()
    }

    /// The catalog product behind the current selection, if it came from the catalog.
    pub fn current_product(&self) -> Option<&Product> {
        match &self.current()?.origin {
            OverlayOrigin::Product(id) => self.catalog.get(id),
            OverlayOrigin::Upload(_) => None,
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn select_product(&self, product_id: &str) -> TryOnResult<Arc<SelectedOverlay>> {
        let product = self.catalog.get(product_id).ok_or_else(|| {
            TryOnError::overlay_load(format!("unknown product '{product_id}'"))
        })?;
        let source = ImageSource::parse(&product.image);
        let image = self
            .loader
            .load(&source)
            .and_then(|bytes| decode_image(&bytes))
            .map_err(|e| {
                tracing::warn!(source = %source.describe(), "product image failed: {e}");
                e.into_overlay_load()
            })?;
        tracing::info!(
            product = product_id,
            width = image.width,
            height = image.height,
            "overlay selected"
        );
        Ok(self
            .slot
            .set(OverlayOrigin::Product(product_id.to_string()), image))
    }

    /// Decode uploaded bytes locally; any format the decoder recognizes is accepted.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn select_upload(&self, name: &str, bytes: &[u8]) -> TryOnResult<Arc<SelectedOverlay>> {
        let image = decode_image(bytes).map_err(TryOnError::into_overlay_load)?;
        tracing::info!(
            upload = name,
            width = image.width,
            height = image.height,
            "overlay uploaded"
        );
        Ok(self.slot.set(OverlayOrigin::Upload(name.to_string()), image))
    }

    pub fn clear(&self) {
        self.slot.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/selection.rs"]
mod tests;
