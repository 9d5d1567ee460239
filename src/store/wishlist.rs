use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    foundation::error::TryOnResult,
    store::{
        catalog::Product,
        notify::{Notification, Notifier},
        persist::{KeyValueStore, WISHLIST_KEY, load_collection, save_collection},
    },
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    #[serde(flatten)]
    pub product: Product,
    /// Entries saved without a timestamp are stamped when loaded.
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

/// Saved products, unique by id, persisted under [`WISHLIST_KEY`].
pub struct WishlistManager {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    items: Vec<WishlistItem>,
}

impl std::fmt::Debug for WishlistManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WishlistManager")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

impl WishlistManager {
    pub fn load(store: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        let items: Vec<WishlistItem> = load_collection(store.as_ref(), WISHLIST_KEY);
        tracing::debug!(items = items.len(), "wishlist loaded");
        Self {
            store,
            notifier,
            items,
        }
    }

    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    pub fn is_in_wishlist(&self, product_id: &str) -> bool {
        self.items.iter().any(|i| i.product.id == product_id)
    }

    /// Returns `false` (and notifies) when the product was already saved.
    pub fn add_to_wishlist(&mut self, product: &Product) -> TryOnResult<bool> {
        self.add_to_wishlist_at(product, Utc::now())
    }

    #[tracing::instrument(skip(self, product), fields(product = %product.id))]
    pub fn add_to_wishlist_at(
        &mut self,
        product: &Product,
        added_at: DateTime<Utc>,
    ) -> TryOnResult<bool> {
        if self.is_in_wishlist(&product.id) {
            self.notifier.notify(Notification::info("Already in wishlist"));
            return Ok(false);
        }
        let mut next = self.items.clone();
        next.push(WishlistItem {
            product: product.clone(),
            added_at,
        });
        self.commit(next)?;
        self.notifier.notify(Notification::success("Added to wishlist"));
        Ok(true)
    }

    #[tracing::instrument(skip(self))]
    pub fn remove_from_wishlist(&mut self, product_id: &str) -> TryOnResult<()> {
        let mut next = self.items.clone();
        next.retain(|i| i.product.id != product_id);
        self.commit(next)?;
        self.notifier
            .notify(Notification::success("Removed from wishlist"));
        Ok(())
    }

    fn commit(&mut self, next: Vec<WishlistItem>) -> TryOnResult<()> {
        save_collection(self.store.as_ref(), WISHLIST_KEY, &next)?;
        self.items = next;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/wishlist.rs"]
mod tests;
