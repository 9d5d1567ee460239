use std::sync::Arc;

use crate::{
    foundation::error::TryOnResult,
    store::{
        catalog::{Money, Product},
        notify::{Notification, Notifier},
        persist::{CART_KEY, KeyValueStore, load_collection, save_collection},
    },
};

/// A product snapshot with a quantity of at least one.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> Money {
        self.product
            .price
            .checked_mul(self.quantity)
            .unwrap_or(Money::from_cents(u64::MAX))
    }
}

/// Shopping cart persisted under [`CART_KEY`].
///
/// Mutations are staged on a copy and committed only after the save succeeds.
pub struct CartManager {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    items: Vec<CartItem>,
}

impl std::fmt::Debug for CartManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartManager")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

impl CartManager {
    pub fn load(store: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        let mut items: Vec<CartItem> = load_collection(store.as_ref(), CART_KEY);
        items.retain(|i| i.quantity >= 1);
        tracing::debug!(lines = items.len(), "cart loaded");
        Self {
            store,
            notifier,
            items,
        }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.items.iter().any(|i| i.product.id == product_id)
    }

    pub fn total(&self) -> Money {
        self.items.iter().fold(Money::ZERO, |acc, i| {
            acc.checked_add(i.line_total())
                .unwrap_or(Money::from_cents(u64::MAX))
        })
    }

    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    #[tracing::instrument(skip(self, product), fields(product = %product.id))]
    pub fn add_to_cart(&mut self, product: &Product) -> TryOnResult<()> {
        let mut next = self.items.clone();
        let message = match next.iter_mut().find(|i| i.product.id == product.id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(1);
                "Updated quantity in cart"
            }
            None => {
                next.push(CartItem {
                    product: product.clone(),
                    quantity: 1,
                });
                "Added to cart"
            }
        };
        self.commit(next)?;
        self.notifier.notify(Notification::success(message));
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn remove_from_cart(&mut self, product_id: &str) -> TryOnResult<()> {
        let mut next = self.items.clone();
        next.retain(|i| i.product.id != product_id);
        self.commit(next)?;
        self.notifier.notify(Notification::success("Removed from cart"));
        Ok(())
    }

    /// Set a line's quantity. Anything below one removes the line.
    #[tracing::instrument(skip(self))]
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> TryOnResult<()> {
        if quantity < 1 {
            return self.remove_from_cart(product_id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let mut next = self.items.clone();
        for line in next.iter_mut().filter(|i| i.product.id == product_id) {
            line.quantity = quantity;
        }
        self.commit(next)
    }

    pub fn clear_cart(&mut self) -> TryOnResult<()> {
        self.commit(Vec::new())?;
        self.notifier.notify(Notification::success("Cart cleared"));
        Ok(())
    }

    fn commit(&mut self, next: Vec<CartItem>) -> TryOnResult<()> {
        save_collection(self.store.as_ref(), CART_KEY, &next)?;
        self.items = next;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/cart.rs"]
mod tests;
