//! Storefront collaborators: catalog, durable cart and wishlist, user notifications.

pub mod cart;
pub mod catalog;
pub mod notify;
pub mod persist;
pub mod wishlist;
