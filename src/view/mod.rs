//! Headless page logic: binds uploads, camera controls and storefront actions to the engine
//! and reports every outcome as a notification.

pub mod download;
pub mod live;
pub mod tryon;

use crate::{
    foundation::error::TryOnResult,
    store::notify::{Notification, Notifier},
};

/// Turn a failure into an error notification and hand it back to the caller.
pub(crate) fn report<T>(notifier: &dyn Notifier, result: TryOnResult<T>) -> TryOnResult<T> {
    if let Err(e) = &result {
        notifier.notify(Notification::error(e.to_string()));
    }
    result
}
