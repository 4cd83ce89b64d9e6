//! Observer list for fallback notifications.

use eisenstein_core::FallbackNotification;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Callback invoked once per fallback storyboard.
pub type NotificationCallback = Arc<dyn Fn(&FallbackNotification) + Send + Sync>;

/// Handle returned by [`NotificationRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("callback-{}", _0)]
pub struct CallbackId(u64);

/// Registered notification callbacks. Clones share the same list.
#[derive(Clone, Default)]
pub struct NotificationRegistry {
    callbacks: Arc<parking_lot::Mutex<Vec<(CallbackId, NotificationCallback)>>>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for NotificationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationRegistry")
            .field("callbacks", &self.len())
            .finish()
    }
}

impl NotificationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a callback and returns the handle that removes it.
    pub fn register<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&FallbackNotification) + Send + Sync + 'static,
    {
        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.callbacks.lock().push((id, Arc::new(callback)));
        tracing::debug!(%id, "Registered notification callback");
        id
    }

    /// Removes a callback. Returns false when the handle was unknown.
    pub fn unregister(&self, id: CallbackId) -> bool {
        let mut callbacks = self.callbacks.lock();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        before != callbacks.len()
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.lock().len()
    }

    /// True when no callback is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `notification` to every callback, in registration order.
    ///
    /// Iterates over a copy of the list, so callbacks may register or
    /// unregister. A panicking callback is logged and skipped.
    pub fn notify(&self, notification: &FallbackNotification) {
        let callbacks: Vec<(CallbackId, NotificationCallback)> = self.callbacks.lock().clone();
        for (id, callback) in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(notification))).is_err() {
                tracing::warn!(%id, "Notification callback panicked; continuing");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eisenstein_core::FallbackReason;
    use std::sync::atomic::AtomicUsize;

    fn notification() -> FallbackNotification {
        FallbackNotification::fallback_used(&FallbackReason::ExtractionFailed, 1, vec![])
    }

    #[test]
    fn test_register_and_unregister() {
        let registry = NotificationRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let id = registry.register(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify(&notification());
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        registry.notify(&notification());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_callback_may_unregister_itself() {
        let registry = NotificationRegistry::new();
        let inner = registry.clone();
        let slot: Arc<parking_lot::Mutex<Option<CallbackId>>> = Arc::default();
        let handle = slot.clone();
        let id = registry.register(move |_| {
            if let Some(id) = *handle.lock() {
                inner.unregister(id);
            }
        });
        *slot.lock() = Some(id);

        registry.notify(&notification());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_panicking_callback_is_isolated() {
        let registry = NotificationRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        registry.register(|_| panic!("listener bug"));
        let counter = calls.clone();
        registry.register(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify(&notification());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
