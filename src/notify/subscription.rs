//! Subscription handles that unregister on drop.

use crate::core::{Listener, RemovalMode, Shared, SharedListener, listener_addr};
use crate::error::ListenerError;
use std::fmt;
use std::sync::{Arc, Weak};

/// Registration owned by a single subscription.
///
/// Delegates to the subscribed listener but has an allocation of its own, so
/// removing it never touches another registration of the same listener.
struct Registration<E> {
    inner: SharedListener<E>,
}

impl<E> Listener<E> for Registration<E> {
    fn notify(&self, event: &E) -> Result<(), ListenerError> {
        self.inner.notify(event)
    }
}

/// Handle for a subscription that can be dropped to unsubscribe.
///
/// Created by [`NotificationRegistry::subscribe`]. When the handle is dropped,
/// the registration it created is removed and nothing else. The handle only
/// holds a weak reference to the registry, so it never keeps a registry alive.
///
/// [`NotificationRegistry::subscribe`]: crate::core::NotificationRegistry::subscribe
pub struct Subscription<E> {
    listener: SharedListener<E>,
    registration: SharedListener<E>,
    registry: Weak<Shared<E>>,
}

impl<E> Subscription<E> {
    /// Wrap a listener in a registration distinct from any other.
    pub(crate) fn registration_for(listener: &SharedListener<E>) -> SharedListener<E>
    where
        E: 'static,
    {
        Arc::new(Registration {
            inner: Arc::clone(listener),
        })
    }

    pub(crate) fn new(
        listener: SharedListener<E>,
        registration: SharedListener<E>,
        registry: Weak<Shared<E>>,
    ) -> Self {
        Self {
            listener,
            registration,
            registry,
        }
    }

    /// The listener this subscription delivers to.
    pub fn listener(&self) -> &SharedListener<E> {
        &self.listener
    }

    /// Check whether the subscription is still registered.
    ///
    /// False once the registry is gone or was cleared.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|shared| shared.contains(listener_addr(&self.registration)))
    }

    /// Unsubscribe now, reporting whether a registration was removed.
    pub fn unsubscribe(mut self) -> bool {
        self.release() > 0
    }

    /// Keep the registration alive after this handle is gone.
    ///
    /// Returns the registration so it can still be passed to
    /// [`NotificationRegistry::unregister`] later.
    ///
    /// [`NotificationRegistry::unregister`]: crate::core::NotificationRegistry::unregister
    pub fn detach(mut self) -> SharedListener<E> {
        self.registry = Weak::new();
        Arc::clone(&self.registration)
    }

    fn release(&mut self) -> usize {
        let registry = std::mem::take(&mut self.registry);
        let Some(shared) = registry.upgrade() else {
            return 0;
        };

        let removed = shared.remove(listener_addr(&self.registration), RemovalMode::First);

        #[cfg(feature = "tracing")]
        tracing::debug!(removed, "subscription released");

        removed
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<E> fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{NotificationRegistry, SharedListener, infallible};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn counter_listener(counter: &Arc<AtomicUsize>) -> SharedListener<u32> {
        let counter = Arc::clone(counter);
        infallible(move |_: &u32| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_subscribe_and_notify() {
        let registry = NotificationRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let _handle = registry.subscribe(counter_listener(&counter));

        registry.broadcast(1).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        registry.broadcast(2).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let registry = NotificationRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let handle = registry.subscribe(counter_listener(&counter));
        assert!(handle.is_active());
        registry.broadcast(1).unwrap();

        // Unsubscribe by dropping handle
        drop(handle);

        registry.broadcast(2).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_explicit_unsubscribe() {
        let registry = NotificationRegistry::<u32>::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let handle = registry.subscribe(counter_listener(&counter));
        assert!(handle.unsubscribe());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unsubscribe_after_clear() {
        let registry = NotificationRegistry::<u32>::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let handle = registry.subscribe(counter_listener(&counter));
        assert_eq!(registry.clear(), 1);
        assert!(!handle.is_active());
        assert!(!handle.unsubscribe());
    }

    #[test]
    fn test_detach_keeps_registration() {
        let registry = NotificationRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let listener = registry.subscribe(counter_listener(&counter)).detach();
        registry.broadcast(1).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        assert_eq!(registry.unregister(&listener), 1);
    }

    #[test]
    fn test_handle_outlives_registry() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = {
            let registry = NotificationRegistry::<u32>::new();
            registry.subscribe(counter_listener(&counter))
        };

        assert!(!handle.is_active());
        drop(handle);
    }

    #[test]
    fn test_drop_removes_single_registration() {
        let registry = NotificationRegistry::<u32>::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let listener = counter_listener(&counter);

        registry.register(Arc::clone(&listener));
        let handle = registry.subscribe(Arc::clone(&listener));
        assert_eq!(registry.len(), 2);

        drop(handle);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&listener));
    }

    #[test]
    fn test_drop_keeps_delivery_order() {
        let registry = NotificationRegistry::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let named = |name: &'static str| {
            let log = Arc::clone(&log);
            infallible(move |_: &u32| log.lock().unwrap().push(name))
        };
        let l: SharedListener<u32> = named("L");
        let m: SharedListener<u32> = named("M");

        registry.register(Arc::clone(&l));
        registry.register(Arc::clone(&m));
        let handle = registry.subscribe(Arc::clone(&l));
        drop(handle);

        registry.broadcast(1).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["L", "M"]);
    }

    #[test]
    fn test_subscription_is_separate_from_plain_registration() {
        let registry = NotificationRegistry::<u32>::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let listener = counter_listener(&counter);

        let handle = registry.subscribe(Arc::clone(&listener));
        assert!(!registry.contains(&listener));
        assert_eq!(registry.unregister(&listener), 0);
        assert!(handle.is_active());
        assert!(Arc::ptr_eq(handle.listener(), &listener));

        registry.broadcast(1).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
