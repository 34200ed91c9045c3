//! The notification registry providing snapshot broadcasts.

use crate::core::listener::SharedListener;
use crate::core::{DeliveryPolicy, RemovalMode};
use crate::error::{ListenerFailure, RegistryError, Result};
use crate::notify::Subscription;
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "replay")]
use crate::features::{CachedEvent, LatestEvent};

#[cfg(feature = "metrics")]
use crate::metrics::RegistryMetrics;

/// Address used to identify a listener allocation, ignoring vtable metadata.
pub(crate) fn listener_addr<L: ?Sized>(listener: &Arc<L>) -> *const () {
    Arc::as_ptr(listener).cast::<()>()
}

/// Listener list shared by every handle to one registry.
///
/// Writers replace the whole list (copy-on-write); readers take an `Arc` to
/// the current list and iterate it without holding any lock. Every structural
/// change reports the new listener count to the metrics collector, whichever
/// handle or subscription made it.
pub(crate) struct Shared<E> {
    listeners: ArcSwap<Vec<SharedListener<E>>>,
    #[cfg(feature = "metrics")]
    metrics: Option<RegistryMetrics>,
}

impl<E> Shared<E> {
    fn new() -> Self {
        Self {
            listeners: ArcSwap::from_pointee(Vec::new()),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    #[cfg(feature = "metrics")]
    fn with_metrics(metrics: RegistryMetrics) -> Self {
        Self {
            listeners: ArcSwap::from_pointee(Vec::new()),
            metrics: Some(metrics),
        }
    }

    /// Append a listener, returning its position.
    pub(crate) fn push(&self, listener: SharedListener<E>) -> usize {
        let previous = self.listeners.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&listener));
            next
        });
        self.record_listener_count();
        previous.len()
    }

    /// Remove registrations of the listener at `target`.
    ///
    /// Returns how many registrations were removed.
    pub(crate) fn remove(&self, target: *const (), mode: RemovalMode) -> usize {
        if !self.contains(target) {
            return 0;
        }

        let mut removed = 0;
        self.listeners.rcu(|current| {
            removed = 0;
            let mut next = Vec::with_capacity(current.len());
            for listener in current.iter() {
                let matches = listener_addr(listener) == target;
                if matches && (mode == RemovalMode::All || removed == 0) {
                    removed += 1;
                } else {
                    next.push(Arc::clone(listener));
                }
            }
            next
        });
        self.record_listener_count();
        removed
    }

    pub(crate) fn contains(&self, target: *const ()) -> bool {
        self.listeners
            .load()
            .iter()
            .any(|listener| listener_addr(listener) == target)
    }

    fn clear(&self) -> usize {
        let removed = self.listeners.swap(Arc::new(Vec::new())).len();
        self.record_listener_count();
        removed
    }

    fn len(&self) -> usize {
        self.listeners.load().len()
    }

    fn snapshot(&self) -> Arc<Vec<SharedListener<E>>> {
        self.listeners.load_full()
    }

    #[cfg(feature = "metrics")]
    fn metrics(&self) -> Option<&RegistryMetrics> {
        self.metrics.as_ref()
    }

    fn record_listener_count(&self) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.update_listener_count(self.len());
        }
    }
}

/// A registry of listeners that broadcasts events to all of them.
///
/// Listeners are notified synchronously on the calling thread, in the order
/// they were registered. Every broadcast iterates a snapshot of the listener
/// list taken when it starts, so registrations and removals made meanwhile
/// (including by a listener) only affect later broadcasts.
///
/// Cloning a registry yields another handle to the same listener list.
///
/// # Examples
///
/// ```rust
/// use observer_registry::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let registry = NotificationRegistry::<String>::new();
/// let inbox = Arc::new(Mutex::new(Vec::new()));
///
/// let inbox_clone = Arc::clone(&inbox);
/// let subscriber = infallible(move |news: &String| {
///     inbox_clone.lock().unwrap().push(news.clone());
/// });
///
/// registry.register(subscriber.clone());
/// registry.broadcast("Sunny weather forecast".to_string())?;
///
/// registry.unregister(&subscriber);
/// registry.broadcast("New subscription rates".to_string())?;
///
/// assert_eq!(*inbox.lock().unwrap(), vec!["Sunny weather forecast".to_string()]);
/// # Ok::<(), RegistryError>(())
/// ```
pub struct NotificationRegistry<E> {
    shared: Arc<Shared<E>>,
    policy: DeliveryPolicy,
    removal: RemovalMode,
    #[cfg(feature = "replay")]
    latest: Option<Arc<LatestEvent<E>>>,
}

impl<E> NotificationRegistry<E> {
    /// Create a registry with the default policies.
    ///
    /// Best-effort delivery, first-occurrence removal, no event cache.
    pub fn new() -> Self {
        Self::with_policies(DeliveryPolicy::default(), RemovalMode::default())
    }

    /// Create a registry with explicit policies and no optional features.
    pub(crate) fn with_policies(policy: DeliveryPolicy, removal: RemovalMode) -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            policy,
            removal,
            #[cfg(feature = "replay")]
            latest: None,
        }
    }

    /// Enable the latest-event cache.
    #[cfg(feature = "replay")]
    pub(crate) fn with_latest_cache(mut self) -> Self {
        self.latest = Some(Arc::new(LatestEvent::new()));
        self
    }

    /// Attach a metrics collector.
    ///
    /// Only called while building, before any listener is registered.
    #[cfg(feature = "metrics")]
    pub(crate) fn with_metrics(mut self, metrics: RegistryMetrics) -> Self {
        self.shared = Arc::new(Shared::with_metrics(metrics));
        self
    }

    /// Register a listener at the end of the delivery order.
    ///
    /// Always succeeds. Registering the same listener again adds a second
    /// registration, and it will be notified once per registration.
    pub fn register(&self, listener: SharedListener<E>) {
        let _position = self.shared.push(listener);

        #[cfg(feature = "tracing")]
        tracing::debug!(position = _position, "listener registered");
    }

    /// Register a listener and get a handle that unregisters it when dropped.
    ///
    /// The subscription owns a registration of its own: dropping it removes
    /// exactly that registration, leaving any other registration of the same
    /// listener (and its place in the delivery order) untouched. Because of
    /// that, [`unregister`](Self::unregister) and [`contains`](Self::contains)
    /// called with the original listener do not see subscribed registrations;
    /// use the handle instead.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use observer_registry::prelude::*;
    ///
    /// let registry = NotificationRegistry::<u8>::new();
    /// let subscription = registry.subscribe(infallible(|_: &u8| {}));
    /// assert_eq!(registry.len(), 1);
    ///
    /// drop(subscription);
    /// assert!(registry.is_empty());
    /// ```
    pub fn subscribe(&self, listener: SharedListener<E>) -> Subscription<E>
    where
        E: 'static,
    {
        let registration = Subscription::registration_for(&listener);
        self.register(Arc::clone(&registration));
        Subscription::new(listener, registration, Arc::downgrade(&self.shared))
    }

    /// Remove a listener, compared by reference identity.
    ///
    /// With [`RemovalMode::First`] only the earliest registration is removed,
    /// with [`RemovalMode::All`] every registration is. Returns how many
    /// registrations were removed; `0` means the listener was not registered
    /// and nothing changed.
    pub fn unregister<L: ?Sized>(&self, listener: &Arc<L>) -> usize {
        let removed = self.shared.remove(listener_addr(listener), self.removal);

        #[cfg(feature = "tracing")]
        tracing::debug!(removed, "listener unregistered");

        removed
    }

    /// Check whether a listener is currently registered.
    pub fn contains<L: ?Sized>(&self, listener: &Arc<L>) -> bool {
        self.shared.contains(listener_addr(listener))
    }

    /// Remove every registration, returning how many there were.
    pub fn clear(&self) -> usize {
        self.shared.clear()
    }

    /// Number of registrations (duplicates counted separately).
    pub fn len(&self) -> usize {
        self.shared.len()
    }

    /// Check if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The policy applied when a listener fails.
    pub fn delivery_policy(&self) -> DeliveryPolicy {
        self.policy
    }

    /// The policy applied by [`unregister`](Self::unregister).
    pub fn removal_mode(&self) -> RemovalMode {
        self.removal
    }

    /// Deliver an event to every registered listener.
    ///
    /// Returns the number of listeners notified successfully.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::ListenerFailed`] under [`DeliveryPolicy::FailFast`]:
    ///   the first failing listener; listeners after it were not notified.
    /// - [`RegistryError::BroadcastFailed`] under [`DeliveryPolicy::BestEffort`]:
    ///   every failure, reported after all listeners were notified.
    ///
    /// A panicking listener is not caught; the panic unwinds to the caller
    /// and the registry remains usable.
    pub fn broadcast(&self, event: E) -> Result<usize> {
        #[cfg(feature = "replay")]
        if let Some(cache) = &self.latest {
            let event = Arc::new(event);
            cache.record(Arc::clone(&event));
            return self.deliver(&event);
        }

        self.deliver(&event)
    }

    fn deliver(&self, event: &E) -> Result<usize> {
        let snapshot = self.shared.snapshot();

        #[cfg(feature = "metrics")]
        let timer = self.shared.metrics().map(|m| m.start_broadcast());

        let mut delivered = 0;
        let mut failures = Vec::new();
        for (position, listener) in snapshot.iter().enumerate() {
            match listener.notify(event) {
                Ok(()) => delivered += 1,
                Err(error) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(position, error = %error, "listener failed during broadcast");

                    failures.push(ListenerFailure::new(position, error));
                    if self.policy == DeliveryPolicy::FailFast {
                        break;
                    }
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(
            listeners = snapshot.len(),
            delivered,
            failed = failures.len(),
            "broadcast complete"
        );

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(timer)) = (self.shared.metrics(), timer) {
            metrics.record_broadcast(timer, delivered, failures.len());
        }

        match (self.policy, failures.len()) {
            (_, 0) => Ok(delivered),
            (DeliveryPolicy::FailFast, _) => {
                Err(RegistryError::ListenerFailed(failures.swap_remove(0)))
            }
            (DeliveryPolicy::BestEffort, _) => Err(RegistryError::BroadcastFailed {
                attempted: snapshot.len(),
                failures,
            }),
        }
    }

    /// The metrics collector attached by the builder, if any.
    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> Option<&RegistryMetrics> {
        self.shared.metrics()
    }

    /// The most recently broadcast event, if caching is enabled and a
    /// broadcast has happened.
    #[cfg(feature = "replay")]
    pub fn latest(&self) -> Option<Arc<CachedEvent<E>>> {
        self.latest.as_ref().and_then(|cache| cache.get())
    }

    /// Drop the cached event so late joiners get nothing to replay.
    ///
    /// Versions keep counting up from where they were.
    #[cfg(feature = "replay")]
    pub fn clear_latest(&self) {
        if let Some(cache) = &self.latest {
            cache.clear();
        }
    }

    /// Register a listener and immediately deliver the cached event to it.
    ///
    /// Returns `Ok(false)` when there is nothing to replay (caching disabled
    /// or no broadcast yet). The listener stays registered either way.
    ///
    /// Delivery is at-least-once: when another thread broadcasts between the
    /// registration and the replay, the listener receives that event from the
    /// broadcast and again from the replay.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ListenerFailed`] if the listener fails on the
    /// replayed event.
    #[cfg(feature = "replay")]
    pub fn register_and_replay(&self, listener: SharedListener<E>) -> Result<bool> {
        let position = self.shared.push(Arc::clone(&listener));

        let Some(cached) = self.latest() else {
            return Ok(false);
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(position, version = cached.version, "replaying latest event");

        let outcome = listener.notify(&cached.event);

        #[cfg(feature = "metrics")]
        if let Some(metrics) = self.shared.metrics() {
            metrics.record_replay(outcome.is_ok());
        }

        outcome
            .map_err(|error| RegistryError::ListenerFailed(ListenerFailure::new(position, error)))?;
        Ok(true)
    }
}

impl<E> Default for NotificationRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for NotificationRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            policy: self.policy,
            removal: self.removal,
            #[cfg(feature = "replay")]
            latest: self.latest.clone(),
        }
    }
}

impl<E> fmt::Debug for NotificationRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationRegistry")
            .field("listeners", &self.len())
            .field("policy", &self.policy)
            .field("removal", &self.removal)
            .finish_non_exhaustive()
    }
}
