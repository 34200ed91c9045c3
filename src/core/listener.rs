//! The listener capability and closure adapters.

use crate::error::ListenerError;
use std::fmt;
use std::sync::Arc;

/// Shared, type-erased listener reference as stored by a registry.
///
/// Registries compare these by allocation address, so two separately
/// allocated listeners are always distinct even if they hold equal data.
pub type SharedListener<E> = Arc<dyn Listener<E>>;

/// Anything that wants to receive events of type `E`.
///
/// Implement this on your own types, or pass a closure: every
/// `Fn(&E) -> Result<(), ListenerError>` is a listener.
///
/// # Examples
///
/// ```rust
/// use observer_registry::prelude::{Listener, ListenerError};
/// use std::sync::Mutex;
///
/// struct Inbox {
///     name: &'static str,
///     received: Mutex<Vec<String>>,
/// }
///
/// impl Listener<String> for Inbox {
///     fn notify(&self, event: &String) -> Result<(), ListenerError> {
///         if event.is_empty() {
///             return Err(ListenerError::msg(format!("{} got an empty issue", self.name)));
///         }
///         self.received.lock().unwrap().push(event.clone());
///         Ok(())
///     }
/// }
/// ```
pub trait Listener<E>: Send + Sync {
    /// Handle one event.
    ///
    /// # Errors
    ///
    /// Returning an error marks this delivery as failed; what happens to the
    /// rest of the broadcast depends on the registry's [`DeliveryPolicy`].
    ///
    /// [`DeliveryPolicy`]: crate::core::DeliveryPolicy
    fn notify(&self, event: &E) -> Result<(), ListenerError>;
}

impl<E, F> Listener<E> for F
where
    F: Fn(&E) -> Result<(), ListenerError> + Send + Sync,
{
    fn notify(&self, event: &E) -> Result<(), ListenerError> {
        self(event)
    }
}

/// Listener adapter for closures that cannot fail.
///
/// Created by [`infallible`].
pub struct Infallible<F>(F);

impl<E, F> Listener<E> for Infallible<F>
where
    F: Fn(&E) + Send + Sync,
{
    fn notify(&self, event: &E) -> Result<(), ListenerError> {
        (self.0)(event);
        Ok(())
    }
}

impl<F> fmt::Debug for Infallible<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Infallible").finish_non_exhaustive()
    }
}

/// Wrap a closure that never fails into a shareable listener.
///
/// # Examples
///
/// ```rust
/// use observer_registry::prelude::*;
///
/// let registry = NotificationRegistry::<u32>::new();
/// let printer = infallible(|level: &u32| println!("level is now {level}"));
/// registry.register(printer.clone());
/// registry.broadcast(3).unwrap();
/// ```
pub fn infallible<E, F>(f: F) -> Arc<Infallible<F>>
where
    F: Fn(&E) + Send + Sync,
{
    Arc::new(Infallible(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_closure_is_listener() {
        let listener = |value: &i32| {
            if *value < 0 {
                Err(ListenerError::msg("negative"))
            } else {
                Ok(())
            }
        };
        assert!(listener.notify(&1).is_ok());
        assert!(listener.notify(&-1).is_err());
    }

    #[test]
    fn test_infallible_adapter() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let listener = infallible(move |_: &&str| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        listener.notify(&"a").unwrap();
        listener.notify(&"b").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
