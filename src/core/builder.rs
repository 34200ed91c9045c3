//! Builder for constructing NotificationRegistry instances.

use crate::core::{DeliveryPolicy, NotificationRegistry, RemovalMode};
use crate::settings::RegistrySettings;

#[cfg(feature = "metrics")]
use crate::metrics::RegistryMetrics;

/// Builder for constructing a `NotificationRegistry` instance.
///
/// Policies are fixed when the registry is built, so every broadcast of one
/// registry follows the same failure and removal rules.
///
/// # Examples
///
/// ```rust
/// use observer_registry::prelude::*;
///
/// let registry = NotificationRegistry::builder()
///     .with_delivery_policy(DeliveryPolicy::FailFast)
///     .with_removal_mode(RemovalMode::All)
///     .build::<String>();
///
/// assert_eq!(registry.delivery_policy(), DeliveryPolicy::FailFast);
/// ```
pub struct NotificationRegistryBuilder {
    policy: DeliveryPolicy,
    removal: RemovalMode,
    #[cfg(feature = "replay")]
    cache_latest: bool,
    #[cfg(feature = "metrics")]
    metrics: Option<RegistryMetrics>,
}

impl NotificationRegistryBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            policy: DeliveryPolicy::default(),
            removal: RemovalMode::default(),
            #[cfg(feature = "replay")]
            cache_latest: false,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Set how broadcasts react to failing listeners.
    pub fn with_delivery_policy(mut self, policy: DeliveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set whether `unregister` removes the first or every matching registration.
    pub fn with_removal_mode(mut self, removal: RemovalMode) -> Self {
        self.removal = removal;
        self
    }

    /// Keep the most recent event so late joiners can be caught up.
    ///
    /// See [`NotificationRegistry::register_and_replay`].
    #[cfg(feature = "replay")]
    pub fn with_latest_cache(mut self, enabled: bool) -> Self {
        self.cache_latest = enabled;
        self
    }

    /// Apply loaded settings, overriding anything set so far.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use observer_registry::prelude::*;
    ///
    /// # fn example() -> Result<()> {
    /// let settings = RegistrySettings::loader()
    ///     .with_file("config/registry.yaml")
    ///     .with_env_overrides("APP", "__")
    ///     .load()?;
    ///
    /// let registry = NotificationRegistry::builder()
    ///     .with_settings(&settings)
    ///     .build::<String>();
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_settings(mut self, settings: &RegistrySettings) -> Self {
        self.policy = settings.delivery_policy;
        self.removal = settings.removal_mode;
        #[cfg(feature = "replay")]
        {
            self.cache_latest = settings.cache_latest;
        }
        self
    }

    /// Record broadcast metrics with the given OpenTelemetry meter.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(RegistryMetrics::new(meter));
        self
    }

    /// Build the registry.
    ///
    /// # Type Parameters
    ///
    /// * `E` - The event type delivered to listeners
    pub fn build<E>(self) -> NotificationRegistry<E> {
        let registry = NotificationRegistry::with_policies(self.policy, self.removal);

        #[cfg(feature = "replay")]
        let registry = if self.cache_latest {
            registry.with_latest_cache()
        } else {
            registry
        };

        #[cfg(feature = "metrics")]
        let registry = match self.metrics {
            Some(metrics) => registry.with_metrics(metrics),
            None => registry,
        };

        registry
    }
}

impl Default for NotificationRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationRegistry<()> {
    /// Create a new builder for constructing a registry.
    pub fn builder() -> NotificationRegistryBuilder {
        NotificationRegistryBuilder::new()
    }
}
