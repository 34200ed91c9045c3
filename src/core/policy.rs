//! Delivery and removal policies fixed when a registry is built.

use serde::{Deserialize, Serialize};

/// How `broadcast` reacts when a listener returns an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryPolicy {
    /// Stop at the first failing listener and report it.
    ///
    /// Listeners after the failing one do not receive the event.
    FailFast,

    /// Deliver to every listener, then report all failures together.
    #[default]
    BestEffort,
}

/// Which registrations `unregister` removes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemovalMode {
    /// Remove only the earliest matching registration.
    #[default]
    First,

    /// Remove every matching registration.
    All,
}
