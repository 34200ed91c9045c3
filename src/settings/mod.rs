//! Registry settings loaded from files and environment variables.
//!
//! Settings pick the registry policies at startup without recompiling:
//!
//! ```yaml
//! delivery_policy: fail-fast
//! removal_mode: all
//! cache_latest: true
//! ```

mod loader;

pub use loader::SettingsLoader;

use crate::core::{DeliveryPolicy, RemovalMode};
use serde::{Deserialize, Serialize};

/// Policies for a registry, as read from configuration.
///
/// Every field is optional in the source; missing fields take the defaults
/// of [`NotificationRegistry::new`](crate::core::NotificationRegistry::new).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// How broadcasts react to failing listeners
    pub delivery_policy: DeliveryPolicy,
    /// Which registrations `unregister` removes
    pub removal_mode: RemovalMode,
    /// Keep the latest event for late joiners
    #[cfg(feature = "replay")]
    pub cache_latest: bool,
}

impl RegistrySettings {
    /// Create a loader for reading settings from files and the environment.
    pub fn loader() -> SettingsLoader {
        SettingsLoader::new()
    }
}
