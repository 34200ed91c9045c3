//! # observer-registry
//!
//! Synchronous observer/listener registry with snapshot broadcasts and explicit
//! failure policies.
//!
//! ## Overview
//!
//! `observer-registry` provides the subject side of the observer pattern:
//! - Any type (or closure) implementing [`Listener`](core::Listener) can subscribe
//! - Broadcasts reach every listener in registration order, on the calling thread
//! - Each broadcast iterates a lock-free snapshot (`arc-swap`), so listeners may
//!   register or unregister others mid-broadcast without disturbing it
//! - Listener failures are never swallowed: pick fail-fast or best-effort
//!
//! ## Quick Start
//!
//! ```rust
//! use observer_registry::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! # fn example() -> observer_registry::error::Result<()> {
//! let publisher = NotificationRegistry::builder()
//!     .with_delivery_policy(DeliveryPolicy::BestEffort)
//!     .build::<String>();
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let seen_clone = Arc::clone(&seen);
//! let reader = infallible(move |news: &String| {
//!     seen_clone.lock().unwrap().push(news.clone());
//! });
//!
//! publisher.register(reader.clone());
//! publisher.broadcast("Breaking: sunny weather forecast".to_string())?;
//!
//! publisher.unregister(&reader);
//! publisher.broadcast("New subscription rates".to_string())?;
//!
//! assert_eq!(seen.lock().unwrap().len(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Features
//!
//! - **Reference identity**: listeners are compared by allocation, never by value
//! - **Duplicates allowed**: registering twice means being notified twice
//! - **Subscriptions**: RAII handles that unregister on drop
//! - **Replay**: cache the latest event for late joiners (`replay`, default)
//! - **Settings**: choose policies from YAML/TOML/JSON files and env vars
//!
//! ## Feature Flags
//!
//! ```toml
//! [dependencies]
//! observer-registry = { version = "0.1", features = ["tracing", "metrics"] }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod features;
pub mod notify;
pub mod settings;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        DeliveryPolicy, Listener, NotificationRegistry, NotificationRegistryBuilder, RemovalMode,
        SharedListener, infallible,
    };
    pub use crate::error::{ListenerError, ListenerFailure, RegistryError, Result};
    pub use crate::notify::Subscription;
    pub use crate::settings::RegistrySettings;
}
