//! Built-in metrics for registry operations.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Broadcasts started
//! - Successful deliveries and listener failures
//! - Broadcast duration
//! - Registered listeners
//! - Time since the last broadcast
//!
//! # Examples
//!
//! ```rust,no_run
//! use observer_registry::prelude::*;
//! use opentelemetry::global;
//!
//! let meter = global::meter("my-app");
//!
//! let registry = NotificationRegistry::builder()
//!     .with_metrics(meter)
//!     .build::<String>();
//! ```

mod registry_metrics;

pub use registry_metrics::{MetricsSnapshot, RegistryMetrics};
