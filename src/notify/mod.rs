//! Ownership-based subscriptions.
//!
//! A [`Subscription`] ties a registration to the lifetime of a handle.

pub mod subscription;

pub use subscription::Subscription;
