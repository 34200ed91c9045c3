//! Core registry types.

mod builder;
mod listener;
mod policy;
mod registry;

pub use builder::NotificationRegistryBuilder;
pub use listener::{Infallible, Listener, SharedListener, infallible};
pub use policy::{DeliveryPolicy, RemovalMode};
pub use registry::NotificationRegistry;
pub(crate) use registry::{Shared, listener_addr};
