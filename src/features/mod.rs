//! Optional advanced features.

#[cfg(feature = "replay")]
pub mod replay;

#[cfg(feature = "replay")]
pub use replay::{CachedEvent, LatestEvent};
