//! Core types and trait definitions for the amour photo service.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! photo lifecycle rules live here; persistence and asset hosting are reached
//! through the [`store::PhotoStore`] and [`asset::AssetStore`] traits.

pub mod asset;
pub mod error;
pub mod lifecycle;
pub mod photo;
pub mod store;
pub mod user;

pub use error::{BoxError, Error, Result};
pub use lifecycle::PhotoLifecycle;

#[cfg(test)]
mod tests;
