//! Asset host backends for amour photos.
//!
//! - [`CloudinaryStore`]: the hosted image service, over its signed REST API.
//! - [`DiskStore`]: a local directory, for development and single-host setups.
//! - [`AnyAssetStore`]: picks one of the above from [`AssetConfig`] at startup.

mod any;
mod cloudinary;
mod disk;

pub mod error;

pub use any::{AnyAssetStore, AssetConfig};
pub use cloudinary::{CloudinaryConfig, CloudinaryStore, sign};
pub use disk::{DiskConfig, DiskStore};
pub use error::{Error, Result};
