//! layerpak - Buildpack dependency and layer support
//!
//! Resolves dependencies declared in `buildpack.toml`, downloads and caches
//! them with checksum verification, and contributes them to layers that are
//! only rebuilt when their metadata changes.

pub mod binding;
pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod dependency;
pub mod error;
pub mod layer;
pub mod logger;
pub mod sbom;

pub use context::BuildContext;
pub use error::{PakError, PakResult};
pub use logger::Logger;
