//! Dependency catalogue model and resolution
//!
//! A buildpack declares the artifacts it can install in `buildpack.toml`.
//! The resolver selects one entry per request; the checksum ties the entry
//! to the bytes that end up on disk.

pub mod checksum;
pub mod metadata;
pub mod resolve;
pub mod version;

pub use checksum::{Algorithm, Checksum};
pub use metadata::{DependencyMetadata, License, ANY_STACK};
pub use resolve::{architecture, Deprecation, DependencyResolver};
pub use version::{parse_version, VersionConstraint};
