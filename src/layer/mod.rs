//! Layer contribution
//!
//! Layers are directories under the layers root that the lifecycle exports
//! into the build and/or launch image. Contributors decide whether a layer
//! from a previous build can be reused or must be rebuilt.

pub mod compare;
pub mod contributor;
pub mod dependency;
pub mod helper;
pub mod layers;

pub use compare::metadata_matches;
pub use contributor::{contribute_layer, Contributable, GenericLayer, LayerContributor};
pub use dependency::{copy_artifact, DependencyLayer, Installer};
pub use helper::{HelperLayer, HELPER_LAYER};
pub use layers::{Layer, LayerTypes, Layers};
