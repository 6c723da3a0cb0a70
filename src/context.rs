//! Build context
//!
//! Collects the inputs the lifecycle hands a buildpack: its own directory and
//! descriptor, the layers root, the platform directory with its bindings, and
//! the target stack.

use crate::binding::Bindings;
use crate::config::{BuildpackDescriptor, BuildpackMetadata, ConfigurationResolver};
use crate::dependency::{DependencyResolver, ANY_STACK};
use crate::error::{PakError, PakResult};
use crate::layer::Layers;
use crate::logger::Logger;
use std::env;
use std::path::{Path, PathBuf};

pub const BUILDPACK_DIR_ENV: &str = "CNB_BUILDPACK_DIR";
pub const LAYERS_DIR_ENV: &str = "CNB_LAYERS_DIR";
pub const PLATFORM_DIR_ENV: &str = "CNB_PLATFORM_DIR";
pub const STACK_ID_ENV: &str = "CNB_STACK_ID";

const DEFAULT_LAYERS_DIR: &str = "/layers";
const DEFAULT_PLATFORM_DIR: &str = "/platform";

/// Everything a build step needs from its environment
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub descriptor: BuildpackDescriptor,
    pub metadata: BuildpackMetadata,
    pub buildpack_path: PathBuf,
    pub layers: Layers,
    pub platform_path: PathBuf,
    pub bindings: Bindings,
    /// Target stack; `None` when the platform names none, which disables
    /// stack filtering during resolution
    pub stack: Option<String>,
}

impl BuildContext {
    /// Load the descriptor from `<buildpack>/buildpack.toml` and bindings from
    /// the platform directory
    pub fn new(
        buildpack_path: impl Into<PathBuf>,
        layers_path: impl Into<PathBuf>,
        platform_path: impl Into<PathBuf>,
        stack: Option<String>,
    ) -> PakResult<Self> {
        let buildpack_path = buildpack_path.into();
        let platform_path = platform_path.into();

        let descriptor_path = buildpack_path.join("buildpack.toml");
        if !descriptor_path.is_file() {
            return Err(PakError::PathNotFound(descriptor_path));
        }
        let descriptor = BuildpackDescriptor::from_file(&descriptor_path)?;
        let metadata = descriptor.typed_metadata()?;
        let bindings = Bindings::from_path(&Bindings::root(&platform_path))?;

        Ok(Self {
            descriptor,
            metadata,
            buildpack_path,
            layers: Layers::new(layers_path),
            platform_path,
            bindings,
            stack: stack.filter(|s| !s.is_empty()),
        })
    }

    /// Build from the `CNB_*` environment
    pub fn from_env() -> PakResult<Self> {
        let buildpack = env::var(BUILDPACK_DIR_ENV).map_err(|_| {
            PakError::User(format!("${} is not set", BUILDPACK_DIR_ENV))
        })?;
        Self::new(
            buildpack,
            env_path(LAYERS_DIR_ENV, DEFAULT_LAYERS_DIR),
            env_path(PLATFORM_DIR_ENV, DEFAULT_PLATFORM_DIR),
            env::var(STACK_ID_ENV).ok(),
        )
    }

    /// Resolver over this buildpack's dependencies for the target stack
    pub fn dependency_resolver(&self, logger: Logger) -> DependencyResolver {
        let dependencies = self.metadata.dependencies.clone();
        match &self.stack {
            Some(stack) => DependencyResolver::new(dependencies, stack.clone(), logger),
            None => DependencyResolver::new(dependencies, ANY_STACK, logger).without_stack_filter(),
        }
    }

    pub fn configuration_resolver(&self) -> ConfigurationResolver {
        ConfigurationResolver::new(self.metadata.configurations.clone())
    }

    pub fn buildpack_path(&self) -> &Path {
        &self.buildpack_path
    }
}

fn env_path(name: &str, default: &str) -> PathBuf {
    env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}
