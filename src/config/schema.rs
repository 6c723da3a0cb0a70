//! Buildpack descriptor schema
//!
//! `buildpack.toml` is read once at startup. The `[metadata]` table is kept
//! untyped for callers that store their own keys, and is also parsed into
//! [`BuildpackMetadata`] so malformed entries fail fast.

use crate::dependency::DependencyMetadata;
use crate::error::{PakError, PakResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Parsed `buildpack.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildpackDescriptor {
    /// `[buildpack]` section
    pub buildpack: BuildpackInfo,

    /// Raw `[metadata]` section
    #[serde(default)]
    pub metadata: toml::Table,
}

/// `[buildpack]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildpackInfo {
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

/// Typed view of `[metadata]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildpackMetadata {
    /// `[[metadata.dependencies]]`
    pub dependencies: Vec<DependencyMetadata>,

    /// `[[metadata.configurations]]`
    pub configurations: Vec<ConfigurationParameter>,
}

/// A user-tunable setting read from the environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationParameter {
    /// Environment variable name
    pub name: String,

    #[serde(default)]
    pub default: String,

    #[serde(default)]
    pub description: String,

    /// Read during build
    #[serde(default)]
    pub build: bool,

    /// Read at launch
    #[serde(default)]
    pub launch: bool,
}

impl BuildpackDescriptor {
    /// Read and parse `buildpack.toml`
    pub fn from_file(path: &Path) -> PakResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| PakError::io(format!("reading {}", path.display()), e))?;
        toml::from_str(&content).map_err(|e| PakError::metadata(path.display().to_string(), e))
    }

    /// Parse `[metadata]` into the typed model
    pub fn typed_metadata(&self) -> PakResult<BuildpackMetadata> {
        BuildpackMetadata::from_table(&self.metadata)
    }

    /// `User-Agent` value identifying this buildpack on downloads
    pub fn user_agent(&self) -> String {
        format!("{}/{}", self.buildpack.id, self.buildpack.version)
    }
}

impl BuildpackMetadata {
    /// Parse from an untyped `[metadata]` table
    pub fn from_table(table: &toml::Table) -> PakResult<Self> {
        toml::Value::Table(table.clone())
            .try_into()
            .map_err(|e: toml::de::Error| PakError::metadata("[metadata]", e))
    }
}
