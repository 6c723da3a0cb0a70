//! On-disk layer records
//!
//! Each layer is a directory `<layers>/<name>` plus a `<layers>/<name>.toml`
//! file holding its type flags and metadata.

use crate::error::{PakError, PakResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

/// Which lifecycle phases a layer participates in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerTypes {
    #[serde(default)]
    pub build: bool,
    #[serde(default)]
    pub cache: bool,
    #[serde(default)]
    pub launch: bool,
}

impl LayerTypes {
    pub fn new(build: bool, cache: bool, launch: bool) -> Self {
        Self {
            build,
            cache,
            launch,
        }
    }

    pub fn launch_only() -> Self {
        Self::new(false, false, true)
    }
}

/// Serialized form of `<name>.toml`
#[derive(Debug, Default, Serialize, Deserialize)]
struct LayerFile {
    #[serde(default)]
    types: LayerTypes,
    #[serde(default)]
    metadata: toml::Table,
}

/// A single layer handle
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    /// Layer contents directory
    pub path: PathBuf,
    /// `<layers>/<name>.toml`
    pub metadata_path: PathBuf,
    pub metadata: toml::Table,
    pub types: LayerTypes,
}

impl Layer {
    /// Whether the layer directory is absent or has no entries
    pub fn is_empty(&self) -> bool {
        fs::read_dir(&self.path)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }

    /// Remove and recreate the layer directory
    pub fn reset(&self) -> PakResult<()> {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(PakError::io(format!("removing {}", self.path.display()), e)),
        }
        fs::create_dir_all(&self.path)
            .map_err(|e| PakError::io(format!("creating {}", self.path.display()), e))
    }

    /// Location of this layer's bill of materials
    pub fn sbom_path(&self) -> PathBuf {
        self.path
            .with_file_name(format!("{}.sbom.syft.json", self.name))
    }
}

/// The layers root handed to the buildpack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layers {
    pub path: PathBuf,
}

impl Layers {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Handle for layer `name`, with metadata and types restored from disk
    pub fn layer(&self, name: &str) -> PakResult<Layer> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(PakError::User(format!("Invalid layer name '{}'", name)));
        }

        let metadata_path = self.path.join(format!("{}.toml", name));
        let file = match fs::read_to_string(&metadata_path) {
            Ok(content) => toml::from_str::<LayerFile>(&content)
                .map_err(|e| PakError::metadata(metadata_path.display().to_string(), e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LayerFile::default(),
            Err(e) => {
                return Err(PakError::io(format!("reading {}", metadata_path.display()), e))
            }
        };

        Ok(Layer {
            name: name.to_string(),
            path: self.path.join(name),
            metadata_path,
            metadata: file.metadata,
            types: file.types,
        })
    }

    /// Persist the types and metadata of `layer`
    pub fn write(&self, layer: &Layer) -> PakResult<()> {
        fs::create_dir_all(&self.path)
            .map_err(|e| PakError::io(format!("creating {}", self.path.display()), e))?;

        let content = toml::to_string(&LayerFile {
            types: layer.types,
            metadata: layer.metadata.clone(),
        })?;
        let temp = self
            .path
            .join(format!(".{}.{}.tmp", layer.name, Uuid::new_v4()));
        fs::write(&temp, content)
            .map_err(|e| PakError::io(format!("writing {}", temp.display()), e))?;
        fs::rename(&temp, &layer.metadata_path).map_err(|e| {
            let _ = fs::remove_file(&temp);
            PakError::io(format!("writing {}", layer.metadata_path.display()), e)
        })
    }
}
