//! Software bill of materials for contributed layers
//!
//! Written as Syft-style JSON next to the layer it describes.

use crate::dependency::DependencyMetadata;
use crate::error::{PakError, PakResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SCHEMA_VERSION: &str = "16.0.18";
const FOUND_BY: &str = "layerpak";

/// SBOM document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sbom {
    pub artifacts: Vec<SbomArtifact>,
    pub descriptor: SbomDescriptor,
    pub schema: SbomSchema,
}

/// One installed component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SbomArtifact {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub found_by: String,
    pub locations: Vec<SbomLocation>,
    pub licenses: Vec<String>,
    pub cpes: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub purl: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SbomLocation {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SbomDescriptor {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SbomSchema {
    pub version: String,
}

impl SbomArtifact {
    /// Entry for an installed dependency
    pub fn from_dependency(dependency: &DependencyMetadata, locations: &[PathBuf]) -> Self {
        Self {
            id: format!("{}@{}", dependency.id, dependency.version),
            name: dependency.name.clone(),
            version: dependency.version.clone(),
            artifact_type: "UnknownPackage".to_string(),
            found_by: FOUND_BY.to_string(),
            locations: to_locations(locations),
            licenses: dependency
                .licenses
                .iter()
                .map(|l| l.license_type.clone())
                .filter(|t| !t.is_empty())
                .collect(),
            cpes: dependency.cpes.clone(),
            purl: dependency.purl.clone(),
        }
    }

    /// Entry for a buildpack-provided helper executable
    pub fn helper(name: &str, version: &str, locations: &[PathBuf]) -> Self {
        Self {
            id: format!("{}@{}", name, version),
            name: name.to_string(),
            version: version.to_string(),
            artifact_type: "UnknownPackage".to_string(),
            found_by: FOUND_BY.to_string(),
            locations: to_locations(locations),
            licenses: Vec::new(),
            cpes: Vec::new(),
            purl: String::new(),
        }
    }
}

fn to_locations(paths: &[PathBuf]) -> Vec<SbomLocation> {
    paths
        .iter()
        .map(|p| SbomLocation {
            path: p.display().to_string(),
        })
        .collect()
}

impl Sbom {
    pub fn new(artifacts: Vec<SbomArtifact>) -> Self {
        Self {
            artifacts,
            descriptor: SbomDescriptor {
                name: FOUND_BY.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            schema: SbomSchema {
                version: SCHEMA_VERSION.to_string(),
            },
        }
    }

    /// Write as pretty-printed JSON
    pub fn write(&self, path: &Path) -> PakResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| PakError::io(format!("writing {}", path.display()), e))
    }

    pub fn read(path: &Path) -> PakResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| PakError::io(format!("reading {}", path.display()), e))?;
        Ok(serde_json::from_str(&content)?)
    }
}
