//! Launch-time helper executables
//!
//! A buildpack ships one multi-call binary at `bin/helper`. It is copied into
//! a launch layer and linked once per helper name under `exec.d/`, so the
//! launcher runs each helper before the application starts.

use crate::config::BuildpackInfo;
use crate::error::{PakError, PakResult};
use crate::layer::contributor::{Contributable, LayerContributor};
use crate::layer::layers::{Layer, LayerTypes};
use crate::logger::Logger;
use crate::sbom::{Sbom, SbomArtifact};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the layer and of the copied binary
pub const HELPER_LAYER: &str = "helper";

/// Contributes the buildpack helper binary and its `exec.d` links
pub struct HelperLayer {
    source: PathBuf,
    names: Vec<String>,
    version: String,
    contributor: LayerContributor,
    logger: Logger,
}

impl HelperLayer {
    pub fn new(
        buildpack_path: &Path,
        info: &BuildpackInfo,
        names: Vec<String>,
        logger: Logger,
    ) -> Self {
        let mut buildpack = toml::Table::new();
        buildpack.insert("id".into(), info.id.clone().into());
        buildpack.insert("version".into(), info.version.clone().into());

        let mut expected = toml::Table::new();
        expected.insert("buildpack".into(), buildpack.into());
        expected.insert(
            "helpers".into(),
            toml::Value::Array(names.iter().cloned().map(toml::Value::String).collect()),
        );

        Self {
            source: buildpack_path.join("bin").join(HELPER_LAYER),
            names,
            version: info.version.clone(),
            contributor: LayerContributor::new(
                HELPER_LAYER,
                expected,
                LayerTypes::launch_only(),
                logger.clone(),
            ),
            logger,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn populate(&self, layer: &mut Layer) -> PakResult<()> {
        if !self.source.is_file() {
            return Err(PakError::PathNotFound(self.source.clone()));
        }

        let binary = layer.path.join(HELPER_LAYER);
        self.logger
            .body(format!("Copying to {}", layer.path.display()));
        fs::copy(&self.source, &binary).map_err(|e| {
            PakError::io(format!("copying {}", self.source.display()), e)
        })?;
        make_executable(&binary)?;

        let exec_d = layer.path.join("exec.d");
        fs::create_dir_all(&exec_d)
            .map_err(|e| PakError::io(format!("creating {}", exec_d.display()), e))?;

        let mut artifacts = Vec::with_capacity(self.names.len());
        for name in &self.names {
            let link = exec_d.join(name);
            self.logger.body(format!("Creating {}", link.display()));
            link_helper(&binary, &link)?;
            artifacts.push(SbomArtifact::helper(name, &self.version, &[link]));
        }

        Sbom::new(artifacts).write(&layer.sbom_path())
    }
}

impl Contributable for HelperLayer {
    fn name(&self) -> &str {
        &self.contributor.name
    }

    fn contribute(&self, layer: &mut Layer) -> PakResult<()> {
        self.contributor.contribute(layer, |layer| self.populate(layer))
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> PakResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| PakError::io(format!("setting permissions on {}", path.display()), e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> PakResult<()> {
    Ok(())
}

#[cfg(unix)]
fn link_helper(binary: &Path, link: &Path) -> PakResult<()> {
    std::os::unix::fs::symlink(binary, link)
        .map_err(|e| PakError::io(format!("linking {}", link.display()), e))
}

#[cfg(not(unix))]
fn link_helper(binary: &Path, link: &Path) -> PakResult<()> {
    fs::copy(binary, link)
        .map(|_| ())
        .map_err(|e| PakError::io(format!("copying to {}", link.display()), e))
}
