//! Layer holding a single resolved dependency

use crate::cache::{Artifact, DependencyCache, RequestModifier};
use crate::dependency::DependencyMetadata;
use crate::error::{PakError, PakResult};
use crate::layer::contributor::{Contributable, LayerContributor};
use crate::layer::layers::{Layer, LayerTypes};
use crate::logger::Logger;
use crate::sbom::{Sbom, SbomArtifact};
use std::fs;

/// Installs a downloaded artifact into a layer
pub type Installer = Box<dyn Fn(&Artifact, &mut Layer) -> PakResult<()>>;

/// Contributes one dependency, downloading it only when the layer is stale
pub struct DependencyLayer<'a> {
    dependency: DependencyMetadata,
    cache: &'a DependencyCache,
    contributor: LayerContributor,
    modifiers: Vec<RequestModifier>,
    installer: Installer,
    logger: Logger,
}

impl<'a> DependencyLayer<'a> {
    /// Layer named after the dependency id, expecting `[metadata.dependency]`
    /// to equal `dependency`
    pub fn new(
        dependency: DependencyMetadata,
        cache: &'a DependencyCache,
        types: LayerTypes,
        logger: Logger,
    ) -> PakResult<Self> {
        let mut expected = toml::Table::new();
        expected.insert(
            "dependency".to_string(),
            toml::Value::Table(dependency.to_table()?),
        );

        Ok(Self {
            contributor: LayerContributor::new(dependency.id.clone(), expected, types, logger.clone()),
            dependency,
            cache,
            modifiers: Vec::new(),
            installer: Box::new(copy_artifact),
            logger,
        })
    }

    /// Replace the default installer, which copies the artifact into the layer
    pub fn with_installer<F>(mut self, installer: F) -> Self
    where
        F: Fn(&Artifact, &mut Layer) -> PakResult<()> + 'static,
    {
        self.installer = Box::new(installer);
        self
    }

    pub fn with_modifier(mut self, modifier: RequestModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn dependency(&self) -> &DependencyMetadata {
        &self.dependency
    }

    fn populate(&self, layer: &mut Layer) -> PakResult<()> {
        let artifact = self.cache.artifact(&self.dependency, &self.modifiers)?;
        self.logger.body(format!(
            "Installing {} to {}",
            self.dependency.label(),
            layer.path.display()
        ));
        (self.installer)(&artifact, layer)?;

        Sbom::new(vec![SbomArtifact::from_dependency(
            &self.dependency,
            &[layer.path.clone()],
        )])
        .write(&layer.sbom_path())
    }
}

impl Contributable for DependencyLayer<'_> {
    fn name(&self) -> &str {
        &self.contributor.name
    }

    fn contribute(&self, layer: &mut Layer) -> PakResult<()> {
        self.contributor
            .contribute(layer, |layer| self.populate(layer))
    }
}

/// Copy the artifact file into the layer root under its own name
pub fn copy_artifact(artifact: &Artifact, layer: &mut Layer) -> PakResult<()> {
    let name = artifact
        .path()
        .file_name()
        .ok_or_else(|| PakError::PathNotFound(artifact.path().to_path_buf()))?;
    let destination = layer.path.join(name);
    fs::copy(artifact.path(), &destination).map_err(|e| {
        PakError::io(
            format!("copying {} to {}", artifact.path().display(), destination.display()),
            e,
        )
    })?;
    Ok(())
}
