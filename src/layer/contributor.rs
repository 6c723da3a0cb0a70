//! Layer contribution with change detection
//!
//! A layer is only rebuilt when its expected metadata differs from what the
//! previous build recorded, or when the platform failed to restore the
//! contents of a build or cache layer.

use crate::error::PakResult;
use crate::layer::compare::metadata_matches;
use crate::layer::layers::{Layer, LayerTypes, Layers};
use crate::logger::Logger;

/// Something that can populate a named layer
pub trait Contributable {
    /// Layer name, also the directory name under the layers root
    fn name(&self) -> &str;

    /// Bring `layer` up to date, setting its metadata and types
    fn contribute(&self, layer: &mut Layer) -> PakResult<()>;
}

/// Fetch the handle for `contributable`, contribute to it and persist the result
pub fn contribute_layer(layers: &Layers, contributable: &dyn Contributable) -> PakResult<Layer> {
    let mut layer = layers.layer(contributable.name())?;
    contributable.contribute(&mut layer)?;
    layers.write(&layer)?;
    Ok(layer)
}

/// Shared reuse/reload/contribute decision for one layer
#[derive(Debug, Clone)]
pub struct LayerContributor {
    pub name: String,
    pub expected_metadata: toml::Table,
    pub expected_types: LayerTypes,
    logger: Logger,
}

impl LayerContributor {
    pub fn new(
        name: impl Into<String>,
        expected_metadata: toml::Table,
        expected_types: LayerTypes,
        logger: Logger,
    ) -> Self {
        Self {
            name: name.into(),
            expected_metadata,
            expected_types,
            logger,
        }
    }

    /// Run `populate` unless the existing layer can be reused
    pub fn contribute<F>(&self, layer: &mut Layer, populate: F) -> PakResult<()>
    where
        F: FnOnce(&mut Layer) -> PakResult<()>,
    {
        let matches = metadata_matches(&self.expected_metadata, &layer.metadata)?;
        let restored = self.was_restored(layer);

        if matches && restored {
            self.logger.header(format!(
                "{}: {} cached layer",
                self.logger.bold(&self.name),
                self.logger.green("Reusing")
            ));
            self.apply(layer);
            return Ok(());
        }

        if matches {
            self.logger.header(format!(
                "{}: {} cached layer",
                self.logger.bold(&self.name),
                self.logger.yellow("Reloading")
            ));
        } else {
            self.logger.header(format!(
                "{}: {} to layer",
                self.logger.bold(&self.name),
                self.logger.yellow("Contributing")
            ));
        }

        layer.reset()?;
        populate(layer)?;
        self.apply(layer);
        Ok(())
    }

    /// False only for a build or cache layer whose record survived but whose
    /// directory did not
    fn was_restored(&self, layer: &Layer) -> bool {
        let rehydrated = self.expected_types.cache || self.expected_types.build;
        !(layer.metadata_path.exists() && layer.is_empty() && rehydrated)
    }

    fn apply(&self, layer: &mut Layer) {
        layer.metadata = self.expected_metadata.clone();
        layer.types = self.expected_types;
    }
}

type Populate = Box<dyn Fn(&mut Layer) -> PakResult<()>>;

/// Contributable backed by an arbitrary populate function
pub struct GenericLayer {
    contributor: LayerContributor,
    populate: Populate,
}

impl GenericLayer {
    pub fn new<F>(contributor: LayerContributor, populate: F) -> Self
    where
        F: Fn(&mut Layer) -> PakResult<()> + 'static,
    {
        Self {
            contributor,
            populate: Box::new(populate),
        }
    }
}

impl Contributable for GenericLayer {
    fn name(&self) -> &str {
        &self.contributor.name
    }

    fn contribute(&self, layer: &mut Layer) -> PakResult<()> {
        self.contributor.contribute(layer, |layer| (self.populate)(layer))
    }
}
