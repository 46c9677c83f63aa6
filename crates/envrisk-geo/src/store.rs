//! The process-lifetime geometry store

use envrisk_core::config::LayeredConfig;
use envrisk_core::error::{EnvriskError, Result};
use envrisk_core::formats::read_source;
use envrisk_core::models::{Crs, Distance, LayerId, LayerMeta, QueryPoint};
use geo::Coord;
use std::collections::HashMap;
use std::path::Path;

use crate::layer::{Layer, LayerBuilder, LoadOptions};
use crate::neighborhood::{filter_around, filter_nearby, Neighborhood};
use crate::resolve::{resolve, MatchResult};
use crate::transform::Projector;

/// Immutable collection of layers plus the projector their footprints were
/// computed with.
///
/// Built once at startup and shared by reference (typically `Arc`) across
/// concurrent queries. Nothing mutates it after [`GeometryStoreBuilder::build`].
#[derive(Debug)]
pub struct GeometryStore {
    projector: Projector,
    layers: HashMap<LayerId, Layer>,
    order: Vec<LayerId>,
}

impl GeometryStore {
    pub fn builder(planar_crs: &Crs) -> Result<GeometryStoreBuilder> {
        Ok(GeometryStoreBuilder {
            projector: Projector::new(planar_crs)?,
            options: LoadOptions::default(),
            layers: HashMap::new(),
            order: Vec::new(),
        })
    }

    /// Builder with the planar frame and load options taken from configuration
    pub fn builder_from_config(config: &LayeredConfig) -> Result<GeometryStoreBuilder> {
        let crs = Crs::from_epsg(config.planar_crs.value)?;
        Ok(Self::builder(&crs)?.options(LoadOptions::from_config(config)))
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn layer(&self, id: &LayerId) -> Result<&Layer> {
        self.layers.get(id).ok_or_else(|| EnvriskError::LayerNotFound { id: id.to_string() })
    }

    /// Layers in the order they were added
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.order.iter().filter_map(|id| self.layers.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Exact membership of `point` in one layer
    pub fn resolve(&self, id: &LayerId, point: &QueryPoint) -> Result<MatchResult<'_>> {
        Ok(resolve(self.layer(id)?, point))
    }

    /// Records of one layer whose centroid lies within `radius` of `point`
    pub fn neighborhood(
        &self,
        id: &LayerId,
        point: &QueryPoint,
        radius: Distance,
    ) -> Result<Neighborhood<'_>> {
        filter_nearby(self.layer(id)?, &self.projector, point, radius)
    }

    /// Like [`GeometryStore::neighborhood`] around an already projected point
    pub fn neighborhood_around(
        &self,
        id: &LayerId,
        center: Coord<f64>,
        radius: Distance,
    ) -> Result<Neighborhood<'_>> {
        filter_around(self.layer(id)?, center, radius)
    }
}

/// Builder for [`GeometryStore`]
#[derive(Debug)]
pub struct GeometryStoreBuilder {
    projector: Projector,
    options: LoadOptions,
    layers: HashMap<LayerId, Layer>,
    order: Vec<LayerId>,
}

impl GeometryStoreBuilder {
    pub fn options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate, project and index a layer, then add it
    pub fn layer(mut self, builder: LayerBuilder) -> Result<Self> {
        if self.layers.contains_key(builder.id()) {
            return Err(EnvriskError::ConfigInvalid {
                key: "layers".to_string(),
                reason: format!("duplicate layer id '{}'", builder.id()),
            });
        }

        let layer = builder.build(&self.projector, self.options)?;
        self.order.push(layer.id().clone());
        self.layers.insert(layer.id().clone(), layer);
        Ok(self)
    }

    /// Read a dataset file and add it as a layer
    pub fn load_source(self, meta: LayerMeta, path: &Path) -> Result<Self> {
        let source = read_source(path)?;
        self.layer(LayerBuilder::from_source(meta, source))
    }

    pub fn build(self) -> GeometryStore {
        GeometryStore { projector: self.projector, layers: self.layers, order: self.order }
    }
}
