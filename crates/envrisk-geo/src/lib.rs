//! envrisk geo - Projection, validation, indexing and point queries
//!
//! Layers are reprojected to the geographic frame, validated and given a
//! planar footprint plus an R-tree once, when the [`GeometryStore`] is built.
//! After that everything here is read-only and safe to share across threads.

pub mod index;
pub mod layer;
pub mod neighborhood;
pub mod resolve;
pub mod store;
pub mod transform;
pub mod validation;

pub use layer::{Layer, LayerBuilder, LoadOptions, LoadReport, PlanarFootprint};
pub use neighborhood::{filter_around, filter_nearby, Neighborhood, NeighborhoodEntry};
pub use resolve::{resolve, MatchResult};
pub use store::{GeometryStore, GeometryStoreBuilder};
pub use transform::{CrsTransform, Projector};
