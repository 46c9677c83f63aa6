pub mod geometry;
pub mod layer;
pub mod record;

pub use geometry::{Crs, Distance, DistanceUnit, ProjectionDomain, QueryPoint, ValidityMode};
pub use layer::{CategoryClass, ColorRamp, LayerId, LayerMeta, Rgb, Symbology};
pub use record::{parse_count, AttributeMap, Classification, ClassificationRule, PolygonRecord};
