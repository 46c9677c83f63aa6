//! Coordinate frames, distances and the query point.

use serde::{Deserialize, Serialize};

use crate::error::{EnvriskError, Result};

/// Coordinate Reference System identified by EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub name: String,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into() }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::new(4326, "WGS 84")
    }

    /// ETRS89 / UTM zone 30N (EPSG:25830), the national planar grid for mainland Spain
    pub fn etrs89_utm30n() -> Self {
        Self::new(25830, "ETRS89 / UTM zone 30N")
    }

    /// Look up a supported CRS by EPSG code.
    pub fn from_epsg(epsg: u32) -> Result<Self> {
        let name = match epsg {
            4326 => "WGS 84".to_string(),
            4258 => "ETRS89".to_string(),
            3857 => "WGS 84 / Pseudo-Mercator".to_string(),
            25828..=25831 => format!("ETRS89 / UTM zone {}N", epsg - 25800),
            32628..=32631 => format!("WGS 84 / UTM zone {}N", epsg - 32600),
            _ => return Err(EnvriskError::UnsupportedCrs { epsg }),
        };
        Ok(Self::new(epsg, name))
    }

    /// Angular (lon/lat) frames
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg, 4326 | 4258)
    }

    /// PROJ.4 definition string for this CRS, if it is one we know how to build.
    pub fn proj_definition(&self) -> Option<String> {
        let definition = match self.epsg {
            4326 => "+proj=longlat +datum=WGS84 +no_defs".to_string(),
            4258 => "+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs".to_string(),
            3857 => "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +no_defs".to_string(),
            25828..=25831 => format!(
                "+proj=utm +zone={} +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
                self.epsg - 25800
            ),
            32628..=32631 => {
                format!("+proj=utm +zone={} +datum=WGS84 +units=m +no_defs", self.epsg - 32600)
            }
            _ => return None,
        };
        Some(definition)
    }

    /// Where this frame can project points to
    pub fn domain(&self) -> ProjectionDomain {
        let utm = |zone: u32| ProjectionDomain::Meridian {
            lon_0: -183.0 + 6.0 * zone as f64,
            max_offset: ProjectionDomain::TRANSVERSE_MAX_OFFSET,
        };
        match self.epsg {
            3857 => ProjectionDomain::Latitude { max_lat: ProjectionDomain::MERCATOR_MAX_LAT },
            25801..=25860 => utm(self.epsg - 25800),
            32601..=32660 => utm(self.epsg - 32600),
            _ => ProjectionDomain::Global,
        }
    }
}

/// Geographic region in which a frame yields usable coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionDomain {
    /// Every valid lon/lat
    Global,
    /// Transverse Mercator: longitude within `max_offset` degrees of `lon_0`
    Meridian { lon_0: f64, max_offset: f64 },
    /// Normal Mercator: latitude within `max_lat` degrees of the equator
    Latitude { max_lat: f64 },
}

impl ProjectionDomain {
    /// Largest longitude offset from the central meridian accepted for
    /// transverse Mercator frames
    pub const TRANSVERSE_MAX_OFFSET: f64 = 80.0;

    /// Latitude bound of Web Mercator
    pub const MERCATOR_MAX_LAT: f64 = 85.051_128_78;

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        match *self {
            ProjectionDomain::Global => true,
            ProjectionDomain::Meridian { lon_0, max_offset } => {
                let offset = (lon - lon_0 + 180.0).rem_euclid(360.0) - 180.0;
                offset.abs() <= max_offset
            }
            ProjectionDomain::Latitude { max_lat } => lat.abs() <= max_lat,
        }
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{} ({})", self.epsg, self.name)
    }
}

/// Distance units for spatial operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistanceUnit {
    #[default]
    Meters,
    Kilometers,
}

impl DistanceUnit {
    /// Convert a distance value to meters
    pub fn to_meters(&self, value: f64) -> f64 {
        match self {
            DistanceUnit::Meters => value,
            DistanceUnit::Kilometers => value * 1000.0,
        }
    }
}

/// Distance with unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    pub value: f64,
    pub unit: DistanceUnit,
}

impl Distance {
    pub fn new(value: f64, unit: DistanceUnit) -> Self {
        Self { value, unit }
    }

    pub fn meters(value: f64) -> Self {
        Self::new(value, DistanceUnit::Meters)
    }

    pub fn kilometers(value: f64) -> Self {
        Self::new(value, DistanceUnit::Kilometers)
    }

    pub fn to_meters(&self) -> f64 {
        self.unit.to_meters(self.value)
    }

    /// Reject radii that cannot bound a neighborhood.
    pub fn validate_radius(&self) -> Result<()> {
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(EnvriskError::InvalidQuery {
                reason: format!("radius must be a finite, non-negative number, got {}", self.value),
            });
        }
        Ok(())
    }
}

/// Geometry validation mode applied when layers are loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ValidityMode {
    /// Discard records whose geometry fails validation
    #[default]
    Strict,
    /// Keep invalid records, flagged, and skip them at query time
    Lenient,
}

/// A (latitude, longitude) pair in the geographic frame.
///
/// Construction validates the coordinate, so a `QueryPoint` that exists is
/// always safe to hand to the projector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueryPoint {
    lat: f64,
    lon: f64,
}

impl QueryPoint {
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(EnvriskError::projection(format!(
                "coordinates must be finite, got lat={lat}, lon={lon}"
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(EnvriskError::projection(format!(
                "latitude {lat} outside [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(EnvriskError::projection(format!(
                "longitude {lon} outside [-180, 180]"
            )));
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// x = longitude, y = latitude
    pub fn to_geo_point(&self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }
}
