//! CRS transformation between the geographic and planar frames

use envrisk_core::error::{EnvriskError, Result};
use envrisk_core::models::{Crs, ProjectionDomain, QueryPoint};
use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::proj::Proj;

/// One end of a transformation
struct Frame {
    proj: Proj,
    /// proj4rs works in radians for lon/lat frames; we keep degrees outside
    geographic: bool,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame").field("geographic", &self.geographic).finish_non_exhaustive()
    }
}

impl Frame {
    fn new(crs: &Crs) -> Result<Self> {
        let definition =
            crs.proj_definition().ok_or(EnvriskError::UnsupportedCrs { epsg: crs.epsg })?;
        let proj = Proj::from_proj_string(&definition).map_err(|e| {
            EnvriskError::projection(format!("failed to build {}: {}", crs, e))
        })?;
        Ok(Self { proj, geographic: crs.is_geographic() })
    }
}

/// Coordinate transform from one supported CRS to another.
///
/// Geographic coordinates are degrees with x = longitude, y = latitude.
#[derive(Debug)]
pub struct CrsTransform {
    from: Frame,
    to: Frame,
    from_crs: Crs,
    to_crs: Crs,
}

impl CrsTransform {
    pub fn new(from_crs: &Crs, to_crs: &Crs) -> Result<Self> {
        Ok(Self {
            from: Frame::new(from_crs)?,
            to: Frame::new(to_crs)?,
            from_crs: from_crs.clone(),
            to_crs: to_crs.clone(),
        })
    }

    pub fn from_crs(&self) -> &Crs {
        &self.from_crs
    }

    pub fn to_crs(&self) -> &Crs {
        &self.to_crs
    }

    /// Transform a single coordinate. Non-finite input or output fails.
    pub fn coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            return Err(EnvriskError::projection(format!(
                "non-finite coordinate ({}, {}) in {}",
                coord.x, coord.y, self.from_crs
            )));
        }

        let mut point = if self.from.geographic {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };

        proj4rs::transform::transform(&self.from.proj, &self.to.proj, &mut point).map_err(|e| {
            EnvriskError::projection(format!(
                "({}, {}) from {} to {}: {}",
                coord.x, coord.y, self.from_crs, self.to_crs, e
            ))
        })?;

        let (x, y) = if self.to.geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !x.is_finite() || !y.is_finite() {
            return Err(EnvriskError::projection(format!(
                "({}, {}) has no finite image in {}",
                coord.x, coord.y, self.to_crs
            )));
        }
        Ok(Coord { x, y })
    }

    pub fn multipolygon(&self, geometry: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        geometry.try_map_coords(|coord| self.coord(coord))
    }
}

/// Stateless transform between the geographic frame (EPSG:4326) and the
/// configured planar frame used for distances and rendering.
#[derive(Debug)]
pub struct Projector {
    forward: CrsTransform,
    inverse: CrsTransform,
    domain: ProjectionDomain,
}

impl Projector {
    /// Build a projector for a metric planar CRS.
    pub fn new(planar_crs: &Crs) -> Result<Self> {
        if planar_crs.is_geographic() {
            return Err(EnvriskError::ConfigInvalid {
                key: "planar_crs".to_string(),
                reason: format!("{} is angular; a metric frame is required", planar_crs),
            });
        }
        let geographic = Crs::wgs84();
        Ok(Self {
            forward: CrsTransform::new(&geographic, planar_crs)?,
            inverse: CrsTransform::new(planar_crs, &geographic)?,
            domain: planar_crs.domain(),
        })
    }

    pub fn from_epsg(epsg: u32) -> Result<Self> {
        Self::new(&Crs::from_epsg(epsg)?)
    }

    pub fn planar_crs(&self) -> &Crs {
        self.forward.to_crs()
    }

    pub fn domain(&self) -> ProjectionDomain {
        self.domain
    }

    /// Project a query point. Points outside the planar frame's domain fail
    /// with a projection error.
    pub fn to_planar(&self, point: &QueryPoint) -> Result<Coord<f64>> {
        self.to_planar_coord(Coord { x: point.lon(), y: point.lat() })
    }

    /// Project a lon/lat coordinate
    pub fn to_planar_coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        if coord.x.is_finite() && coord.y.is_finite() && !self.domain.contains(coord.y, coord.x) {
            return Err(EnvriskError::projection(format!(
                "(lat {}, lon {}) is outside the projection domain of {}",
                coord.y,
                coord.x,
                self.planar_crs()
            )));
        }
        self.forward.coord(coord)
    }

    pub fn to_geographic(&self, coord: Coord<f64>) -> Result<QueryPoint> {
        let geographic = self.inverse.coord(coord)?;
        QueryPoint::new(geographic.y, geographic.x)
    }

    pub fn project_multipolygon(&self, geometry: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        geometry.try_map_coords(|coord| self.to_planar_coord(coord))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn madrid() -> QueryPoint {
        QueryPoint::new(40.4168, -3.7038).unwrap()
    }

    #[test]
    fn test_projection_to_utm30() {
        let projector = Projector::new(&Crs::etrs89_utm30n()).unwrap();
        let planar = projector.to_planar(&madrid()).unwrap();

        // Puerta del Sol, ETRS89 / UTM 30N
        assert!((planar.x - 440_300.0).abs() < 1_000.0, "easting {}", planar.x);
        assert!((planar.y - 4_474_300.0).abs() < 1_000.0, "northing {}", planar.y);
    }

    #[test]
    fn test_round_trip() {
        let projector = Projector::from_epsg(25830).unwrap();
        let planar = projector.to_planar(&madrid()).unwrap();
        let back = projector.to_geographic(planar).unwrap();

        assert!((back.lat() - madrid().lat()).abs() < 1e-7);
        assert!((back.lon() - madrid().lon()).abs() < 1e-7);
    }

    #[test]
    fn test_geographic_planar_frame_is_rejected() {
        let err = Projector::new(&Crs::wgs84()).unwrap_err();
        assert!(matches!(err, EnvriskError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_non_finite_coordinate_fails() {
        let projector = Projector::from_epsg(25830).unwrap();
        let err = projector.to_planar_coord(Coord { x: f64::NAN, y: 40.0 }).unwrap_err();
        assert!(err.is_bad_input());
    }

    #[test]
    fn test_points_far_from_central_meridian_fail() {
        let projector = Projector::from_epsg(25830).unwrap();

        for (lat, lon) in [(0.0, 179.0), (40.4168, 176.3), (0.0, 87.0), (10.0, -100.0)] {
            let point = QueryPoint::new(lat, lon).unwrap();
            let err = projector.to_planar(&point).unwrap_err();
            assert!(matches!(err, EnvriskError::Projection { .. }), "({lat}, {lon}): {err}");
        }

        // Canary Islands, twelve degrees west of zone 30's meridian
        let canarias = QueryPoint::new(28.12, -15.43).unwrap();
        assert!(projector.to_planar(&canarias).is_ok());
    }

    #[test]
    fn test_polygon_outside_domain_fails() {
        let projector = Projector::from_epsg(25830).unwrap();
        let far = MultiPolygon::new(vec![polygon![
            (x: 170.0, y: 0.0),
            (x: 171.0, y: 0.0),
            (x: 171.0, y: 1.0),
            (x: 170.0, y: 0.0),
        ]]);
        assert!(projector.project_multipolygon(&far).unwrap_err().is_bad_input());
    }

    #[test]
    fn test_reproject_utm_polygon_to_geographic() {
        let square = MultiPolygon::new(vec![polygon![
            (x: 440_000.0, y: 4_474_000.0),
            (x: 441_000.0, y: 4_474_000.0),
            (x: 441_000.0, y: 4_475_000.0),
            (x: 440_000.0, y: 4_475_000.0),
            (x: 440_000.0, y: 4_474_000.0),
        ]]);

        let transform = CrsTransform::new(&Crs::etrs89_utm30n(), &Crs::wgs84()).unwrap();
        let geographic = transform.multipolygon(&square).unwrap();
        let first = geographic.0[0].exterior().0[0];
        assert!((first.x - -3.707).abs() < 0.01, "lon {}", first.x);
        assert!((first.y - 40.414).abs() < 0.01, "lat {}", first.y);
        assert_eq!(transform.from_crs().epsg, 25830);
    }
}
