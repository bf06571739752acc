use camino::Utf8Path;
use geo::Point;
use shapefile::Shape;
use tracing::debug;

use crate::error::NasrError;
use crate::fs_util::read_zipped_shapefile;

#[derive(Debug, Clone, PartialEq)]
pub struct FlightLocation {
    pub fid: usize,
    pub point: Point<f64>,
}

impl FlightLocation {
    pub fn new(fid: usize, x: f64, y: f64) -> Self {
        Self {
            fid,
            point: Point::new(x, y),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.point.y()
    }

    pub fn longitude(&self) -> f64 {
        self.point.x()
    }
}

/// Reads the point layer of a zipped shapefile. The record index is the FID.
pub fn load_locations(zip_path: &Utf8Path) -> Result<Vec<FlightLocation>, NasrError> {
    let features = read_zipped_shapefile(zip_path, None)?;
    let locations = features
        .into_iter()
        .enumerate()
        .map(|(fid, (shape, _))| match shape {
            Shape::Point(point) => Ok(FlightLocation::new(fid, point.x, point.y)),
            Shape::PointM(point) => Ok(FlightLocation::new(fid, point.x, point.y)),
            Shape::PointZ(point) => Ok(FlightLocation::new(fid, point.x, point.y)),
            other => Err(NasrError::Shapefile(format!(
                "location {fid}: expected point, found {:?}",
                other.shapetype()
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    debug!(%zip_path, count = locations.len(), "loaded flight locations");
    Ok(locations)
}
