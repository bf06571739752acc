use camino::Utf8Path;
use geo::MultiPolygon;
use shapefile::Shape;
use tracing::debug;

use crate::error::NasrError;
use crate::fs_util::{integer_field, read_zipped_shapefile, text_field};
use crate::resolver::SHAPE_FILES_DIR;

/// Drone operations are assumed to stay at or below 400 ft AGL.
pub const DEFAULT_MAX_ALTITUDE_FT: i64 = 400;

#[derive(Debug, Clone)]
pub struct Restriction {
    pub class: String,
    pub name: String,
    pub ident: String,
    pub lower_val: i64,
    pub area: MultiPolygon<f64>,
}

/// Loads every airspace polygon from `zip://{archive}!Shape_Files`.
pub fn load_restrictions(archive: &Utf8Path) -> Result<Vec<Restriction>, NasrError> {
    let features = read_zipped_shapefile(archive, Some(SHAPE_FILES_DIR))?;
    let mut restrictions = Vec::with_capacity(features.len());
    for (index, (shape, record)) in features.into_iter().enumerate() {
        let area = match shape {
            Shape::Polygon(polygon) => MultiPolygon::from(polygon),
            Shape::PolygonM(polygon) => MultiPolygon::from(polygon),
            Shape::PolygonZ(polygon) => MultiPolygon::from(polygon),
            Shape::NullShape => MultiPolygon::new(Vec::new()),
            other => {
                return Err(NasrError::Shapefile(format!(
                    "feature {index}: expected polygon, found {:?}",
                    other.shapetype()
                )));
            }
        };
        restrictions.push(Restriction {
            class: text_field(&record, "CLASS")?,
            name: text_field(&record, "NAME")?,
            ident: text_field(&record, "IDENT")?,
            lower_val: integer_field(&record, "LOWER_VAL")?,
            area,
        });
    }
    debug!(%archive, count = restrictions.len(), "loaded airspace restrictions");
    Ok(restrictions)
}

/// Keeps the restrictions whose floor is at or below `max_altitude_ft`.
pub fn apply_relevancy_filters(
    restrictions: Vec<Restriction>,
    max_altitude_ft: i64,
) -> Vec<Restriction> {
    restrictions
        .into_iter()
        .filter(|restriction| restriction.lower_val <= max_altitude_ft)
        .collect()
}
