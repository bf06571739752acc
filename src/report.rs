use std::io::Write;

use camino::Utf8Path;
use serde::Serialize;

use crate::analysis::FlightVerdict;
use crate::error::NasrError;

pub const DEFAULT_OUT_FILE: &str = "results.csv";

const COLUMNS: [&str; 7] = [
    "Location_FID",
    "Location_Lat",
    "Location_Long",
    "Legality",
    "Airspace_Class",
    "Airspace_Name",
    "Airport_ID",
];

// Field order follows COLUMNS.
#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    fid: usize,
    lat: f64,
    long: f64,
    legality: String,
    class: Option<&'a str>,
    name: Option<&'a str>,
    airport_id: Option<&'a str>,
}

impl<'a> From<&'a FlightVerdict> for ResultRow<'a> {
    fn from(verdict: &'a FlightVerdict) -> Self {
        let conflict = verdict.conflict.as_ref();
        Self {
            fid: verdict.location.fid,
            lat: verdict.location.latitude(),
            long: verdict.location.longitude(),
            legality: verdict.legality().to_string(),
            class: conflict.map(|conflict| conflict.class.as_str()),
            name: conflict.map(|conflict| conflict.name.as_str()),
            airport_id: conflict.map(|conflict| conflict.airport_id.as_str()),
        }
    }
}

pub fn write_results_to<W: Write>(
    writer: W,
    verdicts: &[FlightVerdict],
) -> Result<(), NasrError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer
        .write_record(COLUMNS)
        .map_err(|err| NasrError::Report(err.to_string()))?;
    for verdict in verdicts {
        writer
            .serialize(ResultRow::from(verdict))
            .map_err(|err| NasrError::Report(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| NasrError::Report(err.to_string()))
}

pub fn write_results(path: &Utf8Path, verdicts: &[FlightVerdict]) -> Result<(), NasrError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
        std::fs::create_dir_all(parent.as_std_path())
            .map_err(|err| NasrError::Filesystem(err.to_string()))?;
    }
    let file = std::fs::File::create(path.as_std_path())
        .map_err(|err| NasrError::Filesystem(format!("create {path}: {err}")))?;
    write_results_to(file, verdicts)
}
