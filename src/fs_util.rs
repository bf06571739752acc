use std::fs;
use std::io::{Cursor, Read};

use camino::Utf8Path;
use shapefile::dbase::{self, FieldValue, Record};
use shapefile::{Shape, ShapeReader};
use zip::ZipArchive;

use crate::error::NasrError;

/// Reads the first shapefile (`.shp` + `.dbf`) of a zip archive, optionally
/// restricted to entries under `dir/`. Entries are searched in name order.
pub fn read_zipped_shapefile(
    zip_path: &Utf8Path,
    dir: Option<&str>,
) -> Result<Vec<(Shape, Record)>, NasrError> {
    let file = fs::File::open(zip_path.as_std_path())
        .map_err(|err| NasrError::Filesystem(format!("open zip {zip_path}: {err}")))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|err| NasrError::Archive(format!("{zip_path}: {err}")))?;

    let prefix = dir.map(|dir| format!("{}/", dir.trim_end_matches('/')));
    let mut shp_names = archive
        .file_names()
        .filter(|name| prefix.as_deref().is_none_or(|prefix| name.starts_with(prefix)))
        .filter(|name| has_extension(name, "shp"))
        .map(str::to_string)
        .collect::<Vec<_>>();
    shp_names.sort();
    let shp_name = shp_names.into_iter().next().ok_or_else(|| {
        NasrError::Shapefile(format!(
            "no .shp file found in {zip_path}{}",
            dir.map(|dir| format!("!{dir}")).unwrap_or_default()
        ))
    })?;
    let stem = &shp_name[..shp_name.len() - ".shp".len()];
    let dbf_name = archive
        .file_names()
        .find(|name| {
            name.len() == shp_name.len() && name.starts_with(stem) && has_extension(name, "dbf")
        })
        .map(str::to_string)
        .ok_or_else(|| NasrError::Shapefile(format!("missing .dbf for {shp_name}")))?;

    let shp = read_entry(&mut archive, &shp_name)?;
    let dbf = read_entry(&mut archive, &dbf_name)?;

    let shape_reader = ShapeReader::new(Cursor::new(shp))
        .map_err(|err| NasrError::Shapefile(format!("{shp_name}: {err}")))?;
    let dbase_reader = dbase::Reader::new(Cursor::new(dbf))
        .map_err(|err| NasrError::Shapefile(format!("{dbf_name}: {err}")))?;
    let mut reader = shapefile::Reader::new(shape_reader, dbase_reader);

    reader
        .iter_shapes_and_records()
        .map(|item| item.map_err(|err| NasrError::Shapefile(format!("{shp_name}: {err}"))))
        .collect()
}

fn read_entry<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>, NasrError> {
    let mut entry = archive
        .by_name(name)
        .map_err(|err| NasrError::Archive(format!("{name}: {err}")))?;
    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .map_err(|err| NasrError::Archive(format!("{name}: {err}")))?;
    Ok(bytes)
}

fn has_extension(name: &str, ext: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, found)| found.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Text value of a dbf column; empty when the value is null.
pub fn text_field(record: &Record, field: &str) -> Result<String, NasrError> {
    match record.get(field) {
        Some(FieldValue::Character(value)) => {
            Ok(value.as_deref().map(str::trim).unwrap_or_default().to_string())
        }
        Some(FieldValue::Memo(value)) => Ok(value.trim().to_string()),
        Some(FieldValue::Numeric(value)) => {
            Ok(value.map(|value| value.to_string()).unwrap_or_default())
        }
        Some(FieldValue::Integer(value)) => Ok(value.to_string()),
        Some(other) => Err(NasrError::Attribute(format!(
            "{field}: unexpected value {other:?}"
        ))),
        None => Err(NasrError::Attribute(format!("missing column {field}"))),
    }
}

/// Integer value of a dbf column, casting text and floating point columns.
pub fn integer_field(record: &Record, field: &str) -> Result<i64, NasrError> {
    integer_value(field, record.get(field))
}

pub(crate) fn integer_value(field: &str, value: Option<&FieldValue>) -> Result<i64, NasrError> {
    let invalid = |value: &dyn std::fmt::Debug| {
        NasrError::Attribute(format!("{field}: cannot cast {value:?} to integer"))
    };
    match value {
        Some(FieldValue::Character(Some(text))) => {
            let text = text.trim();
            text.parse::<i64>()
                .or_else(|_| {
                    text.parse::<f64>()
                        .ok()
                        .filter(|value| value.is_finite())
                        .map(|value| value.trunc() as i64)
                        .ok_or(())
                })
                .map_err(|_| invalid(&text))
        }
        Some(FieldValue::Numeric(Some(value))) | Some(FieldValue::Double(value))
            if value.is_finite() =>
        {
            Ok(value.trunc() as i64)
        }
        Some(FieldValue::Float(Some(value))) if value.is_finite() => Ok(value.trunc() as i64),
        Some(FieldValue::Integer(value)) => Ok(i64::from(*value)),
        Some(other) => Err(invalid(other)),
        None => Err(NasrError::Attribute(format!("missing column {field}"))),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn integer_casts() {
        let text = FieldValue::Character(Some(" 400 ".to_string()));
        assert_eq!(integer_value("LOWER_VAL", Some(&text)).unwrap(), 400);

        let numeric = FieldValue::Numeric(Some(1200.0));
        assert_eq!(integer_value("LOWER_VAL", Some(&numeric)).unwrap(), 1200);

        let negative = FieldValue::Character(Some("-9998".to_string()));
        assert_eq!(integer_value("LOWER_VAL", Some(&negative)).unwrap(), -9998);

        let integer = FieldValue::Integer(0);
        assert_eq!(integer_value("LOWER_VAL", Some(&integer)).unwrap(), 0);
    }

    #[test]
    fn integer_cast_failures() {
        let text = FieldValue::Character(Some("SFC".to_string()));
        assert_matches!(
            integer_value("LOWER_VAL", Some(&text)),
            Err(NasrError::Attribute(_))
        );

        let null = FieldValue::Numeric(None);
        assert_matches!(
            integer_value("LOWER_VAL", Some(&null)),
            Err(NasrError::Attribute(_))
        );

        assert_matches!(
            integer_value("LOWER_VAL", None),
            Err(NasrError::Attribute(_))
        );
    }

    #[test]
    fn extension_matching() {
        assert!(has_extension("Shape_Files/Class_Airspace.shp", "shp"));
        assert!(has_extension("Shape_Files/Class_Airspace.SHP", "shp"));
        assert!(!has_extension("Shape_Files/Class_Airspace.shp.xml", "shp"));
        assert!(!has_extension("Shape_Files", "shp"));
    }
}
