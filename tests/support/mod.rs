#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use nasr_check::error::NasrError;
use nasr_check::nasr::{NasrClient, RemoteBody};

pub const BASE_URL: &str = "http://nasr.test/28DaySub";

pub enum MockResponse {
    Body(Vec<u8>),
    /// Serves the bytes, then fails the read.
    Broken(Vec<u8>),
    Status(u16),
}

#[derive(Default)]
pub struct MockNasr {
    responses: HashMap<String, MockResponse>,
    calls: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl MockNasr {
    pub fn with(mut self, url: String, response: MockResponse) -> Self {
        self.responses.insert(url, response);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

impl NasrClient for MockNasr {
    fn get(&self, url: &str) -> Result<RemoteBody, NasrError> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        match self.responses.get(url) {
            Some(MockResponse::Body(bytes)) => {
                Ok(RemoteBody::Found(Box::new(Cursor::new(bytes.clone()))))
            }
            Some(MockResponse::Broken(bytes)) => Ok(RemoteBody::Found(Box::new(
                Cursor::new(bytes.clone()).chain(BrokenRead),
            ))),
            Some(MockResponse::Status(404)) | None => Ok(RemoteBody::NotFound),
            Some(MockResponse::Status(status)) => Err(NasrError::RemoteStatus {
                url: url.to_string(),
                status: *status,
            }),
        }
    }
}

struct BrokenRead;

impl Read for BrokenRead {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
    }
}

pub fn zip_entries(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

pub struct Airspace {
    pub class: &'static str,
    pub name: &'static str,
    pub ident: &'static str,
    pub lower_val: i64,
    /// Lower-left and upper-right corners of a square.
    pub square: (f64, f64, f64, f64),
}

/// `.shp` and `.dbf` bytes of a polygon layer with the NASR attribute columns.
pub fn airspace_shapefile(airspaces: &[Airspace]) -> (Vec<u8>, Vec<u8>) {
    let rings = airspaces
        .iter()
        .map(|airspace| {
            let (x0, y0, x1, y1) = airspace.square;
            // Outer rings are clockwise.
            vec![(x0, y0), (x0, y1), (x1, y1), (x1, y0), (x0, y0)]
        })
        .collect::<Vec<_>>();
    let shp = polygon_shp(&rings);
    let rows = airspaces
        .iter()
        .map(|airspace| {
            vec![
                airspace.class.to_string(),
                airspace.name.to_string(),
                airspace.ident.to_string(),
                airspace.lower_val.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    let dbf = dbf(
        &[
            ("CLASS", b'C', 4),
            ("NAME", b'C', 40),
            ("IDENT", b'C', 8),
            ("LOWER_VAL", b'N', 10),
        ],
        &rows,
    );
    (shp, dbf)
}

pub fn locations_shapefile(points: &[(f64, f64)]) -> (Vec<u8>, Vec<u8>) {
    let shp = point_shp(points);
    let rows = (0..points.len())
        .map(|index| vec![index.to_string()])
        .collect::<Vec<_>>();
    let dbf = dbf(&[("ID", b'N', 6)], &rows);
    (shp, dbf)
}

pub fn compact_archive(airspaces: &[Airspace]) -> Vec<u8> {
    let (shp, dbf) = airspace_shapefile(airspaces);
    zip_entries(&[
        ("Shape_Files/", Vec::new()),
        ("Shape_Files/Class_Airspace.shp", shp),
        ("Shape_Files/Class_Airspace.dbf", dbf),
    ])
}

pub fn comprehensive_archive(airspaces: &[Airspace]) -> Vec<u8> {
    let (shp, dbf) = airspace_shapefile(airspaces);
    zip_entries(&[
        ("APT.txt", b"APT header".to_vec()),
        ("Additional_Data/", Vec::new()),
        ("Additional_Data/AIXM/", Vec::new()),
        ("Additional_Data/AIXM/AIXM_5.1.zip", b"aixm".to_vec()),
        ("Additional_Data/Shape_Files/", Vec::new()),
        ("Additional_Data/Shape_Files/Class_Airspace.shp", shp),
        ("Additional_Data/Shape_Files/Class_Airspace.dbf", dbf),
    ])
}

pub fn locations_archive(points: &[(f64, f64)]) -> Vec<u8> {
    let (shp, dbf) = locations_shapefile(points);
    zip_entries(&[("Locations.shp", shp), ("Locations.dbf", dbf)])
}

fn shp_header(out: &mut Vec<u8>, shape_type: i32, bbox: [f64; 4]) {
    out.extend_from_slice(&9994i32.to_be_bytes());
    out.extend_from_slice(&[0u8; 20]);
    // file length, patched once the records are written
    out.extend_from_slice(&0i32.to_be_bytes());
    out.extend_from_slice(&1000i32.to_le_bytes());
    out.extend_from_slice(&shape_type.to_le_bytes());
    for value in bbox {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out.extend_from_slice(&[0u8; 32]);
}

fn finish_shp(mut out: Vec<u8>) -> Vec<u8> {
    let words = (out.len() / 2) as i32;
    out[24..28].copy_from_slice(&words.to_be_bytes());
    out
}

fn bbox(points: impl Iterator<Item = (f64, f64)>) -> [f64; 4] {
    points.fold(
        [f64::MAX, f64::MAX, f64::MIN, f64::MIN],
        |[xmin, ymin, xmax, ymax], (x, y)| [xmin.min(x), ymin.min(y), xmax.max(x), ymax.max(y)],
    )
}

fn point_shp(points: &[(f64, f64)]) -> Vec<u8> {
    let mut out = Vec::new();
    shp_header(&mut out, 1, bbox(points.iter().copied()));
    for (index, (x, y)) in points.iter().enumerate() {
        out.extend_from_slice(&(index as i32 + 1).to_be_bytes());
        out.extend_from_slice(&10i32.to_be_bytes());
        out.extend_from_slice(&1i32.to_le_bytes());
        out.extend_from_slice(&x.to_le_bytes());
        out.extend_from_slice(&y.to_le_bytes());
    }
    finish_shp(out)
}

fn polygon_shp(rings: &[Vec<(f64, f64)>]) -> Vec<u8> {
    let mut out = Vec::new();
    shp_header(&mut out, 5, bbox(rings.iter().flatten().copied()));
    for (index, ring) in rings.iter().enumerate() {
        let content_len = 44 + 4 + 16 * ring.len();
        out.extend_from_slice(&(index as i32 + 1).to_be_bytes());
        out.extend_from_slice(&((content_len / 2) as i32).to_be_bytes());
        out.extend_from_slice(&5i32.to_le_bytes());
        for value in bbox(ring.iter().copied()) {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out.extend_from_slice(&1i32.to_le_bytes());
        out.extend_from_slice(&(ring.len() as i32).to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        for (x, y) in ring {
            out.extend_from_slice(&x.to_le_bytes());
            out.extend_from_slice(&y.to_le_bytes());
        }
    }
    finish_shp(out)
}

/// dBase III table. Fields are `(name, type, length)`.
fn dbf(fields: &[(&str, u8, u8)], rows: &[Vec<String>]) -> Vec<u8> {
    let header_len = 32 + 32 * fields.len() + 1;
    let record_len = 1 + fields.iter().map(|field| field.2 as usize).sum::<usize>();

    let mut out = vec![0x03, 124, 1, 1];
    out.extend_from_slice(&(rows.len() as u32).to_le_bytes());
    out.extend_from_slice(&(header_len as u16).to_le_bytes());
    out.extend_from_slice(&(record_len as u16).to_le_bytes());
    out.extend_from_slice(&[0u8; 20]);

    for (name, kind, len) in fields {
        let mut descriptor = [0u8; 32];
        descriptor[..name.len()].copy_from_slice(name.as_bytes());
        descriptor[11] = *kind;
        descriptor[16] = *len;
        out.extend_from_slice(&descriptor);
    }
    out.push(0x0D);

    for row in rows {
        out.push(b' ');
        for ((_, kind, len), value) in fields.iter().zip(row) {
            let len = *len as usize;
            let cell = if *kind == b'N' {
                format!("{value:>len$}")
            } else {
                format!("{value:<len$}")
            };
            out.extend_from_slice(&cell.as_bytes()[..len]);
        }
    }
    out.push(0x1A);
    out
}
