use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{DashError, Result};
use crate::models::{RawCell, RawTable};

/// Leading non-data rows in the bank export before the header row.
pub const DEFAULT_SKIP_ROWS: usize = 8;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(any(feature = "xlsx", test))]
pub fn excel_serial_to_datetime(serial: f64) -> Option<chrono::NaiveDateTime> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    base.checked_add_signed(chrono::Duration::milliseconds(millis))
}

fn header_name(index: usize, raw: &str) -> String {
    if raw.trim().is_empty() {
        format!("Unnamed: {index}")
    } else {
        raw.to_string()
    }
}

/// Shape data rows to the header width and drop rows with no content at all.
fn finish_table(headers: Vec<String>, rows: Vec<Vec<RawCell>>) -> RawTable {
    let width = headers.len();
    let rows = rows
        .into_iter()
        .filter(|r| r.iter().any(|c| !c.is_empty()))
        .map(|mut r| {
            r.resize(width, RawCell::Empty);
            r
        })
        .collect();
    RawTable { headers, rows }
}

// ---------------------------------------------------------------------------
// Source file
// ---------------------------------------------------------------------------

/// The uploaded file: its bytes plus the content hash that identifies it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub checksum: String,
}

impl SourceFile {
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let checksum = compute_checksum(&bytes);
        Self {
            name: name.into(),
            bytes,
            checksum,
        }
    }

    pub fn short_checksum(&self) -> &str {
        &self.checksum[..12.min(self.checksum.len())]
    }
}

/// Read the file if one was provided. `None` in means `None` out: no file is
/// an empty state, not an error.
pub fn load(path: Option<&Path>) -> Result<Option<SourceFile>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let source = SourceFile::read(path)?;
    info!(file = %source.name, bytes = source.bytes.len(), checksum = source.short_checksum(), "read source file");
    Ok(Some(source))
}

// ---------------------------------------------------------------------------
// Formats (enum dispatch)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceFormat {
    #[cfg(feature = "xlsx")]
    Xlsx,
    Csv,
}

impl SourceFormat {
    pub fn key(&self) -> &'static str {
        match self {
            #[cfg(feature = "xlsx")]
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }

    pub fn detect(&self, source: &SourceFile) -> bool {
        match self {
            #[cfg(feature = "xlsx")]
            Self::Xlsx => detect_xlsx(source),
            Self::Csv => detect_csv(source),
        }
    }

    pub fn parse(&self, source: &SourceFile, skip_rows: usize) -> Result<RawTable> {
        match self {
            #[cfg(feature = "xlsx")]
            Self::Xlsx => parse_xlsx(source, skip_rows),
            Self::Csv => parse_csv(source, skip_rows),
        }
    }
}

const ALL_FORMATS: &[SourceFormat] = &[
    #[cfg(feature = "xlsx")]
    SourceFormat::Xlsx,
    SourceFormat::Csv,
];

pub fn get_by_key(key: &str) -> Option<SourceFormat> {
    ALL_FORMATS.iter().find(|f| f.key() == key).copied()
}

pub fn get_for_source(source: &SourceFile) -> Result<SourceFormat> {
    let ext = Path::new(&source.name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    if let Some(format) = ext.as_deref().and_then(get_by_key) {
        return Ok(format);
    }
    ALL_FORMATS
        .iter()
        .find(|f| f.detect(source))
        .copied()
        .ok_or_else(|| DashError::Other(format!("Unrecognized file format: {}", source.name)))
}

/// Parse the source into a raw table using the detected format.
pub fn read_raw_table(source: &SourceFile, skip_rows: usize) -> Result<RawTable> {
    let format = get_for_source(source)?;
    debug!(format = format.key(), skip_rows, "parsing source");
    let table = format.parse(source, skip_rows)?;
    debug!(columns = table.headers.len(), rows = table.rows.len(), "raw table ready");
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn detect_csv(source: &SourceFile) -> bool {
    std::str::from_utf8(&source.bytes).is_ok()
}

fn parse_csv(source: &SourceFile, skip_rows: usize) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source.bytes.as_slice());

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        if i < skip_rows {
            continue;
        }
        if headers.is_none() {
            headers = Some(
                record
                    .iter()
                    .enumerate()
                    .map(|(idx, h)| header_name(idx, h))
                    .collect(),
            );
            continue;
        }
        rows.push(
            record
                .iter()
                .map(|f| {
                    if f.is_empty() {
                        RawCell::Empty
                    } else {
                        RawCell::Text(f.to_string())
                    }
                })
                .collect(),
        );
    }

    let headers = headers.ok_or_else(|| DashError::Schema {
        missing: vec![format!("header row (after skipping {skip_rows} rows)")],
    })?;
    Ok(finish_table(headers, rows))
}

// ---------------------------------------------------------------------------
// XLSX (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "xlsx")]
fn detect_xlsx(source: &SourceFile) -> bool {
    // XLSX is a ZIP container
    source.bytes.starts_with(b"PK\x03\x04")
}

#[cfg(feature = "xlsx")]
fn xlsx_cell(data: &calamine::Data) -> RawCell {
    use calamine::Data;
    match data {
        Data::Empty => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Int(i) => RawCell::Int(*i),
        Data::Float(f) => RawCell::Float(*f),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(RawCell::DateTime)
            .unwrap_or(RawCell::Float(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
        Data::Error(e) => RawCell::Text(format!("#{e:?}")),
    }
}

#[cfg(feature = "xlsx")]
fn parse_xlsx(source: &SourceFile, skip_rows: usize) -> Result<RawTable> {
    use calamine::Reader;

    let cursor = std::io::Cursor::new(source.bytes.as_slice());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| DashError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DashError::Workbook("workbook has no sheets".to_string()))?
        .map_err(|e| DashError::Workbook(e.to_string()))?;

    // calamine trims leading empty rows and columns; account for both so the
    // skip count and the Unnamed indices line up with the sheet itself.
    let (start_row, start_col) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));
    let skip = skip_rows.saturating_sub(start_row);

    let mut rows_iter = range.rows().skip(skip);
    let header_row = rows_iter.next().ok_or_else(|| DashError::Schema {
        missing: vec![format!("header row (after skipping {skip_rows} rows)")],
    })?;
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let text = match cell {
                calamine::Data::Empty => String::new(),
                other => xlsx_cell(other).as_text(),
            };
            header_name(idx + start_col, &text)
        })
        .collect();

    let rows: Vec<Vec<RawCell>> = rows_iter
        .map(|r| r.iter().map(xlsx_cell).collect())
        .collect();
    Ok(finish_table(headers, rows))
}
