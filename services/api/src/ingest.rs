//! Spreadsheet ingestion
//!
//! An upload goes `received -> validated -> parsed -> upserted`. This module
//! covers everything up to the upsert: checking the file metadata, reading
//! the first worksheet and checking that every row belongs to the declared
//! period. The upsert itself lives in the tunkin repository.
//!
//! Worksheet layout: one header row, then `periode | nipam | nominal` in
//! columns A to C. Rows with an empty `nipam` are skipped.

use std::{collections::BTreeSet, io::Cursor, path::Path};

use axum::body::Bytes;
use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use thiserror::Error;
use tracing::debug;

use crate::models::SalaryKpiRecord;

pub const ALLOWED_EXTENSIONS: [&str; 2] = ["xls", "xlsx"];

pub const ALLOWED_CONTENT_TYPES: [&str; 2] = [
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// Rows before the first data row
pub const HEADER_ROWS: u32 = 1;

const PERIOD_COLUMN: u32 = 0;
const NIPAM_COLUMN: u32 = 1;
const NOMINAL_COLUMN: u32 = 2;

#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    #[error("File not found")]
    MissingFile,

    #[error("Invalid file name")]
    MissingFilename,

    #[error("File extension not allowed. Only .xls and .xlsx are accepted")]
    Extension,

    #[error("Uploaded file has no content")]
    EmptyUpload,

    #[error("File exceeds the maximum size of {0} bytes")]
    TooLarge(u64),

    #[error("Content type '{0}' is not an Excel workbook")]
    ContentType(String),

    #[error("Could not read workbook: {0}")]
    Workbook(String),

    #[error("File is empty")]
    NoRows,

    #[error("Row {row}: {reason}")]
    Row { row: u32, reason: String },

    #[error("File contains more than one periode: {0}")]
    MixedPeriods(String),

    #[error("Periode in file ({found}) does not match the declared periode ({declared})")]
    PeriodMismatch { found: String, declared: String },
}

/// An uploaded file held in memory for the duration of one request
///
/// The buffer is released exactly once, when the value is dropped.
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    bytes: Bytes,
}

impl UploadedFile {
    pub fn new(filename: Option<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            filename,
            content_type,
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl Drop for UploadedFile {
    fn drop(&mut self) {
        debug!(
            filename = self.filename.as_deref().unwrap_or("<unnamed>"),
            size = self.bytes.len(),
            "Released upload buffer"
        );
    }
}

/// Check file metadata in order; the first failure wins
pub fn validate_upload(file: Option<&UploadedFile>, max_size: u64) -> Result<&UploadedFile, IngestError> {
    let file = file.ok_or(IngestError::MissingFile)?;

    let filename = file
        .filename
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .ok_or(IngestError::MissingFilename)?;

    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or(IngestError::Extension)?;
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(IngestError::Extension);
    }

    let size = file.size();
    if size == 0 {
        return Err(IngestError::EmptyUpload);
    }
    if size > max_size {
        return Err(IngestError::TooLarge(max_size));
    }

    let content_type = file.content_type.as_deref().unwrap_or_default();
    if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
        return Err(IngestError::ContentType(content_type.to_string()));
    }

    Ok(file)
}

/// Open the upload as a workbook and return its first worksheet
pub fn read_workbook(file: &UploadedFile) -> Result<Range<Data>, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(file.bytes.clone()))
        .map_err(|e| IngestError::Workbook(e.to_string()))?;

    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::Workbook("workbook has no worksheet".to_string()))?
        .map_err(|e| IngestError::Workbook(e.to_string()))
}

fn cell_text(cell: Option<&Data>) -> Option<String> {
    match cell? {
        Data::Empty => None,
        Data::String(value) => {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }
        Data::Int(value) => Some(value.to_string()),
        Data::Float(value) if value.fract() == 0.0 => Some(format!("{}", *value as i64)),
        other => Some(other.to_string()),
    }
}

fn cell_amount(cell: Option<&Data>) -> Result<f64, String> {
    let amount = match cell {
        None | Some(Data::Empty) => return Err("nominal is empty".to_string()),
        Some(Data::Int(value)) => *value as f64,
        Some(Data::Float(value)) => *value,
        Some(Data::String(value)) => value
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("nominal '{}' is not a number", value.trim()))?,
        Some(other) => return Err(format!("nominal '{}' is not a number", other)),
    };

    if amount.is_finite() {
        Ok(amount)
    } else {
        Err("nominal is not a finite number".to_string())
    }
}

/// Extract `(periode, nipam, nominal)` from every data row
pub fn parse_records(range: &Range<Data>) -> Result<Vec<SalaryKpiRecord>, IngestError> {
    let Some((last_row, _)) = range.end() else {
        return Err(IngestError::NoRows);
    };

    let mut records = Vec::new();
    for row in HEADER_ROWS..=last_row {
        let Some(nipam) = cell_text(range.get_value((row, NIPAM_COLUMN))) else {
            continue;
        };
        // Spreadsheet rows are 1-based.
        let sheet_row = row + 1;

        let periode = cell_text(range.get_value((row, PERIOD_COLUMN))).ok_or_else(|| {
            IngestError::Row {
                row: sheet_row,
                reason: "periode is empty".to_string(),
            }
        })?;
        let nominal = cell_amount(range.get_value((row, NOMINAL_COLUMN))).map_err(|reason| {
            IngestError::Row {
                row: sheet_row,
                reason,
            }
        })?;

        records.push(SalaryKpiRecord {
            periode,
            nipam,
            nominal,
        });
    }

    if records.is_empty() {
        return Err(IngestError::NoRows);
    }
    Ok(records)
}

/// Every row must carry the same period, and it must be the declared one
pub fn ensure_single_period(records: &[SalaryKpiRecord], declared: &str) -> Result<(), IngestError> {
    let periods: BTreeSet<&str> = records.iter().map(|r| r.periode.as_str()).collect();

    if periods.len() > 1 {
        let listed: Vec<&str> = periods.into_iter().collect();
        return Err(IngestError::MixedPeriods(listed.join(", ")));
    }

    match periods.into_iter().next() {
        Some(found) if found == declared => Ok(()),
        Some(found) => Err(IngestError::PeriodMismatch {
            found: found.to_string(),
            declared: declared.to_string(),
        }),
        None => Err(IngestError::NoRows),
    }
}

/// Read, parse and check an already validated upload
///
/// CPU bound; run it on the blocking pool. The upload is consumed and its
/// buffer released when this returns, whatever the outcome.
pub fn prepare_records(
    file: UploadedFile,
    declared_period: &str,
) -> Result<Vec<SalaryKpiRecord>, IngestError> {
    let range = read_workbook(&file)?;
    let records = parse_records(&range)?;
    ensure_single_period(&records, declared_period)?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

    /// Header, a text row, an all-numeric row and a row without nipam
    const TUNKIN_WORKBOOK: &[u8] = include_bytes!("../tests/fixtures/tunkin_202401.xlsx");

    fn upload(name: Option<&str>, content_type: Option<&str>, size: usize) -> UploadedFile {
        UploadedFile::new(
            name.map(str::to_string),
            content_type.map(str::to_string),
            Bytes::from(vec![0u8; size]),
        )
    }

    fn sheet(rows: &[[Data; 3]]) -> Range<Data> {
        let mut range = Range::new((0, 0), (rows.len() as u32, 2));
        range.set_value((0, 0), Data::String("periode".to_string()));
        range.set_value((0, 1), Data::String("nipam".to_string()));
        range.set_value((0, 2), Data::String("nominal".to_string()));
        for (i, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                range.set_value((i as u32 + 1, col as u32), value.clone());
            }
        }
        range
    }

    fn text(value: &str) -> Data {
        Data::String(value.to_string())
    }

    #[test]
    fn test_validation_order() {
        assert_eq!(
            validate_upload(None, 100).err(),
            Some(IngestError::MissingFile)
        );
        assert_eq!(
            validate_upload(Some(&upload(None, Some(XLSX), 0)), 100).err(),
            Some(IngestError::MissingFilename)
        );
        assert_eq!(
            validate_upload(Some(&upload(Some("gaji.csv"), None, 0)), 100).err(),
            Some(IngestError::Extension)
        );
        assert_eq!(
            validate_upload(Some(&upload(Some("gaji.xlsx"), None, 0)), 100).err(),
            Some(IngestError::EmptyUpload)
        );
        assert_eq!(
            validate_upload(Some(&upload(Some("gaji.xlsx"), None, 101)), 100).err(),
            Some(IngestError::TooLarge(100))
        );
        assert_eq!(
            validate_upload(Some(&upload(Some("gaji.xlsx"), Some("text/plain"), 10)), 100).err(),
            Some(IngestError::ContentType("text/plain".to_string()))
        );
    }

    #[test]
    fn test_validation_accepts_excel_files() {
        let modern = upload(Some("TUNKIN.XLSX"), Some(XLSX), 100);
        assert!(validate_upload(Some(&modern), 100).is_ok());

        let legacy = upload(Some("tunkin.xls"), Some("application/vnd.ms-excel"), 1);
        assert!(validate_upload(Some(&legacy), 100).is_ok());
    }

    #[test]
    fn test_parse_skips_rows_without_key() {
        let range = sheet(&[
            [text("202401"), text("19800101"), Data::Float(1_500_000.0)],
            [text("202401"), Data::Empty, Data::Float(99.0)],
            [Data::Float(202401.0), Data::Int(19900202), text(" 2750000 ")],
        ]);

        let records = parse_records(&range).unwrap();
        assert_eq!(
            records,
            vec![
                SalaryKpiRecord {
                    periode: "202401".to_string(),
                    nipam: "19800101".to_string(),
                    nominal: 1_500_000.0,
                },
                SalaryKpiRecord {
                    periode: "202401".to_string(),
                    nipam: "19900202".to_string(),
                    nominal: 2_750_000.0,
                },
            ]
        );
    }

    #[test]
    fn test_parse_header_only_is_empty() {
        let range = sheet(&[]);
        assert_eq!(parse_records(&range), Err(IngestError::NoRows));
        assert_eq!(parse_records(&Range::empty()), Err(IngestError::NoRows));
    }

    #[test]
    fn test_parse_reports_bad_amount_with_row_number() {
        let range = sheet(&[
            [text("202401"), text("A1"), Data::Int(10)],
            [text("202401"), text("A2"), text("sepuluh")],
        ]);
        assert_eq!(
            parse_records(&range),
            Err(IngestError::Row {
                row: 3,
                reason: "nominal 'sepuluh' is not a number".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_requires_period() {
        let range = sheet(&[[Data::Empty, text("A1"), Data::Int(10)]]);
        assert!(matches!(
            parse_records(&range),
            Err(IngestError::Row { row: 2, .. })
        ));
    }

    #[test]
    fn test_mixed_periods_rejected_regardless_of_declared() {
        let range = sheet(&[
            [text("202401"), text("A1"), Data::Int(10)],
            [text("202402"), text("A2"), Data::Int(20)],
        ]);
        let records = parse_records(&range).unwrap();

        for declared in ["202401", "202402", "202403"] {
            assert_eq!(
                ensure_single_period(&records, declared),
                Err(IngestError::MixedPeriods("202401, 202402".to_string()))
            );
        }
    }

    #[test]
    fn test_declared_period_must_match() {
        let range = sheet(&[[text("202401"), text("A1"), Data::Int(10)]]);
        let records = parse_records(&range).unwrap();

        assert!(ensure_single_period(&records, "202401").is_ok());
        assert_eq!(
            ensure_single_period(&records, "202402"),
            Err(IngestError::PeriodMismatch {
                found: "202401".to_string(),
                declared: "202402".to_string(),
            })
        );
    }

    #[test]
    fn test_garbage_bytes_are_not_a_workbook() {
        let file = upload(Some("tunkin.xlsx"), Some(XLSX), 64);
        assert!(matches!(
            prepare_records(file, "202401"),
            Err(IngestError::Workbook(_))
        ));
    }

    #[test]
    fn test_reads_real_workbook() {
        let file = UploadedFile::new(
            Some("tunkin_202401.xlsx".to_string()),
            Some(XLSX.to_string()),
            Bytes::from_static(TUNKIN_WORKBOOK),
        );

        let records = prepare_records(file, "202401").unwrap();
        assert_eq!(
            records,
            vec![
                SalaryKpiRecord {
                    periode: "202401".to_string(),
                    nipam: "19800101".to_string(),
                    nominal: 1_500_000.0,
                },
                SalaryKpiRecord {
                    periode: "202401".to_string(),
                    nipam: "19900202".to_string(),
                    nominal: 2_750_000.5,
                },
            ]
        );
    }

    #[test]
    fn test_real_workbook_for_other_period_is_rejected() {
        let file = UploadedFile::new(
            Some("tunkin_202401.xlsx".to_string()),
            Some(XLSX.to_string()),
            Bytes::from_static(TUNKIN_WORKBOOK),
        );
        assert!(prepare_records(file, "202402").is_err());
    }
}
