//! CSV parser for semicolon-delimited event tables.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use csv::StringRecord;
use serde::Deserialize;
use tracing::debug;

use crate::error::EtlError;

/// Date format of the `WEEK` column, e.g. `07-March-2015`.
const WEEK_FORMAT: &str = "%d-%B-%Y";

/// A single row of the aggregated event table.
///
/// Column names are exact and case-sensitive; `WEEK` is only required when
/// time filtering is requested.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "COUNTRY")]
    pub country: String,
    #[serde(rename = "EVENT_TYPE")]
    pub event_type: String,
    #[serde(rename = "EVENTS")]
    pub events: u64,
    #[serde(rename = "WEEK", default)]
    pub week: Option<String>,
}

/// Extracts the year from a `WEEK` label by parsing the full date with an
/// explicit format.
///
/// # Errors
///
/// Returns [`EtlError::Parse`] if the value is not a valid `dd-Month-yyyy`
/// date.
pub fn week_year(week: &str) -> Result<i32, EtlError> {
    NaiveDate::parse_from_str(week.trim(), WEEK_FORMAT)
        .map(|date| date.year())
        .map_err(|_| EtlError::Parse {
            week: week.to_string(),
        })
}

/// Reads all event records from a semicolon-delimited CSV file.
///
/// # Errors
///
/// Fails if the file cannot be opened, a required column is missing, or a row
/// does not deserialize (e.g. a non-numeric `EVENTS` value).
pub fn read_records(path: &Path) -> Result<Vec<EventRecord>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let records = read_records_from(file)?;
    debug!(path = %path.display(), rows = records.len(), "Event table loaded");
    Ok(records)
}

/// Reads event records from any reader carrying semicolon-delimited CSV.
pub fn read_records_from<R: Read>(reader: R) -> Result<Vec<EventRecord>> {
    let mut rdr = csv::ReaderBuilder::new().delimiter(b';').from_reader(reader);

    let headers = rdr.headers()?.clone();
    ensure_columns(&headers, &["COUNTRY", "EVENT_TYPE", "EVENTS"])?;

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: EventRecord = result?;
        records.push(record);
    }

    Ok(records)
}

/// Checks that every required column is present in the header row.
pub(crate) fn ensure_columns(headers: &StringRecord, required: &[&str]) -> Result<(), EtlError> {
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(EtlError::Schema {
                column: column.to_string(),
            });
        }
    }
    Ok(())
}
