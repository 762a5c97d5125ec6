//! Country allow-list filtering for raw datasets.
//!
//! The reference file carries one `Country` column; every other dataset in
//! the raw directory is filtered so that only rows matching an allowed
//! country survive.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::StringRecord;
use tracing::debug;

use crate::parser::ensure_columns;

/// Normalizes a country name for membership checks.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Loads the set of permitted country names from a semicolon-delimited
/// reference file, normalized via [`normalize`].
pub fn load_allow_list(path: &Path) -> Result<HashSet<String>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let allowed = load_allow_list_from(file)?;
    debug!(path = %path.display(), countries = allowed.len(), "Allow-list loaded");
    Ok(allowed)
}

/// Reader-based variant of [`load_allow_list`].
pub fn load_allow_list_from<R: Read>(reader: R) -> Result<HashSet<String>> {
    let mut rdr = csv::ReaderBuilder::new().delimiter(b';').from_reader(reader);

    let headers = rdr.headers()?.clone();
    ensure_columns(&headers, &["Country"])?;
    let idx = headers.iter().position(|h| h == "Country").unwrap_or(0);

    let mut allowed = HashSet::new();
    for result in rdr.records() {
        let record = result?;
        if let Some(name) = record.get(idx) {
            allowed.insert(normalize(name));
        }
    }

    Ok(allowed)
}

/// Filters a semicolon-delimited dataset down to rows whose `COUNTRY` is in
/// the allow-list. Returns the header row and the surviving rows with all
/// columns intact.
pub fn filter_dataset(
    path: &Path,
    allowed: &HashSet<String>,
) -> Result<(StringRecord, Vec<StringRecord>)> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    filter_dataset_from(file, allowed)
}

/// Reader-based variant of [`filter_dataset`].
pub fn filter_dataset_from<R: Read>(
    reader: R,
    allowed: &HashSet<String>,
) -> Result<(StringRecord, Vec<StringRecord>)> {
    let mut rdr = csv::ReaderBuilder::new().delimiter(b';').from_reader(reader);

    let headers = rdr.headers()?.clone();
    ensure_columns(&headers, &["COUNTRY"])?;
    let idx = headers.iter().position(|h| h == "COUNTRY").unwrap_or(0);

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let keep = record.get(idx).is_some_and(|c| allowed.contains(&normalize(c)));
        if keep {
            rows.push(record);
        }
    }

    Ok((headers, rows))
}
