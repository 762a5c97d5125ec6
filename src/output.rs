//! Output persistence for graph documents and filtered datasets.
//!
//! Supports pretty-printed JSON for the visualization and CSV copies of
//! filtered tables.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use csv::StringRecord;
use tracing::debug;

use crate::graph::GraphDocument;

/// Writes a [`GraphDocument`] as pretty-printed JSON (2-space indent).
///
/// Creates parent directories if they do not already exist.
pub fn write_graph(path: &Path, doc: &GraphDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(doc)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;

    debug!(path = %path.display(), nodes = doc.nodes.len(), links = doc.links.len(), "Graph written");
    Ok(())
}

/// Writes a filtered dataset as a comma-delimited CSV with its original
/// header and column order.
pub fn write_filtered(path: &Path, headers: &StringRecord, rows: &[StringRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("writing {}", path.display()))?;

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = rows.len(), "Filtered dataset written");
    Ok(())
}
