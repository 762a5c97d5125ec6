//! Structured errors for the ETL pipeline.

use thiserror::Error;

/// Errors raised while parsing or transforming event datasets.
///
/// I/O and CSV-level failures propagate as [`anyhow::Error`]; these variants
/// cover the cases where the data itself is malformed.
#[derive(Debug, Error)]
pub enum EtlError {
    /// A `WEEK` value could not be parsed as a `dd-Month-yyyy` date.
    #[error("cannot parse year from WEEK value `{week}`")]
    Parse { week: String },

    /// A required column is absent from the input table.
    #[error("required column `{column}` is missing from the input")]
    Schema { column: String },

    /// A country name and an event-type name produce the same node id.
    #[error("node id `{id}` appears as both a country and an event type")]
    NodeCollision { id: String },
}
