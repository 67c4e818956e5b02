use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the report pipeline.
///
/// Every variant except [`ReportError::InsufficientData`] is fatal for the
/// whole run. `InsufficientData` is handled at the per-sensor level: the
/// sensor is logged and excluded instead of aborting the run.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to fetch dataset from {url}")]
    DataFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed dataset: {0}")]
    Format(String),

    #[error("no valid sensor columns found in the data")]
    EmptyResult,

    #[error("sensor {0:?} has no values inside the report window")]
    InsufficientData(String),

    #[error("missing report asset {0:?}")]
    MissingAsset(PathBuf),

    #[error("failed to deliver report: {0}")]
    Delivery(String),
}
