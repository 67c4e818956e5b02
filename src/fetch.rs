use crate::error::ReportError;
use reqwest::blocking::Client;
use std::time::Duration;

/// Retrieve the raw delimited dataset as text.
///
/// Not retried: a transport failure or non-success status is fatal for the
/// whole run.
pub fn fetch_dataset(url: &str) -> Result<String, ReportError> {
    let wrap = |source: reqwest::Error| ReportError::DataFetch {
        url: url.to_string(),
        source,
    };

    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(wrap)?;

    let response = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(wrap)?;

    response.text().map_err(wrap)
}
