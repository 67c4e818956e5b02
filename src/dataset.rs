use crate::error::ReportError;
use crate::window::ReportWindow;
use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

/// One normalized dataset row: a resolved timestamp plus one optional value
/// per sensor column, indexed parallel to [`Dataset::sensors`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: DateTime<Tz>,
    pub values: Vec<Option<f64>>,
}

/// Parsed tabular dataset.
///
/// `sensors` preserves the original column order of the header; `records`
/// preserve input row order. No sorting is applied, and downstream stages
/// must not assume the rows are time-ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub sensors: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn sensor_index(&self, name: &str) -> Option<usize> {
        self.sensors.iter().position(|sensor| sensor == name)
    }

    /// Keep only records with `start <= timestamp < end`.
    pub fn filter_window(&self, window: &ReportWindow) -> Dataset {
        let records = self
            .records
            .iter()
            .filter(|record| window.contains(record.timestamp))
            .cloned()
            .collect();

        Dataset {
            sensors: self.sensors.clone(),
            records,
        }
    }

    /// The (timestamp, value) pairs of one sensor, skipping absent cells.
    pub fn series(&self, sensor_idx: usize) -> Vec<(DateTime<Tz>, f64)> {
        self.records
            .iter()
            .filter_map(|record| {
                record
                    .values
                    .get(sensor_idx)
                    .copied()
                    .flatten()
                    .map(|value| (record.timestamp, value))
            })
            .collect()
    }
}

/// Parse raw delimited text into a [`Dataset`].
///
/// Rows whose timestamp cell does not match `time_format` (or that fail CSV
/// decoding) are dropped; only an aggregate count is logged. Non-numeric or
/// missing value cells become absent values without invalidating the row.
///
/// # Errors
/// Returns [`ReportError::Format`] if `time_column` is absent from the header.
pub fn normalize(
    text: &str,
    time_column: &str,
    time_format: &str,
    timezone: Tz,
) -> Result<Dataset, ReportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|error| ReportError::Format(format!("unreadable header row: {error}")))?
        .clone();

    let time_idx = headers
        .iter()
        .position(|header| header == time_column)
        .ok_or_else(|| {
            ReportError::Format(format!("time column {time_column:?} not found in header"))
        })?;

    // Sensor columns keep their header order; the time column is excluded.
    let mut sensors = Vec::new();
    let mut sensor_idxs = Vec::new();
    for (idx, header) in headers.iter().enumerate() {
        if idx != time_idx {
            sensors.push(header.to_string());
            sensor_idxs.push(idx);
        }
    }

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(_) => {
                dropped += 1;
                continue;
            }
        };

        let timestamp = row
            .get(time_idx)
            .and_then(|cell| NaiveDateTime::parse_from_str(cell.trim(), time_format).ok())
            .and_then(|naive| timezone.from_local_datetime(&naive).single());
        let timestamp = match timestamp {
            Some(timestamp) => timestamp,
            None => {
                dropped += 1;
                continue;
            }
        };

        let values = sensor_idxs
            .iter()
            .map(|&idx| row.get(idx).and_then(|cell| cell.trim().parse::<f64>().ok()))
            .collect();

        records.push(Record { timestamp, values });
    }

    if dropped > 0 {
        log::info!("dropped {dropped} unparseable rows");
    }

    Ok(Dataset { sensors, records })
}

/// Determine the active sensor columns of a window-filtered dataset.
///
/// A column is active iff the sum of its present values is non-zero (exact
/// comparison). The result keeps the original column order and is computed
/// once per run.
///
/// # Errors
/// Returns [`ReportError::EmptyResult`] when no column is active, which must
/// abort the run before any chart or report work begins.
pub fn select_active(dataset: &Dataset) -> Result<Vec<String>, ReportError> {
    let mut active = Vec::new();

    for (idx, sensor) in dataset.sensors.iter().enumerate() {
        let sum: f64 = dataset
            .records
            .iter()
            .filter_map(|record| record.values.get(idx).copied().flatten())
            .sum();
        if sum != 0.0 {
            active.push(sensor.clone());
        }
    }

    if active.is_empty() {
        return Err(ReportError::EmptyResult);
    }

    Ok(active)
}
