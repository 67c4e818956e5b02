use crate::dataset::Dataset;
use crate::error::ReportError;
use crate::stats;
use anyhow::Result;
use chrono::DateTime;
use chrono_tz::Tz;

/// Rule deciding whether a single value counts as a deviation from its
/// sensor's mean. Injectable so alternative rules (e.g. standard-deviation
/// based) can replace the fixed threshold without touching the analyzer.
pub trait DeviationPolicy {
    fn is_deviation(&self, value: f64, mean: f64) -> bool;
}

/// Flags values strictly further than a fixed absolute distance from the
/// mean. Boundary values at exactly `mean ± threshold` are not deviations.
pub struct FixedThreshold {
    threshold: f64,
}

impl FixedThreshold {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl DeviationPolicy for FixedThreshold {
    fn is_deviation(&self, value: f64, mean: f64) -> bool {
        value > mean + self.threshold || value < mean - self.threshold
    }
}

/// A single in-window value flagged as anomalous.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviationFlag {
    pub timestamp: DateTime<Tz>,
    pub value: f64,
}

/// Summary row of one sensor, consumed by the report table.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorStatistics {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub deviation_count: usize,
}

/// Everything the chart renderer and report assembler need for one sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorAnalysis {
    pub stats: SensorStatistics,
    pub series: Vec<(DateTime<Tz>, f64)>,
    pub flags: Vec<DeviationFlag>,
}

pub struct Analyzer {
    policy: Box<dyn DeviationPolicy>,
}

impl Analyzer {
    pub fn new(policy: Box<dyn DeviationPolicy>) -> Self {
        Self { policy }
    }

    /// Analyze every active sensor, in active-set order.
    ///
    /// A sensor that is active by the column-sum test but has no present
    /// values inside the window is logged and excluded from the results
    /// rather than aborting the run.
    pub fn analyze(&self, dataset: &Dataset, sensors: &[String]) -> Result<Vec<SensorAnalysis>> {
        let mut analyses = Vec::with_capacity(sensors.len());

        for sensor in sensors {
            let idx = dataset
                .sensor_index(sensor)
                .ok_or_else(|| ReportError::Format(format!("unknown sensor column {sensor:?}")))?;
            let series = dataset.series(idx);

            let values: Vec<f64> = series.iter().map(|&(_, value)| value).collect();
            let descriptive = match stats::describe(sensor, &values) {
                Ok(descriptive) => descriptive,
                Err(error @ ReportError::InsufficientData(_)) => {
                    log::warn!("{error}, excluding it from the report");
                    continue;
                }
                Err(error) => return Err(error.into()),
            };

            let flags: Vec<DeviationFlag> = series
                .iter()
                .filter(|&&(_, value)| self.policy.is_deviation(value, descriptive.mean))
                .map(|&(timestamp, value)| DeviationFlag { timestamp, value })
                .collect();

            analyses.push(SensorAnalysis {
                stats: SensorStatistics {
                    name: sensor.clone(),
                    min: descriptive.min,
                    max: descriptive.max,
                    mean: descriptive.mean,
                    median: descriptive.median,
                    deviation_count: flags.len(),
                },
                series,
                flags,
            });
        }

        Ok(analyses)
    }
}
