use crate::error::ReportError;

/// Descriptive statistics over the present values of one sensor series.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptive {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

/// Compute [`Descriptive`] statistics for one sensor.
///
/// # Errors
/// Returns [`ReportError::InsufficientData`] for an empty series instead of
/// silently producing NaN.
pub fn describe(sensor: &str, values: &[f64]) -> Result<Descriptive, ReportError> {
    if values.is_empty() {
        return Err(ReportError::InsufficientData(sensor.to_string()));
    }

    Ok(Descriptive {
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean: compute_mean(values),
        median: compute_median(values),
    })
}

fn compute_mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn compute_median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n_vals = sorted.len();
    if n_vals % 2 == 1 {
        sorted[n_vals / 2]
    } else {
        (sorted[n_vals / 2 - 1] + sorted[n_vals / 2]) / 2.0
    }
}
