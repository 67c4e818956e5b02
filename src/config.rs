use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs,
    ops::RangeBounds,
    path::{Path, PathBuf},
};

/// Report configuration parameters.
///
/// Loaded from a TOML file and validated before use. The file fully
/// parameterizes a run: the binary itself takes no other arguments.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub window: WindowConfig,
    pub analysis: AnalysisConfig,
    pub assets: AssetConfig,
    pub output: OutputConfig,
    pub delivery: DeliveryConfig,
}

/// Where the raw dataset comes from and how its time column reads.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub url: String,
    pub time_column: String,
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// IANA name of the anchor time zone, e.g. "Asia/Kolkata".
    pub timezone: Tz,
    #[serde(default = "default_anchor_hour")]
    pub anchor_hour: u32,
    #[serde(default = "default_length_hours")]
    pub length_hours: i64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Absolute distance from the per-sensor mean beyond which a value is
    /// flagged as a deviation.
    #[serde(default = "default_deviation_threshold")]
    pub deviation_threshold: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    pub header: PathBuf,
    pub footer: PathBuf,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub report: PathBuf,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub sender: String,
    pub password: String,
    pub recipients: Vec<String>,
    pub subject: String,
}

fn default_time_format() -> String {
    "%d/%m/%y,%H:%M:%S".to_string()
}

fn default_anchor_hour() -> u32 {
    6
}

fn default_length_hours() -> i64 {
    24
}

fn default_deviation_threshold() -> f64 {
    15.0
}

fn default_smtp_port() -> u16 {
    587
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_str(&self.source.url).context("invalid source url")?;
        check_str(&self.source.time_column).context("invalid time column")?;
        check_str(&self.source.time_format).context("invalid time format")?;

        check_num(self.window.anchor_hour, 0..24).context("invalid anchor hour")?;
        check_num(self.window.length_hours, 1..=168).context("invalid window length")?;

        if self.analysis.deviation_threshold <= 0.0 {
            bail!(
                "deviation threshold must be positive, but is {}",
                self.analysis.deviation_threshold
            );
        }

        check_num(self.delivery.smtp_port, 1..=65535).context("invalid smtp port")?;
        check_str(&self.delivery.smtp_host).context("invalid smtp host")?;
        check_str(&self.delivery.sender).context("invalid sender")?;
        if self.delivery.recipients.is_empty() {
            bail!("recipient list must not be empty");
        }
        for recipient in &self.delivery.recipients {
            check_str(recipient).context("invalid recipient")?;
        }

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_str(value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("string must not be empty");
    }
    Ok(())
}
