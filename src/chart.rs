use crate::analysis::SensorAnalysis;
use crate::window::ReportWindow;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};

const CHART_SIZE: (u32, u32) = (1200, 600);

// One distinguishable style per sensor, wrapping when there are more
// sensors than colors.
const PALETTE: [RGBColor; 6] = [
    RGBColor(0, 0, 255),
    RGBColor(255, 165, 0),
    RGBColor(0, 128, 0),
    RGBColor(255, 0, 0),
    RGBColor(128, 0, 128),
    RGBColor(165, 42, 42),
];

pub fn palette_color(idx: usize) -> RGBColor {
    PALETTE[idx % PALETTE.len()]
}

/// Rendered chart files for one run.
///
/// Each sensor keeps a stable (name, path) identity so the assembler can
/// place the images deterministically.
#[derive(Debug)]
pub struct ChartSet {
    pub combined: PathBuf,
    pub sensors: Vec<(String, PathBuf)>,
}

/// Renders the pre-computed series and flags into PNG files.
///
/// Purely a visualization stage: it computes no statistics of its own and
/// mutates nothing upstream.
pub struct ChartRenderer<'a> {
    out_dir: &'a Path,
    window: &'a ReportWindow,
}

impl<'a> ChartRenderer<'a> {
    pub fn new(out_dir: &'a Path, window: &'a ReportWindow) -> Self {
        Self { out_dir, window }
    }

    pub fn render_all(&self, analyses: &[SensorAnalysis]) -> Result<ChartSet> {
        let combined = self
            .render_combined(analyses)
            .context("failed to render combined chart")?;

        let mut sensors = Vec::with_capacity(analyses.len());
        for (idx, analysis) in analyses.iter().enumerate() {
            let path = self.render_sensor(analysis, idx).with_context(|| {
                format!("failed to render chart for sensor {:?}", analysis.stats.name)
            })?;
            sensors.push((analysis.stats.name.clone(), path));
        }

        Ok(ChartSet { combined, sensors })
    }

    fn render_combined(&self, analyses: &[SensorAnalysis]) -> Result<PathBuf> {
        let path = self.out_dir.join("combined_data.png");
        let (start_label, end_label) = self.window.date_labels();

        let values: Vec<f64> = analyses
            .iter()
            .flat_map(|analysis| analysis.series.iter().map(|&(_, value)| value))
            .collect();
        let y_range = value_bounds(&values);

        let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Combined Sensor Data - {start_label} to {end_label}"),
                ("sans-serif", 30),
            )
            .margin(10)
            .x_label_area_size(45)
            .y_label_area_size(55)
            .build_cartesian_2d(self.x_range(), y_range)?;

        chart
            .configure_mesh()
            .x_labels(24)
            .x_label_formatter(&|timestamp: &NaiveDateTime| timestamp.format("%H:%M").to_string())
            .x_desc("Time")
            .y_desc("Value")
            .draw()?;

        for (idx, analysis) in analyses.iter().enumerate() {
            let color = palette_color(idx);
            let points = analysis
                .series
                .iter()
                .map(|&(timestamp, value)| (timestamp.naive_local(), value));
            chart
                .draw_series(LineSeries::new(points, color.stroke_width(1)))?
                .label(analysis.stats.name.clone())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(1))
                });
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE)
            .border_style(&BLACK)
            .draw()?;

        drop(chart);
        root.present()?;
        drop(root);

        Ok(path)
    }

    fn render_sensor(&self, analysis: &SensorAnalysis, idx: usize) -> Result<PathBuf> {
        let name = &analysis.stats.name;
        let path = self
            .out_dir
            .join(format!("{:02}_{}_deviations.png", idx, file_stem(name)));
        let (start_label, end_label) = self.window.date_labels();

        let values: Vec<f64> = analysis.series.iter().map(|&(_, value)| value).collect();
        let y_range = value_bounds(&values);

        let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("{name} Data with Deviations - {start_label} to {end_label}"),
                ("sans-serif", 30),
            )
            .margin(10)
            .x_label_area_size(45)
            .y_label_area_size(55)
            .build_cartesian_2d(self.x_range(), y_range)?;

        chart
            .configure_mesh()
            .x_labels(24)
            .x_label_formatter(&|timestamp: &NaiveDateTime| timestamp.format("%H:%M").to_string())
            .x_desc("Time")
            .y_desc("Value")
            .draw()?;

        let color = palette_color(idx);
        let points = analysis
            .series
            .iter()
            .map(|&(timestamp, value)| (timestamp.naive_local(), value));
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(1)))?
            .label(format!("{name} Data"))
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(1))
            });

        let mean = analysis.stats.mean;
        let mean_color = RGBColor(0, 0, 255);
        chart
            .draw_series(LineSeries::new(
                vec![
                    (self.window.start.naive_local(), mean),
                    (self.window.end.naive_local(), mean),
                ],
                mean_color.stroke_width(1),
            ))?
            .label(format!("Avg {mean:.2}"))
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], mean_color.stroke_width(1))
            });

        // Flagged points go on top of the series line.
        chart
            .draw_series(analysis.flags.iter().map(|flag| {
                Circle::new((flag.timestamp.naive_local(), flag.value), 4, RED.filled())
            }))?
            .label("Deviations")
            .legend(|(x, y)| Circle::new((x + 10, y), 4, RED.filled()));

        chart
            .configure_series_labels()
            .background_style(&WHITE)
            .border_style(&BLACK)
            .draw()?;

        drop(chart);
        root.present()?;
        drop(root);

        Ok(path)
    }

    fn x_range(&self) -> RangedDateTime<NaiveDateTime> {
        (self.window.start.naive_local()..self.window.end.naive_local()).into()
    }
}

fn value_bounds(values: &[f64]) -> Range<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let padding = if max > min { (max - min) * 0.05 } else { 1.0 };
    (min - padding)..(max + padding)
}

fn file_stem(sensor: &str) -> String {
    sensor
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
