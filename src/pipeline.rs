use crate::analysis::{Analyzer, FixedThreshold};
use crate::chart::ChartRenderer;
use crate::config::Config;
use crate::dataset;
use crate::error::ReportError;
use crate::fetch;
use crate::mail;
use crate::report::ReportAssembler;
use crate::window::ReportWindow;
use anyhow::{Context, Result};
use chrono::DateTime;
use chrono_tz::Tz;
use std::path::PathBuf;

/// Orchestrates one report run, strictly sequential: every stage consumes
/// its predecessor's complete output before the next one starts.
pub struct Pipeline {
    cfg: Config,
}

impl Pipeline {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    /// Run the whole pipeline for the window that ends on the calendar date
    /// of `now`. Returns the path of the written report.
    ///
    /// The chart files rendered along the way live in a temporary directory
    /// that is removed on every exit path, including failures.
    pub fn run(&self, now: DateTime<Tz>) -> Result<PathBuf> {
        // Branding assets are a precondition: bail before any network or
        // rendering work, and before the output file is touched.
        let assembler = ReportAssembler::new(&self.cfg.assets)?;

        let window = ReportWindow::resolve(
            now,
            self.cfg.window.anchor_hour,
            self.cfg.window.length_hours,
        )
        .context("failed to resolve report window")?;
        log::info!("reporting window {} to {}", window.start, window.end);

        let text = fetch::fetch_dataset(&self.cfg.source.url)?;

        let dataset = dataset::normalize(
            &text,
            &self.cfg.source.time_column,
            &self.cfg.source.time_format,
            self.cfg.window.timezone,
        )?;
        log::info!("normalized {} rows", dataset.records.len());

        let filtered = dataset.filter_window(&window);
        let sensors = dataset::select_active(&filtered)?;
        log::info!("detected sensor columns: {sensors:?}");

        let analyzer = Analyzer::new(Box::new(FixedThreshold::new(
            self.cfg.analysis.deviation_threshold,
        )));
        let analyses = analyzer
            .analyze(&filtered, &sensors)
            .context("failed to analyze sensors")?;
        if analyses.is_empty() {
            // Every active sensor was excluded for lack of in-window values.
            return Err(ReportError::EmptyResult.into());
        }

        let chart_dir = tempfile::tempdir().context("failed to create chart directory")?;
        let charts = ChartRenderer::new(chart_dir.path(), &window)
            .render_all(&analyses)
            .context("failed to render charts")?;

        let statistics: Vec<_> = analyses
            .iter()
            .map(|analysis| analysis.stats.clone())
            .collect();
        let report_path = self.cfg.output.report.clone();
        assembler
            .assemble(&charts, &statistics, &report_path)
            .context("failed to assemble report")?;
        log::info!("report generated at {report_path:?}");

        mail::deliver(&self.cfg.delivery, &window, &report_path)?;
        log::info!(
            "report delivered to {} recipients",
            self.cfg.delivery.recipients.len()
        );

        Ok(report_path)
        // chart_dir drops here, removing the transient chart files.
    }
}
