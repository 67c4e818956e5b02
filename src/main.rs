use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use deviation_report::config::Config;
use deviation_report::pipeline::Pipeline;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long, default_value = "report.toml")]
    config: PathBuf,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let cfg = Config::from_file(&args.config).context("failed to load cfg")?;

    // The reference moment is read once; every stage derives from it.
    let now = Utc::now().with_timezone(&cfg.window.timezone);

    let pipeline = Pipeline::new(cfg);
    pipeline.run(now).context("failed to run report pipeline")?;

    Ok(())
}
