use chrono::TimeZone;
use chrono_tz::Asia::Kolkata;
use deviation_report::config::{
    AnalysisConfig, AssetConfig, Config, DeliveryConfig, OutputConfig, SourceConfig, WindowConfig,
};
use deviation_report::error::ReportError;
use deviation_report::pipeline::Pipeline;
use std::path::Path;

fn test_config(dir: &Path) -> Config {
    Config {
        source: SourceConfig {
            // Must never be contacted: the asset precondition fails first.
            url: "http://127.0.0.1:9/never.csv".to_string(),
            time_column: "Date&Time".to_string(),
            time_format: "%d/%m/%y,%H:%M:%S".to_string(),
        },
        window: WindowConfig {
            timezone: Kolkata,
            anchor_hour: 6,
            length_hours: 24,
        },
        analysis: AnalysisConfig {
            deviation_threshold: 15.0,
        },
        assets: AssetConfig {
            header: dir.join("header.jpeg"),
            footer: dir.join("footer.jpeg"),
        },
        output: OutputConfig {
            report: dir.join("deviation_report.pdf"),
        },
        delivery: DeliveryConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            sender: "reports@example.com".to_string(),
            password: "app-password".to_string(),
            recipients: vec!["ops@example.com".to_string()],
            subject: "Daily Deviation Report".to_string(),
        },
    }
}

#[test]
fn missing_assets_abort_before_any_work() {
    let dir = tempfile::tempdir().expect("failed to create test directory");
    let cfg = test_config(dir.path());
    let report = cfg.output.report.clone();

    let now = Kolkata.with_ymd_and_hms(2024, 3, 15, 8, 30, 0).unwrap();
    let error = Pipeline::new(cfg).run(now).expect_err("run must fail");

    match error.downcast_ref::<ReportError>() {
        Some(ReportError::MissingAsset(path)) => {
            assert!(path.ends_with("header.jpeg"));
        }
        other => panic!("expected MissingAsset, got {other:?}"),
    }

    // No document may be written on the failure path.
    assert!(!report.exists());
}
