use deviation_report::config::Config;
use std::fs;

fn example_toml() -> String {
    r#"
[source]
url = "https://example.com/AX303.csv"
time_column = "Date&Time"

[window]
timezone = "Asia/Kolkata"

[analysis]

[assets]
header = "header.jpeg"
footer = "footer.jpeg"

[output]
report = "deviation_report.pdf"

[delivery]
smtp_host = "smtp.example.com"
sender = "reports@example.com"
password = "app-password"
recipients = ["ops@example.com", "maintenance@example.com"]
subject = "Daily Deviation Report"
"#
    .to_string()
}

#[test]
fn config_loads_with_defaults() {
    let dir = tempfile::tempdir().expect("failed to create test directory");
    let path = dir.path().join("report.toml");
    fs::write(&path, example_toml()).expect("failed to write config");

    let cfg = Config::from_file(&path).expect("failed to load config");

    assert_eq!(cfg.source.time_format, "%d/%m/%y,%H:%M:%S");
    assert_eq!(cfg.window.timezone, chrono_tz::Asia::Kolkata);
    assert_eq!(cfg.window.anchor_hour, 6);
    assert_eq!(cfg.window.length_hours, 24);
    assert_eq!(cfg.analysis.deviation_threshold, 15.0);
    assert_eq!(cfg.delivery.smtp_port, 587);
    assert_eq!(cfg.delivery.recipients.len(), 2);
}

#[test]
fn invalid_anchor_hour_is_rejected() {
    let text = example_toml().replace(
        "timezone = \"Asia/Kolkata\"",
        "timezone = \"Asia/Kolkata\"\nanchor_hour = 24",
    );

    let dir = tempfile::tempdir().expect("failed to create test directory");
    let path = dir.path().join("report.toml");
    fs::write(&path, text).expect("failed to write config");

    assert!(Config::from_file(&path).is_err());
}

#[test]
fn non_positive_threshold_is_rejected() {
    let text = example_toml().replace("[analysis]", "[analysis]\ndeviation_threshold = 0.0");

    let dir = tempfile::tempdir().expect("failed to create test directory");
    let path = dir.path().join("report.toml");
    fs::write(&path, text).expect("failed to write config");

    assert!(Config::from_file(&path).is_err());
}

#[test]
fn empty_recipient_list_is_rejected() {
    let text = example_toml().replace(
        "recipients = [\"ops@example.com\", \"maintenance@example.com\"]",
        "recipients = []",
    );

    let dir = tempfile::tempdir().expect("failed to create test directory");
    let path = dir.path().join("report.toml");
    fs::write(&path, text).expect("failed to write config");

    assert!(Config::from_file(&path).is_err());
}

#[test]
fn unknown_timezone_is_rejected() {
    let text = example_toml().replace("Asia/Kolkata", "Atlantis/Nowhere");

    let dir = tempfile::tempdir().expect("failed to create test directory");
    let path = dir.path().join("report.toml");
    fs::write(&path, text).expect("failed to write config");

    assert!(Config::from_file(&path).is_err());
}
