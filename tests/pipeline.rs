use chrono::{DateTime, TimeZone};
use chrono_tz::Asia::Kolkata;
use chrono_tz::Tz;
use deviation_report::analysis::{Analyzer, DeviationPolicy, FixedThreshold};
use deviation_report::dataset::{self, Dataset};
use deviation_report::error::ReportError;
use deviation_report::stats;
use deviation_report::window::ReportWindow;

const TIME_COLUMN: &str = "Date&Time";
const TIME_FORMAT: &str = "%d/%m/%y,%H:%M:%S";

fn kolkata(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Tz> {
    Kolkata.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

fn test_window() -> ReportWindow {
    // Run moment 2024-03-15 08:30 IST: the window is 06:00 on the 14th to
    // 06:00 on the 15th.
    ReportWindow::resolve(kolkata(2024, 3, 15, 8, 30, 0), 6, 24).expect("failed to resolve window")
}

fn csv_row(timestamp: &str, cells: &[&str]) -> String {
    // The timestamp cell contains a comma, so it must be quoted.
    format!("\"{timestamp}\",{}\n", cells.join(","))
}

fn parse(text: &str) -> Dataset {
    dataset::normalize(text, TIME_COLUMN, TIME_FORMAT, Kolkata).expect("failed to normalize")
}

fn analyzer(threshold: f64) -> Analyzer {
    Analyzer::new(Box::new(FixedThreshold::new(threshold)))
}

#[test]
fn window_is_anchored_and_half_open() {
    let window = test_window();

    assert_eq!(window.start, kolkata(2024, 3, 14, 6, 0, 0));
    assert_eq!(window.end, kolkata(2024, 3, 15, 6, 0, 0));

    assert!(window.contains(window.start));
    assert!(!window.contains(window.end));
    assert!(window.contains(kolkata(2024, 3, 14, 23, 59, 59)));
    assert!(!window.contains(kolkata(2024, 3, 14, 5, 59, 59)));
}

#[test]
fn window_resolution_is_deterministic() {
    let now = kolkata(2024, 3, 15, 18, 45, 12);
    let first = ReportWindow::resolve(now, 6, 24).unwrap();
    let second = ReportWindow::resolve(now, 6, 24).unwrap();
    assert_eq!(first, second);
}

#[test]
fn filter_never_keeps_out_of_window_records() {
    let mut text = format!("{TIME_COLUMN},A\n");
    text += &csv_row("13/03/24,12:00:00", &["1.0"]);
    text += &csv_row("14/03/24,06:00:00", &["2.0"]);
    text += &csv_row("14/03/24,18:30:00", &["3.0"]);
    text += &csv_row("15/03/24,06:00:00", &["4.0"]);
    text += &csv_row("15/03/24,12:00:00", &["5.0"]);

    let window = test_window();
    let filtered = parse(&text).filter_window(&window);

    assert_eq!(filtered.records.len(), 2);
    assert!(
        filtered
            .records
            .iter()
            .all(|record| window.contains(record.timestamp))
    );
}

#[test]
fn active_set_ignores_row_order() {
    let header = format!("{TIME_COLUMN},A,B,C\n");
    let rows = [
        csv_row("14/03/24,07:00:00", &["1.0", "0.0", "5.0"]),
        csv_row("14/03/24,08:00:00", &["2.0", "0.0", "-5.0"]),
        csv_row("14/03/24,09:00:00", &["3.0", "0.0", "1.0"]),
    ];

    let forward = format!("{header}{}{}{}", rows[0], rows[1], rows[2]);
    let backward = format!("{header}{}{}{}", rows[2], rows[1], rows[0]);

    let window = test_window();
    let active_fwd = dataset::select_active(&parse(&forward).filter_window(&window)).unwrap();
    let active_bwd = dataset::select_active(&parse(&backward).filter_window(&window)).unwrap();

    assert_eq!(active_fwd, active_bwd);
    assert_eq!(active_fwd, vec!["A".to_string(), "C".to_string()]);
}

#[test]
fn all_zero_sensor_is_excluded_and_steady_sensor_has_no_deviations() {
    let mut text = format!("{TIME_COLUMN},A,B\n");
    for hour in 7..13 {
        text += &csv_row(&format!("14/03/24,{hour:02}:00:00"), &["10.0", "0.0"]);
    }

    let window = test_window();
    let filtered = parse(&text).filter_window(&window);
    let active = dataset::select_active(&filtered).unwrap();
    assert_eq!(active, vec!["A".to_string()]);

    let analyses = analyzer(15.0).analyze(&filtered, &active).unwrap();
    assert_eq!(analyses.len(), 1);
    assert_eq!(analyses[0].stats.deviation_count, 0);
    assert!(analyses[0].flags.is_empty());
}

#[test]
fn threshold_boundary_values_are_not_deviations() {
    // Values 10 and 40 around mean 25 sit exactly on mean +/- 15.
    let mut text = format!("{TIME_COLUMN},A\n");
    text += &csv_row("14/03/24,07:00:00", &["10.0"]);
    text += &csv_row("14/03/24,08:00:00", &["40.0"]);

    let window = test_window();
    let filtered = parse(&text).filter_window(&window);
    let active = dataset::select_active(&filtered).unwrap();

    let analyses = analyzer(15.0).analyze(&filtered, &active).unwrap();
    assert_eq!(analyses[0].stats.mean, 25.0);
    assert_eq!(analyses[0].stats.deviation_count, 0);
}

#[test]
fn single_spike_is_flagged() {
    let mut text = format!("{TIME_COLUMN},C\n");
    for (hour, value) in [(7, "0.0"), (8, "0.0"), (9, "0.0"), (10, "100.0")] {
        text += &csv_row(&format!("14/03/24,{hour:02}:00:00"), &[value]);
    }

    let window = test_window();
    let filtered = parse(&text).filter_window(&window);
    let active = dataset::select_active(&filtered).unwrap();

    let analyses = analyzer(15.0).analyze(&filtered, &active).unwrap();
    let stats = &analyses[0].stats;
    assert_eq!(stats.mean, 25.0);
    assert_eq!(stats.min, 0.0);
    assert_eq!(stats.max, 100.0);
    assert_eq!(stats.median, 0.0);
    assert_eq!(stats.deviation_count, 1);
    assert_eq!(analyses[0].flags[0].value, 100.0);
    assert!(stats.deviation_count <= filtered.records.len());
}

#[test]
fn statistics_are_ordered_and_deterministic() {
    let mut text = format!("{TIME_COLUMN},A\n");
    for (hour, value) in [(7, "12.0"), (8, "47.5"), (9, "3.25"), (10, "18.0")] {
        text += &csv_row(&format!("14/03/24,{hour:02}:00:00"), &[value]);
    }

    let window = test_window();
    let filtered = parse(&text).filter_window(&window);
    let active = dataset::select_active(&filtered).unwrap();

    let first = analyzer(15.0).analyze(&filtered, &active).unwrap();
    let second = analyzer(15.0).analyze(&filtered, &active).unwrap();
    assert_eq!(first, second);

    let stats = &first[0].stats;
    assert!(stats.min <= stats.median && stats.median <= stats.max);
    assert!(stats.min <= stats.mean && stats.mean <= stats.max);
}

#[test]
fn fully_out_of_window_dataset_fails_with_empty_result() {
    let mut text = format!("{TIME_COLUMN},A\n");
    text += &csv_row("01/01/24,12:00:00", &["7.0"]);
    text += &csv_row("02/01/24,12:00:00", &["9.0"]);

    let window = test_window();
    let filtered = parse(&text).filter_window(&window);
    assert!(filtered.records.is_empty());

    match dataset::select_active(&filtered) {
        Err(ReportError::EmptyResult) => {}
        other => panic!("expected EmptyResult, got {other:?}"),
    }
}

#[test]
fn missing_time_column_fails_with_format_error() {
    let text = "Timestamp,A\n\"14/03/24,07:00:00\",1.0\n";

    match dataset::normalize(text, TIME_COLUMN, TIME_FORMAT, Kolkata) {
        Err(ReportError::Format(message)) => assert!(message.contains(TIME_COLUMN)),
        other => panic!("expected Format error, got {other:?}"),
    }
}

#[test]
fn unparseable_timestamp_rows_are_dropped() {
    let mut text = format!("{TIME_COLUMN},A\n");
    text += &csv_row("14/03/24,07:00:00", &["1.0"]);
    text += "not-a-timestamp,2.0\n";
    text += &csv_row("14/03/24,08:00:00", &["3.0"]);

    let dataset = parse(&text);
    assert_eq!(dataset.records.len(), 2);
}

#[test]
fn non_numeric_cells_become_absent_values() {
    let mut text = format!("{TIME_COLUMN},A,B\n");
    text += &csv_row("14/03/24,07:00:00", &["1.5", "n/a"]);
    text += &csv_row("14/03/24,08:00:00", &["", "2.5"]);

    let dataset = parse(&text);
    assert_eq!(dataset.records.len(), 2);
    assert_eq!(dataset.records[0].values, vec![Some(1.5), None]);
    assert_eq!(dataset.records[1].values, vec![None, Some(2.5)]);
}

#[test]
fn empty_series_statistics_fail_explicitly() {
    match stats::describe("A", &[]) {
        Err(ReportError::InsufficientData(sensor)) => assert_eq!(sensor, "A"),
        other => panic!("expected InsufficientData, got {other:?}"),
    }
}

#[test]
fn analyzer_excludes_sensor_with_no_present_values() {
    // B never has a parseable cell, but the caller may still name it.
    let mut text = format!("{TIME_COLUMN},A,B\n");
    text += &csv_row("14/03/24,07:00:00", &["1.0", "x"]);
    text += &csv_row("14/03/24,08:00:00", &["2.0", "x"]);

    let window = test_window();
    let filtered = parse(&text).filter_window(&window);

    let sensors = vec!["A".to_string(), "B".to_string()];
    let analyses = analyzer(15.0).analyze(&filtered, &sensors).unwrap();

    assert_eq!(analyses.len(), 1);
    assert_eq!(analyses[0].stats.name, "A");
}

#[test]
fn fixed_threshold_uses_strict_inequality() {
    let policy = FixedThreshold::new(15.0);

    assert!(!policy.is_deviation(40.0, 25.0));
    assert!(!policy.is_deviation(10.0, 25.0));
    assert!(policy.is_deviation(40.1, 25.0));
    assert!(policy.is_deviation(9.9, 25.0));
}
