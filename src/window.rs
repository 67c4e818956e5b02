use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveTime, TimeZone};
use chrono_tz::Tz;

/// Half-open reporting interval `[start, end)` in the anchor time zone.
///
/// Resolved once per run from a reference moment and reused everywhere, so
/// that no stage re-reads the wall clock mid-pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl ReportWindow {
    /// Resolve the window covered by the report generated at `now`.
    ///
    /// The window ends at `anchor_hour` on the calendar date of `now` and
    /// extends `length_hours` back from there, so a run at any time of day N
    /// covers 06:00 day N-1 to 06:00 day N with the defaults.
    ///
    /// # Errors
    /// Returns an error if the anchor instant does not exist or is ambiguous
    /// in the time zone of `now` (a time-zone transition gap).
    pub fn resolve(now: DateTime<Tz>, anchor_hour: u32, length_hours: i64) -> Result<Self> {
        let anchor = NaiveTime::from_hms_opt(anchor_hour, 0, 0)
            .with_context(|| format!("invalid anchor hour {anchor_hour}"))?;

        let end_local = now.date_naive().and_time(anchor);
        let end = now
            .timezone()
            .from_local_datetime(&end_local)
            .single()
            .with_context(|| {
                format!("anchor time {end_local} cannot be resolved in {}", now.timezone())
            })?;

        let start = end - Duration::hours(length_hours);

        Ok(Self { start, end })
    }

    pub fn contains(&self, timestamp: DateTime<Tz>) -> bool {
        self.start <= timestamp && timestamp < self.end
    }

    /// Calendar-date label pair used in chart titles and the mail body.
    pub fn date_labels(&self) -> (String, String) {
        (
            self.start.format("%d-%m-%Y").to_string(),
            self.end.format("%d-%m-%Y").to_string(),
        )
    }
}
