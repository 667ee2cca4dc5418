//! Hunt time ranges as reported by the upstream service.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// The searched time range of a hunt, cached at import time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeframe {
    /// Upstream start timestamp, verbatim.
    pub start_time: String,
    /// Upstream end timestamp, verbatim.
    pub end_time: String,
    pub formatted_start: String,
    pub formatted_end: String,
    pub duration_minutes: i64,
    /// Duration in days, rounded to one decimal place.
    pub duration_days: f64,
}

impl Timeframe {
    /// Build a timeframe from upstream start/end strings.
    ///
    /// Returns `None` when either side is empty or unparseable.
    #[must_use]
    pub fn parse(start_time: &str, end_time: &str) -> Option<Self> {
        let start = parse_instant(start_time)?;
        let end = parse_instant(end_time)?;

        let seconds = (end - start).num_seconds();
        #[allow(clippy::cast_precision_loss)]
        let days = (seconds as f64 / 86_400.0 * 10.0).round() / 10.0;

        Some(Self {
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            formatted_start: start.format(DISPLAY_FORMAT).to_string(),
            formatted_end: end.format(DISPLAY_FORMAT).to_string(),
            duration_minutes: seconds / 60,
            duration_days: days,
        })
    }

    /// Parsed `(start, end)` instants, if both still parse.
    #[must_use]
    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((parse_instant(&self.start_time)?, parse_instant(&self.end_time)?))
    }
}

/// Parse an ISO-8601 timestamp, treating a missing offset as UTC.
#[must_use]
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
