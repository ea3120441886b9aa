//! Parsing of event start times embedded in announcement text.
//!
//! Announcements carry a Czech-style date such as
//! `9.9.2025 15:00 - 18:00`. Only the first occurrence in the text is
//! considered and only the start time matters; the trailing end time is
//! ignored. The wall-clock time is interpreted in the configured
//! reference timezone and converted to UTC.

use std::sync::LazyLock;

use chrono::DateTime;
use chrono::LocalResult;
use chrono::TimeZone;
use chrono::Utc;
use chrono_tz::Tz;
use regex::Regex;

static EVENT_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})\.(\d{1,2})\.(\d{4})\s+(\d{1,2}):(\d{2})")
        .expect("event time pattern is valid")
});

/// Extracts the first `d.m.yyyy h:mm` occurrence from `text` and
/// resolves it to an absolute instant.
///
/// Returns `None` when no pattern is present, when the matched numbers
/// do not form a valid date, or when the wall-clock time falls into a
/// DST gap and therefore never existed in `tz`. An ambiguous wall-clock
/// time (clocks rolled back) resolves to the earlier UTC offset.
pub fn parse_event_time(text: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let caps = EVENT_TIME.captures(text)?;

    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    let hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;

    match tz.with_ymd_and_hms(year, month, day, hour, minute, 0) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, _) => Some(earlier.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}
