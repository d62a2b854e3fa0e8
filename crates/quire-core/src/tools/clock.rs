use chrono::{DateTime, Local, TimeZone};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

/// Local wall-clock time with its UTC offset, e.g. `2025-03-01 14:05:09 +01:00`.
#[must_use]
pub fn current_time() -> String {
    format_time(&Local::now())
}

#[must_use]
pub fn format_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIME_FORMAT).to_string()
}
