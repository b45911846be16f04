//! Response timestamps
//!
//! Every chat response carries the wall-clock time it was produced, formatted
//! as a 12-hour clock string such as `02:15 PM`.

use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;

/// strftime pattern for the `timestamp` field
pub const CLOCK_FORMAT: &str = "%I:%M %p";

/// Format a point in time as `hh:mm AM|PM`
pub fn format_clock<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.format(CLOCK_FORMAT).to_string()
}

/// Current local wall-clock time as `hh:mm AM|PM`
pub fn now() -> String {
    format_clock(&Local::now())
}
