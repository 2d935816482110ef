//! Human-readable timestamps for rule creation times and log entries.

use time::{macros::format_description, OffsetDateTime};

/// The current UTC time as `YYYY-MM-DD HH:MM:SS`, matching the format the
/// persisted state has always used.
pub fn now() -> String {
    OffsetDateTime::now_utc()
        .format(&format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_else(|_| String::from("unknown"))
}
