use chrono::{Local, Utc};

/// Current Unix time in seconds.
#[must_use]
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Local wall-clock time rendered as `YYYY-MM-DD HH:MM:SS`.
///
/// Used for human-facing records such as issue reports.
#[must_use]
pub fn local_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
