use chrono::{DateTime, Utc};

/// Source of wall-clock time.
pub trait Clock {
    /// Seconds since the Unix epoch.
    fn now_seconds(&self) -> i64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_seconds(&self) -> i64 {
        Utc::now().timestamp()
    }
}

impl<T: Fn() -> i64> Clock for T {
    fn now_seconds(&self) -> i64 {
        self()
    }
}

/// Whether two timestamps (seconds since epoch) fall on the same UTC calendar day.
pub(crate) fn same_day(a: i64, b: i64) -> bool {
    match (DateTime::from_timestamp(a, 0), DateTime::from_timestamp(b, 0)) {
        (Some(a), Some(b)) => a.date_naive() == b.date_naive(),
        _ => false,
    }
}
