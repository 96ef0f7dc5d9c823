//! Rolling-window helpers.

use chrono::{DateTime, TimeDelta, Utc};

/// Start of a window reaching `days` back from `now`.
///
/// Windows longer than chrono can represent start at the earliest
/// representable instant, so they cover every record.
#[must_use]
pub fn window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    TimeDelta::try_days(i64::from(days))
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_window() {
        let now = Utc::now();
        assert_eq!(window_start(now, 30), now - TimeDelta::days(30));
        assert_eq!(window_start(now, 0), now);
    }

    #[test]
    fn huge_window_saturates() {
        assert_eq!(window_start(Utc::now(), u32::MAX), DateTime::<Utc>::MIN_UTC);
    }
}
