//! Wall-clock time derived from SNTP syncs against a monotonic uptime.
//!
//! The hub expects an RFC 3339 UTC timestamp in every payload; the node
//! has no RTC, so the clock anchors the last synced Unix time to the
//! uptime at which the sync happened.

use core::fmt::Write;

use heapless::String;

/// Seconds between the NTP era-0 epoch (1900-01-01) and the Unix epoch.
pub const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

/// Length of `YYYY-MM-DDTHH:MM:SSZ`.
pub const TIMESTAMP_LEN: usize = 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock {
    unix_secs: u64,
    uptime_secs: u64,
    synced: bool,
}

impl WallClock {
    pub const fn new() -> Self {
        Self {
            unix_secs: 0,
            uptime_secs: 0,
            synced: false,
        }
    }

    /// Anchor the clock: `unix_secs` was the wall time when the device
    /// uptime was `uptime_secs`.
    pub fn set(&mut self, unix_secs: u64, uptime_secs: u64) {
        self.unix_secs = unix_secs;
        self.uptime_secs = uptime_secs;
        self.synced = true;
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Current Unix time given the current uptime. Counts from the Unix
    /// epoch while unsynced.
    pub fn unix_now(&self, uptime_secs: u64) -> u64 {
        self.unix_secs + uptime_secs.saturating_sub(self.uptime_secs)
    }

    pub fn rfc3339_now(&self, uptime_secs: u64) -> String<TIMESTAMP_LEN> {
        rfc3339(self.unix_now(uptime_secs))
    }
}

/// Render Unix seconds as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn rfc3339(unix_secs: u64) -> String<TIMESTAMP_LEN> {
    let days = (unix_secs / 86_400) as i64;
    let secs_of_day = unix_secs % 86_400;
    let (year, month, day) = civil_from_days(days);

    let mut out: String<TIMESTAMP_LEN> = String::new();
    // Cannot fail: the buffer is sized for the fixed-width format.
    write!(
        out,
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        day,
        secs_of_day / 3600,
        (secs_of_day / 60) % 60,
        secs_of_day % 60
    )
    .ok();
    out
}

/// Days since 1970-01-01 to (year, month, day) in the proleptic
/// Gregorian calendar.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = if month <= 2 { year + 1 } else { year };
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_renders_as_1970() {
        assert_eq!(rfc3339(0).as_str(), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn leap_day_2000() {
        // 2000-02-29 00:00:00 UTC
        assert_eq!(rfc3339(951_782_400).as_str(), "2000-02-29T00:00:00Z");
    }

    #[test]
    fn recent_date_with_time_of_day() {
        // 2026-08-29 12:34:56 UTC
        assert_eq!(rfc3339(1_788_006_896).as_str(), "2026-08-29T12:34:56Z");
    }

    #[test]
    fn end_of_year_boundary() {
        // 2025-12-31 23:59:59 UTC
        assert_eq!(rfc3339(1_767_225_599).as_str(), "2025-12-31T23:59:59Z");
    }

    #[test]
    fn clock_advances_with_uptime() {
        let mut clock = WallClock::new();
        assert!(!clock.is_synced());

        clock.set(1_788_006_896, 100);
        assert!(clock.is_synced());
        assert_eq!(clock.unix_now(100), 1_788_006_896);
        assert_eq!(clock.unix_now(160), 1_788_006_956);
    }

    #[test]
    fn unsynced_clock_counts_from_epoch() {
        let clock = WallClock::new();
        assert_eq!(clock.unix_now(42), 42);
        assert_eq!(clock.rfc3339_now(42).as_str(), "1970-01-01T00:00:42Z");
    }
}
