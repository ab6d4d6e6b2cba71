//! Calendar date and time from Unix seconds

use core::fmt::Write;

use heapless::String;

/// Formatted `DD/MM/YYYY HH:MM` length
pub const DATE_TIME_LEN: usize = 16;

/// Broken-down local time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    /// Convert Unix seconds plus a UTC offset into local calendar time
    pub fn from_unix(unix_secs: u64, utc_offset_minutes: i16) -> Self {
        let local = unix_secs as i64 + utc_offset_minutes as i64 * 60;
        let days = local.div_euclid(86_400);
        let secs_of_day = local.rem_euclid(86_400);

        let (year, month, day) = civil_from_days(days);
        Self {
            year,
            month,
            day,
            hour: (secs_of_day / 3600) as u8,
            minute: (secs_of_day % 3600 / 60) as u8,
            second: (secs_of_day % 60) as u8,
        }
    }

    /// Format as `DD/MM/YYYY HH:MM`
    pub fn format(&self) -> String<DATE_TIME_LEN> {
        let mut out = String::new();
        // Four-digit years always fit; anything else is truncated
        let _ = write!(
            out,
            "{:02}/{:02}/{:04} {:02}:{:02}",
            self.day, self.month, self.year, self.hour, self.minute
        );
        out
    }
}

/// Days since 1970-01-01 to (year, month, day), proleptic Gregorian
fn civil_from_days(days: i64) -> (i32, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year as i32, month, day)
}
