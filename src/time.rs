//! Entry timestamp handling.
//!
//! Zip local headers store the last-modified instant as a packed MS-DOS
//! date/time, which has a limited range (1980-2107) and 2-second resolution.
//! [`ZipDateTime`] is the broken-down form entries are constructed with;
//! [`DosDateTime`] is the packed form the writer serializes. Converting to
//! DOS form truncates seconds to the nearest even value.

use std::time::{SystemTime, UNIX_EPOCH};

/// A civil date and time attached to an entry.
///
/// The zip format cannot encode a time zone, so the components are taken at
/// face value when packed into DOS form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZipDateTime {
    year: u16,
    month: u8,  // 1-12
    day: u8,    // 1-31
    hour: u8,   // 0-23
    minute: u8, // 0-59
    second: u8, // 0-59
}

impl ZipDateTime {
    /// Creates a timestamp from civil components.
    ///
    /// Returns `None` if any component is out of range.
    pub fn from_components(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Option<Self> {
        if !(1..=12).contains(&month)
            || day < 1
            || day > last_day_of_month(year, month)
            || hour > 23
            || minute > 59
            || second > 59
        {
            return None;
        }

        Some(ZipDateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Creates a timestamp from seconds since the Unix epoch.
    pub fn from_unix(seconds: i64) -> Self {
        let (year, month, day, hour, minute, second) = unix_timestamp_to_components(seconds);
        ZipDateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Creates a timestamp from the system clock.
    ///
    /// Used as the default modification time for newly constructed entries.
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Self::from_unix(since_epoch)
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }
}

/// An MS-DOS timestamp: packed 16-bit date and time values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    time: u16,
    date: u16,
}

impl DosDateTime {
    pub(crate) const fn new(time: u16, date: u16) -> Self {
        Self { time, date }
    }

    /// Returns the packed time and date components as (time, date).
    #[must_use]
    pub const fn into_parts(self) -> (u16, u16) {
        (self.time, self.date)
    }

    /// Returns the year (1980-2107).
    pub fn year(&self) -> u16 {
        ((self.date >> 9) & 0x7f) + 1980
    }

    /// Returns the month (1-12).
    pub fn month(&self) -> u8 {
        (((self.date >> 5) & 0x0f) as u8).clamp(1, 12)
    }

    /// Returns the day of the month (1-31).
    pub fn day(&self) -> u8 {
        ((self.date & 0x1f) as u8).clamp(1, last_day_of_month(self.year(), self.month()))
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u8 {
        (((self.time >> 11) & 0x1f) as u8).min(23)
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u8 {
        (((self.time >> 5) & 0x3f) as u8).min(59)
    }

    /// Returns the second (0-58, always even due to 2-second resolution).
    pub fn second(&self) -> u8 {
        (((self.time & 0x1f) * 2) as u8).min(58)
    }
}

impl From<&ZipDateTime> for DosDateTime {
    fn from(dt: &ZipDateTime) -> Self {
        // Saturate year to the representable DOS range (1980-2107)
        let dos_year = dt.year.clamp(1980, 2107);

        // Date: bits 15-9 year-1980, bits 8-5 month, bits 4-0 day
        let packed_date = ((dos_year - 1980) << 9) | ((dt.month as u16) << 5) | (dt.day as u16);

        // Time: bits 15-11 hour, bits 10-5 minute, bits 4-0 second/2
        let packed_time =
            ((dt.hour as u16) << 11) | ((dt.minute as u16) << 5) | ((dt.second as u16) / 2);

        Self {
            time: packed_time,
            date: packed_date,
        }
    }
}

/// Convert a Unix timestamp to broken down date/time components.
///
/// Based on Howard Hinnant's `civil_from_days`:
///
/// <https://howardhinnant.github.io/date_algorithms.html#civil_from_days>
fn unix_timestamp_to_components(timestamp: i64) -> (u16, u8, u8, u8, u8, u8) {
    const SECONDS_PER_DAY: i64 = 86400;

    let total_days = timestamp.div_euclid(SECONDS_PER_DAY);
    let seconds_in_day = timestamp.rem_euclid(SECONDS_PER_DAY);

    let hour = (seconds_in_day / 3600) as u8;
    let minute = ((seconds_in_day % 3600) / 60) as u8;
    let second = (seconds_in_day % 60) as u8;

    // Shift the epoch to 0000-03-01 so the leap day lands at the end of the
    // year, then divide out 400-year eras.
    let days_since_shifted_epoch = total_days + 719468;
    let era = days_since_shifted_epoch.div_euclid(146097);
    let days_of_era = days_since_shifted_epoch.rem_euclid(146097);

    let year_of_era =
        (days_of_era - days_of_era / 1460 + days_of_era / 36524 - days_of_era / 146096) / 365;
    let year = era * 400 + year_of_era;

    let days_before_year = year_of_era * 365 + year_of_era / 4 - year_of_era / 100;
    let day_of_year = days_of_era - days_before_year;

    // Months are shifted: Mar=0, Apr=1, ..., Jan=10, Feb=11
    let month_shifted = (5 * day_of_year + 2) / 153;
    let day_of_month = day_of_year - (153 * month_shifted + 2) / 5 + 1;

    let (final_year, final_month) = if month_shifted < 10 {
        (year, month_shifted + 3)
    } else {
        (year + 1, month_shifted - 9)
    };

    (
        final_year as u16,
        final_month as u8,
        day_of_month as u8,
        hour,
        minute,
        second,
    )
}

const fn is_leap(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

const fn last_day_of_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap(year) => 29,
        _ => 28,
    }
}
