//! Timetable time handling.
//!
//! Trip times are stored as seconds after the midnight of their service day,
//! and may run past 24:00 for trips that continue after midnight. States in a
//! search carry absolute epoch seconds; [`ServiceDay`] converts between the two.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Latest hour accepted in a timetable entry (trips running into the next day).
const MAX_SERVICE_HOUR: u32 = 47;

/// Seconds after service-day midnight.
///
/// # Examples
///
/// ```
/// use trip_router::graph::ServiceTime;
///
/// let t = ServiceTime::parse("10:05").unwrap();
/// assert_eq!(t.seconds(), 36_300);
/// assert_eq!(t.to_string(), "10:05");
///
/// // Past-midnight times are valid in a timetable
/// assert!(ServiceTime::parse("25:10:30").is_ok());
/// assert!(ServiceTime::parse("10:5").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceTime(u32);

impl ServiceTime {
    /// Create a time from seconds after midnight.
    pub fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Create a time from hours, minutes and seconds.
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self(hours * 3600 + minutes * 60 + seconds)
    }

    /// Parse `HH:MM` or `HH:MM:SS`.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 && bytes.len() != 8 {
            return Err(TimeError::new("expected HH:MM or HH:MM:SS format"));
        }
        if bytes[2] != b':' || (bytes.len() == 8 && bytes[5] != b':') {
            return Err(TimeError::new("expected colon separators"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > MAX_SERVICE_HOUR {
            return Err(TimeError::new("hour must be 0-47"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let second = if bytes.len() == 8 {
            let second = parse_two_digits(&bytes[6..8])
                .ok_or_else(|| TimeError::new("invalid second digits"))?;
            if second > 59 {
                return Err(TimeError::new("second must be 0-59"));
            }
            second
        } else {
            0
        };

        Ok(Self::from_hms(hour, minute, second))
    }

    /// Seconds after midnight.
    pub fn seconds(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceTime({self})")
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = (self.0 / 3600, (self.0 / 60) % 60, self.0 % 60);
        if s == 0 {
            write!(f, "{h:02}:{m:02}")
        } else {
            write!(f, "{h:02}:{m:02}:{s:02}")
        }
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

/// The calendar day a timetable is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceDay {
    date: NaiveDate,
    midnight: i64,
}

impl ServiceDay {
    /// Anchor timetables to midnight (UTC) of `date`.
    pub fn new(date: NaiveDate) -> Self {
        let midnight = date.and_time(NaiveTime::default()).and_utc().timestamp();
        Self { date, midnight }
    }

    /// Returns the calendar date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Epoch seconds of a timetable time on this day.
    pub fn absolute(&self, time: ServiceTime) -> i64 {
        self.midnight + i64::from(time.seconds())
    }

    /// Timetable time of an epoch instant, if it falls on or after this day's midnight.
    pub fn service_time(&self, epoch_seconds: i64) -> Option<ServiceTime> {
        let offset = epoch_seconds.checked_sub(self.midnight)?;
        u32::try_from(offset).ok().map(ServiceTime::from_seconds)
    }
}

impl Default for ServiceDay {
    fn default() -> Self {
        Self::new(NaiveDate::default())
    }
}

/// Epoch seconds of a naive (UTC) date-time.
pub fn epoch_seconds(datetime: NaiveDateTime) -> i64 {
    datetime.and_utc().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> ServiceDay {
        ServiceDay::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
    }

    #[test]
    fn parse_valid_times() {
        assert_eq!(ServiceTime::parse("00:00").unwrap().seconds(), 0);
        assert_eq!(ServiceTime::parse("10:00").unwrap().seconds(), 36_000);
        assert_eq!(ServiceTime::parse("10:00:30").unwrap().seconds(), 36_030);
        assert_eq!(ServiceTime::parse("24:10").unwrap().seconds(), 87_000);
    }

    #[test]
    fn parse_invalid_format() {
        assert!(ServiceTime::parse("").is_err());
        assert!(ServiceTime::parse("1000").is_err());
        assert!(ServiceTime::parse("10-00").is_err());
        assert!(ServiceTime::parse("10:00-30").is_err());
        assert!(ServiceTime::parse("ab:cd").is_err());
    }

    #[test]
    fn parse_invalid_values() {
        assert!(ServiceTime::parse("48:00").is_err());
        assert!(ServiceTime::parse("10:60").is_err());
        assert!(ServiceTime::parse("10:00:60").is_err());
    }

    #[test]
    fn display_format() {
        assert_eq!(ServiceTime::from_hms(9, 5, 0).to_string(), "09:05");
        assert_eq!(ServiceTime::from_hms(25, 0, 7).to_string(), "25:00:07");
    }

    #[test]
    fn service_day_round_trips_times() {
        let day = day();
        let t = ServiceTime::parse("10:05").unwrap();
        let abs = day.absolute(t);
        assert_eq!(day.service_time(abs), Some(t));
        assert_eq!(day.service_time(abs - 36_301), None);
    }

    #[test]
    fn service_day_matches_chrono() {
        let day = day();
        let dt = day
            .date()
            .and_hms_opt(10, 5, 0)
            .unwrap();
        assert_eq!(epoch_seconds(dt), day.absolute(ServiceTime::parse("10:05").unwrap()));
    }
}
