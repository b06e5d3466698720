//! Julian-date utilities.
//!
//! Dates are split into a whole part (the Julian date at 0h) and a day
//! fraction so that sub-millisecond epochs survive the large offset of
//! the Julian day count.

use crate::constants::JD_EPOCH_REF;

const MONTH_LENGTHS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Calendar date and time of day.
pub type CalendarDate = (i32, u32, u32, u32, u32, f64);

/// Julian date from a calendar date, valid for 1900 through 2100.
///
/// Returns `(jd, fraction)` where `jd` is the Julian date at 0h of the day
/// and `fraction` the elapsed part of the day.
pub fn jday(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: f64) -> (f64, f64) {
    let y = year as f64;
    let m = month as f64;
    let mut jd = 367.0 * y - ((7.0 * (y + ((m + 9.0) / 12.0).floor())) * 0.25).floor()
        + (275.0 * m / 9.0).floor()
        + day as f64
        + 1721013.5;
    let mut fraction = (second + minute as f64 * 60.0 + hour as f64 * 3600.0) / 86400.0;
    if fraction.abs() > 1.0 {
        let whole = fraction.floor();
        jd += whole;
        fraction -= whole;
    }
    (jd, fraction)
}

/// Month, day, hour, minute and second from a fractional day of year.
pub fn days2mdhms(year: i32, days: f64) -> (u32, u32, u32, u32, f64) {
    let mut lengths = MONTH_LENGTHS;
    if year % 4 == 0 {
        lengths[1] = 29;
    }
    let day_of_year = days.floor() as u32;

    let mut month = 1;
    let mut elapsed = 0;
    while month < 12 && day_of_year > elapsed + lengths[month - 1] {
        elapsed += lengths[month - 1];
        month += 1;
    }
    let day = day_of_year - elapsed;

    let hours = (days - day_of_year as f64) * 24.0;
    let hour = hours.floor();
    let minutes = (hours - hour) * 60.0;
    let minute = minutes.floor();
    let second = (minutes - minute) * 60.0;
    (month as u32, day, hour as u32, minute as u32, second)
}

/// Calendar date from a split Julian date.
pub fn invjday(jd: f64, fraction: f64) -> CalendarDate {
    let mut jd = jd;
    let mut fraction = fraction;
    if fraction.abs() >= 1.0 {
        let whole = fraction.floor();
        jd += whole;
        fraction -= whole;
    }

    // Move any non-midnight part of jd into the fraction.
    let dt = jd - jd.floor() - 0.5;
    if dt.abs() > 1.0e-8 {
        jd -= dt;
        fraction += dt;
    }

    let temp = jd - 2415019.5;
    let tu = temp / 365.25;
    let mut year = 1900 + tu.floor() as i32;
    let mut leap_years = ((year - 1901) as f64 * 0.25).floor();
    let mut days = (temp - ((year - 1900) as f64 * 365.0 + leap_years)).floor();

    if days + fraction < 1.0 {
        year -= 1;
        leap_years = ((year - 1901) as f64 * 0.25).floor();
        days = (temp - ((year - 1900) as f64 * 365.0 + leap_years)).floor();
    }

    let (month, day, hour, minute, second) = days2mdhms(year, days + fraction);
    (year, month, day, hour, minute, second)
}

/// Split Julian date of a two-line-element epoch (full year and fractional
/// day of year), taken through the calendar so that the result matches
/// the values element sets are generated with.
pub fn epoch_to_jd(year: i32, days: f64) -> (f64, f64) {
    let (month, day, hour, minute, second) = days2mdhms(year, days);
    jday(year, month, day, hour, minute, second)
}

/// Days since 1949 December 31 00:00 UT from a split Julian date.
pub fn jd_to_epoch(jd: f64, fraction: f64) -> f64 {
    (jd + fraction) - JD_EPOCH_REF
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_jday_midnight() {
        let (jd, fr) = jday(2009, 6, 10, 0, 0, 0.0);
        assert_eq!(jd, 2454992.5);
        assert_eq!(fr, 0.0);
    }

    #[test]
    fn test_jday_j2000() {
        let (jd, fr) = jday(2000, 1, 1, 12, 0, 0.0);
        assert_relative_eq!(jd + fr, 2451545.0, epsilon = 1e-9);
    }

    #[test]
    fn test_jday_fraction_overflow_folds() {
        let (jd, fr) = jday(2020, 3, 1, 36, 0, 0.0);
        assert_relative_eq!(jd + fr, jday(2020, 3, 2, 12, 0, 0.0).0 + 0.5, epsilon = 1e-9);
        assert!(fr < 1.0);
    }

    #[test]
    fn test_days2mdhms() {
        let (mon, day, hr, min, sec) = days2mdhms(2000, 179.78495062);
        assert_eq!((mon, day, hr, min), (6, 27, 18, 50));
        assert_relative_eq!(sec, 19.73356799908288, epsilon = 1e-6);
    }

    #[test]
    fn test_days2mdhms_leap_day() {
        let (mon, day, hr, min, sec) = days2mdhms(2024, 60.5);
        assert_eq!((mon, day, hr, min), (2, 29, 12, 0));
        assert_relative_eq!(sec, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_days2mdhms_year_end() {
        let (mon, day, _, _, _) = days2mdhms(2023, 365.25);
        assert_eq!((mon, day), (12, 31));
    }

    #[test]
    fn test_invjday_roundtrip() {
        let (jd, fr) = jday(2009, 6, 10, 12, 15, 41.709);
        let (year, mon, day, hr, min, sec) = invjday(jd, fr);
        assert_eq!((year, mon, day, hr, min), (2009, 6, 10, 12, 15));
        assert_relative_eq!(sec, 41.709, epsilon = 1e-5);
    }

    #[test]
    fn test_invjday_unsplit_date() {
        let (year, mon, day, hr, min, sec) = invjday(2451545.0, 0.0);
        assert_eq!((year, mon, day, hr, min), (2000, 1, 1, 12, 0));
        assert_relative_eq!(sec, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_invjday_new_year() {
        let (year, mon, day, hr, _, _) = invjday(2459945.5, 0.25);
        assert_eq!((year, mon, day, hr), (2023, 1, 1, 6));
    }

    #[test]
    fn test_epoch_to_jd() {
        let (jd, fr) = epoch_to_jd(2009, 161.51089941);
        assert_eq!(jd, 2454992.5);
        assert_relative_eq!(fr, 0.51089941, epsilon = 1e-10);
        assert_relative_eq!(jd_to_epoch(jd, fr), 21711.51089941, epsilon = 1e-8);
    }
}
