//! Mean element sets as consumed by the propagator.
//!
//! Elements are Kozai mean elements in the units SGP4 works in: radians,
//! radians per minute, and an epoch counted in days from 1949 December 31
//! 00:00 UT.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::julian;

/// SGP4 mean elements at epoch.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeanElementSet {
    /// Catalog number (pass-through only)
    pub satnum: u32,
    /// Epoch (days since 1949 December 31 00:00 UT)
    pub epoch: f64,
    /// Kozai mean motion (rad/min)
    pub no_kozai: f64,
    /// Eccentricity
    pub ecco: f64,
    /// Inclination (rad)
    pub inclo: f64,
    /// Right ascension of ascending node (rad)
    pub nodeo: f64,
    /// Argument of perigee (rad)
    pub argpo: f64,
    /// Mean anomaly (rad)
    pub mo: f64,
    /// B* drag term (1/Earth radii)
    pub bstar: f64,
}

impl MeanElementSet {
    /// Build from catalogue units: rev/day and degrees.
    #[allow(clippy::too_many_arguments)]
    pub fn from_catalog_units(
        satnum: u32,
        epoch: f64,
        mean_motion_rev_day: f64,
        ecco: f64,
        inclination_deg: f64,
        raan_deg: f64,
        arg_perigee_deg: f64,
        mean_anomaly_deg: f64,
        bstar: f64,
    ) -> Self {
        MeanElementSet {
            satnum,
            epoch,
            no_kozai: mean_motion_rev_day / XPDOTP,
            ecco,
            inclo: inclination_deg * DEG2RAD,
            nodeo: raan_deg * DEG2RAD,
            argpo: arg_perigee_deg * DEG2RAD,
            mo: mean_anomaly_deg * DEG2RAD,
            bstar,
        }
    }

    /// Replace the epoch with one given as a full year and fractional day of year.
    pub fn with_epoch_year_day(mut self, year: i32, day_of_year: f64) -> Self {
        let (jd, fraction) = julian::epoch_to_jd(year, day_of_year);
        self.epoch = julian::jd_to_epoch(jd, fraction);
        self
    }

    pub fn with_satnum(mut self, satnum: u32) -> Self {
        self.satnum = satnum;
        self
    }

    /// Epoch as a Julian date (UT).
    pub fn epoch_jd(&self) -> f64 {
        self.epoch + JD_EPOCH_REF
    }

    /// Kozai mean motion (rev/day).
    pub fn mean_motion_rev_day(&self) -> f64 {
        self.no_kozai * XPDOTP
    }

    /// Nominal orbital period from the Kozai mean motion (min).
    pub fn period_minutes(&self) -> f64 {
        TAU / self.no_kozai
    }

    /// Minutes from epoch to a split UT1 Julian date.
    pub fn minutes_since_epoch(&self, jd: f64, fraction: f64) -> f64 {
        ((jd - JD_EPOCH_REF - self.epoch) + fraction) * MINUTES_PER_DAY
    }
}

/// Singly-averaged mean elements produced by one propagation step, before
/// short-period corrections are applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SinglyAveragedElements {
    /// Semi-major axis (Earth radii)
    pub a: f64,
    /// Eccentricity
    pub ecc: f64,
    /// Inclination (rad)
    pub incl: f64,
    /// Right ascension of ascending node (rad)
    pub node: f64,
    /// Argument of perigee (rad)
    pub argp: f64,
    /// Mean anomaly (rad)
    pub mean_anomaly: f64,
    /// Mean motion (rad/min)
    pub mean_motion: f64,
}

impl SinglyAveragedElements {
    /// Semi-major axis (km) for a given equatorial radius.
    pub fn a_km(&self, radius_earth: f64) -> f64 {
        self.a * radius_earth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_catalog_units() {
        let el = MeanElementSet::from_catalog_units(
            5, 18441.78495062, 10.82419157, 0.1859667, 34.2682, 348.7242, 331.7664, 19.3264,
            0.28098e-4,
        );
        assert_relative_eq!(el.no_kozai, 0.04722944544077857, epsilon = 1e-15);
        assert_relative_eq!(el.inclo * RAD2DEG, 34.2682, epsilon = 1e-12);
        assert_relative_eq!(el.mean_motion_rev_day(), 10.82419157, epsilon = 1e-12);
        assert_relative_eq!(el.period_minutes(), 1440.0 / 10.82419157, epsilon = 1e-9);
    }

    #[test]
    fn test_epoch_from_year_day() {
        let el = MeanElementSet::default().with_epoch_year_day(2000, 179.78495062);
        assert_relative_eq!(el.epoch, 18441.78495062, epsilon = 1e-8);
        assert_relative_eq!(el.epoch_jd(), 2451723.28495062, epsilon = 1e-8);
    }

    #[test]
    fn test_minutes_since_epoch() {
        let el = MeanElementSet::default().with_epoch_year_day(2009, 161.51089941);
        let t = el.minutes_since_epoch(2454994.0, 0.0);
        assert_relative_eq!(t, 1424.3048494309187, epsilon = 1e-6);
    }
}
