//! Physical and algorithm constants shared by the propagator.

/// Pi
pub const PI: f64 = std::f64::consts::PI;

/// Two pi
pub const TAU: f64 = std::f64::consts::TAU;

/// Degrees to radians
pub const DEG2RAD: f64 = PI / 180.0;

/// Radians to degrees
pub const RAD2DEG: f64 = 180.0 / PI;

/// Minutes per solar day
pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Seconds per solar day
pub const SOLAR_DAY: f64 = 86400.0;

/// Divisor taking mean motion from rev/day to rad/min.
pub const XPDOTP: f64 = MINUTES_PER_DAY / TAU;

/// Julian date of the element epoch reference, 1949 December 31 00:00 UT.
pub const JD_EPOCH_REF: f64 = 2433281.5;

/// Julian date of J2000.0 (2000 January 1 12:00).
pub const J2000_JD: f64 = 2451545.0;

/// Orbital period (min) at or above which the deep-space model applies.
pub const DEEP_SPACE_PERIOD: f64 = 225.0;

/// Earth rotation rate (rad/min) used by the resonance terms.
pub const RPTIM: f64 = 4.37526908801129966e-3;

/// Two thirds
pub const X2O3: f64 = 2.0 / 3.0;

/// Guard for the 1 + cos(i) divisor in the long-period coefficient.
pub const TEMP4: f64 = 1.5e-12;
