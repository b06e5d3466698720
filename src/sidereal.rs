//! Greenwich sidereal time.

use crate::constants::{DEG2RAD, J2000_JD, TAU};

/// Greenwich mean sidereal time (rad, in [0, 2π)) from a UT1 Julian date,
/// using the IAU-82 polynomial.
pub fn gstime(jd_ut1: f64) -> f64 {
    let tut1 = (jd_ut1 - J2000_JD) / 36525.0;
    let seconds = -6.2e-6 * tut1 * tut1 * tut1
        + 0.093104 * tut1 * tut1
        + (876600.0 * 3600.0 + 8640184.812866) * tut1
        + 67310.54841;
    // 360 deg / 86400 s = 1/240
    let mut gst = (seconds * DEG2RAD / 240.0) % TAU;
    if gst < 0.0 {
        gst += TAU;
    }
    gst
}

/// Sidereal time (rad) from the AFSPC polynomial in days since 1970,
/// taking an epoch in days since 1949 December 31 00:00 UT.
pub fn gstime_afspc(epoch: f64) -> f64 {
    const C1: f64 = 1.72027916940703639e-2;
    const THGR70: f64 = 1.7321343856509374;
    const FK5R: f64 = 5.07551419432269442e-15;

    let ts70 = epoch - 7305.0;
    let ds70 = (ts70 + 1.0e-8).floor();
    let tfrac = ts70 - ds70;
    let c1p2p = C1 + TAU;
    let mut gst = (THGR70 + C1 * ds70 + c1p2p * tfrac + ts70 * ts70 * FK5R) % TAU;
    if gst < 0.0 {
        gst += TAU;
    }
    gst
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gstime_j2000() {
        assert_relative_eq!(gstime(J2000_JD), 4.894961212823059, epsilon = 1e-12);
    }

    #[test]
    fn test_gstime_range() {
        let mut jd = 2440000.5;
        while jd < 2470000.0 {
            let g = gstime(jd);
            assert!((0.0..TAU).contains(&g), "jd={jd} gst={g}");
            jd += 123.456;
        }
    }

    #[test]
    fn test_gstime_known_date() {
        assert_relative_eq!(gstime(2454994.0), 1.3955371379062669, epsilon = 1e-12);
    }

    #[test]
    fn test_afspc_matches_iau82_closely() {
        for epoch in [7305.0, 18441.78495062, 20630.332154440228, 27000.25] {
            let a = gstime_afspc(epoch);
            let b = gstime(epoch + crate::constants::JD_EPOCH_REF);
            assert!((a - b).abs() < 1e-9, "epoch={epoch} afspc={a} iau82={b}");
        }
    }
}
