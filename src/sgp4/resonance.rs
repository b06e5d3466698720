//! Deep-space secular rates, resonance setup and the resonance integrator.
//!
//! Orbits near 1 rev/day (24-hour) or near 2 rev/day with high eccentricity
//! (12-hour) are commensurate with Earth's rotation. Their mean motion and
//! mean longitude are integrated numerically with an Euler-Maclaurin scheme
//! in fixed 720-minute steps. The integrator keeps a cursor between calls so
//! that successive requests on the same side of epoch resume from the last
//! full step instead of restarting at epoch.

use serde::{Deserialize, Serialize};

use super::deep_space::{DeepSpaceCommonTerms, ZNL, ZNS};
use super::WorkingElements;
use crate::constants::{PI, RPTIM, TAU, X2O3};

const Q22: f64 = 1.7891679e-6;
const Q31: f64 = 2.1460748e-6;
const Q33: f64 = 2.2123015e-7;
const ROOT22: f64 = 1.7891679e-6;
const ROOT44: f64 = 7.3636953e-9;
const ROOT54: f64 = 2.1765803e-9;
const ROOT32: f64 = 3.7393792e-7;
const ROOT52: f64 = 1.1428639e-7;

const FASX2: f64 = 0.13130908;
const FASX4: f64 = 2.8843198;
const FASX6: f64 = 0.37448087;
const G22: f64 = 5.7686396;
const G32: f64 = 0.95240898;
const G44: f64 = 1.8014998;
const G52: f64 = 1.0508330;
const G54: f64 = 4.4108898;

/// Integration step (min).
const STEP: f64 = 720.0;
/// Half the squared step (min²).
const STEP2: f64 = 259200.0;

/// Inclination margin (rad) inside which the node rate terms are dropped.
const NEAR_EQUATORIAL: f64 = 5.2359877e-2;

/// Resonance classification of a deep-space orbit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResonanceClass {
    #[default]
    None,
    /// Geosynchronous, period near one sidereal day.
    TwentyFourHour,
    /// Molniya-type, period near half a day with e >= 0.5.
    TwelveHour,
}

impl ResonanceClass {
    /// Classify from Brouwer mean motion (rad/min) and eccentricity.
    pub fn classify(nm: f64, em: f64) -> Self {
        if (8.26e-3..=9.24e-3).contains(&nm) && em >= 0.5 {
            ResonanceClass::TwelveHour
        } else if nm > 0.0034906585 && nm < 0.0052359877 {
            ResonanceClass::TwentyFourHour
        } else {
            ResonanceClass::None
        }
    }
}

/// Luni-solar secular rates of the deep-space elements (per minute).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct DeepSecularRates {
    pub dedt: f64,
    pub didt: f64,
    pub dmdt: f64,
    pub domdt: f64,
    pub dnodt: f64,
}

impl DeepSecularRates {
    fn apply(&self, t: f64, el: &mut WorkingElements) {
        el.ecc += self.dedt * t;
        el.incl += self.didt * t;
        el.argp += self.domdt * t;
        el.node += self.dnodt * t;
        el.mean_anomaly += self.dmdt * t;
    }
}

/// Resonance amplitudes for the 12-hour case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct HalfDayCoefficients {
    pub d2201: f64,
    pub d2211: f64,
    pub d3210: f64,
    pub d3222: f64,
    pub d4410: f64,
    pub d4422: f64,
    pub d5220: f64,
    pub d5232: f64,
    pub d5421: f64,
    pub d5433: f64,
}

/// Resonance harmonics by class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) enum Harmonics {
    OneDay { del1: f64, del2: f64, del3: f64 },
    HalfDay(HalfDayCoefficients),
}

/// Precomputed resonance terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct ResonanceTerms {
    pub harmonics: Harmonics,
    /// Resonance angle at epoch (rad).
    pub xlamo: f64,
    /// Rate offset of the resonance angle (rad/min).
    pub xfact: f64,
}

/// Persistent integrator cursor: time reached and the resonance angle and
/// mean motion there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegratorCursor {
    /// Minutes from epoch reached by the last full step.
    pub atime: f64,
    /// Resonance angle (rad).
    pub xli: f64,
    /// Mean motion (rad/min).
    pub xni: f64,
}

/// Epoch quantities the resonance terms depend on.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResonanceEpoch {
    pub gsto: f64,
    pub ecco: f64,
    pub inclo: f64,
    pub mo: f64,
    pub nodeo: f64,
    pub argpo: f64,
    pub mdot: f64,
    pub nodedot: f64,
    pub argpdot: f64,
    pub no_unkozai: f64,
    pub xke: f64,
}

/// Secular rates plus, for resonant orbits, the resonance terms.
pub(crate) fn initialize(
    common: &DeepSpaceCommonTerms,
    epoch: &ResonanceEpoch,
) -> (DeepSecularRates, Option<ResonanceTerms>) {
    let sol = &common.solar;
    let lun = &common.lunar;
    let (cosim, sinim, emsq) = (common.cosim, common.sinim, common.emsq);
    let inclm = epoch.inclo;
    let nm = epoch.no_unkozai;
    let near_equatorial = inclm < NEAR_EQUATORIAL || inclm > PI - NEAR_EQUATORIAL;

    // Solar terms
    let ses = sol.s1 * ZNS * sol.s5;
    let sis = sol.s2 * ZNS * (sol.z11 + sol.z13);
    let sls = -ZNS * sol.s3 * (sol.z1 + sol.z3 - 14.0 - 6.0 * emsq);
    let sghs = sol.s4 * ZNS * (sol.z31 + sol.z33 - 6.0);
    let mut shs = -ZNS * sol.s2 * (sol.z21 + sol.z23);
    if near_equatorial {
        shs = 0.0;
    }
    if sinim != 0.0 {
        shs /= sinim;
    }
    let sgs = sghs - cosim * shs;

    // Lunar terms
    let dedt = ses + lun.s1 * ZNL * lun.s5;
    let didt = sis + lun.s2 * ZNL * (lun.z11 + lun.z13);
    let dmdt = sls - ZNL * lun.s3 * (lun.z1 + lun.z3 - 14.0 - 6.0 * emsq);
    let sghl = lun.s4 * ZNL * (lun.z31 + lun.z33 - 6.0);
    let mut shll = -ZNL * lun.s2 * (lun.z21 + lun.z23);
    if near_equatorial {
        shll = 0.0;
    }
    let mut domdt = sgs + sghl;
    let mut dnodt = shs;
    if sinim != 0.0 {
        domdt -= cosim / sinim * shll;
        dnodt += shll / sinim;
    }
    let rates = DeepSecularRates {
        dedt,
        didt,
        dmdt,
        domdt,
        dnodt,
    };

    let theta = epoch.gsto % TAU;
    let aonv = (nm / epoch.xke).powf(X2O3);
    let terms = match ResonanceClass::classify(nm, epoch.ecco) {
        ResonanceClass::None => None,
        ResonanceClass::TwelveHour => {
            let harmonics = half_day_coefficients(epoch.ecco, cosim, sinim, nm, aonv);
            Some(ResonanceTerms {
                harmonics: Harmonics::HalfDay(harmonics),
                xlamo: (epoch.mo + epoch.nodeo + epoch.nodeo - theta - theta) % TAU,
                xfact: epoch.mdot + dmdt + 2.0 * (epoch.nodedot + dnodt - RPTIM) - epoch.no_unkozai,
            })
        }
        ResonanceClass::TwentyFourHour => {
            let g200 = 1.0 + emsq * (-2.5 + 0.8125 * emsq);
            let g310 = 1.0 + 2.0 * emsq;
            let g300 = 1.0 + emsq * (-6.0 + 6.60937 * emsq);
            let f220 = 0.75 * (1.0 + cosim) * (1.0 + cosim);
            let f311 = 0.9375 * sinim * sinim * (1.0 + 3.0 * cosim) - 0.75 * (1.0 + cosim);
            let mut f330 = 1.0 + cosim;
            f330 = 1.875 * f330 * f330 * f330;
            let del1 = 3.0 * nm * nm * aonv * aonv;
            let del2 = 2.0 * del1 * f220 * g200 * Q22;
            let del3 = 3.0 * del1 * f330 * g300 * Q33 * aonv;
            let del1 = del1 * f311 * g310 * Q31 * aonv;
            let xpidot = epoch.argpdot + epoch.nodedot;
            Some(ResonanceTerms {
                harmonics: Harmonics::OneDay { del1, del2, del3 },
                xlamo: (epoch.mo + epoch.nodeo + epoch.argpo - theta) % TAU,
                xfact: epoch.mdot + xpidot - RPTIM + dmdt + domdt + dnodt - epoch.no_unkozai,
            })
        }
    };
    (rates, terms)
}

/// 12-hour resonance amplitudes. The eccentricity polynomials change
/// coefficient sets at e = 0.65, 0.7 and 0.715.
fn half_day_coefficients(em: f64, cosim: f64, sinim: f64, nm: f64, aonv: f64) -> HalfDayCoefficients {
    let cosisq = cosim * cosim;
    let emsq = em * em;
    let eoc = em * emsq;
    let g201 = -0.306 - (em - 0.64) * 0.440;

    let (g211, g310, g322, g410, g422, g520);
    if em <= 0.65 {
        g211 = 3.616 - 13.2470 * em + 16.2900 * emsq;
        g310 = -19.302 + 117.3900 * em - 228.4190 * emsq + 156.5910 * eoc;
        g322 = -18.9068 + 109.7927 * em - 214.6334 * emsq + 146.5816 * eoc;
        g410 = -41.122 + 242.6940 * em - 471.0940 * emsq + 313.9530 * eoc;
        g422 = -146.407 + 841.8800 * em - 1629.014 * emsq + 1083.4350 * eoc;
        g520 = -532.114 + 3017.977 * em - 5740.032 * emsq + 3708.2760 * eoc;
    } else {
        g211 = -72.099 + 331.819 * em - 508.738 * emsq + 266.724 * eoc;
        g310 = -346.844 + 1582.851 * em - 2415.925 * emsq + 1246.113 * eoc;
        g322 = -342.585 + 1554.908 * em - 2366.899 * emsq + 1215.972 * eoc;
        g410 = -1052.797 + 4758.686 * em - 7193.992 * emsq + 3651.957 * eoc;
        g422 = -3581.690 + 16178.110 * em - 24462.770 * emsq + 12422.520 * eoc;
        g520 = if em > 0.715 {
            -5149.66 + 29936.92 * em - 54087.36 * emsq + 31324.56 * eoc
        } else {
            1464.74 - 4664.75 * em + 3763.64 * emsq
        };
    }

    let (g533, g521, g532);
    if em < 0.7 {
        g533 = -919.22770 + 4988.6100 * em - 9064.7700 * emsq + 5542.21 * eoc;
        g521 = -822.71072 + 4568.6173 * em - 8491.4146 * emsq + 5337.524 * eoc;
        g532 = -853.66600 + 4690.2500 * em - 8624.7700 * emsq + 5341.4 * eoc;
    } else {
        g533 = -37995.780 + 161616.52 * em - 229838.20 * emsq + 109377.94 * eoc;
        g521 = -51752.104 + 218913.95 * em - 309468.16 * emsq + 146349.42 * eoc;
        g532 = -40023.880 + 170470.89 * em - 242699.48 * emsq + 115605.82 * eoc;
    }

    let sini2 = sinim * sinim;
    let f220 = 0.75 * (1.0 + 2.0 * cosim + cosisq);
    let f221 = 1.5 * sini2;
    let f321 = 1.875 * sinim * (1.0 - 2.0 * cosim - 3.0 * cosisq);
    let f322 = -1.875 * sinim * (1.0 + 2.0 * cosim - 3.0 * cosisq);
    let f441 = 35.0 * sini2 * f220;
    let f442 = 39.3750 * sini2 * sini2;
    let f522 = 9.84375
        * sinim
        * (sini2 * (1.0 - 2.0 * cosim - 5.0 * cosisq)
            + 0.33333333 * (-2.0 + 4.0 * cosim + 6.0 * cosisq));
    let f523 = sinim
        * (4.92187512 * sini2 * (-2.0 - 4.0 * cosim + 10.0 * cosisq)
            + 6.56250012 * (1.0 + 2.0 * cosim - 3.0 * cosisq));
    let f542 = 29.53125 * sinim * (2.0 - 8.0 * cosim + cosisq * (-12.0 + 8.0 * cosim + 10.0 * cosisq));
    let f543 = 29.53125 * sinim * (-2.0 - 8.0 * cosim + cosisq * (12.0 + 8.0 * cosim - 10.0 * cosisq));

    let xno2 = nm * nm;
    let ainv2 = aonv * aonv;
    let mut temp1 = 3.0 * xno2 * ainv2;
    let mut temp = temp1 * ROOT22;
    let d2201 = temp * f220 * g201;
    let d2211 = temp * f221 * g211;
    temp1 *= aonv;
    temp = temp1 * ROOT32;
    let d3210 = temp * f321 * g310;
    let d3222 = temp * f322 * g322;
    temp1 *= aonv;
    temp = 2.0 * temp1 * ROOT44;
    let d4410 = temp * f441 * g410;
    let d4422 = temp * f442 * g422;
    temp1 *= aonv;
    temp = temp1 * ROOT52;
    let d5220 = temp * f522 * g520;
    let d5232 = temp * f523 * g532;
    temp = 2.0 * temp1 * ROOT54;
    let d5421 = temp * f542 * g521;
    let d5433 = temp * f543 * g533;

    HalfDayCoefficients {
        d2201,
        d2211,
        d3210,
        d3222,
        d4410,
        d4422,
        d5220,
        d5232,
        d5421,
        d5433,
    }
}

/// Resonance angle rate and its first two derivatives at the cursor.
struct Derivatives {
    xldot: f64,
    xndt: f64,
    xnddt: f64,
}

impl ResonanceTerms {
    fn derivatives(&self, cursor: &IntegratorCursor, argpo: f64, argpdot: f64) -> Derivatives {
        let xli = cursor.xli;
        let xldot = cursor.xni + self.xfact;
        let (xndt, xnddt) = match &self.harmonics {
            Harmonics::OneDay { del1, del2, del3 } => {
                let xndt = del1 * (xli - FASX2).sin()
                    + del2 * (2.0 * (xli - FASX4)).sin()
                    + del3 * (3.0 * (xli - FASX6)).sin();
                let xnddt = del1 * (xli - FASX2).cos()
                    + 2.0 * del2 * (2.0 * (xli - FASX4)).cos()
                    + 3.0 * del3 * (3.0 * (xli - FASX6)).cos();
                (xndt, xnddt)
            }
            Harmonics::HalfDay(d) => {
                let xomi = argpo + argpdot * cursor.atime;
                let x2omi = xomi + xomi;
                let x2li = xli + xli;
                let xndt = d.d2201 * (x2omi + xli - G22).sin()
                    + d.d2211 * (xli - G22).sin()
                    + d.d3210 * (xomi + xli - G32).sin()
                    + d.d3222 * (-xomi + xli - G32).sin()
                    + d.d4410 * (x2omi + x2li - G44).sin()
                    + d.d4422 * (x2li - G44).sin()
                    + d.d5220 * (xomi + xli - G52).sin()
                    + d.d5232 * (-xomi + xli - G52).sin()
                    + d.d5421 * (xomi + x2li - G54).sin()
                    + d.d5433 * (-xomi + x2li - G54).sin();
                let xnddt = d.d2201 * (x2omi + xli - G22).cos()
                    + d.d2211 * (xli - G22).cos()
                    + d.d3210 * (xomi + xli - G32).cos()
                    + d.d3222 * (-xomi + xli - G32).cos()
                    + d.d5220 * (xomi + xli - G52).cos()
                    + d.d5232 * (-xomi + xli - G52).cos()
                    + 2.0
                        * (d.d4410 * (x2omi + x2li - G44).cos()
                            + d.d4422 * (x2li - G44).cos()
                            + d.d5421 * (xomi + x2li - G54).cos()
                            + d.d5433 * (-xomi + x2li - G54).cos());
                (xndt, xnddt)
            }
        };
        Derivatives {
            xldot,
            xndt,
            xnddt: xnddt * xldot,
        }
    }
}

/// Deep-space secular update: luni-solar rates, then (for resonant orbits)
/// the resonance integration up to `t` minutes from epoch.
pub(crate) fn advance(
    rates: &DeepSecularRates,
    resonance: Option<&ResonanceTerms>,
    cursor: &mut IntegratorCursor,
    epoch: &ResonanceEpoch,
    t: f64,
    el: &mut WorkingElements,
) {
    rates.apply(t, el);

    let Some(terms) = resonance else {
        return;
    };
    let theta = (epoch.gsto + t * RPTIM) % TAU;

    // Restart from epoch unless the cursor lies between epoch and t.
    if cursor.atime == 0.0 || t * cursor.atime <= 0.0 || t.abs() < cursor.atime.abs() {
        *cursor = IntegratorCursor {
            atime: 0.0,
            xli: terms.xlamo,
            xni: epoch.no_unkozai,
        };
    }
    let delt = if t > 0.0 { STEP } else { -STEP };

    let (d, ft) = loop {
        let d = terms.derivatives(cursor, epoch.argpo, epoch.argpdot);
        if (t - cursor.atime).abs() < STEP {
            break (d, t - cursor.atime);
        }
        cursor.xli = cursor.xli + d.xldot * delt + d.xndt * STEP2;
        cursor.xni = cursor.xni + d.xndt * delt + d.xnddt * STEP2;
        cursor.atime += delt;
    };

    let nm = cursor.xni + d.xndt * ft + d.xnddt * ft * ft * 0.5;
    let xl = cursor.xli + d.xldot * ft + d.xndt * ft * ft * 0.5;
    el.mean_anomaly = match terms.harmonics {
        Harmonics::HalfDay(_) => xl - 2.0 * el.node + 2.0 * theta,
        Harmonics::OneDay { .. } => xl - el.node - el.argp + theta,
    };
    let dndt = nm - epoch.no_unkozai;
    el.mean_motion = epoch.no_unkozai + dndt;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        // ~1 rev/day
        assert_eq!(ResonanceClass::classify(0.00437527, 0.1), ResonanceClass::TwentyFourHour);
        // Molniya
        assert_eq!(ResonanceClass::classify(0.0087, 0.7), ResonanceClass::TwelveHour);
        // 12-hour period but too circular
        assert_eq!(ResonanceClass::classify(0.0087, 0.3), ResonanceClass::None);
        // Open interval edges of the 24-hour band
        assert_eq!(ResonanceClass::classify(0.0034906585, 0.0), ResonanceClass::None);
        assert_eq!(ResonanceClass::classify(0.0052359877, 0.0), ResonanceClass::None);
        // Closed edges of the 12-hour band
        assert_eq!(ResonanceClass::classify(8.26e-3, 0.5), ResonanceClass::TwelveHour);
        assert_eq!(ResonanceClass::classify(9.24e-3, 0.5), ResonanceClass::TwelveHour);
        assert_eq!(ResonanceClass::classify(0.0437, 0.0), ResonanceClass::None);
    }

    fn half_day_at(em: f64) -> HalfDayCoefficients {
        half_day_coefficients(em, 0.4, 0.9, 0.0087, 0.25)
    }

    #[test]
    fn test_eccentricity_breakpoints_switch_polynomials() {
        // The coefficient sets are not continuous across the breakpoints:
        // an infinitesimal step over 0.65 moves d2211 by a finite amount.
        let below = half_day_at(0.65);
        let above = half_day_at(0.65 + 1e-12);
        assert!((below.d2211 - above.d2211).abs() > 1e-3 * below.d2211.abs());

        // Away from any breakpoint a tiny step leaves them continuous.
        let a = half_day_at(0.68);
        let b = half_day_at(0.68 + 1e-12);
        assert!((a.d2211 - b.d2211).abs() <= 1e-9 * a.d2211.abs());
        assert!((a.d5433 - b.d5433).abs() <= 1e-9 * a.d5433.abs());
    }
}
