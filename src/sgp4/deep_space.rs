//! Luni-solar terms of the deep-space model.
//!
//! [`DeepSpaceCommonTerms`] holds the geometry shared by the long-period
//! periodics and the resonance initializer. It is built from two passes of
//! the same routine, one with solar constants and one with lunar constants.
//! [`LunarSolarPeriodics`] folds the resulting long-period corrections into
//! a working element set at each call.

use serde::{Deserialize, Serialize};

use super::WorkingElements;
use crate::config::OpsMode;
use crate::constants::{PI, TAU};

/// Solar mean motion (rad/min).
pub(crate) const ZNS: f64 = 1.19459e-5;
/// Solar eccentricity.
pub(crate) const ZES: f64 = 0.01675;
/// Lunar mean motion (rad/min).
pub(crate) const ZNL: f64 = 1.5835218e-4;
/// Lunar eccentricity.
pub(crate) const ZEL: f64 = 0.05490;

const C1SS: f64 = 2.9864797e-6;
const C1L: f64 = 4.7968065e-7;
const ZSINIS: f64 = 0.39785416;
const ZCOSIS: f64 = 0.91744867;
const ZCOSGS: f64 = 0.1945905;
const ZSINGS: f64 = -0.98088458;

/// Inclination below which the long-period node and perigee corrections
/// switch to the Lyddane formulation (rad).
const LYDDANE_INCLINATION: f64 = 0.2;

/// Direction cosines of a perturbing body's orbit plane.
#[derive(Debug, Clone, Copy)]
struct BodyGeometry {
    cosg: f64,
    sing: f64,
    cosi: f64,
    sini: f64,
    cosh: f64,
    sinh: f64,
    /// Body perturbation coefficient.
    cc: f64,
}

/// Geometry coefficients contributed by one perturbing body.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ThirdBodyTerms {
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
    pub s4: f64,
    pub s5: f64,
    pub s6: f64,
    pub s7: f64,
    pub z1: f64,
    pub z2: f64,
    pub z3: f64,
    pub z11: f64,
    pub z12: f64,
    pub z13: f64,
    pub z21: f64,
    pub z22: f64,
    pub z23: f64,
    pub z31: f64,
    pub z32: f64,
    pub z33: f64,
}

/// Satellite orientation used by both body passes.
struct SatelliteAngles {
    sinim: f64,
    cosim: f64,
    sinomm: f64,
    cosomm: f64,
    em: f64,
    emsq: f64,
    betasq: f64,
    rtemsq: f64,
    xnoi: f64,
}

impl ThirdBodyTerms {
    fn compute(body: &BodyGeometry, sat: &SatelliteAngles) -> Self {
        let (cosim, sinim) = (sat.cosim, sat.sinim);
        let (cosomm, sinomm) = (sat.cosomm, sat.sinomm);
        let emsq = sat.emsq;

        let a1 = body.cosg * body.cosh + body.sing * body.cosi * body.sinh;
        let a3 = -body.sing * body.cosh + body.cosg * body.cosi * body.sinh;
        let a7 = -body.cosg * body.sinh + body.sing * body.cosi * body.cosh;
        let a8 = body.sing * body.sini;
        let a9 = body.sing * body.sinh + body.cosg * body.cosi * body.cosh;
        let a10 = body.cosg * body.sini;
        let a2 = cosim * a7 + sinim * a8;
        let a4 = cosim * a9 + sinim * a10;
        let a5 = -sinim * a7 + cosim * a8;
        let a6 = -sinim * a9 + cosim * a10;

        let x1 = a1 * cosomm + a2 * sinomm;
        let x2 = a3 * cosomm + a4 * sinomm;
        let x3 = -a1 * sinomm + a2 * cosomm;
        let x4 = -a3 * sinomm + a4 * cosomm;
        let x5 = a5 * sinomm;
        let x6 = a6 * sinomm;
        let x7 = a5 * cosomm;
        let x8 = a6 * cosomm;

        let z31 = 12.0 * x1 * x1 - 3.0 * x3 * x3;
        let z32 = 24.0 * x1 * x2 - 6.0 * x3 * x4;
        let z33 = 12.0 * x2 * x2 - 3.0 * x4 * x4;
        let mut z1 = 3.0 * (a1 * a1 + a2 * a2) + z31 * emsq;
        let mut z2 = 6.0 * (a1 * a3 + a2 * a4) + z32 * emsq;
        let mut z3 = 3.0 * (a3 * a3 + a4 * a4) + z33 * emsq;
        let z11 = -6.0 * a1 * a5 + emsq * (-24.0 * x1 * x7 - 6.0 * x3 * x5);
        let z12 = -6.0 * (a1 * a6 + a3 * a5)
            + emsq * (-24.0 * (x2 * x7 + x1 * x8) - 6.0 * (x3 * x6 + x4 * x5));
        let z13 = -6.0 * a3 * a6 + emsq * (-24.0 * x2 * x8 - 6.0 * x4 * x6);
        let z21 = 6.0 * a2 * a5 + emsq * (24.0 * x1 * x5 - 6.0 * x3 * x7);
        let z22 = 6.0 * (a4 * a5 + a2 * a6)
            + emsq * (24.0 * (x2 * x5 + x1 * x6) - 6.0 * (x4 * x7 + x3 * x8));
        let z23 = 6.0 * a4 * a6 + emsq * (24.0 * x2 * x6 - 6.0 * x4 * x8);
        z1 = z1 + z1 + sat.betasq * z31;
        z2 = z2 + z2 + sat.betasq * z32;
        z3 = z3 + z3 + sat.betasq * z33;

        let s3 = body.cc * sat.xnoi;
        let s2 = -0.5 * s3 / sat.rtemsq;
        let s4 = s3 * sat.rtemsq;
        let s1 = -15.0 * sat.em * s4;

        ThirdBodyTerms {
            s1,
            s2,
            s3,
            s4,
            s5: x1 * x3 + x2 * x4,
            s6: x2 * x3 + x1 * x4,
            s7: x2 * x4 - x1 * x3,
            z1,
            z2,
            z3,
            z11,
            z12,
            z13,
            z21,
            z22,
            z23,
            z31,
            z32,
            z33,
        }
    }
}

/// Long-period amplitudes for one perturbing body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct PeriodicAmplitudes {
    pub e2: f64,
    pub e3: f64,
    pub i2: f64,
    pub i3: f64,
    pub l2: f64,
    pub l3: f64,
    pub l4: f64,
    pub gh2: f64,
    pub gh3: f64,
    pub gh4: f64,
    pub h2: f64,
    pub h3: f64,
}

/// Periodic offsets in eccentricity, inclination, mean longitude,
/// perigee and node.
#[derive(Debug, Clone, Copy, Default)]
struct PeriodicOffsets {
    e: f64,
    i: f64,
    l: f64,
    gh: f64,
    h: f64,
}

impl PeriodicAmplitudes {
    fn from_terms(t: &ThirdBodyTerms, emsq: f64, body_ecc: f64) -> Self {
        PeriodicAmplitudes {
            e2: 2.0 * t.s1 * t.s6,
            e3: 2.0 * t.s1 * t.s7,
            i2: 2.0 * t.s2 * t.z12,
            i3: 2.0 * t.s2 * (t.z13 - t.z11),
            l2: -2.0 * t.s3 * t.z2,
            l3: -2.0 * t.s3 * (t.z3 - t.z1),
            l4: -2.0 * t.s3 * (-21.0 - 9.0 * emsq) * body_ecc,
            gh2: 2.0 * t.s4 * t.z32,
            gh3: 2.0 * t.s4 * (t.z33 - t.z31),
            gh4: -18.0 * t.s4 * body_ecc,
            h2: -2.0 * t.s2 * t.z22,
            h3: -2.0 * t.s2 * (t.z23 - t.z21),
        }
    }

    /// Offsets at body mean anomaly `zm`.
    fn evaluate(&self, zm: f64, body_ecc: f64) -> PeriodicOffsets {
        let zf = zm + 2.0 * body_ecc * zm.sin();
        let sinzf = zf.sin();
        let f2 = 0.5 * sinzf * sinzf - 0.25;
        let f3 = -0.5 * sinzf * zf.cos();
        PeriodicOffsets {
            e: self.e2 * f2 + self.e3 * f3,
            i: self.i2 * f2 + self.i3 * f3,
            l: self.l2 * f2 + self.l3 * f3 + self.l4 * sinzf,
            gh: self.gh2 * f2 + self.gh3 * f3 + self.gh4 * sinzf,
            h: self.h2 * f2 + self.h3 * f3,
        }
    }
}

/// Deep-space geometry at a given set of mean elements.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DeepSpaceCommonTerms {
    pub solar: ThirdBodyTerms,
    pub lunar: ThirdBodyTerms,
    pub sinim: f64,
    pub cosim: f64,
    pub emsq: f64,
    /// Solar mean anomaly at the evaluation time (rad).
    pub zmos: f64,
    /// Lunar mean anomaly at the evaluation time (rad).
    pub zmol: f64,
}

impl DeepSpaceCommonTerms {
    /// Evaluate for elements `(ep, argpp, inclp, nodep, np)` at `tc` minutes
    /// past an epoch given in days since 1949 December 31 00:00 UT.
    pub(crate) fn compute(
        epoch: f64,
        ep: f64,
        argpp: f64,
        tc: f64,
        inclp: f64,
        nodep: f64,
        np: f64,
    ) -> Self {
        let snodm = nodep.sin();
        let cnodm = nodep.cos();
        let emsq = ep * ep;
        let betasq = 1.0 - emsq;
        let sat = SatelliteAngles {
            sinim: inclp.sin(),
            cosim: inclp.cos(),
            sinomm: argpp.sin(),
            cosomm: argpp.cos(),
            em: ep,
            emsq,
            betasq,
            rtemsq: betasq.sqrt(),
            xnoi: 1.0 / np,
        };

        // Lunar orbit plane, days since 1900 January 0.5
        let day = epoch + 18261.5 + tc / 1440.0;
        let xnodce = (4.5236020 - 9.2422029e-4 * day) % TAU;
        let stem = xnodce.sin();
        let ctem = xnodce.cos();
        let zcosil = 0.91375164 - 0.03568096 * ctem;
        let zsinil = (1.0 - zcosil * zcosil).sqrt();
        let zsinhl = 0.089683511 * stem / zsinil;
        let zcoshl = (1.0 - zsinhl * zsinhl).sqrt();
        let gam = 5.8351514 + 0.0019443680 * day;
        let zx = 0.39785416 * stem / zsinil;
        let zy = zcoshl * ctem + 0.91744867 * zsinhl * stem;
        let zx = gam + zx.atan2(zy) - xnodce;

        let solar_geometry = BodyGeometry {
            cosg: ZCOSGS,
            sing: ZSINGS,
            cosi: ZCOSIS,
            sini: ZSINIS,
            cosh: cnodm,
            sinh: snodm,
            cc: C1SS,
        };
        let lunar_geometry = BodyGeometry {
            cosg: zx.cos(),
            sing: zx.sin(),
            cosi: zcosil,
            sini: zsinil,
            cosh: zcoshl * cnodm + zsinhl * snodm,
            sinh: snodm * zcoshl - cnodm * zsinhl,
            cc: C1L,
        };

        DeepSpaceCommonTerms {
            solar: ThirdBodyTerms::compute(&solar_geometry, &sat),
            lunar: ThirdBodyTerms::compute(&lunar_geometry, &sat),
            sinim: sat.sinim,
            cosim: sat.cosim,
            emsq,
            zmol: (4.7199672 + 0.22997150 * day - gam) % TAU,
            zmos: (6.2565837 + 0.017201977 * day) % TAU,
        }
    }
}

/// Long-period luni-solar periodic model carried by a deep-space propagator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct LunarSolarPeriodics {
    pub solar: PeriodicAmplitudes,
    pub lunar: PeriodicAmplitudes,
    /// Solar mean anomaly at epoch (rad).
    pub zmos: f64,
    /// Lunar mean anomaly at epoch (rad).
    pub zmol: f64,
}

impl LunarSolarPeriodics {
    pub(crate) fn from_common(common: &DeepSpaceCommonTerms) -> Self {
        LunarSolarPeriodics {
            solar: PeriodicAmplitudes::from_terms(&common.solar, common.emsq, ZES),
            lunar: PeriodicAmplitudes::from_terms(&common.lunar, common.emsq, ZEL),
            zmos: common.zmos,
            zmol: common.zmol,
        }
    }

    /// Apply the long-period periodics at `t` minutes past epoch.
    ///
    /// The periodics are referenced to epoch, so the initial call
    /// (`init == true`) leaves the elements untouched.
    pub(crate) fn apply(&self, t: f64, init: bool, opsmode: OpsMode, el: &mut WorkingElements) {
        let (zm_solar, zm_lunar) = if init {
            (self.zmos, self.zmol)
        } else {
            (self.zmos + ZNS * t, self.zmol + ZNL * t)
        };
        let solar = self.solar.evaluate(zm_solar, ZES);
        let lunar = self.lunar.evaluate(zm_lunar, ZEL);

        let pe = solar.e + lunar.e;
        let pinc = solar.i + lunar.i;
        let pl = solar.l + lunar.l;
        let mut pgh = solar.gh + lunar.gh;
        let mut ph = solar.h + lunar.h;

        if init {
            return;
        }

        el.incl += pinc;
        el.ecc += pe;
        let sinip = el.incl.sin();
        let cosip = el.incl.cos();

        if el.incl >= LYDDANE_INCLINATION {
            ph /= sinip;
            pgh -= cosip * ph;
            el.argp += pgh;
            el.node += ph;
            el.mean_anomaly += pl;
        } else {
            // Lyddane modification: perturb the node through the
            // (sin i sin Ω, sin i cos Ω) pair to avoid dividing by sin i.
            let sinop = el.node.sin();
            let cosop = el.node.cos();
            let mut alfdp = sinip * sinop;
            let mut betdp = sinip * cosop;
            let dalf = ph * cosop + pinc * cosip * sinop;
            let dbet = -ph * sinop + pinc * cosip * cosop;
            alfdp += dalf;
            betdp += dbet;

            el.node = opsmode.wrap_node(el.node % TAU);
            let mut xls = el.mean_anomaly + el.argp + cosip * el.node;
            let dls = pl + pgh - pinc * el.node * sinip;
            xls += dls;
            let xnoh = el.node;
            el.node = opsmode.wrap_node(alfdp.atan2(betdp));
            if (xnoh - el.node).abs() > PI {
                if el.node < xnoh {
                    el.node += TAU;
                } else {
                    el.node -= TAU;
                }
            }
            el.mean_anomaly += pl;
            el.argp = xls - el.mean_anomaly - cosip * el.node;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn working(incl: f64, node: f64) -> WorkingElements {
        WorkingElements {
            ecc: 0.01,
            incl,
            node,
            argp: 0.3,
            mean_anomaly: 1.2,
            mean_motion: 0.0043752,
        }
    }

    fn geo_common() -> DeepSpaceCommonTerms {
        DeepSpaceCommonTerms::compute(20630.0, 0.01, 0.3, 0.0, 0.1, 5.5, 0.0043752)
    }

    #[test]
    fn test_body_anomalies_in_range() {
        let c = geo_common();
        assert!(c.zmos.abs() < TAU);
        assert!(c.zmol.abs() < TAU);
        assert_relative_eq!(c.emsq, 1e-4, epsilon = 1e-18);
    }

    #[test]
    fn test_initial_call_is_identity() {
        let p = LunarSolarPeriodics::from_common(&geo_common());
        let mut el = working(0.1, 5.5);
        let before = el;
        p.apply(0.0, true, OpsMode::Afspc, &mut el);
        assert_eq!(el, before);
    }

    #[test]
    fn test_corrections_are_small() {
        let p = LunarSolarPeriodics::from_common(&geo_common());
        let mut el = working(0.9, 1.0);
        let before = el;
        p.apply(10_000.0, false, OpsMode::Improved, &mut el);
        assert!((el.ecc - before.ecc).abs() < 1e-3);
        assert!((el.incl - before.incl).abs() < 1e-3);
        assert_eq!(el.mean_motion, before.mean_motion);
        assert!(el != before);
    }

    #[test]
    fn test_lyddane_branch_keeps_node_continuous() {
        // Node just above zero: the atan2 result must be unwrapped back
        // next to the input rather than jumping by 2π.
        let p = LunarSolarPeriodics::from_common(&geo_common());
        for mode in [OpsMode::Afspc, OpsMode::Improved] {
            let mut el = working(0.05, 1e-4);
            p.apply(5_000.0, false, mode, &mut el);
            assert!(el.node.abs() < 0.1, "mode={mode} node={}", el.node);
        }
    }

    #[test]
    fn test_lyddane_wrap_differs_by_mode() {
        // A negative node is wrapped into [0, 2π) only in AFSPC mode.
        let p = LunarSolarPeriodics::from_common(&geo_common());
        let mut afspc = working(0.05, -1.0);
        let mut improved = afspc;
        p.apply(5_000.0, false, OpsMode::Afspc, &mut afspc);
        p.apply(5_000.0, false, OpsMode::Improved, &mut improved);
        assert!(afspc.node > 0.0);
        assert!(improved.node < 0.0);
        assert_relative_eq!(afspc.node - TAU, improved.node, epsilon = 1e-9);
    }
}
