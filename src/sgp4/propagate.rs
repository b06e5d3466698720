//! The propagation step: secular update, deep-space corrections, short-period
//! periodics and the conversion to a TEME position and velocity.

use super::resonance::{self, ResonanceEpoch};
use super::{PropagatorState, WorkingElements};
use crate::constants::{PI, TAU, TEMP4, X2O3};
use crate::elements::SinglyAveragedElements;
use crate::propagator::{PropagationError, StateVector};

/// Largest accepted |tsince| (min), about 1900 years. Keeps the resonance
/// integrator's step count bounded.
pub const MAX_TSINCE: f64 = 1.0e9;

/// Output of a successful step.
struct Step {
    r: [f64; 3],
    v: [f64; 3],
    mean: SinglyAveragedElements,
    /// Radius below one Earth radius.
    decayed: bool,
}

/// Kepler's equation in the (axnl, aynl) formulation: at most ten
/// Newton steps, each clamped to 0.95 rad.
///
/// Returns the sine and cosine evaluated on the last iteration.
fn solve_kepler(u: f64, axnl: f64, aynl: f64) -> (f64, f64) {
    let mut eo1 = u;
    let mut tem5: f64 = 9999.9;
    let mut sineo1 = 0.0;
    let mut coseo1 = 0.0;
    let mut ktr = 1;
    while tem5.abs() >= 1.0e-12 && ktr <= 10 {
        sineo1 = eo1.sin();
        coseo1 = eo1.cos();
        tem5 = 1.0 - coseo1 * axnl - sineo1 * aynl;
        tem5 = (u - aynl * coseo1 + axnl * sineo1 - eo1) / tem5;
        if tem5.abs() >= 0.95 {
            tem5 = if tem5 > 0.0 { 0.95 } else { -0.95 };
        }
        eo1 += tem5;
        ktr += 1;
    }
    (sineo1, coseo1)
}

impl PropagatorState {
    /// Position (km) and velocity (km/s) in TEME at `tsince` minutes from
    /// epoch.
    ///
    /// Failures are reported through [`StateVector::error`]; a fatal error
    /// comes with a zero vector, a decayed orbit with the computed one.
    /// A NaN, infinite or beyond-[`MAX_TSINCE`] offset is reported as
    /// [`PropagationError::InvalidTime`] (code 7) without touching the state.
    pub fn propagate(&mut self, tsince: f64) -> StateVector {
        self.propagate_detailed(tsince).0
    }

    /// Like [`propagate`](Self::propagate), also returning the singly-averaged
    /// mean elements of the step when it got that far.
    pub fn propagate_detailed(&mut self, tsince: f64) -> (StateVector, Option<SinglyAveragedElements>) {
        if let Some(err) = self.init_error {
            return (StateVector::failed(tsince, err), None);
        }
        if !tsince.is_finite() || tsince.abs() > MAX_TSINCE {
            return (StateVector::failed(tsince, PropagationError::InvalidTime), None);
        }
        match self.step(tsince) {
            Ok(step) => {
                let error = step.decayed.then_some(PropagationError::Decayed);
                let sv = StateVector {
                    r: step.r,
                    v: step.v,
                    tsince,
                    error,
                };
                (sv, Some(step.mean))
            }
            Err((err, mean)) => (StateVector::failed(tsince, err), mean),
        }
    }

    fn step(&mut self, t: f64) -> Result<Step, (PropagationError, Option<SinglyAveragedElements>)> {
        let grav = self.gravity;
        let sec = self.secular;
        let el = self.elements;
        let vkmpersec = grav.radius_earth * grav.xke / 60.0;

        // ── Secular gravity and drag ──
        let xmdf = el.mo + sec.mdot * t;
        let argpdf = el.argpo + sec.argpdot * t;
        let nodedf = el.nodeo + sec.nodedot * t;
        let t2 = t * t;
        let mut w = WorkingElements {
            ecc: el.ecco,
            incl: el.inclo,
            node: nodedf + sec.nodecf * t2,
            argp: argpdf,
            mean_anomaly: xmdf,
            mean_motion: self.no_unkozai,
        };
        let mut tempa = 1.0 - sec.cc1 * t;
        let mut tempe = el.bstar * sec.cc4 * t;
        let mut templ = sec.t2cof * t2;

        if !sec.isimp {
            let delomg = sec.omgcof * t;
            let delmtemp = 1.0 + sec.eta * xmdf.cos();
            let delm = sec.xmcof * (delmtemp * delmtemp * delmtemp - sec.delmo);
            let temp = delomg + delm;
            w.mean_anomaly = xmdf + temp;
            w.argp = argpdf - temp;
            let t3 = t2 * t;
            let t4 = t3 * t;
            tempa = tempa - sec.d2 * t2 - sec.d3 * t3 - sec.d4 * t4;
            tempe += el.bstar * sec.cc5 * (w.mean_anomaly.sin() - sec.sinmao);
            templ = templ + sec.t3cof * t3 + t4 * (sec.t4cof + t * sec.t5cof);
        }

        // ── Deep-space secular effects and resonance ──
        if let Some(deep) = self.deep.as_mut() {
            let epoch = ResonanceEpoch {
                gsto: self.gsto,
                ecco: el.ecco,
                inclo: el.inclo,
                mo: el.mo,
                nodeo: el.nodeo,
                argpo: el.argpo,
                mdot: sec.mdot,
                nodedot: sec.nodedot,
                argpdot: sec.argpdot,
                no_unkozai: self.no_unkozai,
                xke: grav.xke,
            };
            resonance::advance(
                &deep.rates,
                deep.resonance.as_ref(),
                &mut deep.cursor,
                &epoch,
                t,
                &mut w,
            );
        }

        if w.mean_motion <= 0.0 {
            return Err((PropagationError::MeanMotion, None));
        }
        let am = (grav.xke / w.mean_motion).powf(X2O3) * tempa * tempa;
        let nm = grav.xke / am.powf(1.5);
        let mut em = w.ecc - tempe;
        if em >= 1.0 || em < -0.001 {
            return Err((PropagationError::PerturbedEccentricity, None));
        }
        if em < 1.0e-6 {
            em = 1.0e-6;
        }
        let mm = w.mean_anomaly + self.no_unkozai * templ;
        let xlm = mm + w.argp + w.node;
        let nodem = w.node % TAU;
        let argpm = w.argp % TAU;
        let xlm = xlm % TAU;
        let mm = (xlm - argpm - nodem) % TAU;

        let mean = SinglyAveragedElements {
            a: am,
            ecc: em,
            incl: w.incl,
            node: nodem,
            argp: argpm,
            mean_anomaly: mm,
            mean_motion: nm,
        };

        // ── Long-period periodics ──
        let mut p = WorkingElements {
            ecc: em,
            incl: w.incl,
            node: nodem,
            argp: argpm,
            mean_anomaly: mm,
            mean_motion: nm,
        };
        let mut sinip = w.incl.sin();
        let mut cosip = w.incl.cos();
        let mut aycof = sec.aycof;
        let mut xlcof = sec.xlcof;
        let mut con41 = sec.con41;
        let mut x1mth2 = sec.x1mth2;
        let mut x7thm1 = sec.x7thm1;

        if let Some(deep) = self.deep.as_ref() {
            deep.periodics.apply(t, false, self.config.opsmode, &mut p);
            if p.incl < 0.0 {
                p.incl = -p.incl;
                p.node += PI;
                p.argp -= PI;
            }
            if p.ecc < 0.0 || p.ecc > 1.0 {
                return Err((PropagationError::PerturbedEccentricity, Some(mean)));
            }

            sinip = p.incl.sin();
            cosip = p.incl.cos();
            aycof = -0.5 * grav.j3oj2 * sinip;
            xlcof = if (cosip + 1.0).abs() > 1.5e-12 {
                -0.25 * grav.j3oj2 * sinip * (3.0 + 5.0 * cosip) / (1.0 + cosip)
            } else {
                -0.25 * grav.j3oj2 * sinip * (3.0 + 5.0 * cosip) / TEMP4
            };
            let cosisq = cosip * cosip;
            con41 = 3.0 * cosisq - 1.0;
            x1mth2 = 1.0 - cosisq;
            x7thm1 = 7.0 * cosisq - 1.0;
        }

        let ep = p.ecc;
        let axnl = ep * p.argp.cos();
        let temp = 1.0 / (am * (1.0 - ep * ep));
        let aynl = ep * p.argp.sin() + temp * aycof;
        let xl = p.mean_anomaly + p.argp + p.node + temp * xlcof * axnl;

        // ── Kepler's equation ──
        let u = (xl - p.node) % TAU;
        let (sineo1, coseo1) = solve_kepler(u, axnl, aynl);

        // ── Short-period periodics ──
        let ecose = axnl * coseo1 + aynl * sineo1;
        let esine = axnl * sineo1 - aynl * coseo1;
        let el2 = axnl * axnl + aynl * aynl;
        let pl = am * (1.0 - el2);
        if pl < 0.0 {
            return Err((PropagationError::SemiLatusRectum, Some(mean)));
        }

        let rl = am * (1.0 - ecose);
        let rdotl = am.sqrt() * esine / rl;
        let rvdotl = pl.sqrt() / rl;
        let betal = (1.0 - el2).sqrt();
        let temp = esine / (1.0 + betal);
        let sinu = am / rl * (sineo1 - aynl - axnl * temp);
        let cosu = am / rl * (coseo1 - axnl + aynl * temp);
        let mut su = sinu.atan2(cosu);
        let sin2u = (cosu + cosu) * sinu;
        let cos2u = 1.0 - 2.0 * sinu * sinu;
        let temp = 1.0 / pl;
        let temp1 = 0.5 * grav.j2 * temp;
        let temp2 = temp1 * temp;

        let mrt = rl * (1.0 - 1.5 * temp2 * betal * con41) + 0.5 * temp1 * x1mth2 * cos2u;
        su -= 0.25 * temp2 * x7thm1 * sin2u;
        let xnode = p.node + 1.5 * temp2 * cosip * sin2u;
        let xinc = p.incl + 1.5 * temp2 * cosip * sinip * cos2u;
        let mvt = rdotl - nm * temp1 * x1mth2 * sin2u / grav.xke;
        let rvdot = rvdotl + nm * temp1 * (x1mth2 * cos2u + 1.5 * con41) / grav.xke;

        // ── Orientation vectors ──
        let sinsu = su.sin();
        let cossu = su.cos();
        let snod = xnode.sin();
        let cnod = xnode.cos();
        let sini = xinc.sin();
        let cosi = xinc.cos();
        let xmx = -snod * cosi;
        let xmy = cnod * cosi;
        let ux = xmx * sinsu + cnod * cossu;
        let uy = xmy * sinsu + snod * cossu;
        let uz = sini * sinsu;
        let vx = xmx * cossu - cnod * sinsu;
        let vy = xmy * cossu - snod * sinsu;
        let vz = sini * cossu;

        let mr = mrt * grav.radius_earth;
        Ok(Step {
            r: [mr * ux, mr * uy, mr * uz],
            v: [
                (mvt * ux + rvdot * vx) * vkmpersec,
                (mvt * uy + rvdot * vy) * vkmpersec,
                (mvt * uz + rvdot * vz) * vkmpersec,
            ],
            mean,
            decayed: mrt < 1.0,
        })
    }
}
