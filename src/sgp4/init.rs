//! Propagator initialization.

use log::{debug, warn};

use super::deep_space::{DeepSpaceCommonTerms, LunarSolarPeriodics};
use super::resonance::{self, IntegratorCursor, ResonanceEpoch};
use super::{DeepSpaceTerms, PropagatorState, SecularTerms, WorkingElements};
use crate::config::PropagatorConfig;
use crate::constants::{DEEP_SPACE_PERIOD, TAU, TEMP4, X2O3};
use crate::elements::MeanElementSet;
use crate::gravity::GravityConstants;
use crate::propagator::PropagationError;

/// Distance from 1 inside which an eccentricity counts as parabolic.
const PARABOLIC_TOLERANCE: f64 = 1.0e-10;

/// Geometry recovered from the Kozai elements.
struct EpochGeometry {
    no_unkozai: f64,
    ao: f64,
    omeosq: f64,
    rteosq: f64,
    cosio: f64,
    cosio2: f64,
    sinio: f64,
    con41: f64,
    con42: f64,
    posq: f64,
    rp: f64,
}

impl EpochGeometry {
    /// Un-Kozai the mean motion and derive the epoch geometry.
    fn new(el: &MeanElementSet, grav: &GravityConstants) -> Self {
        let omeosq = 1.0 - el.ecco * el.ecco;
        let rteosq = omeosq.sqrt();
        let cosio = el.inclo.cos();
        let cosio2 = cosio * cosio;

        let ak = (grav.xke / el.no_kozai).powf(X2O3);
        let d1 = 0.75 * grav.j2 * (3.0 * cosio2 - 1.0) / (rteosq * omeosq);
        let mut del = d1 / (ak * ak);
        let adel = ak * (1.0 - del * del - del * (1.0 / 3.0 + 134.0 * del * del / 81.0));
        del = d1 / (adel * adel);
        let no_unkozai = el.no_kozai / (1.0 + del);

        let ao = (grav.xke / no_unkozai).powf(X2O3);
        let po = ao * omeosq;
        let con42 = 1.0 - 5.0 * cosio2;
        EpochGeometry {
            no_unkozai,
            ao,
            omeosq,
            rteosq,
            cosio,
            cosio2,
            sinio: el.inclo.sin(),
            con41: -con42 - cosio2 - cosio2,
            con42,
            posq: po * po,
            rp: ao * (1.0 - el.ecco),
        }
    }
}

/// Reject element sets the theory cannot represent.
fn validate(el: &MeanElementSet) -> Option<PropagationError> {
    if !(el.no_kozai > 0.0) {
        Some(PropagationError::MeanMotion)
    } else if el.ecco < 0.0 || (el.ecco - 1.0).abs() < PARABOLIC_TOLERANCE || el.ecco.is_nan() {
        Some(PropagationError::Eccentricity)
    } else if el.ecco > 1.0 {
        Some(PropagationError::EpochSemiLatusRectum)
    } else {
        None
    }
}

impl PropagatorState {
    /// Initialize a propagator for one satellite.
    ///
    /// Never fails: elements that cannot be propagated yield a state whose
    /// every call reports the initialization error with a zero vector.
    pub fn new(elements: &MeanElementSet, config: PropagatorConfig) -> Self {
        Self::initialize(elements, config, true)
    }

    pub(crate) fn initialize(
        elements: &MeanElementSet,
        config: PropagatorConfig,
        allow_deep_space: bool,
    ) -> Self {
        let gravity = config.gravity.constants();

        if let Some(err) = validate(elements) {
            warn!(
                "satellite {}: rejecting epoch elements ({err}), n={} e={}",
                elements.satnum, elements.no_kozai, elements.ecco
            );
            return PropagatorState {
                elements: *elements,
                config,
                gravity,
                init_error: Some(err),
                epoch_error: None,
                no_unkozai: 0.0,
                a: 0.0,
                alta: 0.0,
                altp: 0.0,
                gsto: 0.0,
                secular: SecularTerms::default(),
                deep: None,
            };
        }

        let el = elements;
        let geo = EpochGeometry::new(el, &gravity);
        let re = gravity.radius_earth;
        let gsto = config.opsmode.epoch_sidereal_time(el.epoch);

        let a = (geo.no_unkozai * gravity.tumin).powf(-2.0 / 3.0);
        let alta = a * (1.0 + el.ecco) - 1.0;
        let altp = a * (1.0 - el.ecco) - 1.0;
        if geo.rp < 1.0 {
            warn!("satellite {}: epoch perigee is below the surface", el.satnum);
        }

        // Atmosphere fit parameters, adjusted for low perigees.
        let qzms2ttemp = (120.0 - 78.0) / re;
        let qzms2t = qzms2ttemp.powf(4.0);
        let mut sfour = 78.0 / re + 1.0;
        let mut qzms24 = qzms2t;
        let perige = (geo.rp - 1.0) * re;
        if perige < 156.0 {
            sfour = perige - 78.0;
            if perige < 98.0 {
                sfour = 20.0;
            }
            let qzms24temp = (120.0 - sfour) / re;
            qzms24 = qzms24temp.powf(4.0);
            sfour = sfour / re + 1.0;
        }

        let ao = geo.ao;
        let ecco = el.ecco;
        let bstar = el.bstar;
        let no = geo.no_unkozai;
        let pinvsq = 1.0 / geo.posq;
        let tsi = 1.0 / (ao - sfour);
        let eta = ao * ecco * tsi;
        let etasq = eta * eta;
        let eeta = ecco * eta;
        let psisq = (1.0 - etasq).abs();
        let coef = qzms24 * tsi.powf(4.0);
        let coef1 = coef / psisq.powf(3.5);
        let cc2 = coef1
            * no
            * (ao * (1.0 + 1.5 * etasq + eeta * (4.0 + etasq))
                + 0.375 * gravity.j2 * tsi / psisq * geo.con41 * (8.0 + 3.0 * etasq * (8.0 + etasq)));
        let cc1 = bstar * cc2;
        let cc3 = if ecco > 1.0e-4 {
            -2.0 * coef * tsi * gravity.j3oj2 * no * geo.sinio / ecco
        } else {
            0.0
        };
        let x1mth2 = 1.0 - geo.cosio2;
        let cc4 = 2.0
            * no
            * coef1
            * ao
            * geo.omeosq
            * (eta * (2.0 + 0.5 * etasq) + ecco * (0.5 + 2.0 * etasq)
                - gravity.j2 * tsi / (ao * psisq)
                    * (-3.0 * geo.con41 * (1.0 - 2.0 * eeta + etasq * (1.5 - 0.5 * eeta))
                        + 0.75 * x1mth2 * (2.0 * etasq - eeta * (1.0 + etasq)) * (2.0 * el.argpo).cos()));
        let cc5 = 2.0 * coef1 * ao * geo.omeosq * (1.0 + 2.75 * (etasq + eeta) + eeta * etasq);

        let cosio = geo.cosio;
        let cosio2 = geo.cosio2;
        let cosio4 = cosio2 * cosio2;
        let temp1 = 1.5 * gravity.j2 * pinvsq * no;
        let temp2 = 0.5 * temp1 * gravity.j2 * pinvsq;
        let temp3 = -0.46875 * gravity.j4 * pinvsq * pinvsq * no;
        let mdot = no
            + 0.5 * temp1 * geo.rteosq * geo.con41
            + 0.0625 * temp2 * geo.rteosq * (13.0 - 78.0 * cosio2 + 137.0 * cosio4);
        let argpdot = -0.5 * temp1 * geo.con42
            + 0.0625 * temp2 * (7.0 - 114.0 * cosio2 + 395.0 * cosio4)
            + temp3 * (3.0 - 36.0 * cosio2 + 49.0 * cosio4);
        let xhdot1 = -temp1 * cosio;
        let nodedot =
            xhdot1 + (0.5 * temp2 * (4.0 - 19.0 * cosio2) + 2.0 * temp3 * (3.0 - 7.0 * cosio2)) * cosio;

        let xlcof = if (cosio + 1.0).abs() > 1.5e-12 {
            -0.25 * gravity.j3oj2 * geo.sinio * (3.0 + 5.0 * cosio) / (1.0 + cosio)
        } else {
            -0.25 * gravity.j3oj2 * geo.sinio * (3.0 + 5.0 * cosio) / TEMP4
        };
        let delmotemp = 1.0 + eta * el.mo.cos();

        let mut secular = SecularTerms {
            isimp: geo.rp < 220.0 / re + 1.0,
            aycof: -0.5 * gravity.j3oj2 * geo.sinio,
            con41: geo.con41,
            cc1,
            cc4,
            cc5,
            delmo: delmotemp * delmotemp * delmotemp,
            eta,
            argpdot,
            omgcof: bstar * cc3 * el.argpo.cos(),
            sinmao: el.mo.sin(),
            t2cof: 1.5 * cc1,
            x1mth2,
            x7thm1: 7.0 * cosio2 - 1.0,
            mdot,
            nodedot,
            xlcof,
            xmcof: if ecco > 1.0e-4 { -X2O3 * coef * bstar / eeta } else { 0.0 },
            nodecf: 3.5 * geo.omeosq * xhdot1 * cc1,
            ..SecularTerms::default()
        };

        let mut epoch_elements = *el;
        let deep = if allow_deep_space && TAU / no >= DEEP_SPACE_PERIOD {
            secular.isimp = true;
            let common = DeepSpaceCommonTerms::compute(el.epoch, ecco, el.argpo, 0.0, el.inclo, el.nodeo, no);
            let periodics = LunarSolarPeriodics::from_common(&common);

            let mut w = WorkingElements {
                ecc: el.ecco,
                incl: el.inclo,
                node: el.nodeo,
                argp: el.argpo,
                mean_anomaly: el.mo,
                mean_motion: no,
            };
            periodics.apply(0.0, true, config.opsmode, &mut w);
            epoch_elements.ecco = w.ecc;
            epoch_elements.inclo = w.incl;
            epoch_elements.nodeo = w.node;
            epoch_elements.argpo = w.argp;
            epoch_elements.mo = w.mean_anomaly;

            let epoch = ResonanceEpoch {
                gsto,
                ecco: epoch_elements.ecco,
                inclo: epoch_elements.inclo,
                mo: epoch_elements.mo,
                nodeo: epoch_elements.nodeo,
                argpo: epoch_elements.argpo,
                mdot,
                nodedot,
                argpdot,
                no_unkozai: no,
                xke: gravity.xke,
            };
            let (rates, resonance) = resonance::initialize(&common, &epoch);
            let cursor = match &resonance {
                Some(r) => IntegratorCursor {
                    atime: 0.0,
                    xli: r.xlamo,
                    xni: no,
                },
                None => IntegratorCursor::default(),
            };
            Some(DeepSpaceTerms {
                periodics,
                rates,
                resonance,
                cursor,
            })
        } else {
            None
        };

        if !secular.isimp {
            let cc1sq = cc1 * cc1;
            secular.d2 = 4.0 * ao * tsi * cc1sq;
            let temp = secular.d2 * tsi * cc1 / 3.0;
            secular.d3 = (17.0 * ao + sfour) * temp;
            secular.d4 = 0.5 * temp * ao * tsi * (221.0 * ao + 31.0 * sfour) * cc1;
            secular.t3cof = secular.d2 + 2.0 * cc1sq;
            secular.t4cof = 0.25 * (3.0 * secular.d3 + cc1 * (12.0 * secular.d2 + 10.0 * cc1sq));
            secular.t5cof = 0.2
                * (3.0 * secular.d4
                    + 12.0 * cc1 * secular.d3
                    + 6.0 * secular.d2 * secular.d2
                    + 15.0 * cc1sq * (2.0 * secular.d2 + cc1sq));
        }

        let mut state = PropagatorState {
            elements: epoch_elements,
            config,
            gravity,
            init_error: None,
            epoch_error: None,
            no_unkozai: no,
            a,
            alta,
            altp,
            gsto,
            secular,
            deep,
        };

        state.epoch_error = state.propagate(0.0).error;
        match state.epoch_error {
            Some(err) => warn!("satellite {}: {err} at epoch", el.satnum),
            None => debug!(
                "satellite {}: initialized {:?}, resonance {:?}, n={:.9} rad/min",
                el.satnum,
                state.method(),
                state.resonance(),
                no
            ),
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpsMode;
    use crate::gravity::GravityModel;
    use approx::assert_relative_eq;

    fn sat5() -> MeanElementSet {
        MeanElementSet::from_catalog_units(
            5, 0.0, 10.82419157, 0.1859667, 34.2682, 348.7242, 331.7664, 19.3264, 0.28098e-4,
        )
        .with_epoch_year_day(2000, 179.78495062)
    }

    #[test]
    fn test_unkozai_lowers_mean_motion() {
        let el = sat5();
        let state = PropagatorState::new(&el, PropagatorConfig::default());
        assert!(state.no_unkozai() < el.no_kozai);
        assert_relative_eq!(state.no_unkozai() / el.no_kozai, 1.0, epsilon = 1e-3);
        assert_eq!(state.epoch_error(), None);
        assert!(!state.is_deep_space());
    }

    #[test]
    fn test_semi_major_axis_and_altitudes() {
        let state = PropagatorState::new(&sat5(), PropagatorConfig::default());
        let a = state.semi_major_axis();
        assert_relative_eq!(state.apogee_altitude() - state.perigee_altitude(), 2.0 * a * 0.1859667, epsilon = 1e-12);
        // Roughly 1.35 Earth radii for ~10.8 rev/day
        assert!(a > 1.3 && a < 1.4, "a={a}");
    }

    #[test]
    fn test_low_perigee_uses_simplified_drag() {
        let el = MeanElementSet::from_catalog_units(
            1, 18441.78495062, 16.3, 0.001, 51.6, 0.0, 0.0, 0.0, 1e-4,
        );
        let state = PropagatorState::new(&el, PropagatorConfig::default());
        assert!(state.secular.isimp);
        assert_eq!(state.secular.d2, 0.0);
    }

    #[test]
    fn test_drag_coefficient_atmosphere_fit() {
        // Standard fit (perigee above 156 km) and the shifted fit used for a
        // perigee near 111 km.
        let state = PropagatorState::new(&sat5(), PropagatorConfig::default());
        assert_relative_eq!(state.secular.cc1, 9.531093269423194e-12, max_relative = 1e-12);

        let low = MeanElementSet::from_catalog_units(
            1, 18441.78495062, 15.5, 0.045, 51.6, 0.0, 0.0, 0.0, 1e-4,
        );
        let state = PropagatorState::new(&low, PropagatorConfig::default());
        assert!(state.perigee_altitude() * state.gravity().radius_earth > 98.0);
        assert!(state.perigee_altitude() * state.gravity().radius_earth < 156.0);
        assert!(state.secular.isimp);
        assert_relative_eq!(state.secular.cc1, 1.38381207893443e-06, max_relative = 1e-12);
    }

    #[test]
    fn test_zero_mean_motion_rejected() {
        let mut el = sat5();
        el.no_kozai = 0.0;
        let state = PropagatorState::new(&el, PropagatorConfig::default());
        assert_eq!(state.epoch_error(), Some(PropagationError::MeanMotion));
    }

    #[test]
    fn test_hyperbolic_rejected() {
        let mut el = sat5();
        el.ecco = 1.2;
        let state = PropagatorState::new(&el, PropagatorConfig::default());
        assert_eq!(state.epoch_error(), Some(PropagationError::EpochSemiLatusRectum));
        assert_eq!(state.epoch_error().map(|e| e.code()), Some(5));
    }

    #[test]
    fn test_gsto_follows_opsmode() {
        let el = sat5();
        let a = PropagatorState::new(&el, PropagatorConfig::default().with_opsmode(OpsMode::Afspc));
        let i = PropagatorState::new(&el, PropagatorConfig::default());
        assert_eq!(a.gsto(), crate::sidereal::gstime_afspc(el.epoch));
        assert_eq!(i.gsto(), crate::sidereal::gstime(el.epoch + crate::constants::JD_EPOCH_REF));
    }

    #[test]
    fn test_deep_space_threshold() {
        // A Brouwer period of exactly 225 minutes routes to the deep-space
        // branch; a slightly faster orbit stays near-Earth.
        let cfg = PropagatorConfig::new(GravityModel::Wgs72, OpsMode::Improved);
        let target = TAU / DEEP_SPACE_PERIOD;
        let base = MeanElementSet::from_catalog_units(
            2, 18441.78495062, 6.4, 0.01, 45.0, 10.0, 20.0, 30.0, 0.0,
        );

        // Solve for the Kozai mean motion whose un-Kozai value hits the threshold.
        let mut el = base;
        el.no_kozai = target;
        for _ in 0..50 {
            let no = EpochGeometry::new(&el, &cfg.gravity.constants()).no_unkozai;
            el.no_kozai *= target / no;
        }
        let state = PropagatorState::new(&el, cfg);
        let period = TAU / state.no_unkozai();
        assert!((period - DEEP_SPACE_PERIOD).abs() < 1e-9);
        assert_eq!(state.is_deep_space(), period >= DEEP_SPACE_PERIOD);

        let mut faster = el;
        faster.no_kozai *= 1.0 + 1e-6;
        assert!(!PropagatorState::new(&faster, cfg).is_deep_space());
        let mut slower = el;
        slower.no_kozai *= 1.0 - 1e-6;
        assert!(PropagatorState::new(&slower, cfg).is_deep_space());
    }
}
