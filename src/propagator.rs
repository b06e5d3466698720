//! Propagation results and batch conveniences.
//!
//! [`PropagatorState::propagate`] reports failures through the returned
//! [`StateVector`] rather than a `Result`, so a batch run never stops on one
//! bad satellite or one bad time. Catalog-wide runs are spread over a rayon
//! pool: satellites are independent, and a single satellite evaluated at many
//! times gets its own state clone per worker.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sgp4::PropagatorState;

/// Most grid points a single [`PropagatorState::ephemeris`] call produces.
pub const MAX_EPHEMERIS_STEPS: usize = 10_000_000;

/// Non-nominal propagation outcomes, numbered as in the classic SGP4 codes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropagationError {
    #[error("mean motion is not positive")]
    MeanMotion,
    #[error("mean eccentricity out of range")]
    Eccentricity,
    #[error("perturbed eccentricity out of range")]
    PerturbedEccentricity,
    #[error("semi-latus rectum is negative")]
    SemiLatusRectum,
    #[error("epoch elements are sub-orbital")]
    EpochSemiLatusRectum,
    #[error("satellite has decayed")]
    Decayed,
    #[error("time offset is not finite or out of range")]
    InvalidTime,
}

impl PropagationError {
    /// Numeric code: 1..=6 as in the classic SGP4 codes, 7 for a rejected
    /// time offset.
    pub fn code(self) -> u8 {
        match self {
            PropagationError::MeanMotion => 1,
            PropagationError::Eccentricity => 2,
            PropagationError::PerturbedEccentricity => 3,
            PropagationError::SemiLatusRectum => 4,
            PropagationError::EpochSemiLatusRectum => 5,
            PropagationError::Decayed => 6,
            PropagationError::InvalidTime => 7,
        }
    }

    /// Whether the accompanying vector is the zero placeholder.
    pub fn is_fatal(self) -> bool {
        self != PropagationError::Decayed
    }
}

/// TEME position and velocity at one time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    /// Position (km): [x, y, z]
    pub r: [f64; 3],
    /// Velocity (km/s): [vx, vy, vz]
    pub v: [f64; 3],
    /// Minutes from epoch
    pub tsince: f64,
    /// Set when the step was not nominal. Only `Decayed` keeps a computed vector.
    pub error: Option<PropagationError>,
}

impl StateVector {
    pub(crate) fn failed(tsince: f64, error: PropagationError) -> Self {
        StateVector {
            r: [0.0; 3],
            v: [0.0; 3],
            tsince,
            error: Some(error),
        }
    }

    /// Position magnitude (km).
    pub fn r_mag(&self) -> f64 {
        (self.r[0].powi(2) + self.r[1].powi(2) + self.r[2].powi(2)).sqrt()
    }

    /// Velocity magnitude (km/s).
    pub fn v_mag(&self) -> f64 {
        (self.v[0].powi(2) + self.v[1].powi(2) + self.v[2].powi(2)).sqrt()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Classic error code, 0 when nominal.
    pub fn error_code(&self) -> u8 {
        self.error.map_or(0, PropagationError::code)
    }

    /// Whether `r` and `v` hold a computed vector (nominal or decayed).
    pub fn has_vector(&self) -> bool {
        self.error.map_or(true, |e| !e.is_fatal())
    }
}

impl PropagatorState {
    /// Propagate to an absolute UT1 Julian date given as whole part and
    /// fraction.
    pub fn propagate_jd(&mut self, jd: f64, fraction: f64) -> StateVector {
        let tsince = self.elements.minutes_since_epoch(jd, fraction);
        self.propagate(tsince)
    }

    /// State vectors from `start` to `stop` (minutes from epoch) every `step`
    /// minutes. The last entry is at `stop` even when the span is not a
    /// multiple of the step. Non-nominal entries are kept in place.
    ///
    /// A zero, non-finite or wrong-signed step yields an empty ephemeris, as
    /// does a grid of more than [`MAX_EPHEMERIS_STEPS`] points.
    pub fn ephemeris(&mut self, start: f64, stop: f64, step: f64) -> Vec<StateVector> {
        let span = stop - start;
        if !span.is_finite() || !step.is_finite() || step == 0.0 || span * step < 0.0 {
            log::warn!(
                "satellite {}: invalid ephemeris span {start}..{stop} step {step}",
                self.elements.satnum
            );
            return Vec::new();
        }

        let steps = (span / step).floor();
        if steps >= MAX_EPHEMERIS_STEPS as f64 {
            log::warn!(
                "satellite {}: ephemeris {start}..{stop} step {step} exceeds {MAX_EPHEMERIS_STEPS} points",
                self.elements.satnum
            );
            return Vec::new();
        }

        let count = steps as usize;
        let mut out = Vec::with_capacity(count + 2);
        for k in 0..=count {
            let t = start + k as f64 * step;
            out.push(self.propagate(t));
        }
        let last = start + count as f64 * step;
        if last != stop {
            out.push(self.propagate(stop));
        }

        let failed = out.iter().filter(|sv| !sv.is_ok()).count();
        if failed > 0 {
            log::warn!(
                "satellite {}: {failed} of {} ephemeris steps not nominal",
                self.elements.satnum,
                out.len()
            );
        }
        out
    }
}

/// Propagate every satellite of a catalog to the same `tsince` in parallel.
pub fn propagate_catalog(states: &mut [PropagatorState], tsince: f64) -> Vec<StateVector> {
    log::trace!("propagating {} satellites to t={tsince} min", states.len());
    let out: Vec<StateVector> = states
        .par_iter_mut()
        .map(|state| state.propagate(tsince))
        .collect();
    for (state, sv) in states.iter().zip(&out) {
        if let Some(err) = sv.error {
            log::warn!("satellite {}: {err} at t={tsince} min", state.elements.satnum);
        }
    }
    out
}

/// Evaluate one satellite at many times in parallel. Each worker runs on its
/// own clone of `state`, which is left untouched.
pub fn propagate_many(state: &PropagatorState, times: &[f64]) -> Vec<StateVector> {
    log::trace!(
        "satellite {}: propagating {} times",
        state.elements.satnum,
        times.len()
    );
    let out: Vec<StateVector> = times
        .par_iter()
        .map_init(|| state.clone(), |local, &t| local.propagate(t))
        .collect();
    let failed = out.iter().filter(|sv| !sv.is_ok()).count();
    if failed > 0 {
        log::warn!(
            "satellite {}: {failed} of {} steps not nominal",
            state.elements.satnum,
            out.len()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PropagatorConfig;
    use crate::tle::Tle;
    use approx::assert_relative_eq;

    fn molniya() -> PropagatorState {
        let tle = Tle::parse(
            "1 08195U 75081A   06176.33215444  .00000099  00000-0  11873-3 0   813",
            "2 08195  64.1586 279.0717 6877146 264.7651  20.2257  2.00491383225656",
        )
        .unwrap();
        PropagatorState::new(&tle.to_elements(), PropagatorConfig::default())
    }

    fn iss() -> PropagatorState {
        let tle = Tle::parse(
            "1 25544U 98067A   09161.51089941  .00015706  00000-0  11388-3 0  1124",
            "2 25544  51.6406 341.1646 0009228  98.8703 312.6668 15.73580432604904",
        )
        .unwrap();
        PropagatorState::new(&tle.to_elements(), PropagatorConfig::default())
    }

    #[test]
    fn test_error_codes() {
        let all = [
            PropagationError::MeanMotion,
            PropagationError::Eccentricity,
            PropagationError::PerturbedEccentricity,
            PropagationError::SemiLatusRectum,
            PropagationError::EpochSemiLatusRectum,
            PropagationError::Decayed,
            PropagationError::InvalidTime,
        ];
        let codes: Vec<u8> = all.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(all.iter().filter(|e| **e != PropagationError::Decayed).all(|e| e.is_fatal()));
        assert!(!PropagationError::Decayed.is_fatal());
    }

    #[test]
    fn test_state_vector_helpers() {
        let sv = StateVector {
            r: [3.0, 4.0, 12.0],
            v: [1.0, 2.0, 2.0],
            tsince: 10.0,
            error: None,
        };
        assert_relative_eq!(sv.r_mag(), 13.0, epsilon = 1e-12);
        assert_relative_eq!(sv.v_mag(), 3.0, epsilon = 1e-12);
        assert!(sv.is_ok());
        assert!(sv.has_vector());
        assert_eq!(sv.error_code(), 0);

        let failed = StateVector::failed(5.0, PropagationError::SemiLatusRectum);
        assert_eq!(failed.error_code(), 4);
        assert!(!failed.has_vector());
        assert_eq!(failed.r_mag(), 0.0);
    }

    #[test]
    fn test_propagate_jd_matches_tsince() {
        let mut a = iss();
        let mut b = iss();
        let by_jd = a.propagate_jd(2454994.0, 0.0);
        let by_t = b.propagate(1424.3048494309187);
        assert_relative_eq!(by_jd.tsince, 1424.3048494309187, epsilon = 1e-6);
        for k in 0..3 {
            assert_relative_eq!(by_jd.r[k], by_t.r[k], epsilon = 1e-5);
        }
    }

    #[test]
    fn test_ephemeris_grid() {
        let mut s = iss();
        let eph = s.ephemeris(0.0, 100.0, 30.0);
        let times: Vec<f64> = eph.iter().map(|sv| sv.tsince).collect();
        assert_eq!(times, vec![0.0, 30.0, 60.0, 90.0, 100.0]);
        assert!(eph.iter().all(StateVector::is_ok));

        let back = s.ephemeris(0.0, -60.0, -20.0);
        let times: Vec<f64> = back.iter().map(|sv| sv.tsince).collect();
        assert_eq!(times, vec![0.0, -20.0, -40.0, -60.0]);

        assert!(s.ephemeris(0.0, 100.0, -5.0).is_empty());
        assert!(s.ephemeris(0.0, 100.0, 0.0).is_empty());
        assert_eq!(s.ephemeris(5.0, 5.0, 1.0).len(), 1);
    }

    #[test]
    fn test_ephemeris_rejects_oversized_grid() {
        let mut s = iss();
        assert!(s.ephemeris(0.0, 1.0e300, 1.0e-300).is_empty());
        assert!(s.ephemeris(0.0, MAX_EPHEMERIS_STEPS as f64, 1.0).is_empty());
        assert_eq!(s.ephemeris(0.0, 1.0, 0.5).len(), 3);
    }

    #[test]
    fn test_propagate_many_flags_bad_times() {
        let state = molniya();
        let out = propagate_many(&state, &[0.0, f64::NAN, 120.0]);
        assert_eq!(out[1].error, Some(PropagationError::InvalidTime));
        assert!(out[0].is_ok());
        assert!(out[2].is_ok());
        assert_relative_eq!(out[2].r[0], 15223.917136582058, epsilon = 1e-6);
    }

    #[test]
    fn test_ephemeris_matches_single_calls() {
        let mut s = molniya();
        let eph = s.ephemeris(0.0, 2880.0, 360.0);
        assert_eq!(eph.len(), 9);
        let mut fresh = molniya();
        let direct = fresh.propagate(2880.0);
        for k in 0..3 {
            assert_relative_eq!(eph[8].r[k], direct.r[k], epsilon = 1e-6);
        }
        assert_relative_eq!(eph[8].r[0], 3417.2093158646835, epsilon = 1e-5);
    }

    #[test]
    fn test_propagate_catalog() {
        let mut states = vec![iss(), molniya(), iss()];
        let out = propagate_catalog(&mut states, 120.0);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], out[2]);
        let mut single = molniya();
        assert_eq!(out[1], single.propagate(120.0));
        assert_relative_eq!(out[1].r[0], 15223.917136582058, epsilon = 1e-6);
    }

    #[test]
    fn test_propagate_many_leaves_state_untouched() {
        let state = molniya();
        let times: Vec<f64> = (0..48).map(|k| k as f64 * 60.0 - 720.0).collect();
        let out = propagate_many(&state, &times);
        assert_eq!(out.len(), times.len());
        assert_eq!(state, molniya());

        for (sv, &t) in out.iter().zip(&times) {
            assert_eq!(sv.tsince, t);
            let mut fresh = molniya();
            let expected = fresh.propagate(t);
            for k in 0..3 {
                assert_relative_eq!(sv.r[k], expected.r[k], epsilon = 1e-6);
            }
        }
    }
}
