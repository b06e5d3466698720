//! SGP4/SDP4 propagation core.
//!
//! A [`PropagatorState`] is built once per satellite from a
//! [`MeanElementSet`](crate::elements::MeanElementSet) and then queried with
//! minutes since epoch. Orbits with a period of 225 minutes or more use the
//! deep-space (SDP4) extensions: luni-solar secular and long-period terms and,
//! near 12-hour or 24-hour commensurability, a numerically integrated
//! resonance.
//!
//! # State and concurrency
//! The only field a call mutates is the resonance integrator cursor. Calls
//! take `&mut self`, so two threads cannot share one state; clone it per
//! worker when the same satellite must be evaluated concurrently.

mod deep_space;
mod init;
mod propagate;
mod resonance;

use serde::{Deserialize, Serialize};

use crate::config::{OpsMode, PropagatorConfig};
use crate::elements::MeanElementSet;
use crate::gravity::GravityConstants;
use crate::propagator::PropagationError;

use deep_space::LunarSolarPeriodics;
pub use propagate::MAX_TSINCE;
pub use resonance::{IntegratorCursor, ResonanceClass};
use resonance::{DeepSecularRates, Harmonics, ResonanceTerms};

/// Propagation method selected at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Period below 225 minutes (SGP4).
    NearEarth,
    /// Period of 225 minutes or more (SDP4).
    DeepSpace,
}

/// Mean elements being advanced through one propagation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WorkingElements {
    pub ecc: f64,
    pub incl: f64,
    pub node: f64,
    pub argp: f64,
    pub mean_anomaly: f64,
    pub mean_motion: f64,
}

/// Drag and zonal-harmonic coefficients fixed at initialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct SecularTerms {
    /// Perigee below 220 km: higher-order drag terms are dropped.
    pub isimp: bool,
    pub aycof: f64,
    pub con41: f64,
    pub cc1: f64,
    pub cc4: f64,
    pub cc5: f64,
    pub d2: f64,
    pub d3: f64,
    pub d4: f64,
    pub delmo: f64,
    pub eta: f64,
    pub argpdot: f64,
    pub omgcof: f64,
    pub sinmao: f64,
    pub t2cof: f64,
    pub t3cof: f64,
    pub t4cof: f64,
    pub t5cof: f64,
    pub x1mth2: f64,
    pub x7thm1: f64,
    pub mdot: f64,
    pub nodedot: f64,
    pub xlcof: f64,
    pub xmcof: f64,
    pub nodecf: f64,
}

/// Deep-space terms of an SDP4 propagator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct DeepSpaceTerms {
    pub periodics: LunarSolarPeriodics,
    pub rates: DeepSecularRates,
    pub resonance: Option<ResonanceTerms>,
    pub cursor: IntegratorCursor,
}

/// Per-satellite propagator state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagatorState {
    pub(crate) elements: MeanElementSet,
    pub(crate) config: PropagatorConfig,
    pub(crate) gravity: GravityConstants,
    /// Elements rejected at initialization; every call reports this.
    pub(crate) init_error: Option<PropagationError>,
    /// Condition reported by the propagation at epoch.
    pub(crate) epoch_error: Option<PropagationError>,
    /// Brouwer mean motion (rad/min)
    pub(crate) no_unkozai: f64,
    /// Semi-major axis (Earth radii)
    pub(crate) a: f64,
    pub(crate) alta: f64,
    pub(crate) altp: f64,
    /// Greenwich sidereal time at epoch (rad)
    pub(crate) gsto: f64,
    pub(crate) secular: SecularTerms,
    pub(crate) deep: Option<DeepSpaceTerms>,
}

impl PropagatorState {
    /// Element set the state was built from.
    pub fn elements(&self) -> &MeanElementSet {
        &self.elements
    }

    pub fn satnum(&self) -> u32 {
        self.elements.satnum
    }

    /// Epoch (days since 1949 December 31 00:00 UT).
    pub fn epoch(&self) -> f64 {
        self.elements.epoch
    }

    pub fn config(&self) -> PropagatorConfig {
        self.config
    }

    pub fn opsmode(&self) -> OpsMode {
        self.config.opsmode
    }

    pub fn gravity(&self) -> &GravityConstants {
        &self.gravity
    }

    pub fn method(&self) -> Method {
        if self.deep.is_some() {
            Method::DeepSpace
        } else {
            Method::NearEarth
        }
    }

    pub fn is_deep_space(&self) -> bool {
        self.deep.is_some()
    }

    pub fn resonance(&self) -> ResonanceClass {
        match self.deep.as_ref().and_then(|d| d.resonance.as_ref()) {
            None => ResonanceClass::None,
            Some(r) => match r.harmonics {
                Harmonics::OneDay { .. } => ResonanceClass::TwentyFourHour,
                Harmonics::HalfDay(_) => ResonanceClass::TwelveHour,
            },
        }
    }

    /// Resonance integrator cursor, for resonant deep-space orbits.
    pub fn integrator_cursor(&self) -> Option<IntegratorCursor> {
        self.deep
            .as_ref()
            .filter(|d| d.resonance.is_some())
            .map(|d| d.cursor)
    }

    /// Brouwer mean motion recovered from the Kozai value (rad/min).
    pub fn no_unkozai(&self) -> f64 {
        self.no_unkozai
    }

    /// Mean semi-major axis at epoch (Earth radii).
    pub fn semi_major_axis(&self) -> f64 {
        self.a
    }

    /// Mean apogee altitude at epoch (Earth radii above the surface).
    pub fn apogee_altitude(&self) -> f64 {
        self.alta
    }

    /// Mean perigee altitude at epoch (Earth radii above the surface).
    pub fn perigee_altitude(&self) -> f64 {
        self.altp
    }

    /// Greenwich sidereal time at epoch (rad).
    pub fn gsto(&self) -> f64 {
        self.gsto
    }

    /// Error found at initialization or at epoch, if any.
    pub fn epoch_error(&self) -> Option<PropagationError> {
        self.init_error.or(self.epoch_error)
    }
}
