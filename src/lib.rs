//! # norad-sgp4
//!
//! SGP4/SDP4 propagation of NORAD two-line element sets.
//!
//! Provides TLE parsing, the near-Earth and deep-space analytical
//! propagators with lunar-solar perturbations and 12/24-hour resonance
//! integration, Julian-date and sidereal-time utilities, and parallel
//! catalog propagation.
//!
//! ```
//! use norad_sgp4::{PropagatorConfig, PropagatorState, Tle};
//!
//! let tle = Tle::parse(
//!     "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753",
//!     "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667",
//! ).unwrap();
//! let mut sat = PropagatorState::new(&tle.to_elements(), PropagatorConfig::default());
//! let sv = sat.propagate(360.0);
//! assert!(sv.is_ok());
//! assert!((sv.r[0] + 7154.0312).abs() < 1e-3);
//! ```

pub mod config;
pub mod constants;
pub mod elements;
pub mod gravity;
pub mod julian;
pub mod propagator;
pub mod sgp4;
pub mod sidereal;
pub mod tle;

pub use config::{ConfigError, OpsMode, PropagatorConfig};
pub use elements::{MeanElementSet, SinglyAveragedElements};
pub use gravity::{GravityConstants, GravityModel};
pub use propagator::{propagate_catalog, propagate_many, PropagationError, StateVector, MAX_EPHEMERIS_STEPS};
pub use sgp4::{IntegratorCursor, Method, PropagatorState, ResonanceClass, MAX_TSINCE};
pub use tle::{Tle, TleError};

#[cfg(feature = "python")]
mod pybridge;

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn norad_sgp4(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pybridge::register(m)?;
    Ok(())
}
