//! Python bindings via PyO3.
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::PropagatorConfig;
use crate::elements::MeanElementSet;
use crate::julian;
use crate::propagator::{self, StateVector};
use crate::sgp4::PropagatorState;
use crate::sidereal;
use crate::tle::Tle;

fn value_error(e: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

type PyState = (u8, (f64, f64, f64), (f64, f64, f64));

fn to_tuple(sv: &StateVector) -> PyState {
    (
        sv.error_code(),
        (sv.r[0], sv.r[1], sv.r[2]),
        (sv.v[0], sv.v[1], sv.v[2]),
    )
}

// TLE
#[pyclass(name = "TLE")]
#[derive(Clone)]
pub struct PyTle {
    inner: Tle,
}

#[pymethods]
impl PyTle {
    /// Parse a TLE from two lines.
    #[staticmethod]
    fn parse(line1: &str, line2: &str) -> PyResult<Self> {
        Tle::parse(line1, line2)
            .map(|t| PyTle { inner: t })
            .map_err(value_error)
    }

    /// Parse a TLE from three lines (name + line1 + line2).
    #[staticmethod]
    fn parse_3line(name: &str, line1: &str, line2: &str) -> PyResult<Self> {
        Tle::parse_3line(name, line1, line2)
            .map(|t| PyTle { inner: t })
            .map_err(value_error)
    }

    /// Parse a batch of TLEs from a multi-line string.
    #[staticmethod]
    fn parse_batch(text: &str) -> PyResult<Vec<PyTle>> {
        Tle::parse_batch(text)
            .map(|tles| tles.into_iter().map(|t| PyTle { inner: t }).collect())
            .map_err(value_error)
    }

    /// Epoch as (jd, fraction).
    fn epoch_jd(&self) -> (f64, f64) { self.inner.epoch_jd() }

    #[getter] fn name(&self) -> Option<String> { self.inner.name.clone() }
    #[getter] fn satnum(&self) -> u32 { self.inner.satnum }
    #[getter] fn inclination_deg(&self) -> f64 { self.inner.inclination_deg }
    #[getter] fn raan_deg(&self) -> f64 { self.inner.raan_deg }
    #[getter] fn eccentricity(&self) -> f64 { self.inner.eccentricity }
    #[getter] fn arg_perigee_deg(&self) -> f64 { self.inner.arg_perigee_deg }
    #[getter] fn mean_anomaly_deg(&self) -> f64 { self.inner.mean_anomaly_deg }
    #[getter] fn mean_motion(&self) -> f64 { self.inner.mean_motion_rev_day }
    #[getter] fn bstar(&self) -> f64 { self.inner.bstar }
    #[getter] fn epoch_year(&self) -> i32 { self.inner.epoch_year }
    #[getter] fn epoch_day(&self) -> f64 { self.inner.epoch_day }
    #[getter] fn classification(&self) -> char { self.inner.classification }
    #[getter] fn intl_designator(&self) -> String { self.inner.intl_designator.clone() }

    fn __repr__(&self) -> String {
        format!("{}", self.inner)
    }
}

// Satellite
#[pyclass(name = "Satellite")]
#[derive(Clone)]
pub struct PySatellite {
    inner: PropagatorState,
}

#[pymethods]
impl PySatellite {
    /// Initialize from a parsed TLE.
    #[staticmethod]
    #[pyo3(signature = (tle, gravity="wgs72", opsmode="i"))]
    fn from_tle(tle: &PyTle, gravity: &str, opsmode: &str) -> PyResult<Self> {
        let config = PropagatorConfig::from_selectors(gravity, opsmode).map_err(value_error)?;
        Ok(PySatellite {
            inner: PropagatorState::new(&tle.inner.to_elements(), config),
        })
    }

    /// Parse two TLE lines and initialize.
    #[staticmethod]
    #[pyo3(signature = (line1, line2, gravity="wgs72", opsmode="i"))]
    fn twoline2rv(line1: &str, line2: &str, gravity: &str, opsmode: &str) -> PyResult<Self> {
        let config = PropagatorConfig::from_selectors(gravity, opsmode).map_err(value_error)?;
        let tle = Tle::parse(line1, line2).map_err(value_error)?;
        Ok(PySatellite {
            inner: PropagatorState::new(&tle.to_elements(), config),
        })
    }

    /// Initialize from mean elements in radians and rad/min, epoch in days
    /// since 1949 December 31 00:00 UT.
    #[staticmethod]
    #[allow(clippy::too_many_arguments)]
    #[pyo3(signature = (satnum, epoch, bstar, ecco, argpo, inclo, mo, no_kozai, nodeo, gravity="wgs72", opsmode="i"))]
    fn from_elements(
        satnum: u32,
        epoch: f64,
        bstar: f64,
        ecco: f64,
        argpo: f64,
        inclo: f64,
        mo: f64,
        no_kozai: f64,
        nodeo: f64,
        gravity: &str,
        opsmode: &str,
    ) -> PyResult<Self> {
        let config = PropagatorConfig::from_selectors(gravity, opsmode).map_err(value_error)?;
        let elements = MeanElementSet {
            satnum,
            epoch,
            no_kozai,
            ecco,
            inclo,
            nodeo,
            argpo,
            mo,
            bstar,
        };
        Ok(PySatellite {
            inner: PropagatorState::new(&elements, config),
        })
    }

    /// Propagate to minutes since epoch.
    ///
    /// Returns (error_code, (x, y, z), (vx, vy, vz)) in km and km/s, TEME.
    fn sgp4_tsince(&mut self, tsince: f64) -> PyState {
        to_tuple(&self.inner.propagate(tsince))
    }

    /// Propagate to a UT1 Julian date split as (jd, fraction).
    fn sgp4(&mut self, jd: f64, fr: f64) -> PyState {
        to_tuple(&self.inner.propagate_jd(jd, fr))
    }

    /// Evaluate many minutes-since-epoch values in parallel.
    fn sgp4_array(&self, py: Python<'_>, times: Vec<f64>) -> Vec<PyState> {
        let out = py.allow_threads(|| propagator::propagate_many(&self.inner, &times));
        out.iter().map(to_tuple).collect()
    }

    /// Ephemeris over [start, stop] minutes every step minutes.
    ///
    /// Returns list of [tsince, error_code, x, y, z, vx, vy, vz].
    fn ephemeris(&mut self, start: f64, stop: f64, step: f64) -> Vec<Vec<f64>> {
        self.inner
            .ephemeris(start, stop, step)
            .iter()
            .map(|s| {
                vec![
                    s.tsince,
                    s.error_code() as f64,
                    s.r[0],
                    s.r[1],
                    s.r[2],
                    s.v[0],
                    s.v[1],
                    s.v[2],
                ]
            })
            .collect()
    }

    /// Initialization summary as a dict.
    fn info(&self, py: Python<'_>) -> PyResult<Py<PyDict>> {
        let s = &self.inner;
        let dict = PyDict::new(py);
        dict.set_item("satnum", s.satnum())?;
        dict.set_item("epoch", s.epoch())?;
        dict.set_item("method", if s.is_deep_space() { "d" } else { "n" })?;
        dict.set_item("resonance", format!("{:?}", s.resonance()))?;
        dict.set_item("opsmode", s.opsmode().to_string())?;
        dict.set_item("gravity", s.config().gravity.name())?;
        dict.set_item("no_unkozai", s.no_unkozai())?;
        dict.set_item("a", s.semi_major_axis())?;
        dict.set_item("alta", s.apogee_altitude())?;
        dict.set_item("altp", s.perigee_altitude())?;
        dict.set_item("gsto", s.gsto())?;
        dict.set_item("error", s.epoch_error().map_or(0, |e| e.code()))?;
        Ok(dict.into())
    }

    #[getter] fn satnum(&self) -> u32 { self.inner.satnum() }
    #[getter] fn error(&self) -> u8 { self.inner.epoch_error().map_or(0, |e| e.code()) }

    fn __repr__(&self) -> String {
        format!(
            "Satellite(satnum={}, method={:?}, epoch={:.8})",
            self.inner.satnum(),
            self.inner.method(),
            self.inner.epoch()
        )
    }
}

// Free functions
#[pyfunction]
fn gstime(jd_ut1: f64) -> f64 {
    sidereal::gstime(jd_ut1)
}

#[pyfunction]
#[pyo3(signature = (year, month, day, hour=0, minute=0, second=0.0))]
fn jday(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: f64) -> (f64, f64) {
    julian::jday(year, month, day, hour, minute, second)
}

#[pyfunction]
fn invjday(jd: f64, fr: f64) -> (i32, u32, u32, u32, u32, f64) {
    julian::invjday(jd, fr)
}

#[pyfunction]
fn days2mdhms(year: i32, days: f64) -> (u32, u32, u32, u32, f64) {
    julian::days2mdhms(year, days)
}

/// Propagate many satellites to the same minutes since their epochs.
#[pyfunction]
fn propagate_catalog(py: Python<'_>, satellites: Vec<PySatellite>, tsince: f64) -> Vec<PyState> {
    let mut states: Vec<PropagatorState> = satellites.into_iter().map(|s| s.inner).collect();
    let out = py.allow_threads(|| propagator::propagate_catalog(&mut states, tsince));
    out.iter().map(to_tuple).collect()
}

// Module registration
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTle>()?;
    m.add_class::<PySatellite>()?;
    m.add_function(wrap_pyfunction!(gstime, m)?)?;
    m.add_function(wrap_pyfunction!(jday, m)?)?;
    m.add_function(wrap_pyfunction!(invjday, m)?)?;
    m.add_function(wrap_pyfunction!(days2mdhms, m)?)?;
    m.add_function(wrap_pyfunction!(propagate_catalog, m)?)?;
    Ok(())
}
