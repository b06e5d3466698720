//! Earth gravity models used by SGP4.
//!
//! Three constant sets are in circulation: the legacy WGS-72 set with a
//! truncated `xke`, the full WGS-72 set (the one NORAD element sets are
//! generated against) and WGS-84.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Gravity model selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GravityModel {
    /// WGS-72 with the historical truncated `xke`.
    Wgs72Old,
    /// WGS-72.
    #[default]
    Wgs72,
    /// WGS-84.
    Wgs84,
}

/// Constants for one gravity model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GravityConstants {
    /// Gravitational parameter (km³/s²)
    pub mu: f64,
    /// Equatorial radius (km)
    pub radius_earth: f64,
    /// Reciprocal of `tumin` (1/min), sqrt(mu/Re³) in Earth radii per minute
    pub xke: f64,
    /// Minutes per canonical time unit
    pub tumin: f64,
    /// Un-normalized zonal harmonics
    pub j2: f64,
    pub j3: f64,
    pub j4: f64,
    /// J3 / J2
    pub j3oj2: f64,
}

impl GravityModel {
    /// Look up the constant set for this model.
    pub fn constants(self) -> GravityConstants {
        let (mu, radius_earth, xke) = match self {
            GravityModel::Wgs72Old => (398600.79964, 6378.135, 0.0743669161),
            GravityModel::Wgs72 => {
                let mu: f64 = 398600.8;
                let re: f64 = 6378.135;
                (mu, re, 60.0 / (re * re * re / mu).sqrt())
            }
            GravityModel::Wgs84 => {
                let mu: f64 = 398600.5;
                let re: f64 = 6378.137;
                (mu, re, 60.0 / (re * re * re / mu).sqrt())
            }
        };
        let (j2, j3, j4) = match self {
            GravityModel::Wgs84 => (0.00108262998905, -0.00000253215306, -0.00000161098761),
            _ => (0.001082616, -0.00000253881, -0.00000165597),
        };
        GravityConstants {
            mu,
            radius_earth,
            xke,
            tumin: 1.0 / xke,
            j2,
            j3,
            j4,
            j3oj2: j3 / j2,
        }
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            GravityModel::Wgs72Old => "wgs72old",
            GravityModel::Wgs72 => "wgs72",
            GravityModel::Wgs84 => "wgs84",
        }
    }
}

impl Default for GravityConstants {
    fn default() -> Self {
        GravityModel::default().constants()
    }
}

impl FromStr for GravityModel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wgs72old" => Ok(GravityModel::Wgs72Old),
            "wgs72" => Ok(GravityModel::Wgs72),
            "wgs84" => Ok(GravityModel::Wgs84),
            _ => Err(ConfigError::UnknownGravityModel(s.to_string())),
        }
    }
}

impl fmt::Display for GravityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wgs72_xke() {
        let g = GravityModel::Wgs72.constants();
        assert_relative_eq!(g.xke, 0.07436691613317342, epsilon = 1e-15);
        assert_relative_eq!(g.tumin * g.xke, 1.0, epsilon = 1e-15);
        assert_relative_eq!(g.j3oj2, -0.00253881 / 1.082616, epsilon = 1e-15);
    }

    #[test]
    fn test_legacy_xke_is_truncated() {
        let old = GravityModel::Wgs72Old.constants();
        let new = GravityModel::Wgs72.constants();
        assert_eq!(old.xke, 0.0743669161);
        assert_eq!(old.radius_earth, new.radius_earth);
        assert_eq!(old.j2, new.j2);
        assert!((old.xke - new.xke).abs() < 1e-10);
    }

    #[test]
    fn test_wgs84_constants() {
        let g = GravityModel::Wgs84.constants();
        assert_eq!(g.radius_earth, 6378.137);
        assert_eq!(g.mu, 398600.5);
        assert_eq!(g.j2, 0.00108262998905);
    }

    #[test]
    fn test_parse_selector() {
        assert_eq!("wgs72".parse::<GravityModel>().unwrap(), GravityModel::Wgs72);
        assert_eq!("WGS84".parse::<GravityModel>().unwrap(), GravityModel::Wgs84);
        assert_eq!(" wgs72old ".parse::<GravityModel>().unwrap(), GravityModel::Wgs72Old);
    }

    #[test]
    fn test_unknown_selector_fails() {
        let err = "egm96".parse::<GravityModel>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownGravityModel(ref s) if s == "egm96"));
    }

    #[test]
    fn test_display_roundtrips_name() {
        for m in [GravityModel::Wgs72Old, GravityModel::Wgs72, GravityModel::Wgs84] {
            assert_eq!(m.to_string().parse::<GravityModel>().unwrap(), m);
        }
    }
}
