//! Two-Line Element (TLE) set parser.
//!
//! Parses standard NORAD/Space-Track TLE format (2-line and 3-line with name)
//! and converts records to the [`MeanElementSet`] the propagator consumes.
//!
//! # TLE Format Reference
//! ```text
//! Line 0 (optional): Satellite Name (up to 24 chars)
//! Line 1: 1 NNNNNC NNNNNAAA NNNNN.NNNNNNNN +.NNNNNNNN +NNNNN-N +NNNNN-N N NNNNN
//! Line 2: 2 NNNNN NNN.NNNN NNN.NNNN NNNNNNN NNN.NNNN NNN.NNNN NN.NNNNNNNNNNNNNN
//! ```
//!
//! # Example
//! ```
//! use norad_sgp4::tle::Tle;
//!
//! let line1 = "1 25544U 98067A   09161.51089941  .00015706  00000-0  11388-3 0  1124";
//! let line2 = "2 25544  51.6406 341.1646 0009228  98.8703 312.6668 15.73580432604904";
//!
//! let tle = Tle::parse(line1, line2).unwrap();
//! assert_eq!(tle.satnum, 25544);
//! let elements = tle.to_elements();
//! assert!(elements.period_minutes() < 225.0);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::elements::MeanElementSet;
use crate::julian;

/// TLE parsing errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TleError {
    #[error("Line 1 must start with '1', got '{0}'")]
    InvalidLine1Start(char),

    #[error("Line 2 must start with '2', got '{0}'")]
    InvalidLine2Start(char),

    #[error("Line 1 length must be 69 characters, got {0}")]
    InvalidLine1Length(usize),

    #[error("Line 2 length must be 69 characters, got {0}")]
    InvalidLine2Length(usize),

    #[error("Catalog numbers don't match between lines: {0} vs {1}")]
    SatnumMismatch(u32, u32),

    #[error("Invalid catalog number '{0}'")]
    InvalidSatnum(String),

    #[error("Checksum failed on line {line}: expected {expected}, computed {computed}")]
    ChecksumFailed {
        line: u8,
        expected: u8,
        computed: u8,
    },

    #[error("Failed to parse field '{field}': {source}")]
    ParseField {
        field: &'static str,
        source: std::num::ParseFloatError,
    },

    #[error("Failed to parse integer field '{field}': {source}")]
    ParseIntField {
        field: &'static str,
        source: std::num::ParseIntError,
    },

    #[error("Failed to parse implied-decimal field '{0}'")]
    ImpliedDecimal(String),

    #[error("No TLEs found in input")]
    Empty,
}

/// A parsed Two-Line Element set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tle {
    /// Satellite name (from line 0, if present).
    pub name: Option<String>,
    /// Catalog number, Alpha-5 decoded.
    pub satnum: u32,
    /// International designator (launch year, launch number, piece).
    pub intl_designator: String,
    /// Classification (U=unclassified, C=classified, S=secret).
    pub classification: char,
    /// Epoch year (full 4-digit year).
    pub epoch_year: i32,
    /// Epoch day of year (fractional, 1.0 = January 1 00:00 UT).
    pub epoch_day: f64,
    /// First derivative of mean motion (rev/day²) / 2.
    pub mean_motion_dot: f64,
    /// Second derivative of mean motion (rev/day³) / 6.
    pub mean_motion_ddot: f64,
    /// B* drag term (1/Earth radii).
    pub bstar: f64,
    /// Ephemeris type (usually 0).
    pub ephemeris_type: u8,
    /// Element set number.
    pub element_set: u16,
    /// Inclination (degrees).
    pub inclination_deg: f64,
    /// Right ascension of ascending node (degrees).
    pub raan_deg: f64,
    /// Eccentricity (dimensionless).
    pub eccentricity: f64,
    /// Argument of perigee (degrees).
    pub arg_perigee_deg: f64,
    /// Mean anomaly (degrees).
    pub mean_anomaly_deg: f64,
    /// Mean motion (revolutions per day).
    pub mean_motion_rev_day: f64,
    /// Revolution number at epoch.
    pub rev_number: u32,
}

impl Tle {
    /// Parse a TLE from two lines (without satellite name).
    pub fn parse(line1: &str, line2: &str) -> Result<Self, TleError> {
        Self::parse_with_name(None, line1, line2)
    }

    /// Parse a TLE from three lines (with satellite name on line 0).
    pub fn parse_3line(line0: &str, line1: &str, line2: &str) -> Result<Self, TleError> {
        let name = line0.trim().trim_start_matches("0 ").to_string();
        Self::parse_with_name(Some(name), line1, line2)
    }

    fn parse_with_name(name: Option<String>, line1: &str, line2: &str) -> Result<Self, TleError> {
        let line1 = line1.trim_end();
        let line2 = line2.trim_end();

        // The checksum column is required; longer lines are cut at column 69.
        if !line1.is_ascii() || line1.len() < 69 {
            return Err(TleError::InvalidLine1Length(line1.len()));
        }
        if !line2.is_ascii() || line2.len() < 69 {
            return Err(TleError::InvalidLine2Length(line2.len()));
        }
        let l1 = &line1[..69];
        let l2 = &line2[..69];

        let c1 = l1.as_bytes()[0] as char;
        let c2 = l2.as_bytes()[0] as char;
        if c1 != '1' {
            return Err(TleError::InvalidLine1Start(c1));
        }
        if c2 != '2' {
            return Err(TleError::InvalidLine2Start(c2));
        }

        verify_checksum(1, l1)?;
        verify_checksum(2, l2)?;

        // ── Line 1 ──
        let satnum_1 = parse_satnum(&l1[2..7])?;
        let classification = l1.as_bytes()[7] as char;
        let intl_designator = l1[9..17].trim().to_string();

        let epoch_year_2d = l1[18..20].trim().parse::<i32>().map_err(|e| TleError::ParseIntField {
            field: "epoch_year",
            source: e,
        })?;
        let epoch_year = if epoch_year_2d >= 57 {
            1900 + epoch_year_2d
        } else {
            2000 + epoch_year_2d
        };

        let epoch_day = parse_f64(&l1[20..32], "epoch_day")?;
        let mean_motion_dot = parse_f64(&l1[33..43], "mean_motion_dot")?;
        let mean_motion_ddot = parse_implied_decimal(&l1[44..52])?;
        let bstar = parse_implied_decimal(&l1[53..61])?;

        let ephemeris_type = l1[62..63].trim().parse::<u8>().unwrap_or(0);
        let element_set = l1[64..68].trim().parse::<u16>().unwrap_or(0);

        // ── Line 2 ──
        let satnum_2 = parse_satnum(&l2[2..7])?;
        if satnum_1 != satnum_2 {
            return Err(TleError::SatnumMismatch(satnum_1, satnum_2));
        }

        let inclination_deg = parse_f64(&l2[8..16], "inclination")?;
        let raan_deg = parse_f64(&l2[17..25], "raan")?;
        // Implied leading decimal point
        let eccentricity = parse_f64(&format!("0.{}", l2[26..33].trim()), "eccentricity")?;
        let arg_perigee_deg = parse_f64(&l2[34..42], "arg_perigee")?;
        let mean_anomaly_deg = parse_f64(&l2[43..51], "mean_anomaly")?;
        let mean_motion_rev_day = parse_f64(&l2[52..63], "mean_motion")?;
        let rev_number = l2[63..68].trim().parse::<u32>().unwrap_or(0);

        Ok(Tle {
            name,
            satnum: satnum_1,
            intl_designator,
            classification,
            epoch_year,
            epoch_day,
            mean_motion_dot,
            mean_motion_ddot,
            bstar,
            ephemeris_type,
            element_set,
            inclination_deg,
            raan_deg,
            eccentricity,
            arg_perigee_deg,
            mean_anomaly_deg,
            mean_motion_rev_day,
            rev_number,
        })
    }

    /// Parse a string containing multiple TLEs (2-line or 3-line format).
    ///
    /// Handles mixed formats: lines starting with '1' begin a 2-line TLE,
    /// and the non-empty line directly before a line pair is its name
    /// (line 0). Any other line is skipped.
    pub fn parse_batch(input: &str) -> Result<Vec<Self>, TleError> {
        let lines: Vec<&str> = input
            .lines()
            .map(|l| l.trim_end())
            .filter(|l| !l.is_empty())
            .collect();

        if lines.is_empty() {
            return Err(TleError::Empty);
        }

        let mut tles = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            if lines[i].starts_with('1') && i + 1 < lines.len() && lines[i + 1].starts_with('2') {
                tles.push(Tle::parse(lines[i], lines[i + 1])?);
                i += 2;
            } else if i + 2 < lines.len()
                && lines[i + 1].starts_with('1')
                && lines[i + 2].starts_with('2')
            {
                tles.push(Tle::parse_3line(lines[i], lines[i + 1], lines[i + 2])?);
                i += 3;
            } else {
                log::trace!("skipping unrecognized line {}: {:?}", i, lines[i]);
                i += 1;
            }
        }

        if tles.is_empty() {
            return Err(TleError::Empty);
        }

        Ok(tles)
    }

    /// Epoch as a split Julian date (UT), taken through the calendar.
    pub fn epoch_jd(&self) -> (f64, f64) {
        julian::epoch_to_jd(self.epoch_year, self.epoch_day)
    }

    /// Epoch in days since 1949 December 31 00:00 UT.
    pub fn epoch(&self) -> f64 {
        let (jd, fraction) = self.epoch_jd();
        julian::jd_to_epoch(jd, fraction)
    }

    /// Convert to the propagator's element set (radians, rad/min).
    pub fn to_elements(&self) -> MeanElementSet {
        MeanElementSet::from_catalog_units(
            self.satnum,
            self.epoch(),
            self.mean_motion_rev_day,
            self.eccentricity,
            self.inclination_deg,
            self.raan_deg,
            self.arg_perigee_deg,
            self.mean_anomaly_deg,
            self.bstar,
        )
    }
}

impl From<&Tle> for MeanElementSet {
    fn from(tle: &Tle) -> Self {
        tle.to_elements()
    }
}

impl std::fmt::Display for Tle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): epoch {}/{:.8}, {:.4} deg inc, {:.7} ecc, {:.8} rev/day",
            self.name.as_deref().unwrap_or("UNKNOWN"),
            self.satnum,
            self.epoch_year,
            self.epoch_day,
            self.inclination_deg,
            self.eccentricity,
            self.mean_motion_rev_day,
        )
    }
}

fn parse_f64(s: &str, field: &'static str) -> Result<f64, TleError> {
    s.trim()
        .parse::<f64>()
        .map_err(|e| TleError::ParseField { field, source: e })
}

/// Decode a 5-column catalog number, including the Alpha-5 form where a
/// leading letter (A..Z without I and O) stands for 10..33.
fn parse_satnum(s: &str) -> Result<u32, TleError> {
    let field = s.trim();
    let mut chars = field.chars();
    let lead = match chars.next() {
        Some(c) => c,
        None => return Err(TleError::InvalidSatnum(s.to_string())),
    };
    if lead.is_ascii_digit() {
        return field.parse::<u32>().map_err(|e| TleError::ParseIntField {
            field: "satnum",
            source: e,
        });
    }

    let upper = lead.to_ascii_uppercase();
    if !upper.is_ascii_uppercase() || upper == 'I' || upper == 'O' {
        return Err(TleError::InvalidSatnum(s.to_string()));
    }
    let mut prefix = upper as u32 - 'A' as u32 + 10;
    if upper > 'I' {
        prefix -= 1;
    }
    if upper > 'O' {
        prefix -= 1;
    }
    let rest = chars.as_str();
    if rest.len() != 4 || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TleError::InvalidSatnum(s.to_string()));
    }
    let tail = rest.parse::<u32>().map_err(|e| TleError::ParseIntField {
        field: "satnum",
        source: e,
    })?;
    Ok(prefix * 10_000 + tail)
}

/// Parse the TLE "implied decimal" format: " NNNNN-N" → float.
///
/// Examples: " 16538-4" → 0.16538e-4, "-11606-4" → -0.11606e-4
fn parse_implied_decimal(s: &str) -> Result<f64, TleError> {
    let s = s.trim();
    if s.is_empty() || s == "00000-0" || s == "00000+0" {
        return Ok(0.0);
    }

    // Last sign that isn't the leading one is the exponent
    let bytes = s.as_bytes();
    let exp_pos = (1..bytes.len())
        .rev()
        .find(|&i| bytes[i] == b'+' || bytes[i] == b'-');

    let (mantissa_str, exp_str) = match exp_pos {
        Some(pos) => (&s[..pos], &s[pos..]),
        None => (s, "+0"),
    };
    let sign = if mantissa_str.starts_with('-') { "-" } else { "" };
    let digits = mantissa_str.trim_start_matches(['+', '-', ' ']);

    format!("{}0.{}e{}", sign, digits, exp_str)
        .parse::<f64>()
        .map_err(|_| TleError::ImpliedDecimal(s.to_string()))
}

fn verify_checksum(line: u8, text: &str) -> Result<(), TleError> {
    let expected = parse_digit(text.as_bytes()[68]);
    let computed = compute_checksum(&text[..68]);
    if expected != computed {
        return Err(TleError::ChecksumFailed {
            line,
            expected,
            computed,
        });
    }
    Ok(())
}

/// Checksum column digit; anything else reads as 0.
fn parse_digit(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        _ => 0,
    }
}

/// Compute TLE checksum (mod-10 of sum of digits, '-' counts as 1).
fn compute_checksum(line: &str) -> u8 {
    let sum: u32 = line
        .bytes()
        .map(|b| match b {
            b'0'..=b'9' => (b - b'0') as u32,
            b'-' => 1,
            _ => 0,
        })
        .sum();
    (sum % 10) as u8
}
