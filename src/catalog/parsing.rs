use serde::Deserialize;
use sgp4::Elements;
use std::f64::consts::PI;

use crate::catalog::error::CatalogError;
use crate::catalog::types::{Source, TleRecord};

/// Earth's gravitational parameter (km^3/s^2)
pub const EARTH_MU_KM3_S2: f64 = 398_600.4418;
pub const EARTH_MEAN_RADIUS_KM: f64 = 6371.0;

pub const TLE_LINE_LENGTH: usize = 69;

/// Plain-text body the catalog returns instead of JSON for unknown ids.
pub const NOT_FOUND_SENTINEL: &str = "No GP data found";

/// One element set as returned by the catalog's JSON format.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "OBJECT_NAME")]
    pub object_name: Option<String>,
    #[serde(rename = "NORAD_CAT_ID")]
    pub norad_cat_id: Option<CatalogNumber>,
    #[serde(rename = "OBJECT_ID")]
    pub object_id: Option<String>,
    #[serde(rename = "TLE_LINE1")]
    pub line1: String,
    #[serde(rename = "TLE_LINE2")]
    pub line2: String,
    #[serde(rename = "EPOCH")]
    pub epoch: Option<String>,
    #[serde(rename = "INTLDES")]
    pub intldes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CatalogNumber {
    Number(u64),
    Text(String),
}

impl CatalogNumber {
    fn as_string(&self) -> String {
        match self {
            CatalogNumber::Number(n) => n.to_string(),
            CatalogNumber::Text(s) => s.trim().to_string(),
        }
    }
}

impl CatalogEntry {
    /// Identifier used in diagnostics before the lines are known to be valid.
    pub fn label(&self) -> String {
        self.norad_cat_id
            .as_ref()
            .map(CatalogNumber::as_string)
            .or_else(|| self.object_id.clone())
            .or_else(|| self.object_name.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn into_record(self) -> Result<TleRecord, CatalogError> {
        let label = self.label();
        let mut record = parse_tle(
            self.object_name.map(|n| n.trim().to_string()),
            &self.line1,
            &self.line2,
        )
        .map_err(|e| match e {
            CatalogError::InvalidTle { message, .. } => CatalogError::InvalidTle { id: label, message },
            other => other,
        })?;

        // the catalog's own designator wins over the one decoded from line 1
        if let Some(designator) = self.intldes.or(self.object_id).filter(|d| !d.trim().is_empty()) {
            record.international_designator = Some(designator.trim().to_string());
        }
        Ok(record)
    }
}

/// Split a catalog response body into entries, recognizing the not-found
/// sentinel before attempting to parse JSON.
pub fn parse_catalog_response(body: &str, query: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
    let body = body.trim();
    if body.starts_with(NOT_FOUND_SENTINEL) {
        return Err(CatalogError::NotFound(query.to_string()));
    }
    if !body.starts_with('[') {
        let snippet: String = body.chars().take(60).collect();
        return Err(CatalogError::InvalidResponse(format!(
            "expected JSON array for {}, got {:?}",
            query, snippet
        )));
    }

    serde_json::from_str(body)
        .map_err(|e| CatalogError::InvalidResponse(format!("{}: {}", query, e)))
}

/// Parse a 2-line or 3-line (named) TLE text block.
pub fn parse_tle_lines(tle: &str) -> Result<(Option<String>, String, String), CatalogError> {
    let lines: Vec<String> = tle
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    match lines.len() {
        2 => Ok((None, lines[0].clone(), lines[1].clone())),
        3 => Ok((Some(lines[0].clone()), lines[1].clone(), lines[2].clone())),
        n => Err(CatalogError::InvalidTle {
            id: "unknown".to_string(),
            message: format!("expected 2 or 3 lines, got {}", n),
        }),
    }
}

/// Build a [`TleRecord`] from raw element lines, rejecting anything that is
/// not well-formed fixed-column TLE.
pub fn parse_tle(name: Option<String>, line1: &str, line2: &str) -> Result<TleRecord, CatalogError> {
    let line1 = line1.trim_end();
    let line2 = line2.trim_end();
    let id = line1.get(2..7).map(|s| s.trim().to_string()).unwrap_or_default();
    let invalid = |message: String| CatalogError::InvalidTle {
        id: if id.is_empty() { "unknown".to_string() } else { id.clone() },
        message,
    };

    validate_line(line1, '1').map_err(&invalid)?;
    validate_line(line2, '2').map_err(&invalid)?;
    if line1[2..7] != line2[2..7] {
        return Err(invalid(format!(
            "catalog numbers differ ({} vs {})",
            &line1[2..7],
            &line2[2..7]
        )));
    }

    let elements = Elements::from_tle(name.clone(), line1.as_bytes(), line2.as_bytes())
        .map_err(|e| invalid(e.to_string()))?;

    if !(0.0..1.0).contains(&elements.eccentricity) || elements.mean_motion <= 0.0 {
        return Err(invalid(format!(
            "elements out of range (e={}, n={})",
            elements.eccentricity, elements.mean_motion
        )));
    }

    let name = name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("NORAD {}", elements.norad_id));

    Ok(TleRecord {
        norad_id: elements.norad_id,
        name,
        international_designator: elements.international_designator.clone(),
        line1: line1.to_string(),
        line2: line2.to_string(),
        epoch: elements.datetime.and_utc(),
        mean_motion: elements.mean_motion,
        eccentricity: elements.eccentricity,
        inclination_deg: elements.inclination,
        raan_deg: elements.right_ascension,
        arg_perigee_deg: elements.argument_of_perigee,
        mean_anomaly_deg: elements.mean_anomaly,
        altitude_km: derive_altitude_km(elements.mean_motion),
        period_minutes: derive_period_minutes(elements.mean_motion),
        source: Source::Live,
    })
}

fn validate_line(line: &str, number: char) -> Result<(), String> {
    if !line.is_ascii() {
        return Err(format!("line {} contains non-ASCII characters", number));
    }
    if line.len() != TLE_LINE_LENGTH {
        return Err(format!(
            "line {} has {} columns, expected {}",
            number,
            line.len(),
            TLE_LINE_LENGTH
        ));
    }
    if !line.starts_with(number) || line.as_bytes()[1] != b' ' {
        return Err(format!("line {} does not start with \"{} \"", number, number));
    }

    let expected = checksum(line);
    let actual = line.as_bytes()[TLE_LINE_LENGTH - 1];
    if !actual.is_ascii_digit() || (actual - b'0') as u32 != expected {
        return Err(format!(
            "line {} checksum mismatch (expected {}, found {})",
            number, expected, actual as char
        ));
    }
    Ok(())
}

/// Modulo-10 checksum over the first 68 columns: digits count their value,
/// minus signs count one.
pub fn checksum(line: &str) -> u32 {
    line.bytes()
        .take(TLE_LINE_LENGTH - 1)
        .map(|b| match b {
            b'0'..=b'9' => (b - b'0') as u32,
            b'-' => 1,
            _ => 0,
        })
        .sum::<u32>()
        % 10
}

/// Semi-major axis from mean motion (Kepler's third law).
pub fn semi_major_axis_km(mean_motion_rev_day: f64) -> f64 {
    let n_rad_s = mean_motion_rev_day * 2.0 * PI / 86_400.0;
    (EARTH_MU_KM3_S2 / (n_rad_s * n_rad_s)).cbrt()
}

pub fn derive_altitude_km(mean_motion_rev_day: f64) -> f64 {
    semi_major_axis_km(mean_motion_rev_day) - EARTH_MEAN_RADIUS_KM
}

pub fn derive_period_minutes(mean_motion_rev_day: f64) -> f64 {
    let n_rad_min = mean_motion_rev_day * 2.0 * PI / 1440.0;
    2.0 * PI / n_rad_min
}
