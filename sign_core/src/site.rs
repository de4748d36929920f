//! # Site Environmental Data
//!
//! Wind and snow data for a sign location. Resolved outside this crate (by a
//! geocoding / wind-map service or by hand) and consumed read-only by load
//! derivation. Fields are optional here because the resolver can come back
//! incomplete; load derivation refuses to run without wind speed and exposure.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CalcError;

/// Wind exposure category per ASCE 7 Section 26.7
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Exposure {
    /// Urban and suburban areas, wooded terrain
    B,
    /// Open terrain with scattered obstructions
    C,
    /// Flat unobstructed areas and water surfaces
    D,
}

impl fmt::Display for Exposure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Exposure::B => "B",
            Exposure::C => "C",
            Exposure::D => "D",
        };
        write!(f, "{}", code)
    }
}

impl FromStr for Exposure {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "B" => Ok(Exposure::B),
            "C" => Ok(Exposure::C),
            "D" => Ok(Exposure::D),
            other => Err(CalcError::invalid_input("exposure", other, "Exposure must be B, C or D")),
        }
    }
}

/// Where the site data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteSource {
    /// Looked up from the wind map for the geocoded address
    Geocoded,
    /// Entered by the engineer
    Manual,
    /// Fallback values used because lookup failed
    Default,
}

/// Wind and snow data for one site.
///
/// ## JSON Example
///
/// ```json
/// {
///   "wind_speed_mph": 115.0,
///   "snow_load_psf": 20.0,
///   "exposure": "C",
///   "source": "geocoded",
///   "confidence": 0.95
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteEnvironmental {
    /// Basic (ultimate) wind speed in mph
    pub wind_speed_mph: Option<f64>,

    /// Ground snow load in psf
    #[serde(default)]
    pub snow_load_psf: Option<f64>,

    /// Exposure category
    pub exposure: Option<Exposure>,

    #[serde(default = "default_source")]
    pub source: SiteSource,

    /// Resolver's own confidence in [0, 1]
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_source() -> SiteSource {
    SiteSource::Manual
}

fn default_confidence() -> f64 {
    1.0
}

impl SiteEnvironmental {
    /// Fully specified, engineer-entered site data
    pub fn manual(wind_speed_mph: f64, exposure: Exposure) -> Self {
        SiteEnvironmental {
            wind_speed_mph: Some(wind_speed_mph),
            snow_load_psf: None,
            exposure: Some(exposure),
            source: SiteSource::Manual,
            confidence: 1.0,
        }
    }

    pub fn with_snow(mut self, snow_load_psf: f64) -> Self {
        self.snow_load_psf = Some(snow_load_psf);
        self
    }

    pub fn with_source(mut self, source: SiteSource, confidence: f64) -> Self {
        self.source = source;
        self.confidence = confidence;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exposure_parse() {
        assert_eq!("c".parse::<Exposure>().unwrap(), Exposure::C);
        assert_eq!(" D ".parse::<Exposure>().unwrap(), Exposure::D);
        assert!("E".parse::<Exposure>().is_err());
    }

    #[test]
    fn test_site_defaults_from_json() {
        let json = r#"{ "wind_speed_mph": 110.0, "exposure": "B" }"#;
        let site: SiteEnvironmental = serde_json::from_str(json).unwrap();
        assert_eq!(site.source, SiteSource::Manual);
        assert_eq!(site.confidence, 1.0);
        assert_eq!(site.snow_load_psf, None);
    }

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let json = r#"{ "wind_speed_mph": null, "exposure": null, "source": "default", "confidence": 0.6 }"#;
        let site: SiteEnvironmental = serde_json::from_str(json).unwrap();
        assert!(site.wind_speed_mph.is_none());
        assert!(site.exposure.is_none());
        assert_eq!(site.source, SiteSource::Default);
    }
}
