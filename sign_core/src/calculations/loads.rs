//! # Load Derivation
//!
//! Turns cabinet geometry and site wind/snow data into the design demand at
//! the base of the sign structure.
//!
//! ## Method
//!
//! - Cabinets are listed top-down. The first cabinet's top edge sits at the
//!   overall structure height and each following cabinet hangs directly below.
//! - Projected area A = Σ wᵢhᵢ; centroid z̄ = Σ(Aᵢzᵢ) / A, measured from grade.
//! - Velocity pressure qz = 0.00256 Kz Kzt Kd Ke V² at z̄ (ASCE 7-16 Eq. 26.10-1).
//! - Wind force F = qz G Cf A (ASCE 7-16 Eq. 29.3-1).
//! - Ultimate moment Mu = γw F z̄, shear Vu = γw F.
//! - Factored axial Pu = 1.2 D + 0.5 S, with S the snow on the top cabinet.
//!
//! ## Example
//!
//! ```rust
//! use sign_core::calculations::loads::{derive_loads, Cabinet, CabinetGeometry, LoadInput};
//! use sign_core::constants::ConstantsSet;
//! use sign_core::site::{Exposure, SiteEnvironmental};
//!
//! let input = LoadInput {
//!     geometry: CabinetGeometry {
//!         overall_height_ft: 25.0,
//!         cabinets: vec![Cabinet::new(14.0, 8.0, 10.0)],
//!     },
//!     site: SiteEnvironmental::manual(115.0, Exposure::C),
//! };
//! let constants = ConstantsSet::builtin().unwrap();
//! let envelope = derive_loads(&input, &constants);
//! let loads = envelope.result.unwrap();
//! assert_eq!(loads.area_ft2, 112.0);
//! assert_eq!(loads.centroid_height_ft, 21.0);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{require_non_negative, require_positive};
use crate::constants::ConstantsSet;
use crate::envelope::{Envelope, EnvelopeBuilder, NoteKind, Solver};
use crate::errors::{CalcError, CalcResult};
use crate::site::{SiteEnvironmental, SiteSource};
use crate::units::{Inches, Feet, Kips, Pounds};

/// Roof depth assumed for snow when a cabinet doesn't state one
const DEFAULT_CABINET_DEPTH_IN: f64 = 12.0;

/// One sign cabinet face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cabinet {
    /// Face width in feet
    pub width_ft: f64,

    /// Face height in feet
    pub height_ft: f64,

    /// Dead load per unit face area (psf)
    pub weight_psf: f64,

    /// Cabinet depth in inches, used for snow on the roof
    #[serde(default)]
    pub depth_in: Option<f64>,
}

impl Cabinet {
    pub fn new(width_ft: f64, height_ft: f64, weight_psf: f64) -> Self {
        Cabinet {
            width_ft,
            height_ft,
            weight_psf,
            depth_in: None,
        }
    }

    pub fn area_ft2(&self) -> f64 {
        self.width_ft * self.height_ft
    }
}

/// Stacked cabinets on one structure.
///
/// Order matters: cabinets are listed from the top down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CabinetGeometry {
    /// Height from grade to the top of the uppermost cabinet (ft)
    pub overall_height_ft: f64,
    pub cabinets: Vec<Cabinet>,
}

impl CabinetGeometry {
    /// Height of the stacked cabinets
    pub fn stack_height_ft(&self) -> f64 {
        self.cabinets.iter().map(|c| c.height_ft).sum()
    }

    /// Mid-height of each cabinet above grade, in listed order
    pub fn cabinet_centers_ft(&self) -> Vec<f64> {
        let mut top = self.overall_height_ft;
        self.cabinets
            .iter()
            .map(|c| {
                let center = top - c.height_ft / 2.0;
                top -= c.height_ft;
                center
            })
            .collect()
    }

    pub fn validate(&self) -> CalcResult<()> {
        require_positive("overall_height_ft", self.overall_height_ft, "Overall height must be positive")?;
        if self.cabinets.is_empty() {
            return Err(CalcError::missing_field("cabinets"));
        }
        for (i, cabinet) in self.cabinets.iter().enumerate() {
            require_positive(&format!("cabinets[{}].width_ft", i), cabinet.width_ft, "Cabinet width must be positive")?;
            require_positive(&format!("cabinets[{}].height_ft", i), cabinet.height_ft, "Cabinet height must be positive")?;
            require_non_negative(&format!("cabinets[{}].weight_psf", i), cabinet.weight_psf, "Cabinet weight cannot be negative")?;
            if let Some(depth) = cabinet.depth_in {
                require_positive(&format!("cabinets[{}].depth_in", i), depth, "Cabinet depth must be positive")?;
            }
        }
        let stack = self.stack_height_ft();
        if stack > self.overall_height_ft + 1e-9 {
            return Err(CalcError::invalid_input(
                "cabinets",
                format!("{} ft", stack),
                format!("Stacked cabinet height exceeds overall height {} ft", self.overall_height_ft),
            ));
        }
        Ok(())
    }
}

/// Input for load derivation.
///
/// ## JSON Example
///
/// ```json
/// {
///   "overall_height_ft": 25.0,
///   "cabinets": [
///     { "width_ft": 14.0, "height_ft": 8.0, "weight_psf": 10.0 }
///   ],
///   "site": { "wind_speed_mph": 115.0, "exposure": "C", "snow_load_psf": 20.0 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadInput {
    #[serde(flatten)]
    pub geometry: CabinetGeometry,
    pub site: SiteEnvironmental,
}

impl LoadInput {
    pub fn validate(&self) -> CalcResult<()> {
        self.geometry.validate()?;
        let wind = self
            .site
            .wind_speed_mph
            .ok_or_else(|| CalcError::missing_field("site.wind_speed_mph"))?;
        require_positive("site.wind_speed_mph", wind, "Wind speed must be positive")?;
        if self.site.exposure.is_none() {
            return Err(CalcError::missing_field("site.exposure"));
        }
        if let Some(snow) = self.site.snow_load_psf {
            require_non_negative("site.snow_load_psf", snow, "Snow load cannot be negative")?;
        }
        if !(0.0..=1.0).contains(&self.site.confidence) {
            return Err(CalcError::invalid_input(
                "site.confidence",
                self.site.confidence.to_string(),
                "Confidence must be between 0 and 1",
            ));
        }
        Ok(())
    }
}

/// Design loads at the base of the structure.
///
/// ## JSON Example
///
/// ```json
/// {
///   "area_ft2": 112.0,
///   "centroid_height_ft": 21.0,
///   "weight_lb": 1120.0,
///   "kz": 0.911,
///   "velocity_pressure_psf": 26.2,
///   "wind_force_lb": 2995.7,
///   "moment_kipft": 62.9,
///   "shear_kip": 3.0,
///   "axial_kip": 1.34
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadDerivation {
    /// Total projected area (ft²)
    pub area_ft2: f64,

    /// Area-weighted centroid above grade (ft)
    pub centroid_height_ft: f64,

    /// Cabinet dead load (lb)
    pub weight_lb: f64,

    /// Snow on the top cabinet (lb)
    pub snow_lb: f64,

    /// Velocity pressure exposure coefficient at the centroid
    pub kz: f64,

    /// Velocity pressure qz at the centroid (psf)
    pub velocity_pressure_psf: f64,

    /// Unfactored wind force on the faces (lb)
    pub wind_force_lb: f64,

    /// Ultimate overturning moment at grade (kip-ft)
    pub moment_kipft: f64,

    /// Ultimate base shear (kip)
    pub shear_kip: f64,

    /// Factored gravity load (kip)
    pub axial_kip: f64,
}

/// Derive design loads. Pure; the envelope wrapper is [`derive_loads`].
pub fn calculate(input: &LoadInput, constants: &ConstantsSet) -> CalcResult<LoadDerivation> {
    input.validate()?;

    let pack = &constants.exposure.data;
    let geometry = &input.geometry;
    let wind_speed = input
        .site
        .wind_speed_mph
        .ok_or_else(|| CalcError::missing_field("site.wind_speed_mph"))?;
    let exposure = input
        .site
        .exposure
        .ok_or_else(|| CalcError::missing_field("site.exposure"))?;

    let centers = geometry.cabinet_centers_ft();
    let area_ft2: f64 = geometry.cabinets.iter().map(Cabinet::area_ft2).sum();
    let first_moment: f64 = geometry
        .cabinets
        .iter()
        .zip(&centers)
        .map(|(c, z)| c.area_ft2() * z)
        .sum();
    let centroid_height_ft = first_moment / area_ft2;

    let weight_lb: f64 = geometry.cabinets.iter().map(|c| c.area_ft2() * c.weight_psf).sum();

    let snow_lb = match (input.site.snow_load_psf, geometry.cabinets.first()) {
        (Some(snow_psf), Some(top)) => {
            let depth: Feet = Inches(top.depth_in.unwrap_or(DEFAULT_CABINET_DEPTH_IN)).into();
            snow_psf * top.width_ft * depth.0
        }
        _ => 0.0,
    };

    let kz = pack.kz(exposure, centroid_height_ft);
    let velocity_pressure_psf = pack.velocity_pressure_psf(exposure, centroid_height_ft, wind_speed);
    let wind_force_lb = velocity_pressure_psf * pack.force.gust_factor * pack.force.force_coefficient * area_ft2;

    let factors = &pack.load_factors;
    let shear: Kips = Pounds(factors.wind * wind_force_lb).into();
    let axial: Kips = Pounds(factors.dead * weight_lb + factors.snow_companion * snow_lb).into();

    Ok(LoadDerivation {
        area_ft2,
        centroid_height_ft,
        weight_lb,
        snow_lb,
        kz,
        velocity_pressure_psf,
        wind_force_lb,
        moment_kipft: shear.0 * centroid_height_ft,
        shear_kip: shear.0,
        axial_kip: axial.0,
    })
}

/// Derive design loads and wrap them in an audit envelope.
pub fn derive_loads(input: &LoadInput, constants: &ConstantsSet) -> Envelope<LoadDerivation> {
    let mut env = EnvelopeBuilder::new(Solver::LoadDerivation, input);
    env.pack(&constants.exposure.meta).pack(&constants.support.meta);

    let result = match calculate(input, constants) {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "load derivation rejected input");
            return env.invalid(&e);
        }
    };

    let site = &input.site;
    if site.confidence < 1.0 || site.source != SiteSource::Manual {
        env.base_confidence(site.confidence);
        env.notes.push(
            NoteKind::Upstream,
            format!("Site data source: {:?} (confidence {:.2})", site.source, site.confidence),
        );
    }
    if site.source == SiteSource::Default {
        env.notes.warning("default wind data used because site lookup failed");
    }

    let pack = &constants.exposure.data;
    env.notes.info(format!(
        "{} cabinet(s) stacked top-down from overall height {:.2} ft",
        input.geometry.cabinets.len(),
        input.geometry.overall_height_ft
    ));
    env.notes.info(format!(
        "Velocity pressure evaluated at centroid z = {:.2} ft: Kz = {:.3}, qz = {:.2} psf",
        result.centroid_height_ft, result.kz, result.velocity_pressure_psf
    ));
    env.notes.info(format!(
        "Gust factor G = {}, force coefficient Cf = {}",
        pack.force.gust_factor, pack.force.force_coefficient
    ));
    if result.snow_lb > 0.0 {
        env.notes.info(format!(
            "Snow on top cabinet roof {:.0} lb, combined as {}D + {}S",
            result.snow_lb, pack.load_factors.dead, pack.load_factors.snow_companion
        ));
    }

    let limit = constants.support.data.limits.height_warning_ft;
    if input.geometry.overall_height_ft > limit {
        env.notes.warning(format!(
            "overall height {:.1} ft exceeds {:.0} ft; verify pole slenderness",
            input.geometry.overall_height_ft, limit
        ));
    }

    debug!(
        area_ft2 = result.area_ft2,
        centroid_ft = result.centroid_height_ft,
        moment_kipft = result.moment_kipft,
        shear_kip = result.shear_kip,
        "loads derived"
    );
    env.solved(result)
}
