//! Typed contents of each constants pack.
//!
//! Field names mirror the TOML tables in `sign_core/packs/`.

use serde::{Deserialize, Serialize};

use crate::site::Exposure;

/// `exposure` pack: velocity pressure and sign force constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposurePack {
    pub velocity_pressure: VelocityPressure,
    pub force: ForceFactors,
    pub load_factors: LoadFactors,
    pub terrain: TerrainTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityPressure {
    /// 0.00256 in qz = 0.00256 Kz Kzt Kd Ke V²
    pub coefficient: f64,
    /// Wind directionality factor
    pub kd: f64,
    /// Topographic factor
    pub kzt: f64,
    /// Ground elevation factor
    pub ke: f64,
    /// Kz is not reduced below the value at this height
    pub kz_min_height_ft: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceFactors {
    pub gust_factor: f64,
    pub force_coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadFactors {
    pub wind: f64,
    pub dead: f64,
    pub snow_companion: f64,
}

/// Power-law terrain parameters for one exposure category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    pub alpha: f64,
    pub zg_ft: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainTable {
    #[serde(rename = "B")]
    pub b: Terrain,
    #[serde(rename = "C")]
    pub c: Terrain,
    #[serde(rename = "D")]
    pub d: Terrain,
}

impl TerrainTable {
    pub fn get(&self, exposure: Exposure) -> Terrain {
        match exposure {
            Exposure::B => self.b,
            Exposure::C => self.c,
            Exposure::D => self.d,
        }
    }
}

impl ExposurePack {
    /// Velocity pressure exposure coefficient Kz at height `z_ft`.
    ///
    /// Kz = 2.01 (z / zg)^(2/α), with z held at `kz_min_height_ft` near grade.
    pub fn kz(&self, exposure: Exposure, z_ft: f64) -> f64 {
        let terrain = self.terrain.get(exposure);
        let z = z_ft.max(self.velocity_pressure.kz_min_height_ft);
        2.01 * (z / terrain.zg_ft).powf(2.0 / terrain.alpha)
    }

    /// Velocity pressure qz in psf
    pub fn velocity_pressure_psf(&self, exposure: Exposure, z_ft: f64, wind_speed_mph: f64) -> f64 {
        let vp = &self.velocity_pressure;
        vp.coefficient * self.kz(exposure, z_ft) * vp.kzt * vp.kd * vp.ke * wind_speed_mph.powi(2)
    }
}

/// `support` pack: pole strength, stiffness and material rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportPack {
    pub strength: SupportStrength,
    pub stiffness: SupportStiffness,
    pub limits: SupportLimits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportStrength {
    pub phi_bending: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportStiffness {
    pub e_steel_ksi: f64,
    pub e_aluminum_ksi: f64,
    /// Allowable tip deflection is H / deflection_ratio
    pub deflection_ratio: f64,
    /// Multiplier taking ultimate wind demand to service level
    pub service_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportLimits {
    pub aluminum_max_height_ft: f64,
    pub height_warning_ft: f64,
}

/// `footing` pack: direct burial embedment calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootingPack {
    pub embedment: Embedment,
    pub layout: FootingLayout,
    pub concrete: FootingConcrete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedment {
    pub coefficient: f64,
    pub calibration_factor: f64,
    pub min_depth_ft: f64,
    pub review_depth_ft: f64,
    /// Depth/diameter above which the post is no longer treated as rigid
    pub max_depth_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootingLayout {
    /// Largest support count a request may split the moment across
    pub max_supports: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootingConcrete {
    pub cubic_feet_per_yard: f64,
}

/// `baseplate` pack: plate, weld and anchor design factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseplatePack {
    pub plate: PlateFactors,
    pub weld: WeldFactors,
    pub anchor: AnchorFactors,
    pub concrete: BearingFactors,
    pub interaction: InteractionRule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateFactors {
    pub phi_bending: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeldFactors {
    pub electrode_ksi: f64,
    pub phi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorFactors {
    pub phi_steel_tension: f64,
    pub phi_steel_shear: f64,
    /// Effective tensile area as a fraction of gross bolt area
    pub tension_area_ratio: f64,
    /// Steel shear strength as a fraction of tensile strength
    pub shear_strength_ratio: f64,
    pub breakout_kc: f64,
    pub phi_breakout: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BearingFactors {
    pub fc_psi: f64,
    pub phi_bearing: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRule {
    /// The exponent is stored as a ratio so 5/3 stays exact
    pub exponent_numerator: f64,
    pub exponent_denominator: f64,
    pub limit: f64,
}

impl InteractionRule {
    pub fn exponent(&self) -> f64 {
        self.exponent_numerator / self.exponent_denominator
    }
}
