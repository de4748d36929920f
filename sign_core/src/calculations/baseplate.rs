//! # Baseplate and Anchor Checks
//!
//! Independent checks of a pole baseplate connection. Each check reports a
//! pass flag and a margin (capacity ÷ demand, so below 1.0 fails):
//!
//! | Check | Basis |
//! |-------|-------|
//! | Plate bending | AISC Design Guide 1, cantilever c = (N − 0.95d)/2 |
//! | Weld strength | AISC 360-16 J2.4, weld as a line around the column |
//! | Anchor tension | ACI 318-19 17.6.1 steel and 17.6.2 breakout |
//! | Anchor shear | ACI 318-19 17.7.1 steel |
//! | Interaction | ACI 318-19 R17.8, (N/φNn)^(5/3) + (V/φVn)^(5/3) ≤ 1 |
//! | Concrete bearing | ACI 318-19 22.8, φ 0.85 f'c A on the compression half |
//!
//! The aggregate passes only when every check passes. A failing connection
//! comes back with the failed checks, sizing suggestions and the engineering
//! review flag set; no redesign is attempted.
//!
//! ## Anchor forces
//!
//! With n anchors in two or more rows at outer spacing s, half the anchors
//! resist the moment couple:
//!
//! ```text
//! Tu,anchor = T/n + M/(s · n/2)        Vu,anchor = V/n
//! ```

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{margin, require_non_negative, require_positive, MARGIN_CAP};
use crate::constants::{BaseplatePack, ConstantsSet};
use crate::envelope::{Envelope, EnvelopeBuilder, NoteKind, Solver};
use crate::errors::{CalcError, CalcResult};
use crate::units::{KipFt, KipIn, Ksi, Psi};

/// Plate, column footprint and weld.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateGeometry {
    /// Plate width B (in)
    pub width_in: f64,
    /// Plate length N, in the direction of the moment (in)
    pub length_in: f64,
    pub thickness_in: f64,
    #[serde(default = "default_plate_fy")]
    pub fy_ksi: f64,
    /// Outside dimension of the pole welded to the plate (in)
    pub column_size_in: f64,
    /// Fillet weld leg size (in)
    pub weld_size_in: f64,
    /// Electrode strength; the pack default applies when absent
    #[serde(default)]
    pub electrode_ksi: Option<f64>,
}

fn default_plate_fy() -> f64 {
    36.0
}

/// Anchor bolt pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorPattern {
    pub diameter_in: f64,
    /// Effective embedment hef (in)
    pub embedment_in: f64,
    /// Specified tensile strength futa (ksi)
    #[serde(default = "default_futa")]
    pub futa_ksi: f64,
    pub rows: u32,
    pub per_row: u32,
    /// Center-to-center distance between the outer rows (in)
    pub row_spacing_in: f64,
    /// Spacing between neighbouring anchors for breakout; defaults to row spacing
    #[serde(default)]
    pub spacing_in: Option<f64>,
}

fn default_futa() -> f64 {
    58.0 // F1554 Gr. 36
}

/// Largest anchor group the checks accept
pub const MAX_ANCHORS: u32 = 64;

impl AnchorPattern {
    /// Number of anchors; saturates rather than overflowing
    pub fn count(&self) -> u32 {
        self.rows.saturating_mul(self.per_row)
    }

    /// Gross bolt area (in²)
    pub fn area_in2(&self) -> f64 {
        PI * self.diameter_in.powi(2) / 4.0
    }
}

/// Factored loads at the base of the pole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseplateLoads {
    /// Net uplift (kip)
    #[serde(default)]
    pub tension_kip: f64,
    #[serde(default)]
    pub shear_kip: f64,
    #[serde(default)]
    pub moment_kipft: f64,
    /// Gravity load bearing on the concrete (kip)
    #[serde(default)]
    pub compression_kip: f64,
}

/// Input for the baseplate checks.
///
/// ## JSON Example
///
/// ```json
/// {
///   "plate": { "width_in": 18.0, "length_in": 18.0, "thickness_in": 1.0, "fy_ksi": 36.0,
///              "column_size_in": 8.0, "weld_size_in": 0.3125 },
///   "anchors": { "diameter_in": 1.0, "embedment_in": 18.0, "futa_ksi": 58.0,
///                "rows": 2, "per_row": 2, "row_spacing_in": 14.0 },
///   "loads": { "moment_kipft": 30.0, "shear_kip": 3.0, "compression_kip": 1.5 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePlateInput {
    pub plate: PlateGeometry,
    pub anchors: AnchorPattern,
    pub loads: BaseplateLoads,
    /// Concrete strength; the pack default applies when absent
    #[serde(default)]
    pub fc_psi: Option<f64>,
}

impl BasePlateInput {
    pub fn validate(&self) -> CalcResult<()> {
        let p = &self.plate;
        require_positive("plate.width_in", p.width_in, "Plate width must be positive")?;
        require_positive("plate.length_in", p.length_in, "Plate length must be positive")?;
        require_positive("plate.thickness_in", p.thickness_in, "Plate thickness must be positive")?;
        require_positive("plate.fy_ksi", p.fy_ksi, "Plate yield strength must be positive")?;
        require_positive("plate.column_size_in", p.column_size_in, "Column size must be positive")?;
        require_positive("plate.weld_size_in", p.weld_size_in, "Weld size must be positive")?;
        if let Some(fexx) = p.electrode_ksi {
            require_positive("plate.electrode_ksi", fexx, "Electrode strength must be positive")?;
        }
        if 0.95 * p.column_size_in >= p.length_in || p.column_size_in >= p.width_in {
            return Err(CalcError::invalid_input(
                "plate.column_size_in",
                p.column_size_in.to_string(),
                "Column must fit within the plate",
            ));
        }

        let a = &self.anchors;
        require_positive("anchors.diameter_in", a.diameter_in, "Anchor diameter must be positive")?;
        require_positive("anchors.embedment_in", a.embedment_in, "Anchor embedment must be positive")?;
        require_positive("anchors.futa_ksi", a.futa_ksi, "Anchor strength must be positive")?;
        require_positive("anchors.row_spacing_in", a.row_spacing_in, "Row spacing must be positive")?;
        if let Some(s) = a.spacing_in {
            require_positive("anchors.spacing_in", s, "Anchor spacing must be positive")?;
        }
        if a.rows < 2 || a.per_row == 0 {
            return Err(CalcError::invalid_input(
                "anchors.rows",
                format!("{} x {}", a.rows, a.per_row),
                "At least two rows of anchors are required to resist moment",
            ));
        }
        if a.count() > MAX_ANCHORS {
            return Err(CalcError::invalid_input(
                "anchors.per_row",
                format!("{} x {}", a.rows, a.per_row),
                format!("At most {} anchors per baseplate", MAX_ANCHORS),
            ));
        }
        if a.row_spacing_in >= p.length_in {
            return Err(CalcError::invalid_input(
                "anchors.row_spacing_in",
                a.row_spacing_in.to_string(),
                "Anchor rows must fall within the plate length",
            ));
        }

        let l = &self.loads;
        require_non_negative("loads.tension_kip", l.tension_kip, "Tension cannot be negative")?;
        require_non_negative("loads.shear_kip", l.shear_kip, "Shear cannot be negative")?;
        require_non_negative("loads.moment_kipft", l.moment_kipft, "Moment cannot be negative")?;
        require_non_negative("loads.compression_kip", l.compression_kip, "Compression cannot be negative")?;

        if let Some(fc) = self.fc_psi {
            require_positive("fc_psi", fc, "Concrete strength must be positive")?;
        }
        Ok(())
    }
}

/// The six baseplate checks, in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    PlateBending,
    WeldStrength,
    AnchorTension,
    AnchorShear,
    TensionShearInteraction,
    ConcreteBearing,
}

impl CheckName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::PlateBending => "plate_bending",
            CheckName::WeldStrength => "weld_strength",
            CheckName::AnchorTension => "anchor_tension",
            CheckName::AnchorShear => "anchor_shear",
            CheckName::TensionShearInteraction => "tension_shear_interaction",
            CheckName::ConcreteBearing => "concrete_bearing",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: CheckName,
    #[serde(rename = "pass")]
    pub passed: bool,
    /// Capacity ÷ demand
    pub margin: f64,
    pub demand: f64,
    pub capacity: f64,
    pub unit: String,
    /// Which limit state governs, where several are compared
    pub governing: Option<String>,
}

impl CheckResult {
    fn new(name: CheckName, demand: f64, capacity: f64, unit: &str) -> Self {
        CheckResult {
            name,
            passed: capacity >= demand,
            margin: margin(capacity, demand),
            demand,
            capacity,
            unit: unit.to_string(),
            governing: None,
        }
    }

    fn governed_by(mut self, limit_state: &str) -> Self {
        self.governing = Some(limit_state.to_string());
        self
    }
}

/// Solved checks.
///
/// ## JSON Example
///
/// ```json
/// {
///   "checks": [
///     { "name": "plate_bending", "pass": true, "margin": 1.12, "demand": 0.89, "capacity": 1.0,
///       "unit": "in", "governing": "tension side" }
///   ],
///   "aggregate_pass": false,
///   "suggestions": ["Increase anchor diameter to at least 1.125 in (currently 0.5 in)"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePlateSolution {
    pub checks: Vec<CheckResult>,
    pub aggregate_pass: bool,
    pub suggestions: Vec<String>,
    pub anchor_tension_kip: f64,
    pub anchor_shear_kip: f64,
    pub required_thickness_in: f64,
}

impl BasePlateSolution {
    pub fn check(&self, name: CheckName) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn failed(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Intermediate forces shared by several checks
struct Demand {
    n: f64,
    moment_kipin: f64,
    anchor_tension_kip: f64,
    anchor_shear_kip: f64,
    /// Resultant on the compression half of the plate (kip)
    compression_kip: f64,
    cantilever_in: f64,
}

impl Demand {
    fn new(input: &BasePlateInput) -> Self {
        let a = &input.anchors;
        let n = f64::from(a.count());
        let moment: KipIn = KipFt(input.loads.moment_kipft).into();
        let couple = moment.0 / a.row_spacing_in;
        Demand {
            n,
            moment_kipin: moment.0,
            anchor_tension_kip: input.loads.tension_kip / n + couple / (n / 2.0),
            anchor_shear_kip: input.loads.shear_kip / n,
            compression_kip: input.loads.compression_kip + couple,
            cantilever_in: (input.plate.length_in - 0.95 * input.plate.column_size_in) / 2.0,
        }
    }
}

fn plate_bending(input: &BasePlateInput, d: &Demand, pack: &BaseplatePack) -> (CheckResult, f64) {
    let p = &input.plate;
    let phi_fy = pack.plate.phi_bending * p.fy_ksi;
    let c = d.cantilever_in;

    let tension_side = d.anchor_tension_kip * d.n / 2.0;
    let t_tension = (4.0 * tension_side * c / (phi_fy * p.width_in)).sqrt();

    let bearing_pressure = d.compression_kip / (p.width_in * p.length_in / 2.0);
    let t_bearing = c * (2.0 * bearing_pressure / phi_fy).sqrt();

    let (required, side) = if t_tension >= t_bearing {
        (t_tension, "tension side")
    } else {
        (t_bearing, "bearing side")
    };
    (
        CheckResult::new(CheckName::PlateBending, required, p.thickness_in, "in").governed_by(side),
        required,
    )
}

fn weld_strength(input: &BasePlateInput, d: &Demand, pack: &BaseplatePack) -> (CheckResult, f64) {
    let p = &input.plate;
    let length = 4.0 * p.column_size_in;
    let section = length.powi(2) / 12.0;

    let normal = input.loads.tension_kip / length + d.moment_kipin / section;
    let shear = input.loads.shear_kip / length;
    let resultant = normal.hypot(shear);

    let fexx = p.electrode_ksi.unwrap_or(pack.weld.electrode_ksi);
    let strength_per_leg = pack.weld.phi * 0.6 * fexx * 0.707;
    (
        CheckResult::new(CheckName::WeldStrength, resultant, strength_per_leg * p.weld_size_in, "kip/in"),
        resultant / strength_per_leg,
    )
}

struct AnchorCapacity {
    steel_tension_kip: f64,
    breakout_kip: f64,
    shear_kip: f64,
}

impl AnchorCapacity {
    fn new(input: &BasePlateInput, pack: &BaseplatePack) -> Self {
        let a = &input.anchors;
        let f = &pack.anchor;
        let ab = a.area_in2();
        let fc_psi = input.fc_psi.unwrap_or(pack.concrete.fc_psi);
        let hef = a.embedment_in;
        let spacing = a.spacing_in.unwrap_or(a.row_spacing_in);
        let group_factor = (spacing / (3.0 * hef)).min(1.0);
        let breakout_lb = f.phi_breakout * f.breakout_kc * fc_psi.sqrt() * hef.powf(1.5) * group_factor;

        AnchorCapacity {
            steel_tension_kip: f.phi_steel_tension * f.tension_area_ratio * ab * a.futa_ksi,
            breakout_kip: breakout_lb / 1000.0,
            shear_kip: f.phi_steel_shear * f.shear_strength_ratio * ab * a.futa_ksi,
        }
    }

    fn tension_kip(&self) -> f64 {
        self.steel_tension_kip.min(self.breakout_kip)
    }

    fn tension_governing(&self) -> &'static str {
        if self.steel_tension_kip <= self.breakout_kip {
            "steel"
        } else {
            "breakout"
        }
    }
}

fn interaction(d: &Demand, cap: &AnchorCapacity, pack: &BaseplatePack) -> CheckResult {
    let rule = &pack.interaction;
    let exponent = rule.exponent();
    let unity = (d.anchor_tension_kip / cap.tension_kip()).powf(exponent)
        + (d.anchor_shear_kip / cap.shear_kip).powf(exponent);
    CheckResult {
        name: CheckName::TensionShearInteraction,
        passed: unity <= rule.limit,
        margin: if unity <= 1e-9 { MARGIN_CAP } else { (rule.limit / unity).min(MARGIN_CAP) },
        demand: unity,
        capacity: rule.limit,
        unit: "ratio".to_string(),
        governing: None,
    }
}

fn concrete_bearing(input: &BasePlateInput, d: &Demand, pack: &BaseplatePack) -> (CheckResult, f64) {
    let fc: Ksi = Psi(input.fc_psi.unwrap_or(pack.concrete.fc_psi)).into();
    let stress = pack.concrete.phi_bearing * 0.85 * fc.0;
    let area = input.plate.width_in * input.plate.length_in / 2.0;
    (
        CheckResult::new(CheckName::ConcreteBearing, d.compression_kip, stress * area, "kip"),
        d.compression_kip / stress,
    )
}

/// Run every check. Pure; the envelope wrapper is [`check_baseplate`].
pub fn calculate(input: &BasePlateInput, constants: &ConstantsSet) -> CalcResult<BasePlateSolution> {
    input.validate()?;
    let pack = &constants.baseplate.data;
    let demand = Demand::new(input);
    let capacity = AnchorCapacity::new(input, pack);
    let a = &input.anchors;

    let (plate, required_thickness_in) = plate_bending(input, &demand, pack);
    let (weld, required_weld_in) = weld_strength(input, &demand, pack);
    let tension = CheckResult::new(CheckName::AnchorTension, demand.anchor_tension_kip, capacity.tension_kip(), "kip/anchor")
        .governed_by(capacity.tension_governing());
    let shear = CheckResult::new(CheckName::AnchorShear, demand.anchor_shear_kip, capacity.shear_kip, "kip/anchor")
        .governed_by("steel");
    let combined = interaction(&demand, &capacity, pack);
    let (bearing, required_half_area) = concrete_bearing(input, &demand, pack);

    let mut suggestions = Vec::new();
    if !plate.passed {
        suggestions.push(format!(
            "Increase plate thickness to at least {:.3} in (currently {} in)",
            required_thickness_in, input.plate.thickness_in
        ));
    }
    if !weld.passed {
        suggestions.push(format!(
            "Increase weld size to at least {:.3} in (currently {} in)",
            required_weld_in, input.plate.weld_size_in
        ));
    }
    if !tension.passed {
        if capacity.tension_governing() == "steel" {
            let f = &pack.anchor;
            let area = demand.anchor_tension_kip / (f.phi_steel_tension * f.tension_area_ratio * a.futa_ksi);
            suggestions.push(format!(
                "Increase anchor diameter to at least {:.3} in (currently {} in)",
                (4.0 * area / PI).sqrt(),
                a.diameter_in
            ));
        } else {
            suggestions.push(format!(
                "Increase anchor embedment beyond {} in or spread anchors to at least {:.1} in",
                a.embedment_in,
                3.0 * a.embedment_in
            ));
        }
    }
    if !shear.passed {
        let f = &pack.anchor;
        let area = demand.anchor_shear_kip / (f.phi_steel_shear * f.shear_strength_ratio * a.futa_ksi);
        suggestions.push(format!(
            "Increase anchor diameter to at least {:.3} in for shear (currently {} in)",
            (4.0 * area / PI).sqrt(),
            a.diameter_in
        ));
    }
    if !combined.passed && tension.passed && shear.passed {
        suggestions.push(format!(
            "Combined tension-shear ratio {:.2} exceeds {}: add anchors or increase diameter",
            combined.demand, pack.interaction.limit
        ));
    }
    if !bearing.passed {
        suggestions.push(format!(
            "Increase plate area to at least {:.0} in² (currently {:.0} in²)",
            2.0 * required_half_area,
            input.plate.width_in * input.plate.length_in
        ));
    }

    let checks = vec![plate, weld, tension, shear, combined, bearing];
    let aggregate_pass = checks.iter().all(|c| c.passed);

    Ok(BasePlateSolution {
        checks,
        aggregate_pass,
        suggestions,
        anchor_tension_kip: demand.anchor_tension_kip,
        anchor_shear_kip: demand.anchor_shear_kip,
        required_thickness_in,
    })
}

/// Check a baseplate and wrap the answer in an audit envelope.
///
/// A failing aggregate is an abstain, not an error: the checks come back with
/// the review flag set.
pub fn check_baseplate(input: &BasePlateInput, constants: &ConstantsSet) -> Envelope<BasePlateSolution> {
    let mut env = EnvelopeBuilder::new(Solver::BaseplateChecks, input);
    env.pack(&constants.baseplate.meta);

    let solution = match calculate(input, constants) {
        Ok(solution) => solution,
        Err(e) => {
            warn!(error = %e, "baseplate checks rejected input");
            return env.invalid(&e);
        }
    };

    let pack = &constants.baseplate.data;
    env.notes.info(format!(
        "{} anchors; half resist the moment couple over {} in",
        input.anchors.count(),
        input.anchors.row_spacing_in
    ));
    if input.fc_psi.is_none() {
        env.notes.info(format!("Concrete f'c = {} psi assumed", pack.concrete.fc_psi));
    }
    if input.plate.electrode_ksi.is_none() {
        env.notes.info(format!("E{:.0}XX electrode assumed", pack.weld.electrode_ksi));
    }

    if solution.aggregate_pass {
        debug!(required_thickness_in = solution.required_thickness_in, "baseplate checks passed");
        return env.solved(solution);
    }

    let failed: Vec<String> = solution.failed().map(|c| c.name.to_string()).collect();
    for check in solution.failed() {
        env.notes.push(
            NoteKind::FailedCheck,
            format!("Failed {}: margin {:.2}", check.name, check.margin),
        );
    }
    for suggestion in &solution.suggestions {
        env.notes.info(format!("Suggestion: {}", suggestion));
    }
    env.request_engineering(format!("baseplate failed {}; no automatic redesign attempted", failed.join(", ")));
    warn!(failed = ?failed, "baseplate aggregate check failed");
    env.infeasible(Some(solution))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Outcome;

    fn passing_input() -> BasePlateInput {
        BasePlateInput {
            plate: PlateGeometry {
                width_in: 18.0,
                length_in: 18.0,
                thickness_in: 1.5,
                fy_ksi: 36.0,
                column_size_in: 8.0,
                weld_size_in: 0.375,
                electrode_ksi: None,
            },
            anchors: AnchorPattern {
                diameter_in: 1.0,
                embedment_in: 18.0,
                futa_ksi: 58.0,
                rows: 2,
                per_row: 2,
                row_spacing_in: 14.0,
                spacing_in: None,
            },
            loads: BaseplateLoads {
                tension_kip: 0.0,
                shear_kip: 3.0,
                moment_kipft: 20.0,
                compression_kip: 1.5,
            },
            fc_psi: None,
        }
    }

    #[test]
    fn test_anchor_forces() {
        let input = passing_input();
        let d = Demand::new(&input);
        // 240 kip-in / 14 in = 17.14 kip couple over 2 anchors
        assert!((d.anchor_tension_kip - 240.0 / 14.0 / 2.0).abs() < 1e-9);
        assert!((d.anchor_shear_kip - 0.75).abs() < 1e-12);
        assert!((d.cantilever_in - 5.2).abs() < 1e-9);
    }

    #[test]
    fn test_anchor_capacities() {
        let constants = ConstantsSet::builtin().unwrap();
        let cap = AnchorCapacity::new(&passing_input(), &constants.baseplate.data);
        let ab = PI / 4.0;
        assert!((cap.steel_tension_kip - 0.75 * 0.75 * ab * 58.0).abs() < 1e-9);
        assert!((cap.shear_kip - 0.65 * 0.6 * ab * 58.0).abs() < 1e-9);
        // 0.70 * 24 * √4000 * 18^1.5 * (14/54) / 1000
        let breakout = 0.70 * 24.0 * 4000f64.sqrt() * 18f64.powf(1.5) * (14.0 / 54.0) / 1000.0;
        assert!((cap.breakout_kip - breakout).abs() < 1e-9);
    }

    #[test]
    fn test_all_checks_pass() {
        let constants = ConstantsSet::builtin().unwrap();
        let env = check_baseplate(&passing_input(), &constants);
        let solution = env.result.as_ref().unwrap();
        assert_eq!(solution.checks.len(), 6);
        assert!(solution.aggregate_pass, "{:?}", solution.checks);
        assert!(solution.suggestions.is_empty());
        assert!(env.is_solved());
        assert!(!env.trace.request_engineering);
    }

    #[test]
    fn test_undersized_anchor_partial_failure() {
        let constants = ConstantsSet::builtin().unwrap();
        let mut input = passing_input();
        input.anchors.diameter_in = 0.5;
        let env = check_baseplate(&input, &constants);
        let solution = env.result.as_ref().unwrap();

        assert!(!solution.check(CheckName::AnchorTension).unwrap().passed);
        assert!(solution.check(CheckName::PlateBending).unwrap().passed);
        assert!(solution.check(CheckName::WeldStrength).unwrap().passed);
        assert!(!solution.aggregate_pass);
        assert!(solution.suggestions.iter().any(|s| s.starts_with("Increase anchor diameter")));

        assert_eq!(env.trace.outcome, Outcome::Abstained);
        assert!(env.trace.request_engineering);
        assert!(env.confidence > 0.0);
    }

    #[test]
    fn test_interaction_uses_five_thirds() {
        let constants = ConstantsSet::builtin().unwrap();
        let pack = &constants.baseplate.data;
        assert_eq!(pack.interaction.exponent(), 5.0 / 3.0);

        let input = passing_input();
        let d = Demand::new(&input);
        let cap = AnchorCapacity::new(&input, pack);
        let expected = (d.anchor_tension_kip / cap.tension_kip()).powf(5.0 / 3.0)
            + (d.anchor_shear_kip / cap.shear_kip).powf(5.0 / 3.0);
        assert!((interaction(&d, &cap, pack).demand - expected).abs() < 1e-12);
    }

    #[test]
    fn test_thin_plate_fails_bending() {
        let constants = ConstantsSet::builtin().unwrap();
        let mut input = passing_input();
        input.plate.thickness_in = 0.25;
        let solution = calculate(&input, &constants).unwrap();
        let plate = solution.check(CheckName::PlateBending).unwrap();
        assert!(!plate.passed);
        assert!(plate.margin < 1.0);
        assert!(solution.required_thickness_in > 0.25);
    }

    #[test]
    fn test_margin_convention() {
        let constants = ConstantsSet::builtin().unwrap();
        let solution = calculate(&passing_input(), &constants).unwrap();
        for check in &solution.checks {
            assert_eq!(check.passed, check.margin >= 1.0, "{}", check.name);
        }
    }

    #[test]
    fn test_zero_load_margins_capped() {
        let constants = ConstantsSet::builtin().unwrap();
        let mut input = passing_input();
        input.loads = BaseplateLoads::default();
        let solution = calculate(&input, &constants).unwrap();
        assert!(solution.aggregate_pass);
        assert_eq!(solution.check(CheckName::AnchorShear).unwrap().margin, MARGIN_CAP);
        assert!(serde_json::to_string(&solution).is_ok());
    }

    #[test]
    fn test_single_row_rejected() {
        let constants = ConstantsSet::builtin().unwrap();
        let mut input = passing_input();
        input.anchors.rows = 1;
        let env = check_baseplate(&input, &constants);
        assert_eq!(env.trace.outcome, Outcome::Invalid);
        assert_eq!(env.confidence, 0.0);
    }

    #[test]
    fn test_huge_anchor_pattern_rejected() {
        let constants = ConstantsSet::builtin().unwrap();
        let mut input = passing_input();
        input.anchors.rows = 70_000;
        input.anchors.per_row = 70_000;
        assert_eq!(input.anchors.count(), u32::MAX);

        let env = check_baseplate(&input, &constants);
        assert_eq!(env.trace.outcome, Outcome::Invalid);
        assert!(env.result.is_none());
        assert!(env.assumptions[0].contains("anchors.per_row"));

        input.anchors.rows = 2;
        input.anchors.per_row = MAX_ANCHORS / 2;
        assert_ne!(check_baseplate(&input, &constants).trace.outcome, Outcome::Invalid);
    }

    #[test]
    fn test_check_names_serialize() {
        let json = serde_json::to_string(&CheckName::TensionShearInteraction).unwrap();
        assert_eq!(json, "\"tension_shear_interaction\"");
        let constants = ConstantsSet::builtin().unwrap();
        let solution = calculate(&passing_input(), &constants).unwrap();
        let value = serde_json::to_value(&solution.checks[0]).unwrap();
        assert!(value.get("pass").is_some());
    }
}
