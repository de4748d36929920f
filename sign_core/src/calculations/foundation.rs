//! # Direct Burial Foundation
//!
//! Embedment depth for a pole set in a drilled concrete footing, using the
//! IBC 2024 Section 1807.3.2.2 constrained embedment relation
//!
//! ```text
//! d² = 4.25 · K · M / (S · b)        d ≥ d_min
//! ```
//!
//! with M the moment at grade (lb-ft), S the allowable lateral soil bearing
//! (psf), b the footing diameter or width (ft) and K the calibration factor
//! from the active `footing` pack. For fixed M and S the depth can only fall
//! as b grows.
//!
//! ## Arrangements
//!
//! - `per_support`: each pole gets its own footing; the group moment is split
//!   equally, or by `moment_shares` when given.
//! - `combined`: one footing carries the full group moment.
//!
//! ## Example
//!
//! ```rust
//! use sign_core::calculations::foundation::{solve_foundation, FoundationInput};
//! use sign_core::constants::ConstantsSet;
//!
//! let constants = ConstantsSet::builtin().unwrap();
//! let small = solve_foundation(&FoundationInput::new(30.0, 1500.0, 2.5), &constants);
//! let large = solve_foundation(&FoundationInput::new(30.0, 1500.0, 4.0), &constants);
//! assert!(small.result.unwrap().depth_ft >= large.result.unwrap().depth_ft);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{require_non_negative, require_positive};
use crate::constants::ConstantsSet;
use crate::envelope::{Envelope, EnvelopeBuilder, Solver};
use crate::errors::{CalcError, CalcResult};
use crate::units::{KipFt, LbFt};

/// Plan shape of the footing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FootingShape {
    /// Drilled pier
    #[default]
    Round,
    /// Formed square block, `diameter_ft` is the side length
    Square,
}

impl FootingShape {
    pub fn plan_area_ft2(&self, b_ft: f64) -> f64 {
        match self {
            FootingShape::Round => PI * b_ft * b_ft / 4.0,
            FootingShape::Square => b_ft * b_ft,
        }
    }
}

/// How footings are shared between poles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arrangement {
    #[default]
    PerSupport,
    Combined,
}

/// Input for the foundation depth solver.
///
/// ## JSON Example
///
/// ```json
/// {
///   "moment_kipft": 62.9,
///   "soil_bearing_psf": 1500.0,
///   "diameter_ft": 3.0,
///   "num_supports": 2,
///   "arrangement": "per_support",
///   "shape": "round",
///   "calibration": "footing:v1"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundationInput {
    /// Group moment at grade (kip-ft)
    pub moment_kipft: f64,

    /// Allowable lateral soil bearing (psf)
    pub soil_bearing_psf: f64,

    /// Footing diameter, or side length for square footings (ft)
    pub diameter_ft: f64,

    #[serde(default = "default_supports")]
    pub num_supports: u32,

    #[serde(default)]
    pub arrangement: Arrangement,

    #[serde(default)]
    pub shape: FootingShape,

    /// Fractions of the group moment per support; must sum to 1
    #[serde(default)]
    pub moment_shares: Option<Vec<f64>>,

    /// Expected calibration pack, `footing:v1` or `v1`
    #[serde(default)]
    pub calibration: Option<String>,
}

fn default_supports() -> u32 {
    1
}

impl FoundationInput {
    /// Single round footing
    pub fn new(moment_kipft: f64, soil_bearing_psf: f64, diameter_ft: f64) -> Self {
        FoundationInput {
            moment_kipft,
            soil_bearing_psf,
            diameter_ft,
            num_supports: 1,
            arrangement: Arrangement::PerSupport,
            shape: FootingShape::Round,
            moment_shares: None,
            calibration: None,
        }
    }

    pub fn validate(&self, constants: &ConstantsSet) -> CalcResult<()> {
        let calibration = &constants.footing.meta;
        require_non_negative("moment_kipft", self.moment_kipft, "Moment cannot be negative")?;
        require_positive("soil_bearing_psf", self.soil_bearing_psf, "non-positive soil bearing capacity")?;
        require_positive("diameter_ft", self.diameter_ft, "Footing diameter must be positive")?;
        if self.num_supports == 0 {
            return Err(CalcError::invalid_input("num_supports", "0", "At least one support is required"));
        }
        let max_supports = constants.footing.data.layout.max_supports;
        if self.num_supports > max_supports {
            return Err(CalcError::invalid_input(
                "num_supports",
                self.num_supports.to_string(),
                format!("At most {} supports per sign", max_supports),
            ));
        }
        if let Some(shares) = &self.moment_shares {
            if self.arrangement == Arrangement::PerSupport {
                if shares.len() != self.num_supports as usize {
                    return Err(CalcError::invalid_input(
                        "moment_shares",
                        format!("{} entries", shares.len()),
                        format!("Expected one share per support ({})", self.num_supports),
                    ));
                }
                for share in shares {
                    require_non_negative("moment_shares", *share, "Moment share cannot be negative")?;
                }
                let total: f64 = shares.iter().sum();
                if (total - 1.0).abs() > 1e-6 {
                    return Err(CalcError::invalid_input(
                        "moment_shares",
                        total.to_string(),
                        "Moment shares must sum to 1",
                    ));
                }
            }
        }
        if let Some(requested) = &self.calibration {
            if requested != &calibration.id() && requested != &calibration.version {
                return Err(CalcError::unknown_calibration(requested.as_str(), calibration.id()));
            }
        }
        Ok(())
    }

    /// Moment carried by each footing (kip-ft)
    pub fn footing_moments(&self) -> Vec<f64> {
        match self.arrangement {
            Arrangement::Combined => vec![self.moment_kipft],
            Arrangement::PerSupport => match &self.moment_shares {
                Some(shares) => shares.iter().map(|s| s * self.moment_kipft).collect(),
                None => {
                    let n = self.num_supports as usize;
                    vec![self.moment_kipft / n as f64; n]
                }
            },
        }
    }
}

/// One footing of the solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootingSolution {
    pub moment_kipft: f64,
    pub depth_ft: f64,
    pub volume_ft3: f64,
}

/// Solved foundation.
///
/// ## JSON Example
///
/// ```json
/// {
///   "diameter_ft": 3.0,
///   "depth_ft": 5.45,
///   "footings": [{ "moment_kipft": 31.45, "depth_ft": 5.45, "volume_ft3": 38.5 }],
///   "concrete_volume_ft3": 77.1,
///   "concrete_volume_yd3": 2.86,
///   "calibration_version": "footing:v1",
///   "calibration_factor": 1.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundationResult {
    pub diameter_ft: f64,
    pub shape: FootingShape,
    pub arrangement: Arrangement,
    /// Governing (deepest) embedment (ft)
    pub depth_ft: f64,
    pub footings: Vec<FootingSolution>,
    pub concrete_volume_ft3: f64,
    pub concrete_volume_yd3: f64,
    /// `name:version` of the footing pack used
    pub calibration_version: String,
    pub calibration_factor: f64,
    /// Depth before the minimum-depth clamp
    pub unclamped_depth_ft: f64,
}

/// Embedment depth for one footing (ft), before the minimum clamp.
pub fn embedment_depth_ft(moment_kipft: f64, soil_bearing_psf: f64, b_ft: f64, constants: &ConstantsSet) -> f64 {
    let embedment = &constants.footing.data.embedment;
    let moment: LbFt = KipFt(moment_kipft).into();
    (embedment.coefficient * embedment.calibration_factor * moment.0 / (soil_bearing_psf * b_ft)).sqrt()
}

/// Solve the foundation. Pure; the envelope wrapper is [`solve_foundation`].
pub fn calculate(input: &FoundationInput, constants: &ConstantsSet) -> CalcResult<FoundationResult> {
    input.validate(constants)?;

    let pack = &constants.footing.data;
    let b = input.diameter_ft;
    let plan_area = input.shape.plan_area_ft2(b);

    let mut unclamped_depth_ft: f64 = 0.0;
    let footings: Vec<FootingSolution> = input
        .footing_moments()
        .into_iter()
        .map(|moment_kipft| {
            let raw = embedment_depth_ft(moment_kipft, input.soil_bearing_psf, b, constants);
            unclamped_depth_ft = unclamped_depth_ft.max(raw);
            let depth_ft = raw.max(pack.embedment.min_depth_ft);
            FootingSolution {
                moment_kipft,
                depth_ft,
                volume_ft3: plan_area * depth_ft,
            }
        })
        .collect();

    let depth_ft = footings.iter().map(|f| f.depth_ft).fold(0.0, f64::max);
    let concrete_volume_ft3: f64 = footings.iter().map(|f| f.volume_ft3).sum();
    let concrete_volume_yd3 = concrete_volume_ft3 / pack.concrete.cubic_feet_per_yard;

    Ok(FoundationResult {
        diameter_ft: b,
        shape: input.shape,
        arrangement: input.arrangement,
        depth_ft,
        footings,
        concrete_volume_ft3,
        concrete_volume_yd3,
        calibration_version: constants.footing.meta.id(),
        calibration_factor: pack.embedment.calibration_factor,
        unclamped_depth_ft,
    })
}

/// Solve the foundation and wrap the answer in an audit envelope.
pub fn solve_foundation(input: &FoundationInput, constants: &ConstantsSet) -> Envelope<FoundationResult> {
    let mut env = EnvelopeBuilder::new(Solver::FoundationDepth, input);
    env.pack(&constants.footing.meta);

    let result = match calculate(input, constants) {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "foundation solver rejected input");
            return env.invalid(&e);
        }
    };

    if !result.depth_ft.is_finite() || result.depth_ft <= 0.0 {
        warn!(depth_ft = result.depth_ft, "foundation depth not physically meaningful");
        let moment: LbFt = KipFt(input.moment_kipft).into();
        let reason = if !moment.0.is_finite() {
            format!("moment {} kip-ft is not finite in lb-ft; no embedment depth exists", input.moment_kipft)
        } else {
            format!(
                "embedment depth {} ft is not finite and positive at S = {} psf, b = {} ft",
                result.depth_ft, input.soil_bearing_psf, input.diameter_ft
            )
        };
        return env.abstained(None, reason);
    }

    annotate(&mut env, input, &result, constants);
    debug!(
        depth_ft = result.depth_ft,
        volume_yd3 = result.concrete_volume_yd3,
        calibration = %result.calibration_version,
        "foundation solved"
    );
    env.solved(result)
}

fn annotate(env: &mut EnvelopeBuilder, input: &FoundationInput, result: &FoundationResult, constants: &ConstantsSet) {
    let pack = &constants.footing.data;
    env.notes.info(format!(
        "Embedment per IBC 1807.3.2.2: d² = {} K M / (S b) with K = {} ({})",
        pack.embedment.coefficient, result.calibration_factor, result.calibration_version
    ));
    match (input.arrangement, input.num_supports) {
        (Arrangement::Combined, n) if n > 1 => env
            .notes
            .info(format!("One combined footing carries the full moment of {} supports", n)),
        (Arrangement::PerSupport, n) if n > 1 => {
            let rule = if input.moment_shares.is_some() { "by stated shares" } else { "equally" };
            env.notes.info(format!("Group moment split {} across {} footings", rule, n));
        }
        _ => {}
    }
    if result.unclamped_depth_ft < pack.embedment.min_depth_ft {
        env.notes.info(format!("Depth raised to the {} ft minimum", pack.embedment.min_depth_ft));
    }
    if result.depth_ft > pack.embedment.review_depth_ft {
        env.request_engineering(format!(
            "embedment depth {:.2} ft exceeds {} ft",
            result.depth_ft, pack.embedment.review_depth_ft
        ));
    }
    let slenderness = result.depth_ft / result.diameter_ft;
    if slenderness > pack.embedment.max_depth_ratio {
        env.request_engineering(format!(
            "depth/diameter {:.1} exceeds {}; pier no longer behaves as a rigid post",
            slenderness, pack.embedment.max_depth_ratio
        ));
    }
}

/// Input for a diameter → depth schedule.
///
/// ## JSON Example
///
/// ```json
/// { "moment_kipft": 40.0, "soil_bearing_psf": 1500.0, "diameters_ft": [2.0, 2.5, 3.0, 3.5, 4.0] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub moment_kipft: f64,
    pub soil_bearing_psf: f64,
    pub diameters_ft: Vec<f64>,
    #[serde(default = "default_supports")]
    pub num_supports: u32,
    #[serde(default)]
    pub arrangement: Arrangement,
    #[serde(default)]
    pub shape: FootingShape,
}

impl ScheduleInput {
    fn at(&self, diameter_ft: f64) -> FoundationInput {
        FoundationInput {
            moment_kipft: self.moment_kipft,
            soil_bearing_psf: self.soil_bearing_psf,
            diameter_ft,
            num_supports: self.num_supports,
            arrangement: self.arrangement,
            shape: self.shape,
            moment_shares: None,
            calibration: None,
        }
    }
}

/// One row of the schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub diameter_ft: f64,
    pub depth_ft: f64,
    pub concrete_volume_yd3: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    /// Rows in ascending diameter
    pub rows: Vec<ScheduleRow>,
    pub calibration_version: String,
}

/// Depth for each candidate diameter, in ascending diameter.
pub fn calculate_schedule(input: &ScheduleInput, constants: &ConstantsSet) -> CalcResult<ScheduleResult> {
    if input.diameters_ft.is_empty() {
        return Err(CalcError::missing_field("diameters_ft"));
    }
    let mut diameters = input.diameters_ft.clone();
    diameters.sort_by(f64::total_cmp);
    diameters.dedup();

    let rows = diameters
        .into_iter()
        .map(|d| {
            let solved = calculate(&input.at(d), constants)?;
            Ok(ScheduleRow {
                diameter_ft: d,
                depth_ft: solved.depth_ft,
                concrete_volume_yd3: solved.concrete_volume_yd3,
            })
        })
        .collect::<CalcResult<Vec<_>>>()?;

    Ok(ScheduleResult {
        rows,
        calibration_version: constants.footing.meta.id(),
    })
}

/// Build a depth schedule and wrap it in an audit envelope.
pub fn depth_schedule(input: &ScheduleInput, constants: &ConstantsSet) -> Envelope<ScheduleResult> {
    let mut env = EnvelopeBuilder::new(Solver::FoundationSchedule, input);
    env.pack(&constants.footing.meta);

    match calculate_schedule(input, constants) {
        Ok(schedule) => {
            let deep = constants.footing.data.embedment.review_depth_ft;
            if schedule.rows.iter().any(|r| r.depth_ft > deep) {
                env.notes
                    .warning(format!("some diameters need more than {} ft of embedment", deep));
            }
            env.notes.info(format!(
                "Schedule of {} diameters at M = {} kip-ft, S = {} psf",
                schedule.rows.len(),
                input.moment_kipft,
                input.soil_bearing_psf
            ));
            env.solved(schedule)
        }
        Err(e) => {
            warn!(error = %e, "depth schedule rejected input");
            env.invalid(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Outcome;

    #[test]
    fn test_depth_formula() {
        let constants = ConstantsSet::builtin().unwrap();
        let result = calculate(&FoundationInput::new(30.0, 150.0, 3.0), &constants).unwrap();
        // d² = 4.25 * 30000 / (150 * 3) = 283.3
        assert!((result.depth_ft - 283.333_f64.sqrt()).abs() < 0.01);
        assert_eq!(result.calibration_version, "footing:v1");
        assert_eq!(result.calibration_factor, 1.0);
    }

    #[test]
    fn test_depth_monotone_in_diameter() {
        let constants = ConstantsSet::builtin().unwrap();
        let mut previous = f64::INFINITY;
        for tenth in 10..=60 {
            let d = tenth as f64 / 10.0;
            let depth = calculate(&FoundationInput::new(25.0, 200.0, d), &constants).unwrap().depth_ft;
            assert!(depth <= previous);
            previous = depth;
        }
    }

    #[test]
    fn test_minimum_depth() {
        let constants = ConstantsSet::builtin().unwrap();
        let result = calculate(&FoundationInput::new(0.1, 3000.0, 4.0), &constants).unwrap();
        assert_eq!(result.depth_ft, 2.0);
        assert!(result.unclamped_depth_ft < 2.0);
    }

    #[test]
    fn test_round_volume() {
        let constants = ConstantsSet::builtin().unwrap();
        let result = calculate(&FoundationInput::new(30.0, 150.0, 3.0), &constants).unwrap();
        let expected = PI * 9.0 / 4.0 * result.depth_ft;
        assert!((result.concrete_volume_ft3 - expected).abs() < 1e-9);
        assert!((result.concrete_volume_yd3 - expected / 27.0).abs() < 1e-9);
    }

    #[test]
    fn test_per_support_split() {
        let constants = ConstantsSet::builtin().unwrap();
        let mut input = FoundationInput::new(60.0, 150.0, 3.0);
        input.num_supports = 2;
        let split = calculate(&input, &constants).unwrap();
        assert_eq!(split.footings.len(), 2);
        assert!((split.footings[0].moment_kipft - 30.0).abs() < 1e-12);

        input.arrangement = Arrangement::Combined;
        let combined = calculate(&input, &constants).unwrap();
        assert_eq!(combined.footings.len(), 1);
        assert!(combined.depth_ft > split.depth_ft);
    }

    #[test]
    fn test_moment_shares() {
        let constants = ConstantsSet::builtin().unwrap();
        let mut input = FoundationInput::new(60.0, 150.0, 3.0);
        input.num_supports = 2;
        input.moment_shares = Some(vec![0.75, 0.25]);
        let result = calculate(&input, &constants).unwrap();
        assert!((result.footings[0].moment_kipft - 45.0).abs() < 1e-12);
        assert!(result.footings[0].depth_ft > result.footings[1].depth_ft);

        input.moment_shares = Some(vec![0.5, 0.4]);
        assert!(calculate(&input, &constants).is_err());
    }

    #[test]
    fn test_square_footing_volume() {
        let constants = ConstantsSet::builtin().unwrap();
        let mut input = FoundationInput::new(30.0, 150.0, 3.0);
        input.shape = FootingShape::Square;
        let result = calculate(&input, &constants).unwrap();
        assert!((result.concrete_volume_ft3 - 9.0 * result.depth_ft).abs() < 1e-9);
    }

    #[test]
    fn test_zero_soil_is_invalid() {
        let constants = ConstantsSet::builtin().unwrap();
        let env = solve_foundation(&FoundationInput::new(30.0, 0.0, 3.0), &constants);
        assert!(env.result.is_none());
        assert_eq!(env.confidence, 0.0);
        assert_eq!(env.trace.outcome, Outcome::Invalid);
        assert!(env.assumptions[0].contains("non-positive soil bearing capacity"));
    }

    #[test]
    fn test_unknown_calibration() {
        let constants = ConstantsSet::builtin().unwrap();
        let mut input = FoundationInput::new(30.0, 150.0, 3.0);
        input.calibration = Some("footing:v9".into());
        let err = calculate(&input, &constants).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_CALIBRATION");

        input.calibration = Some("v1".into());
        assert!(calculate(&input, &constants).is_ok());
    }

    #[test]
    fn test_deep_footing_requests_review() {
        let constants = ConstantsSet::builtin().unwrap();
        let env = solve_foundation(&FoundationInput::new(80.0, 100.0, 2.0), &constants);
        assert!(env.is_solved());
        assert!(env.trace.request_engineering);
        assert!(env.assumptions.iter().any(|a| a.contains("exceeds 8 ft")));
        assert!(env.confidence < 1.0);
    }

    #[test]
    fn test_schedule_sorted_and_monotone() {
        let constants = ConstantsSet::builtin().unwrap();
        let input = ScheduleInput {
            moment_kipft: 40.0,
            soil_bearing_psf: 150.0,
            diameters_ft: vec![4.0, 2.0, 3.0, 2.0],
            num_supports: 1,
            arrangement: Arrangement::PerSupport,
            shape: FootingShape::Round,
        };
        let env = depth_schedule(&input, &constants);
        let rows = env.result.unwrap().rows;
        assert_eq!(rows.len(), 3);
        assert!(rows.windows(2).all(|w| w[0].diameter_ft < w[1].diameter_ft && w[0].depth_ft >= w[1].depth_ft));
    }

    #[test]
    fn test_overflowing_moment_abstains() {
        let constants = ConstantsSet::builtin().unwrap();
        let env = solve_foundation(&FoundationInput::new(1e307, 1500.0, 3.0), &constants);
        assert_eq!(env.trace.outcome, Outcome::Abstained);
        assert!(env.result.is_none());
        assert!(env.confidence > 0.0 && env.confidence < 1.0);
        let note = env.assumptions.iter().find(|a| a.starts_with("Abstain:")).unwrap();
        assert!(note.contains("moment"), "{}", note);
        assert!(!note.contains("diameter"), "{}", note);
    }

    #[test]
    fn test_vanishing_soil_bearing_abstains_on_depth() {
        let constants = ConstantsSet::builtin().unwrap();
        let env = solve_foundation(&FoundationInput::new(30.0, 1e-320, 3.0), &constants);
        assert_eq!(env.trace.outcome, Outcome::Abstained);
        assert!(env.result.is_none());
        let note = env.assumptions.iter().find(|a| a.starts_with("Abstain:")).unwrap();
        assert!(note.contains("embedment depth inf ft"), "{}", note);
    }

    #[test]
    fn test_support_count_bounded() {
        let constants = ConstantsSet::builtin().unwrap();
        let mut input = FoundationInput::new(30.0, 1500.0, 3.0);
        input.num_supports = u32::MAX;
        let env = solve_foundation(&input, &constants);
        assert_eq!(env.trace.outcome, Outcome::Invalid);
        assert!(env.result.is_none());
        assert!(env.assumptions[0].contains("num_supports"));

        input.num_supports = constants.footing.data.layout.max_supports;
        assert!(solve_foundation(&input, &constants).is_solved());

        let schedule = ScheduleInput {
            moment_kipft: 30.0,
            soil_bearing_psf: 1500.0,
            diameters_ft: vec![3.0],
            num_supports: u32::MAX,
            arrangement: Arrangement::PerSupport,
            shape: FootingShape::Round,
        };
        assert_eq!(depth_schedule(&schedule, &constants).trace.outcome, Outcome::Invalid);
    }

    #[test]
    fn test_empty_schedule_invalid() {
        let constants = ConstantsSet::builtin().unwrap();
        let input: ScheduleInput =
            serde_json::from_str(r#"{ "moment_kipft": 10.0, "soil_bearing_psf": 1500.0, "diameters_ft": [] }"#).unwrap();
        let env = depth_schedule(&input, &constants);
        assert_eq!(env.trace.outcome, Outcome::Invalid);
    }
}
