//! # Support Selection
//!
//! Filters a section catalog down to the poles that carry a given demand,
//! ordered so the first entry is the value-engineered default.
//!
//! ## Algorithm
//!
//! 1. Restrict the catalog to the requested families and material.
//! 2. Reject aluminum above the height lock outright (validation failure).
//! 3. Sort ascending by the requested key, ties broken by designation.
//! 4. Check each candidate for strength and deflection.
//! 5. Return every passing candidate in sorted order; the first is the default.
//!
//! ## Checks
//!
//! - Strength: φb Fy Sx ≥ Mu (AISC 360-16 F8), Mu split equally per support.
//! - Deflection: cantilever pole of height H with lateral load P acting at
//!   a = min(Mu/Vu, H), Δ = P a² (3H − a) / (6 E I) ≤ H/60 under service load
//!   (0.6 × ultimate). With no shear given, P = Mu/H at the top.

use std::cmp::Ordering;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use super::{margin, require_non_negative, require_positive};
use crate::constants::ConstantsSet;
use crate::envelope::{Envelope, EnvelopeBuilder, NoteKind, Solver};
use crate::errors::{CalcError, CalcResult};
use crate::sections::{CandidateSection, SectionCatalog, SectionFamily, SupportMaterial};
use crate::units::{Feet, Inches, KipFt, KipIn};

/// Catalog ordering used to pick the default section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Lightest first
    #[default]
    #[serde(alias = "weight_per_ft")]
    Weight,
    /// Smallest section modulus first
    #[serde(alias = "sx")]
    Modulus,
    /// Smallest depth first
    #[serde(alias = "tube_size")]
    Size,
}

impl SortKey {
    fn value(&self, section: &CandidateSection) -> f64 {
        match self {
            SortKey::Weight => section.weight_plf,
            SortKey::Modulus => section.sx_in3,
            SortKey::Size => section.depth_in,
        }
    }

    fn compare(&self, a: &CandidateSection, b: &CandidateSection) -> Ordering {
        self.value(a)
            .total_cmp(&self.value(b))
            .then_with(|| a.designation.cmp(&b.designation))
    }
}

/// Caller preferences for the section search.
///
/// ## JSON Example
///
/// ```json
/// { "family": "pipe", "sort_by": "weight", "material": "steel" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionPreferences {
    /// Families to consider; empty means every family. Accepts one or a list.
    #[serde(default, alias = "families", deserialize_with = "one_or_many")]
    pub family: Vec<SectionFamily>,

    #[serde(default)]
    pub sort_by: SortKey,

    #[serde(default = "default_material")]
    pub material: SupportMaterial,
}

impl Default for SelectionPreferences {
    fn default() -> Self {
        SelectionPreferences {
            family: Vec::new(),
            sort_by: SortKey::default(),
            material: default_material(),
        }
    }
}

fn default_material() -> SupportMaterial {
    SupportMaterial::Steel
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<SectionFamily>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(SectionFamily),
        Many(Vec<SectionFamily>),
    }
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(family) => vec![family],
        OneOrMany::Many(families) => families,
    })
}

/// Base demand the supports must carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportDemand {
    /// Ultimate moment at grade for the whole structure (kip-ft)
    pub moment_kipft: f64,

    /// Ultimate base shear for the whole structure (kip)
    #[serde(default)]
    pub shear_kip: Option<f64>,
}

/// Input for support selection.
///
/// ## JSON Example
///
/// ```json
/// {
///   "demand": { "moment_kipft": 62.9, "shear_kip": 3.0 },
///   "preferences": { "family": ["pipe", "square_tube"], "sort_by": "weight", "material": "steel" },
///   "height_ft": 25.0,
///   "num_supports": 1
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportInput {
    pub demand: SupportDemand,

    #[serde(default)]
    pub preferences: SelectionPreferences,

    /// Pole height above grade (ft)
    pub height_ft: f64,

    /// Number of poles sharing the demand
    #[serde(default = "default_supports")]
    pub num_supports: u32,
}

fn default_supports() -> u32 {
    1
}

impl SupportInput {
    pub fn validate(&self, constants: &ConstantsSet) -> CalcResult<()> {
        require_non_negative("demand.moment_kipft", self.demand.moment_kipft, "Moment cannot be negative")?;
        if let Some(shear) = self.demand.shear_kip {
            require_non_negative("demand.shear_kip", shear, "Shear cannot be negative")?;
        }
        require_positive("height_ft", self.height_ft, "Pole height must be positive")?;
        if self.num_supports == 0 {
            return Err(CalcError::invalid_input("num_supports", "0", "At least one support is required"));
        }

        let lock = constants.support.data.limits.aluminum_max_height_ft;
        if self.preferences.material == SupportMaterial::Aluminum && self.height_ft > lock {
            return Err(CalcError::invalid_input(
                "preferences.material",
                format!("aluminum at {} ft", self.height_ft),
                format!("no aluminum section permitted above {} ft - select steel", lock),
            ));
        }
        Ok(())
    }

    /// Demand carried by each pole: (moment kip-ft, shear kip)
    pub fn per_support(&self) -> (f64, Option<f64>) {
        let n = f64::from(self.num_supports);
        (
            self.demand.moment_kipft / n,
            self.demand.shear_kip.filter(|v| *v > 0.0).map(|v| v / n),
        )
    }
}

/// Which check ruled out the candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingConstraint {
    Strength,
    Deflection,
}

/// Check results for one candidate section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionOption {
    pub designation: String,
    pub family: SectionFamily,
    pub weight_plf: f64,

    /// Design flexural strength φMn (kip-ft)
    pub capacity_kipft: f64,
    pub strength_margin: f64,

    /// Service tip deflection (in)
    pub deflection_in: f64,
    pub allowable_deflection_in: f64,
    pub deflection_margin: f64,

    /// Governing margin, capacity ÷ demand
    pub margin: f64,
}

impl SectionOption {
    pub fn passes_strength(&self) -> bool {
        self.strength_margin >= 1.0
    }

    pub fn passes_deflection(&self) -> bool {
        self.deflection_margin >= 1.0
    }

    pub fn passes(&self) -> bool {
        self.passes_strength() && self.passes_deflection()
    }
}

/// Feasible sections in preference order.
///
/// ## JSON Example
///
/// ```json
/// {
///   "options": [{ "designation": "PIPE10STD", "margin": 1.18 }],
///   "default_selection": "PIPE10STD",
///   "binding_constraint": null,
///   "moment_per_support_kipft": 62.9,
///   "candidates_checked": 9
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportSelection {
    pub options: Vec<SectionOption>,
    pub default_selection: Option<String>,
    /// Set only when nothing passed
    pub binding_constraint: Option<BindingConstraint>,
    pub moment_per_support_kipft: f64,
    pub candidates_checked: usize,
}

/// Evaluate one section against the per-support demand.
pub fn check_section(
    section: &CandidateSection,
    moment_kipft: f64,
    shear_kip: Option<f64>,
    height_ft: f64,
    constants: &ConstantsSet,
) -> SectionOption {
    let pack = &constants.support.data;

    let capacity: KipFt = KipIn(pack.strength.phi_bending * section.fy_ksi * section.sx_in3).into();

    let height: Inches = Feet(height_ft).into();
    let moment: KipIn = KipFt(moment_kipft).into();
    let (load_kip, arm_in) = match shear_kip {
        Some(v) => (v, (moment.0 / v).min(height.0)),
        None => (moment.0 / height.0, height.0),
    };
    let e_ksi = match section.material {
        SupportMaterial::Steel => pack.stiffness.e_steel_ksi,
        SupportMaterial::Aluminum => pack.stiffness.e_aluminum_ksi,
    };
    let service_load = pack.stiffness.service_factor * load_kip;
    let deflection_in =
        service_load * arm_in.powi(2) * (3.0 * height.0 - arm_in) / (6.0 * e_ksi * section.ix_in4);
    let allowable_deflection_in = height.0 / pack.stiffness.deflection_ratio;

    let strength_margin = margin(capacity.0, moment_kipft);
    let deflection_margin = margin(allowable_deflection_in, deflection_in);

    SectionOption {
        designation: section.designation.clone(),
        family: section.family,
        weight_plf: section.weight_plf,
        capacity_kipft: capacity.0,
        strength_margin,
        deflection_in,
        allowable_deflection_in,
        deflection_margin,
        margin: strength_margin.min(deflection_margin),
    }
}

/// Candidates of the requested families and material, in preference order.
pub fn ordered_candidates<'a>(input: &SupportInput, catalog: &'a SectionCatalog) -> Vec<&'a CandidateSection> {
    let prefs = &input.preferences;
    let mut candidates: Vec<&CandidateSection> = catalog
        .by_family(&prefs.family)
        .into_iter()
        .filter(|s| s.material == prefs.material && s.can_bend())
        .collect();
    candidates.sort_by(|a, b| prefs.sort_by.compare(a, b));
    candidates
}

/// Run the selection filter. Pure; the envelope wrapper is [`select_support`].
///
/// Returns every candidate's check in preference order; the feasible subset
/// is the ones where [`SectionOption::passes`] holds.
pub fn calculate(input: &SupportInput, catalog: &SectionCatalog, constants: &ConstantsSet) -> CalcResult<Vec<SectionOption>> {
    input.validate(constants)?;
    let (moment, shear) = input.per_support();
    Ok(ordered_candidates(input, catalog)
        .into_iter()
        .map(|s| check_section(s, moment, shear, input.height_ft, constants))
        .collect())
}

/// Select supports and wrap the answer in an audit envelope.
pub fn select_support(input: &SupportInput, catalog: &SectionCatalog, constants: &ConstantsSet) -> Envelope<SupportSelection> {
    let mut env = EnvelopeBuilder::new(Solver::SupportSelection, input);
    env.pack(&constants.support.meta);

    let checked = match calculate(input, catalog, constants) {
        Ok(checked) => checked,
        Err(e) => {
            warn!(error = %e, "support selection rejected input");
            return env.invalid(&e);
        }
    };

    let pack = &constants.support.data;
    let (moment, _) = input.per_support();
    if input.num_supports > 1 {
        env.notes.info(format!(
            "Demand split equally across {} supports: Mu = {:.2} kip-ft each",
            input.num_supports, moment
        ));
    }
    env.notes.info(format!(
        "Strength: phi Mn = {} Fy Sx; deflection limited to H/{} under {} x ultimate wind",
        pack.strength.phi_bending, pack.stiffness.deflection_ratio, pack.stiffness.service_factor
    ));
    if input.demand.shear_kip.map_or(true, |v| v <= 0.0) {
        env.notes.info("No shear given; deflection load applied at the pole top");
    }

    let candidates_checked = checked.len();
    let (options, rejected): (Vec<_>, Vec<_>) = checked.into_iter().partition(SectionOption::passes);

    if let Some(first) = options.first() {
        env.notes.info(format!(
            "Default selection {} is the first passing section sorted by {:?}",
            first.designation, input.preferences.sort_by
        ));
        debug!(default = %first.designation, feasible = options.len(), "support selected");
        let default_selection = Some(first.designation.clone());
        return env.solved(SupportSelection {
            options,
            default_selection,
            binding_constraint: None,
            moment_per_support_kipft: moment,
            candidates_checked,
        });
    }

    let binding_constraint = if rejected.is_empty() {
        env.notes.push(
            NoteKind::NoFeasible,
            format!(
                "No {} sections of the requested family in the catalog",
                input.preferences.material
            ),
        );
        None
    } else {
        let binding = if rejected.iter().any(SectionOption::passes_strength) {
            BindingConstraint::Deflection
        } else {
            BindingConstraint::Strength
        };
        let explanation = match binding {
            BindingConstraint::Strength => "strength governs every candidate",
            BindingConstraint::Deflection => "deflection governs after strength screening",
        };
        env.notes
            .push(NoteKind::NoFeasible, format!("No feasible section: {}", explanation));
        if let Some(closest) = rejected.iter().max_by(|a, b| {
            a.margin
                .total_cmp(&b.margin)
                .then_with(|| b.designation.cmp(&a.designation))
        }) {
            env.notes.info(format!(
                "Closest alternative: {} reaches {:.0}% of the requirement (phi Mn {:.1} kip-ft); \
                 increase section, add supports or try a different family",
                closest.designation,
                closest.margin * 100.0,
                closest.capacity_kipft
            ));
        }
        Some(binding)
    };

    warn!(?binding_constraint, candidates_checked, "no feasible support section");
    env.infeasible(Some(SupportSelection {
        options: Vec::new(),
        default_selection: None,
        binding_constraint,
        moment_per_support_kipft: moment,
        candidates_checked,
    }))
}
