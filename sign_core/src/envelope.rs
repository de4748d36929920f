//! # Audit Envelope
//!
//! Every solver answer leaves the crate wrapped in an [`Envelope`]:
//!
//! ```text
//! Envelope
//! ├── result       (solver output, or null when it could not solve)
//! ├── assumptions  (human-readable notes, in the order they were made)
//! ├── confidence   (0..=1)
//! └── trace        (solver + build identity, packs consulted, hashes)
//! ```
//!
//! The content hash is SHA-256 over the result's canonical JSON: floats
//! rounded to [`HASH_PRECISION`] decimals, object keys sorted. Two runs that
//! agree to that precision hash identically.
//!
//! Success, abstain and invalid input all use this same shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};

use crate::constants::{PackMeta, PackRef};
use crate::errors::CalcError;

/// Decimal places kept when rounding floats for hashing
pub const HASH_PRECISION: i32 = 3;

/// Lower bound on confidence for a valid input that could not be solved
const ABSTAIN_CONFIDENCE_FLOOR: f64 = 0.05;

/// SHA-256 of `bytes`, lowercase hex
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Round every float in a JSON tree to `precision` decimals.
///
/// Integers pass through untouched and negative zero becomes zero.
pub fn round_floats(value: Value, precision: i32) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => {
            let scale = 10f64.powi(precision);
            let x = n.as_f64().unwrap_or(0.0);
            let mut rounded = (x * scale).round() / scale;
            if rounded == 0.0 {
                rounded = 0.0;
            }
            Number::from_f64(rounded).map(Value::Number).unwrap_or(Value::Null)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(|v| round_floats(v, precision)).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, round_floats(v, precision)))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

/// Canonical JSON text: rounded floats, sorted keys.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, CalcError> {
    let tree = round_floats(serde_json::to_value(value)?, HASH_PRECISION);
    Ok(serde_json::to_string(&tree)?)
}

/// Content hash of any serializable value
pub fn content_hash<T: Serialize>(value: &T) -> Result<String, CalcError> {
    Ok(sha256_hex(canonical_json(value)?.as_bytes()))
}

/// Identifier of the code that produced an envelope
pub fn build_id() -> String {
    let base = format!("{}@{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    match option_env!("SIGN_BUILD_ID") {
        Some(id) => format!("{}+{}", base, id),
        None => base,
    }
}

/// The solvers that produce envelopes, with their semantic versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Solver {
    LoadDerivation,
    SupportSelection,
    FoundationDepth,
    FoundationSchedule,
    BaseplateChecks,
}

impl Solver {
    pub fn name(&self) -> &'static str {
        match self {
            Solver::LoadDerivation => "load_derivation",
            Solver::SupportSelection => "support_selection",
            Solver::FoundationDepth => "foundation_depth",
            Solver::FoundationSchedule => "foundation_schedule",
            Solver::BaseplateChecks => "baseplate_checks",
        }
    }

    /// Bump when a solver's numeric behaviour changes.
    pub fn version(&self) -> &'static str {
        match self {
            Solver::LoadDerivation => "1.2.0",
            Solver::SupportSelection => "1.1.0",
            Solver::FoundationDepth | Solver::FoundationSchedule => "1.3.0",
            Solver::BaseplateChecks => "1.2.0",
        }
    }
}

/// How a solver call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A result satisfying every governing constraint
    Solved,
    /// Valid input, but no acceptable solution; result may be partial
    Abstained,
    /// Malformed or physically impossible input
    Invalid,
}

/// The audit block attached to every envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub solver: String,
    pub solver_version: String,
    pub build: String,
    pub outcome: Outcome,
    /// Every constants pack consulted, sorted by name
    pub packs: Vec<PackRef>,
    /// Design code clauses behind the numbers
    pub references: Vec<String>,
    /// The request, rounded like the result
    pub inputs: Value,
    pub input_sha256: String,
    pub content_sha256: String,
    /// A human engineer should look at this before it is used
    pub request_engineering: bool,
}

/// Canonical response shape of every solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub result: Option<T>,
    pub assumptions: Vec<String>,
    pub confidence: f64,
    pub trace: Trace,
}

impl<T: Serialize> Envelope<T> {
    /// Recompute the content hash and compare it with the recorded one.
    pub fn verify(&self) -> bool {
        content_hash(&self.result)
            .map(|hash| hash == self.trace.content_sha256)
            .unwrap_or(false)
    }
}

impl<T> Envelope<T> {
    pub fn is_solved(&self) -> bool {
        self.trace.outcome == Outcome::Solved
    }
}

/// Everything about a call the trace records besides the result itself.
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub solver: Solver,
    pub inputs: Value,
    pub packs: Vec<PackRef>,
    pub references: Vec<String>,
    pub outcome: Outcome,
    pub request_engineering: bool,
}

/// Wrap a raw result, its assumptions and a confidence into an envelope.
pub fn wrap<T: Serialize>(
    result: Option<T>,
    assumptions: Vec<String>,
    confidence: f64,
    context: TraceContext,
) -> Envelope<T> {
    let inputs = round_floats(context.inputs, HASH_PRECISION);
    let input_sha256 = sha256_hex(inputs.to_string().as_bytes());
    // A result that can't be serialized hashes as null.
    let content_sha256 = content_hash(&result)
        .or_else(|_| content_hash(&Value::Null))
        .unwrap_or_default();

    let mut packs = context.packs;
    packs.sort();
    packs.dedup();

    Envelope {
        result,
        assumptions,
        confidence: confidence.clamp(0.0, 1.0),
        trace: Trace {
            solver: context.solver.name().to_string(),
            solver_version: context.solver.version().to_string(),
            build: build_id(),
            outcome: context.outcome,
            packs,
            references: context.references,
            inputs,
            input_sha256,
            content_sha256,
            request_engineering: context.request_engineering,
        },
    }
}

/// Kinds of assumption note, each with its confidence penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    /// Plain statement of a modelling assumption
    Info,
    /// Upstream data quality; the penalty arrives through the base confidence
    Upstream,
    Warning,
    EngineeringReview,
    FailedCheck,
    NoFeasible,
    Abstain,
}

impl NoteKind {
    pub fn penalty(&self) -> f64 {
        match self {
            NoteKind::Info | NoteKind::Upstream => 0.0,
            NoteKind::Warning => 0.1,
            NoteKind::EngineeringReview => 0.3,
            NoteKind::FailedCheck => 0.3,
            NoteKind::NoFeasible => 0.4,
            NoteKind::Abstain => 0.5,
        }
    }
}

/// Ordered assumption notes for one call.
#[derive(Debug, Clone, Default)]
pub struct Assumptions {
    notes: Vec<(NoteKind, String)>,
}

impl Assumptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: NoteKind, text: impl Into<String>) {
        self.notes.push((kind, text.into()));
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(NoteKind::Info, text);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.push(NoteKind::Warning, format!("Warning: {}", text.into()));
    }

    /// `base` less every note's penalty, clamped to [0, 1]
    pub fn confidence(&self, base: f64) -> f64 {
        let penalty: f64 = self.notes.iter().map(|(kind, _)| kind.penalty()).sum();
        (base - penalty).clamp(0.0, 1.0)
    }

    pub fn texts(&self) -> Vec<String> {
        self.notes.iter().map(|(_, text)| text.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Accumulates trace context and notes while a solver runs.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    solver: Solver,
    inputs: Value,
    packs: Vec<PackRef>,
    references: Vec<String>,
    base_confidence: f64,
    request_engineering: bool,
    pub notes: Assumptions,
}

impl EnvelopeBuilder {
    pub fn new<I: Serialize>(solver: Solver, input: &I) -> Self {
        EnvelopeBuilder {
            solver,
            inputs: serde_json::to_value(input).unwrap_or(Value::Null),
            packs: Vec::new(),
            references: Vec::new(),
            base_confidence: 1.0,
            request_engineering: false,
            notes: Assumptions::new(),
        }
    }

    /// Record that the solver read from `pack`.
    pub fn pack(&mut self, pack: &PackMeta) -> &mut Self {
        self.packs.push(pack.pack_ref());
        for reference in &pack.references {
            if !self.references.contains(reference) {
                self.references.push(reference.clone());
            }
        }
        self
    }

    /// Starting confidence before note penalties, e.g. from upstream data.
    pub fn base_confidence(&mut self, confidence: f64) -> &mut Self {
        self.base_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn request_engineering(&mut self, reason: impl Into<String>) -> &mut Self {
        self.request_engineering = true;
        self.notes.push(NoteKind::EngineeringReview, format!("Request engineering review: {}", reason.into()));
        self
    }

    fn context(&self, outcome: Outcome) -> TraceContext {
        TraceContext {
            solver: self.solver,
            inputs: self.inputs.clone(),
            packs: self.packs.clone(),
            references: self.references.clone(),
            outcome,
            request_engineering: self.request_engineering,
        }
    }

    pub fn solved<T: Serialize>(self, result: T) -> Envelope<T> {
        let confidence = self.notes.confidence(self.base_confidence);
        wrap(Some(result), self.notes.texts(), confidence, self.context(Outcome::Solved))
    }

    /// Valid input that could not be solved. Confidence stays above zero.
    pub fn abstained<T: Serialize>(mut self, result: Option<T>, reason: impl Into<String>) -> Envelope<T> {
        self.notes.push(NoteKind::Abstain, format!("Abstain: {}", reason.into()));
        let confidence = self
            .notes
            .confidence(self.base_confidence)
            .max(ABSTAIN_CONFIDENCE_FLOOR);
        wrap(result, self.notes.texts(), confidence, self.context(Outcome::Abstained))
    }

    /// Like [`abstained`](Self::abstained) but keeps the notes already made
    /// as the full explanation.
    pub fn infeasible<T: Serialize>(self, result: Option<T>) -> Envelope<T> {
        let confidence = self
            .notes
            .confidence(self.base_confidence)
            .max(ABSTAIN_CONFIDENCE_FLOOR);
        wrap(result, self.notes.texts(), confidence, self.context(Outcome::Abstained))
    }

    /// Validation failure: null result, zero confidence, the error as a note.
    pub fn invalid<T: Serialize>(mut self, error: &CalcError) -> Envelope<T> {
        self.notes.push(NoteKind::Abstain, format!("Validation failed: {}", error));
        wrap(None, self.notes.texts(), 0.0, self.context(Outcome::Invalid))
    }
}
