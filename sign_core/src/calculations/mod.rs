//! # Sign Structure Solvers
//!
//! Each solver module follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `*Result` / `*Solution` - Calculation results (JSON-serializable)
//! - `calculate(input, constants) -> CalcResult<...>` - Pure calculation
//! - an envelope entry point that validates, calculates and wraps the answer
//!   in an [`Envelope`](crate::envelope::Envelope); it never returns `Err`
//!
//! The solvers compose linearly:
//!
//! ```text
//! loads ──► support ──┬──► foundation
//!                     └──► baseplate
//! ```
//!
//! ## Available Solvers
//!
//! - [`loads`] - Cabinet geometry and site data to design loads
//! - [`support`] - Feasible pole sections for a demand
//! - [`foundation`] - Direct burial embedment depth
//! - [`baseplate`] - Plate, weld, anchor and bearing checks

pub mod baseplate;
pub mod foundation;
pub mod loads;
pub mod support;

pub use baseplate::{check_baseplate, BasePlateInput, BasePlateSolution, CheckName, CheckResult};
pub use foundation::{depth_schedule, solve_foundation, FoundationInput, FoundationResult, ScheduleInput, ScheduleResult};
pub use loads::{derive_loads, Cabinet, CabinetGeometry, LoadDerivation, LoadInput};
pub use support::{select_support, SelectionPreferences, SortKey, SupportDemand, SupportInput, SupportSelection};

/// Reported margin when demand is effectively zero
pub const MARGIN_CAP: f64 = 999.0;

/// Capacity ÷ demand, capped at [`MARGIN_CAP`]
pub(crate) fn margin(capacity: f64, demand: f64) -> f64 {
    if demand <= 1e-9 {
        MARGIN_CAP
    } else {
        (capacity / demand).min(MARGIN_CAP)
    }
}

/// Reject non-finite or non-positive values
pub(crate) fn require_positive(field: &str, value: f64, reason: &str) -> crate::errors::CalcResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(crate::errors::CalcError::invalid_input(field, value.to_string(), reason));
    }
    Ok(())
}

/// Reject non-finite or negative values
pub(crate) fn require_non_negative(field: &str, value: f64, reason: &str) -> crate::errors::CalcResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(crate::errors::CalcError::invalid_input(field, value.to_string(), reason));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin() {
        assert!((margin(10.0, 4.0) - 2.5).abs() < 1e-12);
        assert_eq!(margin(10.0, 0.0), MARGIN_CAP);
        assert_eq!(margin(1e6, 1.0), MARGIN_CAP);
    }

    #[test]
    fn test_require_positive() {
        assert!(require_positive("x", 1.0, "").is_ok());
        assert!(require_positive("x", 0.0, "").is_err());
        assert!(require_positive("x", f64::NAN, "").is_err());
        assert!(require_non_negative("x", 0.0, "").is_ok());
        assert!(require_non_negative("x", -1.0, "").is_err());
    }
}
