//! # Unit Types
//!
//! Newtype wrappers for the handful of US customary units the sign solvers
//! move between. Serialization is transparent so JSON stays plain numbers.
//!
//! Solver inputs are written in the unit named by the field suffix (`_ft`,
//! `_kipft`, `_ksi`, ...); these wrappers are used where a value changes unit
//! so the conversion factor lives in one place.
//!
//! ```rust
//! use sign_core::units::{KipFt, KipIn, Ksi, Psi};
//!
//! let m: KipIn = KipFt(10.0).into();
//! assert_eq!(m.0, 120.0);
//!
//! let fc: Ksi = Psi(4000.0).into();
//! assert_eq!(fc.0, 4.0);
//! ```

use serde::{Deserialize, Serialize};

macro_rules! unit {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub f64);
    };
}

macro_rules! convert {
    ($from:ident => $to:ident, $factor:expr) => {
        impl From<$from> for $to {
            fn from(v: $from) -> Self {
                $to(v.0 * $factor)
            }
        }
        impl From<$to> for $from {
            fn from(v: $to) -> Self {
                $from(v.0 / $factor)
            }
        }
    };
}

// Length
unit!(
    /// Length in feet
    Feet
);
unit!(
    /// Length in inches
    Inches
);
convert!(Feet => Inches, 12.0);

// Force
unit!(
    /// Force in pounds
    Pounds
);
unit!(
    /// Force in kips (1000 lb)
    Kips
);
convert!(Kips => Pounds, 1000.0);

// Moment
unit!(
    /// Moment in kip-feet
    KipFt
);
unit!(
    /// Moment in kip-inches
    KipIn
);
unit!(
    /// Moment in pound-feet
    LbFt
);
convert!(KipFt => KipIn, 12.0);
convert!(KipFt => LbFt, 1000.0);

// Stress
unit!(
    /// Stress in pounds per square inch
    Psi
);
unit!(
    /// Stress in kips per square inch
    Ksi
);
convert!(Ksi => Psi, 1000.0);
