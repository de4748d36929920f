//! # sign_core - Sign Structure Design Engine
//!
//! `sign_core` turns cabinet geometry and site data into design loads, pole
//! selections, foundation depths and baseplate checks. Every answer comes back
//! in an audit [`Envelope`]: the result, the assumptions made getting there, a
//! confidence, and a trace of the solver version, constants packs and content
//! hashes so the same request can be reproduced exactly.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions of input and a [`ConstantsSet`]
//! - **JSON-First**: All inputs, results and envelopes are Serialize/Deserialize
//! - **Never throws at the boundary**: bad input comes back as an invalid envelope
//! - **Versioned constants**: every calibration number lives in a hashed TOML pack
//!
//! ## Quick Start
//!
//! ```rust
//! use sign_core::calculations::{derive_loads, Cabinet, CabinetGeometry, LoadInput};
//! use sign_core::site::{Exposure, SiteEnvironmental};
//! use sign_core::ConstantsSet;
//!
//! let constants = ConstantsSet::builtin().unwrap();
//! let input = LoadInput {
//!     geometry: CabinetGeometry {
//!         overall_height_ft: 25.0,
//!         cabinets: vec![Cabinet::new(8.0, 4.0, 10.0)],
//!     },
//!     site: SiteEnvironmental::manual(115.0, Exposure::C),
//! };
//!
//! let envelope = derive_loads(&input, &constants);
//! assert!(envelope.is_solved());
//! assert!(envelope.verify());
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - The four solvers
//! - [`envelope`] - Audit envelope, assumptions and canonical hashing
//! - [`constants`] - Versioned calibration packs and hot reload
//! - [`sections`] - Pole section catalog
//! - [`site`] - Site environmental data
//! - [`cache`] - Memo of solver envelopes
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod cache;
pub mod calculations;
pub mod constants;
pub mod envelope;
pub mod errors;
pub mod sections;
pub mod site;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{check_baseplate, depth_schedule, derive_loads, select_support, solve_foundation};
pub use constants::{ConstantsHandle, ConstantsSet};
pub use envelope::{Envelope, Outcome, Solver};
pub use errors::{CalcError, CalcResult};
pub use sections::SectionCatalog;
