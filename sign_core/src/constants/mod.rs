//! # Versioned Constants Packs
//!
//! Every calibration number a solver consumes comes from a named, versioned
//! pack. A [`ConstantsSet`] bundles the four packs the solvers need and is
//! immutable once built; solvers take it by reference and record the
//! [`PackRef`] of each pack they read in their envelope trace.
//!
//! ```text
//! ConstantsSet
//! ├── exposure   (wind pressure, force and load factors)
//! ├── support    (pole strength, stiffness, material rules)
//! ├── footing    (embedment calibration)
//! └── baseplate  (plate, weld, anchor and bearing factors)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use sign_core::constants::ConstantsSet;
//!
//! let constants = ConstantsSet::builtin().unwrap();
//! assert_eq!(constants.footing.meta.id(), "footing:v1");
//! assert_eq!(constants.footing.meta.sha256.len(), 64);
//! ```

mod handle;
mod loader;
mod packs;

pub use handle::ConstantsHandle;
pub use loader::{load_dir, parse_pack};
pub use packs::*;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::envelope::sha256_hex;
use crate::errors::CalcResult;

pub const EXPOSURE: &str = "exposure";
pub const SUPPORT: &str = "support";
pub const FOOTING: &str = "footing";
pub const BASEPLATE: &str = "baseplate";

const BUILTIN_EXPOSURE: &str = include_str!("../../packs/exposure_v1.toml");
const BUILTIN_SUPPORT: &str = include_str!("../../packs/support_v1.toml");
const BUILTIN_FOOTING: &str = include_str!("../../packs/footing_v1.toml");
const BUILTIN_BASEPLATE: &str = include_str!("../../packs/baseplate_v1.toml");

static BUILTIN: Lazy<CalcResult<Arc<ConstantsSet>>> = Lazy::new(|| {
    ConstantsSet::from_sources(BUILTIN_EXPOSURE, BUILTIN_SUPPORT, BUILTIN_FOOTING, BUILTIN_BASEPLATE)
        .map(Arc::new)
});

/// Identity and provenance of a loaded pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackMeta {
    pub name: String,
    pub version: String,
    /// SHA-256 of the raw pack file, hex encoded
    pub sha256: String,
    pub source: Option<String>,
    pub references: Vec<String>,
}

impl PackMeta {
    /// `name:version`, e.g. `footing:v1`
    pub fn id(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }

    pub fn short_hash(&self) -> &str {
        &self.sha256[..self.sha256.len().min(8)]
    }

    pub fn pack_ref(&self) -> PackRef {
        PackRef {
            name: self.name.clone(),
            version: self.version.clone(),
            sha256: self.sha256.clone(),
        }
    }
}

/// What an envelope trace records about a pack it consulted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackRef {
    pub name: String,
    pub version: String,
    pub sha256: String,
}

/// A parsed pack: its metadata plus typed data.
#[derive(Debug, Clone, PartialEq)]
pub struct Pack<T> {
    pub meta: PackMeta,
    pub data: T,
}

/// The full set of packs the solvers read from.
#[derive(Debug, Clone)]
pub struct ConstantsSet {
    pub exposure: Pack<ExposurePack>,
    pub support: Pack<SupportPack>,
    pub footing: Pack<FootingPack>,
    pub baseplate: Pack<BaseplatePack>,
    /// When this set was assembled. Not part of any hash.
    pub loaded_at: DateTime<Utc>,
}

impl ConstantsSet {
    /// The packs shipped with the crate, parsed once per process.
    pub fn builtin() -> CalcResult<Arc<ConstantsSet>> {
        (*BUILTIN).clone()
    }

    /// Build a set from raw TOML text of each pack.
    pub fn from_sources(exposure: &str, support: &str, footing: &str, baseplate: &str) -> CalcResult<Self> {
        Ok(ConstantsSet {
            exposure: parse_pack(EXPOSURE, exposure)?,
            support: parse_pack(SUPPORT, support)?,
            footing: parse_pack(FOOTING, footing)?,
            baseplate: parse_pack(BASEPLATE, baseplate)?,
            loaded_at: Utc::now(),
        })
    }

    /// Refs for every pack in the set, sorted by name
    pub fn pack_refs(&self) -> Vec<PackRef> {
        let mut refs = vec![
            self.exposure.meta.pack_ref(),
            self.support.meta.pack_ref(),
            self.footing.meta.pack_ref(),
            self.baseplate.meta.pack_ref(),
        ];
        refs.sort();
        refs
    }

    /// Hash identifying the whole set; used in cache keys.
    pub fn fingerprint(&self) -> String {
        let joined = self
            .pack_refs()
            .iter()
            .map(|r| format!("{}:{}:{}", r.name, r.version, r.sha256))
            .collect::<Vec<_>>()
            .join(",");
        sha256_hex(joined.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::Exposure;

    #[test]
    fn test_builtin_packs_parse() {
        let set = ConstantsSet::builtin().unwrap();
        assert_eq!(set.exposure.meta.id(), "exposure:v1");
        assert_eq!(set.support.meta.id(), "support:v1");
        assert_eq!(set.baseplate.meta.id(), "baseplate:v1");
        assert!((set.footing.data.embedment.coefficient - 4.25).abs() < 1e-12);
        assert!((set.support.data.limits.aluminum_max_height_ft - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_builtin_is_shared() {
        let a = ConstantsSet::builtin().unwrap();
        let b = ConstantsSet::builtin().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_hash_tracks_raw_bytes() {
        let a: Pack<FootingPack> = parse_pack(FOOTING, BUILTIN_FOOTING).unwrap();
        let edited = BUILTIN_FOOTING.replace("calibration_factor = 1.0", "calibration_factor = 1.1");
        let b: Pack<FootingPack> = parse_pack(FOOTING, &edited).unwrap();
        assert_ne!(a.meta.sha256, b.meta.sha256);
        assert_eq!(a.meta.sha256, sha256_hex(BUILTIN_FOOTING.as_bytes()));
    }

    #[test]
    fn test_fingerprint_stable() {
        let a = ConstantsSet::from_sources(BUILTIN_EXPOSURE, BUILTIN_SUPPORT, BUILTIN_FOOTING, BUILTIN_BASEPLATE).unwrap();
        let b = ConstantsSet::from_sources(BUILTIN_EXPOSURE, BUILTIN_SUPPORT, BUILTIN_FOOTING, BUILTIN_BASEPLATE).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.pack_refs().len(), 4);
    }

    #[test]
    fn test_kz_exposure_c_at_15ft() {
        let set = ConstantsSet::builtin().unwrap();
        // ASCE 7 tabulates Kz = 0.85 for exposure C at 15 ft
        let kz = set.exposure.data.kz(Exposure::C, 15.0);
        assert!((kz - 0.85).abs() < 0.01);
        // Below 15 ft Kz is held at the 15 ft value
        assert_eq!(set.exposure.data.kz(Exposure::C, 5.0), kz);
        assert!(set.exposure.data.kz(Exposure::B, 30.0) < set.exposure.data.kz(Exposure::D, 30.0));
    }
}
