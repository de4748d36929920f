//! # Support Section Catalog
//!
//! Candidate pole sections for sign supports. A catalog is an ordered,
//! read-only list of [`CandidateSection`] records; every family (pipe,
//! square tube, wide flange) uses the same record and the same checks, told
//! apart only by the `family` tag.
//!
//! ## Data Source
//!
//! The built-in catalog is a starter set taken from the AISC Steel
//! Construction Manual (16th Ed.) Table 1-1, 1-12 and 1-14 plus schedule 40
//! 6061-T6 aluminum pipe. Larger catalogs load from an AISC-style CSV export
//! or a JSON array.
//!
//! ## Example
//!
//! ```rust
//! use sign_core::sections::{SectionCatalog, SectionFamily};
//!
//! let catalog = SectionCatalog::builtin();
//! let pipe = catalog.lookup("pipe8std").unwrap();
//! assert_eq!(pipe.family, SectionFamily::Pipe);
//! assert!(catalog.by_family(&[SectionFamily::Pipe]).len() > 3);
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Cross-section family of a support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionFamily {
    /// Round pipe or round HSS
    #[serde(alias = "round")]
    Pipe,
    /// Square HSS tube
    #[serde(alias = "tube")]
    SquareTube,
    /// W-shape
    WideFlange,
}

impl SectionFamily {
    pub const ALL: [SectionFamily; 3] = [SectionFamily::Pipe, SectionFamily::SquareTube, SectionFamily::WideFlange];

    /// Parse from an AISC type code (`PIPE`, `HSS`, `W`)
    pub fn from_aisc_code(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PIPE" | "ROUND" => Some(SectionFamily::Pipe),
            "HSS" | "TUBE" | "SQUARE_TUBE" => Some(SectionFamily::SquareTube),
            "W" | "WIDE_FLANGE" => Some(SectionFamily::WideFlange),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SectionFamily::Pipe => "Pipe",
            SectionFamily::SquareTube => "Square Tube",
            SectionFamily::WideFlange => "Wide Flange (W)",
        }
    }

    /// Yield strength assumed when a catalog row doesn't give one
    pub fn default_fy_ksi(&self) -> f64 {
        match self {
            SectionFamily::Pipe => 35.0,       // ASTM A53 Gr. B
            SectionFamily::SquareTube => 46.0, // ASTM A500 Gr. B
            SectionFamily::WideFlange => 50.0, // ASTM A992
        }
    }
}

impl fmt::Display for SectionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for SectionFamily {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionFamily::from_aisc_code(s)
            .ok_or_else(|| CalcError::invalid_input("family", s, "Family must be pipe, square_tube or wide_flange"))
    }
}

/// Support material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportMaterial {
    Steel,
    Aluminum,
}

impl SupportMaterial {
    pub fn display_name(&self) -> &'static str {
        match self {
            SupportMaterial::Steel => "steel",
            SupportMaterial::Aluminum => "aluminum",
        }
    }
}

impl fmt::Display for SupportMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for SupportMaterial {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "steel" => Ok(SupportMaterial::Steel),
            "aluminum" | "aluminium" => Ok(SupportMaterial::Aluminum),
            other => Err(CalcError::invalid_input("material", other, "Material must be steel or aluminum")),
        }
    }
}

/// One catalog entry.
///
/// All section properties are strong-axis, US customary units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSection {
    /// Catalog label, e.g. "PIPE8STD", "HSS8X8X3/8", "W12X26"
    pub designation: String,
    pub family: SectionFamily,
    #[serde(default = "default_material")]
    pub material: SupportMaterial,
    /// Weight per linear foot (lb/ft)
    pub weight_plf: f64,
    /// Elastic section modulus (in³)
    pub sx_in3: f64,
    /// Moment of inertia (in⁴)
    pub ix_in4: f64,
    /// Overall depth or outside diameter (in)
    pub depth_in: f64,
    /// Yield strength (ksi)
    pub fy_ksi: f64,
}

fn default_material() -> SupportMaterial {
    SupportMaterial::Steel
}

impl CandidateSection {
    /// Check that the properties can carry bending at all
    pub fn can_bend(&self) -> bool {
        self.sx_in3 > 0.0 && self.ix_in4 > 0.0 && self.fy_ksi > 0.0
    }
}

impl fmt::Display for CandidateSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.1} plf, Sx={:.2} in³, Ix={:.1} in⁴, Fy={} ksi)",
            self.designation, self.weight_plf, self.sx_in3, self.ix_in4, self.fy_ksi
        )
    }
}

/// Ordered catalog of candidate sections.
///
/// Order is the order sections were supplied in; selection sorts its own
/// copy and never relies on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionCatalog {
    sections: Vec<CandidateSection>,
}

static BUILTIN_CATALOG: Lazy<SectionCatalog> = Lazy::new(builtin_catalog);

impl SectionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sections(sections: Vec<CandidateSection>) -> Self {
        let mut catalog = Self::new();
        for section in sections {
            catalog.insert(section);
        }
        catalog
    }

    /// Shared starter catalog
    pub fn builtin() -> &'static SectionCatalog {
        &BUILTIN_CATALOG
    }

    /// Parse a JSON array of sections
    pub fn from_json(json: &str) -> CalcResult<Self> {
        let sections: Vec<CandidateSection> = serde_json::from_str(json)?;
        Ok(Self::from_sections(sections))
    }

    /// Load sections from an AISC-style CSV export.
    ///
    /// Recognised columns (case-insensitive): `Type`, `AISC_Manual_Label`
    /// (or `Designation`), `W`, `Sx`, `Ix`, `d` / `Ht` / `OD`, and the
    /// optional `Fy` and `Material`. Rows with an unknown type or without
    /// bending properties are skipped.
    pub fn load_from_csv(path: &Path) -> CalcResult<Self> {
        let display = path.display().to_string();
        let text = fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("open", &display, format!("Failed to open CSV: {}", e)))?;
        Self::parse_csv(&text).map_err(|e| match e {
            CalcError::SerializationError { reason } => CalcError::file_error("parse", &display, reason),
            other => other,
        })
    }

    /// Parse CSV text in the layout [`load_from_csv`](Self::load_from_csv) reads
    pub fn parse_csv(text: &str) -> CalcResult<Self> {
        let mut lines = text.lines();
        let header_line = lines
            .next()
            .ok_or_else(|| CalcError::serialization("CSV file is empty"))?;

        let headers: Vec<&str> = header_line.split(',').map(str::trim).collect();
        let col_index = |name: &str| -> Option<usize> { headers.iter().position(|h| h.eq_ignore_ascii_case(name)) };

        let type_idx = col_index("Type").ok_or_else(|| CalcError::serialization("Missing 'Type' column"))?;
        let label_idx = col_index("AISC_Manual_Label")
            .or_else(|| col_index("Designation"))
            .ok_or_else(|| CalcError::serialization("Missing 'AISC_Manual_Label' column"))?;

        let w_idx = col_index("W");
        let sx_idx = col_index("Sx");
        let ix_idx = col_index("Ix");
        let d_idx = col_index("d");
        let ht_idx = col_index("Ht");
        let od_idx = col_index("OD");
        let fy_idx = col_index("Fy");
        let material_idx = col_index("Material");

        let mut catalog = SectionCatalog::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').collect();
            let field = |idx: Option<usize>| idx.and_then(|i| fields.get(i)).copied();
            let get_f64 = |idx: Option<usize>| field(idx).and_then(parse_optional_f64);

            let designation = field(Some(label_idx)).unwrap_or("").trim().to_string();
            if designation.is_empty() {
                continue;
            }
            let Some(mut family) = field(Some(type_idx)).and_then(SectionFamily::from_aisc_code) else {
                continue;
            };
            // Round HSS rows carry an OD
            if family == SectionFamily::SquareTube && get_f64(od_idx).is_some() {
                family = SectionFamily::Pipe;
            }
            let material = match field(material_idx).map(str::trim).filter(|s| !s.is_empty()) {
                Some(m) => m.parse()?,
                None => SupportMaterial::Steel,
            };

            let section = CandidateSection {
                designation,
                family,
                material,
                weight_plf: get_f64(w_idx).unwrap_or(0.0),
                sx_in3: get_f64(sx_idx).unwrap_or(0.0),
                ix_in4: get_f64(ix_idx).unwrap_or(0.0),
                depth_in: get_f64(d_idx)
                    .or_else(|| get_f64(ht_idx))
                    .or_else(|| get_f64(od_idx))
                    .unwrap_or(0.0),
                fy_ksi: get_f64(fy_idx).unwrap_or_else(|| family.default_fy_ksi()),
            };
            if section.can_bend() {
                catalog.insert(section);
            }
        }
        Ok(catalog)
    }

    /// Append a section, replacing any entry with the same designation in place
    pub fn insert(&mut self, section: CandidateSection) {
        match self
            .sections
            .iter_mut()
            .find(|s| s.designation.eq_ignore_ascii_case(&section.designation))
        {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }

    /// Look up a section by designation (case-insensitive, spaces ignored)
    pub fn lookup(&self, designation: &str) -> CalcResult<&CandidateSection> {
        let key = normalize(designation);
        self.sections
            .iter()
            .find(|s| normalize(&s.designation) == key)
            .ok_or_else(|| CalcError::section_not_found(designation))
    }

    /// Sections in any of `families`, in catalog order. Empty slice means all.
    pub fn by_family(&self, families: &[SectionFamily]) -> Vec<&CandidateSection> {
        self.sections
            .iter()
            .filter(|s| families.is_empty() || families.contains(&s.family))
            .collect()
    }

    pub fn sections(&self) -> &[CandidateSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

fn normalize(designation: &str) -> String {
    designation
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Parse an optional f64 from a CSV field
///
/// Returns None for empty strings, dashes, or invalid numbers.
fn parse_optional_f64(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed == "—" {
        return None;
    }
    f64::from_str(trimmed).ok()
}

// ============================================================================
// Built-in Starter Catalog
// ============================================================================

/// Starter catalog for use without a CSV file
pub fn builtin_catalog() -> SectionCatalog {
    use SectionFamily::*;
    use SupportMaterial::*;

    // (designation, family, material, weight plf, Sx in³, Ix in⁴, depth in, Fy ksi)
    let rows = [
        // Standard weight pipe, A53 Gr. B
        ("PIPE3STD", Pipe, Steel, 7.58, 1.72, 3.02, 3.50, 35.0),
        ("PIPE4STD", Pipe, Steel, 10.8, 3.21, 6.82, 4.50, 35.0),
        ("PIPE5STD", Pipe, Steel, 14.6, 5.45, 15.2, 5.56, 35.0),
        ("PIPE6STD", Pipe, Steel, 19.0, 8.50, 28.1, 6.63, 35.0),
        ("PIPE6XS", Pipe, Steel, 28.6, 12.1, 40.1, 6.63, 35.0),
        ("PIPE8STD", Pipe, Steel, 28.6, 16.8, 72.5, 8.63, 35.0),
        ("PIPE8XS", Pipe, Steel, 43.4, 24.5, 105.0, 8.63, 35.0),
        ("PIPE10STD", Pipe, Steel, 40.5, 29.9, 161.0, 10.8, 35.0),
        ("PIPE12STD", Pipe, Steel, 49.6, 43.8, 279.0, 12.8, 35.0),
        // Square HSS, A500 Gr. B
        ("HSS4X4X1/4", SquareTube, Steel, 12.2, 3.90, 7.80, 4.0, 46.0),
        ("HSS6X6X1/4", SquareTube, Steel, 19.0, 9.54, 28.6, 6.0, 46.0),
        ("HSS6X6X3/8", SquareTube, Steel, 27.5, 13.2, 39.5, 6.0, 46.0),
        ("HSS8X8X1/4", SquareTube, Steel, 25.8, 17.7, 70.7, 8.0, 46.0),
        ("HSS8X8X3/8", SquareTube, Steel, 37.7, 25.0, 100.0, 8.0, 46.0),
        ("HSS10X10X3/8", SquareTube, Steel, 47.9, 40.4, 202.0, 10.0, 46.0),
        ("HSS12X12X1/2", SquareTube, Steel, 76.1, 82.6, 495.0, 12.0, 46.0),
        // W-shapes, A992
        ("W8X18", WideFlange, Steel, 18.0, 15.2, 61.9, 8.14, 50.0),
        ("W10X22", WideFlange, Steel, 22.0, 23.2, 118.0, 10.2, 50.0),
        ("W12X26", WideFlange, Steel, 26.0, 33.4, 204.0, 12.2, 50.0),
        ("W14X30", WideFlange, Steel, 30.0, 42.0, 291.0, 13.8, 50.0),
        ("W16X36", WideFlange, Steel, 36.0, 56.5, 448.0, 15.9, 50.0),
        ("W18X50", WideFlange, Steel, 50.0, 88.9, 800.0, 18.0, 50.0),
        ("W21X62", WideFlange, Steel, 62.0, 127.0, 1330.0, 21.0, 50.0),
        ("W24X76", WideFlange, Steel, 76.0, 176.0, 2100.0, 23.9, 50.0),
        // Schedule 40 aluminum pipe, 6061-T6
        ("AL-PIPE4-SCH40", Pipe, Aluminum, 3.73, 3.21, 7.23, 4.50, 35.0),
        ("AL-PIPE6-SCH40", Pipe, Aluminum, 6.56, 8.50, 28.1, 6.63, 35.0),
        ("AL-PIPE8-SCH40", Pipe, Aluminum, 9.88, 16.8, 72.5, 8.63, 35.0),
    ];

    let mut catalog = SectionCatalog::new();
    for (designation, family, material, weight_plf, sx_in3, ix_in4, depth_in, fy_ksi) in rows {
        catalog.insert(CandidateSection {
            designation: designation.to_string(),
            family,
            material,
            weight_plf,
            sx_in3,
            ix_in4,
            depth_in,
            fy_ksi,
        });
    }
    catalog
}
