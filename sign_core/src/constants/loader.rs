//! Reading pack files from TOML text or a directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use super::{ConstantsSet, Pack, PackMeta};
use crate::envelope::sha256_hex;
use crate::errors::{CalcError, CalcResult};

#[derive(Debug, Deserialize)]
struct PackHeader {
    name: String,
    version: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    references: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PackFile<T> {
    pack: PackHeader,
    #[serde(flatten)]
    data: T,
}

/// Parse one pack from its raw TOML text.
///
/// The content hash is taken over the exact bytes given, so the same file
/// always yields the same hash regardless of how it is parsed.
pub fn parse_pack<T: DeserializeOwned>(expected_name: &str, raw: &str) -> CalcResult<Pack<T>> {
    let file: PackFile<T> = toml::from_str(raw)
        .map_err(|e| CalcError::pack_error(expected_name, e.to_string()))?;

    if file.pack.name != expected_name {
        return Err(CalcError::pack_error(
            expected_name,
            format!("header names pack '{}'", file.pack.name),
        ));
    }
    version_number(&file.pack.version).ok_or_else(|| {
        CalcError::pack_error(
            expected_name,
            format!("version '{}' is not of the form v<N>", file.pack.version),
        )
    })?;

    let meta = PackMeta {
        name: file.pack.name,
        version: file.pack.version,
        sha256: sha256_hex(raw.as_bytes()),
        source: file.pack.source,
        references: file.pack.references,
    };
    info!(name = %meta.name, version = %meta.version, sha256 = %meta.short_hash(), "constants pack loaded");

    Ok(Pack { meta, data: file.data })
}

/// Numeric part of a `v<N>` version tag
pub(crate) fn version_number(version: &str) -> Option<u32> {
    version.strip_prefix('v')?.parse().ok()
}

/// Split a `<name>_v<N>.toml` file name into `(name, N)`
fn split_file_name(path: &Path) -> Option<(String, u32)> {
    if path.extension()?.to_str()? != "toml" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (name, version) = stem.rsplit_once("_v")?;
    let number = version.parse().ok()?;
    Some((name.to_string(), number))
}

/// Load a complete constants set from a directory of `<name>_v<N>.toml` files.
///
/// When several versions of a pack are present the highest version wins.
/// Files that don't follow the naming pattern are ignored. A header `version`
/// that disagrees with the file name is an error. The set is only returned
/// once every required pack has parsed.
pub fn load_dir(dir: &Path) -> CalcResult<ConstantsSet> {
    let display = dir.display().to_string();
    let entries = fs::read_dir(dir)
        .map_err(|e| CalcError::file_error("read_dir", &display, e.to_string()))?;

    let mut newest: BTreeMap<String, (u32, PathBuf)> = BTreeMap::new();
    for entry in entries {
        let path = entry
            .map_err(|e| CalcError::file_error("read_dir", &display, e.to_string()))?
            .path();
        let Some((name, number)) = split_file_name(&path) else {
            continue;
        };
        match newest.get(&name) {
            Some((current, _)) if *current >= number => {}
            _ => {
                newest.insert(name, (number, path));
            }
        }
    }

    let read = |name: &str| -> CalcResult<String> {
        let (_, path) = newest
            .get(name)
            .ok_or_else(|| CalcError::pack_error(name, format!("no {}_v<N>.toml in {}", name, display)))?;
        fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))
    };

    let set = ConstantsSet::from_sources(
        &read(super::EXPOSURE)?,
        &read(super::SUPPORT)?,
        &read(super::FOOTING)?,
        &read(super::BASEPLATE)?,
    )?;

    for meta in [&set.exposure.meta, &set.support.meta, &set.footing.meta, &set.baseplate.meta] {
        let file_number = newest.get(&meta.name).map(|(number, _)| *number);
        if version_number(&meta.version) != file_number {
            return Err(CalcError::pack_error(
                meta.name.as_str(),
                format!(
                    "header version '{}' does not match file {}_v{}.toml",
                    meta.version,
                    meta.name,
                    file_number.unwrap_or_default()
                ),
            ));
        }
    }
    Ok(set)
}
