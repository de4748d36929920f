//! # Pylon CLI
//!
//! Runs one sign design solver on a JSON request and prints the audit
//! envelope as pretty JSON on stdout. Logs go to stderr (`RUST_LOG`, default
//! `info`).
//!
//! ```text
//! sign_cli <solver> <request.json|-> [--packs <dir>] [--catalog <file.csv|file.json>]
//!
//! solvers: loads, support, foundation, schedule, baseplate
//! ```
//!
//! `--packs` (or `SIGN_PACKS_DIR`) loads constants packs from a directory
//! instead of the built-in set.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info};

use sign_core::calculations::{BasePlateInput, FoundationInput, LoadInput, ScheduleInput, SupportInput};
use sign_core::constants::load_dir;
use sign_core::{
    check_baseplate, depth_schedule, derive_loads, select_support, solve_foundation, CalcError, CalcResult,
    ConstantsSet, Envelope, SectionCatalog,
};

const USAGE: &str = "usage: sign_cli <loads|support|foundation|schedule|baseplate> <request.json|-> [--packs <dir>] [--catalog <file>]";

struct Args {
    solver: String,
    request: String,
    packs: Option<PathBuf>,
    catalog: Option<PathBuf>,
}

impl Args {
    fn parse(mut raw: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut positional = Vec::new();
        let mut packs = env::var_os("SIGN_PACKS_DIR").map(PathBuf::from);
        let mut catalog = None;

        while let Some(arg) = raw.next() {
            match arg.as_str() {
                "--packs" => packs = Some(raw.next().ok_or("--packs needs a directory")?.into()),
                "--catalog" => catalog = Some(raw.next().ok_or("--catalog needs a file")?.into()),
                "-h" | "--help" => return Err(USAGE.to_string()),
                flag if flag.starts_with("--") => return Err(format!("unknown option {}", flag)),
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        match (positional.next(), positional.next(), positional.next()) {
            (Some(solver), Some(request), None) => Ok(Args {
                solver,
                request,
                packs,
                catalog,
            }),
            _ => Err(USAGE.to_string()),
        }
    }
}

fn read_request(path: &str) -> CalcResult<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CalcError::file_error("read", "<stdin>", e.to_string()))?;
        return Ok(buf);
    }
    fs::read_to_string(path).map_err(|e| CalcError::file_error("read", path, e.to_string()))
}

fn load_constants(dir: Option<&Path>) -> CalcResult<Arc<ConstantsSet>> {
    match dir {
        Some(dir) => {
            info!(dir = %dir.display(), "loading constants packs");
            load_dir(dir).map(Arc::new)
        }
        None => ConstantsSet::builtin(),
    }
}

fn load_catalog(path: Option<&Path>) -> CalcResult<SectionCatalog> {
    let Some(path) = path else {
        return Ok(SectionCatalog::builtin().clone());
    };
    let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let raw = fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;
        SectionCatalog::from_json(&raw)
    } else {
        SectionCatalog::load_from_csv(path)
    }
}

fn parse<I: DeserializeOwned>(raw: &str) -> CalcResult<I> {
    serde_json::from_str(raw).map_err(CalcError::from)
}

fn render<T: Serialize>(envelope: &Envelope<T>) -> CalcResult<String> {
    serde_json::to_string_pretty(envelope).map_err(CalcError::from)
}

fn run(args: &Args) -> CalcResult<String> {
    let raw = read_request(&args.request)?;
    let constants = load_constants(args.packs.as_deref())?;

    match args.solver.as_str() {
        "loads" => render(&derive_loads(&parse::<LoadInput>(&raw)?, &constants)),
        "support" => {
            let catalog = load_catalog(args.catalog.as_deref())?;
            render(&select_support(&parse::<SupportInput>(&raw)?, &catalog, &constants))
        }
        "foundation" => render(&solve_foundation(&parse::<FoundationInput>(&raw)?, &constants)),
        "schedule" => render(&depth_schedule(&parse::<ScheduleInput>(&raw)?, &constants)),
        "baseplate" => render(&check_baseplate(&parse::<BasePlateInput>(&raw)?, &constants)),
        other => Err(CalcError::invalid_input("solver", other, USAGE)),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = match Args::parse(env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::from(2);
        }
    };

    match run(&args) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(code = e.error_code(), "{}", e);
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, String> {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_positional_and_flags() {
        let parsed = args(&["foundation", "req.json", "--packs", "packs/"]).unwrap();
        assert_eq!(parsed.solver, "foundation");
        assert_eq!(parsed.request, "req.json");
        assert_eq!(parsed.packs, Some(PathBuf::from("packs/")));
        assert!(parsed.catalog.is_none());
    }

    #[test]
    fn test_parse_rejects_bad_usage() {
        assert!(args(&["foundation"]).is_err());
        assert!(args(&["foundation", "a.json", "b.json"]).is_err());
        assert!(args(&["foundation", "a.json", "--verbose"]).is_err());
        assert!(args(&["support", "a.json", "--catalog"]).is_err());
    }

    #[test]
    fn test_run_foundation_request() {
        let dir = tempfile::tempdir().unwrap();
        let request = dir.path().join("footing.json");
        fs::write(&request, r#"{ "moment_kipft": 30.0, "soil_bearing_psf": 1500.0, "diameter_ft": 3.0 }"#).unwrap();

        let parsed = Args {
            solver: "foundation".to_string(),
            request: request.display().to_string(),
            packs: None,
            catalog: None,
        };
        let json: serde_json::Value = serde_json::from_str(&run(&parsed).unwrap()).unwrap();
        assert_eq!(json["trace"]["outcome"], "solved");
        assert!(json["result"]["depth_ft"].as_f64().unwrap() > 2.0);
    }

    #[test]
    fn test_unknown_solver_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let request = dir.path().join("req.json");
        fs::write(&request, "{}").unwrap();
        let parsed = Args {
            solver: "guess".to_string(),
            request: request.display().to_string(),
            packs: None,
            catalog: None,
        };
        assert_eq!(run(&parsed).unwrap_err().error_code(), "INVALID_INPUT");
    }
}
