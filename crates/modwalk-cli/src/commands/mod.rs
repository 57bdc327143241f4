//! Subcommand implementations.

pub mod importmap;
pub mod resolve;
pub mod scan;
pub mod serve;

use miette::{IntoDiagnostic, Result};
use modwalk_core::{ModulesState, ScanDiagnostic, WalkerConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// Build the effective config: an explicit file, else `modwalk.json` in
/// `cwd`, else defaults; then apply the `--modules` override.
pub fn load_config(
    cwd: &Path,
    file: Option<&Path>,
    modules: Option<PathBuf>,
) -> Result<WalkerConfig> {
    let config = match file {
        Some(file) => WalkerConfig::load(&cwd.join(file)).into_diagnostic()?,
        None => WalkerConfig::discover(cwd).into_diagnostic()?,
    };
    Ok(match modules {
        Some(path) => config.with_modules_path(cwd.join(path)),
        None => config,
    })
}

/// Apply `--origin-conditions` overrides. Each entry is one comma-separated
/// set; without any non-empty set the configured sets stay.
pub fn with_origin_conditions(config: WalkerConfig, sets: &[String]) -> WalkerConfig {
    let sets: Vec<Vec<String>> = sets
        .iter()
        .map(|set| {
            set.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|set| !set.is_empty())
        .collect();
    if sets.is_empty() {
        config
    } else {
        config.with_conditions(sets)
    }
}

/// Run one scan on a fresh runtime and log what it skipped.
pub fn scan_once(config: &WalkerConfig) -> Result<ModulesState> {
    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    let state = runtime.block_on(modwalk_core::scan(config));
    report_diagnostics(&state.diagnostics);
    Ok(state)
}

/// Log scan diagnostics: skipped packages as errors, skipped entries as
/// warnings.
pub fn report_diagnostics(diagnostics: &[ScanDiagnostic]) {
    for diagnostic in diagnostics {
        let package = diagnostic.package.as_deref().unwrap_or("-");
        if diagnostic.is_error() {
            error!(
                code = %diagnostic.code,
                package,
                path = %diagnostic.path,
                "{}",
                diagnostic.message
            );
        } else {
            warn!(
                code = %diagnostic.code,
                package,
                path = %diagnostic.path,
                "{}",
                diagnostic.message
            );
        }
    }
}

/// Print a value to stdout as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}
