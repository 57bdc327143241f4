//! `modwalk scan` command implementation.
//!
//! Prints the registry, or the extensions map, as JSON on stdout. Anything
//! the scan skipped is logged to stderr.

use miette::Result;
use modwalk_core::{ExtensionKind, WalkerConfig};
use tracing::info;

use super::{print_json, scan_once};

/// Run the scan command.
pub fn run(config: &WalkerConfig, extensions: bool, kind: Option<ExtensionKind>) -> Result<()> {
    let state = scan_once(config)?;
    info!(
        root = %config.modules.path.display(),
        packages = state.registry.len(),
        extensions = state.extensions.len(),
        "scan finished"
    );

    match kind {
        Some(kind) => print_json(&state.extensions_of_kind(kind)),
        None if extensions => print_json(&state.extensions),
        None => print_json(&state.registry),
    }
}
