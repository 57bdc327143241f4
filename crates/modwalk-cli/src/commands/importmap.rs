//! `modwalk importmap` command implementation.

use miette::Result;
use modwalk_core::importmap::editable_list;
use modwalk_core::{DocumentAssets, WalkerConfig};
use serde::Serialize;

use super::{print_json, scan_once};

#[derive(Serialize)]
struct ImportmapOutput {
    #[serde(flatten)]
    assets: DocumentAssets,
    #[serde(skip_serializing_if = "Option::is_none")]
    editable: Option<Vec<String>>,
}

/// Run the importmap command.
pub fn run(config: &WalkerConfig, editable: bool) -> Result<()> {
    let state = scan_once(config)?;
    let output = ImportmapOutput {
        assets: DocumentAssets::from_registry(&state.registry),
        editable: editable.then(|| editable_list(&state.registry)),
    };
    print_json(&output)
}
