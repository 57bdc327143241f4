//! `modwalk resolve` command implementation.
//!
//! Resolves one package's exports under a condition list. Without a subpath
//! every origin is resolved and only entries that land on a listed file are
//! printed; with a subpath the raw resolution is printed, blocked and
//! inapplicable results included.

use miette::{miette, IntoDiagnostic, Result};
use modwalk_core::{
    resolve_package_exports, resolve_subpath, ModuleRecord, TargetResolution, WalkerConfig,
};
use serde_json::{json, Value};

use super::{print_json, scan_once};

/// Turn user input into an exports key: `util` and `./util` both become
/// `./util`, `.` stays `.`.
fn subpath_key(subpath: &str) -> String {
    if subpath == "." || subpath.starts_with("./") {
        subpath.to_string()
    } else {
        format!("./{}", subpath.trim_start_matches('/'))
    }
}

fn effective_conditions(record: &ModuleRecord, conditions: &[String]) -> Vec<String> {
    if conditions.is_empty() {
        record
            .package_type
            .conditions()
            .iter()
            .map(|c| (*c).to_string())
            .collect()
    } else {
        conditions.to_vec()
    }
}

fn resolution_json(resolution: &TargetResolution) -> Value {
    match resolution {
        TargetResolution::Path(path) => json!({"status": "path", "path": path}),
        TargetResolution::Blocked => json!({"status": "blocked", "path": null}),
        TargetResolution::Inapplicable => json!({"status": "inapplicable", "path": null}),
    }
}

/// Resolve against an already scanned record.
fn resolve_record(
    package: &str,
    record: &ModuleRecord,
    subpath: Option<&str>,
    conditions: &[String],
) -> Result<Value> {
    let conditions = effective_conditions(record, conditions);

    let Some(subpath) = subpath else {
        let exports = resolve_package_exports(record, &conditions);
        return Ok(json!({
            "package": package,
            "conditions": conditions,
            "exports": exports,
        }));
    };

    let key = subpath_key(subpath);
    let resolution = resolve_subpath(&key, &record.exports, &conditions).into_diagnostic()?;
    let mut output = json!({
        "package": package,
        "subpath": key,
        "conditions": conditions,
    });
    if let (Value::Object(out), Value::Object(res)) = (&mut output, resolution_json(&resolution)) {
        out.extend(res);
    }
    Ok(output)
}

/// Run the resolve command.
pub fn run(
    config: &WalkerConfig,
    package: &str,
    subpath: Option<&str>,
    conditions: &[String],
) -> Result<()> {
    let state = scan_once(config)?;
    let record = state
        .module(package)
        .ok_or_else(|| miette!("Package not found in {}: {package}", config.modules.path.display()))?;

    let output = resolve_record(package, record, subpath, conditions)?;
    print_json(&output)
}
