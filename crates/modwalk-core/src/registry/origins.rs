//! Origin discovery.
//!
//! An origin is a public subpath of a package that is backed by a real file.
//! Candidates come from pairing every export key with every path its
//! declaration could produce (under any condition); wildcard pairs are
//! expanded against the package's file list. Candidates are then kept only
//! if the resolver actually maps them to a listed file.

use indexmap::IndexSet;

use super::diagnostics::{codes, ScanDiagnostic};
use super::PackageType;
use crate::pattern::{star_count, Pattern};
use crate::resolver::{resolve_subpath, ExportsError, SubpathExports, TargetResolution};

/// Expand the export keys of a package into candidate origins.
///
/// A key and its target must hold the same number of `*` (zero or one);
/// mismatched pairs are skipped and reported in `diagnostics`.
pub fn expand_origins(
    package: &str,
    exports: &SubpathExports,
    files: &[String],
    diagnostics: &mut Vec<ScanDiagnostic>,
) -> Vec<String> {
    let mut origins: IndexSet<String> = IndexSet::new();

    for (key, declaration) in exports {
        let mut targets = Vec::new();
        declaration.collect_paths(&mut targets);
        let targets: IndexSet<&str> = targets.into_iter().collect();

        for target in targets {
            let key_stars = star_count(key);
            let target_stars = star_count(target);
            if key_stars != target_stars || key_stars > 1 {
                diagnostics.push(ScanDiagnostic::warn(
                    codes::SCAN_WILDCARD_MISMATCH,
                    Some(package),
                    key.clone(),
                    format!(
                        "export '{key}' -> '{target}' needs exactly one '*' on both sides or none"
                    ),
                ));
                continue;
            }

            let (Some(key_pattern), Some(target_pattern)) =
                (Pattern::parse(key), Pattern::parse(target))
            else {
                continue;
            };

            match (key_pattern, target_pattern) {
                (Pattern::Exact(key), Pattern::Exact(target)) => {
                    if files.iter().any(|f| f == target) {
                        origins.insert(key.to_string());
                    }
                }
                (Pattern::Wildcard { prefix, suffix }, target_pattern) => {
                    for file in files {
                        if let Some(segment) = target_pattern.capture(file) {
                            origins.insert(format!("{prefix}{segment}{suffix}"));
                        }
                    }
                }
                // Star counts are equal, so a wildcard key always meets a
                // wildcard target
                (Pattern::Exact(_), Pattern::Wildcard { .. }) => {}
            }
        }
    }

    origins.into_iter().collect()
}

/// Keep the candidates that resolve to a listed file under at least one of
/// `condition_sets`.
///
/// Each set is tried on its own: an exhausted alternatives array under one
/// set only means the origin is unreachable there. It becomes a hard error
/// for the whole package when it happens under the package's own conditions
/// (those of `package_type`), or under every configured set.
pub fn reachable_origins<S: AsRef<str>>(
    candidates: Vec<String>,
    exports: &SubpathExports,
    files: &[String],
    package_type: PackageType,
    condition_sets: &[Vec<S>],
) -> Result<Vec<String>, ExportsError> {
    let mut reachable = Vec::with_capacity(candidates.len());
    for origin in candidates {
        resolve_subpath(&origin, exports, package_type.conditions())?;

        let mut errors = Vec::new();
        let mut found = false;
        for conditions in condition_sets {
            match resolve_subpath(&origin, exports, conditions) {
                Ok(TargetResolution::Path(path)) if files.contains(&path) => {
                    found = true;
                    break;
                }
                Ok(_) => {}
                Err(e) => errors.push(e),
            }
        }

        if found {
            reachable.push(origin);
        } else if !condition_sets.is_empty() && errors.len() == condition_sets.len() {
            return Err(errors.swap_remove(0));
        }
    }
    Ok(reachable)
}
