//! Package.json exports field evaluation.
//!
//! Implements Node.js-style exports resolution over a normalized subpath map:
//! - Shorthand exports (`"./index.js"`, arrays, bare condition objects)
//! - Subpath exports (`"./feature"`)
//! - Pattern exports with a single `*` wildcard, most specific key first
//! - Conditional exports in declared key order

use indexmap::IndexMap;
use std::cmp::Ordering;

use super::target::{resolve_target, ExportTarget, ExportsError, TargetResolution};
use crate::pattern::star_count;
use crate::registry::ModuleRecord;
use modwalk_util::path::dot_relative;

/// Normalized exports: subpath key (always starting with `.`) to target.
pub type SubpathExports = IndexMap<String, ExportTarget>;

/// Default `main` when a manifest has neither `exports` nor `main`.
pub const DEFAULT_MAIN: &str = "index.js";

/// How a raw `exports` value is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportsShape {
    /// Sugar for `{ ".": exports }`.
    Shorthand,
    /// Already keyed by subpath.
    SubpathMap,
    /// Mixes subpath keys with condition keys.
    Invalid,
}

/// Classify a raw `exports` value.
///
/// Strings, arrays and `null` are shorthand. Objects are a subpath map when
/// every key starts with `.`, shorthand (a bare condition object) when none
/// does, and invalid otherwise. An empty object counts as shorthand.
#[must_use]
pub fn classify(exports: &ExportTarget) -> ExportsShape {
    let ExportTarget::Conditions(map) = exports else {
        return ExportsShape::Shorthand;
    };

    let mut shape = None;
    for key in map.keys() {
        let is_subpath = key.starts_with('.');
        match shape {
            None => shape = Some(is_subpath),
            Some(prev) if prev != is_subpath => return ExportsShape::Invalid,
            Some(_) => {}
        }
    }

    match shape {
        Some(true) => ExportsShape::SubpathMap,
        Some(false) | None => ExportsShape::Shorthand,
    }
}

/// Turn a classified `exports` value into a subpath map.
pub fn normalize(exports: ExportTarget, shape: ExportsShape) -> Result<SubpathExports, ExportsError> {
    match (shape, exports) {
        (ExportsShape::Invalid, _) => Err(ExportsError::MixedKeys),
        (ExportsShape::SubpathMap, ExportTarget::Conditions(map)) => Ok(map),
        (_, exports) => {
            let mut map = SubpathExports::new();
            map.insert(".".to_string(), exports);
            Ok(map)
        }
    }
}

/// Normalize a `main` field into a `./`-prefixed target.
#[must_use]
pub fn main_entry(main: Option<&str>) -> String {
    dot_relative(main.unwrap_or(DEFAULT_MAIN))
}

/// Build the subpath map for a manifest's `exports` and `main` fields.
///
/// A missing `exports` (or an empty object) exports `main` as `"."`.
pub fn package_exports(
    exports: Option<ExportTarget>,
    main: Option<&str>,
) -> Result<SubpathExports, ExportsError> {
    let exports = match exports {
        None => ExportTarget::Path(main_entry(main)),
        Some(ExportTarget::Conditions(map)) if map.is_empty() => {
            ExportTarget::Path(main_entry(main))
        }
        Some(exports) => exports,
    };
    let shape = classify(&exports);
    normalize(exports, shape)
}

/// Order pattern keys from most to least specific.
///
/// A longer literal prefix (up to and including the `*`) sorts first; among
/// equal prefixes a key without `*` sorts after one with it, and then the
/// longer key sorts first.
#[must_use]
pub fn pattern_key_compare(a: &str, b: &str) -> Ordering {
    let a_star = a.find('*');
    let b_star = b.find('*');
    let base_a = a_star.map_or(a.len(), |i| i + 1);
    let base_b = b_star.map_or(b.len(), |i| i + 1);

    base_b
        .cmp(&base_a)
        .then_with(|| match (a_star, b_star) {
            (None, _) => Ordering::Greater,
            (_, None) => Ordering::Less,
            _ => b.len().cmp(&a.len()),
        })
}

/// Resolve `subpath` (e.g. `"."` or `"./util"`) against a subpath map.
///
/// An exact key wins. Otherwise the most specific single-`*` key that
/// matches is used and its target gets the captured segment substituted.
/// With no matching key the result is `Blocked`.
pub fn resolve_subpath<S: AsRef<str>>(
    subpath: &str,
    exports: &SubpathExports,
    conditions: &[S],
) -> Result<TargetResolution, ExportsError> {
    if !subpath.contains('*') {
        if let Some(target) = exports.get(subpath) {
            return resolve_target(target, None, conditions);
        }
    }

    let mut expansion_keys: Vec<&str> = exports
        .keys()
        .map(String::as_str)
        .filter(|key| star_count(key) == 1)
        .collect();
    expansion_keys.sort_by(|a, b| pattern_key_compare(a, b));

    for key in expansion_keys {
        let Some((base, trailer)) = key.split_once('*') else {
            continue;
        };
        if !subpath.starts_with(base) || subpath == base {
            continue;
        }
        if trailer.is_empty() || (subpath.ends_with(trailer) && subpath.len() >= key.len()) {
            let pattern_match = &subpath[base.len()..subpath.len() - trailer.len()];
            return resolve_target(&exports[key], Some(pattern_match), conditions);
        }
    }

    Ok(TargetResolution::Blocked)
}

/// Resolve every origin of a package under `conditions`.
///
/// Only results that name a file actually present in the record are kept.
/// Origins whose alternatives are exhausted are dropped like unresolved ones.
#[must_use]
pub fn resolve_package_exports<S: AsRef<str>>(
    record: &ModuleRecord,
    conditions: &[S],
) -> IndexMap<String, String> {
    let mut resolved = IndexMap::new();
    for origin in &record.origins {
        let Ok(TargetResolution::Path(path)) =
            resolve_subpath(origin, &record.exports, conditions)
        else {
            continue;
        };
        if record.files.contains(&path) {
            resolved.insert(origin.clone(), path);
        }
    }
    resolved
}
