//! Export targets and conditional target resolution.
//!
//! An export target is the value side of an `"exports"` entry:
//! - `"./dist/index.js"` - a file path, possibly with `*`
//! - `null` - explicitly blocked
//! - `["./a.js", "./b.js"]` - alternatives, first applicable wins
//! - `{ "import": ..., "default": ... }` - conditions, tried in declared order

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single export declaration, as found in `package.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportTarget {
    /// `null`
    Blocked,
    /// A file path, optionally with a single `*`.
    Path(String),
    /// Ordered alternatives.
    Alternatives(Vec<ExportTarget>),
    /// Condition name to nested target, in declared order.
    Conditions(IndexMap<String, ExportTarget>),
}

/// Outcome of resolving a target under a set of conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetResolution {
    /// A concrete path (after `*` substitution).
    Path(String),
    /// Explicitly blocked, or no matching subpath at all.
    Blocked,
    /// None of the target's conditions are accepted.
    Inapplicable,
}

impl TargetResolution {
    /// Return the resolved path, if any.
    #[must_use]
    pub fn as_path(&self) -> Option<&str> {
        match self {
            Self::Path(p) => Some(p),
            Self::Blocked | Self::Inapplicable => None,
        }
    }

    /// Consume and return the resolved path, if any.
    #[must_use]
    pub fn into_path(self) -> Option<String> {
        match self {
            Self::Path(p) => Some(p),
            Self::Blocked | Self::Inapplicable => None,
        }
    }
}

/// Errors from evaluating an exports declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportsError {
    /// A non-empty alternatives array in which no entry applies. Well-formed
    /// packages end such arrays with an unconditional fallback.
    #[error("no alternative applies under conditions [{conditions}]")]
    ExhaustedAlternatives { conditions: String },

    /// The exports object mixes `.`-prefixed subpath keys with condition keys.
    #[error("exports object mixes subpath keys and condition keys")]
    MixedKeys,
}

impl ExportTarget {
    /// Collect every path string reachable in this declaration, across all
    /// conditions and alternatives, in declaration order.
    pub fn collect_paths<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Path(p) => out.push(p),
            Self::Blocked => {}
            Self::Alternatives(entries) => {
                for entry in entries {
                    entry.collect_paths(out);
                }
            }
            Self::Conditions(map) => {
                for entry in map.values() {
                    entry.collect_paths(out);
                }
            }
        }
    }
}

/// Resolve a target under the accepted `conditions`.
///
/// `pattern_match` is the segment captured by a wildcard subpath key; every
/// `*` in a path target is replaced by it.
///
/// Condition objects use the first of their own keys that is accepted and
/// return that branch's result even when it is `Inapplicable`. Arrays
/// return the first entry that is not `Inapplicable`.
pub fn resolve_target<S: AsRef<str>>(
    target: &ExportTarget,
    pattern_match: Option<&str>,
    conditions: &[S],
) -> Result<TargetResolution, ExportsError> {
    match target {
        ExportTarget::Path(path) => Ok(TargetResolution::Path(match pattern_match {
            None => path.clone(),
            Some(segment) => path.replace('*', segment),
        })),
        ExportTarget::Blocked => Ok(TargetResolution::Blocked),
        ExportTarget::Alternatives(entries) => {
            if entries.is_empty() {
                return Ok(TargetResolution::Blocked);
            }
            for entry in entries {
                match resolve_target(entry, pattern_match, conditions)? {
                    TargetResolution::Inapplicable => continue,
                    resolved => return Ok(resolved),
                }
            }
            Err(ExportsError::ExhaustedAlternatives {
                conditions: conditions
                    .iter()
                    .map(|c| c.as_ref())
                    .collect::<Vec<&str>>()
                    .join(","),
            })
        }
        ExportTarget::Conditions(map) => {
            for (condition, entry) in map {
                if conditions.iter().any(|c| c.as_ref() == condition.as_str()) {
                    return resolve_target(entry, pattern_match, conditions);
                }
            }
            Ok(TargetResolution::Inapplicable)
        }
    }
}
