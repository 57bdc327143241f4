//! Installed-package registry.
//!
//! A scan of the modules root produces one [`ModuleRecord`] per package plus
//! the side index of extension packages. Both live in a [`ModulesState`]
//! that is built in one pass and never mutated afterwards.

mod cache;
pub mod diagnostics;
mod manifest;
mod origins;
mod scan;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::config::{IMPORT_CONDITIONS, REQUIRE_CONDITIONS};
use crate::resolver::SubpathExports;

pub use cache::{RegistryCache, ScanObserver};
pub use diagnostics::{codes, ScanDiagnostic, Severity};
pub use manifest::Manifest;
pub use origins::{expand_origins, reachable_origins};
pub use scan::{scan, TRACKED_EXTENSIONS};

/// Package name to module record, in name order.
pub type Registry = BTreeMap<String, ModuleRecord>;

/// Extension package name to the kinds it declares, in name order.
pub type Extensions = BTreeMap<String, Vec<ExtensionKind>>;

/// Module system of a package (`"type"` in package.json).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    #[default]
    Commonjs,
    Module,
}

impl PackageType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commonjs => "commonjs",
            Self::Module => "module",
        }
    }

    /// Conditions a consumer of this package type resolves exports with.
    #[must_use]
    pub fn conditions(&self) -> &'static [&'static str] {
        match self {
            Self::Commonjs => REQUIRE_CONDITIONS,
            Self::Module => IMPORT_CONDITIONS,
        }
    }
}

/// Side of the host application an extension package plugs into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionKind {
    Server,
    Client,
}

impl ExtensionKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtensionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server" => Ok(Self::Server),
            "client" => Ok(Self::Client),
            other => Err(format!("unknown extension kind: {other}")),
        }
    }
}

/// Everything known about one installed package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    #[serde(rename = "type")]
    pub package_type: PackageType,

    /// Normalized exports map; every key starts with `.`.
    pub exports: SubpathExports,

    /// Names of declared dependencies.
    pub dependencies: Vec<String>,

    /// `./`-prefixed paths of every tracked file in the package.
    pub files: Vec<String>,

    /// Subpaths that resolve to a listed file under at least one condition set.
    pub origins: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Vec<ExtensionKind>>,

    /// `/modules/<name>/<file>` URLs to prefetch.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefetch: Vec<String>,

    /// `/modules/<name>/<file>` URLs that clients may write back.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub editable: Vec<String>,

    /// `/modules/<name>/<file>` URLs to link as stylesheets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stylesheet: Vec<String>,
}

/// Result of one scan: registry and extensions from the same walk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModulesState {
    pub registry: Registry,
    pub extensions: Extensions,

    /// Packages or entries skipped during the scan, and why.
    #[serde(skip)]
    pub diagnostics: Vec<ScanDiagnostic>,
}

impl ModulesState {
    /// Look up a single package.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&ModuleRecord> {
        self.registry.get(name)
    }

    /// Extensions whose kind list contains `kind`.
    #[must_use]
    pub fn extensions_of_kind(&self, kind: ExtensionKind) -> Extensions {
        self.extensions
            .iter()
            .filter(|(_, kinds)| kinds.contains(&kind))
            .map(|(name, kinds)| (name.clone(), kinds.clone()))
            .collect()
    }
}
