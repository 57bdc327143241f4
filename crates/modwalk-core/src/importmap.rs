//! Browser-facing projections of the registry.
//!
//! The import map sends bare specifiers (`pkg`, `pkg/sub`) to the URLs the
//! package files are served from. CommonJS entries carry a query string so
//! the client shim can intercept them and wrap the module.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::registry::{ModuleRecord, PackageType, Registry};
use crate::resolver::resolve_package_exports;
use modwalk_util::path::join;

/// A browser import map (`<script type="importmap">`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMap {
    pub imports: IndexMap<String, String>,
}

/// Everything a host document needs from the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAssets {
    pub importmap: ImportMap,
    pub prefetch: Vec<String>,
    pub stylesheet: Vec<String>,
}

impl DocumentAssets {
    #[must_use]
    pub fn from_registry(registry: &Registry) -> Self {
        Self {
            importmap: compute_import_map(registry),
            prefetch: prefetch_list(registry),
            stylesheet: stylesheet_list(registry),
        }
    }
}

fn commonjs_query(package: &str, entry: &str) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query
        .append_pair("sw", "intercept")
        .append_pair("type", "cjs")
        .append_pair("pkg", package);
    if entry != "." {
        query.append_pair("entry", entry);
    }
    query.finish()
}

/// Build the import map for every package in `registry`.
///
/// Each package's origins are resolved with the conditions of its own
/// module type; only entries that land on a listed file appear.
#[must_use]
pub fn compute_import_map(registry: &Registry) -> ImportMap {
    let mut imports = IndexMap::new();
    for (name, record) in registry {
        for (entry, path) in resolve_package_exports(record, record.package_type.conditions()) {
            let specifier = join(&[name.as_str(), entry.as_str()]);
            let mut url = join(&["/modules", name.as_str(), path.as_str()]);
            if record.package_type == PackageType::Commonjs {
                url.push('?');
                url.push_str(&commonjs_query(name, &entry));
            }
            imports.insert(specifier, url);
        }
    }
    ImportMap { imports }
}

fn flatten(registry: &Registry, field: impl Fn(&ModuleRecord) -> &[String]) -> Vec<String> {
    registry
        .values()
        .flat_map(|record| field(record).iter().cloned())
        .collect()
}

/// Every package's prefetch URLs, in registry order.
#[must_use]
pub fn prefetch_list(registry: &Registry) -> Vec<String> {
    flatten(registry, |record| record.prefetch.as_slice())
}

/// Every package's stylesheet URLs, in registry order.
#[must_use]
pub fn stylesheet_list(registry: &Registry) -> Vec<String> {
    flatten(registry, |record| record.stylesheet.as_slice())
}

/// Every package's editable URLs, in registry order.
#[must_use]
pub fn editable_list(registry: &Registry) -> Vec<String> {
    flatten(registry, |record| record.editable.as_slice())
}
