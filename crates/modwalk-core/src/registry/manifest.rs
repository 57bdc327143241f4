use indexmap::IndexMap;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

use super::{ExtensionKind, PackageType};
use crate::resolver::ExportTarget;

/// The fields of an installed package's `package.json` that the scanner
/// reads. The package name comes from its directory, not from `name`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Only the keys matter.
    #[serde(deserialize_with = "null_as_default")]
    pub dependencies: IndexMap<String, IgnoredAny>,

    /// Anything but `"module"` is commonjs.
    #[serde(rename = "type", deserialize_with = "package_type")]
    pub package_type: PackageType,

    pub main: Option<String>,

    /// Raw exports; `null` is treated as absent.
    pub exports: Option<ExportTarget>,

    pub kind: Option<Vec<ExtensionKind>>,

    #[serde(deserialize_with = "null_as_default")]
    pub prefetch: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub editable: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub stylesheet: Vec<String>,
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn package_type<'de, D>(deserializer: D) -> Result<PackageType, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value.as_ref().and_then(serde_json::Value::as_str) {
        Some("module") => PackageType::Module,
        _ => PackageType::Commonjs,
    })
}

impl Manifest {
    /// Parse a manifest from raw `package.json` bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Names of declared dependencies, in declared order.
    #[must_use]
    pub fn dependency_names(&self) -> Vec<String> {
        self.dependencies.keys().cloned().collect()
    }
}
