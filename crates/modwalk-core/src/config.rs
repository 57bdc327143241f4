use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::pattern::matches_any;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "modwalk.json";

/// Conditions accepted when resolving exports for a `require()` consumer.
pub const REQUIRE_CONDITIONS: &[&str] = &["require", "default"];

/// Conditions accepted when resolving exports for an `import` consumer.
pub const IMPORT_CONDITIONS: &[&str] = &["import", "default"];

/// Runtime configuration for the package walker.
///
/// ```json
/// {
///   "modules": { "path": "node_modules", "ignore": ["@types/*"] },
///   "extensions": { "ignore": [] },
///   "port": 3000
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Where packages live and which of them to leave out of the registry.
    pub modules: ModulesConfig,

    /// Packages that must not be registered as extensions.
    pub extensions: ExtensionsConfig,

    /// Condition sets an export must resolve under (any one of them) for
    /// its subpath to count as an origin.
    pub conditions: Vec<Vec<String>>,

    /// Port for `modwalk serve`.
    pub port: u16,
}

/// `modules` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Modules root. Relative paths resolve against the config file.
    pub path: PathBuf,

    /// Package name patterns excluded from the registry.
    pub ignore: Vec<String>,
}

/// `extensions` section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionsConfig {
    /// Package name patterns excluded from the extensions map.
    pub ignore: Vec<String>,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("node_modules"),
            ignore: Vec::new(),
        }
    }
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            modules: ModulesConfig::default(),
            extensions: ExtensionsConfig::default(),
            conditions: vec![owned(REQUIRE_CONDITIONS), owned(IMPORT_CONDITIONS)],
            port: 3000,
        }
    }
}

fn owned(conditions: &[&str]) -> Vec<String> {
    conditions.iter().map(|c| (*c).to_string()).collect()
}

impl WalkerConfig {
    /// Create a config for the given modules root with default settings.
    #[must_use]
    pub fn new(modules_path: PathBuf) -> Self {
        Self::default().with_modules_path(modules_path)
    }

    /// Load a config file. A relative `modules.path` is resolved against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        let base = path.parent().unwrap_or(Path::new("."));
        config.modules.path = base.join(&config.modules.path);
        Ok(config)
    }

    /// Load `modwalk.json` from `cwd` if present, else use defaults rooted
    /// at `cwd`.
    pub fn discover(cwd: &Path) -> Result<Self, Error> {
        let candidate = cwd.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Self::load(&candidate);
        }
        Ok(Self::new(cwd.join("node_modules")))
    }

    /// Set the modules root.
    #[must_use]
    pub fn with_modules_path(mut self, path: PathBuf) -> Self {
        self.modules.path = path;
        self
    }

    /// Set the server port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Replace the origin condition sets.
    #[must_use]
    pub fn with_conditions(mut self, conditions: Vec<Vec<String>>) -> Self {
        self.conditions = conditions;
        self
    }

    /// Check whether a package is excluded from the registry.
    #[must_use]
    pub fn is_ignored_module(&self, name: &str) -> bool {
        matches_any(&self.modules.ignore, name)
    }

    /// Check whether a package is excluded from the extensions map.
    #[must_use]
    pub fn is_ignored_extension(&self, name: &str) -> bool {
        matches_any(&self.extensions.ignore, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_conditions() {
        let config = WalkerConfig::default();
        assert_eq!(config.conditions.len(), 2);
        assert_eq!(config.conditions[0], vec!["require", "default"]);
        assert_eq!(config.conditions[1], vec!["import", "default"]);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_load_resolves_relative_modules_path() {
        let dir = tempdir().unwrap();
        let file = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &file,
            r#"{"modules": {"path": "pkgs", "ignore": ["@types/*"]}, "port": 8080}"#,
        )
        .unwrap();

        let config = WalkerConfig::load(&file).unwrap();
        assert_eq!(config.modules.path, dir.path().join("pkgs"));
        assert_eq!(config.port, 8080);
        assert!(config.is_ignored_module("@types/node"));
        assert!(!config.is_ignored_module("react"));
        // Omitted sections fall back to defaults
        assert!(config.extensions.ignore.is_empty());
        assert_eq!(config.conditions.len(), 2);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempdir().unwrap();
        let file = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&file, "{ not json").unwrap();

        let err = WalkerConfig::load(&file).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = WalkerConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn test_discover_without_file() {
        let dir = tempdir().unwrap();
        let config = WalkerConfig::discover(dir.path()).unwrap();
        assert_eq!(config.modules.path, dir.path().join("node_modules"));
    }

    #[test]
    fn test_ignored_extension() {
        let mut config = WalkerConfig::default();
        config.extensions.ignore.push("legacy-*".to_string());
        assert!(config.is_ignored_extension("legacy-panel"));
        assert!(!config.is_ignored_extension("panel"));
    }
}
