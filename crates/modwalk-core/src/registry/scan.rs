//! Modules root scanner.
//!
//! The walk runs in two phases. Discovery lists the root (and one level of
//! `@scope` namespaces) and turns every directory, or symlink to one, into
//! a named package directory. Processing then handles all packages
//! concurrently; each one yields its own record, extension entry and
//! diagnostics, which are merged into name-ordered maps at the end.

use futures::future::join_all;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::diagnostics::{codes, ScanDiagnostic};
use super::manifest::Manifest;
use super::origins::{expand_origins, reachable_origins};
use super::{ExtensionKind, ModuleRecord, ModulesState};
use crate::config::WalkerConfig;
use crate::pattern::{matches_any, star_count};
use crate::resolver::package_exports;
use modwalk_util::fs::{extension_of, list_files};
use modwalk_util::path::{join, normalize, to_forward_slashes};

/// File extensions listed in a record's `files`.
pub const TRACKED_EXTENSIONS: &[&str] = &[".js", ".cjs", ".mjs", ".json"];

/// URL prefix under which package files are served.
const MODULES_URL_PREFIX: &str = "/modules";

/// A package directory found during discovery.
#[derive(Debug, Clone)]
struct PackageDir {
    /// `name` or `@scope/name`, taken from the directory (or link) name.
    name: String,
    /// Directory holding `package.json`, symlinks already resolved.
    path: PathBuf,
}

/// Everything one package contributes to the scan.
#[derive(Debug, Default)]
struct PackageOutcome {
    name: String,
    record: Option<ModuleRecord>,
    kind: Option<Vec<ExtensionKind>>,
    diagnostics: Vec<ScanDiagnostic>,
}

/// Scan the modules root named by `config`.
///
/// Never fails: an unreadable root gives an empty state with a diagnostic,
/// and broken packages are skipped and reported.
pub async fn scan(config: &WalkerConfig) -> ModulesState {
    let root = &config.modules.path;
    debug!(root = %root.display(), "Scanning modules root");

    let mut diagnostics = Vec::new();
    let mut packages = discover_packages(root, &mut diagnostics).await;
    packages.sort_by(|a, b| a.name.cmp(&b.name));

    let outcomes = join_all(packages.iter().map(|dir| process_package(config, dir))).await;

    let mut state = ModulesState::default();
    for outcome in outcomes {
        diagnostics.extend(outcome.diagnostics);
        if let Some(kind) = outcome.kind {
            state.extensions.insert(outcome.name.clone(), kind);
        }
        if let Some(record) = outcome.record {
            state.registry.insert(outcome.name, record);
        }
    }
    state.diagnostics = diagnostics;

    debug!(
        packages = state.registry.len(),
        extensions = state.extensions.len(),
        diagnostics = state.diagnostics.len(),
        "Scan complete"
    );
    state
}

/// List `dir` as `(file name, path)` pairs.
async fn read_entries(dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push((name, entry.path()));
    }
    entries.sort();
    Ok(entries)
}

/// Resolve an entry to the directory it stands for.
///
/// Directories come back as-is. Symlinks are followed one level: a link to a
/// directory gives the target, anything else (broken links, links to files
/// or to other links) gives `None`.
async fn as_directory(path: &Path) -> Option<PathBuf> {
    let metadata = tokio::fs::symlink_metadata(path).await.ok()?;
    if metadata.is_dir() {
        return Some(path.to_path_buf());
    }
    if !metadata.file_type().is_symlink() {
        return None;
    }

    let link = tokio::fs::read_link(path).await.ok()?;
    let target = match path.parent() {
        Some(parent) => parent.join(link),
        None => link,
    };
    let metadata = tokio::fs::symlink_metadata(&target).await.ok()?;
    metadata.is_dir().then_some(target)
}

async fn discover_packages(root: &Path, diagnostics: &mut Vec<ScanDiagnostic>) -> Vec<PackageDir> {
    let entries = match read_entries(root).await {
        Ok(entries) => entries,
        Err(e) => {
            diagnostics.push(ScanDiagnostic::error(
                codes::SCAN_ROOT_UNREADABLE,
                None,
                root.display().to_string(),
                format!("Cannot read modules root: {e}"),
            ));
            return Vec::new();
        }
    };

    let mut packages = Vec::new();
    let mut namespaces = Vec::new();
    for (name, path) in entries {
        let Some(dir) = as_directory(&path).await else {
            continue;
        };
        if name.starts_with('@') {
            namespaces.push((name, dir));
        } else {
            packages.push(PackageDir { name, path: dir });
        }
    }

    let scoped = join_all(
        namespaces
            .iter()
            .map(|(scope, dir)| discover_namespace(scope, dir)),
    )
    .await;
    for (found, namespace_diagnostics) in scoped {
        packages.extend(found);
        diagnostics.extend(namespace_diagnostics);
    }

    packages
}

/// List the packages inside one `@scope` directory.
async fn discover_namespace(scope: &str, dir: &Path) -> (Vec<PackageDir>, Vec<ScanDiagnostic>) {
    let mut packages = Vec::new();
    let mut diagnostics = Vec::new();

    let entries = match read_entries(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            diagnostics.push(ScanDiagnostic::error(
                codes::SCAN_NAMESPACE_UNREADABLE,
                None,
                dir.display().to_string(),
                format!("Cannot read namespace {scope}: {e}"),
            ));
            return (packages, diagnostics);
        }
    };

    for (name, path) in entries {
        let Some(child) = as_directory(&path).await else {
            continue;
        };
        if name.starts_with('@') {
            diagnostics.push(ScanDiagnostic::warn(
                codes::SCAN_NESTED_NAMESPACE,
                None,
                path.display().to_string(),
                format!("Namespace {name} inside {scope} is not scanned"),
            ));
            continue;
        }
        packages.push(PackageDir {
            name: format!("{scope}/{name}"),
            path: child,
        });
    }

    (packages, diagnostics)
}

/// Normalize asset patterns to forward-slash, root-relative form.
///
/// Patterns with more than one `*` are dropped with a warning.
fn asset_patterns(
    package: &str,
    field: &str,
    patterns: &[String],
    diagnostics: &mut Vec<ScanDiagnostic>,
) -> Vec<String> {
    let mut normalized = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        if star_count(pattern) > 1 {
            diagnostics.push(ScanDiagnostic::warn(
                codes::SCAN_PATTERN_INVALID,
                Some(package),
                field,
                format!("Pattern '{pattern}' has more than one '*' and is ignored"),
            ));
            continue;
        }
        normalized.push(normalize(pattern));
    }
    normalized
}

/// List every file in a package directory on the blocking pool.
async fn package_files(path: &Path) -> io::Result<Vec<String>> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || list_files(&path))
        .await
        .map_err(io::Error::other)?
}

async fn process_package(config: &WalkerConfig, dir: &PackageDir) -> PackageOutcome {
    let name = dir.name.as_str();
    let mut outcome = PackageOutcome {
        name: name.to_string(),
        ..PackageOutcome::default()
    };

    let manifest_path = dir.path.join("package.json");
    let Ok(bytes) = tokio::fs::read(&manifest_path).await else {
        debug!(path = %dir.path.display(), "No package.json, skipping");
        return outcome;
    };
    let manifest_display = to_forward_slashes(&manifest_path.display().to_string());

    let manifest = match Manifest::parse(&bytes) {
        Ok(manifest) => manifest,
        Err(e) => {
            outcome.diagnostics.push(ScanDiagnostic::error(
                codes::SCAN_MANIFEST_INVALID,
                Some(name),
                manifest_display,
                format!("Invalid package.json: {e}"),
            ));
            return outcome;
        }
    };

    let dependencies = manifest.dependency_names();
    let Manifest {
        package_type,
        main,
        exports,
        kind,
        prefetch,
        editable,
        stylesheet,
        ..
    } = manifest;

    let exports = match package_exports(exports, main.as_deref()) {
        Ok(exports) => exports,
        Err(e) => {
            outcome.diagnostics.push(ScanDiagnostic::error(
                codes::SCAN_EXPORTS_INVALID,
                Some(name),
                manifest_display,
                format!("Invalid exports: {e}"),
            ));
            return outcome;
        }
    };

    let prefetch = asset_patterns(name, "prefetch", &prefetch, &mut outcome.diagnostics);
    let editable = asset_patterns(name, "editable", &editable, &mut outcome.diagnostics);
    let stylesheet = asset_patterns(name, "stylesheet", &stylesheet, &mut outcome.diagnostics);

    if let Some(kind) = &kind {
        if !config.is_ignored_extension(name) {
            outcome.kind = Some(kind.clone());
        }
    }

    if config.is_ignored_module(name) {
        debug!(package = name, "Package is ignored");
        return outcome;
    }

    let listing = match package_files(&dir.path).await {
        Ok(listing) => listing,
        Err(e) => {
            outcome.diagnostics.push(ScanDiagnostic::warn(
                codes::SCAN_FILES_UNREADABLE,
                Some(name),
                dir.path.display().to_string(),
                format!("Cannot list package files: {e}"),
            ));
            Vec::new()
        }
    };

    let mut record = ModuleRecord {
        package_type,
        dependencies,
        kind,
        ..ModuleRecord::default()
    };
    for relative in &listing {
        if TRACKED_EXTENSIONS.contains(&extension_of(relative)) {
            record.files.push(format!("./{relative}"));
        }
        let url = || join(&[MODULES_URL_PREFIX, name, relative.as_str()]);
        if matches_any(&prefetch, relative) {
            record.prefetch.push(url());
        }
        if matches_any(&editable, relative) {
            record.editable.push(url());
        }
        if matches_any(&stylesheet, relative) {
            record.stylesheet.push(url());
        }
    }

    let candidates = expand_origins(name, &exports, &record.files, &mut outcome.diagnostics);
    match reachable_origins(
        candidates,
        &exports,
        &record.files,
        package_type,
        &config.conditions,
    ) {
        Ok(origins) => record.origins = origins,
        Err(e) => {
            outcome.diagnostics.push(ScanDiagnostic::error(
                codes::SCAN_EXPORTS_EXHAUSTED,
                Some(name),
                manifest_display,
                e.to_string(),
            ));
            return outcome;
        }
    }
    record.exports = exports;

    debug!(
        package = name,
        files = record.files.len(),
        origins = record.origins.len(),
        "Processed package"
    );
    outcome.record = Some(record);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn modules() -> (TempDir, WalkerConfig) {
        let dir = tempdir().unwrap();
        let config = WalkerConfig::new(dir.path().to_path_buf());
        (dir, config)
    }

    #[tokio::test]
    async fn test_missing_root_is_reported() {
        let dir = tempdir().unwrap();
        let config = WalkerConfig::new(dir.path().join("node_modules"));
        let state = scan(&config).await;
        assert!(state.registry.is_empty());
        assert_eq!(state.diagnostics.len(), 1);
        assert_eq!(state.diagnostics[0].code, codes::SCAN_ROOT_UNREADABLE);
    }

    #[tokio::test]
    async fn test_directory_without_manifest_is_skipped_silently() {
        let (dir, config) = modules();
        fs::create_dir_all(dir.path().join(".bin")).unwrap();
        write(dir.path(), "stray.txt", "");
        write(dir.path(), "nopkg/index.js", "");

        let state = scan(&config).await;
        assert!(state.registry.is_empty());
        assert!(state.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_manifest_is_reported() {
        let (dir, config) = modules();
        write(dir.path(), "broken/package.json", "{ nope");
        write(dir.path(), "ok/package.json", "{}");
        write(dir.path(), "ok/index.js", "");

        let state = scan(&config).await;
        assert_eq!(state.registry.keys().collect::<Vec<_>>(), vec!["ok"]);
        assert_eq!(state.diagnostics.len(), 1);
        assert_eq!(state.diagnostics[0].code, codes::SCAN_MANIFEST_INVALID);
        assert_eq!(state.diagnostics[0].package.as_deref(), Some("broken"));
    }

    #[tokio::test]
    async fn test_mixed_exports_are_reported() {
        let (dir, config) = modules();
        write(
            dir.path(),
            "mixed/package.json",
            r#"{"exports": {".": "./a.js", "import": "./b.js"}, "kind": ["server"]}"#,
        );

        let state = scan(&config).await;
        assert!(state.registry.is_empty());
        // Rejected before the extension entry is recorded
        assert!(state.extensions.is_empty());
        assert_eq!(state.diagnostics[0].code, codes::SCAN_EXPORTS_INVALID);
    }

    #[tokio::test]
    async fn test_exhausted_alternatives_abort_package_only() {
        let (dir, config) = modules();
        write(
            dir.path(),
            "odd/package.json",
            r#"{"exports": {".": [{"browser": "./b.js"}]}}"#,
        );
        write(dir.path(), "odd/b.js", "");
        write(dir.path(), "fine/package.json", r#"{"main": "main.js"}"#);
        write(dir.path(), "fine/main.js", "");

        let state = scan(&config).await;
        assert_eq!(state.registry.keys().collect::<Vec<_>>(), vec!["fine"]);
        assert_eq!(state.diagnostics.len(), 1);
        assert_eq!(state.diagnostics[0].code, codes::SCAN_EXPORTS_EXHAUSTED);
        assert!(state.diagnostics[0].is_error());
    }

    #[tokio::test]
    async fn test_condition_sets_checked_independently() {
        let (dir, config) = modules();
        write(
            dir.path(),
            "esm/package.json",
            r#"{"type": "module", "exports": [{"import": "./index.mjs"}]}"#,
        );
        write(dir.path(), "esm/index.mjs", "");
        write(
            dir.path(),
            "cjs/package.json",
            r#"{"type": "commonjs", "exports": [{"require": "./index.cjs"}]}"#,
        );
        write(dir.path(), "cjs/index.cjs", "");

        let state = scan(&config).await;
        assert_eq!(state.registry.keys().collect::<Vec<_>>(), vec!["cjs", "esm"]);
        assert!(state.diagnostics.is_empty(), "{:?}", state.diagnostics);
        assert_eq!(state.registry["esm"].origins, vec!["."]);
        assert_eq!(state.registry["cjs"].origins, vec!["."]);
    }

    #[tokio::test]
    async fn test_nested_namespace_is_reported() {
        let (dir, config) = modules();
        write(dir.path(), "@scope/pkg/package.json", "{}");
        write(dir.path(), "@scope/pkg/index.js", "");
        write(dir.path(), "@scope/@inner/deep/package.json", "{}");

        let state = scan(&config).await;
        assert_eq!(state.registry.keys().collect::<Vec<_>>(), vec!["@scope/pkg"]);
        assert_eq!(state.diagnostics.len(), 1);
        assert_eq!(state.diagnostics[0].code, codes::SCAN_NESTED_NAMESPACE);
    }

    #[tokio::test]
    async fn test_asset_patterns() {
        let (dir, config) = modules();
        write(
            dir.path(),
            "ui/package.json",
            r#"{
                "prefetch": ["./lib/*.js"],
                "editable": ["config.json"],
                "stylesheet": ["styles/*.css", "*/*.css"]
            }"#,
        );
        write(dir.path(), "ui/index.js", "");
        write(dir.path(), "ui/lib/a.js", "");
        write(dir.path(), "ui/config.json", "{}");
        write(dir.path(), "ui/styles/theme.css", "");

        let state = scan(&config).await;
        let record = &state.registry["ui"];
        assert_eq!(record.prefetch, vec!["/modules/ui/lib/a.js"]);
        assert_eq!(record.editable, vec!["/modules/ui/config.json"]);
        assert_eq!(record.stylesheet, vec!["/modules/ui/styles/theme.css"]);
        // Stylesheets are classified but not tracked as files
        assert!(!record.files.contains(&"./styles/theme.css".to_string()));
        assert_eq!(state.diagnostics.len(), 1);
        assert_eq!(state.diagnostics[0].code, codes::SCAN_PATTERN_INVALID);
    }

    #[tokio::test]
    async fn test_ignored_module_still_registers_extension() {
        let (dir, mut config) = modules();
        config.modules.ignore.push("hidden-*".to_string());
        config.extensions.ignore.push("plain".to_string());
        write(dir.path(), "hidden-ext/package.json", r#"{"kind": ["client"]}"#);
        write(dir.path(), "plain/package.json", r#"{"kind": ["server"]}"#);
        write(dir.path(), "plain/index.js", "");

        let state = scan(&config).await;
        assert_eq!(state.registry.keys().collect::<Vec<_>>(), vec!["plain"]);
        assert_eq!(state.extensions.keys().collect::<Vec<_>>(), vec!["hidden-ext"]);
        assert_eq!(state.registry["plain"].kind, Some(vec![ExtensionKind::Server]));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_resolved_one_level() {
        use std::os::unix::fs::symlink;

        let (dir, config) = modules();
        let outside = tempdir().unwrap();
        write(outside.path(), "real/package.json", "{}");
        write(outside.path(), "real/index.js", "");
        symlink(outside.path().join("real"), dir.path().join("linked")).unwrap();
        symlink(dir.path().join("missing"), dir.path().join("dangling")).unwrap();
        write(outside.path(), "file.js", "");
        symlink(outside.path().join("file.js"), dir.path().join("to-file")).unwrap();

        let state = scan(&config).await;
        assert_eq!(state.registry.keys().collect::<Vec<_>>(), vec!["linked"]);
        assert_eq!(state.registry["linked"].origins, vec!["."]);
        assert!(state.diagnostics.is_empty());
    }
}
