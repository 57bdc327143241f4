//! End-to-end scans of small `node_modules` trees.
//!
//! Each test lays out packages in a temp directory, scans it, and checks the
//! resulting records, resolutions and import map.

use indexmap::IndexMap;
use modwalk_core::importmap::editable_list;
use modwalk_core::registry::codes;
use modwalk_core::{
    compute_import_map, resolve_package_exports, resolve_subpath, scan, ExportTarget,
    ExtensionKind, PackageType, RegistryCache, TargetResolution, WalkerConfig,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const REQUIRE: &[&str] = &["require", "default"];
const IMPORT: &[&str] = &["import", "default"];

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn node_modules() -> (TempDir, WalkerConfig) {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("node_modules");
    fs::create_dir_all(&root).unwrap();
    let config = WalkerConfig::new(root);
    (dir, config)
}

fn foo(root: &Path) {
    write(
        root,
        "foo/package.json",
        r#"{"name":"foo","type":"commonjs","exports":{".":"./index.js","./util":"./lib/util.js"}}"#,
    );
    write(root, "foo/index.js", "module.exports = 1;");
    write(root, "foo/lib/util.js", "module.exports = 2;");
    write(root, "foo/README.md", "# foo");
}

fn bar(root: &Path) {
    write(
        root,
        "bar/package.json",
        r#"{"exports": {"./*.js": {"import": "./esm/*.js", "require": null}}}"#,
    );
    write(root, "bar/esm/a.js", "export default 1;");
}

#[tokio::test]
async fn test_foo_scenario() {
    let (_dir, config) = node_modules();
    foo(&config.modules.path);

    let state = scan(&config).await;
    let record = state.module("foo").unwrap();

    let mut expected = IndexMap::new();
    expected.insert(".".to_string(), ExportTarget::Path("./index.js".into()));
    expected.insert("./util".to_string(), ExportTarget::Path("./lib/util.js".into()));
    assert_eq!(record.exports, expected);
    assert_eq!(record.package_type, PackageType::Commonjs);
    assert_eq!(record.origins, vec![".", "./util"]);
    assert_eq!(
        record.files,
        vec!["./index.js", "./lib/util.js", "./package.json"]
    );

    let resolved = resolve_package_exports(record, REQUIRE);
    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved["."], "./index.js");
    assert_eq!(resolved["./util"], "./lib/util.js");
    assert!(state.diagnostics.is_empty());
}

#[tokio::test]
async fn test_bar_scenario() {
    let (_dir, config) = node_modules();
    bar(&config.modules.path);

    let state = scan(&config).await;
    let record = state.module("bar").unwrap();
    assert_eq!(record.origins, vec!["./a.js"]);
    assert_eq!(
        resolve_subpath("./a.js", &record.exports, REQUIRE).unwrap(),
        TargetResolution::Blocked
    );
    assert_eq!(
        resolve_subpath("./a.js", &record.exports, IMPORT).unwrap(),
        TargetResolution::Path("./esm/a.js".into())
    );
}

#[tokio::test]
async fn test_namespace_scenario() {
    let (_dir, config) = node_modules();
    let root = &config.modules.path;
    write(root, "@scope/pkg/package.json", r#"{"main": "main.js"}"#);
    write(root, "@scope/pkg/main.js", "");
    write(root, "plainpkg/package.json", "{}");
    write(root, "plainpkg/index.js", "");
    write(root, "not-a-package/index.js", "");
    fs::create_dir_all(root.join("@empty")).unwrap();

    let state = scan(&config).await;
    assert_eq!(
        state.registry.keys().collect::<Vec<_>>(),
        vec!["@scope/pkg", "plainpkg"]
    );
    assert_eq!(state.registry["@scope/pkg"].origins, vec!["."]);
    assert!(state.diagnostics.is_empty());
}

#[tokio::test]
async fn test_scan_is_idempotent() {
    let (_dir, config) = node_modules();
    let root = &config.modules.path;
    foo(root);
    bar(root);
    write(
        root,
        "@ui/kit/package.json",
        r#"{"type": "module", "kind": ["client"], "exports": {".": "./index.js", "./*": "./parts/*.js"}}"#,
    );
    write(root, "@ui/kit/index.js", "");
    write(root, "@ui/kit/parts/button.js", "");

    let first = scan(&config).await;
    let second = scan(&config).await;
    assert_eq!(first.registry, second.registry);
    assert_eq!(first.extensions, second.extensions);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_resolved_exports_are_listed_files() {
    let (_dir, config) = node_modules();
    let root = &config.modules.path;
    foo(root);
    bar(root);
    write(
        root,
        "dual/package.json",
        r#"{"exports": {
            ".": {"import": "./index.mjs", "require": "./index.cjs"},
            "./missing": "./nowhere.js",
            "./features/*": ["./features/*.js", null]
        }}"#,
    );
    write(root, "dual/index.mjs", "");
    write(root, "dual/index.cjs", "");
    write(root, "dual/features/auth.js", "");

    let state = scan(&config).await;
    let dual = state.module("dual").unwrap();
    assert_eq!(dual.origins, vec![".", "./features/auth"]);

    for record in state.registry.values() {
        for conditions in [REQUIRE, IMPORT] {
            for path in resolve_package_exports(record, conditions).values() {
                assert!(record.files.contains(path), "{path} not in files");
            }
        }
    }
}

#[tokio::test]
async fn test_wildcard_mismatch_skips_entry_only() {
    let (_dir, config) = node_modules();
    let root = &config.modules.path;
    write(
        root,
        "odd/package.json",
        r#"{"exports": {".": "./index.js", "./*": "./index.js"}}"#,
    );
    write(root, "odd/index.js", "");

    let state = scan(&config).await;
    assert_eq!(state.module("odd").unwrap().origins, vec!["."]);
    assert_eq!(state.diagnostics.len(), 1);
    assert_eq!(state.diagnostics[0].code, codes::SCAN_WILDCARD_MISMATCH);
    assert_eq!(state.diagnostics[0].package.as_deref(), Some("odd"));
}

#[tokio::test]
async fn test_extensions_and_assets() {
    let (_dir, mut config) = node_modules();
    config.extensions.ignore.push("@ui/legacy".to_string());
    let root = config.modules.path.clone();
    write(
        &root,
        "@ui/kit/package.json",
        r#"{"type": "module", "kind": ["client"], "stylesheet": ["./theme/*.css"], "editable": ["settings.json"]}"#,
    );
    write(&root, "@ui/kit/index.js", "");
    write(&root, "@ui/kit/theme/dark.css", "");
    write(&root, "@ui/kit/settings.json", "{}");
    write(&root, "@ui/legacy/package.json", r#"{"kind": ["server"]}"#);
    write(&root, "@ui/legacy/index.js", "");
    write(&root, "api/package.json", r#"{"kind": ["server", "client"]}"#);
    write(&root, "api/index.js", "");

    let state = scan(&config).await;
    assert_eq!(
        state.extensions.keys().collect::<Vec<_>>(),
        vec!["@ui/kit", "api"]
    );
    assert_eq!(
        state
            .extensions_of_kind(ExtensionKind::Server)
            .keys()
            .collect::<Vec<_>>(),
        vec!["api"]
    );
    assert!(state.module("@ui/legacy").is_some());

    let kit = state.module("@ui/kit").unwrap();
    assert_eq!(kit.stylesheet, vec!["/modules/@ui/kit/theme/dark.css"]);
    assert_eq!(
        editable_list(&state.registry),
        vec!["/modules/@ui/kit/settings.json"]
    );

    let map = compute_import_map(&state.registry);
    assert_eq!(map.imports["@ui/kit"], "/modules/@ui/kit/index.js");
    assert_eq!(
        map.imports["api"],
        "/modules/api/index.js?sw=intercept&type=cjs&pkg=api"
    );
}

#[tokio::test]
async fn test_cache_serves_scan_results() {
    let (_dir, config) = node_modules();
    foo(&config.modules.path);
    let cache = RegistryCache::new(config.clone());

    let state = cache.get().await;
    assert!(state.module("foo").is_some());

    bar(&config.modules.path);
    cache.invalidate();
    let state = cache.get().await;
    assert_eq!(
        state.registry.keys().collect::<Vec<_>>(),
        vec!["bar", "foo"]
    );
}
