//! `modwalk serve` command implementation.
//!
//! HTTP API over the registry cache, plus static serving of package files:
//!
//! ```text
//! GET  /api/modules[?name=<pkg>]      registry, or one record
//! GET  /api/extensions[?kind=<kind>]  extensions map, optionally filtered
//! GET  /api/importmap                 import map and asset lists
//! GET  /api/editable                  URLs of editable package files
//! POST /api/rescan                    invalidate the cached scan
//! GET  /modules/<pkg>/<file>          raw package file
//! ```
//!
//! The first request after startup (or after a rescan) triggers the scan;
//! concurrent requests share it.
//!
//! Package files are read-only here. Files are served only when their real
//! path stays inside the real package directory, so a symlink inside a
//! package cannot reach outside it. Writing editable files back is left to
//! the host application; this server only lists them.

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use miette::{IntoDiagnostic, Result};
use modwalk_core::importmap::editable_list;
use modwalk_core::{DocumentAssets, ExtensionKind, RegistryCache, WalkerConfig};
use modwalk_util::path::normalize;
use serde::Deserialize;
use serde_json::json;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use super::report_diagnostics;

/// Run the serve command.
pub fn run(config: WalkerConfig) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    runtime.block_on(serve(config))
}

async fn serve(config: WalkerConfig) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let root = config.modules.path.clone();
    let cache = RegistryCache::with_observer(config, |state| {
        report_diagnostics(&state.diagnostics);
    });
    let app = router(cache);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .into_diagnostic()?;
    info!(%addr, root = %root.display(), "serving modules");
    axum::serve(listener, app).await.into_diagnostic()?;

    Ok(())
}

/// Build the application router over `cache`.
pub fn router(cache: RegistryCache) -> Router {
    Router::new()
        .route("/api/modules", get(api_modules))
        .route("/api/extensions", get(api_extensions))
        .route("/api/importmap", get(api_importmap))
        .route("/api/editable", get(api_editable))
        .route("/api/rescan", post(api_rescan))
        .route("/modules/*path", get(serve_module_file))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(cache)
}

// ============================================================================
// Route Handlers
// ============================================================================

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[derive(Debug, Deserialize)]
struct ModulesQuery {
    name: Option<String>,
}

async fn api_modules(
    State(cache): State<RegistryCache>,
    Query(query): Query<ModulesQuery>,
) -> Response {
    let state = cache.get().await;
    match query.name {
        None => Json(&state.registry).into_response(),
        Some(name) => match state.module(&name) {
            Some(record) => Json(record).into_response(),
            None => error_response(StatusCode::NOT_FOUND, format!("Module not found: {name}")),
        },
    }
}

#[derive(Debug, Deserialize)]
struct ExtensionsQuery {
    kind: Option<String>,
}

async fn api_extensions(
    State(cache): State<RegistryCache>,
    Query(query): Query<ExtensionsQuery>,
) -> Response {
    let kind = match query.kind.as_deref().map(str::parse::<ExtensionKind>) {
        None => None,
        Some(Ok(kind)) => Some(kind),
        Some(Err(message)) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let state = cache.get().await;
    match kind {
        Some(kind) => Json(state.extensions_of_kind(kind)).into_response(),
        None => Json(&state.extensions).into_response(),
    }
}

async fn api_importmap(State(cache): State<RegistryCache>) -> Response {
    let state = cache.get().await;
    Json(DocumentAssets::from_registry(&state.registry)).into_response()
}

async fn api_editable(State(cache): State<RegistryCache>) -> Response {
    let state = cache.get().await;
    Json(editable_list(&state.registry)).into_response()
}

async fn api_rescan(State(cache): State<RegistryCache>) -> Response {
    cache.invalidate();
    let generation = cache.generation();
    info!(generation, "registry invalidated");
    Json(json!({ "ok": true, "generation": generation })).into_response()
}

/// Content type for a served file, by extension.
fn content_type_for(path: &str) -> &'static str {
    match modwalk_util::fs::extension_of(path) {
        ".js" | ".mjs" | ".cjs" => "text/javascript",
        ".json" => "application/json",
        ".html" => "text/html",
        ".xml" => "text/xml",
        ".css" => "text/css",
        ".png" => "image/png",
        ".svg" => "image/svg+xml",
        ".wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}

/// Split `<pkg>/<file>` (or `@scope/<pkg>/<file>`) after lexical
/// normalization. Paths that escape the package are rejected.
fn split_module_path(path: &str) -> Option<(String, String)> {
    let normalized = normalize(path);
    if normalized.starts_with('/') || normalized == ".." || normalized.starts_with("../") {
        return None;
    }

    let mut segments = normalized.splitn(3, '/');
    let first = segments.next()?;
    let (package, rest) = if first.starts_with('@') {
        let name = segments.next()?;
        (format!("{first}/{name}"), segments.next()?)
    } else {
        let rest = normalized.get(first.len() + 1..)?;
        (first.to_string(), rest)
    };

    if rest.is_empty() || rest == "." || rest == ".." || rest.starts_with("../") {
        return None;
    }
    Some((package, rest.to_string()))
}

async fn serve_module_file(
    State(cache): State<RegistryCache>,
    AxumPath(path): AxumPath<String>,
) -> Response {
    let Some((package, file)) = split_module_path(&path) else {
        return error_response(StatusCode::NOT_FOUND, format!("Not found: {path}"));
    };

    let state = cache.get().await;
    if state.module(&package).is_none() {
        return error_response(StatusCode::NOT_FOUND, format!("Module not found: {package}"));
    }

    let package_dir = cache.config().modules.path.join(&package);
    let full_path = match contained_file(&package_dir, &file).await {
        Ok(Some(full_path)) => full_path,
        Ok(None) => {
            debug!(path = %path, "module file resolves outside its package");
            return error_response(StatusCode::NOT_FOUND, format!("Not found: {path}"));
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %package_dir.join(&file).display(), "module file not found");
            return error_response(StatusCode::NOT_FOUND, format!("Not found: {path}"));
        }
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to read {path}: {e}"),
            )
        }
    };

    match tokio::fs::read(&full_path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type_for(&file)),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to read {path}: {e}"),
        ),
    }
}

/// Real path of `file` inside `package_dir`, or `None` when symlinks take it
/// outside. A linked package directory is resolved first, so it still
/// counts as the package.
async fn contained_file(package_dir: &Path, file: &str) -> io::Result<Option<PathBuf>> {
    let real_dir = tokio::fs::canonicalize(package_dir).await?;
    let real_file = tokio::fs::canonicalize(package_dir.join(file)).await?;
    Ok(real_file.starts_with(&real_dir).then_some(real_file))
}
