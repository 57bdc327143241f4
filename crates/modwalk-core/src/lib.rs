#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]

pub mod config;
pub mod error;
pub mod importmap;
pub mod pattern;
pub mod registry;
pub mod resolver;

pub use config::WalkerConfig;
pub use error::Error;
pub use importmap::{compute_import_map, DocumentAssets, ImportMap};
pub use registry::{
    scan, ExtensionKind, Extensions, ModuleRecord, ModulesState, PackageType, Registry,
    RegistryCache, ScanDiagnostic,
};
pub use resolver::{
    resolve_package_exports, resolve_subpath, resolve_target, ExportTarget, ExportsError,
    SubpathExports, TargetResolution,
};
