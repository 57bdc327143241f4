//! Package exports resolver.
//!
//! Evaluates the `"exports"` field of installed packages: shorthand versus
//! subpath classification, conditional targets, and `*` subpath patterns.

mod exports;
mod target;

pub use exports::{
    classify, main_entry, normalize, package_exports, pattern_key_compare,
    resolve_package_exports, resolve_subpath, ExportsShape, SubpathExports, DEFAULT_MAIN,
};
pub use target::{resolve_target, ExportTarget, ExportsError, TargetResolution};
