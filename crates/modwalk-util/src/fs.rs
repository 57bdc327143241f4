use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::path::to_forward_slashes;

/// List every non-directory entry below `root`, recursively.
///
/// Paths are relative to `root`, use `/` as separator and come back sorted.
/// Symlinked directories inside the tree are not followed; the links
/// themselves are listed like files.
///
/// # Errors
/// Returns an error if `root` itself cannot be read. Unreadable entries
/// deeper in the tree are skipped.
pub fn list_files(root: &Path) -> io::Result<Vec<String>> {
    // Surface an unreadable root instead of returning an empty listing.
    std::fs::read_dir(root)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let Ok(entry) = entry else {
            continue;
        };
        if entry.file_type().is_dir() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        files.push(to_forward_slashes(&relative.to_string_lossy()));
    }
    files.sort();
    Ok(files)
}

/// Return the extension of a forward-slash path including the dot, as
/// `Path::extension` would see it (`"lib/a.min.js"` gives `".js"`,
/// `".eslintrc"` gives `""`).
#[must_use]
pub fn extension_of(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &name[idx..],
    }
}
