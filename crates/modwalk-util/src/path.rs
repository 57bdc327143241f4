//! Lexical path helpers.
//!
//! Package files, asset patterns and URLs are all handled as forward-slash
//! strings, independent of the host separator. Nothing here touches the
//! filesystem.

use std::path::MAIN_SEPARATOR;

/// Replace the host path separator with `/`.
#[must_use]
pub fn to_forward_slashes(path: &str) -> String {
    if MAIN_SEPARATOR == '/' {
        path.to_string()
    } else {
        path.replace(MAIN_SEPARATOR, "/")
    }
}

/// Normalize a path lexically, POSIX style.
///
/// Collapses repeated separators, drops `.` segments and folds `..` into
/// the preceding segment where one exists. A leading `/` and a trailing `/`
/// are preserved. An empty result becomes `"."`.
///
/// `"./dist//a/../b.js"` becomes `"dist/b.js"`.
#[must_use]
pub fn normalize(path: &str) -> String {
    let path = to_forward_slashes(path);
    if path.is_empty() {
        return ".".to_string();
    }

    let absolute = path.starts_with('/');
    let trailing = path.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                // ".." above the root of an absolute path stays at the root
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let mut out = segments.join("/");
    if out.is_empty() {
        if absolute {
            return "/".to_string();
        }
        out.push('.');
    }
    if trailing {
        out.push('/');
    }
    if absolute {
        out.insert(0, '/');
    }
    out
}

/// Join segments with `/` and normalize the result.
///
/// Empty segments are ignored, so `join(&["/modules", "foo", "./a.js"])`
/// gives `"/modules/foo/a.js"` and `join(&["foo", "."])` gives `"foo"`.
#[must_use]
pub fn join(segments: &[&str]) -> String {
    let joined = segments
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");
    normalize(&joined)
}

/// Turn a root-relative file path into its `./`-prefixed package form.
#[must_use]
pub fn dot_relative(path: &str) -> String {
    let normalized = normalize(path);
    if normalized == "." {
        "./".to_string()
    } else if normalized.starts_with("../") || normalized == ".." {
        normalized
    } else {
        format!("./{normalized}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_dot_segments() {
        assert_eq!(normalize("./dist/index.js"), "dist/index.js");
        assert_eq!(normalize("a/./b//c"), "a/b/c");
    }

    #[test]
    fn test_normalize_folds_parent_segments() {
        assert_eq!(normalize("a/b/../c"), "a/c");
        assert_eq!(normalize("../a"), "../a");
        assert_eq!(normalize("a/../../b"), "../b");
        assert_eq!(normalize("/../a"), "/a");
    }

    #[test]
    fn test_normalize_edges() {
        assert_eq!(normalize(""), ".");
        assert_eq!(normalize("."), ".");
        assert_eq!(normalize("./"), "./");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("dist/"), "dist/");
    }

    #[test]
    fn test_normalize_keeps_wildcards() {
        assert_eq!(normalize("./styles/*.css"), "styles/*.css");
    }

    #[test]
    fn test_join() {
        assert_eq!(join(&["/modules", "foo", "./lib/util.js"]), "/modules/foo/lib/util.js");
        assert_eq!(join(&["@scope/pkg", "."]), "@scope/pkg");
        assert_eq!(join(&["foo", "./util"]), "foo/util");
        assert_eq!(join(&["", "a"]), "a");
    }

    #[test]
    fn test_dot_relative() {
        assert_eq!(dot_relative("index.js"), "./index.js");
        assert_eq!(dot_relative("./lib//util.js"), "./lib/util.js");
        assert_eq!(dot_relative("../outside.js"), "../outside.js");
    }
}
