//! POSIX-style logical paths inside a content store.
//!
//! Paths here are plain strings, not `std::path::Path`: they name objects in a
//! store namespace, so they must behave identically on every host OS. Joining
//! and normalization follow filesystem rules (`.` and `..` collapse), not URL
//! resolution; there are no schemes or query strings.

/// Collapse `.`/`..` segments and repeated slashes.
///
/// Absolute paths never climb above `/`. Relative paths keep leading `..`
/// segments they cannot collapse. The empty relative path normalizes to `.`.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&"..") | None if !absolute => segments.push(".."),
                Some(_) => {
                    segments.pop();
                }
                None => {}
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Normalize `path` as if it were rooted at the store root.
///
/// Relative input is anchored at `/`, so `..` can never climb out of the store.
pub fn absolute(path: &str) -> String {
    if path.starts_with('/') {
        normalize(path)
    } else {
        normalize(&format!("/{path}"))
    }
}

/// Resolve `referenced` against `dir`. The result is always store-absolute.
///
/// A `referenced` path starting with `/` ignores `dir`. A relative or empty
/// `dir` is taken relative to the store root.
pub fn join(dir: &str, referenced: &str) -> String {
    if referenced.starts_with('/') {
        normalize(referenced)
    } else {
        absolute(&format!("{dir}/{referenced}"))
    }
}

/// Directory portion of a logical path: `/a/b.shtml` -> `/a`, `/x` -> `/`.
///
/// Relative input is anchored at the store root first.
pub fn dirname(path: &str) -> String {
    let anchored = absolute(path);
    match anchored.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => anchored[..idx].to_string(),
    }
}

/// Extension of the last segment, without the dot.
///
/// Dotfiles such as `/.htaccess` have no extension.
pub fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(&name[idx + 1..]),
        _ => None,
    }
}

/// Object-store key for a logical path: anchored at the root, normalized,
/// without the leading `/`.
pub fn store_key(path: &str) -> String {
    absolute(path).trim_start_matches('/').to_string()
}
