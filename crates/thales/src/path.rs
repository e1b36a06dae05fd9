//! Base-path composition and prefix matching.
//!
//! Base paths have exactly one leading slash and no trailing slash; the root
//! base path is empty. Empty and `/` segments collapse away, so `"api/"`,
//! `"/api"` and `"//api//"` all name the same prefix.

use thales_core::SetupError;

/// Joins path pieces into a normalized base path.
///
/// ```
/// use thales::path::join_base;
///
/// assert_eq!(join_base(&["/api/", "v1", ""]), "/api/v1");
/// assert_eq!(join_base(&["", "/"]), "");
/// ```
#[must_use]
pub fn join_base(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|p| p.split('/'))
        .filter(|s| !s.is_empty())
        .fold(String::new(), |mut out, segment| {
            out.push('/');
            out.push_str(segment);
            out
        })
}

/// Full pattern of a route registered at `path` under `base`.
///
/// Always starts with a slash.
#[must_use]
pub fn route_path(base: &str, path: &str) -> String {
    let joined = join_base(&[base, path]);
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}

/// True when `path` lies under `base` on a segment boundary.
///
/// An empty base matches everything; `/api` matches `/api` and `/api/x` but
/// not `/apix`.
#[must_use]
pub fn matches_path(base: &str, path: &str) -> bool {
    if base.is_empty() {
        return true;
    }
    path.strip_prefix(base)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Mount prefixes are literal; they cannot capture parameters.
pub(crate) fn check_prefix(prefix: &str) -> Result<(), SetupError> {
    check_characters(prefix)?;
    let captures = prefix
        .split('/')
        .any(|s| s.starts_with('{') || s.starts_with('*'));
    if captures {
        return Err(SetupError::InvalidPath {
            path: prefix.to_string(),
            reason: "mount prefixes cannot contain parameters".to_string(),
        });
    }
    Ok(())
}

/// Route patterns may capture parameters but carry no query or fragment.
pub(crate) fn check_route(path: &str) -> Result<(), SetupError> {
    check_characters(path)
}

fn check_characters(path: &str) -> Result<(), SetupError> {
    match path.chars().find(|c| matches!(c, '?' | '#') || c.is_whitespace()) {
        Some(c) => Err(SetupError::InvalidPath {
            path: path.to_string(),
            reason: format!("unexpected character {c:?}"),
        }),
        None => Ok(()),
    }
}
