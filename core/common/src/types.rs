//! Common types used throughout vaultkv.

use serde::Deserialize;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Join path elements with `/` and clean the result.
///
/// Empty elements are skipped; if every element is empty the result is empty.
/// Cleaning collapses repeated separators, drops `.` components, resolves
/// `..` against the preceding component and strips any trailing separator.
pub fn join_path(elements: &[&str]) -> String {
    let parts: Vec<&str> = elements.iter().copied().filter(|e| !e.is_empty()).collect();
    if parts.is_empty() {
        return String::new();
    }
    clean(&parts.join("/"))
}

fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut out: Vec<&str> = Vec::new();

    for comp in path.split('/') {
        match comp {
            "" | "." => {}
            ".." => match out.last() {
                Some(last) if *last != ".." => {
                    out.pop();
                }
                // `..` above the root is the root
                _ if rooted => {}
                _ => out.push(".."),
            },
            comp => out.push(comp),
        }
    }

    let joined = out.join("/");
    if rooted {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Resolve a configured mount path, falling back to an engine's default.
pub fn mount_or_default(mount: impl Into<String>, default: &str) -> String {
    let mount = mount.into();
    if mount.is_empty() {
        default.to_string()
    } else {
        mount
    }
}

/// Build the backend path of a secret below a mount.
///
/// The result is `<mount>/<segment>/<path>` when a segment is given and
/// `<mount>/<path>` otherwise.
///
/// # Errors
/// - [`crate::Error::EmptyPath`] if `path` is empty
pub fn secret_path(mount: &str, segment: Option<&str>, path: &str) -> crate::Result<String> {
    if path.is_empty() {
        return Err(crate::Error::EmptyPath);
    }
    Ok(match segment {
        Some(segment) => join_path(&[mount, segment, path]),
        None => join_path(&[mount, path]),
    })
}

/// Backend access token that zeroizes on drop.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct VaultToken(String);

impl VaultToken {
    /// Wrap a token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the raw token for use in a request header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for VaultToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VaultToken([REDACTED; {} chars])", self.0.len())
    }
}
