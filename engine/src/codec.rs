//! Mapping between etcd keys and paths in the filesystem mirror
//!
//! Every key segment becomes one directory level. `:` is not portable in
//! file names, so it is written as [`ESCAPE_COLON`] and turned back into
//! `:` when the mirror is read. A leaf key's value lives in the
//! [`CONTENT_FILE`] inside the key's directory.

use anyhow::Result;
use std::path::{Component, Path, PathBuf};

use crate::constants::mirror::{CONTENT_FILE, ESCAPE_COLON};
use crate::errors::{EngineError, KeyError};

fn invalid(key: &str, reason: impl Into<String>) -> anyhow::Error {
    EngineError::from(KeyError::InvalidKey {
        key: key.to_string(),
        reason: reason.into(),
    })
    .into()
}

pub fn escape_segment(segment: &str) -> String {
    segment.replace(':', ESCAPE_COLON)
}

pub fn unescape_segment(segment: &str) -> String {
    segment.replace(ESCAPE_COLON, ":")
}

/// Splits a key into its segments, rejecting anything that cannot be
/// mirrored without ambiguity.
pub fn segments(key: &str) -> Result<Vec<&str>> {
    if key.is_empty() {
        return Err(invalid(key, "empty key"));
    }
    if !key.starts_with('/') {
        return Err(invalid(key, "key must start with '/'"));
    }

    let segments: Vec<&str> = key.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(invalid(key, "key has no segments"));
    }

    for segment in &segments {
        if *segment == "." || *segment == ".." {
            return Err(invalid(key, format!("segment '{}' is not allowed", segment)));
        }
        // Unescaping would turn the placeholder into ':' on the way back.
        if segment.contains(ESCAPE_COLON) {
            return Err(invalid(
                key,
                format!("segment contains reserved placeholder {}", ESCAPE_COLON),
            ));
        }
    }

    Ok(segments)
}

/// Directory that mirrors `key` under `base`
pub fn to_path(base: &Path, key: &str) -> Result<PathBuf> {
    let mut path = base.to_path_buf();
    for segment in segments(key)? {
        path.push(escape_segment(segment));
    }
    Ok(path)
}

/// Sentinel file holding the value of `key` under `base`
pub fn content_path(base: &Path, key: &str) -> Result<PathBuf> {
    Ok(to_path(base, key)?.join(CONTENT_FILE))
}

/// Key mirrored by the directory `path` under `base`
pub fn to_key(base: &Path, path: &Path) -> Result<String> {
    let display = path.display().to_string();
    let relative = path
        .strip_prefix(base)
        .map_err(|_| invalid(&display, format!("path is outside {}", base.display())))?;

    let mut key = String::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => {
                let segment = segment
                    .to_str()
                    .ok_or_else(|| invalid(&display, "path is not valid UTF-8"))?;
                key.push('/');
                key.push_str(&unescape_segment(segment));
            }
            Component::CurDir => continue,
            _ => return Err(invalid(&display, "path contains a non-normal component")),
        }
    }

    if key.is_empty() {
        return Err(invalid(&display, "path is the mirror root"));
    }
    Ok(key)
}
