//! JSON payload loading.
//!
//! Reads the payload file, checks it is well-formed JSON of any type and
//! returns its compact re-serialization, which is what goes on the wire.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use crate::error::{PushError, Result};

/// Load a JSON file and return its canonical (compact) bytes.
///
/// Object keys keep their order and numbers keep their exact lexeme; only
/// insignificant whitespace is removed.
pub fn load_json(path: &str) -> Result<Vec<u8>> {
    let resolved = absolute(path)?;

    let metadata =
        fs::metadata(&resolved).map_err(|_| PushError::FileNotFound(resolved.clone()))?;
    if !metadata.is_file() {
        return Err(PushError::NotAFile(resolved));
    }

    let content = fs::read(&resolved).map_err(|source| PushError::ReadFailed {
        path: resolved.clone(),
        source,
    })?;

    let canonical = canonicalize(&content).map_err(|err| match err {
        CanonicalError::Parse(source) => PushError::InvalidJson {
            path: resolved.clone(),
            source,
        },
        CanonicalError::Encode(source) => PushError::Encode(source),
    })?;

    info!(
        path = %resolved.display(),
        file_length = content.len(),
        body_length = canonical.len(),
        "payload_loaded"
    );

    Ok(canonical)
}

enum CanonicalError {
    Parse(serde_json::Error),
    Encode(serde_json::Error),
}

fn canonicalize(content: &[u8]) -> std::result::Result<Vec<u8>, CanonicalError> {
    let value: Value = serde_json::from_slice(content).map_err(CanonicalError::Parse)?;
    serde_json::to_vec(&value).map_err(CanonicalError::Encode)
}

/// Resolve a possibly relative path against the current directory.
fn absolute(path: &str) -> Result<PathBuf> {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return Ok(candidate.to_path_buf());
    }

    let cwd = env::current_dir().map_err(|source| PushError::PathResolution {
        path: path.to_string(),
        source,
    })?;
    Ok(cwd.join(candidate))
}
