//! Collision-free destination names.
//!
//! When a name is already taken in a category folder the stem gets a short
//! random suffix: `clip.mp4` becomes `clip_1a2b3c4d.mp4`. Nothing here touches
//! the filesystem beyond existence checks.
//!
//! The check-then-use window is not atomic. Another process writing into the
//! same folder between the check and the transfer can still collide; the engine
//! assumes it is the only writer for the duration of a run.

use std::path::Path;
use uuid::Uuid;

use crate::error::EngineError;

/// Hex characters appended to a colliding stem.
pub const TOKEN_LEN: usize = 8;

/// Redraws allowed when a suffixed candidate is itself taken.
const MAX_ATTEMPTS: usize = 16;

/// Source of suffix tokens for renamed files.
pub trait TokenSource: Send + Sync {
    /// Return a fresh token of `TOKEN_LEN` lowercase hex characters.
    fn token(&self) -> String;
}

/// Default token source backed by random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidTokens;

impl TokenSource for UuidTokens {
    fn token(&self) -> String {
        let mut token = Uuid::new_v4().simple().to_string();
        token.truncate(TOKEN_LEN);
        token
    }
}

/// Split a file name into stem and extension, keeping the leading dot on the extension.
///
/// `archive.tar.gz` splits as (`archive.tar`, `.gz`); a dotfile such as
/// `.env` has no extension.
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Pick a name for `name` inside `dir` that no existing entry uses.
///
/// Returns `name` unchanged when it is free.
pub fn unique_name(
    dir: &Path,
    name: &str,
    tokens: &dyn TokenSource,
) -> Result<String, EngineError> {
    if !exists(&dir.join(name)) {
        return Ok(name.to_string());
    }

    let (stem, ext) = split_name(name);
    for _ in 0..MAX_ATTEMPTS {
        let candidate = format!("{}_{}{}", stem, tokens.token(), ext);
        if !exists(&dir.join(&candidate)) {
            return Ok(candidate);
        }
        tracing::debug!(candidate = %candidate, "suffixed name also taken, drawing again");
    }

    Err(EngineError::NameExhausted {
        dir: dir.to_path_buf(),
        name: name.to_string(),
    })
}

// symlink_metadata so a dangling link still counts as taken
fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
