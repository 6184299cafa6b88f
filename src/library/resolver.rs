//! Secure Library Resolver
//!
//! Maps a requested asset name to a file inside the library root by searching
//! the shard folders in order. Two independent containment layers apply:
//! 1. **String checks** (`validation`): traversal markers, rooted names,
//!    disallowed characters and non-asset extensions are refused outright.
//! 2. **Canonical prefix check**: every candidate is canonicalized (symlinks
//!    and `.` segments resolved) and must still live under the canonical root.

use super::types::{LibraryLayout, Rejection, ResolveError, ResolvedAsset};
use super::validation::validate_name;

use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct LibraryResolver {
    /// Canonical form of the configured root.
    root: PathBuf,
    shards: Vec<String>,
}

impl LibraryResolver {
    /// Canonicalizes the library root. Fails if the root does not exist.
    pub fn new(layout: LibraryLayout) -> Result<Arc<Self>> {
        let root = std::fs::canonicalize(&layout.root).with_context(|| {
            format!("library root {} is not accessible", layout.root.display())
        })?;

        for shard in &layout.shards {
            if !root.join(shard).is_dir() {
                tracing::warn!("Library shard {:?} is missing under {}", shard, root.display());
            }
        }

        Ok(Arc::new(Self {
            root,
            shards: layout.shards,
        }))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn shards(&self) -> &[String] {
        &self.shards
    }

    /// Resolves a raw (still percent-encoded) requested name.
    ///
    /// # Returns
    /// * `Ok(ResolvedAsset)` for the first shard holding the file.
    /// * `Err(ResolveError::Rejected)` if any containment check fails.
    /// * `Err(ResolveError::NotFound)` if no shard holds it.
    pub fn resolve(&self, requested: &str) -> Result<ResolvedAsset, ResolveError> {
        let name = validate_name(requested).map_err(|rejection| {
            tracing::warn!(
                "Rejected asset request {:?}: {} (possible probing)",
                requested,
                rejection
            );
            ResolveError::Rejected(rejection)
        })?;

        for shard in &self.shards {
            let candidate = self.root.join(shard).join(&name.decoded);

            let canonical = match std::fs::canonicalize(&candidate) {
                Ok(path) => path,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => {
                    tracing::debug!("Skipping {}: {}", candidate.display(), err);
                    continue;
                }
            };

            if canonical == self.root || !canonical.starts_with(&self.root) {
                tracing::warn!(
                    "Rejected asset request {:?}: {} resolved outside the library (possible probing)",
                    requested,
                    canonical.display()
                );
                return Err(ResolveError::Rejected(Rejection::EscapedRoot));
            }

            if canonical.is_file() {
                return Ok(ResolvedAsset {
                    path: canonical,
                    shard: shard.clone(),
                    name: name.decoded,
                    kind: name.kind,
                });
            }
        }

        tracing::debug!("Asset {:?} not found in any shard", name.decoded);
        Err(ResolveError::NotFound)
    }
}
