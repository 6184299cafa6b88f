//! Library Data Types
//!
//! Layout of the on-disk cartridge library, the resolver's outcomes, and the
//! JSON bodies returned by the asset endpoint.

use axum::http::HeaderValue;
use serde::Serialize;
use std::path::PathBuf;

/// Shard folders of the stock library, in search order.
pub const DEFAULT_SHARDS: [&str; 4] = [
    "Nes ROMs Complete 1 Of 4",
    "Nes ROMs Complete 2 Of 4",
    "Nes ROMs Complete 3 Of 4",
    "Nes ROMs Complete 4 Of 4",
];

/// Characters never accepted anywhere in a requested name.
pub const DISALLOWED_CHARS: [char; 9] = [':', '\\', '*', '?', '"', '<', '>', '|', '\0'];

/// Cartridge image formats the library serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    NesImage,
    ZipArchive,
}

impl AssetKind {
    pub const ALL: [AssetKind; 2] = [AssetKind::NesImage, AssetKind::ZipArchive];

    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::NesImage => "nes",
            AssetKind::ZipArchive => "zip",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            AssetKind::NesImage => "application/x-nes-rom",
            AssetKind::ZipArchive => "application/zip",
        }
    }

    /// Case-insensitive lookup of an extension (without the leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension().eq_ignore_ascii_case(ext))
    }
}

/// Fixed root directory plus its ordered shard subdirectories.
#[derive(Debug, Clone)]
pub struct LibraryLayout {
    pub root: PathBuf,
    pub shards: Vec<String>,
}

impl LibraryLayout {
    pub fn new(root: impl Into<PathBuf>, shards: Vec<String>) -> Self {
        Self {
            root: root.into(),
            shards,
        }
    }

    pub fn with_default_shards(root: impl Into<PathBuf>) -> Self {
        Self::new(root, DEFAULT_SHARDS.iter().map(|s| s.to_string()).collect())
    }
}

/// Why a requested name was refused before touching the file system
/// (or after canonicalization escaped the root).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("name is empty")]
    Empty,
    #[error("name is not valid percent-encoded UTF-8")]
    Undecodable,
    #[error("name contains a traversal marker")]
    Traversal,
    #[error("name is rooted or contains a disallowed character")]
    InvalidCharacter,
    #[error("extension is not an allowed asset type")]
    DisallowedExtension,
    #[error("resolved path escapes the library root")]
    EscapedRoot,
}

/// A name that passed validation, already percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedName {
    pub decoded: String,
    pub kind: AssetKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("rejected: {0}")]
    Rejected(Rejection),
    #[error("not found in any shard")]
    NotFound,
}

/// A file located inside the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Canonical absolute path on disk.
    pub path: PathBuf,
    /// Shard the file was found in.
    pub shard: String,
    /// Decoded name relative to the shard.
    pub name: String,
    pub kind: AssetKind,
}

impl ResolvedAsset {
    /// `shard/name`, relative to the library root.
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.shard, self.name)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetNotFoundResponse {
    pub error: String,
    pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct AssetErrorResponse {
    pub error: String,
}

/// Headers applied to every delivered asset.
#[derive(Debug, Clone)]
pub struct DeliveryOptions {
    /// `Access-Control-Allow-Origin` value: the site origin, or `*`.
    pub allow_origin: HeaderValue,
}

impl DeliveryOptions {
    pub fn new(site_url: Option<&str>) -> anyhow::Result<Self> {
        let origin = site_url
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .unwrap_or("*");
        let allow_origin = HeaderValue::from_str(origin)
            .map_err(|_| anyhow::anyhow!("site url {:?} is not a valid header value", origin))?;
        Ok(Self { allow_origin })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("resolver task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("failed to build response: {0}")]
    Http(#[from] axum::http::Error),
}
