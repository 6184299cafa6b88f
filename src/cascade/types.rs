//! Cascade Data Types
//!
//! Candidate outcomes, source modes, CDN families, and the DTOs exchanged
//! with the UI layer over HTTP.

use serde::{Deserialize, Serialize};

/// Region qualifiers appended to the raw display name, most likely first.
/// The empty suffix yields the raw name itself.
pub const REGION_SUFFIXES: [&str; 5] = ["(USA)", "(World)", "(Europe)", "(Japan)", ""];

/// Separator used in place of whitespace in the cleaned display name.
pub const CLEAN_NAME_SEPARATOR: &str = "_";

/// Number of leading candidates the UI should load eagerly.
pub const PRIORITY_CANDIDATES: usize = 6;

/// Result of advancing through a `CandidateList`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextCandidate {
    Candidate { index: usize, url: String },
    Exhausted,
}

/// Where a cartridge image is being served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Same-origin library endpoint (offline-capable).
    Local,
    /// Remote object storage.
    Remote,
}

impl SourceMode {
    pub(crate) fn to_tag(self) -> u8 {
        match self {
            SourceMode::Local => 1,
            SourceMode::Remote => 2,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(SourceMode::Local),
            2 => Some(SourceMode::Remote),
            _ => None,
        }
    }
}

/// Candidate chosen by the cartridge cascade.
///
/// `found` is what the probe reported for a local hit; it is `None` for remote sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource<T = ()> {
    pub url: String,
    pub mode: SourceMode,
    pub found: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CascadeError {
    #[error("no usable source for {asset}")]
    Exhausted { asset: String },
}

/// Thumbnail CDN families for cover art, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdnFamily {
    LibretroSnaps,
    LibretroTitles,
    LibretroBoxarts,
}

impl CdnFamily {
    pub const ALL: [CdnFamily; 3] = [
        CdnFamily::LibretroSnaps,
        CdnFamily::LibretroTitles,
        CdnFamily::LibretroBoxarts,
    ];

    pub fn base_url(self) -> &'static str {
        match self {
            CdnFamily::LibretroSnaps => {
                "https://thumbnails.libretro.com/Nintendo%20-%20Nintendo%20Entertainment%20System/Named_Snaps"
            }
            CdnFamily::LibretroTitles => {
                "https://thumbnails.libretro.com/Nintendo%20-%20Nintendo%20Entertainment%20System/Named_Titles"
            }
            CdnFamily::LibretroBoxarts => {
                "https://thumbnails.libretro.com/Nintendo%20-%20Nintendo%20Entertainment%20System/Named_Boxarts"
            }
        }
    }

    pub fn image_url(self, file_stem: &str) -> String {
        format!("{}/{}.png", self.base_url(), file_stem)
    }
}

#[derive(Debug, Deserialize)]
pub struct CoverQuery {
    pub name: String,
    pub known: Option<String>,
    /// Index of the last candidate tried; absent before the first attempt.
    pub after: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CoverCandidatesResponse {
    pub name: String,
    pub candidates: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum NextCoverResponse {
    Candidate {
        index: usize,
        url: String,
        priority: bool,
    },
    Exhausted {
        exhausted: bool,
    },
}

/// Report of a broken cover image.
///
/// `name` and `known` rebuild the candidate list; only URLs on that list are recorded.
#[derive(Debug, Deserialize)]
pub struct MarkFailedRequest {
    pub name: String,
    pub known: Option<String>,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct MarkFailedResponse {
    pub url: String,
    pub newly_marked: bool,
}

#[derive(Debug, Serialize)]
pub struct MarkFailedError {
    pub error: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct CartridgeSourceResponse {
    pub path: String,
    pub url: String,
    pub mode: SourceMode,
    /// Shard-relative location when served locally.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CartridgeSourceError {
    pub error: String,
    pub path: String,
}
