//! Cartridge source cascade.
//!
//! Two tiers, in order:
//! 1. the same-origin library endpoint, probed with a cheap existence check;
//! 2. the remote object-storage URL, handed out unprobed as the last resort.
//!
//! There is no third tier. The local tier is probed again on every
//! resolution, so cartridges added to the library are picked up without a
//! restart; nothing a caller reports is remembered across resolutions.

use super::candidates::CandidateList;
use super::failures::FailureSet;
use super::probe::SourceProbe;
use super::types::{CascadeError, NextCandidate, ResolvedSource, SourceMode};

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Path of the library endpoint that serves local cartridges.
pub const LOCAL_ROUTE_PREFIX: &str = "/api/roms";

pub struct CartridgeCascade {
    /// Base URL of the remote object storage, without trailing slash.
    remote_base: Option<String>,
    /// Last committed `SourceMode` tag (0 = nothing resolved yet).
    mode: AtomicU8,
}

impl CartridgeCascade {
    pub fn new(remote_base: Option<&str>) -> Arc<Self> {
        let remote_base = remote_base
            .map(|base| base.trim().trim_end_matches('/').to_string())
            .filter(|base| !base.is_empty());

        if remote_base.is_none() {
            tracing::warn!("No remote storage configured; cartridges are served locally only");
        }

        Arc::new(Self {
            remote_base,
            mode: AtomicU8::new(0),
        })
    }

    /// Mode committed by the most recent successful resolution.
    pub fn current_mode(&self) -> Option<SourceMode> {
        SourceMode::from_tag(self.mode.load(Ordering::Acquire))
    }

    /// Local endpoint URL for a cartridge path.
    pub fn local_url(&self, cartridge_path: &str) -> String {
        format!("{}/{}", LOCAL_ROUTE_PREFIX, encode_path(cartridge_path))
    }

    /// Remote object-storage URL, if a remote tier is configured.
    pub fn remote_url(&self, cartridge_path: &str) -> Option<String> {
        self.remote_base
            .as_ref()
            .map(|base| format!("{}/{}", base, encode_path(cartridge_path)))
    }

    pub fn build_candidates(&self, cartridge_path: &str) -> CandidateList {
        let path = normalize_path(cartridge_path);
        let urls = std::iter::once(self.local_url(path)).chain(self.remote_url(path));
        CandidateList::new(path, urls)
    }

    /// Picks the first usable source for `cartridge_path`.
    ///
    /// The local candidate must pass `probe`; otherwise the cascade falls
    /// through to the remote candidate. Misses are only remembered for the
    /// duration of this call.
    pub async fn resolve<P: SourceProbe>(
        &self,
        cartridge_path: &str,
        probe: &P,
    ) -> Result<ResolvedSource<P::Found>, CascadeError> {
        let candidates = self.build_candidates(cartridge_path);
        if candidates.asset().is_empty() {
            return Err(CascadeError::Exhausted {
                asset: String::new(),
            });
        }

        let local_url = self.local_url(candidates.asset());
        let attempted = FailureSet::default();
        let mut last_tried = None;

        loop {
            let (index, url) = match candidates.next_candidate(last_tried, &attempted) {
                NextCandidate::Candidate { index, url } => (index, url),
                NextCandidate::Exhausted => {
                    tracing::info!("No source left for cartridge {:?}", candidates.asset());
                    return Err(CascadeError::Exhausted {
                        asset: candidates.asset().to_string(),
                    });
                }
            };
            last_tried = Some(index);

            if url != local_url {
                return Ok(self.commit(url, SourceMode::Remote, None));
            }

            if let Some(found) = probe.probe(&url).await {
                return Ok(self.commit(url, SourceMode::Local, Some(found)));
            }

            tracing::debug!("Local source for {:?} unavailable, trying remote", candidates.asset());
            attempted.mark_failed(&url);
        }
    }

    fn commit<T>(&self, url: String, mode: SourceMode, found: Option<T>) -> ResolvedSource<T> {
        let previous = self.mode.swap(mode.to_tag(), Ordering::AcqRel);
        if SourceMode::from_tag(previous) != Some(mode) {
            tracing::info!("Cartridge source mode is now {:?}", mode);
        }
        ResolvedSource { url, mode, found }
    }
}

fn normalize_path(cartridge_path: &str) -> &str {
    cartridge_path.trim().trim_start_matches('/')
}

/// Percent-encodes each segment, keeping `/` separators intact.
fn encode_path(path: &str) -> String {
    normalize_path(path)
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
