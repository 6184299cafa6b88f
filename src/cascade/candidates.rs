use super::failures::FailureSet;
use super::types::{NextCandidate, PRIORITY_CANDIDATES};

use std::collections::HashSet;

/// Ordered, de-duplicated retrieval URLs for one logical asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateList {
    asset: String,
    urls: Vec<String>,
}

impl CandidateList {
    /// Keeps the first occurrence of each URL, preserving order.
    pub fn new<I>(asset: impl Into<String>, urls: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let urls = urls
            .into_iter()
            .filter(|url| seen.insert(url.clone()))
            .collect();

        Self {
            asset: asset.into(),
            urls,
        }
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|candidate| candidate == url)
    }

    /// First candidate after `last_tried` that is not in `failures`.
    ///
    /// Pass `None` before the first attempt.
    pub fn next_candidate(&self, last_tried: Option<usize>, failures: &FailureSet) -> NextCandidate {
        let start = last_tried.map_or(0, |index| index.saturating_add(1));

        self.urls
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, url)| !failures.has_failed(url))
            .map_or(NextCandidate::Exhausted, |(index, url)| {
                NextCandidate::Candidate {
                    index,
                    url: url.clone(),
                }
            })
    }
}

/// Whether the candidate at `index` should be fetched eagerly.
pub fn is_priority(index: usize) -> bool {
    index < PRIORITY_CANDIDATES
}
