//! Cover-art candidate builder.
//!
//! Pure data: turns a display name (and an optional already-known URL) into a
//! ranked list of thumbnail URLs. The UI fetches them and reports dead ones
//! back through `FailureSet::mark_failed`.

use super::candidates::CandidateList;
use super::types::{CLEAN_NAME_SEPARATOR, CdnFamily, REGION_SUFFIXES};

use regex::Regex;
use std::sync::OnceLock;

/// Builds the ranked candidate list for `display_name`.
///
/// Order: the known URL (when usable), then per CDN family every region
/// variant of the raw name followed by the cleaned name.
pub fn build_cover_candidates(display_name: &str, known_url: Option<&str>) -> CandidateList {
    let mut urls = Vec::new();

    if let Some(known) = known_url.filter(|url| is_usable_known_url(url)) {
        urls.push(known.to_string());
    }

    let display_name = display_name.trim();
    let cleaned = clean_display_name(display_name);

    if !display_name.is_empty() {
        for family in CdnFamily::ALL {
            for suffix in REGION_SUFFIXES {
                let variant = if suffix.is_empty() {
                    display_name.to_string()
                } else {
                    format!("{} {}", display_name, suffix)
                };
                urls.push(family.image_url(&urlencoding::encode(&variant)));
            }

            if !cleaned.is_empty() {
                urls.push(family.image_url(&cleaned));
            }
        }
    }

    CandidateList::new(display_name, urls)
}

/// Ephemeral object URLs and placeholders are never worth retrying.
fn is_usable_known_url(url: &str) -> bool {
    let url = url.trim();
    !url.is_empty() && !url.starts_with("blob:") && !url.contains("placeholder")
}

/// Strips `(...)` and `[...]` qualifiers, drops everything but ASCII
/// alphanumerics and whitespace, then joins words with the separator.
///
/// `"Mega Man 2 (USA) [!]"` becomes `"Mega_Man_2"`.
pub fn clean_display_name(name: &str) -> String {
    static QUALIFIERS: OnceLock<Regex> = OnceLock::new();
    let qualifiers =
        QUALIFIERS.get_or_init(|| Regex::new(r"\s*(\([^)]*\)|\[[^\]]*\])").unwrap());

    let stripped = qualifiers.replace_all(name, "");
    let alphanumeric: String = stripped
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    alphanumeric
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(CLEAN_NAME_SEPARATOR)
}
