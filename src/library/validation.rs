//! String-level validation of requested asset names.
//!
//! Every stage runs in order and fails closed. These checks catch the common
//! attacks cheaply; the resolver re-checks containment after canonicalization.

use super::types::{AssetKind, DISALLOWED_CHARS, Rejection, ValidatedName};

use std::path::Path;

/// Percent-decodes `requested` exactly once and validates the result.
pub fn validate_name(requested: &str) -> Result<ValidatedName, Rejection> {
    if requested.is_empty() {
        return Err(Rejection::Empty);
    }

    let decoded = urlencoding::decode(requested)
        .map_err(|_| Rejection::Undecodable)?
        .into_owned();

    if decoded.contains("..") || decoded.contains('~') {
        return Err(Rejection::Traversal);
    }

    if decoded.starts_with('/') || decoded.contains(&DISALLOWED_CHARS[..]) {
        return Err(Rejection::InvalidCharacter);
    }

    let kind = Path::new(&decoded)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(AssetKind::from_extension)
        .ok_or(Rejection::DisallowedExtension)?;

    Ok(ValidatedName { decoded, kind })
}
