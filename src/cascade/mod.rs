//! Fallback Source Cascade Module
//!
//! Resolves a logical asset to one concrete URL out of an ordered set of
//! candidates, remembering dead candidates so they are never retried.
//!
//! ## Cascades
//! - **Cartridge**: same-origin library endpoint first (probed), remote object
//!   storage second. No further tiers.
//! - **Cover art**: known URL, then region variants and a cleaned variant of the
//!   display name across the thumbnail CDN families. Advisory only: a bad
//!   candidate renders as a broken image and carries no security obligation.
//!
//! ## Submodules
//! - **`candidates`**: `CandidateList` and `next_candidate`.
//! - **`failures`**: the shared `FailureSet`.
//! - **`cover_art`**: cover-art candidate builder.
//! - **`cartridge`**: cartridge cascade and source-mode tracking.
//! - **`probe`**: HTTP and in-process existence probes.
//! - **`handlers`**: JSON endpoints for the UI layer.

pub mod candidates;
pub mod cartridge;
pub mod cover_art;
pub mod failures;
pub mod handlers;
pub mod probe;
pub mod types;

#[cfg(test)]
mod tests;
