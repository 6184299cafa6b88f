//! Secure Library Module
//!
//! Serves cartridge images from a fixed library root split across shard folders.
//!
//! ## Pipeline
//! 1. **Validate**: percent-decode once, refuse traversal markers, rooted names,
//!    disallowed characters and non-asset extensions.
//! 2. **Resolve**: search the shards in order; the first canonicalized path that
//!    stays under the canonical root and exists wins.
//! 3. **Deliver**: stream the file with content type, immutable caching and CORS headers.
//!
//! Rejections and misses look identical to clients (404). Rejections are logged
//! server-side as possible probing; read failures surface as a generic 500.
//!
//! ## Submodules
//! - **`validation`**: string-level name checks.
//! - **`resolver`**: shard search with canonical containment check.
//! - **`handlers`**: the streaming HTTP endpoint.
//! - **`types`**: layout, outcomes and response bodies.

pub mod handlers;
pub mod resolver;
pub mod types;
pub mod validation;
