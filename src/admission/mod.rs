//! Admission Module
//!
//! Decides whether an inbound request may proceed at all, before routing.
//!
//! ## Core Concepts
//! - **Window**: each client identity gets a fixed-length counting window.
//!   Exceeding the per-window ceiling yields a 429 until the window resets.
//! - **Identity**: derived from forwarded-address headers (subject to the
//!   configured `IdentityPolicy`), the socket peer, or a shared `"unknown"` bucket.
//! - **Sweep**: expired windows are removed opportunistically once the table grows large.
//!
//! ## Submodules
//! - **`gate`**: the `AdmissionGate` window table.
//! - **`identity`**: client identity derivation.
//! - **`middleware`**: axum middleware for admission and security headers.
//! - **`types`**: limits, windows and decisions.

pub mod gate;
pub mod identity;
pub mod middleware;
pub mod types;
