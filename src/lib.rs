//! Cartridge Library Gateway
//!
//! Asset admission and resolution layer for a browser-based catalog of legacy
//! game cartridge images. The binary (`main.rs`) wires these modules into an
//! HTTP server.
//!
//! ## Architecture Modules
//! - **`admission`**: per-client fixed-window rate limiting applied to every
//!   request before routing, plus response hardening headers.
//! - **`library`**: the secure resolver that maps requested names onto files in
//!   the sharded library without ever leaving its root, and streams them.
//! - **`cascade`**: ordered candidate sources for cartridges (local, then remote
//!   storage) and cover art (thumbnail CDNs, with failure memoization).
//! - **`config`**: environment and command-line configuration.
//! - **`app`**: router assembly and shared service construction.

pub mod admission;
pub mod app;
pub mod cascade;
pub mod config;
pub mod library;
