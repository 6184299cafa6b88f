//! Admission Data Types
//!
//! The per-client counting window, the gate's limits, and the JSON body sent
//! back to clients that have exhausted their allowance.

use serde::Serialize;
use std::time::{Duration, Instant};

pub const DEFAULT_MAX_REQUESTS: u32 = 100;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_SWEEP_THRESHOLD: usize = 10_000;

/// Identity assigned to requests that carry no usable address at all.
/// Every such client shares one bucket.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Limits applied by the `AdmissionGate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionLimits {
    /// Requests allowed per window (always >= 1).
    pub max_requests: u32,
    pub window: Duration,
    /// Table size above which expired windows are swept out.
    pub sweep_threshold: usize,
}

impl Default for AdmissionLimits {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
            sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
        }
    }
}

/// Counting state for one client identity.
///
/// `count` only grows while `now < reset_at`; once the deadline passes the
/// next request replaces the whole window.
#[derive(Debug, Clone, Copy)]
pub struct ClientWindow {
    pub count: u32,
    pub reset_at: Instant,
}

impl ClientWindow {
    pub fn open(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            reset_at: now + window,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.reset_at
    }
}

/// Outcome of a single `AdmissionGate::check` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_in: Duration,
}

impl AdmissionDecision {
    pub fn reset_in_ms(&self) -> u64 {
        self.reset_in.as_millis() as u64
    }

    /// Seconds until the window resets, rounded up so clients never retry early.
    pub fn retry_after_secs(&self) -> u64 {
        let ms = self.reset_in_ms();
        ms.div_ceil(1000)
    }
}

/// Body returned with a 429.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitedResponse {
    pub error: String,
    pub message: String,
    pub retry_after: u64,
}
