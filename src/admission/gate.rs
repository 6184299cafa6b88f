//! Fixed-window Admission Gate
//!
//! Counts requests per client identity inside a rolling window and decides
//! whether a request may proceed before any other component runs.
//!
//! The window table is a `DashMap`, so concurrent checks for the same client
//! serialize on that client's shard while unrelated clients proceed in parallel.

use super::types::{AdmissionDecision, AdmissionLimits, ClientWindow};

use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub struct AdmissionGate {
    limits: AdmissionLimits,
    /// Structure: `client identity -> current window`.
    windows: DashMap<String, ClientWindow>,
    /// When the last threshold-triggered sweep ran.
    last_sweep: Mutex<Option<Instant>>,
}

impl AdmissionGate {
    pub fn new(limits: AdmissionLimits) -> Arc<Self> {
        Arc::new(Self {
            limits,
            windows: DashMap::new(),
            last_sweep: Mutex::new(None),
        })
    }

    pub fn limits(&self) -> AdmissionLimits {
        self.limits
    }

    /// Number of client windows currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Records one request from `client_id` and reports whether it is admitted.
    pub fn check(&self, client_id: &str) -> AdmissionDecision {
        self.check_at(client_id, Instant::now())
    }

    /// Same as `check`, evaluated at an explicit point in time.
    pub fn check_at(&self, client_id: &str, now: Instant) -> AdmissionDecision {
        // Must run before taking the entry guard below: `retain` locks every shard.
        self.maybe_sweep(now);

        let max = self.limits.max_requests;
        let mut entry = self
            .windows
            .entry(client_id.to_string())
            .or_insert_with(|| ClientWindow {
                count: 0,
                reset_at: now,
            });
        let window = entry.value_mut();

        if window.count == 0 || window.is_expired(now) {
            *window = ClientWindow::open(now, self.limits.window);
            return AdmissionDecision {
                allowed: true,
                remaining: max.saturating_sub(1),
                reset_in: self.limits.window,
            };
        }

        let reset_in = window.reset_at.saturating_duration_since(now);

        if window.count >= max {
            return AdmissionDecision {
                allowed: false,
                remaining: 0,
                reset_in,
            };
        }

        window.count += 1;
        AdmissionDecision {
            allowed: true,
            remaining: max - window.count,
            reset_in,
        }
    }

    /// Sweeps once the table outgrows the threshold, at most once per window.
    ///
    /// A table held above the threshold by live windows would otherwise make
    /// every check pay for a full pass. Concurrent callers that lose the
    /// `try_lock` race skip the sweep instead of queueing behind it.
    fn maybe_sweep(&self, now: Instant) {
        if self.windows.len() <= self.limits.sweep_threshold {
            return;
        }
        let Ok(mut last_sweep) = self.last_sweep.try_lock() else {
            return;
        };
        if last_sweep.is_some_and(|at| now.saturating_duration_since(at) < self.limits.window) {
            return;
        }
        *last_sweep = Some(now);
        self.sweep_expired(now);
    }

    /// Drops every window whose deadline has already passed. O(n) over the table.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| !window.is_expired(now));
        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            tracing::debug!("Swept {} expired admission windows", removed);
        }
        removed
    }
}
