//! Process-lifetime request and fault counters.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Shared counters, updated concurrently by every request task.
///
/// `total_requests` counts proxied traffic only, the requests that went
/// through the fault gates. Anything under `/_chaos` is counted in
/// `management_requests` instead, so percentages describe proxied traffic.
///
/// Only uniqueness of increments matters, so relaxed ordering is enough.
#[derive(Debug)]
pub struct ChaosStats {
    total_requests: AtomicU64,
    delays_injected: AtomicU64,
    errors_injected: AtomicU64,
    timeouts_injected: AtomicU64,
    management_requests: AtomicU64,
    started: Instant,
    started_at: DateTime<Utc>,
}

impl ChaosStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            delays_injected: AtomicU64::new(0),
            errors_injected: AtomicU64::new(0),
            timeouts_injected: AtomicU64::new(0),
            management_requests: AtomicU64::new(0),
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Count a request eligible for fault injection.
    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delay(&self) {
        self.delays_injected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors_injected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts_injected.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a request served by the management surface.
    pub fn record_management(&self) {
        self.management_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Read every counter once.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            delays_injected: self.delays_injected.load(Ordering::Relaxed),
            errors_injected: self.errors_injected.load(Ordering::Relaxed),
            timeouts_injected: self.timeouts_injected.load(Ordering::Relaxed),
            management_requests: self.management_requests.load(Ordering::Relaxed),
            uptime: self.uptime(),
        }
    }
}

impl Default for ChaosStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub delays_injected: u64,
    pub errors_injected: u64,
    pub timeouts_injected: u64,
    pub management_requests: u64,
    pub uptime: Duration,
}

impl StatsSnapshot {
    pub fn delay_percentage(&self) -> f64 {
        percentage(self.delays_injected, self.total_requests)
    }

    pub fn error_percentage(&self) -> f64 {
        percentage(self.errors_injected, self.total_requests)
    }

    pub fn timeout_percentage(&self) -> f64 {
        percentage(self.timeouts_injected, self.total_requests)
    }
}

/// `count / total * 100`, defined as 0 when nothing has been counted yet.
fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}
