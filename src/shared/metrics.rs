use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub const UNSET_TS: u64 = 0;

#[derive(Debug)]
pub struct AtomicMetric {
    success: AtomicU64,
    failure: AtomicU64,
    last_success_ms: AtomicU64,
    last_failure_ms: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AtomicSnapshot {
    pub successes: u64,
    pub failures: u64,
    pub last_success_ms: Option<u64>,
    pub last_failure_ms: Option<u64>,
}

impl AtomicMetric {
    pub const fn new() -> Self {
        Self {
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            last_success_ms: AtomicU64::new(UNSET_TS),
            last_failure_ms: AtomicU64::new(UNSET_TS),
        }
    }

    pub fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
        self.last_success_ms
            .store(current_unix_ms(), Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failure.fetch_add(1, Ordering::Relaxed);
        self.last_failure_ms
            .store(current_unix_ms(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AtomicSnapshot {
        AtomicSnapshot {
            successes: self.success.load(Ordering::Relaxed),
            failures: self.failure.load(Ordering::Relaxed),
            last_success_ms: timestamp_to_option(self.last_success_ms.load(Ordering::Relaxed)),
            last_failure_ms: timestamp_to_option(self.last_failure_ms.load(Ordering::Relaxed)),
        }
    }

    pub fn reset(&self) {
        self.success.store(0, Ordering::Relaxed);
        self.failure.store(0, Ordering::Relaxed);
        self.last_success_ms.store(UNSET_TS, Ordering::Relaxed);
        self.last_failure_ms.store(UNSET_TS, Ordering::Relaxed);
    }
}

/// Primary-state writes issued by the update coordinator.
pub static RECORD_WRITES: AtomicMetric = AtomicMetric::new();
/// Version snapshot appends. Failures here are swallowed by the update
/// coordinator, so this counter is the only place they surface.
pub static SNAPSHOT_APPENDS: AtomicMetric = AtomicMetric::new();
/// Background presence sweeps (success = sweep ran, regardless of how
/// many entries it removed).
pub static PRESENCE_SWEEPS: AtomicMetric = AtomicMetric::new();

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CoreMetricsSnapshot {
    pub record_writes: AtomicSnapshot,
    pub snapshot_appends: AtomicSnapshot,
    pub presence_sweeps: AtomicSnapshot,
}

pub fn snapshot() -> CoreMetricsSnapshot {
    CoreMetricsSnapshot {
        record_writes: RECORD_WRITES.snapshot(),
        snapshot_appends: SNAPSHOT_APPENDS.snapshot(),
        presence_sweeps: PRESENCE_SWEEPS.snapshot(),
    }
}

#[inline]
pub fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(UNSET_TS)
}

#[inline]
pub fn timestamp_to_option(value: u64) -> Option<u64> {
    if value == UNSET_TS {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_success_and_failure() {
        let metric = AtomicMetric::new();
        metric.record_success();
        metric.record_success();
        metric.record_failure();

        let snapshot = metric.snapshot();
        assert_eq!(snapshot.successes, 2);
        assert_eq!(snapshot.failures, 1);
        assert!(snapshot.last_success_ms.is_some());
        assert!(snapshot.last_failure_ms.is_some());
    }

    #[test]
    fn test_reset_clears_counters_and_timestamps() {
        let metric = AtomicMetric::new();
        metric.record_success();
        metric.reset();

        let snapshot = metric.snapshot();
        assert_eq!(snapshot.successes, 0);
        assert_eq!(snapshot.failures, 0);
        assert_eq!(snapshot.last_success_ms, None);
    }

    #[test]
    fn test_timestamp_to_option_treats_zero_as_unset() {
        assert_eq!(timestamp_to_option(UNSET_TS), None);
        assert_eq!(timestamp_to_option(12), Some(12));
    }
}
