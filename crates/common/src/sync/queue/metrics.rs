use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};

use serde::{Deserialize, Serialize};

/// Offline queue counters
///
/// Counters are process-lifetime totals; they are not persisted with the
/// queue and start from zero after a reload.
#[derive(Debug, Default)]
pub struct QueueMetrics {
    pub total_enqueued: AtomicU64,
    pub total_completed: AtomicU64,
    pub total_failed: AtomicU64,
    pub total_retried: AtomicU64,
    pub total_evicted: AtomicU64,
    pub capacity_rejections: AtomicU64,
    pub processing_passes: AtomicU64,
    pub persistence_operations: AtomicU64,
    pub persistence_failures: AtomicU64,
    pub current_size: AtomicUsize,
    pub queue_depth_max: AtomicUsize,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_enqueue(&self) {
        self.total_enqueued.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn record_completion(&self) {
        self.total_completed.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.total_failed.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.total_retried.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record completed entries dropped to make room
    pub fn record_eviction(&self, count: usize) {
        self.total_evicted.fetch_add(count as u64, AtomicOrdering::Relaxed);
    }

    pub fn record_capacity_rejection(&self) {
        self.capacity_rejections.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn record_pass(&self) {
        self.processing_passes.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record persistence operation
    pub fn record_persistence(&self, success: bool) {
        self.persistence_operations.fetch_add(1, AtomicOrdering::Relaxed);
        if !success {
            self.persistence_failures.fetch_add(1, AtomicOrdering::Relaxed);
        }
    }

    /// Update current size
    pub fn update_size(&self, size: usize) {
        self.current_size.store(size, AtomicOrdering::Relaxed);
        self.update_max_depth(size);
    }

    /// Update maximum depth if current exceeds it
    fn update_max_depth(&self, current: usize) {
        let mut max = self.queue_depth_max.load(AtomicOrdering::Relaxed);

        while current > max {
            match self.queue_depth_max.compare_exchange_weak(
                max,
                current,
                AtomicOrdering::Relaxed,
                AtomicOrdering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => max = actual,
            }
        }
    }

    /// Get a snapshot of metrics
    pub fn snapshot(&self) -> QueueMetricsSnapshot {
        QueueMetricsSnapshot {
            total_enqueued: self.total_enqueued.load(AtomicOrdering::Relaxed),
            total_completed: self.total_completed.load(AtomicOrdering::Relaxed),
            total_failed: self.total_failed.load(AtomicOrdering::Relaxed),
            total_retried: self.total_retried.load(AtomicOrdering::Relaxed),
            total_evicted: self.total_evicted.load(AtomicOrdering::Relaxed),
            capacity_rejections: self.capacity_rejections.load(AtomicOrdering::Relaxed),
            processing_passes: self.processing_passes.load(AtomicOrdering::Relaxed),
            persistence_operations: self.persistence_operations.load(AtomicOrdering::Relaxed),
            persistence_failures: self.persistence_failures.load(AtomicOrdering::Relaxed),
            current_size: self.current_size.load(AtomicOrdering::Relaxed),
            queue_depth_max: self.queue_depth_max.load(AtomicOrdering::Relaxed),
            success_rate: self.calculate_success_rate(),
        }
    }

    /// Calculate success rate
    fn calculate_success_rate(&self) -> f64 {
        let completed = self.total_completed.load(AtomicOrdering::Relaxed);
        let failed = self.total_failed.load(AtomicOrdering::Relaxed);
        let total = completed + failed;

        if total == 0 {
            return 100.0;
        }

        (completed as f64 / total as f64) * 100.0
    }
}

/// Immutable metrics snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMetricsSnapshot {
    pub total_enqueued: u64,
    pub total_completed: u64,
    pub total_failed: u64,
    pub total_retried: u64,
    pub total_evicted: u64,
    pub capacity_rejections: u64,
    pub processing_passes: u64,
    pub persistence_operations: u64,
    pub persistence_failures: u64,
    pub current_size: usize,
    pub queue_depth_max: usize,
    pub success_rate: f64,
}

impl QueueMetricsSnapshot {
    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Offline Queue Metrics:\n\
            - Current Size: {} (peak {})\n\
            - Total Enqueued: {}\n\
            - Replayed: {} (Success: {:.1}%)\n\
            - Retries: {}\n\
            - Evicted: {}, Rejected: {}\n\
            - Persistence Failures: {}",
            self.current_size,
            self.queue_depth_max,
            self.total_enqueued,
            self.total_completed + self.total_failed,
            self.success_rate,
            self.total_retried,
            self.total_evicted,
            self.capacity_rejections,
            self.persistence_failures
        )
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for sync::queue::metrics.
    use super::*;

    /// Validates `QueueMetrics::snapshot` behavior for the mixed outcome
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms counters and the success rate reflect recorded events.
    #[test]
    fn test_snapshot_counts() {
        let metrics = QueueMetrics::new();
        metrics.record_enqueue();
        metrics.record_enqueue();
        metrics.record_completion();
        metrics.record_failure();
        metrics.record_retry();
        metrics.record_eviction(3);
        metrics.record_persistence(true);
        metrics.record_persistence(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_enqueued, 2);
        assert_eq!(snapshot.total_evicted, 3);
        assert_eq!(snapshot.persistence_operations, 2);
        assert_eq!(snapshot.persistence_failures, 1);
        assert!((snapshot.success_rate - 50.0).abs() < f64::EPSILON);
        assert!(snapshot.summary().contains("Retries: 1"));
    }

    /// Validates `QueueMetrics::update_size` behavior for the peak depth
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms the peak survives the queue shrinking.
    #[test]
    fn test_peak_depth_tracked() {
        let metrics = QueueMetrics::new();
        metrics.update_size(5);
        metrics.update_size(2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.current_size, 2);
        assert_eq!(snapshot.queue_depth_max, 5);
    }

    /// Validates `QueueMetrics::snapshot` behavior for the idle scenario.
    ///
    /// Assertions:
    /// - Confirms an idle queue reports a 100% success rate.
    #[test]
    fn test_idle_success_rate() {
        assert!((QueueMetrics::new().snapshot().success_rate - 100.0).abs() < f64::EPSILON);
    }
}
