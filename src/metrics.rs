//! Runtime counters for a log directory

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use parking_lot::Mutex;

/// Performance metrics collector for a log directory
#[derive(Debug)]
pub struct MetricsCollector {
    // Operation counts
    /// Number of appended lines
    append_count: AtomicUsize,
    /// Number of shards this process compressed
    compaction_count: AtomicUsize,
    /// Compactions that found the work already done by someone else
    skipped_compaction_count: AtomicUsize,
    /// In-progress leftovers removed while resolving the append target
    artifacts_removed: AtomicUsize,

    // Data metrics
    /// Bytes appended, terminators included
    bytes_appended: AtomicU64,
    /// Raw bytes fed into compression
    bytes_compressed_in: AtomicU64,
    /// Compressed bytes written
    bytes_compressed_out: AtomicU64,
    /// Lines handed out by readers
    lines_read: AtomicUsize,

    // Timing metrics
    /// Total append duration in nanoseconds
    append_duration_ns: AtomicU64,
    /// Total compaction duration in nanoseconds
    compaction_duration_ns: AtomicU64,
    /// Last compaction duration
    last_compaction_duration: Mutex<Duration>,

    /// Start time of the metrics collector
    start_time: Instant,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            append_count: AtomicUsize::new(0),
            compaction_count: AtomicUsize::new(0),
            skipped_compaction_count: AtomicUsize::new(0),
            artifacts_removed: AtomicUsize::new(0),

            bytes_appended: AtomicU64::new(0),
            bytes_compressed_in: AtomicU64::new(0),
            bytes_compressed_out: AtomicU64::new(0),
            lines_read: AtomicUsize::new(0),

            append_duration_ns: AtomicU64::new(0),
            compaction_duration_ns: AtomicU64::new(0),
            last_compaction_duration: Mutex::new(Duration::from_secs(0)),

            start_time: Instant::now(),
        }
    }

    /// Record one appended line of `bytes` bytes
    pub fn record_append(&self, bytes: u64, duration: Duration) {
        self.append_count.fetch_add(1, Ordering::Relaxed);
        self.bytes_appended.fetch_add(bytes, Ordering::Relaxed);
        self.append_duration_ns.fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Record a compaction done by this process
    pub fn record_compaction(&self, original: u64, compressed: u64, duration: Duration) {
        self.compaction_count.fetch_add(1, Ordering::Relaxed);
        self.bytes_compressed_in.fetch_add(original, Ordering::Relaxed);
        self.bytes_compressed_out.fetch_add(compressed, Ordering::Relaxed);
        self.compaction_duration_ns.fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        *self.last_compaction_duration.lock() = duration;
    }

    /// Increment skipped compaction count
    pub fn increment_skipped_compactions(&self) {
        self.skipped_compaction_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment removed artifact count
    pub fn increment_artifacts_removed(&self) {
        self.artifacts_removed.fetch_add(1, Ordering::Relaxed);
    }

    /// Add lines read
    pub fn add_lines_read(&self, count: usize) {
        self.lines_read.fetch_add(count, Ordering::Relaxed);
    }

    // Getters

    pub fn get_append_count(&self) -> usize {
        self.append_count.load(Ordering::Relaxed)
    }

    pub fn get_compaction_count(&self) -> usize {
        self.compaction_count.load(Ordering::Relaxed)
    }

    pub fn get_skipped_compaction_count(&self) -> usize {
        self.skipped_compaction_count.load(Ordering::Relaxed)
    }

    pub fn get_artifacts_removed(&self) -> usize {
        self.artifacts_removed.load(Ordering::Relaxed)
    }

    pub fn get_bytes_appended(&self) -> u64 {
        self.bytes_appended.load(Ordering::Relaxed)
    }

    pub fn get_lines_read(&self) -> usize {
        self.lines_read.load(Ordering::Relaxed)
    }

    /// Get total append duration
    pub fn get_append_duration(&self) -> Duration {
        Duration::from_nanos(self.append_duration_ns.load(Ordering::Relaxed))
    }

    /// Get total compaction duration
    pub fn get_compaction_duration(&self) -> Duration {
        Duration::from_nanos(self.compaction_duration_ns.load(Ordering::Relaxed))
    }

    /// Get last compaction duration
    pub fn get_last_compaction_duration(&self) -> Duration {
        *self.last_compaction_duration.lock()
    }

    /// Overall ratio of raw to compressed bytes over all compactions, 0.0 before the first
    pub fn get_compression_ratio(&self) -> f64 {
        let out = self.bytes_compressed_out.load(Ordering::Relaxed);
        if out == 0 {
            return 0.0;
        }
        self.bytes_compressed_in.load(Ordering::Relaxed) as f64 / out as f64
    }

    /// Get uptime of the metrics collector
    pub fn get_uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Reset all metrics
    pub fn reset(&self) {
        self.append_count.store(0, Ordering::Relaxed);
        self.compaction_count.store(0, Ordering::Relaxed);
        self.skipped_compaction_count.store(0, Ordering::Relaxed);
        self.artifacts_removed.store(0, Ordering::Relaxed);

        self.bytes_appended.store(0, Ordering::Relaxed);
        self.bytes_compressed_in.store(0, Ordering::Relaxed);
        self.bytes_compressed_out.store(0, Ordering::Relaxed);
        self.lines_read.store(0, Ordering::Relaxed);

        self.append_duration_ns.store(0, Ordering::Relaxed);
        self.compaction_duration_ns.store(0, Ordering::Relaxed);
        *self.last_compaction_duration.lock() = Duration::from_secs(0);
    }

    /// Get a report of all metrics
    pub fn get_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Lines Directory Metrics Report ===\n\n");

        let uptime = self.get_uptime();
        report.push_str(&format!("Uptime: {:?}\n\n", uptime));

        report.push_str("Operation Counts:\n");
        report.push_str(&format!("  Appends: {}\n", self.get_append_count()));
        report.push_str(&format!("  Compactions: {}\n", self.get_compaction_count()));
        report.push_str(&format!(
            "  Skipped Compactions: {}\n",
            self.get_skipped_compaction_count()
        ));
        report.push_str(&format!("  Artifacts Removed: {}\n\n", self.get_artifacts_removed()));

        report.push_str("Data Metrics:\n");
        report.push_str(&format!("  Bytes Appended: {}\n", self.get_bytes_appended()));
        report.push_str(&format!("  Lines Read: {}\n", self.get_lines_read()));
        report.push_str(&format!("  Compression Ratio: {:.2}\n\n", self.get_compression_ratio()));

        report.push_str("Performance Metrics:\n");
        if self.get_append_count() > 0 {
            let avg_append =
                self.get_append_duration().as_micros() / self.get_append_count() as u128;
            report.push_str(&format!("  Avg. Append Time: {}µs\n", avg_append));
        }
        if self.get_compaction_count() > 0 {
            let avg_compaction =
                self.get_compaction_duration().as_micros() / self.get_compaction_count() as u128;
            report.push_str(&format!("  Avg. Compaction Time: {}µs\n", avg_compaction));
        }
        report.push_str(&format!(
            "  Last Compaction Time: {:?}\n",
            self.get_last_compaction_duration()
        ));

        let uptime_secs = uptime.as_secs_f64();
        if uptime_secs > 0.0 {
            report.push_str("\nThroughput Metrics:\n");
            report.push_str(&format!(
                "  Appends/sec: {:.2}\n",
                self.get_append_count() as f64 / uptime_secs
            ));
            report.push_str(&format!(
                "  Append Bytes/sec: {:.2}\n",
                self.get_bytes_appended() as f64 / uptime_secs
            ));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_metrics_basic_recording() {
        let metrics = MetricsCollector::new();

        metrics.record_append(7, Duration::from_micros(30));
        metrics.record_append(11, Duration::from_micros(10));
        metrics.increment_skipped_compactions();
        metrics.increment_artifacts_removed();
        metrics.add_lines_read(5);

        assert_eq!(metrics.get_append_count(), 2);
        assert_eq!(metrics.get_bytes_appended(), 18);
        assert_eq!(metrics.get_append_duration(), Duration::from_micros(40));
        assert_eq!(metrics.get_skipped_compaction_count(), 1);
        assert_eq!(metrics.get_artifacts_removed(), 1);
        assert_eq!(metrics.get_lines_read(), 5);
    }

    #[test]
    fn test_metrics_compaction_recording() {
        let metrics = MetricsCollector::new();
        assert_eq!(metrics.get_compression_ratio(), 0.0);

        metrics.record_compaction(1000, 100, Duration::from_millis(30));
        metrics.record_compaction(1000, 400, Duration::from_millis(10));

        assert_eq!(metrics.get_compaction_count(), 2);
        assert_eq!(metrics.get_compaction_duration(), Duration::from_millis(40));
        assert_eq!(metrics.get_last_compaction_duration(), Duration::from_millis(10));
        assert_eq!(metrics.get_compression_ratio(), 4.0);
    }

    #[test]
    fn test_metrics_report() {
        let metrics = MetricsCollector::new();
        metrics.record_append(100, Duration::from_micros(5));
        metrics.record_compaction(100, 50, Duration::from_micros(50));

        let report = metrics.get_report();
        assert!(report.contains("Operation Counts:"));
        assert!(report.contains("Appends: 1"));
        assert!(report.contains("Compression Ratio: 2.00"));
        assert!(report.contains("Performance Metrics:"));
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = MetricsCollector::new();
        metrics.record_append(10, Duration::from_micros(1));
        metrics.record_compaction(10, 5, Duration::from_micros(1));

        metrics.reset();

        assert_eq!(metrics.get_append_count(), 0);
        assert_eq!(metrics.get_bytes_appended(), 0);
        assert_eq!(metrics.get_compaction_count(), 0);
        assert_eq!(metrics.get_last_compaction_duration(), Duration::from_secs(0));
        assert_eq!(metrics.get_compression_ratio(), 0.0);
    }

    #[test]
    fn test_metrics_thread_safety() {
        let metrics = Arc::new(MetricsCollector::new());
        let mut handles = Vec::new();

        for _ in 0..10 {
            let metrics_clone = metrics.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    metrics_clone.record_append(10, Duration::from_nanos(1));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.get_append_count(), 1000);
        assert_eq!(metrics.get_bytes_appended(), 10000);
    }
}
