//! Request metrics and statistics tracking for the prediction service.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept for percentile computation
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Width of one predicted-duration bucket, in minutes
const DURATION_BUCKET_MINUTES: f64 = 10.0;

const DURATION_BUCKETS: usize = 10;

/// Metrics collector for the prediction service
pub struct ServiceMetrics {
    /// Successful predictions
    pub predictions_served: AtomicU64,
    /// Requests answered with an error
    pub requests_failed: AtomicU64,
    /// Failures by HTTP status code
    failures_by_status: RwLock<BTreeMap<u16, u64>>,
    /// Request latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Predicted duration distribution, last bucket is open-ended
    duration_buckets: RwLock<[u64; DURATION_BUCKETS]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            failures_by_status: RwLock::new(BTreeMap::new()),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            duration_buckets: RwLock::new([0; DURATION_BUCKETS]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, latency: Duration, duration: f64) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);

        let bucket = duration_bucket(duration);
        if let Ok(mut buckets) = self.duration_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a request that ended with an error status
    pub fn record_failure(&self, latency: Duration, status: u16) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);

        if let Ok(mut by_status) = self.failures_by_status.write() {
            *by_status.entry(status).or_insert(0) += 1;
        }
    }

    fn record_latency(&self, latency: Duration) {
        if let Ok(mut times) = self.latencies.write() {
            times.push(latency.as_micros() as u64);
            if times.len() > MAX_LATENCY_SAMPLES {
                times.drain(0..MAX_LATENCY_SAMPLES / 2);
            }
        }
    }

    /// Get request latency statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let times = self.latencies.read().unwrap_or_else(|e| e.into_inner());
        if times.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        drop(times);
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (predictions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_duration_distribution(&self) -> [u64; DURATION_BUCKETS] {
        *self
            .duration_buckets
            .read()
            .unwrap_or_else(|e| e.into_inner())
    }

    pub fn get_failures_by_status(&self) -> BTreeMap<u16, u64> {
        self.failures_by_status
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Point-in-time view served on `/metrics`
    pub fn snapshot(&self) -> MetricsSnapshot {
        let buckets = self.get_duration_distribution();
        let duration_distribution = buckets
            .iter()
            .enumerate()
            .map(|(i, &count)| DurationBucket {
                from_minutes: i as f64 * DURATION_BUCKET_MINUTES,
                to_minutes: (i + 1 < DURATION_BUCKETS)
                    .then(|| (i + 1) as f64 * DURATION_BUCKET_MINUTES),
                count,
            })
            .collect();

        MetricsSnapshot {
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            failures_by_status: self.get_failures_by_status(),
            throughput_per_sec: self.get_throughput(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            latency: self.get_latency_stats(),
            duration_distribution,
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let total = snapshot.predictions_served + snapshot.requests_failed;
        let failure_rate = if total > 0 {
            (snapshot.requests_failed as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        let latency = &snapshot.latency;

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║          DURATION PREDICTION SERVICE - METRICS SUMMARY       ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Predictions Served: {:>8}  │  Throughput: {:>7.1} req/s   ║",
            snapshot.predictions_served, snapshot.throughput_per_sec
        );
        info!(
            "║ Failed Requests:    {:>8}  │  Failure Rate: {:>6.1}%      ║",
            snapshot.requests_failed, failure_rate
        );
        for (status, count) in &snapshot.failures_by_status {
            info!("║   HTTP {}: {:>6}                                            ║", status, count);
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Latency (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5}     ║",
            latency.mean_us, latency.p50_us, latency.p95_us, latency.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Predicted Duration Distribution (minutes):                   ║");
        let served = snapshot.predictions_served;
        for bucket in &snapshot.duration_distribution {
            let pct = if served > 0 {
                (bucket.count as f64 / served as f64) * 100.0
            } else {
                0.0
            };
            let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
            let range = match bucket.to_minutes {
                Some(to) => format!("{:>3.0}-{:<3.0}", bucket.from_minutes, to),
                None => format!("{:>3.0}+   ", bucket.from_minutes),
            };
            info!("║   {}: {:>6} ({:>5.1}%) {}", range, bucket.count, pct, bar);
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_bucket(duration: f64) -> usize {
    if duration.is_nan() || duration <= 0.0 {
        return 0;
    }
    ((duration / DURATION_BUCKET_MINUTES) as usize).min(DURATION_BUCKETS - 1)
}

/// Request latency statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// One bucket of the predicted-duration histogram
#[derive(Debug, Clone, Serialize)]
pub struct DurationBucket {
    pub from_minutes: f64,
    pub to_minutes: Option<f64>,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub predictions_served: u64,
    pub requests_failed: u64,
    pub failures_by_status: BTreeMap<u16, u64>,
    pub throughput_per_sec: f64,
    pub uptime_secs: u64,
    pub latency: LatencyStats,
    pub duration_distribution: Vec<DurationBucket>,
}

/// Periodic metrics reporter that logs summaries
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record_prediction(Duration::from_micros(100), 12.0);
        metrics.record_prediction(Duration::from_micros(200), 45.0);
        metrics.record_failure(Duration::from_micros(50), 422);

        assert_eq!(metrics.predictions_served.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.requests_failed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.get_failures_by_status().get(&422), Some(&1));
        assert_eq!(metrics.get_latency_stats().count, 3);
        assert_eq!(metrics.get_latency_stats().max_us, 200);
    }

    #[test]
    fn test_duration_buckets() {
        assert_eq!(duration_bucket(-3.0), 0);
        assert_eq!(duration_bucket(0.0), 0);
        assert_eq!(duration_bucket(9.9), 0);
        assert_eq!(duration_bucket(10.0), 1);
        assert_eq!(duration_bucket(95.0), 9);
        assert_eq!(duration_bucket(500.0), 9);
    }

    #[test]
    fn test_snapshot() {
        let metrics = ServiceMetrics::new();
        metrics.record_prediction(Duration::from_micros(10), 25.0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.predictions_served, 1);
        assert_eq!(snapshot.duration_distribution.len(), DURATION_BUCKETS);
        assert_eq!(snapshot.duration_distribution[2].count, 1);
        assert_eq!(snapshot.duration_distribution[9].to_minutes, None);
    }

    #[test]
    fn test_empty_latency_stats() {
        let stats = ServiceMetrics::new().get_latency_stats();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.p99_us, 0);
    }
}
