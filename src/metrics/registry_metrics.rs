//! Registry metrics tracking using OpenTelemetry.

use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Instant;

/// Totals recorded by a [`RegistryMetrics`] since it was created.
///
/// Mirrors what was sent to the OpenTelemetry instruments so it can be read
/// back in-process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Broadcasts started
    pub broadcasts: u64,
    /// Successful notifications, broadcast or replay
    pub deliveries: u64,
    /// Notifications that returned an error
    pub listener_failures: u64,
    /// Replays delivered to late joiners
    pub replays: u64,
    /// Last reported number of registered listeners
    pub active_listeners: i64,
}

#[derive(Default)]
struct Totals {
    broadcasts: AtomicU64,
    deliveries: AtomicU64,
    listener_failures: AtomicU64,
    replays: AtomicU64,
    active_listeners: AtomicI64,
}

/// Metrics collector for registry operations.
///
/// Tracks broadcasts, deliveries, listener failures, broadcast latency and the
/// number of registered listeners using OpenTelemetry metrics.
///
/// # Examples
///
/// ```rust,no_run
/// use observer_registry::metrics::RegistryMetrics;
/// use opentelemetry::global;
///
/// let meter = global::meter("observer-registry");
/// let metrics = RegistryMetrics::new(meter);
///
/// let timer = metrics.start_broadcast();
/// // ... deliver to listeners ...
/// metrics.record_broadcast(timer, 3, 0);
/// ```
#[derive(Clone)]
pub struct RegistryMetrics {
    broadcasts: Counter<u64>,
    deliveries: Counter<u64>,
    listener_failures: Counter<u64>,
    broadcast_duration: Histogram<f64>,
    active_listeners: Gauge<i64>,
    event_age_seconds: Gauge<i64>,
    last_broadcast: Arc<parking_lot::Mutex<Instant>>,
    totals: Arc<Totals>,
}

impl RegistryMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let broadcasts = meter
            .u64_counter("observer_registry.broadcasts")
            .with_description("Total number of broadcasts started")
            .build();

        let deliveries = meter
            .u64_counter("observer_registry.deliveries")
            .with_description("Number of successful listener notifications")
            .build();

        let listener_failures = meter
            .u64_counter("observer_registry.listener.failures")
            .with_description("Number of listener notifications that returned an error")
            .build();

        let broadcast_duration = meter
            .f64_histogram("observer_registry.broadcast.duration")
            .with_description("Duration of broadcast operations in seconds")
            .with_unit("s")
            .build();

        let active_listeners = meter
            .i64_gauge("observer_registry.listeners.active")
            .with_description("Number of registered listeners")
            .build();

        let event_age_seconds = meter
            .i64_gauge("observer_registry.event.age")
            .with_description("Time since the last broadcast in seconds")
            .with_unit("s")
            .build();

        Self {
            broadcasts,
            deliveries,
            listener_failures,
            broadcast_duration,
            active_listeners,
            event_age_seconds,
            last_broadcast: Arc::new(parking_lot::Mutex::new(Instant::now())),
            totals: Arc::new(Totals::default()),
        }
    }

    /// Start a broadcast timer.
    ///
    /// Pass the returned `Instant` to [`record_broadcast`](Self::record_broadcast)
    /// once delivery has finished.
    pub fn start_broadcast(&self) -> Instant {
        self.broadcasts.add(1, &[]);
        self.totals.broadcasts.fetch_add(1, Ordering::Relaxed);
        Instant::now()
    }

    /// Record the outcome of a broadcast.
    ///
    /// # Arguments
    ///
    /// * `start` - The `Instant` returned from `start_broadcast()`
    /// * `delivered` - Listeners notified successfully
    /// * `failed` - Listeners that returned an error
    pub fn record_broadcast(&self, start: Instant, delivered: usize, failed: usize) {
        let duration = start.elapsed().as_secs_f64();
        self.broadcast_duration.record(duration, &[]);
        self.record_outcomes(delivered as u64, failed as u64);

        *self.last_broadcast.lock() = Instant::now();
    }

    /// Record the cached event being replayed to a late joiner.
    pub fn record_replay(&self, succeeded: bool) {
        self.totals.replays.fetch_add(1, Ordering::Relaxed);
        if succeeded {
            self.record_outcomes(1, 0);
        } else {
            self.record_outcomes(0, 1);
        }
    }

    fn record_outcomes(&self, delivered: u64, failed: u64) {
        self.deliveries.add(delivered, &[]);
        self.totals.deliveries.fetch_add(delivered, Ordering::Relaxed);
        if failed > 0 {
            self.listener_failures.add(failed, &[]);
            self.totals
                .listener_failures
                .fetch_add(failed, Ordering::Relaxed);
        }
    }

    /// Update the number of registered listeners.
    pub fn update_listener_count(&self, count: usize) {
        self.active_listeners.record(count as i64, &[]);
        self.totals
            .active_listeners
            .store(count as i64, Ordering::Relaxed);
    }

    /// Read back the totals recorded so far.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            broadcasts: self.totals.broadcasts.load(Ordering::Relaxed),
            deliveries: self.totals.deliveries.load(Ordering::Relaxed),
            listener_failures: self.totals.listener_failures.load(Ordering::Relaxed),
            replays: self.totals.replays.load(Ordering::Relaxed),
            active_listeners: self.totals.active_listeners.load(Ordering::Relaxed),
        }
    }

    /// Update the event age metric.
    ///
    /// This should be called periodically to track how long the registry has
    /// been quiet.
    pub fn update_event_age(&self) {
        let age_secs = self.last_broadcast.lock().elapsed().as_secs() as i64;
        self.event_age_seconds.record(age_secs, &[]);
    }
}
