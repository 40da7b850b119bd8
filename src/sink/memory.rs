use crate::encode::Point;
use crate::sink::{PointSink, WriteError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory sink that records every submitted batch. Used by tests; also
/// handy as a stand-in destination when wiring the shipper into a harness.
/// Writes can be delayed or failed on demand, and the sink tracks how many
/// submissions ran concurrently so callers can assert on overlap.
#[derive(Default)]
pub struct MemorySink {
    batches: Mutex<Vec<Vec<Point>>>,
    fail_writes: Mutex<bool>,
    write_delay: Mutex<Option<Duration>>,
    writes_started: AtomicUsize,
    writes_completed: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All batches submitted so far, in submission order.
    pub fn batches(&self) -> Vec<Vec<Point>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    /// Make subsequent writes fail, to exercise the shipper's error path.
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    /// Hold each write for `delay` before it lands, simulating a slow
    /// backend.
    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = Some(delay);
    }

    /// Submissions that have started, including any still in flight.
    pub fn writes_started(&self) -> usize {
        self.writes_started.load(Ordering::SeqCst)
    }

    /// Submissions that ran to completion or failure.
    pub fn writes_completed(&self) -> usize {
        self.writes_completed.load(Ordering::SeqCst)
    }

    /// Highest number of submissions ever in flight at once.
    pub fn max_concurrent_writes(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PointSink for MemorySink {
    async fn write_points(&self, points: &[Point]) -> Result<(), WriteError> {
        self.writes_started.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.write_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = if *self.fail_writes.lock().unwrap() {
            Err(WriteError::Backend {
                status: 503,
                message: "simulated outage".to_string(),
            })
        } else {
            self.batches.lock().unwrap().push(points.to_vec());
            Ok(())
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.writes_completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}
