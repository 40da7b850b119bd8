use crate::config::{ConfigError, ShipperConfig};
use crate::encode::encode_batch;
use crate::filter::LevelFilter;
use crate::queue::RecordQueue;
use crate::record::{Bindings, Record, Severity};
use crate::sink::influx::InfluxSink;
use crate::sink::{PointSink, WriteError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Callback invoked whenever a batch submission fails. The batch is
/// already discarded by the time the hook runs (at-most-once delivery).
pub type FlushErrorHook = Arc<dyn Fn(&WriteError) + Send + Sync>;

/// Lifecycle state of a shipper instance. There is no restart path:
/// once stopped, admitted records are accepted but never flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipperState {
    Running,
    Stopped,
}

/// Interval-flushed telemetry shipper. Producers call [`Shipper::admit`];
/// records that pass the level filter accumulate in the shared queue and
/// ship on every timer tick, on explicit [`Shipper::flush`], and once more
/// on [`Shipper::shutdown`].
pub struct Shipper {
    core: Arc<FlushCore>,
    filter: LevelFilter,
    flush_interval_ms: u64,
    timer: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
    stopped: AtomicBool,
}

/// State shared with the timer task: the queue, the sink, and the flush
/// exclusion lock that keeps cycles from pipelining.
struct FlushCore {
    queue: RecordQueue,
    sink: Arc<dyn PointSink>,
    hostname: String,
    flush_lock: tokio::sync::Mutex<()>,
    error_hook: Mutex<Option<FlushErrorHook>>,
}

impl FlushCore {
    /// Run one flush cycle, waiting for any in-flight cycle to finish
    /// first. Used by explicit flushes and the final shutdown drain.
    async fn flush_cycle(&self) {
        let _guard = self.flush_lock.lock().await;
        self.run_flush().await;
    }

    /// Timer-tick variant: if a previous cycle's submission is still
    /// outstanding, skip this tick instead of pipelining a second drain.
    async fn try_flush_cycle(&self) {
        match self.flush_lock.try_lock() {
            Ok(_guard) => self.run_flush().await,
            Err(_) => debug!("Flush already in progress, skipping tick"),
        }
    }

    // Caller must hold flush_lock.
    async fn run_flush(&self) {
        let batch = self.queue.drain_all();
        if batch.is_empty() {
            return;
        }

        let points = encode_batch(&batch, &self.hostname);
        debug!(records = points.len(), "Flushing batch");

        // Drained records are gone regardless of the outcome: a failed
        // batch is discarded, never re-queued.
        if let Err(e) = self.sink.write_points(&points).await {
            error!(error = %e, records = points.len(), "Failed to ship batch, discarding");
            let hook = self.error_hook.lock().unwrap().clone();
            if let Some(hook) = hook {
                hook(&e);
            }
        }
    }
}

impl Shipper {
    /// Construct the backend write client from `config` and start the
    /// recurring flush timer when a positive interval is configured.
    ///
    /// Fails fast when the API token is missing; no client or timer is
    /// created in that case. Must be called from within a Tokio runtime
    /// when `flush_interval_ms > 0`.
    pub fn initialize(config: ShipperConfig) -> Result<Self, ConfigError> {
        let token = config.require_token()?.to_string();
        let sink = InfluxSink::new(&config.url, &token, &config.org, &config.bucket)
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self::with_sink(config, Arc::new(sink)))
    }

    /// Run the same flush driver over an injected sink. The credential
    /// check is skipped since the caller already built the destination.
    pub fn with_sink(config: ShipperConfig, sink: Arc<dyn PointSink>) -> Self {
        let core = Arc::new(FlushCore {
            queue: RecordQueue::new(config.max_pending),
            sink,
            hostname: config.hostname.clone(),
            flush_lock: tokio::sync::Mutex::new(()),
            error_hook: Mutex::new(None),
        });

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

        let timer = if config.flush_interval_ms > 0 {
            let core = Arc::clone(&core);
            let period = Duration::from_millis(config.flush_interval_ms);
            Some(tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                // The timer stops cooperatively, between cycles: a cycle
                // already awaiting the backend runs to completion or
                // failure, it is never cancelled mid-submission.
                loop {
                    tokio::select! {
                        biased;
                        _ = shutdown_rx.changed() => break,
                        _ = interval.tick() => core.try_flush_cycle().await,
                    }
                }
            }))
        } else {
            None
        };

        info!(
            interval_ms = config.flush_interval_ms,
            hostname = %config.hostname,
            "Shipper running"
        );

        Self {
            core,
            filter: LevelFilter::new(config.levels),
            flush_interval_ms: config.flush_interval_ms,
            timer: Mutex::new(timer),
            shutdown_tx,
            stopped: AtomicBool::new(false),
        }
    }

    /// Fire-and-forget producer entry point. Applies the level filter,
    /// stamps the record, and appends it to the queue. With a zero flush
    /// interval the call additionally awaits one synchronous flush cycle;
    /// in batched mode it never touches the network.
    pub async fn admit(&self, bindings: &Bindings, level: Severity, message: impl Into<String>) {
        if !self.filter.should_admit(bindings, level) {
            return;
        }

        self.core
            .queue
            .enqueue(Record::new(bindings.clone(), level, message));

        if self.flush_interval_ms == 0 && self.state() == ShipperState::Running {
            self.core.flush_cycle().await;
        }
    }

    /// On-demand flush cycle. Waits for any in-flight cycle first.
    pub async fn flush(&self) {
        self.core.flush_cycle().await;
    }

    /// Stop the recurring timer and perform exactly one final flush so
    /// every record admitted up to this point gets one delivery attempt.
    /// Idempotent; later calls are no-ops.
    pub async fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        // Signal the timer to exit at its next loop iteration without
        // waiting for it. A tick cycle that already drained the queue and
        // is awaiting the backend keeps running; the final flush below
        // serializes behind it through flush_lock, so that submission
        // still runs to completion or failure.
        let _ = self.shutdown_tx.send(true);

        info!("Shipper stopping, performing final flush");
        self.core.flush_cycle().await;

        if let Some(timer) = self.timer.lock().unwrap().take() {
            timer.abort();
        }
    }

    pub fn state(&self) -> ShipperState {
        if self.stopped.load(Ordering::SeqCst) {
            ShipperState::Stopped
        } else {
            ShipperState::Running
        }
    }

    /// Number of records admitted but not yet drained.
    pub fn pending(&self) -> usize {
        self.core.queue.len()
    }

    /// Register a hook invoked on every failed batch submission, in
    /// addition to the error log. Producers never see these failures.
    pub fn set_flush_error_hook(&self, hook: impl Fn(&WriteError) + Send + Sync + 'static) {
        *self.core.error_hook.lock().unwrap() = Some(Arc::new(hook));
    }
}

impl Drop for Shipper {
    fn drop(&mut self) {
        // The final drain belongs to shutdown(); here we only make sure
        // the timer task does not outlive the shipper. Dropping
        // shutdown_tx already wakes the timer loop; the abort is a
        // last-resort leak guard.
        if let Some(timer) = self.timer.lock().unwrap().take() {
            timer.abort();
        }
    }
}
