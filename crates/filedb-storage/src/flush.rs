//! Write-back flush scheduling.
//!
//! A [`FlushWorker`] owns one background thread that decides *when* the
//! backing file gets rewritten. Three triggers race at a single
//! `recv_timeout` point:
//!
//! - **debounce**: a mutation that pushes the [`DirtyCounter`] above
//!   [`FlushConfig::dirty_threshold`] tries to put a signal into a
//!   single-slot channel. If a signal is already pending the attempt is
//!   dropped, so bursts coalesce into one flush.
//! - **timer**: every [`FlushConfig::interval`] the worker flushes
//!   unconditionally, bounding how stale the file can get.
//! - **shutdown**: one final flush, whose result is sent back to the caller
//!   blocked in [`FlushWorker::shutdown`], then the thread exits.
//!
//! The worker does not know what a flush is; it runs the closure it was
//! spawned with. Flush failures are logged and the worker keeps going, so
//! the next trigger retries the full rewrite.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::error::StorageError;

/// Mutations tolerated before a debounce signal is sent.
pub const DEFAULT_DIRTY_THRESHOLD: usize = 5;

/// Period of the unconditional flush timer.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Tunables for the flush worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushConfig {
    /// A mutation that leaves the dirty counter strictly above this value
    /// requests a flush.
    pub dirty_threshold: usize,
    /// Period of the flush timer.
    pub interval: Duration,
}

impl Default for FlushConfig {
    fn default() -> Self {
        FlushConfig {
            dirty_threshold: DEFAULT_DIRTY_THRESHOLD,
            interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl FlushConfig {
    pub fn with_dirty_threshold(mut self, dirty_threshold: usize) -> Self {
        self.dirty_threshold = dirty_threshold;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Count of mutations applied since the last successful flush.
#[derive(Debug, Default)]
pub struct DirtyCounter(AtomicUsize);

impl DirtyCounter {
    /// Records one mutation and returns the new count.
    pub fn increment(&self) -> usize {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Release);
    }
}

enum FlushCommand {
    Flush,
    Shutdown(mpsc::Sender<Result<(), StorageError>>),
}

/// Sending half of the debounce channel, held by the store's mutating paths.
#[derive(Clone)]
pub struct FlushSignal {
    tx: SyncSender<FlushCommand>,
    threshold: usize,
}

impl FlushSignal {
    /// Requests a flush if `dirty` is above the threshold.
    ///
    /// Never blocks. Returns `true` only if a new signal was enqueued; a
    /// pending signal or a stopped worker makes this a no-op.
    pub fn notify(&self, dirty: usize) -> bool {
        if dirty <= self.threshold {
            return false;
        }
        match self.tx.try_send(FlushCommand::Flush) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle to the background flush thread.
///
/// The owner controls the thread's whole lifetime: it is spawned by
/// [`FlushWorker::spawn`] and joined by [`FlushWorker::shutdown`].
pub struct FlushWorker {
    signal: FlushSignal,
    handle: Option<JoinHandle<()>>,
}

impl FlushWorker {
    /// Starts the worker thread, which calls `flush` on every trigger.
    pub fn spawn<F>(config: FlushConfig, flush: F) -> Result<Self, StorageError>
    where
        F: FnMut() -> Result<(), StorageError> + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        let interval = config.interval;
        let handle = thread::Builder::new()
            .name("filedb-flush".to_string())
            .spawn(move || run(rx, interval, flush))?;

        debug!(
            threshold = config.dirty_threshold,
            interval_ms = interval.as_millis() as u64,
            "flush worker started"
        );

        Ok(FlushWorker {
            signal: FlushSignal {
                tx,
                threshold: config.dirty_threshold,
            },
            handle: Some(handle),
        })
    }

    pub fn signal(&self) -> &FlushSignal {
        &self.signal
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Asks the worker for a final flush, waits for its result, and joins
    /// the thread. Calling this again after it returned is a no-op.
    pub fn shutdown(&mut self) -> Result<(), StorageError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        let (reply_tx, reply_rx) = mpsc::channel();
        // Blocks while a debounce signal is still queued; the worker drains
        // it before it sees the shutdown request.
        let sent = self.signal.tx.send(FlushCommand::Shutdown(reply_tx));
        let result = match sent {
            Ok(()) => reply_rx.recv().unwrap_or(Err(StorageError::WorkerTerminated)),
            Err(_) => Err(StorageError::WorkerTerminated),
        };

        if handle.join().is_err() {
            return Err(StorageError::WorkerTerminated);
        }
        result
    }
}

fn run<F>(rx: Receiver<FlushCommand>, interval: Duration, mut flush: F)
where
    F: FnMut() -> Result<(), StorageError>,
{
    let mut next_tick = Instant::now() + interval;
    loop {
        let timeout = next_tick.saturating_duration_since(Instant::now());
        match rx.recv_timeout(timeout) {
            Ok(FlushCommand::Flush) => flush_logged(&mut flush, "debounce"),
            Err(RecvTimeoutError::Timeout) => {
                flush_logged(&mut flush, "timer");
                let now = Instant::now();
                next_tick += interval;
                if next_tick <= now {
                    next_tick = now + interval;
                }
            }
            Ok(FlushCommand::Shutdown(reply)) => {
                let result = flush();
                if let Err(err) = &result {
                    error!(error = %err, "final flush failed");
                }
                let _ = reply.send(result);
                info!("flush worker stopped");
                return;
            }
            Err(RecvTimeoutError::Disconnected) => {
                flush_logged(&mut flush, "disconnect");
                info!("flush worker stopped: all signal handles dropped");
                return;
            }
        }
    }
}

fn flush_logged<F>(flush: &mut F, trigger: &'static str)
where
    F: FnMut() -> Result<(), StorageError>,
{
    match flush() {
        Ok(()) => debug!(trigger, "flushed record table"),
        Err(err) => error!(trigger, error = %err, "flush failed; changes remain in memory"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const LONG: Duration = Duration::from_secs(3600);
    const WAIT: Duration = Duration::from_secs(5);

    /// Spawns a worker whose flushes are reported on the returned receiver.
    fn counting_worker(config: FlushConfig) -> (FlushWorker, Receiver<usize>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();
        let counter = Arc::clone(&count);
        let worker = FlushWorker::spawn(config, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = tx.send(n);
            Ok(())
        })
        .unwrap();
        (worker, rx, count)
    }

    #[test]
    fn default_config_matches_documented_values() {
        let config = FlushConfig::default();
        assert_eq!(config.dirty_threshold, 5);
        assert_eq!(config.interval, Duration::from_secs(5));
    }

    #[test]
    fn dirty_counter_counts_and_resets() {
        let dirty = DirtyCounter::default();
        assert_eq!(dirty.increment(), 1);
        assert_eq!(dirty.increment(), 2);
        assert_eq!(dirty.get(), 2);
        dirty.reset();
        assert_eq!(dirty.get(), 0);
    }

    #[test]
    fn notify_ignores_counts_at_or_below_threshold() {
        let (tx, rx) = mpsc::sync_channel(1);
        let signal = FlushSignal { tx, threshold: 5 };
        for dirty in 0..=5 {
            assert!(!signal.notify(dirty));
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn notify_coalesces_pending_signals() {
        let (tx, rx) = mpsc::sync_channel(1);
        let signal = FlushSignal { tx, threshold: 0 };
        assert!(signal.notify(1));
        assert!(!signal.notify(2));
        assert!(!signal.notify(3));

        assert!(matches!(rx.try_recv(), Ok(FlushCommand::Flush)));
        assert!(rx.try_recv().is_err());
        assert!(signal.notify(4));
    }

    #[test]
    fn debounce_signal_triggers_flush() {
        let config = FlushConfig::default()
            .with_dirty_threshold(2)
            .with_interval(LONG);
        let (mut worker, rx, _) = counting_worker(config);

        assert!(!worker.signal().notify(2));
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        assert!(worker.signal().notify(3));
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 1);

        worker.shutdown().unwrap();
    }

    #[test]
    fn timer_flushes_without_signals() {
        let config = FlushConfig::default()
            .with_dirty_threshold(usize::MAX)
            .with_interval(Duration::from_millis(20));
        let (mut worker, rx, _) = counting_worker(config);

        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 1);
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 2);

        worker.shutdown().unwrap();
    }

    #[test]
    fn shutdown_runs_final_flush_and_joins() {
        let config = FlushConfig::default().with_interval(LONG);
        let (mut worker, _rx, count) = counting_worker(config);

        assert!(worker.is_running());
        worker.shutdown().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!worker.is_running());

        // Second shutdown does nothing.
        worker.shutdown().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!worker.signal().notify(usize::MAX));
    }

    #[test]
    fn shutdown_reports_final_flush_error() {
        let config = FlushConfig::default().with_interval(LONG);
        let mut worker = FlushWorker::spawn(config, || Err(StorageError::Closed)).unwrap();
        assert!(matches!(worker.shutdown(), Err(StorageError::Closed)));
    }

    #[test]
    fn failed_flush_keeps_worker_alive() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();
        let counter = Arc::clone(&attempts);
        let config = FlushConfig::default()
            .with_dirty_threshold(0)
            .with_interval(LONG);
        let mut worker = FlushWorker::spawn(config, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = tx.send(n);
            if n == 1 {
                Err(StorageError::Closed)
            } else {
                Ok(())
            }
        })
        .unwrap();

        assert!(worker.signal().notify(1));
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 1);
        assert!(worker.signal().notify(1));
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), 2);

        worker.shutdown().unwrap();
    }
}
