//! Event delivery
//!
//! Synchronous delivery writes on the caller's thread. Asynchronous delivery
//! is a bounded channel drained by one dedicated writer thread:
//! - producers block when the channel is full (no event is dropped)
//! - the writer handles events strictly in push order
//! - `shutdown` waits until nothing is queued or being written

use crate::constants::WRITER_THREAD_NAME;
use crate::error::{LogError, Result};
use crate::event::LogEvent;
use crate::output::Sink;
use parking_lot::{Condvar, Mutex};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::warn;

pub enum Delivery {
    Sync(Arc<Sink>),
    Async(AsyncQueue),
}

impl Delivery {
    /// Hand an event to the write path; returns `false` once shut down
    pub fn deliver(&self, event: LogEvent) -> bool {
        match self {
            Self::Sync(sink) => {
                sink.write(&event);
                true
            }
            Self::Async(queue) => queue.push(event),
        }
    }

    /// Drain and stop the writer thread (immediate for synchronous delivery)
    pub fn shutdown(&self) {
        if let Self::Async(queue) = self {
            queue.shutdown();
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }
}

/// Events pushed but not yet written
#[derive(Default)]
struct Pending {
    count: Mutex<usize>,
    drained: Condvar,
}

impl Pending {
    fn add(&self) {
        *self.count.lock() += 1;
    }

    fn done(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.drained.notify_all();
        }
    }

    fn wait_drained(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.drained.wait(&mut count);
        }
    }

    fn get(&self) -> usize {
        *self.count.lock()
    }
}

pub struct AsyncQueue {
    tx: Mutex<Option<SyncSender<LogEvent>>>,
    pending: Arc<Pending>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AsyncQueue {
    pub fn spawn(sink: Arc<Sink>, capacity: usize) -> Result<Self> {
        let (tx, rx) = sync_channel::<LogEvent>(capacity.max(1));
        let pending = Arc::new(Pending::default());

        let worker_pending = pending.clone();
        let worker = thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || run_writer(rx, sink, worker_pending))
            .map_err(|e| LogError::Spawn { source: e })?;

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            pending,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Enqueue, blocking while the queue is full
    pub fn push(&self, event: LogEvent) -> bool {
        let Some(tx) = self.tx.lock().clone() else {
            return false;
        };

        self.pending.add();
        if tx.send(event).is_err() {
            self.pending.done();
            warn!("Log writer stopped, event dropped");
            return false;
        }
        true
    }

    /// Events queued or in the middle of being written
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    /// Block until every pushed event has been written
    pub fn drain(&self) {
        self.pending.wait_drained();
    }

    /// Drain, close the channel, and join the writer thread
    pub fn shutdown(&self) {
        self.drain();
        drop(self.tx.lock().take());

        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                warn!("Log writer thread panicked");
            }
        }
    }
}

fn run_writer(rx: Receiver<LogEvent>, sink: Arc<Sink>, pending: Arc<Pending>) {
    // Ends once every sender is dropped and the channel is empty
    for event in rx {
        sink.write(&event);
        pending.done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callsite::CallSite;
    use crate::config::{Preference, RuntimeSettings};
    use crate::event::{GeneralEvent, Payload};
    use crate::file::RotatingFile;
    use crate::level::Severity;
    use crate::output::Output;
    use std::fs;
    use std::path::PathBuf;

    fn unique_temp_dir() -> PathBuf {
        let base = std::env::temp_dir();
        let pid = std::process::id();
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = base.join(format!("daylog-queue-{}-{}", pid, ts));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn file_sink(dir: &PathBuf) -> Arc<Sink> {
        let settings = RuntimeSettings::from(&Preference::default());
        Arc::new(Sink::new(
            Output::File(RotatingFile::new(dir, "app", 90)),
            settings,
        ))
    }

    fn event(n: usize) -> LogEvent {
        GeneralEvent::new(
            Severity::Info,
            CallSite::new("src/main.rs", 1, "app::main"),
            Payload::Message(format!("seq={}", n)),
            false,
        )
        .into()
    }

    fn sequence(dir: &PathBuf) -> Vec<usize> {
        fs::read_to_string(dir.join("app.log"))
            .unwrap()
            .lines()
            .filter_map(|l| l.rsplit("seq=").next()?.parse().ok())
            .collect()
    }

    #[test]
    fn test_async_preserves_push_order() {
        let dir = unique_temp_dir();
        let queue = AsyncQueue::spawn(file_sink(&dir), 4).unwrap();

        for n in 0..200 {
            assert!(queue.push(event(n)));
        }
        queue.shutdown();

        assert_eq!(sequence(&dir), (0..200).collect::<Vec<_>>());
        assert_eq!(queue.pending(), 0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_push_after_shutdown_is_rejected() {
        let dir = unique_temp_dir();
        let queue = AsyncQueue::spawn(file_sink(&dir), 8).unwrap();
        queue.shutdown();

        assert!(!queue.push(event(1)));
        assert_eq!(queue.pending(), 0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_concurrent_producers_write_everything() {
        let dir = unique_temp_dir();
        let queue = Arc::new(AsyncQueue::spawn(file_sink(&dir), 2).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        queue.push(event(t * 1000 + i));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        queue.drain();

        let written = sequence(&dir);
        assert_eq!(written.len(), 200);
        // Per producer, order is kept
        for t in 0..4 {
            let mine: Vec<_> = written
                .iter()
                .filter(|n| **n / 1000 == t)
                .copied()
                .collect();
            assert_eq!(mine, (0..50).map(|i| t * 1000 + i).collect::<Vec<_>>());
        }

        queue.shutdown();
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_sync_delivery_writes_before_returning() {
        let dir = unique_temp_dir();
        let delivery = Delivery::Sync(file_sink(&dir));

        assert!(!delivery.is_async());
        assert!(delivery.deliver(event(7)));
        assert_eq!(sequence(&dir), vec![7]);

        delivery.shutdown();
        let _ = fs::remove_dir_all(&dir);
    }
}
