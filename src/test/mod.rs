mod log;
pub use log::*;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::chunk::Chunk;
use crate::sink::{Listener, PushSink, SinkEvent};

use tokio::sync::watch;

#[derive(Default)]
struct Record {
    written: Vec<Chunk>,
    ends: usize,
    refusing: bool,
    listeners: Vec<Listener>,
}

/// A `PushSink` that records everything written to it
pub struct MockSink {
    record: Arc<Mutex<Record>>,
    changes: Arc<watch::Sender<usize>>,
}

/// Handle used by tests to inspect and drive a `MockSink`
#[derive(Clone)]
pub struct MockHandle {
    record: Arc<Mutex<Record>>,
    changes: Arc<watch::Sender<usize>>,
}

/// Create a `MockSink` accepting every write, along with its `MockHandle`
pub fn mock_sink() -> (MockSink, MockHandle) {
    let record = Arc::new(Mutex::new(Record::default()));
    let changes = Arc::new(watch::channel(0).0);

    let sink = MockSink {
        record: record.clone(),
        changes: changes.clone(),
    };

    (sink, MockHandle { record, changes })
}

fn lock(record: &Mutex<Record>) -> MutexGuard<'_, Record> {
    record.lock().expect("mock sink poisoned")
}

impl PushSink for MockSink {
    fn write(&mut self, chunk: Chunk) -> bool {
        let accepted = {
            let mut record = lock(&self.record);
            record.written.push(chunk);
            !record.refusing
        };

        self.changes.send_modify(|x| *x += 1);

        accepted
    }

    fn end(&mut self) {
        lock(&self.record).ends += 1;
        self.changes.send_modify(|x| *x += 1);
    }

    fn subscribe(&mut self, listener: Listener) {
        lock(&self.record).listeners.push(listener);
    }
}

impl MockHandle {
    /// Choose whether the next writes report the sink as ready
    pub fn set_accepting(&self, accepting: bool) {
        lock(&self.record).refusing = !accepting;
    }

    /// Fire a notification to every subscribed listener
    pub fn emit(&self, event: SinkEvent) {
        let record = lock(&self.record);

        for listener in &record.listeners {
            listener(event.clone());
        }
    }

    /// Every `Chunk` written so far
    pub fn written(&self) -> Vec<Chunk> {
        lock(&self.record).written.clone()
    }

    /// All bytes written so far
    pub fn concatenated(&self) -> Vec<u8> {
        lock(&self.record)
            .written
            .iter()
            .flat_map(|chunk| chunk.iter().copied())
            .collect()
    }

    /// Number of times the sink was ended
    pub fn ends(&self) -> usize {
        lock(&self.record).ends
    }

    async fn wait_until<F: Fn(&Record) -> bool>(&self, condition: F) {
        let mut changes = self.changes.subscribe();

        while !condition(&lock(&self.record)) {
            changes.changed().await.expect("mock sink dropped");
        }
    }

    /// Wait until at least `count` chunks were written
    pub async fn wait_for_writes(&self, count: usize) {
        self.wait_until(|record| record.written.len() >= count).await
    }

    /// Wait until the sink was ended at least `count` times
    pub async fn wait_for_ends(&self, count: usize) {
        self.wait_until(|record| record.ends >= count).await
    }
}

/// Deterministic test payload of `len` bytes
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

/// Split `data` into chunks of length 1, 2, 4, 8 and so on
pub fn doubling_chunks(data: &[u8]) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut offset = 0;
    let mut length = 1;

    while offset < data.len() {
        let end = (offset + length).min(data.len());

        chunks.push(Chunk::copy_from_slice(&data[offset..end]));
        offset = end;
        length *= 2;
    }

    chunks
}
