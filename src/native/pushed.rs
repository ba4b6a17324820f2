use std::io::Error as IoError;
use std::sync::Arc;

use crate::source::PullSource;

use async_trait::async_trait;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;

use tracing::{debug, trace};

/// Default amount of undelivered bytes above which an `Emitter` asks its
/// producer to slow down
pub const DEFAULT_HIGH_WATER_MARK: usize = 16 * 1024;

/// Options for creating a push-only source with `pushed`
#[derive(Clone, Copy, Debug)]
pub struct PushedOptions {
    /// Amount of undelivered bytes at which `Emitter::data` returns `false`
    pub high_water_mark: usize,
}

impl Default for PushedOptions {
    fn default() -> Self {
        Self {
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        }
    }
}

enum Event {
    Data(Vec<u8>),
    End,
    Error(IoError),
}

struct Backlog {
    bytes: watch::Sender<usize>,
    high_water_mark: usize,
}

impl Backlog {
    fn below_mark(&self) -> bool {
        *self.bytes.borrow() < self.high_water_mark
    }

    fn grow(&self, len: usize) {
        self.bytes.send_modify(|bytes| *bytes += len);
    }

    fn shrink(&self, len: usize) {
        self.bytes
            .send_modify(|bytes| *bytes = bytes.saturating_sub(len));
    }

    /// Wake up producers waiting in `Emitter::ready`
    fn wake(&self) {
        self.bytes.send_modify(|_| ());
    }
}

/// The producing side of a push-only source.
///
/// The producer notifies the `Emitter` whenever something happens and never
/// waits: `data` only reports whether the consumer is keeping up.
#[derive(Clone)]
pub struct Emitter {
    events: UnboundedSender<Event>,
    backlog: Arc<Backlog>,
}

/// A `PullSource` fed by an `Emitter`.
///
/// Notifications are queued until the consumer pulls them, at which point the
/// next data notification is moved into the buffer returned by `pull`.
pub struct Pushed {
    events: UnboundedReceiver<Event>,
    backlog: Arc<Backlog>,
    current: Vec<u8>,
    failure: Option<IoError>,
    done: bool,
}

/// Create a push-only source, returning the `Emitter` the producer notifies
/// and the `Pushed` source to adapt with `reader`
pub fn pushed(options: PushedOptions) -> (Emitter, Pushed) {
    let (tx, rx) = mpsc::unbounded_channel();
    let backlog = Arc::new(Backlog {
        bytes: watch::channel(0).0,
        high_water_mark: options.high_water_mark,
    });

    let emitter = Emitter {
        events: tx,
        backlog: backlog.clone(),
    };
    let source = Pushed {
        events: rx,
        backlog,
        current: Vec::new(),
        failure: None,
        done: false,
    };

    (emitter, source)
}

impl Emitter {
    /// Data notification, returns `false` if the producer should pause until
    /// `ready` completes
    pub fn data(&self, data: &[u8]) -> bool {
        self.backlog.grow(data.len());

        if self.events.send(Event::Data(data.to_vec())).is_err() {
            trace!("source is gone, discarding {} bytes", data.len());
            return false;
        }

        self.backlog.below_mark()
    }

    /// End of stream notification
    pub fn end(&self) {
        if self.events.send(Event::End).is_err() {
            trace!("source is gone, ignoring end");
        }
    }

    /// Error notification
    pub fn error(&self, error: IoError) {
        if self.events.send(Event::Error(error)).is_err() {
            trace!("source is gone, ignoring error");
        }
    }

    /// Check whether the consuming side stopped listening
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }

    /// Wait until the consumer caught up with the produced data or went away
    pub async fn ready(&self) {
        let mut changes = self.backlog.bytes.subscribe();

        while !self.backlog.below_mark() && !self.is_closed() {
            if changes.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Pushed {
    fn stop(&mut self) {
        self.done = true;
        self.events.close();
        self.backlog.wake();
    }
}

impl Drop for Pushed {
    fn drop(&mut self) {
        self.stop();
    }
}

#[async_trait]
impl PullSource for Pushed {
    async fn pull(&mut self) -> Result<Option<&[u8]>, IoError> {
        if let Some(error) = self.failure.take() {
            return Err(error);
        }

        if self.done {
            return Ok(None);
        }

        match self.events.recv().await {
            Some(Event::Data(data)) => {
                self.backlog.shrink(data.len());
                self.current = data;
                Ok(Some(self.current.as_slice()))
            }
            Some(Event::Error(error)) => {
                debug!("producer failed: {}", error);
                self.stop();
                Err(error)
            }
            Some(Event::End) | None => {
                debug!("producer ended");
                self.stop();
                Ok(None)
            }
        }
    }

    async fn cancel(&mut self) {
        if !self.done {
            debug!("cancelled by consumer");
            self.stop();
        }
    }

    async fn destroy(&mut self, error: IoError) {
        debug!("destroyed by consumer: {}", error);
        self.failure = Some(error);
        self.stop();
    }
}
