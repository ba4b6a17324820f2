use std::io::{Error as IoError, ErrorKind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::chunk::Chunk;
use crate::sink::{Listener, PushSink, SinkEvent};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use tracing::{debug, debug_span, trace, warn};
use tracing_futures::Instrument;

/// Default amount of buffered bytes above which a `Writable` asks for
/// backpressure
pub const DEFAULT_HIGH_WATER_MARK: usize = 16 * 1024;

/// Options for creating a `Writable`
#[derive(Clone, Copy, Debug)]
pub struct WritableOptions {
    /// Amount of buffered bytes at which `write` starts returning `false`
    pub high_water_mark: usize,
}

impl Default for WritableOptions {
    fn default() -> Self {
        Self {
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        }
    }
}

enum Command {
    Write(Chunk),
    End,
}

#[derive(Default)]
struct Shared {
    buffered: usize,
    need_drain: bool,
    ended: bool,
    listeners: Vec<Listener>,
}

impl Shared {
    fn emit(&self, event: SinkEvent) {
        for listener in &self.listeners {
            listener(event.clone());
        }
    }

    fn fail(&mut self, error: IoError) {
        self.ended = true;
        self.emit(SinkEvent::Error(Arc::new(error)));
        self.emit(SinkEvent::Close);
    }
}

/// A `PushSink` writing to a tokio `AsyncWrite`.
///
/// Writes are queued and flushed in order by a background task. Once the queue
/// holds `high_water_mark` bytes or more, `write` returns `false` and a
/// `SinkEvent::Drain` is emitted as soon as the queue is empty again. Ending
/// the `Writable` flushes and shuts down the underlying writer, then emits
/// `SinkEvent::Close`.
pub struct Writable {
    commands: UnboundedSender<Command>,
    shared: Arc<Mutex<Shared>>,
    high_water_mark: usize,
}

impl Writable {
    /// Create a new `Writable` over `inner`, spawning its flushing task on
    /// the current tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime
    pub fn new<W>(inner: W, options: WritableOptions) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (commands, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(Mutex::new(Shared::default()));

        tokio::spawn(
            flush(inner, receiver, shared.clone())
                .instrument(debug_span!("writable")),
        );

        Self {
            commands,
            shared,
            high_water_mark: options.high_water_mark,
        }
    }

    fn shared(&self) -> MutexGuard<'_, Shared> {
        lock(&self.shared)
    }

    /// Number of bytes written but not yet flushed
    pub fn buffered(&self) -> usize {
        self.shared().buffered
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PushSink for Writable {
    fn write(&mut self, chunk: Chunk) -> bool {
        let mut shared = self.shared();

        if shared.ended {
            shared.emit(SinkEvent::Error(Arc::new(IoError::new(
                ErrorKind::BrokenPipe,
                "write after end",
            ))));
            return false;
        }

        shared.buffered += chunk.len();

        let ready = shared.buffered < self.high_water_mark;

        if !ready {
            shared.need_drain = true;
        }

        if self.commands.send(Command::Write(chunk)).is_err() {
            debug!("flushing task is gone, dropping write");
            return false;
        }

        ready
    }

    fn end(&mut self) {
        let mut shared = self.shared();

        if shared.ended {
            return;
        }

        shared.ended = true;

        if self.commands.send(Command::End).is_err() {
            debug!("flushing task is gone, cannot end");
        }
    }

    fn subscribe(&mut self, listener: Listener) {
        self.shared().listeners.push(listener);
    }
}

async fn flush<W>(
    mut inner: W,
    mut commands: UnboundedReceiver<Command>,
    shared: Arc<Mutex<Shared>>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(command) = commands.recv().await {
        match command {
            Command::Write(chunk) => {
                if let Err(e) = inner.write_all(&chunk).await {
                    warn!("failed to write {} bytes: {}", chunk.len(), e);
                    lock(&shared).fail(e);
                    return;
                }

                trace!("flushed {} bytes", chunk.len());

                let mut state = lock(&shared);

                state.buffered -= chunk.len();

                if state.buffered == 0 && state.need_drain {
                    state.need_drain = false;
                    state.emit(SinkEvent::Drain);
                }
            }
            Command::End => {
                let result = match inner.flush().await {
                    Ok(()) => inner.shutdown().await,
                    Err(e) => Err(e),
                };

                match result {
                    Ok(()) => {
                        debug!("writer shut down");
                        lock(&shared).emit(SinkEvent::Close);
                    }
                    Err(e) => {
                        warn!("failed to shut down writer: {}", e);
                        lock(&shared).fail(e);
                    }
                }

                return;
            }
        }
    }

    debug!("writable dropped without being ended");
}
