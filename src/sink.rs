use std::io::Error as IoError;
use std::sync::Arc;

use crate::chunk::Chunk;
use crate::pipe::{pipe, PipeReader, PipeWriter};
use crate::readiness::Readiness;
use crate::sequence::{Sequence, Step};

use tracing::{debug, debug_span, trace, warn};
use tracing_futures::Instrument;

/// Name used in error messages for sinks that were not given one
pub const UNNAMED: &str = "<unnamed stream>";

/// Notification emitted by a `PushSink`
#[derive(Clone, Debug)]
pub enum SinkEvent {
    /// The sink flushed its backlog and accepts writes again
    Drain,
    /// The sink was closed, no more notifications will follow
    Close,
    /// The sink failed
    Error(Arc<IoError>),
}

/// Callback registered with a `PushSink` to receive its notifications
pub type Listener = Box<dyn Fn(SinkEvent) + Send + Sync>;

/// A push-style byte sink.
///
/// Writes are handed over without waiting. When the sink has too much data in
/// flight, `write` returns `false` and the caller should hold off until the
/// sink emits `SinkEvent::Drain` or `SinkEvent::Close`.
pub trait PushSink: Send + 'static {
    /// Hand a `Chunk` to the sink, returns `false` if the caller should wait
    /// for a notification before writing again
    fn write(&mut self, chunk: Chunk) -> bool;

    /// Tell the sink no more data will be written
    fn end(&mut self);

    /// Register a `Listener` for this sink's notifications
    fn subscribe(&mut self, listener: Listener);
}

/// Options for adapting a `PushSink`
#[derive(Clone, Debug)]
pub struct SinkOptions {
    name: String,
}

impl SinkOptions {
    /// Options naming the adapted sink `name` in error messages
    pub fn named<N: Into<String>>(name: N) -> Self {
        Self { name: name.into() }
    }

    /// Debug name of the adapted sink
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self::named(UNNAMED)
    }
}

/// Adapt a `PushSink` into a `Writer`.
///
/// Every `Chunk` given to the returned `PipeWriter` is forwarded to `sink` in
/// order by a pump task spawned on the current tokio runtime. A producer
/// awaiting `next` is held back while the sink is backpressured. Closing the
/// writer ends the sink exactly once.
///
/// If the producer throws into the writer, or the sink reports an error while
/// the pump waits for it, the sink is ended and the pump stops without
/// reporting anything further: the producer only sees `Step::Done` from then
/// on.
///
/// # Panics
/// Panics if called outside of a tokio runtime
pub fn writer<S: PushSink>(
    mut sink: S,
    options: SinkOptions,
) -> PipeWriter<Chunk> {
    let readiness = Arc::new(Readiness::new(options.name.as_str()));

    {
        let readiness = readiness.clone();

        sink.subscribe(Box::new(move |event| match event {
            SinkEvent::Drain => readiness.drain(),
            SinkEvent::Close => readiness.close(),
            SinkEvent::Error(error) => readiness.error(error),
        }));
    }

    let (writer, reader) = pipe();
    let span = debug_span!("pump", name = %options.name);

    tokio::spawn(pump(sink, reader, readiness).instrument(span));

    writer
}

/// Adapt a `PushSink` into a `Writer` using `name` in error messages
pub fn writer_with_name<S: PushSink, N: Into<String>>(
    sink: S,
    name: N,
) -> PipeWriter<Chunk> {
    writer(sink, SinkOptions::named(name))
}

async fn pump<S: PushSink>(
    mut sink: S,
    mut input: PipeReader<Chunk>,
    readiness: Arc<Readiness>,
) {
    debug!("pumping into {}", readiness.name());

    loop {
        let chunk = match input.next(()).await {
            Ok(Step::Yield(chunk)) => chunk,
            Ok(Step::Done) => {
                debug!("input ended, ending {}", readiness.name());
                sink.end();
                return;
            }
            Err(e) => {
                warn!("input of {} failed: {}", readiness.name(), e);
                sink.end();
                return;
            }
        };

        trace!("writing {} bytes to {}", chunk.len(), readiness.name());

        // armed before writing: a sink flushing on another worker may emit
        // its drain notification before `write` even returns
        readiness.rearm();

        if sink.write(chunk) {
            readiness.accept();
            continue;
        }

        debug!("{} is backpressured", readiness.name());

        if let Err(e) = readiness.wait().await {
            warn!("giving up on {}: {}", readiness.name(), e);
            sink.end();
            return;
        }

        trace!("{} drained", readiness.name());
    }
}
