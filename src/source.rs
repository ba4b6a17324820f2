use std::io::Error as IoError;

use crate::chunk::Chunk;
use crate::errors::{Read, StreamError};
use crate::sequence::{Sequence, Step};

use async_trait::async_trait;

use snafu::ResultExt;

use tracing::{debug, trace};

/// A byte source that can be asked for its next chunk of data.
///
/// The slice returned by `pull` borrows the source's own buffer, which the
/// source is free to overwrite or resize on the following call.
#[async_trait]
pub trait PullSource: Send {
    /// Wait for the next chunk of data, `None` once the source is exhausted
    async fn pull(&mut self) -> Result<Option<&[u8]>, IoError>;

    /// Stop producing data, no more chunks will be requested
    async fn cancel(&mut self);

    /// Abort the source because of an error detected downstream
    async fn destroy(&mut self, error: IoError);
}

/// A `Reader` over a `PullSource`.
///
/// Every chunk yielded is a fresh copy of the data the source produced, so it
/// stays valid regardless of what the source does with its buffer afterwards.
pub struct SourceReader<S> {
    source: S,
    done: bool,
}

/// Adapt a `PullSource` into a `Reader` of `Chunk`s.
///
/// # Example
/// ```
/// use relay::native::{pushed, PushedOptions};
/// use relay::{reader, Sequence, Step};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (emitter, source) = pushed(PushedOptions::default());
/// let mut reader = reader(source);
///
/// emitter.data(b"hello");
/// emitter.end();
///
/// let chunk = reader.next(()).await.expect("read failed").into_value();
///
/// assert_eq!(chunk.as_deref(), Some(&b"hello"[..]));
/// assert_eq!(reader.next(()).await.expect("read failed"), Step::Done);
/// # }
/// ```
pub fn reader<S: PullSource>(source: S) -> SourceReader<S> {
    SourceReader {
        source,
        done: false,
    }
}

impl<S> SourceReader<S> {
    /// Check whether this `SourceReader` has terminated
    pub fn is_done(&self) -> bool {
        self.done
    }
}

#[async_trait]
impl<S: PullSource> Sequence for SourceReader<S> {
    type Item = Chunk;
    type Input = ();

    async fn next(&mut self, _: ()) -> Result<Step<Chunk>, StreamError> {
        if self.done {
            return Ok(Step::Done);
        }

        match self.source.pull().await.context(Read) {
            Ok(Some(data)) => {
                trace!("pulled {} bytes", data.len());
                Ok(Step::Yield(Chunk::copy_from_slice(data)))
            }
            Ok(None) => {
                debug!("source exhausted");
                self.done = true;
                Ok(Step::Done)
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }

    async fn close(&mut self) -> Result<Step<Chunk>, StreamError> {
        if !self.done {
            debug!("cancelling source");
            self.done = true;
            self.source.cancel().await;
        }

        Ok(Step::Done)
    }

    async fn throw(
        &mut self,
        error: StreamError,
    ) -> Result<Step<Chunk>, StreamError> {
        if !self.done {
            debug!("destroying source: {}", error);
            self.done = true;
            self.source.destroy(error.into_io()).await;
        }

        Ok(Step::Done)
    }
}
