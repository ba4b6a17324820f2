use crate::chunk::Chunk;
use crate::errors::StreamError;

use async_trait::async_trait;

use futures::stream::BoxStream;

/// Outcome of advancing a `Sequence`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    /// The sequence produced a value and may produce more
    Yield(T),
    /// The sequence is over, no more values will be produced
    Done,
}

impl<T> Step<T> {
    /// Check if this `Step` marks the end of its sequence
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Get the value carried by this `Step`, if any
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Yield(value) => Some(value),
            Self::Done => None,
        }
    }
}

/// A pull-style asynchronous sequence.
///
/// Each call to `next` sends a value in and suspends until the sequence
/// produces its next `Step`. `close` ends the sequence early and `throw`
/// aborts it with an error. Once a sequence has ended, further calls return
/// `Step::Done` without touching the underlying stream.
#[async_trait]
pub trait Sequence: Send {
    /// Type of values produced by this `Sequence`
    type Item: Send + 'static;

    /// Type of values sent in by `next`
    type Input: Send + 'static;

    /// Advance this `Sequence`, handing it `input`
    async fn next(
        &mut self,
        input: Self::Input,
    ) -> Result<Step<Self::Item>, StreamError>;

    /// Signal that no further values will be requested
    async fn close(&mut self) -> Result<Step<Self::Item>, StreamError>;

    /// Abort this `Sequence` because of an error detected by the caller
    async fn throw(
        &mut self,
        error: StreamError,
    ) -> Result<Step<Self::Item>, StreamError>;

    /// Iteration view over this very `Sequence`.
    ///
    /// The returned `Stream` drives `self`, so values it consumes are gone
    /// for good, and iterating an exhausted `Sequence` yields nothing.
    fn iter(&mut self) -> BoxStream<'_, Result<Self::Item, StreamError>>
    where
        Self::Input: Default,
    {
        Box::pin(async_stream::try_stream! {
            loop {
                match self.next(Default::default()).await? {
                    Step::Yield(item) => yield item,
                    Step::Done => break,
                }
            }
        })
    }
}

/// A `Sequence` of `Chunk`s pulled from some byte source
pub trait Reader: Sequence<Item = Chunk, Input = ()> {}

impl<S> Reader for S where S: Sequence<Item = Chunk, Input = ()> {}

/// A `Sequence` that consumes `Chunk`s pushed in with `next`
pub trait Writer: Sequence<Item = (), Input = Chunk> {}

impl<S> Writer for S where S: Sequence<Item = (), Input = Chunk> {}
