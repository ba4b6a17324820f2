use crate::errors::StreamError;
use crate::sequence::{Sequence, Step};

use async_trait::async_trait;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use tracing::trace;

/// Message travelling from one end of a pipe to the other
enum Signal<T> {
    Next(T),
    Return,
    Throw(StreamError),
}

/// One end of a pipe.
///
/// Sending a value with `next` hands it to the other end and then suspends
/// until the other end answers with its own `next`, `close` or `throw`. This
/// lockstep is what lets a consumer hold back a producer: a producer awaiting
/// `next` cannot hand over another value before the consumer asked for it.
pub struct Endpoint<O, I> {
    outgoing: UnboundedSender<Signal<O>>,
    incoming: UnboundedReceiver<Signal<I>>,
    done: bool,
}

/// The producing end of a pipe carrying values of type `T`
pub type PipeWriter<T> = Endpoint<T, ()>;

/// The consuming end of a pipe carrying values of type `T`
pub type PipeReader<T> = Endpoint<(), T>;

/// Create a new pipe, returning its producing and consuming ends.
///
/// # Example
/// ```
/// use relay::{pipe, Sequence, Step};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (mut writer, mut reader) = pipe::<u32>();
///
/// let consumer = tokio::spawn(async move { reader.next(()).await });
///
/// writer.next(42).await.expect("pipe failed");
///
/// let received = consumer.await.expect("task failure");
/// assert_eq!(received.expect("pipe failed"), Step::Yield(42));
/// # }
/// ```
pub fn pipe<T: Send + 'static>() -> (PipeWriter<T>, PipeReader<T>) {
    let (data_tx, data_rx) = mpsc::unbounded_channel();
    let (ack_tx, ack_rx) = mpsc::unbounded_channel();

    (Endpoint::new(data_tx, ack_rx), Endpoint::new(ack_tx, data_rx))
}

impl<O, I> Endpoint<O, I> {
    fn new(
        outgoing: UnboundedSender<Signal<O>>,
        incoming: UnboundedReceiver<Signal<I>>,
    ) -> Self {
        Self {
            outgoing,
            incoming,
            done: false,
        }
    }

    /// Check whether this end of the pipe has terminated
    pub fn is_done(&self) -> bool {
        self.done
    }

    fn post(&self, signal: Signal<O>) {
        if self.outgoing.send(signal).is_err() {
            trace!("other end of the pipe is gone");
        }
    }

    async fn receive(&mut self) -> Result<Step<I>, StreamError> {
        match self.incoming.recv().await {
            Some(Signal::Next(value)) => Ok(Step::Yield(value)),
            Some(Signal::Throw(error)) => {
                self.done = true;
                Err(error)
            }
            Some(Signal::Return) | None => {
                self.done = true;
                Ok(Step::Done)
            }
        }
    }

    /// Wait for the other end to acknowledge our termination
    async fn acknowledge(&mut self) -> Result<Step<I>, StreamError> {
        match self.incoming.recv().await {
            Some(Signal::Throw(error)) => Err(error),
            _ => Ok(Step::Done),
        }
    }
}

#[async_trait]
impl<O, I> Sequence for Endpoint<O, I>
where
    O: Send + 'static,
    I: Send + 'static,
{
    type Item = I;
    type Input = O;

    async fn next(&mut self, input: O) -> Result<Step<I>, StreamError> {
        if self.done {
            return Ok(Step::Done);
        }

        self.post(Signal::Next(input));
        self.receive().await
    }

    async fn close(&mut self) -> Result<Step<I>, StreamError> {
        if self.done {
            return Ok(Step::Done);
        }

        self.done = true;
        self.post(Signal::Return);
        self.acknowledge().await
    }

    async fn throw(
        &mut self,
        error: StreamError,
    ) -> Result<Step<I>, StreamError> {
        if self.done {
            return Ok(Step::Done);
        }

        self.done = true;
        self.post(Signal::Throw(error));
        self.acknowledge().await
    }
}
