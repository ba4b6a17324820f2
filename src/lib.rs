#![deny(missing_docs)]

//! This is relay, a set of adapters between push-style byte streams, where the
//! producer decides when data arrives and the consumer has to signal when it
//! is overwhelmed, and pull-style sequences, where the consumer asks for each
//! chunk and waits for it.
//!
//! The [`reader`] adapter turns a [`PullSource`] into a [`Reader`] of
//! immutable [`Chunk`]s. The [`writer`] adapter turns a [`PushSink`] into a
//! [`Writer`]: chunks handed to it are forwarded to the sink by a pump task
//! that holds the producer back whenever the sink reports backpressure.
//!
//! Both adapters are built on the [`Sequence`] trait and the lockstep [`pipe`]
//! primitive. Native streams backed by tokio I/O live in the [`native`]
//! module.
//!
//! # Example
//! ```
//! use relay::native::{Readable, ReadableOptions, Writable, WritableOptions};
//! use relay::{reader, writer_with_name, Chunk, Sequence, Step};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (client, server) = tokio::io::duplex(1024);
//!
//! let mut output = writer_with_name(
//!     Writable::new(client, WritableOptions::default()),
//!     "duplex",
//! );
//! let mut input = reader(Readable::new(server, ReadableOptions::default()));
//!
//! output.next(Chunk::from(&b"hello"[..])).await.expect("write failed");
//! output.close().await.expect("close failed");
//!
//! let mut received = Vec::new();
//!
//! while let Step::Yield(chunk) = input.next(()).await.expect("read failed") {
//!     received.extend_from_slice(&chunk);
//! }
//!
//! assert_eq!(received, b"hello");
//! # }
//! ```
//!
//! [`native`]: self::native

/// Immutable byte chunks
mod chunk;
pub use chunk::Chunk;

/// Errors returned by the adapters
mod errors;
pub use errors::StreamError;

/// Pull-style sequences
mod sequence;
pub use sequence::{Reader, Sequence, Step, Writer};

/// Lockstep handoff between a producer and a consumer
mod pipe;
pub use pipe::{pipe, Endpoint, PipeReader, PipeWriter};

/// Sink readiness tracking
mod readiness;
pub use readiness::Readiness;

/// Adapter from push sinks to writers
mod sink;
pub use sink::{
    writer, writer_with_name, Listener, PushSink, SinkEvent, SinkOptions,
    UNNAMED,
};

/// Adapter from pull sources to readers
mod source;
pub use source::{reader, PullSource, SourceReader};

/// Native push-style streams over tokio I/O
pub mod native;

#[cfg(any(test, feature = "test"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test")))]
/// Test utilities that are used all across the crate
pub mod test;
