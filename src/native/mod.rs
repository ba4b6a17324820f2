//! Push-style streams backed by tokio I/O.
//!
//! These are the native streams the adapters in this crate were built for:
//! [`Writable`] is a [`PushSink`] over any `AsyncWrite`, [`Readable`] a
//! [`PullSource`] over any `AsyncRead`, and [`pushed`] bridges producers that
//! can only emit notifications.
//!
//! [`PushSink`]: crate::PushSink
//! [`PullSource`]: crate::PullSource

/// Sink writing to an `AsyncWrite`
mod writable;
pub use writable::{Writable, WritableOptions};

/// Source reading from an `AsyncRead`
mod readable;
pub use readable::{Readable, ReadableOptions};

/// Source fed by event notifications
mod pushed;
pub use pushed::{pushed, Emitter, Pushed, PushedOptions};
