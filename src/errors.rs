use std::io::Error as IoError;
use std::sync::Arc;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
/// Error encountered when moving bytes across a stream adapter
pub enum StreamError {
    #[snafu(display("cannot write {}: {}", name, source))]
    /// The underlying push sink reported a failure
    Write {
        /// Debug name of the sink that failed
        name: String,
        /// Underlying error cause, shared between every waiter of the sink
        source: Arc<IoError>,
    },

    #[snafu(display("cannot read: {}", source))]
    /// The underlying source reported a failure while pulling a chunk
    Read {
        /// Underlying error cause
        source: IoError,
    },

    #[snafu(display("stream aborted: {}", reason))]
    /// The other end of a sequence gave up on the stream
    Aborted {
        /// Reason given by the aborting side
        reason: String,
    },
}

impl StreamError {
    /// Create an error that can be thrown into a `Sequence` to abort it
    pub fn aborted<S: Into<String>>(reason: S) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }

    /// Convert this error into an `std::io::Error` so that it can be
    /// injected into a native stream
    pub(crate) fn into_io(self) -> IoError {
        match self {
            Self::Read { source } => source,
            other => IoError::new(std::io::ErrorKind::Other, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn write_error_mentions_name_and_cause() {
        let error = StreamError::Write {
            name: "stdin".to_string(),
            source: Arc::new(IoError::new(ErrorKind::BrokenPipe, "EPIPE")),
        };

        let message = error.to_string();

        assert!(message.contains("stdin"), "missing name: {}", message);
        assert!(message.contains("EPIPE"), "missing cause: {}", message);
    }

    #[test]
    fn read_error_keeps_original_kind() {
        let error = StreamError::Read {
            source: IoError::new(ErrorKind::ConnectionReset, "reset"),
        };

        assert_eq!(error.into_io().kind(), ErrorKind::ConnectionReset);
    }
}
