use std::io::Error as IoError;

use crate::source::PullSource;

use async_trait::async_trait;

use tokio::io::{AsyncRead, AsyncReadExt};

use tracing::{debug, trace};

/// Default size of the buffer a `Readable` reads into
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Options for creating a `Readable`
#[derive(Clone, Copy, Debug)]
pub struct ReadableOptions {
    /// Maximum number of bytes returned by a single `pull`
    pub chunk_size: usize,
}

impl Default for ReadableOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

enum State {
    Open,
    Ended,
    Destroyed(Option<IoError>),
}

/// A `PullSource` reading from a tokio `AsyncRead`.
///
/// All reads land in the same buffer, so the data returned by `pull` is only
/// valid until the next call.
pub struct Readable<R> {
    inner: R,
    buffer: Vec<u8>,
    state: State,
}

impl<R> Readable<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Create a new `Readable` over `inner`
    pub fn new(inner: R, options: ReadableOptions) -> Self {
        Self {
            inner,
            buffer: vec![0; options.chunk_size.max(1)],
            state: State::Open,
        }
    }

    /// Consume this `Readable` and return the underlying reader
    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[async_trait]
impl<R> PullSource for Readable<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn pull(&mut self) -> Result<Option<&[u8]>, IoError> {
        match &mut self.state {
            State::Open => {}
            State::Ended => return Ok(None),
            State::Destroyed(error) => {
                return match error.take() {
                    Some(e) => Err(e),
                    None => Ok(None),
                }
            }
        }

        match self.inner.read(&mut self.buffer).await {
            Ok(0) => {
                debug!("reached end of stream");
                self.state = State::Ended;
                Ok(None)
            }
            Ok(read) => {
                trace!("read {} bytes", read);
                Ok(Some(&self.buffer[..read]))
            }
            Err(e) => {
                self.state = State::Destroyed(None);
                Err(e)
            }
        }
    }

    async fn cancel(&mut self) {
        if let State::Open = self.state {
            debug!("reading cancelled");
            self.state = State::Ended;
        }
    }

    async fn destroy(&mut self, error: IoError) {
        debug!("destroyed: {}", error);
        self.state = State::Destroyed(Some(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn reads_until_end() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut source = Readable::new(server, ReadableOptions::default());

        client.write_all(b"ping").await.expect("write failed");
        drop(client);

        let data = source.pull().await.expect("read failed").map(Vec::from);

        assert_eq!(data, Some(b"ping".to_vec()));
        assert!(source.pull().await.expect("read failed").is_none());
    }

    #[tokio::test]
    async fn chunk_size_bounds_reads() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut source =
            Readable::new(server, ReadableOptions { chunk_size: 3 });

        client.write_all(b"abcdef").await.expect("write failed");

        let first = source.pull().await.expect("read failed").map(|x| x.len());

        assert_eq!(first, Some(3));
    }

    #[tokio::test]
    async fn cancel_stops_reading() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut source = Readable::new(server, ReadableOptions::default());

        client.write_all(b"unread").await.expect("write failed");
        source.cancel().await;

        assert!(source.pull().await.expect("read failed").is_none());
    }

    #[tokio::test]
    async fn destroy_fails_next_pull() {
        let (_client, server) = tokio::io::duplex(64);
        let mut source = Readable::new(server, ReadableOptions::default());

        source
            .destroy(IoError::new(ErrorKind::Other, "downstream failed"))
            .await;

        let error = source.pull().await.expect_err("pull succeeded");

        assert_eq!(error.to_string(), "downstream failed");
        assert!(source.pull().await.expect("read failed").is_none());
    }
}
