use std::io::Error as IoError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::StreamError;

use tokio::sync::watch;

use tracing::{trace, warn};

#[derive(Clone, Debug)]
enum Status {
    Pending,
    Ready,
    Failed(Arc<IoError>),
}

/// Latch tracking whether a push sink currently accepts writes.
///
/// The latch starts out ready. `rearm` installs a fresh pending signal after a
/// sink refused a write, and the sink's `drain` or `close` notification
/// resolves it. An `error` notification rejects it for good: every current and
/// future waiter receives the failure, even if the sink closes afterwards.
pub struct Readiness {
    name: Arc<str>,
    signal: Mutex<watch::Sender<Status>>,
}

impl Readiness {
    /// Create a new ready latch for the sink called `name`
    pub fn new<N: Into<Arc<str>>>(name: N) -> Self {
        let (signal, _) = watch::channel(Status::Ready);

        Self {
            name: name.into(),
            signal: Mutex::new(signal),
        }
    }

    /// Debug name of the sink this latch tracks
    pub fn name(&self) -> &str {
        &self.name
    }

    fn signal(&self) -> MutexGuard<'_, watch::Sender<Status>> {
        self.signal.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check if the sink is currently accepting writes
    pub fn is_ready(&self) -> bool {
        matches!(*self.signal().borrow(), Status::Ready)
    }

    /// Install a fresh pending signal.
    ///
    /// A signal that is still pending is kept as is so that nobody waiting on
    /// it is left behind, and a failed latch stays failed.
    pub fn rearm(&self) {
        let mut signal = self.signal();

        let ready = matches!(*signal.borrow(), Status::Ready);

        if ready {
            trace!("rearming readiness of {}", self.name);
            *signal = watch::channel(Status::Pending).0;
        }
    }

    /// Sink notification: buffered data was flushed
    pub fn drain(&self) {
        self.resolve("drain");
    }

    /// Sink notification: the sink was closed
    pub fn close(&self) {
        self.resolve("close");
    }

    fn resolve(&self, event: &str) {
        let signal = self.signal();

        let pending = matches!(*signal.borrow(), Status::Pending);

        if pending {
            trace!("{} resolved readiness of {}", event, self.name);
            signal.send_replace(Status::Ready);
        }
    }

    /// Mark the sink as ready without any notification, used when a write
    /// was accepted right away
    pub(crate) fn accept(&self) {
        self.resolve("accepted write");
    }

    /// Sink notification: the sink failed
    pub fn error<E: Into<Arc<IoError>>>(&self, error: E) {
        let error = error.into();
        let signal = self.signal();

        let failed = matches!(*signal.borrow(), Status::Failed(_));

        if failed {
            warn!("{} failed again: {}", self.name, error);
        } else {
            warn!("{} failed: {}", self.name, error);
            signal.send_replace(Status::Failed(error));
        }
    }

    /// Wait until the sink accepts writes again.
    ///
    /// # Errors
    /// Returns `StreamError::Write` carrying the sink's name and the original
    /// failure if the sink reported an error
    pub async fn wait(&self) -> Result<(), StreamError> {
        let mut receiver = self.signal().subscribe();

        loop {
            let status = receiver.borrow().clone();

            match status {
                Status::Ready => return Ok(()),
                Status::Failed(source) => {
                    return Err(StreamError::Write {
                        name: self.name.to_string(),
                        source,
                    })
                }
                Status::Pending => {
                    if receiver.changed().await.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    use futures::FutureExt;

    #[tokio::test]
    async fn starts_ready() {
        let readiness = Readiness::new("test");

        assert!(readiness.is_ready());
        readiness.wait().await.expect("fresh latch failed");
    }

    #[tokio::test]
    async fn drain_releases_waiter() {
        let readiness = Arc::new(Readiness::new("test"));

        readiness.rearm();

        assert!(!readiness.is_ready());
        assert!(readiness.wait().now_or_never().is_none(), "not suspended");

        let waiter = {
            let readiness = readiness.clone();
            tokio::spawn(async move { readiness.wait().await })
        };

        readiness.drain();

        waiter
            .await
            .expect("task failure")
            .expect("drain did not resolve");
    }

    #[tokio::test]
    async fn close_releases_waiter() {
        let readiness = Readiness::new("test");

        readiness.rearm();
        readiness.close();

        assert!(readiness.wait().now_or_never().is_some());
    }

    #[tokio::test]
    async fn error_rejects_every_waiter() {
        let readiness = Arc::new(Readiness::new("child stdin"));

        readiness.rearm();

        let waiters = (0..2)
            .map(|_| {
                let readiness = readiness.clone();
                tokio::spawn(async move { readiness.wait().await })
            })
            .collect::<Vec<_>>();

        readiness.error(IoError::new(ErrorKind::BrokenPipe, "EPIPE"));

        for waiter in waiters {
            let error = waiter
                .await
                .expect("task failure")
                .expect_err("error did not reject");
            let message = error.to_string();

            assert!(message.contains("child stdin"), "{}", message);
            assert!(message.contains("EPIPE"), "{}", message);
        }
    }

    #[tokio::test]
    async fn failure_is_sticky() {
        let readiness = Readiness::new("test");

        readiness.error(IoError::new(ErrorKind::Other, "boom"));
        readiness.close();
        readiness.rearm();
        readiness.drain();

        assert!(readiness.wait().await.is_err());
    }

    #[tokio::test]
    async fn rearm_keeps_pending_signal() {
        let readiness = Arc::new(Readiness::new("test"));

        readiness.rearm();

        let waiter = {
            let readiness = readiness.clone();
            tokio::spawn(async move { readiness.wait().await })
        };

        tokio::task::yield_now().await;
        readiness.rearm();
        readiness.drain();

        waiter
            .await
            .expect("task failure")
            .expect("waiter was left behind");
    }
}
