//! Bounded offload of CPU-heavy work (HTML parsing) off the async workers.
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;

#[derive(Debug, Error)]
pub enum BlockingError {
    #[error("blocking pool closed")]
    Closed,
    #[error("blocking task panicked: {0}")]
    Panicked(String),
    #[error("blocking task cancelled")]
    Cancelled,
}

/// Runs closures on Tokio's blocking threads, at most `permits` at a time.
///
/// ```
/// use lucid_runtime::BlockingPool;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let pool = BlockingPool::new(2);
/// let n = pool.run(|| "<p>hi</p>".len()).await.unwrap();
/// assert_eq!(n, 9);
/// # });
/// ```
#[derive(Clone, Debug)]
pub struct BlockingPool {
    permits: Arc<Semaphore>,
}

impl BlockingPool {
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(permits.max(1))),
        }
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// A panic inside `f` is reported as [`BlockingError::Panicked`] rather
    /// than unwinding into the caller.
    pub async fn run<F, T>(&self, f: F) -> Result<T, BlockingError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| BlockingError::Closed)?;

        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            f()
        })
        .await;

        joined.map_err(|err| {
            if err.is_cancelled() {
                return BlockingError::Cancelled;
            }
            let msg = match err.try_into_panic() {
                Ok(payload) => payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".into()),
                Err(_) => "join failure".into(),
            };
            tracing::warn!(error = %msg, "blocking.task.panicked");
            BlockingError::Panicked(msg)
        })
    }
}
