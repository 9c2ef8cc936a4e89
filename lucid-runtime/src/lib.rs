//! Process runtime for the lucid service.
//!
//! [`LucidRuntime`] owns the tokio runtime and a root [`CancellationToken`]
//! that fires on shutdown. Parsing work that must not stall the reactor goes
//! through [`BlockingPool`].

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio_util::sync::CancellationToken;

mod blocking;

pub use blocking::{BlockingError, BlockingPool};

pub struct LucidRuntime {
    runtime: Runtime,
    root: Arc<CancellationToken>,
}

/// Cheap clone of the runtime's handle and root token.
#[derive(Clone)]
pub struct LucidHandle {
    tokio: Handle,
    root: Arc<CancellationToken>,
}

impl LucidRuntime {
    /// Multi-threaded runtime; `None` workers means one per core.
    ///
    /// ```
    /// use lucid_runtime::LucidRuntime;
    /// use std::time::Duration;
    ///
    /// let rt = LucidRuntime::build("doc-worker", Some(1)).unwrap();
    /// assert_eq!(rt.block_on(async { 6 * 7 }), 42);
    /// rt.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(thread_name: &str, worker_threads: Option<usize>) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(thread_name);
        if let Some(n) = worker_threads {
            builder.worker_threads(n.max(1));
        }
        let runtime = builder
            .build()
            .with_context(|| format!("starting {thread_name} runtime"))?;
        Ok(Self {
            runtime,
            root: Arc::new(CancellationToken::new()),
        })
    }

    pub fn handle(&self) -> LucidHandle {
        LucidHandle {
            tokio: self.runtime.handle().clone(),
            root: Arc::clone(&self.root),
        }
    }

    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Fire the root token, then give tasks `grace` to wind down.
    pub fn shutdown(self, grace: Duration) {
        self.root.cancel();
        tracing::debug!(grace_ms = grace.as_millis() as u64, "runtime.shutdown");
        self.runtime.shutdown_timeout(grace);
    }
}

impl LucidHandle {
    /// The root token; cancelling it stops the whole service.
    pub fn cancellation(&self) -> Arc<CancellationToken> {
        Arc::clone(&self.root)
    }

    /// Token for one unit of work. It fires with the root but can also be
    /// cancelled alone.
    ///
    /// ```
    /// use lucid_runtime::LucidRuntime;
    /// use std::time::Duration;
    ///
    /// let rt = LucidRuntime::build("doc-child", Some(1)).unwrap();
    /// let handle = rt.handle();
    /// let job = handle.child_token();
    /// job.cancel();
    /// assert!(!handle.cancellation().is_cancelled());
    ///
    /// let other = handle.child_token();
    /// rt.shutdown(Duration::from_millis(5));
    /// assert!(other.is_cancelled());
    /// ```
    pub fn child_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    pub fn spawn<F>(&self, fut: F) -> tokio::task::JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tokio.spawn(fut)
    }
}
