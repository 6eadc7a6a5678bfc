//! Executor facade over the reactive runtime.
//!
//! [`RuntimeHandle`] wraps a tokio handle and is the "runtime instance" slot
//! of the configuration context. Its job here is the blocking escape hatch:
//! [`compute_blocking`](RuntimeHandle::compute_blocking) and
//! [`run_blocking`](RuntimeHandle::run_blocking) move work onto the blocking
//! pool so the event loop is never stalled, returning a [`Blocking`] handle
//! that resolves to the result or the propagated failure.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::error::BlockingError;

/// Options for building a fresh runtime when none is discovered or ambient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeOptions {
    /// Number of worker threads; tokio's default when unset.
    #[serde(default)]
    pub worker_threads: Option<usize>,

    /// Cap on the blocking thread pool; tokio's default when unset.
    #[serde(default)]
    pub max_blocking_threads: Option<usize>,

    /// Name prefix for runtime threads.
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

fn default_thread_name() -> String {
    "kiln-worker".to_string()
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            worker_threads: None,
            max_blocking_threads: None,
            thread_name: default_thread_name(),
        }
    }
}

/// A cloneable handle to the reactive runtime.
///
/// When the handle was built by [`build`](Self::build) it co-owns the
/// runtime: the runtime stays alive as long as any clone of the handle does.
/// Handles obtained from [`current`](Self::current) or
/// [`from_handle`](Self::from_handle) borrow a runtime owned elsewhere.
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    handle: Handle,
    owned: Option<Arc<Runtime>>,
}

impl RuntimeHandle {
    /// Returns a handle to the ambient runtime, if the caller is inside one.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::from_handle)
    }

    /// Wraps an existing tokio handle.
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            handle,
            owned: None,
        }
    }

    /// Builds a fresh multi-threaded runtime from `options`.
    pub fn build(options: &RuntimeOptions) -> std::io::Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.thread_name(options.thread_name.as_str());
        if let Some(n) = options.worker_threads {
            builder.worker_threads(n);
        }
        if let Some(n) = options.max_blocking_threads {
            builder.max_blocking_threads(n);
        }
        let runtime = builder.build()?;
        Ok(Self {
            handle: runtime.handle().clone(),
            owned: Some(Arc::new(runtime)),
        })
    }

    /// Returns the underlying tokio handle.
    pub fn tokio_handle(&self) -> &Handle {
        &self.handle
    }

    /// Returns `true` when this handle co-owns its runtime.
    pub fn owns_runtime(&self) -> bool {
        self.owned.is_some()
    }

    /// Schedules `work` on the blocking pool without blocking the caller.
    ///
    /// Awaiting the returned handle yields the computed value, or a
    /// [`BlockingError`] if the work panicked or the executor shut down. The
    /// work runs exactly once per call.
    pub fn compute_blocking<F, T>(&self, work: F) -> Blocking<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        Blocking {
            inner: self.handle.spawn_blocking(work),
        }
    }

    /// Schedules a side-effecting `action` on the blocking pool.
    ///
    /// Awaiting the returned handle guarantees the action has run.
    pub fn run_blocking<F>(&self, action: F) -> Blocking<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.compute_blocking(action)
    }
}

/// Handle to work scheduled on the blocking pool.
///
/// Resolves to `Ok(value)` on completion; a panic inside the work surfaces
/// as [`BlockingError::Panicked`] rather than crashing the caller.
/// Cancellation and timeout policy belong to the executor, not this handle.
#[derive(Debug)]
pub struct Blocking<T> {
    inner: JoinHandle<T>,
}

impl<T> Future for Blocking<T> {
    type Output = Result<T, BlockingError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().inner)
            .poll(cx)
            .map(|res| res.map_err(BlockingError::from_join))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn compute_blocking_yields_the_computed_value() {
        let runtime = RuntimeHandle::current().unwrap();
        let computed = runtime.compute_blocking(|| 123).await.unwrap();
        assert_eq!(computed, 123);
    }

    #[tokio::test]
    async fn run_blocking_executes_the_action_before_await_returns() {
        let runtime = RuntimeHandle::current().unwrap();
        let ran = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&ran);
        runtime
            .run_blocking(move || flag.store(true, Ordering::SeqCst))
            .await
            .unwrap();

        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn panics_surface_as_failed_handles() {
        let runtime = RuntimeHandle::current().unwrap();
        let err = runtime
            .compute_blocking(|| panic!("boom"))
            .await
            .unwrap_err();

        match err {
            BlockingError::Panicked(message) => assert!(message.contains("boom")),
            other => panic!("expected Panicked, got {other:?}"),
        }
    }

    #[test]
    fn built_runtime_schedules_work() {
        let runtime = RuntimeHandle::build(&RuntimeOptions::default()).unwrap();
        assert!(runtime.owns_runtime());

        let computed = tokio_test::block_on(runtime.compute_blocking(|| "done")).unwrap();
        assert_eq!(computed, "done");
    }

    #[test]
    fn shutdown_cancels_work_still_queued() {
        use std::sync::mpsc;
        use std::time::Duration;

        let options = RuntimeOptions {
            max_blocking_threads: Some(1),
            ..RuntimeOptions::default()
        };
        let runtime = RuntimeHandle::build(&options).unwrap();

        // Occupy the single blocking thread so the next task stays queued.
        let (_keep_alive, blocker) = mpsc::channel::<()>();
        let busy = runtime.compute_blocking(move || {
            let _ = blocker.recv_timeout(Duration::from_millis(200));
        });
        let queued = runtime.compute_blocking(|| 1);

        // Shutting the runtime down drains the queue without running it.
        drop(runtime);

        let _ = tokio_test::block_on(busy);
        let err = tokio_test::block_on(queued).unwrap_err();
        assert!(matches!(err, BlockingError::Cancelled));
    }

    #[test]
    fn ambient_handle_is_absent_outside_a_runtime() {
        assert!(RuntimeHandle::current().is_none());
    }
}
