//! Runtime abstraction layer for async operations
//!
//! Tile pipelines are spawned through an [`AsyncSpawner`] so the manager can
//! be driven from a thread that is not itself inside the async runtime.

use crate::prelude::{Arc, Future, Pin};
use crate::{MapError, Result};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and return a handle to it
    fn spawn_boxed(
        &self,
        future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
    ) -> Box<dyn AsyncHandle>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;

    /// Abort the task at its next await point
    fn cancel(&self);
}

/// Tokio-based async spawner.
///
/// Without a handle, tasks go to the runtime of the calling thread.
#[derive(Clone, Default)]
pub struct TokioSpawner {
    handle: Option<Handle>,
}

impl TokioSpawner {
    pub fn ambient() -> Self {
        Self { handle: None }
    }

    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Captures the runtime the caller is running in.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::with_handle)
            .map_err(|e| MapError::Config(format!("no tokio runtime available: {}", e)))
    }
}

impl AsyncSpawner for TokioSpawner {
    fn spawn_boxed(
        &self,
        future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
    ) -> Box<dyn AsyncHandle> {
        let handle = match &self.handle {
            Some(runtime) => runtime.spawn(future),
            None => tokio::spawn(future),
        };
        Box::new(TokioHandle(handle))
    }
}

struct TokioHandle(JoinHandle<()>);

impl AsyncHandle for TokioHandle {
    fn is_finished(&self) -> bool {
        self.0.is_finished()
    }

    fn cancel(&self) {
        self.0.abort();
    }
}

/// Global runtime instance
static RUNTIME: std::sync::OnceLock<Arc<dyn AsyncSpawner>> = std::sync::OnceLock::new();

/// Initialize the runtime with a specific spawner. Only the first call wins.
pub fn init_runtime(spawner: Arc<dyn AsyncSpawner>) {
    if RUNTIME.set(spawner).is_err() {
        log::debug!("runtime already initialized; keeping the existing spawner");
    }
}

/// Get the global runtime spawner
pub fn runtime() -> Arc<dyn AsyncSpawner> {
    RUNTIME
        .get_or_init(|| Arc::new(TokioSpawner::ambient()))
        .clone()
}

/// Spawn a future on the global spawner
pub fn spawn<F>(future: F) -> Box<dyn AsyncHandle>
where
    F: Future<Output = ()> + Send + 'static,
{
    runtime().spawn_boxed(Box::pin(future))
}

/// Runs CPU-bound work on the blocking pool and waits for it.
pub async fn execute_blocking<F, T>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => Err(MapError::Cancelled),
        Err(e) => Err(MapError::Plugin(format!("blocking task panicked: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tokio_spawner() {
        let handle = spawn(async {
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        });

        // Should not be finished immediately
        assert!(!handle.is_finished());

        // Wait a bit and check again
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_cancel_aborts_task() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
            let _ = tx.send(());
        });

        handle.cancel();
        // the sender is dropped without sending once the task is aborted
        assert!(rx.await.is_err());
    }

    #[test]
    fn test_spawner_with_handle_from_plain_thread() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let spawner = TokioSpawner::with_handle(rt.handle().clone());
        let (tx, rx) = std::sync::mpsc::channel();

        spawner.spawn_boxed(Box::pin(async move {
            tx.send(42).unwrap();
        }));

        assert_eq!(rx.recv_timeout(std::time::Duration::from_secs(5)), Ok(42));
        assert!(TokioSpawner::current().is_err());
    }

    #[tokio::test]
    async fn test_execute_blocking() {
        let value = execute_blocking(|| Ok(21 * 2)).await.unwrap();
        assert_eq!(value, 42);

        let err = execute_blocking::<_, ()>(|| Err(MapError::ParseError("bad".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, MapError::ParseError(_)));
    }
}
