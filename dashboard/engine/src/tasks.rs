use futures::future::RemoteHandle;
use futures::Future;
use futures::FutureExt as _;
use tracing::Instrument;
use tracing::Span;

/// Struct controlling the lifetime of the async tasks, such as pollers and
/// periodic notifications. If it gets dropped, all tasks are cancelled.
#[derive(Default)]
pub struct Tasks(Vec<RemoteHandle<()>>);

impl Tasks {
    /// Spawn the task on the runtime and remember the handle.
    ///
    /// The task will be stopped if this instance of [`Tasks`] goes
    /// out of scope.
    pub fn add(&mut self, f: impl Future<Output = ()> + Send + 'static) {
        let handle = f.spawn_with_handle();
        self.0.push(handle);
    }
}

pub trait FutureExt: Future + Sized {
    /// Spawn the `Future` of a task in the runtime and return a
    /// `RemoteHandle` to it. The task will be stopped when the handle
    /// is dropped.
    fn spawn_with_handle(self) -> RemoteHandle<Self::Output>
    where
        Self: Send + 'static,
        Self::Output: Send;
}

impl<F> FutureExt for F
where
    F: Future,
{
    fn spawn_with_handle(self) -> RemoteHandle<F::Output>
    where
        Self: Send + 'static,
        F::Output: Send,
    {
        let span = tracing::trace_span!(parent: Span::none(), "Spawned task");
        span.follows_from(Span::current());

        let (future, handle) = self.instrument(span).remote_handle();
        tokio::spawn(future);
        handle
    }
}
