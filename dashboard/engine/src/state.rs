use crate::tasks::Tasks;
use anyhow::Result;
use parking_lot::RwLock;
use state::Storage;
use tokio::runtime::Runtime;

/// For testing we need the state to be mutable as otherwise we can't start another engine after
/// stopping the first one. Note, running two engines at the same time will not work as the states
/// below are static and will be used for both.

static TASKS: Storage<RwLock<Tasks>> = Storage::new();

/// Keeps the engine's background tasks (wallet poller, health checks, deposit
/// subscription) alive. Replacing the set cancels the previous tasks.
pub(crate) fn set_tasks(tasks: Tasks) {
    match TASKS.try_get() {
        Some(t) => *t.write() = tasks,
        None => {
            TASKS.set(RwLock::new(tasks));
        }
    }
}

/// Lazily creates a multi threaded runtime with the the number of worker threads corresponding to
/// the number of available cores.
pub fn get_or_create_tokio_runtime() -> Result<&'static Runtime> {
    static RUNTIME: Storage<Runtime> = Storage::new();

    if RUNTIME.try_get().is_none() {
        let runtime = Runtime::new()?;
        RUNTIME.set(runtime);
    }

    Ok(RUNTIME.get())
}
