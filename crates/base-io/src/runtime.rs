use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    future::Future,
    rc::Rc,
    sync::{atomic::AtomicBool, Arc},
};

use anyhow::anyhow;

pub type RuntimeType = tokio::runtime::Runtime;
pub type TaskJoinType = tokio::task::JoinHandle<()>;

/// A handle to a spawned IO task — shader source loads, texture decodes,
/// pipeline-cache reads. Backend init (§4.E "Swapchain"/shader bridge warm-up)
/// spawns these off the owning thread and blocks on them with `get()` once
/// their result is actually needed, so disk latency overlaps with other
/// startup work.
pub struct IoRuntimeTask<S> {
    queue_id: u64,
    storage: Arc<tokio::sync::Mutex<anyhow::Result<S>>>,
    is_finished: Arc<AtomicBool>,
    runtime: Rc<RefCell<IoRuntimeInner>>,
}

impl<S> IoRuntimeTask<S> {
    pub fn is_finished(&self) -> bool {
        self.is_finished.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Blocking wait for the task's result. Called from the owning thread
    /// only, same thread-affinity rule as every other URC entry point.
    pub fn get(self) -> anyhow::Result<S> {
        let join_handle = self
            .runtime
            .borrow_mut()
            .tasks
            .remove(&self.queue_id)
            .ok_or_else(|| anyhow!("io task {} was already awaited", self.queue_id))?;
        self.runtime.borrow().rt.block_on(join_handle)?;
        let mut storage_res = Err(anyhow!("task did not run"));
        std::mem::swap(&mut *self.storage.blocking_lock(), &mut storage_res);
        storage_res
    }
}

struct IoRuntimeInner {
    tasks: HashMap<u64, TaskJoinType>,
    rt: RuntimeType,
}

/// The async IO runtime handed to backend-loading code that needs to read
/// files (shader sources, pipeline caches, textures) without blocking the
/// owning thread during `init`.
#[derive(Clone)]
pub struct IoRuntime {
    inner: Rc<RefCell<IoRuntimeInner>>,
    next_task_id: Rc<Cell<u64>>,
}

impl IoRuntime {
    pub fn new(rt: RuntimeType) -> Self {
        Self {
            inner: Rc::new(RefCell::new(IoRuntimeInner {
                tasks: HashMap::new(),
                rt,
            })),
            next_task_id: Default::default(),
        }
    }

    #[must_use]
    pub fn spawn<S, F>(&self, task: F) -> IoRuntimeTask<S>
    where
        S: Send + 'static,
        F: Future<Output = anyhow::Result<S>> + Send + 'static,
    {
        let storage = Arc::new(tokio::sync::Mutex::new(Err(anyhow!("task did not run"))));
        let storage_clone = storage.clone();
        let is_finished = Arc::new(AtomicBool::new(false));
        let is_finished_clone = is_finished.clone();

        let _guard = self.inner.borrow().rt.enter();
        let join_handle = tokio::spawn(async move {
            let result = task.await;
            *storage_clone.lock().await = result;
            is_finished_clone.store(true, std::sync::atomic::Ordering::SeqCst);
        });

        let queue_id = self.next_task_id.replace(self.next_task_id.get() + 1);
        self.inner.borrow_mut().tasks.insert(queue_id, join_handle);

        IoRuntimeTask {
            queue_id,
            storage,
            is_finished,
            runtime: self.inner.clone(),
        }
    }
}
