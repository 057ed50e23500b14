//! Error group: run independent fallible tasks on worker threads and keep
//! only the first failure.
//!
//! Once a task fails, tasks that have not started yet are dropped. Tasks
//! already running are left to finish but their outcome is ignored.
//! [`ErrorGroup::wait`] joins the workers and returns the first error; a
//! panicking task is re-raised on the waiting thread.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::debug;

type Task<E> = Box<dyn FnOnce() -> Result<(), E> + Send + 'static>;

struct State<E> {
    queue: VecDeque<Task<E>>,
    /// Workers currently alive.
    active: usize,
    first_error: Option<E>,
    panic: Option<Box<dyn Any + Send + 'static>>,
    cancelled: usize,
}

struct Shared<E> {
    state: Mutex<State<E>>,
    failed: AtomicBool,
}

impl<E> Shared<E> {
    fn fail(&self, state: &mut State<E>) {
        self.failed.store(true, Ordering::SeqCst);
        state.cancelled += state.queue.len();
        state.queue.clear();
    }
}

/// Fan-out helper for side-effecting tasks without ordering dependencies.
pub struct ErrorGroup<E> {
    shared: Arc<Shared<E>>,
    limit: usize,
    handles: Vec<JoinHandle<()>>,
}

impl<E: Send + 'static> ErrorGroup<E> {
    /// A group that starts one worker per task.
    pub fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    /// A group that runs at most `limit` tasks at a time.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    queue: VecDeque::new(),
                    active: 0,
                    first_error: None,
                    panic: None,
                    cancelled: 0,
                }),
                failed: AtomicBool::new(false),
            }),
            limit: limit.max(1),
            handles: Vec::new(),
        }
    }

    /// Queue a task. It is dropped without running if the group has failed.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
    {
        let mut state = self.shared.state.lock();
        if self.shared.failed.load(Ordering::SeqCst) {
            state.cancelled += 1;
            return;
        }
        state.queue.push_back(Box::new(task));
        if state.active >= self.limit {
            return;
        }
        state.active += 1;
        drop(state);

        let shared = Arc::clone(&self.shared);
        match thread::Builder::new()
            .name("curator-errgroup".to_string())
            .spawn(move || worker_loop(shared))
        {
            Ok(handle) => self.handles.push(handle),
            Err(e) => {
                // Leftover tasks run on the waiting thread instead.
                debug!(error = %e, "failed to start error group worker");
                self.shared.state.lock().active -= 1;
            }
        }
    }

    /// True once any task has failed.
    pub fn has_failed(&self) -> bool {
        self.shared.failed.load(Ordering::SeqCst)
    }

    /// Wait for every started task and return the first failure.
    pub fn wait(self) -> Result<(), E> {
        for handle in self.handles {
            // Task panics are caught inside the worker.
            let _ = handle.join();
        }
        // Anything still queued had no worker to run it.
        worker_loop(Arc::clone(&self.shared));

        let mut state = self.shared.state.lock();
        if state.cancelled > 0 {
            debug!(cancelled = state.cancelled, "error group dropped queued tasks");
        }
        if let Some(payload) = state.panic.take() {
            drop(state);
            panic::resume_unwind(payload);
        }
        match state.first_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<E: Send + 'static> Default for ErrorGroup<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn worker_loop<E>(shared: Arc<Shared<E>>) {
    loop {
        let task = {
            let mut state = shared.state.lock();
            match state.queue.pop_front() {
                Some(task) => task,
                None => {
                    state.active = state.active.saturating_sub(1);
                    return;
                }
            }
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(task));

        let mut state = shared.state.lock();
        let failed = shared.failed.load(Ordering::SeqCst);
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                if !failed {
                    state.first_error = Some(e);
                    shared.fail(&mut state);
                }
            }
            Err(payload) => {
                if state.panic.is_none() {
                    state.panic = Some(payload);
                }
                if !failed {
                    shared.fail(&mut state);
                }
            }
        }
    }
}
