//! Stock `Executor` strategies
//!
//! - `FnExecutor`: tasks are shared closures
//! - `FnPointerExecutor`: tasks are plain `fn()` pointers, no allocation
//! - `ObjectExecutor`: one handler applied to every task value
//! - `StatefulExecutor`: tasks are functions of captured state
//! - `DispatchExecutor`: every task is fanned out to all registered callbacks

use crate::executor::Executor;
use parking_lot::RwLock;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A clonable closure task, as run by `FnExecutor`
pub type Job = Arc<dyn Fn() + Send + Sync>;

/// Wrap a closure as a `Job`
pub fn job<F>(f: F) -> Job
where
    F: Fn() + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Runs each task by calling it
#[derive(Debug, Default, Clone, Copy)]
pub struct FnExecutor;

impl Executor for FnExecutor {
    type Task = Job;

    fn execute(&self, task: Job) {
        task();
    }
}

/// Runs each task by calling it; tasks are plain function pointers
#[derive(Debug, Default, Clone, Copy)]
pub struct FnPointerExecutor;

impl Executor for FnPointerExecutor {
    type Task = fn();

    fn execute(&self, task: fn()) {
        task();
    }
}

/// Applies a single handler to every task value
pub struct ObjectExecutor<T, F> {
    handler: F,
    _task: PhantomData<fn(T)>,
}

impl<T, F> ObjectExecutor<T, F>
where
    F: Fn(T),
{
    /// Create an executor that passes every task to `handler`
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _task: PhantomData,
        }
    }
}

impl<T, F> Executor for ObjectExecutor<T, F>
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    type Task = T;

    fn execute(&self, task: T) {
        (self.handler)(task);
    }
}

/// Holds captured state; each task is a function of that state
pub struct StatefulExecutor<S> {
    state: S,
}

impl<S> StatefulExecutor<S> {
    /// Create an executor owning `state`
    pub fn new(state: S) -> Self {
        Self { state }
    }

    /// The captured state
    pub fn state(&self) -> &S {
        &self.state
    }
}

impl<S> Executor for StatefulExecutor<S>
where
    S: Send + Sync + 'static,
{
    type Task = fn(&S);

    fn execute(&self, task: fn(&S)) {
        task(&self.state);
    }
}

type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Fans every task out to a list of callbacks, in registration order
///
/// Callbacks can be added while loops are running; a task already being
/// dispatched does not see callbacks added concurrently.
pub struct DispatchExecutor<T> {
    callbacks: RwLock<Vec<Callback<T>>>,
}

impl<T> DispatchExecutor<T> {
    /// Create a dispatcher with no callbacks
    pub fn new() -> Self {
        Self {
            callbacks: RwLock::new(Vec::new()),
        }
    }

    /// Register a callback invoked for every subsequent task
    pub fn add_callback<F>(&self, callback: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.callbacks.write().push(Box::new(callback));
    }

    /// Number of registered callbacks
    pub fn callback_count(&self) -> usize {
        self.callbacks.read().len()
    }
}

impl<T> Default for DispatchExecutor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for DispatchExecutor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchExecutor")
            .field("callbacks", &self.callback_count())
            .finish()
    }
}

impl<T> Executor for DispatchExecutor<T>
where
    T: Send + 'static,
{
    type Task = T;

    fn execute(&self, task: T) {
        for callback in self.callbacks.read().iter() {
            callback(&task);
        }
    }
}
