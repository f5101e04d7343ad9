//! # MVU Testing
//!
//! Testing utilities and helpers for the MVU architecture.
//!
//! This crate provides:
//! - [`ReducerTest`]: Given-When-Then harness for reducers
//! - [`assertions`]: Effect assertion helpers
//! - [`mocks`]: A recording effect executor and a queued dispatcher for
//!   testing executors in isolation
//! - [`init_tracing`]: Test-friendly log output
//!
//! ## Example
//!
//! ```ignore
//! use mvu_testing::mocks::RecordingExecutor;
//! use mvu_runtime::Store;
//!
//! let executor = RecordingExecutor::new();
//! let store = Store::new(initialize(vec![]), TodoReducer::new(), executor.clone());
//!
//! store.send(TodoAction::AddItem { text: "buy milk".into() })?;
//! assert_eq!(executor.recorded().len(), 1);
//! ```


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of the effect seams
pub mod mocks {
    use futures::future::BoxFuture;
    use mvu_core::effect::{Dispatch, Dispatcher, EffectExecutor};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    type FollowUp<E, A> = Arc<dyn Fn(&E) -> Option<A> + Send + Sync>;

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Effect executor that records every effect it receives, in order
    ///
    /// Optionally answers an effect with a follow-up action, dispatched
    /// synchronously from inside `execute` (exercising re-entrant dispatch).
    /// Clones share the same log.
    ///
    /// # Example
    ///
    /// ```
    /// use mvu_core::effect::EffectExecutor;
    /// use mvu_testing::mocks::{QueuedDispatch, RecordingExecutor};
    ///
    /// let executor = RecordingExecutor::<&str, u8>::new().with_follow_up(|_| Some(1));
    /// let queue = QueuedDispatch::new();
    ///
    /// executor.execute("sync", &queue.dispatcher());
    ///
    /// assert_eq!(executor.recorded(), vec!["sync"]);
    /// assert_eq!(queue.take_actions(), vec![1]);
    /// ```
    pub struct RecordingExecutor<E, A> {
        log: Arc<Mutex<Vec<E>>>,
        follow_up: Option<FollowUp<E, A>>,
    }

    impl<E, A> RecordingExecutor<E, A> {
        /// Create an executor that only records
        #[must_use]
        pub fn new() -> Self {
            Self {
                log: Arc::new(Mutex::new(Vec::new())),
                follow_up: None,
            }
        }

        /// Answer effects with follow-up actions
        #[must_use]
        pub fn with_follow_up<F>(mut self, follow_up: F) -> Self
        where
            F: Fn(&E) -> Option<A> + Send + Sync + 'static,
        {
            self.follow_up = Some(Arc::new(follow_up));
            self
        }

        /// Number of effects executed so far
        #[must_use]
        pub fn count(&self) -> usize {
            lock(&self.log).len()
        }

        /// Forget recorded effects
        pub fn clear(&self) {
            lock(&self.log).clear();
        }
    }

    impl<E: Clone, A> RecordingExecutor<E, A> {
        /// Effects executed so far, in execution order
        #[must_use]
        pub fn recorded(&self) -> Vec<E> {
            lock(&self.log).clone()
        }
    }

    impl<E, A> Default for RecordingExecutor<E, A> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<E, A> Clone for RecordingExecutor<E, A> {
        fn clone(&self) -> Self {
            Self {
                log: Arc::clone(&self.log),
                follow_up: self.follow_up.clone(),
            }
        }
    }

    impl<E, A> EffectExecutor<E, A> for RecordingExecutor<E, A>
    where
        E: Send,
        A: Send,
    {
        fn execute(&self, effect: E, dispatcher: &Dispatcher<A>) {
            let follow_up = self.follow_up.as_ref().and_then(|f| f(&effect));
            // Release the log before dispatching: the follow-up may record more effects
            lock(&self.log).push(effect);

            if let Some(action) = follow_up {
                dispatcher.dispatch(action);
            }
        }
    }

    /// Dispatch target that queues actions and spawned tasks for manual processing
    ///
    /// Use it to test an effect executor without a store: run the executor,
    /// drive the spawned work with [`run_spawned`](Self::run_spawned), then
    /// inspect the queued follow-up actions.
    pub struct QueuedDispatch<A> {
        actions: Arc<Mutex<VecDeque<A>>>,
        tasks: Arc<Mutex<Vec<BoxFuture<'static, ()>>>>,
    }

    impl<A: Send + 'static> QueuedDispatch<A> {
        /// Create an empty queue
        #[must_use]
        pub fn new() -> Self {
            Self {
                actions: Arc::new(Mutex::new(VecDeque::new())),
                tasks: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// A dispatcher feeding this queue
        #[must_use]
        pub fn dispatcher(&self) -> Dispatcher<A> {
            Dispatcher::new(Arc::new(self.clone()))
        }

        /// Drain the queued actions, oldest first
        #[must_use]
        pub fn take_actions(&self) -> Vec<A> {
            lock(&self.actions).drain(..).collect()
        }

        /// Number of spawned tasks not yet run
        #[must_use]
        pub fn spawned(&self) -> usize {
            lock(&self.tasks).len()
        }

        /// Run spawned tasks to completion, in spawn order
        ///
        /// Tasks spawned while running are run as well.
        pub async fn run_spawned(&self) {
            loop {
                let batch: Vec<_> = lock(&self.tasks).drain(..).collect();
                if batch.is_empty() {
                    break;
                }
                for task in batch {
                    task.await;
                }
            }
        }
    }

    impl<A: Send + 'static> Default for QueuedDispatch<A> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<A> Clone for QueuedDispatch<A> {
        fn clone(&self) -> Self {
            Self {
                actions: Arc::clone(&self.actions),
                tasks: Arc::clone(&self.tasks),
            }
        }
    }

    impl<A: Send> Dispatch<A> for QueuedDispatch<A> {
        fn dispatch(&self, action: A) {
            lock(&self.actions).push_back(action);
        }

        fn spawn(&self, task: BoxFuture<'static, ()>) {
            lock(&self.tasks).push(task);
        }
    }
}

/// Install a test subscriber that writes to the test harness output
///
/// Honours `RUST_LOG`; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::mocks::{QueuedDispatch, RecordingExecutor};
    use mvu_core::effect::EffectExecutor;

    #[test]
    fn test_recording_executor_keeps_order() {
        let executor = RecordingExecutor::<u8, ()>::new();
        let queue = QueuedDispatch::new();
        let dispatcher = queue.dispatcher();

        executor.execute(3, &dispatcher);
        executor.execute(1, &dispatcher);

        assert_eq!(executor.recorded(), vec![3, 1]);
        assert!(queue.take_actions().is_empty());
    }

    #[test]
    fn test_clones_share_log() {
        let executor = RecordingExecutor::<u8, ()>::new();
        let clone = executor.clone();

        clone.execute(9, &QueuedDispatch::new().dispatcher());

        assert_eq!(executor.count(), 1);
        executor.clear();
        assert_eq!(clone.count(), 0);
    }

    #[tokio::test]
    async fn test_queued_dispatch_runs_spawned_tasks() {
        let queue = QueuedDispatch::<u8>::new();
        let dispatcher = queue.dispatcher();

        let inner = dispatcher.clone();
        dispatcher.spawn(async move {
            inner.dispatch(1);
            let nested = inner.clone();
            inner.spawn(async move { nested.dispatch(2) });
        });

        assert_eq!(queue.spawned(), 1);
        queue.run_spawned().await;

        assert_eq!(queue.take_actions(), vec![1, 2]);
        assert_eq!(queue.spawned(), 0);
    }
}
