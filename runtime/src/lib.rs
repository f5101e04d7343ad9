//! # MVU Runtime
//!
//! Runtime implementation for the Model-View-Update architecture.
//!
//! This crate provides the [`Store`]: the binding between a pure reducer, a
//! pluggable effect executor and whatever renders the state.
//!
//! ## Core Components
//!
//! - **Store**: Holds the current state, exposes `send` (dispatch), commits
//!   each new state before running the effects it produced
//! - **Effect Execution**: Hands each effect to the injected executor, in
//!   declaration order, together with a [`Dispatcher`](mvu_core::effect::Dispatcher)
//! - **Render subscription**: A `watch` channel notified on every commit
//!
//! ## Dispatch Cycle
//!
//! ```text
//! send(action)
//!   └─ reduce(&latest_state, action) ──► Update { state', effects }
//!        └─ commit state'  (renderers are notified)
//!             └─ execute(effect₁, dispatcher), execute(effect₂, dispatcher), ...
//!                  └─ dispatcher.dispatch(follow_up)  ──► send(follow_up) ...
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use mvu_runtime::Store;
//!
//! let store = Store::new(initialize(existing_items), TodoReducer::new(), executor);
//!
//! // Dispatch an action
//! let _ = store.send(TodoAction::AddItem { text: "buy milk".into() });
//!
//! // Read state
//! let count = store.state(|s| s.items.len());
//! ```

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Retry logic with exponential backoff
pub mod retry;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for in-flight effects to settle
        #[error("Timeout waiting for effects to settle")]
        Timeout,

        /// An effect executor panicked
        ///
        /// This error is logged but does not halt the store. The state
        /// transition that produced the effect stays committed.
        #[error("Effect execution panicked: {0}")]
        EffectPanicked(String),

        /// Asynchronous effect work was spawned outside a tokio runtime
        #[error("No tokio runtime available to run asynchronous effects")]
        NoRuntime,
    }
}

pub use error::StoreError;
pub use store::Store;

/// Internal: counts spawned effect tasks and wakes waiters when the count drops to zero
#[derive(Default)]
struct EffectTracker {
    pending: AtomicUsize,
    idle: Notify,
}

impl EffectTracker {
    /// Register a new in-flight task
    fn start(self: &Arc<Self>) -> PendingGuard {
        self.pending.fetch_add(1, Ordering::SeqCst);
        PendingGuard(Arc::clone(self))
    }

    fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Wait until no task is in flight
    ///
    /// Returns the number of tasks still running if the timeout elapses first.
    /// A timeout too large to form a deadline waits without one.
    async fn wait_idle(&self, timeout: Duration) -> Result<(), usize> {
        let deadline = tokio::time::Instant::now().checked_add(timeout);

        loop {
            // Created before the check so a completion in between is not missed
            let idle = self.idle.notified();

            if self.pending() == 0 {
                return Ok(());
            }

            tracing::debug!(pending_effects = self.pending(), "Waiting for effects to complete");

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, idle).await.is_err() {
                        return Err(self.pending());
                    }
                },
                None => idle.await,
            }
        }
    }
}

/// Internal: RAII guard that decrements the in-flight counter on drop
///
/// Ensures the counter is always decremented, even if the task panics.
struct PendingGuard(Arc<EffectTracker>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.0.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Best-effort text of a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

/// One-line summary of an effect list for the dispatch log
fn describe_effects<E: mvu_core::message::Message>(effects: &[E]) -> String {
    if effects.is_empty() {
        return "no side effects".to_string();
    }

    let tags: Vec<&str> = effects.iter().map(mvu_core::message::Message::tag).collect();
    format!("side effects: {}", tags.join(", "))
}

/// Store module - The runtime for reducers
///
/// Store runtime coordinating reducer execution, state commits and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, Duration, EffectTracker, Ordering, StoreError, describe_effects,
        panic_message,
    };
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use mvu_core::effect::{Dispatch, Dispatcher, EffectExecutor};
    use mvu_core::message::Message;
    use mvu_core::reducer::{Reducer, Update};
    use std::panic::AssertUnwindSafe;
    use std::sync::{Mutex, PoisonError};
    use tokio::sync::watch;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (in a `watch` channel, replaced wholesale on every commit)
    /// 2. Reducer (business logic)
    /// 3. Effect executor (injected impure work)
    /// 4. In-flight asynchronous effects (for `settle` and `shutdown`)
    ///
    /// One Store is bound to one top-level component for its whole lifetime.
    /// Cloning a Store yields another handle to the same runtime.
    ///
    /// # Type Parameters
    ///
    /// - `R`: Reducer implementation; its associated types fix the state,
    ///   action and effect types
    ///
    /// # Example
    ///
    /// ```ignore
    /// let store = Store::new(initialize(vec![]), TodoReducer::new(), executor);
    ///
    /// store.send(TodoAction::AddItem { text: "buy milk".into() })?;
    /// ```
    pub struct Store<R>
    where
        R: Reducer,
    {
        inner: Arc<Inner<R>>,
    }

    struct Inner<R>
    where
        R: Reducer,
    {
        state: watch::Sender<R::State>,
        /// Serializes read-reduce-commit; never held while effects run
        commit: Mutex<()>,
        reducer: R,
        executor: Box<dyn EffectExecutor<R::Effect, R::Action>>,
        shutdown: AtomicBool,
        effects: Arc<EffectTracker>,
    }

    impl<R> Store<R>
    where
        R: Reducer + Send + Sync + 'static,
        R::State: Clone + Send + Sync + 'static,
        R::Action: Message + Send + 'static,
        R::Effect: Message + Clone + Send + 'static,
    {
        /// Mount a store: install the initial state and run the initial effects
        ///
        /// The initial effects are consumed here, so they execute exactly once
        /// per store no matter how many times the state is rendered or how
        /// many actions are dispatched afterwards.
        ///
        /// # Arguments
        ///
        /// - `initial`: Starting state and the effects to run at mount
        /// - `reducer`: The reducer implementation (business logic)
        /// - `executor`: Performs the effects the reducer describes
        #[must_use]
        pub fn new<X>(initial: Update<R::State, R::Effect>, reducer: R, executor: X) -> Self
        where
            X: EffectExecutor<R::Effect, R::Action> + 'static,
        {
            let (state, effects) = initial.into_parts();
            let (sender, _) = watch::channel(state);

            let store = Self {
                inner: Arc::new(Inner {
                    state: sender,
                    commit: Mutex::new(()),
                    reducer,
                    executor: Box::new(executor),
                    shutdown: AtomicBool::new(false),
                    effects: Arc::new(EffectTracker::default()),
                }),
            };

            tracing::debug!(effects = %describe_effects(&effects), "Mounted store");
            metrics::counter!("store.mounts.total").increment(1);

            if !effects.is_empty() {
                let dispatcher = store.dispatcher();
                for effect in effects {
                    store.execute(effect, &dispatcher);
                }
            }

            store
        }

        /// Send an action to the store (dispatch)
        ///
        /// 1. Reduces the action against the latest committed state
        /// 2. Commits the new state and notifies subscribers
        /// 3. Executes the produced effects in declaration order
        ///
        /// Effects may call back into the store through their dispatcher,
        /// synchronously or after asynchronous work. A synchronous follow-up
        /// is fully processed (reduced, committed, its own effects executed)
        /// before the next effect of this call is started.
        ///
        /// # Returns
        ///
        /// The update computed for this call. Most callers ignore it.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        ///
        /// # Panics
        ///
        /// If the reducer panics, the panic propagates to the caller and the
        /// state stays unchanged. Reducers must be total and must not panic.
        #[tracing::instrument(skip_all, name = "store_send", fields(action = action.tag()))]
        pub fn send(
            &self,
            action: R::Action,
        ) -> Result<Update<R::State, R::Effect>, StoreError> {
            if self.inner.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            let tag = action.tag();
            metrics::counter!("store.commands.total", "action" => tag).increment(1);

            let update = {
                let _commit = self
                    .inner
                    .commit
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);

                let start = std::time::Instant::now();
                let update = self.inner.reducer.reduce(&self.inner.state.borrow(), action);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                self.inner.state.send_replace(update.state.clone());
                update
            };

            tracing::debug!(
                action = tag,
                effects = %describe_effects(&update.effects),
                "Applied action"
            );

            if !update.effects.is_empty() {
                let dispatcher = self.dispatcher();
                for effect in update.effects.iter().cloned() {
                    self.execute(effect, &dispatcher);
                }
            }

            Ok(update)
        }

        /// A dispatch handle for this store
        ///
        /// Hand it to views and collaborators that need to send actions
        /// without owning the store.
        #[must_use]
        pub fn dispatcher(&self) -> Dispatcher<R::Action> {
            Dispatcher::new(Arc::new(self.clone()))
        }

        /// Execute one effect, isolating executor panics
        fn execute(&self, effect: R::Effect, dispatcher: &Dispatcher<R::Action>) {
            let tag = effect.tag();
            tracing::trace!(effect = tag, "Executing effect");
            metrics::counter!("store.effects.executed", "effect" => tag).increment(1);

            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                self.inner.executor.execute(effect, dispatcher);
            }));

            if let Err(payload) = outcome {
                let error = StoreError::EffectPanicked(panic_message(payload.as_ref()));
                metrics::counter!("store.effects.failed", "effect" => tag).increment(1);
                tracing::error!(effect = tag, error = %error, "Effect executor panicked");
            }
        }

        /// Read current state via a closure
        ///
        /// The state is borrowed for the duration of the closure. Do not send
        /// actions from inside it.
        ///
        /// ```ignore
        /// let remaining = store.state(|s| s.items.iter().filter(|i| !i.completed).count());
        /// ```
        pub fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&R::State) -> T,
        {
            f(&self.inner.state.borrow())
        }

        /// Clone of the current state
        #[must_use]
        pub fn snapshot(&self) -> R::State {
            self.inner.state.borrow().clone()
        }

        /// Subscribe to state commits (the render boundary)
        ///
        /// The receiver is marked changed after every commit; renderers call
        /// `changed().await` and then `borrow_and_update()` to render.
        #[must_use]
        pub fn subscribe(&self) -> watch::Receiver<R::State> {
            self.inner.state.subscribe()
        }

        /// Number of asynchronous effect tasks still running
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.inner.effects.pending()
        }

        /// Returns true once `shutdown` has been called
        #[must_use]
        pub fn is_shutting_down(&self) -> bool {
            self.inner.shutdown.load(Ordering::Acquire)
        }

        /// Wait for in-flight asynchronous effects (and the work they cascade into)
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::Timeout`] if effects are still running when
        /// the timeout elapses.
        pub async fn settle(&self, timeout: Duration) -> Result<(), StoreError> {
            self.inner
                .effects
                .wait_idle(timeout)
                .await
                .map_err(|_| StoreError::Timeout)
        }

        /// Initiate graceful shutdown (unmount)
        ///
        /// 1. Stops accepting new actions (`send` returns `ShutdownInProgress`)
        /// 2. Waits for in-flight asynchronous effects to complete
        ///
        /// Effects still running may report their outcome; follow-up actions
        /// they dispatch are rejected and logged.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before
        /// all pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.inner.shutdown.store(true, Ordering::Release);

            match self.inner.effects.wait_idle(timeout).await {
                Ok(()) => {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    Ok(())
                },
                Err(pending) => {
                    tracing::error!(
                        pending_effects = pending,
                        "Shutdown timeout: {} effects still running",
                        pending
                    );
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    Err(StoreError::ShutdownTimeout(pending))
                },
            }
        }
    }

    impl<R> Dispatch<R::Action> for Store<R>
    where
        R: Reducer + Send + Sync + 'static,
        R::State: Clone + Send + Sync + 'static,
        R::Action: Message + Send + 'static,
        R::Effect: Message + Clone + Send + 'static,
    {
        fn dispatch(&self, action: R::Action) {
            let tag = action.tag();
            if let Err(error) = self.send(action) {
                tracing::warn!(action = tag, error = %error, "Dropped follow-up action");
            }
        }

        fn spawn(&self, task: BoxFuture<'static, ()>) {
            let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                metrics::counter!("store.effects.failed", "effect" => "spawn").increment(1);
                tracing::error!(error = %StoreError::NoRuntime, "Dropping asynchronous effect");
                return;
            };

            let guard = self.inner.effects.start();

            runtime.spawn(async move {
                let _guard = guard;

                if let Err(payload) = AssertUnwindSafe(task).catch_unwind().await {
                    let error = StoreError::EffectPanicked(panic_message(payload.as_ref()));
                    metrics::counter!("store.effects.failed", "effect" => "spawn").increment(1);
                    tracing::error!(error = %error, "Asynchronous effect panicked");
                }
            });
        }
    }

    impl<R> Clone for Store<R>
    where
        R: Reducer,
    {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<R> std::fmt::Debug for Store<R>
    where
        R: Reducer,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Store")
                .field("shutdown", &self.inner.shutdown.load(Ordering::Acquire))
                .field("pending_effects", &self.inner.effects.pending())
                .finish_non_exhaustive()
        }
    }
}
