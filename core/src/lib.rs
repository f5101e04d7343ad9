//! # MVU Core
//!
//! Core traits and types for the Model-View-Update (Elm) architecture.
//!
//! The full lifecycle of a component is captured by three pieces:
//!
//! - an initial [`Update`](reducer::Update): the starting state plus effects to run once at mount
//! - a [`Reducer`](reducer::Reducer): how state changes in response to an action, and which
//!   effects that change produces
//! - an [`EffectExecutor`](effect::EffectExecutor): how those effects are actually performed
//!
//! ## Core Concepts
//!
//! - **State**: All the data a component needs. Replaced wholesale on every dispatch.
//! - **Action**: Something the user (or the system) means to do. Semantically meaningful
//!   ("submit the form"), not mechanical ("press a key").
//! - **Effect**: A description of impure work, e.g. "sync the list" or "focus the input".
//!   Effects are data; the runtime hands them to the executor.
//! - **Reducer**: Pure function `(&State, Action) → (State, Effects)`
//!
//! ## Example
//!
//! ```
//! use mvu_core::reducer::{Reducer, Update};
//!
//! #[derive(Clone, Debug, Default)]
//! struct Counter {
//!     count: i64,
//! }
//!
//! enum CounterAction {
//!     Increment,
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = Counter;
//!     type Action = CounterAction;
//!     type Effect = ();
//!
//!     fn reduce(&self, state: &Counter, action: CounterAction) -> Update<Counter, ()> {
//!         match action {
//!             CounterAction::Increment => Update::new(Counter { count: state.count + 1 }),
//!         }
//!     }
//! }
//!
//! let update = CounterReducer.reduce(&Counter::default(), CounterAction::Increment);
//! assert_eq!(update.state.count, 1);
//! assert!(update.effects.is_empty());
//! ```

// Re-export commonly used types
pub use smallvec::{SmallVec, smallvec};

/// Declarative helpers for building updates
pub mod effect_macros;

/// Message module - Stable names for actions and effects
///
/// Actions and effects are closed sets of tagged variants. The [`Message`](message::Message)
/// trait exposes the tag of the current variant so the runtime can log and count them
/// without requiring `Debug` output of the full payload. Derive it with
/// `#[derive(Message)]` from `mvu-macros`.
pub mod message {
    /// A tagged message (action or effect)
    pub trait Message {
        /// Stable, kebab-case tag of this variant (e.g. `"add-item"`)
        fn tag(&self) -> &'static str;
    }
}

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(&State, Action) → Update { State, Effects }`
///
/// They contain all business logic and are deterministic and testable.
/// The input state is borrowed and never mutated; the reducer returns the
/// next state as a fresh value so the runtime can swap it in with a single
/// assignment.
pub mod reducer {
    use smallvec::SmallVec;

    /// Ordered list of effects produced by one reduction
    ///
    /// Most transitions produce zero or one effect, so four inline slots avoid
    /// allocating in the common case.
    pub type Effects<E> = SmallVec<[E; 4]>;

    /// The result of a single reducer invocation: the next state and the
    /// effects to execute, in order.
    ///
    /// The same shape doubles as the initializer of a component: the
    /// starting state and the effects to run exactly once at mount.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Update<S, E> {
        /// The state to commit
        pub state: S,
        /// Effects to execute after the commit, in declaration order
        pub effects: Effects<E>,
    }

    impl<S, E> Update<S, E> {
        /// Create an update with no effects
        #[must_use]
        pub fn new(state: S) -> Self {
            Self {
                state,
                effects: SmallVec::new(),
            }
        }

        /// Create an update with the given effects
        #[must_use]
        pub fn with_effects(state: S, effects: impl IntoIterator<Item = E>) -> Self {
            Self {
                state,
                effects: effects.into_iter().collect(),
            }
        }

        /// Append an effect, keeping declaration order
        #[must_use]
        pub fn and_effect(mut self, effect: E) -> Self {
            self.effects.push(effect);
            self
        }

        /// Returns true if this update carries no effects
        #[must_use]
        pub fn has_no_effects(&self) -> bool {
            self.effects.is_empty()
        }

        /// Split the update into its state and effects
        #[must_use]
        pub fn into_parts(self) -> (S, Effects<E>) {
            (self.state, self.effects)
        }
    }

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Effect`: The effect descriptions this reducer produces
    ///
    /// # Contract
    ///
    /// `reduce` must be total: every action applied to every state yields an
    /// update. Actions that reference something absent (an unknown id, say)
    /// are no-ops, never errors or panics.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The effect type this reducer produces
        type Effect;

        /// Reduce an action into the next state and its effects
        ///
        /// # Arguments
        ///
        /// - `state`: The latest committed state
        /// - `action`: The action to process
        ///
        /// # Returns
        ///
        /// The next state and the effects to be executed by the runtime
        fn reduce(
            &self,
            state: &Self::State,
            action: Self::Action,
        ) -> Update<Self::State, Self::Effect>;
    }
}

/// Effect module - Executing effect descriptions
///
/// Effects are values produced by reducers. Executing them is the job of an
/// [`EffectExecutor`](effect::EffectExecutor), injected into the runtime at
/// construction time. Executors receive a [`Dispatcher`](effect::Dispatcher)
/// so that the outcome of an effect can be fed back as a new action.
pub mod effect {
    use futures::future::BoxFuture;
    use std::future::Future;
    use std::sync::Arc;

    /// The dispatch capability a runtime exposes to effect executors
    ///
    /// Implemented by the runtime. Application code uses the [`Dispatcher`]
    /// handle instead of this trait.
    pub trait Dispatch<A>: Send + Sync {
        /// Feed an action back into the runtime
        ///
        /// Fire-and-forget: failures are reported by the runtime, never returned.
        fn dispatch(&self, action: A);

        /// Start asynchronous effect work tracked by the runtime
        fn spawn(&self, task: BoxFuture<'static, ()>);
    }

    /// Clonable handle used by effects to dispatch follow-up actions
    ///
    /// A dispatcher may be used synchronously from inside
    /// [`EffectExecutor::execute`] (the follow-up is reduced against the
    /// already-committed state), or moved into asynchronous work and used
    /// when that work completes.
    pub struct Dispatcher<A> {
        inner: Arc<dyn Dispatch<A>>,
    }

    impl<A> Dispatcher<A> {
        /// Wrap a dispatch implementation
        #[must_use]
        pub fn new(inner: Arc<dyn Dispatch<A>>) -> Self {
            Self { inner }
        }

        /// Dispatch an action
        pub fn dispatch(&self, action: A) {
            self.inner.dispatch(action);
        }

        /// Run asynchronous effect work in the background
        ///
        /// The runtime tracks spawned work so it can wait for it on shutdown.
        pub fn spawn<F>(&self, task: F)
        where
            F: Future<Output = ()> + Send + 'static,
        {
            self.inner.spawn(Box::pin(task));
        }
    }

    impl<A> Clone for Dispatcher<A> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<A> std::fmt::Debug for Dispatcher<A> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Dispatcher").finish_non_exhaustive()
        }
    }

    /// Executes effect descriptions
    ///
    /// This is where impure work lives: network requests, storage writes,
    /// focusing UI elements. Implementations must not panic or return
    /// errors to the runtime. Failures are reported (logged) and, when
    /// useful, turned into follow-up actions via the dispatcher.
    ///
    /// Any `Fn(E, &Dispatcher<A>)` closure is an executor.
    ///
    /// # Example
    ///
    /// ```
    /// use mvu_core::effect::{Dispatcher, EffectExecutor};
    ///
    /// enum Effect {
    ///     Log(String),
    /// }
    ///
    /// fn assert_executor<X: EffectExecutor<Effect, ()>>(_: &X) {}
    ///
    /// let executor = |effect: Effect, _dispatcher: &Dispatcher<()>| match effect {
    ///     Effect::Log(line) => println!("{line}"),
    /// };
    /// assert_executor(&executor);
    /// ```
    pub trait EffectExecutor<E, A>: Send + Sync {
        /// Execute a single effect
        fn execute(&self, effect: E, dispatcher: &Dispatcher<A>);
    }

    impl<E, A, F> EffectExecutor<E, A> for F
    where
        F: Fn(E, &Dispatcher<A>) + Send + Sync,
    {
        fn execute(&self, effect: E, dispatcher: &Dispatcher<A>) {
            self(effect, dispatcher);
        }
    }
}
