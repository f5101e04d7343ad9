//! Integration tests for the Store dispatch cycle.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code

use mvu_core::effect::Dispatcher;
use mvu_core::reducer::{Reducer, Update};
use mvu_macros::Message;
use mvu_runtime::{Store, StoreError};
use mvu_testing::mocks::RecordingExecutor;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq)]
struct Counter {
    value: i32,
}

#[derive(Debug, Clone, Message)]
enum CounterAction {
    Bump,
    Emit(Vec<Signal>),
}

#[derive(Debug, Clone, PartialEq, Message)]
enum Signal {
    Ping,
    Bumped,
    Log,
    Announce,
    Later(u64),
}

struct CounterReducer;

impl Reducer for CounterReducer {
    type State = Counter;
    type Action = CounterAction;
    type Effect = Signal;

    fn reduce(&self, state: &Counter, action: CounterAction) -> Update<Counter, Signal> {
        match action {
            CounterAction::Bump => Update::new(Counter {
                value: state.value + 1,
            })
            .and_effect(Signal::Bumped),
            CounterAction::Emit(effects) => Update::with_effects(state.clone(), effects),
        }
    }
}

/// Runs `Later(ms)` effects as spawned tasks that bump the counter when done
fn delayed_bumps(effect: Signal, dispatcher: &Dispatcher<CounterAction>) {
    if let Signal::Later(millis) = effect {
        let follow_up = dispatcher.clone();
        dispatcher.spawn(async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            follow_up.dispatch(CounterAction::Bump);
        });
    }
}

fn store_with(executor: RecordingExecutor<Signal, CounterAction>) -> Store<CounterReducer> {
    Store::new(Update::new(Counter::default()), CounterReducer, executor)
}

#[test]
fn test_effects_initiated_in_declaration_order() {
    let executor = RecordingExecutor::new();
    let store = store_with(executor.clone());

    store
        .send(CounterAction::Emit(vec![Signal::Log, Signal::Ping, Signal::Announce]))
        .unwrap();

    assert_eq!(executor.recorded(), vec![Signal::Log, Signal::Ping, Signal::Announce]);
}

#[test]
fn test_send_returns_the_computed_update() {
    let store = store_with(RecordingExecutor::new());

    let update = store.send(CounterAction::Bump).unwrap();

    assert_eq!(update.state, Counter { value: 1 });
    assert_eq!(update.effects.as_slice(), [Signal::Bumped]);
}

#[test]
fn test_synchronous_follow_up_completes_before_next_effect() {
    let executor = RecordingExecutor::<Signal, CounterAction>::new()
        .with_follow_up(|effect| (*effect == Signal::Ping).then_some(CounterAction::Bump));
    let store = store_with(executor.clone());

    store
        .send(CounterAction::Emit(vec![Signal::Ping, Signal::Log]))
        .unwrap();

    assert_eq!(store.state(|s| s.value), 1);
    assert_eq!(executor.recorded(), vec![Signal::Ping, Signal::Bumped, Signal::Log]);
}

#[test]
fn test_effects_observe_committed_state() {
    let cell: Arc<OnceLock<Store<CounterReducer>>> = Arc::new(OnceLock::new());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let executor = {
        let cell = Arc::clone(&cell);
        let seen = Arc::clone(&seen);
        move |effect: Signal, _: &Dispatcher<CounterAction>| {
            if let (Signal::Bumped, Some(store)) = (effect, cell.get()) {
                seen.lock().unwrap().push(store.state(|s| s.value));
            }
        }
    };

    let store = Store::new(Update::new(Counter::default()), CounterReducer, executor);
    cell.set(store.clone()).unwrap();

    store.send(CounterAction::Bump).unwrap();
    store.send(CounterAction::Bump).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
}

#[test]
fn test_initial_effects_run_exactly_once() {
    let executor = RecordingExecutor::new();
    let store = Store::new(
        Update::with_effects(Counter { value: 10 }, [Signal::Announce]),
        CounterReducer,
        executor.clone(),
    );

    assert_eq!(executor.recorded(), vec![Signal::Announce]);

    for _ in 0..3 {
        store.send(CounterAction::Bump).unwrap();
        let _ = store.snapshot();
    }

    let announced = executor
        .recorded()
        .into_iter()
        .filter(|effect| *effect == Signal::Announce)
        .count();
    assert_eq!(announced, 1);
    assert_eq!(store.state(|s| s.value), 13);
}

#[test]
fn test_clones_share_state() {
    let store = store_with(RecordingExecutor::new());
    let other = store.clone();

    other.send(CounterAction::Bump).unwrap();

    assert_eq!(store.snapshot(), Counter { value: 1 });
}

#[test]
fn test_dispatcher_feeds_the_store() {
    let store = store_with(RecordingExecutor::new());

    store.dispatcher().dispatch(CounterAction::Bump);

    assert_eq!(store.state(|s| s.value), 1);
}

#[test]
fn test_subscribers_are_notified_on_commit() {
    let store = store_with(RecordingExecutor::new());
    let mut renders = store.subscribe();

    assert!(!renders.has_changed().unwrap());

    store.send(CounterAction::Bump).unwrap();

    assert!(renders.has_changed().unwrap());
    assert_eq!(renders.borrow_and_update().value, 1);
}

#[test]
fn test_spawn_without_runtime_drops_task() {
    let store = Store::new(Update::new(Counter::default()), CounterReducer, delayed_bumps);

    store.send(CounterAction::Emit(vec![Signal::Later(1)])).unwrap();

    assert_eq!(store.pending_effects(), 0);
    assert_eq!(store.state(|s| s.value), 0);
}

#[tokio::test]
async fn test_settle_waits_for_async_effects() {
    let store = Store::new(Update::new(Counter::default()), CounterReducer, delayed_bumps);

    store
        .send(CounterAction::Emit(vec![Signal::Later(20), Signal::Later(5)]))
        .unwrap();
    assert_eq!(store.pending_effects(), 2);

    store.settle(Duration::from_secs(5)).await.unwrap();

    assert_eq!(store.pending_effects(), 0);
    assert_eq!(store.state(|s| s.value), 2);
}

#[tokio::test]
async fn test_settle_times_out() {
    let store = Store::new(Update::new(Counter::default()), CounterReducer, delayed_bumps);

    store.send(CounterAction::Emit(vec![Signal::Later(500)])).unwrap();

    let result = store.settle(Duration::from_millis(10)).await;
    assert!(matches!(result, Err(StoreError::Timeout)));
}

#[tokio::test]
async fn test_shutdown_rejects_new_actions() {
    let store = store_with(RecordingExecutor::new());

    store.shutdown(Duration::from_secs(1)).await.unwrap();

    assert!(store.is_shutting_down());
    let result = store.send(CounterAction::Bump);
    assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
    assert_eq!(store.state(|s| s.value), 0);
}

#[tokio::test]
async fn test_shutdown_times_out_with_pending_effects() {
    let store = Store::new(Update::new(Counter::default()), CounterReducer, delayed_bumps);

    store.send(CounterAction::Emit(vec![Signal::Later(500)])).unwrap();

    let result = store.shutdown(Duration::from_millis(10)).await;
    assert!(matches!(result, Err(StoreError::ShutdownTimeout(1))));
}

#[tokio::test]
async fn test_unbounded_timeouts_wait_without_deadline() {
    let store = Store::new(Update::new(Counter::default()), CounterReducer, delayed_bumps);

    store.send(CounterAction::Emit(vec![Signal::Later(5)])).unwrap();
    store.settle(Duration::MAX).await.unwrap();
    assert_eq!(store.state(|s| s.value), 1);

    store.shutdown(Duration::from_secs(u64::MAX)).await.unwrap();
    assert!(store.is_shutting_down());
}

#[tokio::test]
async fn test_follow_up_after_shutdown_is_dropped() {
    let store = Store::new(Update::new(Counter::default()), CounterReducer, delayed_bumps);

    store.send(CounterAction::Emit(vec![Signal::Later(20)])).unwrap();
    store.shutdown(Duration::from_secs(5)).await.unwrap();

    // The task completed, but its follow-up was rejected
    assert_eq!(store.pending_effects(), 0);
    assert_eq!(store.state(|s| s.value), 0);
}

fn counter_action() -> impl proptest::strategy::Strategy<Value = CounterAction> {
    use proptest::prelude::*;

    prop_oneof![
        Just(CounterAction::Bump),
        prop::collection::vec(
            prop_oneof![Just(Signal::Log), Just(Signal::Ping), (0_u64..3).prop_map(Signal::Later)],
            0..4,
        )
        .prop_map(CounterAction::Emit),
    ]
}

proptest::proptest! {
    #[test]
    fn prop_store_state_matches_sequential_reduction(
        actions in proptest::collection::vec(counter_action(), 0..24)
    ) {
        let expected_bumps = actions
            .iter()
            .map(|action| match action {
                CounterAction::Bump => 1,
                CounterAction::Emit(effects) => effects
                    .iter()
                    .filter(|effect| matches!(effect, Signal::Later(_)))
                    .count(),
            })
            .sum::<usize>();

        let value = tokio_test::block_on(async {
            let store =
                Store::new(Update::new(Counter::default()), CounterReducer, delayed_bumps);
            for action in actions {
                store.send(action).unwrap();
            }
            store.settle(Duration::from_secs(5)).await.unwrap();
            store.state(|s| s.value)
        });

        proptest::prop_assert_eq!(usize::try_from(value).unwrap(), expected_bumps);
    }
}
