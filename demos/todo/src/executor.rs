//! Effect executor for the todo list.
//!
//! A [`TodoEffect::Sync`] is first written to the local stash (synchronously)
//! and then pushed to the sync collaborator on a tracked background task,
//! retrying transient failures. Failures are logged and never reach the
//! reducer: the committed state stays optimistic.

use crate::error::SyncError;
use crate::storage::TodoRepository;
use crate::sync::SyncClient;
use crate::types::{TodoAction, TodoEffect};
use mvu_core::effect::{Dispatcher, EffectExecutor};
use mvu_runtime::retry::{RetryPolicy, retry_if};
use std::sync::Arc;

/// Performs todo effects against the configured collaborators
///
/// Both collaborators are optional; an executor with neither simply drops
/// effects.
#[derive(Clone, Default)]
pub struct TodoExecutor {
    repository: Option<Arc<dyn TodoRepository>>,
    sync: Option<Arc<dyn SyncClient>>,
    retry: RetryPolicy,
}

impl TodoExecutor {
    /// Creates an executor with no collaborators
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist synced lists to `repository`
    #[must_use]
    pub fn with_repository(mut self, repository: Arc<dyn TodoRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Push synced lists to `sync`
    #[must_use]
    pub fn with_sync(mut self, sync: Arc<dyn SyncClient>) -> Self {
        self.sync = Some(sync);
        self
    }

    /// Retry policy for transient sync failures
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn persist(&self, effect: &TodoEffect) {
        let Some(repository) = &self.repository else {
            return;
        };
        let TodoEffect::Sync { items } = effect;

        match repository.save(items) {
            Ok(()) => tracing::debug!(items = items.len(), "Saved todo list"),
            Err(error) => tracing::error!(error = %error, "Failed to save todo list"),
        }
    }

    fn push(&self, effect: TodoEffect, dispatcher: &Dispatcher<TodoAction>) {
        let Some(sync) = &self.sync else {
            return;
        };
        let sync = Arc::clone(sync);
        let policy = self.retry.clone();

        dispatcher.spawn(async move {
            let result = retry_if(&policy, || sync.send(&effect), SyncError::is_transient).await;

            if let Err(error) = result {
                tracing::error!(error = %error, "Failed to sync with server");
            }
        });
    }
}

impl EffectExecutor<TodoEffect, TodoAction> for TodoExecutor {
    fn execute(&self, effect: TodoEffect, dispatcher: &Dispatcher<TodoAction>) {
        self.persist(&effect);
        self.push(effect, dispatcher);
    }
}

impl std::fmt::Debug for TodoExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoExecutor")
            .field("repository", &self.repository.is_some())
            .field("sync", &self.sync.is_some())
            .field("retry", &self.retry)
            .finish()
    }
}
