//! Todo list application built on the MVU runtime.
//!
//! The domain is a pure [`TodoReducer`]; everything impure (the local stash,
//! the sync server) lives behind the [`TodoExecutor`]. The terminal front end
//! in `main.rs` renders from the store's subscription and turns input lines
//! into actions.
//!
//! - [`types`]: items, state, actions and effects
//! - [`reducer`]: transitions and the mount initializer
//! - [`executor`]: runs effects against the collaborators
//! - [`storage`] / [`sync`]: the persistence and sync collaborators
//! - [`config`]: environment configuration
//! - [`view`]: text rendering and command parsing
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use todo::{InMemoryRepository, TodoAction, TodoExecutor, mount};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = Arc::new(InMemoryRepository::new());
//! let executor = TodoExecutor::new().with_repository(repository.clone());
//! let store = mount(repository.as_ref(), executor)?;
//!
//! store.send(TodoAction::AddItem { text: "Buy milk".to_string() })?;
//!
//! let remaining = store.state(|s| s.count() - s.completed_count());
//! println!("Remaining: {remaining}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod reducer;
pub mod storage;
pub mod sync;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use error::{ConfigError, StorageError, SyncError};
pub use executor::TodoExecutor;
pub use reducer::{TodoReducer, initialize};
pub use storage::{InMemoryRepository, JsonFileRepository, TodoRepository};
pub use sync::{HttpSync, NoopSync, SyncClient};
pub use types::{TodoAction, TodoEffect, TodoId, TodoItem, TodoState};

use mvu_core::effect::EffectExecutor;
use mvu_runtime::Store;

/// Mount the todo list: restore the stored items and start a store
///
/// Nothing stored yet means an empty list. The initial sync (if any) runs
/// once, here.
///
/// # Errors
///
/// Returns [`StorageError`] if the stash exists but cannot be read.
pub fn mount<X>(
    repository: &dyn TodoRepository,
    executor: X,
) -> Result<Store<TodoReducer>, StorageError>
where
    X: EffectExecutor<TodoEffect, TodoAction> + 'static,
{
    let existing = repository.load()?.unwrap_or_default();
    Ok(start(existing, executor))
}

/// Like [`mount`], but starts from an empty list if the stash is unreadable
///
/// The unreadable stash is set aside first (see
/// [`TodoRepository::set_aside`]), so saves made by this session cannot
/// overwrite it.
///
/// # Errors
///
/// Returns [`StorageError`] if the unreadable stash cannot be set aside.
pub fn mount_or_recover<X>(
    repository: &dyn TodoRepository,
    executor: X,
) -> Result<Store<TodoReducer>, StorageError>
where
    X: EffectExecutor<TodoEffect, TodoAction> + 'static,
{
    match repository.load() {
        Ok(existing) => Ok(start(existing.unwrap_or_default(), executor)),
        Err(error) => {
            let kept = repository.set_aside()?;
            tracing::warn!(
                error = %error,
                kept = ?kept,
                "Stored todo list is unreadable, starting empty"
            );
            Ok(start(Vec::new(), executor))
        },
    }
}

fn start<X>(existing: Vec<TodoItem>, executor: X) -> Store<TodoReducer>
where
    X: EffectExecutor<TodoEffect, TodoAction> + 'static,
{
    tracing::info!(items = existing.len(), "Restored todo list");
    Store::new(initialize(existing), TodoReducer::new(), executor)
}
