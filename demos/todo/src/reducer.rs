//! Reducer logic for the todo list.
//!
//! Every transition that changes an item produces a single
//! [`TodoEffect::Sync`] carrying the resulting list. Edit-mode transitions
//! produce no effects. Actions referencing an absent id are silent no-ops.

use crate::types::{TodoAction, TodoEffect, TodoId, TodoItem, TodoState};
use mvu_core::reducer::{Reducer, Update};
use mvu_core::update;

/// Starting state and mount effects for a list restored from storage
///
/// The items are taken as-is, nothing is under edit. A non-empty list is
/// pushed once to the sync collaborator at mount; an empty one produces no
/// effects.
#[must_use]
pub fn initialize(existing: Vec<TodoItem>) -> Update<TodoState, TodoEffect> {
    let state = TodoState::from_items(existing);

    if state.items.is_empty() {
        Update::new(state)
    } else {
        TodoReducer::synced(state)
    }
}

/// Reducer for the todo list
#[derive(Clone, Copy, Debug, Default)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// The new state, followed by a sync of its items
    fn synced(state: TodoState) -> Update<TodoState, TodoEffect> {
        let items = state.items.clone();
        update!(state, TodoEffect::Sync { items })
    }

    /// Applies `change` to the item with `id`, or leaves the state alone if absent
    fn change_item<F>(state: &TodoState, id: TodoId, change: F) -> Update<TodoState, TodoEffect>
    where
        F: FnOnce(&mut TodoItem),
    {
        let Some(index) = state.items.iter().position(|item| item.id == id) else {
            return Update::new(state.clone());
        };

        let mut next = state.clone();
        change(&mut next.items[index]);
        Self::synced(next)
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Effect = TodoEffect;

    fn reduce(&self, state: &TodoState, action: TodoAction) -> Update<TodoState, TodoEffect> {
        match action {
            TodoAction::AddItem { text } => {
                let Some(id) = state.next_id else {
                    tracing::warn!("No todo ids left, ignoring add");
                    return Update::new(state.clone());
                };

                let mut next = state.clone();
                next.items.push(TodoItem::new(id, text));
                next.next_id = id.next();
                Self::synced(next)
            },

            TodoAction::ToggleComplete { id } => {
                Self::change_item(state, id, |item| item.completed = !item.completed)
            },

            TodoAction::UpdateText { id, text } => {
                Self::change_item(state, id, |item| item.text = text)
            },

            TodoAction::RemoveItem { id } => {
                if !state.exists(id) {
                    return Update::new(state.clone());
                }

                let mut next = state.clone();
                next.items.retain(|item| item.id != id);
                if next.editing_id == Some(id) {
                    next.editing_id = None;
                }
                Self::synced(next)
            },

            TodoAction::StartEdit { id } => {
                let mut next = state.clone();
                if state.exists(id) {
                    next.editing_id = Some(id);
                }
                update!(next)
            },

            TodoAction::EndEdit => update!(TodoState {
                editing_id: None,
                ..state.clone()
            }),
        }
    }
}
