//! Domain types for the todo list.
//!
//! A todo list is an ordered sequence of items that can be added, toggled,
//! removed and edited in place. At most one item is edited at a time.

use mvu_macros::Message;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Unique identifier for a todo item
///
/// Serialized as a bare number. Ids are handed out by [`TodoState`] from a
/// monotonic counter and never reused.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TodoId(u64);

impl TodoId {
    /// The id given to the first item of an empty list
    pub const FIRST: Self = Self(1);

    /// Creates a `TodoId` from its numeric value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The id following this one, or `None` past `u64::MAX`
    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for TodoId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A single todo item
///
/// This is also the persisted record: `{ "id", "text", "completed" }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Unique identifier
    pub id: TodoId,
    /// Free text, possibly empty
    pub text: String,
    /// Whether the item is done
    pub completed: bool,
}

impl TodoItem {
    /// Creates an open todo item
    #[must_use]
    pub fn new(id: TodoId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
        }
    }
}

/// State of the todo list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoState {
    /// Items in insertion order
    pub items: Vec<TodoItem>,
    /// The item currently being edited, if any
    ///
    /// When set, it references an item present in `items`.
    pub editing_id: Option<TodoId>,
    /// Id given to the next added item
    ///
    /// `None` once the id space is used up; further adds are refused.
    pub next_id: Option<TodoId>,
}

impl TodoState {
    /// Creates an empty todo list
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            editing_id: None,
            next_id: Some(TodoId::FIRST),
        }
    }

    /// Creates a list holding `items`, with nothing under edit
    ///
    /// Fresh ids continue after the largest id present.
    #[must_use]
    pub fn from_items(items: Vec<TodoItem>) -> Self {
        let next_id = items
            .iter()
            .map(|item| item.id)
            .max()
            .map_or(Some(TodoId::FIRST), TodoId::next);

        Self {
            items,
            editing_id: None,
            next_id,
        }
    }

    /// Returns the number of items
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Returns the number of completed items
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|item| item.completed).count()
    }

    /// Returns an item by id
    #[must_use]
    pub fn get(&self, id: TodoId) -> Option<&TodoItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Checks if an item exists
    #[must_use]
    pub fn exists(&self, id: TodoId) -> bool {
        self.get(id).is_some()
    }

    /// The item under edit
    #[must_use]
    pub fn editing(&self) -> Option<&TodoItem> {
        self.editing_id.and_then(|id| self.get(id))
    }
}

impl Default for TodoState {
    fn default() -> Self {
        Self::new()
    }
}

/// What the user means to do with the list
#[derive(Message, Clone, Debug, PartialEq, Eq)]
pub enum TodoAction {
    /// Append a new open item
    AddItem {
        /// Initial text, possibly empty
        text: String,
    },

    /// Flip the completion flag of an item
    ToggleComplete {
        /// Item to toggle
        id: TodoId,
    },

    /// Delete an item
    RemoveItem {
        /// Item to delete
        id: TodoId,
    },

    /// Begin editing an item
    StartEdit {
        /// Item to edit
        id: TodoId,
    },

    /// Replace the text of an item
    UpdateText {
        /// Item to change
        id: TodoId,
        /// New text
        text: String,
    },

    /// Stop editing
    EndEdit,
}

/// Work to perform after a transition
///
/// Serialized with its tag, e.g. `{ "action": "sync", "items": [...] }`.
#[derive(Message, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum TodoEffect {
    /// Persist and push the full item list
    Sync {
        /// Items after the transition
        items: Vec<TodoItem>,
    },
}
