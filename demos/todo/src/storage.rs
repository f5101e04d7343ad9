//! Persistence collaborator: a local stash of the serialized item list.
//!
//! The stash is a plain JSON array of `{ id, text, completed }` records.
//! Calls are synchronous; the effect executor runs them inline.

use crate::error::StorageError;
use crate::types::TodoItem;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Get/set access to the stored item list
pub trait TodoRepository: Send + Sync {
    /// Read the stored list
    ///
    /// # Returns
    ///
    /// `None` when nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the stash cannot be read or decoded.
    fn load(&self) -> Result<Option<Vec<TodoItem>>, StorageError>;

    /// Replace the stored list
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the list cannot be encoded or written.
    fn save(&self, items: &[TodoItem]) -> Result<(), StorageError>;

    /// Move an unreadable stash out of the way so later saves keep it intact
    ///
    /// Returns where it went. Stashes that do not outlive the process have
    /// nothing to keep and return `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the stash cannot be moved.
    fn set_aside(&self) -> Result<Option<PathBuf>, StorageError> {
        Ok(None)
    }
}

/// Stores the list as a JSON file
///
/// Writes go to a sibling temporary file first and are renamed into place,
/// so a crash never leaves a truncated list behind.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    /// Creates a repository backed by `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the stash
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TodoRepository for JsonFileRepository {
    fn load(&self) -> Result<Option<Vec<TodoItem>>, StorageError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        if contents.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, items: &[TodoItem]) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(items)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, json)?;
        std::fs::rename(&staging, &self.path)?;

        tracing::trace!(path = %self.path.display(), items = items.len(), "Wrote todo list");
        Ok(())
    }

    fn set_aside(&self) -> Result<Option<PathBuf>, StorageError> {
        let target = self.path.with_extension("json.corrupt");
        std::fs::rename(&self.path, &target)?;

        tracing::warn!(
            from = %self.path.display(),
            to = %target.display(),
            "Set aside unreadable todo list"
        );
        Ok(Some(target))
    }
}

/// Keeps the serialized list in memory
///
/// Behaves like the file stash (the list still goes through JSON) without
/// touching the disk. Used when no storage path is configured, and in tests.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    slot: Mutex<Option<String>>,
}

impl InMemoryRepository {
    /// Creates an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository that already holds `items`
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if the items cannot be encoded.
    pub fn with_items(items: &[TodoItem]) -> Result<Self, StorageError> {
        let repository = Self::new();
        repository.save(items)?;
        Ok(repository)
    }

    /// The raw stored JSON, if any
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Store raw text as-is, bypassing encoding
    pub fn set_raw(&self, raw: impl Into<String>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw.into());
    }
}

impl TodoRepository for InMemoryRepository {
    fn load(&self) -> Result<Option<Vec<TodoItem>>, StorageError> {
        self.raw()
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(StorageError::from)
    }

    fn save(&self, items: &[TodoItem]) -> Result<(), StorageError> {
        let json = serde_json::to_string(items)?;
        self.set_raw(json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TodoId;

    fn items() -> Vec<TodoItem> {
        vec![
            TodoItem::new(TodoId::new(1), "buy milk"),
            TodoItem {
                id: TodoId::new(2),
                text: String::new(),
                completed: true,
            },
        ]
    }

    #[test]
    fn test_missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let repository = JsonFileRepository::new(dir.path().join("todos.json"));

        assert!(repository.load().unwrap().is_none());
    }

    #[test]
    fn test_file_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let repository = JsonFileRepository::new(dir.path().join("nested").join("todos.json"));

        repository.save(&items()).unwrap();

        assert_eq!(repository.load().unwrap(), Some(items()));
        assert!(!repository.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_holds_plain_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todos.json");
        std::fs::write(
            &path,
            r#"[{"id": 1700000000000, "text": "from the browser", "completed": false}]"#,
        )
        .unwrap();

        let loaded = JsonFileRepository::new(&path).load().unwrap().unwrap();

        assert_eq!(loaded[0].id, TodoId::new(1_700_000_000_000));
        assert_eq!(loaded[0].text, "from the browser");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todos.json");
        std::fs::write(&path, "{ not a list").unwrap();

        let result = JsonFileRepository::new(&path).load();

        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[test]
    fn test_set_aside_keeps_corrupt_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todos.json");
        std::fs::write(&path, "{ not a list").unwrap();
        let repository = JsonFileRepository::new(&path);

        let moved = repository.set_aside().unwrap().unwrap();

        assert_eq!(moved, dir.path().join("todos.json.corrupt"));
        assert_eq!(std::fs::read_to_string(&moved).unwrap(), "{ not a list");
        assert!(repository.load().unwrap().is_none());
    }

    #[test]
    fn test_in_memory_round_trip() {
        let repository = InMemoryRepository::new();
        assert!(repository.load().unwrap().is_none());

        repository.save(&items()).unwrap();

        assert_eq!(repository.load().unwrap(), Some(items()));
        assert!(repository.raw().unwrap().starts_with('['));
    }

    #[test]
    fn test_in_memory_corrupt_value() {
        let repository = InMemoryRepository::new();
        repository.set_raw("garbage");

        assert!(matches!(
            repository.load(),
            Err(StorageError::Serialization(_))
        ));
    }
}
