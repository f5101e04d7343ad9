//! Tests for #[derive(Message)] macro

use mvu_core::message::Message;
use mvu_macros::Message;

#[derive(Message, Clone, Debug, PartialEq)]
enum TodoAction {
    AddItem {
        text: String,
    },

    ToggleComplete {
        id: u64,
    },

    #[tag = "end-edit"]
    StopEditing,

    Rename(u64, String),
}

#[derive(Message, Clone, Debug)]
enum TodoEffect<T> {
    Sync { items: Vec<T> },
}

#[test]
fn test_named_variant_tag() {
    let action = TodoAction::AddItem {
        text: "buy milk".to_string(),
    };
    assert_eq!(action.tag(), "add-item");
    assert_eq!(TodoAction::ToggleComplete { id: 1 }.tag(), "toggle-complete");
}

#[test]
fn test_tag_override() {
    assert_eq!(TodoAction::StopEditing.tag(), "end-edit");
}

#[test]
fn test_tuple_variant_tag() {
    assert_eq!(TodoAction::Rename(1, "x".to_string()).tag(), "rename");
}

#[test]
fn test_generic_enum_tag() {
    let effect = TodoEffect::Sync { items: vec![1_u8] };
    assert_eq!(effect.tag(), "sync");
}
