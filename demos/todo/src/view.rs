//! Plain-text rendering and command parsing for the terminal front end.
//!
//! The view is a pure function of [`TodoState`]; user input becomes
//! [`TodoAction`]s through [`parse_command`].

use crate::types::{TodoAction, TodoId, TodoState};
use thiserror::Error;

/// Shown in place of an item with no text
pub const EMPTY_TEXT_PLACEHOLDER: &str = "(no text, use `text <id> ...`)";

/// Help text listing the commands
pub const HELP: &str = "\
Commands:
  add <text>        add an item
  new               add an empty item and start editing it
  toggle <id>       mark an item done / not done
  rm <id>           remove an item
  edit <id>         start editing an item
  text <id> <text>  replace the text of an item
  done              stop editing
  list              show the list
  help              show this help
  quit              exit";

/// One line of user input, interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Dispatch an action
    Dispatch(TodoAction),
    /// Add an empty item and edit it right away
    New,
    /// Render the list
    List,
    /// Print the help
    Help,
    /// Leave the application
    Quit,
}

/// Input that is not a valid command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The first word is not a command
    #[error("Unknown command `{0}`, try `help`")]
    Unknown(String),

    /// A required argument is missing
    #[error("`{command}` needs {argument}")]
    MissingArgument {
        /// Command name
        command: &'static str,
        /// What is missing
        argument: &'static str,
    },

    /// An id argument is not a number
    #[error("`{0}` is not an item id")]
    InvalidId(String),
}

/// Parse one line of input
///
/// Blank lines render the list.
///
/// # Errors
///
/// Returns [`CommandError`] for unknown commands and bad arguments.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match word {
        "" | "list" | "ls" => Command::List,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        "new" => Command::New,
        "done" => Command::Dispatch(TodoAction::EndEdit),
        "add" => Command::Dispatch(TodoAction::AddItem {
            text: rest.to_string(),
        }),
        "toggle" => Command::Dispatch(TodoAction::ToggleComplete {
            id: parse_id("toggle", rest)?,
        }),
        "rm" | "remove" => Command::Dispatch(TodoAction::RemoveItem {
            id: parse_id("rm", rest)?,
        }),
        "edit" => Command::Dispatch(TodoAction::StartEdit {
            id: parse_id("edit", rest)?,
        }),
        "text" => {
            let (id, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            Command::Dispatch(TodoAction::UpdateText {
                id: parse_id("text", id)?,
                text: text.trim().to_string(),
            })
        },
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(command)
}

fn parse_id(command: &'static str, arg: &str) -> Result<TodoId, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument {
            command,
            argument: "an item id",
        });
    }
    arg.parse()
        .map_err(|_| CommandError::InvalidId(arg.to_string()))
}

/// Render the list
///
/// ```text
/// Todo list (1/2 done)
///   [x]  1  buy milk
/// > [ ]  2  (no text, use `text <id> ...`)
/// ```
///
/// The `>` marks the item under edit.
#[must_use]
pub fn render(state: &TodoState) -> String {
    let mut out = format!(
        "Todo list ({}/{} done)\n",
        state.completed_count(),
        state.count()
    );

    if state.items.is_empty() {
        out.push_str("  (nothing to do, try `add <text>`)\n");
        return out;
    }

    for item in &state.items {
        let marker = if state.editing_id == Some(item.id) { '>' } else { ' ' };
        let check = if item.completed { 'x' } else { ' ' };
        let text = if item.text.is_empty() {
            EMPTY_TEXT_PLACEHOLDER
        } else {
            item.text.as_str()
        };
        out.push_str(&format!("{marker} [{check}] {:>2}  {text}\n", item.id));
    }

    out
}
