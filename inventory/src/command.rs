//! Line commands for the `larder` terminal client.
//!
//! Each line typed at the prompt parses into a [`Command`], which then maps
//! onto an [`InventoryAction`] against the current state.

use crate::types::{InventoryAction, InventoryState, ItemId};
use thiserror::Error;

/// Text printed for `help`
pub const HELP: &str = "\
Commands:
  add <name> [quantity]   add an item (quantity defaults to 1)
  name <text>             set the form's name field
  qty <number>            set the form's quantity field
  submit                  add the item in the form
  rm <row|id>             delete an item by row number or id
  refresh                 reload the inventory
  retry                   retry sign-in
  dismiss                 clear the message banner
  help                    show this text
  quit                    exit";

/// A parsed input line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Add an item directly
    Add {
        /// Item name, possibly several words
        name: String,
        /// Quantity as typed
        quantity: i64,
    },
    /// Edit the form's name field
    Name(String),
    /// Edit the form's quantity field
    Quantity(String),
    /// Submit the form
    Submit,
    /// Delete by row number (1-based, as displayed)
    RemoveRow(usize),
    /// Delete by item id
    RemoveId(ItemId),
    /// Restart the subscription
    Refresh,
    /// Retry sign-in
    Retry,
    /// Clear the banner
    Dismiss,
    /// Print help
    Help,
    /// Exit the client
    Quit,
}

/// Input that is not a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Unrecognized verb
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),

    /// The verb needs an argument
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),

    /// Row number outside the displayed list
    #[error("there is no row {0}")]
    NoSuchRow(usize),
}

impl Command {
    /// Parses one input line; blank lines are `None`
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] for unknown verbs and missing arguments.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));

        let command = match verb.to_ascii_lowercase().as_str() {
            "add" => Self::parse_add(rest),
            "name" => Self::Name(rest.to_string()),
            "qty" | "quantity" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument("qty"));
                }
                Self::Quantity(rest.to_string())
            },
            "submit" => Self::Submit,
            "rm" | "delete" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument("rm"));
                }
                rest.parse::<usize>()
                    .map_or_else(|_| Self::RemoveId(ItemId::new(rest)), Self::RemoveRow)
            },
            "refresh" => Self::Refresh,
            "retry" => Self::Retry,
            "dismiss" => Self::Dismiss,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }

    /// `add Greek yogurt 3` is three yogurts; `add 7up` is one `7up`
    fn parse_add(rest: &str) -> Self {
        let split = rest
            .rsplit_once(char::is_whitespace)
            .and_then(|(name, last)| last.parse::<i64>().ok().map(|quantity| (name, quantity)));

        match split {
            Some((name, quantity)) => Self::Add {
                name: name.trim().to_string(),
                quantity,
            },
            None => Self::Add {
                name: rest.to_string(),
                quantity: 1,
            },
        }
    }

    /// The action this command sends; `Help` and `Quit` send none
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NoSuchRow`] when a row number is not on screen.
    pub fn into_action(self, state: &InventoryState) -> Result<Option<InventoryAction>, CommandError> {
        let action = match self {
            Self::Add { name, quantity } => InventoryAction::AddItem { name, quantity },
            Self::Name(name) => InventoryAction::SetName(name),
            Self::Quantity(text) => InventoryAction::SetQuantityText(text),
            Self::Submit => InventoryAction::SubmitForm,
            Self::RemoveRow(row) => {
                let item = row
                    .checked_sub(1)
                    .and_then(|index| state.items.get(index))
                    .ok_or(CommandError::NoSuchRow(row))?;
                InventoryAction::DeleteItem {
                    id: item.id.clone(),
                }
            },
            Self::RemoveId(id) => InventoryAction::DeleteItem { id },
            Self::Refresh => InventoryAction::Refresh,
            Self::Retry => InventoryAction::RetrySignIn,
            Self::Dismiss => InventoryAction::DismissFeedback,
            Self::Help | Self::Quit => return Ok(None),
        };
        Ok(Some(action))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Item;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(Command::parse("   "), Ok(None));
    }

    #[test]
    fn add_takes_trailing_quantity() {
        assert_eq!(
            parse("add Greek yogurt 3"),
            Command::Add {
                name: "Greek yogurt".into(),
                quantity: 3
            }
        );
        assert_eq!(
            parse("add Milk"),
            Command::Add {
                name: "Milk".into(),
                quantity: 1
            }
        );
        assert_eq!(
            parse("ADD Eggs -1"),
            Command::Add {
                name: "Eggs".into(),
                quantity: -1
            }
        );
    }

    #[test]
    fn bare_add_has_empty_name() {
        assert_eq!(
            parse("add"),
            Command::Add {
                name: String::new(),
                quantity: 1
            }
        );
    }

    #[test]
    fn rm_accepts_rows_and_ids() {
        assert_eq!(parse("rm 2"), Command::RemoveRow(2));
        assert_eq!(parse("rm abc123"), Command::RemoveId(ItemId::new("abc123")));
        assert_eq!(
            Command::parse("rm"),
            Err(CommandError::MissingArgument("rm"))
        );
    }

    #[test]
    fn unknown_verbs_are_rejected() {
        assert_eq!(
            Command::parse("frobnicate"),
            Err(CommandError::Unknown("frobnicate".into()))
        );
    }

    #[test]
    fn rows_resolve_against_displayed_items() {
        let state = InventoryState {
            items: vec![Item {
                id: ItemId::new("a1"),
                name: "Milk".into(),
                quantity: 1,
                created_at: None,
            }],
            ..InventoryState::default()
        };

        assert_eq!(
            Command::RemoveRow(1).into_action(&state),
            Ok(Some(InventoryAction::DeleteItem {
                id: ItemId::new("a1")
            }))
        );
        assert_eq!(
            Command::RemoveRow(0).into_action(&state),
            Err(CommandError::NoSuchRow(0))
        );
        assert_eq!(
            Command::RemoveRow(2).into_action(&state),
            Err(CommandError::NoSuchRow(2))
        );
    }

    #[test]
    fn quit_and_help_send_nothing() {
        let state = InventoryState::default();
        assert_eq!(Command::Quit.into_action(&state), Ok(None));
        assert_eq!(Command::Help.into_action(&state), Ok(None));
        assert_eq!(
            parse("qty 4").into_action(&state),
            Ok(Some(InventoryAction::SetQuantityText("4".into())))
        );
        assert_eq!(
            parse("retry").into_action(&state),
            Ok(Some(InventoryAction::RetrySignIn))
        );
    }
}
