//! View model for the inventory screen.
//!
//! [`render_model`] is a pure projection of [`InventoryState`]; the
//! [`std::fmt::Display`] impl turns it into the plain-text screen the `larder`
//! binary prints.

use crate::types::{FeedbackKind, InventoryState, Phase};
use std::fmt;

/// Shown while no session is ready
pub const LOADING_TEXT: &str = "Loading application...";

/// Shown instead of rows when the collection is empty
pub const EMPTY_HINT: &str = "No items in your refrigerator yet. Add some!";

/// Banner above the inventory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Banner {
    /// Text to show
    pub message: String,
    /// Tone
    pub kind: FeedbackKind,
}

/// Current contents of the add-item form
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormView {
    /// Name field
    pub name: String,
    /// Quantity field
    pub quantity: i64,
}

/// One inventory row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowView {
    /// Item identifier, for the delete control
    pub id: String,
    /// Item name
    pub name: String,
    /// Quantity
    pub quantity: i64,
    /// Formatted creation time; absent while the server timestamp is pending
    pub added_at: Option<String>,
    /// Accessible label of the delete control
    pub delete_label: String,
}

/// Everything the screen shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewModel {
    /// Waiting for a session
    Loading {
        /// Banner, e.g. an authentication failure
        feedback: Option<Banner>,
    },
    /// Signed in with a live inventory
    Active {
        /// Signed-in user
        user_id: String,
        /// Banner
        feedback: Option<Banner>,
        /// Add-item form
        form: FormView,
        /// Items, newest first
        rows: Vec<RowView>,
        /// Set when there are no rows
        empty_hint: Option<&'static str>,
    },
}

/// Projects state onto the screen
#[must_use]
pub fn render_model(state: &InventoryState) -> ViewModel {
    let feedback = state.feedback.as_ref().map(|f| Banner {
        message: f.message.clone(),
        kind: f.kind,
    });

    let user_id = match (state.phase, state.session.ready_user()) {
        (Phase::Active, Some(user_id)) => user_id.to_string(),
        _ => return ViewModel::Loading { feedback },
    };

    let rows: Vec<RowView> = state
        .items
        .iter()
        .map(|item| RowView {
            id: item.id.to_string(),
            name: item.name.clone(),
            quantity: item.quantity,
            added_at: item
                .created_at
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            delete_label: format!("Delete {}", item.name),
        })
        .collect();

    ViewModel::Active {
        user_id,
        feedback,
        form: FormView {
            name: state.form.name.clone(),
            quantity: state.form.quantity,
        },
        empty_hint: rows.is_empty().then_some(EMPTY_HINT),
        rows,
    }
}

impl fmt::Display for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            FeedbackKind::Success => "ok",
            FeedbackKind::Error => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

impl fmt::Display for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading { feedback } => {
                writeln!(f, "{LOADING_TEXT}")?;
                if let Some(banner) = feedback {
                    writeln!(f, "{banner}")?;
                }
                Ok(())
            },
            Self::Active {
                user_id,
                feedback,
                form,
                rows,
                empty_hint,
            } => {
                writeln!(f, "My Refrigerator Inventory")?;
                writeln!(f, "User ID: {user_id}")?;
                if let Some(banner) = feedback {
                    writeln!(f, "{banner}")?;
                }
                writeln!(f)?;
                writeln!(f, "Add item   name: \"{}\"   quantity: {}", form.name, form.quantity)?;
                writeln!(f)?;
                if let Some(hint) = empty_hint {
                    writeln!(f, "{hint}")?;
                }
                for (index, row) in rows.iter().enumerate() {
                    write!(f, "{:>3}. {} (x{})", index + 1, row.name, row.quantity)?;
                    if let Some(added_at) = &row.added_at {
                        write!(f, "   Added: {added_at}")?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            },
        }
    }
}
