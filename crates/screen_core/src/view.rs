use std::collections::HashMap;

use shared::domain::EntityRecord;

/// Reactive state the rendering layer binds against. The entity reference is
/// replaced wholesale by the binding step, never partially patched.
#[derive(Debug, Clone, Default)]
pub struct ViewModel {
    pub entity: EntityRecord,
    /// Display label for the retire/unretire action, derived from the bound
    /// record's retired flag.
    pub retire_or_unretire: String,
    pub message_labels: HashMap<String, String>,
}

/// Notifications the controller publishes towards the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    /// The view model's entity was (re)bound; re-render the form.
    EntityBound,
    /// Leave the screen for the given page.
    Navigated { target: String },
    /// Show a message through the global error facility.
    ErrorMessage(String),
    /// Open the retire/unretire/delete confirmation dialog.
    ConfirmationRequested { element_id: String },
}
