//! Built-in action handlers for the Courtyard workflow engine.
//!
//! Each handler narrows the payload fields it consumes and fails with a
//! descriptive [`ActionError`](courtyard_engine::ActionError) when a
//! required field is missing; the dispatcher contains those failures. The
//! routing core stays payload-agnostic.
//!
//! Handlers:
//! - `send.reminder` — emails the resident named in the payload
//! - `create.expense` — records a derived expense and chains `expense.created`
//! - `notify.committee` — notifies a configured committee recipient list

mod committee;
mod expense;
mod reminder;

use std::sync::Arc;

use courtyard_engine::ActionDispatcher;

pub use committee::{CommitteeConfig, NotifyCommittee};
pub use expense::{CreateExpense, ExpenseRecord, ExpenseStore, MemoryExpenseStore};
pub use reminder::SendReminder;

/// Register the built-in handlers under their conventional action ids.
pub fn register_builtin_actions(
  dispatcher: &ActionDispatcher,
  store: Arc<dyn ExpenseStore>,
  committee: CommitteeConfig,
) {
  dispatcher.register_handler("send.reminder", Arc::new(SendReminder));
  dispatcher.register_handler("create.expense", Arc::new(CreateExpense::new(store)));
  dispatcher.register_handler("notify.committee", Arc::new(NotifyCommittee::new(committee)));
}
