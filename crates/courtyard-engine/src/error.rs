use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  /// `start` was called more than once on the same engine.
  #[error("engine already started")]
  AlreadyStarted,
}

/// Error returned by an action handler.
///
/// Handler errors are caught at the dispatcher boundary, logged with the
/// rule and event ids, and never propagated to the event producer.
#[derive(Debug, Error)]
pub enum ActionError {
  #[error("payload field '{field}' is missing or invalid")]
  MissingField { field: String },

  #[error("{0}")]
  Handler(String),
}

impl ActionError {
  /// Shorthand for a payload field the handler requires but cannot narrow.
  pub fn missing_field(field: impl Into<String>) -> Self {
    Self::MissingField {
      field: field.into(),
    }
  }

  /// Wrap an arbitrary handler failure.
  pub fn handler(message: impl Into<String>) -> Self {
    Self::Handler(message.into())
  }
}
