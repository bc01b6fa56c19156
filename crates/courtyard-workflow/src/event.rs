use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An occurrence reported by a producing module.
///
/// Events are consumed by zero or more rule matches and are never persisted
/// by the engine itself; persistence, if any, is the producer's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvent {
  /// Unique identifier, generated at emission time.
  pub id: String,

  /// Dotted event kind, e.g. `payment.overdue`. Acts as the routing key.
  #[serde(rename = "type")]
  pub event_type: String,

  /// Name of the producing module, for diagnostics and filtering.
  pub module: String,

  /// Event-specific fields (amounts, identifiers, dates). Opaque to the
  /// engine.
  #[serde(default)]
  pub payload: Map<String, Value>,

  /// Creation time. Informative, but not ordering-authoritative across
  /// processes.
  pub timestamp: DateTime<Utc>,
}

impl WorkflowEvent {
  /// Create a new event with a fresh id and the current timestamp.
  pub fn new(
    event_type: impl Into<String>,
    module: impl Into<String>,
    payload: Map<String, Value>,
  ) -> Self {
    Self {
      id: uuid::Uuid::new_v4().to_string(),
      event_type: event_type.into(),
      module: module.into(),
      payload,
      timestamp: Utc::now(),
    }
  }
}
