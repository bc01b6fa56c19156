use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::error::WorkflowError;

/// A declarative binding from a trigger event type to an action.
///
/// Rules are created at engine configuration time, either from a static
/// table or administratively added and removed at runtime. Once a rule has
/// matched an event it is effectively immutable for that dispatch: the
/// engine captures a frozen copy of rule and payload at match time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRule {
  /// Stable identifier, unique among currently registered rules.
  pub id: String,

  /// Event type this rule listens for (exact match).
  pub trigger: String,

  /// Action identifier, resolved by the dispatcher to a handler at dispatch
  /// time.
  pub action: String,

  /// Optional predicate over the event payload. Absent means "always match".
  #[serde(skip_serializing_if = "Option::is_none")]
  pub condition: Option<Condition>,

  /// Delay before dispatch, measured from event receipt.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub delay_ms: Option<u64>,

  /// Disabled rules are skipped entirely during matching.
  #[serde(default = "default_enabled")]
  pub enabled: bool,
}

fn default_enabled() -> bool {
  true
}

impl WorkflowRule {
  /// Create an enabled rule with no condition and no delay.
  pub fn new(id: impl Into<String>, trigger: impl Into<String>, action: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      trigger: trigger.into(),
      action: action.into(),
      condition: None,
      delay_ms: None,
      enabled: true,
    }
  }

  /// Gate this rule on a condition.
  pub fn with_condition(mut self, condition: Condition) -> Self {
    self.condition = Some(condition);
    self
  }

  /// Delay dispatch by the given number of milliseconds.
  pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
    self.delay_ms = Some(delay_ms);
    self
  }

  /// Mark this rule disabled.
  pub fn disabled(mut self) -> Self {
    self.enabled = false;
    self
  }

  /// Validate the rule before registration.
  ///
  /// Registration is the one fail-fast boundary: a rule that cannot be
  /// matched meaningfully is rejected here with a descriptive error instead
  /// of being silently skipped later.
  pub fn validate(&self) -> Result<(), WorkflowError> {
    if self.id.trim().is_empty() {
      return Err(WorkflowError::EmptyRuleId);
    }
    if self.trigger.trim().is_empty() {
      return Err(WorkflowError::EmptyTrigger {
        rule_id: self.id.clone(),
      });
    }
    if self.action.trim().is_empty() {
      return Err(WorkflowError::EmptyAction {
        rule_id: self.id.clone(),
      });
    }
    Ok(())
  }
}
