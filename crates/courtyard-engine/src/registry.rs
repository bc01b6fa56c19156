//! The table of registered workflow rules.

use std::sync::RwLock;

use courtyard_workflow::{WorkflowError, WorkflowRule};
use tracing::debug;

/// Holds the currently registered rules and answers trigger lookups.
///
/// Match results come back in registration order so that rules sharing a
/// trigger have a well-defined, reproducible order. Reads (`matching`,
/// `get`) proceed concurrently; register/unregister take the lock
/// exclusively.
#[derive(Default)]
pub struct RuleRegistry {
  rules: RwLock<Vec<WorkflowRule>>,
}

impl RuleRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a rule, validating it first.
  ///
  /// Re-registering an existing id replaces the prior definition in place,
  /// keeping its original match position. There is never more than one rule
  /// per id.
  pub fn register(&self, rule: WorkflowRule) -> Result<(), WorkflowError> {
    rule.validate()?;

    let mut rules = self.rules.write().unwrap_or_else(|e| e.into_inner());
    if let Some(existing) = rules.iter_mut().find(|r| r.id == rule.id) {
      debug!(rule_id = %rule.id, "replacing registered rule");
      *existing = rule;
    } else {
      debug!(rule_id = %rule.id, trigger = %rule.trigger, "registered rule");
      rules.push(rule);
    }
    Ok(())
  }

  /// Register a whole rule table, e.g. one deserialized from configuration.
  pub fn load(&self, table: Vec<WorkflowRule>) -> Result<(), WorkflowError> {
    for rule in table {
      self.register(rule)?;
    }
    Ok(())
  }

  /// Remove a rule by id. Returns whether a rule was removed.
  pub fn unregister(&self, id: &str) -> bool {
    let mut rules = self.rules.write().unwrap_or_else(|e| e.into_inner());
    let before = rules.len();
    rules.retain(|r| r.id != id);
    before != rules.len()
  }

  /// All enabled rules listening for `event_type`, in registration order.
  ///
  /// An unknown event type is not an error; it simply matches nothing.
  pub fn matching(&self, event_type: &str) -> Vec<WorkflowRule> {
    self
      .rules
      .read()
      .unwrap_or_else(|e| e.into_inner())
      .iter()
      .filter(|r| r.enabled && r.trigger == event_type)
      .cloned()
      .collect()
  }

  /// Look up a rule by id.
  pub fn get(&self, id: &str) -> Option<WorkflowRule> {
    self
      .rules
      .read()
      .unwrap_or_else(|e| e.into_inner())
      .iter()
      .find(|r| r.id == id)
      .cloned()
  }

  /// Number of registered rules, enabled or not.
  pub fn len(&self) -> usize {
    self.rules.read().unwrap_or_else(|e| e.into_inner()).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
