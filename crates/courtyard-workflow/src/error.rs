use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("rule id must not be empty")]
  EmptyRuleId,

  #[error("rule '{rule_id}' has an empty trigger")]
  EmptyTrigger { rule_id: String },

  #[error("rule '{rule_id}' has an empty action")]
  EmptyAction { rule_id: String },
}
