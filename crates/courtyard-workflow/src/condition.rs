use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A predicate over an event payload, gating whether a matched rule fires.
///
/// The set of shapes is deliberately closed; extend it when a concrete need
/// arises rather than growing an expression language. Evaluation is total:
/// a missing field or a mismatched type makes the condition false, never an
/// error, so a rule author's configuration mistake cannot take down the
/// engine or block other rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
  /// Field equals a literal value, e.g. `overdueDays == 5`.
  FieldEquals { field: String, value: Value },

  /// Field is present and truthy, e.g. `important == true`.
  FieldTruthy { field: String },
}

impl Condition {
  /// Evaluate against an event payload. Pure; never mutates the payload.
  pub fn matches(&self, payload: &Map<String, Value>) -> bool {
    match self {
      Condition::FieldEquals { field, value } => payload.get(field).is_some_and(|v| v == value),
      Condition::FieldTruthy { field } => payload.get(field).is_some_and(is_truthy),
    }
  }
}

/// JSON truthiness: null, false, zero, and empty collections are falsy.
fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    Value::String(s) => !s.is_empty(),
    Value::Array(a) => !a.is_empty(),
    Value::Object(o) => !o.is_empty(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn payload(value: Value) -> Map<String, Value> {
    match value {
      Value::Object(map) => map,
      _ => panic!("payload fixture must be an object"),
    }
  }

  #[test]
  fn test_field_equals_matches_literal() {
    let condition = Condition::FieldEquals {
      field: "overdueDays".to_string(),
      value: json!(5),
    };

    assert!(condition.matches(&payload(json!({"overdueDays": 5}))));
    assert!(!condition.matches(&payload(json!({"overdueDays": 15}))));
  }

  #[test]
  fn test_field_equals_missing_field_is_false() {
    let condition = Condition::FieldEquals {
      field: "overdueDays".to_string(),
      value: json!(5),
    };

    assert!(!condition.matches(&payload(json!({"amount": 100}))));
    assert!(!condition.matches(&Map::new()));
  }

  #[test]
  fn test_field_equals_type_mismatch_is_false() {
    let condition = Condition::FieldEquals {
      field: "overdueDays".to_string(),
      value: json!(5),
    };

    assert!(!condition.matches(&payload(json!({"overdueDays": "5"}))));
  }

  #[test]
  fn test_field_truthy() {
    let condition = Condition::FieldTruthy {
      field: "important".to_string(),
    };

    assert!(condition.matches(&payload(json!({"important": true}))));
    assert!(condition.matches(&payload(json!({"important": 1}))));
    assert!(condition.matches(&payload(json!({"important": "yes"}))));
    assert!(!condition.matches(&payload(json!({"important": false}))));
    assert!(!condition.matches(&payload(json!({"important": 0}))));
    assert!(!condition.matches(&payload(json!({"important": ""}))));
    assert!(!condition.matches(&payload(json!({"important": null}))));
    assert!(!condition.matches(&payload(json!({"other": true}))));
  }

  #[test]
  fn test_condition_deserializes_from_config() {
    let condition: Condition = serde_json::from_value(json!({
      "op": "field_equals",
      "field": "overdueDays",
      "value": 5,
    }))
    .unwrap();

    assert_eq!(
      condition,
      Condition::FieldEquals {
        field: "overdueDays".to_string(),
        value: json!(5),
      }
    );
  }
}
