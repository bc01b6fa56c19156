use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Delivery channel understood by the notification sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
  Email,
  Sms,
  Push,
  Inapp,
}

/// The atomic output of most action handlers.
///
/// Handed to the external notification sink; delivery, retries, and provider
/// integration belong to the sink, not the engine. The engine never retries
/// a request on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
  pub channel: Channel,

  /// Addresses in whatever form the channel expects (emails, phone numbers,
  /// device tokens, member ids).
  pub recipients: Vec<String>,

  /// Template name or subject line the sink renders the message from.
  pub template: String,

  /// Template data, usually derived from the triggering event payload.
  #[serde(default)]
  pub data: Map<String, Value>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_channel_serializes_lowercase() {
    assert_eq!(serde_json::to_value(Channel::Email).unwrap(), json!("email"));
    assert_eq!(serde_json::to_value(Channel::Inapp).unwrap(), json!("inapp"));
  }

  #[test]
  fn test_request_roundtrip() {
    let request = NotificationRequest {
      channel: Channel::Sms,
      recipients: vec!["+15550100".to_string()],
      template: "payment.reminder".to_string(),
      data: Map::new(),
    };

    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["channel"], "sms");
    assert_eq!(value["recipients"][0], "+15550100");
  }
}
