use async_trait::async_trait;
use courtyard_engine::{ActionContext, ActionError, ActionHandler};
use courtyard_workflow::{Channel, NotificationRequest, WorkflowEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Who the committee is and how it prefers to be reached.
///
/// Loaded from the society's settings alongside the rule table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitteeConfig {
  pub recipients: Vec<String>,
  #[serde(default = "default_channel")]
  pub channel: Channel,
}

fn default_channel() -> Channel {
  Channel::Email
}

/// Notifies the configured committee recipients about an event.
///
/// The template comes from the payload's `template` field when present,
/// `committee.notice` otherwise; the full payload travels as template data.
pub struct NotifyCommittee {
  config: CommitteeConfig,
}

impl NotifyCommittee {
  pub fn new(config: CommitteeConfig) -> Self {
    Self { config }
  }
}

#[async_trait]
impl ActionHandler for NotifyCommittee {
  async fn handle(&self, ctx: &ActionContext, event: &WorkflowEvent) -> Result<(), ActionError> {
    if self.config.recipients.is_empty() {
      return Err(ActionError::handler("committee recipient list is empty"));
    }

    let template = event
      .payload
      .get("template")
      .and_then(Value::as_str)
      .unwrap_or("committee.notice")
      .to_string();

    ctx.notify(NotificationRequest {
      channel: self.config.channel,
      recipients: self.config.recipients.clone(),
      template,
      data: event.payload.clone(),
    });

    info!(
      event_id = %event.id,
      recipients = self.config.recipients.len(),
      "queued committee notification"
    );
    Ok(())
  }
}
