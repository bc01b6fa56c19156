use async_trait::async_trait;
use courtyard_engine::{ActionContext, ActionError, ActionHandler};
use courtyard_workflow::{Channel, NotificationRequest, WorkflowEvent};
use serde_json::Value;
use tracing::info;

/// Emails the resident(s) named in the event payload.
///
/// Recipient resolution: a `recipients` array of strings wins; otherwise a
/// single `residentEmail` string. The template defaults to
/// `payment.reminder` unless the payload carries a `template` field. The
/// full payload is forwarded as template data.
pub struct SendReminder;

#[async_trait]
impl ActionHandler for SendReminder {
  async fn handle(&self, ctx: &ActionContext, event: &WorkflowEvent) -> Result<(), ActionError> {
    let recipients = recipients_from(event)?;
    let template = event
      .payload
      .get("template")
      .and_then(Value::as_str)
      .unwrap_or("payment.reminder")
      .to_string();

    ctx.notify(NotificationRequest {
      channel: Channel::Email,
      recipients,
      template,
      data: event.payload.clone(),
    });

    info!(event_id = %event.id, "queued reminder notification");
    Ok(())
  }
}

fn recipients_from(event: &WorkflowEvent) -> Result<Vec<String>, ActionError> {
  if let Some(list) = event.payload.get("recipients").and_then(Value::as_array) {
    let recipients: Vec<String> = list
      .iter()
      .filter_map(Value::as_str)
      .map(str::to_string)
      .collect();
    if !recipients.is_empty() {
      return Ok(recipients);
    }
  }

  event
    .payload
    .get("residentEmail")
    .and_then(Value::as_str)
    .map(|email| vec![email.to_string()])
    .ok_or_else(|| ActionError::missing_field("residentEmail"))
}
