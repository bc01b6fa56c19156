//! Action handler registration and dispatch.
//!
//! The dispatcher is the failure-isolation boundary of the engine: an
//! unknown action id or a handler error is logged and recorded in the
//! outcome, never propagated back to the event producer or allowed to block
//! sibling rule executions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use courtyard_workflow::{NotificationRequest, WorkflowEvent};
use tracing::{error, warn};

use crate::bus::EventBus;
use crate::error::ActionError;
use crate::sink::NotificationSink;

/// Capabilities handed to an action handler.
///
/// Handlers get exactly two engine-facing capabilities: publishing follow-up
/// events (chaining) and emitting notification requests. A published event
/// is delivered asynchronously even though `publish` returns immediately.
#[derive(Clone)]
pub struct ActionContext {
  bus: Arc<EventBus>,
  sink: Arc<dyn NotificationSink>,
}

impl ActionContext {
  pub fn new(bus: Arc<EventBus>, sink: Arc<dyn NotificationSink>) -> Self {
    Self { bus, sink }
  }

  /// Emit a follow-up event onto the bus.
  pub fn publish(&self, event: WorkflowEvent) {
    self.bus.publish(event);
  }

  /// Hand a notification request to the external sink.
  pub fn notify(&self, request: NotificationRequest) {
    self.sink.send(request);
  }
}

/// A named side-effect handler invoked when a rule matches.
///
/// The engine keeps event payloads opaque; each handler validates and
/// narrows the specific fields it consumes, so schema assumptions live at
/// the edge rather than inside the routing core.
#[async_trait]
pub trait ActionHandler: Send + Sync {
  async fn handle(&self, ctx: &ActionContext, event: &WorkflowEvent) -> Result<(), ActionError>;
}

/// Outcome of one dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
  /// Handler ran to completion.
  Completed,
  /// No handler is registered for the action id.
  UnknownAction,
  /// Handler returned an error; contained here.
  Failed,
}

/// Maps action identifiers to registered handlers and invokes them.
pub struct ActionDispatcher {
  handlers: RwLock<HashMap<String, Arc<dyn ActionHandler>>>,
  context: ActionContext,
}

impl ActionDispatcher {
  pub fn new(context: ActionContext) -> Self {
    Self {
      handlers: RwLock::new(HashMap::new()),
      context,
    }
  }

  /// Register a handler. Re-registering an action id replaces the handler.
  pub fn register_handler(&self, action_id: impl Into<String>, handler: Arc<dyn ActionHandler>) {
    self
      .handlers
      .write()
      .unwrap_or_else(|e| e.into_inner())
      .insert(action_id.into(), handler);
  }

  pub fn has_handler(&self, action_id: &str) -> bool {
    self
      .handlers
      .read()
      .unwrap_or_else(|e| e.into_inner())
      .contains_key(action_id)
  }

  /// Invoke the handler registered for `action_id` with the event.
  ///
  /// Never panics or propagates: an unknown action warns and returns
  /// [`DispatchOutcome::UnknownAction`]; a handler error is logged with the
  /// rule and event ids and returns [`DispatchOutcome::Failed`].
  pub async fn dispatch(
    &self,
    action_id: &str,
    rule_id: &str,
    event: &WorkflowEvent,
  ) -> DispatchOutcome {
    // Clone the Arc out so the lock is not held across the await.
    let handler = self
      .handlers
      .read()
      .unwrap_or_else(|e| e.into_inner())
      .get(action_id)
      .cloned();

    let Some(handler) = handler else {
      warn!(
        action = action_id,
        rule_id,
        event_id = %event.id,
        "no handler registered for action, skipping"
      );
      return DispatchOutcome::UnknownAction;
    };

    match handler.handle(&self.context, event).await {
      Ok(()) => DispatchOutcome::Completed,
      Err(e) => {
        error!(
          action = action_id,
          rule_id,
          event_id = %event.id,
          error = %e,
          "action handler failed"
        );
        DispatchOutcome::Failed
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::Map;
  use std::sync::Mutex;

  use crate::sink::{ChannelSink, NoopSink};

  struct Recorder {
    seen: Mutex<Vec<String>>,
  }

  #[async_trait]
  impl ActionHandler for Recorder {
    async fn handle(&self, _ctx: &ActionContext, event: &WorkflowEvent) -> Result<(), ActionError> {
      self.seen.lock().unwrap().push(event.id.clone());
      Ok(())
    }
  }

  struct Failing;

  #[async_trait]
  impl ActionHandler for Failing {
    async fn handle(
      &self,
      _ctx: &ActionContext,
      _event: &WorkflowEvent,
    ) -> Result<(), ActionError> {
      Err(ActionError::handler("intentional failure"))
    }
  }

  fn dispatcher() -> ActionDispatcher {
    let context = ActionContext::new(Arc::new(EventBus::new()), Arc::new(NoopSink));
    ActionDispatcher::new(context)
  }

  fn event() -> WorkflowEvent {
    WorkflowEvent::new("payment.overdue", "payments", Map::new())
  }

  #[tokio::test]
  async fn test_dispatch_invokes_registered_handler() {
    let dispatcher = dispatcher();
    let recorder = Arc::new(Recorder {
      seen: Mutex::new(Vec::new()),
    });
    dispatcher.register_handler("send.reminder", Arc::clone(&recorder) as Arc<dyn ActionHandler>);

    let event = event();
    let outcome = dispatcher.dispatch("send.reminder", "r1", &event).await;

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(*recorder.seen.lock().unwrap(), vec![event.id]);
  }

  #[tokio::test]
  async fn test_unknown_action_is_noop() {
    let dispatcher = dispatcher();
    let outcome = dispatcher.dispatch("no.such.action", "r1", &event()).await;
    assert_eq!(outcome, DispatchOutcome::UnknownAction);
  }

  #[tokio::test]
  async fn test_handler_error_is_contained() {
    let dispatcher = dispatcher();
    dispatcher.register_handler("explode", Arc::new(Failing));

    let outcome = dispatcher.dispatch("explode", "r1", &event()).await;
    assert_eq!(outcome, DispatchOutcome::Failed);
  }

  #[tokio::test]
  async fn test_handler_can_publish_and_notify() {
    struct Chaining;

    #[async_trait]
    impl ActionHandler for Chaining {
      async fn handle(&self, ctx: &ActionContext, event: &WorkflowEvent) -> Result<(), ActionError> {
        ctx.publish(WorkflowEvent::new(
          "expense.created",
          "workflow",
          event.payload.clone(),
        ));
        ctx.notify(NotificationRequest {
          channel: courtyard_workflow::Channel::Email,
          recipients: vec!["committee@x.com".to_string()],
          template: "expense.created".to_string(),
          data: event.payload.clone(),
        });
        Ok(())
      }
    }

    let bus = Arc::new(EventBus::new());
    let mut subscription = bus.subscribe();
    let (sink, mut notifications) = ChannelSink::pair();
    let dispatcher = ActionDispatcher::new(ActionContext::new(Arc::clone(&bus), Arc::new(sink)));
    dispatcher.register_handler("create.expense", Arc::new(Chaining));

    let outcome = dispatcher.dispatch("create.expense", "r3", &event()).await;
    assert_eq!(outcome, DispatchOutcome::Completed);

    assert_eq!(
      subscription.receiver.recv().await.unwrap().event_type,
      "expense.created"
    );
    assert_eq!(
      notifications.recv().await.unwrap().template,
      "expense.created"
    );
  }

  #[tokio::test]
  async fn test_reregistering_handler_replaces_it() {
    let dispatcher = dispatcher();
    dispatcher.register_handler("send.reminder", Arc::new(Failing));
    let recorder = Arc::new(Recorder {
      seen: Mutex::new(Vec::new()),
    });
    dispatcher.register_handler("send.reminder", Arc::clone(&recorder) as Arc<dyn ActionHandler>);

    let outcome = dispatcher.dispatch("send.reminder", "r1", &event()).await;
    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(recorder.seen.lock().unwrap().len(), 1);
  }
}
