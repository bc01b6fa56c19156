//! Notification sink boundary.
//!
//! The engine only constructs notification requests; delivery, retries, and
//! provider integration belong to the sink implementation (email/SMS/push
//! gateway, in-app inbox, ...).

use courtyard_workflow::NotificationRequest;
use tokio::sync::mpsc;

/// Receives notification requests produced by action handlers.
///
/// Implementations decide what to do with them (deliver, queue, log,
/// ignore). `send` is fire-and-forget from the engine's side.
pub trait NotificationSink: Send + Sync {
  fn send(&self, request: NotificationRequest);
}

/// Discards all requests.
///
/// Useful for tests and for engines running without delivery wired up.
#[derive(Debug, Clone, Default)]
pub struct NoopSink;

impl NotificationSink for NoopSink {
  fn send(&self, _request: NotificationRequest) {
    // Intentionally empty
  }
}

/// Forwards requests into an unbounded channel.
///
/// Unbounded so a slow consumer cannot stall action handlers; volume is one
/// request per fired notification rule, so growth stays small in practice.
#[derive(Debug, Clone)]
pub struct ChannelSink {
  sender: mpsc::UnboundedSender<NotificationRequest>,
}

impl ChannelSink {
  pub fn new(sender: mpsc::UnboundedSender<NotificationRequest>) -> Self {
    Self { sender }
  }

  /// Create a sink together with its receiving end.
  pub fn pair() -> (Self, mpsc::UnboundedReceiver<NotificationRequest>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self { sender }, receiver)
  }
}

impl NotificationSink for ChannelSink {
  fn send(&self, request: NotificationRequest) {
    // Ignore send errors - the consumer may have been dropped
    let _ = self.sender.send(request);
  }
}
