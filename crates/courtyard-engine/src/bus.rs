//! Process-wide publish/subscribe channel for workflow events.
//!
//! The bus carries no business logic. `publish` clones the event into each
//! subscriber's unbounded channel and returns immediately, so a slow
//! subscriber never blocks a producing module.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use courtyard_workflow::WorkflowEvent;
use tokio::sync::mpsc;
use tracing::debug;

/// Identifies one subscription for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

/// A live subscription: the handle plus the receiving end of the channel.
///
/// Events published after `subscribe` arrive on `receiver` in publish
/// order. Dropping the receiver is equivalent to unsubscribing; the bus
/// prunes the dead entry on the next publish.
pub struct Subscription {
  pub handle: SubscriptionHandle,
  pub receiver: mpsc::UnboundedReceiver<WorkflowEvent>,
}

struct Subscriber {
  id: u64,
  sender: mpsc::UnboundedSender<WorkflowEvent>,
}

/// Fan-out event bus.
///
/// Delivery is at-least-once per subscriber registered at the moment of
/// `publish`; subscribers registered afterwards do not receive that event.
/// The subscriber list is the only state: reads proceed concurrently,
/// subscribe/unsubscribe take the lock exclusively.
#[derive(Default)]
pub struct EventBus {
  subscribers: RwLock<Vec<Subscriber>>,
  next_id: AtomicU64,
}

impl EventBus {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a subscriber and return its handle and event channel.
  pub fn subscribe(&self) -> Subscription {
    let (sender, receiver) = mpsc::unbounded_channel();
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    self
      .subscribers
      .write()
      .unwrap_or_else(|e| e.into_inner())
      .push(Subscriber { id, sender });

    Subscription {
      handle: SubscriptionHandle(id),
      receiver,
    }
  }

  /// Remove a subscription. Idempotent; unknown handles are ignored.
  pub fn unsubscribe(&self, handle: SubscriptionHandle) {
    self
      .subscribers
      .write()
      .unwrap_or_else(|e| e.into_inner())
      .retain(|s| s.id != handle.0);
  }

  /// Publish an event to every currently registered subscriber.
  ///
  /// Never blocks on subscriber execution: the event is queued on each
  /// subscriber's channel and handled asynchronously.
  pub fn publish(&self, event: WorkflowEvent) {
    let mut closed = Vec::new();
    {
      let subscribers = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
      for subscriber in subscribers.iter() {
        if subscriber.sender.send(event.clone()).is_err() {
          closed.push(subscriber.id);
        }
      }
    }

    if !closed.is_empty() {
      // Receivers that went away without unsubscribing.
      self
        .subscribers
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .retain(|s| !closed.contains(&s.id));
      debug!(pruned = closed.len(), "removed closed bus subscriptions");
    }
  }

  /// Number of currently registered subscribers.
  pub fn subscriber_count(&self) -> usize {
    self
      .subscribers
      .read()
      .unwrap_or_else(|e| e.into_inner())
      .len()
  }
}
