//! Delayed dispatch scheduling.
//!
//! A delayed dispatch is a spawned timer task, not a held worker: the wait
//! is a pure time suspension, and the job only enters the worker queue once
//! its `fire_at` is reached. Pending dispatches are not durable across a
//! process restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use courtyard_workflow::{WorkflowEvent, WorkflowRule};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// A matched `(rule, event)` pair ready for action dispatch.
///
/// The event is a frozen copy captured at match time, so a delayed dispatch
/// never observes later payload mutation.
#[derive(Debug, Clone)]
pub struct DispatchJob {
  pub rule: WorkflowRule,
  pub event: WorkflowEvent,
}

/// Handle for one pending delayed dispatch.
///
/// Cancellable until the moment it fires; cancelling after it has fired (or
/// cancelling twice) is a no-op.
#[derive(Debug, Clone)]
pub struct ScheduledDispatch {
  id: Uuid,
  rule_id: String,
  event_id: String,
  fire_at: Instant,
  token: CancellationToken,
}

impl ScheduledDispatch {
  pub fn id(&self) -> Uuid {
    self.id
  }

  pub fn rule_id(&self) -> &str {
    &self.rule_id
  }

  pub fn event_id(&self) -> &str {
    &self.event_id
  }

  /// Earliest instant the action dispatcher may be invoked.
  pub fn fire_at(&self) -> Instant {
    self.fire_at
  }

  /// Prevent the dispatch if it has not fired yet. Idempotent.
  pub fn cancel(&self) {
    self.token.cancel();
  }

  pub fn is_cancelled(&self) -> bool {
    self.token.is_cancelled()
  }
}

/// Owns the cancellable timers for delayed dispatches.
///
/// Due jobs are forwarded into the engine's worker queue; the scheduler
/// guarantees a job is never forwarded before its `fire_at`, with
/// best-effort promptness after it.
pub struct Scheduler {
  jobs: mpsc::UnboundedSender<DispatchJob>,
  pending: Arc<Mutex<HashMap<Uuid, ScheduledDispatch>>>,
}

impl Scheduler {
  /// Create a scheduler forwarding due jobs into the given queue.
  pub fn new(jobs: mpsc::UnboundedSender<DispatchJob>) -> Self {
    Self {
      jobs,
      pending: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// Schedule `job` to enter the dispatch queue after `delay`.
  ///
  /// Must be called from within a tokio runtime. The returned handle stays
  /// valid after firing; late cancellation is a no-op.
  pub fn schedule(&self, job: DispatchJob, delay: Duration) -> ScheduledDispatch {
    let token = CancellationToken::new();
    let dispatch = ScheduledDispatch {
      id: Uuid::new_v4(),
      rule_id: job.rule.id.clone(),
      event_id: job.event.id.clone(),
      fire_at: Instant::now() + delay,
      token: token.clone(),
    };

    self
      .pending
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .insert(dispatch.id, dispatch.clone());

    debug!(
      rule_id = %dispatch.rule_id,
      event_id = %dispatch.event_id,
      delay_ms = delay.as_millis() as u64,
      "scheduled delayed dispatch"
    );

    let jobs = self.jobs.clone();
    let pending = Arc::clone(&self.pending);
    let handle = dispatch.clone();
    tokio::spawn(async move {
      tokio::select! {
        _ = token.cancelled() => {
          debug!(
            rule_id = %handle.rule_id,
            event_id = %handle.event_id,
            "scheduled dispatch cancelled"
          );
        }
        _ = tokio::time::sleep_until(handle.fire_at) => {
          if jobs.send(job).is_err() {
            // Queue closed (engine shut down); drop rather than retry forever.
            warn!(
              rule_id = %handle.rule_id,
              event_id = %handle.event_id,
              "dispatch queue closed, dropping delayed dispatch"
            );
          }
        }
      }
      pending
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .remove(&handle.id);
    });

    dispatch
  }

  /// Number of dispatches still waiting on their timers.
  pub fn pending(&self) -> usize {
    self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
  }

  /// Handles for every pending dispatch, for inspection or cancellation.
  pub fn pending_dispatches(&self) -> Vec<ScheduledDispatch> {
    self
      .pending
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .values()
      .cloned()
      .collect()
  }

  /// Cancel every pending dispatch. Used at engine shutdown.
  pub fn cancel_all(&self) {
    for dispatch in self.pending_dispatches() {
      dispatch.cancel();
    }
  }
}
