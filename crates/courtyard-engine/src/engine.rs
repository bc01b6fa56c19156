//! Engine wiring: the match loop and the dispatch worker pool.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use courtyard_workflow::WorkflowEvent;
use futures::future::join_all;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::bus::{EventBus, Subscription};
use crate::dispatcher::{ActionContext, ActionDispatcher};
use crate::error::EngineError;
use crate::registry::RuleRegistry;
use crate::scheduler::{DispatchJob, Scheduler};
use crate::sink::NotificationSink;

/// Configuration for the workflow engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Number of dispatch workers draining the job queue. Clamped to at
  /// least 1.
  pub workers: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self { workers: 2 }
  }
}

/// The workflow automation engine.
///
/// Owns the event bus, rule registry, scheduler, and action dispatcher.
/// `start` runs a single match loop that drains the bus subscription in
/// publish order, gates each matched rule on its condition, and hands
/// passing rules to the worker pool (immediately, or via the scheduler when
/// the rule declares a delay).
///
/// Rules sharing a trigger are queued in registration order but may execute
/// on different workers concurrently; handlers must not rely on cross-rule
/// execution order.
pub struct WorkflowEngine {
  bus: Arc<EventBus>,
  registry: Arc<RuleRegistry>,
  dispatcher: Arc<ActionDispatcher>,
  scheduler: Scheduler,
  jobs_tx: mpsc::UnboundedSender<DispatchJob>,
  jobs_rx: StdMutex<Option<mpsc::UnboundedReceiver<DispatchJob>>>,
  config: EngineConfig,
}

impl WorkflowEngine {
  /// Create a new engine delivering notification requests to `sink`.
  pub fn new(config: EngineConfig, sink: Arc<dyn NotificationSink>) -> Self {
    let bus = Arc::new(EventBus::new());
    let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
    let context = ActionContext::new(Arc::clone(&bus), sink);

    Self {
      bus,
      registry: Arc::new(RuleRegistry::new()),
      dispatcher: Arc::new(ActionDispatcher::new(context)),
      scheduler: Scheduler::new(jobs_tx.clone()),
      jobs_tx,
      jobs_rx: StdMutex::new(Some(jobs_rx)),
      config: EngineConfig {
        workers: config.workers.max(1),
      },
    }
  }

  /// The event bus. Hand this to producing modules.
  pub fn bus(&self) -> &Arc<EventBus> {
    &self.bus
  }

  /// The rule table.
  pub fn registry(&self) -> &RuleRegistry {
    &self.registry
  }

  /// The action dispatcher, for handler registration.
  pub fn dispatcher(&self) -> &ActionDispatcher {
    &self.dispatcher
  }

  /// The delayed-dispatch scheduler, for inspection and cancellation.
  pub fn scheduler(&self) -> &Scheduler {
    &self.scheduler
  }

  /// Publish an event from a producing module.
  ///
  /// Convenience for `engine.bus().publish(event)`. Returns immediately;
  /// matching and dispatch happen asynchronously.
  pub fn publish(&self, event: WorkflowEvent) {
    self.bus.publish(event);
  }

  /// Run the match loop and dispatch workers until cancelled.
  ///
  /// Blocks until the cancellation token is triggered, then cancels pending
  /// scheduled dispatches and waits for the workers to drain. Calling
  /// `start` a second time returns [`EngineError::AlreadyStarted`].
  pub async fn start(self: Arc<Self>, cancel: CancellationToken) -> Result<(), EngineError> {
    let jobs_rx = self
      .jobs_rx
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .take()
      .ok_or(EngineError::AlreadyStarted)?;

    let subscription = self.bus.subscribe();
    info!(workers = self.config.workers, "starting workflow engine");

    // Workers share one receiver; a job runs on whichever worker takes it
    // first.
    let jobs_rx = Arc::new(Mutex::new(jobs_rx));
    let mut workers = Vec::with_capacity(self.config.workers);
    for worker_id in 0..self.config.workers {
      workers.push(tokio::spawn(run_worker(
        worker_id,
        Arc::clone(&self.dispatcher),
        Arc::clone(&jobs_rx),
        cancel.clone(),
      )));
    }

    self.run_match_loop(subscription, &cancel).await;

    self.scheduler.cancel_all();
    for result in join_all(workers).await {
      if let Err(e) = result {
        error!(error = %e, "dispatch worker panicked");
      }
    }

    info!("workflow engine stopped");
    Ok(())
  }

  /// Drain the bus subscription, matching each event as it arrives.
  ///
  /// Single-threaded on purpose: events from one producer are matched in
  /// publish order.
  async fn run_match_loop(&self, mut subscription: Subscription, cancel: &CancellationToken) {
    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!("workflow engine cancelled");
          break;
        }
        event = subscription.receiver.recv() => {
          match event {
            Some(event) => self.match_event(event),
            None => {
              // Bus dropped out from under us.
              warn!("event bus closed, stopping match loop");
              break;
            }
          }
        }
      }
    }
  }

  /// Match one event against the rule table and queue passing rules.
  fn match_event(&self, event: WorkflowEvent) {
    let matched = self.registry.matching(&event.event_type);
    debug!(
      event_id = %event.id,
      event_type = %event.event_type,
      matched = matched.len(),
      "matched event against rule table"
    );

    for rule in matched {
      if let Some(condition) = &rule.condition
        && !condition.matches(&event.payload)
      {
        debug!(
          rule_id = %rule.id,
          event_id = %event.id,
          "condition not satisfied, skipping rule"
        );
        continue;
      }

      let delay = rule.delay_ms.map(Duration::from_millis).unwrap_or_default();
      // Each rule gets its own frozen copy of the event.
      let job = DispatchJob {
        rule,
        event: event.clone(),
      };

      if delay.is_zero() {
        if self.jobs_tx.send(job).is_err() {
          warn!(event_id = %event.id, "dispatch queue closed, dropping job");
        }
      } else {
        self.scheduler.schedule(job, delay);
      }
    }
  }
}

/// Drain the shared job queue, dispatching one action at a time.
///
/// Handler invocation is the only point that may block; failure isolation
/// lives in the dispatcher, so a worker just moves to the next job.
async fn run_worker(
  worker_id: usize,
  dispatcher: Arc<ActionDispatcher>,
  jobs: Arc<Mutex<mpsc::UnboundedReceiver<DispatchJob>>>,
  cancel: CancellationToken,
) {
  loop {
    let job = {
      let mut receiver = jobs.lock().await;
      tokio::select! {
        _ = cancel.cancelled() => None,
        job = receiver.recv() => job,
      }
    };

    let Some(job) = job else {
      break;
    };

    debug!(
      worker_id,
      rule_id = %job.rule.id,
      event_id = %job.event.id,
      action = %job.rule.action,
      "dispatching action"
    );
    dispatcher
      .dispatch(&job.rule.action, &job.rule.id, &job.event)
      .await;
  }

  debug!(worker_id, "dispatch worker stopped");
}
