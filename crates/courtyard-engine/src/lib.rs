//! Courtyard Workflow Engine
//!
//! Cross-module workflow automation for the Courtyard platform. Independent
//! modules (payments, maintenance, bookings, membership, documents) announce
//! domain events on a shared bus; declarative rules match those events,
//! optionally gate on a condition and a delay, and dispatch side-effect
//! actions without any module depending directly on another.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        EventBus                             │
//! │  - publish(event) fans out to subscribers, never blocks     │
//! │  - subscribe() → channel-backed Subscription                │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     WorkflowEngine                          │
//! │  - match loop: RuleRegistry lookup + condition gate         │
//! │  - immediate jobs → worker queue                            │
//! │  - delayed jobs → Scheduler (cancellable timers)            │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ActionDispatcher                         │
//! │  - action id → registered ActionHandler                     │
//! │  - failures contained and logged, never propagated          │
//! │  - handlers may publish chained events / notifications      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use courtyard_engine::{EngineConfig, NoopSink, WorkflowEngine};
//! use courtyard_workflow::{WorkflowEvent, WorkflowRule};
//! use tokio_util::sync::CancellationToken;
//!
//! let engine = Arc::new(WorkflowEngine::new(EngineConfig::default(), Arc::new(NoopSink)));
//! engine.registry().register(WorkflowRule::new("r1", "payment.overdue", "send.reminder"))?;
//!
//! let cancel = CancellationToken::new();
//! tokio::spawn(Arc::clone(&engine).start(cancel.clone()));
//!
//! engine.publish(WorkflowEvent::new("payment.overdue", "payments", payload));
//! ```

mod bus;
mod dispatcher;
mod engine;
mod error;
mod registry;
mod scheduler;
mod sink;

pub use bus::{EventBus, Subscription, SubscriptionHandle};
pub use dispatcher::{ActionContext, ActionDispatcher, ActionHandler, DispatchOutcome};
pub use engine::{EngineConfig, WorkflowEngine};
pub use error::{ActionError, EngineError};
pub use registry::RuleRegistry;
pub use scheduler::{DispatchJob, ScheduledDispatch, Scheduler};
pub use sink::{ChannelSink, NoopSink, NotificationSink};
