//! Courtyard Workflow
//!
//! This crate contains the serializable types for the Courtyard workflow
//! automation engine: domain events, declarative rules, conditions, and
//! notification requests.
//!
//! Rule tables can be loaded from:
//! - JSON files shipped with a deployment
//! - Database storage (as JSON blobs), edited administratively at runtime
//!
//! The engine takes these types, validates them at registration, and routes
//! incoming events against them. Event payloads stay opaque here: the engine
//! never inspects payload structure except through a rule's declared
//! condition, and action handlers narrow the fields they consume.

mod condition;
mod error;
mod event;
mod notification;
mod rule;

pub use condition::Condition;
pub use error::WorkflowError;
pub use event::WorkflowEvent;
pub use notification::{Channel, NotificationRequest};
pub use rule::WorkflowRule;
