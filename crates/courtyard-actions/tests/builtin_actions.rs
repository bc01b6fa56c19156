//! Full-stack scenarios: engine + built-in handlers, wired the way a
//! deployment would wire them.

use std::sync::Arc;
use std::time::Duration;

use courtyard_actions::{
  CommitteeConfig, ExpenseStore, MemoryExpenseStore, register_builtin_actions,
};
use courtyard_engine::{ChannelSink, EngineConfig, WorkflowEngine};
use courtyard_workflow::{
  Channel, Condition, NotificationRequest, WorkflowEvent, WorkflowRule,
};
use serde_json::{Map, Value, json};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

struct Fixture {
  engine: Arc<WorkflowEngine>,
  store: Arc<MemoryExpenseStore>,
  notifications: mpsc::UnboundedReceiver<NotificationRequest>,
  cancel: CancellationToken,
}

async fn fixture() -> Fixture {
  let (sink, notifications) = ChannelSink::pair();
  let engine = Arc::new(WorkflowEngine::new(EngineConfig::default(), Arc::new(sink)));
  let store = Arc::new(MemoryExpenseStore::new());
  register_builtin_actions(
    engine.dispatcher(),
    Arc::clone(&store) as Arc<dyn ExpenseStore>,
    CommitteeConfig {
      recipients: vec!["chair@x.com".to_string()],
      channel: Channel::Email,
    },
  );

  let cancel = CancellationToken::new();
  tokio::spawn(Arc::clone(&engine).start(cancel.clone()));
  // Let the spawned engine task run to its first await so the bus
  // subscription exists before tests publish.
  tokio::task::yield_now().await;

  Fixture {
    engine,
    store,
    notifications,
    cancel,
  }
}

fn payload(value: Value) -> Map<String, Value> {
  match value {
    Value::Object(map) => map,
    _ => panic!("payload fixture must be an object"),
  }
}

async fn settle() {
  tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test(start_paused = true)]
async fn test_overdue_payment_sends_email_reminder() {
  let mut fx = fixture().await;
  fx.engine
    .registry()
    .register(
      WorkflowRule::new("r1", "payment.overdue", "send.reminder").with_condition(
        Condition::FieldEquals {
          field: "overdueDays".to_string(),
          value: json!(5),
        },
      ),
    )
    .unwrap();

  fx.engine.publish(WorkflowEvent::new(
    "payment.overdue",
    "payments",
    payload(json!({"overdueDays": 5, "residentEmail": "a@x.com"})),
  ));
  settle().await;

  let request = fx.notifications.try_recv().unwrap();
  assert_eq!(request.channel, Channel::Email);
  assert_eq!(request.recipients, vec!["a@x.com".to_string()]);
  assert!(fx.notifications.try_recv().is_err());
  fx.cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_maintenance_approval_creates_expense_and_notifies_committee() {
  let mut fx = fixture().await;
  fx.engine
    .registry()
    .register(WorkflowRule::new("r3", "maintenance.approved", "create.expense"))
    .unwrap();
  fx.engine
    .registry()
    .register(WorkflowRule::new("r5", "expense.created", "notify.committee"))
    .unwrap();

  fx.engine.publish(WorkflowEvent::new(
    "maintenance.approved",
    "maintenance",
    payload(json!({"amount": 850, "category": "electrical"})),
  ));
  settle().await;

  let records = fx.store.records();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].category, "electrical");

  // The chained expense.created event reached the committee rule.
  let request = fx.notifications.try_recv().unwrap();
  assert_eq!(request.recipients, vec!["chair@x.com".to_string()]);
  assert_eq!(request.data["expenseId"], records[0].id.as_str());
  fx.cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_delayed_booking_reminder() {
  let mut fx = fixture().await;
  fx.engine
    .registry()
    .register(
      WorkflowRule::new("r2", "booking.reminder", "send.reminder")
        .with_delay_ms(24 * 60 * 60 * 1000),
    )
    .unwrap();

  fx.engine.publish(WorkflowEvent::new(
    "booking.reminder",
    "bookings",
    payload(json!({"residentEmail": "b@x.com", "template": "booking.reminder"})),
  ));
  settle().await;

  tokio::time::sleep(Duration::from_secs(23 * 60 * 60)).await;
  assert!(fx.notifications.try_recv().is_err());

  tokio::time::sleep(Duration::from_secs(2 * 60 * 60)).await;
  let request = fx.notifications.try_recv().unwrap();
  assert_eq!(request.template, "booking.reminder");
  fx.cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_failing_expense_does_not_block_committee_rule() {
  let mut fx = fixture().await;
  // create.expense will fail: no amount in the payload.
  fx.engine
    .registry()
    .register(WorkflowRule::new("r3", "maintenance.approved", "create.expense"))
    .unwrap();
  fx.engine
    .registry()
    .register(WorkflowRule::new("r4", "maintenance.approved", "notify.committee"))
    .unwrap();

  fx.engine.publish(WorkflowEvent::new(
    "maintenance.approved",
    "maintenance",
    payload(json!({"requestId": "m-3"})),
  ));
  settle().await;

  assert!(fx.store.records().is_empty());
  let request = fx.notifications.try_recv().unwrap();
  assert_eq!(request.recipients, vec!["chair@x.com".to_string()]);
  fx.cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_unregistered_rule_sends_nothing() {
  let mut fx = fixture().await;
  fx.engine
    .registry()
    .register(
      WorkflowRule::new("r1", "payment.overdue", "send.reminder").with_condition(
        Condition::FieldEquals {
          field: "overdueDays".to_string(),
          value: json!(5),
        },
      ),
    )
    .unwrap();
  assert!(fx.engine.registry().unregister("r1"));

  fx.engine.publish(WorkflowEvent::new(
    "payment.overdue",
    "payments",
    payload(json!({"overdueDays": 5, "residentEmail": "a@x.com"})),
  ));
  settle().await;

  assert!(fx.notifications.try_recv().is_err());
  fx.cancel.cancel();
}
