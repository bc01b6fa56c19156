use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courtyard_engine::{ActionContext, ActionError, ActionHandler};
use courtyard_workflow::WorkflowEvent;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::info;

/// A derived expense produced from an approved maintenance request (or any
/// other event carrying an `amount`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
  pub id: String,
  /// Id of the event this expense was derived from.
  pub source_event_id: String,
  pub category: String,
  pub amount: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Where derived expense records go.
///
/// The engine does not own persistence; implement this against the backing
/// store of the deployment (database table, hosted data store, ...).
#[async_trait]
pub trait ExpenseStore: Send + Sync {
  async fn create(&self, record: ExpenseRecord) -> Result<(), ActionError>;
}

/// In-memory store. Useful for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryExpenseStore {
  records: Mutex<Vec<ExpenseRecord>>,
}

impl MemoryExpenseStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn records(&self) -> Vec<ExpenseRecord> {
    self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }
}

#[async_trait]
impl ExpenseStore for MemoryExpenseStore {
  async fn create(&self, record: ExpenseRecord) -> Result<(), ActionError> {
    self
      .records
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .push(record);
    Ok(())
  }
}

/// Creates a derived expense record and chains an `expense.created` event.
///
/// Narrows `amount` (number, required), `category` (string, defaults to
/// `maintenance`), and `description` (string, optional) from the payload.
pub struct CreateExpense {
  store: Arc<dyn ExpenseStore>,
}

impl CreateExpense {
  pub fn new(store: Arc<dyn ExpenseStore>) -> Self {
    Self { store }
  }
}

#[async_trait]
impl ActionHandler for CreateExpense {
  async fn handle(&self, ctx: &ActionContext, event: &WorkflowEvent) -> Result<(), ActionError> {
    let amount = event
      .payload
      .get("amount")
      .and_then(Value::as_f64)
      .ok_or_else(|| ActionError::missing_field("amount"))?;
    let category = event
      .payload
      .get("category")
      .and_then(Value::as_str)
      .unwrap_or("maintenance")
      .to_string();
    let description = event
      .payload
      .get("description")
      .and_then(Value::as_str)
      .map(str::to_string);

    let record = ExpenseRecord {
      id: uuid::Uuid::new_v4().to_string(),
      source_event_id: event.id.clone(),
      category: category.clone(),
      amount,
      description,
      created_at: Utc::now(),
    };
    let expense_id = record.id.clone();
    self.store.create(record).await?;

    info!(
      event_id = %event.id,
      expense_id = %expense_id,
      amount,
      "created derived expense"
    );

    // Chain a follow-up event so other rules can react to the new record.
    let mut payload = Map::new();
    payload.insert("expenseId".to_string(), json!(expense_id));
    payload.insert("sourceEventId".to_string(), json!(event.id));
    payload.insert("amount".to_string(), json!(amount));
    payload.insert("category".to_string(), json!(category));
    ctx.publish(WorkflowEvent::new("expense.created", "workflow", payload));

    Ok(())
  }
}
