//! # Persistence & Audit Store
//!
//! The arbitration, execution, and budget cores never talk to a concrete
//! database. Instead they depend on the [`Store`] trait: a small
//! transactional surface plus typed append/query methods for the
//! append-mostly audit tables described in the data model (decisions, usage,
//! notifications, execution logs, circuit events, and configuration change
//! log rows).
//!
//! [`InMemoryStore`] is the reference implementation used by tests and by
//! standalone-mode clients that don't wire up a real database. It follows
//! the same `Arc<RwLock<Vec<_>>>` ledger idiom as
//! [`crate::cache::InMemoryCache`] and the gateway's `CostTrackingPlugin`.

use crate::arbitration::ArbitrationDecision;
use crate::budget::{BudgetNotification, UsageRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Errors surfaced by a [`Store`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store is unreachable or refused the operation.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
    /// A transaction was committed or rolled back twice, or used after close.
    #[error("transaction error: {message}")]
    Transaction { message: String },
}

/// A row recording the outcome of a single upstream dispatch attempt.
///
/// Written once per `ArbitrationEngine::execute` call (including fallback
/// attempts), independent of the `ArbitrationDecision` that chose the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: Uuid,
    pub decision_id: Uuid,
    pub tenant_id: String,
    pub model_id: String,
    pub provider_id: String,
    pub success: bool,
    pub fallback_used: bool,
    pub error_class: Option<String>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// A circuit breaker state-transition or failure event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerEvent {
    pub id: Uuid,
    pub circuit_id: String,
    pub kind: CircuitEventKind,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

/// The kind of event recorded against a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitEventKind {
    Closed,
    Opened,
    HalfOpen,
    Reset,
    ConfigUpdated,
    Failure,
}

/// A row recording a mutation to provider credentials/configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigChangeLog {
    pub id: Uuid,
    pub entity: String,
    pub entity_id: String,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

/// Transactional persistence boundary consumed by the arbitration, budget,
/// and circuit-breaker cores.
///
/// A real implementation wraps a relational/key-value store; `begin` starts
/// a unit of work, and the caller must `commit` or `rollback` it before
/// dropping the handle. The in-memory reference implementation treats every
/// operation as immediately durable and `begin`/`commit`/`rollback` as
/// no-ops, which is sufficient for the invariant the cores actually need:
/// a budget debit and the usage row that caused it land together or not at
/// all.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Begin a unit of work. Returns an opaque transaction id.
    async fn begin(&self) -> Result<Uuid, StoreError>;
    /// Commit a previously started transaction.
    async fn commit(&self, tx: Uuid) -> Result<(), StoreError>;
    /// Roll back a previously started transaction.
    async fn rollback(&self, tx: Uuid) -> Result<(), StoreError>;

    async fn append_decision(&self, decision: ArbitrationDecision) -> Result<(), StoreError>;
    async fn list_decisions(&self, tenant_id: &str) -> Result<Vec<ArbitrationDecision>, StoreError>;

    async fn append_usage(&self, usage: UsageRecord) -> Result<(), StoreError>;
    async fn list_usage(&self, tenant_id: &str) -> Result<Vec<UsageRecord>, StoreError>;
    /// `true` if a usage row with this id has already been recorded.
    async fn usage_exists(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn append_notification(
        &self,
        notification: BudgetNotification,
    ) -> Result<(), StoreError>;
    async fn list_notifications(&self, budget_id: Uuid) -> Result<Vec<BudgetNotification>, StoreError>;
    async fn mark_notification_read(&self, id: Uuid) -> Result<(), StoreError>;

    async fn append_execution_log(&self, log: ExecutionLog) -> Result<(), StoreError>;
    async fn append_circuit_event(&self, event: CircuitBreakerEvent) -> Result<(), StoreError>;
    async fn list_circuit_events(&self, circuit_id: &str) -> Result<Vec<CircuitBreakerEvent>, StoreError>;
    async fn append_config_change(&self, change: ConfigChangeLog) -> Result<(), StoreError>;
}

/// In-process [`Store`] backed by `Arc<RwLock<Vec<_>>>` ledgers, one per
/// table, the same idiom [`crate::cache::InMemoryCache`] uses for its
/// sharded entries.
#[derive(Default)]
pub struct InMemoryStore {
    decisions: RwLock<Vec<ArbitrationDecision>>,
    usage: RwLock<Vec<UsageRecord>>,
    usage_ids: RwLock<std::collections::HashSet<Uuid>>,
    notifications: RwLock<Vec<BudgetNotification>>,
    execution_logs: RwLock<Vec<ExecutionLog>>,
    circuit_events: RwLock<Vec<CircuitBreakerEvent>>,
    config_changes: RwLock<Vec<ConfigChangeLog>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait::async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Uuid, StoreError> {
        Ok(Uuid::new_v4())
    }

    async fn commit(&self, _tx: Uuid) -> Result<(), StoreError> {
        Ok(())
    }

    async fn rollback(&self, _tx: Uuid) -> Result<(), StoreError> {
        Ok(())
    }

    async fn append_decision(&self, decision: ArbitrationDecision) -> Result<(), StoreError> {
        self.decisions.write().await.push(decision);
        Ok(())
    }

    async fn list_decisions(&self, tenant_id: &str) -> Result<Vec<ArbitrationDecision>, StoreError> {
        Ok(self
            .decisions
            .read()
            .await
            .iter()
            .filter(|d| d.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn append_usage(&self, usage: UsageRecord) -> Result<(), StoreError> {
        let mut ids = self.usage_ids.write().await;
        if !ids.insert(usage.id) {
            return Ok(());
        }
        self.usage.write().await.push(usage);
        Ok(())
    }

    async fn list_usage(&self, tenant_id: &str) -> Result<Vec<UsageRecord>, StoreError> {
        Ok(self
            .usage
            .read()
            .await
            .iter()
            .filter(|u| u.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn usage_exists(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.usage_ids.read().await.contains(&id))
    }

    async fn append_notification(
        &self,
        notification: BudgetNotification,
    ) -> Result<(), StoreError> {
        self.notifications.write().await.push(notification);
        Ok(())
    }

    async fn list_notifications(&self, budget_id: Uuid) -> Result<Vec<BudgetNotification>, StoreError> {
        Ok(self
            .notifications
            .read()
            .await
            .iter()
            .filter(|n| n.budget_id == budget_id)
            .cloned()
            .collect())
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<(), StoreError> {
        let mut notifications = self.notifications.write().await;
        if let Some(n) = notifications.iter_mut().find(|n| n.id == id) {
            n.read = true;
        }
        Ok(())
    }

    async fn append_execution_log(&self, log: ExecutionLog) -> Result<(), StoreError> {
        self.execution_logs.write().await.push(log);
        Ok(())
    }

    async fn append_circuit_event(&self, event: CircuitBreakerEvent) -> Result<(), StoreError> {
        self.circuit_events.write().await.push(event);
        Ok(())
    }

    async fn list_circuit_events(&self, circuit_id: &str) -> Result<Vec<CircuitBreakerEvent>, StoreError> {
        Ok(self
            .circuit_events
            .read()
            .await
            .iter()
            .filter(|e| e.circuit_id == circuit_id)
            .cloned()
            .collect())
    }

    async fn append_config_change(&self, change: ConfigChangeLog) -> Result<(), StoreError> {
        self.config_changes.write().await.push(change);
        Ok(())
    }
}
