//! # Budget & Usage Core
//!
//! Generalizes the gateway's `CostTrackingPlugin` (a flat `Arc<RwLock<Vec<_>>>`
//! cost log plus a per-provider cost calculator) into the full budget
//! lifecycle: create/update/delete/reset/rollover, at-most-once
//! usage recording, threshold notifications with cooldown, and linear-trend
//! forecasting.
//!
//! Usage recording and budget debiting are intentionally the same
//! operation (`record_usage`): the invariant the tests hold this module to
//! is that `budget.used` always equals the sum of applicable, currency
//! converted usage cost, and that recording the same usage id twice only
//! debits once.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{Store, StoreError};

/// Budget recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetPeriod {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annually,
}

/// The kind of LLM call a [`UsageRecord`] accounts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    ChatCompletion,
    StreamingChatCompletion,
    Embedding,
    Moderation,
}

/// The kind of threshold a [`BudgetNotification`] reports crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationType {
    Warning,
    Critical,
    OverBudget,
    Reset,
}

/// A tenant-scoped spending cap with a period and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub id: Uuid,
    pub tenant_id: String,
    pub project_id: Option<String>,
    pub user_id: Option<String>,
    pub period: BudgetPeriod,
    pub amount: f64,
    pub currency: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub used: f64,
    pub warning_threshold: f64,
    pub critical_threshold: f64,
    pub send_notifications: bool,
    pub last_updated: DateTime<Utc>,
}

impl BudgetAllocation {
    fn applies_to(&self, tenant_id: &str, project_id: Option<&str>, user_id: Option<&str>, at: DateTime<Utc>) -> bool {
        self.tenant_id == tenant_id
            && self.start <= at
            && at <= self.end
            && (self.project_id.is_none() || self.project_id.as_deref() == project_id)
            && (self.user_id.is_none() || self.user_id.as_deref() == user_id)
    }

    fn usage_fraction(&self) -> f64 {
        if self.amount <= 0.0 {
            return 0.0;
        }
        self.used / self.amount
    }
}

/// Immutable append-only usage row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: Uuid,
    pub tenant_id: String,
    pub project_id: Option<String>,
    pub user_id: String,
    pub model_id: String,
    pub provider_id: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost: f64,
    pub currency: String,
    pub processing_duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub success: bool,
    pub operation_type: OperationType,
    pub metadata: HashMap<String, String>,
}

/// A notification emitted when a budget crosses a threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetNotification {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub notification_type: NotificationType,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

/// Result of a pre-flight budget check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetCheckResult {
    pub allowed: bool,
    pub status: BudgetCheckStatus,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetCheckStatus {
    Ok,
    /// No matching active budget was found; requests default to allowed.
    NoBudget,
    Exceeded,
    /// The budget store itself failed; treated as fail-open rather than
    /// blocking every request on a degraded store.
    StoreUnavailable,
}

/// Linear-trend forecast of a budget's period-end usage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetForecast {
    pub daily_average: f64,
    pub forecasted_usage: f64,
    pub forecast_days: u32,
    pub confidence: f64,
}

/// The only external collaborator this module touches. Best-effort — send
/// failures never fail a debit.
#[async_trait::async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), String>;
}

/// An `EmailService` that drops everything; used when
/// `BudgetServiceOptions::send_email` is `false`.
pub struct NullEmailService;

#[async_trait::async_trait]
impl EmailService for NullEmailService {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("budget not found: {0}")]
    NotFound(Uuid),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Runtime options for [`BudgetService`], read through the same
/// `config`-crate loader as the rest of the gateway's configuration
/// surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetServiceOptions {
    pub send_email: bool,
    pub default_email: String,
    pub cooldown_hours: i64,
    pub max_forecast_days: u32,
    pub allow_rollover: bool,
    pub max_rollover_percentage: f64,
}

impl Default for BudgetServiceOptions {
    fn default() -> Self {
        Self {
            send_email: false,
            default_email: "ops@example.com".to_string(),
            cooldown_hours: 12,
            max_forecast_days: 90,
            allow_rollover: true,
            max_rollover_percentage: 0.2,
        }
    }
}

/// Static USD-denominated currency table. A production deployment swaps
/// this for a live rate source behind the same interface; the table here
/// only needs to satisfy the contract `rate(currency) -> USD per unit`.
fn currency_rate(currency: &str) -> Option<f64> {
    match currency {
        "USD" => Some(1.0),
        "EUR" => Some(0.85),
        "GBP" => Some(0.73),
        "JPY" => Some(110.0),
        _ => None,
    }
}

/// Convert `amount` from `from` currency into `to` currency via the USD
/// table. Unsupported currencies log a warning and pass the raw amount
/// through unconverted.
fn convert_currency(amount: f64, from: &str, to: &str) -> f64 {
    if from == to {
        return amount;
    }
    match (currency_rate(from), currency_rate(to)) {
        (Some(from_rate), Some(to_rate)) => amount / from_rate * to_rate,
        _ => {
            tracing::warn!(from, to, "unsupported currency pair, using raw amount");
            amount
        }
    }
}

/// Create/update/delete/get/list, the pre-flight spend gate, usage
/// recording, forecasting, and notification delivery for a tenant's
/// spending caps.
pub struct BudgetService {
    budgets: RwLock<HashMap<Uuid, BudgetAllocation>>,
    /// Per-budget daily usage totals, used for forecast variance — kept
    /// separately from the append-only usage log so forecasting doesn't
    /// need to rescan the whole ledger.
    daily_usage: DashMap<Uuid, HashMap<chrono::NaiveDate, f64>>,
    last_notification: DashMap<(Uuid, NotificationTypeKey), DateTime<Utc>>,
    seen_usage_ids: DashMap<Uuid, ()>,
    options: BudgetServiceOptions,
    email: Arc<dyn EmailService>,
    store: Arc<dyn Store>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NotificationTypeKey(u8);

impl From<NotificationType> for NotificationTypeKey {
    fn from(t: NotificationType) -> Self {
        NotificationTypeKey(match t {
            NotificationType::Warning => 0,
            NotificationType::Critical => 1,
            NotificationType::OverBudget => 2,
            NotificationType::Reset => 3,
        })
    }
}

impl BudgetService {
    pub fn new(options: BudgetServiceOptions, store: Arc<dyn Store>) -> Self {
        Self {
            budgets: RwLock::new(HashMap::new()),
            daily_usage: DashMap::new(),
            last_notification: DashMap::new(),
            seen_usage_ids: DashMap::new(),
            options,
            email: Arc::new(NullEmailService),
            store,
        }
    }

    pub fn with_email_service(mut self, email: Arc<dyn EmailService>) -> Self {
        self.email = email;
        self
    }

    /// Create a new budget. Rejects if another budget of the same period
    /// overlaps the given range for the same (tenant, project, user).
    pub async fn create(
        &self,
        tenant_id: String,
        project_id: Option<String>,
        user_id: Option<String>,
        period: BudgetPeriod,
        amount: f64,
        currency: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        warning_threshold: f64,
        critical_threshold: f64,
        send_notifications: bool,
    ) -> Result<BudgetAllocation, BudgetError> {
        if amount <= 0.0 {
            return Err(BudgetError::Validation("amount must be positive".into()));
        }
        if start >= end {
            return Err(BudgetError::Validation("start must precede end".into()));
        }
        if warning_threshold >= critical_threshold {
            return Err(BudgetError::Validation(
                "warning threshold must be below critical threshold".into(),
            ));
        }

        let mut budgets = self.budgets.write().await;
        let overlaps = budgets.values().any(|b| {
            b.tenant_id == tenant_id
                && b.project_id == project_id
                && b.user_id == user_id
                && b.period == period
                && b.start <= end
                && start <= b.end
        });
        if overlaps {
            return Err(BudgetError::Validation(
                "A budget already exists for this period".into(),
            ));
        }

        let now = Utc::now();
        let budget = BudgetAllocation {
            id: Uuid::new_v4(),
            tenant_id,
            project_id,
            user_id,
            period,
            amount,
            currency,
            start,
            end,
            used: 0.0,
            warning_threshold,
            critical_threshold,
            send_notifications,
            last_updated: now,
        };
        budgets.insert(budget.id, budget.clone());
        Ok(budget)
    }

    /// Only amount, period, start/end, thresholds, and the
    /// send-notifications flag may be changed.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        amount: Option<f64>,
        period: Option<BudgetPeriod>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        warning_threshold: Option<f64>,
        critical_threshold: Option<f64>,
        send_notifications: Option<bool>,
    ) -> Result<BudgetAllocation, BudgetError> {
        let mut budgets = self.budgets.write().await;
        let budget = budgets.get_mut(&id).ok_or(BudgetError::NotFound(id))?;
        if let Some(amount) = amount {
            if amount <= 0.0 {
                return Err(BudgetError::Validation("amount must be positive".into()));
            }
            budget.amount = amount;
        }
        if let Some(period) = period {
            budget.period = period;
        }
        if let Some(start) = start {
            budget.start = start;
        }
        if let Some(end) = end {
            budget.end = end;
        }
        if budget.start >= budget.end {
            return Err(BudgetError::Validation("start must precede end".into()));
        }
        if let Some(w) = warning_threshold {
            budget.warning_threshold = w;
        }
        if let Some(c) = critical_threshold {
            budget.critical_threshold = c;
        }
        if budget.warning_threshold >= budget.critical_threshold {
            return Err(BudgetError::Validation(
                "warning threshold must be below critical threshold".into(),
            ));
        }
        if let Some(s) = send_notifications {
            budget.send_notifications = s;
        }
        budget.last_updated = Utc::now();
        Ok(budget.clone())
    }

    /// Deletes the budget. Cascades to its notifications.
    pub async fn delete(&self, id: Uuid) -> Result<(), BudgetError> {
        let mut budgets = self.budgets.write().await;
        budgets.remove(&id).ok_or(BudgetError::NotFound(id))?;
        self.daily_usage.remove(&id);
        self.last_notification.retain(|(budget_id, _), _| *budget_id != id);
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<BudgetAllocation, BudgetError> {
        self.budgets
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(BudgetError::NotFound(id))
    }

    pub async fn list(&self, tenant_id: &str) -> Vec<BudgetAllocation> {
        self.budgets
            .read()
            .await
            .values()
            .filter(|b| b.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    fn applicable_ids<'a>(
        budgets: &'a HashMap<Uuid, BudgetAllocation>,
        tenant_id: &str,
        project_id: Option<&str>,
        user_id: Option<&str>,
        at: DateTime<Utc>,
    ) -> Vec<Uuid> {
        budgets
            .values()
            .filter(|b| b.applies_to(tenant_id, project_id, user_id, at))
            .map(|b| b.id)
            .collect()
    }

    /// Allowed iff an active budget exists and
    /// `used + estimated_cost <= amount`. Absence of a matching budget
    /// defaults to allowed (`NoBudget`, amount = +inf). There is no
    /// fallible path here since budgets live in-process, but the result
    /// type still carries `StoreUnavailable` for callers backed by a real
    /// database that want to fail open rather than block every request on
    /// a degraded store.
    pub async fn check_budget(
        &self,
        tenant_id: &str,
        estimated_cost: f64,
        project_id: Option<&str>,
        user_id: Option<&str>,
    ) -> BudgetCheckResult {
        let now = Utc::now();
        let budgets = self.budgets.read().await;
        let ids = Self::applicable_ids(&budgets, tenant_id, project_id, user_id, now);
        if ids.is_empty() {
            return BudgetCheckResult {
                allowed: true,
                status: BudgetCheckStatus::NoBudget,
                reason: "no applicable budget; defaulting to allowed".into(),
            };
        }
        for id in ids {
            let budget = &budgets[&id];
            let converted = convert_currency(estimated_cost, "USD", &budget.currency);
            if budget.used + converted > budget.amount {
                return BudgetCheckResult {
                    allowed: false,
                    status: BudgetCheckStatus::Exceeded,
                    reason: format!(
                        "budget {} would exceed amount ({:.2} + {:.2} > {:.2})",
                        budget.id, budget.used, converted, budget.amount
                    ),
                };
            }
        }
        BudgetCheckResult {
            allowed: true,
            status: BudgetCheckStatus::Ok,
            reason: "within budget".into(),
        }
    }

    /// Record usage and debit every applicable budget in one pass.
    /// Idempotent on `usage.id`: callers must ensure at-most-once delivery
    /// of ids, but replays of the same id are a safe no-op here too.
    pub async fn record_usage(&self, usage: UsageRecord) -> Result<(), BudgetError> {
        if self.seen_usage_ids.contains_key(&usage.id) {
            return Ok(());
        }
        self.store.append_usage(usage.clone()).await?;
        if self.seen_usage_ids.insert(usage.id, ()).is_some() {
            // another task raced us and already recorded it
            return Ok(());
        }

        let mut notifications = Vec::new();
        {
            let mut budgets = self.budgets.write().await;
            let ids = Self::applicable_ids(
                &budgets,
                &usage.tenant_id,
                usage.project_id.as_deref(),
                Some(&usage.user_id),
                usage.timestamp,
            );
            for id in ids {
                let budget = budgets.get_mut(&id).expect("id came from this map");
                let converted = convert_currency(usage.cost, &usage.currency, &budget.currency);
                budget.used += converted;
                budget.last_updated = Utc::now();

                self.record_daily(id, usage.timestamp, converted);

                if budget.send_notifications {
                    if let Some(n) = self.threshold_notification(budget) {
                        notifications.push(n);
                    }
                }
            }
        }

        for n in notifications {
            self.dispatch_notification(n).await?;
        }
        Ok(())
    }

    fn record_daily(&self, budget_id: Uuid, at: DateTime<Utc>, amount: f64) {
        let date = at.date_naive();
        let mut entry = self.daily_usage.entry(budget_id).or_default();
        *entry.entry(date).or_insert(0.0) += amount;
    }

    /// Computes which, if any, notification should fire for the budget's
    /// current usage fraction, respecting the per-type cooldown: repeated
    /// crossings of the same threshold kind within the cooldown window are
    /// suppressed, but a new kind (e.g. Warning then Critical) always
    /// fires.
    fn threshold_notification(&self, budget: &BudgetAllocation) -> Option<BudgetNotification> {
        let fraction = budget.usage_fraction();
        let kind = if budget.used > budget.amount {
            NotificationType::OverBudget
        } else if fraction >= budget.critical_threshold {
            NotificationType::Critical
        } else if fraction >= budget.warning_threshold {
            NotificationType::Warning
        } else {
            return None;
        };

        let key = (budget.id, NotificationTypeKey::from(kind));
        let now = Utc::now();
        if let Some(last) = self.last_notification.get(&key) {
            if now - *last < ChronoDuration::hours(self.options.cooldown_hours) {
                return None;
            }
        }
        self.last_notification.insert(key, now);

        let subject = match kind {
            NotificationType::Warning => format!("Budget {} warning: {:.0}% used", budget.id, fraction * 100.0),
            NotificationType::Critical => format!("Budget {} critical: {:.0}% used", budget.id, fraction * 100.0),
            NotificationType::OverBudget => format!("Budget {} over budget", budget.id),
            NotificationType::Reset => format!("Budget {} reset", budget.id),
        };
        let body = format!(
            "tenant={} used={:.2} amount={:.2} currency={}",
            budget.tenant_id, budget.used, budget.amount, budget.currency
        );

        Some(BudgetNotification {
            id: Uuid::new_v4(),
            budget_id: budget.id,
            notification_type: kind,
            recipient: self.options.default_email.clone(),
            subject,
            body,
            sent_at: now,
            read: false,
        })
    }

    async fn dispatch_notification(&self, notification: BudgetNotification) -> Result<(), BudgetError> {
        self.store.append_notification(notification.clone()).await?;
        if self.options.send_email {
            if let Err(err) = self
                .email
                .send(&notification.recipient, &notification.subject, &notification.body)
                .await
            {
                tracing::warn!(error = %err, "budget notification email delivery failed");
            }
        }
        Ok(())
    }

    /// Zero `used`, emit a Reset notification if enabled.
    pub async fn reset(&self, id: Uuid) -> Result<BudgetAllocation, BudgetError> {
        let notification = {
            let mut budgets = self.budgets.write().await;
            let budget = budgets.get_mut(&id).ok_or(BudgetError::NotFound(id))?;
            budget.used = 0.0;
            budget.last_updated = Utc::now();
            if budget.send_notifications {
                Some(BudgetNotification {
                    id: Uuid::new_v4(),
                    budget_id: budget.id,
                    notification_type: NotificationType::Reset,
                    recipient: self.options.default_email.clone(),
                    subject: format!("Budget {id} reset"),
                    body: "usage reset to 0".to_string(),
                    sent_at: Utc::now(),
                    read: false,
                })
            } else {
                None
            }
        };
        self.daily_usage.remove(&id);
        if let Some(n) = notification {
            self.dispatch_notification(n).await?;
        }
        self.get(id).await
    }

    pub fn can_rollover(&self, budget: &BudgetAllocation) -> bool {
        self.options.allow_rollover && budget.used < budget.amount
    }

    /// Create a successor budget for the next period.
    /// `new_amount = source_amount + remaining`, capped at
    /// `source_amount * (1 + max_rollover_percentage)`.
    pub async fn rollover(&self, id: Uuid) -> Result<BudgetAllocation, BudgetError> {
        let source = self.get(id).await?;
        if !self.can_rollover(&source) {
            return Err(BudgetError::Validation("rollover not permitted".into()));
        }
        let remaining = (source.amount - source.used).max(0.0);
        let cap = source.amount * (1.0 + self.options.max_rollover_percentage);
        let new_amount = (source.amount + remaining).min(cap);

        let span = source.end - source.start;
        let new_start = source.end;
        let new_end = new_start + span;

        self.create(
            source.tenant_id,
            source.project_id,
            source.user_id,
            source.period,
            new_amount,
            source.currency,
            new_start,
            new_end,
            source.warning_threshold,
            source.critical_threshold,
            source.send_notifications,
        )
        .await
    }

    /// Linear-trend forecast of a budget's final usage.
    pub async fn forecast(&self, id: Uuid, forecast_days: u32) -> Result<BudgetForecast, BudgetError> {
        let budget = self.get(id).await?;
        let now = Utc::now();
        let forecast_days = forecast_days.clamp(1, self.options.max_forecast_days);
        let days_elapsed = ((now - budget.start).num_days().max(1)) as f64;
        let daily_average = budget.used / days_elapsed;
        let forecasted_usage = budget.used + daily_average * forecast_days as f64;

        let daily_totals: Vec<f64> = self
            .daily_usage
            .get(&id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        let sample_count = daily_totals.len();

        let confidence = if sample_count < 10 || days_elapsed < 3.0 {
            0.3
        } else {
            let mean = daily_totals.iter().sum::<f64>() / sample_count as f64;
            let variance = daily_totals.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                / sample_count as f64;
            let stability = if mean > 0.0 {
                (1.0 - (variance.sqrt() / mean).min(1.0)).max(0.0)
            } else {
                0.5
            };
            let sample_factor = (sample_count as f64 / 30.0).min(1.0);
            (0.3 + 0.7 * stability * sample_factor).clamp(0.1, 1.0)
        };

        Ok(BudgetForecast {
            daily_average,
            forecasted_usage,
            forecast_days,
            confidence,
        })
    }

    pub async fn mark_notification_read(&self, id: Uuid) -> Result<(), BudgetError> {
        self.store.mark_notification_read(id).await?;
        Ok(())
    }

    pub async fn list_notifications(&self, budget_id: Uuid) -> Result<Vec<BudgetNotification>, BudgetError> {
        Ok(self.store.list_notifications(budget_id).await?)
    }
}

/// Default per-task-type token usage profile, used by the arbitration core
/// to estimate cost when the caller hasn't supplied token estimates.
pub fn default_token_profile(task_type: &str) -> (u32, u32) {
    match task_type {
        "summarization" => (1000, 200),
        "translation" => (500, 500),
        "code" => (200, 1000),
        "analysis" => (1500, 500),
        "chat" => (300, 300),
        _ => (500, 500),
    }
}

/// The start of the current calendar period for `period`, anchored at
/// `at` — used by callers constructing a budget's `[start, end)` range.
pub fn period_bounds(period: BudgetPeriod, at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    match period {
        BudgetPeriod::Daily => {
            let start = at.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
            (start, start + ChronoDuration::days(1))
        }
        BudgetPeriod::Weekly => {
            let weekday = at.weekday().num_days_from_monday() as i64;
            let start = (at.date_naive() - ChronoDuration::days(weekday))
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc();
            (start, start + ChronoDuration::weeks(1))
        }
        BudgetPeriod::Monthly => {
            let start = at
                .date_naive()
                .with_day(1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc();
            let next_month = if at.month() == 12 {
                start.with_year(start.year() + 1).unwrap().with_month(1).unwrap()
            } else {
                start.with_month(start.month() + 1).unwrap()
            };
            (start, next_month)
        }
        BudgetPeriod::Quarterly => {
            let quarter_start_month = ((at.month() - 1) / 3) * 3 + 1;
            let start = at
                .date_naive()
                .with_month(quarter_start_month)
                .unwrap()
                .with_day(1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc();
            let end = if quarter_start_month + 3 > 12 {
                start.with_year(start.year() + 1).unwrap().with_month(1).unwrap()
            } else {
                start.with_month(quarter_start_month + 3).unwrap()
            };
            (start, end)
        }
        BudgetPeriod::Annually => {
            let start = at
                .date_naive()
                .with_month(1)
                .unwrap()
                .with_day(1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc();
            (start, start.with_year(start.year() + 1).unwrap())
        }
    }
}
