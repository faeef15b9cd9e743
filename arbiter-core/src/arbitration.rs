//! # Arbitration Core
//!
//! Candidate enumeration, multi-dimensional scoring, strategy-based
//! selection, and fallback ordering. Generalizes the
//! teacher's [`crate::routing::Router`] (strategy enum + provider stats +
//! `select_provider`) from a flat provider-id selector into a model-level
//! arbiter that scores against a tenant's policy envelope
//! ([`ArbitrationContext`]) rather than a fixed weight vector, and always
//! emits an audit row regardless of outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::budget::{default_token_profile, BudgetCheckStatus, BudgetService};
use crate::rate_limiter::RateLimiter;
use crate::registry::{Capability, HealthStatus, Model, ModelRepository};
use crate::store::{Store, StoreError};

/// Blocked-models lookup, the only per-user policy
/// input the arbitration core consumes directly (everything else flows
/// through [`ArbitrationContext`]).
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn get_user_constraints(&self, user_id: &str) -> UserConstraints;
}

#[derive(Debug, Clone, Default)]
pub struct UserConstraints {
    pub blocked_models: HashSet<String>,
}

/// A `UserService` with no per-user blocks; used when no constraints are
/// configured.
pub struct PermissiveUserService;

#[async_trait::async_trait]
impl UserService for PermissiveUserService {
    async fn get_user_constraints(&self, _user_id: &str) -> UserConstraints {
        UserConstraints::default()
    }
}

/// Model and request-level compliance checks.
/// The core's own compliance *scoring* is computed locally from the
/// candidate's residency/encryption attributes; this collaborator is for
/// rule-authoring systems layered on top (e.g. tenant-specific policy
/// packs) and is optional.
#[async_trait::async_trait]
pub trait ComplianceService: Send + Sync {
    async fn check_model_compliance(&self, model: &Model, context: &ArbitrationContext) -> bool;
}

pub struct PermissiveComplianceService;

#[async_trait::async_trait]
impl ComplianceService for PermissiveComplianceService {
    async fn check_model_compliance(&self, _model: &Model, _context: &ArbitrationContext) -> bool {
        true
    }
}

/// Per-request policy envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrationContext {
    pub tenant_id: String,
    pub user_id: String,
    pub project_id: Option<String>,
    pub task_type: String,
    pub min_intelligence_score: f64,
    pub max_cost: f64,
    pub max_latency_ms: f64,
    pub min_context_length: u32,
    pub required_capabilities: HashSet<Capability>,
    pub allowed_models: Option<HashSet<String>>,
    pub blocked_models: HashSet<String>,
    pub allowed_providers: Option<HashSet<String>>,
    pub blocked_providers: HashSet<String>,
    pub required_region: Option<String>,
    pub require_data_residency: bool,
    pub require_encryption: bool,
    pub selection_strategy: Option<String>,
    pub enable_fallback: bool,
    pub max_fallback_attempts: u32,
    pub estimated_input_tokens: Option<u32>,
    pub estimated_output_tokens: Option<u32>,
}

impl Default for ArbitrationContext {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            user_id: String::new(),
            project_id: None,
            task_type: "general".to_string(),
            min_intelligence_score: 0.0,
            max_cost: f64::MAX,
            max_latency_ms: f64::MAX,
            min_context_length: 0,
            required_capabilities: HashSet::new(),
            allowed_models: None,
            blocked_models: HashSet::new(),
            allowed_providers: None,
            blocked_providers: HashSet::new(),
            required_region: None,
            require_data_residency: false,
            require_encryption: false,
            selection_strategy: None,
            enable_fallback: true,
            max_fallback_attempts: 3,
            estimated_input_tokens: None,
            estimated_output_tokens: None,
        }
    }
}

/// A model augmented with per-context scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrationCandidate {
    pub model_id: String,
    pub provider_id: String,
    pub performance_score: f64,
    pub cost_score: f64,
    pub compliance_score: f64,
    pub reliability_score: f64,
    pub value_score: f64,
    pub final_score: f64,
    pub expected_latency_ms: f64,
    pub expected_cost: f64,
    pub provider_health: HealthStatus,
}

/// Selection strategy label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyTag {
    Balanced,
    CostOptimized,
    PerformanceCritical,
    LatencySensitive,
    ReliabilityFocused,
    ComplianceSensitive,
    CapabilityOptimized,
}

impl StrategyTag {
    fn as_str(&self) -> &'static str {
        match self {
            StrategyTag::Balanced => "balanced",
            StrategyTag::CostOptimized => "cost_optimized",
            StrategyTag::PerformanceCritical => "performance_critical",
            StrategyTag::LatencySensitive => "latency_sensitive",
            StrategyTag::ReliabilityFocused => "reliability_focused",
            StrategyTag::ComplianceSensitive => "compliance_sensitive",
            StrategyTag::CapabilityOptimized => "capability_optimized",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        Some(match label {
            "balanced" => StrategyTag::Balanced,
            "cost_optimized" => StrategyTag::CostOptimized,
            "performance_critical" => StrategyTag::PerformanceCritical,
            "latency_sensitive" => StrategyTag::LatencySensitive,
            "reliability_focused" => StrategyTag::ReliabilityFocused,
            "compliance_sensitive" => StrategyTag::ComplianceSensitive,
            "capability_optimized" => StrategyTag::CapabilityOptimized,
            _ => return None,
        })
    }

    /// Derive a tag from the context when the caller hasn't set one
    /// explicitly.
    fn derive(context: &ArbitrationContext) -> Self {
        if context.max_cost < 0.10 {
            StrategyTag::CostOptimized
        } else if context.min_intelligence_score > 70.0 {
            StrategyTag::PerformanceCritical
        } else if context.max_latency_ms < 2000.0 {
            StrategyTag::LatencySensitive
        } else if !context.required_capabilities.is_empty() {
            StrategyTag::CapabilityOptimized
        } else {
            StrategyTag::Balanced
        }
    }

    fn resolve(context: &ArbitrationContext) -> Self {
        context
            .selection_strategy
            .as_deref()
            .and_then(Self::from_label)
            .unwrap_or_else(|| Self::derive(context))
    }
}

struct Weights {
    performance: f64,
    cost: f64,
    compliance: f64,
    reliability: f64,
}

fn weights_for(task_type: &str) -> Weights {
    match task_type {
        "cost_sensitive" => Weights { performance: 0.3, cost: 0.5, compliance: 0.1, reliability: 0.1 },
        "performance_critical" => Weights { performance: 0.6, cost: 0.1, compliance: 0.2, reliability: 0.1 },
        "latency_sensitive" => Weights { performance: 0.5, cost: 0.2, compliance: 0.1, reliability: 0.2 },
        "reliability_focused" => Weights { performance: 0.2, cost: 0.2, compliance: 0.2, reliability: 0.4 },
        "compliance_sensitive" => Weights { performance: 0.2, cost: 0.2, compliance: 0.5, reliability: 0.1 },
        _ => Weights { performance: 0.4, cost: 0.3, compliance: 0.2, reliability: 0.1 },
    }
}

fn latency_score(avg_latency_ms: f64) -> f64 {
    if avg_latency_ms <= 100.0 {
        100.0
    } else if avg_latency_ms <= 500.0 {
        80.0
    } else if avg_latency_ms <= 1000.0 {
        60.0
    } else if avg_latency_ms <= 2000.0 {
        40.0
    } else if avg_latency_ms <= 5000.0 {
        20.0
    } else {
        10.0
    }
}

/// Immutable audit row for a `Select` call, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrationDecision {
    pub id: Uuid,
    pub tenant_id: String,
    pub user_id: String,
    pub project_id: Option<String>,
    pub selected_model_id: Option<String>,
    pub candidate_count: usize,
    pub selection_duration_ms: u64,
    pub success: bool,
    pub error_class: Option<String>,
    pub decision_factors: HashMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

/// The outcome of a successful `Select` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrationResult {
    pub decision_id: Uuid,
    pub selected: ArbitrationCandidate,
    pub candidates: Vec<ArbitrationCandidate>,
    pub fallback: Vec<ArbitrationCandidate>,
    pub estimated_cost: f64,
    pub expected_latency_ms: f64,
    pub decision_factors: HashMap<String, String>,
    pub excluded_model_ids: Vec<String>,
    pub strategy: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ArbitrationError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("no suitable model for this context")]
    NoSuitableModel,
    #[error("rate limit exceeded for key {0}")]
    RateLimitExceeded(String),
    #[error("insufficient budget: {0}")]
    InsufficientBudget(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Estimation returned by `EstimateCost`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEstimation {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub estimated_cost: f64,
}

/// Prediction returned by `PredictPerformance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformancePrediction {
    pub model_id: String,
    pub expected_latency_ms: f64,
    pub expected_success_rate: f64,
}

const BUSINESS_FLOOR: f64 = 50.0;

/// `ArbitrationEngine::Select`/`BatchSelect`/`EstimateCost`/`PredictPerformance`.
pub struct ArbitrationEngine {
    repository: Arc<dyn ModelRepository>,
    users: Arc<dyn UserService>,
    compliance: Arc<dyn ComplianceService>,
    rate_limiter: Arc<dyn RateLimiter>,
    budget: Arc<BudgetService>,
    store: Arc<dyn Store>,
    batch_semaphore: Arc<tokio::sync::Semaphore>,
}

impl ArbitrationEngine {
    pub fn new(
        repository: Arc<dyn ModelRepository>,
        rate_limiter: Arc<dyn RateLimiter>,
        budget: Arc<BudgetService>,
        store: Arc<dyn Store>,
    ) -> Self {
        Self {
            repository,
            users: Arc::new(PermissiveUserService),
            compliance: Arc::new(PermissiveComplianceService),
            rate_limiter,
            budget,
            store,
            batch_semaphore: Arc::new(tokio::sync::Semaphore::new(5)),
        }
    }

    pub fn with_user_service(mut self, users: Arc<dyn UserService>) -> Self {
        self.users = users;
        self
    }

    pub fn with_compliance_service(mut self, compliance: Arc<dyn ComplianceService>) -> Self {
        self.compliance = compliance;
        self
    }

    /// `EstimateCost`: uses the context's token estimates if present,
    /// otherwise the per-task-type default profile.
    pub fn estimate_cost(&self, model: &Model, context: &ArbitrationContext) -> CostEstimation {
        let (default_in, default_out) = default_token_profile(&context.task_type);
        let input_tokens = context.estimated_input_tokens.unwrap_or(default_in);
        let output_tokens = context.estimated_output_tokens.unwrap_or(default_out);
        let cost = (input_tokens as f64 / 1_000_000.0) * model.input_price_per_million
            + (output_tokens as f64 / 1_000_000.0) * model.output_price_per_million;
        CostEstimation {
            input_tokens,
            output_tokens,
            estimated_cost: cost,
        }
    }

    /// `PredictPerformance`: expected latency/success rate for every active
    /// candidate under this context, from the rolling performance metrics.
    pub async fn predict_performance(
        &self,
        context: &ArbitrationContext,
    ) -> Vec<PerformancePrediction> {
        let models = self.repository.list_active_models().await;
        let mut out = Vec::with_capacity(models.len());
        for model in models {
            let metrics = self.repository.performance(&model.id).await;
            let (latency, success_rate) = match metrics {
                Some(m) if m.total_requests > 0 => (m.avg_latency_ms, m.success_rate()),
                _ => (500.0, 0.95),
            };
            out.push(PerformancePrediction {
                model_id: model.id,
                expected_latency_ms: latency,
                expected_success_rate: success_rate,
            });
        }
        let _ = context;
        out
    }

    async fn score_candidate(&self, model: &Model, context: &ArbitrationContext) -> ArbitrationCandidate {
        let metrics = self.repository.performance(&model.id).await;
        let provider = self.repository.get_provider(&model.provider_id).await;
        let provider_health = provider.as_ref().map(|p| p.health).unwrap_or(HealthStatus::Unknown);

        let performance_score = match &metrics {
            Some(m) if m.total_requests > 0 => {
                let lat = latency_score(m.avg_latency_ms);
                let throughput = latency_score(5000.0 / m.avg_tokens_per_sec.max(1.0));
                0.4 * lat + 0.4 * (m.success_rate() * 100.0) + 0.2 * throughput
            }
            _ => 50.0,
        };

        let estimation = self.estimate_cost(model, context);
        let cost_score = 100.0 * (1.0 - (estimation.estimated_cost / 10.0).min(1.0));

        let region_ok = context
            .required_region
            .as_ref()
            .map(|r| model.data_residency_regions.contains(r))
            .unwrap_or(true);
        let mut compliance_score: f64 = 100.0;
        if context.require_data_residency && !region_ok {
            compliance_score -= 40.0;
        }
        if context.require_encryption && !model.supports_encryption_at_rest {
            compliance_score -= 30.0;
        }
        compliance_score = compliance_score.max(0.0);

        let now = Utc::now();
        let reliability_score = metrics
            .as_ref()
            .map(|m| m.reliability_score(now))
            .unwrap_or(95.0);

        let value_score = model.intelligence_score / estimation.estimated_cost.max(0.001);

        let weights = weights_for(&context.task_type);
        let final_score = weights.performance * performance_score
            + weights.cost * cost_score
            + weights.compliance * compliance_score
            + weights.reliability * reliability_score;

        let expected_latency_ms = metrics
            .as_ref()
            .filter(|m| m.total_requests > 0)
            .map(|m| m.avg_latency_ms)
            .unwrap_or(500.0);

        ArbitrationCandidate {
            model_id: model.id.clone(),
            provider_id: model.provider_id.clone(),
            performance_score,
            cost_score,
            compliance_score,
            reliability_score,
            value_score,
            final_score,
            expected_latency_ms,
            expected_cost: estimation.estimated_cost,
            provider_health,
        }
    }

    async fn eligible(&self, model: &Model, context: &ArbitrationContext, user: &UserConstraints) -> bool {
        if model.intelligence_score < context.min_intelligence_score {
            return false;
        }
        if model.context_window < context.min_context_length {
            return false;
        }
        if let Some(allowed) = &context.allowed_models {
            if !allowed.contains(&model.id) {
                return false;
            }
        }
        if context.blocked_models.contains(&model.id) || user.blocked_models.contains(&model.id) {
            return false;
        }
        if let Some(allowed) = &context.allowed_providers {
            if !allowed.contains(&model.provider_id) {
                return false;
            }
        }
        if context.blocked_providers.contains(&model.provider_id) {
            return false;
        }
        let provider = self.repository.get_provider(&model.provider_id).await;
        let healthy = provider
            .as_ref()
            .map(|p| p.health == HealthStatus::Healthy)
            .unwrap_or(false);
        if !healthy {
            return false;
        }
        if context.require_data_residency {
            if let Some(region) = &context.required_region {
                if !model.data_residency_regions.contains(region) {
                    return false;
                }
            }
        }
        if context.require_encryption && !model.supports_encryption_at_rest {
            return false;
        }
        for cap in &context.required_capabilities {
            if !model.has_capability(*cap) {
                return false;
            }
        }
        if !self.compliance.check_model_compliance(model, context).await {
            return false;
        }
        true
    }

    fn select_primary<'a>(
        &self,
        candidates: &'a [ArbitrationCandidate],
        tag: StrategyTag,
    ) -> &'a ArbitrationCandidate {
        let pick = |cmp: fn(&&ArbitrationCandidate, &&ArbitrationCandidate) -> std::cmp::Ordering| {
            candidates
                .iter()
                .max_by(|a, b| cmp(a, b).then_with(|| a.value_score.partial_cmp(&b.value_score).unwrap()))
                .expect("candidates non-empty")
        };
        match tag {
            StrategyTag::CostOptimized => candidates
                .iter()
                .min_by(|a, b| a.expected_cost.partial_cmp(&b.expected_cost).unwrap())
                .expect("candidates non-empty"),
            StrategyTag::PerformanceCritical => {
                pick(|a, b| a.performance_score.partial_cmp(&b.performance_score).unwrap())
            }
            StrategyTag::LatencySensitive => candidates
                .iter()
                .min_by(|a, b| a.expected_latency_ms.partial_cmp(&b.expected_latency_ms).unwrap())
                .expect("candidates non-empty"),
            StrategyTag::ReliabilityFocused => {
                pick(|a, b| a.reliability_score.partial_cmp(&b.reliability_score).unwrap())
            }
            StrategyTag::ComplianceSensitive | StrategyTag::CapabilityOptimized | StrategyTag::Balanced => {
                pick(|a, b| a.final_score.partial_cmp(&b.final_score).unwrap())
            }
        }
    }

    /// `Select`: the full pipeline — rate limit / budget pre-flight gates,
    /// candidate enumeration, scoring, business filters, selection, and
    /// fallback ordering. Always emits an `ArbitrationDecision`.
    pub async fn select(&self, context: ArbitrationContext) -> Result<ArbitrationResult, ArbitrationError> {
        let started = std::time::Instant::now();
        let now = Utc::now();

        let rl_key = format!(
            "Context:{}:{}:{}",
            context.tenant_id,
            context.user_id,
            context.project_id.as_deref().unwrap_or("-")
        );
        if !self.rate_limiter.allow(&rl_key, 1).await {
            let decision = self.record_decision(&context, None, 0, started, false, Some("RateLimitExceeded"), HashMap::new()).await;
            let _ = decision;
            return Err(ArbitrationError::RateLimitExceeded(rl_key));
        }

        let models_for_estimate = self.repository.list_active_models().await;
        let rough_estimate = models_for_estimate
            .first()
            .map(|m| self.estimate_cost(m, &context).estimated_cost)
            .unwrap_or(0.0);
        let budget_check = self
            .budget
            .check_budget(
                &context.tenant_id,
                rough_estimate,
                context.project_id.as_deref(),
                Some(&context.user_id),
            )
            .await;
        if !budget_check.allowed && budget_check.status != BudgetCheckStatus::StoreUnavailable {
            let decision = self.record_decision(&context, None, 0, started, false, Some("InsufficientBudget"), HashMap::new()).await;
            let _ = decision;
            return Err(ArbitrationError::InsufficientBudget(budget_check.reason));
        }

        let user_constraints = self.users.get_user_constraints(&context.user_id).await;
        let mut eligible_models = Vec::new();
        for model in models_for_estimate {
            if self.eligible(&model, &context, &user_constraints).await {
                eligible_models.push(model);
            }
        }

        let mut candidates = Vec::with_capacity(eligible_models.len());
        for model in &eligible_models {
            candidates.push(self.score_candidate(model, &context).await);
        }

        let excluded_model_ids: Vec<String> = candidates
            .iter()
            .filter(|c| c.final_score < BUSINESS_FLOOR)
            .map(|c| c.model_id.clone())
            .collect();

        let mut filtered: Vec<ArbitrationCandidate> = candidates
            .iter()
            .filter(|c| {
                c.final_score >= BUSINESS_FLOOR
                    && c.expected_latency_ms <= context.max_latency_ms
                    && c.expected_cost <= context.max_cost
            })
            .cloned()
            .collect();

        let mut degraded = false;
        if filtered.is_empty() && !candidates.is_empty() {
            candidates.sort_by(|a, b| b.final_score.partial_cmp(&a.final_score).unwrap());
            filtered = candidates.iter().take(3).cloned().collect();
            degraded = !filtered.is_empty();
        }

        if filtered.is_empty() {
            let decision = self.record_decision(&context, None, candidates.len(), started, false, Some("NoSuitableModel"), HashMap::new()).await;
            let _ = decision;
            return Err(ArbitrationError::NoSuitableModel);
        }

        let tag = StrategyTag::resolve(&context);
        let primary = self.select_primary(&filtered, tag).clone();

        let mut fallback: Vec<ArbitrationCandidate> = filtered
            .iter()
            .filter(|c| c.model_id != primary.model_id)
            .cloned()
            .collect();
        fallback.sort_by(|a, b| b.final_score.partial_cmp(&a.final_score).unwrap());
        fallback.truncate(3);

        let mut decision_factors = HashMap::new();
        decision_factors.insert("strategy".to_string(), tag.as_str().to_string());
        decision_factors.insert("final_score".to_string(), format!("{:.2}", primary.final_score));
        decision_factors.insert("degraded".to_string(), degraded.to_string());
        decision_factors.insert("min_intelligence".to_string(), context.min_intelligence_score.to_string());
        decision_factors.insert("max_cost".to_string(), context.max_cost.to_string());

        let decision_id = self
            .record_decision(&context, Some(&primary.model_id), candidates.len(), started, true, None, decision_factors.clone())
            .await;

        Ok(ArbitrationResult {
            decision_id,
            expected_latency_ms: primary.expected_latency_ms,
            estimated_cost: primary.expected_cost,
            selected: primary,
            candidates: filtered,
            fallback,
            decision_factors,
            excluded_model_ids,
            strategy: tag.as_str().to_string(),
            timestamp: now,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn record_decision(
        &self,
        context: &ArbitrationContext,
        selected_model_id: Option<&str>,
        candidate_count: usize,
        started: std::time::Instant,
        success: bool,
        error_class: Option<&str>,
        decision_factors: HashMap<String, String>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let decision = ArbitrationDecision {
            id,
            tenant_id: context.tenant_id.clone(),
            user_id: context.user_id.clone(),
            project_id: context.project_id.clone(),
            selected_model_id: selected_model_id.map(|s| s.to_string()),
            candidate_count,
            selection_duration_ms: started.elapsed().as_millis() as u64,
            success,
            error_class: error_class.map(|s| s.to_string()),
            decision_factors,
            timestamp: Utc::now(),
        };
        if let Err(err) = self.store.append_decision(decision).await {
            tracing::warn!(error = %err, "failed to persist arbitration decision");
        }
        id
    }

    /// `BatchSelect`: bounded concurrency of 5.
    pub async fn batch_select(
        &self,
        contexts: Vec<ArbitrationContext>,
    ) -> Vec<Result<ArbitrationResult, ArbitrationError>> {
        let mut futures_unordered = Vec::with_capacity(contexts.len());
        for context in contexts {
            let semaphore = Arc::clone(&self.batch_semaphore);
            futures_unordered.push(async move {
                let _permit = semaphore.acquire().await.expect("semaphore not closed");
                self.select(context).await
            });
        }
        futures::future::join_all(futures_unordered).await
    }
}
