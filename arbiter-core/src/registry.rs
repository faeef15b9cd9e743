//! # Model & Provider Registry
//!
//! The read-mostly catalog the arbitration core enumerates candidates from.
//! Mirrors the shape of [`crate::providers::ProviderConfig`] /
//! [`crate::providers::ProviderHealth`] but models the *arbitration* view of
//! a provider (vendor endpoint, region, health) and the models it offers,
//! rather than the wire-adapter view. Queries return owned value objects;
//! nothing here holds a back-reference into another entity, so the
//! Model/Provider/Configuration/Health cycle never needs `Rc`/`Weak` or an
//! arena allocator — just ids and a lookup.
//!
//! `ModelRepository` is the seam the arbitration and execution cores depend
//! on; `InMemoryModelRepository` is the reference catalog + rolling
//! performance-metric store used by tests and standalone mode.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Pricing/quality tier of a model offering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelTier {
    Basic,
    Standard,
    Premium,
    Enterprise,
}

/// A capability a model may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Streaming,
    FunctionCalling,
    Vision,
    Audio,
}

/// Provider liveness as last observed by a health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unstable,
    Down,
    Unknown,
}

/// An upstream LLM offering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub provider_id: String,
    pub vendor_model_id: String,
    pub tier: ModelTier,
    pub intelligence_score: f64,
    pub context_window: u32,
    pub max_output_tokens: u32,
    pub input_price_per_million: f64,
    pub output_price_per_million: f64,
    pub capabilities: HashSet<Capability>,
    pub data_residency_regions: HashSet<String>,
    pub supports_encryption_at_rest: bool,
    pub active: bool,
    pub deprecation_date: Option<DateTime<Utc>>,
}

impl Model {
    /// A model is usable iff it and its provider are active and it has not
    /// passed its deprecation date.
    pub fn is_usable(&self, provider_active: bool, now: DateTime<Utc>) -> bool {
        self.active
            && provider_active
            && self.deprecation_date.map(|d| d > now).unwrap_or(true)
    }

    pub fn has_capability(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }
}

/// Per-provider tunables that aren't part of the catalog entity itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfiguration {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub service_fee_percent: f64,
    pub requests_per_minute: u32,
    pub custom_headers: std::collections::HashMap<String, String>,
    pub default_max_tokens: u32,
    pub default_input_token_price: f64,
    pub default_output_token_price: f64,
}

impl Default for ProviderConfiguration {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
            service_fee_percent: 0.0,
            requests_per_minute: 60,
            custom_headers: Default::default(),
            default_max_tokens: 4096,
            default_input_token_price: 0.5,
            default_output_token_price: 1.5,
        }
    }
}

/// A vendor endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrationProvider {
    pub id: String,
    pub base_url: String,
    pub supported_regions: HashSet<String>,
    pub enabled: bool,
    pub health: HealthStatus,
    pub configuration: ProviderConfiguration,
}

/// Rolling per-model performance sample, updated after every completed call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
    pub avg_latency_ms: f64,
    pub avg_tokens_per_sec: f64,
    /// Success/failure samples over the trailing 7 days, used for the
    /// reliability score. `(timestamp, success)`.
    window: Vec<(DateTime<Utc>, bool)>,
}

impl PerformanceMetrics {
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.95; // spec default absent data
        }
        self.successful_requests as f64 / self.total_requests as f64
    }

    /// Success rate over the trailing 7 days; defaults to 95 (as a
    /// percentage) absent data, matching the reliability score default.
    pub fn reliability_score(&self, now: DateTime<Utc>) -> f64 {
        let cutoff = now - chrono::Duration::days(7);
        let recent: Vec<bool> = self
            .window
            .iter()
            .filter(|(ts, _)| *ts >= cutoff)
            .map(|(_, ok)| *ok)
            .collect();
        if recent.is_empty() {
            return 95.0;
        }
        let successes = recent.iter().filter(|ok| **ok).count();
        successes as f64 / recent.len() as f64 * 100.0
    }

    fn record(&mut self, success: bool, latency_ms: f64, tokens_per_sec: f64, now: DateTime<Utc>) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        }
        if self.total_requests == 1 {
            self.min_latency_ms = latency_ms;
            self.max_latency_ms = latency_ms;
            self.avg_latency_ms = latency_ms;
            self.avg_tokens_per_sec = tokens_per_sec;
        } else {
            self.min_latency_ms = self.min_latency_ms.min(latency_ms);
            self.max_latency_ms = self.max_latency_ms.max(latency_ms);
            let n = self.total_requests as f64;
            self.avg_latency_ms += (latency_ms - self.avg_latency_ms) / n;
            self.avg_tokens_per_sec += (tokens_per_sec - self.avg_tokens_per_sec) / n;
        }
        self.window.push((now, success));
        let cutoff = now - chrono::Duration::days(7);
        self.window.retain(|(ts, _)| *ts >= cutoff);
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("model not found: {0}")]
    ModelNotFound(String),
    #[error("provider not found: {0}")]
    ProviderNotFound(String),
}

/// The catalog + performance-metric store the arbitration and execution
/// cores query. Read-mostly: list calls are expected to be cached by the
/// caller (30 min model lists, 15 min per-model info, 60 s health, per the
/// execution core's documented cache policy).
#[async_trait::async_trait]
pub trait ModelRepository: Send + Sync {
    async fn list_active_models(&self) -> Vec<Model>;
    async fn get_model(&self, id: &str) -> Option<Model>;
    async fn get_provider(&self, id: &str) -> Option<ArbitrationProvider>;
    async fn performance(&self, model_id: &str) -> Option<PerformanceMetrics>;
    async fn record_performance(
        &self,
        model_id: &str,
        success: bool,
        latency_ms: f64,
        tokens_per_sec: f64,
    );
}

/// In-memory catalog backed by `DashMap`, matching the sharded-map idiom
/// used for the provider rate-limit buckets and cache layer.
#[derive(Default)]
pub struct InMemoryModelRepository {
    models: DashMap<String, Model>,
    providers: DashMap<String, ArbitrationProvider>,
    performance: DashMap<String, PerformanceMetrics>,
}

impl InMemoryModelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn upsert_model(&self, model: Model) {
        self.models.insert(model.id.clone(), model);
    }

    pub fn upsert_provider(&self, provider: ArbitrationProvider) {
        self.providers.insert(provider.id.clone(), provider);
    }
}

#[async_trait::async_trait]
impl ModelRepository for InMemoryModelRepository {
    async fn list_active_models(&self) -> Vec<Model> {
        let now = Utc::now();
        self.models
            .iter()
            .filter(|entry| {
                let provider_active = self
                    .providers
                    .get(&entry.provider_id)
                    .map(|p| p.enabled)
                    .unwrap_or(false);
                entry.is_usable(provider_active, now)
            })
            .map(|entry| entry.value().clone())
            .collect()
    }

    async fn get_model(&self, id: &str) -> Option<Model> {
        self.models.get(id).map(|m| m.value().clone())
    }

    async fn get_provider(&self, id: &str) -> Option<ArbitrationProvider> {
        self.providers.get(id).map(|p| p.value().clone())
    }

    async fn performance(&self, model_id: &str) -> Option<PerformanceMetrics> {
        self.performance.get(model_id).map(|p| p.value().clone())
    }

    async fn record_performance(
        &self,
        model_id: &str,
        success: bool,
        latency_ms: f64,
        tokens_per_sec: f64,
    ) {
        let now = Utc::now();
        self.performance
            .entry(model_id.to_string())
            .or_default()
            .record(success, latency_ms, tokens_per_sec, now);
    }
}
