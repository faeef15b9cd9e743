//! # Execution Core
//!
//! Protected upstream dispatch: takes an [`ArbitrationResult`] (or runs
//! [`ArbitrationEngine::select`] itself), enforces the circuit breaker and
//! rate limiter gates per candidate, invokes the [`Provider`] adapter with
//! the teacher's exponential-backoff retry loop
//! (`ArbiterClient::execute_with_enhanced_retry`), walks the fallback chain
//! on exhaustion, and performs the post-call bookkeeping (performance
//! metrics, usage/budget debit, circuit record, execution log row) exactly
//! once per attempt.
//!
//! Streaming shares the same gates and bookkeeping, just deferred: the
//! chunk stream is lazy and finite, and the aggregated usage is only known
//! once it drains, so bookkeeping happens from a [`StreamCompletion`]
//! delivered through a one-shot channel rather than inline.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::Stream;
use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::arbitration::{ArbitrationCandidate, ArbitrationContext, ArbitrationEngine, ArbitrationError, ArbitrationResult};
use crate::budget::{BudgetError, BudgetService, OperationType, UsageRecord};
use crate::circuit_registry::CircuitRegistry;
use crate::error::ProviderError;
use crate::models::{ChatRequest, ChatResponse};
use crate::providers::Provider;
use crate::rate_limiter::RateLimiter;
use crate::registry::ModelRepository;
use crate::store::{ExecutionLog, Store};

/// Errors surfaced by [`ExecutionEngine::execute`] and
/// [`ExecutionEngine::execute_stream`].
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Arbitration(#[from] ArbitrationError),
    #[error("circuit breaker open for {0}")]
    CircuitOpen(String),
    #[error("rate limit exceeded for {0}")]
    RateLimitExceeded(String),
    #[error("no configured provider for provider id {0}")]
    ProviderNotConfigured(String),
    #[error("no model found for model id {0}")]
    ModelNotFound(String),
    #[error("every candidate in the fallback chain failed: {0}")]
    AllModelsFailed(String),
    #[error("request cancelled")]
    Cancelled,
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// The result of a single successful [`ExecutionEngine::execute`] call,
/// after the full pipeline (gates, dispatch, retries, bookkeeping) has
/// already run.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub response: ChatResponse,
    pub decision_id: Uuid,
    pub model_id: String,
    pub provider_id: String,
    pub fallback_used: bool,
    pub usage_id: Uuid,
    pub cost: f64,
    pub duration_ms: u64,
}

/// Aggregated usage delivered once a streaming response finishes draining
/// (or is abandoned by the caller). `success = false` means no budget
/// debit happened.
#[derive(Debug, Clone)]
pub struct StreamCompletion {
    pub decision_id: Uuid,
    pub model_id: String,
    pub provider_id: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost: f64,
    pub duration_ms: u64,
    pub success: bool,
}

/// A handle resolving to the [`StreamCompletion`] once
/// the paired [`ExecutionStream`] finishes, one way or another.
pub struct CompletionHandle {
    receiver: oneshot::Receiver<StreamCompletion>,
}

impl std::future::Future for CompletionHandle {
    type Output = Option<StreamCompletion>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|r| r.ok())
    }
}

/// Retryable per the fallback/retry classification the teacher's
/// `ArbiterClient::should_retry`/`should_fallback` use, extended to cover
/// the gateway status codes the upstream adapters surface as
/// [`ProviderError::Api`].
fn is_retryable(error: &ProviderError) -> bool {
    match error {
        ProviderError::RateLimit
        | ProviderError::ServiceUnavailable
        | ProviderError::Timeout
        | ProviderError::NetworkError { .. }
        | ProviderError::RetryableError { .. }
        | ProviderError::Http(_) => true,
        ProviderError::Api { code, .. } => {
            matches!(code, 408 | 429 | 500 | 502 | 503 | 504)
        }
        _ => false,
    }
}

fn error_class(error: &ProviderError) -> String {
    match error {
        ProviderError::Api { code, .. } => format!("api_{code}"),
        other => format!("{other:?}")
            .split_whitespace()
            .next()
            .unwrap_or("unknown")
            .trim_end_matches(['(', '{'])
            .to_string(),
    }
}

fn validate_request(request: &ChatRequest) -> Result<(), ExecutionError> {
    if request.messages.is_empty() {
        return Err(ExecutionError::Validation(
            "messages must not be empty".into(),
        ));
    }
    if let Some(max_tokens) = request.max_tokens {
        if max_tokens == 0 || max_tokens > 100_000 {
            return Err(ExecutionError::Validation(
                "max_tokens must be in (0, 100000]".into(),
            ));
        }
    }
    if let Some(t) = request.temperature {
        if !(0.0..=2.0).contains(&t) {
            return Err(ExecutionError::Validation(
                "temperature must be in [0, 2]".into(),
            ));
        }
    }
    if let Some(p) = request.top_p {
        if !(0.0..=1.0).contains(&p) {
            return Err(ExecutionError::Validation("top_p must be in [0, 1]".into()));
        }
    }
    if let Some(fp) = request.frequency_penalty {
        if !(-2.0..=2.0).contains(&fp) {
            return Err(ExecutionError::Validation(
                "frequency_penalty must be in [-2, 2]".into(),
            ));
        }
    }
    if let Some(pp) = request.presence_penalty {
        if !(-2.0..=2.0).contains(&pp) {
            return Err(ExecutionError::Validation(
                "presence_penalty must be in [-2, 2]".into(),
            ));
        }
    }
    Ok(())
}

/// Rough `1 token ≈ 4 characters` estimate, the same heuristic
/// `ArbiterClient::estimate_tokens` uses, for the streaming path where no
/// provider ever reports usage on the wire.
fn estimate_tokens(chars: usize) -> u32 {
    ((chars as f64 / 4.0).round() as u32).max(1)
}

fn estimate_cost(model: &crate::registry::Model, input_tokens: u32, output_tokens: u32) -> f64 {
    (input_tokens as f64 / 1_000_000.0) * model.input_price_per_million
        + (output_tokens as f64 / 1_000_000.0) * model.output_price_per_million
}

/// `ArbitrationEngine.Select` consumer: protected dispatch, retries,
/// fallback, and bookkeeping across circuit breaker, rate limiter, budget
/// ledger, performance registry, and audit store.
pub struct ExecutionEngine {
    arbitration: Arc<ArbitrationEngine>,
    repository: Arc<dyn ModelRepository>,
    providers: HashMap<String, Arc<dyn Provider>>,
    circuits: Arc<CircuitRegistry>,
    rate_limiter: Arc<dyn RateLimiter>,
    budget: Arc<BudgetService>,
    store: Arc<dyn Store>,
    max_retries: u32,
    retry_delay: Duration,
}

impl ExecutionEngine {
    pub fn new(
        arbitration: Arc<ArbitrationEngine>,
        repository: Arc<dyn ModelRepository>,
        circuits: Arc<CircuitRegistry>,
        rate_limiter: Arc<dyn RateLimiter>,
        budget: Arc<BudgetService>,
        store: Arc<dyn Store>,
    ) -> Self {
        Self {
            arbitration,
            repository,
            providers: HashMap::new(),
            circuits,
            rate_limiter,
            budget,
            store,
            max_retries: 3,
            retry_delay: Duration::from_millis(250),
        }
    }

    pub fn with_provider(mut self, provider_id: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        self.providers.insert(provider_id.into(), provider);
        self
    }

    pub fn with_retry_policy(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    fn provider_for(&self, provider_id: &str) -> Result<Arc<dyn Provider>, ExecutionError> {
        self.providers
            .get(provider_id)
            .cloned()
            .ok_or_else(|| ExecutionError::ProviderNotConfigured(provider_id.to_string()))
    }

    /// Runs `operation` against a single candidate, retrying retryable
    /// [`ProviderError`]s with the teacher's exponential-backoff-plus-jitter
    /// schedule (`ArbiterClient::execute_with_enhanced_retry`).
    async fn invoke_with_retry<F, Fut>(&self, mut operation: F) -> Result<ChatResponse, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<ChatResponse, ProviderError>>,
    {
        let mut attempt = 0;
        let mut delay = self.retry_delay;
        const JITTER_FACTOR: f64 = 0.1;
        const BACKOFF_MULTIPLIER: f64 = 2.0;
        const MAX_DELAY: Duration = Duration::from_secs(10);

        loop {
            match operation().await {
                Ok(response) => return Ok(response),
                Err(error) => {
                    attempt += 1;
                    if attempt > self.max_retries || !is_retryable(&error) {
                        return Err(error);
                    }
                    let jitter = delay.mul_f64(JITTER_FACTOR);
                    tokio::time::sleep(delay + jitter).await;
                    delay = std::cmp::min(delay.mul_f64(BACKOFF_MULTIPLIER), MAX_DELAY);
                }
            }
        }
    }

    /// Pre-dispatch gate for one candidate: circuit breaker, then rate
    /// limiter, both keyed `Provider:<id>` as documented on
    /// [`crate::circuit_registry`] and [`crate::rate_limiter`].
    async fn gate(&self, provider_id: &str) -> Result<(), ExecutionError> {
        let circuit_id = format!("Provider:{provider_id}");
        if !self.circuits.allow(&circuit_id).await {
            return Err(ExecutionError::CircuitOpen(provider_id.to_string()));
        }
        if !self.rate_limiter.allow(&circuit_id, 1).await {
            return Err(ExecutionError::RateLimitExceeded(provider_id.to_string()));
        }
        Ok(())
    }

    /// Post-call bookkeeping shared by the primary attempt and every
    /// fallback attempt: performance sample, usage record + budget debit,
    /// circuit record, execution log row.
    #[allow(clippy::too_many_arguments)]
    async fn record_outcome(
        &self,
        context: &ArbitrationContext,
        decision_id: Uuid,
        model: &crate::registry::Model,
        provider_id: &str,
        request_id: &str,
        success: bool,
        fallback_used: bool,
        error_class: Option<String>,
        input_tokens: u32,
        output_tokens: u32,
        cost: f64,
        duration_ms: u64,
        operation_type: OperationType,
    ) -> Uuid {
        let circuit_id = format!("Provider:{provider_id}");
        if success {
            self.circuits.record_success(&circuit_id).await;
        } else {
            self.circuits.record_failure(&circuit_id).await;
        }

        let tokens_per_sec = if duration_ms > 0 {
            output_tokens as f64 / (duration_ms as f64 / 1000.0)
        } else {
            0.0
        };
        self.repository
            .record_performance(&model.id, success, duration_ms as f64, tokens_per_sec)
            .await;

        let usage_id = Uuid::new_v4();
        if success {
            let usage = UsageRecord {
                id: usage_id,
                tenant_id: context.tenant_id.clone(),
                project_id: context.project_id.clone(),
                user_id: context.user_id.clone(),
                model_id: model.id.clone(),
                provider_id: provider_id.to_string(),
                input_tokens,
                output_tokens,
                cost,
                currency: "USD".to_string(),
                processing_duration_ms: duration_ms,
                timestamp: Utc::now(),
                request_id: request_id.to_string(),
                success,
                operation_type,
                metadata: HashMap::new(),
            };
            if let Err(err) = self.budget.record_usage(usage).await {
                tracing::warn!(error = %err, "budget debit failed, execution result unaffected");
            }
        }

        let log = ExecutionLog {
            id: Uuid::new_v4(),
            decision_id,
            tenant_id: context.tenant_id.clone(),
            model_id: model.id.clone(),
            provider_id: provider_id.to_string(),
            success,
            fallback_used,
            error_class,
            duration_ms,
            timestamp: Utc::now(),
        };
        if let Err(err) = self.store.append_execution_log(log).await {
            tracing::warn!(error = %err, "failed to append execution log");
        }

        usage_id
    }

    /// Dispatches `request` against `candidate`, including the retry loop.
    /// Returns the raw provider error (not yet bookkept) on failure so the
    /// caller can decide whether to try the next fallback candidate.
    async fn dispatch_candidate(
        &self,
        candidate: &ArbitrationCandidate,
        request: &ChatRequest,
    ) -> Result<(crate::registry::Model, ChatResponse, u64), ExecutionError> {
        self.gate(&candidate.provider_id).await?;

        let model = self
            .repository
            .get_model(&candidate.model_id)
            .await
            .ok_or_else(|| ExecutionError::ModelNotFound(candidate.model_id.clone()))?;
        let provider = self.provider_for(&candidate.provider_id)?;

        let mut vendor_request = request.clone();
        vendor_request.model = model.vendor_model_id.clone();

        let start = Instant::now();
        let response = self
            .invoke_with_retry(|| provider.chat_completion(vendor_request.clone()))
            .await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        Ok((model, response, duration_ms))
    }

    /// `ArbitrationEngine.Select` then protected dispatch with fallback,
    /// per the data flow: `Context -> Select -> (CircuitBreaker.Allow x
    /// RateLimiter.Allow) -> Adapter.Invoke -> bookkeeping -> Result`.
    pub async fn execute(
        &self,
        request: ChatRequest,
        context: ArbitrationContext,
        request_id: impl Into<String>,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        validate_request(&request)?;
        let request_id = request_id.into();

        let arbitration_result = self.arbitration.select(context.clone()).await?;
        self.execute_with_result(request, context, request_id, arbitration_result)
            .await
    }

    /// Same as [`Self::execute`] but against an already-computed
    /// [`ArbitrationResult`], for callers (e.g. the gateway) that want to
    /// inspect the decision before dispatching.
    pub async fn execute_with_result(
        &self,
        request: ChatRequest,
        context: ArbitrationContext,
        request_id: String,
        arbitration_result: ArbitrationResult,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let decision_id = arbitration_result.decision_id;
        let max_attempts = context.max_fallback_attempts as usize;

        let mut chain = vec![arbitration_result.selected.clone()];
        if context.enable_fallback {
            chain.extend(arbitration_result.fallback.iter().cloned().take(max_attempts));
        }

        let mut last_error: Option<String> = None;

        for (idx, candidate) in chain.iter().enumerate() {
            let fallback_used = idx > 0;
            match self.dispatch_candidate(candidate, &request).await {
                Ok((model, response, duration_ms)) => {
                    let usage = response.usage.clone();
                    let (input_tokens, output_tokens) = usage
                        .map(|u| (u.prompt_tokens, u.completion_tokens))
                        .unwrap_or((0, 0));
                    let cost = estimate_cost(&model, input_tokens, output_tokens);

                    let usage_id = self
                        .record_outcome(
                            &context,
                            decision_id,
                            &model,
                            &candidate.provider_id,
                            &request_id,
                            true,
                            fallback_used,
                            None,
                            input_tokens,
                            output_tokens,
                            cost,
                            duration_ms,
                            OperationType::ChatCompletion,
                        )
                        .await;

                    return Ok(ExecutionOutcome {
                        response,
                        decision_id,
                        model_id: model.id,
                        provider_id: candidate.provider_id.clone(),
                        fallback_used,
                        usage_id,
                        cost,
                        duration_ms,
                    });
                }
                Err(err) => {
                    last_error = Some(err.to_string());
                    if let Ok(model) = self
                        .repository
                        .get_model(&candidate.model_id)
                        .await
                        .ok_or(())
                    {
                        let class = match &err {
                            ExecutionError::Provider(pe) => Some(error_class(pe)),
                            other => Some(format!("{other:?}")),
                        };
                        self.record_outcome(
                            &context,
                            decision_id,
                            &model,
                            &candidate.provider_id,
                            &request_id,
                            false,
                            fallback_used,
                            class,
                            0,
                            0,
                            0.0,
                            0,
                            OperationType::ChatCompletion,
                        )
                        .await;
                    }
                    continue;
                }
            }
        }

        Err(ExecutionError::AllModelsFailed(
            last_error.unwrap_or_else(|| "no candidates available".to_string()),
        ))
    }

    /// Streaming dispatch against the primary candidate only — the spec's
    /// fallback chain is defined over whole-response retries, and an
    /// already-partially-streamed response can't be silently replayed
    /// against a different upstream without the caller re-issuing the
    /// request, so streaming does not walk the fallback list.
    pub async fn execute_stream(
        &self,
        request: ChatRequest,
        context: ArbitrationContext,
    ) -> Result<(ExecutionStream, CompletionHandle), ExecutionError> {
        validate_request(&request)?;

        let arbitration_result = self.arbitration.select(context.clone()).await?;
        let decision_id = arbitration_result.decision_id;
        let candidate = arbitration_result.selected.clone();

        self.gate(&candidate.provider_id).await?;

        let model = self
            .repository
            .get_model(&candidate.model_id)
            .await
            .ok_or_else(|| ExecutionError::ModelNotFound(candidate.model_id.clone()))?;
        let provider = self.provider_for(&candidate.provider_id)?;

        let mut vendor_request = request.clone();
        vendor_request.model = model.vendor_model_id.clone();
        let input_tokens = context
            .estimated_input_tokens
            .unwrap_or_else(|| estimate_tokens(request.messages.iter().map(|m| m.content.len()).sum()));

        let inner = provider.stream_chat_completion(vendor_request).await?;
        let (tx, rx) = oneshot::channel();

        let stream = ExecutionStream {
            inner,
            started: Instant::now(),
            output_chars: 0,
            finished: false,
            completion_tx: Some(tx),
            decision_id,
            model,
            provider_id: candidate.provider_id.clone(),
            input_tokens,
            circuits: self.circuits.clone(),
            repository: self.repository.clone(),
            budget: self.budget.clone(),
            store: self.store.clone(),
            context,
        };

        Ok((stream, CompletionHandle { receiver: rx }))
    }

    /// Bounded-concurrency fan-out, one [`Self::execute`] per request, up
    /// to `max_concurrent` in flight at once.
    pub async fn execute_batch(
        &self,
        requests: Vec<(ChatRequest, ArbitrationContext, String)>,
        max_concurrent: usize,
    ) -> Vec<Result<ExecutionOutcome, ExecutionError>> {
        use futures::stream::StreamExt;

        futures::stream::iter(requests)
            .map(|(request, context, request_id)| async move {
                self.execute(request, context, request_id).await
            })
            .buffer_unordered(max_concurrent.max(1))
            .collect()
            .await
    }
}

/// Lazy, finite, non-restartable chunk stream. Accumulates enough state to
/// bookkeep on completion (including early cancellation) without the
/// caller having to do anything beyond dropping or draining it.
pub struct ExecutionStream {
    inner: crate::providers::StreamResult,
    started: Instant,
    output_chars: usize,
    finished: bool,
    completion_tx: Option<oneshot::Sender<StreamCompletion>>,
    decision_id: Uuid,
    model: crate::registry::Model,
    provider_id: String,
    input_tokens: u32,
    circuits: Arc<CircuitRegistry>,
    repository: Arc<dyn ModelRepository>,
    budget: Arc<BudgetService>,
    store: Arc<dyn Store>,
    context: ArbitrationContext,
}

impl ExecutionStream {
    /// Finalize the stream and run bookkeeping. `record_circuit` controls
    /// whether this outcome counts against the circuit breaker: a real
    /// dispatch failure (including a provider-reported timeout, which
    /// surfaces through [`Stream::poll_next`]'s `Err` arm, not here) does;
    /// an abandoned stream dropped by the caller before draining does not,
    /// per the spec's cancellation semantics (caller cancellation never
    /// trips a circuit, only an upstream timeout does).
    fn finish(&mut self, success: bool, record_circuit: bool) -> StreamCompletion {
        self.finished = true;
        let duration_ms = self.started.elapsed().as_millis() as u64;
        let output_tokens = estimate_tokens(self.output_chars);
        let cost = if success {
            estimate_cost(&self.model, self.input_tokens, output_tokens)
        } else {
            0.0
        };

        let circuit_id = format!("Provider:{}", self.provider_id);
        let circuits = self.circuits.clone();
        let repository = self.repository.clone();
        let budget = self.budget.clone();
        let store = self.store.clone();
        let context = self.context.clone();
        let model = self.model.clone();
        let provider_id = self.provider_id.clone();
        let decision_id = self.decision_id;
        let input_tokens = self.input_tokens;

        tokio::spawn(async move {
            if record_circuit {
                if success {
                    circuits.record_success(&circuit_id).await;
                } else {
                    circuits.record_failure(&circuit_id).await;
                }
            }

            let tokens_per_sec = if duration_ms > 0 {
                output_tokens as f64 / (duration_ms as f64 / 1000.0)
            } else {
                0.0
            };
            repository
                .record_performance(&model.id, success, duration_ms as f64, tokens_per_sec)
                .await;

            if success {
                let usage = UsageRecord {
                    id: Uuid::new_v4(),
                    tenant_id: context.tenant_id.clone(),
                    project_id: context.project_id.clone(),
                    user_id: context.user_id.clone(),
                    model_id: model.id.clone(),
                    provider_id: provider_id.clone(),
                    input_tokens,
                    output_tokens,
                    cost,
                    currency: "USD".to_string(),
                    processing_duration_ms: duration_ms,
                    timestamp: Utc::now(),
                    request_id: decision_id.to_string(),
                    success,
                    operation_type: OperationType::StreamingChatCompletion,
                    metadata: HashMap::new(),
                };
                if let Err(err) = budget.record_usage(usage).await {
                    tracing::warn!(error = %err, "budget debit failed for streaming completion");
                }
            }

            let log = ExecutionLog {
                id: Uuid::new_v4(),
                decision_id,
                tenant_id: context.tenant_id.clone(),
                model_id: model.id.clone(),
                provider_id,
                success,
                fallback_used: false,
                error_class: if success { None } else { Some("stream_interrupted".to_string()) },
                duration_ms,
                timestamp: Utc::now(),
            };
            if let Err(err) = store.append_execution_log(log).await {
                tracing::warn!(error = %err, "failed to append execution log for stream");
            }
        });

        StreamCompletion {
            decision_id: self.decision_id,
            model_id: self.model.id.clone(),
            provider_id: self.provider_id.clone(),
            input_tokens: self.input_tokens,
            output_tokens,
            cost,
            duration_ms,
            success,
        }
    }
}

impl Stream for ExecutionStream {
    type Item = Result<crate::models::StreamChunk, ProviderError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match self.inner.as_mut().poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(None) => {
                let completion = self.finish(true, true);
                if let Some(tx) = self.completion_tx.take() {
                    let _ = tx.send(completion);
                }
                Poll::Ready(None)
            }
            Poll::Ready(Some(Ok(chunk))) => {
                for choice in &chunk.choices {
                    if let Some(content) = &choice.delta.content {
                        self.output_chars += content.len();
                    }
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(err))) => {
                // A provider-reported error (including a timeout) ends the
                // stream with a real outcome, distinct from the caller
                // dropping it early — always counts against the circuit.
                let completion = self.finish(false, true);
                if let Some(tx) = self.completion_tx.take() {
                    let _ = tx.send(completion);
                }
                Poll::Ready(Some(Err(err)))
            }
        }
    }
}

impl Drop for ExecutionStream {
    fn drop(&mut self) {
        // Reaching Drop while still unfinished means the caller abandoned
        // the stream without draining it to completion or an error — caller
        // cancellation, not an upstream timeout. Don't record a circuit
        // failure for it (per the spec, cancellation only trips the circuit
        // when it was timeout-driven, and a timeout already resolves through
        // `poll_next`'s `Err` arm before ever reaching here).
        if !self.finished {
            if let Some(tx) = self.completion_tx.take() {
                let _ = tx.send(self.finish(false, false));
            }
        }
    }
}

/// The "template method as a concrete pipeline function" entry point: the
/// full `Select -> gate -> invoke -> bookkeep -> (fallback)` pipeline as a
/// plain function rather than a trait hierarchy, for callers that already
/// hold an [`ExecutionEngine`] and just want to run one request through it.
pub async fn execute_request(
    engine: &ExecutionEngine,
    request: ChatRequest,
    context: ArbitrationContext,
    request_id: impl Into<String>,
) -> Result<ExecutionOutcome, ExecutionError> {
    engine.execute(request, context, request_id).await
}
