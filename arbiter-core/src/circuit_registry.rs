//! # Circuit Breaker Registry
//!
//! A keyed, sliding-window circuit breaker, one [`Circuit`] per upstream
//! (`"Provider:<id>"` or `"Model:<id>"`). This generalizes
//! [`crate::circuit_breaker::CircuitBreaker`]'s consecutive-failure counter
//! and single `Arc<RwLock<..>>` state into a registry of independently
//! locked circuits with a time-windowed failure/success history, a
//! percentage trip condition, a configurable half-open success threshold,
//! and an event feed — the shape the arbitration/execution cores actually
//! need.
//!
//! Concurrency: each circuit has its own `tokio::sync::RwLock`, so
//! transitions for one upstream never contend with another. A reader can
//! call `get_state` cheaply; the Open→HalfOpen timeout check mutates state
//! and so takes the write lock, the same pattern
//! [`crate::circuit_breaker::CircuitBreaker::can_execute`] uses.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::store::{CircuitBreakerEvent, CircuitEventKind, Store, StoreError};

/// Circuit breaker operating state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Tunables for a circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub failure_percentage_threshold: f64,
    #[serde(with = "crate::common::duration_serde")]
    pub failure_threshold_time_window: std::time::Duration,
    #[serde(with = "crate::common::duration_serde")]
    pub reset_timeout: std::time::Duration,
    pub max_half_open_test_requests: u32,
    pub success_threshold: u32,
    pub enable_sliding_window: bool,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            failure_percentage_threshold: 50.0,
            failure_threshold_time_window: std::time::Duration::from_secs(60),
            reset_timeout: std::time::Duration::from_secs(30),
            max_half_open_test_requests: 3,
            success_threshold: 2,
            enable_sliding_window: true,
        }
    }
}

/// A single outcome entry in a circuit's sliding window.
#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    at: DateTime<Utc>,
    success: bool,
}

struct CircuitInner {
    state: CircuitState,
    window: Vec<WindowEntry>,
    success_count: u64,
    failure_count: u64,
    consecutive_failures: u32,
    consecutive_half_open_successes: u32,
    total_requests: u64,
    last_success: Option<DateTime<Utc>>,
    last_failure: Option<DateTime<Utc>>,
    last_state_change: DateTime<Utc>,
    half_open_test_count: u32,
}

impl CircuitInner {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: CircuitState::Closed,
            window: Vec::new(),
            success_count: 0,
            failure_count: 0,
            consecutive_failures: 0,
            consecutive_half_open_successes: 0,
            total_requests: 0,
            last_success: None,
            last_failure: None,
            last_state_change: now,
            half_open_test_count: 0,
        }
    }

    fn prune(&mut self, config: &CircuitBreakerConfig, now: DateTime<Utc>) {
        let buffer = chrono::Duration::seconds(5);
        let cutoff = now
            - chrono::Duration::from_std(config.failure_threshold_time_window).unwrap_or_default()
            - buffer;
        self.window.retain(|e| e.at >= cutoff);
    }

    fn recent_counts(&self, config: &CircuitBreakerConfig, now: DateTime<Utc>) -> (u32, u32) {
        let cutoff = now
            - chrono::Duration::from_std(config.failure_threshold_time_window).unwrap_or_default();
        let mut failures = 0u32;
        let mut successes = 0u32;
        for entry in self.window.iter().filter(|e| e.at >= cutoff) {
            if entry.success {
                successes += 1;
            } else {
                failures += 1;
            }
        }
        (failures, successes)
    }
}

/// A keyed circuit. Cheap to clone (`Arc` internals); safe to share across
/// tasks dispatching to the same upstream.
pub struct Circuit {
    id: String,
    config: CircuitBreakerConfig,
    inner: RwLock<CircuitInner>,
    events: broadcast::Sender<CircuitBreakerEvent>,
}

impl Circuit {
    fn new(id: String, config: CircuitBreakerConfig) -> Self {
        let (tx, _rx) = broadcast::channel(64);
        Self {
            id,
            config,
            inner: RwLock::new(CircuitInner::new(Utc::now())),
            events: tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CircuitBreakerEvent> {
        self.events.subscribe()
    }

    /// Build the event, broadcast it to any live subscribers (best-effort,
    /// for dashboards watching in real time), and return it so the caller
    /// can persist it too. A subscriber that wasn't listening yet would
    /// never see a broadcast-only send, so persistence can't depend on it.
    fn emit(&self, kind: CircuitEventKind, details: impl Into<String>) -> CircuitBreakerEvent {
        let event = CircuitBreakerEvent {
            id: uuid::Uuid::new_v4(),
            circuit_id: self.id.clone(),
            kind,
            details: details.into(),
            timestamp: Utc::now(),
        };
        let _ = self.events.send(event.clone());
        event
    }

    /// Evaluate (and, if needed, lazily transition) state, then decide
    /// whether a call is allowed right now. Returns any event emitted by a
    /// lazy transition alongside the allow decision.
    pub async fn allow(&self) -> (bool, Vec<CircuitBreakerEvent>) {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        inner.prune(&self.config, now);

        match inner.state {
            CircuitState::Closed => (true, Vec::new()),
            CircuitState::Open => {
                let elapsed = now - inner.last_state_change;
                if elapsed
                    >= chrono::Duration::from_std(self.config.reset_timeout).unwrap_or_default()
                {
                    inner.state = CircuitState::HalfOpen;
                    inner.last_state_change = now;
                    inner.half_open_test_count = 0;
                    inner.consecutive_half_open_successes = 0;
                    drop(inner);
                    let event = self.emit(CircuitEventKind::HalfOpen, "reset timeout elapsed");
                    (true, vec![event])
                } else {
                    (false, Vec::new())
                }
            }
            CircuitState::HalfOpen => {
                if inner.half_open_test_count < self.config.max_half_open_test_requests {
                    inner.half_open_test_count += 1;
                    (true, Vec::new())
                } else {
                    (false, Vec::new())
                }
            }
        }
    }

    /// Record a successful call outcome. Returns any events the transition
    /// emitted.
    pub async fn record_success(&self) -> Vec<CircuitBreakerEvent> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        inner.total_requests += 1;
        inner.success_count += 1;
        inner.consecutive_failures = 0;
        inner.last_success = Some(now);
        if self.config.enable_sliding_window {
            inner.window.push(WindowEntry { at: now, success: true });
        }

        if inner.state == CircuitState::HalfOpen {
            inner.consecutive_half_open_successes += 1;
            if inner.consecutive_half_open_successes >= self.config.success_threshold {
                inner.state = CircuitState::Closed;
                inner.last_state_change = now;
                inner.consecutive_half_open_successes = 0;
                inner.half_open_test_count = 0;
                drop(inner);
                let event =
                    self.emit(CircuitEventKind::Closed, "half-open success threshold reached");
                return vec![event];
            }
        }
        Vec::new()
    }

    /// Record a failed call outcome, possibly tripping the circuit. Returns
    /// any events the transition emitted.
    pub async fn record_failure(&self) -> Vec<CircuitBreakerEvent> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        inner.total_requests += 1;
        inner.failure_count += 1;
        inner.consecutive_failures += 1;
        inner.last_failure = Some(now);
        if self.config.enable_sliding_window {
            inner.window.push(WindowEntry { at: now, success: false });
        }
        inner.prune(&self.config, now);

        match inner.state {
            CircuitState::Closed => {
                let (failures, successes) = inner.recent_counts(&self.config, now);
                let total = failures + successes;
                let pct = if total > 0 {
                    failures as f64 / total as f64 * 100.0
                } else {
                    0.0
                };
                let trips = failures >= self.config.failure_threshold
                    || pct >= self.config.failure_percentage_threshold;
                if trips {
                    inner.state = CircuitState::Open;
                    inner.last_state_change = now;
                    drop(inner);
                    let opened = self.emit(
                        CircuitEventKind::Opened,
                        format!("{failures} failures ({pct:.1}%) within window"),
                    );
                    let failure = self.emit(CircuitEventKind::Failure, "trip failure");
                    return vec![opened, failure];
                }
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.last_state_change = now;
                inner.half_open_test_count = 0;
                inner.consecutive_half_open_successes = 0;
                drop(inner);
                let event = self.emit(CircuitEventKind::Opened, "half-open probe failed");
                return vec![event];
            }
            CircuitState::Open => {}
        }
        drop(inner);
        vec![self.emit(CircuitEventKind::Failure, "failure recorded")]
    }

    pub async fn state(&self) -> CircuitState {
        // Evaluate the lazy Open->HalfOpen transition as part of a state read too,
        // so callers polling `state()` see an up to date picture.
        self.allow_peek().await
    }

    async fn allow_peek(&self) -> CircuitState {
        let now = Utc::now();
        let inner = self.inner.read().await;
        if inner.state == CircuitState::Open {
            let elapsed = now - inner.last_state_change;
            if elapsed >= chrono::Duration::from_std(self.config.reset_timeout).unwrap_or_default()
            {
                return CircuitState::HalfOpen;
            }
        }
        inner.state
    }

    pub async fn reset(&self) -> CircuitBreakerEvent {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        *inner = CircuitInner::new(now);
        drop(inner);
        self.emit(CircuitEventKind::Reset, "manual reset")
    }

    pub async fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.inner.read().await;
        CircuitSnapshot {
            id: self.id.clone(),
            state: inner.state,
            success_count: inner.success_count,
            failure_count: inner.failure_count,
            consecutive_failures: inner.consecutive_failures,
            total_requests: inner.total_requests,
            last_success: inner.last_success,
            last_failure: inner.last_failure,
            last_state_change: inner.last_state_change,
        }
    }

    async fn touched_recently(&self, idle_for: chrono::Duration, now: DateTime<Utc>) -> bool {
        let inner = self.inner.read().await;
        let last_touch = inner.last_success.max(inner.last_failure).unwrap_or(inner.last_state_change);
        now - last_touch < idle_for
    }
}

/// Point-in-time view of a circuit's counters, for metrics/admin endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitSnapshot {
    pub id: String,
    pub state: CircuitState,
    pub success_count: u64,
    pub failure_count: u64,
    pub consecutive_failures: u32,
    pub total_requests: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub last_state_change: DateTime<Utc>,
}

/// Process-wide registry of circuits keyed by circuit id, with a janitor
/// that prunes circuits untouched for 30 minutes.
pub struct CircuitRegistry {
    circuits: DashMap<String, Arc<Circuit>>,
    default_config: CircuitBreakerConfig,
    store: Option<Arc<dyn Store>>,
}

impl CircuitRegistry {
    pub fn new(default_config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: DashMap::new(),
            default_config,
            store: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn shared(default_config: CircuitBreakerConfig) -> Arc<Self> {
        Arc::new(Self::new(default_config))
    }

    pub fn get_or_create(&self, circuit_id: &str) -> Arc<Circuit> {
        self.circuits
            .entry(circuit_id.to_string())
            .or_insert_with(|| Arc::new(Circuit::new(circuit_id.to_string(), self.default_config.clone())))
            .clone()
    }

    pub fn get_or_create_with_config(
        &self,
        circuit_id: &str,
        config: CircuitBreakerConfig,
    ) -> Arc<Circuit> {
        self.circuits
            .entry(circuit_id.to_string())
            .or_insert_with(|| Arc::new(Circuit::new(circuit_id.to_string(), config)))
            .clone()
    }

    /// Fail-safe to `Closed` (allow) if the store
    /// backing this registry is unavailable.
    pub async fn allow(&self, circuit_id: &str) -> bool {
        let (allowed, events) = self.get_or_create(circuit_id).allow().await;
        self.persist_events(events).await;
        allowed
    }

    pub async fn record_success(&self, circuit_id: &str) {
        let events = self.get_or_create(circuit_id).record_success().await;
        self.persist_events(events).await;
    }

    pub async fn record_failure(&self, circuit_id: &str) {
        let events = self.get_or_create(circuit_id).record_failure().await;
        self.persist_events(events).await;
    }

    pub async fn reset(&self, circuit_id: &str) {
        let event = self.get_or_create(circuit_id).reset().await;
        self.persist_events(vec![event]).await;
    }

    /// Append events emitted by a state transition to the store, in the
    /// order they were produced. The events are handed back from the
    /// transition call itself rather than recovered from the broadcast
    /// channel, since a subscriber that attaches after the send happened
    /// would never observe it.
    async fn persist_events(&self, events: Vec<CircuitBreakerEvent>) {
        if let Some(store) = &self.store {
            for event in events {
                let _: Result<(), StoreError> = store.append_circuit_event(event).await;
            }
        }
    }

    pub async fn snapshot(&self, circuit_id: &str) -> Option<CircuitSnapshot> {
        let circuit = self.circuits.get(circuit_id).map(|c| c.clone())?;
        Some(circuit.snapshot().await)
    }

    /// Snapshot every circuit currently tracked by the registry, for admin
    /// endpoints that list circuit-breaker state across all providers.
    pub async fn snapshot_all(&self) -> Vec<CircuitSnapshot> {
        let circuits: Vec<Arc<Circuit>> = self.circuits.iter().map(|e| e.value().clone()).collect();
        let mut snapshots = Vec::with_capacity(circuits.len());
        for circuit in circuits {
            snapshots.push(circuit.snapshot().await);
        }
        snapshots
    }

    /// Remove circuits that haven't recorded an outcome in `idle_for`.
    /// Intended to be driven by a `tokio::time::interval` background task,
    /// every 30 minutes.
    pub async fn prune_idle(&self, idle_for: chrono::Duration) {
        let now = Utc::now();
        let mut stale = Vec::new();
        for entry in self.circuits.iter() {
            if !entry.value().touched_recently(idle_for, now).await {
                stale.push(entry.key().clone());
            }
        }
        for key in stale {
            self.circuits.remove(&key);
        }
    }

    /// Spawn the janitor loop. Returns a handle the caller can abort on
    /// shutdown.
    pub fn spawn_janitor(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                ticker.tick().await;
                registry.prune_idle(chrono::Duration::minutes(30)).await;
            }
        })
    }
}
