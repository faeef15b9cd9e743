use crate::circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState,
};
use crate::error::ProviderError;
use crate::models::{
    AudioRequest, AudioResponse, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse,
    ImageRequest, ImageResponse, SpeechRequest, SpeechResponse,
};
use crate::providers::{Provider, ProviderHealth, StreamResult};
use std::sync::Arc;

/// Wrapper that adds circuit breaker functionality to any provider
pub struct CircuitBreakerProvider {
    inner: Arc<dyn Provider>,
    circuit_breaker: CircuitBreaker,
}

impl CircuitBreakerProvider {
    pub fn new(provider: Arc<dyn Provider>, config: CircuitBreakerConfig) -> Self {
        let circuit_breaker =
            CircuitBreaker::new(format!("{}_circuit_breaker", provider.name()), config);

        Self {
            inner: provider,
            circuit_breaker,
        }
    }

    pub fn with_default_config(provider: Arc<dyn Provider>) -> Self {
        Self::new(provider, CircuitBreakerConfig::default())
    }

    pub async fn get_circuit_state(&self) -> CircuitState {
        self.circuit_breaker.get_state().await
    }

    pub async fn force_open(&self) {
        self.circuit_breaker.force_open().await;
    }

    pub async fn force_closed(&self) {
        self.circuit_breaker.force_closed().await;
    }

    pub async fn get_circuit_breaker_metrics(
        &self,
    ) -> Result<
        crate::circuit_breaker::CircuitBreakerMetrics,
        crate::circuit_breaker::CircuitBreakerError,
    > {
        Ok(self.circuit_breaker.get_metrics().await)
    }

    async fn handle_circuit_breaker_error(&self, error: CircuitBreakerError) -> ProviderError {
        match error {
            CircuitBreakerError::Open => {
                tracing::warn!("Provider {} circuit breaker is OPEN", self.inner.name());
                ProviderError::ServiceUnavailable
            }
            CircuitBreakerError::Timeout => {
                tracing::warn!("Provider {} operation timed out", self.inner.name());
                ProviderError::Timeout
            }
        }
    }
}

#[async_trait::async_trait]
impl Provider for CircuitBreakerProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn supports_streaming(&self) -> bool {
        self.inner.supports_streaming()
    }

    fn supports_function_calling(&self) -> bool {
        self.inner.supports_function_calling()
    }

    fn supported_models(&self) -> Vec<String> {
        self.inner.supported_models()
    }

    async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let inner = self.inner.clone();
        let operation = || async move { inner.chat_completion(request).await };

        match self.circuit_breaker.call(operation).await {
            Ok(response) => Ok(response),
            Err(cb_error) => Err(self.handle_circuit_breaker_error(cb_error).await),
        }
    }

    async fn stream_chat_completion(
        &self,
        request: ChatRequest,
    ) -> Result<StreamResult, ProviderError> {
        // For streaming, we check the circuit breaker state but don't wrap the stream
        // The stream itself will handle individual chunk failures
        let state = self.circuit_breaker.get_state().await;
        if state == CircuitState::Open {
            return Err(ProviderError::ServiceUnavailable);
        }

        // Attempt to start the stream
        let inner = self.inner.clone();
        let operation = || async move { inner.stream_chat_completion(request).await };

        match self.circuit_breaker.call(operation).await {
            Ok(stream) => Ok(stream),
            Err(cb_error) => Err(self.handle_circuit_breaker_error(cb_error).await),
        }
    }

    async fn embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, ProviderError> {
        let inner = self.inner.clone();
        let operation = || async move { inner.embedding(request).await };

        match self.circuit_breaker.call(operation).await {
            Ok(response) => Ok(response),
            Err(cb_error) => Err(self.handle_circuit_breaker_error(cb_error).await),
        }
    }

    async fn image_generation(
        &self,
        request: ImageRequest,
    ) -> Result<ImageResponse, ProviderError> {
        let inner = self.inner.clone();
        let operation = || async move { inner.image_generation(request).await };

        match self.circuit_breaker.call(operation).await {
            Ok(response) => Ok(response),
            Err(cb_error) => Err(self.handle_circuit_breaker_error(cb_error).await),
        }
    }

    async fn audio_transcription(
        &self,
        request: AudioRequest,
    ) -> Result<AudioResponse, ProviderError> {
        let inner = self.inner.clone();
        let operation = || async move { inner.audio_transcription(request).await };

        match self.circuit_breaker.call(operation).await {
            Ok(response) => Ok(response),
            Err(cb_error) => Err(self.handle_circuit_breaker_error(cb_error).await),
        }
    }

    async fn text_to_speech(
        &self,
        request: SpeechRequest,
    ) -> Result<SpeechResponse, ProviderError> {
        let inner = self.inner.clone();
        let operation = || async move { inner.text_to_speech(request).await };

        match self.circuit_breaker.call(operation).await {
            Ok(response) => Ok(response),
            Err(cb_error) => Err(self.handle_circuit_breaker_error(cb_error).await),
        }
    }

    async fn health_check(&self) -> Result<ProviderHealth, ProviderError> {
        let inner = self.inner.clone();
        let operation = || async move { inner.health_check().await };

        match self.circuit_breaker.call(operation).await {
            Ok(health) => Ok(health),
            Err(cb_error) => Err(self.handle_circuit_breaker_error(cb_error).await),
        }
    }
}
