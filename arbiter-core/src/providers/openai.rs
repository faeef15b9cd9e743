use crate::error::ProviderError;
use crate::models::{
    AudioRequest, AudioResponse, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse,
    ImageRequest, ImageResponse, SpeechRequest, SpeechResponse, StreamChunk,
};
use crate::providers::{HealthStatus, Provider, ProviderConfig, ProviderHealth, StreamResult};
use async_stream::stream;

use super::http_client::{map_error_response, AuthStrategy, HttpProviderClient};

use std::collections::HashMap;
use std::time::Instant;

/// The reference adapter: OpenAI's wire format is what [`ChatRequest`]/
/// [`ChatResponse`] and friends in [`crate::models`] are already shaped
/// after, so chat/embedding/image requests pass straight through with no
/// translation layer, unlike [`super::anthropic::AnthropicProvider`] or
/// [`super::gemini::GeminiProvider`].
pub struct OpenAIProvider {
    http: HttpProviderClient,
    config: ProviderConfig,
}

impl OpenAIProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let http = HttpProviderClient::new(
            config.timeout,
            config.base_url.clone(),
            "https://api.openai.com/v1",
            &config.headers,
            AuthStrategy::Bearer {
                token: config.api_key.clone(),
            },
        )?;

        Ok(Self { http, config })
    }

    fn map_model(&self, model: &str) -> String {
        self.config
            .model_mapping
            .get(model)
            .cloned()
            .unwrap_or_else(|| model.to_string())
    }
}

#[async_trait::async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn supports_function_calling(&self) -> bool {
        true
    }

    fn supported_models(&self) -> Vec<String> {
        vec![
            "gpt-4o".to_string(),
            "gpt-4o-mini".to_string(),
            "gpt-4-turbo".to_string(),
            "gpt-4".to_string(),
            "gpt-3.5-turbo".to_string(),
            "o1".to_string(),
            "o1-mini".to_string(),
        ]
    }

    async fn chat_completion(
        &self,
        mut request: ChatRequest,
    ) -> Result<ChatResponse, ProviderError> {
        request.model = self.map_model(&request.model);
        request.stream = Some(false);

        let response: ChatResponse =
            self.http.post_json("/chat/completions", &request).await?;
        Ok(response)
    }

    async fn stream_chat_completion(
        &self,
        mut request: ChatRequest,
    ) -> Result<StreamResult, ProviderError> {
        request.model = self.map_model(&request.model);
        request.stream = Some(true);

        let response = self
            .http
            .post_json_raw("/chat/completions", &request)
            .await?;

        if !response.status().is_success() {
            return Err(map_error_response(response).await);
        }

        let stream = Box::pin(stream! {
            let mut bytes_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = futures::StreamExt::next(&mut bytes_stream).await {
                match chunk_result {
                    Ok(chunk) => {
                        let chunk_str = String::from_utf8_lossy(&chunk);
                        buffer.push_str(&chunk_str);

                        while let Some(line_end) = buffer.find('\n') {
                            let line = buffer[..line_end].trim().to_string();
                            buffer = buffer[line_end + 1..].to_string();

                            if let Some(json_str) = line.strip_prefix("data: ") {
                                if json_str == "[DONE]" {
                                    return;
                                }
                                if json_str.is_empty() {
                                    continue;
                                }

                                match serde_json::from_str::<StreamChunk>(json_str) {
                                    Ok(stream_chunk) => yield Ok(stream_chunk),
                                    Err(e) => yield Err(ProviderError::Serialization(e)),
                                }
                            }
                        }
                    }
                    Err(e) => yield Err(ProviderError::Http(e)),
                }
            }
        });

        Ok(stream)
    }

    async fn embedding(
        &self,
        mut request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, ProviderError> {
        request.model = self.map_model(&request.model);
        let response: EmbeddingResponse =
            self.http.post_json("/embeddings", &request).await?;
        Ok(response)
    }

    async fn image_generation(
        &self,
        mut request: ImageRequest,
    ) -> Result<ImageResponse, ProviderError> {
        request.model = request.model.map(|m| self.map_model(&m));
        let response: ImageResponse =
            self.http.post_json("/images/generations", &request).await?;
        Ok(response)
    }

    async fn audio_transcription(
        &self,
        request: AudioRequest,
    ) -> Result<AudioResponse, ProviderError> {
        let model = self.map_model(&request.model);
        let mut form = reqwest::multipart::Form::new()
            .text("model", model)
            .part(
                "file",
                reqwest::multipart::Part::bytes(request.file).file_name("audio.wav"),
            );
        if let Some(language) = request.language {
            form = form.text("language", language);
        }
        if let Some(prompt) = request.prompt {
            form = form.text("prompt", prompt);
        }
        if let Some(response_format) = request.response_format {
            form = form.text("response_format", response_format);
        }
        if let Some(temperature) = request.temperature {
            form = form.text("temperature", temperature.to_string());
        }

        let response = self
            .http
            .post_multipart("/audio/transcriptions", form)
            .await?;
        if !response.status().is_success() {
            return Err(map_error_response(response).await);
        }
        let text = response.text().await?;
        match serde_json::from_str::<AudioResponse>(&text) {
            Ok(parsed) => Ok(parsed),
            Err(_) => Ok(AudioResponse {
                text,
                language: None,
                duration: None,
                words: None,
                segments: None,
            }),
        }
    }

    async fn text_to_speech(
        &self,
        mut request: SpeechRequest,
    ) -> Result<SpeechResponse, ProviderError> {
        request.model = self.map_model(&request.model);
        let response = self.http.post_json_raw("/audio/speech", &request).await?;
        if !response.status().is_success() {
            return Err(map_error_response(response).await);
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();
        let audio = response.bytes().await?.to_vec();
        Ok(SpeechResponse {
            audio,
            content_type,
        })
    }

    async fn health_check(&self) -> Result<ProviderHealth, ProviderError> {
        let start = Instant::now();

        let response = self.http.get_json::<serde_json::Value>("/models").await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match response {
            Ok(_) => Ok(ProviderHealth {
                status: HealthStatus::Healthy,
                latency_ms: Some(latency_ms),
                error_rate: 0.0,
                last_check: chrono::Utc::now(),
                details: HashMap::new(),
            }),
            Err(e) => {
                let mut details = HashMap::new();
                details.insert("error".to_string(), e.to_string());

                Ok(ProviderHealth {
                    status: HealthStatus::Degraded,
                    latency_ms: Some(latency_ms),
                    error_rate: 1.0,
                    last_check: chrono::Utc::now(),
                    details,
                })
            }
        }
    }
}
