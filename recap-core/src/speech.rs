//! Speech module — text-to-speech client (ElevenLabs API)
//!
//! Constructed once at startup and handed to the HTTP layer — the client is
//! injected, never a lazy global resolved per request.

use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Speech synthesis errors.
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Speech API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Missing API key")]
    MissingApiKey,
}

/// ElevenLabs client configuration. The key comes from the environment at
/// process startup; the rest from the `[speech]` config section.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub api_key: String,
    pub model_id: String,
    pub output_format: String,
}

impl SpeechConfig {
    pub fn new(api_key: Option<String>, model_id: String, output_format: String) -> Self {
        let api_key = api_key
            .or_else(|| std::env::var("ELEVENLABS_API_KEY").ok())
            .unwrap_or_default();

        Self {
            api_key,
            model_id,
            output_format,
        }
    }
}

/// An available synthesis voice, as listed by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<Voice>,
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct SpeechErrorResponse {
    detail: Option<SpeechErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct SpeechErrorDetail {
    message: String,
}

// ============================================================================
// SpeechClient
// ============================================================================

/// ElevenLabs text-to-speech client.
#[derive(Debug, Clone)]
pub struct SpeechClient {
    client: Client,
    config: SpeechConfig,
    base_url: String,
}

impl SpeechClient {
    pub fn new(config: SpeechConfig) -> Result<Self, SpeechError> {
        Self::with_base_url(config, "https://api.elevenlabs.io/v1".to_string())
    }

    /// Create a client with a custom base URL (configuration / testing).
    pub fn with_base_url(config: SpeechConfig, base_url: String) -> Result<Self, SpeechError> {
        if config.api_key.is_empty() {
            return Err(SpeechError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Convert text to speech, returning the raw audio bytes.
    pub async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, SpeechError> {
        let url = format!(
            "{}/text-to-speech/{}?output_format={}",
            self.base_url, voice_id, self.config.output_format
        );

        let body = SynthesizeRequest {
            text,
            model_id: &self.config.model_id,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", self.config.api_key.as_str())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.api_error(status.as_u16(), response).await);
        }

        Ok(response.bytes().await?)
    }

    /// List the voices available to this account.
    pub async fn voices(&self) -> Result<Vec<Voice>, SpeechError> {
        let url = format!("{}/voices", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("xi-api-key", self.config.api_key.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.api_error(status.as_u16(), response).await);
        }

        let voices: VoicesResponse = response.json().await?;
        Ok(voices.voices)
    }

    async fn api_error(&self, code: u16, response: reqwest::Response) -> SpeechError {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<SpeechErrorResponse>(&body)
            .ok()
            .and_then(|e| e.detail)
            .map(|d| d.message)
            .unwrap_or(body);

        tracing::error!(code = code, message = %message, "Speech API error");

        SpeechError::Api { code, message }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> SpeechConfig {
        SpeechConfig {
            api_key: "test-speech-key".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_44100_128".to_string(),
        }
    }

    #[tokio::test]
    async fn test_synthesize_returns_audio_bytes() {
        let mock_server = MockServer::start().await;
        let client = SpeechClient::with_base_url(test_config(), mock_server.uri())
            .expect("Failed to create client");

        let audio = vec![0x49u8, 0x44, 0x33, 0x04, 0x00];

        Mock::given(method("POST"))
            .and(path("/text-to-speech/JBFqnCBsd6RMkjVDRZzb"))
            .and(query_param("output_format", "mp3_44100_128"))
            .and(header("xi-api-key", "test-speech-key"))
            .and(body_json(serde_json::json!({
                "text": "Hello there",
                "model_id": "eleven_multilingual_v2"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(audio.clone()))
            .mount(&mock_server)
            .await;

        let result = client.synthesize("Hello there", "JBFqnCBsd6RMkjVDRZzb").await;

        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result.err());
        assert_eq!(result.unwrap().as_ref(), audio.as_slice());
    }

    #[tokio::test]
    async fn test_synthesize_surfaces_provider_detail_on_error() {
        let mock_server = MockServer::start().await;
        let client = SpeechClient::with_base_url(test_config(), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "detail": { "status": "invalid_api_key", "message": "Invalid API key" }
            })))
            .mount(&mock_server)
            .await;

        let err = client
            .synthesize("Hello", "JBFqnCBsd6RMkjVDRZzb")
            .await
            .expect_err("Expected API error");

        match err {
            SpeechError::Api { code, message } => {
                assert_eq!(code, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_voices_parses_provider_listing() {
        let mock_server = MockServer::start().await;
        let client = SpeechClient::with_base_url(test_config(), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("GET"))
            .and(path("/voices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "voices": [
                    {
                        "voice_id": "JBFqnCBsd6RMkjVDRZzb",
                        "name": "George",
                        "category": "premade",
                        "description": "warm narration"
                    },
                    { "voice_id": "abc123" }
                ]
            })))
            .mount(&mock_server)
            .await;

        let voices = client.voices().await.expect("Expected voice listing");

        assert_eq!(voices.len(), 2);
        assert_eq!(voices[0].voice_id, "JBFqnCBsd6RMkjVDRZzb");
        assert_eq!(voices[0].name.as_deref(), Some("George"));
        assert!(voices[1].name.is_none());
    }

    #[tokio::test]
    async fn test_client_fails_with_missing_api_key() {
        let config = SpeechConfig {
            api_key: String::new(),
            ..test_config()
        };
        let result = SpeechClient::new(config);

        assert!(matches!(result, Err(SpeechError::MissingApiKey)));
    }
}
