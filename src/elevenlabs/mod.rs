use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::config::Config;
use crate::tts::Synthesizer;
use crate::voice::VoiceBinding;

mod api;

#[derive(Debug)]
struct ElevenLabsInner {
    client: reqwest::Client,
    base: String,
}

/// HTTP client for the ElevenLabs speech-synthesis and voice-cloning API.
#[derive(Clone, Debug)]
pub struct ElevenLabs {
    inner: Arc<ElevenLabsInner>,
}

impl ElevenLabs {
    pub fn new(api_key: &str, base: &str, timeout: Duration) -> Result<Self> {
        // Missing credentials fail here, once, before any per-segment work.
        if api_key.trim().is_empty() {
            return Err(anyhow!("ElevenLabs API key is not configured"));
        }

        let mut key = HeaderValue::from_str(api_key)
            .with_context(|| "API key contains invalid header characters")?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("xi-api-key", key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .with_context(|| "Failed to build HTTP client")?;

        Ok(Self {
            inner: Arc::new(ElevenLabsInner {
                client,
                base: base.trim_end_matches('/').to_owned(),
            }),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.elevenlabs_api_key,
            &config.elevenlabs_api_base,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Uploads a recorded sample and returns the opaque id of the new
    /// cloned voice.
    pub async fn clone_voice(&self, name: &str, description: &str, audio: Vec<u8>) -> Result<String> {
        let labels = serde_json::json!({
            "accent": "danish",
            "description": "Danish speaker reading sample text",
            "use_case": "audiobook",
        });

        let form = Form::new()
            .text("name", name.to_owned())
            .text("description", description.to_owned())
            .text("labels", labels.to_string())
            .part(
                "files",
                Part::bytes(audio)
                    .file_name("voice-recording.wav")
                    .mime_str("audio/wav")
                    .with_context(|| "Failed to build multipart body")?,
            );

        let response = self
            .inner
            .client
            .post(format!("{}/v1/voices/add", self.inner.base))
            .multipart(form)
            .send()
            .await
            .with_context(|| "Failed to reach voice cloning endpoint")?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let added: api::AddVoiceResponse = response
            .json()
            .await
            .with_context(|| "Voice cloning response was not well-formatted")?;

        debug!(voice_id = %added.voice_id, "voice cloned");

        Ok(added.voice_id)
    }
}

#[async_trait]
impl Synthesizer for ElevenLabs {
    async fn synthesize(&self, binding: &VoiceBinding, text: &str) -> Result<Bytes> {
        let body = api::TtsRequest {
            text,
            model_id: &binding.model_id,
            voice_settings: binding.settings,
            language_code: binding.language_code,
        };

        let response = self
            .inner
            .client
            .post(format!(
                "{}/v1/text-to-speech/{}",
                self.inner.base, binding.voice_id
            ))
            .header(ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await
            .with_context(|| {
                format!("Failed to reach text-to-speech endpoint with {}", binding.model_id)
            })?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        response
            .bytes()
            .await
            .with_context(|| "Failed to read synthesized audio body")
    }
}

async fn api_error(response: reqwest::Response) -> anyhow::Error {
    let status = response.status();

    match response.text().await {
        Ok(body) => match serde_json::from_str::<api::ApiError>(&body) {
            Ok(err) => anyhow!(
                "ElevenLabs API error ({status}): {} [{}]",
                err.detail.message,
                err.detail.status
            ),
            Err(_) => anyhow!("ElevenLabs API error ({status}): {body}"),
        },
        Err(e) => anyhow!("ElevenLabs API error ({status}): {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Character;
    use crate::voice;

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(ElevenLabs::new("  ", "https://api.example", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            ElevenLabs::new("key", "https://api.example/", Duration::from_secs(5)).unwrap();

        assert_eq!(client.inner.base, "https://api.example");
    }

    #[test]
    fn test_tts_request_omits_absent_language_code() {
        let binding = voice::resolve(Character::Narrator, "v", "eleven_multilingual_v2");
        let body = api::TtsRequest {
            text: "Hej",
            model_id: &binding.model_id,
            voice_settings: binding.settings,
            language_code: binding.language_code,
        };
        let json = serde_json::to_string(&body).unwrap();

        assert!(!json.contains("language_code"));
    }

    #[test]
    fn test_tts_request_includes_turbo_language_code() {
        let binding = voice::resolve(Character::Narrator, "v", "eleven_turbo_v2_5");
        let body = api::TtsRequest {
            text: "Hej",
            model_id: &binding.model_id,
            voice_settings: binding.settings,
            language_code: binding.language_code,
        };
        let json = serde_json::to_string(&body).unwrap();

        assert!(json.contains("\"language_code\":\"da\""));
    }

    #[test]
    fn test_api_error_body_parses() {
        let err: api::ApiError = serde_json::from_str(
            r#"{"detail":{"status":"invalid_api_key","message":"Invalid API key."}}"#,
        )
        .unwrap();

        assert_eq!(err.detail.status, "invalid_api_key");
    }
}
