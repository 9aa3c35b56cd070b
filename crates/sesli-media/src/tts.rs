//! Speech synthesis over an ElevenLabs-style HTTP endpoint.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use sesli_core::config::TtsConfig;
use sesli_core::error::{Result, SesliError};

use crate::lang;

/// Synthesis backend contract.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize a text fragment to encoded audio bytes. When `voice`
    /// is `None` a voice is chosen from the detected language.
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Vec<u8>>;

    /// File variant, used by the non-streaming path.
    async fn synthesize_to_file(
        &self,
        text: &str,
        path: &Path,
        voice: Option<&str>,
    ) -> Result<()> {
        let bytes = self.synthesize(text, voice).await?;
        tokio::fs::write(path, bytes).await.map_err(SesliError::Io)
    }
}

/// Build the synthesis request URL for a given voice.
pub fn build_tts_url(voice: &str) -> String {
    format!("https://api.elevenlabs.io/v1/text-to-speech/{voice}")
}

/// HTTP TTS client.
pub struct HttpTtsClient {
    config: TtsConfig,
    client: reqwest::Client,
}

impl HttpTtsClient {
    pub fn new(config: TtsConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Voice precedence: explicit hint, then configured default, then
    /// language detection on the fragment itself.
    fn pick_voice(&self, text: &str, voice: Option<&str>) -> String {
        if let Some(v) = voice {
            return v.to_string();
        }
        if let Some(v) = self.config.default_voice.as_deref() {
            return v.to_string();
        }
        lang::voice_for(lang::detect_language(text)).to_string()
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpTtsClient {
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(SesliError::Synthesis("empty text fragment".into()));
        }

        let api_key = self
            .config
            .resolve_api_key()
            .ok_or_else(|| SesliError::Config("no TTS API key configured".into()))?;

        let voice = self.pick_voice(text, voice);
        let model = self
            .config
            .default_model
            .as_deref()
            .unwrap_or("eleven_turbo_v2_5");
        let url = build_tts_url(&voice);

        debug!(%voice, model, text_len = text.len(), "synthesizing fragment");

        let resp = self
            .client
            .post(&url)
            .header("xi-api-key", &api_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "text": text,
                "model_id": model,
                "output_format": "mp3_44100_128",
            }))
            .send()
            .await
            .map_err(|e| SesliError::Synthesis(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(SesliError::Synthesis(format!(
                "TTS API error {status}: {body}"
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SesliError::Synthesis(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_construction() {
        let url = build_tts_url("Rachel");
        assert!(url.starts_with("https://api.elevenlabs.io"));
        assert!(url.ends_with("/Rachel"));
    }

    #[test]
    fn test_voice_precedence() {
        let client = HttpTtsClient::new(TtsConfig {
            default_voice: Some("Configured".into()),
            ..Default::default()
        });
        assert_eq!(client.pick_voice("hello", Some("Hint")), "Hint");
        assert_eq!(client.pick_voice("hello", None), "Configured");

        let bare = HttpTtsClient::new(TtsConfig::default());
        assert_eq!(bare.pick_voice("Salam, necəsən?", None), "Sarah");
        assert_eq!(bare.pick_voice("Hello there", None), "Rachel");
    }

    #[tokio::test]
    async fn test_empty_fragment_rejected() {
        let client = HttpTtsClient::new(TtsConfig {
            api_key: Some("test".into()),
            ..Default::default()
        });
        let err = client.synthesize("   ", None).await.unwrap_err();
        assert!(matches!(err, SesliError::Synthesis(_)));
    }

    /// The default `synthesize_to_file` writes whatever `synthesize`
    /// returns.
    #[tokio::test]
    async fn test_file_variant_writes_bytes() {
        struct Fixed;

        #[async_trait]
        impl SpeechSynthesizer for Fixed {
            async fn synthesize(&self, _text: &str, _voice: Option<&str>) -> Result<Vec<u8>> {
                Ok(vec![0xAA, 0xBB])
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp3");
        Fixed.synthesize_to_file("hi", &path, None).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![0xAA, 0xBB]);
    }
}
