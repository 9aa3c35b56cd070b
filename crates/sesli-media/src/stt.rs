//! Speech-to-text over an OpenAI-compatible transcription endpoint.

use async_trait::async_trait;
use tracing::debug;

use sesli_core::config::SttConfig;
use sesli_core::error::{Result, SesliError};

/// Supported inbound audio containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFormat {
    #[default]
    Webm,
    Wav,
    Ogg,
    Mp3,
}

impl AudioFormat {
    /// Parse a client-supplied container hint; unknown hints fall back
    /// to webm (what browser recorders produce).
    pub fn from_hint(hint: &str) -> Self {
        match hint.to_ascii_lowercase().as_str() {
            "wav" => Self::Wav,
            "ogg" => Self::Ogg,
            "mp3" => Self::Mp3,
            _ => Self::Webm,
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Webm => "audio.webm",
            Self::Wav => "audio.wav",
            Self::Ogg => "audio.ogg",
            Self::Mp3 => "audio.mp3",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Webm => "audio/webm",
            Self::Wav => "audio/wav",
            Self::Ogg => "audio/ogg",
            Self::Mp3 => "audio/mpeg",
        }
    }
}

/// One finite audio payload. Owned by the turn processing it; moved
/// into the STT call and released there on every exit path.
#[derive(Debug)]
pub struct AudioBuffer {
    pub data: Vec<u8>,
    pub format: AudioFormat,
}

impl AudioBuffer {
    pub fn new(data: Vec<u8>, format: AudioFormat) -> Self {
        Self { data, format }
    }
}

/// Transcription backend contract.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Convert a finite audio buffer into text. Decode errors, empty
    /// audio, and backend failures surface as
    /// [`SesliError::Transcription`]; partial text is never returned
    /// silently.
    async fn transcribe(&self, audio: AudioBuffer) -> Result<String>;
}

/// Get the transcription API URL for a given provider.
pub fn provider_url(config: &SttConfig) -> &'static str {
    match config.provider.as_str() {
        "openai" => "https://api.openai.com/v1/audio/transcriptions",
        _ => "https://api.groq.com/openai/v1/audio/transcriptions",
    }
}

/// Collapse runs of whitespace the transcription backend tends to leave
/// between segments.
pub fn clean_transcription(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// HTTP STT client (Groq or OpenAI Whisper endpoints).
pub struct HttpSttClient {
    config: SttConfig,
    client: reqwest::Client,
}

impl HttpSttClient {
    pub fn new(config: SttConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SpeechToText for HttpSttClient {
    async fn transcribe(&self, audio: AudioBuffer) -> Result<String> {
        if audio.data.is_empty() {
            return Err(SesliError::Transcription("empty audio payload".into()));
        }

        let api_key = self
            .config
            .resolve_api_key()
            .ok_or_else(|| SesliError::Config("no transcription API key configured".into()))?;

        let url = provider_url(&self.config);
        let model = self.config.model.as_deref().unwrap_or("whisper-large-v3");

        debug!(url, model, bytes = audio.data.len(), "sending audio for transcription");

        let part = reqwest::multipart::Part::bytes(audio.data)
            .file_name(audio.format.file_name())
            .mime_str(audio.format.mime())
            .map_err(|e| SesliError::Transcription(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .text("model", model.to_string())
            .text("response_format", "text")
            .part("file", part);

        let resp = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {api_key}"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SesliError::Transcription(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(SesliError::Transcription(format!(
                "transcription API error {status}: {body}"
            )));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| SesliError::Transcription(e.to_string()))?;
        let text = clean_transcription(&text);

        if text.is_empty() {
            return Err(SesliError::Transcription("empty transcript".into()));
        }
        Ok(text)
    }
}
