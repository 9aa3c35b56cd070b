//! OpenAI-compatible chat completions client (Groq, OpenAI, Ollama).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio_stream::StreamExt;
use tracing::{debug, trace};

use sesli_core::config::LlmConfig;
use sesli_core::error::{Result, SesliError};
use sesli_core::history::ConversationTurn;

use crate::sse::parse_sse_stream;
use crate::{build_messages, DeltaStream, ResponseGenerator};

const GROQ_BASE_URL: &str = "https://api.groq.com/openai";
const OPENAI_BASE_URL: &str = "https://api.openai.com";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";

const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// API style — determines auth behavior and defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStyle {
    Groq,
    OpenAi,
    Ollama,
}

#[derive(Debug)]
pub struct ChatClient {
    pub base_url: String,
    pub api_style: ApiStyle,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn groq(api_key: String, model: Option<&str>) -> Self {
        Self::with_style(ApiStyle::Groq, GROQ_BASE_URL, Some(api_key), model)
    }

    pub fn openai(api_key: String, model: Option<&str>) -> Self {
        Self::with_style(ApiStyle::OpenAi, OPENAI_BASE_URL, Some(api_key), model)
    }

    pub fn ollama(base_url: Option<&str>, model: Option<&str>) -> Self {
        Self::with_style(
            ApiStyle::Ollama,
            base_url.unwrap_or(OLLAMA_BASE_URL),
            None,
            model,
        )
    }

    fn with_style(
        api_style: ApiStyle,
        base_url: &str,
        api_key: Option<String>,
        model: Option<&str>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_style,
            api_key,
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build a client from config, resolving the API key. Ollama needs
    /// no key; everything else does.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let model = config.model.as_deref();
        match config.provider.as_str() {
            "ollama" => Ok(Self::ollama(config.base_url.as_deref(), model)),
            provider => {
                let api_key = config.resolve_api_key().ok_or_else(|| {
                    SesliError::Config(format!("no API key configured for LLM provider {provider}"))
                })?;
                let mut client = match provider {
                    "openai" => Self::openai(api_key, model),
                    _ => Self::groq(api_key, model),
                };
                if let Some(base) = config.base_url.as_deref() {
                    client.base_url = base.trim_end_matches('/').to_string();
                }
                Ok(client)
            }
        }
    }

    async fn post_completions(
        &self,
        messages: Vec<serde_json::Value>,
        stream: bool,
    ) -> Result<reqwest::Response> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            "stream": stream,
        });

        debug!(model = %self.model, base_url = %self.base_url, stream, "requesting chat completion");

        let mut req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("content-type", "application/json");

        if self.api_style != ApiStyle::Ollama {
            if let Some(key) = &self.api_key {
                req = req.header("authorization", format!("Bearer {key}"));
            }
        }

        let resp = req
            .json(&body)
            .send()
            .await
            .map_err(|e| SesliError::Generation(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(SesliError::Generation(format!(
                "chat API error {status}: {body}"
            )));
        }
        Ok(resp)
    }
}

// --- wire types ---

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ResponseGenerator for ChatClient {
    async fn generate(&self, user_text: &str, history: &[ConversationTurn]) -> Result<String> {
        let messages = build_messages(user_text, history);
        let resp = self.post_completions(messages, false).await?;

        let body: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| SesliError::Generation(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SesliError::Generation("empty completion".into()))
    }

    async fn generate_stream(
        &self,
        user_text: &str,
        history: &[ConversationTurn],
    ) -> Result<DeltaStream> {
        let messages = build_messages(user_text, history);
        let resp = self.post_completions(messages, true).await?;

        let sse = parse_sse_stream(resp);

        let deltas = futures::stream::unfold(Box::pin(sse), |mut sse| async move {
            loop {
                match sse.next().await {
                    Some(Ok(data)) => {
                        let data = data.trim();
                        if data == "[DONE]" {
                            return None;
                        }
                        let chunk: ChatCompletionChunk = match serde_json::from_str(data) {
                            Ok(c) => c,
                            Err(e) => {
                                trace!(%e, data, "skipping unparseable chunk");
                                continue;
                            }
                        };
                        match chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|c| c.delta.content)
                        {
                            Some(content) if !content.is_empty() => {
                                return Some((Ok(content), sse));
                            }
                            _ => continue,
                        }
                    }
                    Some(Err(e)) => {
                        return Some((Err(SesliError::Generation(e.to_string())), sse));
                    }
                    None => return None,
                }
            }
        });

        Ok(Box::pin(deltas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groq_client_defaults() {
        let client = ChatClient::groq("key".into(), None);
        assert_eq!(client.api_style, ApiStyle::Groq);
        assert_eq!(client.base_url, GROQ_BASE_URL);
        assert_eq!(client.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = LlmConfig {
            provider: "ollama".into(),
            ..Default::default()
        };
        let client = ChatClient::from_config(&config).unwrap();
        assert_eq!(client.api_style, ApiStyle::Ollama);
        assert_eq!(client.base_url, OLLAMA_BASE_URL);
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let config = LlmConfig {
            provider: "groq".into(),
            api_key_env: Some("SESLI_TEST_NO_SUCH_KEY".into()),
            ..Default::default()
        };
        let err = ChatClient::from_config(&config).unwrap_err();
        assert!(matches!(err, SesliError::Config(_)));
    }

    #[test]
    fn test_base_url_override() {
        let config = LlmConfig {
            provider: "groq".into(),
            api_key: Some("key".into()),
            base_url: Some("https://proxy.example.com/".into()),
            ..Default::default()
        };
        let client = ChatClient::from_config(&config).unwrap();
        assert_eq!(client.base_url, "https://proxy.example.com");
    }

    #[test]
    fn test_chunk_deserialization() {
        let json = r#"{"id":"1","choices":[{"index":0,"delta":{"content":"Salam"},"finish_reason":null}]}"#;
        let chunk: ChatCompletionChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Salam"));
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Yaxşıyam."}}]}"#;
        let resp: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            resp.choices[0].message.content.as_deref(),
            Some("Yaxşıyam.")
        );
    }
}
