//! One-shot HTTP mode tests against scripted backend adapters.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use sesli_core::config::Config;
use sesli_core::error::{Result, SesliError};
use sesli_core::history::ConversationTurn;
use sesli_gateway::handlers::one_shot_turn;
use sesli_gateway::GatewayState;
use sesli_media::stt::{AudioBuffer, AudioFormat, SpeechToText};
use sesli_media::tts::SpeechSynthesizer;
use sesli_providers::{DeltaStream, ResponseGenerator};

// --- scripted adapters ---

struct FixedStt(&'static str);

#[async_trait]
impl SpeechToText for FixedStt {
    async fn transcribe(&self, audio: AudioBuffer) -> Result<String> {
        assert!(!audio.data.is_empty());
        Ok(self.0.to_string())
    }
}

struct FailingStt;

#[async_trait]
impl SpeechToText for FailingStt {
    async fn transcribe(&self, _audio: AudioBuffer) -> Result<String> {
        Err(SesliError::Transcription("decode error".into()))
    }
}

/// Returns a fixed reply and records the history length seen per call.
struct FixedGenerator {
    reply: &'static str,
    seen_history_lens: Mutex<Vec<usize>>,
}

impl FixedGenerator {
    fn new(reply: &'static str) -> Self {
        Self {
            reply,
            seen_history_lens: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ResponseGenerator for FixedGenerator {
    async fn generate(&self, _user_text: &str, history: &[ConversationTurn]) -> Result<String> {
        self.seen_history_lens.lock().unwrap().push(history.len());
        Ok(self.reply.to_string())
    }

    async fn generate_stream(
        &self,
        user_text: &str,
        history: &[ConversationTurn],
    ) -> Result<DeltaStream> {
        let reply = self.generate(user_text, history).await?;
        Ok(Box::pin(futures::stream::iter(vec![Ok(reply)])))
    }
}

struct FixedTts(&'static [u8]);

#[async_trait]
impl SpeechSynthesizer for FixedTts {
    async fn synthesize(&self, _text: &str, _voice: Option<&str>) -> Result<Vec<u8>> {
        Ok(self.0.to_vec())
    }
}

// --- helpers ---

fn gateway(
    stt: Arc<dyn SpeechToText>,
    generator: Arc<dyn ResponseGenerator>,
    tts: Arc<dyn SpeechSynthesizer>,
) -> GatewayState {
    GatewayState::new(Config::default(), stt, generator, tts)
}

fn some_audio() -> AudioBuffer {
    AudioBuffer::new(vec![0u8; 64], AudioFormat::Webm)
}

fn audio_id(url: &str) -> Uuid {
    let id = url
        .strip_prefix("/api/audio/")
        .expect("audio_url should point at the retrieval endpoint");
    Uuid::parse_str(id).expect("audio reference should be a UUID")
}

// --- tests ---

/// The full one-shot pipeline: transcript and reply in the response,
/// audio parked under the returned reference.
#[tokio::test]
async fn test_one_shot_turn_roundtrip() {
    let state = gateway(
        Arc::new(FixedStt("Salam, necəsən?")),
        Arc::new(FixedGenerator::new("Yaxşıyam. Sən necəsən?")),
        Arc::new(FixedTts(b"mp3-bytes")),
    );

    let resp = one_shot_turn(&state, some_audio()).await.unwrap();
    assert_eq!(resp.user_text, "Salam, necəsən?");
    assert_eq!(resp.ai_text, "Yaxşıyam. Sən necəsən?");

    let id = audio_id(&resp.audio_url);
    assert_eq!(state.take_audio(&id).await, Some(b"mp3-bytes".to_vec()));
}

/// A stored reference serves exactly once; the second fetch misses.
#[tokio::test]
async fn test_audio_reference_is_single_use() {
    let state = gateway(
        Arc::new(FixedStt("hi")),
        Arc::new(FixedGenerator::new("Hello.")),
        Arc::new(FixedTts(b"audio")),
    );

    let resp = one_shot_turn(&state, some_audio()).await.unwrap();
    let id = audio_id(&resp.audio_url);

    assert!(state.take_audio(&id).await.is_some());
    assert_eq!(state.take_audio(&id).await, None);
}

#[tokio::test]
async fn test_unknown_audio_reference_misses() {
    let state = gateway(
        Arc::new(FixedStt("hi")),
        Arc::new(FixedGenerator::new("Hello.")),
        Arc::new(FixedTts(b"audio")),
    );

    assert_eq!(state.take_audio(&Uuid::new_v4()).await, None);
}

/// One-shot requests are stateless: every call sees an empty history,
/// even on the same gateway.
#[tokio::test]
async fn test_one_shot_requests_are_stateless() {
    let generator = Arc::new(FixedGenerator::new("Hello."));
    let state = gateway(
        Arc::new(FixedStt("hi")),
        generator.clone(),
        Arc::new(FixedTts(b"audio")),
    );

    one_shot_turn(&state, some_audio()).await.unwrap();
    one_shot_turn(&state, some_audio()).await.unwrap();

    assert_eq!(*generator.seen_history_lens.lock().unwrap(), vec![0, 0]);
}

#[tokio::test]
async fn test_one_shot_transcription_failure_propagates() {
    let state = gateway(
        Arc::new(FailingStt),
        Arc::new(FixedGenerator::new("unused")),
        Arc::new(FixedTts(b"audio")),
    );

    let err = one_shot_turn(&state, some_audio()).await.unwrap_err();
    assert!(matches!(err, SesliError::Transcription(_)));
}

/// A blank reply is a generation failure, and nothing gets parked.
#[tokio::test]
async fn test_one_shot_empty_reply_is_error() {
    let state = gateway(
        Arc::new(FixedStt("hi")),
        Arc::new(FixedGenerator::new("  ")),
        Arc::new(FixedTts(b"audio")),
    );

    let err = one_shot_turn(&state, some_audio()).await.unwrap_err();
    assert!(matches!(err, SesliError::Generation(_)));
}
