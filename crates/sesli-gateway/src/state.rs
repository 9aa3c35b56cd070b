//! Shared gateway state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use sesli_core::config::Config;
use sesli_core::error::Result;
use sesli_media::stt::{HttpSttClient, SpeechToText};
use sesli_media::tts::{HttpTtsClient, SpeechSynthesizer};
use sesli_providers::chat::ChatClient;
use sesli_providers::ResponseGenerator;

/// State shared by all connections and handlers. The backend clients
/// are stateless and reentrant; everything conversational lives in the
/// per-connection coordinator instead.
pub struct GatewayState {
    pub config: Config,
    pub stt: Arc<dyn SpeechToText>,
    pub generator: Arc<dyn ResponseGenerator>,
    pub tts: Arc<dyn SpeechSynthesizer>,
    connections: RwLock<HashSet<String>>,
    audio_store: RwLock<HashMap<Uuid, Vec<u8>>>,
}

impl GatewayState {
    pub fn new(
        config: Config,
        stt: Arc<dyn SpeechToText>,
        generator: Arc<dyn ResponseGenerator>,
        tts: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            config,
            stt,
            generator,
            tts,
            connections: RwLock::new(HashSet::new()),
            audio_store: RwLock::new(HashMap::new()),
        }
    }

    /// Build the configured backend clients.
    pub fn from_config(config: Config) -> Result<Self> {
        let stt = Arc::new(HttpSttClient::new(config.stt.clone()));
        let generator = Arc::new(ChatClient::from_config(&config.llm)?);
        let tts = Arc::new(HttpTtsClient::new(config.tts.clone()));
        Ok(Self::new(config, stt, generator, tts))
    }

    pub async fn register_connection(&self, conn_id: &str) {
        self.connections.write().await.insert(conn_id.to_string());
    }

    pub async fn unregister_connection(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Park one-shot reply audio for later retrieval, returning its
    /// reference ID.
    pub async fn store_audio(&self, bytes: Vec<u8>) -> Uuid {
        let id = Uuid::new_v4();
        self.audio_store.write().await.insert(id, bytes);
        id
    }

    /// Fetch and evict stored audio. One retrieval per reference.
    pub async fn take_audio(&self, id: &Uuid) -> Option<Vec<u8>> {
        self.audio_store.write().await.remove(id)
    }
}
