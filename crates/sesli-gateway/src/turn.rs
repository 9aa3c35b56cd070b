//! Turn coordinator — drives one conversation turn end-to-end.
//!
//! One coordinator per connection. A turn runs audio → STT → streamed
//! generation → per-sentence synthesis → audio out, emitting events on
//! a single FIFO channel so the client observes them in emission order.
//! Any stage failure is contained at the turn boundary: the client gets
//! one error event plus idle, history stays untouched, and the
//! connection keeps accepting audio.

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use sesli_core::error::{Result, SesliError};
use sesli_core::history::ConversationHistory;
use sesli_core::protocol::{Phase, TurnEvent};
use sesli_media::segment::SentenceSegmenter;
use sesli_media::stt::{AudioBuffer, SpeechToText};
use sesli_media::tts::SpeechSynthesizer;
use sesli_providers::ResponseGenerator;

pub struct TurnCoordinator {
    history: ConversationHistory,
    stt: Arc<dyn SpeechToText>,
    generator: Arc<dyn ResponseGenerator>,
    tts: Arc<dyn SpeechSynthesizer>,
    events: mpsc::UnboundedSender<TurnEvent>,
    cancel: CancellationToken,
}

impl TurnCoordinator {
    pub fn new(
        stt: Arc<dyn SpeechToText>,
        generator: Arc<dyn ResponseGenerator>,
        tts: Arc<dyn SpeechSynthesizer>,
        events: mpsc::UnboundedSender<TurnEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            history: ConversationHistory::new(),
            stt,
            generator,
            tts,
            events,
            cancel,
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Run one complete turn for an inbound audio payload.
    ///
    /// Returns `Err` only when the transport itself is gone; stage
    /// failures are reported to the client and swallowed here.
    pub async fn run_turn(&mut self, audio: AudioBuffer) -> Result<()> {
        match self.process(audio).await {
            Ok((user_text, ai_text)) => {
                // Commit only now, with the full reply known
                self.history.push_user(user_text);
                self.history.push_assistant(ai_text.clone());
                self.emit(TurnEvent::Speaking { ai_text })?;
                self.emit(TurnEvent::Status(Phase::Idle))
            }
            Err(e @ SesliError::Transport(_)) => Err(e),
            Err(e) => {
                warn!(%e, "turn failed");
                self.emit(TurnEvent::Error {
                    message: e.to_string(),
                })?;
                self.emit(TurnEvent::Status(Phase::Idle))
            }
        }
    }

    async fn process(&mut self, audio: AudioBuffer) -> Result<(String, String)> {
        self.emit(TurnEvent::Status(Phase::Transcribing))?;
        // The buffer is moved into the STT call and released there on
        // every exit path.
        let user_text = self.guard(self.stt.transcribe(audio)).await??;
        debug!(%user_text, "transcribed");

        self.emit(TurnEvent::Thinking {
            user_text: user_text.clone(),
        })?;

        let mut deltas = self
            .guard(self.generator.generate_stream(&user_text, self.history.turns()))
            .await??;
        let mut segmenter = SentenceSegmenter::new();
        let mut sentences: Vec<String> = Vec::new();

        // Sentence i is synthesized and emitted before the next delta
        // is requested; that is the backpressure keeping playback order.
        while let Some(delta) = self.guard(deltas.next()).await? {
            for sentence in segmenter.push(&delta?) {
                self.speak_sentence(&sentence).await?;
                sentences.push(sentence);
            }
        }
        drop(deltas);

        if let Some(tail) = segmenter.finish() {
            self.speak_sentence(&tail).await?;
            sentences.push(tail);
        }

        if sentences.is_empty() {
            return Err(SesliError::Generation("empty reply".into()));
        }
        Ok((user_text, sentences.join(" ")))
    }

    async fn speak_sentence(&self, sentence: &str) -> Result<()> {
        self.emit(TurnEvent::TextChunk {
            text: sentence.to_string(),
        })?;
        let audio = self.guard(self.tts.synthesize(sentence, None)).await??;
        self.emit(TurnEvent::AudioChunk(audio))
    }

    /// Await a backend call unless the connection has gone away; the
    /// abandoned future drops, aborting its request in flight.
    async fn guard<T>(&self, fut: impl Future<Output = T>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                Err(SesliError::Transport("connection closed".into()))
            }
            out = fut => Ok(out),
        }
    }

    fn emit(&self, event: TurnEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|_| SesliError::Transport("event channel closed".into()))
    }
}
