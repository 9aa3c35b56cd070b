use thiserror::Error;

/// Error taxonomy for the voice-chat pipeline.
///
/// Stage failures (`Transcription`, `Generation`, `Synthesis`) are caught at
/// the turn boundary, reported to the client as a single error event, and
/// leave the connection usable for the next turn. `Transport` failures are
/// never reported to the peer — the connection is simply torn down.
#[derive(Debug, Error)]
pub enum SesliError {
    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("synthesis failed: {0}")]
    Synthesis(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SesliError>;
