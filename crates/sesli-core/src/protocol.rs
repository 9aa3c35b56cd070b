//! Wire protocol — events the turn coordinator emits to the transport.
//!
//! Every event except audio is a JSON text frame shaped
//! `{"status": ...}`; audio goes out as a raw binary frame immediately
//! after the `ai_chunk` text frame it belongs to. Events for a single
//! turn must reach the client in emission order.

use serde::{Deserialize, Serialize};

/// Externally visible coordinator state during a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Receiving,
    Transcribing,
    Thinking,
    Speaking,
    Idle,
}

/// One event emitted by the turn coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// Bare phase transition.
    Status(Phase),
    /// Transcription finished; generation is starting.
    Thinking { user_text: String },
    /// One completed sentence of the reply.
    TextChunk { text: String },
    /// Synthesized audio for the preceding text chunk.
    AudioChunk(Vec<u8>),
    /// Full reply text, emitted once the stream is exhausted.
    Speaking { ai_text: String },
    /// Turn failed; always followed by `Status(Idle)`.
    Error { message: String },
}

/// JSON shape for non-audio events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusFrame {
    Receiving,
    Transcribing,
    Thinking {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_text: Option<String>,
    },
    AiChunk {
        text: String,
    },
    Speaking {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ai_text: Option<String>,
    },
    Error {
        message: String,
    },
    Idle,
}

/// A frame ready to put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum WireFrame {
    Json(String),
    Binary(Vec<u8>),
}

impl TurnEvent {
    /// Serialize for the transport.
    pub fn into_wire(self) -> crate::error::Result<WireFrame> {
        let frame = match self {
            TurnEvent::AudioChunk(bytes) => return Ok(WireFrame::Binary(bytes)),
            TurnEvent::Status(Phase::Receiving) => StatusFrame::Receiving,
            TurnEvent::Status(Phase::Transcribing) => StatusFrame::Transcribing,
            TurnEvent::Status(Phase::Thinking) => StatusFrame::Thinking { user_text: None },
            TurnEvent::Status(Phase::Speaking) => StatusFrame::Speaking { ai_text: None },
            TurnEvent::Status(Phase::Idle) => StatusFrame::Idle,
            TurnEvent::Thinking { user_text } => StatusFrame::Thinking {
                user_text: Some(user_text),
            },
            TurnEvent::TextChunk { text } => StatusFrame::AiChunk { text },
            TurnEvent::Speaking { ai_text } => StatusFrame::Speaking {
                ai_text: Some(ai_text),
            },
            TurnEvent::Error { message } => StatusFrame::Error { message },
        };
        Ok(WireFrame::Json(serde_json::to_string(&frame)?))
    }
}

/// Inbound JSON control frame from the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Declares the container format of subsequent binary audio frames.
    Config { format: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_status_shape() {
        let wire = TurnEvent::Status(Phase::Transcribing).into_wire().unwrap();
        assert_eq!(wire, WireFrame::Json(r#"{"status":"transcribing"}"#.into()));

        let wire = TurnEvent::Status(Phase::Idle).into_wire().unwrap();
        assert_eq!(wire, WireFrame::Json(r#"{"status":"idle"}"#.into()));
    }

    #[test]
    fn test_thinking_carries_user_text() {
        let wire = TurnEvent::Thinking {
            user_text: "Salam".into(),
        }
        .into_wire()
        .unwrap();
        assert_eq!(
            wire,
            WireFrame::Json(r#"{"status":"thinking","user_text":"Salam"}"#.into())
        );
    }

    #[test]
    fn test_ai_chunk_shape() {
        let wire = TurnEvent::TextChunk {
            text: "Yaxşıyam.".into(),
        }
        .into_wire()
        .unwrap();
        match wire {
            WireFrame::Json(json) => {
                let v: serde_json::Value = serde_json::from_str(&json).unwrap();
                assert_eq!(v["status"], "ai_chunk");
                assert_eq!(v["text"], "Yaxşıyam.");
            }
            WireFrame::Binary(_) => panic!("text chunk must be a JSON frame"),
        }
    }

    #[test]
    fn test_audio_chunk_is_binary() {
        let wire = TurnEvent::AudioChunk(vec![1, 2, 3]).into_wire().unwrap();
        assert_eq!(wire, WireFrame::Binary(vec![1, 2, 3]));
    }

    #[test]
    fn test_error_shape() {
        let wire = TurnEvent::Error {
            message: "boom".into(),
        }
        .into_wire()
        .unwrap();
        assert_eq!(
            wire,
            WireFrame::Json(r#"{"status":"error","message":"boom"}"#.into())
        );
    }

    #[test]
    fn test_client_config_frame() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"type":"config","format":"wav"}"#).unwrap();
        let ClientFrame::Config { format } = frame;
        assert_eq!(format, "wav");
    }
}
