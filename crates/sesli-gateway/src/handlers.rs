//! One-shot HTTP mode — a single request carrying one audio payload.
//!
//! Used by clients without a persistent duplex channel: STT, one
//! blocking generation, one synthesis over the whole reply, and an
//! audio reference the client fetches afterwards. Stateless: each
//! request gets a fresh, empty history.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use sesli_core::error::{Result, SesliError};
use sesli_core::history::ConversationHistory;
use sesli_media::stt::{AudioBuffer, AudioFormat};

use crate::state::GatewayState;

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub user_text: String,
    pub ai_text: String,
    pub audio_url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// POST /api/chat — multipart form with an `audio` field and an
/// optional `format` hint.
pub async fn chat(
    State(state): State<Arc<GatewayState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut data: Option<Vec<u8>> = None;
    let mut format = AudioFormat::Webm;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => match field.name().map(str::to_string).as_deref() {
                Some("audio") => match field.bytes().await {
                    Ok(bytes) => data = Some(bytes.to_vec()),
                    Err(e) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(ErrorResponse {
                                error: format!("failed to read audio field: {e}"),
                            }),
                        )
                            .into_response();
                    }
                },
                Some("format") => {
                    if let Ok(hint) = field.text().await {
                        format = AudioFormat::from_hint(&hint);
                    }
                }
                _ => {}
            },
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("invalid multipart body: {e}"),
                    }),
                )
                    .into_response();
            }
        }
    }

    let Some(data) = data else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "missing audio field".into(),
            }),
        )
            .into_response();
    };

    match one_shot_turn(&state, AudioBuffer::new(data, format)).await {
        Ok(resp) => {
            info!(user_text = %resp.user_text, "one-shot turn complete");
            Json(resp).into_response()
        }
        Err(e) => {
            warn!(%e, "one-shot turn failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// The turn pipeline behind `POST /api/chat`: transcribe, generate the
/// whole reply against an empty history, synthesize it in one piece,
/// and park the audio for a single retrieval.
pub async fn one_shot_turn(state: &GatewayState, audio: AudioBuffer) -> Result<ChatResponse> {
    let user_text = state.stt.transcribe(audio).await?;

    let history = ConversationHistory::new();
    let ai_text = state.generator.generate(&user_text, history.turns()).await?;
    if ai_text.trim().is_empty() {
        return Err(SesliError::Generation("empty reply".into()));
    }

    let audio_bytes = state.tts.synthesize(&ai_text, None).await?;
    let id = state.store_audio(audio_bytes).await;

    Ok(ChatResponse {
        user_text,
        ai_text,
        audio_url: format!("/api/audio/{id}"),
    })
}

/// GET /api/audio/{id} — fetch (and evict) one-shot reply audio.
pub async fn get_audio(
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.take_audio(&id).await {
        Some(bytes) => ([(header::CONTENT_TYPE, "audio/mpeg")], bytes).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "unknown audio reference".into(),
            }),
        )
            .into_response(),
    }
}
