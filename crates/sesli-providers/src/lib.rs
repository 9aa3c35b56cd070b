//! Response generation.
//!
//! The [`ResponseGenerator`] trait is the seam between the turn
//! coordinator and whatever chat backend is configured; [`chat::ChatClient`]
//! implements it over OpenAI-compatible `/v1/chat/completions` APIs
//! (Groq, OpenAI, Ollama).

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde_json::json;

use sesli_core::error::Result;
use sesli_core::history::ConversationTurn;

pub mod chat;
pub mod sse;

/// Fixed system instruction applied to every request. Replies must
/// follow the user's language despite noisy transcription and stay
/// short enough to speak.
pub const SYSTEM_PROMPT: &str = "You are a friendly, natural-sounding voice assistant.\n\
Rules:\n\
- Always respond in the same language the user speaks\n\
- Keep responses short and conversational — this is a voice chat, not text\n\
- Be warm and natural, like talking to a friend\n\
- Don't ask a question in every response\n\
- Never use lists or bullet points\n\
- If user speaks Azerbaijani, respond in clean Azerbaijani (not Turkish)\n\
- If user speaks English, respond in English\n\
- If user speaks Turkish, respond in Turkish\n\
- Max 2-3 sentences per response";

/// An in-order, finite sequence of incremental text deltas. Dropping it
/// early releases the underlying connection.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// The response-generation contract.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Blocking mode: return the whole reply at once.
    async fn generate(&self, user_text: &str, history: &[ConversationTurn]) -> Result<String>;

    /// Streaming mode: token-level deltas, consumed exactly once by the
    /// sentence segmenter.
    async fn generate_stream(
        &self,
        user_text: &str,
        history: &[ConversationTurn],
    ) -> Result<DeltaStream>;
}

/// Assemble the message list: system instruction, then history in
/// order, then the new user text.
pub fn build_messages(user_text: &str, history: &[ConversationTurn]) -> Vec<serde_json::Value> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(json!({ "role": "system", "content": SYSTEM_PROMPT }));
    for turn in history {
        messages.push(json!({ "role": turn.role, "content": turn.content }));
    }
    messages.push(json!({ "role": "user", "content": user_text }));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use sesli_core::history::ConversationHistory;

    #[test]
    fn test_build_messages_order() {
        let mut history = ConversationHistory::new();
        history.push_user("Salam");
        history.push_assistant("Salam! Necə kömək edə bilərəm?");

        let messages = build_messages("Hava necədir?", history.turns());
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "Salam");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[3]["role"], "user");
        assert_eq!(messages[3]["content"], "Hava necədir?");
    }

    #[test]
    fn test_system_prompt_always_first() {
        let messages = build_messages("hi", &[]);
        assert_eq!(messages.len(), 2);
        assert!(messages[0]["content"]
            .as_str()
            .unwrap()
            .contains("voice assistant"));
    }
}
