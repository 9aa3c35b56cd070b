//! Minimal SSE parser for streaming chat completions.
//!
//! Converts a `reqwest::Response` body into a stream of `data:` payloads.
//! Chat completion streams only ever use the `data` field, so event
//! names and ids are ignored.

use futures::Stream;
use tokio_stream::StreamExt;

/// Parse a response body as an SSE stream, yielding one item per
/// dispatched event's joined data lines.
pub fn parse_sse_stream(response: reqwest::Response) -> impl Stream<Item = anyhow::Result<String>> {
    futures::stream::unfold(
        SseState {
            byte_stream: Box::pin(response.bytes_stream()),
            buffer: String::new(),
            data_lines: Vec::new(),
        },
        |mut state| async move {
            loop {
                if let Some(newline_pos) = state.buffer.find('\n') {
                    let line = state.buffer[..newline_pos].trim_end_matches('\r').to_string();
                    state.buffer.drain(..=newline_pos);

                    if line.is_empty() {
                        // Empty line dispatches the pending event
                        if !state.data_lines.is_empty() {
                            let data = state.data_lines.join("\n");
                            state.data_lines.clear();
                            return Some((Ok(data), state));
                        }
                        continue;
                    }
                    if line.starts_with(':') {
                        continue;
                    }
                    if let Some(value) = line.strip_prefix("data:") {
                        state.data_lines.push(value.trim_start().to_string());
                    }
                    // Other fields (event:, id:, retry:) are irrelevant here
                    continue;
                }

                match state.byte_stream.next().await {
                    Some(Ok(chunk)) => {
                        state.buffer.push_str(&String::from_utf8_lossy(&chunk));
                    }
                    Some(Err(e)) => {
                        return Some((Err(anyhow::anyhow!("SSE stream error: {e}")), state));
                    }
                    None => {
                        if !state.data_lines.is_empty() {
                            let data = state.data_lines.join("\n");
                            state.data_lines.clear();
                            return Some((Ok(data), state));
                        }
                        return None;
                    }
                }
            }
        },
    )
}

struct SseState {
    byte_stream:
        std::pin::Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>,
    buffer: String,
    data_lines: Vec<String>,
}
