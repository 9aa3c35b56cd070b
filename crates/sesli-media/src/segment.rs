//! Incremental sentence segmentation.
//!
//! The segmenter receives arbitrary-length text fragments (possibly
//! mid-word) from the generation stream and emits complete sentences as
//! soon as their boundary is confirmed, so synthesis can start without
//! waiting for the rest of the reply. A sentence ends at `.`, `!`, or
//! `?` followed by whitespace; a terminator at the end of the buffer is
//! held until the next fragment (or the final flush) confirms it.

/// Stateful accumulator splitting a growing text stream into sentences.
#[derive(Debug, Default)]
pub struct SentenceSegmenter {
    buffer: String,
}

impl SentenceSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a fragment, returning the complete sentences it finished,
    /// in order. Emitted sentences are trimmed and non-empty; the
    /// unterminated remainder stays buffered. An empty fragment is a
    /// no-op.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        if chunk.is_empty() {
            return Vec::new();
        }
        self.buffer.push_str(chunk);

        let mut sentences = Vec::new();
        let mut start = 0;
        let mut chars = self.buffer.char_indices().peekable();
        while let Some((_, c)) = chars.next() {
            if matches!(c, '.' | '!' | '?') {
                // Only whitespace after the terminator confirms the
                // boundary; at end-of-buffer we wait for more input.
                if let Some(&(next_idx, next)) = chars.peek() {
                    if next.is_whitespace() {
                        let sentence = self.buffer[start..next_idx].trim();
                        if !sentence.is_empty() {
                            sentences.push(sentence.to_string());
                        }
                        start = next_idx;
                    }
                }
            }
        }
        if start > 0 {
            self.buffer.drain(..start);
        }
        sentences
    }

    /// Flush the remainder once the stream has ended. Returns the
    /// trimmed tail as a final sentence if non-empty.
    pub fn finish(&mut self) -> Option<String> {
        let rest = self.buffer.trim().to_string();
        self.buffer.clear();
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}
