//! Media pipeline — audio buffers, STT, TTS, and sentence segmentation.

pub mod lang;
pub mod segment;
pub mod stt;
pub mod tts;
