//! Speech-to-text port used by answer submission.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod whisper;

pub use whisper::WhisperClient;

/// Transcription errors
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Transcription request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Transcription API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transcription service returned no text")]
    EmptyResponse,
}

/// A recorded answer as uploaded by the candidate's browser.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Bytes,
    pub file_name: String,
    pub content_type: Option<String>,
}

impl AudioClip {
    pub fn new(bytes: Bytes) -> Self {
        Self {
            bytes,
            file_name: "answer.webm".to_string(),
            content_type: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Port for audio transcription
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio data to text.
    async fn transcribe(&self, audio: &AudioClip) -> Result<String, TranscriptionError>;
}
