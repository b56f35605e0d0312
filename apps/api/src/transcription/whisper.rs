//! OpenAI-compatible `/audio/transcriptions` adapter (Whisper and compatible servers).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{AudioClip, Transcriber, TranscriptionError};

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: Option<String>,
}

/// Whisper transcription client, constructed once at startup and shared by all requests.
#[derive(Clone)]
pub struct WhisperClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    language: String,
}

impl WhisperClient {
    pub fn new(
        api_key: String,
        base_url: &str,
        model: String,
        language: String,
        timeout: Duration,
    ) -> Result<Self, TranscriptionError> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_key,
            endpoint: format!("{}/audio/transcriptions", base_url.trim_end_matches('/')),
            model,
            language,
        })
    }
}

/// The uploaded file part. A content type the browser sent that is not a valid
/// mime type is dropped and the service sniffs the format from the file name.
fn audio_part(audio: &AudioClip) -> Part {
    let part = || Part::bytes(audio.bytes.to_vec()).file_name(audio.file_name.clone());
    let Some(content_type) = &audio.content_type else {
        return part();
    };
    match part().mime_str(content_type) {
        Ok(typed) => typed,
        Err(e) => {
            warn!(content_type = %content_type, "Ignoring unusable audio content type: {e}");
            part()
        }
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio: &AudioClip) -> Result<String, TranscriptionError> {
        let form = Form::new()
            .part("file", audio_part(audio))
            .text("model", self.model.clone())
            .text("language", self.language.clone())
            .text("response_format", "json");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: TranscriptionResponse = response.json().await?;
        let text = body
            .text
            .map(|t| t.trim().to_string())
            .ok_or(TranscriptionError::EmptyResponse)?;

        debug!(
            bytes = audio.bytes.len(),
            chars = text.chars().count(),
            "Transcribed answer audio"
        );
        Ok(text)
    }
}
