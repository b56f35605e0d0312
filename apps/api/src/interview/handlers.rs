use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::interview::session::{
    self, InterviewInfo, SubmitAnswerResponse, VoiceReadingResponse,
};
use crate::models::interview::QuestionPrompt;
use crate::state::AppState;
use crate::transcription::AudioClip;

#[derive(Deserialize)]
pub struct NextQuestionQuery {
    #[serde(default)]
    pub current_id: i64,
}

#[derive(Deserialize)]
pub struct VoiceReadingToggle {
    #[serde(default)]
    pub enabled: bool,
}

/// GET /api/v1/interview/:token/info
pub async fn handle_get_info(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<InterviewInfo>, AppError> {
    let info = session::get_info(state.store.as_ref(), &token).await?;
    Ok(Json(info))
}

/// GET /api/v1/interview/:token/get_question?current_id=N
pub async fn handle_get_question(
    State(state): State<AppState>,
    Path(token): Path<String>,
    query: Result<Query<NextQuestionQuery>, QueryRejection>,
) -> Result<Json<QuestionPrompt>, AppError> {
    let Query(params) = query?;
    let question = session::get_next_question(state.store.as_ref(), &token, params.current_id).await?;
    Ok(Json(question))
}

/// POST /api/v1/interview/:token/submit_answer
/// Multipart fields: `question_id` (text) and `audio_answer` (file).
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(token): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SubmitAnswerResponse>, AppError> {
    let multipart = multipart?;
    let (question_id, audio) = read_answer_form(multipart, state.config.max_audio_bytes).await?;
    let response = session::submit_answer(
        state.store.as_ref(),
        state.transcriber.as_ref(),
        &token,
        question_id,
        audio,
    )
    .await?;
    Ok(Json(response))
}

/// POST /api/v1/interview/:token/toggle_voice_reading
pub async fn handle_toggle_voice_reading(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Result<Json<VoiceReadingToggle>, JsonRejection>,
) -> Result<Json<VoiceReadingResponse>, AppError> {
    let Json(req) = body?;
    let response = session::toggle_voice_reading(state.store.as_ref(), &token, req.enabled).await?;
    Ok(Json(response))
}

async fn read_answer_form(
    mut multipart: Multipart,
    max_audio_bytes: usize,
) -> Result<(Option<i64>, Option<AudioClip>), AppError> {
    let mut question_id = None;
    let mut audio = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("question_id") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidRequest(format!("Unreadable question_id: {e}")))?;
                let id = raw.trim().parse::<i64>().map_err(|_| {
                    AppError::InvalidRequest(format!("question_id is not a number: {raw}"))
                })?;
                question_id = Some(id);
            }
            Some("audio_answer") | Some("audio") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidRequest(format!("Unreadable audio: {e}")))?;
                if bytes.len() > max_audio_bytes {
                    return Err(AppError::InvalidRequest(format!(
                        "Audio exceeds {max_audio_bytes} bytes"
                    )));
                }
                let mut clip = AudioClip::new(bytes);
                if let Some(name) = file_name.filter(|n| !n.is_empty()) {
                    clip.file_name = name;
                }
                clip.content_type = content_type;
                audio = Some(clip);
            }
            _ => {}
        }
    }

    Ok((question_id, audio))
}
