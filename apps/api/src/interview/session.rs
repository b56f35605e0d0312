//! Token-gated candidate session: info, question flow, answers, voice reading.
//!
//! Every operation resolves the token first; an unknown token is `NotFound`
//! before anything is read or written.

use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::interview::status::InterviewStatus;
use crate::models::interview::{AnswerRecord, InterviewRow, QuestionPrompt};
use crate::store::InterviewStore;
use crate::transcription::{AudioClip, Transcriber};

pub const UNSCHEDULED_TIME_TEXT: &str = "未设置时间";
pub const ANSWER_ACCEPTED_TEXT: &str = "答案已提交";

#[derive(Debug, Serialize)]
pub struct InterviewInfo {
    pub interview_id: i64,
    #[serde(rename = "time")]
    pub interview_time: String,
    pub position: String,
    pub requirements: String,
    pub candidate: String,
    pub candidate_email: String,
    pub status: InterviewStatus,
    pub question_count: i32,
    pub voice_reading: bool,
}

#[derive(Debug, Serialize)]
pub struct SubmitAnswerResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub next_question: QuestionPrompt,
}

#[derive(Debug, Serialize)]
pub struct VoiceReadingResponse {
    pub status: &'static str,
    pub voice_reading: bool,
}

async fn resolve_token(store: &dyn InterviewStore, token: &str) -> Result<InterviewRow, AppError> {
    store
        .find_interview_by_token(token)
        .await?
        .ok_or_else(|| AppError::NotFound("Interview not found".to_string()))
}

/// Read-only summary shown on the candidate's landing page.
pub async fn get_info(store: &dyn InterviewStore, token: &str) -> Result<InterviewInfo, AppError> {
    let interview = resolve_token(store, token).await?;

    let candidate = store
        .find_candidate(interview.candidate_id)
        .await?
        .ok_or_else(|| {
            AppError::DataIntegrity(format!(
                "Candidate {} of interview {} not found",
                interview.candidate_id, interview.id
            ))
        })?;
    let position = store
        .find_position(candidate.position_id)
        .await?
        .ok_or_else(|| {
            AppError::DataIntegrity(format!(
                "Position {} of candidate {} not found",
                candidate.position_id, candidate.id
            ))
        })?;

    let interview_time = interview
        .start_time
        .map(|t| t.with_timezone(&Local).format("%Y年%m月%d日 %H:%M").to_string())
        .unwrap_or_else(|| UNSCHEDULED_TIME_TEXT.to_string());

    Ok(InterviewInfo {
        interview_id: interview.id,
        interview_time,
        position: position.name,
        requirements: position.requirements.unwrap_or_default(),
        candidate: candidate.name,
        candidate_email: candidate.email.unwrap_or_default(),
        status: interview.status,
        question_count: interview.question_count,
        voice_reading: interview.voice_reading,
    })
}

/// Question with the smallest id greater than `current_id`, or the completion
/// marker. The first fetch of a QuestionsReady interview moves it to InProgress.
pub async fn get_next_question(
    store: &dyn InterviewStore,
    token: &str,
    current_id: i64,
) -> Result<QuestionPrompt, AppError> {
    let interview = resolve_token(store, token).await?;

    if interview.status == InterviewStatus::QuestionsReady
        && store
            .advance_status(
                interview.id,
                InterviewStatus::QuestionsReady,
                InterviewStatus::InProgress,
            )
            .await?
    {
        info!(interview_id = interview.id, "Interview started");
    }

    Ok(store
        .next_question(interview.id, current_id)
        .await?
        .unwrap_or_else(QuestionPrompt::complete))
}

/// Transcribes and records the answer to the earliest unanswered question.
///
/// Out-of-order, duplicate, or late submissions are rejected with `Conflict`
/// before the transcription service is called.
pub async fn submit_answer(
    store: &dyn InterviewStore,
    transcriber: &dyn Transcriber,
    token: &str,
    question_id: Option<i64>,
    audio: Option<AudioClip>,
) -> Result<SubmitAnswerResponse, AppError> {
    let interview = resolve_token(store, token).await?;

    let question_id = question_id
        .ok_or_else(|| AppError::InvalidRequest("Missing question_id".to_string()))?;
    let audio = audio
        .filter(|clip| !clip.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Missing audio answer".to_string()))?;

    let questions = store.list_questions(interview.id).await?;
    let question = questions
        .iter()
        .find(|q| q.id == question_id)
        .ok_or_else(|| AppError::NotFound(format!("Question {question_id} not found")))?;

    if !interview.status.accepts_answers() {
        return Err(AppError::Conflict(format!(
            "Interview is {}, answers are not accepted",
            interview.status
        )));
    }
    if question.answered_at.is_some() {
        return Err(AppError::Conflict(format!(
            "Question {question_id} has already been answered"
        )));
    }
    let expected = questions.iter().find(|q| q.answered_at.is_none()).map(|q| q.id);
    if expected != Some(question_id) {
        return Err(AppError::Conflict(format!(
            "Question {question_id} is not the next question to answer"
        )));
    }

    let text = transcriber.transcribe(&audio).await.map_err(|e| {
        AppError::UpstreamUnavailable(format!("Transcription failed: {e}"))
    })?;

    let answer = AnswerRecord {
        text,
        audio: audio.bytes,
    };
    if !store.record_answer(interview.id, question_id, &answer).await? {
        warn!(
            interview_id = interview.id,
            question_id, "Answer rejected by a concurrent submission"
        );
        return Err(AppError::Conflict(format!(
            "Question {question_id} has already been answered"
        )));
    }
    info!(interview_id = interview.id, question_id, "Answer recorded");

    if store.complete_if_all_answered(interview.id).await? {
        info!(interview_id = interview.id, "Interview completed");
    }

    let next_question = store
        .next_question(interview.id, question_id)
        .await?
        .unwrap_or_else(QuestionPrompt::complete);

    Ok(SubmitAnswerResponse {
        status: "success",
        message: ANSWER_ACCEPTED_TEXT,
        next_question,
    })
}

pub async fn toggle_voice_reading(
    store: &dyn InterviewStore,
    token: &str,
    enabled: bool,
) -> Result<VoiceReadingResponse, AppError> {
    let interview = resolve_token(store, token).await?;
    store.set_voice_reading(interview.id, enabled).await?;

    Ok(VoiceReadingResponse {
        status: "success",
        voice_reading: enabled,
    })
}
