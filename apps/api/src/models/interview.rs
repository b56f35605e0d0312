use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::interview::status::InterviewStatus;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PositionRow {
    pub id: i64,
    pub name: String,
    pub requirements: Option<String>,
    pub responsibilities: Option<String>,
    pub quantity: Option<i32>,
    pub status: i16,
    pub recruiter: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Candidate row. `resume_content` is the raw uploaded file, usually a PDF.
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: i64,
    pub position_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub resume_content: Option<Vec<u8>>,
}

/// Interview row without the report blob; see [`ReportDocument`].
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InterviewRow {
    pub id: i64,
    pub candidate_id: i64,
    pub interviewer: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: InterviewStatus,
    pub question_count: i32,
    pub is_passed: Option<bool>,
    pub voice_reading: bool,
    pub token: String,
    pub report_degraded: bool,
    pub report_warning: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Question row without the recorded audio.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InterviewQuestionRow {
    pub id: i64,
    pub interview_id: i64,
    pub question: String,
    pub score_standard: Option<String>,
    pub answer_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
}

/// A question as served to the candidate: `{id, text}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct QuestionPrompt {
    pub id: i64,
    pub text: String,
}

/// Marker text returned with `id = 0` once no question remains.
pub const INTERVIEW_COMPLETE_TEXT: &str = "面试已完成";

impl QuestionPrompt {
    pub fn complete() -> Self {
        Self {
            id: 0,
            text: INTERVIEW_COMPLETE_TEXT.to_string(),
        }
    }

    #[cfg(test)]
    pub fn is_complete_marker(&self) -> bool {
        self.id == 0
    }
}

/// A generated question ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub question: String,
    pub score_standard: Option<String>,
}

/// A transcribed answer for a single question.
#[derive(Debug, Clone)]
pub struct AnswerRecord {
    pub text: String,
    pub audio: Bytes,
}

/// Report document as persisted on the interview row.
#[derive(Debug, Clone)]
pub struct StoredReport {
    pub content: Vec<u8>,
    pub content_type: String,
    pub degraded: bool,
    pub warning: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub content: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInterview {
    pub candidate_id: i64,
    pub interviewer: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
}

/// Staff-editable interview metadata. Absent fields are left unchanged.
/// Status and token are intentionally not part of this payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterviewUpdate {
    pub interviewer: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub is_passed: Option<bool>,
}
