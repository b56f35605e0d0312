//! Data-access contract for the interview lifecycle.
//!
//! Handlers and schedulers only talk to the database through [`InterviewStore`].
//! `AppState` and both schedulers hold an `Arc<dyn InterviewStore>`; production
//! wiring uses [`postgres::PgStore`].
//!
//! Every method that changes an interview's status is conditional on the
//! expected prior status and reports whether it actually applied.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::interview::status::InterviewStatus;
use crate::models::interview::{
    AnswerRecord, CandidateRow, InterviewQuestionRow, InterviewRow, InterviewUpdate, NewInterview,
    NewQuestion, PositionRow, QuestionPrompt, ReportDocument, StoredReport,
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub type StoreResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait InterviewStore: Send + Sync {
    // ── Lookups ─────────────────────────────────────────────────────────────

    async fn find_interview(&self, interview_id: i64) -> StoreResult<Option<InterviewRow>>;

    async fn find_interview_by_token(&self, token: &str) -> StoreResult<Option<InterviewRow>>;

    async fn find_candidate(&self, candidate_id: i64) -> StoreResult<Option<CandidateRow>>;

    async fn find_position(&self, position_id: i64) -> StoreResult<Option<PositionRow>>;

    /// All questions of an interview, ordered by id ascending.
    async fn list_questions(&self, interview_id: i64) -> StoreResult<Vec<InterviewQuestionRow>>;

    // ── Session protocol ────────────────────────────────────────────────────

    /// The question of `interview_id` with the smallest id greater than `after_id`.
    async fn next_question(
        &self,
        interview_id: i64,
        after_id: i64,
    ) -> StoreResult<Option<QuestionPrompt>>;

    /// Writes the answer of `question_id` if, at write time, the interview accepts
    /// answers, the question is unanswered and every earlier question is answered.
    /// Returns false when nothing was written.
    async fn record_answer(
        &self,
        interview_id: i64,
        question_id: i64,
        answer: &AnswerRecord,
    ) -> StoreResult<bool>;

    /// Moves the interview to Completed (stamping `end_time`) when it has at least
    /// one question and all of them are answered. Returns whether it transitioned.
    async fn complete_if_all_answered(&self, interview_id: i64) -> StoreResult<bool>;

    /// Compare-and-swap on the status column.
    async fn advance_status(
        &self,
        interview_id: i64,
        from: InterviewStatus,
        to: InterviewStatus,
    ) -> StoreResult<bool>;

    async fn set_voice_reading(&self, interview_id: i64, enabled: bool) -> StoreResult<()>;

    // ── Schedulers ──────────────────────────────────────────────────────────

    /// Interviews in `status` whose scheduler lease is absent or expired.
    async fn list_claimable(&self, status: InterviewStatus) -> StoreResult<Vec<InterviewRow>>;

    /// Takes a lease on the interview if it is still in `status` and not leased.
    /// Returns the lease expiry, which identifies this claim for [`Self::release_claim`].
    async fn claim(
        &self,
        interview_id: i64,
        status: InterviewStatus,
        lease: Duration,
    ) -> StoreResult<Option<DateTime<Utc>>>;

    /// Drops the lease only if it is still the one returned by `claim`; a lease
    /// taken over by another worker after expiry is left alone.
    async fn release_claim(&self, interview_id: i64, claimed_until: DateTime<Utc>)
        -> StoreResult<()>;

    /// Inserts all questions, sets `question_count` and moves NotStarted →
    /// QuestionsReady as one unit. Returns false (writing nothing) if the
    /// interview is no longer NotStarted.
    async fn save_generated_questions(
        &self,
        interview_id: i64,
        questions: &[NewQuestion],
    ) -> StoreResult<bool>;

    /// Stores the report and moves Completed → ReportReady. Returns false
    /// (writing nothing) if the interview is no longer Completed.
    async fn save_report(&self, interview_id: i64, report: &StoredReport) -> StoreResult<bool>;

    // ── Staff operations ────────────────────────────────────────────────────

    async fn create_interview(
        &self,
        new_interview: &NewInterview,
        token: &str,
    ) -> StoreResult<InterviewRow>;

    async fn list_interviews(&self) -> StoreResult<Vec<InterviewRow>>;

    async fn update_interview(
        &self,
        interview_id: i64,
        update: &InterviewUpdate,
    ) -> StoreResult<Option<InterviewRow>>;

    async fn reissue_token(&self, interview_id: i64, token: &str) -> StoreResult<bool>;

    /// Deletes the interview together with its questions.
    async fn delete_interview(&self, interview_id: i64) -> StoreResult<bool>;

    /// The stored report, or None when it has not been generated yet.
    async fn report_document(&self, interview_id: i64) -> StoreResult<Option<ReportDocument>>;
}
