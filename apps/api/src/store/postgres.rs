use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info};

use super::{InterviewStore, StoreResult};
use crate::interview::status::InterviewStatus;
use crate::models::interview::{
    AnswerRecord, CandidateRow, InterviewQuestionRow, InterviewRow, InterviewUpdate, NewInterview,
    NewQuestion, PositionRow, QuestionPrompt, ReportDocument, StoredReport,
};

/// Columns selected into [`InterviewRow`]; the report blob is fetched separately.
const INTERVIEW_COLUMNS: &str = "id, candidate_id, interviewer, start_time, end_time, status, \
    question_count, is_passed, voice_reading, token, report_degraded, report_warning, created_at";

const QUESTION_COLUMNS: &str =
    "id, interview_id, question, score_standard, answer_text, created_at, answered_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InterviewStore for PgStore {
    async fn find_interview(&self, interview_id: i64) -> StoreResult<Option<InterviewRow>> {
        sqlx::query_as::<_, InterviewRow>(&format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE id = $1"
        ))
        .bind(interview_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_interview_by_token(&self, token: &str) -> StoreResult<Option<InterviewRow>> {
        sqlx::query_as::<_, InterviewRow>(&format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_candidate(&self, candidate_id: i64) -> StoreResult<Option<CandidateRow>> {
        sqlx::query_as::<_, CandidateRow>(
            "SELECT id, position_id, name, email, resume_content FROM candidates WHERE id = $1",
        )
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_position(&self, position_id: i64) -> StoreResult<Option<PositionRow>> {
        sqlx::query_as::<_, PositionRow>("SELECT * FROM positions WHERE id = $1")
            .bind(position_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_questions(&self, interview_id: i64) -> StoreResult<Vec<InterviewQuestionRow>> {
        sqlx::query_as::<_, InterviewQuestionRow>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM interview_questions WHERE interview_id = $1 ORDER BY id ASC"
        ))
        .bind(interview_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn next_question(
        &self,
        interview_id: i64,
        after_id: i64,
    ) -> StoreResult<Option<QuestionPrompt>> {
        sqlx::query_as::<_, QuestionPrompt>(
            r#"
            SELECT id, question AS text
            FROM interview_questions
            WHERE interview_id = $1 AND id > $2
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(interview_id)
        .bind(after_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn record_answer(
        &self,
        interview_id: i64,
        question_id: i64,
        answer: &AnswerRecord,
    ) -> StoreResult<bool> {
        // A concurrent duplicate blocks on the row lock and then fails the
        // `answered_at IS NULL` recheck, so each row is written once.
        let [serving_a, serving_b] = InterviewStatus::completable_from();
        let result = sqlx::query(
            r#"
            UPDATE interview_questions q
            SET answer_audio = $3, answer_text = $4, answered_at = now()
            WHERE q.id = $2
              AND q.interview_id = $1
              AND q.answered_at IS NULL
              AND NOT EXISTS (
                  SELECT 1 FROM interview_questions earlier
                  WHERE earlier.interview_id = $1
                    AND earlier.id < $2
                    AND earlier.answered_at IS NULL
              )
              AND EXISTS (
                  SELECT 1 FROM interviews i
                  WHERE i.id = $1 AND i.status IN ($5, $6)
              )
            "#,
        )
        .bind(interview_id)
        .bind(question_id)
        .bind(answer.audio.as_ref())
        .bind(&answer.text)
        .bind(serving_a)
        .bind(serving_b)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn complete_if_all_answered(&self, interview_id: i64) -> StoreResult<bool> {
        let [serving_a, serving_b] = InterviewStatus::completable_from();
        let result = sqlx::query(
            r#"
            UPDATE interviews
            SET status = $2, end_time = now()
            WHERE id = $1
              AND status IN ($3, $4)
              AND EXISTS (SELECT 1 FROM interview_questions WHERE interview_id = $1)
              AND NOT EXISTS (
                  SELECT 1 FROM interview_questions
                  WHERE interview_id = $1 AND answered_at IS NULL
              )
            "#,
        )
        .bind(interview_id)
        .bind(InterviewStatus::Completed)
        .bind(serving_a)
        .bind(serving_b)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn advance_status(
        &self,
        interview_id: i64,
        from: InterviewStatus,
        to: InterviewStatus,
    ) -> StoreResult<bool> {
        if !from.can_transition_to(to) {
            return Ok(false);
        }
        let result = sqlx::query("UPDATE interviews SET status = $3 WHERE id = $1 AND status = $2")
            .bind(interview_id)
            .bind(from)
            .bind(to)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn set_voice_reading(&self, interview_id: i64, enabled: bool) -> StoreResult<()> {
        sqlx::query("UPDATE interviews SET voice_reading = $2 WHERE id = $1")
            .bind(interview_id)
            .bind(enabled)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_claimable(&self, status: InterviewStatus) -> StoreResult<Vec<InterviewRow>> {
        sqlx::query_as::<_, InterviewRow>(&format!(
            r#"
            SELECT {INTERVIEW_COLUMNS}
            FROM interviews
            WHERE status = $1 AND (claimed_until IS NULL OR claimed_until < now())
            ORDER BY id ASC
            "#
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await
    }

    async fn claim(
        &self,
        interview_id: i64,
        status: InterviewStatus,
        lease: Duration,
    ) -> StoreResult<Option<DateTime<Utc>>> {
        let claimed_until: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE interviews
            SET claimed_until = now() + make_interval(secs => $3)
            WHERE id = $1
              AND status = $2
              AND (claimed_until IS NULL OR claimed_until < now())
            RETURNING claimed_until
            "#,
        )
        .bind(interview_id)
        .bind(status)
        .bind(lease.as_secs_f64())
        .fetch_optional(&self.pool)
        .await?;

        debug!(
            interview_id,
            %status,
            claimed = claimed_until.is_some(),
            "Claim attempt"
        );
        Ok(claimed_until)
    }

    async fn release_claim(
        &self,
        interview_id: i64,
        claimed_until: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE interviews SET claimed_until = NULL WHERE id = $1 AND claimed_until = $2",
        )
        .bind(interview_id)
        .bind(claimed_until)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_generated_questions(
        &self,
        interview_id: i64,
        questions: &[NewQuestion],
    ) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Status update first: it row-locks the interview for the rest of the transaction.
        let updated = sqlx::query(
            r#"
            UPDATE interviews
            SET status = $3, question_count = $4, claimed_until = NULL
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(interview_id)
        .bind(InterviewStatus::NotStarted)
        .bind(InterviewStatus::QuestionsReady)
        .bind(questions.len() as i32)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for question in questions {
            sqlx::query(
                r#"
                INSERT INTO interview_questions (interview_id, question, score_standard)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(interview_id)
            .bind(&question.question)
            .bind(&question.score_standard)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            interview_id,
            count = questions.len(),
            "Persisted generated questions"
        );
        Ok(true)
    }

    async fn save_report(&self, interview_id: i64, report: &StoredReport) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE interviews
            SET report_content = $4,
                report_content_type = $5,
                report_degraded = $6,
                report_warning = $7,
                status = $3,
                claimed_until = NULL
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(interview_id)
        .bind(InterviewStatus::Completed)
        .bind(InterviewStatus::ReportReady)
        .bind(&report.content)
        .bind(&report.content_type)
        .bind(report.degraded)
        .bind(&report.warning)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn create_interview(
        &self,
        new_interview: &NewInterview,
        token: &str,
    ) -> StoreResult<InterviewRow> {
        sqlx::query_as::<_, InterviewRow>(&format!(
            r#"
            INSERT INTO interviews (candidate_id, interviewer, start_time, status, token)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {INTERVIEW_COLUMNS}
            "#
        ))
        .bind(new_interview.candidate_id)
        .bind(&new_interview.interviewer)
        .bind(new_interview.start_time)
        .bind(InterviewStatus::NotStarted)
        .bind(token)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_interviews(&self) -> StoreResult<Vec<InterviewRow>> {
        sqlx::query_as::<_, InterviewRow>(&format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn update_interview(
        &self,
        interview_id: i64,
        update: &InterviewUpdate,
    ) -> StoreResult<Option<InterviewRow>> {
        sqlx::query_as::<_, InterviewRow>(&format!(
            r#"
            UPDATE interviews
            SET interviewer = COALESCE($2, interviewer),
                start_time = COALESCE($3, start_time),
                is_passed = COALESCE($4, is_passed)
            WHERE id = $1
            RETURNING {INTERVIEW_COLUMNS}
            "#
        ))
        .bind(interview_id)
        .bind(&update.interviewer)
        .bind(update.start_time)
        .bind(update.is_passed)
        .fetch_optional(&self.pool)
        .await
    }

    async fn reissue_token(&self, interview_id: i64, token: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE interviews SET token = $2 WHERE id = $1")
            .bind(interview_id)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_interview(&self, interview_id: i64) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM interview_questions WHERE interview_id = $1")
            .bind(interview_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM interviews WHERE id = $1")
            .bind(interview_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(deleted.rows_affected() == 1)
    }

    async fn report_document(&self, interview_id: i64) -> StoreResult<Option<ReportDocument>> {
        let row: Option<(Option<Vec<u8>>, Option<String>)> = sqlx::query_as(
            "SELECT report_content, report_content_type FROM interviews WHERE id = $1",
        )
        .bind(interview_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|(content, content_type)| {
            content
                .filter(|c| !c.is_empty())
                .map(|content| ReportDocument {
                    content,
                    content_type: content_type
                        .unwrap_or_else(|| "application/octet-stream".to_string()),
                })
        }))
    }
}
