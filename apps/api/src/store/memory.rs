//! In-memory [`InterviewStore`] used by unit tests.
//!
//! Mirrors the conditional-update semantics of the PostgreSQL store so the
//! session protocol and schedulers can be exercised without a database.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{InterviewStore, StoreResult};
use crate::interview::status::InterviewStatus;
use crate::models::interview::{
    AnswerRecord, CandidateRow, InterviewQuestionRow, InterviewRow, InterviewUpdate, NewInterview,
    NewQuestion, PositionRow, QuestionPrompt, ReportDocument, StoredReport,
};

struct StoredInterview {
    row: InterviewRow,
    claimed_until: Option<DateTime<Utc>>,
    report: Option<ReportDocument>,
}

struct StoredQuestion {
    row: InterviewQuestionRow,
    audio: Option<Vec<u8>>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    positions: BTreeMap<i64, PositionRow>,
    candidates: BTreeMap<i64, CandidateRow>,
    interviews: BTreeMap<i64, StoredInterview>,
    questions: BTreeMap<i64, StoredQuestion>,
}

impl Inner {
    /// Ids are shared across tables so question ids of different interviews interleave.
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn questions_of(&self, interview_id: i64) -> impl Iterator<Item = &StoredQuestion> {
        self.questions
            .values()
            .filter(move |q| q.row.interview_id == interview_id)
    }

    fn is_claimable(interview: &StoredInterview, now: DateTime<Utc>) -> bool {
        interview.claimed_until.map_or(true, |until| until < now)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }

    // ── Fixtures ────────────────────────────────────────────────────────────

    pub fn insert_position(&self, name: &str, requirements: &str, responsibilities: &str) -> i64 {
        let mut inner = self.lock();
        let id = inner.allocate_id();
        inner.positions.insert(
            id,
            PositionRow {
                id,
                name: name.to_string(),
                requirements: Some(requirements.to_string()),
                responsibilities: Some(responsibilities.to_string()),
                quantity: Some(1),
                status: 1,
                recruiter: Some("HR".to_string()),
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn insert_candidate(&self, position_id: i64, name: &str, resume: Option<&[u8]>) -> i64 {
        let mut inner = self.lock();
        let id = inner.allocate_id();
        inner.candidates.insert(
            id,
            CandidateRow {
                id,
                position_id,
                name: name.to_string(),
                email: Some(format!("{id}@example.com")),
                resume_content: resume.map(|r| r.to_vec()),
            },
        );
        id
    }

    pub fn insert_interview(&self, candidate_id: i64, token: &str, status: InterviewStatus) -> i64 {
        let mut inner = self.lock();
        let id = inner.allocate_id();
        inner.interviews.insert(
            id,
            StoredInterview {
                row: InterviewRow {
                    id,
                    candidate_id,
                    interviewer: Some("Interviewer".to_string()),
                    start_time: None,
                    end_time: None,
                    status,
                    question_count: 0,
                    is_passed: None,
                    voice_reading: false,
                    token: token.to_string(),
                    report_degraded: false,
                    report_warning: None,
                    created_at: Utc::now(),
                },
                claimed_until: None,
                report: None,
            },
        );
        id
    }

    /// Inserts questions directly and marks the interview QuestionsReady.
    pub fn insert_questions(&self, interview_id: i64, texts: &[&str]) -> Vec<i64> {
        let mut inner = self.lock();
        let mut ids = Vec::with_capacity(texts.len());
        for text in texts {
            let id = inner.allocate_id();
            inner.questions.insert(
                id,
                StoredQuestion {
                    row: InterviewQuestionRow {
                        id,
                        interview_id,
                        question: text.to_string(),
                        score_standard: Some("满分100分".to_string()),
                        answer_text: None,
                        created_at: Utc::now(),
                        answered_at: None,
                    },
                    audio: None,
                },
            );
            ids.push(id);
        }
        if let Some(interview) = inner.interviews.get_mut(&interview_id) {
            interview.row.status = InterviewStatus::QuestionsReady;
            interview.row.question_count += texts.len() as i32;
        }
        ids
    }

    pub fn set_status(&self, interview_id: i64, status: InterviewStatus) {
        if let Some(interview) = self.lock().interviews.get_mut(&interview_id) {
            interview.row.status = status;
        }
    }

    pub fn set_claimed_until(&self, interview_id: i64, until: Option<DateTime<Utc>>) {
        if let Some(interview) = self.lock().interviews.get_mut(&interview_id) {
            interview.claimed_until = until;
        }
    }

    pub fn delete_candidate(&self, candidate_id: i64) {
        self.lock().candidates.remove(&candidate_id);
    }

    // ── Inspection ──────────────────────────────────────────────────────────

    pub fn interview(&self, interview_id: i64) -> Option<InterviewRow> {
        self.lock()
            .interviews
            .get(&interview_id)
            .map(|i| i.row.clone())
    }

    pub fn is_claimed(&self, interview_id: i64) -> bool {
        self.lock()
            .interviews
            .get(&interview_id)
            .map_or(false, |i| !Inner::is_claimable(i, Utc::now()))
    }

    pub fn questions(&self, interview_id: i64) -> Vec<InterviewQuestionRow> {
        self.lock()
            .questions_of(interview_id)
            .map(|q| q.row.clone())
            .collect()
    }

    pub fn answer_audio(&self, question_id: i64) -> Option<Vec<u8>> {
        self.lock()
            .questions
            .get(&question_id)
            .and_then(|q| q.audio.clone())
    }

    pub fn report(&self, interview_id: i64) -> Option<ReportDocument> {
        self.lock()
            .interviews
            .get(&interview_id)
            .and_then(|i| i.report.clone())
    }
}

#[async_trait]
impl InterviewStore for MemoryStore {
    async fn find_interview(&self, interview_id: i64) -> StoreResult<Option<InterviewRow>> {
        Ok(self.interview(interview_id))
    }

    async fn find_interview_by_token(&self, token: &str) -> StoreResult<Option<InterviewRow>> {
        Ok(self
            .lock()
            .interviews
            .values()
            .find(|i| i.row.token == token)
            .map(|i| i.row.clone()))
    }

    async fn find_candidate(&self, candidate_id: i64) -> StoreResult<Option<CandidateRow>> {
        Ok(self.lock().candidates.get(&candidate_id).cloned())
    }

    async fn find_position(&self, position_id: i64) -> StoreResult<Option<PositionRow>> {
        Ok(self.lock().positions.get(&position_id).cloned())
    }

    async fn list_questions(&self, interview_id: i64) -> StoreResult<Vec<InterviewQuestionRow>> {
        Ok(self.questions(interview_id))
    }

    async fn next_question(
        &self,
        interview_id: i64,
        after_id: i64,
    ) -> StoreResult<Option<QuestionPrompt>> {
        Ok(self
            .lock()
            .questions_of(interview_id)
            .find(|q| q.row.id > after_id)
            .map(|q| QuestionPrompt {
                id: q.row.id,
                text: q.row.question.clone(),
            }))
    }

    async fn record_answer(
        &self,
        interview_id: i64,
        question_id: i64,
        answer: &AnswerRecord,
    ) -> StoreResult<bool> {
        let mut inner = self.lock();
        let accepts = inner
            .interviews
            .get(&interview_id)
            .map_or(false, |i| i.row.status.accepts_answers());
        let expected = inner
            .questions_of(interview_id)
            .find(|q| q.row.answered_at.is_none())
            .map(|q| q.row.id);
        if !accepts || expected != Some(question_id) {
            return Ok(false);
        }
        let Some(question) = inner.questions.get_mut(&question_id) else {
            return Ok(false);
        };
        question.row.answer_text = Some(answer.text.clone());
        question.row.answered_at = Some(Utc::now());
        question.audio = Some(answer.audio.to_vec());
        Ok(true)
    }

    async fn complete_if_all_answered(&self, interview_id: i64) -> StoreResult<bool> {
        let mut inner = self.lock();
        let (has_questions, all_answered) = {
            let mut questions = inner.questions_of(interview_id).peekable();
            let has_questions = questions.peek().is_some();
            (has_questions, questions.all(|q| q.row.answered_at.is_some()))
        };
        let Some(interview) = inner.interviews.get_mut(&interview_id) else {
            return Ok(false);
        };
        if has_questions && all_answered && interview.row.status.accepts_answers() {
            interview.row.status = InterviewStatus::Completed;
            interview.row.end_time = Some(Utc::now());
            return Ok(true);
        }
        Ok(false)
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
        let mut inner = self.lock();
        match inner.interviews.get_mut(&interview_id) {
            Some(interview) if interview.row.status == from => {
                interview.row.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_voice_reading(&self, interview_id: i64, enabled: bool) -> StoreResult<()> {
        if let Some(interview) = self.lock().interviews.get_mut(&interview_id) {
            interview.row.voice_reading = enabled;
        }
        Ok(())
    }

    async fn list_claimable(&self, status: InterviewStatus) -> StoreResult<Vec<InterviewRow>> {
        let now = Utc::now();
        Ok(self
            .lock()
            .interviews
            .values()
            .filter(|i| i.row.status == status && Inner::is_claimable(i, now))
            .map(|i| i.row.clone())
            .collect())
    }

    async fn claim(
        &self,
        interview_id: i64,
        status: InterviewStatus,
        lease: Duration,
    ) -> StoreResult<Option<DateTime<Utc>>> {
        let now = Utc::now();
        let mut inner = self.lock();
        match inner.interviews.get_mut(&interview_id) {
            Some(interview)
                if interview.row.status == status && Inner::is_claimable(interview, now) =>
            {
                let lease = chrono::Duration::from_std(lease)
                    .unwrap_or_else(|_| chrono::Duration::seconds(0));
                interview.claimed_until = Some(now + lease);
                Ok(interview.claimed_until)
            }
            _ => Ok(None),
        }
    }

    async fn release_claim(
        &self,
        interview_id: i64,
        claimed_until: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut inner = self.lock();
        if let Some(interview) = inner.interviews.get_mut(&interview_id) {
            if interview.claimed_until == Some(claimed_until) {
                interview.claimed_until = None;
            }
        }
        Ok(())
    }

    async fn save_generated_questions(
        &self,
        interview_id: i64,
        questions: &[NewQuestion],
    ) -> StoreResult<bool> {
        let mut inner = self.lock();
        let ready = inner
            .interviews
            .get(&interview_id)
            .map_or(false, |i| i.row.status == InterviewStatus::NotStarted);
        if !ready {
            return Ok(false);
        }
        for question in questions {
            let id = inner.allocate_id();
            inner.questions.insert(
                id,
                StoredQuestion {
                    row: InterviewQuestionRow {
                        id,
                        interview_id,
                        question: question.question.clone(),
                        score_standard: question.score_standard.clone(),
                        answer_text: None,
                        created_at: Utc::now(),
                        answered_at: None,
                    },
                    audio: None,
                },
            );
        }
        if let Some(interview) = inner.interviews.get_mut(&interview_id) {
            interview.row.status = InterviewStatus::QuestionsReady;
            interview.row.question_count = questions.len() as i32;
            interview.claimed_until = None;
        }
        Ok(true)
    }

    async fn save_report(&self, interview_id: i64, report: &StoredReport) -> StoreResult<bool> {
        let mut inner = self.lock();
        match inner.interviews.get_mut(&interview_id) {
            Some(interview) if interview.row.status == InterviewStatus::Completed => {
                interview.row.status = InterviewStatus::ReportReady;
                interview.row.report_degraded = report.degraded;
                interview.row.report_warning = report.warning.clone();
                interview.claimed_until = None;
                interview.report = Some(ReportDocument {
                    content: report.content.clone(),
                    content_type: report.content_type.clone(),
                });
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create_interview(
        &self,
        new_interview: &NewInterview,
        token: &str,
    ) -> StoreResult<InterviewRow> {
        let id = self.insert_interview(
            new_interview.candidate_id,
            token,
            InterviewStatus::NotStarted,
        );
        let mut inner = self.lock();
        let interview = inner.interviews.get_mut(&id).ok_or(sqlx::Error::RowNotFound)?;
        interview.row.interviewer = new_interview.interviewer.clone();
        interview.row.start_time = new_interview.start_time;
        Ok(interview.row.clone())
    }

    async fn list_interviews(&self) -> StoreResult<Vec<InterviewRow>> {
        Ok(self
            .lock()
            .interviews
            .values()
            .map(|i| i.row.clone())
            .collect())
    }

    async fn update_interview(
        &self,
        interview_id: i64,
        update: &InterviewUpdate,
    ) -> StoreResult<Option<InterviewRow>> {
        let mut inner = self.lock();
        let Some(interview) = inner.interviews.get_mut(&interview_id) else {
            return Ok(None);
        };
        if let Some(interviewer) = &update.interviewer {
            interview.row.interviewer = Some(interviewer.clone());
        }
        if let Some(start_time) = update.start_time {
            interview.row.start_time = Some(start_time);
        }
        if let Some(is_passed) = update.is_passed {
            interview.row.is_passed = Some(is_passed);
        }
        Ok(Some(interview.row.clone()))
    }

    async fn reissue_token(&self, interview_id: i64, token: &str) -> StoreResult<bool> {
        let mut inner = self.lock();
        match inner.interviews.get_mut(&interview_id) {
            Some(interview) => {
                interview.row.token = token.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_interview(&self, interview_id: i64) -> StoreResult<bool> {
        let mut inner = self.lock();
        inner
            .questions
            .retain(|_, q| q.row.interview_id != interview_id);
        Ok(inner.interviews.remove(&interview_id).is_some())
    }

    async fn report_document(&self, interview_id: i64) -> StoreResult<Option<ReportDocument>> {
        Ok(self.report(interview_id))
    }
}
