//! Report generation: Completed → ReportReady.
//!
//! An unreachable generation service leaves the interview Completed for the
//! next cycle. An unusable evaluation still produces a report, flagged as
//! degraded on the interview row.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, Utc};
use tracing::{info, warn};

use super::prompts::{
    EVALUATION_PROMPT_FOOTER, EVALUATION_PROMPT_HEADER, EVALUATION_QUESTION_BLOCK,
    EVALUATION_SYSTEM_ROLE, MISSING_ANSWER_TEXT, MISSING_FIELD_TEXT,
};
use super::{release_quietly, PollingJob, RecordOutcome};
use crate::errors::AppError;
use crate::interview::status::InterviewStatus;
use crate::llm_client::prompts::json_system;
use crate::llm_client::{call_json, LlmBackend};
use crate::models::interview::{InterviewQuestionRow, InterviewRow};
use crate::report::{build_report, Evaluation, EvaluationOutcome, ReportContext};
use crate::store::InterviewStore;

const JOB_NAME: &str = "report-generation";

pub struct ReportScheduler {
    store: Arc<dyn InterviewStore>,
    llm: Arc<dyn LlmBackend>,
    lease: Duration,
}

impl ReportScheduler {
    pub fn new(store: Arc<dyn InterviewStore>, llm: Arc<dyn LlmBackend>, lease: Duration) -> Self {
        Self { store, llm, lease }
    }

    async fn evaluate_and_save(&self, interview: &InterviewRow) -> Result<RecordOutcome, AppError> {
        let candidate = self
            .store
            .find_candidate(interview.candidate_id)
            .await?
            .ok_or_else(|| {
                AppError::DataIntegrity(format!(
                    "Candidate {} of interview {} not found",
                    interview.candidate_id, interview.id
                ))
            })?;

        let position = self
            .store
            .find_position(candidate.position_id)
            .await?
            .ok_or_else(|| {
                AppError::DataIntegrity(format!(
                    "Position {} of candidate {} not found",
                    candidate.position_id, candidate.id
                ))
            })?;

        let questions = self.store.list_questions(interview.id).await?;

        let context = ReportContext {
            candidate_name: candidate.name,
            position_name: position.name,
            interviewer: interview
                .interviewer
                .clone()
                .unwrap_or_else(|| MISSING_FIELD_TEXT.to_string()),
            interview_date: interview
                .end_time
                .unwrap_or_else(Utc::now)
                .with_timezone(&Local)
                .format("%Y年%m月%d日")
                .to_string(),
        };

        let prompt = build_evaluation_prompt(&context, &questions);
        let result = call_json::<Evaluation>(
            self.llm.as_ref(),
            &prompt,
            &json_system(EVALUATION_SYSTEM_ROLE),
        )
        .await;

        let outcome = EvaluationOutcome::from_result(result);
        if let EvaluationOutcome::Degraded { reason } = &outcome {
            warn!(
                interview_id = interview.id,
                "Evaluation unusable, writing placeholder report: {reason}"
            );
        }

        let Some(report) = build_report(&context, &outcome) else {
            let reason = match outcome {
                EvaluationOutcome::Failed { reason } => reason,
                _ => "no report produced".to_string(),
            };
            return Err(AppError::UpstreamUnavailable(format!(
                "Evaluation failed: {reason}"
            )));
        };

        if self.store.save_report(interview.id, &report).await? {
            info!(
                interview_id = interview.id,
                degraded = report.degraded,
                "Report saved ({} bytes)",
                report.content.len()
            );
            Ok(RecordOutcome::Advanced)
        } else {
            Ok(RecordOutcome::Skipped)
        }
    }
}

#[async_trait]
impl PollingJob for ReportScheduler {
    fn name(&self) -> &'static str {
        JOB_NAME
    }

    async fn pending(&self) -> Result<Vec<InterviewRow>, AppError> {
        Ok(self.store.list_claimable(InterviewStatus::Completed).await?)
    }

    async fn process(&self, interview: &InterviewRow) -> Result<RecordOutcome, AppError> {
        let Some(claimed_until) = self
            .store
            .claim(interview.id, InterviewStatus::Completed, self.lease)
            .await?
        else {
            return Ok(RecordOutcome::Skipped);
        };

        let result = self.evaluate_and_save(interview).await;
        if !matches!(result, Ok(RecordOutcome::Advanced)) {
            release_quietly(self.store.as_ref(), JOB_NAME, interview.id, claimed_until).await;
        }
        result
    }
}

/// Header, one block per question in id order, then the output schema.
fn build_evaluation_prompt(context: &ReportContext, questions: &[InterviewQuestionRow]) -> String {
    let mut prompt = EVALUATION_PROMPT_HEADER
        .replace("{candidate_name}", &context.candidate_name)
        .replace("{position_name}", &context.position_name)
        .replace("{interviewer}", &context.interviewer);

    for (index, question) in questions.iter().enumerate() {
        let answer = question
            .answer_text
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(MISSING_ANSWER_TEXT);
        prompt.push_str(
            &EVALUATION_QUESTION_BLOCK
                .replace("{index}", &(index + 1).to_string())
                .replace("{question}", &question.question)
                .replace(
                    "{score_standard}",
                    question.score_standard.as_deref().unwrap_or(MISSING_FIELD_TEXT),
                )
                .replace("{answer}", answer),
        );
    }

    prompt.push_str(EVALUATION_PROMPT_FOOTER);
    prompt
}
