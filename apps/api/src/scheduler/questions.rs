//! Question generation: NotStarted → QuestionsReady.
//!
//! Flow per interview: claim → load candidate + position → extract résumé text →
//! LLM generate → persist questions, question_count and status in one transaction.
//! Any failure releases the claim and leaves the interview at NotStarted, so it
//! is picked up again on the next cycle.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::prompts::{QUESTION_PROMPT_TEMPLATE, QUESTION_SYSTEM_ROLE};
use super::{release_quietly, PollingJob, RecordOutcome};
use crate::errors::AppError;
use crate::interview::status::InterviewStatus;
use crate::llm_client::prompts::json_system;
use crate::llm_client::{call_json, LlmBackend};
use crate::models::interview::{CandidateRow, InterviewRow, NewQuestion, PositionRow};
use crate::resume::extract_resume_text;
use crate::store::InterviewStore;

const JOB_NAME: &str = "question-generation";

/// One question as returned by the model. `score_standard` may be text or a
/// structured rubric.
#[derive(Debug, Deserialize)]
struct GeneratedQuestion {
    question: String,
    #[serde(default)]
    score_standard: Value,
}

pub struct QuestionScheduler {
    store: Arc<dyn InterviewStore>,
    llm: Arc<dyn LlmBackend>,
    question_count: u32,
    lease: Duration,
}

impl QuestionScheduler {
    pub fn new(
        store: Arc<dyn InterviewStore>,
        llm: Arc<dyn LlmBackend>,
        question_count: u32,
        lease: Duration,
    ) -> Self {
        Self {
            store,
            llm,
            question_count,
            lease,
        }
    }

    async fn generate_and_save(&self, interview: &InterviewRow) -> Result<RecordOutcome, AppError> {
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

        info!(
            interview_id = interview.id,
            "Generating questions for candidate {} / position {}", candidate.name, position.name
        );

        let prompt = self.build_prompt(&candidate, &position).await;
        let system = json_system(
            &QUESTION_SYSTEM_ROLE.replace("{question_count}", &self.question_count.to_string()),
        );

        let reply: Value = call_json(self.llm.as_ref(), &prompt, &system)
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("Question generation failed: {e}")))?;

        let questions = parse_generated_questions(reply)?;

        if self
            .store
            .save_generated_questions(interview.id, &questions)
            .await?
        {
            info!(
                interview_id = interview.id,
                "Generated {} questions",
                questions.len()
            );
            Ok(RecordOutcome::Advanced)
        } else {
            Ok(RecordOutcome::Skipped)
        }
    }

    async fn build_prompt(&self, candidate: &CandidateRow, position: &PositionRow) -> String {
        let resume_text = extract_resume_text(candidate.resume_content.clone()).await;

        QUESTION_PROMPT_TEMPLATE
            .replace("{position_name}", &position.name)
            .replace(
                "{requirements}",
                position.requirements.as_deref().unwrap_or_default(),
            )
            .replace(
                "{responsibilities}",
                position.responsibilities.as_deref().unwrap_or_default(),
            )
            .replace("{question_count}", &self.question_count.to_string())
            // résumé last: its text must not be scanned for placeholders
            .replace("{resume_text}", &resume_text)
    }
}

#[async_trait]
impl PollingJob for QuestionScheduler {
    fn name(&self) -> &'static str {
        JOB_NAME
    }

    async fn pending(&self) -> Result<Vec<InterviewRow>, AppError> {
        Ok(self
            .store
            .list_claimable(InterviewStatus::NotStarted)
            .await?)
    }

    async fn process(&self, interview: &InterviewRow) -> Result<RecordOutcome, AppError> {
        let Some(claimed_until) = self
            .store
            .claim(interview.id, InterviewStatus::NotStarted, self.lease)
            .await?
        else {
            return Ok(RecordOutcome::Skipped);
        };

        let result = self.generate_and_save(interview).await;
        if !matches!(result, Ok(RecordOutcome::Advanced)) {
            release_quietly(self.store.as_ref(), JOB_NAME, interview.id, claimed_until).await;
        }
        result
    }
}

/// Accepts `{"questions": [...]}`, a bare array, or an object whose only
/// array-valued field holds the questions.
fn parse_generated_questions(reply: Value) -> Result<Vec<NewQuestion>, AppError> {
    let items = match reply {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(items)) => items,
            _ => {
                let mut arrays = map.into_iter().filter_map(|(_, v)| match v {
                    Value::Array(items) => Some(items),
                    _ => None,
                });
                match (arrays.next(), arrays.next()) {
                    (Some(items), None) => items,
                    _ => {
                        return Err(AppError::UpstreamUnavailable(
                            "Question generation reply has no question list".to_string(),
                        ))
                    }
                }
            }
        },
        _ => {
            return Err(AppError::UpstreamUnavailable(
                "Question generation reply is not a JSON object".to_string(),
            ))
        }
    };

    let mut questions = Vec::with_capacity(items.len());
    for item in items {
        let generated: GeneratedQuestion = serde_json::from_value(item).map_err(|e| {
            AppError::UpstreamUnavailable(format!("Malformed generated question: {e}"))
        })?;
        let question = generated.question.trim();
        if question.is_empty() {
            continue;
        }
        questions.push(NewQuestion {
            question: question.to_string(),
            score_standard: rubric_text(generated.score_standard),
        });
    }

    if questions.is_empty() {
        return Err(AppError::UpstreamUnavailable(
            "Question generation returned no questions".to_string(),
        ));
    }
    Ok(questions)
}

/// Structured rubrics are stored as JSON text.
fn rubric_text(rubric: Value) -> Option<String> {
    match rubric {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
