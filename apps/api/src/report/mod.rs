//! Interview evaluation payload and report rendering.
//!
//! The generation service's evaluation is wrapped in [`EvaluationOutcome`] so a
//! report built from placeholder data is distinguishable from a genuine one.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::llm_client::LlmError;
use crate::models::interview::StoredReport;

pub mod template;

pub const REPORT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Per-question scoring returned by the generation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionEvaluation {
    #[serde(default, deserialize_with = "lenient_index")]
    pub id: Option<u32>,
    #[serde(default)]
    pub question: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub score_standard: String,
    #[serde(default)]
    pub answer: String,
    /// 0 – 100
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub comments: String,
}

/// Full evaluation returned by the generation service.
/// Every field is optional on the wire; models routinely omit or retype fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(default)]
    pub question_evaluations: Vec<QuestionEvaluation>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub technical_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub communication_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub overall_score: Option<f64>,
    #[serde(default)]
    pub comments: String,
    /// 推荐录用 / 可以考虑 / 不建议录用
    #[serde(default)]
    pub recommendation: String,
}

impl Evaluation {
    /// True when the reply carried neither scores nor per-question feedback.
    pub fn is_empty(&self) -> bool {
        self.question_evaluations.is_empty()
            && self.technical_score.is_none()
            && self.communication_score.is_none()
            && self.overall_score.is_none()
    }
}

/// Result of asking the generation service for an evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    /// A usable evaluation.
    Success(Evaluation),
    /// The service answered but the evaluation is unusable; the report is still
    /// produced with placeholder data and flagged.
    Degraded { reason: String },
    /// The service could not be reached; nothing is written and the interview is retried.
    Failed { reason: String },
}

impl EvaluationOutcome {
    pub fn from_result(result: Result<Evaluation, LlmError>) -> Self {
        match result {
            Ok(evaluation) if evaluation.is_empty() => EvaluationOutcome::Degraded {
                reason: "Evaluation contained no scores".to_string(),
            },
            Ok(evaluation) => EvaluationOutcome::Success(evaluation),
            Err(e) if e.is_transient() => EvaluationOutcome::Failed {
                reason: e.to_string(),
            },
            Err(e) => EvaluationOutcome::Degraded {
                reason: e.to_string(),
            },
        }
    }
}

/// Metadata merged into the report template.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub candidate_name: String,
    pub position_name: String,
    pub interviewer: String,
    /// Already formatted, e.g. `2025年03月14日`.
    pub interview_date: String,
}

/// Renders the report for a non-failed outcome. Returns None for `Failed`.
pub fn build_report(context: &ReportContext, outcome: &EvaluationOutcome) -> Option<StoredReport> {
    let (evaluation, warning) = match outcome {
        EvaluationOutcome::Success(evaluation) => (evaluation.clone(), None),
        EvaluationOutcome::Degraded { reason } => (Evaluation::default(), Some(reason.clone())),
        EvaluationOutcome::Failed { .. } => return None,
    };

    let html = template::render_report_html(context, &evaluation, warning.as_deref());

    Some(StoredReport {
        content: html.into_bytes(),
        content_type: REPORT_CONTENT_TYPE.to_string(),
        degraded: warning.is_some(),
        warning,
    })
}

fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .trim_end_matches('分')
            .trim_end_matches("/100")
            .trim()
            .parse()
            .ok(),
        _ => None,
    }))
}

fn lenient_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(lenient_score(deserializer)?
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32))
}

/// Accepts a string, or any other JSON value rendered as compact JSON.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}
