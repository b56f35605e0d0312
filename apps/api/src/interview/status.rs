//! Interview status state machine.
//!
//! NotStarted → QuestionsReady → InProgress → Completed → ReportReady
//!
//! Status values are persisted as SMALLINT codes (0–4). Every transition in the
//! store is a compare-and-swap on the exact prior status, so a record can only
//! move forward along one of the edges accepted by [`InterviewStatus::can_transition_to`].

use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[repr(i16)]
pub enum InterviewStatus {
    NotStarted = 0,
    QuestionsReady = 1,
    InProgress = 2,
    Completed = 3,
    ReportReady = 4,
}

impl InterviewStatus {
    pub fn code(self) -> i16 {
        self as i16
    }

    #[cfg(test)]
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(InterviewStatus::NotStarted),
            1 => Some(InterviewStatus::QuestionsReady),
            2 => Some(InterviewStatus::InProgress),
            3 => Some(InterviewStatus::Completed),
            4 => Some(InterviewStatus::ReportReady),
            _ => None,
        }
    }

    /// Returns true when `to` is a legal forward edge from `self`.
    ///
    /// QuestionsReady may skip InProgress: answering is accepted without an
    /// explicit first fetch, so the last answer can complete the interview directly.
    pub fn can_transition_to(self, to: InterviewStatus) -> bool {
        use InterviewStatus::*;
        matches!(
            (self, to),
            (NotStarted, QuestionsReady)
                | (QuestionsReady, InProgress)
                | (QuestionsReady, Completed)
                | (InProgress, Completed)
                | (Completed, ReportReady)
        )
    }

    /// Candidate answers are only accepted while questions are being served.
    pub fn accepts_answers(self) -> bool {
        matches!(
            self,
            InterviewStatus::QuestionsReady | InterviewStatus::InProgress
        )
    }

    /// Statuses from which the completion check may move the interview to Completed.
    pub fn completable_from() -> [InterviewStatus; 2] {
        [InterviewStatus::QuestionsReady, InterviewStatus::InProgress]
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterviewStatus::NotStarted => write!(f, "NOT_STARTED"),
            InterviewStatus::QuestionsReady => write!(f, "QUESTIONS_READY"),
            InterviewStatus::InProgress => write!(f, "IN_PROGRESS"),
            InterviewStatus::Completed => write!(f, "COMPLETED"),
            InterviewStatus::ReportReady => write!(f, "REPORT_READY"),
        }
    }
}

// Clients receive the numeric code, matching the persisted value.
impl Serialize for InterviewStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i16(self.code())
    }
}
