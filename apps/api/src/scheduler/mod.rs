//! Background pollers that advance interviews through the state machine.
//!
//! Each job runs once immediately at startup and then on a fixed period.
//! Records are processed independently: a failing interview is logged and the
//! rest of the batch continues. Before any external call a job claims the
//! record with a lease (see `InterviewStore::claim`), so overlapping runs never
//! process the same interview twice for the same transition.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::errors::AppError;
use crate::models::interview::InterviewRow;

pub mod prompts;
pub mod questions;
pub mod reports;

pub use questions::QuestionScheduler;
pub use reports::ReportScheduler;

/// What happened to one interview during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The interview moved to its next status.
    Advanced,
    /// Another worker holds the claim or the status moved underneath us.
    Skipped,
}

/// Per-run counters, logged at the end of every cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub found: usize,
    pub advanced: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, result: &Result<RecordOutcome, AppError>) {
        match result {
            Ok(RecordOutcome::Advanced) => self.advanced += 1,
            Ok(RecordOutcome::Skipped) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "found={} advanced={} skipped={} failed={}",
            self.found, self.advanced, self.skipped, self.failed
        )
    }
}

#[async_trait]
pub trait PollingJob: Send + Sync {
    fn name(&self) -> &'static str;

    /// Interviews this job should look at in the current cycle.
    async fn pending(&self) -> Result<Vec<InterviewRow>, AppError>;

    /// Claims and processes a single interview. Implementations release their
    /// claim on every path that does not advance the interview.
    async fn process(&self, interview: &InterviewRow) -> Result<RecordOutcome, AppError>;

    /// One polling cycle over every pending interview.
    async fn run_once(&self) -> Result<RunSummary, AppError> {
        let pending = self.pending().await?;
        let mut summary = RunSummary {
            found: pending.len(),
            ..RunSummary::default()
        };

        for interview in &pending {
            let result = self.process(interview).await;
            match &result {
                Ok(RecordOutcome::Advanced) => {
                    info!(job = self.name(), interview_id = interview.id, "Interview advanced")
                }
                Ok(RecordOutcome::Skipped) => {
                    debug!(job = self.name(), interview_id = interview.id, "Interview skipped")
                }
                Err(e) => warn!(
                    job = self.name(),
                    interview_id = interview.id,
                    "Interview processing failed, will retry next cycle: {e}"
                ),
            }
            summary.record(&result);
        }

        Ok(summary)
    }
}

/// Spawns `job` on a fixed period until `shutdown` flips to true.
/// The first tick fires immediately, giving the eager run at startup.
pub fn spawn_poller(
    job: Arc<dyn PollingJob>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            job = job.name(),
            period_secs = period.as_secs(),
            "Scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match job.run_once().await {
                        Ok(summary) if summary.found > 0 => {
                            info!(job = job.name(), "Scheduler run finished: {summary}")
                        }
                        Ok(_) => debug!(job = job.name(), "Nothing to process"),
                        Err(e) => error!(job = job.name(), "Scheduler run failed: {e}"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(job = job.name(), "Scheduler stopped");
                        break;
                    }
                }
            }
        }
    })
}

/// Releases a claim after an unsuccessful attempt; a failure here only delays
/// the retry until the lease expires.
pub(crate) async fn release_quietly(
    store: &dyn crate::store::InterviewStore,
    job: &'static str,
    interview_id: i64,
    claimed_until: chrono::DateTime<chrono::Utc>,
) {
    if let Err(e) = store.release_claim(interview_id, claimed_until).await {
        warn!(job, interview_id, "Failed to release claim: {e}");
    }
}
