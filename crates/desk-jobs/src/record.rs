//! Job records and the lifecycle state machine

use chrono::{DateTime, Utc};
use desk_core::AnalysisRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Unique identifier of one analysis job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh, collision-free id
    pub fn generate() -> Self {
        Self(format!("analysis_{}", Uuid::new_v4().simple()))
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lifecycle state of a job
///
/// Transitions are one-directional: `Queued -> Running -> {Completed,
/// Failed}`. Terminal states permit no further transition. There is no
/// cancelled state; once running, a job runs to completion or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, waiting for its execution task to begin
    Queued,
    /// Pipeline execution in progress
    Running,
    /// Pipeline returned a report (terminal)
    Completed,
    /// Pipeline raised an unrecovered error (terminal)
    Failed,
}

impl JobStatus {
    /// Whether this status permits no further transition
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether the state machine permits moving to `next`
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }

    /// Status name as used in queries
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One analysis job's lifecycle record
///
/// Owned by the [`crate::JobStore`]; readers only ever see clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique job id
    pub id: JobId,

    /// Current lifecycle state
    pub status: JobStatus,

    /// Submission parameters
    pub request: AnalysisRequest,

    /// Set once at creation
    pub created_at: DateTime<Utc>,

    /// Set once on entry to Running
    pub started_at: Option<DateTime<Utc>>,

    /// Set once on entry to a terminal state
    pub completed_at: Option<DateTime<Utc>>,

    /// Present iff status is Completed
    pub result: Option<Value>,

    /// Present iff status is Failed
    pub error: Option<String>,
}

impl JobRecord {
    /// Create a fresh queued record
    pub fn new(id: JobId, request: AnalysisRequest) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            request,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
        }
    }

    /// Whether a result body exists
    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }
}

/// Status view of a record, the shape returned by status queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSummary {
    pub id: JobId,
    pub status: JobStatus,
    pub symbol: String,
    pub market: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub has_result: bool,
    pub error: Option<String>,
}

impl From<&JobRecord> for StatusSummary {
    fn from(record: &JobRecord) -> Self {
        Self {
            id: record.id.clone(),
            status: record.status,
            symbol: record.request.symbol.clone(),
            market: record.request.market.clone(),
            created_at: record.created_at,
            started_at: record.started_at,
            completed_at: record.completed_at,
            has_result: record.has_result(),
            error: record.error.clone(),
        }
    }
}
