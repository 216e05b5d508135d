use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// `Degraded` covers a run that completed but skipped or failed some of
/// its individual units of work -- e.g. a stats-ingest run
/// that updated 48 of 50 players. `error_count` on `JobLog` carries how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Success,
    Degraded,
    Failed,
}

/// Audit row for one run of a named scheduler job. Kept indefinitely for
/// admin inspection; the scheduler itself only reads the most recent row per
/// job name to decide whether a run is overdue. A row is inserted as
/// `Running` when the job starts and updated in place once it finishes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobLog {
    pub id: Uuid,
    pub job_name: String,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_count: i32,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobLogSummary {
    pub job_name: String,
    pub last_status: JobStatus,
    pub last_finished_at: Option<DateTime<Utc>>,
}
