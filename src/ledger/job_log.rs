use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{JobLog, JobStatus};

pub async fn start(pool: &PgPool, job_name: &str) -> Result<Uuid, sqlx::Error> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO job_log (id, job_name, status, started_at, finished_at, error_count, detail)
        VALUES ($1, $2, 'running', NOW(), NULL, 0, NULL)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(job_name)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn finish(
    pool: &PgPool,
    id: Uuid,
    status: JobStatus,
    error_count: i32,
    detail: Option<String>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE job_log SET status = $2, finished_at = NOW(), error_count = $3, detail = $4 WHERE id = $1",
    )
    .bind(id)
    .bind(status)
    .bind(error_count)
    .bind(detail)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_latest_for_job(pool: &PgPool, job_name: &str) -> Result<Option<JobLog>, sqlx::Error> {
    sqlx::query_as::<_, JobLog>(
        "SELECT * FROM job_log WHERE job_name = $1 ORDER BY started_at DESC LIMIT 1",
    )
    .bind(job_name)
    .fetch_optional(pool)
    .await
}

pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<JobLog>, sqlx::Error> {
    sqlx::query_as::<_, JobLog>("SELECT * FROM job_log ORDER BY started_at DESC LIMIT $1")
        .bind(limit)
        .fetch_all(pool)
        .await
}

pub async fn list_recent_for_job(pool: &PgPool, job_name: &str, limit: i64) -> Result<Vec<JobLog>, sqlx::Error> {
    sqlx::query_as::<_, JobLog>(
        "SELECT * FROM job_log WHERE job_name = $1 ORDER BY started_at DESC LIMIT $2",
    )
    .bind(job_name)
    .bind(limit)
    .fetch_all(pool)
    .await
}
