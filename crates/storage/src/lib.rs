use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use uuid::Uuid;

use shared::{
    domain::{ApiProvider, CertificateType, Role, SubmissionId, VerificationMode},
    protocol::{SubmissionPayload, VerificationOutcome, VerificationReport},
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// One completed verification request, as persisted.
#[derive(Debug, Clone)]
pub struct StoredSubmission {
    pub submission_id: SubmissionId,
    pub submitted_by: String,
    pub submitted_as: Role,
    pub certificate_type: CertificateType,
    pub file_count: u32,
    pub candidate_name: String,
    pub roll_number: String,
    pub institution: String,
    pub year_of_passing: String,
    pub certificate_number: Option<String>,
    pub bulk_enabled: bool,
    pub bulk_file_count: u32,
    pub api_connection: Option<ApiProvider>,
    pub verification_mode: VerificationMode,
    pub outcome: VerificationOutcome,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// System-wide counters behind the admin dashboard cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionStats {
    pub total: i64,
    pub verified: i64,
    pub failed: i64,
    pub institutions: i64,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn kv_read(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    pub async fn kv_write(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn kv_delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn record_submission(
        &self,
        payload: &SubmissionPayload,
        report: &VerificationReport,
    ) -> Result<()> {
        let (outcome, failure_reason) = match &report.outcome {
            VerificationOutcome::Verified => ("verified", None),
            VerificationOutcome::Failed { reason } => ("failed", Some(reason.as_str())),
        };
        sqlx::query(
            "INSERT INTO submissions (
                 id, submitted_by, submitted_as, certificate_type, file_count,
                 candidate_name, roll_number, institution, year_of_passing,
                 certificate_number, bulk_enabled, bulk_file_count, api_connection,
                 verification_mode, outcome, failure_reason, submitted_at, completed_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(payload.submission_id.to_string())
        .bind(&payload.submitted_by)
        .bind(payload.submitted_as.as_str())
        .bind(payload.certificate_type.to_string())
        .bind(payload.files.len() as i64)
        .bind(&payload.metadata.candidate_name)
        .bind(&payload.metadata.roll_number)
        .bind(&payload.metadata.institution)
        .bind(&payload.metadata.year_of_passing)
        .bind(payload.metadata.certificate_number.as_deref())
        .bind(payload.bulk.enabled)
        .bind(payload.bulk.files.len() as i64)
        .bind(payload.bulk.api_connection.map(ApiProvider::as_str))
        .bind(payload.verification_mode.to_string())
        .bind(outcome)
        .bind(failure_reason)
        .bind(payload.submitted_at)
        .bind(report.finished_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_submissions_for(
        &self,
        email: &str,
        limit: u32,
    ) -> Result<Vec<StoredSubmission>> {
        let rows = sqlx::query(
            "SELECT * FROM submissions
             WHERE submitted_by = ?
             ORDER BY submitted_at DESC
             LIMIT ?",
        )
        .bind(email)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(submission_from_row).collect()
    }

    pub async fn list_recent(&self, limit: u32) -> Result<Vec<StoredSubmission>> {
        let rows = sqlx::query(
            "SELECT * FROM submissions
             ORDER BY submitted_at DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(submission_from_row).collect()
    }

    pub async fn submission_stats(&self) -> Result<SubmissionStats> {
        let row = sqlx::query(
            "SELECT COUNT(*),
                    COALESCE(SUM(outcome = 'verified'), 0),
                    COALESCE(SUM(outcome = 'failed'), 0),
                    COUNT(DISTINCT institution)
             FROM submissions",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(SubmissionStats {
            total: row.get::<i64, _>(0),
            verified: row.get::<i64, _>(1),
            failed: row.get::<i64, _>(2),
            institutions: row.get::<i64, _>(3),
        })
    }
}

fn submission_from_row(row: &SqliteRow) -> Result<StoredSubmission> {
    let id: String = row.try_get("id")?;
    let submitted_as: String = row.try_get("submitted_as")?;
    let certificate_type: String = row.try_get("certificate_type")?;
    let api_connection: Option<String> = row.try_get("api_connection")?;
    let verification_mode: String = row.try_get("verification_mode")?;
    let outcome: String = row.try_get("outcome")?;
    let failure_reason: Option<String> = row.try_get("failure_reason")?;

    let outcome = match outcome.as_str() {
        "verified" => VerificationOutcome::Verified,
        _ => VerificationOutcome::Failed {
            reason: failure_reason.unwrap_or_default(),
        },
    };

    Ok(StoredSubmission {
        submission_id: SubmissionId(
            Uuid::parse_str(&id).with_context(|| format!("bad submission id '{id}'"))?,
        ),
        submitted_by: row.try_get("submitted_by")?,
        submitted_as: submitted_as
            .parse()
            .with_context(|| format!("bad role '{submitted_as}'"))?,
        certificate_type: certificate_type
            .parse()
            .with_context(|| format!("bad certificate type '{certificate_type}'"))?,
        file_count: row.try_get::<i64, _>("file_count")? as u32,
        candidate_name: row.try_get("candidate_name")?,
        roll_number: row.try_get("roll_number")?,
        institution: row.try_get("institution")?,
        year_of_passing: row.try_get("year_of_passing")?,
        certificate_number: row.try_get("certificate_number")?,
        bulk_enabled: row.try_get("bulk_enabled")?,
        bulk_file_count: row.try_get::<i64, _>("bulk_file_count")? as u32,
        api_connection: api_connection
            .map(|p| {
                p.parse::<ApiProvider>()
                    .with_context(|| format!("bad api provider '{p}'"))
            })
            .transpose()?,
        verification_mode: verification_mode
            .parse()
            .with_context(|| format!("bad verification mode '{verification_mode}'"))?,
        outcome,
        submitted_at: row.try_get("submitted_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
