use super::*;
use chrono::Utc;
use shared::{
    domain::{CertificateMetadata, FileMeta},
    protocol::BulkUploadPayload,
};

fn sample_payload(email: &str, institution: &str) -> SubmissionPayload {
    SubmissionPayload {
        submission_id: SubmissionId::generate(),
        submitted_by: email.to_string(),
        submitted_as: Role::Citizen,
        certificate_type: CertificateType::Degree,
        files: vec![FileMeta {
            name: "cert.pdf".to_string(),
            size_bytes: 2048,
            mime_type: Some("application/pdf".to_string()),
        }],
        metadata: CertificateMetadata {
            candidate_name: "Asha Verma".to_string(),
            roll_number: "DU-2019-1143".to_string(),
            institution: institution.to_string(),
            year_of_passing: "2019".to_string(),
            certificate_number: None,
        },
        bulk: BulkUploadPayload::default(),
        verification_mode: VerificationMode::Online,
        submitted_at: Utc::now(),
    }
}

fn report_for(payload: &SubmissionPayload, outcome: VerificationOutcome) -> VerificationReport {
    VerificationReport {
        submission_id: payload.submission_id,
        outcome,
        mode: payload.verification_mode,
        started_at: payload.submitted_at,
        finished_at: Utc::now(),
    }
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn kv_round_trips_and_deletes() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert_eq!(storage.kv_read("dp_auth").await.expect("read"), None);

    storage
        .kv_write("dp_auth", r#"{"email":"a@b.c","role":"citizen"}"#)
        .await
        .expect("write");
    assert_eq!(
        storage.kv_read("dp_auth").await.expect("read"),
        Some(r#"{"email":"a@b.c","role":"citizen"}"#.to_string())
    );

    storage
        .kv_write("dp_auth", "replacement")
        .await
        .expect("overwrite");
    assert_eq!(
        storage.kv_read("dp_auth").await.expect("read"),
        Some("replacement".to_string())
    );

    storage.kv_delete("dp_auth").await.expect("delete");
    assert_eq!(storage.kv_read("dp_auth").await.expect("read"), None);
    // Deleting an absent key is a no-op.
    storage.kv_delete("dp_auth").await.expect("delete again");
}

#[tokio::test]
async fn records_and_lists_submissions_per_user() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let mine = sample_payload("me@example.org", "University of Delhi");
    let theirs = sample_payload("other@example.org", "Anna University");
    storage
        .record_submission(&mine, &report_for(&mine, VerificationOutcome::Verified))
        .await
        .expect("record");
    storage
        .record_submission(&theirs, &report_for(&theirs, VerificationOutcome::Verified))
        .await
        .expect("record");

    let listed = storage
        .list_submissions_for("me@example.org", 10)
        .await
        .expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].submission_id, mine.submission_id);
    assert_eq!(listed[0].institution, "University of Delhi");
    assert_eq!(listed[0].outcome, VerificationOutcome::Verified);
    assert_eq!(listed[0].file_count, 1);
}

#[tokio::test]
async fn stored_submission_preserves_enum_tags() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let mut payload = sample_payload("org@example.org", "Anna University");
    payload.submitted_as = Role::Organization;
    payload.certificate_type = CertificateType::Other("skill".to_string());
    payload.bulk = BulkUploadPayload {
        enabled: true,
        files: vec![FileMeta {
            name: "batch.csv".to_string(),
            size_bytes: 512,
            mime_type: Some("text/csv".to_string()),
        }],
        api_connection: Some(ApiProvider::Digilocker),
    };
    storage
        .record_submission(&payload, &report_for(&payload, VerificationOutcome::Verified))
        .await
        .expect("record");

    let listed = storage.list_recent(1).await.expect("list");
    assert_eq!(listed[0].submitted_as, Role::Organization);
    assert_eq!(
        listed[0].certificate_type,
        CertificateType::Other("skill".to_string())
    );
    assert!(listed[0].bulk_enabled);
    assert_eq!(listed[0].bulk_file_count, 1);
    assert_eq!(listed[0].api_connection, Some(ApiProvider::Digilocker));
}

#[tokio::test]
async fn stats_count_outcomes_and_distinct_institutions() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let stats = storage.submission_stats().await.expect("stats");
    assert_eq!(
        stats,
        SubmissionStats {
            total: 0,
            verified: 0,
            failed: 0,
            institutions: 0
        }
    );

    let a = sample_payload("a@example.org", "University of Delhi");
    let b = sample_payload("b@example.org", "University of Delhi");
    let c = sample_payload("c@example.org", "Anna University");
    storage
        .record_submission(&a, &report_for(&a, VerificationOutcome::Verified))
        .await
        .expect("record");
    storage
        .record_submission(&b, &report_for(&b, VerificationOutcome::Verified))
        .await
        .expect("record");
    storage
        .record_submission(
            &c,
            &report_for(
                &c,
                VerificationOutcome::Failed {
                    reason: "record mismatch".to_string(),
                },
            ),
        )
        .await
        .expect("record");

    let stats = storage.submission_stats().await.expect("stats");
    assert_eq!(stats.total, 3);
    assert_eq!(stats.verified, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.institutions, 2);

    let failed = storage.list_recent(10).await.expect("list");
    let failed = failed
        .iter()
        .find(|s| s.submitted_by == "c@example.org")
        .expect("failed row");
    assert_eq!(
        failed.outcome,
        VerificationOutcome::Failed {
            reason: "record mismatch".to_string()
        }
    );
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("digipraman.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    storage.health_check().await.expect("health check");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}
