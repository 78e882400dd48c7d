use quiz_core::model::{
    AnswerSet, DEFAULT_TIME_BUDGET_SECS, PersistedSnapshot, StudentCredential, StudentProfile,
};
use quiz_core::time::fixed_now;
use storage::repository::{
    CREDENTIAL_KEY, CredentialRepository, LocalStore, SNAPSHOT_KEY, SnapshotRepository,
    StorageError,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_snapshot_round_trip_and_overwrite() {
    let repo = connect("memdb_snapshot").await;

    let first = PersistedSnapshot {
        answers: AnswerSet::from_slots(vec![Some(1), None, Some(0), None, Some(3)]),
        current: 4,
        time_left: 1500,
        saved_at: Some(fixed_now()),
        ..PersistedSnapshot::default()
    };
    repo.save_snapshot(SNAPSHOT_KEY, &first).await.unwrap();
    let loaded = repo
        .load_snapshot(SNAPSHOT_KEY, DEFAULT_TIME_BUDGET_SECS)
        .await
        .unwrap();
    assert_eq!(loaded.as_ref(), Some(&first));

    let mut second = first.clone();
    second.submitted = true;
    second.score = Some(3);
    second.total_questions = Some(5);
    repo.save_snapshot(SNAPSHOT_KEY, &second).await.unwrap();
    let loaded = repo
        .load_snapshot(SNAPSHOT_KEY, DEFAULT_TIME_BUDGET_SECS)
        .await
        .unwrap()
        .unwrap();
    assert!(loaded.submitted);
    assert_eq!(loaded.score, Some(3));

    repo.remove(SNAPSHOT_KEY).await.unwrap();
    assert!(repo
        .load_snapshot(SNAPSHOT_KEY, DEFAULT_TIME_BUDGET_SECS)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn sqlite_reports_corrupt_snapshot() {
    let repo = connect("memdb_corrupt").await;
    repo.set_raw(SNAPSHOT_KEY, "<html>").await.unwrap();
    let err = repo
        .load_snapshot(SNAPSHOT_KEY, DEFAULT_TIME_BUDGET_SECS)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn sqlite_credential_round_trip() {
    let repo = connect("memdb_credential").await;
    let cred = StudentCredential {
        token: "jwt".into(),
        user: Some(StudentProfile {
            name: Some("Ravi".into()),
            roll_number: Some("R-9".into()),
        }),
    };
    repo.save_credential(CREDENTIAL_KEY, &cred).await.unwrap();
    assert_eq!(
        repo.load_credential(CREDENTIAL_KEY).await.unwrap(),
        Some(cred)
    );
    repo.clear_credential(CREDENTIAL_KEY).await.unwrap();
    assert_eq!(repo.load_credential(CREDENTIAL_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    repo.set_raw("k", "v").await.unwrap();
    assert_eq!(repo.get_raw("k").await.unwrap().as_deref(), Some("v"));
}
