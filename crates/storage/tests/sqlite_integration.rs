use prep_core::model::{Email, HistoryEntry, TestId, UserRecord, UserStats};
use prep_core::time::fixed_now;
use storage::repository::{KeyValueStore, Storage, StorageError};
use storage::sqlite::SqliteRepository;

fn user(email: &str) -> UserRecord {
    UserRecord {
        name: "Ravi".into(),
        email: Email::parse(email).unwrap(),
        password_digest: "abc123".into(),
        created_at: fixed_now(),
    }
}

#[tokio::test]
async fn sqlite_kv_round_trips_and_overwrites() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo.migrate().await.expect("migrations are idempotent");

    assert_eq!(repo.get("missing").await.unwrap(), None);

    repo.put("k", "v1").await.unwrap();
    repo.put("k", "v2").await.unwrap();
    assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("v2"));

    assert!(!repo.put_if_absent("k", "v3").await.unwrap());
    assert!(repo.put_if_absent("other", "x").await.unwrap());
    assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("v2"));

    repo.delete("k").await.unwrap();
    assert_eq!(repo.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_storage_persists_identity_and_stats() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");

    let record = user("ravi@example.com");
    storage.identity.create_user(&record).await.unwrap();
    let err = storage.identity.create_user(&record).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    storage
        .identity
        .set_active_session(&record.email)
        .await
        .unwrap();
    assert_eq!(
        storage.identity.active_session().await.unwrap(),
        Some(record.email.clone())
    );

    let mut stats = UserStats::default();
    stats.record(HistoryEntry {
        date: fixed_now(),
        test_id: TestId::new("pyq-2023-slot-1"),
        score: 12,
        total: 20,
    });
    storage.stats.save(&record.email, &stats).await.unwrap();

    let loaded = storage.stats.load(&record.email).await.unwrap();
    assert_eq!(loaded, Some(stats));

    storage.identity.clear_session().await.unwrap();
    assert_eq!(storage.identity.active_session().await.unwrap(), None);
}
