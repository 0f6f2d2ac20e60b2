use client_lib::adapters::FileStore;
use client_lib::flows::SessionHandle;
use lens_core::domain::AuthUser;
use lens_core::ports::{IssuedSession, KeyValueStore, SessionProvider};
use lens_core::quota::GuestQuotaTracker;
use std::sync::Arc;

#[test]
fn values_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("storage.json");

    let store = FileStore::open(&path);
    store.set("a", "1").unwrap();
    store.set("b", "2").unwrap();
    store.remove("a").unwrap();

    let reopened = FileStore::open(&path);
    assert_eq!(reopened.get("a").unwrap(), None);
    assert_eq!(reopened.get("b").unwrap(), Some("2".to_string()));
}

#[test]
fn corrupt_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, b"{ not json").unwrap();

    let store = FileStore::open(&path);
    assert_eq!(store.get("anything").unwrap(), None);
    store.set("k", "v").unwrap();
    assert_eq!(FileStore::open(&path).get("k").unwrap(), Some("v".to_string()));
}

#[test]
fn failed_write_leaves_memory_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    // A file where the parent directory should be makes every write fail.
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();
    let store = FileStore::open(blocker.join("storage.json"));

    assert!(store.set("k", "v").is_err());
    assert!(store.set_many(&[("a", "1"), ("b", "2")]).is_err());

    assert_eq!(store.get("k").unwrap(), None);
    assert_eq!(store.get("a").unwrap(), None);
}

#[test]
fn set_many_lands_every_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    FileStore::open(&path)
        .set_many(&[("lens.guestUploadsRemaining", "1"), ("lens.guestUploadsDate", "3/9/2024")])
        .unwrap();

    let reopened = FileStore::open(&path);
    assert_eq!(reopened.get("lens.guestUploadsRemaining").unwrap(), Some("1".to_string()));
    assert_eq!(reopened.get("lens.guestUploadsDate").unwrap(), Some("3/9/2024".to_string()));
}

#[test]
fn guest_quota_is_shared_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    let first = GuestQuotaTracker::new(Arc::new(FileStore::open(&path)));
    assert_eq!(first.consume_one().unwrap(), 1);

    let second = GuestQuotaTracker::new(Arc::new(FileStore::open(&path)));
    assert_eq!(second.remaining().unwrap(), 1);
}

#[tokio::test]
async fn only_verified_sessions_are_restored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    let session = SessionHandle::new(Arc::new(FileStore::open(&path)));
    session
        .resolve(&IssuedSession {
            user: AuthUser {
                uid: "uid-1".to_string(),
                email: Some("reader@example.com".to_string()),
                email_verified: true,
            },
            id_token: "tok-1".to_string(),
        })
        .unwrap();

    let restored = SessionHandle::new(Arc::new(FileStore::open(&path)));
    assert!(restored.snapshot().loading);
    restored.restore().unwrap();
    let snapshot = restored.resolved().await;
    assert_eq!(snapshot.user.map(|u| u.uid), Some("uid-1".to_string()));
    assert_eq!(restored.id_token().await.unwrap(), Some("tok-1".to_string()));

    let store = FileStore::open(&path);
    store.set("lens.session.emailVerified", "false").unwrap();
    let unverified = SessionHandle::new(Arc::new(FileStore::open(&path)));
    unverified.restore().unwrap();
    assert!(unverified.snapshot().is_guest());
    assert!(!unverified.snapshot().loading);
}
