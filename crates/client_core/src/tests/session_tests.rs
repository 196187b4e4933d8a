use std::{collections::HashMap, sync::Mutex};

use super::*;

#[derive(Default)]
struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().expect("lock").get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .expect("lock")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().expect("lock").remove(key);
        Ok(())
    }
}

fn manager(storage: Arc<dyn SessionStorage>) -> SessionManager {
    SessionManager::new(storage, Arc::new(MockIdentityProvider))
}

#[tokio::test]
async fn login_persists_and_restores_across_managers() {
    let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::default());

    let mut first = manager(storage.clone());
    let identity = first
        .login("org@university.ac.in", "secret", Role::Organization)
        .await
        .expect("login")
        .clone();
    assert_eq!(identity.email, "org@university.ac.in");
    assert_eq!(identity.role, Role::Organization);
    assert_eq!(first.current(), Some(&identity));

    // A fresh manager over the same storage stands in for a reload.
    let mut second = manager(storage);
    let restored = second.restore().await.expect("restore");
    assert_eq!(restored, Some(&identity));
}

#[tokio::test]
async fn empty_credentials_fall_back_to_guest() {
    let mut session = manager(Arc::new(MemoryStorage::default()));
    let identity = session
        .login("", "", Role::Citizen)
        .await
        .expect("login")
        .clone();
    assert_eq!(identity.email, "guest@digipraman.gov");
    assert_eq!(identity.role, Role::Citizen);
}

#[tokio::test]
async fn corrupt_record_restores_to_absent_and_is_deleted() {
    let storage = Arc::new(MemoryStorage::default());
    storage
        .write(SESSION_KEY, "{not json")
        .await
        .expect("seed corrupt record");

    let mut session = manager(storage.clone());
    assert_eq!(session.restore().await.expect("restore"), None);
    assert_eq!(session.current(), None);
    assert_eq!(storage.read(SESSION_KEY).await.expect("read"), None);
}

#[tokio::test]
async fn shape_mismatch_counts_as_corruption() {
    let storage = Arc::new(MemoryStorage::default());
    storage
        .write(SESSION_KEY, r#"{"email":"x@y.z","role":"owner"}"#)
        .await
        .expect("seed record");

    let mut session = manager(storage.clone());
    assert_eq!(session.restore().await.expect("restore"), None);
    assert_eq!(storage.read(SESSION_KEY).await.expect("read"), None);
}

#[tokio::test]
async fn logout_is_idempotent() {
    let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::default());
    let mut session = manager(storage.clone());
    session
        .login("citizen@example.org", "pw", Role::Citizen)
        .await
        .expect("login");

    session.logout().await.expect("logout");
    assert_eq!(session.current(), None);
    session.logout().await.expect("second logout");
    assert_eq!(session.current(), None);
    assert_eq!(storage.read(SESSION_KEY).await.expect("read"), None);
}

#[tokio::test]
async fn sqlite_storage_backs_the_session_round_trip() {
    let storage = storage::Storage::new("sqlite::memory:").await.expect("db");
    let mut session = manager(Arc::new(storage));
    session
        .login("admin@digipraman.gov", "pw", Role::SuperAdmin)
        .await
        .expect("login");
    session.restore().await.expect("restore");
    assert_eq!(
        session.current().map(|i| i.role),
        Some(Role::SuperAdmin)
    );
}
