//! Persistence of users and alert definitions
//!
//! [`AlertStore`] and [`UserDirectory`] are the seams the scheduler and the
//! HTTP layer consume. [`JsonFileStore`] is the shipped implementation: two
//! JSON documents in a data directory, `users.json` keyed by email and
//! `schedulers.json` keyed by alert id.

use crate::error::{AlertError, Result};
use crate::model::{
    AlertDefinition, AlertUpdate, Credentials, NewAlert, NewUser, Trigger, User, hash_password,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

const USERS_FILE: &str = "users.json";
const ALERTS_FILE: &str = "schedulers.json";

/// Registered alert recipients
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Register a user; a second registration with the same email fails
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn get_user(&self, id: &str) -> Result<Option<User>>;

    /// The user whose email and password match, if any
    async fn authenticate(&self, credentials: &Credentials) -> Result<Option<User>>;
}

/// `users.json` entry; the hash stays out of every [`User`] handed out
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredUser {
    #[serde(flatten)]
    user: User,
    #[serde(default)]
    password_hash: String,
}

/// Alert definitions
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn create_alert(&self, alert: NewAlert) -> Result<AlertDefinition>;

    async fn get_alert(&self, id: &str) -> Result<Option<AlertDefinition>>;

    /// All alerts owned by `user_id`, oldest first
    async fn list_alerts_for_user(&self, user_id: &str) -> Result<Vec<AlertDefinition>>;

    /// Merge `update` into an alert; `None` when it does not exist
    async fn update_alert(&self, id: &str, update: AlertUpdate) -> Result<Option<AlertDefinition>>;

    /// Remove an alert, reporting whether it existed
    async fn delete_alert(&self, id: &str) -> Result<bool>;

    /// Active alerts that fire at `trigger`, oldest first
    async fn active_alerts(&self, trigger: Trigger) -> Result<Vec<AlertDefinition>>;
}

/// Flat-file store backed by two JSON documents
///
/// Every operation holds one async mutex across its read-modify-write
/// cycle, and documents are replaced by writing a sibling temp file and
/// renaming it over the original.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (creating if needed) a store rooted at `dir`
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        info!(dir = %dir.display(), "Opened alert store");
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn load<T: DeserializeOwned>(&self, file: &str) -> Result<BTreeMap<String, T>> {
        let path = self.dir.join(file);
        match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save<T: Serialize>(&self, file: &str, records: &BTreeMap<String, T>) -> Result<()> {
        let path = self.dir.join(file);
        let tmp = self.dir.join(format!(".{file}.tmp"));
        let bytes = serde_json::to_vec_pretty(records)?;

        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(file, records = records.len(), "Store document written");
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for JsonFileStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let (user, password_hash) = user.into_user()?;
        let _guard = self.lock.lock().await;

        let mut users: BTreeMap<String, StoredUser> = self.load(USERS_FILE).await?;
        if users.contains_key(&user.email) {
            return Err(AlertError::DuplicateEmail(user.email));
        }
        let record = StoredUser {
            user: user.clone(),
            password_hash,
        };
        users.insert(user.email.clone(), record);
        self.save(USERS_FILE, &users).await?;

        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let _guard = self.lock.lock().await;
        let users: BTreeMap<String, StoredUser> = self.load(USERS_FILE).await?;
        Ok(users.into_values().map(|r| r.user).find(|u| u.id == id))
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Option<User>> {
        let _guard = self.lock.lock().await;
        let mut users: BTreeMap<String, StoredUser> = self.load(USERS_FILE).await?;

        let presented = hash_password(&credentials.password);
        match users.remove(credentials.email.trim()) {
            Some(record) if record.password_hash == presented => Ok(Some(record.user)),
            _ => {
                debug!("Login rejected");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl AlertStore for JsonFileStore {
    async fn create_alert(&self, alert: NewAlert) -> Result<AlertDefinition> {
        let alert = alert.into_definition()?;
        let _guard = self.lock.lock().await;

        let mut alerts: BTreeMap<String, AlertDefinition> = self.load(ALERTS_FILE).await?;
        alerts.insert(alert.id.clone(), alert.clone());
        self.save(ALERTS_FILE, &alerts).await?;

        info!(alert_id = %alert.id, trigger = %alert.trigger_time, "Alert created");
        Ok(alert)
    }

    async fn get_alert(&self, id: &str) -> Result<Option<AlertDefinition>> {
        let _guard = self.lock.lock().await;
        let mut alerts: BTreeMap<String, AlertDefinition> = self.load(ALERTS_FILE).await?;
        Ok(alerts.remove(id))
    }

    async fn list_alerts_for_user(&self, user_id: &str) -> Result<Vec<AlertDefinition>> {
        let _guard = self.lock.lock().await;
        let alerts: BTreeMap<String, AlertDefinition> = self.load(ALERTS_FILE).await?;
        Ok(oldest_first(alerts.into_values().filter(|a| a.user_id == user_id)))
    }

    async fn update_alert(&self, id: &str, update: AlertUpdate) -> Result<Option<AlertDefinition>> {
        let _guard = self.lock.lock().await;

        let mut alerts: BTreeMap<String, AlertDefinition> = self.load(ALERTS_FILE).await?;
        let Some(alert) = alerts.get_mut(id) else {
            return Ok(None);
        };
        update.apply(alert)?;
        let updated = alert.clone();
        self.save(ALERTS_FILE, &alerts).await?;

        info!(alert_id = %id, "Alert updated");
        Ok(Some(updated))
    }

    async fn delete_alert(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;

        let mut alerts: BTreeMap<String, AlertDefinition> = self.load(ALERTS_FILE).await?;
        if alerts.remove(id).is_none() {
            return Ok(false);
        }
        self.save(ALERTS_FILE, &alerts).await?;

        info!(alert_id = %id, "Alert deleted");
        Ok(true)
    }

    async fn active_alerts(&self, trigger: Trigger) -> Result<Vec<AlertDefinition>> {
        let _guard = self.lock.lock().await;
        let alerts: BTreeMap<String, AlertDefinition> = self.load(ALERTS_FILE).await?;
        Ok(oldest_first(
            alerts
                .into_values()
                .filter(|a| a.is_active && a.trigger_time == trigger),
        ))
    }
}

fn oldest_first(alerts: impl Iterator<Item = AlertDefinition>) -> Vec<AlertDefinition> {
    let mut alerts: Vec<_> = alerts.collect();
    alerts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_alert(user_id: &str, trigger: Trigger, active: bool) -> NewAlert {
        NewAlert {
            user_id: user_id.to_string(),
            prompt: "Check my portfolio".to_string(),
            trigger_time: trigger,
            symbols: vec!["aapl".to_string()],
            is_active: active,
        }
    }

    fn ann() -> NewUser {
        NewUser {
            email: "ann@example.com".to_string(),
            name: "Ann".to_string(),
            password: "hunter2".to_string(),
        }
    }

    fn login(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_user_roundtrip_and_duplicate_email() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();

        let user = store.create_user(ann()).await.unwrap();
        assert_eq!(store.get_user(&user.id).await.unwrap(), Some(user));
        assert!(store.get_user("missing").await.unwrap().is_none());

        let err = store.create_user(ann()).await.unwrap_err();
        assert!(matches!(err, AlertError::DuplicateEmail(email) if email == "ann@example.com"));
    }

    #[tokio::test]
    async fn test_authenticate_checks_password_hash() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();
        let user = store.create_user(ann()).await.unwrap();

        let found = store.authenticate(&login("ann@example.com", "hunter2")).await.unwrap();
        assert_eq!(found, Some(user));
        assert!(store.authenticate(&login("ann@example.com", "nope")).await.unwrap().is_none());
        assert!(store.authenticate(&login("bob@example.com", "hunter2")).await.unwrap().is_none());

        let raw = std::fs::read_to_string(dir.path().join(USERS_FILE)).unwrap();
        assert!(raw.contains(&hash_password("hunter2")));
        assert!(!raw.contains("\"hunter2\""));
    }

    #[tokio::test]
    async fn test_user_without_stored_hash_cannot_log_in() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(USERS_FILE),
            r#"{"old@example.com": {"id": "u0", "email": "old@example.com", "name": "Old", "created_at": "2024-01-01T00:00:00Z"}}"#,
        )
        .unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();

        assert_eq!(store.get_user("u0").await.unwrap().unwrap().name, "Old");
        assert!(store.authenticate(&login("old@example.com", "")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_alert_lifecycle() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();

        let alert = store
            .create_alert(new_alert("u1", Trigger::Morning, true))
            .await
            .unwrap();
        assert_eq!(alert.symbols, vec!["AAPL"]);
        assert_eq!(store.get_alert(&alert.id).await.unwrap(), Some(alert.clone()));

        let updated = store
            .update_alert(
                &alert.id,
                AlertUpdate {
                    trigger_time: Some(Trigger::Evening),
                    ..AlertUpdate::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.trigger_time, Trigger::Evening);
        assert!(
            store
                .update_alert("missing", AlertUpdate::default())
                .await
                .unwrap()
                .is_none()
        );

        assert!(store.delete_alert(&alert.id).await.unwrap());
        assert!(!store.delete_alert(&alert.id).await.unwrap());
        assert!(store.get_alert(&alert.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_active_alerts_filter_by_trigger_and_flag() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();

        let morning = store
            .create_alert(new_alert("u1", Trigger::Morning, true))
            .await
            .unwrap();
        store
            .create_alert(new_alert("u1", Trigger::Morning, false))
            .await
            .unwrap();
        store
            .create_alert(new_alert("u2", Trigger::Evening, true))
            .await
            .unwrap();

        let active = store.active_alerts(Trigger::Morning).await.unwrap();
        assert_eq!(active, vec![morning]);
        assert_eq!(store.list_alerts_for_user("u1").await.unwrap().len(), 2);
        assert!(store.list_alerts_for_user("u3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reopen_reads_persisted_documents() {
        let dir = tempdir().unwrap();
        let alert = {
            let store = JsonFileStore::open(dir.path()).await.unwrap();
            store
                .create_alert(new_alert("u1", Trigger::Evening, true))
                .await
                .unwrap()
        };

        let reopened = JsonFileStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.get_alert(&alert.id).await.unwrap(), Some(alert));
        assert!(dir.path().join(ALERTS_FILE).exists());
        assert!(!dir.path().join(format!(".{ALERTS_FILE}.tmp")).exists());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(ALERTS_FILE), "{not json").unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();

        let err = store.get_alert("x").await.unwrap_err();
        assert!(matches!(err, AlertError::Serialization(_)));
    }
}
