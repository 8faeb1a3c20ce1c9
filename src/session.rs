//! Session store: the single source of truth for who is logged in.
//!
//! State lives in a `watch` channel so consumers can either read the current
//! [`Session`] snapshot or subscribe to changes. Each operation publishes
//! exactly one new snapshot.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::ServiceResult;
use crate::storage::KeyValueStore;
use crate::types::{LoginResponse, UserProfile};

pub const TOKEN_KEY: &str = "access_token";
pub const TOKEN_TYPE_KEY: &str = "token_type";
pub const USER_KEY: &str = "user_data";

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub token_type: Option<String>,
    pub user: Option<UserProfile>,
    /// True until the persisted state has been read; render nothing meanwhile.
    pub is_loading: bool,
}

impl Session {
    fn loading() -> Self {
        Self {
            token: None,
            token_type: None,
            user: None,
            is_loading: true,
        }
    }

    fn logged_out() -> Self {
        Self {
            is_loading: false,
            ..Self::loading()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    state: watch::Sender<Session>,
}

impl SessionStore {
    /// A store in the loading state. Call [`SessionStore::hydrate`] next.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let (state, _) = watch::channel(Session::loading());
        Self { storage, state }
    }

    /// Build and hydrate in one go.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Arc<Self> {
        let store = Self::new(storage);
        store.hydrate();
        Arc::new(store)
    }

    /// Read persisted credentials. Anything unreadable hydrates as logged out.
    pub fn hydrate(&self) {
        let session = match self.read_persisted() {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "Could not restore session; starting logged out");
                Session::logged_out()
            }
        };
        info!(authenticated = session.is_authenticated(), "Session hydrated");
        self.state.send_replace(session);
    }

    fn read_persisted(&self) -> ServiceResult<Session> {
        let token = self.storage.get(TOKEN_KEY)?;
        let token_type = self.storage.get(TOKEN_TYPE_KEY)?;
        let user = match self.storage.get(USER_KEY)? {
            Some(raw) => Some(serde_json::from_str::<UserProfile>(&raw)?),
            None => None,
        };
        Ok(Session {
            token,
            token_type,
            user,
            is_loading: false,
        })
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Current bearer token, read at call time.
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.borrow().user.clone()
    }

    pub fn login(&self, response: &LoginResponse) -> ServiceResult<()> {
        self.storage.set(TOKEN_KEY, &response.access_token)?;
        self.storage.set(TOKEN_TYPE_KEY, &response.token_type)?;
        if let Some(user) = &response.user {
            self.storage.set(USER_KEY, &serde_json::to_string(user)?)?;
        }

        self.state.send_replace(Session {
            token: Some(response.access_token.clone()),
            token_type: Some(response.token_type.clone()),
            user: response.user.clone(),
            is_loading: false,
        });
        info!(user_id = ?response.user.as_ref().and_then(|u| u.id.as_deref()), "Logged in");
        Ok(())
    }

    pub fn logout(&self) -> ServiceResult<()> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(TOKEN_TYPE_KEY)?;
        self.storage.remove(USER_KEY)?;
        self.state.send_replace(Session::logged_out());
        info!("Logged out");
        Ok(())
    }

    pub fn update_user(&self, user: UserProfile) -> ServiceResult<()> {
        self.storage.set(USER_KEY, &serde_json::to_string(&user)?)?;
        self.state.send_modify(|session| session.user = Some(user));
        Ok(())
    }

    /// Merge one field into the profile, creating the profile if needed.
    pub fn update_user_field(&self, field: &str, value: Value) -> ServiceResult<()> {
        let current = self.user().unwrap_or_default();
        let mut merged = serde_json::to_value(current)?;
        if let Value::Object(map) = &mut merged {
            map.insert(field.to_string(), value);
        }
        let user: UserProfile = serde_json::from_value(merged)?;
        self.update_user(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn login_response() -> LoginResponse {
        LoginResponse {
            access_token: "tok-1".into(),
            token_type: "bearer".into(),
            user: Some(UserProfile {
                id: Some("u-1".into()),
                email: Some("prof@example.com".into()),
                ..UserProfile::default()
            }),
        }
    }

    #[test]
    fn starts_loading_until_hydrated() {
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        assert!(store.snapshot().is_loading);
        store.hydrate();
        let snapshot = store.snapshot();
        assert!(!snapshot.is_loading);
        assert!(!snapshot.is_authenticated());
    }

    #[test]
    fn login_persists_across_hydration() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let store = SessionStore::load(storage.clone());
        store.login(&login_response()).unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.token().as_deref(), Some("tok-1"));

        let restored = SessionStore::load(storage);
        let snapshot = restored.snapshot();
        assert_eq!(snapshot.token.as_deref(), Some("tok-1"));
        assert_eq!(snapshot.token_type.as_deref(), Some("bearer"));
        assert_eq!(
            snapshot.user.and_then(|u| u.email).as_deref(),
            Some("prof@example.com")
        );
    }

    #[test]
    fn logout_clears_memory_and_storage() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let store = SessionStore::load(storage.clone());
        store.login(&login_response()).unwrap();
        store.logout().unwrap();

        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn corrupt_user_data_hydrates_logged_out() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        storage.set(TOKEN_KEY, "tok").unwrap();
        storage.set(USER_KEY, "{broken").unwrap();
        let store = SessionStore::load(storage);
        let snapshot = store.snapshot();
        assert!(!snapshot.is_loading);
        assert!(!snapshot.is_authenticated());
    }

    #[test]
    fn user_field_updates_merge_and_persist() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let store = SessionStore::load(storage.clone());
        store.login(&login_response()).unwrap();

        store.update_user_field("name", json!("Marie Curie")).unwrap();
        store.update_user_field("school", json!("Lycée Pasteur")).unwrap();

        let user = store.user().unwrap();
        assert_eq!(user.name.as_deref(), Some("Marie Curie"));
        assert_eq!(user.email.as_deref(), Some("prof@example.com"));
        assert_eq!(user.extra.get("school"), Some(&json!("Lycée Pasteur")));

        let persisted: UserProfile =
            serde_json::from_str(&storage.get(USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(persisted, user);
        // token untouched
        assert_eq!(store.token().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn subscribers_see_one_change_per_operation() {
        let store = SessionStore::load(Arc::new(MemoryStore::new()));
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.login(&login_response()).unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_authenticated());
        assert!(!rx.has_changed().unwrap());

        store.logout().unwrap();
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().is_authenticated());
    }
}
