//! Identity provider contract and a session-token implementation backed by
//! the key-value store.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::User;
use crate::services::kv::KvStore;

fn session_key(token: &str) -> String {
    format!("session:{token}")
}

/// A minted session: the bearer token plus the user it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, username: &str, secret: &str) -> Result<Session, AppError>;

    async fn sign_out(&self, token: &str) -> Result<(), AppError>;

    async fn is_authenticated(&self, token: &str) -> Result<bool, AppError>;

    async fn current_user(&self, token: &str) -> Result<Option<User>, AppError>;
}

/// Sessions minted against a single shared access secret and stored under
/// `session:{token}` in the key-value store.
pub struct KvSessionIdentity {
    kv: Arc<dyn KvStore>,
    access_secret: String,
}

impl KvSessionIdentity {
    pub fn new(kv: Arc<dyn KvStore>, access_secret: String) -> Self {
        Self { kv, access_secret }
    }
}

#[async_trait]
impl IdentityProvider for KvSessionIdentity {
    async fn sign_in(&self, username: &str, secret: &str) -> Result<Session, AppError> {
        if username.trim().is_empty() || secret != self.access_secret {
            return Err(AppError::Unauthorized);
        }

        let user = User {
            username: username.to_string(),
            email: None,
        };
        let token = Uuid::new_v4().simple().to_string();
        let serialized = serde_json::to_string(&user)
            .map_err(|e| AppError::Storage(format!("serializing session: {e}")))?;
        self.kv.set(&session_key(&token), &serialized).await?;

        Ok(Session { token, user })
    }

    async fn sign_out(&self, token: &str) -> Result<(), AppError> {
        self.kv.delete(&session_key(token)).await?;
        Ok(())
    }

    async fn is_authenticated(&self, token: &str) -> Result<bool, AppError> {
        Ok(self.current_user(token).await?.is_some())
    }

    async fn current_user(&self, token: &str) -> Result<Option<User>, AppError> {
        let Some(raw) = self.kv.get(&session_key(token)).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!("discarding unreadable session value: {e}");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CallLog, MemoryKvStore};

    fn identity() -> (Arc<MemoryKvStore>, KvSessionIdentity) {
        let kv = Arc::new(MemoryKvStore::new(CallLog::default()));
        let identity = KvSessionIdentity::new(kv.clone(), "open-sesame".to_string());
        (kv, identity)
    }

    #[tokio::test]
    async fn test_sign_in_with_wrong_secret_is_rejected() {
        let (_, identity) = identity();
        let result = identity.sign_in("avery", "guess").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_sign_in_mints_resolvable_session() {
        let (_, identity) = identity();
        let session = identity.sign_in("avery", "open-sesame").await.unwrap();
        assert_eq!(session.user.username, "avery");

        assert!(identity.is_authenticated(&session.token).await.unwrap());
        let user = identity.current_user(&session.token).await.unwrap();
        assert_eq!(user.unwrap().username, "avery");
    }

    #[tokio::test]
    async fn test_sign_out_invalidates_token() {
        let (_, identity) = identity();
        let session = identity.sign_in("avery", "open-sesame").await.unwrap();
        identity.sign_out(&session.token).await.unwrap();
        assert!(!identity.is_authenticated(&session.token).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_token_resolves_to_no_user() {
        let (_, identity) = identity();
        assert!(identity.current_user("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreadable_session_value_is_treated_as_signed_out() {
        let (kv, identity) = identity();
        kv.map
            .lock()
            .unwrap()
            .insert(session_key("t0"), "not json".to_string());
        assert!(identity.current_user("t0").await.unwrap().is_none());
    }
}
