//! Authentication storage façade
//!
//! A fixed vocabulary of token and user-data operations over whichever
//! adapter the factory built. Every call is async regardless of backend; the
//! browser adapter simply never suspends.

use crate::error::Result;
use crate::storage::{AdapterKind, StorageAdapter};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Logical key of the authentication token
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Logical key of the serialized user record
pub const USER_DATA_KEY: &str = "userData";

/// TTL applied to token and user data: 7 days
pub const AUTH_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Token and user-data storage over any adapter
#[derive(Clone)]
pub struct AuthStorage {
    adapter: Arc<dyn StorageAdapter>,
}

impl AuthStorage {
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &Arc<dyn StorageAdapter> {
        &self.adapter
    }

    pub fn kind(&self) -> AdapterKind {
        self.adapter.kind()
    }

    pub async fn set_token(&self, token: &str) -> Result<()> {
        self.adapter
            .set_item(AUTH_TOKEN_KEY, token, Some(AUTH_TTL_SECONDS))
            .await
    }

    pub async fn get_token(&self) -> Option<String> {
        self.adapter.get_item(AUTH_TOKEN_KEY).await
    }

    pub async fn remove_token(&self) -> Result<()> {
        self.adapter.remove_item(AUTH_TOKEN_KEY).await
    }

    /// True when a non-empty token is stored and has not expired
    pub async fn is_authenticated(&self) -> bool {
        self.get_token()
            .await
            .is_some_and(|token| !token.is_empty())
    }

    /// Store `data` as JSON under the user-data key
    pub async fn set_user_data<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + ?Sized + Sync,
    {
        let json = serde_json::to_string(data)?;
        self.adapter
            .set_item(USER_DATA_KEY, &json, Some(AUTH_TTL_SECONDS))
            .await
    }

    /// Read the user record. A stored value that does not deserialize as `T`
    /// is logged and treated as absent.
    pub async fn get_user_data<T>(&self) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let raw = self.adapter.get_item(USER_DATA_KEY).await?;
        match serde_json::from_str(&raw) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(namespace = %self.adapter.namespace(), "discarding unreadable user data: {}", e);
                None
            }
        }
    }

    pub async fn remove_user_data(&self) -> Result<()> {
        self.adapter.remove_item(USER_DATA_KEY).await
    }

    /// Clear the whole namespace, not only the auth keys
    pub async fn clear(&self) -> Result<()> {
        self.adapter.clear().await
    }
}

impl fmt::Debug for AuthStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthStorage")
            .field("kind", &self.adapter.kind())
            .field("namespace", self.adapter.namespace())
            .finish()
    }
}
