//! Storage abstraction traits
//!
//! This module provides the `UserStore` trait that abstracts over the
//! account storage backends (in-memory SQLite, file-based SQLite, remote
//! Turso).
//!
//! # Example
//!
//! ```rust,ignore
//! use warden::db::{DatabaseProvider, UserStore};
//!
//! // Use in-memory database (default for tests)
//! let store = DatabaseProvider::Memory.create_client().await?;
//!
//! // Use file-based SQLite
//! let store = DatabaseProvider::SQLite { path: "data/warden.db".into() }.create_client().await?;
//! ```

use crate::types::{NewUser, Result, User, UserChanges};
use async_trait::async_trait;
use std::sync::Arc;

/// Database provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabaseProvider {
    /// In-memory SQLite database (ephemeral, lost on restart)
    #[default]
    Memory,
    /// File-based SQLite database
    SQLite {
        /// Path to the SQLite database file
        path: String,
    },
    /// Remote Turso database (requires network access)
    #[cfg(feature = "turso")]
    Turso {
        /// The Turso database URL (e.g., `libsql://your-db.turso.io`)
        url: String,
        /// Authentication token for the Turso database
        auth_token: String,
    },
}

impl DatabaseProvider {
    /// Picks a provider from the `[database]` section of the config.
    ///
    /// A remote Turso database wins when both its URL and token resolve to
    /// non-empty values; otherwise `:memory:` or an empty path selects the
    /// in-memory store and anything else is a file path.
    pub fn from_config(config: &crate::utils::toml_config::DatabaseConfig) -> Self {
        #[cfg(feature = "turso")]
        {
            if let (Some(url), Some(token)) = (config.resolve_turso_url(), config.resolve_turso_token()) {
                return DatabaseProvider::Turso {
                    url,
                    auth_token: token,
                };
            }
        }

        match config.url.as_str() {
            "" | ":memory:" => DatabaseProvider::Memory,
            path => DatabaseProvider::SQLite {
                path: path.to_string(),
            },
        }
    }

    /// Create a store from this provider configuration
    pub async fn create_client(&self) -> Result<Arc<dyn UserStore>> {
        match self {
            DatabaseProvider::Memory => {
                let client = super::turso::TursoClient::new_memory().await?;
                Ok(Arc::new(client))
            }
            DatabaseProvider::SQLite { path } => {
                let client = super::turso::TursoClient::new_local(path).await?;
                Ok(Arc::new(client))
            }
            #[cfg(feature = "turso")]
            DatabaseProvider::Turso { url, auth_token } => {
                let client =
                    super::turso::TursoClient::new_remote(url.clone(), auth_token.clone()).await?;
                Ok(Arc::new(client))
            }
        }
    }
}

/// Account persistence.
///
/// Implementations must be shareable across request tasks. Ids are
/// generated by the store; emails are unique and a clash surfaces as
/// `AppError::Conflict`.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a validated account and return the stored record
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Get an account by id
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Get an account by email (exact match)
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// All accounts, oldest first
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Apply a partial update; `None` when the id does not exist
    async fn update_user(&self, id: &str, changes: UserChanges) -> Result<Option<User>>;

    /// Delete an account; `false` when the id does not exist
    async fn delete_user(&self, id: &str) -> Result<bool>;
}
