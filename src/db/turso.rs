use super::traits::UserStore;
use crate::types::{AppError, NewUser, Result, Role, User, UserChanges};
use async_trait::async_trait;
use chrono::Utc;
use libsql::{Builder, Connection, Database, Row};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, password, role, created_at, updated_at";

/// libsql-backed [`UserStore`].
///
/// Holds one long-lived connection: an in-memory database lives only as long
/// as the connection that created it, so every query goes through the same
/// one.
pub struct TursoClient {
    _db: Database,
    conn: Connection,
}

impl TursoClient {
    /// Connects to a remote Turso database.
    pub async fn new_remote(url: String, auth_token: String) -> Result<Self> {
        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Turso: {}", e)))?;

        Self::from_database(db).await
    }

    /// Opens (or creates) a local SQLite file.
    pub async fn new_local(path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Database(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        Self::from_database(db).await
    }

    /// Ephemeral database, used by tests and `url = ":memory:"`.
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {}", e)))?;

        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let client = Self { _db: db, conn };
        client.initialize_schema().await?;

        Ok(client)
    }

    async fn initialize_schema(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS users (
                    id TEXT PRIMARY KEY,
                    username TEXT NOT NULL,
                    email TEXT UNIQUE NOT NULL,
                    password TEXT NOT NULL,
                    role TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        Ok(())
    }

    async fn query_users(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<Vec<User>> {
        let mut rows = self
            .conn
            .query(sql, params)
            .await
            .map_err(|e| AppError::Database(format!("Failed to query users: {}", e)))?;

        let mut users = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            users.push(user_from_row(&row)?);
        }

        Ok(users)
    }
}

fn user_from_row(row: &Row) -> Result<User> {
    let role: String = row.get(4).map_err(|e| AppError::Database(e.to_string()))?;

    Ok(User {
        id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
        username: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
        email: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
        password: row.get(3).map_err(|e| AppError::Database(e.to_string()))?,
        role: Role::from_stored(&role),
        created_at: row.get(5).map_err(|e| AppError::Database(e.to_string()))?,
        updated_at: row.get(6).map_err(|e| AppError::Database(e.to_string()))?,
    })
}

/// Maps a write failure, turning unique-email violations into 409s.
fn write_error(context: &str, e: libsql::Error) -> AppError {
    let detail = e.to_string();
    if detail.contains("UNIQUE constraint failed") {
        AppError::Conflict("A user with this email already exists".to_string())
    } else {
        AppError::Database(format!("{}: {}", context, detail))
    }
}

#[async_trait]
impl UserStore for TursoClient {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let now = Utc::now().timestamp();
        let record = User {
            id: Uuid::new_v4().to_string(),
            username: user.username,
            email: user.email,
            password: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };

        self.conn
            .execute(
                "INSERT INTO users (id, username, email, password, role, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                (
                    record.id.as_str(),
                    record.username.as_str(),
                    record.email.as_str(),
                    record.password.as_str(),
                    record.role.as_str(),
                    now,
                    now,
                ),
            )
            .await
            .map_err(|e| write_error("Failed to create user", e))?;

        Ok(record)
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        Ok(self.query_users(&sql, [id]).await?.into_iter().next())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        Ok(self.query_users(&sql, [email]).await?.into_iter().next())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at ASC, id ASC",
            USER_COLUMNS
        );
        self.query_users(&sql, ()).await
    }

    async fn update_user(&self, id: &str, changes: UserChanges) -> Result<Option<User>> {
        let Some(mut user) = self.get_user_by_id(id).await? else {
            return Ok(None);
        };

        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password = password_hash;
        }
        user.updated_at = Utc::now().timestamp();

        let affected = self
            .conn
            .execute(
                "UPDATE users SET username = ?, email = ?, password = ?, updated_at = ?
                 WHERE id = ?",
                (
                    user.username.as_str(),
                    user.email.as_str(),
                    user.password.as_str(),
                    user.updated_at,
                    id,
                ),
            )
            .await
            .map_err(|e| write_error("Failed to update user", e))?;

        // Deleted between the read and the write
        if affected == 0 {
            return Ok(None);
        }

        Ok(Some(user))
    }

    async fn delete_user(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM users WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete user: {}", e)))?;

        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            role: Role::Basic,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let store = TursoClient::new_memory().await.unwrap();
        let created = store.create_user(new_user("ada", "ada@example.com")).await.unwrap();

        assert!(Uuid::parse_str(&created.id).is_ok());
        assert_eq!(created.created_at, created.updated_at);

        let by_id = store.get_user_by_id(&created.id).await.unwrap();
        assert_eq!(by_id.as_ref(), Some(&created));

        let by_email = store.get_user_by_email("ada@example.com").await.unwrap();
        assert_eq!(by_email, Some(created));

        assert!(store.get_user_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = TursoClient::new_memory().await.unwrap();
        store.create_user(new_user("ada", "ada@example.com")).await.unwrap();

        let err = store
            .create_user(new_user("other", "ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_update_applies_only_present_fields() {
        let store = TursoClient::new_memory().await.unwrap();
        let created = store.create_user(new_user("ada", "ada@example.com")).await.unwrap();

        let changes = UserChanges {
            username: Some("lovelace".to_string()),
            ..Default::default()
        };
        let updated = store.update_user(&created.id, changes).await.unwrap().unwrap();

        assert_eq!(updated.username, "lovelace");
        assert_eq!(updated.email, "ada@example.com");
        assert_eq!(updated.password, created.password);
        assert_eq!(updated.role, Role::Basic);

        let missing = store
            .update_user("missing", UserChanges::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_to_taken_email_is_conflict() {
        let store = TursoClient::new_memory().await.unwrap();
        store.create_user(new_user("ada", "ada@example.com")).await.unwrap();
        let bob = store.create_user(new_user("bob", "bob@example.com")).await.unwrap();

        let changes = UserChanges {
            email: Some("ada@example.com".to_string()),
            ..Default::default()
        };
        let err = store.update_user(&bob.id, changes).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let store = TursoClient::new_memory().await.unwrap();
        let ada = store.create_user(new_user("ada", "ada@example.com")).await.unwrap();
        store.create_user(new_user("bob", "bob@example.com")).await.unwrap();

        assert_eq!(store.list_users().await.unwrap().len(), 2);

        assert!(store.delete_user(&ada.id).await.unwrap());
        assert!(!store.delete_user(&ada.id).await.unwrap());

        let remaining = store.list_users().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].username, "bob");
    }

    #[tokio::test]
    async fn test_local_file_persists_across_clients() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("warden.db");
        let path = path.to_str().unwrap();

        let id = {
            let store = TursoClient::new_local(path).await.unwrap();
            store.create_user(new_user("ada", "ada@example.com")).await.unwrap().id
        };

        let reopened = TursoClient::new_local(path).await.unwrap();
        assert!(reopened.get_user_by_id(&id).await.unwrap().is_some());
    }
}
