//! Database-backed user storage

use chrono::{DateTime, Utc};
use roster_authz::Mask;
use roster_core::{conflict_error, storage_error, ErrorContext, RosterError, RosterResult};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, info};

/// Persisted user record. The capability mask is stored as an opaque integer
/// column; only the storage layer and the authorization engine ever see it.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub password_hash: String,
    pub permissions: Mask,
    pub created_at: DateTime<Utc>,
}

/// SQLite user store
#[derive(Debug, Clone)]
pub struct DatabaseUserStore {
    pool: SqlitePool,
}

impl DatabaseUserStore {
    /// Create a new store and ensure the schema exists
    pub async fn new(pool: SqlitePool) -> RosterResult<Self> {
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> RosterResult<()> {
        let query = r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                permissions INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_users_name ON users(name);
        "#;

        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error!("Failed to create users table", "store", e))?;

        info!("Users table ready");
        Ok(())
    }

    /// Insert a user record
    ///
    /// A UNIQUE violation on the name column surfaces as a conflict, so
    /// concurrent creates racing past the service-level existence check still
    /// come back as a duplicate rather than a storage failure.
    pub async fn insert_user(&self, user: &UserRecord) -> RosterResult<()> {
        let query = r#"
            INSERT INTO users (id, name, password_hash, permissions, created_at)
            VALUES (?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.permissions)
            .bind(user.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    conflict_error!(format!("User name '{}' already exists", user.name), "store")
                }
                e => storage_error!("Failed to insert user", "store", e),
            })?;

        debug!("User inserted successfully: {}", user.name);
        Ok(())
    }

    /// Fetch a user by ID
    pub async fn get_by_id(&self, user_id: &str) -> RosterResult<Option<UserRecord>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error!("Failed to query user by ID", "store", e))?;

        row.map(row_to_record).transpose()
    }

    /// Case-insensitive substring search on user name
    pub async fn search_by_name(&self, name: &str) -> RosterResult<Vec<UserRecord>> {
        let pattern = format!("%{}%", name.to_lowercase());
        let rows = sqlx::query("SELECT * FROM users WHERE LOWER(name) LIKE ? ORDER BY created_at")
            .bind(pattern)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error!("Failed to search users by name", "store", e))?;

        rows.into_iter().map(row_to_record).collect()
    }

    /// List all users
    pub async fn list(&self) -> RosterResult<Vec<UserRecord>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error!("Failed to list users", "store", e))?;

        rows.into_iter().map(row_to_record).collect()
    }

    /// Delete a user. Returns false when no row matched.
    pub async fn delete(&self, user_id: &str) -> RosterResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error!("Failed to delete user", "store", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Check if a user name is taken
    pub async fn name_exists(&self, name: &str) -> RosterResult<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM users WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error!("Failed to check name existence", "store", e))?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    /// Conditionally persist a new mask, keyed on the previously observed one.
    ///
    /// Returns false when the row's mask no longer matches `expected`, i.e. a
    /// concurrent update landed first and the caller must re-read and retry.
    /// This is the write path that keeps read-modify-write mask updates from
    /// silently losing one of two concurrent changes.
    pub async fn compare_and_swap_mask(
        &self,
        user_id: &str,
        expected: Mask,
        next: Mask,
    ) -> RosterResult<bool> {
        let result = sqlx::query("UPDATE users SET permissions = ? WHERE id = ? AND permissions = ?")
            .bind(next)
            .bind(user_id)
            .bind(expected)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error!("Failed to update user permissions", "store", e))?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_record(row: SqliteRow) -> RosterResult<UserRecord> {
    let created_at: String = row.get("created_at");
    let created_at: DateTime<Utc> = created_at
        .parse()
        .map_err(|e| storage_error!("Invalid created_at timestamp in users table", "store", e))?;

    Ok(UserRecord {
        id: row.get("id"),
        name: row.get("name"),
        password_hash: row.get("password_hash"),
        permissions: row.get("permissions"),
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

    async fn memory_store() -> DatabaseUserStore {
        // Single pinned connection, matching the runtime pool setup for
        // in-memory databases.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::new().in_memory(true))
            .await
            .unwrap();
        DatabaseUserStore::new(pool).await.unwrap()
    }

    fn record(name: &str, mask: Mask) -> UserRecord {
        UserRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            password_hash: "$argon2id$unused".to_string(),
            permissions: mask,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn round_trips_user_records() {
        let store = memory_store().await;
        let user = record("roundtrip", 0b1011);
        store.insert_user(&user).await.unwrap();

        let loaded = store.get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "roundtrip");
        assert_eq!(loaded.permissions, 0b1011);
        assert_eq!(loaded.created_at.timestamp(), user.created_at.timestamp());
    }

    #[tokio::test]
    async fn duplicate_name_maps_to_conflict() {
        let store = memory_store().await;
        store.insert_user(&record("taken", 0)).await.unwrap();

        let err = store.insert_user(&record("taken", 0)).await.unwrap_err();
        assert!(matches!(err, RosterError::Conflict { .. }));
    }

    #[tokio::test]
    async fn cas_rejects_a_stale_mask() {
        let store = memory_store().await;
        let user = record("casuser", 0b0001);
        store.insert_user(&user).await.unwrap();

        // First writer wins.
        assert!(store
            .compare_and_swap_mask(&user.id, 0b0001, 0b0011)
            .await
            .unwrap());

        // Second writer still holding the original mask loses and must
        // re-read; its update is not silently applied.
        assert!(!store
            .compare_and_swap_mask(&user.id, 0b0001, 0b0101)
            .await
            .unwrap());

        let current = store.get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(current.permissions, 0b0011);
    }
}
