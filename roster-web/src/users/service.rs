//! User directory service
//!
//! Owns identity lifecycle and delegates all mask arithmetic to the
//! authorization engine. The engine is pure, so the only concurrency hazard
//! is the read-modify-write on a persisted mask; `update_permissions` closes
//! it with a compare-and-swap loop against the store.

use super::{
    hash_password,
    store::{DatabaseUserStore, UserRecord},
    CreateUserRequest,
};
use roster_authz::{apply_update, has_all, resolve, Group, MaskUpdate};
use roster_core::{
    conflict_error, not_found_error, validation_error, ErrorContext, RosterError, RosterResult,
};
use tracing::{debug, info};
use uuid::Uuid;

/// User service for directory operations
#[derive(Debug, Clone)]
pub struct UserService {
    store: DatabaseUserStore,
    cas_max_retries: u32,
}

impl UserService {
    pub fn new(store: DatabaseUserStore, cas_max_retries: u32) -> Self {
        Self {
            store,
            cas_max_retries,
        }
    }

    /// Create a new user.
    ///
    /// The capability mask is resolved from the requested permission and group
    /// names; when that resolves to nothing the `Default` group applies, so a
    /// user is never created with zero capabilities.
    pub async fn create(&self, request: CreateUserRequest) -> RosterResult<UserRecord> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(validation_error!("Name must not be blank", "name", "users"));
        }
        if request.password.trim().is_empty() {
            return Err(validation_error!(
                "Password must not be blank",
                "password",
                "users"
            ));
        }

        if self.store.name_exists(name).await? {
            return Err(conflict_error!(
                format!("User name '{}' already exists", name),
                "users"
            ));
        }

        let mut mask = resolve(&request.permissions);
        if mask == 0 {
            mask = Group::Default.mask();
        }

        let user = UserRecord {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            password_hash: hash_password(&request.password)?,
            permissions: mask,
            created_at: chrono::Utc::now(),
        };

        self.store.insert_user(&user).await?;

        info!("Created user: {}", user.name);
        Ok(user)
    }

    /// Fetch a user by ID
    pub async fn get_by_id(&self, user_id: &str) -> RosterResult<UserRecord> {
        self.store
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| not_found_error!(format!("user {}", user_id), "users"))
    }

    /// Case-insensitive substring search on user name
    pub async fn search(&self, name: &str) -> RosterResult<Vec<UserRecord>> {
        self.store.search_by_name(name).await
    }

    /// List all users
    pub async fn list(&self) -> RosterResult<Vec<UserRecord>> {
        self.store.list().await
    }

    /// Delete a user by ID
    pub async fn delete(&self, user_id: &str) -> RosterResult<()> {
        if self.store.delete(user_id).await? {
            info!("Deleted user: {}", user_id);
            Ok(())
        } else {
            Err(not_found_error!(format!("user {}", user_id), "users"))
        }
    }

    /// Apply a mask update to a user's capability set.
    ///
    /// Runs as a compare-and-swap loop: read the current mask, compute the
    /// next one through the engine, and persist it only if the stored mask is
    /// still the one that was read. A lost race re-reads and retries, so two
    /// concurrent updates cannot silently drop each other.
    pub async fn update_permissions(
        &self,
        user_id: &str,
        update: MaskUpdate,
    ) -> RosterResult<UserRecord> {
        for attempt in 0..self.cas_max_retries {
            let mut user = self.get_by_id(user_id).await?;
            let next = apply_update(user.permissions, &update);

            if next == user.permissions {
                return Ok(user);
            }

            if self
                .store
                .compare_and_swap_mask(user_id, user.permissions, next)
                .await?
            {
                debug!(
                    user_id = user_id,
                    mask = next,
                    "Updated user permissions"
                );
                user.permissions = next;
                return Ok(user);
            }

            debug!(
                user_id = user_id,
                attempt = attempt + 1,
                "Concurrent permission update detected, retrying"
            );
        }

        Err(conflict_error!(
            format!(
                "Permission update for user {} kept losing to concurrent writes",
                user_id
            ),
            "users"
        ))
    }

    /// Test whether a user's mask satisfies every named requirement.
    ///
    /// Inherits the engine's leniency: an empty or fully-unrecognized
    /// requirement list is vacuously satisfied.
    pub async fn check_permissions(
        &self,
        user_id: &str,
        required: &[String],
    ) -> RosterResult<bool> {
        let user = self.get_by_id(user_id).await?;
        Ok(has_all(user.permissions, required))
    }
}
