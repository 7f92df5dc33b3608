//! Repository for the `users` table.

use aduan_core::roles::Role;
use aduan_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, email, password_hash, role_id, phone, is_active, created_at, updated_at";

/// Provides lookups for users. Accounts are provisioned out of band.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, role_id, phone)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(input.role_id)
            .bind(&input.phone)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Every user holding `role`, newest account first.
    pub async fn list_by_role(pool: &PgPool, role: Role) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE role_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(role.id())
            .fetch_all(pool)
            .await
    }

    /// IDs of every active user holding `role`, in id order.
    ///
    /// Used for notification fan-out, so it runs on the caller's transaction.
    pub async fn active_ids_by_role(
        conn: &mut PgConnection,
        role: Role,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM users WHERE role_id = $1 AND is_active = true ORDER BY id")
            .bind(role.id())
            .fetch_all(conn)
            .await
    }
}
