//! Repository for the `categories` reference table.

use aduan_core::types::DbId;
use sqlx::PgPool;

use crate::models::category::Category;

const COLUMNS: &str = "id, name, description, created_at, updated_at";

/// Read-only access to complaint categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// List all categories in id order.
    pub async fn list(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories ORDER BY id");
        sqlx::query_as::<_, Category>(&query).fetch_all(pool).await
    }

    /// Whether a category with this id exists.
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}
