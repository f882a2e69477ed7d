use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::Coach;

const COACH_COLUMNS: &str = "id, email, name, password_hash, created_at";

impl Coach {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<Coach>> {
        let sql = format!("SELECT {COACH_COLUMNS} FROM coaches WHERE email = $1");
        sqlx::query_as::<_, Coach>(&sql)
            .bind(email)
            .fetch_optional(db)
            .await
            .context("find coach by email")
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Coach>> {
        let sql = format!("SELECT {COACH_COLUMNS} FROM coaches WHERE id = $1");
        sqlx::query_as::<_, Coach>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await
            .context("find coach by id")
    }

    /// Returns `None` when the email is already registered.
    pub async fn create(
        db: &PgPool,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
    ) -> anyhow::Result<Option<Coach>> {
        let sql = format!(
            "INSERT INTO coaches (email, name, password_hash) VALUES ($1, $2, $3) \
             ON CONFLICT (email) DO NOTHING RETURNING {COACH_COLUMNS}"
        );
        sqlx::query_as::<_, Coach>(&sql)
            .bind(email)
            .bind(name)
            .bind(password_hash)
            .fetch_optional(db)
            .await
            .context("insert coach")
    }
}
