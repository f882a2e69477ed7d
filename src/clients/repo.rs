use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::ClientInput;
use super::repo_types::Client;

const CLIENT_COLUMNS: &str = "id, coach_id, name, email, notes, created_at";

pub async fn list_by_coach(db: &PgPool, coach_id: Uuid) -> anyhow::Result<Vec<Client>> {
    let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE coach_id = $1 ORDER BY lower(name), created_at");
    sqlx::query_as::<_, Client>(&sql)
        .bind(coach_id)
        .fetch_all(db)
        .await
        .context("list clients")
}

pub async fn find(db: &PgPool, coach_id: Uuid, id: Uuid) -> anyhow::Result<Option<Client>> {
    let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1 AND coach_id = $2");
    sqlx::query_as::<_, Client>(&sql)
        .bind(id)
        .bind(coach_id)
        .fetch_optional(db)
        .await
        .context("find client")
}

pub async fn create(db: &PgPool, coach_id: Uuid, input: &ClientInput) -> anyhow::Result<Client> {
    let sql = format!(
        "INSERT INTO clients (coach_id, name, email, notes) VALUES ($1, $2, $3, $4) RETURNING {CLIENT_COLUMNS}"
    );
    sqlx::query_as::<_, Client>(&sql)
        .bind(coach_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.notes)
        .fetch_one(db)
        .await
        .context("insert client")
}

pub async fn update(
    db: &PgPool,
    coach_id: Uuid,
    id: Uuid,
    input: &ClientInput,
) -> anyhow::Result<Option<Client>> {
    let sql = format!(
        "UPDATE clients SET name = $3, email = $4, notes = $5 \
         WHERE id = $1 AND coach_id = $2 RETURNING {CLIENT_COLUMNS}"
    );
    sqlx::query_as::<_, Client>(&sql)
        .bind(id)
        .bind(coach_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.notes)
        .fetch_optional(db)
        .await
        .context("update client")
}

pub async fn delete(db: &PgPool, coach_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM clients WHERE id = $1 AND coach_id = $2")
        .bind(id)
        .bind(coach_id)
        .execute(db)
        .await
        .context("delete client")?;
    Ok(res.rows_affected() > 0)
}
