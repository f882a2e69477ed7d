use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::repo_types::{Food, NewFood};

/// The global food catalog.
#[async_trait]
pub trait FoodCatalog: Send + Sync {
    async fn list_all(&self) -> anyhow::Result<Vec<Food>>;

    /// Display names keyed by food id. Ids with no catalog entry are absent.
    async fn names_for(&self, ids: &[String]) -> anyhow::Result<HashMap<String, String>>;

    async fn find_by_fdc_id(&self, fdc_id: i64) -> anyhow::Result<Option<Food>>;

    async fn insert(&self, food: NewFood) -> anyhow::Result<Food>;

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

const FOOD_COLUMNS: &str =
    "id, name, food_group, default_color, source, fdc_id, nutrients, created_at";

#[derive(Clone)]
pub struct PgFoodCatalog {
    db: PgPool,
}

impl PgFoodCatalog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FoodCatalog for PgFoodCatalog {
    async fn list_all(&self) -> anyhow::Result<Vec<Food>> {
        let foods = sqlx::query_as::<_, Food>(&format!(
            "SELECT {FOOD_COLUMNS} FROM foods ORDER BY lower(name)"
        ))
        .fetch_all(&self.db)
        .await
        .context("list foods")?;
        Ok(foods)
    }

    async fn names_for(&self, ids: &[String]) -> anyhow::Result<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT id::text, name
              FROM foods
             WHERE id::text = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await
        .context("resolve food names")?;
        Ok(rows.into_iter().collect())
    }

    async fn find_by_fdc_id(&self, fdc_id: i64) -> anyhow::Result<Option<Food>> {
        let food = sqlx::query_as::<_, Food>(&format!(
            "SELECT {FOOD_COLUMNS} FROM foods WHERE fdc_id = $1"
        ))
        .bind(fdc_id)
        .fetch_optional(&self.db)
        .await
        .context("find food by fdc id")?;
        Ok(food)
    }

    async fn insert(&self, food: NewFood) -> anyhow::Result<Food> {
        let food = sqlx::query_as::<_, Food>(&format!(
            r#"
            INSERT INTO foods (id, name, food_group, default_color, source, fdc_id, nutrients)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {FOOD_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&food.name)
        .bind(&food.food_group)
        .bind(food.default_color)
        .bind(food.source)
        .bind(food.fdc_id)
        .bind(Json(&food.nutrients))
        .fetch_one(&self.db)
        .await
        .with_context(|| format!("insert food {}", food.name))?;
        Ok(food)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM foods WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete food")?;
        Ok(res.rows_affected() > 0)
    }
}
