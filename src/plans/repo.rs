use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{
    IngredientDraft, IngredientEntry, IngredientRow, NewPlan, Plan, PlanRow, PlanStatus,
};

/// Persistence seam for plans. Coach-facing methods are scoped by `coach_id`
/// and return `None` when the plan does not exist or belongs to someone else.
#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn find_by_share_token(&self, token: &str) -> anyhow::Result<Option<Plan>>;

    async fn find_by_id(&self, coach_id: Uuid, plan_id: Uuid) -> anyhow::Result<Option<Plan>>;

    async fn list_by_coach(
        &self,
        coach_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Plan>>;

    async fn insert(&self, plan: NewPlan) -> anyhow::Result<Plan>;

    /// Replaces the ingredient list. Entries whose `food_id` was already in
    /// the plan keep their `client_checked`; new ones start unchecked.
    async fn replace_ingredients(
        &self,
        coach_id: Uuid,
        plan_id: Uuid,
        ingredients: Vec<IngredientDraft>,
    ) -> anyhow::Result<Option<Plan>>;

    async fn set_status(
        &self,
        coach_id: Uuid,
        plan_id: Uuid,
        status: PlanStatus,
    ) -> anyhow::Result<Option<Plan>>;

    async fn set_share_token(
        &self,
        coach_id: Uuid,
        plan_id: Uuid,
        token: &str,
    ) -> anyhow::Result<Option<Plan>>;

    /// Touches only `client_checked` of one ingredient. The write only lands
    /// while the plan is published under `share_token`. Returns `false` when
    /// no row matched.
    async fn set_client_checked(
        &self,
        plan_id: Uuid,
        share_token: &str,
        food_id: &str,
        client_checked: bool,
    ) -> anyhow::Result<bool>;

    async fn delete(&self, coach_id: Uuid, plan_id: Uuid) -> anyhow::Result<bool>;
}

const PLAN_COLUMNS: &str =
    "id, coach_id, client_id, client_name, title, status, share_token, created_at, updated_at";

const INGREDIENT_COLUMNS: &str =
    "plan_id, food_id, category_id, color_code, is_selected, client_checked, notes";

#[derive(Clone)]
pub struct PgPlanStore {
    db: PgPool,
}

impl PgPlanStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn with_ingredients(&self, row: Option<PlanRow>) -> anyhow::Result<Option<Plan>> {
        match row {
            Some(row) => {
                let ingredients = load_ingredients(&self.db, row.id).await?;
                Ok(Some(row.into_plan(ingredients)))
            }
            None => Ok(None),
        }
    }
}

async fn load_ingredients<'e, E>(executor: E, plan_id: Uuid) -> anyhow::Result<Vec<IngredientEntry>>
where
    E: Executor<'e, Database = Postgres>,
{
    let rows = sqlx::query_as::<_, IngredientRow>(&format!(
        "SELECT {INGREDIENT_COLUMNS} FROM plan_ingredients WHERE plan_id = $1 ORDER BY sort_order"
    ))
    .bind(plan_id)
    .fetch_all(executor)
    .await
    .context("load plan ingredients")?;
    Ok(rows.into_iter().map(IngredientEntry::from).collect())
}

/// Inserts new rows and rewrites coach-owned columns of existing ones.
/// `client_checked` is only written for rows that did not exist yet.
async fn upsert_ingredients_tx(
    tx: &mut Transaction<'_, Postgres>,
    plan_id: Uuid,
    ingredients: &[IngredientDraft],
) -> anyhow::Result<()> {
    for (idx, ing) in ingredients.iter().enumerate() {
        let sort_order = i32::try_from(idx).context("ingredient list too long")?;
        sqlx::query(
            r#"
            INSERT INTO plan_ingredients
                (plan_id, food_id, sort_order, category_id, color_code, is_selected, client_checked, notes)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7)
            ON CONFLICT (plan_id, food_id) DO UPDATE
               SET sort_order  = EXCLUDED.sort_order,
                   category_id = EXCLUDED.category_id,
                   color_code  = EXCLUDED.color_code,
                   is_selected = EXCLUDED.is_selected,
                   notes       = EXCLUDED.notes
            "#,
        )
        .bind(plan_id)
        .bind(&ing.food_id)
        .bind(sort_order)
        .bind(&ing.category_id)
        .bind(ing.color_code)
        .bind(ing.is_selected)
        .bind(&ing.notes)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("upsert ingredient {}", ing.food_id))?;
    }
    Ok(())
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn find_by_share_token(&self, token: &str) -> anyhow::Result<Option<Plan>> {
        let row = sqlx::query_as::<_, PlanRow>(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE share_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .context("find plan by share token")?;
        self.with_ingredients(row).await
    }

    async fn find_by_id(&self, coach_id: Uuid, plan_id: Uuid) -> anyhow::Result<Option<Plan>> {
        let row = sqlx::query_as::<_, PlanRow>(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE id = $1 AND coach_id = $2"
        ))
        .bind(plan_id)
        .bind(coach_id)
        .fetch_optional(&self.db)
        .await
        .context("find plan by id")?;
        self.with_ingredients(row).await
    }

    async fn list_by_coach(
        &self,
        coach_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Plan>> {
        let rows = sqlx::query_as::<_, PlanRow>(&format!(
            r#"
            SELECT {PLAN_COLUMNS}
              FROM plans
             WHERE coach_id = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3
            "#
        ))
        .bind(coach_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list plans by coach")?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let ingredient_rows = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            SELECT {INGREDIENT_COLUMNS}
              FROM plan_ingredients
             WHERE plan_id = ANY($1)
             ORDER BY plan_id, sort_order
            "#
        ))
        .bind(&ids)
        .fetch_all(&self.db)
        .await
        .context("list ingredients for plans")?;

        let mut grouped: HashMap<Uuid, Vec<IngredientEntry>> = HashMap::new();
        for r in ingredient_rows {
            grouped.entry(r.plan_id).or_default().push(r.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let ingredients = grouped.remove(&row.id).unwrap_or_default();
                row.into_plan(ingredients)
            })
            .collect())
    }

    async fn insert(&self, plan: NewPlan) -> anyhow::Result<Plan> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let row = sqlx::query_as::<_, PlanRow>(&format!(
            r#"
            INSERT INTO plans (id, coach_id, client_id, client_name, title, status, share_token)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PLAN_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(plan.coach_id)
        .bind(plan.client_id)
        .bind(&plan.client_name)
        .bind(&plan.title)
        .bind(PlanStatus::Draft)
        .bind(&plan.share_token)
        .fetch_one(&mut *tx)
        .await
        .context("insert plan")?;

        upsert_ingredients_tx(&mut tx, row.id, &plan.ingredients).await?;
        let ingredients = load_ingredients(&mut *tx, row.id).await?;
        tx.commit().await.context("commit tx")?;

        Ok(row.into_plan(ingredients))
    }

    async fn replace_ingredients(
        &self,
        coach_id: Uuid,
        plan_id: Uuid,
        ingredients: Vec<IngredientDraft>,
    ) -> anyhow::Result<Option<Plan>> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let Some(row) = sqlx::query_as::<_, PlanRow>(&format!(
            r#"
            UPDATE plans SET updated_at = now()
             WHERE id = $1 AND coach_id = $2
            RETURNING {PLAN_COLUMNS}
            "#
        ))
        .bind(plan_id)
        .bind(coach_id)
        .fetch_optional(&mut *tx)
        .await
        .context("touch plan")?
        else {
            return Ok(None);
        };

        let keep: Vec<String> = ingredients.iter().map(|i| i.food_id.clone()).collect();
        sqlx::query("DELETE FROM plan_ingredients WHERE plan_id = $1 AND NOT (food_id = ANY($2))")
            .bind(plan_id)
            .bind(&keep)
            .execute(&mut *tx)
            .await
            .context("remove dropped ingredients")?;

        upsert_ingredients_tx(&mut tx, plan_id, &ingredients).await?;
        let entries = load_ingredients(&mut *tx, plan_id).await?;
        tx.commit().await.context("commit tx")?;

        Ok(Some(row.into_plan(entries)))
    }

    async fn set_status(
        &self,
        coach_id: Uuid,
        plan_id: Uuid,
        status: PlanStatus,
    ) -> anyhow::Result<Option<Plan>> {
        let row = sqlx::query_as::<_, PlanRow>(&format!(
            r#"
            UPDATE plans SET status = $3, updated_at = now()
             WHERE id = $1 AND coach_id = $2
            RETURNING {PLAN_COLUMNS}
            "#
        ))
        .bind(plan_id)
        .bind(coach_id)
        .bind(status)
        .fetch_optional(&self.db)
        .await
        .context("update plan status")?;
        self.with_ingredients(row).await
    }

    async fn set_share_token(
        &self,
        coach_id: Uuid,
        plan_id: Uuid,
        token: &str,
    ) -> anyhow::Result<Option<Plan>> {
        let row = sqlx::query_as::<_, PlanRow>(&format!(
            r#"
            UPDATE plans SET share_token = $3, updated_at = now()
             WHERE id = $1 AND coach_id = $2
            RETURNING {PLAN_COLUMNS}
            "#
        ))
        .bind(plan_id)
        .bind(coach_id)
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .context("update share token")?;
        self.with_ingredients(row).await
    }

    async fn set_client_checked(
        &self,
        plan_id: Uuid,
        share_token: &str,
        food_id: &str,
        client_checked: bool,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE plan_ingredients pi SET client_checked = $3
              FROM plans p
             WHERE p.id = pi.plan_id
               AND pi.plan_id = $1 AND pi.food_id = $2
               AND p.status = 'published' AND p.share_token = $4
            "#,
        )
        .bind(plan_id)
        .bind(food_id)
        .bind(client_checked)
        .bind(share_token)
        .execute(&self.db)
        .await
        .context("update client_checked")?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete(&self, coach_id: Uuid, plan_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM plans WHERE id = $1 AND coach_id = $2")
            .bind(plan_id)
            .bind(coach_id)
            .execute(&self.db)
            .await
            .context("delete plan")?;
        Ok(res.rows_affected() > 0)
    }
}
