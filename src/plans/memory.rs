use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::PlanStore;
use super::repo_types::{IngredientDraft, IngredientEntry, NewPlan, Plan, PlanStatus};

/// `PlanStore` backed by a `Vec`, for tests.
#[derive(Default)]
pub struct InMemoryPlanStore {
    plans: Mutex<Vec<Plan>>,
    fail_writes: bool,
    lookups: AtomicUsize,
}

impl InMemoryPlanStore {
    /// A store whose tracking updates always fail, to exercise 500 paths.
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Number of share-token lookups served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn with_plan<T>(
        &self,
        coach_id: Uuid,
        plan_id: Uuid,
        f: impl FnOnce(&mut Plan) -> T,
    ) -> Option<T> {
        let mut plans = self.plans.lock().unwrap();
        plans
            .iter_mut()
            .find(|p| p.id == plan_id && p.coach_id == coach_id)
            .map(f)
    }
}

fn merge_ingredients(existing: &[IngredientEntry], drafts: Vec<IngredientDraft>) -> Vec<IngredientEntry> {
    drafts
        .into_iter()
        .map(|d| {
            let checked = existing
                .iter()
                .find(|e| e.food_id == d.food_id)
                .is_some_and(|e| e.client_checked);
            d.into_entry(checked)
        })
        .collect()
}

#[async_trait]
impl PlanStore for InMemoryPlanStore {
    async fn find_by_share_token(&self, token: &str) -> anyhow::Result<Option<Plan>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let plans = self.plans.lock().unwrap();
        Ok(plans.iter().find(|p| p.share_token == token).cloned())
    }

    async fn find_by_id(&self, coach_id: Uuid, plan_id: Uuid) -> anyhow::Result<Option<Plan>> {
        Ok(self.with_plan(coach_id, plan_id, |p| p.clone()))
    }

    async fn list_by_coach(
        &self,
        coach_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Plan>> {
        let plans = self.plans.lock().unwrap();
        Ok(plans
            .iter()
            .rev()
            .filter(|p| p.coach_id == coach_id)
            .skip(usize::try_from(offset)?)
            .take(usize::try_from(limit)?)
            .cloned()
            .collect())
    }

    async fn insert(&self, plan: NewPlan) -> anyhow::Result<Plan> {
        let mut plans = self.plans.lock().unwrap();
        anyhow::ensure!(
            plans.iter().all(|p| p.share_token != plan.share_token),
            "duplicate share token"
        );
        let now = OffsetDateTime::now_utc();
        let stored = Plan {
            id: Uuid::new_v4(),
            coach_id: plan.coach_id,
            client_id: plan.client_id,
            client_name: plan.client_name,
            title: plan.title,
            status: PlanStatus::Draft,
            share_token: plan.share_token,
            ingredients: plan
                .ingredients
                .into_iter()
                .map(|d| d.into_entry(false))
                .collect(),
            created_at: now,
            updated_at: now,
        };
        plans.push(stored.clone());
        Ok(stored)
    }

    async fn replace_ingredients(
        &self,
        coach_id: Uuid,
        plan_id: Uuid,
        ingredients: Vec<IngredientDraft>,
    ) -> anyhow::Result<Option<Plan>> {
        Ok(self.with_plan(coach_id, plan_id, |p| {
            p.ingredients = merge_ingredients(&p.ingredients, ingredients);
            p.updated_at = OffsetDateTime::now_utc();
            p.clone()
        }))
    }

    async fn set_status(
        &self,
        coach_id: Uuid,
        plan_id: Uuid,
        status: PlanStatus,
    ) -> anyhow::Result<Option<Plan>> {
        Ok(self.with_plan(coach_id, plan_id, |p| {
            p.status = status;
            p.updated_at = OffsetDateTime::now_utc();
            p.clone()
        }))
    }

    async fn set_share_token(
        &self,
        coach_id: Uuid,
        plan_id: Uuid,
        token: &str,
    ) -> anyhow::Result<Option<Plan>> {
        Ok(self.with_plan(coach_id, plan_id, |p| {
            p.share_token = token.to_owned();
            p.updated_at = OffsetDateTime::now_utc();
            p.clone()
        }))
    }

    async fn set_client_checked(
        &self,
        plan_id: Uuid,
        share_token: &str,
        food_id: &str,
        client_checked: bool,
    ) -> anyhow::Result<bool> {
        anyhow::ensure!(!self.fail_writes, "store unavailable");
        let mut plans = self.plans.lock().unwrap();
        let Some(plan) = plans.iter_mut().find(|p| {
            p.id == plan_id
                && p.status == PlanStatus::Published
                && p.share_token == share_token
        }) else {
            return Ok(false);
        };
        match plan.ingredients.iter_mut().find(|i| i.food_id == food_id) {
            Some(ing) => {
                ing.client_checked = client_checked;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, coach_id: Uuid, plan_id: Uuid) -> anyhow::Result<bool> {
        let mut plans = self.plans.lock().unwrap();
        let before = plans.len();
        plans.retain(|p| !(p.id == plan_id && p.coach_id == coach_id));
        Ok(plans.len() != before)
    }
}
