use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::FoodCatalog;
use super::repo_types::{Food, NewFood};

/// `FoodCatalog` backed by a `Vec`, for tests.
#[derive(Default)]
pub struct InMemoryFoodCatalog {
    foods: Mutex<Vec<Food>>,
}

#[async_trait]
impl FoodCatalog for InMemoryFoodCatalog {
    async fn list_all(&self) -> anyhow::Result<Vec<Food>> {
        let mut foods = self.foods.lock().unwrap().clone();
        foods.sort_by_key(|f| f.name.to_lowercase());
        Ok(foods)
    }

    async fn names_for(&self, ids: &[String]) -> anyhow::Result<HashMap<String, String>> {
        let foods = self.foods.lock().unwrap();
        Ok(foods
            .iter()
            .filter(|f| ids.contains(&f.id.to_string()))
            .map(|f| (f.id.to_string(), f.name.clone()))
            .collect())
    }

    async fn find_by_fdc_id(&self, fdc_id: i64) -> anyhow::Result<Option<Food>> {
        let foods = self.foods.lock().unwrap();
        Ok(foods.iter().find(|f| f.fdc_id == Some(fdc_id)).cloned())
    }

    async fn insert(&self, food: NewFood) -> anyhow::Result<Food> {
        let mut foods = self.foods.lock().unwrap();
        if let Some(fdc_id) = food.fdc_id {
            anyhow::ensure!(
                foods.iter().all(|f| f.fdc_id != Some(fdc_id)),
                "duplicate fdc id {fdc_id}"
            );
        }
        let stored = Food {
            id: Uuid::new_v4(),
            name: food.name,
            food_group: food.food_group,
            default_color: food.default_color,
            source: food.source,
            fdc_id: food.fdc_id,
            nutrients: Json(food.nutrients),
            created_at: OffsetDateTime::now_utc(),
        };
        foods.push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut foods = self.foods.lock().unwrap();
        let before = foods.len();
        foods.retain(|f| f.id != id);
        Ok(foods.len() != before)
    }
}
