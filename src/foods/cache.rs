//! Cache of USDA food details, owned by whoever builds it.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::usda::{NutritionSource, UsdaError, UsdaFood};

/// Backing map for [`NutritionCache`], keyed by FDC id.
pub trait NutritionStore: Send + Sync {
    fn get(&self, fdc_id: i64) -> Option<UsdaFood>;
    fn put(&self, food: UsdaFood);
    fn remove(&self, fdc_id: i64) -> bool;
    fn clear(&self);
    fn size(&self) -> usize;
}

#[derive(Default)]
pub struct MemoryNutritionStore {
    entries: RwLock<HashMap<i64, UsdaFood>>,
}

impl NutritionStore for MemoryNutritionStore {
    fn get(&self, fdc_id: i64) -> Option<UsdaFood> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&fdc_id)
            .cloned()
    }

    fn put(&self, food: UsdaFood) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(food.fdc_id, food);
    }

    fn remove(&self, fdc_id: i64) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&fdc_id)
            .is_some()
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn size(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

pub struct NutritionCache {
    source: Arc<dyn NutritionSource>,
    store: Box<dyn NutritionStore>,
}

impl NutritionCache {
    pub fn new(source: Arc<dyn NutritionSource>, store: Box<dyn NutritionStore>) -> Self {
        Self { source, store }
    }

    pub fn in_memory(source: Arc<dyn NutritionSource>) -> Self {
        Self::new(source, Box::<MemoryNutritionStore>::default())
    }

    /// Cached details, fetching from the source on a miss. Failures are not
    /// cached.
    pub async fn food_details(&self, fdc_id: i64) -> Result<UsdaFood, UsdaError> {
        if let Some(food) = self.store.get(fdc_id) {
            debug!(fdc_id, "nutrition cache hit");
            return Ok(food);
        }
        let food = self.source.food_details(fdc_id).await?;
        self.store.put(food.clone());
        debug!(fdc_id, cached = self.store.size(), "nutrition cache fill");
        Ok(food)
    }

    pub fn invalidate(&self, fdc_id: i64) -> bool {
        self.store.remove(fdc_id)
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn size(&self) -> usize {
        self.store.size()
    }
}
