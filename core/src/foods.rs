use chrono::Utc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Food, FoodFields, FoodQuery, non_empty};
use crate::service::Tracker;
use crate::store::FOODS_FILE;

impl Tracker {
    /// Global foods plus the viewer's own, narrowed by the optional name
    /// (substring) and category (exact) filters, both case-insensitive.
    pub fn list_foods(&self, viewer: &str, query: &FoodQuery) -> Result<Vec<Food>> {
        let foods: Vec<Food> = self.store.load(FOODS_FILE)?;
        let name = non_empty(query.name.as_ref()).map(str::to_lowercase);
        let category = non_empty(query.category.as_ref()).map(str::to_lowercase);

        Ok(foods
            .into_iter()
            .filter(|f| f.is_visible_to(viewer))
            .filter(|f| {
                name.as_deref()
                    .is_none_or(|n| f.name.to_lowercase().contains(n))
            })
            .filter(|f| {
                category.as_deref()
                    .is_none_or(|c| f.category.to_lowercase() == c)
            })
            .collect())
    }

    pub fn get_food(&self, viewer: &str, id: &str) -> Result<Food> {
        let foods: Vec<Food> = self.store.load(FOODS_FILE)?;
        foods
            .into_iter()
            .find(|f| f.id == id && f.is_visible_to(viewer))
            .ok_or_else(|| Error::not_found("Food not found"))
    }

    /// Create a food owned by `owner`. An empty owner makes a global food.
    pub fn create_food(&self, owner: &str, fields: &FoodFields) -> Result<Food> {
        fields.validate()?;

        let mut food = Food {
            id: Uuid::new_v4().to_string(),
            user_id: owner.to_string(),
            name: String::new(),
            calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fats: 0.0,
            serving_size: 0.0,
            serving_unit: String::new(),
            category: String::new(),
            created_at: Utc::now(),
        };
        food.apply(fields);
        self.store.update(FOODS_FILE, |foods: &mut Vec<Food>| {
            foods.push(food.clone());
            Ok::<_, Error>(())
        })?;
        Ok(food)
    }

    /// Overwrite every mutable field. Only the owner may update, so global
    /// foods are read-only here. Ownership is checked before the fields.
    pub fn update_food(&self, caller: &str, id: &str, fields: &FoodFields) -> Result<Food> {
        self.store.update(FOODS_FILE, |foods: &mut Vec<Food>| {
            let idx = owned_food_index(foods, caller, id)?;
            fields.validate()?;
            foods[idx].apply(fields);
            Ok(foods[idx].clone())
        })
    }

    pub fn delete_food(&self, caller: &str, id: &str) -> Result<()> {
        self.store.update(FOODS_FILE, |foods: &mut Vec<Food>| {
            let idx = owned_food_index(foods, caller, id)?;
            foods.remove(idx);
            Ok(())
        })
    }

    /// Resolve a food for logging: it must exist and be visible to the caller.
    pub(crate) fn resolve_food(&self, caller: &str, id: &str) -> Result<Food> {
        self.get_food(caller, id)
    }
}

fn owned_food_index(foods: &[Food], caller: &str, id: &str) -> Result<usize> {
    let idx = foods
        .iter()
        .position(|f| f.id == id)
        .ok_or_else(|| Error::not_found("Food not found"))?;
    if foods[idx].user_id != caller {
        return Err(Error::Forbidden("Forbidden".to_string()));
    }
    Ok(idx)
}
