use anyhow::Result;
use std::process;

use macrolog_core::Tracker;
use macrolog_core::models::{FoodFields, FoodQuery};

use super::helpers::print_food_table;

/// Values for a new global food, as given on the command line.
pub(crate) struct FoodArgs {
    pub name: String,
    pub calories: f64,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fats: Option<f64>,
    pub serving_size: Option<f64>,
    pub serving_unit: Option<String>,
    pub category: Option<String>,
}

impl FoodArgs {
    fn into_fields(self) -> FoodFields {
        FoodFields {
            name: self.name,
            calories: self.calories,
            protein: self.protein.unwrap_or(0.0),
            carbs: self.carbs.unwrap_or(0.0),
            fats: self.fats.unwrap_or(0.0),
            serving_size: self.serving_size.unwrap_or(1.0),
            serving_unit: self.serving_unit.unwrap_or_else(|| "serving".to_string()),
            category: self.category.unwrap_or_default(),
        }
    }
}

pub(crate) fn cmd_food_add(tracker: &Tracker, args: FoodArgs, json: bool) -> Result<()> {
    // Global foods have no owner
    let food = tracker.create_food("", &args.into_fields())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
    } else {
        let name = &food.name;
        let id = &food.id;
        println!("Added global food: {name} (id: {id})");
    }

    Ok(())
}

pub(crate) fn cmd_food_list(
    tracker: &Tracker,
    search: Option<String>,
    category: Option<String>,
    json: bool,
) -> Result<()> {
    let query = FoodQuery {
        name: search,
        category,
    };
    let foods = tracker.list_foods("", &query)?;

    if foods.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No foods found");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
    } else {
        print_food_table(&foods);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::helpers::testing;

    fn oats() -> FoodArgs {
        FoodArgs {
            name: "Oats".to_string(),
            calories: 380.0,
            protein: Some(13.0),
            carbs: None,
            fats: None,
            serving_size: Some(100.0),
            serving_unit: Some("g".to_string()),
            category: Some("grain".to_string()),
        }
    }

    #[test]
    fn test_into_fields_defaults() {
        let fields = FoodArgs {
            name: "Tea".to_string(),
            calories: 2.0,
            protein: None,
            carbs: None,
            fats: None,
            serving_size: None,
            serving_unit: None,
            category: None,
        }
        .into_fields();
        assert_eq!(fields.protein, 0.0);
        assert_eq!(fields.serving_size, 1.0);
        assert_eq!(fields.serving_unit, "serving");
        assert_eq!(fields.category, "");
    }

    #[test]
    fn test_food_add_creates_global_food() {
        let (_dir, tracker) = testing::tracker();
        let user = testing::register(&tracker, "a@example.com");

        cmd_food_add(&tracker, oats(), true).unwrap();

        // Visible to any user, and owned by nobody
        let foods = tracker.list_foods(&user.id, &FoodQuery::default()).unwrap();
        assert_eq!(foods.len(), 1);
        assert!(foods[0].is_global());
        assert_eq!(foods[0].name, "Oats");
        assert_eq!(foods[0].protein, 13.0);
    }

    #[test]
    fn test_food_add_rejects_negative_macros() {
        let (_dir, tracker) = testing::tracker();
        let mut args = oats();
        args.fats = Some(-1.0);
        assert!(cmd_food_add(&tracker, args, true).is_err());
        assert!(tracker.list_foods("", &FoodQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn test_food_list_with_results() {
        let (_dir, tracker) = testing::tracker();
        cmd_food_add(&tracker, oats(), true).unwrap();
        cmd_food_list(&tracker, Some("oat".to_string()), None, false).unwrap();
    }
}
