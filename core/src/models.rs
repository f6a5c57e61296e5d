use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_CALORIE_GOAL: f64 = 2000.0;
pub const DEFAULT_PROTEIN_GOAL: f64 = 150.0;
pub const DEFAULT_CARBS_GOAL: f64 = 250.0;
pub const DEFAULT_FATS_GOAL: f64 = 65.0;

const DATE_FORMAT: &str = "%Y-%m-%d";

// --- Users ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password: String,
    pub daily_calorie_goal: f64,
    pub daily_protein_goal: f64,
    pub daily_carbs_goal: f64,
    pub daily_fats_goal: f64,
    pub created_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn goals(&self) -> NutritionGoals {
        NutritionGoals {
            daily_calorie_goal: self.daily_calorie_goal,
            daily_protein_goal: self.daily_protein_goal,
            daily_carbs_goal: self.daily_carbs_goal,
            daily_fats_goal: self.daily_fats_goal,
        }
    }

    pub fn set_goals(&mut self, goals: &NutritionGoals) {
        self.daily_calorie_goal = goals.daily_calorie_goal;
        self.daily_protein_goal = goals.daily_protein_goal;
        self.daily_carbs_goal = goals.daily_carbs_goal;
        self.daily_fats_goal = goals.daily_fats_goal;
    }
}

/// A user as shown to clients: everything but the password.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub daily_calorie_goal: f64,
    pub daily_protein_goal: f64,
    pub daily_carbs_goal: f64,
    pub daily_fats_goal: f64,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            daily_calorie_goal: user.daily_calorie_goal,
            daily_protein_goal: user.daily_protein_goal,
            daily_carbs_goal: user.daily_carbs_goal,
            daily_fats_goal: user.daily_fats_goal,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutritionGoals {
    #[serde(default)]
    pub daily_calorie_goal: f64,
    #[serde(default)]
    pub daily_protein_goal: f64,
    #[serde(default)]
    pub daily_carbs_goal: f64,
    #[serde(default)]
    pub daily_fats_goal: f64,
}

impl Default for NutritionGoals {
    fn default() -> Self {
        Self {
            daily_calorie_goal: DEFAULT_CALORIE_GOAL,
            daily_protein_goal: DEFAULT_PROTEIN_GOAL,
            daily_carbs_goal: DEFAULT_CARBS_GOAL,
            daily_fats_goal: DEFAULT_FATS_GOAL,
        }
    }
}

impl NutritionGoals {
    pub fn validate(&self) -> Result<()> {
        non_negative("daily_calorie_goal", self.daily_calorie_goal)?;
        non_negative("daily_protein_goal", self.daily_protein_goal)?;
        non_negative("daily_carbs_goal", self.daily_carbs_goal)?;
        non_negative("daily_fats_goal", self.daily_fats_goal)?;
        Ok(())
    }
}

// --- Foods ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    pub id: String,
    /// Empty for global (system) foods.
    #[serde(default)]
    pub user_id: String,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub serving_size: f64,
    pub serving_unit: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl Food {
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.user_id.is_empty()
    }

    #[must_use]
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.is_global() || self.user_id == user_id
    }

    pub fn apply(&mut self, fields: &FoodFields) {
        self.name = fields.name.trim().to_string();
        self.calories = fields.calories;
        self.protein = fields.protein;
        self.carbs = fields.carbs;
        self.fats = fields.fats;
        self.serving_size = fields.serving_size;
        self.serving_unit.clone_from(&fields.serving_unit);
        self.category.clone_from(&fields.category);
    }
}

/// Mutable food fields, used for both create and update bodies.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FoodFields {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub serving_size: f64,
    pub serving_unit: String,
    pub category: String,
}

impl FoodFields {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::bad_request("name must not be empty"));
        }
        non_negative("calories", self.calories)?;
        non_negative("protein", self.protein)?;
        non_negative("carbs", self.carbs)?;
        non_negative("fats", self.fats)?;
        non_negative("serving_size", self.serving_size)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoodQuery {
    pub name: Option<String>,
    pub category: Option<String>,
}

// --- Entries ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub user_id: String,
    pub food_id: String,
    pub food_name: String,
    /// Number of servings.
    pub quantity: f64,
    pub meal_type: String,
    pub eaten_at: DateTime<FixedOffset>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Recompute the stored macros as `food × quantity`.
    pub fn set_portion(&mut self, food: &Food, quantity: f64) {
        self.quantity = quantity;
        self.calories = food.calories * quantity;
        self.protein = food.protein * quantity;
        self.carbs = food.carbs * quantity;
        self.fats = food.fats * quantity;
    }

    /// Calendar day of `eaten_at`, in the offset the timestamp was logged with.
    #[must_use]
    pub fn eaten_on(&self) -> NaiveDate {
        self.eaten_at.date_naive()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewEntry {
    pub food_id: String,
    pub quantity: f64,
    pub meal_type: String,
    /// RFC 3339 timestamp.
    pub eaten_at: String,
}

/// Update body. The food cannot be swapped, so there is no `food_id` here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateEntry {
    pub quantity: f64,
    pub meal_type: String,
    pub eaten_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub meal_type: Option<String>,
}

// --- Summaries ---

#[derive(Debug, Clone, Serialize)]
pub struct NutritionSummary {
    pub date: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub entries: Vec<Entry>,
}

impl NutritionSummary {
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date: date.format(DATE_FORMAT).to_string(),
            calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fats: 0.0,
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, entry: Entry) {
        self.calories += entry.calories;
        self.protein += entry.protein;
        self.carbs += entry.carbs;
        self.fats += entry.fats;
        self.entries.push(entry);
    }
}

// --- Parsing and validation ---

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| Error::bad_request(format!("Invalid date '{s}'. Use YYYY-MM-DD")))
}

pub fn parse_eaten_at(s: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|_| Error::bad_request("Invalid eaten_at format, use ISO8601"))
}

pub fn validate_quantity(quantity: f64) -> Result<()> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(Error::bad_request("quantity must be greater than 0"));
    }
    Ok(())
}

fn non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::bad_request(format!("{field} must not be negative")));
    }
    Ok(())
}

/// Treat `Some("")` the same as an absent query parameter.
pub(crate) fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_food() -> Food {
        Food {
            id: "food-1".to_string(),
            user_id: String::new(),
            name: "Oats".to_string(),
            calories: 150.0,
            protein: 5.0,
            carbs: 27.0,
            fats: 2.5,
            serving_size: 40.0,
            serving_unit: "g".to_string(),
            category: "grain".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_parse_date_valid() {
        let date = parse_date("2024-01-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(matches!(parse_date("15/01/2024"), Err(Error::BadRequest(_))));
        assert!(matches!(parse_date("2024-02-30"), Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_parse_eaten_at_keeps_offset() {
        let ts = parse_eaten_at("2024-01-01T23:30:00+02:00").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(ts.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_parse_eaten_at_rejects_date_only() {
        assert!(parse_eaten_at("2024-01-01").is_err());
        assert!(parse_eaten_at("not a time").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(0.5).is_ok());
        assert!(validate_quantity(0.0).is_err());
        assert!(validate_quantity(-1.0).is_err());
        assert!(validate_quantity(f64::NAN).is_err());
    }

    #[test]
    fn test_food_fields_validation() {
        let mut fields = FoodFields {
            name: "Apple".to_string(),
            calories: 95.0,
            ..FoodFields::default()
        };
        assert!(fields.validate().is_ok());

        fields.name = "   ".to_string();
        assert!(fields.validate().is_err());

        fields.name = "Apple".to_string();
        fields.fats = -0.1;
        let err = fields.validate().unwrap_err();
        assert_eq!(err.to_string(), "fats must not be negative");
    }

    #[test]
    fn test_goals_default() {
        let goals = NutritionGoals::default();
        assert_eq!(goals.daily_calorie_goal, 2000.0);
        assert_eq!(goals.daily_protein_goal, 150.0);
        assert_eq!(goals.daily_carbs_goal, 250.0);
        assert_eq!(goals.daily_fats_goal, 65.0);
    }

    #[test]
    fn test_food_visibility() {
        let mut food = sample_food();
        assert!(food.is_visible_to("anyone"));

        food.user_id = "owner".to_string();
        assert!(food.is_visible_to("owner"));
        assert!(!food.is_visible_to("other"));
    }

    #[test]
    fn test_set_portion_scales_macros() {
        let food = sample_food();
        let mut entry = Entry {
            id: "e".to_string(),
            user_id: "u".to_string(),
            food_id: food.id.clone(),
            food_name: food.name.clone(),
            quantity: 0.0,
            meal_type: "breakfast".to_string(),
            eaten_at: parse_eaten_at("2024-01-01T08:00:00Z").unwrap(),
            calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fats: 0.0,
            created_at: Utc::now(),
        };
        entry.set_portion(&food, 2.0);
        assert_eq!(entry.quantity, 2.0);
        assert_eq!(entry.calories, 300.0);
        assert_eq!(entry.protein, 10.0);
        assert_eq!(entry.carbs, 54.0);
        assert_eq!(entry.fats, 5.0);
    }

    #[test]
    fn test_profile_has_no_password() {
        let user = User {
            id: "u".to_string(),
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            password: "hunter2".to_string(),
            daily_calorie_goal: 2000.0,
            daily_protein_goal: 150.0,
            daily_carbs_goal: 250.0,
            daily_fats_goal: 65.0,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(UserProfile::from(&user)).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["email"], "a@example.com");
    }

    #[test]
    fn test_summary_add_accumulates() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut summary = NutritionSummary::empty(date);
        assert_eq!(summary.date, "2024-01-01");

        let food = sample_food();
        let mut entry = Entry {
            id: "e".to_string(),
            user_id: "u".to_string(),
            food_id: food.id.clone(),
            food_name: food.name.clone(),
            quantity: 0.0,
            meal_type: "lunch".to_string(),
            eaten_at: parse_eaten_at("2024-01-01T12:00:00Z").unwrap(),
            calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fats: 0.0,
            created_at: Utc::now(),
        };
        entry.set_portion(&food, 1.0);
        summary.add(entry.clone());
        summary.add(entry);

        assert_eq!(summary.calories, 300.0);
        assert_eq!(summary.fats, 5.0);
        assert_eq!(summary.entries.len(), 2);
    }
}
