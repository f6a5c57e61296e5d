use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use macrolog_core::Tracker;
use macrolog_core::models::{Entry, NutritionGoals, NutritionSummary};

use super::helpers::{format_date, no_neg_zero, parse_date, resolve_user};

/// Group entries by meal type, keeping the order in which meals first appear.
fn group_by_meal(entries: &[Entry]) -> Vec<(&str, Vec<&Entry>)> {
    let mut groups: Vec<(&str, Vec<&Entry>)> = Vec::new();
    for entry in entries {
        let meal = entry.meal_type.as_str();
        match groups.iter_mut().find(|(m, _)| *m == meal) {
            Some((_, list)) => list.push(entry),
            None => groups.push((meal, vec![entry])),
        }
    }
    groups
}

/// Goal minus consumed, in calories/protein/carbs/fats order.
fn remaining(summary: &NutritionSummary, goals: &NutritionGoals) -> [f64; 4] {
    [
        goals.daily_calorie_goal - summary.calories,
        goals.daily_protein_goal - summary.protein,
        goals.daily_carbs_goal - summary.carbs,
        goals.daily_fats_goal - summary.fats,
    ]
}

pub(crate) fn cmd_summary(
    tracker: &Tracker,
    email: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let user = resolve_user(tracker, email)?;
    let date = format_date(parse_date(date)?);
    let summary = tracker.daily_summary(&user.id, &date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.entries.is_empty() {
        eprintln!("No entries for {date}");
        process::exit(2);
    }

    println!("=== {date} ===\n");

    for (meal, entries) in group_by_meal(&summary.entries) {
        let meal_label = meal.to_uppercase();
        let sub_cal: f64 = entries.iter().map(|e| e.calories).sum();
        println!("  {meal_label} ({sub_cal:.0} kcal)");
        for e in entries {
            let name = &e.food_name;
            let qty = e.quantity;
            let time = e.eaten_at.format("%H:%M");
            println!(
                "    {time} {name} x{qty} - {:.0} kcal | P:{:.0}g C:{:.0}g F:{:.0}g",
                e.calories, e.protein, e.carbs, e.fats
            );
        }
        println!();
    }

    let goals = tracker.goals(&user.id)?;
    println!(
        "  TOTAL: {:.0} kcal | P:{:.0}g C:{:.0}g F:{:.0}g",
        summary.calories, summary.protein, summary.carbs, summary.fats
    );
    println!(
        "  GOAL: {:.0} kcal | P:{:.0}g C:{:.0}g F:{:.0}g",
        goals.daily_calorie_goal,
        goals.daily_protein_goal,
        goals.daily_carbs_goal,
        goals.daily_fats_goal
    );
    let [rcal, rp, rc, rf] = remaining(&summary, &goals).map(no_neg_zero);
    println!("  REMAINING: {rcal:.0} kcal | P:{rp:.0}g C:{rc:.0}g F:{rf:.0}g");

    Ok(())
}

pub(crate) fn cmd_history(
    tracker: &Tracker,
    email: &str,
    start: Option<String>,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Entries")]
        entries: usize,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fats")]
        fats: String,
    }

    let user = resolve_user(tracker, email)?;
    let end = format_date(parse_date(start)?);
    let week = tracker.weekly_summary(&user.id, Some(&end))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&week)?);
        return Ok(());
    }

    if week.iter().all(|s| s.entries.is_empty()) {
        eprintln!("No entries in the week ending {end}");
        process::exit(2);
    }

    let rows: Vec<HistoryRow> = week
        .iter()
        .map(|s| HistoryRow {
            date: s.date.clone(),
            entries: s.entries.len(),
            calories: format!("{:.0}", no_neg_zero(s.calories)),
            protein: format!("{:.0}g", no_neg_zero(s.protein)),
            carbs: format!("{:.0}g", no_neg_zero(s.carbs)),
            fats: format!("{:.0}g", no_neg_zero(s.fats)),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::helpers::testing;
    use macrolog_core::models::{FoodFields, NewEntry};

    fn log_apple(tracker: &Tracker, user_id: &str, meal: &str, at: &str) -> Entry {
        let food = tracker
            .create_food(
                "",
                &FoodFields {
                    name: "Apple".to_string(),
                    calories: 100.0,
                    protein: 0.5,
                    carbs: 25.0,
                    fats: 0.3,
                    serving_size: 1.0,
                    serving_unit: "piece".to_string(),
                    category: "fruit".to_string(),
                },
            )
            .unwrap();
        tracker
            .create_entry(
                user_id,
                &NewEntry {
                    food_id: food.id,
                    quantity: 2.0,
                    meal_type: meal.to_string(),
                    eaten_at: at.to_string(),
                },
            )
            .unwrap()
    }

    #[test]
    fn test_group_by_meal_keeps_first_seen_order() {
        let (_dir, tracker) = testing::tracker();
        let user = testing::register(&tracker, "a@example.com");
        let entries = vec![
            log_apple(&tracker, &user.id, "lunch", "2024-01-01T12:00:00Z"),
            log_apple(&tracker, &user.id, "breakfast", "2024-01-01T08:00:00Z"),
            log_apple(&tracker, &user.id, "lunch", "2024-01-01T13:00:00Z"),
        ];

        let groups = group_by_meal(&entries);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "lunch");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "breakfast");
        assert_eq!(groups[1].1.len(), 1);
    }

    #[test]
    fn test_remaining_against_goals() {
        let (_dir, tracker) = testing::tracker();
        let user = testing::register(&tracker, "a@example.com");
        log_apple(&tracker, &user.id, "breakfast", "2024-01-01T08:00:00Z");

        let summary = tracker.daily_summary(&user.id, "2024-01-01").unwrap();
        let [cal, protein, carbs, fats] = remaining(&summary, &NutritionGoals::default());
        assert_eq!(cal, 1800.0);
        assert_eq!(protein, 149.0);
        assert_eq!(carbs, 200.0);
        assert!((fats - 64.4).abs() < 1e-9);
    }

    #[test]
    fn test_summary_and_history_print() {
        let (_dir, tracker) = testing::tracker();
        let user = testing::register(&tracker, "a@example.com");
        log_apple(&tracker, &user.id, "breakfast", "2024-01-01T08:00:00Z");

        cmd_summary(&tracker, "a@example.com", Some("2024-01-01".to_string()), false).unwrap();
        cmd_history(&tracker, "a@example.com", Some("2024-01-03".to_string()), false).unwrap();
        cmd_history(&tracker, "a@example.com", Some("2024-01-03".to_string()), true).unwrap();
    }

    #[test]
    fn test_summary_unknown_user() {
        let (_dir, tracker) = testing::tracker();
        assert!(cmd_summary(&tracker, "ghost@example.com", None, true).is_err());
    }

    #[test]
    fn test_history_invalid_date() {
        let (_dir, tracker) = testing::tracker();
        testing::register(&tracker, "a@example.com");
        let start = Some("next week".to_string());
        assert!(cmd_history(&tracker, "a@example.com", start, true).is_err());
    }
}
