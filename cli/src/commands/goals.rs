use anyhow::{Result, bail};

use macrolog_core::Tracker;
use macrolog_core::models::NutritionGoals;

use super::helpers::resolve_user;

/// Goal overrides from the command line; unset values keep their current value.
pub(crate) struct GoalArgs {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fats: Option<f64>,
}

impl GoalArgs {
    fn is_empty(&self) -> bool {
        self.calories.is_none()
            && self.protein.is_none()
            && self.carbs.is_none()
            && self.fats.is_none()
    }

    fn apply(&self, current: NutritionGoals) -> NutritionGoals {
        NutritionGoals {
            daily_calorie_goal: self.calories.unwrap_or(current.daily_calorie_goal),
            daily_protein_goal: self.protein.unwrap_or(current.daily_protein_goal),
            daily_carbs_goal: self.carbs.unwrap_or(current.daily_carbs_goal),
            daily_fats_goal: self.fats.unwrap_or(current.daily_fats_goal),
        }
    }
}

fn print_goals(goals: &NutritionGoals) {
    println!("Calories: {:.0} kcal/day", goals.daily_calorie_goal);
    println!("Protein:  {:.0}g", goals.daily_protein_goal);
    println!("Carbs:    {:.0}g", goals.daily_carbs_goal);
    println!("Fats:     {:.0}g", goals.daily_fats_goal);
}

pub(crate) fn cmd_goals_show(tracker: &Tracker, email: &str, json: bool) -> Result<()> {
    let user = resolve_user(tracker, email)?;
    let goals = tracker.goals(&user.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
    } else {
        print_goals(&goals);
    }
    Ok(())
}

pub(crate) fn cmd_goals_set(
    tracker: &Tracker,
    email: &str,
    args: GoalArgs,
    json: bool,
) -> Result<()> {
    if args.is_empty() {
        bail!("Nothing to change. Pass at least one of --calories, --protein, --carbs, --fats");
    }

    let user = resolve_user(tracker, email)?;
    let goals = args.apply(tracker.goals(&user.id)?);
    let updated = tracker.update_goals(&user.id, &goals)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!("Goals updated for {email}");
        print_goals(&updated);
    }
    Ok(())
}
