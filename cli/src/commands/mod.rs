mod food;
mod goals;
mod helpers;
mod summary;

pub(crate) use food::{FoodArgs, cmd_food_add, cmd_food_list};
pub(crate) use goals::{GoalArgs, cmd_goals_set, cmd_goals_show};
pub(crate) use summary::{cmd_history, cmd_summary};
