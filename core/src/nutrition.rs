use std::collections::BTreeMap;

use chrono::{Duration, Local, NaiveDate};

use crate::error::{Error, Result};
use crate::models::{NutritionGoals, NutritionSummary, User, parse_date};
use crate::service::Tracker;
use crate::store::USERS_FILE;

const WEEK_DAYS: i64 = 7;

impl Tracker {
    /// Totals for the caller's entries eaten on `date` (`YYYY-MM-DD`).
    pub fn daily_summary(&self, caller: &str, date: &str) -> Result<NutritionSummary> {
        let date = parse_date(date)?;
        let mut summary = NutritionSummary::empty(date);
        for entry in self.user_entries(caller)? {
            if entry.eaten_on() == date {
                summary.add(entry);
            }
        }
        Ok(summary)
    }

    /// One bucket per day for the seven days ending at `start_date` (today when
    /// absent), oldest first. Days without entries are still present.
    pub fn weekly_summary(
        &self,
        caller: &str,
        start_date: Option<&str>,
    ) -> Result<Vec<NutritionSummary>> {
        let end = match start_date.filter(|s| !s.is_empty()) {
            Some(s) => parse_date(s)?,
            None => Local::now().date_naive(),
        };

        let mut buckets: BTreeMap<NaiveDate, NutritionSummary> = (0..WEEK_DAYS)
            .map(|i| {
                let day = end - Duration::days(i);
                (day, NutritionSummary::empty(day))
            })
            .collect();

        for entry in self.user_entries(caller)? {
            if let Some(bucket) = buckets.get_mut(&entry.eaten_on()) {
                bucket.add(entry);
            }
        }

        Ok(buckets.into_values().collect())
    }

    pub fn goals(&self, caller: &str) -> Result<NutritionGoals> {
        self.find_user(caller)?
            .map(|u| u.goals())
            .ok_or_else(|| Error::not_found("User not found"))
    }

    pub fn update_goals(&self, caller: &str, goals: &NutritionGoals) -> Result<NutritionGoals> {
        goals.validate()?;

        self.store.update(USERS_FILE, |users: &mut Vec<User>| {
            let user = users
                .iter_mut()
                .find(|u| u.id == caller)
                .ok_or_else(|| Error::not_found("User not found"))?;
            user.set_goals(goals);
            Ok(user.goals())
        })
    }
}
