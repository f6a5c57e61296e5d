use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    Entry, EntryFilter, NewEntry, UpdateEntry, non_empty, parse_date, parse_eaten_at,
    validate_quantity,
};
use crate::service::Tracker;
use crate::store::ENTRIES_FILE;

/// Parsed form of [`EntryFilter`]: an instant range `[from, until)` and a meal.
struct EntryWindow<'a> {
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    meal_type: Option<&'a str>,
}

impl<'a> EntryWindow<'a> {
    fn parse(filter: &'a EntryFilter) -> Result<Self> {
        let from = non_empty(filter.start_date.as_ref())
            .map(parse_date)
            .transpose()?
            .map(midnight_utc);
        let until = non_empty(filter.end_date.as_ref())
            .map(parse_date)
            .transpose()?
            .map(|d| midnight_utc(d) + Duration::days(1));
        Ok(Self {
            from,
            until,
            meal_type: non_empty(filter.meal_type.as_ref()),
        })
    }

    fn contains(&self, entry: &Entry) -> bool {
        let eaten_at = entry.eaten_at.with_timezone(&Utc);
        self.from.is_none_or(|from| eaten_at >= from)
            && self.until.is_none_or(|until| eaten_at < until)
            && self.meal_type.is_none_or(|m| entry.meal_type == m)
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl Tracker {
    /// The caller's entries in file order, narrowed by the filter. End dates are
    /// inclusive through the end of that day. A malformed date is rejected.
    pub fn list_entries(&self, caller: &str, filter: &EntryFilter) -> Result<Vec<Entry>> {
        let window = EntryWindow::parse(filter)?;
        Ok(self
            .user_entries(caller)?
            .into_iter()
            .filter(|e| window.contains(e))
            .collect())
    }

    pub fn get_entry(&self, caller: &str, id: &str) -> Result<Entry> {
        self.user_entries(caller)?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or_else(entry_not_found)
    }

    /// Log an entry. Macros are fixed at `food × quantity` as of now.
    pub fn create_entry(&self, caller: &str, req: &NewEntry) -> Result<Entry> {
        let food = self.resolve_food(caller, &req.food_id)?;
        let eaten_at = parse_eaten_at(&req.eaten_at)?;
        validate_quantity(req.quantity)?;

        let mut entry = Entry {
            id: Uuid::new_v4().to_string(),
            user_id: caller.to_string(),
            food_id: food.id.clone(),
            food_name: food.name.clone(),
            quantity: 0.0,
            meal_type: req.meal_type.clone(),
            eaten_at,
            calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fats: 0.0,
            created_at: Utc::now(),
        };
        entry.set_portion(&food, req.quantity);
        self.store.update(ENTRIES_FILE, |entries: &mut Vec<Entry>| {
            entries.push(entry.clone());
            Ok::<_, Error>(())
        })?;
        Ok(entry)
    }

    /// Change quantity, meal and time. Macros are recomputed from the entry's
    /// original food at its current values.
    pub fn update_entry(&self, caller: &str, id: &str, req: &UpdateEntry) -> Result<Entry> {
        let current = self.get_entry(caller, id)?;
        let food = self.resolve_food(caller, &current.food_id)?;
        let eaten_at = parse_eaten_at(&req.eaten_at)?;
        validate_quantity(req.quantity)?;

        self.store.update(ENTRIES_FILE, |entries: &mut Vec<Entry>| {
            let entry = entries
                .iter_mut()
                .find(|e| e.id == id && e.user_id == caller)
                .ok_or_else(entry_not_found)?;
            entry.set_portion(&food, req.quantity);
            entry.meal_type.clone_from(&req.meal_type);
            entry.eaten_at = eaten_at;
            Ok(entry.clone())
        })
    }

    pub fn delete_entry(&self, caller: &str, id: &str) -> Result<()> {
        self.store.update(ENTRIES_FILE, |entries: &mut Vec<Entry>| {
            let idx = entries
                .iter()
                .position(|e| e.id == id && e.user_id == caller)
                .ok_or_else(entry_not_found)?;
            entries.remove(idx);
            Ok(())
        })
    }

    pub(crate) fn user_entries(&self, user_id: &str) -> Result<Vec<Entry>> {
        let entries: Vec<Entry> = self.store.load(ENTRIES_FILE)?;
        Ok(entries.into_iter().filter(|e| e.user_id == user_id).collect())
    }
}

fn entry_not_found() -> Error {
    Error::not_found("Entry not found")
}
