use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{NewUser, NutritionGoals, User, UserProfile};
use crate::service::Tracker;
use crate::store::USERS_FILE;

impl Tracker {
    /// Create a user with the default goals. Emails are unique.
    pub fn register(&self, req: &NewUser) -> Result<UserProfile> {
        if req.email.trim().is_empty() {
            return Err(Error::bad_request("email must not be empty"));
        }
        if req.password.is_empty() {
            return Err(Error::bad_request("password must not be empty"));
        }

        let profile = self.store.update(USERS_FILE, |users: &mut Vec<User>| {
            if users.iter().any(|u| u.email == req.email) {
                return Err(Error::Conflict("User already exists".to_string()));
            }

            let goals = NutritionGoals::default();
            let user = User {
                id: Uuid::new_v4().to_string(),
                email: req.email.clone(),
                name: req.name.clone(),
                password: req.password.clone(),
                daily_calorie_goal: goals.daily_calorie_goal,
                daily_protein_goal: goals.daily_protein_goal,
                daily_carbs_goal: goals.daily_carbs_goal,
                daily_fats_goal: goals.daily_fats_goal,
                created_at: Utc::now(),
            };
            let profile = UserProfile::from(&user);
            users.push(user);
            Ok(profile)
        })?;

        info!(user_id = %profile.id, "registered user");
        Ok(profile)
    }

    /// Exact email + password match.
    pub fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let users: Vec<User> = self.store.load(USERS_FILE)?;
        users
            .iter()
            .find(|u| u.email == email && u.password == password)
            .map(UserProfile::from)
            .ok_or_else(|| Error::Unauthorized("Invalid credentials".to_string()))
    }

    /// Profile of an authenticated caller.
    pub fn current_user(&self, user_id: &str) -> Result<UserProfile> {
        self.find_user(user_id)?
            .as_ref()
            .map(UserProfile::from)
            .ok_or_else(|| Error::Unauthorized("Not logged in".to_string()))
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        let users: Vec<User> = self.store.load(USERS_FILE)?;
        Ok(users
            .iter()
            .find(|u| u.email == email)
            .map(UserProfile::from))
    }

    pub(crate) fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        let users: Vec<User> = self.store.load(USERS_FILE)?;
        Ok(users.into_iter().find(|u| u.id == user_id))
    }
}
