//! In-memory store, used for tests and `--in-memory` runs

use std::collections::HashMap;

use crate::error::DatabaseError;
use crate::models::{RaceResult, TrainingPlan, User, Workout};
use crate::store::{duplicate, not_found, PlanFilters, Store, StoreStats};

/// HashMap-backed [`Store`]. Insertion order is kept for stable listings.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: HashMap<String, User>,
    user_order: Vec<String>,
    race_results: Vec<RaceResult>,
    plans: Vec<TrainingPlan>,
    workouts: Vec<Workout>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn insert_user(&mut self, user: &User) -> Result<(), DatabaseError> {
        if self.users.values().any(|u| u.email == user.email) {
            return Err(duplicate("users", &user.email));
        }
        if self.users.contains_key(&user.id) {
            return Err(duplicate("users", &user.id));
        }
        self.user_order.push(user.id.clone());
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    fn find_user(&self, user_id: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.get(user_id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.values().find(|u| u.email == email).cloned())
    }

    fn update_user(&mut self, user: &User) -> Result<(), DatabaseError> {
        match self.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(not_found("users", &user.id)),
        }
    }

    fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        Ok(self
            .user_order
            .iter()
            .filter_map(|id| self.users.get(id).cloned())
            .collect())
    }

    fn count_users(&self) -> Result<usize, DatabaseError> {
        Ok(self.users.len())
    }

    fn insert_race_result(&mut self, result: &RaceResult) -> Result<(), DatabaseError> {
        if self.race_results.iter().any(|r| r.id == result.id) {
            return Err(duplicate("race_results", &result.id));
        }
        self.race_results.push(result.clone());
        Ok(())
    }

    fn find_race_result(&self, result_id: &str) -> Result<Option<RaceResult>, DatabaseError> {
        Ok(self.race_results.iter().find(|r| r.id == result_id).cloned())
    }

    fn race_results_for_user(&self, user_id: &str) -> Result<Vec<RaceResult>, DatabaseError> {
        let mut results: Vec<RaceResult> = self
            .race_results
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for same-day races
        results.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(results)
    }

    fn delete_race_result(&mut self, result_id: &str) -> Result<bool, DatabaseError> {
        let before = self.race_results.len();
        self.race_results.retain(|r| r.id != result_id);
        Ok(self.race_results.len() < before)
    }

    fn insert_plan(&mut self, plan: &TrainingPlan) -> Result<(), DatabaseError> {
        if self.plans.iter().any(|p| p.id == plan.id) {
            return Err(duplicate("training_plans", &plan.id));
        }
        self.plans.push(plan.clone());
        Ok(())
    }

    fn find_plan(&self, plan_id: &str) -> Result<Option<TrainingPlan>, DatabaseError> {
        Ok(self.plans.iter().find(|p| p.id == plan_id).cloned())
    }

    fn plans_for_user(
        &self,
        user_id: &str,
        filters: &PlanFilters,
    ) -> Result<Vec<TrainingPlan>, DatabaseError> {
        // Newest first; insertion order breaks ties the way SQLite's rowid does
        let mut plans: Vec<(usize, &TrainingPlan)> = self
            .plans
            .iter()
            .enumerate()
            .filter(|(_, p)| p.user_id == user_id)
            .filter(|(_, p)| filters.status.map_or(true, |s| p.status == s))
            .collect();
        plans.sort_by(|(ia, a), (ib, b)| (b.generated_on, ib).cmp(&(a.generated_on, ia)));
        let limit = filters.limit.unwrap_or(usize::MAX);
        Ok(plans.into_iter().take(limit).map(|(_, p)| p.clone()).collect())
    }

    fn update_plan(&mut self, plan: &TrainingPlan) -> Result<(), DatabaseError> {
        match self.plans.iter_mut().find(|p| p.id == plan.id) {
            Some(existing) => {
                *existing = plan.clone();
                Ok(())
            }
            None => Err(not_found("training_plans", &plan.id)),
        }
    }

    fn delete_plan(&mut self, plan_id: &str) -> Result<bool, DatabaseError> {
        let before = self.plans.len();
        self.plans.retain(|p| p.id != plan_id);
        let removed = self.plans.len() < before;
        if removed {
            self.workouts.retain(|w| w.training_plan_id != plan_id);
        }
        Ok(removed)
    }

    fn insert_workouts(&mut self, workouts: &[Workout]) -> Result<(), DatabaseError> {
        for (i, workout) in workouts.iter().enumerate() {
            let clashes = self.workouts.iter().any(|w| w.id == workout.id)
                || workouts[..i].iter().any(|w| w.id == workout.id);
            if clashes {
                return Err(duplicate("workouts", &workout.id));
            }
            if !self.plans.iter().any(|p| p.id == workout.training_plan_id) {
                return Err(not_found("training_plans", &workout.training_plan_id));
            }
        }
        self.workouts.extend_from_slice(workouts);
        Ok(())
    }

    fn find_workout(&self, workout_id: &str) -> Result<Option<Workout>, DatabaseError> {
        Ok(self.workouts.iter().find(|w| w.id == workout_id).cloned())
    }

    fn update_workout(&mut self, workout: &Workout) -> Result<(), DatabaseError> {
        match self.workouts.iter_mut().find(|w| w.id == workout.id) {
            Some(existing) => {
                *existing = workout.clone();
                Ok(())
            }
            None => Err(not_found("workouts", &workout.id)),
        }
    }

    fn workouts_for_plan(&self, plan_id: &str) -> Result<Vec<Workout>, DatabaseError> {
        let mut workouts: Vec<Workout> = self
            .workouts
            .iter()
            .filter(|w| w.training_plan_id == plan_id)
            .cloned()
            .collect();
        workouts.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(workouts)
    }

    fn stats(&self) -> Result<StoreStats, DatabaseError> {
        Ok(StoreStats {
            user_count: self.users.len(),
            race_result_count: self.race_results.len(),
            plan_count: self.plans.len(),
            workout_count: self.workouts.len(),
        })
    }
}
