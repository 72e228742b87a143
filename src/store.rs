//! Persistence contract shared by the in-memory and SQLite stores

use crate::error::DatabaseError;
use crate::models::{RaceResult, TrainingPlan, User, Workout};

/// Training plan query filters
#[derive(Debug, Default, Clone)]
pub struct PlanFilters {
    pub status: Option<crate::models::PlanStatus>,
    pub limit: Option<usize>,
}

/// Record counts, as reported by `happyfeet stats`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub user_count: usize,
    pub race_result_count: usize,
    pub plan_count: usize,
    pub workout_count: usize,
}

/// Users, race results, training plans and workouts.
///
/// Implementations keep each call atomic but do not coordinate across calls:
/// a read-compute-write sequence in a service is not isolated.
pub trait Store {
    /// Insert a new user; a second account with the same email is a `Duplicate`
    fn insert_user(&mut self, user: &User) -> Result<(), DatabaseError>;
    fn find_user(&self, user_id: &str) -> Result<Option<User>, DatabaseError>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
    fn update_user(&mut self, user: &User) -> Result<(), DatabaseError>;
    fn list_users(&self) -> Result<Vec<User>, DatabaseError>;
    fn count_users(&self) -> Result<usize, DatabaseError>;

    fn insert_race_result(&mut self, result: &RaceResult) -> Result<(), DatabaseError>;
    fn find_race_result(&self, result_id: &str) -> Result<Option<RaceResult>, DatabaseError>;
    /// A user's results, most recent race first
    fn race_results_for_user(&self, user_id: &str) -> Result<Vec<RaceResult>, DatabaseError>;
    fn delete_race_result(&mut self, result_id: &str) -> Result<bool, DatabaseError>;

    fn insert_plan(&mut self, plan: &TrainingPlan) -> Result<(), DatabaseError>;
    fn find_plan(&self, plan_id: &str) -> Result<Option<TrainingPlan>, DatabaseError>;
    /// A user's plans, newest first
    fn plans_for_user(
        &self,
        user_id: &str,
        filters: &PlanFilters,
    ) -> Result<Vec<TrainingPlan>, DatabaseError>;
    fn update_plan(&mut self, plan: &TrainingPlan) -> Result<(), DatabaseError>;
    /// Delete a plan and its workouts
    fn delete_plan(&mut self, plan_id: &str) -> Result<bool, DatabaseError>;

    /// Insert all workouts or none
    fn insert_workouts(&mut self, workouts: &[Workout]) -> Result<(), DatabaseError>;
    fn find_workout(&self, workout_id: &str) -> Result<Option<Workout>, DatabaseError>;
    fn update_workout(&mut self, workout: &Workout) -> Result<(), DatabaseError>;
    /// A plan's workouts in date order
    fn workouts_for_plan(&self, plan_id: &str) -> Result<Vec<Workout>, DatabaseError>;

    fn stats(&self) -> Result<StoreStats, DatabaseError>;
}

pub(crate) fn not_found(table: &str, id: &str) -> DatabaseError {
    DatabaseError::NotFound {
        table: table.to_string(),
        id: id.to_string(),
    }
}

pub(crate) fn duplicate(table: &str, key: &str) -> DatabaseError {
    DatabaseError::Duplicate {
        table: table.to_string(),
        key: key.to_string(),
    }
}
