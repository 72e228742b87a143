use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{HappyFeetError, Result};
use crate::models::{CompletionDetails, Workout, WorkoutDraft};
use crate::store::Store;
use crate::training_plan::owned_plan;

/// Completion totals for a plan's workouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSummary {
    pub scheduled: usize,
    pub completed: usize,
    pub planned_distance: Decimal,
    pub completed_distance: Decimal,
}

impl WorkoutSummary {
    pub fn from_workouts(workouts: &[Workout]) -> Self {
        let done = workouts.iter().filter(|w| w.completed);
        Self {
            scheduled: workouts.len(),
            completed: done.clone().count(),
            planned_distance: workouts
                .iter()
                .fold(Decimal::ZERO, |acc, w| acc.saturating_add(w.distance)),
            completed_distance: done.fold(Decimal::ZERO, |acc, w| {
                acc.saturating_add(w.actual_distance.unwrap_or(w.distance))
            }),
        }
    }
}

pub struct WorkoutService;

impl WorkoutService {
    /// Schedule workouts on one of the caller's plans. Nothing is stored if any draft is invalid.
    pub fn add_workouts(
        store: &mut dyn Store,
        user_id: &str,
        plan_id: &str,
        drafts: Vec<WorkoutDraft>,
    ) -> Result<Vec<Workout>> {
        let plan = owned_plan(store, user_id, plan_id, "update")?;
        if drafts.is_empty() {
            return Err(HappyFeetError::Validation(
                "At least one workout is required".to_string(),
            ));
        }

        let workouts = drafts
            .into_iter()
            .map(|draft| Workout::new(&plan.id, user_id, draft))
            .collect::<Result<Vec<_>>>()?;
        store.insert_workouts(&workouts)?;

        info!(plan_id = %plan.id, count = workouts.len(), "Scheduled workouts");
        Ok(workouts)
    }

    /// Mark a workout done with optional actuals
    pub fn complete(
        store: &mut dyn Store,
        user_id: &str,
        workout_id: &str,
        details: CompletionDetails,
    ) -> Result<Workout> {
        let mut workout = store
            .find_workout(workout_id)?
            .ok_or_else(|| HappyFeetError::NotFound("Workout".to_string()))?;
        if workout.user_id != user_id {
            return Err(HappyFeetError::Forbidden(
                "Not authorized to update this workout".to_string(),
            ));
        }

        workout.complete(details)?;
        store.update_workout(&workout)?;
        info!(workout_id = %workout.id, effort = ?workout.perceived_effort, "Workout completed");
        Ok(workout)
    }

    /// A plan's workouts in date order
    pub fn list(store: &dyn Store, user_id: &str, plan_id: &str) -> Result<Vec<Workout>> {
        let plan = owned_plan(store, user_id, plan_id, "view")?;
        Ok(store.workouts_for_plan(&plan.id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::models::{
        Intensity, PlanRaceType, PlanRequest, RegistrationRequest, TrainingPlan, User, WorkoutType,
    };
    use crate::pacing::PaceTable;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn setup() -> (MemoryStore, String, String) {
        let mut store = MemoryStore::new();
        let request = RegistrationRequest {
            name: "Trainer".to_string(),
            email: "trainer@example.com".to_string(),
            password: "password123".to_string(),
            username: "trainer".to_string(),
            ..Default::default()
        };
        let user = User::new(&request, "hash".to_string()).unwrap();
        store.insert_user(&user).unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let plan = TrainingPlan::new(
            &user.id,
            PlanRequest::new(PlanRaceType::HalfMarathon),
            PaceTable::default(),
            today,
        )
        .unwrap();
        store.insert_plan(&plan).unwrap();
        (store, user.id, plan.id)
    }

    fn draft(day: u32, workout_type: WorkoutType, distance: Decimal) -> WorkoutDraft {
        WorkoutDraft {
            date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            workout_type,
            distance,
            duration: distance * dec!(6),
            intensity: Intensity::Easy,
            notes: String::new(),
        }
    }

    #[test]
    fn test_add_and_list_in_date_order() {
        let (mut store, user_id, plan_id) = setup();
        WorkoutService::add_workouts(
            &mut store,
            &user_id,
            &plan_id,
            vec![
                draft(5, WorkoutType::Tempo, dec!(7)),
                draft(3, WorkoutType::Easy, dec!(5)),
                draft(4, WorkoutType::Rest, Decimal::ZERO),
            ],
        )
        .unwrap();

        let workouts = WorkoutService::list(&store, &user_id, &plan_id).unwrap();
        let days: Vec<String> = workouts.iter().map(|w| w.date.to_string()).collect();
        assert_eq!(days, vec!["2025-06-03", "2025-06-04", "2025-06-05"]);
    }

    #[test]
    fn test_invalid_draft_stores_nothing() {
        let (mut store, user_id, plan_id) = setup();
        let result = WorkoutService::add_workouts(
            &mut store,
            &user_id,
            &plan_id,
            vec![draft(3, WorkoutType::Easy, dec!(5)), draft(4, WorkoutType::Easy, dec!(-1))],
        );
        assert!(result.is_err());
        assert!(WorkoutService::list(&store, &user_id, &plan_id).unwrap().is_empty());
    }

    #[test]
    fn test_complete_and_summary() {
        let (mut store, user_id, plan_id) = setup();
        let added = WorkoutService::add_workouts(
            &mut store,
            &user_id,
            &plan_id,
            vec![draft(3, WorkoutType::Easy, dec!(5)), draft(5, WorkoutType::Long, dec!(12))],
        )
        .unwrap();

        let err = WorkoutService::complete(&mut store, "intruder", &added[0].id, CompletionDetails::default())
            .unwrap_err();
        assert_eq!(err.status_code(), 403);

        let done = WorkoutService::complete(
            &mut store,
            &user_id,
            &added[0].id,
            CompletionDetails {
                actual_distance: Some(dec!(5.5)),
                perceived_effort: Some(3),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(done.completed);

        let summary = WorkoutSummary::from_workouts(&WorkoutService::list(&store, &user_id, &plan_id).unwrap());
        assert_eq!(summary.scheduled, 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.planned_distance, dec!(17));
        assert_eq!(summary.completed_distance, dec!(5.5));
    }

    #[test]
    fn test_other_users_plan_rejected() {
        let (mut store, _user_id, plan_id) = setup();
        let err = WorkoutService::add_workouts(
            &mut store,
            "intruder",
            &plan_id,
            vec![draft(3, WorkoutType::Easy, dec!(5))],
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 403);

        let err = WorkoutService::complete(&mut store, "x", "missing", CompletionDetails::default())
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
