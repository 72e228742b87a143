//! Training plan lifecycle.
//!
//! A new plan is anchored on the runner's fastest eligible race: the result
//! history is loaded (most recent first), [`RaceResultSelector`] picks the
//! baseline, and [`PaceCalculator`] turns it into the plan's pace table. The
//! table is stored with the plan and never recomputed, so later results do
//! not change existing plans.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{HappyFeetError, Result};
use crate::models::{PlanRequest, PlanUpdate, TrainingPlan, Workout};
use crate::pacing::{PaceCalculator, RaceResultSelector};
use crate::store::{PlanFilters, Store};

/// A plan with its scheduled workouts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDetails {
    #[serde(flatten)]
    pub plan: TrainingPlan,
    pub duration_weeks: u32,
    pub workouts: Vec<Workout>,
}

pub struct TrainingPlanService;

impl TrainingPlanService {
    /// Create a plan starting today unless the request says otherwise
    pub fn create_plan(store: &mut dyn Store, user_id: &str, request: PlanRequest) -> Result<TrainingPlan> {
        Self::create_plan_on(store, user_id, request, Utc::now().date_naive())
    }

    /// Create a plan with `today` as the default start date
    #[instrument(skip(store, request), fields(race_type = %request.race_type))]
    pub fn create_plan_on(
        store: &mut dyn Store,
        user_id: &str,
        request: PlanRequest,
        today: NaiveDate,
    ) -> Result<TrainingPlan> {
        if store.find_user(user_id)?.is_none() {
            return Err(HappyFeetError::NotFound("User".to_string()));
        }

        let results = store.race_results_for_user(user_id)?;
        let baseline = RaceResultSelector::select_best(&results);
        match baseline {
            Some(best) => info!(
                result_id = %best.id,
                race = %best.race_name,
                pace_per_km = %best.pace_per_km().round_dp(3),
                "Using best race result as pacing baseline"
            ),
            None => info!(
                candidates = results.len(),
                "No usable race result, using default paces"
            ),
        }

        let paces = PaceCalculator::calculate(baseline);
        let plan = TrainingPlan::new(user_id, request, paces, today)?;
        store.insert_plan(&plan)?;

        info!(plan_id = %plan.id, "Created training plan");
        Ok(plan)
    }

    /// The caller's plans, newest first
    pub fn list_plans(store: &dyn Store, user_id: &str, filters: &PlanFilters) -> Result<Vec<TrainingPlan>> {
        Ok(store.plans_for_user(user_id, filters)?)
    }

    pub fn get_plan(store: &dyn Store, user_id: &str, plan_id: &str) -> Result<TrainingPlan> {
        owned_plan(store, user_id, plan_id, "view")
    }

    pub fn plan_details(store: &dyn Store, user_id: &str, plan_id: &str) -> Result<PlanDetails> {
        let plan = owned_plan(store, user_id, plan_id, "view")?;
        let workouts = store.workouts_for_plan(&plan.id)?;
        Ok(PlanDetails {
            duration_weeks: plan.duration_in_weeks(),
            plan,
            workouts,
        })
    }

    /// Apply an update. The pace table stays as generated.
    pub fn update_plan(
        store: &mut dyn Store,
        user_id: &str,
        plan_id: &str,
        update: &PlanUpdate,
    ) -> Result<TrainingPlan> {
        let mut plan = owned_plan(store, user_id, plan_id, "update")?;
        plan.apply_update(update)?;
        store.update_plan(&plan)?;
        info!(plan_id = %plan.id, status = %plan.status, "Updated training plan");
        Ok(plan)
    }

    /// Delete a plan together with its workouts
    pub fn delete_plan(store: &mut dyn Store, user_id: &str, plan_id: &str) -> Result<()> {
        owned_plan(store, user_id, plan_id, "delete")?;
        store.delete_plan(plan_id)?;
        info!(plan_id = %plan_id, "Deleted training plan");
        Ok(())
    }
}

/// Plan `plan_id` if it belongs to `user_id`
pub(crate) fn owned_plan(store: &dyn Store, user_id: &str, plan_id: &str, action: &str) -> Result<TrainingPlan> {
    let plan = store
        .find_plan(plan_id)?
        .ok_or_else(|| HappyFeetError::NotFound("Training plan".to_string()))?;
    if plan.user_id != user_id {
        return Err(HappyFeetError::Forbidden(format!(
            "Not authorized to {} this plan",
            action
        )));
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::models::{
        PlanRaceType, PlanStatus, RaceResult, RaceResultDraft, RaceType, RegistrationRequest, User,
    };
    use crate::pacing::{PaceTable, TrainingIntent};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn add_user(store: &mut MemoryStore, email: &str) -> String {
        let request = RegistrationRequest {
            name: "Planner".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            username: "planner".to_string(),
            ..Default::default()
        };
        let user = User::new(&request, "hash".to_string()).unwrap();
        store.insert_user(&user).unwrap();
        user.id
    }

    fn add_result(store: &mut MemoryStore, user_id: &str, distance: Decimal, time: Decimal, day: u32) {
        let draft = RaceResultDraft::new("race", RaceType::Other, distance, time, date(2024, 3, day));
        store
            .insert_race_result(&RaceResult::new(user_id, draft).unwrap())
            .unwrap();
    }

    #[test]
    fn test_plan_uses_fastest_result() {
        let mut store = MemoryStore::new();
        let user_id = add_user(&mut store, "fast@example.com");
        add_result(&mut store, &user_id, dec!(10), dec!(60), 1);
        add_result(&mut store, &user_id, dec!(5), dec!(25), 2);
        add_result(&mut store, &user_id, dec!(0), dec!(20), 3);

        let plan = TrainingPlanService::create_plan_on(
            &mut store,
            &user_id,
            PlanRequest::new(PlanRaceType::TenK),
            date(2025, 1, 6),
        )
        .unwrap();

        assert_eq!(plan.training_paces.get(TrainingIntent::Race), "4:56-5:04 min/km");
        assert_eq!(plan.training_paces.get(TrainingIntent::Easy), "5:56-6:34 min/km");
        assert_eq!(plan.status, PlanStatus::Active);
        assert_eq!(plan.start_date, date(2025, 1, 6));
    }

    #[test]
    fn test_plan_without_results_gets_defaults() {
        let mut store = MemoryStore::new();
        let user_id = add_user(&mut store, "new@example.com");
        let plan = TrainingPlanService::create_plan(
            &mut store,
            &user_id,
            PlanRequest::new(PlanRaceType::Marathon),
        )
        .unwrap();
        assert_eq!(plan.training_paces, PaceTable::default());
    }

    #[test]
    fn test_plan_for_unknown_user() {
        let mut store = MemoryStore::new();
        let err = TrainingPlanService::create_plan(&mut store, "ghost", PlanRequest::new(PlanRaceType::FiveK))
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(store.stats().unwrap().plan_count, 0);
    }

    #[test]
    fn test_paces_fixed_after_creation() {
        let mut store = MemoryStore::new();
        let user_id = add_user(&mut store, "fixed@example.com");
        let plan =
            TrainingPlanService::create_plan(&mut store, &user_id, PlanRequest::new(PlanRaceType::FiveK))
                .unwrap();

        add_result(&mut store, &user_id, dec!(5), dec!(20), 9);
        let update = PlanUpdate {
            status: Some(PlanStatus::Completed),
            notes: Some("done".to_string()),
            ..Default::default()
        };
        let updated = TrainingPlanService::update_plan(&mut store, &user_id, &plan.id, &update).unwrap();
        assert_eq!(updated.status, PlanStatus::Completed);
        assert_eq!(updated.training_paces, plan.training_paces);
    }

    #[test]
    fn test_ownership_checks() {
        let mut store = MemoryStore::new();
        let owner = add_user(&mut store, "owner@example.com");
        let other = add_user(&mut store, "other@example.com");
        let plan =
            TrainingPlanService::create_plan(&mut store, &owner, PlanRequest::new(PlanRaceType::FiveK))
                .unwrap();

        let err = TrainingPlanService::get_plan(&store, &other, &plan.id).unwrap_err();
        assert_eq!(err.status_code(), 403);
        let err = TrainingPlanService::delete_plan(&mut store, &other, &plan.id).unwrap_err();
        assert_eq!(err.to_string(), "Forbidden: Not authorized to delete this plan");

        TrainingPlanService::delete_plan(&mut store, &owner, &plan.id).unwrap();
        let err = TrainingPlanService::get_plan(&store, &owner, &plan.id).unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_list_plans_with_filters() {
        let mut store = MemoryStore::new();
        let user_id = add_user(&mut store, "lists@example.com");
        for race in [PlanRaceType::FiveK, PlanRaceType::TenK, PlanRaceType::Marathon] {
            TrainingPlanService::create_plan(&mut store, &user_id, PlanRequest::new(race)).unwrap();
        }

        let all = TrainingPlanService::list_plans(&store, &user_id, &PlanFilters::default()).unwrap();
        assert_eq!(all.len(), 3);

        let limited = PlanFilters {
            limit: Some(2),
            ..Default::default()
        };
        assert_eq!(TrainingPlanService::list_plans(&store, &user_id, &limited).unwrap().len(), 2);

        let cancelled = PlanFilters {
            status: Some(PlanStatus::Cancelled),
            limit: None,
        };
        assert!(TrainingPlanService::list_plans(&store, &user_id, &cancelled).unwrap().is_empty());
    }
}
