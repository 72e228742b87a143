//! Demo data for a fresh store

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use crate::auth::PasswordHasher;
use crate::error::{HappyFeetError, Result};
use crate::models::{
    ExperienceLevel, Intensity, PlanRaceType, PlanRequest, RegistrationRequest, TrainingPlan, User,
    Workout, WorkoutDraft, WorkoutType,
};
use crate::pacing::{PaceCalculator, RaceResultSelector};
use crate::store::Store;

pub const DEMO_EMAIL: &str = "sierramorehardt@gmail.com";
pub const DEMO_PASSWORD: &str = "password123";

/// What [`seed_demo_data`] created
#[derive(Debug, Clone)]
pub struct SeedSummary {
    pub user: User,
    pub plan: TrainingPlan,
    pub workouts: Vec<Workout>,
}

fn ymd(y: i32, m: u32, d: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| HappyFeetError::Internal(format!("invalid seed date {}-{}-{}", y, m, d)))
}

/// Create the demo runner, a half-marathon plan and two weeks' first workouts.
///
/// Does nothing and returns `None` when the store already has users.
pub fn seed_demo_data(store: &mut dyn Store, hasher: &PasswordHasher) -> Result<Option<SeedSummary>> {
    if store.count_users()? > 0 {
        info!("Store already has users, skipping demo data");
        return Ok(None);
    }

    let request = RegistrationRequest {
        name: "Sierra Morehardt".to_string(),
        email: DEMO_EMAIL.to_string(),
        password: DEMO_PASSWORD.to_string(),
        username: "sierra.morehardt".to_string(),
        age: Some(28),
        gender: None,
        current_weekly_mileage: Some(Decimal::ZERO),
        longest_recent_run: Some(dec!(13)),
    };
    let user = User::new(&request, hasher.hash(DEMO_PASSWORD)?)?;
    store.insert_user(&user)?;

    let results = store.race_results_for_user(&user.id)?;
    let paces = PaceCalculator::calculate(RaceResultSelector::select_best(&results));

    let plan_request = PlanRequest {
        race_type: PlanRaceType::HalfMarathon,
        race_date: Some(ymd(2025, 12, 1)?),
        current_level: ExperienceLevel::Intermediate,
        goal_time: None,
        start_date: Some(ymd(2025, 6, 1)?),
        end_date: Some(ymd(2025, 12, 1)?),
        notes: String::new(),
    };
    let plan = TrainingPlan::new(&user.id, plan_request, paces, ymd(2025, 6, 1)?)?;
    store.insert_plan(&plan)?;

    let drafts = [
        (ymd(2025, 6, 3)?, WorkoutType::Easy, dec!(5.0), Intensity::Easy),
        (ymd(2025, 6, 4)?, WorkoutType::Rest, Decimal::ZERO, Intensity::Easy),
        (ymd(2025, 6, 5)?, WorkoutType::Tempo, dec!(7.0), Intensity::Moderate),
    ];
    let workouts = drafts
        .into_iter()
        .map(|(date, workout_type, distance, intensity)| {
            Workout::new(
                &plan.id,
                &user.id,
                WorkoutDraft {
                    date,
                    workout_type,
                    distance,
                    duration: Decimal::ZERO,
                    intensity,
                    notes: String::new(),
                },
            )
        })
        .collect::<Result<Vec<_>>>()?;
    store.insert_workouts(&workouts)?;

    info!(user_id = %user.id, plan_id = %plan.id, workouts = workouts.len(), "Seeded demo data");
    Ok(Some(SeedSummary { user, plan, workouts }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::pacing::PaceTable;

    #[test]
    fn test_seed_populates_empty_store() {
        let mut store = MemoryStore::new();
        let hasher = PasswordHasher::new(4);

        let summary = seed_demo_data(&mut store, &hasher).unwrap().unwrap();
        assert_eq!(summary.user.username, "sierra.morehardt");
        assert_eq!(summary.user.longest_recent_run, dec!(13));
        assert!(hasher.verify(DEMO_PASSWORD, &summary.user.password_hash));
        assert_eq!(summary.plan.training_paces, PaceTable::default());
        assert_eq!(summary.plan.current_level, ExperienceLevel::Intermediate);
        assert_eq!(summary.workouts.len(), 3);

        let stats = store.stats().unwrap();
        assert_eq!((stats.user_count, stats.plan_count, stats.workout_count), (1, 1, 3));
    }

    #[test]
    fn test_seed_skips_non_empty_store() {
        let mut store = MemoryStore::new();
        let hasher = PasswordHasher::new(4);
        seed_demo_data(&mut store, &hasher).unwrap();

        assert!(seed_demo_data(&mut store, &hasher).unwrap().is_none());
        assert_eq!(store.count_users().unwrap(), 1);
    }
}
