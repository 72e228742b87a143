use tracing::{debug, info};

use crate::error::{HappyFeetError, Result};
use crate::models::{RaceResult, RaceResultDraft};
use crate::pacing::RaceResultSelector;
use crate::store::Store;

/// Recording and querying a runner's race history
pub struct RaceResultService;

impl RaceResultService {
    pub fn record(store: &mut dyn Store, user_id: &str, draft: RaceResultDraft) -> Result<RaceResult> {
        if store.find_user(user_id)?.is_none() {
            return Err(HappyFeetError::NotFound("User".to_string()));
        }

        let result = RaceResult::new(user_id, draft)?;
        store.insert_race_result(&result)?;

        info!(
            user_id = %user_id,
            result_id = %result.id,
            race_type = %result.race_type,
            eligible = result.is_eligible(),
            "Recorded race result"
        );
        Ok(result)
    }

    /// Results, most recent race first
    pub fn list(store: &dyn Store, user_id: &str) -> Result<Vec<RaceResult>> {
        Ok(store.race_results_for_user(user_id)?)
    }

    /// Fastest result by average pace, if any is usable
    pub fn best(store: &dyn Store, user_id: &str) -> Result<Option<RaceResult>> {
        let results = store.race_results_for_user(user_id)?;
        let best = RaceResultSelector::select_best(&results).cloned();
        debug!(user_id = %user_id, candidates = results.len(), found = best.is_some(), "Best result lookup");
        Ok(best)
    }

    pub fn delete(store: &mut dyn Store, user_id: &str, result_id: &str) -> Result<()> {
        let result = store
            .find_race_result(result_id)?
            .ok_or_else(|| HappyFeetError::NotFound("Race result".to_string()))?;
        if result.user_id != user_id {
            return Err(HappyFeetError::Forbidden(
                "Not authorized to delete this race result".to_string(),
            ));
        }

        store.delete_race_result(result_id)?;
        info!(user_id = %user_id, result_id = %result_id, "Deleted race result");
        Ok(())
    }
}
