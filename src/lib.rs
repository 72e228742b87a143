// Library interface for HappyFeet
// The binary and the integration tests both drive the services through here

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod memory_store;
pub mod models;
pub mod pacing;
pub mod race_results;
pub mod seed;
pub mod store;
pub mod training_plan;
pub mod users;
pub mod workouts;

// Re-export commonly used types for convenience
pub use auth::{Claims, PasswordHasher, TokenManager};
pub use config::AppConfig;
pub use database::Database;
pub use error::{DatabaseError, HappyFeetError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use memory_store::MemoryStore;
pub use models::*;
pub use pacing::{format_pace, PaceCalculator, PaceRange, PaceTable, RaceResultSelector, TrainingIntent};
pub use race_results::RaceResultService;
pub use store::{PlanFilters, Store, StoreStats};
pub use training_plan::{PlanDetails, TrainingPlanService};
pub use users::{ActivityEntry, AuthSession, UserService};
pub use workouts::{WorkoutService, WorkoutSummary};
