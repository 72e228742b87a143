use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{HappyFeetError, Result};
use crate::pacing::PaceTable;

/// Kilometres in one mile
const KM_PER_MILE: Decimal = dec!(1.60934);

/// Implements `Display`/`FromStr` for a string-valued enum
macro_rules! string_enum {
    ($name:ident, $what:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = HappyFeetError;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => {
                        let valid: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        Err(HappyFeetError::Validation(format!(
                            "Invalid {}. Must be one of: {}",
                            $what,
                            valid.join(", ")
                        )))
                    }
                }
            }
        }
    };
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

string_enum!(UserRole, "role", { User => "user", Admin => "admin" });

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Disabled,
}

string_enum!(UserStatus, "status", { Active => "active", Disabled => "disabled" });

/// Race categories a result can be recorded under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RaceType {
    #[serde(rename = "5k")]
    FiveK,
    #[serde(rename = "10k")]
    TenK,
    HalfMarathon,
    Marathon,
    Ultra,
    Other,
}

string_enum!(RaceType, "race type", {
    FiveK => "5k",
    TenK => "10k",
    HalfMarathon => "half-marathon",
    Marathon => "marathon",
    Ultra => "ultra",
    Other => "other",
});

impl RaceType {
    /// Simplified open standard in minutes for age grading, by gender
    fn standard_minutes(&self, gender: &str) -> Option<Decimal> {
        let female = gender.eq_ignore_ascii_case("female");
        let male = gender.eq_ignore_ascii_case("male");
        if !female && !male {
            return None;
        }
        let (m, f) = match self {
            RaceType::FiveK => (dec!(13.5), dec!(15.5)),
            RaceType::TenK => (dec!(27.5), dec!(31.5)),
            RaceType::HalfMarathon => (dec!(58.5), dec!(67.5)),
            RaceType::Marathon => (dec!(120), dec!(138)),
            RaceType::Ultra => (dec!(240), dec!(276)),
            RaceType::Other => return None,
        };
        Some(if female { f } else { m })
    }
}

/// Goal race of a training plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanRaceType {
    #[serde(rename = "5k")]
    FiveK,
    #[serde(rename = "10k")]
    TenK,
    HalfMarathon,
    Marathon,
    Custom,
}

string_enum!(PlanRaceType, "race type", {
    FiveK => "5k",
    TenK => "10k",
    HalfMarathon => "half-marathon",
    Marathon => "marathon",
    Custom => "custom",
});

/// Runner's self-reported level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

string_enum!(ExperienceLevel, "level", {
    Beginner => "beginner",
    Intermediate => "intermediate",
    Advanced => "advanced",
});

/// Training plan lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

string_enum!(PlanStatus, "status", {
    Active => "active",
    Completed => "completed",
    Cancelled => "cancelled",
});

/// Workout categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkoutType {
    Easy,
    Long,
    Interval,
    Tempo,
    Race,
    Rest,
    CrossTrain,
}

string_enum!(WorkoutType, "workout type", {
    Easy => "easy",
    Long => "long",
    Interval => "interval",
    Tempo => "tempo",
    Race => "race",
    Rest => "rest",
    CrossTrain => "cross-train",
});

/// Effort level of a workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Easy,
    #[default]
    Moderate,
    Hard,
}

string_enum!(Intensity, "intensity level", {
    Easy => "easy",
    Moderate => "moderate",
    Hard => "hard",
});

fn require_non_empty(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HappyFeetError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn require_non_negative(value: Decimal, field: &str) -> Result<Decimal> {
    if value < Decimal::ZERO {
        return Err(HappyFeetError::Validation(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    Ok(value)
}

fn require_place(value: Option<u32>, field: &str) -> Result<Option<u32>> {
    match value {
        Some(0) => Err(HappyFeetError::Validation(format!(
            "{} must be null or a positive number",
            field
        ))),
        other => Ok(other),
    }
}

/// Loose email check: one `@`, non-empty local part, dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !email.contains(char::is_whitespace)
                && domain.split('.').count() >= 2
                && domain.split('.').all(|label| !label.is_empty())
        }
        _ => false,
    }
}

/// Registration payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub username: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub current_weekly_mileage: Option<Decimal>,
    pub longest_recent_run: Option<Decimal>,
}

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 8;

impl RegistrationRequest {
    /// Check the registration invariants that don't need the store
    pub fn validate(&self) -> Result<()> {
        require_non_empty(&self.name, "Name")?;
        require_non_empty(&self.username, "Username")?;
        if !is_valid_email(self.email.trim()) {
            return Err(HappyFeetError::Validation("Invalid email format".to_string()));
        }
        if self.password.trim().chars().count() < MIN_PASSWORD_LEN {
            return Err(HappyFeetError::Validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

/// Registered runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub current_weekly_mileage: Decimal,
    pub longest_recent_run: Decimal,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Build a user from a validated registration and an already computed password hash
    pub fn new(request: &RegistrationRequest, password_hash: String) -> Result<Self> {
        request.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            username: request.username.trim().to_string(),
            password_hash,
            age: request.age,
            gender: request.gender.clone().filter(|g| !g.trim().is_empty()),
            current_weekly_mileage: require_non_negative(
                request.current_weekly_mileage.unwrap_or(Decimal::ZERO),
                "Current weekly mileage",
            )?,
            longest_recent_run: require_non_negative(
                request.longest_recent_run.unwrap_or(Decimal::ZERO),
                "Longest recent run",
            )?,
            role: UserRole::User,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
            last_login: None,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Apply a profile update. Identity and credential fields are never touched.
    pub fn apply_update(&mut self, update: &ProfileUpdate) -> Result<()> {
        if let Some(name) = &update.name {
            self.name = require_non_empty(name, "Name")?;
        }
        if let Some(username) = &update.username {
            self.username = require_non_empty(username, "Username")?;
        }
        if let Some(age) = update.age {
            self.age = Some(age);
        }
        if let Some(gender) = &update.gender {
            self.gender = Some(gender.trim().to_string()).filter(|g| !g.is_empty());
        }
        if let Some(mileage) = update.current_weekly_mileage {
            self.current_weekly_mileage = require_non_negative(mileage, "Current weekly mileage")?;
        }
        if let Some(longest) = update.longest_recent_run {
            self.longest_recent_run = require_non_negative(longest, "Longest recent run")?;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Public view of a user (no credentials)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub username: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub current_weekly_mileage: Decimal,
    pub longest_recent_run: Decimal,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            age: user.age,
            gender: user.gender.clone(),
            current_weekly_mileage: user.current_weekly_mileage,
            longest_recent_run: user.longest_recent_run,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_login: user.last_login,
        }
    }
}

/// Fields a user may change on their own profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub username: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub current_weekly_mileage: Option<Decimal>,
    pub longest_recent_run: Option<Decimal>,
}

/// Race result as submitted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceResultDraft {
    pub race_name: String,
    pub race_type: RaceType,
    /// Kilometres
    pub distance: Decimal,
    /// Elapsed time in minutes
    pub time: Decimal,
    pub date: NaiveDate,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub age_group: String,
    pub gender_place: Option<u32>,
    pub overall_place: Option<u32>,
    pub finishers: Option<u32>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub splits: Vec<Decimal>,
    #[serde(default)]
    pub elevation_gain: Decimal,
    #[serde(default)]
    pub weather: String,
    #[serde(default)]
    pub shoes: String,
    #[serde(default)]
    pub race_url: String,
}

impl RaceResultDraft {
    /// Draft with only the required fields set
    pub fn new(
        race_name: impl Into<String>,
        race_type: RaceType,
        distance: Decimal,
        time: Decimal,
        date: NaiveDate,
    ) -> Self {
        Self {
            race_name: race_name.into(),
            race_type,
            distance,
            time,
            date,
            location: String::new(),
            age_group: String::new(),
            gender_place: None,
            overall_place: None,
            finishers: None,
            notes: String::new(),
            splits: Vec::new(),
            elevation_gain: Decimal::ZERO,
            weather: String::new(),
            shoes: String::new(),
            race_url: String::new(),
        }
    }
}

/// A runner's recorded race.
///
/// `distance` is in kilometres and `time` is elapsed minutes, so
/// `time / distance` is already a min/km pace. Zero distance or time is
/// accepted for placeholder entries (DNF, not yet timed); such results are
/// never used as a pacing baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceResult {
    pub id: String,
    pub user_id: String,
    pub race_name: String,
    pub race_type: RaceType,
    pub distance: Decimal,
    pub time: Decimal,
    pub date: NaiveDate,
    pub location: String,
    pub age_group: String,
    pub gender_place: Option<u32>,
    pub overall_place: Option<u32>,
    pub finishers: Option<u32>,
    pub notes: String,
    pub splits: Vec<Decimal>,
    pub elevation_gain: Decimal,
    pub weather: String,
    pub shoes: String,
    pub race_url: String,
}

impl RaceResult {
    pub fn new(user_id: &str, draft: RaceResultDraft) -> Result<Self> {
        let user_id = require_non_empty(user_id, "User ID")?;
        if draft.splits.iter().any(|s| *s < Decimal::ZERO) {
            return Err(HappyFeetError::Validation(
                "All split times must be non-negative numbers".to_string(),
            ));
        }

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            race_name: require_non_empty(&draft.race_name, "Race name")?,
            race_type: draft.race_type,
            distance: require_non_negative(draft.distance, "Distance")?,
            time: require_non_negative(draft.time, "Time")?,
            date: draft.date,
            location: draft.location,
            age_group: draft.age_group,
            gender_place: require_place(draft.gender_place, "Gender place")?,
            overall_place: require_place(draft.overall_place, "Overall place")?,
            finishers: draft.finishers,
            notes: draft.notes,
            splits: draft.splits,
            elevation_gain: require_non_negative(draft.elevation_gain, "Elevation gain")?,
            weather: draft.weather,
            shoes: draft.shoes,
            race_url: draft.race_url,
        })
    }

    /// Whether the result can anchor a pace calculation
    pub fn is_eligible(&self) -> bool {
        self.distance > Decimal::ZERO && self.time > Decimal::ZERO
    }

    /// Average pace in minutes per kilometre, 0 if distance is 0
    pub fn pace_per_km(&self) -> Decimal {
        self.time.checked_div(self.distance).unwrap_or(Decimal::ZERO)
    }

    /// Average pace in minutes per mile, 0 if distance is 0 or the pace is out of range
    pub fn pace_per_mile(&self) -> Decimal {
        self.pace_per_km()
            .checked_mul(KM_PER_MILE)
            .unwrap_or(Decimal::ZERO)
    }

    /// Elapsed time as `H:MM:SS`, or `M:SS` under an hour
    pub fn formatted_time(&self) -> String {
        format_minutes(self.time)
    }

    /// Simplified age grading against a fixed open standard.
    ///
    /// Standard times get 2% slower per year past 30; the grade is capped at
    /// 100%. Unknown race types or genders fall back to a 60 minute standard.
    /// `None` without a positive time.
    pub fn age_grading(&self, age: u32, gender: &str) -> Option<AgeGrading> {
        if self.time <= Decimal::ZERO {
            return None;
        }

        let standard = self
            .race_type
            .standard_minutes(gender)
            .unwrap_or(dec!(60));
        let years_over = Decimal::from(age.saturating_sub(30));
        let adjusted = standard * (Decimal::ONE + years_over * dec!(0.02));
        let grade = adjusted
            .checked_div(self.time)
            .and_then(|ratio| ratio.checked_mul(dec!(100)))
            .map_or(dec!(100), |g| g.min(dec!(100)));

        Some(AgeGrading {
            age_grade_percent: grade.round_dp(2),
            standard_time: format_minutes(standard),
            adjusted_standard_time: format_minutes(adjusted),
            world_record_factor: self.time.checked_div(standard)?.round_dp(2),
        })
    }
}

/// Age-graded comparison of a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeGrading {
    pub age_grade_percent: Decimal,
    pub standard_time: String,
    pub adjusted_standard_time: String,
    pub world_record_factor: Decimal,
}

/// Render decimal minutes as `H:MM:SS` or `M:SS` (seconds truncated)
pub fn format_minutes(minutes: Decimal) -> String {
    let total_seconds = minutes
        .checked_mul(dec!(60))
        .and_then(|s| s.floor().to_i64())
        .unwrap_or(0)
        .max(0);
    let hrs = total_seconds / 3600;
    let mins = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hrs > 0 {
        format!("{}:{:02}:{:02}", hrs, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

/// Parse `H:MM:SS`, `MM:SS` or a plain decimal number of minutes
pub fn parse_duration_minutes(input: &str) -> Result<Decimal> {
    let invalid = || {
        HappyFeetError::Validation(format!(
            "Invalid time '{}': expected H:MM:SS, MM:SS or minutes",
            input
        ))
    };

    let parts: Vec<&str> = input.trim().split(':').collect();
    let numbers: Vec<Decimal> = parts
        .iter()
        .map(|p| Decimal::from_str(p.trim()).map_err(|_| invalid()))
        .collect::<Result<_>>()?;

    if numbers.iter().any(|n| *n < Decimal::ZERO) {
        return Err(invalid());
    }

    let total = match numbers.as_slice() {
        [minutes] => Some(*minutes),
        [minutes, seconds] if *seconds < dec!(60) => minutes.checked_add(*seconds / dec!(60)),
        [hours, minutes, seconds] if *minutes < dec!(60) && *seconds < dec!(60) => hours
            .checked_mul(dec!(60))
            .and_then(|m| m.checked_add(*minutes))
            .and_then(|m| m.checked_add(*seconds / dec!(60))),
        _ => None,
    };
    total.ok_or_else(invalid)
}

/// Training plan creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub race_type: PlanRaceType,
    pub race_date: Option<NaiveDate>,
    #[serde(default)]
    pub current_level: ExperienceLevel,
    /// Goal finishing time in seconds
    pub goal_time: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

impl PlanRequest {
    pub fn new(race_type: PlanRaceType) -> Self {
        Self {
            race_type,
            race_date: None,
            current_level: ExperienceLevel::default(),
            goal_time: None,
            start_date: None,
            end_date: None,
            notes: String::new(),
        }
    }
}

/// Changes allowed on an existing plan. Training paces are fixed at creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanUpdate {
    pub race_type: Option<PlanRaceType>,
    pub race_date: Option<NaiveDate>,
    pub current_level: Option<ExperienceLevel>,
    pub status: Option<PlanStatus>,
    pub goal_time: Option<u32>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// A generated training plan with its derived pace table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPlan {
    pub id: String,
    pub user_id: String,
    pub race_type: PlanRaceType,
    pub race_date: Option<NaiveDate>,
    pub current_level: ExperienceLevel,
    pub generated_on: DateTime<Utc>,
    pub status: PlanStatus,
    pub goal_time: Option<u32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: String,
    pub training_paces: PaceTable,
}

impl TrainingPlan {
    /// Build an active plan. `today` is the start date when the request has none.
    pub fn new(
        user_id: &str,
        request: PlanRequest,
        training_paces: PaceTable,
        today: NaiveDate,
    ) -> Result<Self> {
        let start_date = request.start_date.unwrap_or(today);
        check_date_order(start_date, request.end_date)?;

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: require_non_empty(user_id, "User ID")?,
            race_type: request.race_type,
            race_date: request.race_date,
            current_level: request.current_level,
            generated_on: Utc::now(),
            status: PlanStatus::Active,
            goal_time: request.goal_time,
            start_date,
            end_date: request.end_date,
            notes: request.notes,
            training_paces,
        })
    }

    pub fn apply_update(&mut self, update: &PlanUpdate) -> Result<()> {
        if let Some(end_date) = update.end_date {
            check_date_order(self.start_date, Some(end_date))?;
            self.end_date = Some(end_date);
        }
        if let Some(race_type) = update.race_type {
            self.race_type = race_type;
        }
        if let Some(race_date) = update.race_date {
            self.race_date = Some(race_date);
        }
        if let Some(level) = update.current_level {
            self.current_level = level;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(goal) = update.goal_time {
            self.goal_time = Some(goal);
        }
        if let Some(notes) = &update.notes {
            self.notes = notes.clone();
        }
        Ok(())
    }

    /// Plan length in whole weeks, rounded up; 0 without an end date
    pub fn duration_in_weeks(&self) -> u32 {
        match self.end_date {
            Some(end) => {
                let days = (end - self.start_date).num_days().unsigned_abs();
                days.div_ceil(7) as u32
            }
            None => 0,
        }
    }
}

fn check_date_order(start: NaiveDate, end: Option<NaiveDate>) -> Result<()> {
    match end {
        Some(end) if end < start => Err(HappyFeetError::Validation(
            "End date must not be before start date".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Workout as submitted for a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDraft {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    /// Planned distance in kilometres
    #[serde(default)]
    pub distance: Decimal,
    /// Planned duration in minutes
    #[serde(default)]
    pub duration: Decimal,
    #[serde(default)]
    pub intensity: Intensity,
    #[serde(default)]
    pub notes: String,
}

/// Details recorded when a workout is marked done
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionDetails {
    pub actual_distance: Option<Decimal>,
    pub actual_duration: Option<Decimal>,
    pub perceived_effort: Option<u8>,
    pub notes: Option<String>,
}

/// Scheduled session of a training plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub training_plan_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    pub distance: Decimal,
    pub duration: Decimal,
    pub intensity: Intensity,
    pub completed: bool,
    pub notes: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub actual_distance: Option<Decimal>,
    pub actual_duration: Option<Decimal>,
    pub perceived_effort: Option<u8>,
}

impl Workout {
    pub fn new(training_plan_id: &str, user_id: &str, draft: WorkoutDraft) -> Result<Self> {
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            training_plan_id: require_non_empty(training_plan_id, "Training plan ID")?,
            user_id: require_non_empty(user_id, "User ID")?,
            date: draft.date,
            workout_type: draft.workout_type,
            distance: require_non_negative(draft.distance, "Distance")?,
            duration: require_non_negative(draft.duration, "Duration")?,
            intensity: draft.intensity,
            completed: false,
            notes: draft.notes,
            completed_at: None,
            actual_distance: None,
            actual_duration: None,
            perceived_effort: None,
        })
    }

    /// Mark done. The first completion timestamp is kept on repeat calls.
    pub fn complete(&mut self, details: CompletionDetails) -> Result<()> {
        if let Some(effort) = details.perceived_effort {
            if !(1..=10).contains(&effort) {
                return Err(HappyFeetError::Validation(
                    "Perceived effort must be null or a number between 1 and 10".to_string(),
                ));
            }
        }
        let actual_distance = details
            .actual_distance
            .map(|d| require_non_negative(d, "Actual distance"))
            .transpose()?;
        let actual_duration = details
            .actual_duration
            .map(|d| require_non_negative(d, "Actual duration"))
            .transpose()?;

        self.completed = true;
        if self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
        self.actual_distance = actual_distance;
        self.actual_duration = actual_duration;
        self.perceived_effort = details.perceived_effort;
        if let Some(notes) = details.notes.filter(|n| !n.is_empty()) {
            self.notes = notes;
        }
        Ok(())
    }

    /// Minutes per kilometre, from actuals when asked and recorded
    pub fn pace(&self, use_actual: bool) -> Option<Decimal> {
        let distance = if use_actual {
            self.actual_distance.unwrap_or(self.distance)
        } else {
            self.distance
        };
        let duration = if use_actual {
            self.actual_duration.unwrap_or(self.duration)
        } else {
            self.duration
        };

        if distance.is_zero() || duration.is_zero() {
            return None;
        }
        duration.checked_div(distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegistrationRequest {
        RegistrationRequest {
            name: "Sierra Morehardt".to_string(),
            email: "Sierra@Example.com".to_string(),
            password: "password123".to_string(),
            username: "sierra".to_string(),
            age: Some(28),
            ..Default::default()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("half-marathon".parse::<RaceType>().unwrap(), RaceType::HalfMarathon);
        assert_eq!("5K".parse::<RaceType>().unwrap(), RaceType::FiveK);
        assert_eq!("cross-train".parse::<WorkoutType>().unwrap(), WorkoutType::CrossTrain);
        assert_eq!(PlanStatus::Cancelled.to_string(), "cancelled");

        let err = "sprint".parse::<RaceType>().unwrap_err();
        assert!(err.to_string().contains("Must be one of: 5k, 10k"));
    }

    #[test]
    fn test_enum_serde_names() {
        assert_eq!(serde_json::to_string(&RaceType::FiveK).unwrap(), "\"5k\"");
        assert_eq!(
            serde_json::to_string(&PlanRaceType::HalfMarathon).unwrap(),
            "\"half-marathon\""
        );
        assert_eq!(serde_json::to_string(&WorkoutType::CrossTrain).unwrap(), "\"cross-train\"");
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("runner@example.com"));
        assert!(!is_valid_email("runner@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("run ner@example.com"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[test]
    fn test_user_creation() {
        let user = User::new(&registration(), "hash".to_string()).unwrap();
        assert_eq!(user.email, "sierra@example.com");
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.current_weekly_mileage, Decimal::ZERO);

        let mut short = registration();
        short.password = "short".to_string();
        assert!(matches!(User::new(&short, "h".into()), Err(HappyFeetError::Validation(_))));

        let mut unnamed = registration();
        unnamed.name = "   ".to_string();
        assert!(User::new(&unnamed, "h".into()).is_err());
    }

    #[test]
    fn test_profile_serialization_omits_hash() {
        let user = User::new(&registration(), "secret-hash".to_string()).unwrap();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("currentWeeklyMileage"));
    }

    #[test]
    fn test_profile_update() {
        let mut user = User::new(&registration(), "hash".to_string()).unwrap();
        let update = ProfileUpdate {
            name: Some("Sierra M".to_string()),
            current_weekly_mileage: Some(dec!(32.5)),
            ..Default::default()
        };
        user.apply_update(&update).unwrap();
        assert_eq!(user.name, "Sierra M");
        assert_eq!(user.current_weekly_mileage, dec!(32.5));
        assert_eq!(user.email, "sierra@example.com");

        let bad = ProfileUpdate {
            longest_recent_run: Some(dec!(-1)),
            ..Default::default()
        };
        assert!(user.apply_update(&bad).is_err());
    }

    #[test]
    fn test_race_result_validation() {
        let draft = RaceResultDraft::new("Parkrun", RaceType::FiveK, dec!(5), dec!(25), date(2024, 5, 1));
        let result = RaceResult::new("user-1", draft.clone()).unwrap();
        assert!(result.is_eligible());
        assert_eq!(result.pace_per_km(), dec!(5));

        let mut negative = draft.clone();
        negative.distance = dec!(-5);
        assert!(RaceResult::new("user-1", negative).is_err());

        let mut zero_place = draft.clone();
        zero_place.overall_place = Some(0);
        assert!(RaceResult::new("user-1", zero_place).is_err());

        let mut dnf = draft;
        dnf.time = Decimal::ZERO;
        let dnf = RaceResult::new("user-1", dnf).unwrap();
        assert!(!dnf.is_eligible());
    }

    #[test]
    fn test_race_result_paces_and_time() {
        let draft = RaceResultDraft::new(
            "City Marathon",
            RaceType::Marathon,
            dec!(42.195),
            dec!(215.5),
            date(2024, 10, 6),
        );
        let result = RaceResult::new("user-1", draft).unwrap();
        assert_eq!(result.formatted_time(), "3:35:30");
        assert!(result.pace_per_mile() > result.pace_per_km());

        let mut placeholder = result.clone();
        placeholder.distance = Decimal::ZERO;
        assert_eq!(placeholder.pace_per_km(), Decimal::ZERO);
    }

    #[test]
    fn test_age_grading() {
        let draft = RaceResultDraft::new("10k", RaceType::TenK, dec!(10), dec!(55), date(2024, 1, 1));
        let result = RaceResult::new("user-1", draft).unwrap();

        let grading = result.age_grading(30, "male").unwrap();
        assert_eq!(grading.standard_time, "27:30");
        assert_eq!(grading.age_grade_percent, dec!(50));
        assert_eq!(grading.world_record_factor, dec!(2));

        let older = result.age_grading(40, "male").unwrap();
        assert_eq!(older.age_grade_percent, dec!(60));

        let fallback = result.age_grading(30, "unspecified").unwrap();
        assert_eq!(fallback.standard_time, "1:00:00");
        assert_eq!(fallback.age_grade_percent, dec!(100));
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(parse_duration_minutes("50:00").unwrap(), dec!(50));
        assert_eq!(parse_duration_minutes("1:30:30").unwrap(), dec!(90.5));
        assert_eq!(parse_duration_minutes("24.5").unwrap(), dec!(24.5));
        assert!(parse_duration_minutes("12:75").is_err());
        assert!(parse_duration_minutes("abc").is_err());
        assert!(parse_duration_minutes("-3").is_err());
    }

    #[test]
    fn test_duration_parsing_rejects_out_of_range() {
        assert!(parse_duration_minutes("70000000000000000000000000000:00:00").is_err());
        assert!(parse_duration_minutes("2000000000000000000000000000:00:00").is_err());
        assert_eq!(
            parse_duration_minutes("79228162514264337593543950335").unwrap(),
            Decimal::MAX
        );
    }

    #[test]
    fn test_extreme_results_do_not_overflow() {
        let huge = RaceResultDraft::new("Ultra", RaceType::Other, dec!(1), Decimal::MAX, date(2024, 1, 1));
        let huge = RaceResult::new("user-1", huge).unwrap();
        assert_eq!(huge.pace_per_km(), Decimal::MAX);
        assert_eq!(huge.pace_per_mile(), Decimal::ZERO);
        assert_eq!(huge.formatted_time(), "0:00");
        assert!(huge.age_grading(30, "male").is_some());

        let tiny = RaceResultDraft::new("Sprint", RaceType::TenK, dec!(10), Decimal::new(1, 28), date(2024, 1, 1));
        let tiny = RaceResult::new("user-1", tiny).unwrap();
        let grading = tiny.age_grading(30, "male").unwrap();
        assert_eq!(grading.age_grade_percent, dec!(100));
    }

    #[test]
    fn test_plan_dates_and_duration() {
        let mut request = PlanRequest::new(PlanRaceType::HalfMarathon);
        request.end_date = Some(date(2025, 3, 1));
        let plan = TrainingPlan::new("user-1", request, PaceTable::default(), date(2025, 1, 1)).unwrap();
        assert_eq!(plan.start_date, date(2025, 1, 1));
        assert_eq!(plan.status, PlanStatus::Active);
        assert_eq!(plan.duration_in_weeks(), 9);

        let mut backwards = PlanRequest::new(PlanRaceType::TenK);
        backwards.end_date = Some(date(2024, 12, 1));
        assert!(TrainingPlan::new("user-1", backwards, PaceTable::default(), date(2025, 1, 1)).is_err());
    }

    #[test]
    fn test_workout_completion_and_pace() {
        let draft = WorkoutDraft {
            date: date(2025, 6, 3),
            workout_type: WorkoutType::Easy,
            distance: dec!(5),
            duration: dec!(30),
            intensity: Intensity::Easy,
            notes: String::new(),
        };
        let mut workout = Workout::new("plan-1", "user-1", draft).unwrap();
        assert_eq!(workout.pace(false), Some(dec!(6)));

        let bad = CompletionDetails {
            perceived_effort: Some(11),
            ..Default::default()
        };
        assert!(workout.complete(bad).is_err());
        assert!(!workout.completed);

        workout
            .complete(CompletionDetails {
                actual_distance: Some(dec!(6)),
                actual_duration: Some(dec!(33)),
                perceived_effort: Some(4),
                notes: Some("felt good".to_string()),
            })
            .unwrap();
        assert!(workout.completed);
        assert!(workout.completed_at.is_some());
        assert_eq!(workout.pace(true), Some(dec!(5.5)));
        assert_eq!(workout.notes, "felt good");
    }

    #[test]
    fn test_rest_day_has_no_pace() {
        let draft = WorkoutDraft {
            date: date(2025, 6, 4),
            workout_type: WorkoutType::Rest,
            distance: Decimal::ZERO,
            duration: Decimal::ZERO,
            intensity: Intensity::Easy,
            notes: String::new(),
        };
        let workout = Workout::new("plan-1", "user-1", draft).unwrap();
        assert_eq!(workout.pace(false), None);
    }
}
