use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::error::DatabaseError;
use crate::models::{RaceResult, TrainingPlan, User, Workout};
use crate::pacing::PaceTable;
use crate::store::{duplicate, not_found, PlanFilters, Store, StoreStats};

const USER_COLUMNS: &str = r#"
    id, name, email, username, password_hash, age, gender,
    current_weekly_mileage, longest_recent_run, role, status,
    created_at, updated_at, last_login
"#;

const RACE_RESULT_COLUMNS: &str = r#"
    id, user_id, race_name, race_type, distance, time, date, location, age_group,
    gender_place, overall_place, finishers, notes, splits, elevation_gain,
    weather, shoes, race_url
"#;

const PLAN_COLUMNS: &str = r#"
    id, user_id, race_type, race_date, current_level, generated_on, status,
    goal_time, start_date, end_date, notes, training_paces
"#;

const WORKOUT_COLUMNS: &str = r#"
    id, training_plan_id, user_id, date, workout_type, distance, duration, intensity,
    completed, notes, completed_at, actual_distance, actual_duration, perceived_effort
"#;

/// SQLite-backed [`Store`]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create or open a database at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, DatabaseError> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// Private database that lives as long as the handle
    pub fn in_memory() -> Result<Self, DatabaseError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, DatabaseError> {
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema with tables and indexes
    fn init_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                age INTEGER,
                gender TEXT,
                current_weekly_mileage TEXT NOT NULL,
                longest_recent_run TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user',
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                last_login TEXT
            );

            CREATE TABLE IF NOT EXISTS race_results (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                race_name TEXT NOT NULL,
                race_type TEXT NOT NULL,
                distance TEXT NOT NULL,
                time TEXT NOT NULL,
                date TEXT NOT NULL,
                location TEXT NOT NULL DEFAULT '',
                age_group TEXT NOT NULL DEFAULT '',
                gender_place INTEGER,
                overall_place INTEGER,
                finishers INTEGER,
                notes TEXT NOT NULL DEFAULT '',
                splits TEXT NOT NULL DEFAULT '[]',
                elevation_gain TEXT NOT NULL DEFAULT '0',
                weather TEXT NOT NULL DEFAULT '',
                shoes TEXT NOT NULL DEFAULT '',
                race_url TEXT NOT NULL DEFAULT '',
                seq INTEGER NOT NULL DEFAULT 0,

                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS training_plans (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                race_type TEXT NOT NULL,
                race_date TEXT,
                current_level TEXT NOT NULL,
                generated_on TEXT NOT NULL,
                status TEXT NOT NULL,
                goal_time INTEGER,
                start_date TEXT NOT NULL,
                end_date TEXT,
                notes TEXT NOT NULL DEFAULT '',
                training_paces TEXT NOT NULL,

                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS workouts (
                id TEXT PRIMARY KEY,
                training_plan_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                workout_type TEXT NOT NULL,
                distance TEXT NOT NULL,
                duration TEXT NOT NULL,
                intensity TEXT NOT NULL,
                completed BOOLEAN NOT NULL DEFAULT FALSE,
                notes TEXT NOT NULL DEFAULT '',
                completed_at TEXT,
                actual_distance TEXT,
                actual_duration TEXT,
                perceived_effort INTEGER,

                FOREIGN KEY (training_plan_id) REFERENCES training_plans (id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_race_results_user_date ON race_results (user_id, date);
            CREATE INDEX IF NOT EXISTS idx_training_plans_user ON training_plans (user_id, generated_on);
            CREATE INDEX IF NOT EXISTS idx_workouts_plan_date ON workouts (training_plan_id, date);
            "#,
        )?;

        Ok(())
    }

    fn user_from_row(row: &Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            username: row.get("username")?,
            password_hash: row.get("password_hash")?,
            age: row.get("age")?,
            gender: row.get("gender")?,
            current_weekly_mileage: decimal_column(row, "current_weekly_mileage")?,
            longest_recent_run: decimal_column(row, "longest_recent_run")?,
            role: parsed_column(row, "role")?,
            status: parsed_column(row, "status")?,
            created_at: row.get::<_, DateTime<Utc>>("created_at")?,
            updated_at: row.get::<_, DateTime<Utc>>("updated_at")?,
            last_login: row.get::<_, Option<DateTime<Utc>>>("last_login")?,
        })
    }

    fn race_result_from_row(row: &Row) -> rusqlite::Result<RaceResult> {
        let splits: String = row.get("splits")?;
        Ok(RaceResult {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            race_name: row.get("race_name")?,
            race_type: parsed_column(row, "race_type")?,
            distance: decimal_column(row, "distance")?,
            time: decimal_column(row, "time")?,
            date: row.get::<_, NaiveDate>("date")?,
            location: row.get("location")?,
            age_group: row.get("age_group")?,
            gender_place: row.get("gender_place")?,
            overall_place: row.get("overall_place")?,
            finishers: row.get("finishers")?,
            notes: row.get("notes")?,
            splits: json_column(&splits, "splits")?,
            elevation_gain: decimal_column(row, "elevation_gain")?,
            weather: row.get("weather")?,
            shoes: row.get("shoes")?,
            race_url: row.get("race_url")?,
        })
    }

    fn plan_from_row(row: &Row) -> rusqlite::Result<TrainingPlan> {
        let paces: String = row.get("training_paces")?;
        Ok(TrainingPlan {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            race_type: parsed_column(row, "race_type")?,
            race_date: row.get::<_, Option<NaiveDate>>("race_date")?,
            current_level: parsed_column(row, "current_level")?,
            generated_on: row.get::<_, DateTime<Utc>>("generated_on")?,
            status: parsed_column(row, "status")?,
            goal_time: row.get("goal_time")?,
            start_date: row.get::<_, NaiveDate>("start_date")?,
            end_date: row.get::<_, Option<NaiveDate>>("end_date")?,
            notes: row.get("notes")?,
            training_paces: json_column::<PaceTable>(&paces, "training_paces")?,
        })
    }

    fn workout_from_row(row: &Row) -> rusqlite::Result<Workout> {
        Ok(Workout {
            id: row.get("id")?,
            training_plan_id: row.get("training_plan_id")?,
            user_id: row.get("user_id")?,
            date: row.get::<_, NaiveDate>("date")?,
            workout_type: parsed_column(row, "workout_type")?,
            distance: decimal_column(row, "distance")?,
            duration: decimal_column(row, "duration")?,
            intensity: parsed_column(row, "intensity")?,
            completed: row.get("completed")?,
            notes: row.get("notes")?,
            completed_at: row.get::<_, Option<DateTime<Utc>>>("completed_at")?,
            actual_distance: optional_decimal_column(row, "actual_distance")?,
            actual_duration: optional_decimal_column(row, "actual_duration")?,
            perceived_effort: row.get("perceived_effort")?,
        })
    }

    fn insert_workout_row(tx: &rusqlite::Transaction, workout: &Workout) -> Result<(), DatabaseError> {
        tx.execute(
            &format!(
                "INSERT INTO workouts ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                WORKOUT_COLUMNS
            ),
            params![
                workout.id,
                workout.training_plan_id,
                workout.user_id,
                workout.date,
                workout.workout_type.as_str(),
                workout.distance.to_string(),
                workout.duration.to_string(),
                workout.intensity.as_str(),
                workout.completed,
                workout.notes,
                workout.completed_at,
                workout.actual_distance.map(|d| d.to_string()),
                workout.actual_duration.map(|d| d.to_string()),
                workout.perceived_effort,
            ],
        )?;
        Ok(())
    }

    fn count(&self, table: &str) -> Result<usize, DatabaseError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl Store for Database {
    fn insert_user(&mut self, user: &User) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction()?;

        let existing: i64 = tx.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ?1 OR id = ?2",
            params![user.email, user.id],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Err(duplicate("users", &user.email));
        }

        tx.execute(
            &format!(
                "INSERT INTO users ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                USER_COLUMNS
            ),
            params![
                user.id,
                user.name,
                user.email,
                user.username,
                user.password_hash,
                user.age,
                user.gender,
                user.current_weekly_mileage.to_string(),
                user.longest_recent_run.to_string(),
                user.role.as_str(),
                user.status.as_str(),
                user.created_at,
                user.updated_at,
                user.last_login,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn find_user(&self, user_id: &str) -> Result<Option<User>, DatabaseError> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![user_id],
                Self::user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                params![email],
                Self::user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn update_user(&mut self, user: &User) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            r#"
            UPDATE users SET
                name = ?2, username = ?3, password_hash = ?4, age = ?5, gender = ?6,
                current_weekly_mileage = ?7, longest_recent_run = ?8, role = ?9,
                status = ?10, updated_at = ?11, last_login = ?12
            WHERE id = ?1
            "#,
            params![
                user.id,
                user.name,
                user.username,
                user.password_hash,
                user.age,
                user.gender,
                user.current_weekly_mileage.to_string(),
                user.longest_recent_run.to_string(),
                user.role.as_str(),
                user.status.as_str(),
                user.updated_at,
                user.last_login,
            ],
        )?;
        if changed == 0 {
            return Err(not_found("users", &user.id));
        }
        Ok(())
    }

    fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY created_at, rowid",
            USER_COLUMNS
        ))?;
        let users = stmt
            .query_map([], Self::user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn count_users(&self) -> Result<usize, DatabaseError> {
        self.count("users")
    }

    fn insert_race_result(&mut self, result: &RaceResult) -> Result<(), DatabaseError> {
        let splits = serde_json::to_string(&result.splits)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        self.conn.execute(
            &format!(
                r#"INSERT INTO race_results ({}, seq) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
                    (SELECT COALESCE(MAX(seq), 0) + 1 FROM race_results)
                )"#,
                RACE_RESULT_COLUMNS
            ),
            params![
                result.id,
                result.user_id,
                result.race_name,
                result.race_type.as_str(),
                result.distance.to_string(),
                result.time.to_string(),
                result.date,
                result.location,
                result.age_group,
                result.gender_place,
                result.overall_place,
                result.finishers,
                result.notes,
                splits,
                result.elevation_gain.to_string(),
                result.weather,
                result.shoes,
                result.race_url,
            ],
        )?;
        Ok(())
    }

    fn find_race_result(&self, result_id: &str) -> Result<Option<RaceResult>, DatabaseError> {
        let result = self
            .conn
            .query_row(
                &format!("SELECT {} FROM race_results WHERE id = ?1", RACE_RESULT_COLUMNS),
                params![result_id],
                Self::race_result_from_row,
            )
            .optional()?;
        Ok(result)
    }

    fn race_results_for_user(&self, user_id: &str) -> Result<Vec<RaceResult>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM race_results WHERE user_id = ?1 ORDER BY date DESC, seq ASC",
            RACE_RESULT_COLUMNS
        ))?;
        let results = stmt
            .query_map(params![user_id], Self::race_result_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(results)
    }

    fn delete_race_result(&mut self, result_id: &str) -> Result<bool, DatabaseError> {
        let removed = self
            .conn
            .execute("DELETE FROM race_results WHERE id = ?1", params![result_id])?;
        Ok(removed > 0)
    }

    fn insert_plan(&mut self, plan: &TrainingPlan) -> Result<(), DatabaseError> {
        let paces = serde_json::to_string(&plan.training_paces)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        self.conn.execute(
            &format!(
                "INSERT INTO training_plans ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                PLAN_COLUMNS
            ),
            params![
                plan.id,
                plan.user_id,
                plan.race_type.as_str(),
                plan.race_date,
                plan.current_level.as_str(),
                plan.generated_on,
                plan.status.as_str(),
                plan.goal_time,
                plan.start_date,
                plan.end_date,
                plan.notes,
                paces,
            ],
        )?;
        Ok(())
    }

    fn find_plan(&self, plan_id: &str) -> Result<Option<TrainingPlan>, DatabaseError> {
        let plan = self
            .conn
            .query_row(
                &format!("SELECT {} FROM training_plans WHERE id = ?1", PLAN_COLUMNS),
                params![plan_id],
                Self::plan_from_row,
            )
            .optional()?;
        Ok(plan)
    }

    fn plans_for_user(
        &self,
        user_id: &str,
        filters: &PlanFilters,
    ) -> Result<Vec<TrainingPlan>, DatabaseError> {
        let limit = filters.limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM training_plans
            WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)
            ORDER BY generated_on DESC, rowid DESC
            LIMIT ?3
            "#,
            PLAN_COLUMNS
        ))?;
        let plans = stmt
            .query_map(
                params![user_id, filters.status.map(|s| s.as_str()), limit],
                Self::plan_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(plans)
    }

    fn update_plan(&mut self, plan: &TrainingPlan) -> Result<(), DatabaseError> {
        // Training paces are written once at insert time
        let changed = self.conn.execute(
            r#"
            UPDATE training_plans SET
                race_type = ?2, race_date = ?3, current_level = ?4, status = ?5,
                goal_time = ?6, end_date = ?7, notes = ?8
            WHERE id = ?1
            "#,
            params![
                plan.id,
                plan.race_type.as_str(),
                plan.race_date,
                plan.current_level.as_str(),
                plan.status.as_str(),
                plan.goal_time,
                plan.end_date,
                plan.notes,
            ],
        )?;
        if changed == 0 {
            return Err(not_found("training_plans", &plan.id));
        }
        Ok(())
    }

    fn delete_plan(&mut self, plan_id: &str) -> Result<bool, DatabaseError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM workouts WHERE training_plan_id = ?1", params![plan_id])?;
        let removed = tx.execute("DELETE FROM training_plans WHERE id = ?1", params![plan_id])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn insert_workouts(&mut self, workouts: &[Workout]) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction()?;

        for workout in workouts {
            let plan_exists: i64 = tx.query_row(
                "SELECT COUNT(*) FROM training_plans WHERE id = ?1",
                params![workout.training_plan_id],
                |row| row.get(0),
            )?;
            if plan_exists == 0 {
                return Err(not_found("training_plans", &workout.training_plan_id));
            }
            Self::insert_workout_row(&tx, workout).map_err(|e| match e {
                DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    duplicate("workouts", &workout.id)
                }
                other => other,
            })?;
        }

        tx.commit()?;
        Ok(())
    }

    fn find_workout(&self, workout_id: &str) -> Result<Option<Workout>, DatabaseError> {
        let workout = self
            .conn
            .query_row(
                &format!("SELECT {} FROM workouts WHERE id = ?1", WORKOUT_COLUMNS),
                params![workout_id],
                Self::workout_from_row,
            )
            .optional()?;
        Ok(workout)
    }

    fn update_workout(&mut self, workout: &Workout) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            r#"
            UPDATE workouts SET
                date = ?2, workout_type = ?3, distance = ?4, duration = ?5, intensity = ?6,
                completed = ?7, notes = ?8, completed_at = ?9, actual_distance = ?10,
                actual_duration = ?11, perceived_effort = ?12
            WHERE id = ?1
            "#,
            params![
                workout.id,
                workout.date,
                workout.workout_type.as_str(),
                workout.distance.to_string(),
                workout.duration.to_string(),
                workout.intensity.as_str(),
                workout.completed,
                workout.notes,
                workout.completed_at,
                workout.actual_distance.map(|d| d.to_string()),
                workout.actual_duration.map(|d| d.to_string()),
                workout.perceived_effort,
            ],
        )?;
        if changed == 0 {
            return Err(not_found("workouts", &workout.id));
        }
        Ok(())
    }

    fn workouts_for_plan(&self, plan_id: &str) -> Result<Vec<Workout>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM workouts WHERE training_plan_id = ?1 ORDER BY date ASC, rowid ASC",
            WORKOUT_COLUMNS
        ))?;
        let workouts = stmt
            .query_map(params![plan_id], Self::workout_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workouts)
    }

    fn stats(&self) -> Result<StoreStats, DatabaseError> {
        Ok(StoreStats {
            user_count: self.count("users")?,
            race_result_count: self.count("race_results")?,
            plan_count: self.count("training_plans")?,
            workout_count: self.count("workouts")?,
        })
    }
}

fn conversion_error<E>(column: &str, err: E) -> rusqlite::Error
where
    E: std::fmt::Display,
{
    rusqlite::Error::FromSqlConversionFailure(
        0,
        Type::Text,
        Box::new(DatabaseError::Serialization(format!("{}: {}", column, err))),
    )
}

fn decimal_column(row: &Row, column: &str) -> rusqlite::Result<Decimal> {
    let text: String = row.get(column)?;
    Decimal::from_str(&text).map_err(|e| conversion_error(column, e))
}

fn optional_decimal_column(row: &Row, column: &str) -> rusqlite::Result<Option<Decimal>> {
    row.get::<_, Option<String>>(column)?
        .map(|text| Decimal::from_str(&text).map_err(|e| conversion_error(column, e)))
        .transpose()
}

fn parsed_column<T>(row: &Row, column: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let text: String = row.get(column)?;
    text.parse::<T>().map_err(|e| conversion_error(column, e))
}

fn json_column<T: serde::de::DeserializeOwned>(text: &str, column: &str) -> rusqlite::Result<T> {
    serde_json::from_str(text).map_err(|e| conversion_error(column, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlanRaceType, PlanRequest, RaceResultDraft, RaceType, RegistrationRequest};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn test_user(email: &str) -> User {
        let request = RegistrationRequest {
            name: "Test Runner".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            username: "tester".to_string(),
            current_weekly_mileage: Some(dec!(25.5)),
            ..Default::default()
        };
        User::new(&request, "$2b$04$hash".to_string()).unwrap()
    }

    #[test]
    fn test_user_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("happyfeet.db");

        let user = test_user("runner@example.com");
        {
            let mut db = Database::new(&path).unwrap();
            db.insert_user(&user).unwrap();
        }

        let db = Database::new(&path).unwrap();
        let loaded = db.find_user_by_email("runner@example.com").unwrap().unwrap();
        assert_eq!(loaded.id, user.id);
        assert_eq!(loaded.password_hash, user.password_hash);
        assert_eq!(loaded.current_weekly_mileage, dec!(25.5));
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let mut db = Database::in_memory().unwrap();
        db.insert_user(&test_user("dup@example.com")).unwrap();
        let err = db.insert_user(&test_user("dup@example.com")).unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate { .. }));
    }

    #[test]
    fn test_plan_paces_stored_verbatim() {
        let mut db = Database::in_memory().unwrap();
        let user = test_user("plans@example.com");
        db.insert_user(&user).unwrap();

        let paces = crate::pacing::PaceCalculator::from_pace(dec!(5)).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let plan = TrainingPlan::new(&user.id, PlanRequest::new(PlanRaceType::TenK), paces.clone(), today)
            .unwrap();
        db.insert_plan(&plan).unwrap();

        let loaded = db.find_plan(&plan.id).unwrap().unwrap();
        assert_eq!(loaded.training_paces, paces);
        assert_eq!(loaded.start_date, today);
    }

    #[test]
    fn test_race_results_ordered_by_date_desc() {
        let mut db = Database::in_memory().unwrap();
        let user = test_user("order@example.com");
        db.insert_user(&user).unwrap();

        for (day, name) in [(3, "middle"), (9, "latest"), (1, "earliest")] {
            let date = NaiveDate::from_ymd_opt(2024, 4, day).unwrap();
            let draft = RaceResultDraft::new(name, RaceType::FiveK, dec!(5), dec!(25), date);
            db.insert_race_result(&RaceResult::new(&user.id, draft).unwrap()).unwrap();
        }

        let names: Vec<String> = db
            .race_results_for_user(&user.id)
            .unwrap()
            .into_iter()
            .map(|r| r.race_name)
            .collect();
        assert_eq!(names, vec!["latest", "middle", "earliest"]);
    }
}
