use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tabled::{settings::Style, Table, Tabled};

use happyfeet::auth::bearer_token;
use happyfeet::config::AppConfig;
use happyfeet::error::ErrorSeverity;
use happyfeet::logging::init_logging;
use happyfeet::models::{
    format_minutes, parse_duration_minutes, CompletionDetails, ExperienceLevel, Intensity,
    PlanRaceType, PlanRequest, PlanStatus, PlanUpdate, ProfileUpdate, RaceResult, RaceResultDraft,
    RaceType, RegistrationRequest, TrainingPlan, User, UserProfile, Workout, WorkoutDraft,
    WorkoutType,
};
use happyfeet::pacing::{format_pace, PaceCalculator, PaceTable};
use happyfeet::seed::{seed_demo_data, DEMO_EMAIL, DEMO_PASSWORD};
use happyfeet::store::{PlanFilters, Store};
use happyfeet::workouts::WorkoutSummary;
use happyfeet::{
    Database, HappyFeetError, MemoryStore, RaceResultService, TrainingPlanService, UserService,
    WorkoutService,
};

/// HappyFeet - Running Training Plan CLI
///
/// Keeps a runner's race results, derives training paces from the fastest
/// one and manages training plans and their workouts.
#[derive(Parser)]
#[command(name = "happyfeet")]
#[command(author = "HappyFeet Contributors")]
#[command(version)]
#[command(about = "Running training plans from your race history", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Session token from `happyfeet login` (raw or `Bearer <token>`)
    #[arg(long, env = "HAPPYFEET_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "HAPPYFEET_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        gender: Option<String>,
        /// Current weekly mileage (km)
        #[arg(long)]
        weekly_mileage: Option<Decimal>,
        /// Longest recent run (km)
        #[arg(long)]
        longest_run: Option<Decimal>,
    },

    /// Sign in and print a session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "HAPPYFEET_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show or update your profile
    Profile {
        #[command(subcommand)]
        action: Option<ProfileCommands>,
    },

    /// Record and review race results
    #[command(subcommand)]
    Result(ResultCommands),

    /// Manage training plans
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Schedule and complete workouts
    #[command(subcommand)]
    Workout(WorkoutCommands),

    /// Training paces for a race distance and time
    Paces {
        /// Race distance in km
        #[arg(short, long)]
        distance: Decimal,

        /// Finish time (H:MM:SS, MM:SS or minutes)
        #[arg(short, long, value_parser = parse_duration_minutes)]
        time: Decimal,
    },

    /// Load demo data into an empty store
    Seed,

    /// Record counts in the store
    Stats,

    /// Configure application settings
    Config {
        /// List all configuration options
        #[arg(short, long)]
        list: bool,

        /// Set a configuration value (KEY=VALUE)
        #[arg(short, long)]
        set: Option<String>,

        /// Get a configuration value
        #[arg(short, long)]
        get: Option<String>,
    },

    /// Account administration
    #[command(subcommand)]
    Users(UsersCommands),
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show your profile
    Show,
    /// Update profile fields
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        weekly_mileage: Option<Decimal>,
        #[arg(long)]
        longest_run: Option<Decimal>,
    },
}

#[derive(Subcommand)]
enum ResultCommands {
    /// Record a race result
    Add {
        /// Race name
        #[arg(long)]
        name: String,
        /// 5k, 10k, half-marathon, marathon, ultra, other
        #[arg(long = "type")]
        race_type: RaceType,
        /// Distance in km
        #[arg(short, long)]
        distance: Decimal,
        /// Finish time (H:MM:SS, MM:SS or minutes)
        #[arg(short, long, value_parser = parse_duration_minutes)]
        time: Decimal,
        /// Race date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        overall_place: Option<u32>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List your results, most recent first
    List,
    /// Show your fastest result and the paces it gives
    Best,
    /// Delete a result
    Delete { id: String },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Create a plan with paces from your best result
    Create {
        /// 5k, 10k, half-marathon, marathon, custom
        #[arg(long = "race")]
        race_type: PlanRaceType,
        #[arg(long)]
        race_date: Option<NaiveDate>,
        /// beginner, intermediate, advanced
        #[arg(long, default_value = "beginner")]
        level: ExperienceLevel,
        /// Goal finish time (H:MM:SS)
        #[arg(long, value_parser = parse_goal_seconds)]
        goal: Option<u32>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List your plans, newest first
    List {
        /// active, completed, cancelled
        #[arg(long)]
        status: Option<PlanStatus>,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show a plan with its workouts
    Show { id: String },
    /// Update a plan (paces are kept)
    Update {
        id: String,
        #[arg(long = "race")]
        race_type: Option<PlanRaceType>,
        #[arg(long)]
        race_date: Option<NaiveDate>,
        #[arg(long)]
        level: Option<ExperienceLevel>,
        #[arg(long)]
        status: Option<PlanStatus>,
        #[arg(long, value_parser = parse_goal_seconds)]
        goal: Option<u32>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a plan and its workouts
    Delete { id: String },
}

#[derive(Subcommand)]
enum WorkoutCommands {
    /// Add a workout to a plan
    Add {
        /// Plan ID
        #[arg(long)]
        plan: String,
        #[arg(long)]
        date: NaiveDate,
        /// easy, long, interval, tempo, race, rest, cross-train
        #[arg(long = "type")]
        workout_type: WorkoutType,
        /// Distance in km
        #[arg(short, long, default_value = "0")]
        distance: Decimal,
        /// Duration (H:MM:SS, MM:SS or minutes)
        #[arg(long, value_parser = parse_duration_minutes)]
        duration: Option<Decimal>,
        /// easy, moderate, hard
        #[arg(long, default_value = "moderate")]
        intensity: Intensity,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Mark a workout as done
    Complete {
        id: String,
        /// Actual distance in km
        #[arg(long)]
        distance: Option<Decimal>,
        /// Actual duration (H:MM:SS, MM:SS or minutes)
        #[arg(long, value_parser = parse_duration_minutes)]
        duration: Option<Decimal>,
        /// Perceived effort 1-10
        #[arg(long)]
        effort: Option<u8>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List a plan's workouts
    List {
        /// Plan ID
        #[arg(long)]
        plan: String,
    },
}

#[derive(Subcommand)]
enum UsersCommands {
    /// List all accounts (admin)
    List,
    /// Last login of every account (admin)
    Activity,
    /// Change an account's role (admin)
    SetRole { email: String, role: String },
    /// Grant admin to an account directly in the local store
    Promote { email: String },
}

fn parse_goal_seconds(input: &str) -> happyfeet::Result<u32> {
    let minutes = parse_duration_minutes(input)?;
    minutes
        .checked_mul(Decimal::from(60))
        .and_then(|seconds| seconds.round().to_u32())
        .ok_or_else(|| HappyFeetError::Validation(format!("Goal time out of range: {}", input)))
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: NaiveDate,
    #[tabled(rename = "Race")]
    name: String,
    #[tabled(rename = "Type")]
    race_type: String,
    #[tabled(rename = "Km")]
    distance: Decimal,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Pace /km")]
    pace: String,
}

impl From<&RaceResult> for ResultRow {
    fn from(r: &RaceResult) -> Self {
        Self {
            id: r.id.clone(),
            date: r.date,
            name: r.race_name.clone(),
            race_type: r.race_type.to_string(),
            distance: r.distance,
            time: r.formatted_time(),
            pace: if r.is_eligible() {
                format_pace(r.pace_per_km())
            } else {
                "-".to_string()
            },
        }
    }
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Race")]
    race_type: String,
    #[tabled(rename = "Race date")]
    race_date: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Start")]
    start: NaiveDate,
    #[tabled(rename = "Weeks")]
    weeks: u32,
}

impl From<&TrainingPlan> for PlanRow {
    fn from(p: &TrainingPlan) -> Self {
        Self {
            id: p.id.clone(),
            race_type: p.race_type.to_string(),
            race_date: p.race_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
            level: p.current_level.to_string(),
            status: p.status.to_string(),
            start: p.start_date,
            weeks: p.duration_in_weeks(),
        }
    }
}

#[derive(Tabled)]
struct WorkoutRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: NaiveDate,
    #[tabled(rename = "Type")]
    workout_type: String,
    #[tabled(rename = "Km")]
    distance: Decimal,
    #[tabled(rename = "Intensity")]
    intensity: String,
    #[tabled(rename = "Done")]
    done: String,
    #[tabled(rename = "Pace /km")]
    pace: String,
}

impl From<&Workout> for WorkoutRow {
    fn from(w: &Workout) -> Self {
        Self {
            id: w.id.clone(),
            date: w.date,
            workout_type: w.workout_type.to_string(),
            distance: w.distance,
            intensity: w.intensity.to_string(),
            done: if w.completed { "✓".to_string() } else { String::new() },
            pace: w
                .pace(w.completed)
                .map(format_pace)
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last login")]
    last_login: String,
}

impl From<&UserProfile> for UserRow {
    fn from(u: &UserProfile) -> Self {
        Self {
            email: u.email.clone(),
            username: u.username.clone(),
            role: u.role.to_string(),
            status: u.status.to_string(),
            last_login: u
                .last_login
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string()),
        }
    }
}

/// Everything a command needs: the open store and the account service
struct App {
    store: Box<dyn Store>,
    users: UserService,
    json: bool,
    token: Option<String>,
}

impl App {
    fn open(config: &AppConfig, json: bool, token: Option<String>) -> Result<Self> {
        Ok(Self {
            store: open_store(config)?,
            users: UserService::from_settings(&config.auth)?,
            json,
            token,
        })
    }

    /// Signed-in user from `--token` / `HAPPYFEET_TOKEN`
    fn current_user(&self) -> Result<User> {
        let raw = self
            .token
            .as_deref()
            .ok_or_else(|| HappyFeetError::Unauthorized("No token provided".to_string()))?;
        let token = if raw.contains(' ') {
            bearer_token(Some(raw))?
        } else {
            raw
        };
        Ok(self.users.current_user(self.store.as_ref(), token)?)
    }

    fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn open_store(config: &AppConfig) -> Result<Box<dyn Store>> {
    if config.database.in_memory {
        tracing::debug!("Using in-memory store");
        return Ok(Box::new(MemoryStore::new()));
    }

    let path = &config.database.path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
    }
    let db = Database::new(path)
        .with_context(|| format!("Failed to open database: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Opened SQLite store");
    Ok(Box::new(db))
}

fn load_config(path: &Path) -> Result<AppConfig> {
    let mut config = AppConfig::load_or_default(path)?;
    config.apply_env_overrides()?;
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<HappyFeetError>() {
        Some(e) => {
            match e.severity() {
                ErrorSeverity::Critical | ErrorSeverity::Error => {
                    tracing::error!(code = e.code(), "{:#}", err)
                }
                ErrorSeverity::Warning => tracing::warn!(code = e.code(), "{}", e),
                ErrorSeverity::Info => tracing::info!(code = e.code(), "{}", e),
            }
            eprintln!("{} {}", "Error:".red().bold(), e.user_message());
        }
        None => eprintln!("{} {:#}", "Error:".red().bold(), err),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
    let mut config = load_config(&config_path)?;

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config)?;

    if config.uses_default_secret() {
        tracing::warn!("Using the built-in JWT secret; set JWT_SECRET or auth.jwt_secret");
    }

    // Config and paces work without a store
    match cli.command {
        Commands::Config { list, set, get } => handle_config(&mut config, &config_path, list, set, get),
        Commands::Paces { distance, time } => {
            let pace = time.checked_div(distance).filter(|p| *p > Decimal::ZERO);
            let table = match pace.and_then(|p| PaceCalculator::from_pace(p).map(|t| (p, t))) {
                Some((pace, table)) => {
                    println!(
                        "{} {} min/km over {} km ({})",
                        "Race pace:".cyan().bold(),
                        format_pace(pace),
                        distance,
                        format_minutes(time)
                    );
                    table
                }
                None => {
                    println!(
                        "{}",
                        "Distance and time must be positive and in range; showing default paces".yellow()
                    );
                    PaceTable::default()
                }
            };
            print_paces(&table, cli.json)
        }
        command => {
            let mut app = App::open(&config, cli.json, cli.token)?;
            run_with_store(&mut app, command)
        }
    }
}

fn run_with_store(app: &mut App, command: Commands) -> Result<()> {
    match command {
        Commands::Register {
            name,
            email,
            username,
            password,
            age,
            gender,
            weekly_mileage,
            longest_run,
        } => {
            let request = RegistrationRequest {
                name,
                email,
                password,
                username,
                age,
                gender,
                current_weekly_mileage: weekly_mileage,
                longest_recent_run: longest_run,
            };
            let session = app.users.register(app.store.as_mut(), &request)?;
            if app.json {
                return app.print_json(&session);
            }
            println!("{}", "✓ User registered successfully".green());
            println!("  {}", session.user.email);
            println!("\nexport HAPPYFEET_TOKEN={}", session.token);
        }

        Commands::Login { email, password } => {
            let session = app.users.login(app.store.as_mut(), &email, &password)?;
            if app.json {
                return app.print_json(&session);
            }
            println!("{} {}", "✓ Logged in as".green(), session.user.name.bold());
            println!("\nexport HAPPYFEET_TOKEN={}", session.token);
        }

        Commands::Profile { action } => handle_profile(app, action)?,
        Commands::Result(cmd) => handle_result(app, cmd)?,
        Commands::Plan(cmd) => handle_plan(app, cmd)?,
        Commands::Workout(cmd) => handle_workout(app, cmd)?,
        Commands::Users(cmd) => handle_users(app, cmd)?,

        Commands::Seed => {
            let hasher = *app.users.hasher();
            match seed_demo_data(app.store.as_mut(), &hasher)? {
                Some(summary) => {
                    if app.json {
                        return app.print_json(&UserProfile::from(&summary.user));
                    }
                    println!("{}", "✓ Demo data created".green());
                    println!("  Login: {} / {}", DEMO_EMAIL, DEMO_PASSWORD);
                    println!("  Plan:  {}", summary.plan.id);
                    println!("  Workouts: {}", summary.workouts.len());
                }
                None => println!("{}", "Store already has users; nothing seeded".yellow()),
            }
        }

        Commands::Stats => {
            let stats = app.store.stats()?;
            if app.json {
                return app.print_json(&serde_json::json!({
                    "users": stats.user_count,
                    "raceResults": stats.race_result_count,
                    "trainingPlans": stats.plan_count,
                    "workouts": stats.workout_count,
                }));
            }
            println!("{}", "Store statistics".cyan().bold());
            println!("  Users:          {}", stats.user_count);
            println!("  Race results:   {}", stats.race_result_count);
            println!("  Training plans: {}", stats.plan_count);
            println!("  Workouts:       {}", stats.workout_count);
        }

        Commands::Config { .. } | Commands::Paces { .. } => {}
    }
    Ok(())
}

fn handle_config(
    config: &mut AppConfig,
    config_path: &Path,
    list: bool,
    set: Option<String>,
    get: Option<String>,
) -> Result<()> {
    if let Some(key_value) = set {
        let (key, value) = key_value
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected KEY=VALUE, got '{}'", key_value))?;
        let mut stored = AppConfig::load_or_default(config_path)?;
        stored.set(key.trim(), value.trim())?;
        stored.save_to_file(config_path)?;
        println!("{} {} = {}", "✓ Set".green(), key.trim(), value.trim());
    } else if let Some(key) = get {
        println!("{}", config.get(&key)?);
    } else if list {
        println!("{} {}", "Configuration:".white().bold(), config_path.display());
        for (key, value) in config.entries()? {
            println!("  {:<24} {}", key, value);
        }
    } else {
        bail!("Use --list, --get KEY or --set KEY=VALUE");
    }
    Ok(())
}

fn print_paces(table: &PaceTable, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(table)?);
        return Ok(());
    }
    println!("{}", "Training paces".cyan().bold());
    for line in table.to_string().lines() {
        println!("  {}", line);
    }
    Ok(())
}

fn handle_profile(app: &mut App, action: Option<ProfileCommands>) -> Result<()> {
    let user = app.current_user()?;

    let profile = match action.unwrap_or(ProfileCommands::Show) {
        ProfileCommands::Show => app.users.profile(app.store.as_ref(), &user.id)?,
        ProfileCommands::Update {
            name,
            username,
            age,
            gender,
            weekly_mileage,
            longest_run,
        } => {
            let update = ProfileUpdate {
                name,
                username,
                age,
                gender,
                current_weekly_mileage: weekly_mileage,
                longest_recent_run: longest_run,
            };
            let profile = app.users.update_profile(app.store.as_mut(), &user.id, &update)?;
            if !app.json {
                println!("{}", "✓ Profile updated successfully".green());
            }
            profile
        }
    };

    if app.json {
        return app.print_json(&profile);
    }
    println!("{} ({})", profile.name.bold(), profile.username);
    println!("  Email:          {}", profile.email);
    println!("  Role:           {}", profile.role);
    if let Some(age) = profile.age {
        println!("  Age:            {}", age);
    }
    println!("  Weekly mileage: {} km", profile.current_weekly_mileage);
    println!("  Longest run:    {} km", profile.longest_recent_run);
    Ok(())
}

fn handle_result(app: &mut App, cmd: ResultCommands) -> Result<()> {
    let user = app.current_user()?;

    match cmd {
        ResultCommands::Add {
            name,
            race_type,
            distance,
            time,
            date,
            location,
            overall_place,
            notes,
        } => {
            let mut draft = RaceResultDraft::new(name, race_type, distance, time, date);
            draft.location = location.unwrap_or_default();
            draft.overall_place = overall_place;
            draft.notes = notes.unwrap_or_default();

            let result = RaceResultService::record(app.store.as_mut(), &user.id, draft)?;
            if app.json {
                return app.print_json(&result);
            }
            println!("{}", "✓ Race result recorded".green());
            println!("{}", Table::new([ResultRow::from(&result)]).with(Style::rounded()));
        }
        ResultCommands::List => {
            let results = RaceResultService::list(app.store.as_ref(), &user.id)?;
            if app.json {
                return app.print_json(&results);
            }
            if results.is_empty() {
                println!("{}", "No race results yet".yellow());
                return Ok(());
            }
            let rows: Vec<ResultRow> = results.iter().map(ResultRow::from).collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
        ResultCommands::Best => {
            let best = RaceResultService::best(app.store.as_ref(), &user.id)?;
            let paces = PaceCalculator::calculate(best.as_ref());
            if app.json {
                return app.print_json(&serde_json::json!({ "best": best, "trainingPaces": paces }));
            }
            match &best {
                Some(result) => {
                    println!("{}", "Best race result".cyan().bold());
                    println!("{}", Table::new([ResultRow::from(result)]).with(Style::rounded()));
                    if let (Some(age), Some(gender)) = (user.age, user.gender.as_deref()) {
                        if let Some(grading) = result.age_grading(age, gender) {
                            println!("  Age grade: {}%", grading.age_grade_percent);
                        }
                    }
                }
                None => println!("{}", "No usable race result; default paces apply".yellow()),
            }
            print_paces(&paces, false)?;
        }
        ResultCommands::Delete { id } => {
            RaceResultService::delete(app.store.as_mut(), &user.id, &id)?;
            println!("{}", "✓ Race result deleted".green());
        }
    }
    Ok(())
}

fn handle_plan(app: &mut App, cmd: PlanCommands) -> Result<()> {
    let user = app.current_user()?;

    match cmd {
        PlanCommands::Create {
            race_type,
            race_date,
            level,
            goal,
            start,
            end,
            notes,
        } => {
            let request = PlanRequest {
                race_type,
                race_date,
                current_level: level,
                goal_time: goal,
                start_date: start,
                end_date: end,
                notes: notes.unwrap_or_default(),
            };
            let plan = TrainingPlanService::create_plan(app.store.as_mut(), &user.id, request)?;
            if app.json {
                return app.print_json(&plan);
            }
            println!("{}", "✓ Training plan created".green());
            print_plan(&plan);
        }
        PlanCommands::List { status, limit } => {
            let filters = PlanFilters { status, limit };
            let plans = TrainingPlanService::list_plans(app.store.as_ref(), &user.id, &filters)?;
            if app.json {
                return app.print_json(&plans);
            }
            if plans.is_empty() {
                println!("{}", "No training plans".yellow());
                return Ok(());
            }
            let rows: Vec<PlanRow> = plans.iter().map(PlanRow::from).collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
        PlanCommands::Show { id } => {
            let details = TrainingPlanService::plan_details(app.store.as_ref(), &user.id, &id)?;
            if app.json {
                return app.print_json(&details);
            }
            print_plan(&details.plan);
            if !details.workouts.is_empty() {
                let summary = WorkoutSummary::from_workouts(&details.workouts);
                println!(
                    "\n{} {}/{} done, {} of {} km",
                    "Workouts:".bold(),
                    summary.completed,
                    summary.scheduled,
                    summary.completed_distance,
                    summary.planned_distance
                );
                let rows: Vec<WorkoutRow> = details.workouts.iter().map(WorkoutRow::from).collect();
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }
        PlanCommands::Update {
            id,
            race_type,
            race_date,
            level,
            status,
            goal,
            end,
            notes,
        } => {
            let update = PlanUpdate {
                race_type,
                race_date,
                current_level: level,
                status,
                goal_time: goal,
                end_date: end,
                notes,
            };
            let plan = TrainingPlanService::update_plan(app.store.as_mut(), &user.id, &id, &update)?;
            if app.json {
                return app.print_json(&plan);
            }
            println!("{}", "✓ Training plan updated".green());
            print_plan(&plan);
        }
        PlanCommands::Delete { id } => {
            TrainingPlanService::delete_plan(app.store.as_mut(), &user.id, &id)?;
            println!("{}", "✓ Training plan deleted".green());
        }
    }
    Ok(())
}

fn print_plan(plan: &TrainingPlan) {
    println!("{}", Table::new([PlanRow::from(plan)]).with(Style::rounded()));
    if let Some(goal) = plan.goal_time {
        println!("  Goal: {}", format_minutes(Decimal::from(goal) / Decimal::from(60)));
    }
    if !plan.notes.is_empty() {
        println!("  Notes: {}", plan.notes);
    }
    println!("{}", "Training paces".cyan().bold());
    for line in plan.training_paces.to_string().lines() {
        println!("  {}", line);
    }
}

fn handle_workout(app: &mut App, cmd: WorkoutCommands) -> Result<()> {
    let user = app.current_user()?;

    match cmd {
        WorkoutCommands::Add {
            plan,
            date,
            workout_type,
            distance,
            duration,
            intensity,
            notes,
        } => {
            let draft = WorkoutDraft {
                date,
                workout_type,
                distance,
                duration: duration.unwrap_or(Decimal::ZERO),
                intensity,
                notes: notes.unwrap_or_default(),
            };
            let added = WorkoutService::add_workouts(app.store.as_mut(), &user.id, &plan, vec![draft])?;
            if app.json {
                return app.print_json(&added);
            }
            println!("{}", "✓ Workout scheduled".green());
            let rows: Vec<WorkoutRow> = added.iter().map(WorkoutRow::from).collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
        WorkoutCommands::Complete {
            id,
            distance,
            duration,
            effort,
            notes,
        } => {
            let details = CompletionDetails {
                actual_distance: distance,
                actual_duration: duration,
                perceived_effort: effort,
                notes,
            };
            let workout = WorkoutService::complete(app.store.as_mut(), &user.id, &id, details)?;
            if app.json {
                return app.print_json(&workout);
            }
            println!("{}", "✓ Workout completed".green());
            if let Some(pace) = workout.pace(true) {
                println!("  Pace: {} min/km", format_pace(pace));
            }
        }
        WorkoutCommands::List { plan } => {
            let workouts = WorkoutService::list(app.store.as_ref(), &user.id, &plan)?;
            if app.json {
                return app.print_json(&workouts);
            }
            if workouts.is_empty() {
                println!("{}", "No workouts scheduled".yellow());
                return Ok(());
            }
            let rows: Vec<WorkoutRow> = workouts.iter().map(WorkoutRow::from).collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
    }
    Ok(())
}

fn handle_users(app: &mut App, cmd: UsersCommands) -> Result<()> {
    if let UsersCommands::Promote { email } = &cmd {
        let profile = app.users.promote_to_admin(app.store.as_mut(), email)?;
        println!("{} {} is now an admin", "✓".green(), profile.email);
        return Ok(());
    }

    let caller = app.current_user()?;
    match cmd {
        UsersCommands::List => {
            let users = app.users.list_users(app.store.as_ref(), &caller.id)?;
            if app.json {
                return app.print_json(&users);
            }
            let rows: Vec<UserRow> = users.iter().map(UserRow::from).collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
        UsersCommands::Activity => {
            let history = app.users.activity_history(app.store.as_ref(), &caller.id)?;
            if app.json {
                return app.print_json(&serde_json::json!({ "activityHistory": history }));
            }
            for entry in history {
                let last = entry
                    .last_login
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!("  {:<32} {:<9} {}", entry.email, entry.status.to_string(), last);
            }
        }
        UsersCommands::SetRole { email, role } => {
            let profile = app.users.set_role(app.store.as_mut(), &caller.id, &email, &role)?;
            if app.json {
                return app.print_json(&profile);
            }
            println!("{} {} is now {}", "✓ User role updated:".green(), profile.email, profile.role);
        }
        UsersCommands::Promote { .. } => {}
    }
    Ok(())
}
