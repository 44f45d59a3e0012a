use chrono::{Datelike, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use fitcal_core::calendar;
use fitcal_core::catalog::{resolve_definition, search_library, seed_library};
use fitcal_core::completion::find_profile;
use fitcal_core::export::{export_schedule_csv, export_sessions_csv};
use fitcal_core::plans;
use fitcal_core::types::hhmm;
use fitcal_core::*;
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "fitcal")]
#[command(about = "Workout calendar and session tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the workout library
    Workouts {
        /// Match against name or description
        #[arg(long)]
        search: Option<String>,

        /// Workout type (strength, cardio, yoga, hiit, flexibility, core, custom)
        #[arg(long = "type")]
        workout_type: Option<String>,

        /// Difficulty (beginner, intermediate, advanced)
        #[arg(long)]
        difficulty: Option<String>,
    },

    /// Put a workout on the calendar
    Schedule {
        /// Workout id or name
        #[arg(long)]
        workout: String,

        /// First date, YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// Time of day, HH:MM (defaults to the configured time)
        #[arg(long)]
        time: Option<String>,

        #[arg(long, value_enum, default_value_t = Repeat::None)]
        repeat: Repeat,

        /// Days for weekly repeats, e.g. mon,wed,fri
        #[arg(long, value_delimiter = ',')]
        days: Vec<String>,

        /// Last date for repeats, YYYY-MM-DD
        #[arg(long)]
        until: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        no_reminder: bool,

        #[arg(long, value_enum, default_value_t = Source::Library)]
        source: Source,

        /// Dry run - show the dates without storing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show scheduled workouts
    Calendar {
        /// Only this day, YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,

        /// Maximum entries when listing upcoming workouts
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Mark a scheduled workout completed or skipped
    Mark { id: String, status: String },

    /// Run a workout session
    Session {
        /// Workout id or name
        #[arg(long)]
        workout: String,

        #[arg(long, value_enum, default_value_t = Source::Library)]
        source: Source,

        /// Auto-complete (for testing) - complete every exercise and end
        #[arg(long)]
        auto_complete: bool,

        /// Seconds of timer ticks to simulate with --auto-complete
        #[arg(long, default_value_t = 0)]
        simulate_seconds: u64,

        #[arg(long)]
        notes: Option<String>,

        /// Rating from 0 (unrated) to 5
        #[arg(long)]
        rating: Option<u8>,
    },

    /// Show total workouts and badges
    Profile,

    /// Show dashboard counts
    Stats,

    /// Manage custom routines
    Plan {
        #[command(subcommand)]
        action: PlanCommand,
    },

    /// Export sessions and schedule to CSV
    Export {
        /// Output directory
        #[arg(long)]
        out: PathBuf,
    },

    /// Sign in as a user
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,
}

#[derive(Subcommand)]
enum PlanCommand {
    /// Create a routine
    Create {
        #[arg(long)]
        name: String,

        #[arg(long = "type", default_value = "custom")]
        workout_type: String,

        #[arg(long, default_value = "beginner")]
        difficulty: String,

        #[arg(long)]
        description: Option<String>,

        /// NAME[:SETS[:REPS[:SECONDS[:REST]]]], repeatable
        #[arg(long = "exercise", required = true)]
        exercises: Vec<String>,
    },

    /// List your routines
    List,

    /// Delete one of your routines
    Delete { id: String },

    /// Browse the exercise picker list
    Exercises {
        /// Only exercises whose name contains this text
        #[arg(long, default_value = "")]
        search: String,

        #[arg(long, value_enum)]
        category: Option<Category>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Category {
    Strength,
    Cardio,
    Core,
}

impl From<Category> for ExerciseCategory {
    fn from(category: Category) -> Self {
        match category {
            Category::Strength => ExerciseCategory::Strength,
            Category::Cardio => ExerciseCategory::Cardio,
            Category::Core => ExerciseCategory::Core,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Repeat {
    None,
    Daily,
    Weekly,
    Monthly,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Source {
    Library,
    CustomPlan,
}

impl From<Source> for SourceKind {
    fn from(source: Source) -> Self {
        match source {
            Source::Library => SourceKind::Library,
            Source::CustomPlan => SourceKind::CustomPlan,
        }
    }
}

/// Resolved paths and configuration shared by all commands
struct Context {
    config: Config,
    config_path: PathBuf,
    data_dir: PathBuf,
}

impl Context {
    fn identity(&self) -> ConfiguredIdentity {
        ConfiguredIdentity::persisted(self.config.clone(), &self.config_path)
    }

    fn current_user(&self) -> Result<UserIdentity> {
        self.identity().current_user()
    }

    /// Open the record store, seeding the library on first use
    fn open_store(&self) -> Result<JsonFileStore> {
        let mut store = JsonFileStore::new(self.data_dir.join("store"));
        seed_library(&mut store)?;
        Ok(store)
    }
}

fn main() -> Result<()> {
    // Initialize logging
    fitcal_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(Config::default_config_path);
    let config = Config::load_or_default(&config_path)?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let ctx = Context {
        config,
        config_path,
        data_dir,
    };
    tracing::debug!(
        "Using config {:?} and data dir {:?}",
        ctx.config_path,
        ctx.data_dir
    );

    match cli.command {
        Commands::Workouts {
            search,
            workout_type,
            difficulty,
        } => cmd_workouts(&ctx, search, workout_type, difficulty),
        Commands::Schedule {
            workout,
            date,
            time,
            repeat,
            days,
            until,
            notes,
            no_reminder,
            source,
            dry_run,
        } => {
            let start_date = parse_date(&date)?;
            let recurrence = build_recurrence(repeat, &days, until.as_deref(), start_date)?;
            cmd_schedule(
                &ctx,
                &workout,
                source.into(),
                start_date,
                time,
                recurrence,
                notes,
                !no_reminder,
                dry_run,
            )
        }
        Commands::Calendar { date, limit } => cmd_calendar(&ctx, date, limit),
        Commands::Mark { id, status } => cmd_mark(&ctx, &id, &status),
        Commands::Session {
            workout,
            source,
            auto_complete,
            simulate_seconds,
            notes,
            rating,
        } => cmd_session(
            &ctx,
            &workout,
            source.into(),
            auto_complete,
            simulate_seconds,
            notes,
            rating,
        ),
        Commands::Profile => cmd_profile(&ctx),
        Commands::Stats => cmd_stats(&ctx),
        Commands::Plan { action } => cmd_plan(&ctx, action),
        Commands::Export { out } => cmd_export(&ctx, &out),
        Commands::Login { email, name } => cmd_login(&ctx, email, name),
        Commands::Logout => cmd_logout(&ctx),
        Commands::Whoami => {
            let user = ctx.current_user()?;
            println!("{} <{}>", user.display_name, user.email);
            Ok(())
        }
    }
}

fn cmd_workouts(
    ctx: &Context,
    search: Option<String>,
    workout_type: Option<String>,
    difficulty: Option<String>,
) -> Result<()> {
    let store = ctx.open_store()?;
    let workout_type = workout_type.map(|t| t.parse::<WorkoutType>()).transpose()?;
    let difficulty = difficulty.map(|d| d.parse::<Difficulty>()).transpose()?;

    let workouts: Vec<Stored<Workout>> = store.list()?;
    let found = search_library(
        &workouts,
        search.as_deref().unwrap_or(""),
        workout_type,
        difficulty,
    );

    if found.is_empty() {
        println!("No workouts match.");
        return Ok(());
    }

    for workout in found {
        println!(
            "{}  {} [{} / {}] ~{} min, {} exercises",
            workout.id,
            workout.record.name,
            workout.record.workout_type,
            workout.record.difficulty,
            workout.record.duration_minutes,
            workout.record.exercises.len()
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_schedule(
    ctx: &Context,
    workout: &str,
    source: SourceKind,
    start_date: NaiveDate,
    time: Option<String>,
    recurrence: RecurrenceRule,
    notes: Option<String>,
    reminder: bool,
    dry_run: bool,
) -> Result<()> {
    let user = ctx.current_user()?;
    let mut store = ctx.open_store()?;
    let definition = resolve_definition(&store, workout, source, &user.email)?;

    let scheduled_time = match time {
        Some(t) => hhmm::parse(&t)
            .map_err(|e| Error::Validation(format!("invalid time {:?}: {}", t, e)))?,
        None => ctx.config.schedule.default_time()?,
    };

    let request = ScheduleRequest {
        user_email: user.email,
        workout: WorkoutRef {
            workout_id: definition.id.clone(),
            workout_name: definition.name.clone(),
            workout_type: definition.workout_type,
            duration_minutes: definition.duration_minutes,
        },
        source,
        start_date,
        scheduled_time,
        notes,
        reminder_enabled: reminder && ctx.config.schedule.reminder_enabled,
        recurrence,
    };

    let expander = ScheduleExpander::with_horizon_days(ctx.config.schedule.horizon_days);

    if dry_run {
        calendar::validate_request(&request)?;
        let records = expander.expand(&request);
        println!(
            "{} would be scheduled {} time(s):",
            definition.name,
            records.len()
        );
        for record in &records {
            println!(
                "  {} {}",
                record.scheduled_date,
                record.scheduled_time.format("%H:%M")
            );
        }
        println!("\n[Dry run - nothing stored]");
        return Ok(());
    }

    let stored = calendar::schedule_workout(&mut store, &expander, &request)?;
    if stored.is_empty() {
        println!("No dates matched - nothing scheduled.");
        return Ok(());
    }

    println!(
        "✓ Scheduled {} {} time(s) ({})",
        definition.name,
        stored.len(),
        request.recurrence.pattern_name()
    );
    if let (Some(first), Some(last)) = (stored.first(), stored.last()) {
        println!(
            "  {} → {}",
            first.record.scheduled_date, last.record.scheduled_date
        );
    }
    Ok(())
}

fn cmd_calendar(ctx: &Context, date: Option<String>, limit: usize) -> Result<()> {
    let user = ctx.current_user()?;
    let store = ctx.open_store()?;
    let records = calendar::scheduled_for_user(&store, &user.email)?;

    let shown = match date {
        Some(date) => calendar::on_date(&records, parse_date(&date)?),
        None => calendar::upcoming(&records, today(), limit),
    };

    if shown.is_empty() {
        println!("Nothing scheduled.");
        return Ok(());
    }

    for entry in shown {
        let record = &entry.record;
        println!(
            "{}  {} {}  {} ({} min) [{}]",
            entry.id,
            record.scheduled_date,
            record.scheduled_time.format("%H:%M"),
            record.workout.workout_name,
            record.workout.duration_minutes,
            record.status
        );
    }
    Ok(())
}

fn cmd_mark(ctx: &Context, id: &str, status: &str) -> Result<()> {
    ctx.current_user()?;
    let status = status.parse::<ScheduleStatus>()?;
    let mut store = ctx.open_store()?;
    let updated = calendar::set_status(&mut store, id, status)?;
    println!(
        "✓ {} on {} marked {}",
        updated.record.workout.workout_name, updated.record.scheduled_date, updated.record.status
    );
    Ok(())
}

fn cmd_session(
    ctx: &Context,
    workout: &str,
    source: SourceKind,
    auto_complete: bool,
    simulate_seconds: u64,
    notes: Option<String>,
    rating: Option<u8>,
) -> Result<()> {
    let user = ctx.current_user()?;
    let mut store = ctx.open_store()?;
    let definition = resolve_definition(&store, workout, source, &user.email)?;

    display_workout(&definition);

    let mut engine = SessionEngine::new(definition);
    let token = engine.start()?;

    if auto_complete {
        for _ in 0..simulate_seconds {
            engine.tick(token);
        }
        for _ in 0..engine.workout().exercises.len() {
            engine.complete_current_exercise()?;
        }
    } else {
        run_interactive(&mut engine, token)?;
    }

    if let Some(notes) = notes {
        engine.set_notes(notes)?;
    }
    if let Some(rating) = rating {
        engine.set_rating(rating)?;
    }

    let summary = engine.end()?;
    let outcome = match complete_session(&mut store, &user, &summary, engine.completed_exercises()) {
        Ok(outcome) => outcome,
        Err(e @ Error::ProfileNotCredited { .. }) => {
            eprintln!("⚠ {}", e);
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    println!("\n✓ Session logged!");
    println!("  Workout:   {}", summary.workout_name);
    println!("  Duration:  {} min", summary.duration_minutes);
    println!(
        "  Exercises: {}",
        outcome.session.record.exercises_completed.len()
    );
    println!("  Total workouts: {}", outcome.profile.record.total_workouts);
    for badge in &outcome.newly_awarded {
        println!("  🏆 Badge earned: {} - {}", badge, badge.description());
    }
    Ok(())
}

/// Drive a session from stdin, ticking once per wall-clock second
fn run_interactive(engine: &mut SessionEngine, token: TimerToken) -> Result<()> {
    let mut token = Some(token);
    let mut last_tick = Instant::now();
    let stdin = io::stdin();

    loop {
        print_status(engine);
        println!("Enter: complete exercise   p: pause/resume   e: end");
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        let read = stdin.lock().read_line(&mut input)?;

        // Credit the wall-clock seconds that passed while waiting for input
        let whole_seconds = last_tick.elapsed().as_secs();
        if let Some(token) = token {
            for _ in 0..whole_seconds {
                engine.tick(token);
            }
        }
        last_tick += std::time::Duration::from_secs(whole_seconds);

        if read == 0 {
            return Ok(());
        }

        match input.trim().to_lowercase().as_str() {
            "e" => return Ok(()),
            "p" => {
                token = engine.toggle_running()?;
                last_tick = Instant::now();
                if token.is_none() {
                    println!("Paused.");
                }
            }
            _ => {
                let completed = engine.complete_current_exercise()?;
                println!("✓ {}", completed.name);
            }
        }
    }
}

fn print_status(engine: &SessionEngine) {
    let elapsed = engine.elapsed_seconds();
    let current = engine
        .current_exercise()
        .map(|e| e.name.as_str())
        .unwrap_or("-");
    println!(
        "\n[{:02}:{:02}] {} {}%  exercise {}/{}: {}",
        elapsed / 60,
        elapsed % 60,
        engine.phase(),
        engine.progress_percent(),
        engine.current_exercise_index() + 1,
        engine.workout().exercises.len(),
        current
    );
}

fn display_workout(definition: &WorkoutDefinition) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", definition.name.to_uppercase());
    println!("╰─────────────────────────────────────────╯");
    println!(
        "  {} / {} / ~{} min",
        definition.workout_type, definition.difficulty, definition.duration_minutes
    );
    println!();

    for exercise in &definition.exercises {
        let mut parts = Vec::new();
        if let Some(sets) = exercise.sets {
            parts.push(format!("{} sets", sets));
        }
        if let Some(reps) = exercise.reps {
            parts.push(format!("{} reps", reps));
        }
        if let Some(seconds) = exercise.duration_seconds {
            parts.push(format!("{}s", seconds));
        }
        if let Some(rest) = exercise.rest_seconds {
            parts.push(format!("rest {}s", rest));
        }
        println!("  → {} ({})", exercise.name, parts.join(", "));
    }
    println!();
}

fn cmd_profile(ctx: &Context) -> Result<()> {
    let user = ctx.current_user()?;
    let store = ctx.open_store()?;
    let profile = find_profile(&store, &user.email)?
        .map(|p| p.record)
        .unwrap_or_else(|| UserProfile::new(&user.email));

    println!("{} <{}>", user.display_name, user.email);
    println!("  Total workouts: {}", profile.total_workouts);
    if let Some(level) = profile.fitness_level {
        println!("  Fitness level:  {}", level);
    }
    println!("\nBadges:");
    for badge in Badge::ALL {
        let mark = if profile.badges_earned.contains(&badge) {
            "🏆"
        } else {
            "  "
        };
        println!("  {} {:<20} {}", mark, badge.id(), badge.description());
    }
    Ok(())
}

fn cmd_stats(ctx: &Context) -> Result<()> {
    let user = ctx.current_user()?;
    let store = ctx.open_store()?;
    let sessions: Vec<Stored<WorkoutSessionRecord>> =
        store.filter(&Filter::new().eq("user_email", user.email.as_str()), None)?;
    let scheduled = calendar::scheduled_for_user(&store, &user.email)?;

    // Completion times are stored in UTC
    let stats = DashboardStats::compute(&sessions, Utc::now().date_naive());
    let this_week = calendar::next_days(&scheduled, today(), 7, usize::MAX);

    println!("Total sessions:     {}", stats.total_sessions);
    println!("This week:          {}", stats.sessions_this_week);
    println!("Total calories:     {}", stats.total_calories);
    println!("Average duration:   {} min", stats.average_duration_minutes);
    println!("Coming up (7 days): {}", this_week.len());
    Ok(())
}

fn cmd_plan(ctx: &Context, action: PlanCommand) -> Result<()> {
    let user = ctx.current_user()?;
    let mut store = ctx.open_store()?;

    match action {
        PlanCommand::Create {
            name,
            workout_type,
            difficulty,
            description,
            exercises,
        } => {
            let mut plan = WorkoutPlan::new(&user.email, name, workout_type.parse()?);
            plan.difficulty = difficulty.parse()?;
            plan.description = description.unwrap_or_default();
            for spec in &exercises {
                plan.add_exercise(parse_exercise(spec)?);
            }
            let stored = plans::save_plan(&mut store, plan)?;
            println!(
                "✓ Created routine {} ({} exercises, ~{} min)",
                stored.record.name,
                stored.record.exercises.len(),
                stored.record.duration_minutes
            );
            println!("  id: {}", stored.id);
        }
        PlanCommand::List => {
            let mine = plans::plans_for_user(&store, &user.email)?;
            if mine.is_empty() {
                println!("No routines yet.");
            }
            for plan in mine {
                println!(
                    "{}  {} [{}] ~{} min, {} exercises",
                    plan.id,
                    plan.record.name,
                    plan.record.workout_type,
                    plan.record.duration_minutes,
                    plan.record.exercises.len()
                );
            }
        }
        PlanCommand::Delete { id } => {
            plans::delete_plan(&mut store, &user.email, &id)?;
            println!("✓ Deleted routine {}", id);
        }
        PlanCommand::Exercises { search, category } => {
            let found = get_default_catalog().search_exercises(&search, category.map(Into::into));
            if found.is_empty() {
                println!("No exercises match {:?}.", search);
            }
            for template in found {
                println!("{:<20} {:<9} {}", template.name, template.category, template.muscle_group);
            }
        }
    }
    Ok(())
}

fn cmd_export(ctx: &Context, out: &Path) -> Result<()> {
    let user = ctx.current_user()?;
    let store = ctx.open_store()?;

    let sessions: Vec<Stored<WorkoutSessionRecord>> =
        store.filter(&Filter::new().eq("user_email", user.email.as_str()), None)?;
    let scheduled = calendar::scheduled_for_user(&store, &user.email)?;

    let sessions_path = out.join("sessions.csv");
    let schedule_path = out.join("schedule.csv");
    let session_rows = export_sessions_csv(&sessions, &sessions_path)?;
    let schedule_rows = export_schedule_csv(&scheduled, &schedule_path)?;

    println!("✓ Exported {} sessions to {}", session_rows, sessions_path.display());
    println!("✓ Exported {} scheduled workouts to {}", schedule_rows, schedule_path.display());
    Ok(())
}

fn cmd_login(ctx: &Context, email: String, name: String) -> Result<()> {
    if email.trim().is_empty() {
        return Err(Error::Validation("email must not be empty".into()));
    }
    let mut config = ctx.config.clone();
    config.user.email = email;
    config.user.display_name = name;
    config.user.signed_in = true;
    config.save_to(&ctx.config_path)?;
    println!("✓ Signed in as {} <{}>", config.user.display_name, config.user.email);
    Ok(())
}

fn cmd_logout(ctx: &Context) -> Result<()> {
    let mut identity = ctx.identity();
    identity.logout()?;
    println!("✓ Signed out");
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::Validation(format!("invalid date {:?}: {}", s, e)))
}

/// Weekly repeats without `--days` use the start date's weekday
fn build_recurrence(
    repeat: Repeat,
    days: &[String],
    until: Option<&str>,
    start_date: NaiveDate,
) -> Result<RecurrenceRule> {
    let end_date = until.map(parse_date).transpose()?;
    Ok(match repeat {
        Repeat::None => RecurrenceRule::None,
        Repeat::Daily => RecurrenceRule::Daily { end_date },
        Repeat::Monthly => RecurrenceRule::Monthly { end_date },
        Repeat::Weekly => {
            let mut days_of_week = days
                .iter()
                .map(|d| d.parse::<DayOfWeek>())
                .collect::<Result<BTreeSet<_>>>()?;
            if days_of_week.is_empty() {
                days_of_week.insert(DayOfWeek::from(start_date.weekday()));
            }
            RecurrenceRule::Weekly {
                days_of_week,
                end_date,
            }
        }
    })
}

/// Parse `NAME[:SETS[:REPS[:SECONDS[:REST]]]]`; empty fields are left unset
fn parse_exercise(spec: &str) -> Result<Exercise> {
    let mut fields = spec.split(':');
    let name = fields.next().unwrap_or("").trim().to_string();
    if name.is_empty() {
        return Err(Error::Validation(format!("exercise {:?} has no name", spec)));
    }

    let mut numbers = [None; 4];
    for (slot, field) in numbers.iter_mut().zip(fields) {
        let field = field.trim();
        if field.is_empty() {
            continue;
        }
        *slot = Some(field.parse::<u32>().map_err(|_| {
            Error::Validation(format!("exercise {:?}: {:?} is not a number", spec, field))
        })?);
    }

    Ok(Exercise {
        name,
        sets: numbers[0],
        reps: numbers[1],
        duration_seconds: numbers[2],
        rest_seconds: numbers[3],
        instructions: None,
    })
}
